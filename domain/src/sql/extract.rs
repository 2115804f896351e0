//! Pulling a single SQL statement out of model output.

use crate::nlu::parsing::ParseError;
use crate::util::extract_fenced_block;

const SQL_LEADING_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER", "PRAGMA", "EXPLAIN",
    "REPLACE",
];

const READ_ONLY_KEYWORDS: &[&str] = &["SELECT", "WITH", "EXPLAIN", "PRAGMA", "VALUES"];

/// Split SQL into statements on `;`, ignoring semicolons inside quotes.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in sql.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"' | '`') => {
                quote = Some(c);
                current.push(c);
            }
            (None, ';') => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
            }
            (None, c) => current.push(c),
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }
    statements
}

/// Extract exactly one SQL statement from a model response.
///
/// Prefers a ` ```sql ` block; otherwise takes the text from the first
/// line that starts with a SQL keyword. Trailing `;` is dropped.
pub fn extract_sql(response: &str) -> Result<String, ParseError> {
    let body = match extract_fenced_block(response, "sql") {
        Some(block) => block.to_string(),
        None => {
            let lines: Vec<&str> = response.lines().collect();
            let start = lines
                .iter()
                .position(|line| starts_with_sql_keyword(line))
                .ok_or(ParseError::NoSql)?;
            lines[start..].join("\n")
        }
    };

    let mut statements = split_statements(&body);
    match statements.len() {
        0 => Err(ParseError::NoSql),
        1 => {
            let stmt = statements.remove(0);
            if starts_with_sql_keyword(&stmt) {
                Ok(stmt)
            } else {
                Err(ParseError::NoSql)
            }
        }
        n => Err(ParseError::MultipleStatements(n)),
    }
}

fn first_keyword(sql: &str) -> String {
    sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

fn starts_with_sql_keyword(line: &str) -> bool {
    let keyword = first_keyword(line);
    SQL_LEADING_KEYWORDS.contains(&keyword.as_str())
}

/// Whether every statement in `sql` only reads data.
pub fn is_read_only(sql: &str) -> bool {
    let statements = split_statements(sql);
    !statements.is_empty()
        && statements.iter().all(|stmt| {
            let keyword = first_keyword(stmt);
            if !READ_ONLY_KEYWORDS.contains(&keyword.as_str()) {
                return false;
            }
            // CTEs can wrap writes
            let upper = stmt.to_ascii_uppercase();
            keyword != "WITH"
                || !["INSERT ", "UPDATE ", "DELETE ", "DROP ", "ALTER ", "CREATE "]
                    .iter()
                    .any(|w| upper.contains(w))
        })
}
