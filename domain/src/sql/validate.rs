//! Static checks of generated SQL against a schema snapshot.
//!
//! The checker lexes the statement, resolves table references and aliases,
//! and reports tables and columns the schema does not have. It never fails
//! to run: anything it cannot resolve (derived tables, CTE columns) is left
//! unchecked rather than flagged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Words that are never table or column names in generated SQL.
const KEYWORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "COLLATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DELETE", "DESC",
    "DISTINCT", "ELSE", "END", "ESCAPE", "EXCEPT", "EXISTS", "EXPLAIN", "FALSE", "FILTER",
    "FOLLOWING", "FROM", "FULL", "GLOB", "GROUP", "HAVING", "IN", "INDEXED", "INNER",
    "INSERT", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "LEFT", "LIKE", "LIMIT",
    "NATURAL", "NOCASE", "NOT", "NOTNULL", "NULL", "NULLS", "FIRST", "LAST", "OFFSET", "ON",
    "OR", "ORDER", "OUTER", "OVER", "PARTITION", "PLAN", "PRECEDING", "QUERY", "RANGE",
    "RECURSIVE", "REPLACE", "RIGHT", "ROW", "ROWID", "ROWS", "SELECT", "SET", "THEN", "TRUE",
    "UNBOUNDED", "UNION", "UPDATE", "USING", "VALUES", "WHEN", "WHERE", "WINDOW", "WITH",
];

/// Keywords followed by a table reference.
const TABLE_INTRODUCERS: &[&str] = &["FROM", "JOIN", "INTO", "UPDATE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnknownTable,
    UnknownColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub description: String,
}

/// Outcome of [`validate_sql`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlValidation {
    pub is_valid: bool,
    /// False when there was no schema to check against
    pub checked: bool,
    pub errors: Vec<ValidationIssue>,
}

impl SqlValidation {
    fn unchecked() -> Self {
        Self {
            is_valid: true,
            checked: false,
            errors: Vec::new(),
        }
    }

    /// One line per issue, for prompts and logs
    pub fn descriptions(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.description.clone()).collect()
    }
}

/// Lowercased table name to its lowercased column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, Vec<String>>,
}

impl SchemaCatalog {
    /// Read `{"tables": [{"name", "columns": [{"name"}]}]}`
    pub fn from_snapshot(schema: &Value) -> Self {
        let tables = schema
            .get("tables")
            .and_then(Value::as_array)
            .map(|tables| {
                tables
                    .iter()
                    .filter_map(|table| {
                        let name = table.get("name").and_then(Value::as_str)?;
                        let columns = table
                            .get("columns")
                            .and_then(Value::as_array)
                            .map(|cols| {
                                cols.iter()
                                    .filter_map(|c| c.get("name").and_then(Value::as_str))
                                    .map(str::to_lowercase)
                                    .collect()
                            })
                            .unwrap_or_default();
                        Some((name.to_lowercase(), columns))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word { text: String, quoted: bool },
    Dot,
    Comma,
    LParen,
    RParen,
    Other,
}

impl Token {
    fn word(&self) -> Option<&str> {
        match self {
            Token::Word { text, .. } => Some(text),
            _ => None,
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word { text, quoted: false } if text.eq_ignore_ascii_case(keyword))
    }

    /// An unquoted reserved word
    fn is_reserved(&self) -> bool {
        match self {
            Token::Word { text, quoted: false } => {
                let upper = text.to_ascii_uppercase();
                KEYWORDS.contains(&upper.as_str())
            }
            _ => false,
        }
    }

    fn name(&self) -> Option<String> {
        match self {
            Token::Word { .. } if !self.is_reserved() => self.word().map(str::to_lowercase),
            _ => None,
        }
    }
}

fn lex(sql: &str) -> Vec<Token> {
    let chars: Vec<char> = sql.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            '\'' => {
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\'' {
                        if chars.get(i + 1) == Some(&'\'') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
                tokens.push(Token::Other);
            }
            '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                let start = i + 1;
                i = start;
                while i < chars.len() && chars[i] != close {
                    i += 1;
                }
                tokens.push(Token::Word {
                    text: chars[start..i.min(chars.len())].iter().collect(),
                    quoted: true,
                });
                i += 1;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                tokens.push(Token::Word {
                    text: chars[start..i].iter().collect(),
                    quoted: false,
                });
            }
            c if c.is_ascii_digit() => {
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Other);
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            _ => {
                tokens.push(Token::Other);
                i += 1;
            }
        }
    }
    tokens
}

/// Names the statement introduces, collected in one pass before checking.
#[derive(Default)]
struct Scope {
    /// (table name, alias) as written
    tables: Vec<(String, Option<String>)>,
    ctes: HashSet<String>,
    /// `expr AS name` output aliases
    aliases: HashSet<String>,
    /// Token positions already accounted for as table names or aliases
    consumed: HashSet<usize>,
    has_derived_table: bool,
}

impl Scope {
    fn collect(tokens: &[Token]) -> Self {
        let mut scope = Scope::default();
        for i in 0..tokens.len() {
            if let Some(name) = tokens[i].name()
                && tokens.get(i + 1).is_some_and(|t| t.is_keyword("AS"))
                && tokens.get(i + 2) == Some(&Token::LParen)
            {
                scope.ctes.insert(name);
                scope.consumed.insert(i);
            }
            if tokens[i].is_keyword("AS")
                && let Some(alias) = tokens.get(i + 1).and_then(|t| t.word())
            {
                scope.aliases.insert(alias.to_lowercase());
                scope.consumed.insert(i + 1);
            }
            if TABLE_INTRODUCERS.iter().any(|kw| tokens[i].is_keyword(kw)) {
                let allow_list = tokens[i].is_keyword("FROM");
                scope.table_list(tokens, i + 1, allow_list);
            }
        }
        scope
    }

    fn table_list(&mut self, tokens: &[Token], mut at: usize, allow_list: bool) {
        loop {
            match tokens.get(at) {
                Some(Token::LParen) => {
                    self.has_derived_table = true;
                    return;
                }
                Some(token) if token.name().is_some() => {}
                _ => return,
            }
            let mut name_at = at;
            // schema-qualified: main.orders
            if tokens.get(at + 1) == Some(&Token::Dot)
                && tokens.get(at + 2).is_some_and(|t| t.name().is_some())
            {
                self.consumed.insert(at);
                name_at = at + 2;
            }
            self.consumed.insert(name_at);
            let name = tokens[name_at].name().unwrap_or_default();

            let mut next = name_at + 1;
            let alias = match tokens.get(next) {
                Some(t) if t.is_keyword("AS") => {
                    let alias = tokens.get(next + 1).and_then(Token::name);
                    next += 2;
                    alias
                }
                Some(t) => match t.name() {
                    Some(alias) => {
                        self.consumed.insert(next);
                        next += 1;
                        Some(alias)
                    }
                    None => None,
                },
                None => None,
            };
            self.tables.push((name, alias));

            if allow_list && tokens.get(next) == Some(&Token::Comma) {
                at = next + 1;
            } else {
                return;
            }
        }
    }

    fn resolve(&self, qualifier: &str) -> Option<&str> {
        self.tables
            .iter()
            .find(|(_, alias)| alias.as_deref() == Some(qualifier))
            .or_else(|| self.tables.iter().find(|(name, _)| name == qualifier))
            .map(|(name, _)| name.as_str())
    }
}

/// Check the tables and columns `sql` references against `schema`.
///
/// Qualified columns (`o.total`) are checked against the table the
/// qualifier resolves to. Unqualified columns are checked only when every
/// referenced table is a known base table with listed columns.
pub fn validate_sql(sql: &str, schema: &Value) -> SqlValidation {
    let catalog = SchemaCatalog::from_snapshot(schema);
    if catalog.is_empty() {
        return SqlValidation::unchecked();
    }

    let tokens = lex(sql);
    let scope = Scope::collect(&tokens);
    let mut errors: BTreeSet<ValidationIssue> = BTreeSet::new();

    let mut all_known = !scope.has_derived_table;
    for (table, _) in &scope.tables {
        if scope.ctes.contains(table) {
            all_known = false;
            continue;
        }
        match catalog.columns(table) {
            Some(columns) if !columns.is_empty() => {}
            Some(_) => all_known = false,
            None => {
                all_known = false;
                errors.insert(ValidationIssue {
                    kind: IssueKind::UnknownTable,
                    description: format!("Table '{}' does not exist", table),
                });
            }
        }
    }

    let referenced: HashMap<&str, &[String]> = scope
        .tables
        .iter()
        .filter_map(|(table, _)| catalog.columns(table).map(|c| (table.as_str(), c)))
        .collect();

    for i in 0..tokens.len() {
        if scope.consumed.contains(&i) {
            continue;
        }
        let Some(name) = tokens[i].name() else {
            continue;
        };
        let after_dot = i > 0 && tokens[i - 1] == Token::Dot;
        let before_dot = tokens.get(i + 1) == Some(&Token::Dot);
        let is_call = tokens.get(i + 1) == Some(&Token::LParen);

        if before_dot {
            let Some(column) = tokens.get(i + 2).and_then(Token::name) else {
                continue;
            };
            if let Some(table) = scope.resolve(&name)
                && let Some(columns) = catalog.columns(table)
                && !columns.is_empty()
                && !columns.contains(&column)
            {
                errors.insert(ValidationIssue {
                    kind: IssueKind::UnknownColumn,
                    description: format!(
                        "Column '{}.{}' does not exist in table '{}'",
                        name, column, table
                    ),
                });
            }
            continue;
        }
        if after_dot || is_call || !all_known {
            continue;
        }
        if scope.aliases.contains(&name)
            || scope.ctes.contains(&name)
            || scope.resolve(&name).is_some()
        {
            continue;
        }
        if !referenced.values().any(|columns| columns.contains(&name)) {
            errors.insert(ValidationIssue {
                kind: IssueKind::UnknownColumn,
                description: format!("Column '{}' does not exist in the referenced tables", name),
            });
        }
    }

    let errors: Vec<ValidationIssue> = errors.into_iter().collect();
    SqlValidation {
        is_valid: errors.is_empty(),
        checked: true,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shop() -> Value {
        let columns = |names: &[&str]| -> Value {
            names.iter().map(|name| json!({ "name": name })).collect()
        };
        json!({"tables": [
            {"name": "customers", "columns": columns(&["id", "name", "region"])},
            {"name": "orders", "columns": columns(&["id", "customer_id", "total", "created_at"])},
        ]})
    }

    #[test]
    fn test_valid_join_with_aliases() {
        let sql = "SELECT c.name, SUM(o.total) AS revenue FROM customers c \
                   JOIN orders AS o ON o.customer_id = c.id \
                   WHERE c.region = 'EU' GROUP BY c.name ORDER BY revenue DESC LIMIT 5";
        let validation = validate_sql(sql, &shop());
        assert!(validation.checked);
        assert!(validation.is_valid, "{:?}", validation.errors);
    }

    #[test]
    fn test_unknown_table() {
        let validation = validate_sql("SELECT * FROM users", &shop());
        assert!(!validation.is_valid);
        assert_eq!(validation.errors[0].kind, IssueKind::UnknownTable);
        assert_eq!(validation.descriptions(), vec!["Table 'users' does not exist"]);
    }

    #[test]
    fn test_unknown_qualified_and_bare_columns() {
        let validation = validate_sql(
            "SELECT o.amount FROM orders o WHERE status = 'open'",
            &shop(),
        );
        let kinds: Vec<_> = validation.errors.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![IssueKind::UnknownColumn, IssueKind::UnknownColumn]);
        assert!(validation.descriptions()[0].contains("o.amount"));
        assert!(validation.descriptions()[1].contains("'status'"));
    }

    #[test]
    fn test_strings_functions_and_comments_are_ignored() {
        let sql = "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*) -- per month\n\
                   FROM orders WHERE name_like = 'x' OR 1 = 1 GROUP BY month";
        let validation = validate_sql(sql, &shop());
        // name_like is a real mistake; the string and comment contents are not
        assert_eq!(validation.errors.len(), 1);
        assert!(validation.errors[0].description.contains("name_like"));
    }

    #[test]
    fn test_cte_and_derived_tables_are_not_flagged() {
        let sql = "WITH big AS (SELECT customer_id, total FROM orders WHERE total > 100) \
                   SELECT customer_id FROM big";
        assert!(validate_sql(sql, &shop()).is_valid);

        let sql = "SELECT t.n FROM (SELECT COUNT(*) AS n FROM orders) t";
        assert!(validate_sql(sql, &shop()).is_valid);
    }

    #[test]
    fn test_comma_separated_from_list() {
        let sql = "SELECT customers.name FROM customers, orders \
                   WHERE orders.customer_id = customers.id";
        assert!(validate_sql(sql, &shop()).is_valid);
    }

    #[test]
    fn test_without_schema_is_unchecked() {
        let validation = validate_sql("SELECT * FROM anything", &json!({}));
        assert!(validation.is_valid);
        assert!(!validation.checked);
    }
}
