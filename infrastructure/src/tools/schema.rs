//! Schema tool - catalog introspection and user-term mapping

use super::connection::{ConnectionHandle, SqlToolError};
use super::introspect;
use async_trait::async_trait;
use prism_application::{SCHEMA_TOOL, Tool};
use prism_domain::{CONNECTION_PARAM, SchemaAction, ToolResponse};
use rusqlite::Connection;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Candidates kept per term
const MAX_CANDIDATES: usize = 3;

pub struct SchemaTool {
    connection: Arc<ConnectionHandle>,
}

impl SchemaTool {
    pub fn new(connection: Arc<ConnectionHandle>) -> Self {
        Self { connection }
    }

    fn diagram(conn: &Connection) -> Result<ToolResponse, SqlToolError> {
        let mut tables = Vec::new();
        let mut relationships = Vec::new();
        for name in introspect::list_tables(conn)? {
            let columns = introspect::table_columns(conn, &name)?;
            relationships.extend(introspect::foreign_keys(conn, &name)?);
            tables.push(json!({ "name": name, "columns": columns }));
        }
        Ok(ToolResponse::success()
            .with("tables", tables)
            .with("relationships", relationships)
            .with("schema_version", introspect::schema_version(conn)?))
    }

    fn map_terms(conn: &Connection, terms: &[String]) -> Result<ToolResponse, SqlToolError> {
        let mut catalog = Vec::new();
        for table in introspect::list_tables(conn)? {
            let columns: Vec<String> = introspect::table_columns(conn, &table)?
                .iter()
                .filter_map(|c| c.get("name").and_then(Value::as_str).map(str::to_string))
                .collect();
            catalog.push((table, columns));
        }

        let mut mappings = Map::new();
        let mut unmapped = Vec::new();
        for term in terms {
            let candidates = match_term(term, &catalog);
            if candidates.is_empty() {
                unmapped.push(term.clone());
            } else {
                mappings.insert(term.clone(), Value::Array(candidates));
            }
        }
        Ok(ToolResponse::success()
            .with("mappings", mappings)
            .with("unmapped", unmapped))
    }

    fn dispatch(conn: &Connection, action: SchemaAction) -> Result<ToolResponse, SqlToolError> {
        match action {
            SchemaAction::ListTables => {
                Ok(ToolResponse::success().with("tables", introspect::list_tables(conn)?))
            }
            SchemaAction::GetTableSchema { table_name } => {
                let columns = introspect::table_columns(conn, &table_name)?;
                let foreign_keys = introspect::foreign_keys(conn, &table_name)?;
                Ok(ToolResponse::success()
                    .with("table_name", table_name)
                    .with("columns", columns)
                    .with("foreign_keys", foreign_keys))
            }
            SchemaAction::GetSchemaDiagram => Self::diagram(conn),
            SchemaAction::MapUserTerms { terms } => Self::map_terms(conn, &terms),
        }
    }
}

/// Lowercase, separators collapsed to `_`
fn normalize(term: &str) -> String {
    term.trim()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn singular(word: &str) -> &str {
    word.strip_suffix("ies")
        .or_else(|| word.strip_suffix("es").filter(|w| w.ends_with('s') || w.ends_with('x')))
        .or_else(|| {
            word.strip_suffix('s')
                .filter(|w| !w.ends_with('s') && !w.ends_with('u'))
        })
        .unwrap_or(word)
}

/// Similarity of a user term to a schema identifier, 0.0 when unrelated
fn similarity(term: &str, identifier: &str) -> f64 {
    let identifier = identifier.to_lowercase();
    if term == identifier {
        1.0
    } else if singular(term) == singular(&identifier) {
        0.9
    } else if contains_word(&identifier, singular(term))
        || contains_word(term, singular(&identifier))
    {
        0.6
    } else {
        0.0
    }
}

/// Substring match, ignoring fragments too short to mean anything
fn contains_word(haystack: &str, needle: &str) -> bool {
    needle.len() >= 3 && haystack.contains(needle)
}

fn match_term(term: &str, catalog: &[(String, Vec<String>)]) -> Vec<Value> {
    let term = normalize(term);
    if term.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<(f64, Value)> = Vec::new();
    for (table, columns) in catalog {
        let score = similarity(&term, table);
        if score > 0.0 {
            candidates.push((score, json!({ "table": table, "score": score })));
        }
        for column in columns {
            // columns rank just below an equally similar table
            let score = similarity(&term, column) * 0.9;
            if score > 0.0 {
                candidates.push((
                    score,
                    json!({ "table": table, "column": column, "score": score }),
                ));
            }
        }
    }

    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    candidates
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|(_, candidate)| candidate)
        .collect()
}

#[async_trait]
impl Tool for SchemaTool {
    fn name(&self) -> &str {
        SCHEMA_TOOL
    }

    fn valid_actions(&self) -> &'static [&'static str] {
        &SchemaAction::NAMES
    }

    async fn run(&self, action: &str, params: &Map<String, Value>) -> ToolResponse {
        let action = match SchemaAction::parse(action, params) {
            Ok(action) => action,
            Err(response) => return response,
        };
        let name = action.name();
        let target = params
            .get(CONNECTION_PARAM)
            .and_then(Value::as_str)
            .map(str::to_string);

        match self
            .connection
            .with_connection(target, move |conn| Self::dispatch(conn, action))
            .await
        {
            Ok(response) => {
                debug!(tool = SCHEMA_TOOL, action = name, "Tool action completed");
                response
            }
            Err(e) => {
                warn!(tool = SCHEMA_TOOL, action = name, error = %e, "Tool action failed");
                ToolResponse::error(e.to_string())
            }
        }
    }
}
