//! Closed action sets for the schema and database tools.
//!
//! `parse` turns the wire form (`action` string + named params) into a
//! typed variant, or into the error [`ToolResponse`] the tool returns as-is.

use super::value_objects::ToolResponse;
use serde_json::{Map, Value};

/// Parameter overriding the tool's connection target for one call.
pub const CONNECTION_PARAM: &str = "connection";

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaAction {
    ListTables,
    GetTableSchema { table_name: String },
    GetSchemaDiagram,
    MapUserTerms { terms: Vec<String> },
}

impl SchemaAction {
    pub const NAMES: [&'static str; 4] = [
        "list_tables",
        "get_table_schema",
        "get_schema_diagram",
        "map_user_terms",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SchemaAction::ListTables => "list_tables",
            SchemaAction::GetTableSchema { .. } => "get_table_schema",
            SchemaAction::GetSchemaDiagram => "get_schema_diagram",
            SchemaAction::MapUserTerms { .. } => "map_user_terms",
        }
    }

    pub fn parse(action: &str, params: &Map<String, Value>) -> Result<Self, ToolResponse> {
        match action {
            "list_tables" => Ok(SchemaAction::ListTables),
            "get_table_schema" => Ok(SchemaAction::GetTableSchema {
                table_name: required_str(action, params, "table_name")?,
            }),
            "get_schema_diagram" => Ok(SchemaAction::GetSchemaDiagram),
            "map_user_terms" => {
                let terms = params
                    .get("terms")
                    .and_then(Value::as_array)
                    .ok_or_else(|| ToolResponse::missing_param(action, "terms"))?
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                Ok(SchemaAction::MapUserTerms { terms })
            }
            other => Err(ToolResponse::unknown_action(other, &Self::NAMES)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseAction {
    ExecuteQuery { query: String, params: Vec<Value> },
    /// `EXPLAIN QUERY PLAN` for a query, without running it
    ExplainQuery { query: String },
    GetTableSchema { table_name: String },
    ListTables,
}

impl DatabaseAction {
    pub const NAMES: [&'static str; 4] = [
        "execute_query",
        "explain_query",
        "get_table_schema",
        "list_tables",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatabaseAction::ExecuteQuery { .. } => "execute_query",
            DatabaseAction::ExplainQuery { .. } => "explain_query",
            DatabaseAction::GetTableSchema { .. } => "get_table_schema",
            DatabaseAction::ListTables => "list_tables",
        }
    }

    pub fn parse(action: &str, params: &Map<String, Value>) -> Result<Self, ToolResponse> {
        match action {
            "execute_query" => Ok(DatabaseAction::ExecuteQuery {
                query: required_str(action, params, "query")?,
                params: params
                    .get("params")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
            }),
            "explain_query" => Ok(DatabaseAction::ExplainQuery {
                query: required_str(action, params, "query")?,
            }),
            "get_table_schema" => Ok(DatabaseAction::GetTableSchema {
                table_name: required_str(action, params, "table_name")?,
            }),
            "list_tables" => Ok(DatabaseAction::ListTables),
            other => Err(ToolResponse::unknown_action(other, &Self::NAMES)),
        }
    }
}

fn required_str(
    action: &str,
    params: &Map<String, Value>,
    key: &str,
) -> Result<String, ToolResponse> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ToolResponse::missing_param(action, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_schema_action_parse() {
        assert_eq!(
            SchemaAction::parse("get_table_schema", &params(json!({"table_name": "users"}))),
            Ok(SchemaAction::GetTableSchema { table_name: "users".into() })
        );
        assert_eq!(
            SchemaAction::parse("map_user_terms", &params(json!({"terms": ["customers", 3]}))),
            Ok(SchemaAction::MapUserTerms { terms: vec!["customers".into()] })
        );
    }

    #[test]
    fn test_missing_param_is_error_response() {
        let err = SchemaAction::parse("get_table_schema", &Map::new()).unwrap_err();
        assert!(!err.is_success());
        assert!(err.message().unwrap().contains("table_name"));

        let err = DatabaseAction::parse("execute_query", &params(json!({"query": "  "})))
            .unwrap_err();
        assert!(err.message().unwrap().contains("query"));

        let err = DatabaseAction::parse("explain_query", &Map::new()).unwrap_err();
        assert!(err.message().unwrap().contains("query"));
    }

    #[test]
    fn test_unknown_action_carries_valid_actions() {
        let err = DatabaseAction::parse("truncate", &Map::new()).unwrap_err();
        assert_eq!(
            err.get("valid_actions"),
            Some(&json!(["execute_query", "explain_query", "get_table_schema", "list_tables"]))
        );
        let err = SchemaAction::parse("", &Map::new()).unwrap_err();
        assert_eq!(err.get("valid_actions").and_then(Value::as_array).map(Vec::len), Some(4));
    }

    #[test]
    fn test_execute_query_params() {
        let action = DatabaseAction::parse(
            "execute_query",
            &params(json!({"query": "SELECT * FROM users WHERE id = ?", "params": [7]})),
        )
        .unwrap();
        assert_eq!(action.name(), "execute_query");
        assert_eq!(
            action,
            DatabaseAction::ExecuteQuery {
                query: "SELECT * FROM users WHERE id = ?".into(),
                params: vec![json!(7)],
            }
        );
    }
}
