//! Database tool - runs SQL against the configured SQLite target

use super::connection::{ConnectionHandle, SqlToolError};
use super::introspect;
use async_trait::async_trait;
use prism_application::{DATABASE_TOOL, Tool};
use prism_domain::{CONNECTION_PARAM, DatabaseAction, ToolResponse};
use rusqlite::{Connection, params_from_iter};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    pub max_rows: usize,
    pub allow_writes: bool,
}

pub struct DatabaseTool {
    connection: Arc<ConnectionHandle>,
    limits: QueryLimits,
}

impl DatabaseTool {
    pub fn new(connection: Arc<ConnectionHandle>, limits: QueryLimits) -> Self {
        Self { connection, limits }
    }

    fn execute_query(
        conn: &Connection,
        sql: &str,
        bind: &[Value],
        limits: QueryLimits,
    ) -> Result<ToolResponse, SqlToolError> {
        let mut stmt = conn.prepare(sql)?;
        if !stmt.readonly() && !limits.allow_writes {
            return Err(SqlToolError::WriteRejected);
        }
        let values = bind.iter().map(introspect::to_sql_value);

        if stmt.column_count() == 0 {
            let affected = stmt.execute(params_from_iter(values))?;
            return Ok(ToolResponse::success()
                .with("columns", Value::Array(Vec::new()))
                .with("rows", Value::Array(Vec::new()))
                .with("row_count", 0)
                .with("truncated", false)
                .with("rows_affected", affected));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut collected = Vec::new();
        let mut truncated = false;
        while let Some(row) = rows.next()? {
            if collected.len() == limits.max_rows {
                truncated = true;
                break;
            }
            let mut object = Map::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                object.insert(name.clone(), introspect::to_json_value(row.get_ref(i)?));
            }
            collected.push(Value::Object(object));
        }

        let row_count = collected.len();
        Ok(ToolResponse::success()
            .with("columns", columns)
            .with("rows", collected)
            .with("row_count", row_count)
            .with("truncated", truncated))
    }

    /// `EXPLAIN QUERY PLAN` rows as `{id, parent, detail}`
    fn explain_query(conn: &Connection, sql: &str) -> Result<ToolResponse, SqlToolError> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {}", sql))?;
        let plan = stmt
            .query_map([], |row| {
                Ok(json!({
                    "id": row.get::<_, i64>(0)?,
                    "parent": row.get::<_, i64>(1)?,
                    "detail": row.get::<_, String>(3)?,
                }))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ToolResponse::success().with("plan", plan))
    }

    fn dispatch(
        conn: &Connection,
        action: DatabaseAction,
        limits: QueryLimits,
    ) -> Result<ToolResponse, SqlToolError> {
        match action {
            DatabaseAction::ExecuteQuery { query, params } => {
                Self::execute_query(conn, &query, &params, limits)
            }
            DatabaseAction::ExplainQuery { query } => Self::explain_query(conn, &query),
            DatabaseAction::GetTableSchema { table_name } => {
                let columns = introspect::table_columns(conn, &table_name)?;
                Ok(ToolResponse::success()
                    .with("table_name", table_name)
                    .with("columns", columns))
            }
            DatabaseAction::ListTables => {
                Ok(ToolResponse::success().with("tables", introspect::list_tables(conn)?))
            }
        }
    }
}

#[async_trait]
impl Tool for DatabaseTool {
    fn name(&self) -> &str {
        DATABASE_TOOL
    }

    fn valid_actions(&self) -> &'static [&'static str] {
        &DatabaseAction::NAMES
    }

    async fn run(&self, action: &str, params: &Map<String, Value>) -> ToolResponse {
        let action = match DatabaseAction::parse(action, params) {
            Ok(action) => action,
            Err(response) => return response,
        };
        let name = action.name();
        let target = params
            .get(CONNECTION_PARAM)
            .and_then(Value::as_str)
            .map(str::to_string);
        let limits = self.limits;

        match self
            .connection
            .with_connection(target, move |conn| Self::dispatch(conn, action, limits))
            .await
        {
            Ok(response) => {
                debug!(tool = DATABASE_TOOL, action = name, "Tool action completed");
                response
            }
            Err(e) => {
                warn!(tool = DATABASE_TOOL, action = name, error = %e, "Tool action failed");
                ToolResponse::error(e.to_string())
            }
        }
    }
}
