//! SQLite catalog queries and value conversion shared by both tools

use super::connection::SqlToolError;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params};
use serde_json::{Number, Value, json};

/// User tables and views, sorted by name
pub fn list_tables(conn: &Connection) -> Result<Vec<String>, SqlToolError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map(params![], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Column descriptors for `table`; unknown tables are an error
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<Value>, SqlToolError> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let columns = stmt
        .query_map(params![table], |row| {
            let not_null: i64 = row.get(2)?;
            let default: Option<String> = row.get(3)?;
            let pk: i64 = row.get(4)?;
            Ok(json!({
                "name": row.get::<_, String>(0)?,
                "type": row.get::<_, String>(1)?,
                "nullable": not_null == 0,
                "default": default,
                "primary_key": pk > 0,
            }))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(SqlToolError::NoSuchTable(table.to_string()));
    }
    Ok(columns)
}

/// Outgoing foreign keys of `table` as relationship objects
pub fn foreign_keys(conn: &Connection, table: &str) -> Result<Vec<Value>, SqlToolError> {
    let mut stmt =
        conn.prepare("SELECT \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?1)")?;
    let keys = stmt
        .query_map(params![table], |row| {
            Ok(json!({
                "from_table": table,
                "from_column": row.get::<_, String>(1)?,
                "to_table": row.get::<_, String>(0)?,
                "to_column": row.get::<_, Option<String>>(2)?,
            }))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}

/// Counter SQLite bumps on every schema change
pub fn schema_version(conn: &Connection) -> Result<i64, SqlToolError> {
    Ok(conn.query_row("PRAGMA schema_version", params![], |row| row.get(0))?)
}

/// Bind parameter from a JSON value; nested values bind as JSON text
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Result cell as JSON; blobs are summarized, not inlined
pub fn to_json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}
