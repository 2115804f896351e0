//! Column-level analysis of a query result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

const DATE_NAME_HINTS: &[&str] = &["date", "time", "year", "month", "day"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Date,
    Numeric,
    Categorical,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAnalysis {
    pub name: String,
    pub kind: ColumnKind,
    pub unique_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAnalysis {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnAnalysis>,
}

impl DataAnalysis {
    pub fn has_kind(&self, kind: ColumnKind) -> bool {
        self.columns.iter().any(|c| c.kind == kind)
    }

    pub fn count_kind(&self, kind: ColumnKind) -> usize {
        self.columns.iter().filter(|c| c.kind == kind).count()
    }

    pub fn first_of(&self, kind: ColumnKind) -> Option<&ColumnAnalysis> {
        self.columns.iter().find(|c| c.kind == kind)
    }
}

/// Analyze rows given as JSON objects keyed by column name.
pub fn analyze_data(columns: &[String], rows: &[Map<String, Value>]) -> DataAnalysis {
    DataAnalysis {
        row_count: rows.len(),
        column_count: columns.len(),
        columns: columns
            .iter()
            .map(|name| analyze_column(name, rows))
            .collect(),
    }
}

fn analyze_column(name: &str, rows: &[Map<String, Value>]) -> ColumnAnalysis {
    let values: Vec<&Value> = rows
        .iter()
        .filter_map(|row| row.get(name))
        .filter(|v| !v.is_null())
        .collect();

    let unique_count = values
        .iter()
        .map(|v| v.to_string())
        .collect::<HashSet<_>>()
        .len();

    let numbers: Vec<f64> = values.iter().filter_map(|v| as_number(v)).collect();

    let lowered = name.to_lowercase();
    let date_named = DATE_NAME_HINTS.iter().any(|h| lowered.contains(h));
    let all_dates = !values.is_empty() && values.iter().all(|v| looks_like_date(v));

    let mut analysis = ColumnAnalysis {
        name: name.to_string(),
        kind: ColumnKind::Text,
        unique_count,
        min: None,
        max: None,
        avg: None,
    };

    if date_named || all_dates {
        analysis.kind = ColumnKind::Date;
    } else if !values.is_empty() && numbers.len() as f64 / values.len() as f64 > 0.7 {
        analysis.kind = ColumnKind::Numeric;
        analysis.min = numbers.iter().copied().reduce(f64::min);
        analysis.max = numbers.iter().copied().reduce(f64::max);
        analysis.avg = Some(numbers.iter().sum::<f64>() / numbers.len() as f64);
    } else if !values.is_empty() && (unique_count as f64) < 0.5 * values.len() as f64 {
        analysis.kind = ColumnKind::Categorical;
    }

    analysis
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Heuristic: separators plus at least four digits, or a plausible year.
fn looks_like_date(value: &Value) -> bool {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.is_u64() => n.to_string(),
        _ => return false,
    };
    let has_separator = text.contains(['/', '-', '.']);
    let digits = text.chars().filter(char::is_ascii_digit).count();
    if has_separator && digits >= 4 && !text.contains(char::is_alphabetic) {
        return true;
    }
    text.parse::<u32>()
        .map(|year| (1900..=2100).contains(&year))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Map<String, Value>> {
        value
            .as_array()
            .map(|a| a.iter().filter_map(|r| r.as_object().cloned()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_column_kinds() {
        let data = rows(json!([
            {"created_at": "2024-01-01", "region": "east", "amount": 10, "note": "a"},
            {"created_at": "2024-01-02", "region": "east", "amount": 20, "note": "b"},
            {"created_at": "2024-01-03", "region": "east", "amount": 30, "note": "c"},
            {"created_at": "2024-01-04", "region": "west", "amount": "40", "note": "d"},
            {"created_at": "2024-01-05", "region": "east", "amount": 50, "note": "e"}
        ]));
        let cols: Vec<String> = ["created_at", "region", "amount", "note"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let analysis = analyze_data(&cols, &data);

        assert_eq!(analysis.row_count, 5);
        assert_eq!(analysis.columns[0].kind, ColumnKind::Date);
        assert_eq!(analysis.columns[1].kind, ColumnKind::Categorical);
        assert_eq!(analysis.columns[2].kind, ColumnKind::Numeric);
        assert_eq!(analysis.columns[2].avg, Some(30.0));
        assert_eq!(analysis.columns[2].max, Some(50.0));
        assert_eq!(analysis.columns[3].kind, ColumnKind::Text);
    }

    #[test]
    fn test_date_detection_by_value() {
        assert!(looks_like_date(&json!("03/14/2023")));
        assert!(looks_like_date(&json!(1999)));
        assert!(!looks_like_date(&json!("abc-1234")));
        assert!(!looks_like_date(&json!(42)));
    }

    #[test]
    fn test_empty_result() {
        let analysis = analyze_data(&["total".to_string()], &[]);
        assert_eq!(analysis.row_count, 0);
        assert_eq!(analysis.columns[0].kind, ColumnKind::Text);
    }
}
