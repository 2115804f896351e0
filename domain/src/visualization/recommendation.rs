//! Chart recommendation and configuration.

use super::analysis::{ColumnKind, DataAnalysis};
use crate::nlu::entities::Intent;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Scatter,
    Histogram,
    Value,
    Table,
    Treemap,
    Heatmap,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Histogram => "histogram",
            ChartType::Value => "value",
            ChartType::Table => "table",
            ChartType::Treemap => "treemap",
            ChartType::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds on a count; `None` means unbounded.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Bounds {
    const fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// 1.0 inside; partial credit outside
    fn score(&self, actual: usize) -> f64 {
        match (self.min, self.max) {
            (Some(_), Some(max)) if actual > max => 0.3,
            (Some(min), _) if actual < min => 0.1,
            (None, Some(max)) if actual > max => 0.1,
            _ => 1.0,
        }
    }
}

/// Scoring rule for one chart family.
#[derive(Debug, Clone, Copy)]
pub struct ChartRule {
    pub name: &'static str,
    pub chart_type: ChartType,
    pub description: &'static str,
    pub column_count: Bounds,
    pub row_count: Bounds,
    pub needs_date: bool,
    pub min_numeric_columns: usize,
}

impl ChartRule {
    /// Fraction of criteria satisfied, in [0, 1].
    ///
    /// A rule that needs a date column scores zero without one.
    pub fn score(&self, analysis: &DataAnalysis) -> f64 {
        if self.needs_date && !analysis.has_kind(ColumnKind::Date) {
            return 0.0;
        }
        let mut score = self.column_count.score(analysis.column_count)
            + self.row_count.score(analysis.row_count);
        let mut criteria = 2.0;

        if self.needs_date {
            criteria += 1.0;
            score += 1.0;
        }
        if self.min_numeric_columns > 0 {
            criteria += 1.0;
            let numeric = analysis.count_kind(ColumnKind::Numeric);
            if numeric == self.min_numeric_columns {
                score += 1.0;
            } else if numeric > self.min_numeric_columns {
                score += 0.5;
            }
        }
        score / criteria
    }
}

/// Rules in tie-break order.
pub const CHART_RULES: &[ChartRule] = &[
    ChartRule {
        name: "time_series",
        chart_type: ChartType::Line,
        description: "Shows evolution over time",
        column_count: Bounds::new(Some(2), None),
        row_count: Bounds::new(Some(2), None),
        needs_date: true,
        min_numeric_columns: 0,
    },
    ChartRule {
        name: "single_value",
        chart_type: ChartType::Value,
        description: "Displays a single scalar value",
        column_count: Bounds::new(Some(1), Some(1)),
        row_count: Bounds::new(Some(1), Some(1)),
        needs_date: false,
        min_numeric_columns: 0,
    },
    ChartRule {
        name: "comparison",
        chart_type: ChartType::Bar,
        description: "Compares values across categories",
        column_count: Bounds::new(Some(2), Some(2)),
        row_count: Bounds::new(Some(1), Some(10)),
        needs_date: false,
        min_numeric_columns: 0,
    },
    ChartRule {
        name: "distribution",
        chart_type: ChartType::Histogram,
        description: "Shows distribution of values",
        column_count: Bounds::new(Some(1), Some(2)),
        row_count: Bounds::new(Some(10), None),
        needs_date: false,
        min_numeric_columns: 1,
    },
    ChartRule {
        name: "relationship",
        chart_type: ChartType::Scatter,
        description: "Shows relationship between variables",
        column_count: Bounds::new(Some(2), Some(3)),
        row_count: Bounds::new(Some(5), None),
        needs_date: false,
        min_numeric_columns: 2,
    },
    ChartRule {
        name: "part_to_whole",
        chart_type: ChartType::Pie,
        description: "Shows composition of a whole",
        column_count: Bounds::new(Some(2), Some(2)),
        row_count: Bounds::new(Some(2), Some(10)),
        needs_date: false,
        min_numeric_columns: 0,
    },
];

const CHART_KEYWORDS: &[(&str, ChartType)] = &[
    ("bar chart", ChartType::Bar),
    ("bar graph", ChartType::Bar),
    ("pie chart", ChartType::Pie),
    ("line chart", ChartType::Line),
    ("line graph", ChartType::Line),
    ("scatter plot", ChartType::Scatter),
    ("histogram", ChartType::Histogram),
    ("treemap", ChartType::Treemap),
    ("heatmap", ChartType::Heatmap),
];

const EXPLICIT_CONFIDENCE: f64 = 0.9;
const MIN_RULE_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecommendation {
    pub chart_type: ChartType,
    pub reason: String,
    pub confidence: f64,
}

/// Chart the user asked for, from the query wording or a chart-shaped intent.
pub fn explicit_chart_request(intent: Option<Intent>, query: &str) -> Option<ChartType> {
    let lowered = query.to_lowercase();
    if let Some((_, chart)) = CHART_KEYWORDS.iter().find(|(kw, _)| lowered.contains(kw)) {
        return Some(*chart);
    }
    match intent {
        Some(Intent::TrendAnalysis) => Some(ChartType::Line),
        Some(Intent::Comparison) => Some(ChartType::Bar),
        _ if lowered.contains("over time") => Some(ChartType::Line),
        _ if lowered.contains("distribution") => Some(ChartType::Histogram),
        _ if lowered.contains("correlation") || lowered.contains("relationship") => {
            Some(ChartType::Scatter)
        }
        _ => None,
    }
}

pub fn recommend_chart(
    analysis: &DataAnalysis,
    intent: Option<Intent>,
    query: &str,
) -> ChartRecommendation {
    if let Some(chart_type) = explicit_chart_request(intent, query) {
        return ChartRecommendation {
            chart_type,
            reason: "Explicitly requested in query".to_string(),
            confidence: EXPLICIT_CONFIDENCE,
        };
    }

    // First rule wins ties
    let best = CHART_RULES
        .iter()
        .map(|rule| (rule, rule.score(analysis)))
        .fold(None::<(&ChartRule, f64)>, |best, (rule, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((rule, score)),
        });

    match best {
        Some((rule, score)) if score >= MIN_RULE_CONFIDENCE => ChartRecommendation {
            chart_type: rule.chart_type,
            reason: rule.description.to_string(),
            confidence: score,
        },
        _ if analysis.row_count <= 10 => ChartRecommendation {
            chart_type: ChartType::Bar,
            reason: "Default for small datasets".to_string(),
            confidence: MIN_RULE_CONFIDENCE,
        },
        _ => ChartRecommendation {
            chart_type: ChartType::Table,
            reason: "Default for large datasets".to_string(),
            confidence: MIN_RULE_CONFIDENCE,
        },
    }
}

/// Axis assignment for the recommended chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub y: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub title: String,
}

pub fn build_chart_config(chart_type: ChartType, analysis: &DataAnalysis) -> ChartConfig {
    let names_of = |kind: ColumnKind| -> Vec<String> {
        analysis
            .columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    };
    let numeric = names_of(ColumnKind::Numeric);
    let label = analysis
        .first_of(ColumnKind::Date)
        .or_else(|| analysis.first_of(ColumnKind::Categorical))
        .or_else(|| analysis.first_of(ColumnKind::Text))
        .map(|c| c.name.clone());

    let (x, y, series) = match chart_type {
        ChartType::Line | ChartType::Bar | ChartType::Pie => {
            let series = (chart_type == ChartType::Line)
                .then(|| names_of(ColumnKind::Categorical).into_iter().next())
                .flatten()
                .filter(|s| Some(s) != label.as_ref());
            (label, numeric, series)
        }
        ChartType::Scatter => {
            let mut it = numeric.into_iter();
            let x = it.next();
            (x, it.take(1).collect(), label)
        }
        ChartType::Histogram | ChartType::Value => {
            let y = numeric
                .into_iter()
                .next()
                .or_else(|| analysis.columns.first().map(|c| c.name.clone()));
            (None, y.into_iter().collect(), None)
        }
        ChartType::Table | ChartType::Treemap | ChartType::Heatmap => (
            None,
            analysis.columns.iter().map(|c| c.name.clone()).collect(),
            None,
        ),
    };

    ChartConfig {
        chart_type,
        title: match (&x, y.first()) {
            (Some(x), Some(y)) => format!("{} by {}", y, x),
            (None, Some(y)) => y.clone(),
            _ => "Query result".to_string(),
        },
        x,
        y,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualization::analysis::ColumnAnalysis;

    fn col(name: &str, kind: ColumnKind) -> ColumnAnalysis {
        ColumnAnalysis {
            name: name.to_string(),
            kind,
            unique_count: 0,
            min: None,
            max: None,
            avg: None,
        }
    }

    fn analysis(rows: usize, columns: Vec<ColumnAnalysis>) -> DataAnalysis {
        DataAnalysis {
            row_count: rows,
            column_count: columns.len(),
            columns,
        }
    }

    #[test]
    fn test_explicit_request_wins() {
        let data = analysis(1, vec![col("total", ColumnKind::Numeric)]);
        let rec = recommend_chart(&data, None, "show a pie chart of totals");
        assert_eq!(rec.chart_type, ChartType::Pie);
        assert_eq!(rec.confidence, 0.9);

        let rec = recommend_chart(&data, Some(Intent::TrendAnalysis), "revenue");
        assert_eq!(rec.chart_type, ChartType::Line);
    }

    #[test]
    fn test_single_value() {
        let data = analysis(1, vec![col("total", ColumnKind::Numeric)]);
        let rec = recommend_chart(&data, Some(Intent::Aggregation), "how many users");
        assert_eq!(rec.chart_type, ChartType::Value);
        assert_eq!(rec.confidence, 1.0);
    }

    #[test]
    fn test_time_series() {
        let data = analysis(
            30,
            vec![col("day", ColumnKind::Date), col("signups", ColumnKind::Numeric)],
        );
        let rec = recommend_chart(&data, None, "signups per day");
        assert_eq!(rec.chart_type, ChartType::Line);

        let config = build_chart_config(rec.chart_type, &data);
        assert_eq!(config.x.as_deref(), Some("day"));
        assert_eq!(config.y, vec!["signups"]);
        assert_eq!(config.title, "signups by day");
    }

    #[test]
    fn test_small_categorical_prefers_bar_over_pie() {
        let data = analysis(
            4,
            vec![col("region", ColumnKind::Categorical), col("sales", ColumnKind::Numeric)],
        );
        let rec = recommend_chart(&data, None, "sales per region");
        assert_eq!(rec.chart_type, ChartType::Bar);
    }

    #[test]
    fn test_wide_table_falls_back_to_table() {
        let columns = (0..8).map(|i| col(&format!("c{}", i), ColumnKind::Text)).collect();
        let data = analysis(500, columns);
        let rec = recommend_chart(&data, None, "everything");
        assert_eq!(rec.chart_type, ChartType::Table);
        assert_eq!(rec.confidence, 0.5);
        assert_eq!(build_chart_config(rec.chart_type, &data).y.len(), 8);
    }
}
