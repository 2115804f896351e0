//! Query performance rating and tuning hints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Excellent,
    Good,
    Acceptable,
    Slow,
    VerySlow,
}

impl PerformanceRating {
    pub fn from_elapsed(elapsed: Duration) -> Self {
        match elapsed.as_millis() {
            0..100 => PerformanceRating::Excellent,
            100..500 => PerformanceRating::Good,
            500..1000 => PerformanceRating::Acceptable,
            1000..3000 => PerformanceRating::Slow,
            _ => PerformanceRating::VerySlow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceRating::Excellent => "excellent",
            PerformanceRating::Good => "good",
            PerformanceRating::Acceptable => "acceptable",
            PerformanceRating::Slow => "slow",
            PerformanceRating::VerySlow => "very_slow",
        }
    }

    fn baseline_suggestions(&self) -> &'static [&'static str] {
        match self {
            PerformanceRating::Excellent | PerformanceRating::Good => &[],
            PerformanceRating::Acceptable => {
                &["Consider adding indexes if this query runs frequently"]
            }
            PerformanceRating::Slow => &[
                "Consider adding indexes on filtered columns",
                "Check for full table scans in the query plan",
                "Consider optimizing JOIN conditions",
            ],
            PerformanceRating::VerySlow => &[
                "Query needs optimization",
                "Check for missing indexes",
                "Consider rewriting with more efficient joins",
                "Consider breaking down into smaller queries",
            ],
        }
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub rating: PerformanceRating,
    pub suggestions: Vec<String>,
}

/// Rate a query by its wall time and flag costly patterns.
///
/// Pattern hints other than `SELECT *` only apply once the query is
/// slower than the "good" band.
pub fn analyze_performance(sql: &str, elapsed: Duration) -> PerformanceReport {
    let rating = PerformanceRating::from_elapsed(elapsed);
    let mut suggestions: Vec<String> = rating
        .baseline_suggestions()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let upper = sql.to_ascii_uppercase();
    let millis = elapsed.as_millis();

    if upper.contains("SELECT *") {
        suggestions.push("Avoid SELECT * - specify only needed columns".to_string());
    }
    if upper.contains("DISTINCT") && millis > 500 {
        suggestions.push("DISTINCT operations can be expensive - check if necessary".to_string());
    }
    if upper.contains("ORDER BY") && !upper.contains("LIMIT") && millis > 500 {
        suggestions.push("Consider adding LIMIT to ORDER BY queries".to_string());
    }
    if upper.matches("JOIN").count() > 2 && millis > 1000 {
        suggestions.push("Multiple JOINs detected - ensure all are necessary".to_string());
    }

    PerformanceReport { rating, suggestions }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bands() {
        let rate = |ms| PerformanceRating::from_elapsed(Duration::from_millis(ms));
        assert_eq!(rate(0), PerformanceRating::Excellent);
        assert_eq!(rate(99), PerformanceRating::Excellent);
        assert_eq!(rate(100), PerformanceRating::Good);
        assert_eq!(rate(750), PerformanceRating::Acceptable);
        assert_eq!(rate(2999), PerformanceRating::Slow);
        assert_eq!(rate(3000), PerformanceRating::VerySlow);
    }

    #[test]
    fn test_fast_select_star_only_flags_star() {
        let report =
            analyze_performance("select * from users order by id", Duration::from_millis(5));
        assert_eq!(report.rating, PerformanceRating::Excellent);
        assert_eq!(report.suggestions, vec!["Avoid SELECT * - specify only needed columns"]);
    }

    #[test]
    fn test_slow_query_pattern_hints() {
        let sql = "SELECT DISTINCT a.x FROM a JOIN b ON 1 JOIN c ON 1 JOIN d ON 1 ORDER BY a.x";
        let report = analyze_performance(sql, Duration::from_millis(1500));
        assert_eq!(report.rating, PerformanceRating::Slow);
        assert!(report.suggestions.iter().any(|s| s.starts_with("DISTINCT")));
        assert!(report.suggestions.iter().any(|s| s.contains("LIMIT")));
        assert!(report.suggestions.iter().any(|s| s.starts_with("Multiple JOINs")));
    }
}
