//! NLU output types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Context need signalling that the schema stage should run.
pub const SCHEMA_CONTEXT_NEED: &str = "schema_version";

/// Closed set of query intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    DataRetrieval,
    ReportGeneration,
    TrendAnalysis,
    Comparison,
    Aggregation,
    Prediction,
    AnomalyDetection,
    #[default]
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::DataRetrieval,
        Intent::ReportGeneration,
        Intent::TrendAnalysis,
        Intent::Comparison,
        Intent::Aggregation,
        Intent::Prediction,
        Intent::AnomalyDetection,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::DataRetrieval => "data_retrieval",
            Intent::ReportGeneration => "report_generation",
            Intent::TrendAnalysis => "trend_analysis",
            Intent::Comparison => "comparison",
            Intent::Aggregation => "aggregation",
            Intent::Prediction => "prediction",
            Intent::AnomalyDetection => "anomaly_detection",
            Intent::Unknown => "unknown",
        }
    }

    /// Lenient conversion: anything outside the closed set becomes `Unknown`.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Intent::Unknown)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Intent::ALL
            .into_iter()
            .find(|i| i.as_str() == normalized)
            .ok_or_else(|| format!("Unknown intent: {}", s))
    }
}

/// Named value extracted from the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub entity_type: String,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// Part of the query the NLU stage could not resolve on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ambiguity {
    pub term: String,
    #[serde(default)]
    pub possible_meanings: Vec<String>,
}

/// Structured payload of the NLU agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluOutput {
    pub intent: Intent,
    /// Always within [0, 1]
    pub confidence: f64,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub ambiguities: Vec<Ambiguity>,
    #[serde(default)]
    pub context_needs: Vec<String>,
    /// `"llm"` or `"fallback"`
    #[serde(default)]
    pub source: String,
}

impl NluOutput {
    pub fn new(intent: Intent, confidence: f64) -> Self {
        Self {
            intent,
            confidence: clamp_confidence(confidence),
            entities: Vec::new(),
            ambiguities: Vec::new(),
            context_needs: Vec::new(),
            source: "llm".to_string(),
        }
    }

    pub fn needs_schema(&self) -> bool {
        self.context_needs.iter().any(|n| n == SCHEMA_CONTEXT_NEED)
    }

    /// Adds a context need once.
    pub fn require(&mut self, need: &str) {
        if !self.context_needs.iter().any(|n| n == need) {
            self.context_needs.push(need.to_string());
        }
    }
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parsing_is_lenient_about_case_and_separators() {
        assert_eq!("Data Retrieval".parse::<Intent>(), Ok(Intent::DataRetrieval));
        assert_eq!("anomaly-detection".parse::<Intent>(), Ok(Intent::AnomalyDetection));
        assert!("forecasting".parse::<Intent>().is_err());
        assert_eq!(Intent::from_label("forecasting"), Intent::Unknown);
    }

    #[test]
    fn test_nlu_output_clamps_confidence() {
        assert_eq!(NluOutput::new(Intent::Comparison, 1.7).confidence, 1.0);
        assert_eq!(NluOutput::new(Intent::Comparison, -0.2).confidence, 0.0);
        assert_eq!(NluOutput::new(Intent::Comparison, f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_require_is_idempotent() {
        let mut out = NluOutput::new(Intent::Unknown, 0.1);
        out.require(SCHEMA_CONTEXT_NEED);
        out.require(SCHEMA_CONTEXT_NEED);
        assert_eq!(out.context_needs.len(), 1);
        assert!(out.needs_schema());
    }

    #[test]
    fn test_entity_serializes_type_field() {
        let json = serde_json::to_value(Entity::new("table", "users", "table")).unwrap();
        assert_eq!(json["type"], "table");
        assert_eq!(json["value"], "users");
    }
}
