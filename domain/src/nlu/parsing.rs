//! Parsing NLU responses from LLM output, with a deterministic fallback.
//!
//! [`parse_nlu_response`] is the narrow boundary between untrusted model text
//! and [`NluOutput`]. When it fails the agent uses [`keyword_fallback`].

use super::entities::{Ambiguity, Entity, Intent, NluOutput, SCHEMA_CONTEXT_NEED, clamp_confidence};
use crate::util::{extract_fenced_block, extract_json_object};
use serde_json::Value;
use thiserror::Error;

/// Confidence assigned to keyword-derived classifications.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// LLM output could not be turned into structured data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("response contains no JSON object")]
    NoJson,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("no SQL statement found in response")]
    NoSql,

    #[error("expected a single SQL statement, found {0}")]
    MultipleStatements(usize),

    #[error("model not available: {0}")]
    ModelUnavailable(String),
}

/// Parse an NLU response.
///
/// Accepts a ` ```json ` fenced block, or any text containing a JSON object.
/// `intent` is required; unknown intent labels map to [`Intent::Unknown`],
/// confidence is clamped to [0, 1] (missing → 0.5).
pub fn parse_nlu_response(response: &str) -> Result<NluOutput, ParseError> {
    let candidate = extract_fenced_block(response, "json")
        .or_else(|| extract_json_object(response))
        .ok_or(ParseError::NoJson)?;

    let json: Value =
        serde_json::from_str(candidate).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let intent = json
        .get("intent")
        .and_then(|v| match v {
            Value::String(s) => Some(s.as_str()),
            // {"intent": {"name": "...", "confidence": ...}}
            Value::Object(o) => o.get("name").and_then(Value::as_str),
            _ => None,
        })
        .map(Intent::from_label)
        .ok_or(ParseError::MissingField("intent"))?;

    let confidence = json
        .get("confidence")
        .or_else(|| json.get("intent").and_then(|i| i.get("confidence")))
        .and_then(Value::as_f64)
        .unwrap_or(0.5);

    let mut output = NluOutput::new(intent, clamp_confidence(confidence));
    output.entities = json
        .get("entities")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_entity).collect())
        .unwrap_or_default();
    output.ambiguities = json
        .get("ambiguities")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_ambiguity).collect())
        .unwrap_or_default();

    if let Some(needs) = json.get("context_needs").and_then(Value::as_array) {
        for need in needs.iter().filter_map(Value::as_str) {
            output.require(need);
        }
    }
    if json.get("needs_schema").and_then(Value::as_bool) == Some(true) {
        output.require(SCHEMA_CONTEXT_NEED);
    }

    Ok(output)
}

fn parse_entity(value: &Value) -> Option<Entity> {
    let obj = value.as_object()?;
    let entity_value = obj.get("value").cloned().unwrap_or(Value::Null);
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| entity_value.as_str().map(str::to_string))?;
    let entity_type = obj
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    Some(Entity::new(name, entity_value, entity_type))
}

fn parse_ambiguity(value: &Value) -> Option<Ambiguity> {
    match value {
        Value::String(s) => Some(Ambiguity {
            term: s.clone(),
            possible_meanings: Vec::new(),
        }),
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

/// Keyword table for the fallback classifier, checked in order.
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::AnomalyDetection, &["anomaly", "anomalies", "outlier", "unusual", "spike"]),
    (Intent::Prediction, &["predict", "forecast", "projection", "next month", "next year"]),
    (Intent::TrendAnalysis, &["trend", "over time", "growth", "monthly", "weekly", "history"]),
    (Intent::Comparison, &["compare", "comparison", " vs ", "versus", "difference between"]),
    (Intent::Aggregation, &["total", "sum", "average", "count", "how many", "maximum", "minimum"]),
    (Intent::ReportGeneration, &["report", "summary", "summarize", "dashboard", "chart"]),
    (Intent::DataRetrieval, &["show", "list", "get", "find", "display", "fetch", "which", "what"]),
];

/// Deterministic classification used when the model is unavailable or its
/// output cannot be parsed.
///
/// Entities are taken from quoted phrases (`"..."` or `'...'`) and numbers.
/// The schema stage is requested unless the caller already holds a schema.
pub fn keyword_fallback(text: &str, schema_known: bool) -> NluOutput {
    let lowered = format!(" {} ", text.to_lowercase());
    let intent = INTENT_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown);

    let mut output = NluOutput::new(intent, FALLBACK_CONFIDENCE);
    output.source = "fallback".to_string();
    output.entities = extract_literal_entities(text);
    if !schema_known {
        output.require(SCHEMA_CONTEXT_NEED);
    }
    output
}

fn extract_literal_entities(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for quote in ['"', '\''] {
        let mut parts = text.split(quote);
        parts.next();
        while let (Some(inner), Some(_)) = (parts.next(), parts.clone().next()) {
            let inner = inner.trim();
            if !inner.is_empty() {
                entities.push(Entity::new(inner, inner, "literal"));
            }
            parts.next();
        }
    }

    for word in text.split_whitespace() {
        let token = word.trim_matches(|c: char| !c.is_ascii_digit() && c != '.');
        if token.is_empty() || !token.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(n) = token.parse::<i64>() {
            entities.push(Entity::new(token, n, "number"));
        } else if let Ok(n) = token.parse::<f64>()
            && let Some(num) = serde_json::Number::from_f64(n)
        {
            entities.push(Entity::new(token, Value::Number(num), "number"));
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_json() {
        let response = r#"
Here is the analysis:
```json
{"intent": "data_retrieval", "confidence": 0.9,
 "entities": [{"name": "users", "value": "users", "type": "table"}],
 "needs_schema": true}
```
"#;
        let out = parse_nlu_response(response).unwrap();
        assert_eq!(out.intent, Intent::DataRetrieval);
        assert_eq!(out.confidence, 0.9);
        assert_eq!(out.entities[0].entity_type, "table");
        assert!(out.needs_schema());
        assert_eq!(out.source, "llm");
    }

    #[test]
    fn test_parse_raw_json_with_unknown_intent_and_high_confidence() {
        let out = parse_nlu_response(r#"{"intent": "forecasting", "confidence": 3}"#).unwrap();
        assert_eq!(out.intent, Intent::Unknown);
        assert_eq!(out.confidence, 1.0);
    }

    #[test]
    fn test_parse_nested_intent_object() {
        let out =
            parse_nlu_response(r#"{"intent": {"name": "comparison", "confidence": 0.7}}"#).unwrap();
        assert_eq!(out.intent, Intent::Comparison);
        assert_eq!(out.confidence, 0.7);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_nlu_response("I am not sure."), Err(ParseError::NoJson));
        assert!(matches!(
            parse_nlu_response("{intent: oops}"),
            Err(ParseError::InvalidJson(_))
        ));
        assert_eq!(
            parse_nlu_response(r#"{"confidence": 0.4}"#),
            Err(ParseError::MissingField("intent"))
        );
    }

    #[test]
    fn test_parse_string_ambiguities() {
        let out =
            parse_nlu_response(r#"{"intent": "aggregation", "ambiguities": ["revenue"]}"#).unwrap();
        assert_eq!(out.ambiguities[0].term, "revenue");
    }

    #[test]
    fn test_keyword_fallback_intents() {
        assert_eq!(
            keyword_fallback("Show me a list of all users", false).intent,
            Intent::DataRetrieval
        );
        assert_eq!(keyword_fallback("Compare sales vs returns", false).intent, Intent::Comparison);
        assert_eq!(keyword_fallback("monthly revenue trend", false).intent, Intent::TrendAnalysis);
        assert_eq!(keyword_fallback("How many orders shipped", false).intent, Intent::Aggregation);
        assert_eq!(keyword_fallback("forecast demand", false).intent, Intent::Prediction);
        assert_eq!(keyword_fallback("xyzzy", false).intent, Intent::Unknown);
    }

    #[test]
    fn test_keyword_fallback_metadata() {
        let out = keyword_fallback("find orders for 'Acme Corp' above 250", false);
        assert_eq!(out.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(out.source, "fallback");
        assert!(out.needs_schema());
        let names: Vec<_> = out.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Corp", "250"]);

        assert!(!keyword_fallback("list users", true).needs_schema());
    }
}
