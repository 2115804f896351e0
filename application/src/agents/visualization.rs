//! Visualization agent - chart recommendation for a query result.
//!
//! With execution output in context the result rows are analyzed; without
//! it (e.g. in collaborate mode) the recommendation comes from the query
//! wording and NLU intent alone, at lower confidence.

use crate::ports::agent::Agent;
use async_trait::async_trait;
use prism_domain::visualization::{
    analyze_data, build_chart_config, explicit_chart_request, recommend_chart,
};
use prism_domain::{
    AgentContext, AgentDescriptor, AgentInput, AgentResult, AgentRole, ChartType, Intent, keys,
};
use serde_json::{Map, Value, json};

const INTENT_ONLY_CONFIDENCE: f64 = 0.4;

pub struct VisualizationAgent {
    descriptor: AgentDescriptor,
}

impl Default for VisualizationAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualizationAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::for_role(AgentRole::Visualization),
        }
    }

    fn recommend_from_data(
        &self,
        data: &Value,
        intent: Option<Intent>,
        query: &str,
    ) -> Value {
        let rows: Vec<Map<String, Value>> = data
            .get("rows")
            .and_then(Value::as_array)
            .map(|rows| rows.iter().filter_map(|r| r.as_object().cloned()).collect())
            .unwrap_or_default();
        let columns: Vec<String> = match data.get("columns").and_then(Value::as_array) {
            Some(cols) => cols
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => rows
                .first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default(),
        };

        let analysis = analyze_data(&columns, &rows);
        let recommendation = recommend_chart(&analysis, intent, query);
        let config = build_chart_config(recommendation.chart_type, &analysis);

        json!({
            "chart_type": recommendation.chart_type,
            "reason": recommendation.reason,
            "confidence": recommendation.confidence,
            "config": config,
            "analysis": analysis,
        })
    }

    fn recommend_from_intent(&self, intent: Option<Intent>, query: &str) -> Value {
        let (chart_type, reason) = match explicit_chart_request(intent, query) {
            Some(chart) => (chart, "Requested by query or intent"),
            None => match intent {
                Some(Intent::Aggregation) => {
                    (ChartType::Value, "Aggregates usually yield a single value")
                }
                Some(Intent::Prediction) | Some(Intent::AnomalyDetection) => {
                    (ChartType::Line, "Forecasts and anomalies read best over time")
                }
                Some(Intent::ReportGeneration) => (ChartType::Bar, "Reports summarize by category"),
                _ => (ChartType::Table, "No data yet; tabular view"),
            },
        };
        json!({
            "chart_type": chart_type,
            "reason": reason,
            "confidence": INTENT_ONLY_CONFIDENCE,
            "config": { "type": chart_type, "title": query },
        })
    }
}

#[async_trait]
impl Agent for VisualizationAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn process(&self, input: &AgentInput, context: &AgentContext) -> AgentResult {
        let query = context.query_text().or_else(|| input.as_text()).unwrap_or_default();
        let intent = context.intent();

        let data = match input {
            AgentInput::Structured(v) if v.get("rows").is_some() => Some(v),
            _ => context.get(keys::EXECUTION),
        };

        let payload = match data {
            Some(data) => self.recommend_from_data(data, intent, query),
            None => self.recommend_from_intent(intent, query),
        };
        AgentResult::success(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recommends_from_execution_rows() {
        let ctx = AgentContext::new().with(keys::QUERY, json!("signups per day")).with(
            keys::EXECUTION,
            json!({
                "columns": ["day", "signups"],
                "rows": [
                    {"day": "2024-03-01", "signups": 4},
                    {"day": "2024-03-02", "signups": 9},
                    {"day": "2024-03-03", "signups": 7}
                ]
            }),
        );
        let r = VisualizationAgent::new().process(&AgentInput::text("signups per day"), &ctx).await;
        let payload = r.payload().unwrap();
        assert_eq!(payload["chart_type"], "line");
        assert_eq!(payload["config"]["x"], "day");
        assert_eq!(payload["config"]["y"], json!(["signups"]));
    }

    #[tokio::test]
    async fn test_intent_only_recommendation() {
        let ctx = AgentContext::new()
            .with(keys::QUERY, json!("how did revenue change"))
            .with(keys::NLU, json!({"intent": "trend_analysis"}));
        let r = VisualizationAgent::new().process(&AgentInput::text("x"), &ctx).await;
        let payload = r.payload().unwrap();
        assert_eq!(payload["chart_type"], "line");
        assert_eq!(payload["confidence"], 0.4);
    }

    #[tokio::test]
    async fn test_structured_rows_input() {
        let input = AgentInput::Structured(json!({"rows": [{"total": 42}]}));
        let r = VisualizationAgent::new().process(&input, &AgentContext::new()).await;
        assert_eq!(r.payload().unwrap()["chart_type"], "value");
    }
}
