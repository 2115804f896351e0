//! NLU agent - intent classification and entity extraction.

use crate::ports::agent::{Agent, reject_empty_input};
use crate::ports::llm_gateway::LlmGateway;
use async_trait::async_trait;
use prism_domain::nlu::{keyword_fallback, parse_nlu_response};
use prism_domain::{
    AgentContext, AgentDescriptor, AgentInput, AgentResult, AgentRole, ErrorInfo, NluOutput,
    PromptTemplate, SCHEMA_CONTEXT_NEED, keys,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct NluAgent {
    descriptor: AgentDescriptor,
    gateway: Arc<dyn LlmGateway>,
    model: String,
}

impl NluAgent {
    pub fn new(gateway: Arc<dyn LlmGateway>, model: impl Into<String>) -> Self {
        Self {
            descriptor: AgentDescriptor::for_role(AgentRole::Nlu),
            gateway,
            model: model.into(),
        }
    }

    async fn classify(&self, text: &str, context: &AgentContext) -> NluOutput {
        let schema_known = context.contains(keys::SCHEMA);
        let schema_summary = context
            .get(keys::SCHEMA)
            .map(super::schema::summarize_schema);
        let prompt = PromptTemplate::nlu_query(text, schema_summary.as_deref());

        let parsed = match self
            .gateway
            .generate(&self.model, &PromptTemplate::nlu_system(), &prompt)
            .await
        {
            Ok(response) => parse_nlu_response(&response).map_err(|e| {
                warn!(
                    agent = %self.descriptor.id,
                    error = %e,
                    "Unparseable NLU response, using keyword fallback"
                );
            }),
            Err(e) => {
                warn!(
                    agent = %self.descriptor.id,
                    error = %e,
                    "NLU model call failed, using keyword fallback"
                );
                Err(())
            }
        };

        let mut output = parsed.unwrap_or_else(|_| keyword_fallback(text, schema_known));
        if schema_known {
            output.context_needs.retain(|n| n != SCHEMA_CONTEXT_NEED);
        }
        output
    }
}

#[async_trait]
impl Agent for NluAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn process(&self, input: &AgentInput, context: &AgentContext) -> AgentResult {
        if let Some(rejected) = reject_empty_input(&self.descriptor, input) {
            return rejected;
        }
        let Some(text) = input.as_text().or_else(|| context.query_text()) else {
            return AgentResult::error(ErrorInfo::invalid_input("NLU input must be text"));
        };

        let output = self.classify(text, context).await;
        debug!(
            intent = %output.intent,
            confidence = output.confidence,
            source = %output.source,
            "Classified query"
        );

        match serde_json::to_value(&output) {
            Ok(payload) => AgentResult::success(payload),
            Err(e) => AgentResult::error(ErrorInfo::agent_error(format!(
                "Failed to encode NLU output: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::StubGateway;
    use prism_domain::{ErrorKind, Intent};
    use serde_json::json;

    fn agent(gateway: StubGateway) -> NluAgent {
        NluAgent::new(Arc::new(gateway), "test-model")
    }

    #[tokio::test]
    async fn test_llm_classification() {
        let agent = agent(StubGateway::replying(
            r#"```json
{"intent": "data_retrieval", "confidence": 0.9, "entities": [], "needs_schema": true}
```"#,
        ));
        let r = agent
            .process(&AgentInput::text("Show me a list of all users"), &AgentContext::new())
            .await;
        let payload = r.payload().unwrap();
        assert_eq!(payload["intent"], "data_retrieval");
        assert_eq!(payload["confidence"], 0.9);
        assert_eq!(payload["context_needs"], json!(["schema_version"]));
        assert_eq!(payload["source"], "llm");
    }

    #[tokio::test]
    async fn test_gateway_failure_falls_back_to_keywords() {
        let agent = agent(StubGateway::failing());
        let r = agent
            .process(&AgentInput::text("compare sales vs returns"), &AgentContext::new())
            .await;
        let out: NluOutput = serde_json::from_value(r.payload().unwrap().clone()).unwrap();
        assert_eq!(out.intent, Intent::Comparison);
        assert_eq!(out.confidence, 0.6);
        assert_eq!(out.source, "fallback");
    }

    #[tokio::test]
    async fn test_garbage_response_falls_back() {
        let agent = agent(StubGateway::replying("I think they want users?"));
        let r = agent
            .process(&AgentInput::text("list users"), &AgentContext::new())
            .await;
        assert_eq!(r.payload().unwrap()["source"], "fallback");
    }

    #[tokio::test]
    async fn test_known_schema_drops_schema_need() {
        let agent = agent(StubGateway::replying(
            r#"{"intent": "aggregation", "needs_schema": true}"#,
        ));
        let ctx = AgentContext::new().with(keys::SCHEMA, json!({"tables": []}));
        let r = agent.process(&AgentInput::text("count users"), &ctx).await;
        assert_eq!(r.payload().unwrap()["context_needs"], json!([]));
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_model_call() {
        let gateway = StubGateway::replying("{}");
        let calls = gateway.calls();
        let agent = agent(gateway);
        let r = agent.process(&AgentInput::text("   "), &AgentContext::new()).await;
        assert_eq!(r.error_info().unwrap().code, ErrorKind::InvalidInput);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
