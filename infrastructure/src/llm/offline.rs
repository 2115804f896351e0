//! Gateway for running without a model
//!
//! Every request fails with [`GatewayError::ModelNotAvailable`]. The NLU
//! agent answers with its keyword classifier; SQL generation falls back to a
//! table scan when the schema names a table the question mentions.

use async_trait::async_trait;
use prism_application::{GatewayError, LlmGateway, LlmSession};

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

#[async_trait]
impl LlmGateway for OfflineGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &str,
        _system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Err(GatewayError::ModelNotAvailable(format!(
            "{} (offline mode)",
            model
        )))
    }

    async fn available_models(&self) -> Result<Vec<String>, GatewayError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_fails_with_model_unavailable() {
        let err = OfflineGateway
            .generate("gemini-2.0-flash", "system", "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ModelNotAvailable(m) if m.contains("offline")));
        assert!(OfflineGateway.available_models().await.unwrap().is_empty());
    }
}
