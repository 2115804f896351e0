//! LLM gateway adapters

#[cfg(feature = "gemini")]
mod gemini;
mod offline;

#[cfg(feature = "gemini")]
pub use gemini::{DEFAULT_ENDPOINT, GeminiGateway, GeminiSession};
pub use offline::OfflineGateway;

use crate::config::{FileLlmConfig, LlmProvider};
use prism_application::LlmGateway;
use std::sync::Arc;
use tracing::warn;

/// Gateway for the configured provider.
///
/// Falls back to [`OfflineGateway`] when the provider cannot be used, so the
/// agents still answer through their rule-based paths.
pub fn gateway_from_config(config: &FileLlmConfig) -> Arc<dyn LlmGateway> {
    match config.provider {
        LlmProvider::Offline => Arc::new(OfflineGateway),
        LlmProvider::Gemini => gemini_gateway(config),
    }
}

#[cfg(feature = "gemini")]
fn gemini_gateway(config: &FileLlmConfig) -> Arc<dyn LlmGateway> {
    let Some(key) = config.resolve_api_key() else {
        warn!(
            env = %config.api_key_env,
            "No Gemini API key found; running offline"
        );
        return Arc::new(OfflineGateway);
    };
    match GeminiGateway::new(
        key,
        config.endpoint.clone(),
        std::time::Duration::from_secs(config.timeout_seconds.max(1)),
    ) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            warn!(error = %e, "Gemini gateway unavailable; running offline");
            Arc::new(OfflineGateway)
        }
    }
}

#[cfg(not(feature = "gemini"))]
fn gemini_gateway(_config: &FileLlmConfig) -> Arc<dyn LlmGateway> {
    warn!("Built without the `gemini` feature; running offline");
    Arc::new(OfflineGateway)
}
