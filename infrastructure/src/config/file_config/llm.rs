//! LLM provider configuration from TOML (`[llm]` section)
//!
//! ```toml
//! [llm]
//! provider = "gemini"               # gemini | offline
//! api_key_env = "GEMINI_API_KEY"
//! timeout_seconds = 60
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Generative Language API
    #[default]
    Gemini,
    /// No model; agents use their deterministic fallbacks
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    pub provider: LlmProvider,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Direct API key (prefer `api_key_env`)
    pub api_key: Option<String>,
    /// Override of the provider's base URL
    pub endpoint: Option<String>,
    /// Per-request timeout
    pub timeout_seconds: u64,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            endpoint: None,
            timeout_seconds: 60,
        }
    }
}

impl FileLlmConfig {
    /// Direct key, else the named environment variable. Read once at startup.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
