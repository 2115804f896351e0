//! Model selection from TOML (`[models]` section)
//!
//! ```toml
//! [models]
//! nlu = "gemini-2.0-flash"
//! sql = "gemini-2.0-flash"
//! ```

use prism_application::ModelSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Model for intent classification
    pub nlu: Option<String>,
    /// Model for SQL generation
    pub sql: Option<String>,
}

impl FileModelsConfig {
    /// Configured models over the defaults. Empty names are kept so
    /// validation can reject them.
    pub fn to_settings(&self) -> ModelSettings {
        let defaults = ModelSettings::default();
        ModelSettings {
            nlu: self.nlu.clone().unwrap_or(defaults.nlu),
            sql: self.sql.clone().unwrap_or(defaults.sql),
        }
    }
}
