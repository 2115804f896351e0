//! Database connection from TOML (`[database]` section)
//!
//! ```toml
//! [database]
//! url = "sqlite://data/shop.db"     # or a plain path, or ":memory:"
//! pool_size = 4
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDatabaseConfig {
    /// Connection target shared by the schema and database tools
    pub url: String,
    /// Maximum pooled connections
    pub pool_size: u32,
}

impl Default for FileDatabaseConfig {
    fn default() -> Self {
        Self {
            url: "prism.db".to_string(),
            pool_size: 4,
        }
    }
}
