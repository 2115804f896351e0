//! Monitor configuration from TOML (`[monitor]` section)
//!
//! ```toml
//! [monitor]
//! capacity = 1000
//! keepalive_seconds = 15
//! rolling_window = 20
//! event_log = "~/.local/share/prism/events.jsonl"
//! ```

use prism_application::MonitorSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMonitorConfig {
    /// Ring buffer capacity
    pub capacity: usize,
    /// Idle seconds before a stream keepalive
    pub keepalive_seconds: u64,
    /// Completions in the rolling latency average
    pub rolling_window: usize,
    /// JSONL archive of every event; unset disables archiving
    pub event_log: Option<PathBuf>,
}

impl Default for FileMonitorConfig {
    fn default() -> Self {
        let settings = MonitorSettings::default();
        Self {
            capacity: settings.capacity,
            keepalive_seconds: settings.keepalive.as_secs(),
            rolling_window: settings.rolling_window,
            event_log: None,
        }
    }
}

impl FileMonitorConfig {
    pub fn to_settings(&self) -> MonitorSettings {
        MonitorSettings {
            capacity: self.capacity,
            keepalive: Duration::from_secs(self.keepalive_seconds.max(1)),
            rolling_window: self.rolling_window.max(1),
        }
    }
}
