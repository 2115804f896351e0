//! Application-level configuration.
//!
//! - [`TeamConfig`] - team assembly: mode, models, routes, limits, monitor

pub mod team_config;

pub use team_config::{
    CollaborateSettings, DEFAULT_MODEL, ExecutionSettings, ModelSettings, MonitorSettings,
    TeamConfig,
};
