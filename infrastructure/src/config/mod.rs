//! Configuration file loading for prism
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `PRISM_SECTION__KEY`
//! 2. `--config <path>` specified file
//! 3. Project root: `./prism.toml` or `./.prism.toml`
//! 4. Global: `$XDG_CONFIG_HOME/prism/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileDatabaseConfig, FileLlmConfig, FileModelsConfig,
    FileMonitorConfig, FileOutputConfig, FileRoutesConfig, FileTeamConfig, FileToolsConfig,
    KNOWN_TOOLS, LlmProvider,
};
pub use loader::ConfigLoader;
