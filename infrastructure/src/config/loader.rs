//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "prism";
const PROJECT_FILES: [&str; 2] = ["prism.toml", ".prism.toml"];
const ENV_PREFIX: &str = "PRISM_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `PRISM_SECTION__KEY` (e.g. `PRISM_TEAM__DEFAULT_MODE`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./prism.toml` or `./.prism.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/prism/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let global = Self::global_config_path();
        let project = Self::project_config_path();
        Self::figment(global.as_deref(), project.as_deref(), config_path)
            .extract()
            .map_err(Box::new)
    }

    fn figment(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&PathBuf>,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }
        if let Some(project_path) = project {
            figment = figment.merge(Toml::file(project_path));
        }
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for --show-config)
    pub fn print_config_sources(explicit: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");
        println!("  [ENV  ] {}<SECTION>__<KEY>", ENV_PREFIX);

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<5}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./prism.toml or ./.prism.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.team.default_mode, "route");
        assert!(config.tools.is_enabled("database"));
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path().unwrap();
        assert!(path.ends_with("prism/config.toml"));
    }

    #[test]
    fn test_later_files_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(
            &dir,
            "global.toml",
            "[team]\ndefault_mode = \"coordinate\"\n[monitor]\ncapacity = 50\n",
        );
        let explicit = write(&dir, "explicit.toml", "[team]\ndefault_mode = \"collaborate\"\n");

        let config: FileConfig =
            ConfigLoader::figment(Some(global.as_path()), None, Some(&explicit))
                .extract()
                .unwrap();

        assert_eq!(config.team.default_mode, "collaborate");
        assert_eq!(config.monitor.capacity, 50);
        // untouched sections keep defaults
        assert_eq!(config.database.pool_size, 4);
    }

    #[test]
    fn test_missing_global_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let config: FileConfig = ConfigLoader::figment(Some(missing.as_path()), None, None)
            .extract()
            .unwrap();
        assert_eq!(config, FileConfig::default());
    }
}
