//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

const PROJECT_FILES: [&str; 2] = ["toolplan.toml", ".toolplan.toml"];
const ENV_PREFIX: &str = "TOOLPLAN_";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
}

/// One place configuration may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub kind: &'static str,
    pub location: String,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Environment: `TOOLPLAN_PLANNER__AFFINITY_POLICY=off`
    /// 3. Project root: `./toolplan.toml` or `./.toolplan.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/toolplan/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let global = Self::global_config_path().filter(|p| p.exists());
        let project = Self::project_config_path();
        let figment = Self::files_figment(global.as_deref(), project.as_deref())
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract_with_explicit(figment, config_path)
    }

    /// Load from the given files only, ignoring the environment
    pub fn load_from_files(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<FileConfig, ConfigError> {
        Self::extract_with_explicit(Self::files_figment(global, project), explicit)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn files_figment(global: Option<&Path>, project: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        if let Some(path) = global {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }
        figment
    }

    fn extract_with_explicit(figment: Figment, explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let figment = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        };
        figment.extract().map_err(|e| ConfigError::Extract(Box::new(e)))
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolplan").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Every source in priority order, with whether it is present
    pub fn config_sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();

        if let Some(path) = config_path {
            sources.push(ConfigSource {
                kind: "Explicit",
                location: path.display().to_string(),
                found: path.exists(),
            });
        }

        let env_vars = std::env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX)).count();
        sources.push(ConfigSource {
            kind: "Env",
            location: format!("{ENV_PREFIX}* ({env_vars} set)"),
            found: env_vars > 0,
        });

        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource {
                kind: "Project",
                location: path.display().to_string(),
                found: true,
            },
            None => ConfigSource {
                kind: "Project",
                location: "./toolplan.toml or ./.toolplan.toml".to_string(),
                found: false,
            },
        });

        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                kind: "Global",
                found: path.exists(),
                location: path.display().to_string(),
            });
        }

        sources.push(ConfigSource {
            kind: "Default",
            location: "built-in defaults".to_string(),
            found: true,
        });
        sources
    }
}
