//! Configuration file loading for toolplan
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. `TOOLPLAN_*` environment variables (`__` separates sections)
//! 3. Project root: `./toolplan.toml` or `./.toolplan.toml`
//! 4. Global: `$XDG_CONFIG_HOME/toolplan/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{FileConfig, FilePlannerConfig, FileRegistryConfig};
pub use loader::{ConfigError, ConfigLoader, ConfigSource};
