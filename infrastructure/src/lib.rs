//! Infrastructure layer for toolplan
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod affinity;
pub mod config;
pub mod parameters;
pub mod registry;

// Re-export commonly used types
pub use affinity::{StoreAffinityResolver, normalize_endpoint};
pub use config::{
    ConfigError, ConfigLoader, ConfigSource, FileConfig, FilePlannerConfig, FileRegistryConfig,
};
pub use parameters::DeclaredParameterRequirements;
pub use registry::{InMemoryToolStore, RegistryError, RegistryFile};
