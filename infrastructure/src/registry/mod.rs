//! Tool registry adapter
//!
//! [`InMemoryToolStore`] implements [`ToolStorePort`] over records held in
//! memory, usually loaded from a TOML registry file (see [`file`]). The
//! store can be mutated at runtime; planner calls made afterwards see the
//! new records because the planner rebuilds its graph on every call.
//!
//! [`ToolStorePort`]: toolplan_application::ports::tool_store::ToolStorePort

pub mod file;
mod store;

pub use file::{FileTool, RegistryFile};
pub use store::InMemoryToolStore;

use std::path::PathBuf;
use thiserror::Error;
use toolplan_domain::ToolId;

/// Errors raised while loading or mutating the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid registry file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate tool id: {0}")]
    DuplicateTool(ToolId),

    #[error("Unknown tool: {0}")]
    UnknownTool(ToolId),

    #[error("Dependency {prerequisite} -> {dependent} references an unregistered tool")]
    DanglingDependency {
        prerequisite: ToolId,
        dependent: ToolId,
    },

    #[error("Tool {tool}: endpoint '{endpoint}' has no host")]
    InvalidEndpoint { tool: ToolId, endpoint: String },
}
