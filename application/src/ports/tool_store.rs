//! Tool Store port
//!
//! Defines read access to the persisted tool and dependency records.

use async_trait::async_trait;
use thiserror::Error;
use toolplan_domain::{DependencyEdge, ToolId, ToolNode};

/// Errors that can occur while reading the tool store
#[derive(Error, Debug, Clone)]
pub enum ToolStoreError {
    #[error("Tool not found: {0}")]
    NotFound(ToolId),
}

/// Port for the tool registry
///
/// The planner rebuilds its graph from this port on every call, so
/// implementations should always return current data.
#[async_trait]
pub trait ToolStorePort: Send + Sync {
    /// All tools, optionally including inactive ones
    async fn list_tools(&self, include_inactive: bool) -> Result<Vec<ToolNode>, ToolStoreError>;

    /// All dependency records, regardless of tool activity
    async fn list_dependency_edges(&self) -> Result<Vec<DependencyEdge>, ToolStoreError>;

    /// A single tool by id
    async fn get_tool(&self, id: &ToolId) -> Result<ToolNode, ToolStoreError>;
}
