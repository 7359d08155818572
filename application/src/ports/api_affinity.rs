//! API Affinity port
//!
//! Resolves the downstream resource a tool talks to. Only the affinity
//! pass of plan generation uses it.

use super::tool_store::ToolStoreError;
use async_trait::async_trait;
use thiserror::Error;
use toolplan_domain::{AffinityKey, ToolId};

/// Errors raised by affinity adapters
#[derive(Error, Debug)]
pub enum AffinityError {
    #[error("Tool store error: {0}")]
    Store(#[from] ToolStoreError),

    #[error("Affinity lookup failed: {0}")]
    Failed(String),
}

/// Port for API affinity lookup
#[async_trait]
pub trait ApiAffinityPort: Send + Sync {
    /// The tool's affinity key, if it has one
    async fn affinity_key(&self, tool_id: &ToolId) -> Result<Option<AffinityKey>, AffinityError>;
}

/// Adapter for deployments without affinity metadata
pub struct NoAffinity;

#[async_trait]
impl ApiAffinityPort for NoAffinity {
    async fn affinity_key(&self, _tool_id: &ToolId) -> Result<Option<AffinityKey>, AffinityError> {
        Ok(None)
    }
}
