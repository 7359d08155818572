//! API affinity adapter
//!
//! Affinity keys are stored on the tool records. Registries that only know a
//! tool's endpoint derive the key with [`normalize_endpoint`], so two tools
//! calling `https://API.example.com/v1/users` and
//! `https://api.example.com:443/v2/orders` share the key
//! `https://api.example.com`.

use async_trait::async_trait;
use std::sync::Arc;
use toolplan_application::ports::api_affinity::{AffinityError, ApiAffinityPort};
use toolplan_application::ports::tool_store::ToolStorePort;
use toolplan_domain::{AffinityKey, ToolId};
use url::Url;

/// Reduces an endpoint URL to `scheme://host[:port]`.
///
/// Scheme and host are lowercased, default ports are dropped, and path,
/// query and fragment are discarded. A bare `host[:port]` is read as HTTPS.
/// Returns `None` when the endpoint has no host.
pub fn normalize_endpoint(endpoint: &str) -> Option<AffinityKey> {
    let endpoint = endpoint.trim();
    let parsed = if endpoint.contains("://") {
        Url::parse(endpoint)
    } else {
        Url::parse(&format!("https://{endpoint}"))
    }
    .ok()?;

    let host = parsed.host_str()?.to_lowercase();
    let key = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    Some(AffinityKey::new(key))
}

/// Reads affinity keys from the tool store
pub struct StoreAffinityResolver {
    store: Arc<dyn ToolStorePort>,
}

impl StoreAffinityResolver {
    pub fn new(store: Arc<dyn ToolStorePort>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ApiAffinityPort for StoreAffinityResolver {
    async fn affinity_key(&self, tool_id: &ToolId) -> Result<Option<AffinityKey>, AffinityError> {
        let tool = self.store.get_tool(tool_id).await?;
        tracing::trace!(tool = %tool_id, key = ?tool.affinity_key, "Resolved affinity key");
        Ok(tool.affinity_key)
    }
}
