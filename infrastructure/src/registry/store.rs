//! In-memory tool store

use super::RegistryError;
use super::file::RegistryFile;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use toolplan_application::ports::tool_store::{ToolStoreError, ToolStorePort};
use toolplan_domain::{DependencyEdge, ToolId, ToolNode};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Records {
    tools: BTreeMap<ToolId, ToolNode>,
    dependencies: Vec<DependencyEdge>,
}

impl Records {
    fn check_endpoints(&self, edge: &DependencyEdge) -> Result<(), RegistryError> {
        if self.tools.contains_key(&edge.prerequisite) && self.tools.contains_key(&edge.dependent) {
            Ok(())
        } else {
            Err(RegistryError::DanglingDependency {
                prerequisite: edge.prerequisite.clone(),
                dependent: edge.dependent.clone(),
            })
        }
    }
}

/// Tool store backed by in-memory records
///
/// Tools are listed in id order; dependency records in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryToolStore {
    records: RwLock<Records>,
}

impl InMemoryToolStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from records.
    ///
    /// Fails on duplicate tool ids and on dependencies naming a tool that is
    /// not registered. Inactive tools are registered and may be referenced.
    pub fn from_records(
        tools: impl IntoIterator<Item = ToolNode>,
        dependencies: impl IntoIterator<Item = DependencyEdge>,
    ) -> Result<Self, RegistryError> {
        let mut records = Records::default();
        for tool in tools {
            if records.tools.contains_key(&tool.id) {
                return Err(RegistryError::DuplicateTool(tool.id));
            }
            records.tools.insert(tool.id.clone(), tool);
        }
        for edge in dependencies {
            records.check_endpoints(&edge)?;
            records.dependencies.push(edge);
        }

        Ok(Self {
            records: RwLock::new(records),
        })
    }

    /// Parses a TOML registry
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let (tools, dependencies) = RegistryFile::parse(content)?.into_records()?;
        Self::from_records(tools, dependencies)
    }

    /// Loads a TOML registry file
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            tools = store.len(),
            "Loaded tool registry"
        );
        Ok(store)
    }

    /// Number of registered tools, active or not
    pub fn len(&self) -> usize {
        self.read().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().tools.is_empty()
    }

    /// Inserts or replaces a tool, returning the previous record
    pub fn upsert_tool(&self, tool: ToolNode) -> Option<ToolNode> {
        debug!(tool = %tool.id, active = tool.active, "Upserting tool");
        self.write().tools.insert(tool.id.clone(), tool)
    }

    /// Activates or deactivates a registered tool
    pub fn set_active(&self, id: &ToolId, active: bool) -> Result<(), RegistryError> {
        let mut records = self.write();
        let tool = records
            .tools
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownTool(id.clone()))?;
        tool.active = active;
        debug!(tool = %id, active, "Changed tool activity");
        Ok(())
    }

    /// Records a dependency between two registered tools
    pub fn add_dependency(&self, edge: DependencyEdge) -> Result<(), RegistryError> {
        let mut records = self.write();
        records.check_endpoints(&edge)?;
        debug!(
            prerequisite = %edge.prerequisite,
            dependent = %edge.dependent,
            kind = %edge.dependency_type,
            "Adding dependency"
        );
        records.dependencies.push(edge);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ToolStorePort for InMemoryToolStore {
    async fn list_tools(&self, include_inactive: bool) -> Result<Vec<ToolNode>, ToolStoreError> {
        Ok(self
            .read()
            .tools
            .values()
            .filter(|t| include_inactive || t.active)
            .cloned()
            .collect())
    }

    async fn list_dependency_edges(&self) -> Result<Vec<DependencyEdge>, ToolStoreError> {
        Ok(self.read().dependencies.clone())
    }

    async fn get_tool(&self, id: &ToolId) -> Result<ToolNode, ToolStoreError> {
        self.read()
            .tools
            .get(id)
            .cloned()
            .ok_or_else(|| ToolStoreError::NotFound(id.clone()))
    }
}
