//! Request signature — the plan version cache key

use crate::tool::ToolId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sorted, deduplicated set of originally requested tool ids.
///
/// Parameter values are deliberately not part of the signature: supplying
/// more parameters for the same request produces a new version of the same
/// plan rather than a new plan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestSignature(Vec<ToolId>);

impl RequestSignature {
    pub fn new<I, T>(requested: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ToolId>,
    {
        let mut ids: Vec<ToolId> = requested.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        Self(ids)
    }

    pub fn tool_ids(&self) -> &[ToolId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(ToolId::as_str).collect();
        write!(f, "[{}]", joined.join(","))
    }
}
