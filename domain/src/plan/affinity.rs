//! API affinity optimization pass
//!
//! Tools in the same parallel group that call the same downstream resource
//! (same [`AffinityKey`]) are collected into an [`AffinityLane`] so a caller
//! can start them one after another, e.g. to respect a shared rate limit.
//! Tools with different keys stay free to run concurrently.
//!
//! The pass never changes `tools_in_order` or group membership.

use super::entities::{AffinityLane, ExecutionGroup};
use crate::tool::{AffinityKey, ToolId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Policy applied by the affinity pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffinityPolicy {
    /// Annotate each group with lanes for shared keys, no reordering
    #[default]
    Annotate,
    /// Skip the pass entirely
    Off,
}

impl AffinityPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            AffinityPolicy::Annotate => "annotate",
            AffinityPolicy::Off => "off",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, AffinityPolicy::Off)
    }

    pub fn valid_values() -> &'static [&'static str] {
        &["annotate", "off"]
    }
}

impl fmt::Display for AffinityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AffinityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "annotate" => Ok(AffinityPolicy::Annotate),
            "off" | "none" | "disabled" => Ok(AffinityPolicy::Off),
            other => Err(format!("unknown affinity policy '{}'", other)),
        }
    }
}

/// Applies `policy` to `groups` in place. Returns whether the pass ran.
///
/// Lane members are listed in their `order` position, which is the order a
/// caller should start them in.
pub fn apply_affinity(
    policy: AffinityPolicy,
    groups: &mut [ExecutionGroup],
    order: &[ToolId],
    keys: &HashMap<ToolId, AffinityKey>,
) -> bool {
    match policy {
        AffinityPolicy::Off => false,
        AffinityPolicy::Annotate => {
            let position: HashMap<&ToolId, usize> =
                order.iter().enumerate().map(|(i, t)| (t, i)).collect();
            for group in groups.iter_mut() {
                group.affinity_lanes = lanes_for(group, &position, keys);
            }
            true
        }
    }
}

fn lanes_for(
    group: &ExecutionGroup,
    position: &HashMap<&ToolId, usize>,
    keys: &HashMap<ToolId, AffinityKey>,
) -> Vec<AffinityLane> {
    let mut shared: BTreeMap<&AffinityKey, Vec<ToolId>> = BTreeMap::new();
    for tool in &group.tools {
        if let Some(key) = keys.get(tool) {
            shared.entry(key).or_default().push(tool.clone());
        }
    }

    shared
        .into_iter()
        .filter(|(_, tools)| tools.len() > 1)
        .map(|(key, mut tools)| {
            tools.sort_by_key(|t| (position.get(t).copied().unwrap_or(usize::MAX), t.clone()));
            AffinityLane {
                key: key.clone(),
                tools,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ToolId {
        ToolId::new(name)
    }

    fn keys(pairs: &[(&str, &str)]) -> HashMap<ToolId, AffinityKey> {
        pairs
            .iter()
            .map(|(tool, key)| (id(tool), AffinityKey::new(*key)))
            .collect()
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Annotate".parse::<AffinityPolicy>(), Ok(AffinityPolicy::Annotate));
        assert_eq!("off".parse::<AffinityPolicy>(), Ok(AffinityPolicy::Off));
        assert!("reorder".parse::<AffinityPolicy>().is_err());
    }

    #[test]
    fn test_shared_keys_form_a_lane() {
        let order = vec![id("root"), id("b"), id("c"), id("a")];
        let mut groups = vec![
            ExecutionGroup::new(0, vec![id("root")]),
            ExecutionGroup::new(1, vec![id("a"), id("b"), id("c")]),
        ];
        let keys = keys(&[
            ("a", "https://api.example.com"),
            ("b", "https://other.example.com"),
            ("c", "https://api.example.com"),
        ]);

        assert!(apply_affinity(AffinityPolicy::Annotate, &mut groups, &order, &keys));

        assert!(groups[0].affinity_lanes.is_empty());
        assert_eq!(groups[1].affinity_lanes.len(), 1);
        let lane = &groups[1].affinity_lanes[0];
        assert_eq!(lane.key.as_str(), "https://api.example.com");
        // c precedes a in the order
        assert_eq!(lane.tools, vec![id("c"), id("a")]);
        // membership untouched
        assert_eq!(groups[1].tools, vec![id("a"), id("b"), id("c")]);
    }

    #[test]
    fn test_lanes_do_not_cross_groups() {
        let order = vec![id("a"), id("b")];
        let mut groups = vec![
            ExecutionGroup::new(0, vec![id("a")]),
            ExecutionGroup::new(1, vec![id("b")]),
        ];
        let keys = keys(&[("a", "k"), ("b", "k")]);

        apply_affinity(AffinityPolicy::Annotate, &mut groups, &order, &keys);
        assert!(groups.iter().all(|g| g.affinity_lanes.is_empty()));
    }

    #[test]
    fn test_off_leaves_groups_alone() {
        let order = vec![id("a"), id("b")];
        let mut groups = vec![ExecutionGroup::new(0, vec![id("a"), id("b")])];
        let keys = keys(&[("a", "k"), ("b", "k")]);

        assert!(!apply_affinity(AffinityPolicy::Off, &mut groups, &order, &keys));
        assert!(groups[0].affinity_lanes.is_empty());
    }
}
