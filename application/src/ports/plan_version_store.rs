//! Plan version store
//!
//! Append-only history of published plans, keyed by [`RequestSignature`].
//! Versions for a signature start at 1 and grow by exactly 1 per publish.
//!
//! ```text
//! RwLock<HashMap<signature, Arc<Mutex<History>>>>
//!    │                          │
//!    │                          └─ held while reading max + appending
//!    └─ held only to find or create the entry
//! ```
//!
//! Publishes for the same signature are serialized on that signature's
//! mutex; different signatures never wait on each other. Neither lock is
//! ever requested while the other is held in the opposite order.
//!
//! Eviction removes the map entry first and then marks the detached history
//! as retired under its mutex. A publish that looked up the entry before the
//! removal either appends before the mark (the eviction then counts and
//! drops that version) or finds the history retired and retries against a
//! fresh entry. A published version is therefore always readable until the
//! next eviction of its signature.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use toolplan_domain::{ExecutionPlan, RequestSignature};

/// Storage for versioned plans
pub trait PlanVersionStore: Send + Sync {
    /// Assigns the next version for the plan's signature, stores it and
    /// returns the stored plan.
    fn publish(&self, plan: ExecutionPlan) -> ExecutionPlan;

    /// A single version, if it was ever published
    fn version(&self, signature: &RequestSignature, version: u32) -> Option<ExecutionPlan>;

    /// Every version of a signature; empty when nothing was published
    fn versions(&self, signature: &RequestSignature) -> BTreeMap<u32, ExecutionPlan>;

    /// The highest version of a signature
    fn latest(&self, signature: &RequestSignature) -> Option<ExecutionPlan>;

    /// Signatures with at least one published version
    fn signatures(&self) -> Vec<RequestSignature>;

    /// Drops a signature's whole history. Returns how many versions were removed.
    ///
    /// This is the hook for an external eviction policy. Numbering for the
    /// signature restarts at 1 afterwards.
    fn evict(&self, signature: &RequestSignature) -> usize;
}

#[derive(Debug, Default)]
struct History {
    plans: Vec<ExecutionPlan>,
    /// Set once the entry has been evicted from the map
    retired: bool,
}

type SharedHistory = Arc<Mutex<History>>;

/// Process-local [`PlanVersionStore`]
#[derive(Debug, Default)]
pub struct InMemoryPlanVersionStore {
    entries: RwLock<HashMap<RequestSignature, SharedHistory>>,
}

impl InMemoryPlanVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn history(&self, signature: &RequestSignature) -> Option<SharedHistory> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(signature)
            .cloned()
    }

    fn history_or_create(&self, signature: &RequestSignature) -> SharedHistory {
        if let Some(history) = self.history(signature) {
            return history;
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(signature.clone())
            .or_default()
            .clone()
    }

    /// Appends to `history` unless it was retired; a retired history hands
    /// the plan back.
    fn append(history: &SharedHistory, plan: ExecutionPlan) -> Result<ExecutionPlan, ExecutionPlan> {
        let mut history = history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.retired {
            return Err(plan);
        }
        let next = history.plans.last().map_or(1, |p| p.version + 1);
        let plan = plan.with_version(next);
        history.plans.push(plan.clone());
        Ok(plan)
    }

    fn with_plans<R>(&self, signature: &RequestSignature, f: impl FnOnce(&[ExecutionPlan]) -> R) -> Option<R> {
        let history = self.history(signature)?;
        let history = history.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&history.plans))
    }
}

impl PlanVersionStore for InMemoryPlanVersionStore {
    fn publish(&self, mut plan: ExecutionPlan) -> ExecutionPlan {
        loop {
            let history = self.history_or_create(&plan.signature);
            match Self::append(&history, plan) {
                Ok(published) => return published,
                Err(returned) => plan = returned,
            }
        }
    }

    fn version(&self, signature: &RequestSignature, version: u32) -> Option<ExecutionPlan> {
        // Versions are dense from 1, so the index is version - 1.
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.with_plans(signature, |plans| plans.get(index).cloned())?
    }

    fn versions(&self, signature: &RequestSignature) -> BTreeMap<u32, ExecutionPlan> {
        self.with_plans(signature, |plans| {
            plans.iter().map(|p| (p.version, p.clone())).collect()
        })
        .unwrap_or_default()
    }

    fn latest(&self, signature: &RequestSignature) -> Option<ExecutionPlan> {
        self.with_plans(signature, |plans| plans.last().cloned())?
    }

    fn signatures(&self) -> Vec<RequestSignature> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut signatures: Vec<RequestSignature> = entries
            .iter()
            .filter(|(_, h)| !h.lock().unwrap_or_else(PoisonError::into_inner).plans.is_empty())
            .map(|(s, _)| s.clone())
            .collect();
        signatures.sort();
        signatures
    }

    fn evict(&self, signature: &RequestSignature) -> usize {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(signature);
        removed.map_or(0, |history| {
            let mut history = history.lock().unwrap_or_else(PoisonError::into_inner);
            history.retired = true;
            history.plans.len()
        })
    }
}
