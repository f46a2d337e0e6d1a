//! Tool and actor registries.
//!
//! Concurrency model: copy-on-write snapshots. Each registry holds
//! `RwLock<Arc<HashMap<..>>>`; readers take [`ToolRegistry::snapshot`]
//! (an `Arc` clone) and score an entire operation against that immutable
//! view, so a reader can never observe a partially-written record.
//! `register` validates first, then builds the replacement map and swaps
//! the `Arc` under the write lock. A poisoned lock is recovered via
//! `into_inner`: a writer that panicked before the swap left the old map
//! intact.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::entropy::ChainScorer;
use crate::error::{RegistryError, UnknownToolError};
use crate::types::{ActorProfile, Tool, DIMENSION_MAX, DIMENSION_MIN};

pub type ToolSnapshot = Arc<HashMap<String, Tool>>;
pub type ActorSnapshot = Arc<HashMap<String, ActorProfile>>;

#[derive(Debug, Default)]
pub struct ToolRegistry {
    inner: RwLock<ToolSnapshot>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. Every dimension value must be finite and lie in
    /// [0, 10]; duplicates are rejected unless `replace` is set.
    pub fn register(&self, tool: Tool, replace: bool) -> Result<(), RegistryError> {
        for (dimension, value) in &tool.dimensions {
            if !value.is_finite() || *value < DIMENSION_MIN || *value > DIMENSION_MAX {
                return Err(RegistryError::InvalidEntropyDimension {
                    tool_id: tool.id.clone(),
                    dimension: dimension.clone(),
                    value: *value,
                });
            }
        }

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !replace && guard.contains_key(&tool.id) {
            return Err(RegistryError::DuplicateTool {
                tool_id: tool.id.clone(),
            });
        }

        let mut next = HashMap::clone(&guard);
        tracing::debug!(tool = %tool.id, category = tool.category.as_str(), "registered tool");
        next.insert(tool.id.clone(), tool);
        *guard = Arc::new(next);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Tool, UnknownToolError> {
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| UnknownToolError::new(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Immutable view of the registry at this instant.
    pub fn snapshot(&self) -> ToolSnapshot {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[derive(Debug, Default)]
pub struct ActorRegistry {
    inner: RwLock<ActorSnapshot>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an actor profile. Degenerate signatures (stddev <= 0 or
    /// non-finite) are rejected; duplicates need `replace`.
    pub fn register(&self, actor: ActorProfile, replace: bool) -> Result<(), RegistryError> {
        if actor.signature.is_degenerate() {
            return Err(RegistryError::DegenerateSignature {
                actor_id: actor.id.clone(),
                stddev: actor.signature.stddev,
            });
        }

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !replace && guard.contains_key(&actor.id) {
            return Err(RegistryError::DuplicateActor {
                actor_id: actor.id.clone(),
            });
        }

        let mut next = HashMap::clone(&guard);
        tracing::debug!(actor = %actor.id, mean = actor.signature.mean, "registered actor");
        next.insert(actor.id.clone(), actor);
        *guard = Arc::new(next);
        Ok(())
    }

    /// Registers an actor whose signature is fitted from its exemplar
    /// chains (mean and sample stddev of their entropies). The profile's
    /// stored signature is ignored and overwritten by the fit.
    pub fn register_from_exemplars(
        &self,
        mut actor: ActorProfile,
        scorer: &ChainScorer,
        tools: &ToolSnapshot,
        replace: bool,
    ) -> Result<(), RegistryError> {
        let count = actor.exemplar_chains.len();
        let fitted = scorer.fit_signature(tools, actor.exemplar_chains.iter())?;
        match fitted {
            Some(signature) => {
                actor.signature = signature;
                self.register(actor, replace)
            }
            None if count < 2 => Err(RegistryError::InsufficientExemplars {
                actor_id: actor.id,
                count,
            }),
            None => Err(RegistryError::DegenerateSignature {
                actor_id: actor.id,
                stddev: 0.0,
            }),
        }
    }

    pub fn get(&self, id: &str) -> Result<ActorProfile, RegistryError> {
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownActor {
                actor_id: id.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn snapshot(&self) -> ActorSnapshot {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }
}
