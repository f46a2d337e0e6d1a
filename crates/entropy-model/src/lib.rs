//! Data model, registries, and entropy scoring for the tool-chain
//! decision engine.
//!
//! Pure computation over in-memory state: no I/O, no global mutable
//! state. Registries are explicit owned objects handed by reference to
//! the engines in the `decision-engine` crate.

mod entropy;
mod error;
mod registry;
mod types;

pub use entropy::{
    ChainEntropy, ChainEntropyConfig, ChainScorer, DistanceMetric, EntropyModel,
    WeightedDimensionModel, ZScoreDistance,
};
pub use error::{RegistryError, UnknownToolError};
pub use registry::{ActorRegistry, ActorSnapshot, ToolRegistry, ToolSnapshot};
pub use types::{
    ActorProfile, Chain, EntropySignature, Tool, ToolCategory, DIMENSION_MAX, DIMENSION_MIN,
    DIM_DETECTION_DIFFICULTY, DIM_INFRASTRUCTURE_COST, DIM_STEALTH_COST, DIM_TECHNICAL_SKILL,
};
