//! Decision layer of the tool-chain entropy engine: behavioral
//! attribution, campaign phase tracking, constrained chain synthesis,
//! and Monte Carlo validation over the `entropy-model` substrate.

pub mod assignment;
mod attribution;
mod campaign;
mod engine;
mod error;
mod optimizer;
pub mod stats;
mod types;
mod validator;

pub use attribution::{attribute, attribute_top};
pub use campaign::{CampaignAnalyzer, CampaignConfig};
pub use engine::DecisionEngine;
pub use error::{AttributionError, CampaignError, InfeasibleConstraints, ValidationError};
pub use optimizer::{ChainOptimizer, OptimizerConfig};
pub use types::{
    preferred_phase, AttributionResult, Campaign, CampaignEvent, Capability, CapabilityReport,
    ChainConstraints, OptimizationObjective, OptimizedChain, Phase, RelaxationHint, ThreatLevel,
    ValidationReport,
};
pub use validator::{MonteCarloValidator, ValidatorConfig};

#[cfg(test)]
mod tests;
