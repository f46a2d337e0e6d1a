use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use entropy_model::{Chain, ToolCategory};

/// Operational-lifecycle phase of a campaign (HD4 ladder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Hunt,
    Detect,
    Disrupt,
    Disable,
    Dominate,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hunt => "hunt",
            Self::Detect => "detect",
            Self::Disrupt => "disrupt",
            Self::Disable => "disable",
            Self::Dominate => "dominate",
        }
    }
}

/// Fixed category -> phase preference table driving campaign phase
/// inference. Exhaustive over the closed category enum.
pub fn preferred_phase(category: ToolCategory) -> Phase {
    match category {
        ToolCategory::Reconnaissance => Phase::Hunt,
        ToolCategory::InitialAccess | ToolCategory::Execution => Phase::Detect,
        ToolCategory::CredentialAccess | ToolCategory::Persistence => Phase::Disrupt,
        ToolCategory::LateralMovement => Phase::Disable,
        ToolCategory::CommandAndControl | ToolCategory::Exfiltration => Phase::Dominate,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A single observed event: a tool fired at a point in time. The phase
/// hint is advisory telemetry from the executing layer and never
/// overrides the analyzer's own inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignEvent {
    pub ts_unix: i64,
    pub tool_id: String,
    #[serde(default)]
    pub phase_hint: Option<Phase>,
}

impl CampaignEvent {
    pub fn new(ts_unix: i64, tool_id: impl Into<String>) -> Self {
        Self {
            ts_unix,
            tool_id: tool_id.into(),
            phase_hint: None,
        }
    }
}

/// Mutable campaign state. Created empty, mutated only by event
/// ingestion, rolled back only by explicit reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub hypothesized_actor: Option<String>,
    pub events: Vec<CampaignEvent>,
    pub phase: Phase,
    pub threat_level: ThreatLevel,
    /// Consecutive events agreeing on a candidate phase other than the
    /// current one (hysteresis counter).
    pub(crate) pending_phase: Option<(Phase, u32)>,
}

impl Campaign {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hypothesized_actor: None,
            events: Vec::new(),
            phase: Phase::Hunt,
            threat_level: ThreatLevel::Low,
            pending_phase: None,
        }
    }

    pub fn chain(&self) -> Chain {
        self.events.iter().map(|e| e.tool_id.clone()).collect()
    }
}

/// Hard constraints on a synthesized chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConstraints {
    /// Budget on discounted chain entropy.
    pub max_entropy: f64,
    pub max_tools: usize,
    /// Operating persona skill ceiling: tools whose `technical-skill`
    /// dimension exceeds this are not candidates.
    pub operator_skill: f64,
    #[serde(default)]
    pub allowed_categories: Option<BTreeSet<ToolCategory>>,
}

/// What the optimizer maximizes. The weighted form is normalized
/// internally, so only the ratios matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationObjective {
    Stealth,
    Speed,
    SuccessProbability,
    Weighted {
        stealth: f64,
        speed: f64,
        success: f64,
    },
}

/// A synthesized chain with its success estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedChain {
    pub chain: Chain,
    pub entropy: f64,
    pub success_probability: f64,
}

/// Minimal constraint relaxation that restores feasibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelaxationHint {
    /// Raising `max_tools` by this many slots suffices.
    IncreaseMaxTools { by: usize },
    /// Raising `max_entropy` by this much suffices.
    IncreaseMaxEntropy { by: f64 },
    /// No relaxation of the stepped bounds helps (e.g. empty candidate
    /// pool after the skill/category filter).
    NoCandidates,
}

/// One actor's similarity to an observed chain. Confidences across a full
/// attribution result sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub actor_id: String,
    pub confidence: f64,
    pub distance: f64,
}

/// Validator capability under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Attribution,
    NextToolPrediction,
    PhaseDetection,
    OptimizerFeasibility,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attribution => "attribution",
            Self::NextToolPrediction => "next-tool-prediction",
            Self::PhaseDetection => "phase-detection",
            Self::OptimizerFeasibility => "optimizer-feasibility",
        }
    }
}

/// Accuracy statistics for one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub capability: Capability,
    pub samples: u64,
    pub successes: u64,
    /// Trials that errored rather than producing a wrong answer. Counted
    /// into `samples` as non-successes, never propagated.
    pub failures: u64,
    pub accuracy: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub confidence_level: f64,
}

/// Full validation batch output. Reproducible bit-for-bit for a fixed
/// `(seed, trials)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub seed: u64,
    pub trials: u64,
    pub capabilities: Vec<CapabilityReport>,
}
