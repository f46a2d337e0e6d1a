use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical entropy dimension names. Tools may carry additional
/// dimensions; these four are the ones the optimizer's objective
/// scoring understands.
pub const DIM_TECHNICAL_SKILL: &str = "technical-skill";
pub const DIM_STEALTH_COST: &str = "stealth-cost";
pub const DIM_DETECTION_DIFFICULTY: &str = "detection-difficulty";
pub const DIM_INFRASTRUCTURE_COST: &str = "infrastructure-cost";

/// Inclusive bounds for every entropy dimension value.
pub const DIMENSION_MIN: f64 = 0.0;
pub const DIMENSION_MAX: f64 = 10.0;

pub(crate) const TOOL_CATEGORIES: [ToolCategory; 8] = [
    ToolCategory::Reconnaissance,
    ToolCategory::InitialAccess,
    ToolCategory::Execution,
    ToolCategory::CredentialAccess,
    ToolCategory::LateralMovement,
    ToolCategory::CommandAndControl,
    ToolCategory::Persistence,
    ToolCategory::Exfiltration,
];

/// Attack-lifecycle category of a tool. Declaration order is the
/// escalation order used by the chain escalation bonus and the
/// optimizer's sequencing step: later variants are higher impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCategory {
    Reconnaissance,
    InitialAccess,
    Execution,
    CredentialAccess,
    LateralMovement,
    CommandAndControl,
    Persistence,
    Exfiltration,
}

impl ToolCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reconnaissance => "reconnaissance",
            Self::InitialAccess => "initial-access",
            Self::Execution => "execution",
            Self::CredentialAccess => "credential-access",
            Self::LateralMovement => "lateral-movement",
            Self::CommandAndControl => "command-and-control",
            Self::Persistence => "persistence",
            Self::Exfiltration => "exfiltration",
        }
    }

    /// Impact rank used for escalation detection and phase sequencing.
    pub const fn rank(self) -> usize {
        match self {
            Self::Reconnaissance => 0,
            Self::InitialAccess => 1,
            Self::Execution => 2,
            Self::CredentialAccess => 3,
            Self::LateralMovement => 4,
            Self::CommandAndControl => 5,
            Self::Persistence => 6,
            Self::Exfiltration => 7,
        }
    }

    pub fn all() -> impl Iterator<Item = ToolCategory> {
        TOOL_CATEGORIES.into_iter()
    }
}

/// An offensive tool and its entropy dimension map.
///
/// `base_entropy` and `uncertainty` are *derived* quantities: they are
/// computed from `dimensions` by an [`crate::entropy::EntropyModel`] on
/// read and never stored here, so the map is the single source of truth.
/// Dimensions use a `BTreeMap` so iteration order (and therefore every
/// derived score) is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub category: ToolCategory,
    pub dimensions: BTreeMap<String, f64>,
}

impl Tool {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ToolCategory,
        dimensions: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            dimensions: dimensions.into_iter().collect(),
        }
    }

    pub fn dimension(&self, name: &str) -> Option<f64> {
        self.dimensions.get(name).copied()
    }
}

/// Statistical signature of the chain entropy historically associated
/// with an actor. `stddev` must be strictly positive; the actor registry
/// rejects degenerate signatures at registration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropySignature {
    pub mean: f64,
    pub stddev: f64,
}

impl EntropySignature {
    pub fn new(mean: f64, stddev: f64) -> Self {
        Self { mean, stddev }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.stddev > 0.0) || !self.stddev.is_finite() || !self.mean.is_finite()
    }
}

/// Behavioral profile of a known threat actor.
///
/// `nation` and `motivation` are opaque attribution metadata, carried but
/// never interpreted by the core. `preferred_tools` pairs tool ids with
/// relative weights (higher = more characteristic); `exemplar_chains` are
/// historically observed chains usable for signature fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub id: String,
    pub name: String,
    pub nation: Option<String>,
    pub motivation: Option<String>,
    pub signature: EntropySignature,
    pub preferred_tools: Vec<(String, f64)>,
    #[serde(default)]
    pub exemplar_chains: Vec<Chain>,
}

/// An ordered sequence of tool identifiers.
///
/// Order matters for escalation scoring and campaign phase inference;
/// the redundancy discount and raw entropy summation ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chain(pub Vec<String>);

impl Chain {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn push(&mut self, id: impl Into<String>) {
        self.0.push(id.into());
    }
}

impl<S: Into<String>> FromIterator<S> for Chain {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}
