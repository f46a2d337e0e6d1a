use std::fmt;

use entropy_model::UnknownToolError;

use crate::types::RelaxationHint;

/// Attribution failures. Both are caller errors, surfaced synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributionError {
    UnknownTool(UnknownToolError),
    /// Attribution attempted with zero actors registered.
    EmptyRegistry,
}

impl fmt::Display for AttributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool(err) => err.fmt(f),
            Self::EmptyRegistry => write!(f, "no actors registered"),
        }
    }
}

impl std::error::Error for AttributionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnknownTool(err) => Some(err),
            Self::EmptyRegistry => None,
        }
    }
}

impl From<UnknownToolError> for AttributionError {
    fn from(value: UnknownToolError) -> Self {
        Self::UnknownTool(value)
    }
}

/// Campaign ingestion / lookup failures. A failed ingestion leaves the
/// campaign untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignError {
    UnknownTool(UnknownToolError),
    UnknownCampaign { campaign_id: String },
    /// Campaign attribution attempted with zero actors registered.
    EmptyActorRegistry,
}

impl fmt::Display for CampaignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool(err) => err.fmt(f),
            Self::UnknownCampaign { campaign_id } => {
                write!(f, "unknown campaign: {campaign_id}")
            }
            Self::EmptyActorRegistry => write!(f, "no actors registered"),
        }
    }
}

impl std::error::Error for CampaignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnknownTool(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UnknownToolError> for CampaignError {
    fn from(value: UnknownToolError) -> Self {
        Self::UnknownTool(value)
    }
}

/// No tool subset satisfies the constraints. Always carries the minimal
/// relaxation found by unit-stepping the bounds until selection succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct InfeasibleConstraints {
    pub hint: RelaxationHint,
}

impl fmt::Display for InfeasibleConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hint {
            RelaxationHint::IncreaseMaxTools { by } => {
                write!(f, "infeasible constraints: increase max_tools by {by}")
            }
            RelaxationHint::IncreaseMaxEntropy { by } => {
                write!(f, "infeasible constraints: increase max_entropy by {by:.1}")
            }
            RelaxationHint::NoCandidates => {
                write!(f, "infeasible constraints: no candidate tools pass the filters")
            }
        }
    }
}

impl std::error::Error for InfeasibleConstraints {}

/// Validation cannot start without seed data; per-trial errors are
/// aggregated into the report instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyToolRegistry,
    EmptyActorRegistry,
    NoCapabilities,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyToolRegistry => write!(f, "validation needs at least one tool"),
            Self::EmptyActorRegistry => write!(f, "validation needs at least one actor"),
            Self::NoCapabilities => write!(f, "validation needs at least one capability"),
        }
    }
}

impl std::error::Error for ValidationError {}
