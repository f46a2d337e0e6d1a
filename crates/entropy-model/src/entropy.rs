//! Entropy scoring.
//!
//! "Entropy" here is a scalar proxy for the operational complexity and
//! detection risk of a tool or tool chain, not Shannon entropy. Two
//! strategy seams keep the formulas swappable without touching callers:
//!
//! 1. [`EntropyModel`] — per-tool (base_entropy, uncertainty) from the
//!    dimension map. Default: [`WeightedDimensionModel`], a weighted mean
//!    plus sensitivity-scaled sample stddev.
//! 2. [`DistanceMetric`] — chain entropy vs. actor signature. Default:
//!    [`ZScoreDistance`].
//!
//! Chain-level scoring combines per-tool entropies with a redundancy
//! discount (repeated categories model shared infrastructure and skill
//! reuse) and an escalation bonus (ordered transitions into higher-impact
//! categories). The discount term is order-independent; only the
//! escalation term reads the sequence. That asymmetry is load-bearing:
//! campaign phase inference needs order sensitivity, raw risk scoring
//! does not.

use std::collections::BTreeMap;

use crate::error::UnknownToolError;
use crate::registry::ToolSnapshot;
use crate::types::{EntropySignature, Tool, TOOL_CATEGORIES};

/// Per-tool entropy formula. Must be pure: same tool, same output.
pub trait EntropyModel: Send + Sync {
    /// Returns `(base_entropy, uncertainty)` for a tool whose dimension
    /// values are already validated to lie in [0, 10].
    fn tool_entropy(&self, tool: &Tool) -> (f64, f64);
}

/// Default entropy formula: weight-normalized mean of the dimension
/// values, with uncertainty = sample stddev of the values scaled by
/// `sensitivity`. Unlisted dimensions weigh 1.0, so the empty override
/// map is the documented equal-weight default.
#[derive(Debug, Clone)]
pub struct WeightedDimensionModel {
    pub weights: BTreeMap<String, f64>,
    pub sensitivity: f64,
}

impl Default for WeightedDimensionModel {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            sensitivity: 0.5,
        }
    }
}

impl WeightedDimensionModel {
    pub fn with_weights(weights: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            weights: weights.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl EntropyModel for WeightedDimensionModel {
    fn tool_entropy(&self, tool: &Tool) -> (f64, f64) {
        if tool.dimensions.is_empty() {
            return (0.0, 0.0);
        }

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for (name, value) in &tool.dimensions {
            let w = self.weights.get(name).copied().unwrap_or(1.0);
            weighted_sum += w * value;
            weight_total += w;
        }
        let base = if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            0.0
        };

        (base, sample_stddev(tool.dimensions.values().copied()) * self.sensitivity)
    }
}

/// Distance between an observed chain entropy and an actor signature.
pub trait DistanceMetric: Send + Sync {
    fn distance(&self, chain_entropy: f64, signature: &EntropySignature) -> f64;
}

/// Normalized z-score distance: `(entropy - mean) / stddev`. Signature
/// stddev is guaranteed positive by actor registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZScoreDistance;

impl DistanceMetric for ZScoreDistance {
    fn distance(&self, chain_entropy: f64, signature: &EntropySignature) -> f64 {
        (chain_entropy - signature.mean) / signature.stddev
    }
}

/// Chain-level scoring constants.
#[derive(Debug, Clone)]
pub struct ChainEntropyConfig {
    /// Fraction of base entropy contributed by each tool in an
    /// already-covered category (shared infrastructure reuse).
    pub redundancy_fraction: f64,
    /// Bonus fraction of the later tool's base entropy per adjacent
    /// forward escalation (transition into a strictly higher-impact
    /// category).
    pub escalation_bonus: f64,
}

impl Default for ChainEntropyConfig {
    fn default() -> Self {
        Self {
            redundancy_fraction: 0.4,
            escalation_bonus: 0.05,
        }
    }
}

/// Chain entropy result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainEntropy {
    pub entropy: f64,
    pub uncertainty: f64,
}

/// Computes chain entropy against a registry snapshot.
pub struct ChainScorer {
    model: Box<dyn EntropyModel>,
    config: ChainEntropyConfig,
}

impl Default for ChainScorer {
    fn default() -> Self {
        Self::new(
            Box::new(WeightedDimensionModel::default()),
            ChainEntropyConfig::default(),
        )
    }
}

impl ChainScorer {
    pub fn new(model: Box<dyn EntropyModel>, config: ChainEntropyConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ChainEntropyConfig {
        &self.config
    }

    /// Per-tool `(base_entropy, uncertainty)` under the configured model.
    pub fn tool_entropy(&self, tool: &Tool) -> (f64, f64) {
        self.model.tool_entropy(tool)
    }

    /// Scores an ordered chain of tool ids against `tools`.
    ///
    /// Every id must resolve; the first miss aborts the computation with
    /// `UnknownToolError`. The result is never negative and never exceeds
    /// the undiscounted sum of base entropies: the escalation bonus claws
    /// back redundancy discount but is capped at the raw sum, so pure
    /// risk scoring stays bounded by the per-tool total.
    pub fn chain_entropy<'a, I>(
        &self,
        tools: &ToolSnapshot,
        chain: I,
    ) -> Result<ChainEntropy, UnknownToolError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resolved: Vec<(&Tool, f64, f64)> = Vec::new();
        for id in chain {
            let tool = tools.get(id).ok_or_else(|| UnknownToolError::new(id))?;
            let (base, uncertainty) = self.model.tool_entropy(tool);
            resolved.push((tool, base, uncertainty));
        }
        if resolved.is_empty() {
            return Ok(ChainEntropy {
                entropy: 0.0,
                uncertainty: 0.0,
            });
        }

        let raw_sum: f64 = resolved.iter().map(|(_, base, _)| base).sum();

        // Redundancy discount, order-independent: within each category the
        // highest-entropy member contributes fully, every other member
        // contributes only the configured fraction.
        let mut discounted = 0.0;
        for category in TOOL_CATEGORIES {
            let mut in_category: Vec<f64> = resolved
                .iter()
                .filter(|(tool, _, _)| tool.category == category)
                .map(|(_, base, _)| *base)
                .collect();
            if in_category.is_empty() {
                continue;
            }
            in_category.sort_by(|a, b| b.total_cmp(a));
            discounted += in_category[0];
            for base in &in_category[1..] {
                discounted += base * self.config.redundancy_fraction;
            }
        }

        // Escalation bonus, order-dependent: each adjacent transition into
        // a strictly higher-rank category adds a fraction of the later
        // tool's base entropy.
        let mut bonus = 0.0;
        for pair in resolved.windows(2) {
            let (prev, _, _) = pair[0];
            let (next, next_base, _) = pair[1];
            if next.category.rank() > prev.category.rank() {
                bonus += next_base * self.config.escalation_bonus;
            }
        }

        let entropy = (discounted + bonus).min(raw_sum).max(0.0);
        let uncertainty = resolved
            .iter()
            .map(|(_, _, u)| u * u)
            .sum::<f64>()
            .sqrt();

        Ok(ChainEntropy {
            entropy,
            uncertainty,
        })
    }

    /// Fits an entropy signature from exemplar chains: mean and sample
    /// stddev of the per-chain entropies. Returns `None` for fewer than
    /// two exemplars or a zero-variance fit; callers surface the
    /// appropriate registration error.
    pub fn fit_signature<'a, C>(
        &self,
        tools: &ToolSnapshot,
        chains: C,
    ) -> Result<Option<EntropySignature>, UnknownToolError>
    where
        C: IntoIterator<Item = &'a crate::types::Chain>,
    {
        let mut entropies = Vec::new();
        for chain in chains {
            entropies.push(self.chain_entropy(tools, chain.iter())?.entropy);
        }
        if entropies.len() < 2 {
            return Ok(None);
        }
        let mean = entropies.iter().sum::<f64>() / entropies.len() as f64;
        let stddev = sample_stddev(entropies.iter().copied());
        if stddev > 0.0 {
            Ok(Some(EntropySignature::new(mean, stddev)))
        } else {
            Ok(None)
        }
    }
}

/// Sample standard deviation (n - 1 denominator); 0.0 below two samples.
pub(crate) fn sample_stddev(values: impl IntoIterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.into_iter().collect();
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}
