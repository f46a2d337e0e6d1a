//! Constrained chain synthesis.
//!
//! Two phases:
//!
//! 1. **Selection** — pick a subset of registered tools maximizing the
//!    objective's per-tool utility under the entropy and tool-count
//!    budgets. Pools of at most [`OptimizerConfig::exact_search_limit`]
//!    candidates get an exhaustive subset search; larger pools fall back
//!    to a greedy utility-per-entropy ratio pass whose prefixes are each
//!    offered as candidate subsets, so an over-budget greedy pick sheds
//!    down to its longest feasible prefix instead of failing outright.
//!    Both strategies sit behind the same entry point and are swappable
//!    via config.
//! 2. **Sequencing** — order the selected subset along the phase
//!    precedence partial order (low-impact categories first) via
//!    minimum-cost assignment of tools to sequence slots
//!    ([`crate::assignment::assign`]); slot costs combine category-rank
//!    mismatch with an objective-specific placement penalty.
//!
//! Feasibility is judged on the *sequenced* chain, so the returned chain
//! always satisfies `chain_entropy <= max_entropy` and
//! `len <= max_tools` exactly as reported.
//!
//! Utility formulas (dimensions default to 5.0 when a tool omits one,
//! all scaled to [0, 1]):
//!   stealth = (detection_difficulty + (10 - stealth_cost)) / 20
//!   speed   = ((10 - infrastructure_cost) + (10 - technical_skill)) / 20
//!   success = (technical_skill + detection_difficulty) / 20
//! The weighted objective is the weight-normalized blend of the three.
//!
//! Success probability of the final chain is the product of per-tool
//! factors `1 - 0.35 * base/10 - 0.15 * uncertainty/10`, floored at
//! 0.05: higher complexity and higher uncertainty both cut the estimate.

use entropy_model::{
    ChainScorer, Tool, ToolSnapshot, DIM_DETECTION_DIFFICULTY, DIM_INFRASTRUCTURE_COST,
    DIM_STEALTH_COST, DIM_TECHNICAL_SKILL,
};

use crate::assignment::assign;
use crate::error::InfeasibleConstraints;
use crate::types::{ChainConstraints, OptimizationObjective, OptimizedChain, RelaxationHint};

const NEUTRAL_DIMENSION: f64 = 5.0;
/// Hard ceiling on the exhaustive-search pool; the bitmask enumeration
/// must stay well inside `u32` shift range whatever the config says.
const EXACT_POOL_CEILING: usize = 20;
const SUCCESS_ENTROPY_PENALTY: f64 = 0.35;
const SUCCESS_UNCERTAINTY_PENALTY: f64 = 0.15;
const SUCCESS_FLOOR: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Candidate pool size up to which subset selection is exhaustive.
    /// Capped internally at 20; larger pools always take the greedy path.
    pub exact_search_limit: usize,
    /// Ceiling on `max_entropy` relaxation steps when computing the
    /// infeasibility hint.
    pub max_relaxation_steps: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            exact_search_limit: 12,
            max_relaxation_steps: 100,
        }
    }
}

#[derive(Debug, Default)]
pub struct ChainOptimizer {
    pub config: OptimizerConfig,
}

struct Candidate {
    tool: Tool,
    base_entropy: f64,
    utility: f64,
}

impl ChainOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Synthesizes the best chain under the constraints, or fails with
    /// the minimal relaxation that would restore feasibility.
    pub fn optimize_chain(
        &self,
        scorer: &ChainScorer,
        tools: &ToolSnapshot,
        constraints: &ChainConstraints,
        objective: OptimizationObjective,
    ) -> Result<OptimizedChain, InfeasibleConstraints> {
        let candidates = self.candidates(scorer, tools, constraints, objective);
        if candidates.is_empty() {
            return Err(InfeasibleConstraints {
                hint: RelaxationHint::NoCandidates,
            });
        }

        match self.select_and_sequence(scorer, tools, &candidates, constraints, objective) {
            Some(best) => Ok(best),
            None => Err(InfeasibleConstraints {
                hint: self.relaxation_hint(scorer, tools, &candidates, constraints, objective),
            }),
        }
    }

    /// Skill- and category-filtered candidate pool, deterministically
    /// ordered by tool id.
    fn candidates(
        &self,
        scorer: &ChainScorer,
        tools: &ToolSnapshot,
        constraints: &ChainConstraints,
        objective: OptimizationObjective,
    ) -> Vec<Candidate> {
        let mut pool: Vec<Candidate> = tools
            .values()
            .filter(|tool| {
                dimension_or_neutral(tool, DIM_TECHNICAL_SKILL) <= constraints.operator_skill
            })
            .filter(|tool| match &constraints.allowed_categories {
                Some(allowed) => allowed.contains(&tool.category),
                None => true,
            })
            .map(|tool| {
                let (base_entropy, _) = scorer.tool_entropy(tool);
                Candidate {
                    utility: utility(tool, objective),
                    base_entropy,
                    tool: tool.clone(),
                }
            })
            .collect();
        pool.sort_by(|a, b| a.tool.id.cmp(&b.tool.id));
        pool
    }

    fn select_and_sequence(
        &self,
        scorer: &ChainScorer,
        tools: &ToolSnapshot,
        candidates: &[Candidate],
        constraints: &ChainConstraints,
        objective: OptimizationObjective,
    ) -> Option<OptimizedChain> {
        if constraints.max_tools == 0 {
            return None;
        }

        let exact_limit = self.config.exact_search_limit.min(EXACT_POOL_CEILING);
        let subsets: Vec<Vec<usize>> = if candidates.len() <= exact_limit {
            self.exact_subsets(candidates, constraints)
        } else {
            self.greedy_subsets(candidates, constraints, scorer.config().redundancy_fraction)
        };

        let mut best: Option<(f64, OptimizedChain)> = None;
        for subset in subsets {
            let chosen: Vec<&Candidate> = subset.iter().map(|&i| &candidates[i]).collect();
            let sequenced = self.sequence(&chosen, objective);
            let entropy = scorer
                .chain_entropy(tools, sequenced.iter().map(String::as_str))
                .ok()?;
            if entropy.entropy > constraints.max_entropy {
                continue;
            }

            let utility_sum: f64 = chosen.iter().map(|c| c.utility).sum();
            let success = success_probability(scorer, &chosen);
            let result = OptimizedChain {
                chain: sequenced.into_iter().collect(),
                entropy: entropy.entropy,
                success_probability: success,
            };
            let better = match &best {
                None => true,
                Some((best_utility, best_chain)) => {
                    utility_sum > *best_utility
                        || (utility_sum == *best_utility && result.chain < best_chain.chain)
                }
            };
            if better {
                best = Some((utility_sum, result));
            }
        }

        best.map(|(_, chain)| chain)
    }

    /// All non-empty subsets within the tool-count budget. Entropy
    /// feasibility is checked later on the sequenced chain.
    fn exact_subsets(
        &self,
        candidates: &[Candidate],
        constraints: &ChainConstraints,
    ) -> Vec<Vec<usize>> {
        let n = candidates.len();
        let mut subsets = Vec::new();
        for mask in 1u32..(1 << n) {
            if (mask.count_ones() as usize) > constraints.max_tools {
                continue;
            }
            subsets.push((0..n).filter(|i| mask & (1 << i) != 0).collect());
        }
        subsets
    }

    /// Greedy utility-per-entropy selection for large pools. Selection
    /// stops at the tool-count budget and skips tools that would blow
    /// the entropy budget even fully discounted. The discounted floor
    /// underestimates the real sequenced entropy (the first tool of each
    /// category contributes its full base), so every prefix of the pick
    /// is emitted as its own candidate subset and the caller's exact
    /// feasibility check sheds the over-budget tail.
    fn greedy_subsets(
        &self,
        candidates: &[Candidate],
        constraints: &ChainConstraints,
        discount_fraction: f64,
    ) -> Vec<Vec<usize>> {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| {
            let ra = candidates[a].utility / candidates[a].base_entropy.max(1e-9);
            let rb = candidates[b].utility / candidates[b].base_entropy.max(1e-9);
            rb.total_cmp(&ra)
                .then_with(|| candidates[a].tool.id.cmp(&candidates[b].tool.id))
        });

        let mut picked = Vec::new();
        let mut entropy_floor = 0.0;
        for idx in order {
            if picked.len() == constraints.max_tools {
                break;
            }
            // Lower bound on the subset's discounted entropy; the exact
            // sequenced entropy is re-checked by the caller.
            let contribution = candidates[idx].base_entropy * discount_fraction.min(1.0);
            if entropy_floor + contribution > constraints.max_entropy {
                continue;
            }
            entropy_floor += contribution;
            picked.push(idx);
        }

        (1..=picked.len())
            .map(|len| {
                let mut prefix = picked[..len].to_vec();
                prefix.sort_unstable();
                prefix
            })
            .collect()
    }

    /// Orders the chosen tools by minimum-cost assignment to sequence
    /// slots. Base cost is squared distance between a tool's rank-order
    /// position and the slot; the objective adds a placement penalty.
    fn sequence(&self, chosen: &[&Candidate], objective: OptimizationObjective) -> Vec<String> {
        let n = chosen.len();
        if n <= 1 {
            return chosen.iter().map(|c| c.tool.id.clone()).collect();
        }

        // Phase-precedence targets: ascending category rank, ties by id.
        let mut target_order: Vec<usize> = (0..n).collect();
        target_order.sort_by(|&a, &b| {
            chosen[a]
                .tool
                .category
                .rank()
                .cmp(&chosen[b].tool.category.rank())
                .then_with(|| chosen[a].tool.id.cmp(&chosen[b].tool.id))
        });
        let mut target_slot = vec![0usize; n];
        for (slot, &tool_idx) in target_order.iter().enumerate() {
            target_slot[tool_idx] = slot;
        }

        let cost: Vec<Vec<f64>> = (0..n)
            .map(|tool_idx| {
                (0..n)
                    .map(|slot| {
                        let mismatch = target_slot[tool_idx] as f64 - slot as f64;
                        mismatch * mismatch
                            + placement_penalty(&chosen[tool_idx].tool, slot, n, objective)
                    })
                    .collect()
            })
            .collect();

        let slots = assign(&cost);
        let mut ordered: Vec<(usize, &str)> = chosen
            .iter()
            .enumerate()
            .map(|(tool_idx, c)| (slots[tool_idx], c.tool.id.as_str()))
            .collect();
        ordered.sort_unstable_by_key(|(slot, _)| *slot);
        ordered.into_iter().map(|(_, id)| id.to_string()).collect()
    }

    /// Unit-steps the bounds until selection succeeds and reports the
    /// cheapest step that worked.
    fn relaxation_hint(
        &self,
        scorer: &ChainScorer,
        tools: &ToolSnapshot,
        candidates: &[Candidate],
        constraints: &ChainConstraints,
        objective: OptimizationObjective,
    ) -> RelaxationHint {
        let mut widened = constraints.clone();
        widened.max_tools += 1;
        if self
            .select_and_sequence(scorer, tools, candidates, &widened, objective)
            .is_some()
        {
            return RelaxationHint::IncreaseMaxTools { by: 1 };
        }

        let mut relaxed = constraints.clone();
        for step in 1..=self.config.max_relaxation_steps {
            relaxed.max_entropy = constraints.max_entropy + step as f64;
            if self
                .select_and_sequence(scorer, tools, candidates, &relaxed, objective)
                .is_some()
            {
                tracing::debug!(steps = step, "found entropy relaxation");
                return RelaxationHint::IncreaseMaxEntropy { by: step as f64 };
            }
        }
        RelaxationHint::NoCandidates
    }
}

fn dimension_or_neutral(tool: &Tool, name: &str) -> f64 {
    tool.dimension(name).unwrap_or(NEUTRAL_DIMENSION)
}

fn utility(tool: &Tool, objective: OptimizationObjective) -> f64 {
    let ts = dimension_or_neutral(tool, DIM_TECHNICAL_SKILL);
    let sc = dimension_or_neutral(tool, DIM_STEALTH_COST);
    let dd = dimension_or_neutral(tool, DIM_DETECTION_DIFFICULTY);
    let ic = dimension_or_neutral(tool, DIM_INFRASTRUCTURE_COST);

    let stealth = (dd + (10.0 - sc)) / 20.0;
    let speed = ((10.0 - ic) + (10.0 - ts)) / 20.0;
    let success = (ts + dd) / 20.0;

    match objective {
        OptimizationObjective::Stealth => stealth,
        OptimizationObjective::Speed => speed,
        OptimizationObjective::SuccessProbability => success,
        OptimizationObjective::Weighted {
            stealth: ws,
            speed: wp,
            success: wu,
        } => {
            let total = (ws + wp + wu).max(1e-9);
            (ws * stealth + wp * speed + wu * success) / total
        }
    }
}

/// Objective-specific slot penalty, scaled so it stays below the unit
/// mismatch cost and only breaks ties between rank-equivalent layouts.
fn placement_penalty(tool: &Tool, slot: usize, n: usize, objective: OptimizationObjective) -> f64 {
    let span = (n - 1).max(1) as f64;
    let earliness = (n - 1 - slot) as f64 / span;
    let lateness = slot as f64 / span;

    let stealth = dimension_or_neutral(tool, DIM_DETECTION_DIFFICULTY) / 10.0 * earliness;
    let speed = dimension_or_neutral(tool, DIM_INFRASTRUCTURE_COST) / 10.0 * lateness;
    let success = dimension_or_neutral(tool, DIM_TECHNICAL_SKILL) / 10.0 * earliness;

    let penalty = match objective {
        OptimizationObjective::Stealth => stealth,
        OptimizationObjective::Speed => speed,
        OptimizationObjective::SuccessProbability => success,
        OptimizationObjective::Weighted {
            stealth: ws,
            speed: wp,
            success: wu,
        } => {
            let total = (ws + wp + wu).max(1e-9);
            (ws * stealth + wp * speed + wu * success) / total
        }
    };
    penalty * 0.5
}

fn success_probability(scorer: &ChainScorer, chosen: &[&Candidate]) -> f64 {
    chosen
        .iter()
        .map(|c| {
            let (base, uncertainty) = scorer.tool_entropy(&c.tool);
            (1.0 - SUCCESS_ENTROPY_PENALTY * base / 10.0
                - SUCCESS_UNCERTAINTY_PENALTY * uncertainty / 10.0)
                .max(SUCCESS_FLOOR)
        })
        .product()
}
