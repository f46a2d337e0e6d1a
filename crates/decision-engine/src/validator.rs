//! Monte Carlo validation.
//!
//! Certifies the model offline: each trial samples an actor, perturbs
//! its preferred tools' entropy dimensions by bounded noise, synthesizes
//! a chain from the perturbed registry view, runs one capability against
//! the known ground truth, and records the outcome. Aggregation is a
//! commutative sum of success/failure counts, and every trial derives
//! its own RNG from `(seed, capability, trial)` via splitmix64, so
//! execution order can never change the report: fixed `(seed, trials)`
//! reproduces it bit-for-bit.
//!
//! Per-trial errors become counted `SimulationFailure`s, never batch
//! aborts; the validator's product is aggregate confidence, not
//! single-trial correctness.

use std::collections::HashMap;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use entropy_model::{
    ActorProfile, ActorSnapshot, ChainScorer, DistanceMetric, Tool, ToolSnapshot, DIMENSION_MAX,
    DIMENSION_MIN,
};

use crate::attribution::attribute;
use crate::campaign::CampaignAnalyzer;
use crate::error::ValidationError;
use crate::optimizer::ChainOptimizer;
use crate::stats::wilson_interval;
use crate::types::{
    preferred_phase, Campaign, CampaignEvent, Capability, CapabilityReport, ChainConstraints,
    OptimizationObjective, ValidationReport,
};

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Two-sided confidence level for the Wilson intervals.
    pub confidence_level: f64,
    /// Half-width of the uniform dimension perturbation applied to a
    /// sampled actor's preferred tools.
    pub perturbation: f64,
    pub min_chain_len: usize,
    pub max_chain_len: usize,
    /// Optional early stop once every capability's interval is at most
    /// this wide. Purely an optimization; results for the trials that
    /// did run are unchanged.
    pub target_ci_width: Option<f64>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            perturbation: 1.0,
            min_chain_len: 3,
            max_chain_len: 6,
            target_ci_width: None,
        }
    }
}

/// Outcome of one synthetic trial.
enum TrialOutcome {
    Success,
    Miss,
    /// The trial errored instead of producing a wrong answer.
    SimulationFailure,
}

#[derive(Debug, Default)]
pub struct MonteCarloValidator {
    pub config: ValidatorConfig,
}

impl MonteCarloValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        trials: u64,
        seed: u64,
        capabilities: &[Capability],
        scorer: &ChainScorer,
        metric: &dyn DistanceMetric,
        analyzer: &CampaignAnalyzer,
        optimizer: &ChainOptimizer,
        tools: &ToolSnapshot,
        actors: &ActorSnapshot,
    ) -> Result<ValidationReport, ValidationError> {
        if capabilities.is_empty() {
            return Err(ValidationError::NoCapabilities);
        }
        if tools.is_empty() {
            return Err(ValidationError::EmptyToolRegistry);
        }
        if actors.is_empty() {
            return Err(ValidationError::EmptyActorRegistry);
        }

        // Deterministic actor sampling order.
        let mut actor_ids: Vec<&String> = actors.keys().collect();
        actor_ids.sort();

        let mut reports = Vec::with_capacity(capabilities.len());
        for (cap_index, &capability) in capabilities.iter().enumerate() {
            let mut successes = 0u64;
            let mut failures = 0u64;
            let mut samples = 0u64;

            for trial in 0..trials {
                let stream = (cap_index as u64) << 32 | trial;
                let mut rng = ChaCha8Rng::seed_from_u64(mix_seed(seed, stream));

                let actor = &actors[actor_ids[rng.gen_range(0..actor_ids.len())]];
                let perturbed = perturb_preferred(tools, actor, self.config.perturbation, &mut rng);

                let outcome = match capability {
                    Capability::Attribution => self.attribution_trial(
                        scorer, metric, &perturbed, actors, actor, &mut rng,
                    ),
                    Capability::NextToolPrediction => self.next_tool_trial(
                        scorer, metric, analyzer, &perturbed, actors, actor, &mut rng,
                    ),
                    Capability::PhaseDetection => self.phase_trial(
                        scorer, metric, analyzer, &perturbed, actors, actor, &mut rng,
                    ),
                    Capability::OptimizerFeasibility => {
                        self.optimizer_trial(scorer, optimizer, &perturbed, actor, &mut rng)
                    }
                };

                samples += 1;
                match outcome {
                    TrialOutcome::Success => successes += 1,
                    TrialOutcome::Miss => {}
                    TrialOutcome::SimulationFailure => failures += 1,
                }

                if let Some(target) = self.config.target_ci_width {
                    let (low, high) =
                        wilson_interval(successes, samples, self.config.confidence_level);
                    if high - low <= target {
                        break;
                    }
                }
            }

            let (ci_low, ci_high) =
                wilson_interval(successes, samples, self.config.confidence_level);
            reports.push(CapabilityReport {
                capability,
                samples,
                successes,
                failures,
                accuracy: if samples > 0 {
                    successes as f64 / samples as f64
                } else {
                    0.0
                },
                ci_low,
                ci_high,
                confidence_level: self.config.confidence_level,
            });
            tracing::info!(
                capability = capability.as_str(),
                samples,
                successes,
                failures,
                "validation capability complete"
            );
        }

        Ok(ValidationReport {
            seed,
            trials,
            capabilities: reports,
        })
    }

    fn attribution_trial(
        &self,
        scorer: &ChainScorer,
        metric: &dyn DistanceMetric,
        tools: &ToolSnapshot,
        actors: &ActorSnapshot,
        actor: &ActorProfile,
        rng: &mut ChaCha8Rng,
    ) -> TrialOutcome {
        let chain = match self.synthesize_chain(tools, actor, rng) {
            Some(chain) => chain,
            None => return TrialOutcome::SimulationFailure,
        };
        match attribute(
            scorer,
            metric,
            tools,
            actors,
            chain.iter().map(String::as_str),
        ) {
            Ok(ranked) => {
                if ranked[0].actor_id == actor.id {
                    TrialOutcome::Success
                } else {
                    TrialOutcome::Miss
                }
            }
            Err(_) => TrialOutcome::SimulationFailure,
        }
    }

    fn next_tool_trial(
        &self,
        scorer: &ChainScorer,
        metric: &dyn DistanceMetric,
        analyzer: &CampaignAnalyzer,
        tools: &ToolSnapshot,
        actors: &ActorSnapshot,
        actor: &ActorProfile,
        rng: &mut ChaCha8Rng,
    ) -> TrialOutcome {
        let registered = registered_preferred(tools, actor);
        if registered.len() < 2 {
            return TrialOutcome::SimulationFailure;
        }
        let held_out = registered[rng.gen_range(0..registered.len())].clone();

        let mut campaign = Campaign::new(format!("synthetic-{}", actor.id));
        campaign.hypothesized_actor = Some(actor.id.clone());
        for (ts, id) in registered.iter().filter(|id| **id != held_out).enumerate() {
            let event = CampaignEvent::new(ts as i64, id.clone());
            if analyzer
                .ingest_event(&mut campaign, event, scorer, metric, tools, actors)
                .is_err()
            {
                return TrialOutcome::SimulationFailure;
            }
        }

        match analyzer.predict_next_tool(&campaign, scorer, metric, tools, actors) {
            Ok(Some(predicted)) if predicted == held_out => TrialOutcome::Success,
            Ok(_) => TrialOutcome::Miss,
            Err(_) => TrialOutcome::SimulationFailure,
        }
    }

    fn phase_trial(
        &self,
        scorer: &ChainScorer,
        metric: &dyn DistanceMetric,
        analyzer: &CampaignAnalyzer,
        tools: &ToolSnapshot,
        actors: &ActorSnapshot,
        actor: &ActorProfile,
        rng: &mut ChaCha8Rng,
    ) -> TrialOutcome {
        let registered = registered_preferred(tools, actor);
        if registered.is_empty() {
            return TrialOutcome::SimulationFailure;
        }
        let anchor = &registered[rng.gen_range(0..registered.len())];
        let target_category = match tools.get(anchor) {
            Some(tool) => tool.category,
            None => return TrialOutcome::SimulationFailure,
        };
        let expected = preferred_phase(target_category);

        // Enough same-category tools to clear hysteresis.
        let mut same_category: Vec<&String> = tools
            .iter()
            .filter(|(_, tool)| tool.category == target_category)
            .map(|(id, _)| id)
            .collect();
        same_category.sort();

        let mut campaign = Campaign::new(format!("synthetic-{}", actor.id));
        let burst = analyzer.config.hysteresis_count as usize + 1;
        for ts in 0..burst {
            let id = same_category[rng.gen_range(0..same_category.len())].clone();
            let event = CampaignEvent::new(ts as i64, id);
            if analyzer
                .ingest_event(&mut campaign, event, scorer, metric, tools, actors)
                .is_err()
            {
                return TrialOutcome::SimulationFailure;
            }
        }

        if campaign.phase == expected {
            TrialOutcome::Success
        } else {
            TrialOutcome::Miss
        }
    }

    fn optimizer_trial(
        &self,
        scorer: &ChainScorer,
        optimizer: &ChainOptimizer,
        tools: &ToolSnapshot,
        actor: &ActorProfile,
        rng: &mut ChaCha8Rng,
    ) -> TrialOutcome {
        let registered = registered_preferred(tools, actor);
        if registered.is_empty() {
            return TrialOutcome::SimulationFailure;
        }
        let k = rng.gen_range(1..=registered.len().min(3));
        let reference: Vec<&str> = registered[..k].iter().map(String::as_str).collect();

        // A budget a known subset fits under, so the constraints are
        // feasible by construction.
        let mut by_rank = reference.clone();
        by_rank.sort_by_key(|id| tools.get(*id).map(|t| t.category.rank()).unwrap_or(0));
        let reference_entropy = match scorer.chain_entropy(tools, by_rank.iter().copied()) {
            Ok(e) => e.entropy,
            Err(_) => return TrialOutcome::SimulationFailure,
        };
        let constraints = ChainConstraints {
            max_entropy: reference_entropy * 1.25 + 1.0,
            max_tools: k,
            operator_skill: 10.0,
            allowed_categories: None,
        };

        match optimizer.optimize_chain(
            scorer,
            tools,
            &constraints,
            OptimizationObjective::SuccessProbability,
        ) {
            Ok(result) => {
                let satisfies = result.chain.len() <= constraints.max_tools
                    && result.entropy <= constraints.max_entropy;
                if satisfies {
                    TrialOutcome::Success
                } else {
                    TrialOutcome::Miss
                }
            }
            Err(_) => TrialOutcome::Miss,
        }
    }

    /// Weighted sample (with replacement) over the actor's registered
    /// preferred tools.
    fn synthesize_chain(
        &self,
        tools: &ToolSnapshot,
        actor: &ActorProfile,
        rng: &mut ChaCha8Rng,
    ) -> Option<Vec<String>> {
        let weighted: Vec<(&String, f64)> = actor
            .preferred_tools
            .iter()
            .filter(|(id, _)| tools.contains_key(id))
            .map(|(id, w)| (id, w.max(0.0)))
            .collect();
        if weighted.is_empty() {
            return None;
        }
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();

        let len = rng.gen_range(self.config.min_chain_len..=self.config.max_chain_len);
        let mut chain = Vec::with_capacity(len);
        for _ in 0..len {
            let picked = if total > 0.0 {
                let mut roll = rng.gen::<f64>() * total;
                let mut chosen = weighted[weighted.len() - 1].0;
                for (id, w) in &weighted {
                    if roll < *w {
                        chosen = id;
                        break;
                    }
                    roll -= w;
                }
                chosen
            } else {
                weighted[rng.gen_range(0..weighted.len())].0
            };
            chain.push(picked.clone());
        }
        Some(chain)
    }
}

/// Preferred tool ids that resolve in the registry, weight-descending
/// with id tiebreak.
fn registered_preferred(tools: &ToolSnapshot, actor: &ActorProfile) -> Vec<String> {
    let mut registered: Vec<&(String, f64)> = actor
        .preferred_tools
        .iter()
        .filter(|(id, _)| tools.contains_key(id))
        .collect();
    registered.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    registered.into_iter().map(|(id, _)| id.clone()).collect()
}

/// Registry view with the actor's preferred tools' dimensions perturbed
/// by bounded uniform noise, clamped back into [0, 10].
fn perturb_preferred(
    tools: &ToolSnapshot,
    actor: &ActorProfile,
    half_width: f64,
    rng: &mut ChaCha8Rng,
) -> ToolSnapshot {
    let mut next: HashMap<String, Tool> = HashMap::clone(tools);
    for (id, _) in &actor.preferred_tools {
        if let Some(tool) = next.get_mut(id) {
            for value in tool.dimensions.values_mut() {
                let noise = rng.gen_range(-half_width..=half_width);
                *value = (*value + noise).clamp(DIMENSION_MIN, DIMENSION_MAX);
            }
        }
    }
    Arc::new(next)
}

/// splitmix64-style mixer deriving independent per-trial seeds from the
/// batch seed and a stream index.
fn mix_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
