//! Behavioral attribution: ranks registered actors by how closely an
//! observed chain's entropy matches their historical signatures.
//!
//! Chain entropy is computed once; each actor gets a signature distance
//! (z-score under the default metric), an unnormalized score
//! `exp(-|distance|)`, and a confidence from normalizing scores across
//! all registered actors — a softmax over negative absolute distance, so
//! confidences always sum to 1 with every actor represented.

use entropy_model::{ActorSnapshot, ChainScorer, DistanceMetric, ToolSnapshot};

use crate::error::AttributionError;
use crate::types::AttributionResult;

/// Ranks every registered actor against the chain.
///
/// Output is sorted by confidence descending, ties broken by actor id
/// ascending, so repeated calls over the same state are byte-identical.
pub fn attribute<'a, I>(
    scorer: &ChainScorer,
    metric: &dyn DistanceMetric,
    tools: &ToolSnapshot,
    actors: &ActorSnapshot,
    chain: I,
) -> Result<Vec<AttributionResult>, AttributionError>
where
    I: IntoIterator<Item = &'a str>,
{
    if actors.is_empty() {
        return Err(AttributionError::EmptyRegistry);
    }

    let observed = scorer.chain_entropy(tools, chain)?;

    let mut results: Vec<AttributionResult> = actors
        .values()
        .map(|actor| {
            let distance = metric.distance(observed.entropy, &actor.signature);
            AttributionResult {
                actor_id: actor.id.clone(),
                confidence: (-distance.abs()).exp(),
                distance,
            }
        })
        .collect();
    // Fixed summation order keeps the normalization reproducible across
    // registry rebuilds.
    results.sort_by(|a, b| a.actor_id.cmp(&b.actor_id));

    let total: f64 = results.iter().map(|r| r.confidence).sum();
    if total > 0.0 {
        for result in &mut results {
            result.confidence /= total;
        }
    } else {
        // Every score underflowed (all signatures implausibly far):
        // fall back to the uniform distribution rather than NaN.
        let uniform = 1.0 / results.len() as f64;
        for result in &mut results {
            result.confidence = uniform;
        }
    }

    results.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.actor_id.cmp(&b.actor_id))
    });

    tracing::debug!(
        entropy = observed.entropy,
        top = %results[0].actor_id,
        confidence = results[0].confidence,
        "attributed chain"
    );
    Ok(results)
}

/// Convenience wrapper: the `n` highest-confidence results.
pub fn attribute_top<'a, I>(
    scorer: &ChainScorer,
    metric: &dyn DistanceMetric,
    tools: &ToolSnapshot,
    actors: &ActorSnapshot,
    chain: I,
    n: usize,
) -> Result<Vec<AttributionResult>, AttributionError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ranked = attribute(scorer, metric, tools, actors, chain)?;
    ranked.truncate(n);
    Ok(ranked)
}
