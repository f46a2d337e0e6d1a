//! Campaign phase and threat tracking.
//!
//! A campaign is a state machine over the HD4 phase ladder, initial
//! state Hunt, no terminal state. Each ingested event recomputes a
//! rolling entropy over the trailing window, proposes a candidate phase
//! from the newest tool's category, and applies hysteresis so a single
//! out-of-character event never flips the phase. Threat level combines
//! normalized rolling entropy with the top attribution confidence when
//! an actor hypothesis exists.
//!
//! Side effects stay inside the [`Campaign`] object; ingestion of an
//! event whose tool is unregistered fails before any mutation.

use entropy_model::{ActorSnapshot, ChainScorer, DistanceMetric, ToolSnapshot};

use crate::attribution::attribute;
use crate::error::{AttributionError, CampaignError};
use crate::types::{preferred_phase, Campaign, CampaignEvent, Phase, ThreatLevel};

#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Trailing window (events) for rolling entropy.
    pub window: usize,
    /// Consecutive agreeing events required before a phase transition.
    pub hysteresis_count: u32,
    /// Rolling entropy that saturates the entropy term of the threat
    /// score.
    pub entropy_scale: f64,
    pub entropy_weight: f64,
    pub attribution_weight: f64,
    /// Threat score thresholds (score below `medium` is Low).
    pub medium_threshold: f64,
    pub high_threshold: f64,
    pub critical_threshold: f64,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            window: 10,
            hysteresis_count: 2,
            entropy_scale: 40.0,
            entropy_weight: 0.7,
            attribution_weight: 0.3,
            medium_threshold: 0.3,
            high_threshold: 0.55,
            critical_threshold: 0.8,
        }
    }
}

#[derive(Debug, Default)]
pub struct CampaignAnalyzer {
    pub config: CampaignConfig,
}

impl CampaignAnalyzer {
    pub fn new(config: CampaignConfig) -> Self {
        Self { config }
    }

    /// Applies one event to the campaign. Atomic: an unknown tool id
    /// fails before the event is appended or any state recomputed.
    /// Returns the post-ingestion `(phase, threat_level)`.
    pub fn ingest_event(
        &self,
        campaign: &mut Campaign,
        event: CampaignEvent,
        scorer: &ChainScorer,
        metric: &dyn DistanceMetric,
        tools: &ToolSnapshot,
        actors: &ActorSnapshot,
    ) -> Result<(Phase, ThreatLevel), CampaignError> {
        let tool = tools
            .get(&event.tool_id)
            .ok_or_else(|| entropy_model::UnknownToolError::new(event.tool_id.clone()))?
            .clone();

        campaign.events.push(event);

        let window_start = campaign.events.len().saturating_sub(self.config.window);
        let window_ids = campaign.events[window_start..]
            .iter()
            .map(|e| e.tool_id.as_str());
        // Window tools were all validated on their own ingestion and the
        // newest one above, so this cannot miss.
        let rolling = scorer
            .chain_entropy(tools, window_ids)
            .map_err(CampaignError::UnknownTool)?;

        let candidate = preferred_phase(tool.category);
        self.apply_hysteresis(campaign, candidate);

        let confidence = self.hypothesis_confidence(campaign, scorer, metric, tools, actors);
        let normalized = (rolling.entropy / self.config.entropy_scale).min(1.0);
        let score = self.config.entropy_weight * normalized
            + self.config.attribution_weight * confidence;
        campaign.threat_level = self.threat_level(score);

        tracing::debug!(
            campaign = %campaign.id,
            phase = campaign.phase.as_str(),
            threat = campaign.threat_level.as_str(),
            rolling_entropy = rolling.entropy,
            "ingested event"
        );
        Ok((campaign.phase, campaign.threat_level))
    }

    fn apply_hysteresis(&self, campaign: &mut Campaign, candidate: Phase) {
        if candidate == campaign.phase {
            campaign.pending_phase = None;
            return;
        }

        let streak = match campaign.pending_phase {
            Some((pending, count)) if pending == candidate => count + 1,
            _ => 1,
        };
        if streak >= self.config.hysteresis_count {
            tracing::info!(
                campaign = %campaign.id,
                from = campaign.phase.as_str(),
                to = candidate.as_str(),
                "phase transition"
            );
            campaign.phase = candidate;
            campaign.pending_phase = None;
        } else {
            campaign.pending_phase = Some((candidate, streak));
        }
    }

    /// Top attribution confidence over the trailing window, 0.0 when no
    /// actor hypothesis exists or attribution cannot run.
    fn hypothesis_confidence(
        &self,
        campaign: &Campaign,
        scorer: &ChainScorer,
        metric: &dyn DistanceMetric,
        tools: &ToolSnapshot,
        actors: &ActorSnapshot,
    ) -> f64 {
        if campaign.hypothesized_actor.is_none() {
            return 0.0;
        }
        let window_start = campaign.events.len().saturating_sub(self.config.window);
        let window_ids = campaign.events[window_start..]
            .iter()
            .map(|e| e.tool_id.as_str());
        match attribute(scorer, metric, tools, actors, window_ids) {
            Ok(ranked) => ranked.first().map(|r| r.confidence).unwrap_or(0.0),
            Err(_) => 0.0,
        }
    }

    fn threat_level(&self, score: f64) -> ThreatLevel {
        if score >= self.config.critical_threshold {
            ThreatLevel::Critical
        } else if score >= self.config.high_threshold {
            ThreatLevel::High
        } else if score >= self.config.medium_threshold {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }

    /// Runs attribution over the full event chain and records the top
    /// actor as the campaign's hypothesis.
    pub fn attribute_campaign(
        &self,
        campaign: &mut Campaign,
        scorer: &ChainScorer,
        metric: &dyn DistanceMetric,
        tools: &ToolSnapshot,
        actors: &ActorSnapshot,
    ) -> Result<Vec<crate::types::AttributionResult>, AttributionError> {
        let ids = campaign.events.iter().map(|e| e.tool_id.as_str());
        let ranked = attribute(scorer, metric, tools, actors, ids)?;
        campaign.hypothesized_actor = ranked.first().map(|r| r.actor_id.clone());
        Ok(ranked)
    }

    /// Most-preferred unused tool of the campaign's (possibly freshly
    /// attributed) actor. `None` when the actor has no registered,
    /// unused preferred tool left.
    pub fn predict_next_tool(
        &self,
        campaign: &Campaign,
        scorer: &ChainScorer,
        metric: &dyn DistanceMetric,
        tools: &ToolSnapshot,
        actors: &ActorSnapshot,
    ) -> Result<Option<String>, AttributionError> {
        let actor_id = match &campaign.hypothesized_actor {
            Some(id) => id.clone(),
            None => {
                let ids = campaign.events.iter().map(|e| e.tool_id.as_str());
                match attribute(scorer, metric, tools, actors, ids)?.first() {
                    Some(top) => top.actor_id.clone(),
                    None => return Ok(None),
                }
            }
        };
        let actor = match actors.get(&actor_id) {
            Some(actor) => actor,
            None => return Ok(None),
        };

        let mut preferred: Vec<&(String, f64)> = actor.preferred_tools.iter().collect();
        preferred.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let used: Vec<&str> = campaign.events.iter().map(|e| e.tool_id.as_str()).collect();
        Ok(preferred
            .into_iter()
            .filter(|(id, _)| tools.contains_key(id))
            .find(|(id, _)| !used.contains(&id.as_str()))
            .map(|(id, _)| id.clone()))
    }

    /// Explicit rollback to the created-empty state.
    pub fn reset(&self, campaign: &mut Campaign) {
        campaign.events.clear();
        campaign.hypothesized_actor = None;
        campaign.phase = Phase::Hunt;
        campaign.threat_level = ThreatLevel::Low;
        campaign.pending_phase = None;
    }
}
