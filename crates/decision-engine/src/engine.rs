//! Facade wiring the registries, scorer, and engines into the narrow
//! call surface consumed by surrounding layers (consoles, task runners,
//! the firing interface). Pure library: no I/O, no global state.
//!
//! Registries use copy-on-write snapshots internally, so registration
//! through `&self` is safe against concurrent reads. The campaign table
//! is owned by the engine and mutated through `&mut self`: events within
//! one campaign must apply in order, and callers that want concurrent
//! campaigns run one engine (or one table shard) per campaign.

use std::collections::HashMap;

use entropy_model::{
    ActorProfile, ActorRegistry, Chain, ChainEntropy, ChainScorer, DistanceMetric, RegistryError,
    Tool, ToolRegistry, UnknownToolError, ZScoreDistance,
};

use crate::campaign::{CampaignAnalyzer, CampaignConfig};
use crate::error::{AttributionError, CampaignError, InfeasibleConstraints, ValidationError};
use crate::optimizer::{ChainOptimizer, OptimizerConfig};
use crate::types::{
    AttributionResult, Campaign, CampaignEvent, Capability, ChainConstraints,
    OptimizationObjective, OptimizedChain, Phase, ThreatLevel, ValidationReport,
};
use crate::attribution;
use crate::validator::{MonteCarloValidator, ValidatorConfig};

pub struct DecisionEngine {
    tools: ToolRegistry,
    actors: ActorRegistry,
    scorer: ChainScorer,
    metric: Box<dyn DistanceMetric>,
    analyzer: CampaignAnalyzer,
    optimizer: ChainOptimizer,
    validator: MonteCarloValidator,
    campaigns: HashMap<String, Campaign>,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(
            ChainScorer::default(),
            Box::new(ZScoreDistance),
            CampaignConfig::default(),
            OptimizerConfig::default(),
            ValidatorConfig::default(),
        )
    }
}

impl DecisionEngine {
    pub fn new(
        scorer: ChainScorer,
        metric: Box<dyn DistanceMetric>,
        campaign_config: CampaignConfig,
        optimizer_config: OptimizerConfig,
        validator_config: ValidatorConfig,
    ) -> Self {
        Self {
            tools: ToolRegistry::new(),
            actors: ActorRegistry::new(),
            scorer,
            metric,
            analyzer: CampaignAnalyzer::new(campaign_config),
            optimizer: ChainOptimizer::new(optimizer_config),
            validator: MonteCarloValidator::new(validator_config),
            campaigns: HashMap::new(),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn actors(&self) -> &ActorRegistry {
        &self.actors
    }

    pub fn register_tool(&self, tool: Tool, replace: bool) -> Result<(), RegistryError> {
        self.tools.register(tool, replace)
    }

    pub fn register_actor(&self, actor: ActorProfile, replace: bool) -> Result<(), RegistryError> {
        self.actors.register(actor, replace)
    }

    /// Registers an actor with its signature fitted from exemplar chains.
    pub fn register_actor_from_exemplars(
        &self,
        actor: ActorProfile,
        replace: bool,
    ) -> Result<(), RegistryError> {
        self.actors
            .register_from_exemplars(actor, &self.scorer, &self.tools.snapshot(), replace)
    }

    /// Derived `(base_entropy, uncertainty)` of a registered tool.
    pub fn tool_entropy(&self, tool_id: &str) -> Result<(f64, f64), UnknownToolError> {
        let tool = self.tools.get(tool_id)?;
        Ok(self.scorer.tool_entropy(&tool))
    }

    /// Order-aware entropy of an arbitrary chain (pure risk scoring).
    pub fn chain_entropy(&self, chain: &Chain) -> Result<ChainEntropy, UnknownToolError> {
        self.scorer
            .chain_entropy(&self.tools.snapshot(), chain.iter())
    }

    /// Ranks every registered actor against the chain; confidences sum
    /// to 1 across the result.
    pub fn attribute(&self, chain: &Chain) -> Result<Vec<AttributionResult>, AttributionError> {
        attribution::attribute(
            &self.scorer,
            self.metric.as_ref(),
            &self.tools.snapshot(),
            &self.actors.snapshot(),
            chain.iter(),
        )
    }

    pub fn attribute_top(
        &self,
        chain: &Chain,
        n: usize,
    ) -> Result<Vec<AttributionResult>, AttributionError> {
        attribution::attribute_top(
            &self.scorer,
            self.metric.as_ref(),
            &self.tools.snapshot(),
            &self.actors.snapshot(),
            chain.iter(),
            n,
        )
    }

    /// Applies one event to the campaign, creating it on first use.
    /// Atomic per event: an unknown tool leaves the campaign unchanged.
    pub fn ingest_event(
        &mut self,
        campaign_id: &str,
        event: CampaignEvent,
    ) -> Result<(Phase, ThreatLevel), CampaignError> {
        let campaign = self
            .campaigns
            .entry(campaign_id.to_string())
            .or_insert_with(|| Campaign::new(campaign_id));
        self.analyzer.ingest_event(
            campaign,
            event,
            &self.scorer,
            self.metric.as_ref(),
            &self.tools.snapshot(),
            &self.actors.snapshot(),
        )
    }

    pub fn campaign(&self, campaign_id: &str) -> Option<&Campaign> {
        self.campaigns.get(campaign_id)
    }

    /// Runs attribution over the campaign's full chain and records the
    /// top actor as its hypothesis.
    pub fn attribute_campaign(
        &mut self,
        campaign_id: &str,
    ) -> Result<Vec<AttributionResult>, CampaignError> {
        let campaign =
            self.campaigns
                .get_mut(campaign_id)
                .ok_or_else(|| CampaignError::UnknownCampaign {
                    campaign_id: campaign_id.to_string(),
                })?;
        self.analyzer
            .attribute_campaign(
                campaign,
                &self.scorer,
                self.metric.as_ref(),
                &self.tools.snapshot(),
                &self.actors.snapshot(),
            )
            .map_err(|err| match err {
                AttributionError::UnknownTool(e) => CampaignError::UnknownTool(e),
                AttributionError::EmptyRegistry => CampaignError::EmptyActorRegistry,
            })
    }

    /// Most-preferred unused tool of the campaign's hypothesized (or
    /// freshly attributed) actor. `Ok(None)` when nothing predictable
    /// remains, including the no-actors case.
    pub fn predict_next_tool(&self, campaign_id: &str) -> Result<Option<String>, CampaignError> {
        let campaign =
            self.campaigns
                .get(campaign_id)
                .ok_or_else(|| CampaignError::UnknownCampaign {
                    campaign_id: campaign_id.to_string(),
                })?;
        match self.analyzer.predict_next_tool(
            campaign,
            &self.scorer,
            self.metric.as_ref(),
            &self.tools.snapshot(),
            &self.actors.snapshot(),
        ) {
            Ok(prediction) => Ok(prediction),
            Err(AttributionError::EmptyRegistry) => Ok(None),
            Err(AttributionError::UnknownTool(e)) => Err(CampaignError::UnknownTool(e)),
        }
    }

    /// Explicitly rolls a campaign back to its created-empty state.
    pub fn reset_campaign(&mut self, campaign_id: &str) -> Result<(), CampaignError> {
        let campaign =
            self.campaigns
                .get_mut(campaign_id)
                .ok_or_else(|| CampaignError::UnknownCampaign {
                    campaign_id: campaign_id.to_string(),
                })?;
        self.analyzer.reset(campaign);
        Ok(())
    }

    pub fn optimize_chain(
        &self,
        constraints: &ChainConstraints,
        objective: OptimizationObjective,
    ) -> Result<OptimizedChain, InfeasibleConstraints> {
        self.optimizer.optimize_chain(
            &self.scorer,
            &self.tools.snapshot(),
            constraints,
            objective,
        )
    }

    pub fn validate(
        &self,
        trials: u64,
        seed: u64,
        capabilities: &[Capability],
    ) -> Result<ValidationReport, ValidationError> {
        self.validator.validate(
            trials,
            seed,
            capabilities,
            &self.scorer,
            self.metric.as_ref(),
            &self.analyzer,
            &self.optimizer,
            &self.tools.snapshot(),
            &self.actors.snapshot(),
        )
    }
}
