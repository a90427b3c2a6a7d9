//! Insight aggregation over a collected reaction set.
//!
//! The aggregator composes every analyzer into one `InsightReport`, runs the
//! simulators on request and asks the oracle for a narrative summary. It
//! holds no per-run state, so one instance can serve consecutive runs.

use crate::config::PipelineConfig;
use crate::controversy::ControversyAnalyzer;
use crate::emotion::EmotionAggregator;
use crate::error::CoreError;
use crate::group_chat::GroupChatSimulator;
use crate::model::{index_personas, BiasAnalysis, CampaignMetadata, Persona, Reaction};
use crate::prompts;
use crate::report::{self, InsightReport, RiskFlag, SentimentBucket, SimulationMetrics};
use crate::stats;
use crate::traits::TraitGrouper;
use crate::virality::ViralityCascadeSimulator;
use crate::voting::{self, PopularityVotingSimulator};
use persona_env::{CallKind, GenerativeOracle, OracleRequest, RandomSource, RunId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

/// Sentiment below which a reaction raises a risk flag.
pub const STRONG_NEGATIVE_THRESHOLD: f64 = -2.0;

pub struct InsightAggregator {
    oracle: Arc<dyn GenerativeOracle>,
    config: PipelineConfig,
    grouper: TraitGrouper,
}

impl InsightAggregator {
    pub fn new(oracle: Arc<dyn GenerativeOracle>, config: PipelineConfig) -> Self {
        Self {
            oracle,
            config,
            grouper: TraitGrouper::default(),
        }
    }

    /// Replaces the trait dimensions used for group breakdowns.
    pub fn with_grouper(mut self, grouper: TraitGrouper) -> Self {
        self.grouper = grouper;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds the full report.
    ///
    /// Simulations run only when `run_simulations` is set; voting uses the
    /// metadata's explicit variants, or variants derived from the message.
    /// A failed summary call leaves `executive_summary` empty.
    ///
    /// # Errors
    /// * `CoreError::NoReactions` - `reactions` is empty
    /// * `CoreError::UnknownPersona` - a reaction's persona is not in `personas`
    pub async fn run_insight_pipeline(
        &self,
        reactions: &[Reaction],
        personas: &[Persona],
        bias: &BiasAnalysis,
        metadata: &CampaignMetadata,
        run_simulations: bool,
        rng: &mut dyn RandomSource,
    ) -> Result<InsightReport, CoreError> {
        let run_id = match rng.seed() {
            0 => RunId::new(),
            seed => RunId::from_seed(seed),
        };
        let mut report = self.aggregate(run_id, reactions, personas, bias, metadata)?;
        info!("Run {}: aggregated {} reactions", run_id, reactions.len());

        if run_simulations {
            report.simulations = Some(self.simulate(reactions, personas, metadata, rng).await);
        }

        let request = OracleRequest::new(CallKind::Summary, prompts::summary_prompt(&report, metadata));
        report.executive_summary = match self.oracle.complete(request).await {
            Ok(text) => Some(text.trim().to_string()),
            Err(e) => {
                warn!("Executive summary unavailable: {}", e);
                None
            }
        };
        Ok(report)
    }

    /// Computes every deterministic part of the report.
    ///
    /// Leaves `simulations` and `executive_summary` empty.
    pub fn aggregate(
        &self,
        run_id: RunId,
        reactions: &[Reaction],
        personas: &[Persona],
        bias: &BiasAnalysis,
        metadata: &CampaignMetadata,
    ) -> Result<InsightReport, CoreError> {
        if reactions.is_empty() {
            return Err(CoreError::NoReactions);
        }
        let index = index_personas(personas);
        if let Some(orphan) = reactions.iter().find(|r| !index.contains_key(r.persona_id.as_str())) {
            return Err(CoreError::UnknownPersona(orphan.persona_id.clone()));
        }

        let mean_sentiment = stats::mean(reactions.iter().map(|r| r.sentiment)).ok_or(CoreError::NoReactions)?;
        let mean_share_likelihood =
            stats::mean(reactions.iter().map(|r| r.share_likelihood)).ok_or(CoreError::NoReactions)?;
        let mean_credibility = stats::mean_present(reactions.iter().map(|r| r.credibility));
        let mean_purchase_intent = stats::mean_present(reactions.iter().map(|r| r.purchase_intent));

        let mut sentiment_distribution = BTreeMap::new();
        for reaction in reactions {
            *sentiment_distribution.entry(SentimentBucket::of(reaction.sentiment)).or_insert(0) += 1;
        }

        let emotional_themes = stats::top_k(
            reactions.iter().flat_map(|r| r.emotional_triggers.iter().map(String::as_str)),
            self.config.theme_limit,
        );
        let controversy = ControversyAnalyzer.analyze(reactions, &index);
        let context_insights = report::context_insights(
            metadata,
            mean_share_likelihood,
            mean_credibility,
            mean_purchase_intent,
            controversy.controversy_rate,
        );

        let mut persona_ids: Vec<&str> = reactions.iter().map(|r| r.persona_id.as_str()).collect();
        persona_ids.sort_unstable();
        persona_ids.dedup();

        Ok(InsightReport {
            run_id,
            message: metadata.message.clone(),
            persona_count: persona_ids.len(),
            reaction_count: reactions.len(),
            mean_sentiment,
            mean_share_likelihood,
            mean_credibility,
            mean_purchase_intent,
            sentiment_distribution,
            emotional_themes,
            risk_flags: risk_flags(reactions, &index, self.config.risk_flag_limit),
            emotion_profile: EmotionAggregator.aggregate(reactions),
            controversy,
            trait_insights: self.grouper.analyze(reactions, personas),
            bias_analysis: bias.clone(),
            context_insights,
            simulations: None,
            executive_summary: None,
        })
    }

    async fn simulate(
        &self,
        reactions: &[Reaction],
        personas: &[Persona],
        metadata: &CampaignMetadata,
        rng: &mut dyn RandomSource,
    ) -> SimulationMetrics {
        info!("Running simulations over {} personas", personas.len());
        let group_chat = GroupChatSimulator::new(Arc::clone(&self.oracle), self.config.chat.clone())
            .run(personas, &metadata.message)
            .await;
        let virality = ViralityCascadeSimulator::new(self.config.virality.clone())
            .simulate(reactions, personas.len(), rng);

        let variants = if metadata.variants.is_empty() {
            voting::derive_variants(&metadata.message, &self.config.voting.campaign_suffix)
        } else {
            metadata.variants.clone()
        };
        let voting = PopularityVotingSimulator::new(Arc::clone(&self.oracle), self.config.voting.clone())
            .run(&variants, personas, rng)
            .await;

        SimulationMetrics {
            group_chat,
            virality,
            voting,
        }
    }
}

/// Strong negatives and controversies in discovery order, first `limit` kept.
///
/// A reaction that is both yields two flags.
pub fn risk_flags(reactions: &[Reaction], personas: &HashMap<&str, &Persona>, limit: usize) -> Vec<RiskFlag> {
    let mut flags = Vec::new();
    for reaction in reactions {
        let Some(persona) = personas.get(reaction.persona_id.as_str()) else {
            continue;
        };
        if reaction.sentiment < STRONG_NEGATIVE_THRESHOLD {
            flags.push(RiskFlag::StrongNegative {
                persona_id: persona.id.clone(),
                persona_name: persona.name.clone(),
                age_band: persona.demographic.age_band.clone(),
                ethnicity: persona.demographic.ethnicity_omb.clone(),
                sentiment: reaction.sentiment,
            });
        }
        if reaction.controversy_flag {
            flags.push(RiskFlag::Controversy {
                persona_id: persona.id.clone(),
                persona_name: persona.name.clone(),
                driver: reaction.controversy_driver.clone(),
            });
        }
    }
    flags.truncate(limit);
    flags
}
