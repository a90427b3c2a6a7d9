//! End-to-end run: profile, populate, react, aggregate.

use crate::aggregator::InsightAggregator;
use crate::audience::{AudienceProfiler, PersonaFactory};
use crate::config::PipelineConfig;
use crate::error::CoreError;
use crate::model::{AudienceSegment, BiasAnalysis, CampaignMetadata, Persona};
use crate::reactions::{ReactionBatch, ReactionCollector};
use crate::report::InsightReport;
use persona_env::{GenerativeOracle, RandomSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Every intermediate product of a full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub segments: Vec<AudienceSegment>,
    pub bias_analysis: BiasAnalysis,
    pub personas: Vec<Persona>,
    pub batch: ReactionBatch,
    pub report: InsightReport,
}

/// Wires the collaborators to one oracle and one configuration.
pub struct Pipeline {
    profiler: AudienceProfiler,
    factory: PersonaFactory,
    collector: ReactionCollector,
    aggregator: InsightAggregator,
}

impl Pipeline {
    pub fn new(oracle: Arc<dyn GenerativeOracle>, config: PipelineConfig) -> Self {
        Self {
            profiler: AudienceProfiler::new(Arc::clone(&oracle)),
            factory: PersonaFactory::new(Arc::clone(&oracle)),
            collector: ReactionCollector::new(Arc::clone(&oracle), config.reaction_concurrency),
            aggregator: InsightAggregator::new(oracle, config),
        }
    }

    pub fn aggregator(&self) -> &InsightAggregator {
        &self.aggregator
    }

    /// Runs every stage for `metadata.message`.
    ///
    /// # Errors
    /// `CoreError::NoReactions` when no persona produced a usable reaction.
    pub async fn run(
        &self,
        metadata: &CampaignMetadata,
        personas_per_segment: usize,
        run_simulations: bool,
        rng: &mut dyn RandomSource,
    ) -> Result<PipelineOutcome, CoreError> {
        let (segments, bias_analysis) = self.profiler.profile(metadata).await;
        let personas = self.factory.populate(&segments, personas_per_segment, metadata).await;
        self.run_with_personas(metadata, segments, bias_analysis, personas, run_simulations, rng)
            .await
    }

    /// Runs the reaction and aggregation stages over existing personas.
    pub async fn run_with_personas(
        &self,
        metadata: &CampaignMetadata,
        segments: Vec<AudienceSegment>,
        bias_analysis: BiasAnalysis,
        personas: Vec<Persona>,
        run_simulations: bool,
        rng: &mut dyn RandomSource,
    ) -> Result<PipelineOutcome, CoreError> {
        let batch = self.collector.collect(&personas, &metadata.message).await;
        let report = self
            .aggregator
            .run_insight_pipeline(&batch.reactions, &personas, &bias_analysis, metadata, run_simulations, rng)
            .await?;
        info!(
            "Pipeline finished: {} personas, {} reactions, mean sentiment {:.2}",
            personas.len(),
            batch.reactions.len(),
            report.mean_sentiment
        );
        Ok(PipelineOutcome {
            segments,
            bias_analysis,
            personas,
            batch,
            report,
        })
    }
}
