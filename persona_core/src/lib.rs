//! Persona Engine Core - audience reaction analytics
//!
//! Turns a population of synthetic personas and their judgments of a message
//! into an insight report:
//! 1. **Aggregation**: means, sentiment histogram, themes, risk flags,
//!    emotion profile, controversy analysis, per-trait breakdowns
//! 2. **Simulation**: group chat consensus, virality cascade, popularity vote
//! 3. **Oracle boundary**: every external reply is parsed and range-checked
//!    into typed records before anything else sees it
//!
//! All randomness is drawn from an injected `persona_env::RandomSource`, so a
//! seeded source reproduces a run exactly.

pub mod model;
pub mod error;
pub mod schema;
pub mod stats;
pub mod config;
pub mod prompts;
pub mod emotion;
pub mod controversy;
pub mod traits;
pub mod group_chat;
pub mod virality;
pub mod voting;
pub mod report;
pub mod aggregator;
pub mod audience;
pub mod reactions;
pub mod explorer;
pub mod pipeline;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use aggregator::InsightAggregator;
pub use audience::{AudienceProfiler, PersonaFactory};
pub use config::{GroupChatConfig, PipelineConfig, ViralityConfig, VotingConfig};
pub use controversy::{ControversyAnalysis, ControversyAnalyzer, RiskGroup};
pub use emotion::{EmotionAggregator, EmotionProfile};
pub use error::{CoreError, SchemaError};
pub use explorer::{DemographicFilter, Explorer};
pub use group_chat::{ChatRecord, GroupChatMetrics, GroupChatSimulator};
pub use model::{
    AudienceSegment, BiasAnalysis, CampaignMetadata, EmotionVector, Persona, Reaction, EMOTIONS,
};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use reactions::{ReactionBatch, ReactionCollector, ReactionFailure};
pub use report::{InsightReport, RiskFlag, SentimentBucket, SimulationMetrics};
pub use traits::{RecommendationTier, TraitBreakdown, TraitDimension, TraitGroupInsight, TraitGrouper};
pub use virality::{ViralityCascadeSimulator, ViralityMetrics};
pub use voting::{PopularityVotingSimulator, PreferencePattern, VariantTally, VotingMetrics};
