//! Scenario runner - executes audience scenarios end to end.

use crate::context::{derive_seed, SimContext};
use crate::error::SimError;
use crate::oracle::{OracleStats, ScriptedOracle};
use crate::scenarios::ScenarioId;

use persona_core::{Pipeline, PipelineConfig, PipelineOutcome};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sub-stream the scripted oracle draws from, apart from the simulators' stream.
const ORACLE_STREAM: u64 = 0x5eed_0a1e;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,

    /// Full pipeline output, absent when the pipeline itself failed
    pub outcome: Option<PipelineOutcome>,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioMetrics {
    pub personas: usize,
    pub reactions: usize,
    pub failed_reactions: usize,
    pub mean_sentiment: f64,
    pub controversy_rate: f64,
    pub consensus_index: f64,
    pub chat_fallbacks: usize,
    pub initial_reach: u64,
    pub reach_24h: u64,
    pub controversy_boosted: bool,
    pub win_rate: f64,
    pub defaulted_votes: usize,

    /// Oracle calls served, including injected faults
    pub oracle_calls: u64,

    /// Failures plus malformed replies the oracle injected
    pub injected_faults: u64,
}

impl ScenarioMetrics {
    fn collect(outcome: &PipelineOutcome, stats: OracleStats) -> Self {
        let report = &outcome.report;
        let mut metrics = Self {
            personas: outcome.personas.len(),
            reactions: outcome.batch.reactions.len(),
            failed_reactions: outcome.batch.failed.len(),
            mean_sentiment: report.mean_sentiment,
            controversy_rate: report.controversy.controversy_rate,
            oracle_calls: stats.calls,
            injected_faults: stats.failures + stats.malformed,
            ..Self::default()
        };
        if let Some(sims) = &report.simulations {
            metrics.consensus_index = sims.group_chat.consensus_index;
            metrics.chat_fallbacks = sims.group_chat.fallback_count;
            metrics.initial_reach = sims.virality.initial_reach;
            metrics.reach_24h = sims.virality.reach_24h;
            metrics.controversy_boosted = sims.virality.controversy_boosted;
            metrics.win_rate = sims.voting.win_rate;
            metrics.defaulted_votes = sims.voting.defaulted_votes;
        }
        metrics
    }
}

/// Runs audience scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Personas generated per audience segment
    personas_per_segment: usize,

    /// Engine configuration
    config: PipelineConfig,

    /// Run every scenario twice and require identical output
    check_determinism: bool,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, personas_per_segment: usize) -> Self {
        Self {
            seed,
            personas_per_segment,
            config: PipelineConfig::default(),
            check_determinism: true,
        }
    }

    /// Replaces the engine configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of group-chat turns.
    pub fn with_chat_turns(mut self, turns: usize) -> Self {
        self.config = self.config.with_chat_turns(turns);
        self
    }

    /// Enables or disables the same-seed replay check.
    pub fn with_determinism_check(mut self, enabled: bool) -> Self {
        self.check_determinism = enabled;
        self
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let (outcome, stats) = match self.execute(scenario).await {
            Ok(run) => run,
            Err(e) => {
                warn!("Scenario {} aborted: {}", scenario.name(), e);
                return ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: false,
                    failure_reason: Some(e.to_string()),
                    metrics: ScenarioMetrics::default(),
                    outcome: None,
                };
            }
        };

        let metrics = ScenarioMetrics::collect(&outcome, stats);
        let mut failures = self.check_invariants(&outcome);
        failures.extend(check_scenario(scenario, &metrics));

        if self.check_determinism {
            match self.execute(scenario).await {
                Ok((mut replay, _)) => {
                    // An unseeded run id is the only field allowed to differ
                    replay.report.run_id = outcome.report.run_id;
                    if replay != outcome {
                        failures.push(format!("seed {} did not reproduce the same run", self.seed));
                    }
                }
                Err(e) => failures.push(format!("replay failed: {}", e)),
            }
        }

        info!(
            "  personas={} reactions={} reach={} win_rate={:.2}",
            metrics.personas, metrics.reactions, metrics.reach_24h, metrics.win_rate
        );

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failures.is_empty(),
            failure_reason: (!failures.is_empty()).then(|| failures.join("; ")),
            metrics,
            outcome: Some(outcome),
        }
    }

    async fn execute(&self, scenario: ScenarioId) -> Result<(PipelineOutcome, OracleStats), SimError> {
        let oracle = Arc::new(ScriptedOracle::new(
            derive_seed(self.seed, ORACLE_STREAM),
            scenario.profile(),
        ));
        let pipeline = Pipeline::new(oracle.clone(), self.config.clone());
        let mut context = SimContext::new(self.seed);
        let outcome = pipeline
            .run(&scenario.campaign(), self.personas_per_segment, true, &mut context)
            .await?;
        Ok((outcome, oracle.stats()))
    }

    /// Checks the properties every run must satisfy.
    pub fn check_invariants(&self, outcome: &PipelineOutcome) -> Vec<String> {
        let mut failures = Vec::new();
        let report = &outcome.report;

        if report.distribution_total() != report.reaction_count {
            failures.push(format!(
                "sentiment distribution sums to {}, expected {}",
                report.distribution_total(),
                report.reaction_count
            ));
        }
        if outcome.batch.reactions.len() + outcome.batch.failed.len() != outcome.personas.len() {
            failures.push("reactions and failures do not cover every persona".to_string());
        }
        if !(-5.0..=5.0).contains(&report.mean_sentiment) {
            failures.push(format!("mean sentiment {:.3} outside [-5, 5]", report.mean_sentiment));
        }
        if !(0.0..=1.0).contains(&report.controversy.controversy_rate) {
            failures.push(format!("controversy rate {:.3} outside [0, 1]", report.controversy.controversy_rate));
        }
        if report.risk_flags.len() > self.config.risk_flag_limit {
            failures.push(format!("{} risk flags exceed limit", report.risk_flags.len()));
        }

        let Some(sims) = &report.simulations else {
            failures.push("simulations missing".to_string());
            return failures;
        };

        let chat = &sims.group_chat;
        if !(0.0..=1.0).contains(&chat.consensus_index) {
            failures.push(format!("consensus index {:.3} outside [0, 1]", chat.consensus_index));
        }
        let expected_records =
            self.config.chat.turns * outcome.personas.len().min(self.config.chat.max_participants);
        if chat.records.len() != expected_records {
            failures.push(format!("{} chat records, expected {}", chat.records.len(), expected_records));
        }

        let virality = &sims.virality;
        if virality.reach_24h > virality.population {
            failures.push(format!(
                "reach {} exceeds population {}",
                virality.reach_24h, virality.population
            ));
        }

        let voting = &sims.voting;
        if voting.total_votes() != outcome.personas.len() {
            failures.push(format!(
                "{} votes counted for {} personas",
                voting.total_votes(),
                outcome.personas.len()
            ));
        }
        let (lower, upper) = voting.confidence_interval;
        if !(0.0..=1.0).contains(&voting.win_rate) || lower > upper || !(0.0..=1.0).contains(&upper) {
            failures.push(format!(
                "win rate {:.3} with interval ({:.3}, {:.3}) is inconsistent",
                voting.win_rate, lower, upper
            ));
        }
        failures
    }
}

/// Checks the behavior a particular scenario exists to provoke.
fn check_scenario(scenario: ScenarioId, metrics: &ScenarioMetrics) -> Vec<String> {
    let mut failures = Vec::new();

    let observed_faults = (metrics.failed_reactions + metrics.chat_fallbacks + metrics.defaulted_votes) as u64;
    if observed_faults > metrics.injected_faults {
        failures.push(format!(
            "{} degraded units but only {} injected faults",
            observed_faults, metrics.injected_faults
        ));
    }

    match scenario {
        ScenarioId::Baseline | ScenarioId::FlakyOracle => {}
        ScenarioId::Polarizing => {
            if !metrics.controversy_boosted {
                failures.push(format!(
                    "controversy rate {:.2} did not trigger the boost",
                    metrics.controversy_rate
                ));
            }
        }
        ScenarioId::Viral => {
            if metrics.initial_reach == 0 || metrics.reach_24h <= metrics.initial_reach {
                failures.push(format!(
                    "cascade did not grow (initial {}, final {})",
                    metrics.initial_reach, metrics.reach_24h
                ));
            }
        }
        ScenarioId::Apathetic => {
            if metrics.initial_reach != 0 || metrics.reach_24h != 0 {
                failures.push(format!("unexpected reach {} with no sharers", metrics.reach_24h));
            }
        }
    }
    failures
}
