//! Hourly virality cascade over a synthetic population.
//!
//! The cascade is seeded by the personas likely to share, grows with
//! sentiment, credibility and diffusion rate, and decays over the day. All
//! jitter comes from the injected `RandomSource`.

use crate::config::ViralityConfig;
use crate::model::Reaction;
use crate::stats;
use persona_env::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of one cascade run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViralityMetrics {
    /// Final reach, capped at the population
    pub reach_24h: u64,
    /// Largest single-hour growth
    pub peak_hour_reach: u64,
    /// Mean normalized share likelihood
    pub diffusion_rate: f64,
    /// floor(log10(reach_24h)), 0 when nothing was reached
    pub cascade_depth: u32,
    pub initial_reach: u64,
    pub population: u64,
    pub growth_factor: f64,
    /// Whether the controversy boost applied
    pub controversy_boosted: bool,
    /// Running reach after each hour, uncapped
    pub hourly_reach: Vec<f64>,
}

/// Simulates message diffusion hour by hour.
#[derive(Debug, Clone, Default)]
pub struct ViralityCascadeSimulator {
    config: ViralityConfig,
}

impl ViralityCascadeSimulator {
    pub fn new(config: ViralityConfig) -> Self {
        Self { config }
    }

    /// Runs the cascade for `config.hours` hours.
    ///
    /// When the controversial fraction exceeds the threshold, reach is
    /// multiplied by the boost at the end of every hour, so the boost
    /// compounds.
    pub fn simulate(
        &self,
        reactions: &[Reaction],
        persona_count: usize,
        rng: &mut dyn RandomSource,
    ) -> ViralityMetrics {
        let cfg = &self.config;
        let population = cfg
            .min_population
            .max(cfg.population_per_persona.saturating_mul(persona_count as u64));

        let sharers = reactions
            .iter()
            .filter(|r| r.share_likelihood > cfg.share_threshold)
            .count() as u64;
        let initial_reach = sharers * cfg.reach_per_sharer;

        let diffusion_rate = stats::mean(reactions.iter().map(|r| r.share_likelihood / 100.0)).unwrap_or(0.0);
        let mean_sentiment = stats::mean(reactions.iter().map(|r| r.sentiment)).unwrap_or(0.0);
        let mean_credibility = stats::mean_present(reactions.iter().map(|r| r.credibility))
            .unwrap_or(cfg.default_credibility);
        let growth_factor = ((mean_sentiment + 5.0) / 10.0 * (mean_credibility / 5.0) * diffusion_rate)
            .max(cfg.growth_floor);

        let controversial = reactions.iter().filter(|r| r.controversy_flag).count();
        let controversy_boosted =
            !reactions.is_empty() && controversial as f64 > reactions.len() as f64 * cfg.controversy_threshold;

        let mut reach = initial_reach as f64;
        let mut peak_hour_reach = 0u64;
        let mut hourly_reach = Vec::with_capacity(cfg.hours as usize);

        for hour in 0..cfg.hours {
            let time_decay = (1.0 - (hour as f64 / 24.0) * cfg.decay_slope).max(cfg.decay_floor);
            let jitter = rng.uniform(cfg.jitter_low, cfg.jitter_high);
            let hour_growth = (reach * growth_factor * time_decay * jitter).floor();

            reach += hour_growth;
            peak_hour_reach = peak_hour_reach.max(hour_growth as u64);
            if controversy_boosted {
                reach *= cfg.controversy_boost;
            }
            hourly_reach.push(reach);
        }

        let reach_24h = (reach.floor() as u64).min(population);
        let cascade_depth = if reach_24h > 0 {
            (reach_24h as f64).log10().floor() as u32
        } else {
            0
        };
        debug!(
            "Cascade: initial={} reach={} peak={} boosted={}",
            initial_reach, reach_24h, peak_hour_reach, controversy_boosted
        );

        ViralityMetrics {
            reach_24h,
            peak_hour_reach,
            diffusion_rate,
            cascade_depth,
            initial_reach,
            population,
            growth_factor,
            controversy_boosted,
            hourly_reach,
        }
    }
}
