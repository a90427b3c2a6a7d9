//! Pipeline configuration.
//!
//! Every knob defaults to the engine's reference constants, so
//! `PipelineConfig::default()` reproduces the standard behavior. A JSON file
//! may override any subset of fields.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Group-chat simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupChatConfig {
    /// Number of turns; every turn runs to completion
    pub turns: usize,
    pub max_participants: usize,
    /// Prior records shown to each speaker
    pub context_window: usize,
    /// Topic length cap, in characters
    pub topic_chars: usize,
    /// Utterances of a turn that form the next topic
    pub topic_sources: usize,
    pub fallback_utterance: String,
    pub fallback_sentiment: f64,
    pub dominant_voices: usize,
}

impl Default for GroupChatConfig {
    fn default() -> Self {
        Self {
            turns: 6,
            max_participants: 8,
            context_window: 6,
            topic_chars: 100,
            topic_sources: 3,
            fallback_utterance: "I think this is interesting.".to_string(),
            fallback_sentiment: 1.0,
            dominant_voices: 3,
        }
    }
}

/// Virality cascade settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViralityConfig {
    pub hours: u32,
    pub min_population: u64,
    pub population_per_persona: u64,
    /// Share likelihood above which a reaction seeds the cascade
    pub share_threshold: f64,
    pub reach_per_sharer: u64,
    /// Controversial fraction above which the boost applies
    pub controversy_threshold: f64,
    /// Multiplier applied to reach on every hour while controversial
    pub controversy_boost: f64,
    pub decay_slope: f64,
    pub decay_floor: f64,
    pub growth_floor: f64,
    pub jitter_low: f64,
    pub jitter_high: f64,
    /// Used when no reaction carries a credibility rating
    pub default_credibility: f64,
}

impl Default for ViralityConfig {
    fn default() -> Self {
        Self {
            hours: 24,
            min_population: 1000,
            population_per_persona: 50,
            share_threshold: 50.0,
            reach_per_sharer: 10,
            controversy_threshold: 0.3,
            controversy_boost: 1.5,
            decay_slope: 0.7,
            decay_floor: 0.1,
            growth_floor: 0.1,
            jitter_low: 0.8,
            jitter_high: 1.2,
            default_credibility: 3.0,
        }
    }
}

impl ViralityConfig {
    pub fn with_hours(mut self, hours: u32) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_jitter(mut self, low: f64, high: f64) -> Self {
        self.jitter_low = low;
        self.jitter_high = high;
        self
    }
}

/// Popularity-vote settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    pub bootstrap_samples: usize,
    pub lower_percentile: f64,
    pub upper_percentile: f64,
    /// Appended to the sole message to derive the urgency variant
    pub urgency_suffix: String,
    /// Urgency suffix the pipeline uses when the campaign names no variants
    pub campaign_suffix: String,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            bootstrap_samples: 1000,
            lower_percentile: 2.5,
            upper_percentile: 97.5,
            urgency_suffix: " Limited time offer!".to_string(),
            campaign_suffix: " Don't miss out!".to_string(),
        }
    }
}

/// Top-level configuration for one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on in-flight reaction calls
    pub reaction_concurrency: usize,
    pub risk_flag_limit: usize,
    pub theme_limit: usize,
    pub chat: GroupChatConfig,
    pub virality: ViralityConfig,
    pub voting: VotingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reaction_concurrency: 4,
            risk_flag_limit: 5,
            theme_limit: 7,
            chat: GroupChatConfig::default(),
            virality: ViralityConfig::default(),
            voting: VotingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file, filling omitted fields with defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no simulator can run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.reaction_concurrency == 0 {
            return Err(CoreError::InvalidConfig("reaction_concurrency must be at least 1".into()));
        }
        if self.chat.max_participants == 0 {
            return Err(CoreError::InvalidConfig("chat.max_participants must be at least 1".into()));
        }
        if self.virality.jitter_high < self.virality.jitter_low {
            return Err(CoreError::InvalidConfig("virality jitter range is inverted".into()));
        }
        if self.voting.lower_percentile > self.voting.upper_percentile {
            return Err(CoreError::InvalidConfig("voting percentiles are inverted".into()));
        }
        Ok(())
    }

    pub fn with_reaction_concurrency(mut self, n: usize) -> Self {
        self.reaction_concurrency = n;
        self
    }

    pub fn with_chat_turns(mut self, turns: usize) -> Self {
        self.chat.turns = turns;
        self
    }

    pub fn with_virality(mut self, virality: ViralityConfig) -> Self {
        self.virality = virality;
        self
    }

    pub fn with_bootstrap_samples(mut self, samples: usize) -> Self {
        self.voting.bootstrap_samples = samples;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.reaction_concurrency, 4);
        assert_eq!(config.chat.max_participants, 8);
        assert_eq!(config.chat.context_window, 6);
        assert_eq!(config.virality.hours, 24);
        assert_eq!(config.virality.min_population, 1000);
        assert_eq!(config.voting.bootstrap_samples, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let json = r#"{"reaction_concurrency": 2, "chat": {"turns": 3}}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.reaction_concurrency, 2);
        assert_eq!(config.chat.turns, 3);
        assert_eq!(config.chat.topic_chars, 100);
        assert_eq!(config.virality, ViralityConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = PipelineConfig::default().with_reaction_concurrency(0);
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PipelineConfig::from_json_file("/definitely/not/here.json");
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
