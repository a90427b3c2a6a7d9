//! Audience scenarios for end-to-end simulation runs.

use crate::oracle::OracleProfile;
use persona_core::model::CampaignMetadata;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// SIM-001: Mildly positive, mixed audience
    Baseline,

    /// SIM-002: Two opposed camps, most reactions controversial
    Polarizing,

    /// SIM-003: Enthusiastic audience that shares widely
    Viral,

    /// SIM-004: Nobody cares enough to share
    Apathetic,

    /// SIM-005: A quarter of calls fail or return garbage
    FlakyOracle,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::Polarizing,
            ScenarioId::Viral,
            ScenarioId::Apathetic,
            ScenarioId::FlakyOracle,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::Polarizing => "polarizing",
            ScenarioId::Viral => "viral",
            ScenarioId::Apathetic => "apathetic",
            ScenarioId::FlakyOracle => "flaky_oracle",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Mixed audience, mildly positive, few controversies",
            ScenarioId::Polarizing => "Bimodal sentiment at +/-3.5, 90% controversy, verify compounding boost",
            ScenarioId::Viral => "High share likelihood, verify cascade grows past initial reach",
            ScenarioId::Apathetic => "Share likelihood near zero, verify no cascade",
            ScenarioId::FlakyOracle => "25% failed and 25% malformed replies, verify failures stay isolated",
        }
    }

    /// Audience profile the scripted oracle plays.
    pub fn profile(&self) -> OracleProfile {
        let base = OracleProfile::default();
        match self {
            ScenarioId::Baseline => base,
            ScenarioId::Polarizing => OracleProfile {
                sentiment_mean: 3.5,
                sentiment_spread: 1.0,
                polarized: true,
                share_mean: 60.0,
                controversy_rate: 0.9,
                ..base
            },
            ScenarioId::Viral => OracleProfile {
                sentiment_mean: 3.5,
                sentiment_spread: 1.0,
                share_mean: 85.0,
                share_spread: 8.0,
                controversy_rate: 0.05,
                ..base
            },
            ScenarioId::Apathetic => OracleProfile {
                sentiment_mean: 0.0,
                sentiment_spread: 0.8,
                share_mean: 8.0,
                share_spread: 5.0,
                controversy_rate: 0.0,
                ..base
            },
            ScenarioId::FlakyOracle => OracleProfile {
                malformed_rate: 0.25,
                failure_rate: 0.25,
                fenced_rate: 0.5,
                ..base
            },
        }
    }

    /// Campaign the scenario tests.
    pub fn campaign(&self) -> CampaignMetadata {
        match self {
            ScenarioId::Baseline => CampaignMetadata::new("Our new app helps you split bills with friends in seconds.")
                .with_company("startup", "small")
                .with_goal("awareness", "social media"),
            ScenarioId::Polarizing => CampaignMetadata::new("Real patriots buy American. Switch today!")
                .with_company("major brand", "large")
                .with_goal("brand positioning", "tv"),
            ScenarioId::Viral => CampaignMetadata::new("Free pizza for a year if you tag three friends!")
                .with_company("startup", "small")
                .with_target_outcome("viral engagement"),
            ScenarioId::Apathetic => CampaignMetadata::new("Quarterly update: our terms of service have changed.")
                .with_company("enterprise", "large")
                .with_goal("compliance notice", "email"),
            ScenarioId::FlakyOracle => CampaignMetadata::new("Save 20% on running shoes this weekend!")
                .with_target_outcome("sales conversion")
                .with_variants(vec![
                    "Save 20% on running shoes this weekend!".to_string(),
                    "Running shoes, 20% off, this weekend only.".to_string(),
                ]),
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "sim-001" => Ok(ScenarioId::Baseline),
            "polarizing" | "polarising" | "sim-002" => Ok(ScenarioId::Polarizing),
            "viral" | "sim-003" => Ok(ScenarioId::Viral),
            "apathetic" | "sim-004" => Ok(ScenarioId::Apathetic),
            "flaky_oracle" | "flakyoracle" | "flaky" | "sim-005" => Ok(ScenarioId::FlakyOracle),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
