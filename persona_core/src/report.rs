//! Insight report types.

use crate::controversy::ControversyAnalysis;
use crate::emotion::EmotionProfile;
use crate::group_chat::GroupChatMetrics;
use crate::model::{BiasAnalysis, CampaignMetadata};
use crate::traits::TraitBreakdown;
use crate::virality::ViralityMetrics;
use crate::voting::VotingMetrics;
use persona_env::RunId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Five-way sentiment bucket.
///
/// Boundaries are inclusive on the lower side: >= 3, >= 1, >= -1, >= -3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SentimentBucket {
    #[serde(rename = "Very Positive")]
    VeryPositive,
    #[serde(rename = "Positive")]
    Positive,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Negative")]
    Negative,
    #[serde(rename = "Very Negative")]
    VeryNegative,
}

impl SentimentBucket {
    pub fn of(sentiment: f64) -> Self {
        if sentiment >= 3.0 {
            SentimentBucket::VeryPositive
        } else if sentiment >= 1.0 {
            SentimentBucket::Positive
        } else if sentiment >= -1.0 {
            SentimentBucket::Neutral
        } else if sentiment >= -3.0 {
            SentimentBucket::Negative
        } else {
            SentimentBucket::VeryNegative
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SentimentBucket::VeryPositive => "Very Positive",
            SentimentBucket::Positive => "Positive",
            SentimentBucket::Neutral => "Neutral",
            SentimentBucket::Negative => "Negative",
            SentimentBucket::VeryNegative => "Very Negative",
        }
    }
}

impl std::fmt::Display for SentimentBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A reaction worth a human look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskFlag {
    /// Sentiment below -2
    StrongNegative {
        persona_id: String,
        persona_name: String,
        age_band: String,
        ethnicity: String,
        sentiment: f64,
    },
    /// Reaction carried the controversy flag
    Controversy {
        persona_id: String,
        persona_name: String,
        driver: Option<String>,
    },
}

impl std::fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskFlag::StrongNegative { persona_name, age_band, ethnicity, sentiment, .. } => write!(
                f,
                "Strong negative reaction from {} ({}, {}): {:.1}",
                persona_name, age_band, ethnicity, sentiment
            ),
            RiskFlag::Controversy { persona_name, driver, .. } => write!(
                f,
                "Controversy flagged by {}: {}",
                persona_name,
                driver.as_deref().unwrap_or("unspecified")
            ),
        }
    }
}

/// Results of the three simulators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub group_chat: GroupChatMetrics,
    pub virality: ViralityMetrics,
    pub voting: VotingMetrics,
}

/// Everything one pipeline run learned about a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub run_id: RunId,
    pub message: String,
    pub persona_count: usize,
    pub reaction_count: usize,
    pub mean_sentiment: f64,
    pub mean_share_likelihood: f64,
    pub mean_credibility: Option<f64>,
    pub mean_purchase_intent: Option<f64>,
    /// Observed buckets only
    pub sentiment_distribution: BTreeMap<SentimentBucket, usize>,
    pub emotional_themes: Vec<String>,
    /// Discovery order, truncated
    pub risk_flags: Vec<RiskFlag>,
    pub emotion_profile: EmotionProfile,
    pub controversy: ControversyAnalysis,
    pub trait_insights: Vec<TraitBreakdown>,
    pub bias_analysis: BiasAnalysis,
    pub context_insights: Vec<String>,
    pub simulations: Option<SimulationMetrics>,
    /// Oracle-written narrative; `None` if the call failed
    pub executive_summary: Option<String>,
}

impl InsightReport {
    /// Total reactions counted in the histogram.
    pub fn distribution_total(&self) -> usize {
        self.sentiment_distribution.values().sum()
    }
}

/// Campaign-specific advice derived from the headline statistics.
///
/// A rule whose statistic has no data is skipped.
pub fn context_insights(
    metadata: &CampaignMetadata,
    mean_share: f64,
    mean_credibility: Option<f64>,
    mean_purchase: Option<f64>,
    controversy_rate: f64,
) -> Vec<String> {
    let mut insights = Vec::new();
    let company = metadata.company_type.to_lowercase();

    if company == "startup" {
        if mean_share < 50.0 {
            insights.push(format!(
                "Low viral potential ({:.0}% share rate). For startups, consider more provocative angles.",
                mean_share
            ));
        }
        if let Some(c) = mean_credibility.filter(|c| *c < 3.0) {
            insights.push(format!("Credibility concerns ({:.1}/5). Startups need strong trust signals.", c));
        }
    } else if company.contains("major") || company.contains("large") {
        if controversy_rate > 0.2 {
            insights.push(format!(
                "High controversy risk ({:.0}%). Large brands should be cautious.",
                controversy_rate * 100.0
            ));
        }
        if let Some(c) = mean_credibility.filter(|c| *c > 4.0) {
            insights.push(format!("Strong credibility ({:.1}/5). Leverage established brand trust.", c));
        }
    }

    let outcome = metadata.target_outcome.to_lowercase();
    if outcome == "sales conversion" {
        if let Some(p) = mean_purchase.filter(|p| *p < 40.0) {
            insights.push(format!(
                "Low purchase intent ({:.0}%). Consider stronger value propositions or incentives.",
                p
            ));
        }
    }
    if outcome == "viral engagement" && mean_share < 60.0 {
        insights.push(format!(
            "Below-target viral potential. Current share likelihood: {:.0}%",
            mean_share
        ));
    }
    insights
}
