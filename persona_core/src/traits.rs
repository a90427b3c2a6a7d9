//! Trait-dimension grouping and per-group statistics.
//!
//! A dimension maps a persona to a trait value; reactions are partitioned by
//! the value of their owning persona and each partition is summarized.

use crate::emotion::{EmotionAggregator, EmotionProfile};
use crate::model::{Persona, Reaction};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Triggers and concerns kept per group.
pub const GROUP_TOP_K: usize = 3;

/// Controversy rate above which a group's recommendation carries a warning.
pub const GROUP_CONTROVERSY_WARNING: f64 = 0.3;

type Extractor = Arc<dyn Fn(&Persona) -> String + Send + Sync>;

/// A named grouping axis over personas.
#[derive(Clone)]
pub struct TraitDimension {
    name: String,
    extractor: Extractor,
}

impl TraitDimension {
    /// Creates a dimension from an arbitrary extractor.
    pub fn new<F>(name: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&Persona) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            extractor: Arc::new(extractor),
        }
    }

    /// Returns the dimension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the trait value of `persona` on this dimension.
    pub fn value_of(&self, persona: &Persona) -> String {
        (self.extractor)(persona)
    }

    pub fn income_tier() -> Self {
        Self::new("Income Tiers", |p| p.demographic.income_tier.clone())
    }

    pub fn education_level() -> Self {
        Self::new("Education Levels", |p| p.demographic.education_level.clone())
    }

    pub fn brand_affinity() -> Self {
        Self::new("Brand Affinity", |p| p.psychographic.brand_affinity_cluster.clone())
    }

    /// Buckets political lean: < -1 Liberal, > +1 Conservative, else Moderate.
    pub fn political_lean() -> Self {
        Self::new("Political Lean", |p| political_bucket(p.psychographic.political_lean).to_string())
    }

    pub fn age_band() -> Self {
        Self::new("Age Bands", |p| p.demographic.age_band.clone())
    }

    pub fn ethnicity() -> Self {
        Self::new("Ethnicity (OMB)", |p| p.demographic.ethnicity_omb.clone())
    }

    pub fn geography() -> Self {
        Self::new("Geography", |p| p.demographic.geography.urban_rural_flag.clone())
    }

    /// Generational bucket (used for preference patterns).
    pub fn age_group() -> Self {
        Self::new("Age", |p| p.age_group.clone())
    }

    /// The seven standard dimensions, in report order.
    pub fn standard() -> Vec<Self> {
        vec![
            Self::income_tier(),
            Self::education_level(),
            Self::brand_affinity(),
            Self::political_lean(),
            Self::age_band(),
            Self::ethnicity(),
            Self::geography(),
        ]
    }
}

impl std::fmt::Debug for TraitDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraitDimension").field("name", &self.name).finish()
    }
}

/// Political lean bucket label.
pub fn political_bucket(lean: f64) -> &'static str {
    if lean < -1.0 {
        "Liberal"
    } else if lean > 1.0 {
        "Conservative"
    } else {
        "Moderate"
    }
}

/// Recommendation tier chosen from a group's mean sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    /// mean < -1
    Critical,
    /// -1 <= mean < 1
    Mixed,
    /// mean >= 1
    Positive,
}

impl RecommendationTier {
    pub fn for_sentiment(mean: f64) -> Self {
        if mean < -1.0 {
            RecommendationTier::Critical
        } else if mean < 1.0 {
            RecommendationTier::Mixed
        } else {
            RecommendationTier::Positive
        }
    }
}

/// Summary of all reactions sharing one trait value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitGroupInsight {
    pub trait_name: String,
    pub trait_value: String,
    /// Distinct personas contributing reactions
    pub persona_count: usize,
    pub reaction_count: usize,
    pub avg_sentiment: f64,
    pub avg_share_likelihood: f64,
    pub avg_credibility: Option<f64>,
    pub avg_purchase_intent: Option<f64>,
    pub common_triggers: Vec<String>,
    /// Distinct suggestions from negative-sentiment reactions
    pub key_concerns: Vec<String>,
    pub emotion_profile: EmotionProfile,
    pub controversy_rate: f64,
    pub tier: RecommendationTier,
    pub recommendation: String,
}

/// All groups of one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitBreakdown {
    pub dimension: String,
    pub groups: Vec<TraitGroupInsight>,
}

/// Partitions reactions by trait dimensions.
#[derive(Debug, Clone)]
pub struct TraitGrouper {
    dimensions: Vec<TraitDimension>,
}

impl Default for TraitGrouper {
    fn default() -> Self {
        Self::new(TraitDimension::standard())
    }
}

impl TraitGrouper {
    pub fn new(dimensions: Vec<TraitDimension>) -> Self {
        Self { dimensions }
    }

    /// Adds a custom dimension after the existing ones.
    pub fn with_dimension(mut self, dimension: TraitDimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn dimensions(&self) -> &[TraitDimension] {
        &self.dimensions
    }

    /// Groups over every configured dimension.
    pub fn analyze(&self, reactions: &[Reaction], personas: &[Persona]) -> Vec<TraitBreakdown> {
        self.dimensions
            .iter()
            .map(|dimension| TraitBreakdown {
                dimension: dimension.name().to_string(),
                groups: self.group(dimension, reactions, personas),
            })
            .collect()
    }

    /// Groups reactions on one dimension.
    ///
    /// Groups appear in the order their trait value is first seen while
    /// walking `personas`; personas without reactions add nothing.
    pub fn group(
        &self,
        dimension: &TraitDimension,
        reactions: &[Reaction],
        personas: &[Persona],
    ) -> Vec<TraitGroupInsight> {
        let mut by_persona: HashMap<&str, Vec<&Reaction>> = HashMap::new();
        for reaction in reactions {
            by_persona.entry(reaction.persona_id.as_str()).or_default().push(reaction);
        }

        let mut partitions: Vec<(String, Vec<&Reaction>)> = Vec::new();
        for persona in personas {
            let Some(owned) = by_persona.get(persona.id.as_str()) else {
                continue;
            };
            let value = dimension.value_of(persona);
            match partitions.iter_mut().find(|(v, _)| *v == value) {
                Some((_, group)) => group.extend(owned.iter().copied()),
                None => partitions.push((value, owned.clone())),
            }
        }

        partitions
            .into_iter()
            .filter_map(|(value, group)| summarize(dimension.name(), value, &group))
            .collect()
    }
}

fn summarize(trait_name: &str, trait_value: String, group: &[&Reaction]) -> Option<TraitGroupInsight> {
    let avg_sentiment = stats::mean(group.iter().map(|r| r.sentiment))?;
    let avg_share_likelihood = stats::mean(group.iter().map(|r| r.share_likelihood))?;
    let avg_credibility = stats::mean_present(group.iter().map(|r| r.credibility));
    let avg_purchase_intent = stats::mean_present(group.iter().map(|r| r.purchase_intent));

    let common_triggers = stats::top_k(
        group.iter().flat_map(|r| r.emotional_triggers.iter().map(String::as_str)),
        GROUP_TOP_K,
    );
    let key_concerns = stats::distinct_first_seen(
        group
            .iter()
            .filter(|r| r.sentiment < 0.0)
            .map(|r| r.suggested_modifications.clone())
            .filter(|s| !s.trim().is_empty()),
        GROUP_TOP_K,
    );

    let controversial = group.iter().filter(|r| r.controversy_flag).count();
    let controversy_rate = controversial as f64 / group.len() as f64;

    let mut persona_ids: Vec<&str> = group.iter().map(|r| r.persona_id.as_str()).collect();
    persona_ids.sort_unstable();
    persona_ids.dedup();

    let tier = RecommendationTier::for_sentiment(avg_sentiment);
    let recommendation = recommend(
        tier,
        &trait_value,
        &key_concerns,
        avg_credibility,
        avg_purchase_intent,
        controversy_rate,
    );

    Some(TraitGroupInsight {
        trait_name: trait_name.to_string(),
        trait_value,
        persona_count: persona_ids.len(),
        reaction_count: group.len(),
        avg_sentiment,
        avg_share_likelihood,
        avg_credibility,
        avg_purchase_intent,
        common_triggers,
        key_concerns,
        emotion_profile: EmotionAggregator.aggregate(group.iter().copied()),
        controversy_rate,
        tier,
        recommendation,
    })
}

fn recommend(
    tier: RecommendationTier,
    value: &str,
    concerns: &[String],
    credibility: Option<f64>,
    purchase_intent: Option<f64>,
    controversy_rate: f64,
) -> String {
    let credibility = credibility.map_or("n/a".to_string(), |c| format!("{:.1}/5", c));
    let mut text = match tier {
        RecommendationTier::Critical => {
            let address: Vec<&str> = concerns.iter().take(2).map(String::as_str).collect();
            format!(
                "Critical concerns from {}. Address: {}. Credibility: {}.",
                value,
                address.join(", "),
                credibility
            )
        }
        RecommendationTier::Mixed => format!(
            "Mixed reactions from {}. A/B test messaging. Purchase intent: {}.",
            value,
            purchase_intent.map_or("n/a".to_string(), |p| format!("{:.0}%", p))
        ),
        RecommendationTier::Positive => format!(
            "Strong positive response from {}. High credibility ({}). Amplify to similar audiences.",
            value, credibility
        ),
    };
    if controversy_rate > GROUP_CONTROVERSY_WARNING {
        text.push_str(&format!(
            " High controversy rate ({:.0}%).",
            controversy_rate * 100.0
        ));
    }
    text
}
