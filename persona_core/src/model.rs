//! Data model: personas, reactions, and campaign context.
//!
//! Personas and reactions are produced outside the engine (by the oracle,
//! via `schema`) and are only ever read here.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// PERSONA
// =============================================================================

/// Demographic attributes of a persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicProfile {
    /// 5-year band, e.g. "23-27"
    pub age_band: String,
    pub gender_identity: String,
    /// OMB category or "Prefer not to say"
    pub ethnicity_omb: String,
    pub geography: Geography,
    pub education_level: String,
    pub income_tier: String,
}

/// Where a persona lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geography {
    pub country: String,
    pub state: String,
    /// "Urban", "Suburban" or "Rural"
    pub urban_rural_flag: String,
}

/// Values, politics and brand attitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychographicProfile {
    /// -3 (very liberal) to +3 (very conservative)
    pub political_lean: f64,
    /// Schwartz value set, each 0-1
    pub schwartz_values: BTreeMap<String, f64>,
    /// Big-5 traits as low/medium/high
    pub big5_personality: BTreeMap<String, String>,
    pub brand_affinity_cluster: String,
}

/// Media consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaHabits {
    pub top_platforms: Vec<String>,
    pub preferred_content_format: String,
    pub daily_usage_hours: f64,
}

/// A synthetic audience member.
///
/// Created once from an oracle profile and referenced by `id` afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub ethnicity: String,
    pub location: String,
    pub occupation: String,
    pub values: Vec<String>,
    pub political_leaning: String,
    /// Big-5 traits on a 0-1 scale
    pub personality_traits: BTreeMap<String, f64>,
    pub media_habits: Vec<String>,
    /// Role instruction used when asking the oracle to speak as this persona
    pub system_prompt: String,
    /// Generational bucket, e.g. "Gen Z (18-27)"
    pub age_group: String,
    /// "Urban", "Suburban" or "Rural"
    pub location_type: String,
    pub demographic: DemographicProfile,
    pub psychographic: PsychographicProfile,
    pub media: MediaHabits,
}

impl Persona {
    /// Creates a persona with placeholder attributes.
    ///
    /// Mostly useful for tests and fixtures; real personas come from
    /// `PersonaFactory`.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let unknown = || "Unknown".to_string();
        Self {
            id: id.into(),
            name: name.into(),
            age: 30,
            gender: unknown(),
            ethnicity: unknown(),
            location: unknown(),
            occupation: unknown(),
            values: Vec::new(),
            political_leaning: unknown(),
            personality_traits: BTreeMap::new(),
            media_habits: Vec::new(),
            system_prompt: String::new(),
            age_group: unknown(),
            location_type: unknown(),
            demographic: DemographicProfile {
                age_band: unknown(),
                gender_identity: unknown(),
                ethnicity_omb: unknown(),
                geography: Geography {
                    country: unknown(),
                    state: unknown(),
                    urban_rural_flag: unknown(),
                },
                education_level: unknown(),
                income_tier: unknown(),
            },
            psychographic: PsychographicProfile {
                political_lean: 0.0,
                schwartz_values: BTreeMap::new(),
                big5_personality: BTreeMap::new(),
                brand_affinity_cluster: unknown(),
            },
            media: MediaHabits {
                top_platforms: Vec::new(),
                preferred_content_format: unknown(),
                daily_usage_hours: 2.0,
            },
        }
    }

    /// Sets age band and ethnicity (the risk-group key).
    pub fn with_demographics(mut self, age_band: &str, ethnicity_omb: &str) -> Self {
        self.demographic.age_band = age_band.to_string();
        self.demographic.ethnicity_omb = ethnicity_omb.to_string();
        self
    }

    /// Sets the generational bucket.
    pub fn with_age_group(mut self, age_group: &str) -> Self {
        self.age_group = age_group.to_string();
        self
    }

    /// Sets the political lean score.
    pub fn with_political_lean(mut self, lean: f64) -> Self {
        self.psychographic.political_lean = lean;
        self
    }

    /// Sets the income tier.
    pub fn with_income_tier(mut self, tier: &str) -> Self {
        self.demographic.income_tier = tier.to_string();
        self
    }
}

/// Indexes personas by id for reaction lookups.
pub fn index_personas(personas: &[Persona]) -> HashMap<&str, &Persona> {
    personas.iter().map(|p| (p.id.as_str(), p)).collect()
}

// =============================================================================
// REACTION
// =============================================================================

/// Names of the Plutchik emotions, in vector order.
pub const EMOTIONS: [&str; 8] = [
    "joy",
    "trust",
    "fear",
    "surprise",
    "sadness",
    "disgust",
    "anger",
    "anticipation",
];

/// Plutchik 8-way emotion intensities, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionVector {
    #[serde(default)]
    pub joy: f64,
    #[serde(default)]
    pub trust: f64,
    #[serde(default)]
    pub fear: f64,
    #[serde(default)]
    pub surprise: f64,
    #[serde(default)]
    pub sadness: f64,
    #[serde(default)]
    pub disgust: f64,
    #[serde(default)]
    pub anger: f64,
    #[serde(default)]
    pub anticipation: f64,
}

impl EmotionVector {
    /// Returns the components in `EMOTIONS` order.
    pub fn components(&self) -> [f64; 8] {
        [
            self.joy,
            self.trust,
            self.fear,
            self.surprise,
            self.sadness,
            self.disgust,
            self.anger,
            self.anticipation,
        ]
    }

    /// Builds a vector from components in `EMOTIONS` order.
    pub fn from_components(c: [f64; 8]) -> Self {
        Self {
            joy: c[0],
            trust: c[1],
            fear: c[2],
            surprise: c[3],
            sadness: c[4],
            disgust: c[5],
            anger: c[6],
            anticipation: c[7],
        }
    }
}

/// One persona's judgment of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// Must resolve to a known `Persona::id`
    pub persona_id: String,
    /// -5 (very negative) to +5 (very positive)
    pub sentiment: f64,
    /// 0-100 percent
    pub share_likelihood: f64,
    pub emotional_triggers: Vec<String>,
    pub suggested_modifications: String,
    /// The persona's own explanation
    pub explanation: String,
    pub emotion_vector: Option<EmotionVector>,
    /// 1-5
    pub credibility: Option<f64>,
    /// 0-100 percent
    pub purchase_intent: Option<f64>,
    pub controversy_flag: bool,
    pub controversy_driver: Option<String>,
}

impl Reaction {
    /// Creates a bare reaction with only the required scalars set.
    pub fn new(persona_id: impl Into<String>, sentiment: f64, share_likelihood: f64) -> Self {
        Self {
            persona_id: persona_id.into(),
            sentiment,
            share_likelihood,
            emotional_triggers: Vec::new(),
            suggested_modifications: String::new(),
            explanation: String::new(),
            emotion_vector: None,
            credibility: None,
            purchase_intent: None,
            controversy_flag: false,
            controversy_driver: None,
        }
    }

    /// Marks the reaction controversial with an optional driver.
    pub fn controversial(mut self, driver: Option<&str>) -> Self {
        self.controversy_flag = true;
        self.controversy_driver = driver.map(str::to_string);
        self
    }

    /// Sets the emotional triggers.
    pub fn with_triggers(mut self, triggers: &[&str]) -> Self {
        self.emotional_triggers = triggers.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Sets credibility (1-5).
    pub fn with_credibility(mut self, credibility: f64) -> Self {
        self.credibility = Some(credibility);
        self
    }

    /// Sets purchase intent (0-100).
    pub fn with_purchase_intent(mut self, intent: f64) -> Self {
        self.purchase_intent = Some(intent);
        self
    }

    /// Sets the emotion vector.
    pub fn with_emotions(mut self, emotions: EmotionVector) -> Self {
        self.emotion_vector = Some(emotions);
        self
    }

    /// Sets the suggested modification text.
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggested_modifications = suggestion.to_string();
        self
    }
}

// =============================================================================
// AUDIENCE CONTEXT
// =============================================================================

/// An audience segment proposed by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceSegment {
    pub name: String,
    pub age: String,
    pub ethnicity: String,
    pub location: String,
    pub values: String,
    pub political_leaning: String,
    pub media_habits: String,
    /// How sure the oracle is this segment reacts distinctly (0-1)
    pub confidence: f64,
}

/// Bias and inclusivity notes returned alongside the segments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BiasAnalysis {
    pub potential_biases: Vec<String>,
    /// 0-10
    pub inclusivity_score: f64,
    pub diversity_gaps: Vec<String>,
    pub improvement_suggestions: Vec<String>,
}

/// The message under test and its campaign context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetadata {
    pub message: String,
    pub goal: String,
    pub channel: String,
    pub desired_tone: String,
    pub company_type: String,
    pub company_size: String,
    pub audience_size: String,
    pub brand_context: String,
    pub campaign_type: String,
    pub target_outcome: String,
    /// Explicit message variants for popularity voting (may be empty)
    #[serde(default)]
    pub variants: Vec<String>,
}

impl CampaignMetadata {
    /// Captures a message with default context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            goal: "general audience testing".to_string(),
            channel: "general".to_string(),
            desired_tone: "neutral".to_string(),
            company_type: "unknown".to_string(),
            company_size: "unknown".to_string(),
            audience_size: "unknown".to_string(),
            brand_context: "none provided".to_string(),
            campaign_type: "general".to_string(),
            target_outcome: "engagement".to_string(),
            variants: Vec::new(),
        }
    }

    /// Sets the company type (e.g. "startup", "major brand").
    pub fn with_company(mut self, company_type: &str, company_size: &str) -> Self {
        self.company_type = company_type.to_string();
        self.company_size = company_size.to_string();
        self
    }

    /// Sets the target outcome (e.g. "sales conversion").
    pub fn with_target_outcome(mut self, outcome: &str) -> Self {
        self.target_outcome = outcome.to_string();
        self
    }

    /// Sets the goal and channel.
    pub fn with_goal(mut self, goal: &str, channel: &str) -> Self {
        self.goal = goal.to_string();
        self.channel = channel.to_string();
        self
    }

    /// Sets explicit voting variants.
    pub fn with_variants(mut self, variants: Vec<String>) -> Self {
        self.variants = variants;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_components_roundtrip_order() {
        let v = EmotionVector {
            joy: 0.1,
            anticipation: 0.8,
            ..Default::default()
        };
        let c = v.components();
        assert_eq!(c[0], 0.1);
        assert_eq!(c[7], 0.8);
        assert_eq!(EmotionVector::from_components(c), v);
    }

    #[test]
    fn test_metadata_defaults() {
        let meta = CampaignMetadata::new("Try our new app!");
        assert_eq!(meta.goal, "general audience testing");
        assert_eq!(meta.target_outcome, "engagement");
        assert!(meta.variants.is_empty());
    }
}
