//! Audience profiling and persona construction.
//!
//! The profiler asks the oracle which segments a message reaches; the
//! factory turns each segment into concrete personas, one oracle call per
//! persona. Neither aborts on a bad reply.

use crate::model::{
    AudienceSegment, BiasAnalysis, CampaignMetadata, DemographicProfile, Geography, MediaHabits, Persona,
    PsychographicProfile,
};
use crate::prompts;
use crate::schema::{self, PersonaProfile};
use persona_env::{CallKind, GenerativeOracle, OracleRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Proposes audience segments and a bias summary for a message.
pub struct AudienceProfiler {
    oracle: Arc<dyn GenerativeOracle>,
}

impl AudienceProfiler {
    pub fn new(oracle: Arc<dyn GenerativeOracle>) -> Self {
        Self { oracle }
    }

    /// Profiles the audience of `metadata.message`.
    ///
    /// A failed call or invalid reply yields no segments and an empty bias
    /// analysis with score 0.
    pub async fn profile(&self, metadata: &CampaignMetadata) -> (Vec<AudienceSegment>, BiasAnalysis) {
        let request = OracleRequest::new(CallKind::Segments, prompts::segments_prompt(metadata))
            .with_system(prompts::SEGMENTS_SYSTEM);

        let parsed = match self.oracle.complete(request).await {
            Ok(text) => schema::parse_segments(&text).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match parsed {
            Ok((segments, bias)) => {
                info!("Profiled {} audience segments", segments.len());
                (segments, bias)
            }
            Err(reason) => {
                warn!("Audience profiling failed: {}", reason);
                (Vec::new(), BiasAnalysis::default())
            }
        }
    }
}

/// Generational bucket for an age.
pub fn age_group(age: u32) -> &'static str {
    match age {
        0..=27 => "Gen Z (18-27)",
        28..=42 => "Millennials (28-42)",
        43..=57 => "Gen X (43-57)",
        _ => "Boomers (58+)",
    }
}

/// Urban/Suburban/Rural classification from a free-text location.
pub fn location_type(location: &str) -> &'static str {
    let location = location.to_lowercase();
    if ["rural", "small town", "countryside"].iter().any(|k| location.contains(k)) {
        "Rural"
    } else if location.contains("suburb") {
        "Suburban"
    } else {
        "Urban"
    }
}

/// Persona id for the `index`-th persona of the pool.
pub fn persona_id(segment_name: &str, index: usize) -> String {
    format!("{}_{}", segment_name.to_lowercase().replace(' ', "_"), index)
}

/// Builds a persona from a validated profile, filling absent nested fields.
pub fn build_persona(id: String, profile: PersonaProfile) -> Persona {
    let unknown = || "Unknown".to_string();
    let age = profile.age.unwrap_or(30);
    let location = profile.location.unwrap_or_default();
    let location_type = location_type(&location).to_string();

    let demo = profile.m1_demographic_profile;
    let geography = match demo.as_ref().and_then(|d| d.geography.clone()) {
        Some(g) => Geography {
            country: g.country.unwrap_or_else(unknown),
            state: g.state.unwrap_or_else(unknown),
            urban_rural_flag: g.urban_rural_flag.unwrap_or_else(|| location_type.clone()),
        },
        None => Geography {
            country: unknown(),
            state: unknown(),
            urban_rural_flag: location_type.clone(),
        },
    };
    let demographic = match demo {
        Some(d) => DemographicProfile {
            age_band: d.age_band.unwrap_or_else(|| format!("{}-{}", age, age + 4)),
            gender_identity: d.gender_identity.unwrap_or_else(|| profile.gender.clone()),
            ethnicity_omb: d.ethnicity_omb.unwrap_or_else(|| profile.ethnicity.clone()),
            geography,
            education_level: d.education_level.unwrap_or_else(unknown),
            income_tier: d.income_tier.unwrap_or_else(unknown),
        },
        None => DemographicProfile {
            age_band: format!("{}-{}", age, age + 4),
            gender_identity: profile.gender.clone(),
            ethnicity_omb: profile.ethnicity.clone(),
            geography,
            education_level: unknown(),
            income_tier: unknown(),
        },
    };

    let psychographic = match profile.m1_psychographic_profile {
        Some(p) => PsychographicProfile {
            political_lean: p.political_lean.unwrap_or(0.0),
            schwartz_values: p.schwartz_values,
            big5_personality: p.big5_personality,
            brand_affinity_cluster: p.brand_affinity_cluster.unwrap_or_else(unknown),
        },
        None => PsychographicProfile {
            political_lean: 0.0,
            schwartz_values: Default::default(),
            big5_personality: Default::default(),
            brand_affinity_cluster: unknown(),
        },
    };

    let media = match profile.m1_media_profile {
        Some(m) => MediaHabits {
            top_platforms: m.top_platforms.unwrap_or_else(|| profile.media_habits.clone()),
            preferred_content_format: m.preferred_content_format.unwrap_or_else(unknown),
            daily_usage_hours: m.daily_usage_hours.unwrap_or(2.0),
        },
        None => MediaHabits {
            top_platforms: profile.media_habits.clone(),
            preferred_content_format: unknown(),
            daily_usage_hours: 2.0,
        },
    };

    let mut persona = Persona {
        id,
        name: profile.name.unwrap_or_else(unknown),
        age,
        gender: profile.gender,
        ethnicity: profile.ethnicity,
        location,
        occupation: profile.occupation,
        values: profile.values,
        political_leaning: profile.political_leaning,
        personality_traits: profile.personality_traits,
        media_habits: profile.media_habits,
        system_prompt: String::new(),
        age_group: age_group(age).to_string(),
        location_type,
        demographic,
        psychographic,
        media,
    };
    persona.system_prompt = prompts::persona_system_prompt(&persona);
    persona
}

/// Generates personas for audience segments.
pub struct PersonaFactory {
    oracle: Arc<dyn GenerativeOracle>,
}

impl PersonaFactory {
    pub fn new(oracle: Arc<dyn GenerativeOracle>) -> Self {
        Self { oracle }
    }

    /// Creates one persona for `segment`, numbered `pool_index`.
    pub async fn create(
        &self,
        segment: &AudienceSegment,
        metadata: &CampaignMetadata,
        pool_index: usize,
    ) -> Option<Persona> {
        let request = OracleRequest::new(
            CallKind::PersonaProfile,
            prompts::persona_profile_prompt(segment, metadata),
        );
        let profile = match self.oracle.complete(request).await {
            Ok(text) => schema::parse_persona_profile(&text).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match profile {
            Ok(profile) => {
                let persona = build_persona(persona_id(&segment.name, pool_index), profile);
                debug!(
                    "Created persona {} ({}, {})",
                    persona.id, persona.demographic.age_band, persona.demographic.ethnicity_omb
                );
                Some(persona)
            }
            Err(reason) => {
                warn!("Persona for segment {:?} skipped: {}", segment.name, reason);
                None
            }
        }
    }

    /// Creates `per_segment` personas for every segment, in segment order.
    ///
    /// Ids number the personas that were actually created.
    pub async fn populate(
        &self,
        segments: &[AudienceSegment],
        per_segment: usize,
        metadata: &CampaignMetadata,
    ) -> Vec<Persona> {
        let mut pool = Vec::new();
        for segment in segments {
            for _ in 0..per_segment {
                if let Some(persona) = self.create(segment, metadata, pool.len()).await {
                    pool.push(persona);
                }
            }
        }
        info!("Created {} personas from {} segments", pool.len(), segments.len());
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FnOracle;

    const PROFILE: &str = r#"{
        "name": "Maya Chen", "age": 34, "gender": "Woman", "ethnicity": "Chinese American",
        "location": "Suburbs of Denver, CO", "occupation": "Nurse",
        "values": ["family", "health"], "political_leaning": "Moderate",
        "personality_traits": {"openness": 0.6},
        "media_habits": ["Instagram", "Podcasts"],
        "m1_psychographic_profile": {"political_lean": -0.5, "brand_affinity_cluster": "Value Conscious"}
    }"#;

    fn segment(name: &str) -> AudienceSegment {
        AudienceSegment {
            name: name.to_string(),
            age: "25-40".into(),
            ethnicity: "Mixed".into(),
            location: "US".into(),
            values: "family".into(),
            political_leaning: "Moderate".into(),
            media_habits: "Social".into(),
            confidence: 0.8,
        }
    }

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(age_group(27), "Gen Z (18-27)");
        assert_eq!(age_group(28), "Millennials (28-42)");
        assert_eq!(age_group(57), "Gen X (43-57)");
        assert_eq!(age_group(58), "Boomers (58+)");
    }

    #[test]
    fn test_location_type_keywords() {
        assert_eq!(location_type("Small Town, Ohio"), "Rural");
        assert_eq!(location_type("Suburban Atlanta"), "Suburban");
        assert_eq!(location_type("Brooklyn, NY"), "Urban");
    }

    #[test]
    fn test_build_persona_applies_fallbacks() {
        let profile = schema::parse_persona_profile(PROFILE).unwrap();
        let persona = build_persona(persona_id("Young Parents", 3), profile);

        assert_eq!(persona.id, "young_parents_3");
        assert_eq!(persona.age_group, "Millennials (28-42)");
        assert_eq!(persona.location_type, "Suburban");
        assert_eq!(persona.demographic.age_band, "34-38");
        assert_eq!(persona.demographic.ethnicity_omb, "Chinese American");
        assert_eq!(persona.demographic.geography.urban_rural_flag, "Suburban");
        assert_eq!(persona.psychographic.political_lean, -0.5);
        assert_eq!(persona.media.top_platforms, vec!["Instagram", "Podcasts"]);
        assert_eq!(persona.media.daily_usage_hours, 2.0);
        assert!(persona.system_prompt.starts_with("You are Maya Chen, a 34-year-old Woman"));
    }

    #[tokio::test]
    async fn test_populate_skips_failures_and_numbers_created_personas() {
        let oracle = Arc::new(FnOracle::new(|_, n| {
            if n == 1 {
                Ok("{\"age\": 40}".to_string())
            } else {
                Ok(PROFILE.to_string())
            }
        }));
        let factory = PersonaFactory::new(oracle);
        let metadata = CampaignMetadata::new("Hello");

        let personas = factory.populate(&[segment("Rural Voters"), segment("Gamers")], 2, &metadata).await;

        let ids: Vec<&str> = personas.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["rural_voters_0", "gamers_1", "gamers_2"]);
    }

    #[tokio::test]
    async fn test_profiler_failure_yields_empty_analysis() {
        let profiler = AudienceProfiler::new(Arc::new(FnOracle::new(|_, _| Ok("I cannot help".to_string()))));
        let (segments, bias) = profiler.profile(&CampaignMetadata::new("Hello")).await;
        assert!(segments.is_empty());
        assert_eq!(bias.inclusivity_score, 0.0);
    }

    #[tokio::test]
    async fn test_profiler_parses_fenced_reply() {
        let reply = "```json\n{\"segments\": [{\"name\": \"Gamers\", \"age\": \"18-30\", \"ethnicity\": \"Mixed\", \
                     \"location\": \"US\", \"values\": \"fun\", \"political_leaning\": \"Varied\", \
                     \"media_habits\": \"Twitch\", \"confidence\": 0.9}], \
                     \"bias_analysis\": {\"inclusivity_concerns\": [\"Add older players\"]}}\n```";
        let profiler = AudienceProfiler::new(Arc::new(FnOracle::new(move |_, _| Ok(reply.to_string()))));
        let (segments, bias) = profiler.profile(&CampaignMetadata::new("Hello")).await;
        assert_eq!(segments.len(), 1);
        assert_eq!(bias.improvement_suggestions, vec!["Add older players"]);
        assert_eq!(bias.inclusivity_score, 8.0);
    }
}
