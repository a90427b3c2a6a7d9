//! Oracle reply schemas.
//!
//! Every reply goes through here before it becomes a typed record: fences
//! are stripped, JSON is decoded into a wire struct, required fields are
//! checked and every bounded scalar is range-validated.

use crate::error::SchemaError;
use crate::model::{AudienceSegment, BiasAnalysis, EmotionVector, Reaction, EMOTIONS};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Valid sentiment range.
pub const SENTIMENT_RANGE: (f64, f64) = (-5.0, 5.0);
/// Valid share-likelihood / purchase-intent range (percent).
pub const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);
/// Valid credibility range.
pub const CREDIBILITY_RANGE: (f64, f64) = (1.0, 5.0);
/// Valid range of each emotion component.
pub const EMOTION_RANGE: (f64, f64) = (0.0, 1.0);
/// Valid political lean range.
pub const POLITICAL_LEAN_RANGE: (f64, f64) = (-3.0, 3.0);

/// Strips one leading/trailing triple-backtick fence (optionally tagged `json`).
pub fn strip_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<f64, SchemaError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(SchemaError::OutOfRange { field, value, min, max })
    }
}

fn decode<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, SchemaError> {
    Ok(serde_json::from_str(strip_fences(text))?)
}

// =============================================================================
// SEGMENTS
// =============================================================================

#[derive(Deserialize)]
struct SegmentsWire {
    segments: Option<Vec<AudienceSegment>>,
    #[serde(default)]
    bias_analysis: BiasWire,
}

#[derive(Deserialize, Default)]
struct BiasWire {
    #[serde(default)]
    potential_biases: Vec<String>,
    #[serde(default)]
    inclusivity_concerns: Vec<String>,
    #[serde(default)]
    diversity_gaps: Vec<String>,
}

/// Inclusivity score assigned to a successfully parsed bias summary.
pub const DEFAULT_INCLUSIVITY_SCORE: f64 = 8.0;

/// Parses the segment list + bias summary schema.
pub fn parse_segments(text: &str) -> Result<(Vec<AudienceSegment>, BiasAnalysis), SchemaError> {
    let wire: SegmentsWire = decode(text)?;
    let segments = wire.segments.ok_or(SchemaError::MissingField("segments"))?;
    for segment in &segments {
        check_range("confidence", segment.confidence, (0.0, 1.0))?;
    }

    let bias = BiasAnalysis {
        potential_biases: wire.bias_analysis.potential_biases,
        inclusivity_score: DEFAULT_INCLUSIVITY_SCORE,
        diversity_gaps: wire.bias_analysis.diversity_gaps,
        improvement_suggestions: wire.bias_analysis.inclusivity_concerns,
    };
    Ok((segments, bias))
}

// =============================================================================
// PERSONA PROFILE
// =============================================================================

/// Decoded persona profile, before derivation into a `Persona`.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaProfile {
    pub name: Option<String>,
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub ethnicity: String,
    pub location: Option<String>,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub political_leaning: String,
    #[serde(default)]
    pub personality_traits: BTreeMap<String, f64>,
    #[serde(default)]
    pub media_habits: Vec<String>,
    pub cultural_background: Option<String>,
    pub socioeconomic_details: Option<String>,
    pub m1_demographic_profile: Option<DemographicWire>,
    pub m1_psychographic_profile: Option<PsychographicWire>,
    pub m1_media_profile: Option<MediaWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemographicWire {
    pub age_band: Option<String>,
    pub gender_identity: Option<String>,
    pub ethnicity_omb: Option<String>,
    pub geography: Option<GeographyWire>,
    pub education_level: Option<String>,
    pub income_tier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeographyWire {
    pub country: Option<String>,
    pub state: Option<String>,
    pub urban_rural_flag: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PsychographicWire {
    pub political_lean: Option<f64>,
    #[serde(default)]
    pub schwartz_values: BTreeMap<String, f64>,
    #[serde(default)]
    pub big5_personality: BTreeMap<String, String>,
    pub brand_affinity_cluster: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaWire {
    pub top_platforms: Option<Vec<String>>,
    pub preferred_content_format: Option<String>,
    pub daily_usage_hours: Option<f64>,
}

/// Parses the persona profile schema.
///
/// `name`, `age` and `location` are required; trait scores, Schwartz values
/// and political lean are range-checked.
pub fn parse_persona_profile(text: &str) -> Result<PersonaProfile, SchemaError> {
    let profile: PersonaProfile = decode(text)?;
    if profile.name.is_none() {
        return Err(SchemaError::MissingField("name"));
    }
    let age = profile.age.ok_or(SchemaError::MissingField("age"))?;
    check_range("age", age as f64, (13.0, 120.0))?;
    if profile.location.is_none() {
        return Err(SchemaError::MissingField("location"));
    }
    for value in profile.personality_traits.values() {
        check_range("personality_traits", *value, (0.0, 1.0))?;
    }
    if let Some(psycho) = &profile.m1_psychographic_profile {
        if let Some(lean) = psycho.political_lean {
            check_range("political_lean", lean, POLITICAL_LEAN_RANGE)?;
        }
        for value in psycho.schwartz_values.values() {
            check_range("schwartz_values", *value, (0.0, 1.0))?;
        }
    }
    if let Some(media) = &profile.m1_media_profile {
        if let Some(hours) = media.daily_usage_hours {
            check_range("daily_usage_hours", hours, (0.0, 24.0))?;
        }
    }
    Ok(profile)
}

// =============================================================================
// REACTION
// =============================================================================

#[derive(Deserialize)]
struct ReactionWire {
    sentiment: Option<f64>,
    share_likelihood: Option<f64>,
    #[serde(default)]
    emotional_triggers: Vec<String>,
    #[serde(default)]
    suggested_modifications: String,
    #[serde(default)]
    explanation: String,
    m2_emotion_vector: Option<EmotionVector>,
    credibility_rating: Option<f64>,
    purchase_intent: Option<f64>,
    #[serde(default)]
    controversy_flag: bool,
    controversy_driver: Option<String>,
}

/// Parses the reaction judgment schema for `persona_id`.
///
/// Absent credibility / purchase intent stay `None`. A controversy driver is
/// kept only when the flag is set and the driver is not a "none" placeholder.
pub fn parse_reaction(text: &str, persona_id: &str) -> Result<Reaction, SchemaError> {
    let wire: ReactionWire = decode(text)?;

    let sentiment = wire.sentiment.ok_or(SchemaError::MissingField("sentiment"))?;
    let sentiment = check_range("sentiment", sentiment, SENTIMENT_RANGE)?;
    let share = wire
        .share_likelihood
        .ok_or(SchemaError::MissingField("share_likelihood"))?;
    let share = check_range("share_likelihood", share, PERCENT_RANGE)?;

    if let Some(emotions) = &wire.m2_emotion_vector {
        for (name, value) in EMOTIONS.iter().copied().zip(emotions.components()) {
            check_range(name, value, EMOTION_RANGE)?;
        }
    }
    let credibility = wire
        .credibility_rating
        .map(|c| check_range("credibility_rating", c, CREDIBILITY_RANGE))
        .transpose()?;
    let purchase_intent = wire
        .purchase_intent
        .map(|p| check_range("purchase_intent", p, PERCENT_RANGE))
        .transpose()?;

    let controversy_driver = if wire.controversy_flag {
        wire.controversy_driver
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty() && !d.to_lowercase().starts_with("none"))
    } else {
        None
    };

    Ok(Reaction {
        persona_id: persona_id.to_string(),
        sentiment,
        share_likelihood: share,
        emotional_triggers: wire.emotional_triggers,
        suggested_modifications: wire.suggested_modifications,
        explanation: wire.explanation,
        emotion_vector: wire.m2_emotion_vector,
        credibility,
        purchase_intent,
        controversy_flag: wire.controversy_flag,
        controversy_driver,
    })
}

// =============================================================================
// CHAT TURN / VOTE
// =============================================================================

/// One utterance in the group chat.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatTurnReply {
    pub message: String,
    pub sentiment: f64,
}

/// Parses the chat-turn schema.
pub fn parse_chat_turn(text: &str) -> Result<ChatTurnReply, SchemaError> {
    #[derive(Deserialize)]
    struct Wire {
        message: Option<String>,
        sentiment: Option<f64>,
    }
    let wire: Wire = decode(text)?;
    let message = wire.message.ok_or(SchemaError::MissingField("message"))?;
    let sentiment = wire.sentiment.ok_or(SchemaError::MissingField("sentiment"))?;
    let sentiment = check_range("sentiment", sentiment, SENTIMENT_RANGE)?;
    Ok(ChatTurnReply { message, sentiment })
}

/// Parses a vote reply: a bare integer or `{"vote": n}`.
///
/// The index must be below `variant_count`.
pub fn parse_vote(text: &str, variant_count: usize) -> Result<usize, SchemaError> {
    #[derive(Deserialize)]
    struct Wire {
        vote: i64,
    }
    let body = strip_fences(text);
    let index = match body.parse::<i64>() {
        Ok(index) => index,
        Err(_) => serde_json::from_str::<Wire>(body)
            .map(|w| w.vote)
            .map_err(|_| SchemaError::Vote(body.to_string()))?,
    };
    let max = variant_count.saturating_sub(1) as f64;
    if index < 0 || index as usize >= variant_count {
        return Err(SchemaError::OutOfRange {
            field: "vote",
            value: index as f64,
            min: 0.0,
            max,
        });
    }
    Ok(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REACTION: &str = r#"{
        "sentiment": -2.5,
        "share_likelihood": 35,
        "emotional_triggers": ["price", "trust"],
        "suggested_modifications": "Be clearer",
        "explanation": "Feels pushy",
        "m2_emotion_vector": {"joy": 0.2, "trust": 0.7, "fear": 0.1, "surprise": 0.3,
                              "sadness": 0.0, "disgust": 0.1, "anger": 0.0, "anticipation": 0.6},
        "credibility_rating": 3.5,
        "purchase_intent": 45,
        "controversy_flag": false,
        "controversy_driver": "none"
    }"#;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("  {}  "), "{}");
        assert_eq!(strip_fences("```json{}"), "{}");
    }

    #[test]
    fn test_parse_reaction_full() {
        let reaction = parse_reaction(REACTION, "p1").unwrap();
        assert_eq!(reaction.persona_id, "p1");
        assert_eq!(reaction.sentiment, -2.5);
        assert_eq!(reaction.credibility, Some(3.5));
        assert_eq!(reaction.purchase_intent, Some(45.0));
        assert_eq!(reaction.emotion_vector.unwrap().trust, 0.7);
        assert!(reaction.controversy_driver.is_none());
    }

    #[test]
    fn test_parse_reaction_fenced() {
        let fenced = format!("```json\n{}\n```", REACTION);
        assert!(parse_reaction(&fenced, "p1").is_ok());
    }

    #[test]
    fn test_parse_reaction_absent_optionals_stay_none() {
        let reaction = parse_reaction(r#"{"sentiment": 1, "share_likelihood": 10}"#, "p").unwrap();
        assert!(reaction.credibility.is_none());
        assert!(reaction.purchase_intent.is_none());
        assert!(reaction.emotion_vector.is_none());
    }

    #[test]
    fn test_parse_reaction_rejects_out_of_range() {
        let err = parse_reaction(r#"{"sentiment": 7, "share_likelihood": 10}"#, "p").unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { field: "sentiment", .. }));

        let err = parse_reaction(
            r#"{"sentiment": 1, "share_likelihood": 10, "m2_emotion_vector": {"anger": 1.5}}"#,
            "p",
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { field: "anger", .. }));
    }

    #[test]
    fn test_parse_reaction_rejects_wrong_types_and_missing() {
        let err = parse_reaction(r#"{"sentiment": "high", "share_likelihood": 10}"#, "p").unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));

        let err = parse_reaction(r#"{"share_likelihood": 10}"#, "p").unwrap_err();
        assert!(matches!(err, SchemaError::MissingField("sentiment")));
    }

    #[test]
    fn test_parse_reaction_keeps_real_driver() {
        let reaction = parse_reaction(
            r#"{"sentiment": -3, "share_likelihood": 80, "controversy_flag": true,
                "controversy_driver": "tone-deaf pricing"}"#,
            "p",
        )
        .unwrap();
        assert_eq!(reaction.controversy_driver.as_deref(), Some("tone-deaf pricing"));
    }

    #[test]
    fn test_parse_segments() {
        let text = r#"{"segments": [{"name": "Rural parents", "age": "30-45", "ethnicity": "Mixed",
            "location": "Midwest", "values": "Family", "political_leaning": "Moderate",
            "media_habits": "Facebook", "confidence": 0.85}],
            "bias_analysis": {"potential_biases": ["urban skew"], "inclusivity_concerns": ["jargon"],
            "diversity_gaps": ["seniors"]}}"#;
        let (segments, bias) = parse_segments(text).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].name, "Rural parents");
        assert_eq!(bias.inclusivity_score, DEFAULT_INCLUSIVITY_SCORE);
        assert_eq!(bias.improvement_suggestions, vec!["jargon".to_string()]);
    }

    #[test]
    fn test_parse_persona_profile_requires_core_fields() {
        let err = parse_persona_profile(r#"{"name": "Ana", "location": "Austin, TX"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField("age")));

        let err = parse_persona_profile(
            r#"{"name": "Ana", "age": 30, "location": "Austin",
                "m1_psychographic_profile": {"political_lean": 4.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { field: "political_lean", .. }));
    }

    #[test]
    fn test_parse_chat_turn() {
        let turn = parse_chat_turn(r#"{"message": "Love it", "sentiment": 2.5}"#).unwrap();
        assert_eq!(turn.message, "Love it");
        assert!(parse_chat_turn(r#"{"message": "x"}"#).is_err());
        assert!(parse_chat_turn("I like it").is_err());
    }

    #[test]
    fn test_parse_vote() {
        assert_eq!(parse_vote("1", 3).unwrap(), 1);
        assert_eq!(parse_vote(" 2 \n", 3).unwrap(), 2);
        assert_eq!(parse_vote(r#"{"vote": 0}"#, 3).unwrap(), 0);
        assert!(matches!(parse_vote("3", 3), Err(SchemaError::OutOfRange { .. })));
        assert!(matches!(parse_vote("-1", 3), Err(SchemaError::OutOfRange { .. })));
        assert!(matches!(parse_vote("option two", 3), Err(SchemaError::Vote(_))));
    }
}
