//! Scripted generative oracle for simulation.
//!
//! The ScriptedOracle plays every role the live service plays:
//! - Audience analyst (segment list + bias summary)
//! - Persona author (one profile per segment slot)
//! - Persona voice (reactions, chat turns, votes)
//! - Report writer (executive summary)
//!
//! Replies are drawn from a per-call ChaCha8 stream keyed by the seed and the
//! request content, so the same seed replays the same conversation even when
//! reaction calls complete out of order.

use crate::context::derive_seed;
use async_trait::async_trait;
use persona_core::audience;
use persona_env::{CallKind, GenerativeOracle, OracleError, OracleRequest};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Shape of the audience the oracle pretends to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleProfile {
    /// Center of the sentiment distribution (mirrored when polarized)
    pub sentiment_mean: f64,

    /// Standard deviation of sentiment
    pub sentiment_spread: f64,

    /// Splits the audience into two camps at +/- `sentiment_mean`
    pub polarized: bool,

    /// Center of share likelihood (percent)
    pub share_mean: f64,

    /// Standard deviation of share likelihood
    pub share_spread: f64,

    /// Probability that a reaction is flagged controversial
    pub controversy_rate: f64,

    /// Probability that a call returns an unparsable reply
    pub malformed_rate: f64,

    /// Probability that a call fails at the transport level
    pub failure_rate: f64,

    /// Probability that a JSON reply is wrapped in a code fence
    pub fenced_rate: f64,

    /// Call kinds that malformed replies and failures apply to
    pub faulty_kinds: Vec<CallKind>,
}

impl Default for OracleProfile {
    fn default() -> Self {
        Self {
            sentiment_mean: 1.0,
            sentiment_spread: 2.0,
            polarized: false,
            share_mean: 45.0,
            share_spread: 20.0,
            controversy_rate: 0.1,
            malformed_rate: 0.0,
            failure_rate: 0.0,
            fenced_rate: 0.2,
            faulty_kinds: vec![CallKind::Reaction, CallKind::ChatTurn, CallKind::Vote, CallKind::Summary],
        }
    }
}

/// Counters of what the oracle served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleStats {
    pub calls: u64,
    pub failures: u64,
    pub malformed: u64,
    pub fenced: u64,
}

/// Deterministic stand-in for the generative service.
pub struct ScriptedOracle {
    seed: u64,
    profile: OracleProfile,

    /// Per-kind call counters for the sequential call kinds
    counters: Mutex<HashMap<CallKind, u64>>,

    calls: AtomicU64,
    failures: AtomicU64,
    malformed: AtomicU64,
    fenced: AtomicU64,
}

const SEGMENTS: &[(&str, &str, &str, &str, &str, &str, &str, f64)] = &[
    ("Urban Young Professionals", "22-35", "Mixed", "Chicago, IL", "career growth, convenience", "Liberal", "Instagram, TikTok", 0.8),
    ("Suburban Parents", "30-50", "White", "Suburban Columbus, OH", "family, safety", "Moderate", "Facebook, Local news", 0.75),
    ("Rural Retirees", "58-75", "White", "Rural Iowa, IA", "tradition, community", "Conservative", "TV news, Facebook", 0.7),
    ("Latino Small Business Owners", "35-55", "Hispanic or Latino", "San Antonio, TX", "independence, hard work", "Moderate", "WhatsApp, YouTube", 0.65),
];

const FIRST_NAMES: &[&str] = &[
    "Ana", "Ben", "Carla", "Dmitri", "Ebony", "Farah", "Gus", "Hana", "Ivan", "Jada", "Kofi", "Lena", "Marco",
    "Nia", "Omar", "Priya", "Quinn", "Rosa", "Sam", "Tomas",
];
const LAST_NAMES: &[&str] = &[
    "Alvarez", "Brooks", "Chen", "Diallo", "Evans", "Fischer", "Garcia", "Haddad", "Ito", "Johnson", "Kowalski",
    "Lopez", "Miller", "Nguyen", "Okafor", "Patel",
];
const GENDERS: &[&str] = &["Woman", "Man", "Non-binary"];
const OCCUPATIONS: &[&str] = &[
    "Nurse", "Software developer", "Teacher", "Electrician", "Retail manager", "Accountant", "Farmer", "Designer",
];
const EDUCATION: &[&str] = &["High school", "Some college", "Bachelor's degree", "Master's degree"];
const INCOME_TIERS: &[&str] = &["Under $25k", "$25k-$50k", "$50k-$75k", "$75k-$100k", "$100k-$150k", "$150k+"];
const BRAND_CLUSTERS: &[&str] = &["Value seekers", "Premium loyalists", "Eco-conscious", "Early adopters"];
const CONTENT_FORMATS: &[&str] = &["Short video", "Long-form article", "Podcast", "Image posts"];
const SCHWARTZ: &[&str] = &["achievement", "benevolence", "security", "self-direction", "tradition"];
const BIG5: &[&str] = &["agreeableness", "conscientiousness", "extraversion", "neuroticism", "openness"];

const POSITIVE_TRIGGERS: &[&str] = &["value for money", "brand trust", "humor", "community", "convenience"];
const NEGATIVE_TRIGGERS: &[&str] = &["pricing", "tone", "privacy", "authenticity", "pushiness"];
const DRIVERS: &[&str] = &["political framing", "cultural insensitivity", "misleading claims", "pricing fairness"];
const SUGGESTIONS: &[&str] = &[
    "Lead with a concrete benefit",
    "Drop the hard sell",
    "Show real customers",
    "Be upfront about the price",
];
const CHAT_OPENERS_POSITIVE: &[&str] = &["Honestly I like it.", "This actually works for me.", "I'd share this."];
const CHAT_OPENERS_NEUTRAL: &[&str] = &["Not sure how I feel.", "It's okay I guess.", "Could go either way."];
const CHAT_OPENERS_NEGATIVE: &[&str] = &["This rubs me the wrong way.", "I don't buy it.", "Feels out of touch."];
const CHAT_CLOSERS: &[&str] = &[
    "The price part matters most to me.",
    "My friends would have opinions.",
    "The tone is what sticks with me.",
    "I want to know who it's really for.",
];
const MALFORMED_REPLIES: &[&str] = &[
    "I'm sorry, I can't help with that request.",
    "{\"sentiment\": ",
    "Sure! Here's my answer: maybe the second one?",
];

impl ScriptedOracle {
    /// Creates an oracle with the given seed and audience profile.
    pub fn new(seed: u64, profile: OracleProfile) -> Self {
        Self {
            seed,
            profile,
            counters: Mutex::new(HashMap::new()),
            calls: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            fenced: AtomicU64::new(0),
        }
    }

    pub fn profile(&self) -> &OracleProfile {
        &self.profile
    }

    pub fn stats(&self) -> OracleStats {
        OracleStats {
            calls: self.calls.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            malformed: self.malformed.load(Ordering::SeqCst),
            fenced: self.fenced.load(Ordering::SeqCst),
        }
    }

    /// Builds the reply stream for one call.
    ///
    /// Reaction calls run concurrently, so they are keyed by content only.
    /// The other kinds are issued one at a time and also mix in a per-kind
    /// counter to tell repeated identical prompts apart.
    fn stream(&self, request: &OracleRequest) -> ChaCha8Rng {
        let counter = match request.kind {
            CallKind::Reaction => 0,
            kind => {
                let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
                let slot = counters.entry(kind).or_insert(0);
                *slot += 1;
                *slot
            }
        };
        let mut hasher = DefaultHasher::new();
        request.kind.hash(&mut hasher);
        request.system.hash(&mut hasher);
        request.prompt.hash(&mut hasher);
        counter.hash(&mut hasher);
        ChaCha8Rng::seed_from_u64(derive_seed(self.seed, hasher.finish()))
    }

    fn sentiment(&self, rng: &mut ChaCha8Rng) -> f64 {
        let center = if self.profile.polarized && rng.gen_bool(0.5) {
            -self.profile.sentiment_mean
        } else {
            self.profile.sentiment_mean
        };
        round_to(normal(rng, center, self.profile.sentiment_spread).clamp(-5.0, 5.0), 1)
    }

    fn segments_reply(&self) -> serde_json::Value {
        let segments: Vec<serde_json::Value> = SEGMENTS
            .iter()
            .map(|(name, age, ethnicity, location, values, leaning, media, confidence)| {
                json!({
                    "name": name,
                    "age": age,
                    "ethnicity": ethnicity,
                    "location": location,
                    "values": values,
                    "political_leaning": leaning,
                    "media_habits": media,
                    "confidence": confidence,
                })
            })
            .collect();
        json!({
            "segments": segments,
            "bias_analysis": {
                "potential_biases": ["Urban skew in channel choice"],
                "inclusivity_concerns": ["Limited representation of non-English speakers"],
                "diversity_gaps": ["No Gen Z rural segment"],
            }
        })
    }

    fn profile_reply(&self, prompt: &str, rng: &mut ChaCha8Rng) -> serde_json::Value {
        let (low, high) = prompt_field(prompt, "Age: ")
            .and_then(parse_age_range)
            .unwrap_or((18, 70));
        let age = rng.gen_range(low..=high);
        let location = prompt_field(prompt, "Location: ").unwrap_or("Springfield, IL").to_string();
        let ethnicity = prompt_field(prompt, "Ethnicity: ").unwrap_or("Mixed").to_string();
        let leaning = prompt_field(prompt, "Political leaning: ").unwrap_or("Moderate").to_string();
        let values: Vec<String> = prompt_field(prompt, "Values: ")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();
        let platforms: Vec<String> = prompt_field(prompt, "Media habits: ")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();

        let lean_center = match leaning.to_lowercase() {
            l if l.contains("liberal") || l.contains("progressive") => -1.8,
            l if l.contains("conservative") => 1.8,
            _ => 0.0,
        };
        let political_lean = round_to(normal(rng, lean_center, 0.6).clamp(-3.0, 3.0), 1);
        let gender = pick(rng, GENDERS);
        let state = location.rsplit(',').next().map(str::trim).filter(|s| *s != location.trim());

        let traits: serde_json::Map<String, serde_json::Value> = BIG5
            .iter()
            .map(|t| (t.to_string(), json!(round_to(rng.gen_range(0.0..1.0), 2))))
            .collect();
        let schwartz: serde_json::Map<String, serde_json::Value> = SCHWARTZ
            .iter()
            .map(|v| (v.to_string(), json!(round_to(rng.gen_range(0.0..1.0), 2))))
            .collect();

        json!({
            "name": format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
            "age": age,
            "gender": gender,
            "ethnicity": ethnicity,
            "location": location,
            "occupation": pick(rng, OCCUPATIONS),
            "values": values,
            "political_leaning": leaning,
            "personality_traits": traits,
            "media_habits": platforms,
            "m1_demographic_profile": {
                "age_band": format!("{}-{}", age, age + 4),
                "gender_identity": gender,
                "ethnicity_omb": ethnicity,
                "geography": {
                    "country": "USA",
                    "state": state.unwrap_or("Unknown"),
                    "urban_rural_flag": audience::location_type(&location),
                },
                "education_level": pick(rng, EDUCATION),
                "income_tier": pick(rng, INCOME_TIERS),
            },
            "m1_psychographic_profile": {
                "political_lean": political_lean,
                "schwartz_values": schwartz,
                "brand_affinity_cluster": pick(rng, BRAND_CLUSTERS),
            },
            "m1_media_profile": {
                "top_platforms": platforms,
                "preferred_content_format": pick(rng, CONTENT_FORMATS),
                "daily_usage_hours": round_to(rng.gen_range(0.5..6.0), 1),
            }
        })
    }

    fn reaction_reply(&self, rng: &mut ChaCha8Rng) -> serde_json::Value {
        let sentiment = self.sentiment(rng);
        let positivity = (sentiment + 5.0) / 10.0;
        let share = round_to(
            normal(rng, self.profile.share_mean, self.profile.share_spread).clamp(0.0, 100.0),
            0,
        );
        let credibility = round_to(normal(rng, 3.0 + sentiment * 0.3, 0.5).clamp(1.0, 5.0), 1);
        let purchase = round_to((positivity * 100.0 + normal(rng, 0.0, 10.0)).clamp(0.0, 100.0), 0);

        let mut emotion = |weight: f64, high: f64| round_to((weight * rng.gen_range(0.0..high)).clamp(0.0, 1.0), 2);
        let emotions = json!({
            "joy": emotion(positivity, 1.0),
            "trust": emotion(positivity, 1.0),
            "fear": emotion(1.0 - positivity, 0.7),
            "surprise": emotion(1.0, 0.6),
            "sadness": emotion(1.0 - positivity, 0.6),
            "disgust": emotion(1.0 - positivity, 0.8),
            "anger": emotion(1.0 - positivity, 0.9),
            "anticipation": emotion(1.0, 0.8),
        });

        let pool = if sentiment >= 0.0 { POSITIVE_TRIGGERS } else { NEGATIVE_TRIGGERS };
        let triggers: Vec<&str> = pool.choose_multiple(rng, 2).copied().collect();
        let controversial = rng.gen_bool(self.profile.controversy_rate.clamp(0.0, 1.0));
        let driver = if controversial { pick(rng, DRIVERS) } else { "none" };
        let explanation = match sentiment {
            s if s >= 2.0 => "It speaks to what I care about.",
            s if s > -2.0 => "It's fine, nothing special.",
            _ => "It feels out of touch with people like me.",
        };

        json!({
            "sentiment": sentiment,
            "share_likelihood": share,
            "emotional_triggers": triggers,
            "suggested_modifications": pick(rng, SUGGESTIONS),
            "explanation": explanation,
            "m2_emotion_vector": emotions,
            "credibility_rating": credibility,
            "purchase_intent": purchase,
            "controversy_flag": controversial,
            "controversy_driver": driver,
        })
    }

    fn chat_reply(&self, rng: &mut ChaCha8Rng) -> serde_json::Value {
        let sentiment = self.sentiment(rng);
        let opener = match sentiment {
            s if s >= 1.0 => pick(rng, CHAT_OPENERS_POSITIVE),
            s if s > -1.0 => pick(rng, CHAT_OPENERS_NEUTRAL),
            _ => pick(rng, CHAT_OPENERS_NEGATIVE),
        };
        json!({
            "message": format!("{} {}", opener, pick(rng, CHAT_CLOSERS)),
            "sentiment": sentiment,
        })
    }

    fn vote_reply(&self, prompt: &str, rng: &mut ChaCha8Rng) -> String {
        let options = prompt
            .lines()
            .filter(|line| {
                line.split_once(':')
                    .map_or(false, |(head, _)| !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()))
            })
            .count();
        let choice = rng.gen_range(0..options.max(1));
        if rng.gen_bool(0.5) {
            choice.to_string()
        } else {
            json!({ "vote": choice }).to_string()
        }
    }

    fn summary_reply(&self, prompt: &str) -> String {
        let mean = prompt_field(prompt, "- Average sentiment: ")
            .and_then(|v| v.split_whitespace().next())
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);
        let tone = match mean {
            m if m >= 2.0 => "broadly favorable; amplify the current message",
            m if m > -2.0 => "mixed; A/B test the framing before scaling",
            _ => "negative; revise the message before launch",
        };
        format!("Executive summary: audience response is {} (mean sentiment {:.2}).", tone, mean)
    }
}

#[async_trait]
impl GenerativeOracle for ScriptedOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut rng = self.stream(&request);

        if self.profile.faulty_kinds.contains(&request.kind) {
            if rng.gen_bool(self.profile.failure_rate.clamp(0.0, 1.0)) {
                self.failures.fetch_add(1, Ordering::SeqCst);
                debug!("Injected failure on {} call", request.kind);
                return Err(match rng.gen_range(0..3) {
                    0 => OracleError::Timeout(30_000),
                    1 => OracleError::transport("connection reset by peer"),
                    _ => OracleError::Quota("rate limit reached".to_string()),
                });
            }
            if rng.gen_bool(self.profile.malformed_rate.clamp(0.0, 1.0)) {
                self.malformed.fetch_add(1, Ordering::SeqCst);
                debug!("Injected malformed reply on {} call", request.kind);
                return Ok(pick(&mut rng, MALFORMED_REPLIES).to_string());
            }
        }

        let body = match request.kind {
            CallKind::Segments => self.segments_reply(),
            CallKind::PersonaProfile => self.profile_reply(&request.prompt, &mut rng),
            CallKind::Reaction => self.reaction_reply(&mut rng),
            CallKind::ChatTurn => self.chat_reply(&mut rng),
            CallKind::Vote => return Ok(self.vote_reply(&request.prompt, &mut rng)),
            CallKind::Summary => return Ok(self.summary_reply(&request.prompt)),
        };

        let text = body.to_string();
        if rng.gen_bool(self.profile.fenced_rate.clamp(0.0, 1.0)) {
            self.fenced.fetch_add(1, Ordering::SeqCst);
            return Ok(format!("```json\n{}\n```", text));
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn normal(rng: &mut ChaCha8Rng, mean: f64, std_dev: f64) -> f64 {
    Normal::new(mean, std_dev).map_or(mean, |n| n.sample(rng))
}

fn pick<'a>(rng: &mut ChaCha8Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Value of the first prompt line starting with `label`.
fn prompt_field<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt.lines().find_map(|line| line.trim().strip_prefix(label)).map(str::trim)
}

fn parse_age_range(text: &str) -> Option<(u32, u32)> {
    let (low, high) = text.split_once('-')?;
    let low: u32 = low.trim().parse().ok()?;
    let high: u32 = high.trim().trim_end_matches('+').parse().ok()?;
    (low <= high).then_some((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_core::model::{AudienceSegment, CampaignMetadata};
    use persona_core::{prompts, schema};

    fn segment() -> AudienceSegment {
        let (segments, _) = schema::parse_segments(&ScriptedOracle::new(1, OracleProfile::default()).segments_reply().to_string())
            .unwrap();
        segments[2].clone()
    }

    #[tokio::test]
    async fn test_segments_reply_parses() {
        let oracle = ScriptedOracle::new(42, OracleProfile::default());
        let text = oracle
            .complete(OracleRequest::new(CallKind::Segments, "Message to analyze: hi"))
            .await
            .unwrap();
        let (segments, bias) = schema::parse_segments(&text).unwrap();
        assert_eq!(segments.len(), SEGMENTS.len());
        assert_eq!(bias.diversity_gaps, vec!["No Gen Z rural segment"]);
    }

    #[tokio::test]
    async fn test_profile_follows_segment() {
        let oracle = ScriptedOracle::new(42, OracleProfile::default());
        let prompt = prompts::persona_profile_prompt(&segment(), &CampaignMetadata::new("hi"));
        let text = oracle
            .complete(OracleRequest::new(CallKind::PersonaProfile, prompt))
            .await
            .unwrap();
        let profile = schema::parse_persona_profile(&text).unwrap();
        let age = profile.age.unwrap();
        assert!((58..=75).contains(&age));
        assert_eq!(profile.location.as_deref(), Some("Rural Iowa, IA"));
        let persona = audience::build_persona("rural_retirees_0".into(), profile);
        assert_eq!(persona.location_type, "Rural");
        assert!(persona.psychographic.political_lean > 0.0);
    }

    #[tokio::test]
    async fn test_repeated_profile_prompts_differ() {
        let oracle = ScriptedOracle::new(42, OracleProfile::default());
        let prompt = prompts::persona_profile_prompt(&segment(), &CampaignMetadata::new("hi"));
        let a = oracle
            .complete(OracleRequest::new(CallKind::PersonaProfile, prompt.clone()))
            .await
            .unwrap();
        let b = oracle
            .complete(OracleRequest::new(CallKind::PersonaProfile, prompt))
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_reactions_are_valid_and_content_keyed() {
        let oracle = ScriptedOracle::new(9, OracleProfile::default());
        let request = OracleRequest::new(CallKind::Reaction, prompts::reaction_prompt("Buy now!"))
            .with_system("You are Ana");
        let first = oracle.complete(request.clone()).await.unwrap();
        let again = oracle.complete(request).await.unwrap();
        assert_eq!(first, again);

        for i in 0..50 {
            let request = OracleRequest::new(CallKind::Reaction, "react").with_system(format!("persona {}", i));
            let text = oracle.complete(request).await.unwrap();
            let reaction = schema::parse_reaction(&text, "p").unwrap();
            assert!((-5.0..=5.0).contains(&reaction.sentiment));
        }
        assert!(oracle.stats().fenced > 0);
    }

    #[tokio::test]
    async fn test_polarized_profile_splits_camps() {
        let profile = OracleProfile {
            sentiment_mean: 3.5,
            sentiment_spread: 0.5,
            polarized: true,
            ..OracleProfile::default()
        };
        let oracle = ScriptedOracle::new(3, profile);
        let mut positive = 0;
        let mut negative = 0;
        for i in 0..60 {
            let request = OracleRequest::new(CallKind::Reaction, "react").with_system(format!("persona {}", i));
            let reaction = schema::parse_reaction(&oracle.complete(request).await.unwrap(), "p").unwrap();
            assert!(reaction.sentiment.abs() > 1.0);
            if reaction.sentiment > 0.0 {
                positive += 1;
            } else {
                negative += 1;
            }
        }
        assert!(positive > 10 && negative > 10);
    }

    #[tokio::test]
    async fn test_votes_stay_in_range() {
        let oracle = ScriptedOracle::new(5, OracleProfile::default());
        let variants = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        for _ in 0..30 {
            let text = oracle
                .complete(OracleRequest::new(CallKind::Vote, prompts::vote_prompt(&variants)))
                .await
                .unwrap();
            assert!(schema::parse_vote(&text, 3).is_ok());
        }
    }

    #[tokio::test]
    async fn test_faults_only_hit_faulty_kinds() {
        let profile = OracleProfile {
            failure_rate: 1.0,
            ..OracleProfile::default()
        };
        let oracle = ScriptedOracle::new(5, profile);
        assert!(oracle.complete(OracleRequest::new(CallKind::Reaction, "react")).await.is_err());
        assert!(oracle.complete(OracleRequest::new(CallKind::Segments, "hi")).await.is_ok());
        assert_eq!(oracle.stats().failures, 1);
        assert_eq!(oracle.stats().calls, 2);
    }

    #[test]
    fn test_prompt_helpers() {
        assert_eq!(parse_age_range("22-35"), Some((22, 35)));
        assert_eq!(parse_age_range("58+-75"), None);
        assert_eq!(parse_age_range("40-30"), None);
        assert_eq!(prompt_field("Segment: X\nAge: 1-2\n", "Age: "), Some("1-2"));
        assert_eq!(round_to(3.14159, 2), 3.14);
    }
}
