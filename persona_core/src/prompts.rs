//! Prompt rendering for every oracle call kind.
//!
//! Prompts only describe the reply schema; decoding and validation live in
//! `schema`.

use crate::group_chat::ChatRecord;
use crate::model::{AudienceSegment, CampaignMetadata, Persona};
use crate::report::InsightReport;
use std::fmt::Write;

/// Analyst role for the segment-list call.
pub const SEGMENTS_SYSTEM: &str = r#"You are an audience analyst. Identify 5-7 audience segments that would react to the message in meaningfully different ways. Cover age, ethnicity, urban/suburban/rural and socioeconomic diversity.

Reply with one JSON object:
{
  "segments": [
    {"name": "...", "age": "...", "ethnicity": "...", "location": "...",
     "values": "...", "political_leaning": "...", "media_habits": "...",
     "confidence": 0.85}
  ],
  "bias_analysis": {
    "potential_biases": ["..."],
    "inclusivity_concerns": ["..."],
    "diversity_gaps": ["..."]
  }
}
Return only the JSON object."#;

const PROFILE_SCHEMA: &str = r#"{
  "name": "...", "age": 25, "gender": "...", "ethnicity": "...",
  "location": "City, State", "occupation": "...",
  "values": ["..."], "political_leaning": "...",
  "personality_traits": {"openness": 0.7, "conscientiousness": 0.6,
    "extraversion": 0.5, "agreeableness": 0.8, "neuroticism": 0.3},
  "media_habits": ["..."],
  "cultural_background": "...", "socioeconomic_details": "...",
  "m1_demographic_profile": {
    "age_band": "23-27", "gender_identity": "...", "ethnicity_omb": "...",
    "geography": {"country": "...", "state": "...", "urban_rural_flag": "Urban/Suburban/Rural"},
    "education_level": "...", "income_tier": "Under $25k/$25k-$50k/$50k-$75k/$75k-$100k/$100k-$150k/$150k+"
  },
  "m1_psychographic_profile": {
    "political_lean": 1.5, "schwartz_values": {"security": 0.8},
    "brand_affinity_cluster": "..."
  },
  "m1_media_profile": {
    "top_platforms": ["..."], "preferred_content_format": "...", "daily_usage_hours": 3.5
  }
}"#;

const REACTION_SCHEMA: &str = r#"{
  "sentiment": -2.5,
  "share_likelihood": 35,
  "emotional_triggers": ["..."],
  "suggested_modifications": "...",
  "explanation": "...",
  "m2_emotion_vector": {"joy": 0.2, "trust": 0.7, "fear": 0.1, "surprise": 0.3,
    "sadness": 0.0, "disgust": 0.1, "anger": 0.0, "anticipation": 0.6},
  "credibility_rating": 3.5,
  "purchase_intent": 45,
  "controversy_flag": false,
  "controversy_driver": "none"
}"#;

fn campaign_lines(metadata: &CampaignMetadata, out: &mut String) {
    let _ = writeln!(out, "Campaign goal: {}", metadata.goal);
    let _ = writeln!(out, "Channel: {}", metadata.channel);
    let _ = writeln!(out, "Desired tone: {}", metadata.desired_tone);
    let _ = writeln!(out, "Company: {} ({} size)", metadata.company_type, metadata.company_size);
    let _ = writeln!(out, "Audience size: {}", metadata.audience_size);
    let _ = writeln!(out, "Brand context: {}", metadata.brand_context);
    let _ = writeln!(out, "Campaign type: {}", metadata.campaign_type);
    let _ = writeln!(out, "Target outcome: {}", metadata.target_outcome);
}

/// User prompt for the segment-list call.
pub fn segments_prompt(metadata: &CampaignMetadata) -> String {
    let mut out = format!("Message to analyze: {}\n", metadata.message);
    campaign_lines(metadata, &mut out);
    out
}

/// Prompt for generating one persona from a segment.
pub fn persona_profile_prompt(segment: &AudienceSegment, metadata: &CampaignMetadata) -> String {
    let mut out = String::from("Create one realistic persona for this audience segment.\n\n");
    let _ = writeln!(out, "Segment: {}", segment.name);
    let _ = writeln!(out, "Age: {}", segment.age);
    let _ = writeln!(out, "Ethnicity: {}", segment.ethnicity);
    let _ = writeln!(out, "Location: {}", segment.location);
    let _ = writeln!(out, "Values: {}", segment.values);
    let _ = writeln!(out, "Political leaning: {}", segment.political_leaning);
    let _ = writeln!(out, "Media habits: {}\n", segment.media_habits);
    out.push_str("Campaign context:\n");
    campaign_lines(metadata, &mut out);
    out.push_str("\nReply with one JSON object:\n");
    out.push_str(PROFILE_SCHEMA);
    out.push_str("\nPolitical lean runs from -3 (very liberal) to +3 (very conservative). Return only the JSON object.");
    out
}

/// Role prompt a persona speaks under for reactions, chat turns and votes.
pub fn persona_system_prompt(persona: &Persona) -> String {
    let mut out = format!(
        "You are {}, a {}-year-old {} from {}.\n\n",
        persona.name, persona.age, persona.gender, persona.location
    );
    let _ = writeln!(out, "Occupation: {}", persona.occupation);
    let _ = writeln!(out, "Ethnicity: {}", persona.ethnicity);
    let _ = writeln!(
        out,
        "Political leaning: {} (scale position {:.1})",
        persona.political_leaning, persona.psychographic.political_lean
    );
    let _ = writeln!(out, "Core values: {}", persona.values.join(", "));
    let _ = writeln!(out, "Media you use: {}", persona.media_habits.join(", "));
    let _ = writeln!(
        out,
        "Profile: {}, {}, {}",
        persona.demographic.age_band, persona.demographic.education_level, persona.demographic.income_tier
    );
    let strongest_value = persona
        .psychographic
        .schwartz_values
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or("Unknown", |(name, _)| name.as_str());
    let _ = writeln!(out, "Strongest Schwartz value: {}", strongest_value);
    let _ = writeln!(out, "Brand affinity: {}", persona.psychographic.brand_affinity_cluster);
    let _ = writeln!(
        out,
        "Media preference: {} content, {}h/day",
        persona.media.preferred_content_format, persona.media.daily_usage_hours
    );
    if !persona.personality_traits.is_empty() {
        out.push_str("Personality (0-1):\n");
        for (trait_name, score) in &persona.personality_traits {
            let _ = writeln!(out, "- {}: {:.2}", trait_name, score);
        }
    }
    out.push_str("\nReact authentically from this background. Let your values, income and education shape credibility and purchase intent.");
    out
}

/// Prompt asking a persona to judge `message`.
pub fn reaction_prompt(message: &str) -> String {
    format!(
        "React to the following message:\n\n\"{}\"\n\nReply with one JSON object:\n{}\n\n\
         sentiment: -5 to +5. share_likelihood and purchase_intent: 0-100. \
         Emotion intensities: 0-1. credibility_rating: 1-5. \
         Set controversy_driver only when controversy_flag is true.\n\
         Return only the JSON object.",
        message, REACTION_SCHEMA
    )
}

/// Prompt for one group-chat utterance.
pub fn chat_turn_prompt(topic: &str, history: &[ChatRecord]) -> String {
    let mut out = format!("You're in a group chat discussing: \"{}\"\n\nRecent conversation:\n", topic);
    for record in history {
        let _ = writeln!(out, "{}: {}", record.persona_name, record.message);
    }
    out.push_str(
        "\nRespond naturally as yourself in 1-2 sentences.\n\
         Reply as JSON: {\"message\": \"your response\", \"sentiment\": 1.5}",
    );
    out
}

/// Prompt for one vote over `variants`.
pub fn vote_prompt(variants: &[String]) -> String {
    let mut out = String::from("Choose your preferred message from these options:\n");
    for (i, variant) in variants.iter().enumerate() {
        let _ = writeln!(out, "{}: {}", i, variant);
    }
    out.push_str("\nRespond with just the number of your preferred option.");
    out
}

/// Prompt for the executive summary, built from the finished report.
pub fn summary_prompt(report: &InsightReport, metadata: &CampaignMetadata) -> String {
    let mut out = String::from("Write a strategic executive summary of this audience reaction data.\n\n");
    out.push_str("Campaign context:\n");
    let _ = writeln!(out, "Company: {} ({} size)", metadata.company_type, metadata.company_size);
    let _ = writeln!(out, "Goal: {}", metadata.goal);
    let _ = writeln!(out, "Target outcome: {}", metadata.target_outcome);
    let _ = writeln!(out, "Channel: {}\n", metadata.channel);

    out.push_str("Metrics:\n");
    let _ = writeln!(out, "- Average sentiment: {:.2} (-5 to +5)", report.mean_sentiment);
    let _ = writeln!(out, "- Average share likelihood: {:.1}%", report.mean_share_likelihood);
    match report.mean_credibility {
        Some(c) => { let _ = writeln!(out, "- Average credibility: {:.1}/5", c); }
        None => out.push_str("- Average credibility: N/A\n"),
    }
    match report.mean_purchase_intent {
        Some(p) => { let _ = writeln!(out, "- Average purchase intent: {:.1}%", p); }
        None => out.push_str("- Average purchase intent: N/A\n"),
    }
    let _ = writeln!(out, "- Personas analyzed: {}", report.persona_count);
    let _ = writeln!(out, "- Controversy rate: {:.0}%", report.controversy.controversy_rate * 100.0);

    out.push_str("\nBreakdown by trait:\n");
    for breakdown in &report.trait_insights {
        let _ = writeln!(out, "{}:", breakdown.dimension);
        for group in &breakdown.groups {
            let _ = write!(out, "  - {}: {:.1} sentiment", group.trait_value, group.avg_sentiment);
            if let Some(c) = group.avg_credibility {
                let _ = write!(out, ", {:.1} credibility", c);
            }
            if let Some(p) = group.avg_purchase_intent {
                let _ = write!(out, ", {:.0}% purchase intent", p);
            }
            out.push('\n');
        }
    }

    if let Some(sims) = &report.simulations {
        out.push_str("\nSimulation results:\n");
        let _ = writeln!(out, "- Group chat consensus index: {:.2}", sims.group_chat.consensus_index);
        let _ = writeln!(
            out,
            "- Virality: {} reach in 24h, {} peak hour",
            sims.virality.reach_24h, sims.virality.peak_hour_reach
        );
        let _ = writeln!(out, "- Popularity vote win rate: {:.1}%", sims.voting.win_rate * 100.0);
    }

    out.push_str(
        "\nCover overall reception, demographic patterns, emotional and controversy risk, \
         simulation projections and concrete recommendations. Keep it actionable.",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_prompt_numbers_variants() {
        let prompt = vote_prompt(&["Buy now!".to_string(), "Buy now.".to_string()]);
        assert!(prompt.contains("0: Buy now!"));
        assert!(prompt.contains("1: Buy now."));
    }

    #[test]
    fn test_chat_prompt_includes_history() {
        let history = vec![ChatRecord {
            sequence: 0,
            turn: 1,
            persona_id: "p1".into(),
            persona_name: "Ana".into(),
            message: "Too pricey".into(),
            sentiment: -1.0,
        }];
        let prompt = chat_turn_prompt("New phone", &history);
        assert!(prompt.contains("discussing: \"New phone\""));
        assert!(prompt.contains("Ana: Too pricey"));
    }

    #[test]
    fn test_persona_system_prompt_names_persona() {
        let mut persona = Persona::new("p1", "Ana Ruiz");
        persona.age = 24;
        persona.location = "Austin, TX".into();
        persona.psychographic.schwartz_values.insert("security".into(), 0.2);
        persona.psychographic.schwartz_values.insert("benevolence".into(), 0.9);
        let prompt = persona_system_prompt(&persona);
        assert!(prompt.starts_with("You are Ana Ruiz, a 24-year-old"));
        assert!(prompt.contains("Strongest Schwartz value: benevolence"));
    }

    #[test]
    fn test_segments_prompt_carries_metadata() {
        let metadata = CampaignMetadata::new("Try our app").with_target_outcome("sales conversion");
        let prompt = segments_prompt(&metadata);
        assert!(prompt.starts_with("Message to analyze: Try our app"));
        assert!(prompt.contains("Target outcome: sales conversion"));
    }
}
