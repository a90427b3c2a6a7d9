//! Multi-turn group chat between personas.
//!
//! A fixed set of participants speaks once per turn for a fixed number of
//! turns. Each turn's last utterances become the next turn's topic, and the
//! conversation is scored for sentiment consensus afterwards.

use crate::config::GroupChatConfig;
use crate::model::Persona;
use crate::prompts;
use crate::schema;
use persona_env::{CallKind, GenerativeOracle, OracleRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Strictly increasing across the whole conversation
    pub sequence: usize,
    /// 1-based turn number
    pub turn: usize,
    pub persona_id: String,
    pub persona_name: String,
    pub message: String,
    pub sentiment: f64,
}

/// Outcome of a group chat run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupChatMetrics {
    pub records: Vec<ChatRecord>,
    /// Mean pairwise sentiment similarity in [0, 1]
    pub consensus_index: f64,
    /// Starting message followed by the topic after each turn
    pub topic_evolution: Vec<String>,
    /// Names of the most active speakers
    pub dominant_voices: Vec<String>,
    pub participants: Vec<String>,
    /// Utterances replaced by the fallback
    pub fallback_count: usize,
}

/// Runs the turn-based conversation through the oracle.
pub struct GroupChatSimulator {
    oracle: Arc<dyn GenerativeOracle>,
    config: GroupChatConfig,
}

impl GroupChatSimulator {
    pub fn new(oracle: Arc<dyn GenerativeOracle>, config: GroupChatConfig) -> Self {
        Self { oracle, config }
    }

    /// Runs `config.turns` turns over the first `max_participants` personas.
    ///
    /// A failed or unparsable utterance is replaced by the fallback and the
    /// turn continues.
    pub async fn run(&self, personas: &[Persona], message: &str) -> GroupChatMetrics {
        let participants = &personas[..personas.len().min(self.config.max_participants)];
        let mut records: Vec<ChatRecord> = Vec::new();
        let mut topic = message.to_string();
        let mut topic_evolution = vec![topic.clone()];
        let mut fallback_count = 0;

        for turn in 1..=self.config.turns {
            // Speakers in a turn all see the same history: completed turns only
            let turn_start = records.len();
            let context_start = turn_start.saturating_sub(self.config.context_window);
            for persona in participants {
                let prompt = prompts::chat_turn_prompt(&topic, &records[context_start..turn_start]);
                let request = OracleRequest::new(CallKind::ChatTurn, prompt)
                    .with_system(persona.system_prompt.clone());

                let reply = match self.oracle.complete(request).await {
                    Ok(text) => schema::parse_chat_turn(&text).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                let (message, sentiment) = match reply {
                    Ok(reply) => (reply.message, reply.sentiment),
                    Err(reason) => {
                        warn!("Chat turn {} for {} fell back: {}", turn, persona.id, reason);
                        fallback_count += 1;
                        (self.config.fallback_utterance.clone(), self.config.fallback_sentiment)
                    }
                };

                records.push(ChatRecord {
                    sequence: records.len(),
                    turn,
                    persona_id: persona.id.clone(),
                    persona_name: persona.name.clone(),
                    message,
                    sentiment,
                });
            }

            topic = evolve_topic(&records[turn_start..], self.config.topic_sources, self.config.topic_chars);
            debug!("Turn {} topic: {}", turn, topic);
            topic_evolution.push(topic.clone());
        }

        GroupChatMetrics {
            consensus_index: consensus_index(&records),
            dominant_voices: dominant_voices(&records, participants, self.config.dominant_voices),
            participants: participants.iter().map(|p| p.name.clone()).collect(),
            topic_evolution,
            records,
            fallback_count,
        }
    }
}

/// Joins the last `sources` utterances of a turn, truncated to `max_chars`.
pub fn evolve_topic(turn: &[ChatRecord], sources: usize, max_chars: usize) -> String {
    let start = turn.len().saturating_sub(sources);
    let joined = turn[start..]
        .iter()
        .map(|r| r.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    joined.chars().take(max_chars).collect()
}

/// Mean over all record pairs of `max(0, 1 - |s_i - s_j| / 10)`.
///
/// Fewer than two records is full consensus.
pub fn consensus_index(records: &[ChatRecord]) -> f64 {
    if records.len() < 2 {
        return 1.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            total += (1.0 - (a.sentiment - b.sentiment).abs() / 10.0).max(0.0);
            pairs += 1;
        }
    }
    total / pairs as f64
}

/// The `k` participants with the most records; ties keep participant order.
pub fn dominant_voices(records: &[ChatRecord], participants: &[Persona], k: usize) -> Vec<String> {
    let mut counts: Vec<(&Persona, usize)> = participants
        .iter()
        .map(|p| (p, records.iter().filter(|r| r.persona_id == p.id).count()))
        .filter(|(_, n)| *n > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(k).map(|(p, _)| p.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FnOracle;
    use approx::assert_relative_eq;

    fn record(sequence: usize, persona: &str, message: &str, sentiment: f64) -> ChatRecord {
        ChatRecord {
            sequence,
            turn: 1,
            persona_id: persona.to_string(),
            persona_name: persona.to_uppercase(),
            message: message.to_string(),
            sentiment,
        }
    }

    fn crowd(n: usize) -> Vec<Persona> {
        (0..n).map(|i| Persona::new(format!("p{}", i), format!("Person {}", i))).collect()
    }

    #[test]
    fn test_consensus_degenerate_and_range() {
        assert_eq!(consensus_index(&[]), 1.0);
        assert_eq!(consensus_index(&[record(0, "a", "x", -5.0)]), 1.0);

        let opposite = [record(0, "a", "x", -5.0), record(1, "b", "y", 5.0)];
        assert_relative_eq!(consensus_index(&opposite), 0.0);

        let mixed = [record(0, "a", "x", 1.0), record(1, "b", "y", 1.0), record(2, "c", "z", 3.0)];
        // pairs: 1.0, 0.8, 0.8
        assert_relative_eq!(consensus_index(&mixed), 2.6 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_topic_uses_last_three_and_truncates() {
        let turn = [
            record(0, "a", "first", 0.0),
            record(1, "b", "second", 0.0),
            record(2, "c", "third", 0.0),
            record(3, "d", "fourth", 0.0),
        ];
        assert_eq!(evolve_topic(&turn, 3, 100), "second third fourth");
        assert_eq!(evolve_topic(&turn, 3, 9), "second th");

        let accents = [record(0, "a", "café crème", 0.0)];
        assert_eq!(evolve_topic(&accents, 3, 4), "café");
    }

    #[test]
    fn test_dominant_voices_tie_break_by_participant_order() {
        let people = crowd(4);
        let records = vec![
            record(0, "p2", "a", 0.0),
            record(1, "p1", "b", 0.0),
            record(2, "p2", "c", 0.0),
            record(3, "p3", "d", 0.0),
            record(4, "p0", "e", 0.0),
        ];
        let voices = dominant_voices(&records, &people, 3);
        assert_eq!(voices, vec!["Person 2", "Person 0", "Person 1"]);
    }

    #[tokio::test]
    async fn test_participants_capped_at_eight() {
        let oracle = Arc::new(FnOracle::new(|_, n| {
            Ok(format!(r#"{{"message": "reply {}", "sentiment": 2.0}}"#, n))
        }));
        let config = GroupChatConfig { turns: 2, ..Default::default() };
        let sim = GroupChatSimulator::new(oracle.clone(), config);

        let metrics = sim.run(&crowd(12), "Launch day").await;

        assert_eq!(metrics.participants.len(), 8);
        assert_eq!(metrics.records.len(), 16);
        assert_eq!(oracle.calls(), 16);
        assert_eq!(metrics.records[8].turn, 2);
        assert!(metrics.records.windows(2).all(|w| w[0].sequence < w[1].sequence));
        assert_eq!(metrics.topic_evolution.len(), 3);
        assert_eq!(metrics.topic_evolution[0], "Launch day");
        assert_eq!(metrics.topic_evolution[1], "reply 5 reply 6 reply 7");
        assert_relative_eq!(metrics.consensus_index, 1.0);
        assert_eq!(metrics.fallback_count, 0);
    }

    #[tokio::test]
    async fn test_failures_fall_back_without_aborting_turn() {
        let oracle = Arc::new(FnOracle::new(|_, n| match n % 3 {
            0 => Ok(r#"{"message": "ok", "sentiment": -1.0}"#.to_string()),
            1 => Ok("not json at all".to_string()),
            _ => Err(persona_env::OracleError::Timeout(500)),
        }));
        let config = GroupChatConfig { turns: 1, ..Default::default() };
        let sim = GroupChatSimulator::new(oracle, config);

        let metrics = sim.run(&crowd(3), "Hello").await;

        assert_eq!(metrics.records.len(), 3);
        assert_eq!(metrics.fallback_count, 2);
        assert_eq!(metrics.records[1].message, "I think this is interesting.");
        assert_eq!(metrics.records[2].sentiment, 1.0);
    }

    #[tokio::test]
    async fn test_context_window_limits_history() {
        let oracle = Arc::new(FnOracle::new(|request, n| {
            let lines = request.prompt.lines().filter(|l| l.starts_with("Person")).count();
            assert!(lines <= 6, "call {} saw {} history lines", n, lines);
            Ok(r#"{"message": "fine", "sentiment": 0.0}"#.to_string())
        }));
        let config = GroupChatConfig { turns: 3, ..Default::default() };
        let metrics = GroupChatSimulator::new(oracle, config).run(&crowd(5), "Topic").await;
        assert_eq!(metrics.records.len(), 15);
    }

    #[tokio::test]
    async fn test_history_excludes_current_turn() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let oracle = Arc::new(FnOracle::new(move |request, _| {
            let lines = request.prompt.lines().filter(|l| l.starts_with("Person")).count();
            log.lock().unwrap().push(lines);
            Ok(r#"{"message": "fine", "sentiment": 0.0}"#.to_string())
        }));
        let config = GroupChatConfig { turns: 3, ..Default::default() };
        GroupChatSimulator::new(oracle, config).run(&crowd(3), "Topic").await;

        // turn 1 sees nothing, turn 2 sees turn 1, turn 3 sees the last six
        assert_eq!(*seen.lock().unwrap(), vec![0, 0, 0, 3, 3, 3, 6, 6, 6]);
    }
}
