//! Per-persona reaction collection.

use crate::model::{Persona, Reaction};
use crate::prompts;
use crate::schema;
use futures::stream::{self, StreamExt};
use persona_env::{CallKind, GenerativeOracle, OracleRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// A persona whose reaction could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionFailure {
    pub persona_id: String,
    pub reason: String,
}

/// Reactions gathered for one message, in persona input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionBatch {
    pub reactions: Vec<Reaction>,
    pub failed: Vec<ReactionFailure>,
}

/// Asks every persona for a reaction with a bounded number of calls in flight.
pub struct ReactionCollector {
    oracle: Arc<dyn GenerativeOracle>,
    concurrency: usize,
}

impl ReactionCollector {
    pub fn new(oracle: Arc<dyn GenerativeOracle>, concurrency: usize) -> Self {
        Self {
            oracle,
            concurrency: concurrency.max(1),
        }
    }

    /// Collects one reaction per persona.
    ///
    /// Output order follows `personas` regardless of completion order. A
    /// failed call or invalid reply lands in `failed` and does not affect
    /// the other personas.
    pub async fn collect(&self, personas: &[Persona], message: &str) -> ReactionBatch {
        let prompt = prompts::reaction_prompt(message);
        let outcomes: Vec<(&Persona, Result<Reaction, String>)> = stream::iter(personas)
            .map(|persona| {
                let request = OracleRequest::new(CallKind::Reaction, prompt.clone())
                    .with_system(persona.system_prompt.clone());
                let oracle = Arc::clone(&self.oracle);
                async move {
                    let result = match oracle.complete(request).await {
                        Ok(text) => schema::parse_reaction(&text, &persona.id).map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    (persona, result)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut batch = ReactionBatch::default();
        for (persona, outcome) in outcomes {
            match outcome {
                Ok(reaction) => batch.reactions.push(reaction),
                Err(reason) => {
                    warn!("Reaction from {} dropped: {}", persona.id, reason);
                    batch.failed.push(ReactionFailure {
                        persona_id: persona.id.clone(),
                        reason,
                    });
                }
            }
        }
        info!(
            "Collected {} reactions ({} failed)",
            batch.reactions.len(),
            batch.failed.len()
        );
        batch
    }
}
