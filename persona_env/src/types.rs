//! Common types for the oracle abstraction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one pipeline run.
///
/// Uses UUID v4 for global uniqueness without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Creates a new random RunId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic RunId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// The kind of call being made, which fixes the reply schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Segment list + bias summary
    Segments,
    /// One persona profile
    PersonaProfile,
    /// One persona's reaction judgment
    Reaction,
    /// One group-chat utterance
    ChatTurn,
    /// One vote over message variants
    Vote,
    /// Free-text executive summary
    Summary,
}

impl CallKind {
    /// Default token budget for this call kind.
    pub fn max_tokens(&self) -> u32 {
        match self {
            CallKind::Segments | CallKind::PersonaProfile | CallKind::Reaction => 2000,
            CallKind::ChatTurn => 200,
            CallKind::Vote => 50,
            CallKind::Summary => 1000,
        }
    }

    /// Default sampling temperature for this call kind.
    pub fn temperature(&self) -> f32 {
        match self {
            CallKind::Segments | CallKind::Vote => 0.7,
            CallKind::PersonaProfile | CallKind::Reaction => 0.8,
            CallKind::ChatTurn => 0.9,
            CallKind::Summary => 0.5,
        }
    }

    /// Returns the kind name.
    pub fn name(&self) -> &'static str {
        match self {
            CallKind::Segments => "segments",
            CallKind::PersonaProfile => "persona_profile",
            CallKind::Reaction => "reaction",
            CallKind::ChatTurn => "chat_turn",
            CallKind::Vote => "vote",
            CallKind::Summary => "summary",
        }
    }
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One role-scoped request to the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    /// What schema the reply must follow
    pub kind: CallKind,

    /// Role instruction (a persona's system prompt, or an analyst role)
    pub system: Option<String>,

    /// The task prompt
    pub prompt: String,

    /// Token budget for the reply
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl OracleRequest {
    /// Creates a request with the default budget and temperature for `kind`.
    pub fn new(kind: CallKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            system: None,
            prompt: prompt.into(),
            max_tokens: kind.max_tokens(),
            temperature: kind.temperature(),
        }
    }

    /// Sets the role instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_from_seed_is_stable() {
        assert_eq!(RunId::from_seed(7), RunId::from_seed(7));
        assert_ne!(RunId::from_seed(7), RunId::from_seed(8));
    }

    #[test]
    fn test_request_budget_follows_kind() {
        let vote = OracleRequest::new(CallKind::Vote, "pick");
        assert_eq!(vote.max_tokens, 50);
        assert!(vote.system.is_none());

        let chat = OracleRequest::new(CallKind::ChatTurn, "hi").with_system("You are Ana");
        assert_eq!(chat.max_tokens, 200);
        assert!((chat.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(chat.system.as_deref(), Some("You are Ana"));
    }
}
