//! Generative oracle trait consumed by the reaction engine.

use async_trait::async_trait;
use crate::error::OracleError;
use crate::types::OracleRequest;

/// The central interface to the external judgment/text service.
///
/// Every persona profile, reaction judgment, chat utterance, vote and
/// executive summary the engine consumes comes out of this trait. The engine
/// only ever sees the raw reply text and parses it itself.
///
/// # Implementations
///
/// - **Production**: an HTTP client owned by the caller (retries, backoff
///   and rate limiting live there, not in the engine)
/// - **Simulation**: `ScriptedOracle` in `persona_sim` - seeded replies
///
/// # Failure model
///
/// Each call is fail-fast. The engine never retries; a failed call is a
/// per-unit recoverable error (one reaction, one turn, one vote).
#[async_trait]
pub trait GenerativeOracle: Send + Sync {
    /// Sends one role-scoped request and returns the raw reply text.
    ///
    /// The reply may be free text or JSON, optionally wrapped in a fenced
    /// code block.
    ///
    /// # Returns
    /// * `Ok(text)` - The service produced a reply
    /// * `Err(OracleError)` - Transport, quota or availability failure
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        "oracle"
    }
}

#[async_trait]
impl<T: GenerativeOracle + ?Sized> GenerativeOracle for std::sync::Arc<T> {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        (**self).complete(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CallKind;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl GenerativeOracle for Echo {
        async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
            Ok(request.prompt)
        }
    }

    #[tokio::test]
    async fn test_arc_forwards_to_inner() {
        let oracle: Arc<dyn GenerativeOracle> = Arc::new(Echo);
        let reply = oracle
            .complete(OracleRequest::new(CallKind::Vote, "1"))
            .await
            .unwrap();

        assert_eq!(reply, "1");
        assert_eq!(oracle.name(), "oracle");
    }
}
