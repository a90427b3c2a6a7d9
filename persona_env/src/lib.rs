//! Persona Engine Environment Abstraction Layer
//!
//! This crate isolates everything the reaction engine cannot control on its
//! own, so that the aggregation and simulation code can run against both a
//! live generative service and a deterministic test double:
//! - Judgments and text (`GenerativeOracle::complete()`)
//! - Randomness (`RandomSource`)
//!
//! By drawing all simulation entropy from one seedable source, any virality
//! or bootstrap result becomes reproducible from its seed number.
//!
//! # Example
//!
//! ```ignore
//! use persona_env::{CallKind, GenerativeOracle, OracleRequest, RandomSource};
//!
//! async fn vote<O: GenerativeOracle + ?Sized>(oracle: &O, rng: &mut dyn RandomSource) {
//!     let request = OracleRequest::new(CallKind::Vote, "Pick 0 or 1");
//!     let reply = oracle.complete(request).await;
//!     let jitter = rng.uniform(0.8, 1.2);
//! }
//! ```

mod oracle;
mod random;
mod types;
mod error;
mod entropy;

pub use oracle::GenerativeOracle;
pub use random::RandomSource;
pub use types::{CallKind, OracleRequest, RunId};
pub use error::OracleError;
pub use entropy::EntropySource;
