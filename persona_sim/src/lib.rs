//! Persona Engine Deterministic Simulation Harness
//!
//! Runs the whole reaction pipeline against a scripted oracle so that every
//! run is reproducible from one 64-bit seed.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Oracle replies**: `ScriptedOracle` draws each reply from a stream keyed
//!   by the seed and the request, so completion order does not matter
//! - **Simulator randomness**: diffusion jitter and bootstrap resampling come
//!   from `SimContext`, a seeded ChaCha8 stream
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                       │
//! │  ┌────────────────┐        ┌──────────────────────────┐  │
//! │  │ ScriptedOracle │◄───────│ persona_core::Pipeline   │  │
//! │  │ (profile, seed)│        │ profile → react → report │  │
//! │  └────────────────┘        └────────────▲─────────────┘  │
//! │                                         │                │
//! │                              ┌──────────┴──────────┐     │
//! │                              │ SimContext (ChaCha8)│     │
//! │                              └─────────────────────┘     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use persona_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42, 3).run(ScenarioId::Polarizing).await;
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod oracle;
mod exporter;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use error::SimError;
pub use exporter::RunExport;
pub use oracle::{OracleProfile, OracleStats, ScriptedOracle};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
