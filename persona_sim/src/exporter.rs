//! JSON exporter for finished scenario runs.
//!
//! Writes the full pipeline output of one run next to its pass/fail verdict
//! so a report can be inspected or diffed offline.

use crate::error::SimError;
use crate::runner::{ScenarioMetrics, ScenarioResult};
use persona_core::PipelineOutcome;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Complete run export.
#[derive(Debug, Clone, Serialize)]
pub struct RunExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Final verdict
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    pub metrics: ScenarioMetrics,

    /// Segments, personas, reactions and the insight report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PipelineOutcome>,
}

impl RunExport {
    /// Creates an export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            passed: false,
            failure_reason: None,
            metrics: ScenarioMetrics::default(),
            outcome: None,
        }
    }

    /// Fills the export from a finished run.
    pub fn from_result(result: &ScenarioResult) -> Self {
        let mut export = Self::new(result.scenario.name(), result.seed);
        export.finalize(result.passed, result.failure_reason.clone());
        export.metrics = result.metrics.clone();
        export.outcome = result.outcome.clone();
        export
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScenarioRunner;
    use crate::scenarios::ScenarioId;

    #[tokio::test]
    async fn test_export_writes_report() {
        let result = ScenarioRunner::new(42, 1)
            .with_chat_turns(1)
            .with_determinism_check(false)
            .run(ScenarioId::Viral)
            .await;
        let export = RunExport::from_result(&result);
        let path = std::env::temp_dir().join(format!("persona_sim_export_{}.json", std::process::id()));
        export.write_to_file(&path).unwrap();

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written["scenario"], "viral");
        assert_eq!(written["seed"], 42);
        assert_eq!(written["passed"], result.passed);
        assert!(written["outcome"]["report"]["sentiment_distribution"].is_object());
        assert!(written.get("failure_reason").is_none() || !result.passed);
    }

    #[test]
    fn test_aborted_run_omits_outcome() {
        let mut export = RunExport::new("baseline", 1);
        export.finalize(false, Some("No reactions to aggregate".into()));
        let json = serde_json::to_value(&export).unwrap();
        assert!(json.get("outcome").is_none());
        assert_eq!(json["failure_reason"], "No reactions to aggregate");
    }

    #[test]
    fn test_unwritable_path_is_an_io_error() {
        let export = RunExport::new("baseline", 1);
        let err = export
            .write_to_file("/nonexistent-dir/for/sure/export.json")
            .unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
