//! Output formatting for run results and checkpoint status
//!
//! JSON and YAML emit the underlying records unchanged; the human format renders
//! summary tables with `comfy-table`.

use anyhow::{Context, Result};
use comfy_table::Table;
use std::path::Path;

use crate::pipeline::PipelineResult;
use crate::state::PipelineState;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Summary tables
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result of `specmine run`
    pub fn format_result(&self, result: &PipelineResult, output_dir: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(result).context("Failed to serialize run result to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(result).context("Failed to serialize run result to YAML")
            }
            OutputFormat::Human => Ok(self.format_result_human(result, output_dir)),
        }
    }

    /// Formats the checkpoint state shown by `specmine status`
    pub fn format_status(&self, state: &PipelineState, state_path: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(state).context("Failed to serialize state to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(state).context("Failed to serialize state to YAML")
            }
            OutputFormat::Human => Ok(self.format_status_human(state, state_path)),
        }
    }

    fn format_result_human(&self, result: &PipelineResult, output_dir: &Path) -> String {
        let mut output = String::new();

        let header = match (result.success, result.coverage_passed) {
            (true, true) => "\u{2713} Analysis complete",
            (true, false) => "\u{26A0} Analysis complete, coverage gates failed",
            (false, _) => "\u{2717} Analysis failed",
        };
        output.push_str(header);
        output.push('\n');
        output.push_str(RULE);
        output.push_str("\n\n");

        let mut table = Table::new();
        table.set_header(vec!["Item", "Value"]);
        table.add_row(vec!["Documents".to_string(), result.document_count.to_string()]);
        table.add_row(vec!["Gaps".to_string(), result.gap_count.to_string()]);
        table.add_row(vec![
            "Coverage gates".to_string(),
            if result.coverage_passed { "passed" } else { "failed" }.to_string(),
        ]);
        if !result.skipped_stages.is_empty() {
            let skipped: Vec<&str> = result.skipped_stages.iter().map(|s| s.as_str()).collect();
            table.add_row(vec!["Resumed past".to_string(), skipped.join(", ")]);
        }
        if let Some(stage) = result.error_stage {
            table.add_row(vec![
                "Failed stage".to_string(),
                format!("{} ({})", stage, stage.title()),
            ]);
        }
        if let Some(message) = &result.error_message {
            table.add_row(vec!["Error".to_string(), message.clone()]);
        }
        output.push_str(&table.to_string());
        output.push_str("\n\n");

        if result.success {
            output.push_str(&format!(
                "Reports:   {}\n",
                output_dir.join(crate::pipeline::REPORTS_DIR).display()
            ));
            output.push_str(&format!("Documents: {}\n", output_dir.join("docs").display()));
        } else {
            output.push_str("Re-run with --resume to continue from the failed stage.\n");
        }

        output
    }

    fn format_status_human(&self, state: &PipelineState, state_path: &Path) -> String {
        let mut output = String::new();
        output.push_str(&format!("Pipeline state: {}\n", state_path.display()));
        output.push_str(RULE);
        output.push_str("\n\n");

        let mut table = Table::new();
        table.set_header(vec!["Stage", "Title", "Status", "Completed"]);
        for record in &state.stages {
            table.add_row(vec![
                record.name.to_string(),
                record.name.title().to_string(),
                if record.is_done() { "done" } else { "pending" }.to_string(),
                record
                    .completed_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        output.push_str(&table.to_string());
        output.push_str("\n\n");

        output.push_str(&format!("Started:         {}\n", state.started_at.to_rfc3339()));
        if let Some(checkpoint) = state.last_checkpoint {
            output.push_str(&format!("Last checkpoint: {}\n", checkpoint.to_rfc3339()));
        }
        output.push_str(&format!("Documents done:  {}\n", state.bean_count));
        match state.stages.iter().find(|s| !s.is_done()) {
            Some(next) => output.push_str(&format!(
                "Next stage:      {} ({})\n",
                next.name,
                next.name.title()
            )),
            None => output.push_str("All stages complete\n"),
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{StageId, StageStatus};
    use chrono::Utc;

    fn successful_result() -> PipelineResult {
        PipelineResult {
            success: true,
            coverage_passed: false,
            document_count: 57,
            gap_count: 15,
            error_stage: None,
            error_message: None,
            skipped_stages: vec![StageId::A, StageId::B],
        }
    }

    fn failed_result() -> PipelineResult {
        PipelineResult {
            success: false,
            coverage_passed: false,
            document_count: 0,
            gap_count: 0,
            error_stage: Some(StageId::B),
            error_message: Some("Inventory scan failed".to_string()),
            skipped_stages: vec![],
        }
    }

    fn partial_state() -> PipelineState {
        let mut state = PipelineState::fresh(&StageId::ALL);
        state.stages[0].status = StageStatus::Done;
        state.stages[0].completed_at = Some(Utc::now());
        state.bean_count = 20;
        state
    }

    #[test]
    fn test_json_result() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_result(&successful_result(), Path::new("out")).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["document_count"], 57);
        assert_eq!(parsed["coverage_passed"], false);
        assert_eq!(parsed["skipped_stages"], serde_json::json!(["A", "B"]));
        assert!(parsed["error_stage"].is_null());
    }

    #[test]
    fn test_yaml_result() {
        let formatter = OutputFormatter::new(OutputFormat::Yaml);
        let output = formatter.format_result(&failed_result(), Path::new("out")).unwrap();

        let parsed: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(parsed["error_stage"], serde_yaml::Value::from("B"));
    }

    #[test]
    fn test_human_result() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter
            .format_result(&successful_result(), Path::new("out"))
            .unwrap();

        assert!(output.contains("coverage gates failed"));
        assert!(output.contains("Documents"));
        assert!(output.contains("57"));
        assert!(output.contains("A, B"));
        assert!(output.contains("reports"));
    }

    #[test]
    fn test_human_failed_result() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_result(&failed_result(), Path::new("out")).unwrap();

        assert!(output.contains("Analysis failed"));
        assert!(output.contains("Inventory scan"));
        assert!(output.contains("--resume"));
    }

    #[test]
    fn test_human_status() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter
            .format_status(&partial_state(), Path::new("out/.specmine/state.json"))
            .unwrap();

        assert!(output.contains("Clone repository"));
        assert!(output.contains("done"));
        assert!(output.contains("pending"));
        assert!(output.contains("Next stage:      B"));
        assert!(output.contains("Documents done:  20"));
    }

    #[test]
    fn test_json_status_round_trips() {
        let state = partial_state();
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_status(&state, Path::new("state.json")).unwrap();

        let parsed: PipelineState = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, state);
    }
}
