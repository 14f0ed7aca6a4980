use super::config::RunConfig;
use super::context::{Evaluation, RunContext, Services, StageEvents};
use super::phases;
use super::reports;
use crate::analyzers::AnalyzerRegistry;
use crate::coverage::CoverageEvaluator;
use crate::docs::{DocumentWriter, MarkdownWriter};
use crate::enrich::Enricher;
use crate::gaps::GapAnalyzer;
use crate::inventory::{FsScanner, InventoryScanner};
use crate::progress::{LoggingHandler, ProgressHandler};
use crate::source::{Cloner, GitCloner};
use crate::stack::DetectorRegistry;
use crate::state::{StageId, StateError, StateManager};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

/// Errors that abort a run outright rather than failing a stage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to persist pipeline state: {0}")]
    State(#[from] StateError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub success: bool,
    pub coverage_passed: bool,
    pub document_count: usize,
    pub gap_count: usize,
    pub error_stage: Option<StageId>,
    pub error_message: Option<String>,
    /// Stages skipped because a previous run completed them
    pub skipped_stages: Vec<StageId>,
}

impl PipelineResult {
    fn failed(stage: StageId, message: String, skipped_stages: Vec<StageId>) -> Self {
        Self {
            success: false,
            coverage_passed: false,
            document_count: 0,
            gap_count: 0,
            error_stage: Some(stage),
            error_message: Some(message),
            skipped_stages,
        }
    }
}

pub struct Pipeline {
    config: RunConfig,
    services: Services,
    progress: Arc<dyn ProgressHandler>,
}

impl Pipeline {
    /// Pipeline with the default collaborators: git cloning, filesystem scanning,
    /// built-in detectors and analyzers, markdown documents, no enrichment.
    pub fn new(config: RunConfig) -> Self {
        let services = Services {
            cloner: Box::new(GitCloner::new().with_timeout(config.clone_timeout)),
            scanner: Box::new(FsScanner),
            detectors: DetectorRegistry::with_defaults(),
            analyzers: AnalyzerRegistry::with_defaults(),
            enricher: None,
            writer: Box::new(MarkdownWriter::new(config.output_dir.clone())),
            coverage: CoverageEvaluator::new(),
            gaps: GapAnalyzer::with_defaults(),
        };
        Self {
            config,
            services,
            progress: Arc::new(LoggingHandler),
        }
    }

    pub fn with_cloner(mut self, cloner: Box<dyn Cloner>) -> Self {
        self.services.cloner = cloner;
        self
    }

    pub fn with_scanner(mut self, scanner: Box<dyn InventoryScanner>) -> Self {
        self.services.scanner = scanner;
        self
    }

    pub fn with_detectors(mut self, detectors: DetectorRegistry) -> Self {
        self.services.detectors = detectors;
        self
    }

    pub fn with_analyzers(mut self, analyzers: AnalyzerRegistry) -> Self {
        self.services.analyzers = analyzers;
        self
    }

    pub fn with_enricher(mut self, enricher: Box<dyn Enricher>) -> Self {
        self.services.enricher = Some(enricher);
        self
    }

    pub fn with_writer(mut self, writer: Box<dyn DocumentWriter>) -> Self {
        self.services.writer = writer;
        self
    }

    pub fn with_coverage_evaluator(mut self, coverage: CoverageEvaluator) -> Self {
        self.services.coverage = coverage;
        self
    }

    pub fn with_gap_analyzer(mut self, gaps: GapAnalyzer) -> Self {
        self.services.gaps = gaps;
        self
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = handler;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every stage in order.
    ///
    /// A stage failure is reported in the returned [`PipelineResult`]; only state
    /// persistence failures come back as `Err`.
    pub async fn run(&self) -> Result<PipelineResult, PipelineError> {
        let start = Instant::now();
        let events = StageEvents::new(self.progress.as_ref());

        info!(
            source = %self.config.source,
            output = %self.config.output_dir.display(),
            resume = self.config.resume,
            "Starting pipeline"
        );

        let mut state = StateManager::new(self.config.state_path(), &StageId::ALL)
            .with_bean_interval(self.config.bean_interval);
        if self.config.resume && state.load() {
            info!(
                next_stage = ?state.next_pending_stage(),
                bean_count = state.state().bean_count,
                "Resuming from saved state"
            );
        } else {
            state.initialize(&StageId::ALL)?;
        }

        let mut context = RunContext::new(&self.config, &self.services, &mut state, events);
        let mut skipped_stages = Vec::new();

        for phase in phases::all() {
            let stage = phase.stage();

            if self.config.resume && context.state.is_stage_done(stage) {
                events.skipped(stage);
                skipped_stages.push(stage);
                continue;
            }

            events.started(stage);
            let stage_start = Instant::now();

            match phase.execute(&mut context).await {
                Ok(()) => {
                    context.state.complete_stage(stage)?;
                    events.completed(stage, stage_start.elapsed());
                }
                Err(err) => {
                    let err = match err.downcast::<StateError>() {
                        Ok(state_err) => {
                            events.failed(stage, state_err.to_string());
                            return Err(PipelineError::State(state_err));
                        }
                        Err(err) => err,
                    };
                    let message = format!("{:#}", err);
                    error!(stage = %stage, error = %message, "Stage failed, aborting run");
                    events.failed(stage, message.clone());
                    return Ok(PipelineResult::failed(stage, message, skipped_stages));
                }
            }
        }

        let (evaluation, document_count) = match summarize(&mut context) {
            Ok(summary) => summary,
            Err(err) => {
                let message = format!("{:#}", err);
                events.failed(StageId::F, message.clone());
                return Ok(PipelineResult::failed(StageId::F, message, skipped_stages));
            }
        };

        let coverage_passed = !self.config.fail_on_coverage_gaps || evaluation.coverage.passed;
        info!(
            documents = document_count,
            gaps = evaluation.gaps.len(),
            coverage_passed,
            elapsed_ms = start.elapsed().as_millis(),
            "Pipeline complete"
        );

        Ok(PipelineResult {
            success: true,
            coverage_passed,
            document_count,
            gap_count: evaluation.gaps.len(),
            error_stage: None,
            error_message: None,
            skipped_stages,
        })
    }
}

/// Stage F results and the document count, from this run or the previous one
fn summarize(context: &mut RunContext<'_>) -> anyhow::Result<(Evaluation, usize)> {
    let document_count = context.documents.get(&context.artifacts)?.len();
    let evaluation = match context.evaluation.take() {
        Some(evaluation) => evaluation,
        None => reports::load_evaluation(&context.config.reports_dir())?,
    };
    Ok((evaluation, document_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::EnrichError;
    use crate::inventory::{Inventory, ScanConfig, ScanError};
    use crate::progress::{CollectingHandler, PipelineEvent};
    use crate::source::{CloneError, CloneOutcome, SourceLocation};
    use crate::surface::{Surface, SurfaceType};
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    const REMOTE: &str = "https://example.com/shop.git";

    fn write_fixture(root: &Path) {
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(
            root.join("package.json"),
            r#"{"name": "shop", "dependencies": {"express": "^4.18.0"}}"#,
        )
        .unwrap();
        fs::write(
            root.join("src/server.js"),
            "const express = require('express');\n\
             const cors = require('cors');\n\
             const app = express();\n\
             app.use(cors());\n\
             app.get('/api/users', listUsers);\n\
             app.post('/api/users', createUser);\n\
             app.get('/health', (req, res) => res.send('ok'));\n\
             app.listen(process.env.PORT);\n",
        )
        .unwrap();
        fs::write(root.join(".env.example"), "PORT=3000\nDATABASE_URL=\n").unwrap();
    }

    struct CountingCloner {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Cloner for CountingCloner {
        async fn clone_repo(
            &self,
            _url: &str,
            _git_ref: Option<&str>,
            workdir: &Path,
        ) -> Result<CloneOutcome, CloneError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let repo = workdir.join("repo");
            write_fixture(&repo);
            Ok(CloneOutcome::local(repo))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    /// Fails the first scan it is asked for, then behaves like `FsScanner`
    struct FlakyScanner {
        fail_next: Arc<AtomicBool>,
    }

    impl InventoryScanner for FlakyScanner {
        fn scan(&self, workdir: &Path, config: &ScanConfig) -> Result<Inventory, ScanError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(ScanError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk went away",
                )));
            }
            FsScanner.scan(workdir, config)
        }
    }

    struct RejectingEnricher;

    #[async_trait]
    impl Enricher for RejectingEnricher {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn enrich(&self, _surface: &Surface) -> Result<Surface, EnrichError> {
            Err(EnrichError::Api {
                status: 429,
                body: "quota exhausted".to_string(),
            })
        }
    }

    struct Harness {
        _dir: TempDir,
        output: std::path::PathBuf,
        clone_calls: Arc<AtomicUsize>,
        fail_scan: Arc<AtomicBool>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let output = dir.path().join("out");
            Self {
                _dir: dir,
                output,
                clone_calls: Arc::new(AtomicUsize::new(0)),
                fail_scan: Arc::new(AtomicBool::new(false)),
            }
        }

        fn pipeline(&self, resume: bool) -> Pipeline {
            let config = RunConfig::new(SourceLocation::remote(REMOTE, None), &self.output)
                .with_resume(resume);
            Pipeline::new(config)
                .with_cloner(Box::new(CountingCloner {
                    calls: Arc::clone(&self.clone_calls),
                }))
                .with_scanner(Box::new(FlakyScanner {
                    fail_next: Arc::clone(&self.fail_scan),
                }))
        }

        fn surfaces(&self) -> Vec<Surface> {
            let raw = fs::read(self.output.join(".specmine/surfaces.json")).unwrap();
            serde_json::from_slice(&raw).unwrap()
        }

        fn state(&self) -> serde_json::Value {
            let raw = fs::read(self.output.join(".specmine/state.json")).unwrap();
            serde_json::from_slice(&raw).unwrap()
        }
    }

    #[tokio::test]
    async fn test_full_run_writes_documents_and_reports() {
        let harness = Harness::new();
        let handler = Arc::new(CollectingHandler::new());

        let result = harness
            .pipeline(false)
            .with_progress_handler(handler.clone())
            .run()
            .await
            .unwrap();

        assert!(result.success, "{:?}", result.error_message);
        assert!(result.coverage_passed);
        assert!(result.error_stage.is_none());
        assert!(result.skipped_stages.is_empty());

        let surfaces = harness.surfaces();
        assert!(surfaces.iter().any(|s| s.surface_type() == SurfaceType::Route));
        assert!(surfaces.iter().any(|s| s.surface_type() == SurfaceType::EnvVar));
        assert_eq!(result.document_count, surfaces.len());

        for name in ["coverage.json", "coverage.md", "gaps.json", "gaps.md", "traceability.md"] {
            assert!(harness.output.join("reports").join(name).is_file(), "{}", name);
        }
        assert!(harness.output.join("docs/route/ROUTE-001.md").is_file());

        let state = harness.state();
        for stage in state["stages"].as_array().unwrap() {
            assert_eq!(stage["status"], "done");
        }

        let events = handler.events();
        let completed: Vec<StageId> = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::StageCompleted { .. }))
            .map(|e| e.stage())
            .collect();
        assert_eq!(completed, StageId::ALL.to_vec());
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::Progress { stage: StageId::C, message } if message.starts_with("Routes: "))));
    }

    #[tokio::test]
    async fn test_failure_in_b_then_resume_skips_clone() {
        let harness = Harness::new();
        harness.fail_scan.store(true, Ordering::SeqCst);

        let first = harness.pipeline(false).run().await.unwrap();
        assert!(!first.success);
        assert_eq!(first.error_stage, Some(StageId::B));
        assert!(first.error_message.as_deref().unwrap().contains("disk went away"));
        assert_eq!(harness.clone_calls.load(Ordering::SeqCst), 1);

        let state = harness.state();
        assert_eq!(state["stages"][0]["status"], "done");
        assert_eq!(state["stages"][1]["status"], "pending");

        let second = harness.pipeline(true).run().await.unwrap();
        assert!(second.success, "{:?}", second.error_message);
        assert_eq!(second.skipped_stages, vec![StageId::A]);
        assert_eq!(harness.clone_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resume_with_missing_artifact_names_it() {
        let harness = Harness::new();
        harness.fail_scan.store(true, Ordering::SeqCst);
        harness.pipeline(false).run().await.unwrap();

        fs::remove_file(harness.output.join(".specmine/clone.json")).unwrap();

        let result = harness.pipeline(true).run().await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error_stage, Some(StageId::B));
        assert!(result.error_message.unwrap().contains("clone.json"));
    }

    #[tokio::test]
    async fn test_resume_after_complete_run_skips_everything() {
        let harness = Harness::new();
        let first = harness.pipeline(false).run().await.unwrap();

        let second = harness.pipeline(true).run().await.unwrap();
        assert!(second.success);
        assert_eq!(second.skipped_stages, StageId::ALL.to_vec());
        assert_eq!(second.document_count, first.document_count);
        assert_eq!(second.gap_count, first.gap_count);
        assert_eq!(harness.clone_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_resume_run_starts_over() {
        let harness = Harness::new();
        harness.pipeline(false).run().await.unwrap();

        let route_doc = harness.output.join("docs/route/ROUTE-001.md");
        fs::write(&route_doc, "# edited by hand\n").unwrap();

        let second = harness.pipeline(false).run().await.unwrap();
        assert!(second.success);
        assert!(second.skipped_stages.is_empty());
        assert_eq!(harness.clone_calls.load(Ordering::SeqCst), 2);
        let body = fs::read_to_string(&route_doc).unwrap();
        assert!(body.starts_with("# ROUTE-001: "), "{}", body);
    }

    fn env_doc_bodies(output: &Path) -> String {
        let mut bodies = String::new();
        for entry in fs::read_dir(output.join("docs/env_var")).unwrap() {
            bodies.push_str(&fs::read_to_string(entry.unwrap().path()).unwrap());
        }
        bodies
    }

    #[tokio::test]
    async fn test_fresh_run_documents_current_surfaces() {
        let harness = Harness::new();
        let repo = harness.output.parent().unwrap().join("local-repo");
        write_fixture(&repo);
        let config = RunConfig::new(SourceLocation::local(&repo), &harness.output);

        fs::write(repo.join(".env.example"), "ALPHA_TOKEN=\n").unwrap();
        assert!(Pipeline::new(config.clone()).run().await.unwrap().success);
        assert!(env_doc_bodies(&harness.output).contains("ALPHA_TOKEN"));

        fs::write(repo.join(".env.example"), "BETA_TOKEN=\n").unwrap();
        let result = Pipeline::new(config).run().await.unwrap();
        assert!(result.success, "{:?}", result.error_message);

        let bodies = env_doc_bodies(&harness.output);
        assert!(bodies.contains("BETA_TOKEN"), "{}", bodies);
        assert!(!bodies.contains("ALPHA_TOKEN"), "{}", bodies);
    }

    #[tokio::test]
    async fn test_checkpointed_beans_are_not_rewritten() {
        let harness = Harness::new();
        harness.pipeline(false).run().await.unwrap();
        let surfaces = harness.surfaces();
        assert!(surfaces.len() >= 2);

        // Pretend the run died during stage E after a checkpoint at bean 1
        let mut state = harness.state();
        for stage in state["stages"].as_array_mut().unwrap().iter_mut().skip(5) {
            stage["status"] = "pending".into();
            stage["completed_at"] = serde_json::Value::Null;
        }
        state["bean_count"] = 1.into();
        fs::write(
            harness.output.join(".specmine/state.json"),
            serde_json::to_vec_pretty(&state).unwrap(),
        )
        .unwrap();

        let documents: Vec<crate::docs::WrittenDocument> = serde_json::from_slice(
            &fs::read(harness.output.join(".specmine/documents.json")).unwrap(),
        )
        .unwrap();
        let first_doc = harness.output.join(&documents[0].path);
        let second_doc = harness.output.join(&documents[1].path);
        fs::remove_file(&first_doc).unwrap();
        fs::remove_file(&second_doc).unwrap();

        let result = harness.pipeline(true).run().await.unwrap();
        assert!(result.success);
        assert_eq!(result.skipped_stages.len(), 5);
        assert_eq!(result.document_count, surfaces.len());

        // Bean 1 is trusted as done, bean 2 is written again
        assert!(!first_doc.exists());
        assert!(second_doc.exists());
    }

    #[tokio::test]
    async fn test_coverage_gate_with_and_without_fail_flag() {
        let harness = Harness::new();
        let strict = CoverageEvaluator::new().with_threshold(SurfaceType::Route, 101.0);

        let lenient = harness
            .pipeline(false)
            .with_coverage_evaluator(strict.clone())
            .run()
            .await
            .unwrap();
        assert!(lenient.success);
        assert!(lenient.coverage_passed);

        let mut pipeline = harness.pipeline(false).with_coverage_evaluator(strict);
        pipeline.config.fail_on_coverage_gaps = true;
        let gated = pipeline.run().await.unwrap();
        assert!(gated.success);
        assert!(!gated.coverage_passed);
    }

    #[tokio::test]
    async fn test_enrichment_failures_do_not_fail_run() {
        let harness = Harness::new();
        let mut pipeline = harness.pipeline(false).with_enricher(Box::new(RejectingEnricher));
        pipeline.config.enrich_requests_per_minute = 0;

        let result = pipeline.run().await.unwrap();
        assert!(result.success);

        let outcomes: serde_json::Value = serde_json::from_slice(
            &fs::read(harness.output.join(".specmine/enrichment.json")).unwrap(),
        )
        .unwrap();
        let outcomes = outcomes.as_array().unwrap();
        assert_eq!(outcomes.len(), harness.surfaces().len());
        assert!(outcomes.iter().all(|o| o["status"] == "failed"));
    }

    #[tokio::test]
    async fn test_local_source_bypasses_cloner() {
        let harness = Harness::new();
        let repo = harness.output.parent().unwrap().join("local-repo");
        write_fixture(&repo);

        let config = RunConfig::new(SourceLocation::local(&repo), &harness.output);
        let result = Pipeline::new(config)
            .with_cloner(Box::new(CountingCloner {
                calls: Arc::clone(&harness.clone_calls),
            }))
            .run()
            .await
            .unwrap();

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(harness.clone_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_local_source_fails_stage_a() {
        let harness = Harness::new();
        let config = RunConfig::new(SourceLocation::local("/nonexistent/specmine-src"), &harness.output);

        let result = Pipeline::new(config).run().await.unwrap();
        assert_eq!(result.error_stage, Some(StageId::A));
    }

    #[tokio::test]
    async fn test_unwritable_state_is_an_error() {
        let harness = Harness::new();
        fs::create_dir_all(&harness.output).unwrap();
        // A file where the artifact directory should be
        fs::write(harness.output.join(".specmine"), "blocked").unwrap();

        let result = harness.pipeline(false).run().await;
        assert!(matches!(result, Err(PipelineError::State(_))));
    }
}
