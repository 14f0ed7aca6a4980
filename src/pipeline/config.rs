use crate::config::SpecmineConfig;
use crate::inventory::ScanConfig;
use crate::source::{SourceLocation, DEFAULT_CLONE_TIMEOUT};
use crate::stack::DEFAULT_MIN_CONFIDENCE;
use crate::state::DEFAULT_BEAN_INTERVAL;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for a single pipeline run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: SourceLocation,
    pub output_dir: PathBuf,
    pub resume: bool,
    pub fail_on_coverage_gaps: bool,
    pub bean_interval: u64,
    pub min_confidence: f64,
    pub scan: ScanConfig,
    pub clone_timeout: Duration,
    /// Enrichment requests per minute; 0 means unthrottled
    pub enrich_requests_per_minute: u32,
}

impl RunConfig {
    pub fn new(source: SourceLocation, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
            resume: false,
            fail_on_coverage_gaps: false,
            bean_interval: DEFAULT_BEAN_INTERVAL,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            scan: ScanConfig::default(),
            clone_timeout: DEFAULT_CLONE_TIMEOUT,
            enrich_requests_per_minute: 60,
        }
    }

    /// Run settings seeded from the process-wide configuration
    pub fn from_settings(
        source: SourceLocation,
        output_dir: impl Into<PathBuf>,
        settings: &SpecmineConfig,
    ) -> Self {
        Self::new(source, output_dir)
            .with_fail_on_coverage_gaps(settings.fail_on_coverage_gaps)
            .with_bean_interval(settings.bean_interval)
            .with_min_confidence(settings.min_confidence)
            .with_scan(
                ScanConfig::default()
                    .with_max_file_size(settings.max_file_size)
                    .with_max_files(settings.max_files),
            )
            .with_clone_timeout(settings.clone_timeout())
            .with_enrich_requests_per_minute(settings.enrich_requests_per_minute)
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_fail_on_coverage_gaps(mut self, fail: bool) -> Self {
        self.fail_on_coverage_gaps = fail;
        self
    }

    pub fn with_bean_interval(mut self, interval: u64) -> Self {
        self.bean_interval = interval.max(1);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_clone_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = timeout;
        self
    }

    pub fn with_enrich_requests_per_minute(mut self, requests: u32) -> Self {
        self.enrich_requests_per_minute = requests;
        self
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.output_dir.join(super::ARTIFACT_DIR)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.output_dir.join(super::REPORTS_DIR)
    }

    pub fn state_path(&self) -> PathBuf {
        state_path(&self.output_dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Checkpoint file of the run that wrote into `output_dir`
pub fn state_path(output_dir: &Path) -> PathBuf {
    output_dir.join(super::ARTIFACT_DIR).join(super::STATE_FILE)
}
