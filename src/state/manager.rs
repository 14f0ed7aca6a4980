use super::{StageId, StageStatus};
use crate::util::fs::write_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_BEAN_INTERVAL: u64 = 10;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize pipeline state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Unknown stage {0}")]
    UnknownStage(StageId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: StageId,
    pub status: StageStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StageRecord {
    fn pending(name: StageId) -> Self {
        Self {
            name,
            status: StageStatus::Pending,
            completed_at: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == StageStatus::Done
    }
}

/// Persisted progress of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub stages: Vec<StageRecord>,
    /// Last checkpointed unit of work inside the current stage
    pub bean_count: u64,
    pub started_at: DateTime<Utc>,
    pub last_checkpoint: Option<DateTime<Utc>>,
}

impl PipelineState {
    pub fn fresh(stage_names: &[StageId]) -> Self {
        Self {
            stages: stage_names.iter().copied().map(StageRecord::pending).collect(),
            bean_count: 0,
            started_at: Utc::now(),
            last_checkpoint: None,
        }
    }

    pub fn stage(&self, name: StageId) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn completed_stages(&self) -> impl Iterator<Item = StageId> + '_ {
        self.stages.iter().filter(|s| s.is_done()).map(|s| s.name)
    }
}

const REQUIRED_KEYS: &[&str] = &["stages", "bean_count", "started_at", "last_checkpoint"];
const REQUIRED_STAGE_KEYS: &[&str] = &["name", "status", "completed_at"];

/// Parse and validate a persisted state document.
///
/// Every key must be present (including nullable ones), every value must have the
/// right type, and the stage list must be exactly `expected` in order.
fn parse_state(content: &str, expected: &[StageId]) -> Result<PipelineState, String> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;

    let object = value.as_object().ok_or("state is not a JSON object")?;
    for key in REQUIRED_KEYS {
        if !object.contains_key(*key) {
            return Err(format!("missing key '{}'", key));
        }
    }

    let stages = object["stages"].as_array().ok_or("'stages' is not an array")?;
    for (i, stage) in stages.iter().enumerate() {
        let stage = stage
            .as_object()
            .ok_or_else(|| format!("stage #{} is not an object", i))?;
        for key in REQUIRED_STAGE_KEYS {
            if !stage.contains_key(*key) {
                return Err(format!("stage #{} missing key '{}'", i, key));
            }
        }
    }

    let state: PipelineState =
        serde_json::from_value(value).map_err(|e| format!("invalid state: {}", e))?;

    let names: Vec<StageId> = state.stages.iter().map(|s| s.name).collect();
    if names != expected {
        return Err(format!("stage list {:?} does not match {:?}", names, expected));
    }

    for stage in &state.stages {
        if stage.is_done() != stage.completed_at.is_some() {
            return Err(format!(
                "stage {} has status {:?} but completed_at {:?}",
                stage.name, stage.status, stage.completed_at
            ));
        }
    }

    Ok(state)
}

/// Owns the pipeline state file and every write to it
pub struct StateManager {
    path: PathBuf,
    stage_names: Vec<StageId>,
    bean_interval: u64,
    state: PipelineState,
}

impl StateManager {
    pub fn new(path: impl Into<PathBuf>, stage_names: &[StageId]) -> Self {
        Self {
            path: path.into(),
            stage_names: stage_names.to_vec(),
            bean_interval: DEFAULT_BEAN_INTERVAL,
            state: PipelineState::fresh(stage_names),
        }
    }

    pub fn with_bean_interval(mut self, interval: u64) -> Self {
        self.bean_interval = interval.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bean_interval(&self) -> u64 {
        self.bean_interval
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Start over with every stage pending and persist immediately.
    pub fn initialize(&mut self, stage_names: &[StageId]) -> Result<(), StateError> {
        self.stage_names = stage_names.to_vec();
        self.state = PipelineState::fresh(stage_names);
        info!(path = %self.path.display(), stages = stage_names.len(), "Initialized pipeline state");
        self.save()
    }

    pub fn save(&mut self) -> Result<(), StateError> {
        self.state.last_checkpoint = Some(Utc::now());
        let data = serde_json::to_vec_pretty(&self.state)?;
        write_atomic(&self.path, &data).map_err(|source| StateError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), bean_count = self.state.bean_count, "Checkpoint saved");
        Ok(())
    }

    /// Restore state from disk.
    ///
    /// Returns `false` and resets to a fresh in-memory state when the file is
    /// missing, unreadable, or structurally invalid.
    pub fn load(&mut self) -> bool {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "State file unreadable, starting fresh");
                }
                self.state = PipelineState::fresh(&self.stage_names);
                return false;
            }
        };

        match parse_state(&content, &self.stage_names) {
            Ok(state) => {
                info!(
                    path = %self.path.display(),
                    completed = state.completed_stages().count(),
                    bean_count = state.bean_count,
                    "Loaded pipeline state"
                );
                self.state = state;
                true
            }
            Err(reason) => {
                warn!(path = %self.path.display(), reason = %reason, "Discarding corrupt state file");
                self.state = PipelineState::fresh(&self.stage_names);
                false
            }
        }
    }

    pub fn complete_stage(&mut self, name: StageId) -> Result<(), StateError> {
        let record = self
            .state
            .stages
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or(StateError::UnknownStage(name))?;
        record.status = StageStatus::Done;
        record.completed_at = Some(Utc::now());
        self.save()
    }

    pub fn is_stage_done(&self, name: StageId) -> bool {
        self.state.stage(name).map(|s| s.is_done()).unwrap_or(false)
    }

    pub fn next_pending_stage(&self) -> Option<StageId> {
        self.state
            .stages
            .iter()
            .find(|s| !s.is_done())
            .map(|s| s.name)
    }

    /// Note that bean `number` finished. Every `bean_interval` beans the count is
    /// checkpointed to disk; returns whether this call saved.
    pub fn record_bean(&mut self, number: u64) -> Result<bool, StateError> {
        if number % self.bean_interval != 0 || number <= self.state.bean_count {
            return Ok(false);
        }
        self.state.bean_count = number;
        self.save()?;
        Ok(true)
    }

    /// True for every bean at or below the last checkpoint.
    pub fn should_skip_bean(&self, number: u64) -> bool {
        number <= self.state.bean_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use yare::parameterized;

    fn manager(dir: &TempDir) -> StateManager {
        StateManager::new(dir.path().join("state.json"), &StageId::ALL)
    }

    #[test]
    fn test_initialize_persists_pending_stages() {
        let temp = TempDir::new().unwrap();
        let mut state = manager(&temp);
        state.initialize(&StageId::ALL).unwrap();

        assert!(state.path().exists());
        assert_eq!(state.state().stages.len(), 7);
        assert!(state.state().stages.iter().all(|s| !s.is_done()));
        assert_eq!(state.next_pending_stage(), Some(StageId::A));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut state = manager(&temp).with_bean_interval(5);
        state.initialize(&StageId::ALL).unwrap();
        state.complete_stage(StageId::A).unwrap();
        state.complete_stage(StageId::B).unwrap();
        state.record_bean(5).unwrap();

        let mut restored = manager(&temp);
        assert!(restored.load());
        assert_eq!(restored.state(), state.state());
        assert_eq!(restored.next_pending_stage(), Some(StageId::C));
    }

    #[test]
    fn test_load_missing_file_starts_fresh() {
        let temp = TempDir::new().unwrap();
        let mut state = manager(&temp);
        assert!(!state.load());
        assert_eq!(state.state().bean_count, 0);
        assert!(state.state().stages.iter().all(|s| !s.is_done()));
    }

    fn corrupt(content: &str) {
        let temp = TempDir::new().unwrap();
        let mut original = manager(&temp);
        original.initialize(&StageId::ALL).unwrap();
        original.complete_stage(StageId::A).unwrap();
        original.record_bean(10).unwrap();

        fs::write(original.path(), content).unwrap();

        let mut restored = manager(&temp);
        assert!(!restored.load());
        assert_eq!(restored.state().bean_count, 0);
        assert!(restored.state().stages.iter().all(|s| !s.is_done()));
        assert_eq!(restored.state().stages.len(), StageId::ALL.len());
    }

    const TS: &str = "2026-01-01T00:00:00Z";

    fn stages_json(status_a: &str, completed_a: &str) -> String {
        let rest: Vec<String> = StageId::ALL[1..]
            .iter()
            .map(|s| format!(r#"{{"name":"{}","status":"pending","completed_at":null}}"#, s))
            .collect();
        format!(
            r#"[{{"name":"A","status":"{}","completed_at":{}}},{}]"#,
            status_a,
            completed_a,
            rest.join(",")
        )
    }

    #[test]
    fn test_invalid_status_resets() {
        corrupt(&format!(
            r#"{{"stages":{},"bean_count":10,"started_at":"{}","last_checkpoint":"{}"}}"#,
            stages_json("running", &format!("\"{}\"", TS)),
            TS,
            TS
        ));
    }

    #[test]
    fn test_wrong_type_resets() {
        corrupt(&format!(
            r#"{{"stages":{},"bean_count":"ten","started_at":"{}","last_checkpoint":"{}"}}"#,
            stages_json("done", &format!("\"{}\"", TS)),
            TS,
            TS
        ));
    }

    #[test]
    fn test_missing_key_resets() {
        corrupt(&format!(
            r#"{{"stages":{},"started_at":"{}","last_checkpoint":"{}"}}"#,
            stages_json("done", &format!("\"{}\"", TS)),
            TS,
            TS
        ));
    }

    #[test]
    fn test_missing_nullable_key_resets() {
        corrupt(&format!(
            r#"{{"stages":{},"bean_count":3,"started_at":"{}"}}"#,
            stages_json("done", &format!("\"{}\"", TS)),
            TS
        ));
    }

    #[test]
    fn test_done_without_timestamp_resets() {
        corrupt(&format!(
            r#"{{"stages":{},"bean_count":3,"started_at":"{}","last_checkpoint":null}}"#,
            stages_json("done", "null"),
            TS
        ));
    }

    #[test]
    fn test_truncated_file_resets() {
        corrupt(r#"{"stages":[{"name":"A","#);
    }

    #[test]
    fn test_unknown_stage_list_resets() {
        corrupt(&format!(
            r#"{{"stages":[{{"name":"A","status":"pending","completed_at":null}}],"bean_count":0,"started_at":"{}","last_checkpoint":null}}"#,
            TS
        ));
    }

    #[test]
    fn test_valid_handwritten_state_loads() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs::write(
            &path,
            format!(
                r#"{{"stages":{},"bean_count":20,"started_at":"{}","last_checkpoint":"{}"}}"#,
                stages_json("done", &format!("\"{}\"", TS)),
                TS,
                TS
            ),
        )
        .unwrap();

        let mut state = StateManager::new(path, &StageId::ALL);
        assert!(state.load());
        assert!(state.is_stage_done(StageId::A));
        assert!(!state.is_stage_done(StageId::B));
        assert_eq!(state.state().bean_count, 20);
    }

    #[test]
    fn test_bean_checkpoint_every_interval() {
        let temp = TempDir::new().unwrap();
        let mut state = manager(&temp).with_bean_interval(10);
        state.initialize(&StageId::ALL).unwrap();
        let before = fs::read(state.path()).unwrap();

        for bean in 1..=9 {
            assert!(!state.record_bean(bean).unwrap());
        }
        assert_eq!(fs::read(state.path()).unwrap(), before);
        assert_eq!(state.state().bean_count, 0);

        assert!(state.record_bean(10).unwrap());
        let mut restored = manager(&temp);
        assert!(restored.load());
        assert_eq!(restored.state().bean_count, 10);
    }

    #[parameterized(
        every_bean = { 1 },
        small = { 3 },
        default = { 10 },
        large = { 25 },
    )]
    fn test_should_skip_bean_matches_checkpoint(interval: u64) {
        let temp = TempDir::new().unwrap();
        let mut state = manager(&temp).with_bean_interval(interval);
        state.initialize(&StageId::ALL).unwrap();

        for bean in 1..=57 {
            state.record_bean(bean).unwrap();
        }

        let checkpoint = state.state().bean_count;
        assert_eq!(checkpoint, 57 / interval * interval);
        for n in 0..=100 {
            assert_eq!(state.should_skip_bean(n), n <= checkpoint, "bean {}", n);
        }
    }

    #[test]
    fn test_complete_stage_saves_immediately() {
        let temp = TempDir::new().unwrap();
        let mut state = manager(&temp);
        state.initialize(&StageId::ALL).unwrap();
        state.complete_stage(StageId::A).unwrap();

        let mut restored = manager(&temp);
        assert!(restored.load());
        assert!(restored.is_stage_done(StageId::A));
        assert!(restored.state().stage(StageId::A).unwrap().completed_at.is_some());
    }

    #[test]
    #[cfg(unix)]
    fn test_save_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let mut state = StateManager::new(blocker.join("state.json"), &StageId::ALL);
        assert!(matches!(
            state.initialize(&StageId::ALL),
            Err(StateError::Write { .. })
        ));
    }
}
