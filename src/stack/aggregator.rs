use super::registry::{DetectionInput, DetectorRegistry};
use super::Signal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Combined view of every stack signal collected in a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackProfile {
    /// Stack name to combined confidence, only stacks at or above the threshold
    pub stacks: BTreeMap<String, f64>,
    pub evidence: BTreeMap<String, Vec<String>>,
    /// Every signal, including those for stacks that were filtered out
    pub signals: Vec<Signal>,
}

impl StackProfile {
    pub fn has(&self, stack: &str) -> bool {
        self.stacks.contains_key(stack)
    }

    pub fn has_any(&self, stacks: &[&str]) -> bool {
        stacks.iter().any(|s| self.has(s))
    }

    pub fn confidence(&self, stack: &str) -> Option<f64> {
        self.stacks.get(stack).copied()
    }

    /// Stacks ordered by descending confidence, then name
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<_> = self.stacks.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

pub struct StackAggregator {
    min_confidence: f64,
}

impl Default for StackAggregator {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl StackAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Run every registered detector and aggregate their signals.
    ///
    /// A detector that errors contributes nothing; the others still run.
    pub fn detect(&self, registry: &DetectorRegistry, input: &DetectionInput<'_>) -> StackProfile {
        let mut signals = Vec::new();

        for detector in registry.detectors() {
            match detector.detect(input) {
                Ok(found) => {
                    debug!(detector = detector.name(), signals = found.len(), "Detector finished");
                    signals.extend(found);
                }
                Err(e) => {
                    warn!(detector = detector.name(), error = %e, "Detector failed, ignoring its signals");
                }
            }
        }

        let profile = self.aggregate(signals);
        info!(
            stacks = profile.stacks.len(),
            signals = profile.signals.len(),
            "Stack detection complete"
        );
        profile
    }

    /// Combine signals additively per stack, capped at 1.0.
    pub fn aggregate(&self, signals: Vec<Signal>) -> StackProfile {
        let mut combined: BTreeMap<String, f64> = BTreeMap::new();
        let mut evidence: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for signal in &signals {
            let total = combined.entry(signal.stack_name().to_string()).or_insert(0.0);
            *total = round_confidence((*total + signal.confidence()).min(1.0));

            let paths = evidence.entry(signal.stack_name().to_string()).or_default();
            for path in signal.evidence() {
                if !paths.contains(path) {
                    paths.push(path.clone());
                }
            }
        }

        combined.retain(|name, confidence| {
            let keep = *confidence >= self.min_confidence;
            if !keep {
                debug!(stack = %name, confidence = *confidence, "Dropping stack below threshold");
            }
            keep
        });
        evidence.retain(|name, _| combined.contains_key(name));

        StackProfile {
            stacks: combined,
            evidence,
            signals,
        }
    }
}

/// Strip binary float noise so 0.4 + 0.3 reads back as 0.7
fn round_confidence(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Inventory;
    use crate::stack::Detector;
    use anyhow::Result;
    use std::path::{Path, PathBuf};

    fn signal(stack: &str, confidence: f64, evidence: &[&str]) -> Signal {
        Signal::new(stack, confidence, evidence.iter().copied()).unwrap()
    }

    #[test]
    fn test_independent_detectors_add_up() {
        let profile = StackAggregator::new().aggregate(vec![
            signal("react", 0.4, &["package.json"]),
            signal("react", 0.3, &["src/App.tsx"]),
        ]);

        assert_eq!(profile.stacks["react"], 0.7);
        assert_eq!(
            profile.evidence["react"],
            vec!["package.json".to_string(), "src/App.tsx".to_string()]
        );
    }

    #[test]
    fn test_combined_confidence_capped() {
        let profile = StackAggregator::new().aggregate(vec![
            signal("django", 0.9, &["manage.py"]),
            signal("django", 0.8, &["requirements.txt"]),
        ]);
        assert_eq!(profile.stacks["django"], 1.0);
    }

    #[test]
    fn test_confidence_never_decreases_or_exceeds_one() {
        let aggregator = StackAggregator::new().with_min_confidence(0.0);
        let confidences = [0.2, 0.05, 0.35, 0.0, 0.6, 0.15, 1.0, 0.3];
        let mut signals = Vec::new();
        let mut previous = 0.0;

        for (i, c) in confidences.iter().enumerate() {
            let file = format!("file{}.vue", i);
            signals.push(signal("vue", *c, &[file.as_str()]));
            let profile = aggregator.aggregate(signals.clone());
            let current = profile.stacks["vue"];
            assert!(current <= 1.0);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_evidence_deduplicated_across_signals() {
        let profile = StackAggregator::new().aggregate(vec![
            signal("express", 0.4, &["package.json", "server.js"]),
            signal("express", 0.4, &["server.js", "app.js"]),
        ]);
        assert_eq!(profile.evidence["express"], vec!["package.json", "server.js", "app.js"]);
    }

    #[test]
    fn test_below_threshold_dropped_but_audited() {
        let profile = StackAggregator::new().aggregate(vec![
            signal("react", 0.5, &["package.json"]),
            signal("svelte", 0.2, &["svelte.config.js"]),
        ]);

        assert!(profile.has("react"));
        assert!(!profile.has("svelte"));
        assert!(!profile.evidence.contains_key("svelte"));
        assert_eq!(profile.signals.len(), 2);
        assert!(profile.signals.iter().any(|s| s.stack_name() == "svelte"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let profile = StackAggregator::new().aggregate(vec![signal("rails", 0.3, &["Gemfile"])]);
        assert!(profile.has("rails"));

        let strict = StackAggregator::new()
            .with_min_confidence(0.5)
            .aggregate(vec![signal("rails", 0.3, &["Gemfile"])]);
        assert!(!strict.has("rails"));
    }

    #[test]
    fn test_ranked_order() {
        let profile = StackAggregator::new().aggregate(vec![
            signal("react", 0.5, &[]),
            signal("nextjs", 0.9, &[]),
            signal("express", 0.5, &[]),
        ]);
        let names: Vec<_> = profile.ranked().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["nextjs", "express", "react"]);
    }

    struct Static(Vec<Signal>);

    impl Detector for Static {
        fn name(&self) -> &str {
            "static"
        }

        fn detect(&self, _input: &DetectionInput<'_>) -> Result<Vec<Signal>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Detector for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn detect(&self, _input: &DetectionInput<'_>) -> Result<Vec<Signal>> {
            anyhow::bail!("detector crashed")
        }
    }

    #[test]
    fn test_detect_runs_registry_and_tolerates_failures() {
        let registry = DetectorRegistry::new()
            .with(Box::new(Static(vec![signal("react", 0.4, &["package.json"])])))
            .with(Box::new(Broken))
            .with(Box::new(Static(vec![signal("react", 0.3, &["src/App.tsx"])])));

        let inventory = Inventory::empty(PathBuf::from("/repo"));
        let input = DetectionInput::new(&inventory, Path::new("/repo"));
        let profile = StackAggregator::new().detect(&registry, &input);

        assert_eq!(profile.stacks["react"], 0.7);
        assert_eq!(profile.signals.len(), 2);
    }
}
