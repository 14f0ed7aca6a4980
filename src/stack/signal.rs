use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("Confidence {confidence} for stack '{stack}' is outside 0.0..=1.0")]
    ConfidenceOutOfRange { stack: String, confidence: f64 },

    #[error("Signal has an empty stack name")]
    EmptyStackName,
}

/// One detector's claim that a stack is present
///
/// Signals are validated at construction: a confidence outside `0.0..=1.0`
/// (or NaN) is a detector bug and is rejected instead of clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSignal")]
pub struct Signal {
    stack_name: String,
    confidence: f64,
    evidence: Vec<String>,
}

impl Signal {
    pub fn new<I, S>(
        stack_name: impl Into<String>,
        confidence: f64,
        evidence: I,
    ) -> Result<Self, SignalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stack_name = stack_name.into();
        if stack_name.trim().is_empty() {
            return Err(SignalError::EmptyStackName);
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SignalError::ConfidenceOutOfRange {
                stack: stack_name,
                confidence,
            });
        }

        let mut deduped: Vec<String> = Vec::new();
        for path in evidence {
            let path = path.into();
            if !deduped.contains(&path) {
                deduped.push(path);
            }
        }

        Ok(Self {
            stack_name,
            confidence,
            evidence: deduped,
        })
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn evidence(&self) -> &[String] {
        &self.evidence
    }
}

#[derive(Deserialize)]
struct RawSignal {
    stack_name: String,
    confidence: f64,
    evidence: Vec<String>,
}

impl TryFrom<RawSignal> for Signal {
    type Error = SignalError;

    fn try_from(raw: RawSignal) -> Result<Self, Self::Error> {
        Signal::new(raw.stack_name, raw.confidence, raw.evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_creation() {
        let signal = Signal::new("react", 0.4, ["package.json"]).unwrap();
        assert_eq!(signal.stack_name(), "react");
        assert_eq!(signal.confidence(), 0.4);
        assert_eq!(signal.evidence(), &["package.json".to_string()]);
    }

    #[test]
    fn test_evidence_deduplicated_in_order() {
        let signal = Signal::new("django", 0.5, ["manage.py", "settings.py", "manage.py"]).unwrap();
        assert_eq!(signal.evidence(), &["manage.py".to_string(), "settings.py".to_string()]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Signal::new("vue", 0.0, Vec::<String>::new()).is_ok());
        assert!(Signal::new("vue", 1.0, Vec::<String>::new()).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = Signal::new("vue", 1.5, ["package.json"]).unwrap_err();
        assert_eq!(
            err,
            SignalError::ConfidenceOutOfRange {
                stack: "vue".to_string(),
                confidence: 1.5
            }
        );
        assert!(Signal::new("vue", -0.1, ["package.json"]).is_err());
        assert!(Signal::new("vue", f64::NAN, ["package.json"]).is_err());
    }

    #[test]
    fn test_deserialize_validates_confidence() {
        let bad = r#"{"stack_name":"vue","confidence":2.0,"evidence":[]}"#;
        assert!(serde_json::from_str::<Signal>(bad).is_err());

        let good = r#"{"stack_name":"vue","confidence":0.5,"evidence":["a","a"]}"#;
        let signal: Signal = serde_json::from_str(good).unwrap();
        assert_eq!(signal.evidence().len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            Signal::new("  ", 0.5, ["a"]).unwrap_err(),
            SignalError::EmptyStackName
        );
    }
}
