use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageId {
    A,
    B,
    C,
    C2,
    D,
    E,
    F,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        StageId::A,
        StageId::B,
        StageId::C,
        StageId::C2,
        StageId::D,
        StageId::E,
        StageId::F,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::A => "A",
            StageId::B => "B",
            StageId::C => "C",
            StageId::C2 => "C2",
            StageId::D => "D",
            StageId::E => "E",
            StageId::F => "F",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StageId::A => "Clone repository",
            StageId::B => "Inventory scan",
            StageId::C => "Stack detection & surface extraction",
            StageId::C2 => "Enrichment",
            StageId::D => "Traceability",
            StageId::E => "Document generation",
            StageId::F => "Coverage & gap evaluation",
        }
    }

    pub fn parse(name: &str) -> Option<StageId> {
        StageId::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order() {
        let mut sorted = StageId::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, StageId::ALL.to_vec());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&StageId::C2).unwrap(), "\"C2\"");
        assert_eq!(serde_json::to_string(&StageStatus::Done).unwrap(), "\"done\"");
        assert!(serde_json::from_str::<StageStatus>("\"running\"").is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!(StageId::parse("c2"), Some(StageId::C2));
        assert_eq!(StageId::parse("Z"), None);
    }
}
