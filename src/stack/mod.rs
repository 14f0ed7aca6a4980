//! Stack detection
//!
//! Independent detectors each emit [`Signal`]s ("react is present, 0.4, because of
//! `package.json`"). The [`StackAggregator`] folds every signal into a single
//! [`StackProfile`]:
//!
//! - confidences for the same stack add up and are capped at 1.0
//! - evidence paths are merged, first occurrence wins
//! - stacks below the minimum confidence are dropped from the profile, while
//!   their signals stay in [`StackProfile::signals`] for auditing
//!
//! # Example
//!
//! ```
//! use specmine::stack::{Signal, StackAggregator};
//!
//! let profile = StackAggregator::new().aggregate(vec![
//!     Signal::new("react", 0.4, ["package.json"]).unwrap(),
//!     Signal::new("react", 0.3, ["src/App.tsx"]).unwrap(),
//! ]);
//! assert_eq!(profile.stacks["react"], 0.7);
//! ```

pub mod aggregator;
pub mod detectors;
pub mod registry;
pub mod signal;

pub use aggregator::{StackAggregator, StackProfile, DEFAULT_MIN_CONFIDENCE};
pub use detectors::{ManifestDependencyDetector, MarkerFileDetector};
pub use registry::{DetectionInput, Detector, DetectorRegistry};
pub use signal::{Signal, SignalError};
