//! apicheck engine - Compatibility analysis
//!
//! This crate implements the analysis on top of loaded baselines:
//! - Structural deltas between types and components
//! - Binary compatibility classification
//! - Usage scanning and restriction tag validation
//! - Bundle version checks
//! - Problem filters and the analyzer entry point

pub mod analyzer;
pub mod classify;
pub mod component_delta;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod problems;
pub mod tags;
pub mod type_delta;
pub mod usage;
pub mod version_check;

pub use analyzer::{AnalysisResult, ApiAnalyzer};
pub use classify::{Classifier, HiddenBy, Verdict};
pub use component_delta::{BaselineComparison, ComponentComparison};
pub use error::EngineError;
pub use filter::{FilterError, FilterStore, ProblemFilter};
pub use hierarchy::{Hierarchy, TypeRef};
pub use problems::ProblemFactory;
pub use tags::TagValidator;
pub use type_delta::{DiffContext, TypeDiff};
pub use usage::UsageScanner;
pub use version_check::{ApiChange, VersionChecker, VersionOutcome};
