//! apicheck core
//!
//! Stable domain model shared by the baseline loader and the analysis engine.
//! Never rename problem kinds or delta flags - they are part of the public API.

pub mod config;
pub mod delta;
pub mod model;
pub mod problem;
pub mod report;
pub mod version;

pub use config::{AnalysisOptions, ComponentRules, Config, ConfigError, SeverityLevel, SeverityThreshold};
pub use delta::{Delta, DeltaFlag, DeltaKind, ElementType};
pub use model::{
    BundleRequirement, Component, FieldDescriptor, HostSpec, MethodDescriptor, MethodKey, Modifiers, PackageExport,
    PackageImport, Reference, ReferenceKind, RestrictionTag, Restrictions, TypeDescriptor, TypeKind, Visibility,
};
pub use problem::{Problem, ProblemCategory, ProblemKind, Severity};
pub use report::{Report, ReportSummary, ReportVersion};
pub use version::{Version, VersionError, VersionRange};
