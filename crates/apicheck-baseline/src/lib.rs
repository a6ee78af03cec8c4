//! Baseline loading and module resolution
//!
//! This crate handles:
//! - Loading baselines from JSON files or component directories
//! - Resolving package imports and bundle requirements (module graph)
//! - Package visibility as seen from a given component
//! - API descriptions and the rules for where restriction tags may appear

pub mod baseline;
pub mod description;
pub mod graph;
pub mod loader;

pub use baseline::Baseline;
pub use description::{parse_tags, supported_tags, ApiDescription, ApiVisibility, ElementKey, TagContext};
pub use graph::{ComponentId, ModuleGraph, ResolverError, VisiblePackage, Wire, WireKind};
pub use loader::{load, load_directory, load_file, save_to_file, BaselineError, BaselineFile};
