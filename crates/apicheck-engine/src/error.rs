//! Engine errors

use crate::filter::FilterError;
use apicheck_baseline::BaselineError;

/// Errors raised while comparing or analyzing baselines
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Cannot compare type {reference} with type {current}")]
    TypeMismatch { reference: String, current: String },

    #[error("Component {0} is not present in both baselines")]
    MissingComponent(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Baseline(#[from] BaselineError),
}
