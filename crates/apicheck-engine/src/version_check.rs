//! Bundle version checks
//!
//! A component's version has to follow its API: breaking changes need a
//! major increment, new API needs a minor increment.

use crate::classify::Verdict;
use crate::problems::ProblemFactory;
use apicheck_core::{AnalysisOptions, Component, Delta, DeltaFlag, DeltaKind, ElementType, Problem, ProblemKind};

/// How the API of one component changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiChange {
    pub breaking: usize,
    pub additions: usize,
}

impl ApiChange {
    /// Count breaking changes and compatible additions among classified deltas
    pub fn from_verdicts<'d>(classified: impl IntoIterator<Item = (&'d Delta, Verdict)>) -> Self {
        let mut change = Self::default();
        for (delta, verdict) in classified {
            match verdict {
                Verdict::Incompatible => change.breaking += 1,
                Verdict::Compatible if delta.kind == DeltaKind::Added && delta.flag != DeltaFlag::Deprecation => {
                    change.additions += 1
                }
                _ => {}
            }
        }
        change
    }
}

/// Result of checking one component's version
#[derive(Debug, Clone, Default)]
pub struct VersionOutcome {
    pub problems: Vec<Problem>,

    /// Compatibility problems of the component should not be reported
    pub suppress_compatibility: bool,
}

/// Checks version increments against API changes
#[derive(Debug, Clone)]
pub struct VersionChecker {
    options: AnalysisOptions,
}

impl VersionChecker {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    pub fn check(&self, reference: &Component, current: &Component, change: ApiChange) -> VersionOutcome {
        let (before, after) = (&reference.version, &current.version);
        let major_up = after.major > before.major;
        let minor_up = major_up || (after.major == before.major && after.minor > before.minor);

        let problem = |kind: ProblemKind, message: String| {
            Problem::new(
                kind,
                ProblemFactory::default_severity(kind),
                ElementType::Component,
                &current.id,
                message,
            )
            .with_args(vec![current.id.clone(), after.to_string(), before.to_string()])
            .with_comparison(before.to_string(), after.to_string())
        };

        let mut outcome = VersionOutcome {
            problems: Vec::new(),
            suppress_compatibility: major_up && !self.options.report_breakage_on_major_increment,
        };

        if change.breaking > 0 && !major_up {
            outcome.problems.push(problem(
                ProblemKind::MajorVersionChange,
                format!(
                    "The major version of {} should be incremented in version {}, since API breakage occurred since version {}",
                    current.id, after, before
                ),
            ));
        } else if change.breaking == 0 && change.additions > 0 && !minor_up {
            outcome.problems.push(problem(
                ProblemKind::MinorVersionChange,
                format!(
                    "The minor version of {} should be incremented in version {}, since new APIs have been added since version {}",
                    current.id, after, before
                ),
            ));
        }

        if major_up && change.breaking == 0 && self.options.report_major_without_breakage {
            outcome.problems.push(problem(
                ProblemKind::MajorVersionChangeNoBreakage,
                format!(
                    "The major version of {} was incremented to {} but no API breakage occurred since version {}",
                    current.id, after, before
                ),
            ));
        }

        if !major_up
            && minor_up
            && change.breaking == 0
            && change.additions == 0
            && self.options.report_minor_without_api_change
        {
            outcome.problems.push(problem(
                ProblemKind::MinorVersionChangeNoNewApi,
                format!(
                    "The minor version of {} was incremented to {} but no new API was added since version {}",
                    current.id, after, before
                ),
            ));
        }

        tracing::debug!(
            component = %current.id,
            from = %before,
            to = %after,
            breaking = change.breaking,
            additions = change.additions,
            problems = outcome.problems.len(),
            "checked version"
        );

        outcome
    }
}
