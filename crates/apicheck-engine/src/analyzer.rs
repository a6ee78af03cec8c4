//! Analysis entry point
//!
//! Runs the configured checks over a reference and a current baseline and
//! collects the resulting problems into a report.

use crate::classify::{Classifier, Verdict};
use crate::component_delta::BaselineComparison;
use crate::error::EngineError;
use crate::filter::{FilterStore, ProblemFilter};
use crate::problems::ProblemFactory;
use crate::tags::TagValidator;
use crate::usage::UsageScanner;
use crate::version_check::{ApiChange, VersionChecker};
use apicheck_baseline::Baseline;
use apicheck_core::{Component, Config, Delta, Problem, Report};

/// Everything an analysis produced
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub report: Report,

    /// All structural deltas, whether or not they became problems
    pub deltas: Vec<Delta>,

    /// Filters that matched no problem
    pub unused_filters: Vec<ProblemFilter>,
}

/// Compares baselines according to a configuration
#[derive(Debug, Clone)]
pub struct ApiAnalyzer {
    config: Config,
    classifier: Classifier,
    factory: ProblemFactory,
}

impl ApiAnalyzer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            classifier: Classifier::new(),
            factory: ProblemFactory::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the filter file named in the configuration, if any
    pub fn load_filters(&self) -> Result<Option<FilterStore>, EngineError> {
        match self.config.filters_path() {
            Some(path) => Ok(Some(FilterStore::from_file(&path)?)),
            None => Ok(None),
        }
    }

    fn analyzed<'b>(&self, baseline: &'b Baseline) -> impl Iterator<Item = &'b Component> + 'b {
        let rules = self.config.components.clone();
        baseline
            .components()
            .filter(move |c| !c.system_library && rules.is_included(&c.id))
    }

    /// Compare `current` against `reference`
    pub fn analyze(
        &self,
        reference: &Baseline,
        current: &Baseline,
        filters: Option<&mut FilterStore>,
    ) -> Result<AnalysisResult, EngineError> {
        let options = &self.config.analysis;
        let mut problems = Vec::new();
        let mut deltas = Vec::new();
        let mut types_compared = 0;

        if options.check_compatibility || options.check_versions {
            let comparison = BaselineComparison::compare(reference, current, &self.config.components)?;
            types_compared = comparison.types_compared;

            if options.check_compatibility {
                for delta in &comparison.deltas {
                    if self.classifier.classify(delta).is_incompatible() {
                        problems.push(self.factory.compatibility(delta));
                    }
                }
            }

            let versions = VersionChecker::new(options.clone());
            for component in &comparison.comparisons {
                let classified: Vec<(&Delta, Verdict)> = component
                    .deltas
                    .iter()
                    .map(|d| (d, self.classifier.classify(d)))
                    .collect();

                let mut suppress = false;
                if options.check_versions {
                    if let (Some(before), Some(after)) = (
                        reference.component(&component.component_id),
                        current.component(&component.component_id),
                    ) {
                        let change = ApiChange::from_verdicts(classified.iter().copied());
                        let outcome = versions.check(before, after, change);
                        suppress = outcome.suppress_compatibility;
                        problems.extend(outcome.problems);
                    }
                }

                if options.check_compatibility && !suppress {
                    problems.extend(
                        classified
                            .iter()
                            .filter(|(_, verdict)| verdict.is_incompatible())
                            .map(|(delta, _)| self.factory.compatibility(delta)),
                    );
                } else if suppress {
                    tracing::debug!(
                        component = %component.component_id,
                        "major version incremented, compatibility problems not reported"
                    );
                }
            }

            deltas = comparison.all_deltas().cloned().collect();
        }

        if options.check_usage {
            let scanner = UsageScanner::new(current);
            for component in self.analyzed(current) {
                problems.extend(scanner.scan_component(&component.id));
            }
        }

        if options.check_tags {
            let validator = TagValidator::new();
            for component in self.analyzed(current) {
                problems.extend(validator.validate(component));
            }
        }

        let problems = self.apply_severity(problems);
        let (problems, filtered, unused_filters) = match filters {
            Some(store) => {
                let (kept, filtered) = store.apply(problems);
                let unused = store.unused_filters().into_iter().cloned().collect();
                (kept, filtered.len(), unused)
            }
            None => (problems, 0, Vec::new()),
        };

        let mut report = Report::from_problems(problems).with_metadata(serde_json::json!({
            "reference": {
                "name": reference.name(),
                "fingerprint": reference.fingerprint()?,
            },
            "current": {
                "name": current.name(),
                "fingerprint": current.fingerprint()?,
            },
        }));
        report.summary.components_checked = self.analyzed(current).count();
        report.summary.types_compared = types_compared;
        report.summary.filtered = filtered;

        tracing::info!(
            reference = reference.name(),
            current = current.name(),
            problems = report.summary.total,
            errors = report.summary.errors,
            filtered,
            "analysis complete"
        );

        Ok(AnalysisResult {
            report,
            deltas,
            unused_filters,
        })
    }

    /// Apply configured severities, dropping ignored problems
    fn apply_severity(&self, problems: Vec<Problem>) -> Vec<Problem> {
        problems
            .into_iter()
            .filter_map(|mut problem| {
                let id = problem.id();
                match self.config.severity.get_severity(&id, problem.category, problem.severity) {
                    Some(severity) => {
                        problem.severity = severity;
                        Some(problem)
                    }
                    None => {
                        tracing::trace!(problem = %id, "ignored by configuration");
                        None
                    }
                }
            })
            .collect()
    }
}
