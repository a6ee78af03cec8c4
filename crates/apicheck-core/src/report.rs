//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::problem::{Problem, ProblemCategory, Severity};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,

    pub compatibility: usize,
    pub usage: usize,
    pub version: usize,

    /// Components present in the current baseline that were analyzed
    pub components_checked: usize,

    /// Reference types compared against the current baseline
    pub types_compared: usize,

    /// Problems removed by filters
    pub filtered: usize,
}

impl ReportSummary {
    fn count(&mut self, problem: &Problem) {
        self.total += 1;
        match problem.severity {
            Severity::Error => self.errors += 1,
            Severity::Warn => self.warnings += 1,
            Severity::Info => self.info += 1,
        }
        match problem.category {
            ProblemCategory::Compatibility => self.compatibility += 1,
            ProblemCategory::Usage => self.usage += 1,
            ProblemCategory::Version => self.version += 1,
        }
    }
}

/// Analysis report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (RFC 3339)
    pub timestamp: String,

    pub summary: ReportSummary,

    pub problems: Vec<Problem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Report {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: ReportSummary::default(),
            problems: Vec::new(),
            metadata: None,
        }
    }

    /// Create a report from problems
    pub fn from_problems(problems: Vec<Problem>) -> Self {
        let mut report = Self::new();
        for problem in problems {
            report.add_problem(problem);
        }
        report
    }

    /// Add a problem to the report
    pub fn add_problem(&mut self, problem: Problem) {
        self.summary.count(&problem);
        self.problems.push(problem);
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Problems of one category
    pub fn problems_in(&self, category: ProblemCategory) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(move |p| p.category == category)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Render a Markdown summary grouped by component
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# API Analysis Report\n\n");
        let _ = writeln!(md, "**Generated**: {}  ", self.timestamp);
        let _ = writeln!(md, "**Report version**: {}\n", self.version);

        md.push_str("## Summary\n\n");
        md.push_str("| Metric | Count |\n|---|---|\n");
        let s = &self.summary;
        for (label, value) in [
            ("Components checked", s.components_checked),
            ("Types compared", s.types_compared),
            ("Problems", s.total),
            ("Errors", s.errors),
            ("Warnings", s.warnings),
            ("Info", s.info),
            ("Filtered", s.filtered),
        ] {
            let _ = writeln!(md, "| {} | {} |", label, value);
        }
        md.push('\n');

        if self.problems.is_empty() {
            md.push_str("No problems found.\n");
            return md;
        }

        let mut components: Vec<&str> = self.problems.iter().map(|p| p.component_id.as_str()).collect();
        components.sort_unstable();
        components.dedup();

        for component in components {
            let _ = writeln!(md, "## {}\n", component);
            md.push_str("| Severity | Id | Element | Message |\n|---|---|---|---|\n");
            for problem in self.problems.iter().filter(|p| p.component_id == component) {
                let element = match (&problem.type_name, &problem.member) {
                    (Some(t), Some(m)) => format!("`{}#{}`", t, m),
                    (Some(t), None) => format!("`{}`", t),
                    _ => String::new(),
                };
                let _ = writeln!(
                    md,
                    "| {} | `{}` | {} | {} |",
                    problem.severity,
                    problem.id(),
                    element,
                    problem.message.replace('|', "\\|"),
                );
            }
            md.push('\n');
        }

        md
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{DeltaFlag, ElementType};
    use crate::problem::ProblemKind;

    fn removed_method() -> Problem {
        Problem::new(
            ProblemKind::Removed,
            Severity::Error,
            ElementType::Class,
            "a.bundle",
            "The method p.C.m() has been removed",
        )
        .with_flag(DeltaFlag::Method)
        .with_type("p.C")
        .with_member("m()")
    }

    #[test]
    fn empty_report() {
        let report = Report::new();
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.total, 0);
        assert!(!report.has_errors());
        assert!(report.to_markdown().contains("No problems found."));
    }

    #[test]
    fn report_with_problems() {
        let report = Report::from_problems(vec![
            removed_method(),
            Problem::new(
                ProblemKind::MinorVersionChangeNoNewApi,
                Severity::Warn,
                ElementType::Component,
                "a.bundle",
                "Minor version increased without new API",
            ),
        ]);

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.compatibility, 1);
        assert_eq!(report.summary.version, 1);
        assert_eq!(report.problems_in(ProblemCategory::Version).count(), 1);
        assert!(report.has_errors());
    }

    #[test]
    fn report_serialization() {
        let report = Report::from_problems(vec![removed_method()]);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"problems\""));

        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.problems[0].id(), "COMPATIBILITY.CLASS.REMOVED.METHOD");
    }

    #[test]
    fn markdown_groups_by_component() {
        let md = Report::from_problems(vec![removed_method()]).to_markdown();
        assert!(md.contains("## a.bundle"));
        assert!(md.contains("`COMPATIBILITY.CLASS.REMOVED.METHOD`"));
        assert!(md.contains("`p.C#m()`"));
    }
}
