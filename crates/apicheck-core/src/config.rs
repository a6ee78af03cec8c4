//! Configuration schema (apicheck.toml)

use crate::problem::{ProblemCategory, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Severity assigned through configuration; `ignore` drops the problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Ignore,
    Info,
    Warn,
    Error,
}

impl SeverityLevel {
    /// `None` when the problem should be dropped
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            Self::Ignore => None,
            Self::Info => Some(Severity::Info),
            Self::Warn => Some(Severity::Warn),
            Self::Error => Some(Severity::Error),
        }
    }
}

impl From<Severity> for SeverityLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => Self::Info,
            Severity::Warn => Self::Warn,
            Severity::Error => Self::Error,
        }
    }
}

/// Severity overrides keyed by problem id or lowercase category name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    #[serde(default)]
    pub overrides: HashMap<String, SeverityLevel>,
}

impl SeverityThreshold {
    /// Resolve the severity for a problem.
    ///
    /// Exact id wins over category; `None` means the problem is ignored.
    pub fn get_severity(&self, problem_id: &str, category: ProblemCategory, default: Severity) -> Option<Severity> {
        self.overrides
            .get(problem_id)
            .or_else(|| self.overrides.get(category.config_key()))
            .copied()
            .map_or(Some(default), SeverityLevel::to_severity)
    }

    /// Set severity override for a problem id or category key
    pub fn set_override(&mut self, key: impl Into<String>, level: SeverityLevel) {
        self.overrides.insert(key.into(), level);
    }
}

/// Which checks run and how version problems are reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub check_compatibility: bool,
    pub check_usage: bool,
    pub check_tags: bool,
    pub check_versions: bool,

    /// Keep compatibility problems of components whose major version was bumped
    pub report_breakage_on_major_increment: bool,

    pub report_major_without_breakage: bool,
    pub report_minor_without_api_change: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            check_compatibility: true,
            check_usage: true,
            check_tags: true,
            check_versions: true,
            report_breakage_on_major_increment: false,
            report_major_without_breakage: true,
            report_minor_without_api_change: true,
        }
    }
}

/// Component selection rules (glob patterns)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentRules {
    /// Only analyze these components; empty means all
    #[serde(default)]
    pub include: Vec<String>,

    /// Never analyze these components
    #[serde(default)]
    pub skip: Vec<String>,
}

impl ComponentRules {
    fn matches_pattern(id: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|pattern| glob_match(pattern, id))
    }

    /// Check if a component should be analyzed
    pub fn is_included(&self, id: &str) -> bool {
        (self.include.is_empty() || Self::matches_pattern(id, &self.include))
            && !Self::matches_pattern(id, &self.skip)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Problem filter file, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<PathBuf>,

    #[serde(default)]
    pub severity: SeverityThreshold,

    #[serde(default)]
    pub analysis: AnalysisOptions,

    #[serde(default)]
    pub components: ComponentRules,

    /// Directory containing the config file
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filters: None,
            severity: SeverityThreshold::default(),
            analysis: AnalysisOptions::default(),
            components: ComponentRules::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Filter file resolved against the project root
    pub fn filters_path(&self) -> Option<PathBuf> {
        self.filters.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.project_root.join(p)
            }
        })
    }
}

/// Simple glob matching; `*` matches any run of characters
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };

    let last_index = rest.len().saturating_sub(1);
    for (i, part) in rest.iter().enumerate() {
        if i == last_index {
            return remaining.ends_with(part);
        }
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    true
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.analysis.check_compatibility);
        assert!(!config.analysis.report_breakage_on_major_increment);
        assert!(config.filters.is_none());
    }

    #[test]
    fn severity_override_precedence() {
        let mut threshold = SeverityThreshold::default();
        threshold.set_override("COMPATIBILITY.CLASS.REMOVED.METHOD", SeverityLevel::Warn);
        threshold.set_override("compatibility", SeverityLevel::Info);
        threshold.set_override("usage", SeverityLevel::Ignore);

        assert_eq!(
            threshold.get_severity("COMPATIBILITY.CLASS.REMOVED.METHOD", ProblemCategory::Compatibility, Severity::Error),
            Some(Severity::Warn)
        );
        assert_eq!(
            threshold.get_severity("COMPATIBILITY.CLASS.REMOVED.FIELD", ProblemCategory::Compatibility, Severity::Error),
            Some(Severity::Info)
        );
        assert_eq!(
            threshold.get_severity("USAGE.CLASS.ILLEGAL_EXTEND.NONE", ProblemCategory::Usage, Severity::Error),
            None
        );
        assert_eq!(
            threshold.get_severity("VERSION.COMPONENT.MAJOR_VERSION_CHANGE.NONE", ProblemCategory::Version, Severity::Error),
            Some(Severity::Error)
        );
    }

    #[test]
    fn parse_full_config() {
        let config = Config::from_toml(
            r#"
filters = "api_filters.toml"

[severity.overrides]
"COMPATIBILITY.CLASS.REMOVED.METHOD" = "warn"
usage = "ignore"

[analysis]
check_tags = false
report_major_without_breakage = false

[components]
include = ["org.example.*"]
skip = ["*.tests"]
"#,
        )
        .unwrap();

        assert_eq!(config.filters, Some(PathBuf::from("api_filters.toml")));
        assert!(!config.analysis.check_tags);
        assert!(config.analysis.check_usage);
        assert!(!config.analysis.report_major_without_breakage);
        assert_eq!(config.severity.overrides.get("usage"), Some(&SeverityLevel::Ignore));
        assert!(config.components.is_included("org.example.core"));
        assert!(!config.components.is_included("org.example.core.tests"));
        assert!(!config.components.is_included("com.other"));
    }

    #[test]
    fn reject_bad_severity() {
        let err = Config::from_toml("[severity.overrides]\nusage = \"fatal\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn config_file_roundtrip() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        let path = dir.join("apicheck.toml");

        let mut config = Config::default();
        config.filters = Some(PathBuf::from("filters.toml"));
        config.analysis.check_versions = false;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.analysis, config.analysis);
        assert_eq!(loaded.filters_path(), Some(dir.join("filters.toml")));
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("org.example.*", "org.example.core"));
        assert!(glob_match("*.tests", "org.example.tests"));
        assert!(glob_match("org.*.ui.*", "org.example.ui.forms"));
        assert!(!glob_match("org.example.*", "com.example.core"));
        assert!(!glob_match("a*b*c", "ab"));
        assert!(glob_match("exact", "exact"));
    }
}
