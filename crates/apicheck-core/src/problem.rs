//! Problems reported by the analyzer
//!
//! IMPORTANT: Problem identifiers are versioned and stable.
//! NEVER rename or remove kinds - filters and severity overrides refer to them.
//! Add new kinds with new names only.

use crate::delta::{DeltaFlag, ElementType};
use serde::{Deserialize, Serialize};

/// Problem category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemCategory {
    /// Binary compatibility between baselines
    Compatibility,

    /// Clients using API against its restrictions
    Usage,

    /// Bundle version numbering
    Version,
}

impl ProblemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compatibility => "COMPATIBILITY",
            Self::Usage => "USAGE",
            Self::Version => "VERSION",
        }
    }

    /// Lowercase name used as a severity override key
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Compatibility => "compatibility",
            Self::Usage => "usage",
            Self::Version => "version",
        }
    }
}

impl std::fmt::Display for ProblemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Problem severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Should be reviewed but not blocking
    Warn,

    /// Blocking issue that should fail the build
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Problem kind registry (v1)
///
/// These kinds are STABLE and VERSIONED.
/// Do NOT rename or remove kinds - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemKind {
    // Compatibility
    Added,
    Removed,
    Changed,

    // Usage
    IllegalExtend,
    IllegalImplement,
    IndirectIllegalImplement,
    IllegalInstantiate,
    IllegalReference,
    IllegalOverride,
    UnsupportedTag,

    // Version
    MajorVersionChange,
    MinorVersionChange,
    MajorVersionChangeNoBreakage,
    MinorVersionChangeNoNewApi,
}

impl ProblemKind {
    /// Get the kind as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "ADDED",
            Self::Removed => "REMOVED",
            Self::Changed => "CHANGED",
            Self::IllegalExtend => "ILLEGAL_EXTEND",
            Self::IllegalImplement => "ILLEGAL_IMPLEMENT",
            Self::IndirectIllegalImplement => "INDIRECT_ILLEGAL_IMPLEMENT",
            Self::IllegalInstantiate => "ILLEGAL_INSTANTIATE",
            Self::IllegalReference => "ILLEGAL_REFERENCE",
            Self::IllegalOverride => "ILLEGAL_OVERRIDE",
            Self::UnsupportedTag => "UNSUPPORTED_TAG",
            Self::MajorVersionChange => "MAJOR_VERSION_CHANGE",
            Self::MinorVersionChange => "MINOR_VERSION_CHANGE",
            Self::MajorVersionChangeNoBreakage => "MAJOR_VERSION_CHANGE_NO_BREAKAGE",
            Self::MinorVersionChangeNoNewApi => "MINOR_VERSION_CHANGE_NO_NEW_API",
        }
    }

    /// Category a kind belongs to
    pub fn category(&self) -> ProblemCategory {
        match self {
            Self::Added | Self::Removed | Self::Changed => ProblemCategory::Compatibility,
            Self::IllegalExtend
            | Self::IllegalImplement
            | Self::IndirectIllegalImplement
            | Self::IllegalInstantiate
            | Self::IllegalReference
            | Self::IllegalOverride
            | Self::UnsupportedTag => ProblemCategory::Usage,
            Self::MajorVersionChange
            | Self::MinorVersionChange
            | Self::MajorVersionChangeNoBreakage
            | Self::MinorVersionChangeNoNewApi => ProblemCategory::Version,
        }
    }
}

impl std::fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A problem with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub category: ProblemCategory,
    pub severity: Severity,
    pub kind: ProblemKind,
    pub element_type: ElementType,

    /// Delta flag for compatibility problems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<DeltaFlag>,

    /// Component the problem is reported against
    pub component_id: String,

    /// Qualified type name, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Member signature or field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,

    /// Human-readable message
    pub message: String,

    /// Arguments the message was built from; used for filter matching
    pub message_args: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl Problem {
    /// Create a new problem; the category follows from the kind
    pub fn new(
        kind: ProblemKind,
        severity: Severity,
        element_type: ElementType,
        component_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category: kind.category(),
            severity,
            kind,
            element_type,
            flag: None,
            component_id: component_id.into(),
            type_name: None,
            member: None,
            message: message.into(),
            message_args: Vec::new(),
            line: None,
            before: None,
            after: None,
        }
    }

    pub fn with_flag(mut self, flag: DeltaFlag) -> Self {
        self.flag = Some(flag);
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.message_args = args;
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set before/after values
    pub fn with_comparison(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self.after = Some(after.into());
        self
    }

    /// Stable identifier `CATEGORY.ELEMENT.KIND.FLAG`
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.category,
            self.element_type,
            self.kind,
            self.flag.map(|f| f.as_str()).unwrap_or("NONE"),
        )
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({}): {}", self.severity, self.id(), self.component_id, self.message)
    }
}
