//! OSGi-style versions and version ranges
//!
//! Versions have the form `major.minor.micro.qualifier`; trailing segments
//! may be omitted. Ranges use interval notation (`[1.0,2.0)`) or a bare
//! version meaning "this version or later".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Version parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,

    #[error("Invalid version segment '{segment}' in '{input}'")]
    InvalidSegment { input: String, segment: String },

    #[error("Too many version segments in '{0}'")]
    TooManySegments(String),

    #[error("Invalid version range '{0}'")]
    InvalidRange(String),
}

/// A component or package version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub qualifier: String,
}

impl Version {
    /// The empty version `0.0.0`
    pub const fn zero() -> Self {
        Self {
            major: 0,
            minor: 0,
            micro: 0,
            qualifier: String::new(),
        }
    }

    /// Create a version without qualifier
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// Set the qualifier
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.micro.cmp(&other.micro))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionError::Empty);
        }

        let parts: Vec<&str> = input.split('.').collect();
        if parts.len() > 4 {
            return Err(VersionError::TooManySegments(input.to_string()));
        }
        let numeric = |idx: usize| -> Result<u32, VersionError> {
            match parts.get(idx) {
                Some(segment) => segment.parse().map_err(|_| VersionError::InvalidSegment {
                    input: input.to_string(),
                    segment: segment.to_string(),
                }),
                None => Ok(0),
            }
        };

        let qualifier = parts.get(3).map(|q| q.to_string()).unwrap_or_default();
        if !qualifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VersionError::InvalidSegment {
                input: input.to_string(),
                segment: qualifier,
            });
        }

        Ok(Self {
            major: numeric(0)?,
            minor: numeric(1)?,
            micro: numeric(2)?,
            qualifier,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

/// A version interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    pub minimum: Version,
    pub include_minimum: bool,
    /// `None` means unbounded
    pub maximum: Option<Version>,
    pub include_maximum: bool,
}

impl VersionRange {
    /// Range accepting every version
    pub fn any() -> Self {
        Self::at_least(Version::zero())
    }

    /// Range accepting `minimum` and everything above it
    pub fn at_least(minimum: Version) -> Self {
        Self {
            minimum,
            include_minimum: true,
            maximum: None,
            include_maximum: false,
        }
    }

    /// Check whether a version lies inside this range
    pub fn includes(&self, version: &Version) -> bool {
        let above_min = if self.include_minimum {
            version >= &self.minimum
        } else {
            version > &self.minimum
        };

        let below_max = match &self.maximum {
            Some(max) if self.include_maximum => version <= max,
            Some(max) => version < max,
            None => true,
        };

        above_min && below_max
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let first = input.chars().next().ok_or(VersionError::Empty)?;

        if first != '[' && first != '(' {
            return Ok(Self::at_least(input.parse()?));
        }

        let last = input
            .chars()
            .last()
            .filter(|c| *c == ']' || *c == ')')
            .ok_or_else(|| VersionError::InvalidRange(input.to_string()))?;

        let body = &input[1..input.len() - 1];
        let (min, max) = body
            .split_once(',')
            .ok_or_else(|| VersionError::InvalidRange(input.to_string()))?;

        let minimum: Version = min.parse()?;
        let maximum: Version = max.parse()?;
        if maximum < minimum {
            return Err(VersionError::InvalidRange(input.to_string()));
        }

        Ok(Self {
            minimum,
            include_minimum: first == '[',
            maximum: Some(maximum),
            include_maximum: last == ']',
        })
    }
}

impl TryFrom<String> for VersionRange {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.maximum {
            None => write!(f, "{}", self.minimum),
            Some(max) => write!(
                f,
                "{}{},{}{}",
                if self.include_minimum { '[' } else { '(' },
                self.minimum,
                max,
                if self.include_maximum { ']' } else { ')' },
            ),
        }
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::any()
    }
}
