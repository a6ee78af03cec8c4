//! Problem filters (api_filters.toml)
//!
//! A filter marks one known problem as accepted so it is no longer
//! reported. Filters are matched on component, type, problem id and
//! message arguments.
//!
//! ```toml
//! [[filter]]
//! component = "org.example.core"
//! type_name = "org.example.core.Engine"
//! id = "COMPATIBILITY.CLASS.REMOVED.METHOD"
//! message_args = ["org.example.core.Engine", "start(int)"]
//! comment = "Removed before 2.0 shipped"
//! ```

use apicheck_core::config::glob_match;
use apicheck_core::Problem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// One accepted problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemFilter {
    pub component: String,

    /// Type the problem is reported on; `None` for component-level problems
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Problem id, `*` wildcards allowed
    pub id: String,

    /// Empty matches any arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub message_args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ProblemFilter {
    pub fn new(component: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            type_name: None,
            id: id.into(),
            message_args: Vec::new(),
            comment: None,
        }
    }

    /// Filter exactly this problem
    pub fn for_problem(problem: &Problem) -> Self {
        Self {
            component: problem.component_id.clone(),
            type_name: problem.type_name.clone(),
            id: problem.id(),
            message_args: problem.message_args.clone(),
            comment: None,
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.message_args = args;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn matches(&self, problem: &Problem) -> bool {
        self.component == problem.component_id
            && self.type_name == problem.type_name
            && glob_match(&self.id, &problem.id())
            && (self.message_args.is_empty() || self.message_args == problem.message_args)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FilterFile {
    #[serde(default, rename = "filter")]
    filters: Vec<ProblemFilter>,
}

/// Filters indexed by component and type
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    filters: Vec<ProblemFilter>,
    index: HashMap<(String, Option<String>), Vec<usize>>,
    used: BTreeSet<usize>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load filters from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, FilterError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FilterError::IoError(path.display().to_string(), e.to_string()))?;
        let store = Self::from_toml(&contents)?;
        tracing::debug!(path = %path.display(), filters = store.len(), "loaded problem filters");
        Ok(store)
    }

    /// Load filters from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, FilterError> {
        let file: FilterFile = toml::from_str(toml).map_err(|e| FilterError::ParseError(e.to_string()))?;
        let mut store = Self::new();
        for filter in file.filters {
            store.add_filter(filter);
        }
        Ok(store)
    }

    pub fn to_toml(&self) -> Result<String, FilterError> {
        let file = FilterFile {
            filters: self.filters.clone(),
        };
        toml::to_string_pretty(&file).map_err(|e| FilterError::SerializeError(e.to_string()))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), FilterError> {
        let toml = self.to_toml()?;
        std::fs::write(path, toml).map_err(|e| FilterError::IoError(path.display().to_string(), e.to_string()))
    }

    /// Add a filter; exact duplicates are ignored
    pub fn add_filter(&mut self, filter: ProblemFilter) {
        if self.filters.contains(&filter) {
            return;
        }
        let key = (filter.component.clone(), filter.type_name.clone());
        self.index.entry(key).or_default().push(self.filters.len());
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[ProblemFilter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Index of the first filter matching a problem
    fn find(&self, problem: &Problem) -> Option<usize> {
        let key = (problem.component_id.clone(), problem.type_name.clone());
        self.index
            .get(&key)?
            .iter()
            .copied()
            .find(|&i| self.filters[i].matches(problem))
    }

    pub fn is_filtered(&self, problem: &Problem) -> bool {
        self.find(problem).is_some()
    }

    /// Split problems into (kept, filtered), marking matching filters used
    pub fn apply(&mut self, problems: Vec<Problem>) -> (Vec<Problem>, Vec<Problem>) {
        let mut kept = Vec::new();
        let mut filtered = Vec::new();
        for problem in problems {
            match self.find(&problem) {
                Some(i) => {
                    self.used.insert(i);
                    filtered.push(problem);
                }
                None => kept.push(problem),
            }
        }
        (kept, filtered)
    }

    /// Filters that matched nothing in any `apply` call so far
    pub fn unused_filters(&self) -> Vec<&ProblemFilter> {
        self.filters
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.used.contains(i))
            .map(|(_, f)| f)
            .collect()
    }
}

/// Filter store errors
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Failed to read filters {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse filters: {0}")]
    ParseError(String),

    #[error("Failed to serialize filters: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicheck_core::{DeltaFlag, ElementType, ProblemKind, Severity};
    use pretty_assertions::assert_eq;

    fn removed(type_name: &str, member: &str) -> Problem {
        Problem::new(ProblemKind::Removed, Severity::Error, ElementType::Class, "core", "removed")
            .with_flag(DeltaFlag::Method)
            .with_type(type_name)
            .with_args(vec![type_name.to_string(), member.to_string()])
    }

    const FILTERS: &str = r#"
[[filter]]
component = "core"
type_name = "p.Engine"
id = "COMPATIBILITY.CLASS.REMOVED.METHOD"
message_args = ["p.Engine", "start(int)"]
comment = "accepted"

[[filter]]
component = "core"
type_name = "p.Other"
id = "COMPATIBILITY.*"

[[filter]]
component = "core"
type_name = "p.Stale"
id = "COMPATIBILITY.CLASS.REMOVED.FIELD"
"#;

    #[test]
    fn apply_splits_and_tracks_usage() {
        let mut store = FilterStore::from_toml(FILTERS).unwrap();
        assert_eq!(store.len(), 3);

        let (kept, filtered) = store.apply(vec![
            removed("p.Engine", "start(int)"),
            removed("p.Engine", "stop()"),
            removed("p.Other", "anything()"),
        ]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].message_args[1], "stop()");
        assert_eq!(filtered.len(), 2);

        let unused: Vec<&str> = store
            .unused_filters()
            .iter()
            .filter_map(|f| f.type_name.as_deref())
            .collect();
        assert_eq!(unused, vec!["p.Stale"]);
    }

    #[test]
    fn type_and_component_must_match() {
        let store = FilterStore::from_toml(FILTERS).unwrap();
        assert!(!store.is_filtered(&removed("p.Unknown", "start(int)")));

        let mut other_component = removed("p.Engine", "start(int)");
        other_component.component_id = "ui".to_string();
        assert!(!store.is_filtered(&other_component));
    }

    #[test]
    fn filter_for_problem_round_trips_through_file() {
        let problem = removed("p.Engine", "start(int)");
        let mut store = FilterStore::new();
        store.add_filter(ProblemFilter::for_problem(&problem).with_comment("ok"));
        store.add_filter(ProblemFilter::for_problem(&problem).with_comment("ok"));
        assert_eq!(store.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_filters.toml");
        store.save_to_file(&path).unwrap();

        let reloaded = FilterStore::from_file(&path).unwrap();
        assert_eq!(reloaded.filters(), store.filters());
        assert!(reloaded.is_filtered(&problem));
    }

    #[test]
    fn errors() {
        assert!(matches!(FilterStore::from_toml("[[filter]]\nid = 1"), Err(FilterError::ParseError(_))));
        assert!(matches!(
            FilterStore::from_file(Path::new("/nonexistent/api_filters.toml")),
            Err(FilterError::IoError(..))
        ));
    }
}
