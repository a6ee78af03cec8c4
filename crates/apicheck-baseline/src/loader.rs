//! Baseline loading
//!
//! A baseline is stored either as one JSON file
//! (`{"name": ..., "components": [...]}`) or as a directory holding one
//! JSON file per component.

use crate::baseline::Baseline;
use crate::description::parse_tags;
use apicheck_core::Component;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// On-disk form of a baseline file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineFile {
    pub name: String,

    #[serde(default)]
    pub components: Vec<Component>,
}

impl BaselineFile {
    /// Parse a baseline from JSON string
    pub fn from_str(json: &str) -> Result<Self, BaselineError> {
        serde_json::from_str(json).map_err(|e| BaselineError::ParseError("<string>".to_string(), e.to_string()))
    }
}

/// Load a baseline from a JSON file or a directory of component files
pub fn load(path: &Path) -> Result<Baseline, BaselineError> {
    let baseline = if path.is_dir() {
        load_directory(path)?
    } else {
        load_file(path)?
    };

    tracing::info!(
        baseline = baseline.name(),
        path = %path.display(),
        components = baseline.len(),
        "loaded baseline"
    );
    Ok(baseline)
}

/// Load a single-file baseline
pub fn load_file(path: &Path) -> Result<Baseline, BaselineError> {
    let contents = read(path)?;
    let file: BaselineFile = serde_json::from_str(&contents)
        .map_err(|e| BaselineError::ParseError(path.display().to_string(), e.to_string()))?;

    if file.components.is_empty() {
        return Err(BaselineError::Empty(path.display().to_string()));
    }

    Ok(from_components(file.name, file.components).with_location(path))
}

/// Load every `*.json` file below a directory as one component.
///
/// Files are read in path order; the baseline takes the directory's name.
pub fn load_directory(dir: &Path) -> Result<Baseline, BaselineError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| BaselineError::IoError(dir.display().to_string(), e.to_string()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path.to_path_buf());
        }
    }

    if paths.is_empty() {
        return Err(BaselineError::Empty(dir.display().to_string()));
    }

    let mut components = Vec::with_capacity(paths.len());
    for path in &paths {
        let contents = read(path)?;
        let component: Component = serde_json::from_str(&contents)
            .map_err(|e| BaselineError::ParseError(path.display().to_string(), e.to_string()))?;
        tracing::debug!(component = %component.id, path = %path.display(), "read component");
        components.push(component);
    }

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());

    Ok(from_components(name, components).with_location(dir))
}

/// Build a baseline after merging javadoc tags into declared restrictions
pub fn from_components(name: impl Into<String>, mut components: Vec<Component>) -> Baseline {
    for component in &mut components {
        merge_doc_tags(component);
    }
    Baseline::new(name, components)
}

/// Write a baseline in the single-file JSON format
pub fn save_to_file(baseline: &Baseline, path: &Path) -> Result<(), BaselineError> {
    let file = BaselineFile {
        name: baseline.name().to_string(),
        components: baseline.components().cloned().collect(),
    };
    let json = serde_json::to_string_pretty(&file).map_err(|e| BaselineError::SerializeError(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| BaselineError::IoError(path.display().to_string(), e.to_string()))
}

fn read(path: &Path) -> Result<String, BaselineError> {
    std::fs::read_to_string(path).map_err(|e| BaselineError::IoError(path.display().to_string(), e.to_string()))
}

fn merge_doc_tags(component: &mut Component) {
    for descriptor in component.types.values_mut() {
        if let Some(doc) = &descriptor.doc {
            descriptor.restrictions = descriptor.restrictions.union(parse_tags(doc));
        }
        for field in &mut descriptor.fields {
            if let Some(doc) = &field.doc {
                field.restrictions = field.restrictions.union(parse_tags(doc));
            }
        }
        for method in &mut descriptor.methods {
            if let Some(doc) = &method.doc {
                method.restrictions = method.restrictions.union(parse_tags(doc));
            }
        }
    }
}

/// Baseline loading errors
#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    #[error("Failed to read baseline {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse baseline {0}: {1}")]
    ParseError(String, String),

    #[error("Baseline {0} contains no components")]
    Empty(String),

    #[error("Failed to serialize baseline: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicheck_core::{RestrictionTag, TypeDescriptor, Version};
    use std::fs;

    const SINGLE: &str = r#"{
        "name": "ref",
        "components": [
            {
                "id": "org.example.core",
                "version": "1.2.0",
                "exports": [{"name": "org.example.core", "version": "1.2.0"}],
                "types": [
                    {
                        "name": "org.example.core.Widget",
                        "kind": "class",
                        "modifiers": ["public"],
                        "doc": "/** A widget.\n * @noextend\n */",
                        "methods": [
                            {
                                "name": "paint",
                                "parameters": ["int"],
                                "modifiers": ["public"],
                                "doc": "@noreference internal use"
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn load_single_file_merges_doc_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        fs::write(&path, SINGLE).unwrap();

        let baseline = load(&path).unwrap();
        assert_eq!(baseline.name(), "ref");
        assert_eq!(baseline.location(), Some(path.as_path()));

        let widget = baseline.lookup_type("org.example.core.Widget").unwrap().1;
        assert!(widget.restrictions.contains(RestrictionTag::NoExtend));
        assert!(widget.methods[0].restrictions.no_reference());
    }

    #[test]
    fn load_directory_of_components() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("current");
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("b.json"), r#"{"id": "b", "version": "2.0.0"}"#).unwrap();
        fs::write(root.join("nested").join("a.json"), r#"{"id": "a"}"#).unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();

        let baseline = load(&root).unwrap();
        assert_eq!(baseline.name(), "current");
        let ids: Vec<&str> = baseline.components().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(baseline.component("a").map(|c| c.version.clone()), Some(Version::zero()));
    }

    #[test]
    fn load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(load(&missing), Err(BaselineError::IoError(..))));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(load(&broken), Err(BaselineError::ParseError(..))));

        let empty = dir.path().join("empty.json");
        fs::write(&empty, r#"{"name": "e", "components": []}"#).unwrap();
        assert!(matches!(load(&empty), Err(BaselineError::Empty(_))));

        let empty_dir = dir.path().join("nothing");
        fs::create_dir_all(&empty_dir).unwrap();
        assert!(matches!(load(&empty_dir), Err(BaselineError::Empty(_))));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");

        let baseline = from_components(
            "saved",
            vec![Component::new("x", Version::new(1, 0, 0)).with_type(TypeDescriptor::class("x.Api"))],
        );
        save_to_file(&baseline, &path).unwrap();

        let reloaded = load(&path).unwrap();
        assert_eq!(reloaded.name(), "saved");
        assert_eq!(reloaded.fingerprint().unwrap(), baseline.fingerprint().unwrap());
    }

    #[test]
    fn parse_from_string() {
        let file = BaselineFile::from_str(SINGLE).unwrap();
        assert_eq!(file.components.len(), 1);
        assert!(BaselineFile::from_str("[]").is_err());
    }
}
