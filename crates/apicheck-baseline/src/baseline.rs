//! API baselines
//!
//! A baseline is an immutable set of components resolved against each
//! other. Package resolution results are cached per package and source
//! component; the cache sits behind a `RwLock` so baselines can be shared
//! between threads.

use crate::description::ApiDescription;
use crate::graph::{ModuleGraph, ResolverError};
use crate::loader::BaselineError;
use apicheck_core::model::package_of;
use apicheck_core::{Component, TypeDescriptor};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// package -> source component -> exporting components
type PackageCache = HashMap<String, HashMap<String, Vec<String>>>;

/// A named snapshot of components
#[derive(Debug)]
pub struct Baseline {
    name: String,
    location: Option<PathBuf>,
    components: BTreeMap<String, Component>,
    graph: ModuleGraph,
    package_cache: RwLock<PackageCache>,
}

impl Baseline {
    /// Build a baseline and resolve its module graph.
    ///
    /// A component whose id was already seen replaces the earlier one.
    pub fn new(name: impl Into<String>, components: Vec<Component>) -> Self {
        let name = name.into();
        let mut by_id = BTreeMap::new();
        for component in components {
            if let Some(previous) = by_id.insert(component.id.clone(), component) {
                tracing::debug!(baseline = %name, component = %previous.id, "replacing duplicate component");
            }
        }

        let graph = ModuleGraph::build(&by_id);
        tracing::debug!(
            baseline = %name,
            components = by_id.len(),
            resolver_errors = graph.errors().len(),
            "baseline resolved"
        );

        Self {
            name,
            location: None,
            components: by_id,
            graph,
            package_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Record where the baseline was loaded from
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    /// Components sorted by id
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn resolver_errors(&self) -> &[ResolverError] {
        self.graph.errors()
    }

    /// API description of a component
    pub fn api_description(&self, id: &str) -> Option<ApiDescription> {
        self.component(id).map(ApiDescription::from_component)
    }

    fn is_system_package(&self, package: &str) -> bool {
        package.starts_with("java.")
            || self
                .components
                .values()
                .any(|c| c.system_library && c.export(package).is_some())
    }

    /// Components supplying `package` to `source`, sorted by id.
    ///
    /// System packages come from the system library alone. Fragments see
    /// what their host sees.
    pub fn resolve_package(&self, source: &str, package: &str) -> Vec<String> {
        if let Ok(cache) = self.package_cache.read() {
            if let Some(hit) = cache.get(package).and_then(|by_source| by_source.get(source)) {
                return hit.clone();
            }
        }

        let resolved = self.compute_package(source, package, &mut BTreeSet::new());

        if let Ok(mut cache) = self.package_cache.write() {
            cache
                .entry(package.to_string())
                .or_default()
                .insert(source.to_string(), resolved.clone());
        }

        resolved
    }

    fn compute_package(&self, source: &str, package: &str, seen: &mut BTreeSet<String>) -> Vec<String> {
        if self.is_system_package(package) {
            return self
                .components
                .values()
                .filter(|c| c.system_library)
                .filter(|c| package.starts_with("java.") || c.export(package).is_some())
                .map(|c| c.id.clone())
                .collect();
        }

        if !seen.insert(source.to_string()) {
            return Vec::new();
        }

        let mut suppliers: BTreeSet<String> = self
            .graph
            .visible_packages(source)
            .into_iter()
            .filter(|visible| visible.package == package)
            .map(|visible| visible.exporter)
            .collect();

        if let Some(host) = self.graph.host_of(source) {
            suppliers.extend(self.compute_package(host, package, seen));
        }

        if let Some(component) = self.component(source) {
            if component.declares_package(package) || component.export(package).is_some() {
                suppliers.insert(component.id.clone());
            }
        }

        suppliers.into_iter().collect()
    }

    /// Drop cached resolutions of one package
    pub fn clear_package(&self, package: &str) {
        if let Ok(mut cache) = self.package_cache.write() {
            cache.remove(package);
        }
    }

    /// Number of cached (package, source) resolutions
    pub fn cached_resolutions(&self) -> usize {
        self.package_cache
            .read()
            .map(|cache| cache.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    fn lookup_all(&self, ids: Vec<String>) -> Vec<&Component> {
        ids.iter().filter_map(|id| self.component(id)).collect()
    }

    /// Components depending on the given ones, transitively, including them
    pub fn dependent_components(&self, ids: &[&str]) -> Vec<&Component> {
        self.lookup_all(self.graph.dependents(ids))
    }

    /// Components the given ones depend on, transitively, including them
    pub fn prerequisite_components(&self, ids: &[&str]) -> Vec<&Component> {
        self.lookup_all(self.graph.prerequisites(ids))
    }

    /// Dependents that see at least one package supplied by the given components
    pub fn visible_dependent_components(&self, ids: &[&str]) -> Vec<&Component> {
        let suppliers: BTreeSet<&str> = ids.iter().copied().collect();
        self.graph
            .dependents(ids)
            .into_iter()
            .filter(|id| {
                self.graph
                    .visible_packages(id)
                    .iter()
                    .any(|visible| suppliers.contains(visible.exporter.as_str()))
            })
            .filter_map(|id| self.component(&id))
            .collect()
    }

    /// Find a type as seen from `source`, resolving its package first
    pub fn find_type(&self, source: &str, type_name: &str) -> Option<(&Component, &TypeDescriptor)> {
        let outer = type_name.split('$').next().unwrap_or(type_name);
        let package = package_of(outer);
        self.resolve_package(source, package).into_iter().find_map(|id| {
            let component = self.component(&id)?;
            component.find_type(type_name).map(|t| (component, t))
        })
    }

    /// Find a type in any component, in id order
    pub fn lookup_type(&self, type_name: &str) -> Option<(&Component, &TypeDescriptor)> {
        self.components
            .values()
            .find_map(|c| c.find_type(type_name).map(|t| (c, t)))
    }

    /// SHA-256 of the canonical JSON form of all components
    pub fn fingerprint(&self) -> Result<String, BaselineError> {
        let canonical =
            serde_json::to_vec(&self.components).map_err(|e| BaselineError::SerializeError(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }
}
