//! Module graph construction and traversal
//!
//! Wires every component's package imports, bundle requirements and fragment
//! host to the components providing them. The resolution is deterministic:
//! the highest matching version wins and ties go to the smaller id.

use apicheck_core::{Component, VersionRange};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Component identifier (bundle symbolic name)
pub type ComponentId = String;

/// How a requirer is connected to its provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireKind {
    /// Import-Package of one package
    Import { package: String },

    /// Require-Bundle, optionally re-exported
    Require { reexport: bool },

    /// Fragment attached to its host
    Host,
}

/// A resolved requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    pub requirer: ComponentId,
    pub provider: ComponentId,
    pub kind: WireKind,
}

/// A package visible to a component together with the component exporting it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisiblePackage {
    pub package: String,
    pub exporter: ComponentId,
}

/// Unsatisfied mandatory requirement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    #[error("{component}: missing imported package {package} {range}")]
    MissingImport {
        component: ComponentId,
        package: String,
        range: VersionRange,
    },

    #[error("{component}: missing required bundle {bundle} {range}")]
    MissingBundle {
        component: ComponentId,
        bundle: String,
        range: VersionRange,
    },

    #[error("{component}: missing fragment host {host} {range}")]
    MissingHost {
        component: ComponentId,
        host: String,
        range: VersionRange,
    },
}

impl ResolverError {
    /// Component with the unsatisfied requirement
    pub fn component(&self) -> &str {
        match self {
            Self::MissingImport { component, .. }
            | Self::MissingBundle { component, .. }
            | Self::MissingHost { component, .. } => component,
        }
    }
}

/// Resolved module graph with forward and reverse edges
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    /// Requirer -> wires to its providers
    wires: HashMap<ComponentId, Vec<Wire>>,

    /// Forward edges: component -> components it depends on
    parents: HashMap<ComponentId, BTreeSet<ComponentId>>,

    /// Reverse edges: component -> components depending on it
    children: HashMap<ComponentId, BTreeSet<ComponentId>>,

    /// Exported package names per component
    exports: HashMap<ComponentId, Vec<String>>,

    /// Host -> attached fragments
    fragments: HashMap<ComponentId, Vec<ComponentId>>,

    nodes: BTreeSet<ComponentId>,

    errors: Vec<ResolverError>,
}

impl ModuleGraph {
    /// Resolve every component against the others
    pub fn build(components: &BTreeMap<String, Component>) -> Self {
        let mut graph = Self::default();

        for (id, component) in components {
            graph.nodes.insert(id.clone());
            graph
                .exports
                .insert(id.clone(), component.exports.iter().map(|e| e.name.clone()).collect());
        }

        for (id, component) in components {
            if let Some(host) = &component.host {
                match components.get(&host.id).filter(|c| host.range.includes(&c.version)) {
                    Some(provider) => {
                        graph.fragments.entry(provider.id.clone()).or_default().push(id.clone());
                        graph.add_wire(id, &provider.id, WireKind::Host);
                    }
                    None => graph.errors.push(ResolverError::MissingHost {
                        component: id.clone(),
                        host: host.id.clone(),
                        range: host.range.clone(),
                    }),
                }
            }

            for requirement in &component.requires {
                match components.get(&requirement.id).filter(|c| requirement.range.includes(&c.version)) {
                    Some(provider) => graph.add_wire(
                        id,
                        &provider.id,
                        WireKind::Require {
                            reexport: requirement.reexport,
                        },
                    ),
                    None if requirement.optional => {}
                    None => graph.errors.push(ResolverError::MissingBundle {
                        component: id.clone(),
                        bundle: requirement.id.clone(),
                        range: requirement.range.clone(),
                    }),
                }
            }

            for import in &component.imports {
                if component.export(&import.name).is_some() {
                    continue;
                }
                match best_exporter(components, &import.name, &import.range) {
                    Some(provider) => graph.add_wire(
                        id,
                        provider,
                        WireKind::Import {
                            package: import.name.clone(),
                        },
                    ),
                    None if import.optional => {}
                    None => graph.errors.push(ResolverError::MissingImport {
                        component: id.clone(),
                        package: import.name.clone(),
                        range: import.range.clone(),
                    }),
                }
            }
        }

        for error in &graph.errors {
            tracing::warn!(component = error.component(), "{}", error);
        }

        for fragments in graph.fragments.values_mut() {
            fragments.sort();
        }

        graph
    }

    fn add_wire(&mut self, requirer: &str, provider: &str, kind: WireKind) {
        self.wires.entry(requirer.to_string()).or_default().push(Wire {
            requirer: requirer.to_string(),
            provider: provider.to_string(),
            kind,
        });
        if requirer != provider {
            self.parents
                .entry(requirer.to_string())
                .or_default()
                .insert(provider.to_string());
            self.children
                .entry(provider.to_string())
                .or_default()
                .insert(requirer.to_string());
        }
    }

    /// All components in the graph, sorted
    pub fn nodes(&self) -> impl Iterator<Item = &ComponentId> {
        self.nodes.iter()
    }

    /// Wires leaving a component
    pub fn wires(&self, id: &str) -> &[Wire] {
        self.wires.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Host a fragment is attached to
    pub fn host_of(&self, id: &str) -> Option<&str> {
        self.wires(id)
            .iter()
            .find(|w| w.kind == WireKind::Host)
            .map(|w| w.provider.as_str())
    }

    /// Fragments attached to a host
    pub fn fragments_of(&self, host: &str) -> &[ComponentId] {
        self.fragments.get(host).map(Vec::as_slice).unwrap_or_default()
    }

    /// Unsatisfied mandatory requirements
    pub fn errors(&self) -> &[ResolverError] {
        &self.errors
    }

    /// Packages a component sees through its imports and required bundles.
    ///
    /// Requiring a bundle exposes its exports, its fragments' exports and,
    /// transitively, everything it re-exports.
    pub fn visible_packages(&self, id: &str) -> Vec<VisiblePackage> {
        let mut visible = BTreeSet::new();

        for wire in self.wires(id) {
            if let WireKind::Import { package } = &wire.kind {
                visible.insert(VisiblePackage {
                    package: package.clone(),
                    exporter: wire.provider.clone(),
                });
            }
        }

        let mut visited = HashSet::new();
        let mut queue: VecDeque<&str> = self
            .wires(id)
            .iter()
            .filter(|w| matches!(w.kind, WireKind::Require { .. }))
            .map(|w| w.provider.as_str())
            .collect();

        while let Some(bundle) = queue.pop_front() {
            if !visited.insert(bundle) {
                continue;
            }

            let suppliers = std::iter::once(bundle).chain(self.fragments_of(bundle).iter().map(String::as_str));
            for supplier in suppliers {
                for package in self.exports.get(supplier).into_iter().flatten() {
                    visible.insert(VisiblePackage {
                        package: package.clone(),
                        exporter: supplier.to_string(),
                    });
                }
            }

            for wire in self.wires(bundle) {
                if wire.kind == (WireKind::Require { reexport: true }) && !visited.contains(wire.provider.as_str()) {
                    queue.push_back(&wire.provider);
                }
            }
        }

        visible.into_iter().collect()
    }

    /// Direct dependencies of a component
    pub fn direct_prerequisites(&self, id: &str) -> Vec<&ComponentId> {
        self.parents.get(id).map(|p| p.iter().collect()).unwrap_or_default()
    }

    /// Components depending directly on a component
    pub fn direct_dependents(&self, id: &str) -> Vec<&ComponentId> {
        self.children.get(id).map(|c| c.iter().collect()).unwrap_or_default()
    }

    /// Transitive dependents of the given components, including themselves
    pub fn dependents(&self, ids: &[&str]) -> Vec<ComponentId> {
        Self::closure(ids, &self.children, &self.nodes)
    }

    /// Transitive prerequisites of the given components, including themselves
    pub fn prerequisites(&self, ids: &[&str]) -> Vec<ComponentId> {
        Self::closure(ids, &self.parents, &self.nodes)
    }

    fn closure(
        ids: &[&str],
        edges: &HashMap<ComponentId, BTreeSet<ComponentId>>,
        nodes: &BTreeSet<ComponentId>,
    ) -> Vec<ComponentId> {
        let mut visited: BTreeSet<ComponentId> = BTreeSet::new();
        let mut queue: VecDeque<&str> = ids.iter().copied().filter(|id| nodes.contains(*id)).collect();

        // BFS over the edge map
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            if let Some(next) = edges.get(current) {
                for id in next {
                    if !visited.contains(id) {
                        queue.push_back(id);
                    }
                }
            }
        }

        visited.into_iter().collect()
    }

    /// Providers before requirers (Kahn's algorithm); `None` on cycles
    pub fn topological_order(&self) -> Option<Vec<ComponentId>> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .map(|id| (id.as_str(), self.parents.get(id).map_or(0, BTreeSet::len)))
            .collect();

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            result.push(id.to_string());
            for child in self.children.get(id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(child.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }

        if result.len() == self.nodes.len() {
            Some(result)
        } else {
            None
        }
    }
}

/// Highest-version export of a package in range, ties broken by component id
fn best_exporter<'a>(
    components: &'a BTreeMap<String, Component>,
    package: &str,
    range: &VersionRange,
) -> Option<&'a str> {
    let mut best: Option<(&'a str, &'a apicheck_core::Version)> = None;
    // BTreeMap iteration is id-ordered, so strict > keeps the smallest id on ties
    for (id, component) in components {
        for export in component.exports.iter().filter(|e| e.name == package) {
            if !range.includes(&export.version) {
                continue;
            }
            match best {
                Some((_, version)) if export.version <= *version => {}
                _ => best = Some((id.as_str(), &export.version)),
            }
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicheck_core::{BundleRequirement, PackageExport, PackageImport, Version};
    use pretty_assertions::assert_eq;

    fn map(components: Vec<Component>) -> BTreeMap<String, Component> {
        components.into_iter().map(|c| (c.id.clone(), c)).collect()
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn import_picks_highest_version() {
        let components = map(vec![
            Component::new("old", v("1.0.0")).with_export(PackageExport::new("p").with_version(v("1.0.0"))),
            Component::new("new", v("1.0.0")).with_export(PackageExport::new("p").with_version(v("2.0.0"))),
            Component::new("client", v("1.0.0")).with_import(PackageImport::new("p")),
        ]);
        let graph = ModuleGraph::build(&components);

        assert_eq!(
            graph.visible_packages("client"),
            vec![VisiblePackage {
                package: "p".into(),
                exporter: "new".into()
            }]
        );
        assert!(graph.errors().is_empty());
    }

    #[test]
    fn import_respects_range_and_ties() {
        let mut import = PackageImport::new("p");
        import.range = "[1.0.0,2.0.0)".parse().unwrap();
        let components = map(vec![
            Component::new("b", v("1.0.0")).with_export(PackageExport::new("p").with_version(v("1.5.0"))),
            Component::new("a", v("1.0.0")).with_export(PackageExport::new("p").with_version(v("1.5.0"))),
            Component::new("c", v("1.0.0")).with_export(PackageExport::new("p").with_version(v("2.0.0"))),
            Component::new("client", v("1.0.0")).with_import(import),
        ]);
        let graph = ModuleGraph::build(&components);

        assert_eq!(graph.direct_prerequisites("client"), vec!["a"]);
    }

    #[test]
    fn missing_requirements_are_errors() {
        let mut optional = BundleRequirement::new("maybe");
        optional.optional = true;
        let components = map(vec![Component::new("client", v("1.0.0"))
            .with_requirement(BundleRequirement::new("absent"))
            .with_requirement(optional)
            .with_import(PackageImport::new("nowhere"))]);
        let graph = ModuleGraph::build(&components);

        assert_eq!(graph.errors().len(), 2);
        assert!(graph.errors().iter().all(|e| e.component() == "client"));
        assert!(graph.nodes().any(|n| n == "client"));
    }

    #[test]
    fn reexport_is_transitive() {
        let components = map(vec![
            Component::new("base", v("1.0.0")).with_export(PackageExport::new("base.api")),
            Component::new("middle", v("1.0.0"))
                .with_export(PackageExport::new("middle.api"))
                .with_requirement(BundleRequirement::new("base").reexported()),
            Component::new("hidden", v("1.0.0")).with_export(PackageExport::new("hidden.api")),
            Component::new("top", v("1.0.0"))
                .with_requirement(BundleRequirement::new("middle"))
                .with_requirement(BundleRequirement::new("hidden")),
            Component::new("other", v("1.0.0")).with_requirement(BundleRequirement::new("top")),
        ]);
        let graph = ModuleGraph::build(&components);

        let packages: Vec<String> = graph.visible_packages("top").into_iter().map(|p| p.package).collect();
        assert_eq!(packages, vec!["base.api", "hidden.api", "middle.api"]);

        // top does not re-export anything
        assert!(graph.visible_packages("other").is_empty());
    }

    #[test]
    fn fragments_contribute_to_host_exports() {
        let components = map(vec![
            Component::new("host", v("1.0.0")).with_export(PackageExport::new("host.api")),
            Component::new("host.frag", v("1.0.0"))
                .with_host("host")
                .with_export(PackageExport::new("host.extra")),
            Component::new("client", v("1.0.0")).with_requirement(BundleRequirement::new("host")),
        ]);
        let graph = ModuleGraph::build(&components);

        assert_eq!(graph.host_of("host.frag"), Some("host"));
        assert_eq!(graph.fragments_of("host"), &["host.frag".to_string()]);
        assert!(graph.visible_packages("client").contains(&VisiblePackage {
            package: "host.extra".into(),
            exporter: "host.frag".into(),
        }));
    }

    #[test]
    fn closures_include_inputs() {
        let components = map(vec![
            Component::new("a", v("1.0.0")),
            Component::new("b", v("1.0.0")).with_requirement(BundleRequirement::new("a")),
            Component::new("c", v("1.0.0")).with_requirement(BundleRequirement::new("b")),
            Component::new("d", v("1.0.0")),
        ]);
        let graph = ModuleGraph::build(&components);

        assert_eq!(graph.dependents(&["a"]), vec!["a", "b", "c"]);
        assert_eq!(graph.prerequisites(&["c"]), vec!["a", "b", "c"]);
        assert_eq!(graph.direct_dependents("a"), vec!["b"]);
        assert_eq!(graph.dependents(&["unknown"]), Vec::<String>::new());
    }

    #[test]
    fn topological_order_and_cycles() {
        let components = map(vec![
            Component::new("c", v("1.0.0")).with_requirement(BundleRequirement::new("b")),
            Component::new("b", v("1.0.0")).with_requirement(BundleRequirement::new("a")),
            Component::new("a", v("1.0.0")),
        ]);
        assert_eq!(
            ModuleGraph::build(&components).topological_order(),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );

        let cyclic = map(vec![
            Component::new("x", v("1.0.0")).with_requirement(BundleRequirement::new("y")),
            Component::new("y", v("1.0.0")).with_requirement(BundleRequirement::new("x")),
        ]);
        assert_eq!(ModuleGraph::build(&cyclic).topological_order(), None);
    }
}
