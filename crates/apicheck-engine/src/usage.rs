//! Usage scanning
//!
//! Looks at how the types of a component use types supplied by other
//! components and reports uses that violate the supplier's restriction
//! tags. Uses within one component are never problems.

use crate::hierarchy::{Hierarchy, TypeRef};
use crate::problems::ProblemFactory;
use apicheck_baseline::{ApiDescription, Baseline, ElementKey};
use apicheck_core::model::CONSTRUCTOR_NAME;
use apicheck_core::{
    ElementType, MethodDescriptor, MethodKey, Problem, ProblemKind, Reference, ReferenceKind, RestrictionTag,
    Restrictions, TypeDescriptor, TypeKind,
};
use std::collections::{BTreeSet, HashMap};

/// Scans the components of one baseline for restriction violations
pub struct UsageScanner<'a> {
    baseline: &'a Baseline,
    hierarchy: Hierarchy<'a>,
    descriptions: HashMap<String, ApiDescription>,
}

impl<'a> UsageScanner<'a> {
    pub fn new(baseline: &'a Baseline) -> Self {
        let descriptions = baseline
            .components()
            .map(|c| (c.id.clone(), ApiDescription::from_component(c)))
            .collect();
        Self {
            baseline,
            hierarchy: Hierarchy::new(baseline),
            descriptions,
        }
    }

    /// Tags in force for an element of the component declaring it
    fn tags(&self, component_id: &str, key: &ElementKey) -> Restrictions {
        self.descriptions
            .get(component_id)
            .map(|d| d.effective_restrictions(key))
            .unwrap_or_default()
    }

    fn type_tags(&self, target: TypeRef<'_>) -> Restrictions {
        self.tags(&target.component.id, &ElementKey::Type(target.descriptor.name.clone()))
    }

    /// Resolve a type used by `source`, ignoring types of `source` itself
    fn foreign(&self, source: &str, type_name: &str) -> Option<TypeRef<'a>> {
        self.hierarchy
            .resolve(source, type_name)
            .filter(|found| found.component.id != source)
    }

    /// Problems of every type in one component
    pub fn scan_component(&self, component_id: &str) -> Vec<Problem> {
        let Some(component) = self.baseline.component(component_id) else {
            return Vec::new();
        };

        let mut problems = Vec::new();
        for descriptor in component.types.values() {
            self.check_extends(component_id, descriptor, &mut problems);
            if descriptor.kind != TypeKind::Interface {
                self.check_implements(component_id, descriptor, &mut problems);
                self.check_overrides(component_id, descriptor, &mut problems);
            }
            for reference in &descriptor.references {
                self.check_reference(component_id, descriptor, reference, &mut problems);
            }
        }

        tracing::debug!(component = %component_id, problems = problems.len(), "scanned usage");
        problems
    }

    fn check_extends(&self, source: &str, descriptor: &TypeDescriptor, problems: &mut Vec<Problem>) {
        let supertypes: Vec<&String> = match descriptor.kind {
            TypeKind::Class => descriptor.superclass.iter().collect(),
            TypeKind::Interface => descriptor.interfaces.iter().collect(),
            _ => Vec::new(),
        };

        for name in supertypes {
            let Some(target) = self.foreign(source, name) else {
                continue;
            };
            if self.type_tags(target).contains(RestrictionTag::NoExtend) {
                problems.push(usage_problem(
                    ProblemKind::IllegalExtend,
                    ElementType::for_type_kind(descriptor.kind),
                    source,
                    descriptor,
                    format!("{} illegally extends {}", descriptor.name, name),
                    vec![name.clone(), descriptor.name.clone()],
                ));
            }
        }
    }

    fn check_implements(&self, source: &str, descriptor: &TypeDescriptor, problems: &mut Vec<Problem>) {
        let element_type = ElementType::for_type_kind(descriptor.kind);
        let mut reported = BTreeSet::new();

        for name in &descriptor.interfaces {
            if let Some(target) = self.foreign(source, name) {
                if self.type_tags(target).no_implement() {
                    reported.insert(name.clone());
                    problems.push(usage_problem(
                        ProblemKind::IllegalImplement,
                        element_type,
                        source,
                        descriptor,
                        format!("{} illegally implements {}", descriptor.name, name),
                        vec![name.clone(), descriptor.name.clone()],
                    ));
                }
            }
        }

        // Through interfaces that extend a restricted interface of another component
        for name in &descriptor.interfaces {
            let Some(direct) = self.hierarchy.resolve(source, name) else {
                continue;
            };
            for inherited in self.hierarchy.superinterfaces(&direct.component.id, direct.descriptor) {
                let inherited_name = &inherited.descriptor.name;
                if inherited.component.id == source
                    || reported.contains(inherited_name)
                    || !self.type_tags(inherited).no_implement()
                {
                    continue;
                }
                reported.insert(inherited_name.clone());
                problems.push(usage_problem(
                    ProblemKind::IndirectIllegalImplement,
                    element_type,
                    source,
                    descriptor,
                    format!(
                        "{} illegally implements {} through {}",
                        descriptor.name, inherited_name, name
                    ),
                    vec![inherited_name.clone(), name.clone(), descriptor.name.clone()],
                ));
            }
        }
    }

    fn check_overrides(&self, source: &str, descriptor: &TypeDescriptor, problems: &mut Vec<Problem>) {
        for method in &descriptor.methods {
            if method.is_constructor() || method.modifiers.is_static || !method.modifiers.visibility.is_client_visible() {
                continue;
            }
            let key = method.key();
            let inherited = self.hierarchy.inherited_method(source, descriptor, &key).or_else(|| {
                self.hierarchy
                    .interface_method(source, descriptor, &key)
                    .filter(|(_, m)| m.modifiers.is_default)
            });
            let Some((owner, overridden)) = inherited else {
                continue;
            };
            if owner.component.id == source {
                continue;
            }
            let key = ElementKey::method(&owner.descriptor.name, overridden);
            if self.tags(&owner.component.id, &key).no_override() {
                let signature = overridden.display_signature(&owner.descriptor.name);
                problems.push(
                    usage_problem(
                        ProblemKind::IllegalOverride,
                        ElementType::Method,
                        source,
                        descriptor,
                        format!(
                            "{} illegally overrides {}.{}",
                            descriptor.name, owner.descriptor.name, signature
                        ),
                        vec![owner.descriptor.name.clone(), signature, descriptor.name.clone()],
                    )
                    .with_member(method.display_signature(&descriptor.name)),
                );
            }
        }
    }

    /// A method of `target`, of its superclasses or of the interfaces it inherits
    fn find_method(&self, target: TypeRef<'a>, key: &MethodKey) -> Option<(TypeRef<'a>, &'a MethodDescriptor)> {
        if let Some(method) = target.descriptor.method(key) {
            return Some((target, method));
        }
        if key.name == CONSTRUCTOR_NAME {
            return None;
        }
        let (component_id, descriptor) = (&target.component.id, target.descriptor);
        self.hierarchy
            .inherited_method(component_id, descriptor, key)
            .or_else(|| self.hierarchy.interface_method(component_id, descriptor, key))
    }

    fn check_reference(
        &self,
        source: &str,
        descriptor: &TypeDescriptor,
        reference: &Reference,
        problems: &mut Vec<Problem>,
    ) {
        let Some(target) = self.foreign(source, &reference.target_type) else {
            return;
        };
        let target_name = target.descriptor.name.clone();
        let type_tags = self.type_tags(target);

        let mut found = Vec::new();
        match reference.kind {
            ReferenceKind::TypeReference => {
                if type_tags.no_reference() {
                    found.push(violation(
                        ProblemKind::IllegalReference,
                        ElementType::for_type_kind(target.descriptor.kind),
                        format!("{} illegally references {}", descriptor.name, target_name),
                        vec![target_name.clone(), descriptor.name.clone()],
                    ));
                }
            }
            ReferenceKind::Instantiate => {
                if type_tags.no_instantiate() {
                    found.push(violation(
                        ProblemKind::IllegalInstantiate,
                        ElementType::Class,
                        format!("{} illegally instantiates {}", descriptor.name, target_name),
                        vec![target_name.clone(), descriptor.name.clone()],
                    ));
                }
                let key = MethodKey::new(CONSTRUCTOR_NAME, &reference.parameters);
                if let Some((owner, constructor)) = self.find_method(target, &key) {
                    found.extend(self.member_reference(source, descriptor, owner, constructor));
                } else if type_tags.no_reference() {
                    found.push(violation(
                        ProblemKind::IllegalReference,
                        ElementType::Constructor,
                        format!("{} illegally references a constructor of {}", descriptor.name, target_name),
                        vec![target_name.clone(), descriptor.name.clone()],
                    ));
                }
            }
            ReferenceKind::Call => {
                let name = reference.member.as_deref().unwrap_or(CONSTRUCTOR_NAME);
                let key = MethodKey::new(name, &reference.parameters);
                if let Some((owner, method)) = self.find_method(target, &key) {
                    found.extend(self.member_reference(source, descriptor, owner, method));
                } else if type_tags.no_reference() {
                    let signature = MethodDescriptor::new(name, reference.parameters.clone(), Default::default())
                        .display_signature(&target_name);
                    found.push(violation(
                        ProblemKind::IllegalReference,
                        ElementType::Method,
                        format!(
                            "{} illegally references method {}.{}",
                            descriptor.name, target_name, signature
                        ),
                        vec![target_name.clone(), signature, descriptor.name.clone()],
                    ));
                }
            }
            ReferenceKind::FieldAccess => {
                let Some(name) = reference.member.as_deref() else {
                    return;
                };
                let owner = std::iter::once(target)
                    .chain(self.hierarchy.superclasses(&target.component.id, target.descriptor))
                    .chain(self.hierarchy.all_superinterfaces(&target.component.id, target.descriptor))
                    .find(|t| t.descriptor.field(name).is_some());
                if let Some(owner) = owner.filter(|o| o.component.id != source) {
                    let key = ElementKey::field(&owner.descriptor.name, name);
                    if self.tags(&owner.component.id, &key).no_reference() {
                        found.push(violation(
                            ProblemKind::IllegalReference,
                            ElementType::Field,
                            format!(
                                "{} illegally references field {}.{}",
                                descriptor.name, owner.descriptor.name, name
                            ),
                            vec![owner.descriptor.name.clone(), name.to_string(), descriptor.name.clone()],
                        ));
                    }
                }
            }
        }

        for (kind, element_type, message, args) in found {
            let mut problem = usage_problem(kind, element_type, source, descriptor, message, args);
            if let Some(member) = &reference.source_member {
                problem = problem.with_member(member);
            }
            if let Some(line) = reference.line {
                problem = problem.with_line(line);
            }
            problems.push(problem);
        }
    }

    fn member_reference(
        &self,
        source: &str,
        descriptor: &TypeDescriptor,
        owner: TypeRef<'_>,
        method: &MethodDescriptor,
    ) -> Option<Violation> {
        if owner.component.id == source {
            return None;
        }
        let key = ElementKey::method(&owner.descriptor.name, method);
        if !self.tags(&owner.component.id, &key).no_reference() {
            return None;
        }
        let signature = method.display_signature(&owner.descriptor.name);
        let (element_type, noun) = if method.is_constructor() {
            (ElementType::Constructor, "constructor")
        } else {
            (ElementType::Method, "method")
        };
        Some(violation(
            ProblemKind::IllegalReference,
            element_type,
            format!(
                "{} illegally references {} {}.{}",
                descriptor.name, noun, owner.descriptor.name, signature
            ),
            vec![owner.descriptor.name.clone(), signature, descriptor.name.clone()],
        ))
    }
}

type Violation = (ProblemKind, ElementType, String, Vec<String>);

fn violation(kind: ProblemKind, element_type: ElementType, message: String, args: Vec<String>) -> Violation {
    (kind, element_type, message, args)
}

fn usage_problem(
    kind: ProblemKind,
    element_type: ElementType,
    component_id: &str,
    descriptor: &TypeDescriptor,
    message: String,
    args: Vec<String>,
) -> Problem {
    Problem::new(kind, ProblemFactory::default_severity(kind), element_type, component_id, message)
        .with_type(&descriptor.name)
        .with_args(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicheck_core::{
        BundleRequirement, Component, FieldDescriptor, Modifiers, PackageExport, Version,
    };
    use pretty_assertions::assert_eq;

    fn tags(list: &[RestrictionTag]) -> Restrictions {
        Restrictions::new(list)
    }

    fn baseline(client_types: Vec<TypeDescriptor>) -> Baseline {
        let v = Version::new(1, 0, 0);
        let mut client = Component::new("client", v.clone()).with_requirement(BundleRequirement::new("api"));
        for t in client_types {
            client.add_type(t);
        }

        Baseline::new(
            "usage",
            vec![
                Component::new("api", v)
                    .with_export(PackageExport::new("api"))
                    .with_type(
                        TypeDescriptor::class("api.Sealed")
                            .with_restrictions(tags(&[RestrictionTag::NoExtend, RestrictionTag::NoInstantiate])),
                    )
                    .with_type(
                        TypeDescriptor::class("api.Base")
                            .with_method(
                                MethodDescriptor::new("hook", vec![], Modifiers::public())
                                    .with_restrictions(tags(&[RestrictionTag::NoOverride])),
                            )
                            .with_method(
                                MethodDescriptor::new("internal", vec!["int".into()], Modifiers::public())
                                    .with_restrictions(tags(&[RestrictionTag::NoReference])),
                            )
                            .with_field(
                                FieldDescriptor::new("cache", "int", Modifiers::public())
                                    .with_restrictions(tags(&[RestrictionTag::NoReference])),
                            ),
                    )
                    .with_type(TypeDescriptor::class("api.Derived").with_superclass("api.Base"))
                    .with_type(
                        TypeDescriptor::interface("api.Listener")
                            .with_restrictions(tags(&[RestrictionTag::NoImplement])),
                    )
                    .with_type(TypeDescriptor::interface("api.Hidden").with_restrictions(tags(&[RestrictionTag::NoReference])))
                    .with_type(
                        TypeDescriptor::interface("api.Service")
                            .with_method(
                                MethodDescriptor::new("describe", vec![], Modifiers::public().set_default())
                                    .with_restrictions(tags(&[RestrictionTag::NoOverride])),
                            )
                            .with_method(MethodDescriptor::new("run", vec![], Modifiers::public().set_abstract()))
                            .with_field(
                                FieldDescriptor::new("LIMIT", "int", Modifiers::public().set_static())
                                    .with_restrictions(tags(&[RestrictionTag::NoReference])),
                            ),
                    )
                    .with_type(TypeDescriptor::class("api.BasicService").with_interface("api.Service")),
                client,
            ],
        )
    }

    fn ids(problems: &[Problem]) -> Vec<String> {
        problems.iter().map(|p| p.id()).collect()
    }

    #[test]
    fn hierarchy_violations() {
        let baseline = baseline(vec![
            TypeDescriptor::class("client.Bad")
                .with_superclass("api.Sealed")
                .with_interface("api.Listener"),
            TypeDescriptor::interface("client.Local").with_interface("api.Listener"),
            TypeDescriptor::class("client.Indirect").with_interface("client.Local"),
            TypeDescriptor::class("client.Override")
                .with_superclass("api.Base")
                .with_method(MethodDescriptor::new("hook", vec![], Modifiers::public())),
        ]);

        let problems = UsageScanner::new(&baseline).scan_component("client");
        assert_eq!(
            ids(&problems),
            vec![
                "USAGE.CLASS.ILLEGAL_EXTEND.NONE",
                "USAGE.CLASS.ILLEGAL_IMPLEMENT.NONE",
                "USAGE.CLASS.INDIRECT_ILLEGAL_IMPLEMENT.NONE",
                "USAGE.METHOD.ILLEGAL_OVERRIDE.NONE",
            ]
        );
        assert_eq!(
            problems[2].message_args,
            vec!["api.Listener".to_string(), "client.Local".to_string(), "client.Indirect".to_string()]
        );
        assert_eq!(problems[3].member.as_deref(), Some("hook()"));
    }

    #[test]
    fn declared_references() {
        let baseline = baseline(vec![TypeDescriptor::class("client.User")
            .with_reference(Reference::new(ReferenceKind::Instantiate, "api.Sealed").at_line(10))
            .with_reference(Reference::call("api.Derived", "internal", vec!["int".into()]).at_line(11))
            .with_reference(Reference::field("api.Derived", "cache").at_line(12))
            .with_reference(Reference::new(ReferenceKind::TypeReference, "api.Hidden").at_line(13))
            .with_reference(Reference::call("api.Base", "hook", vec![]))]);

        let problems = UsageScanner::new(&baseline).scan_component("client");
        assert_eq!(
            ids(&problems),
            vec![
                "USAGE.CLASS.ILLEGAL_INSTANTIATE.NONE",
                "USAGE.METHOD.ILLEGAL_REFERENCE.NONE",
                "USAGE.FIELD.ILLEGAL_REFERENCE.NONE",
                "USAGE.INTERFACE.ILLEGAL_REFERENCE.NONE",
            ]
        );
        let lines: Vec<Option<usize>> = problems.iter().map(|p| p.line).collect();
        assert_eq!(lines, vec![Some(10), Some(11), Some(12), Some(13)]);
        assert_eq!(
            problems[1].message_args,
            vec!["api.Base".to_string(), "internal(int)".to_string(), "client.User".to_string()]
        );
    }

    #[test]
    fn same_component_use_is_allowed() {
        let baseline = baseline(vec![]);
        assert!(UsageScanner::new(&baseline).scan_component("api").is_empty());
        assert!(UsageScanner::new(&baseline).scan_component("missing").is_empty());
    }

    #[test]
    fn overriding_restricted_default_method() {
        let baseline = baseline(vec![
            TypeDescriptor::class("client.Impl")
                .with_interface("api.Service")
                .with_method(MethodDescriptor::new("describe", vec![], Modifiers::public()))
                .with_method(MethodDescriptor::new("run", vec![], Modifiers::public())),
            TypeDescriptor::class("client.Sub")
                .with_superclass("api.BasicService")
                .with_method(MethodDescriptor::new("describe", vec![], Modifiers::public())),
        ]);

        let problems = UsageScanner::new(&baseline).scan_component("client");
        assert_eq!(
            ids(&problems),
            vec!["USAGE.METHOD.ILLEGAL_OVERRIDE.NONE", "USAGE.METHOD.ILLEGAL_OVERRIDE.NONE"]
        );
        let mut overriders: Vec<&str> = problems.iter().filter_map(|p| p.type_name.as_deref()).collect();
        overriders.sort();
        assert_eq!(overriders, vec!["client.Impl", "client.Sub"]);
        for problem in &problems {
            assert_eq!(problem.message_args[0], "api.Service");
            assert_eq!(problem.message_args[1], "describe()");
            assert_eq!(problem.member.as_deref(), Some("describe()"));
        }
    }

    #[test]
    fn references_into_restricted_interfaces() {
        let baseline = baseline(vec![TypeDescriptor::class("client.Caller")
            .with_reference(Reference::call("api.Hidden", "unknown", vec!["java.lang.String".into()]).at_line(5))
            .with_reference(Reference::field("api.BasicService", "LIMIT").at_line(6))
            .with_reference(Reference::call("api.BasicService", "run", vec![]).at_line(7))]);

        let problems = UsageScanner::new(&baseline).scan_component("client");
        assert_eq!(
            ids(&problems),
            vec!["USAGE.METHOD.ILLEGAL_REFERENCE.NONE", "USAGE.FIELD.ILLEGAL_REFERENCE.NONE"]
        );
        assert_eq!(
            problems[0].message_args,
            vec!["api.Hidden".to_string(), "unknown(String)".to_string(), "client.Caller".to_string()]
        );
        assert_eq!(
            problems[1].message_args,
            vec!["api.Service".to_string(), "LIMIT".to_string(), "client.Caller".to_string()]
        );
        assert_eq!(problems[1].line, Some(6));
    }
}
