//! Restriction tag validation

use crate::problems::ProblemFactory;
use apicheck_baseline::{supported_tags, TagContext};
use apicheck_core::{Component, ElementType, Problem, ProblemKind, Restrictions};

/// Reports restriction tags placed where they have no meaning
#[derive(Debug, Clone, Copy, Default)]
pub struct TagValidator;

impl TagValidator {
    pub fn new() -> Self {
        Self
    }

    /// Problems for every unsupported tag in a component
    pub fn validate(&self, component: &Component) -> Vec<Problem> {
        let mut problems = Vec::new();

        for descriptor in component.types.values() {
            let type_element = ElementType::for_type_kind(descriptor.kind);
            self.check(
                component,
                TagContext::Type(descriptor),
                descriptor.restrictions,
                type_element,
                &descriptor.name,
                None,
                &mut problems,
            );

            for field in &descriptor.fields {
                self.check(
                    component,
                    TagContext::Field { owner: descriptor, field },
                    field.restrictions,
                    ElementType::Field,
                    &descriptor.name,
                    Some(field.name.clone()),
                    &mut problems,
                );
            }

            for method in &descriptor.methods {
                let element_type = if method.is_constructor() {
                    ElementType::Constructor
                } else {
                    ElementType::Method
                };
                self.check(
                    component,
                    TagContext::Method { owner: descriptor, method },
                    method.restrictions,
                    element_type,
                    &descriptor.name,
                    Some(method.display_signature(&descriptor.name)),
                    &mut problems,
                );
            }
        }

        if !problems.is_empty() {
            tracing::debug!(component = %component.id, problems = problems.len(), "unsupported tags");
        }
        problems
    }

    #[allow(clippy::too_many_arguments)]
    fn check(
        &self,
        component: &Component,
        context: TagContext<'_>,
        declared: Restrictions,
        element_type: ElementType,
        type_name: &str,
        member: Option<String>,
        problems: &mut Vec<Problem>,
    ) {
        let unsupported = declared.difference(supported_tags(context));
        if unsupported.is_empty() {
            return;
        }

        let description = context.describe();
        for tag in unsupported.iter() {
            let javadoc = tag.javadoc();
            let mut problem = Problem::new(
                ProblemKind::UnsupportedTag,
                ProblemFactory::default_severity(ProblemKind::UnsupportedTag),
                element_type,
                &component.id,
                format!("{} is an unsupported tag for {}", javadoc, description),
            )
            .with_type(type_name)
            .with_args(vec![javadoc, description.clone()]);
            if let Some(member) = &member {
                problem = problem.with_member(member);
            }
            problems.push(problem);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicheck_core::{
        FieldDescriptor, MethodDescriptor, Modifiers, RestrictionTag, Severity, TypeDescriptor, TypeKind, Version,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn reports_misplaced_tags() {
        let final_class = TypeDescriptor::new("p.F", TypeKind::Class, Modifiers::public().set_final())
            .with_restrictions(Restrictions::new(&[RestrictionTag::NoExtend, RestrictionTag::NoReference]));
        let constants = TypeDescriptor::new("p.E", TypeKind::Enum, Modifiers::public()).with_field(
            FieldDescriptor::enum_constant("ONE", "p.E").with_restrictions(Restrictions::new(&[RestrictionTag::NoExtend])),
        );
        let interface = TypeDescriptor::interface("p.I").with_method(
            MethodDescriptor::new("m", vec![], Modifiers::public().set_abstract())
                .with_restrictions(Restrictions::new(&[RestrictionTag::NoOverride])),
        );

        let component = Component::new("c", Version::new(1, 0, 0))
            .with_type(final_class)
            .with_type(constants)
            .with_type(interface);

        let problems = TagValidator::new().validate(&component);
        let ids: Vec<String> = problems.iter().map(|p| p.id()).collect();
        assert_eq!(
            ids,
            vec!["USAGE.FIELD.UNSUPPORTED_TAG.NONE", "USAGE.CLASS.UNSUPPORTED_TAG.NONE", "USAGE.METHOD.UNSUPPORTED_TAG.NONE"]
        );
        assert_eq!(
            problems[0].message_args,
            vec!["@noextend".to_string(), "an enum constant in an enum".to_string()]
        );
        assert_eq!(
            problems[1].message_args,
            vec!["@noextend".to_string(), "a final class".to_string()]
        );
        assert_eq!(problems[2].member.as_deref(), Some("m()"));
        assert!(problems.iter().all(|p| p.severity == Severity::Warn));
    }

    #[test]
    fn supported_tags_are_quiet() {
        let component = Component::new("c", Version::new(1, 0, 0)).with_type(
            TypeDescriptor::class("p.A")
                .with_restrictions(Restrictions::new(&[RestrictionTag::NoExtend, RestrictionTag::NoInstantiate]))
                .with_method(
                    MethodDescriptor::new("m", vec![], Modifiers::public())
                        .with_restrictions(Restrictions::new(&[RestrictionTag::NoOverride, RestrictionTag::NoReference])),
                ),
        );
        assert!(TagValidator::new().validate(&component).is_empty());
    }
}
