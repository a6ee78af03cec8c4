//! Turning incompatible deltas into problems

use apicheck_core::{Delta, DeltaFlag, DeltaKind, ElementType, Problem, ProblemKind, Severity};

/// Builds compatibility problems from deltas
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemFactory;

impl ProblemFactory {
    pub fn new() -> Self {
        Self
    }

    /// Default severity of a problem kind before configuration overrides
    pub fn default_severity(kind: ProblemKind) -> Severity {
        match kind {
            ProblemKind::UnsupportedTag
            | ProblemKind::MajorVersionChangeNoBreakage
            | ProblemKind::MinorVersionChangeNoNewApi => Severity::Warn,
            _ => Severity::Error,
        }
    }

    /// Compatibility problem for an incompatible delta
    pub fn compatibility(&self, delta: &Delta) -> Problem {
        let kind = match delta.kind {
            DeltaKind::Added => ProblemKind::Added,
            DeltaKind::Removed => ProblemKind::Removed,
            DeltaKind::Changed => ProblemKind::Changed,
        };

        let mut problem = Problem::new(
            kind,
            Self::default_severity(kind),
            delta.element_type,
            &delta.component_id,
            compatibility_message(delta),
        )
        .with_flag(delta.flag)
        .with_args(delta.message_args.clone());

        if !delta.type_name.is_empty() {
            problem = problem.with_type(&delta.type_name);
        }
        if let Some(member) = &delta.member {
            problem = problem.with_member(member);
        }
        if let (Some(before), Some(after)) = (&delta.before, &delta.after) {
            problem = problem.with_comparison(before, after);
        }
        problem
    }
}

fn element_noun(element_type: ElementType) -> &'static str {
    match element_type {
        ElementType::Baseline => "baseline",
        ElementType::Component => "component",
        ElementType::Class => "class",
        ElementType::Interface => "interface",
        ElementType::Enum => "enum",
        ElementType::Annotation => "annotation",
        ElementType::Field => "field",
        ElementType::Method => "method",
        ElementType::Constructor => "constructor",
    }
}

fn member_noun(flag: DeltaFlag) -> &'static str {
    match flag {
        DeltaFlag::Constructor => "constructor",
        DeltaFlag::Field => "field",
        DeltaFlag::EnumConstant => "enum constant",
        DeltaFlag::TypeMember => "member type",
        DeltaFlag::MethodWithDefaultValue | DeltaFlag::MethodWithoutDefaultValue => "annotation member",
        _ => "method",
    }
}

/// Message for a delta, e.g. `The method p.A.run(int) has been removed`
pub fn compatibility_message(delta: &Delta) -> String {
    let type_name = delta.type_name.as_str();
    let subject = match &delta.member {
        Some(member) if delta.flag.is_member_flag() => {
            format!("The {} {}.{}", member_noun(delta.flag), type_name, member)
        }
        Some(member) => format!("The {} {}.{}", element_noun(delta.element_type), type_name, member),
        None => format!("The {} {}", element_noun(delta.element_type), type_name),
    };

    let arg = |i: usize| delta.message_args.get(i).map(String::as_str).unwrap_or_default();

    match (delta.kind, delta.flag) {
        (DeltaKind::Removed, DeltaFlag::ApiComponent) => format!("The API component {} has been removed", arg(0)),
        (DeltaKind::Added, DeltaFlag::ApiComponent) => format!("The API component {} has been added", arg(0)),
        (DeltaKind::Removed, DeltaFlag::Type) if delta.previously_deprecated => {
            format!("The deprecated type {} has been removed from {}", type_name, arg(1))
        }
        (DeltaKind::Removed, DeltaFlag::Type) => format!("The type {} has been removed from {}", type_name, arg(1)),
        (DeltaKind::Added, DeltaFlag::Type) => format!("The type {} has been added to {}", type_name, arg(1)),
        (DeltaKind::Removed, DeltaFlag::ApiType) => format!("The type {} is no longer API in {}", type_name, arg(1)),
        (DeltaKind::Added, DeltaFlag::ApiType) => format!("The type {} has become API in {}", type_name, arg(1)),
        (DeltaKind::Removed, flag) if flag.is_member_flag() && delta.previously_deprecated => {
            format!("{} has been removed and was deprecated", subject)
        }
        (DeltaKind::Removed, flag) if flag.is_member_flag() => format!("{} has been removed", subject),
        (DeltaKind::Added, flag) if flag.is_member_flag() => format!("{} has been added", subject),
        (_, DeltaFlag::Deprecation) => match delta.kind {
            DeltaKind::Removed => format!("{} is no longer deprecated", subject),
            _ => format!("{} has been deprecated", subject),
        },
        (_, DeltaFlag::SuperInterfaceWithMethods) => {
            format!("{} now extends {}, which declares abstract methods", subject, arg(1))
        }
        (_, DeltaFlag::AnnotationDefaultValue) => match delta.kind {
            DeltaKind::Removed => format!("{} no longer has a default value", subject),
            DeltaKind::Added => format!("{} now has a default value", subject),
            DeltaKind::Changed => format!("{} has a different default value", subject),
        },
        (_, flag) => {
            let change = flag.as_str().to_lowercase().replace('_', " ");
            match (&delta.before, &delta.after) {
                (Some(before), Some(after)) => format!("{}: {} ({} -> {})", subject, change, before, after),
                _ => format!("{}: {}", subject, change),
            }
        }
    }
}
