//! Structural deltas between two versions of an API element
//!
//! IMPORTANT: Element and flag names are part of problem identifiers.
//! NEVER rename or remove them - filters and severity overrides match on them.

use crate::model::{Modifiers, Restrictions, TypeDescriptor, TypeKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeltaKind {
    Added,
    Removed,
    Changed,
}

impl DeltaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "ADDED",
            Self::Removed => "REMOVED",
            Self::Changed => "CHANGED",
        }
    }
}

impl fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of element a delta is reported against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Baseline,
    Component,
    Class,
    Interface,
    Enum,
    Annotation,
    Field,
    Method,
    Constructor,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "BASELINE",
            Self::Component => "COMPONENT",
            Self::Class => "CLASS",
            Self::Interface => "INTERFACE",
            Self::Enum => "ENUM",
            Self::Annotation => "ANNOTATION",
            Self::Field => "FIELD",
            Self::Method => "METHOD",
            Self::Constructor => "CONSTRUCTOR",
        }
    }

    /// Element type matching a type kind
    pub fn for_type_kind(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Class => Self::Class,
            TypeKind::Interface => Self::Interface,
            TypeKind::Enum => Self::Enum,
            TypeKind::Annotation => Self::Annotation,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Self::Class | Self::Interface | Self::Enum | Self::Annotation)
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Self::Field | Self::Method | Self::Constructor)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What changed
///
/// These names are STABLE. Add new flags, never rename existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeltaFlag {
    // Containers
    ApiComponent,
    Type,
    TypeMember,
    /// A type that stopped (or started) being API
    ApiType,

    // Members
    Method,
    Constructor,
    Field,
    EnumConstant,
    MethodWithDefaultValue,
    MethodWithoutDefaultValue,
    AnnotationDefaultValue,

    // Modifiers
    NonFinalToFinal,
    FinalToNonFinal,
    FinalToNonFinalStaticConstant,
    NonAbstractToAbstract,
    AbstractToNonAbstract,
    NonStaticToStatic,
    StaticToNonStatic,
    DecreaseAccess,
    IncreaseAccess,

    // Signatures and values
    FieldType,
    ReturnType,
    Value,
    TypeConversion,
    TypeParameters,

    // Hierarchy
    ContractedSuperclassSet,
    ExpandedSuperclassSet,
    ContractedSuperinterfacesSet,
    ExpandedSuperinterfacesSet,
    SuperInterfaceWithMethods,

    // Documentation
    Deprecation,
    Restrictions,
}

impl DeltaFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiComponent => "API_COMPONENT",
            Self::Type => "TYPE",
            Self::TypeMember => "TYPE_MEMBER",
            Self::ApiType => "API_TYPE",
            Self::Method => "METHOD",
            Self::Constructor => "CONSTRUCTOR",
            Self::Field => "FIELD",
            Self::EnumConstant => "ENUM_CONSTANT",
            Self::MethodWithDefaultValue => "METHOD_WITH_DEFAULT_VALUE",
            Self::MethodWithoutDefaultValue => "METHOD_WITHOUT_DEFAULT_VALUE",
            Self::AnnotationDefaultValue => "ANNOTATION_DEFAULT_VALUE",
            Self::NonFinalToFinal => "NON_FINAL_TO_FINAL",
            Self::FinalToNonFinal => "FINAL_TO_NON_FINAL",
            Self::FinalToNonFinalStaticConstant => "FINAL_TO_NON_FINAL_STATIC_CONSTANT",
            Self::NonAbstractToAbstract => "NON_ABSTRACT_TO_ABSTRACT",
            Self::AbstractToNonAbstract => "ABSTRACT_TO_NON_ABSTRACT",
            Self::NonStaticToStatic => "NON_STATIC_TO_STATIC",
            Self::StaticToNonStatic => "STATIC_TO_NON_STATIC",
            Self::DecreaseAccess => "DECREASE_ACCESS",
            Self::IncreaseAccess => "INCREASE_ACCESS",
            Self::FieldType => "FIELD_TYPE",
            Self::ReturnType => "RETURN_TYPE",
            Self::Value => "VALUE",
            Self::TypeConversion => "TYPE_CONVERSION",
            Self::TypeParameters => "TYPE_PARAMETERS",
            Self::ContractedSuperclassSet => "CONTRACTED_SUPERCLASS_SET",
            Self::ExpandedSuperclassSet => "EXPANDED_SUPERCLASS_SET",
            Self::ContractedSuperinterfacesSet => "CONTRACTED_SUPERINTERFACES_SET",
            Self::ExpandedSuperinterfacesSet => "EXPANDED_SUPERINTERFACES_SET",
            Self::SuperInterfaceWithMethods => "SUPER_INTERFACE_WITH_METHODS",
            Self::Deprecation => "DEPRECATION",
            Self::Restrictions => "RESTRICTIONS",
        }
    }

    /// Flags describing an added or removed member of a type
    pub fn is_member_flag(&self) -> bool {
        matches!(
            self,
            Self::Method
                | Self::Constructor
                | Self::Field
                | Self::EnumConstant
                | Self::MethodWithDefaultValue
                | Self::MethodWithoutDefaultValue
                | Self::TypeMember
        )
    }
}

impl fmt::Display for DeltaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structural difference between the reference and current API
///
/// Type context (`type_*` fields) and member context describe the element
/// as it was in the reference baseline, so classification never depends on
/// tags added later. Additions take their member context from the current
/// element since there is no reference one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub component_id: String,
    pub kind: DeltaKind,
    pub element_type: ElementType,
    pub flag: DeltaFlag,

    /// Qualified name of the affected type (empty for component-level deltas)
    pub type_name: String,

    /// Member display signature or field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,

    pub type_kind: TypeKind,
    pub type_modifiers: Modifiers,
    pub type_restrictions: Restrictions,
    pub type_extendable: bool,
    pub type_instantiable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_modifiers: Option<Modifiers>,

    #[serde(default)]
    pub member_restrictions: Restrictions,

    /// Restrictions of the current element, for restriction changes
    #[serde(default)]
    pub current_restrictions: Restrictions,

    /// The removed element was deprecated in the reference baseline
    #[serde(default)]
    pub previously_deprecated: bool,

    pub message_args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl Delta {
    /// Create a delta with an empty public-class type context
    pub fn new(
        component_id: impl Into<String>,
        kind: DeltaKind,
        element_type: ElementType,
        flag: DeltaFlag,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            kind,
            element_type,
            flag,
            type_name: type_name.into(),
            member: None,
            type_kind: TypeKind::Class,
            type_modifiers: Modifiers::public(),
            type_restrictions: Restrictions::NONE,
            type_extendable: false,
            type_instantiable: false,
            member_modifiers: None,
            member_restrictions: Restrictions::NONE,
            current_restrictions: Restrictions::NONE,
            previously_deprecated: false,
            message_args: Vec::new(),
            before: None,
            after: None,
        }
    }

    /// Copy type context from a descriptor
    pub fn with_type_context(mut self, descriptor: &TypeDescriptor) -> Self {
        self.type_kind = descriptor.kind;
        self.type_modifiers = descriptor.modifiers;
        self.type_restrictions = descriptor.restrictions;
        self.type_extendable = descriptor.is_extendable();
        self.type_instantiable = descriptor.is_instantiable();
        self
    }

    /// Set the member and its context
    pub fn with_member(mut self, member: impl Into<String>, modifiers: Modifiers, restrictions: Restrictions) -> Self {
        self.member = Some(member.into());
        self.member_modifiers = Some(modifiers);
        self.member_restrictions = restrictions;
        self
    }

    pub fn with_current_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.current_restrictions = restrictions;
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.message_args = args;
        self
    }

    pub fn with_comparison(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self.after = Some(after.into());
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.previously_deprecated = deprecated;
        self
    }

    /// Whether the type could be implemented by clients at the reference point
    pub fn type_implementable(&self) -> bool {
        self.type_kind == TypeKind::Interface && !self.type_restrictions.no_implement()
    }

    /// Stable key `ELEMENT.KIND.FLAG`
    pub fn key(&self) -> String {
        format!("{}.{}.{}", self.element_type, self.kind, self.flag)
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key(), self.type_name)?;
        if let Some(member) = &self.member {
            write!(f, "#{}", member)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RestrictionTag;

    #[test]
    fn stable_names() {
        assert_eq!(DeltaFlag::FinalToNonFinalStaticConstant.as_str(), "FINAL_TO_NON_FINAL_STATIC_CONSTANT");
        assert_eq!(DeltaFlag::SuperInterfaceWithMethods.as_str(), "SUPER_INTERFACE_WITH_METHODS");
        assert_eq!(ElementType::Annotation.as_str(), "ANNOTATION");

        let json = serde_json::to_string(&DeltaFlag::ContractedSuperinterfacesSet).unwrap();
        assert_eq!(json, "\"CONTRACTED_SUPERINTERFACES_SET\"");
    }

    #[test]
    fn delta_takes_type_context() {
        let descriptor = TypeDescriptor::class("p.Widget")
            .with_restrictions(Restrictions::NONE.with(RestrictionTag::NoExtend));

        let delta = Delta::new("bundle", DeltaKind::Removed, ElementType::Class, DeltaFlag::Method, "p.Widget")
            .with_type_context(&descriptor)
            .with_member("paint(int)", Modifiers::public(), Restrictions::NONE)
            .with_args(vec!["p.Widget".into(), "paint(int)".into()]);

        assert!(!delta.type_extendable);
        assert!(delta.type_instantiable);
        assert!(!delta.type_implementable());
        assert_eq!(delta.key(), "CLASS.REMOVED.METHOD");
        assert_eq!(delta.to_string(), "CLASS.REMOVED.METHOD p.Widget#paint(int)");
    }

    #[test]
    fn member_flags() {
        assert!(DeltaFlag::EnumConstant.is_member_flag());
        assert!(!DeltaFlag::ReturnType.is_member_flag());
        assert!(ElementType::Constructor.is_member());
        assert!(ElementType::Enum.is_type());
    }
}
