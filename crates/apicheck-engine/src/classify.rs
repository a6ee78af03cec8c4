//! Binary compatibility classification of deltas
//!
//! Every decision is made from the context recorded in the delta, which
//! describes the element as it was in the reference baseline. Tags added in
//! the current baseline never hide a change.

use apicheck_core::{Delta, DeltaFlag, DeltaKind, ElementType, TypeKind, Visibility};
use serde::{Deserialize, Serialize};

/// Restriction that keeps a change away from clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenBy {
    /// The type is tagged `@noreference`
    TypeNoReference,

    /// The member is tagged `@noreference`
    MemberNoReference,

    /// A protected member of a type clients cannot subclass
    NotExtendable,

    /// A constructor of a type clients can neither instantiate nor subclass
    NotInstantiable,
}

/// Classification outcome of a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Compatible,
    Incompatible,
    Hidden(HiddenBy),
}

impl Verdict {
    pub fn is_incompatible(&self) -> bool {
        matches!(self, Self::Incompatible)
    }
}

/// Decides whether deltas break existing clients
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, delta: &Delta) -> Verdict {
        if let Some(hidden) = self.hidden_by(delta) {
            return Verdict::Hidden(hidden);
        }

        let incompatible = match delta.kind {
            DeltaKind::Removed => delta.flag != DeltaFlag::Deprecation,
            DeltaKind::Added => self.addition_breaks(delta),
            DeltaKind::Changed => self.change_breaks(delta),
        };

        if incompatible {
            Verdict::Incompatible
        } else {
            Verdict::Compatible
        }
    }

    fn hidden_by(&self, delta: &Delta) -> Option<HiddenBy> {
        if matches!(delta.element_type, ElementType::Baseline | ElementType::Component) {
            return (delta.kind == DeltaKind::Removed && delta.type_restrictions.no_reference())
                .then_some(HiddenBy::TypeNoReference);
        }

        if delta.type_restrictions.no_reference() {
            return Some(HiddenBy::TypeNoReference);
        }

        // Members that did not exist at the reference point have no prior tags
        if delta.kind != DeltaKind::Added && delta.member_restrictions.no_reference() {
            return Some(HiddenBy::MemberNoReference);
        }

        let member_visibility = delta.member_modifiers.map(|m| m.visibility);
        if member_visibility == Some(Visibility::Protected) && !delta.type_extendable && delta.type_kind == TypeKind::Class
        {
            return Some(HiddenBy::NotExtendable);
        }

        let is_constructor = delta.flag == DeltaFlag::Constructor || delta.element_type == ElementType::Constructor;
        if is_constructor && !delta.type_instantiable && !delta.type_extendable {
            return Some(HiddenBy::NotInstantiable);
        }

        None
    }

    fn addition_breaks(&self, delta: &Delta) -> bool {
        let modifiers = delta.member_modifiers.unwrap_or_default();
        match delta.flag {
            DeltaFlag::Method => match delta.type_kind {
                TypeKind::Class => modifiers.is_abstract && delta.type_extendable,
                TypeKind::Interface => !modifiers.is_default && !modifiers.is_static && delta.type_implementable(),
                _ => false,
            },
            DeltaFlag::MethodWithoutDefaultValue => true,
            _ => false,
        }
    }

    fn change_breaks(&self, delta: &Delta) -> bool {
        let is_field = delta.element_type == ElementType::Field;
        let is_method = delta.element_type == ElementType::Method;
        let member = delta.member_modifiers.unwrap_or_default();

        match delta.flag {
            DeltaFlag::DecreaseAccess
            | DeltaFlag::NonStaticToStatic
            | DeltaFlag::StaticToNonStatic
            | DeltaFlag::FieldType
            | DeltaFlag::ReturnType
            | DeltaFlag::Value
            | DeltaFlag::TypeConversion
            | DeltaFlag::ContractedSuperclassSet
            | DeltaFlag::ContractedSuperinterfacesSet
            | DeltaFlag::TypeParameters
            | DeltaFlag::FinalToNonFinalStaticConstant => true,

            DeltaFlag::Restrictions => {
                let previous = if delta.element_type.is_member() {
                    delta.member_restrictions
                } else {
                    delta.type_restrictions
                };
                !delta.current_restrictions.difference(previous).is_empty()
            }

            DeltaFlag::NonFinalToFinal => {
                if is_field {
                    true
                } else if is_method {
                    delta.type_extendable && !delta.member_restrictions.no_override() && !member.is_static
                } else {
                    delta.type_extendable
                }
            }

            DeltaFlag::NonAbstractToAbstract => {
                if is_method {
                    match delta.type_kind {
                        TypeKind::Interface => delta.type_implementable(),
                        _ => delta.type_extendable,
                    }
                } else {
                    delta.type_instantiable
                }
            }

            DeltaFlag::SuperInterfaceWithMethods => match delta.type_kind {
                TypeKind::Interface => delta.type_implementable(),
                TypeKind::Class => delta.type_extendable && delta.type_modifiers.is_abstract,
                _ => false,
            },

            _ => false,
        }
    }
}
