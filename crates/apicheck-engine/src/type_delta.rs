//! Structural diff between two versions of a type
//!
//! Compares a reference type descriptor against the current descriptor with
//! the same name and lists every change as a [`Delta`]. Whether a change
//! breaks clients is decided later by the classifier.

use crate::error::EngineError;
use crate::hierarchy::Hierarchy;
use apicheck_baseline::Baseline;
use apicheck_core::model::erase_generics;
use apicheck_core::{
    Delta, DeltaFlag, DeltaKind, ElementType, FieldDescriptor, MethodDescriptor, Modifiers, Restrictions,
    TypeDescriptor, TypeKind,
};

/// Baselines and component a type comparison runs in
#[derive(Debug, Clone, Copy)]
pub struct DiffContext<'a> {
    pub component_id: &'a str,
    pub reference: &'a Baseline,
    pub current: &'a Baseline,
}

impl<'a> DiffContext<'a> {
    pub fn new(component_id: &'a str, reference: &'a Baseline, current: &'a Baseline) -> Self {
        Self {
            component_id,
            reference,
            current,
        }
    }
}

/// Structural comparison of one type
pub struct TypeDiff<'a> {
    ctx: DiffContext<'a>,
    reference: &'a TypeDescriptor,
    current: &'a TypeDescriptor,
    element_type: ElementType,
    deltas: Vec<Delta>,
}

impl<'a> TypeDiff<'a> {
    /// Compare two descriptors of the same type
    pub fn compare(
        ctx: DiffContext<'a>,
        reference: &'a TypeDescriptor,
        current: &'a TypeDescriptor,
    ) -> Result<Vec<Delta>, EngineError> {
        if reference.name != current.name {
            return Err(EngineError::TypeMismatch {
                reference: reference.name.clone(),
                current: current.name.clone(),
            });
        }

        let mut diff = Self {
            ctx,
            reference,
            current,
            element_type: ElementType::for_type_kind(reference.kind),
            deltas: Vec::new(),
        };

        if reference.kind != current.kind {
            diff.push(
                diff.type_delta(DeltaKind::Changed, DeltaFlag::TypeConversion)
                    .with_comparison(reference.kind.to_string(), current.kind.to_string()),
            );
            return Ok(diff.deltas);
        }

        diff.compare_type_modifiers();
        diff.compare_hierarchy();
        if reference.type_parameters.len() != current.type_parameters.len() {
            let delta = diff
                .type_delta(DeltaKind::Changed, DeltaFlag::TypeParameters)
                .with_comparison(reference.type_parameters.join(", "), current.type_parameters.join(", "));
            diff.push(delta);
        }
        diff.compare_fields();
        diff.compare_methods();

        Ok(diff.deltas)
    }

    fn push(&mut self, delta: Delta) {
        tracing::trace!(delta = %delta, "delta");
        self.deltas.push(delta);
    }

    fn type_delta(&self, kind: DeltaKind, flag: DeltaFlag) -> Delta {
        Delta::new(self.ctx.component_id, kind, self.element_type, flag, &self.reference.name)
            .with_type_context(self.reference)
            .with_args(vec![self.reference.name.clone()])
    }

    fn member_delta(
        &self,
        kind: DeltaKind,
        element_type: ElementType,
        flag: DeltaFlag,
        member: String,
        modifiers: Modifiers,
        restrictions: Restrictions,
    ) -> Delta {
        Delta::new(self.ctx.component_id, kind, element_type, flag, &self.reference.name)
            .with_type_context(self.reference)
            .with_args(vec![self.reference.name.clone(), member.clone()])
            .with_member(member, modifiers, restrictions)
    }

    fn compare_type_modifiers(&mut self) {
        let (before, after) = (self.reference.modifiers, self.current.modifiers);
        let mut flags = Vec::new();

        flags.extend(modifier_transition(before.is_final, after.is_final, DeltaFlag::NonFinalToFinal, DeltaFlag::FinalToNonFinal));
        if self.reference.kind == TypeKind::Class {
            flags.extend(modifier_transition(
                before.is_abstract,
                after.is_abstract,
                DeltaFlag::NonAbstractToAbstract,
                DeltaFlag::AbstractToNonAbstract,
            ));
        }
        flags.extend(modifier_transition(before.is_static, after.is_static, DeltaFlag::NonStaticToStatic, DeltaFlag::StaticToNonStatic));
        flags.extend(access_change(before, after));

        for flag in flags {
            let delta = self
                .type_delta(DeltaKind::Changed, flag)
                .with_comparison(before.to_string(), after.to_string());
            self.push(delta);
        }

        if let Some(kind) = deprecation_change(before, after) {
            let delta = self.type_delta(kind, DeltaFlag::Deprecation);
            self.push(delta);
        }

        if self.reference.restrictions != self.current.restrictions {
            let delta = self
                .type_delta(DeltaKind::Changed, DeltaFlag::Restrictions)
                .with_current_restrictions(self.current.restrictions)
                .with_comparison(self.reference.restrictions.to_string(), self.current.restrictions.to_string());
            self.push(delta);
        }
    }

    fn compare_hierarchy(&mut self) {
        let component_id = self.ctx.component_id;
        let reference_hierarchy = Hierarchy::new(self.ctx.reference);
        let current_hierarchy = Hierarchy::new(self.ctx.current);

        if self.reference.kind == TypeKind::Class {
            let before = reference_hierarchy.superclass_names(component_id, self.reference);
            let after = current_hierarchy.superclass_names(component_id, self.current);
            let flag = if !before.is_subset(&after) {
                Some(DeltaFlag::ContractedSuperclassSet)
            } else if after.len() > before.len() {
                Some(DeltaFlag::ExpandedSuperclassSet)
            } else {
                None
            };
            if let Some(flag) = flag {
                let delta = self
                    .type_delta(DeltaKind::Changed, flag)
                    .with_comparison(join(&before), join(&after));
                self.push(delta);
            }
        }

        let before = reference_hierarchy.superinterface_names(component_id, self.reference);
        let after = current_hierarchy.superinterface_names(component_id, self.current);
        if !before.is_subset(&after) {
            let delta = self
                .type_delta(DeltaKind::Changed, DeltaFlag::ContractedSuperinterfacesSet)
                .with_comparison(join(&before), join(&after));
            self.push(delta);
        } else if after.len() > before.len() {
            let delta = self
                .type_delta(DeltaKind::Changed, DeltaFlag::ExpandedSuperinterfacesSet)
                .with_comparison(join(&before), join(&after));
            self.push(delta);

            let with_methods: Vec<&String> = after
                .difference(&before)
                .filter(|name| current_hierarchy.interface_has_abstract_methods(component_id, name))
                .collect();
            for name in with_methods {
                let delta = self
                    .type_delta(DeltaKind::Changed, DeltaFlag::SuperInterfaceWithMethods)
                    .with_args(vec![self.reference.name.clone(), name.clone()]);
                self.push(delta);
            }
        }
    }

    fn compare_fields(&mut self) {
        let (reference, current) = (self.reference, self.current);

        for before in &reference.fields {
            if !before.modifiers.visibility.is_client_visible() {
                continue;
            }
            match current.field(&before.name) {
                Some(after) => self.compare_field(before, after),
                None => {
                    let flag = if before.enum_constant {
                        DeltaFlag::EnumConstant
                    } else {
                        DeltaFlag::Field
                    };
                    let delta = self
                        .member_delta(
                            DeltaKind::Removed,
                            self.element_type,
                            flag,
                            before.name.clone(),
                            before.modifiers,
                            before.restrictions,
                        )
                        .deprecated(before.modifiers.is_deprecated);
                    self.push(delta);
                }
            }
        }

        for after in &current.fields {
            let existed = reference
                .field(&after.name)
                .is_some_and(|f| f.modifiers.visibility.is_client_visible());
            if existed || !after.modifiers.visibility.is_client_visible() {
                continue;
            }
            let flag = if after.enum_constant {
                DeltaFlag::EnumConstant
            } else {
                DeltaFlag::Field
            };
            let delta = self.member_delta(
                DeltaKind::Added,
                self.element_type,
                flag,
                after.name.clone(),
                after.modifiers,
                after.restrictions,
            );
            self.push(delta);
        }
    }

    fn compare_field(&mut self, before: &FieldDescriptor, after: &FieldDescriptor) {
        let changed = |flag: DeltaFlag| {
            self.member_delta(
                DeltaKind::Changed,
                ElementType::Field,
                flag,
                before.name.clone(),
                before.modifiers,
                before.restrictions,
            )
        };
        let mut deltas = Vec::new();

        if erase_generics(&before.field_type) != erase_generics(&after.field_type) {
            deltas.push(changed(DeltaFlag::FieldType).with_comparison(&before.field_type, &after.field_type));
        }

        if before.constant.is_some() && before.constant != after.constant {
            deltas.push(changed(DeltaFlag::Value).with_comparison(
                before.constant.clone().unwrap_or_default(),
                after.constant.clone().unwrap_or_default(),
            ));
        }

        let (m1, m2) = (before.modifiers, after.modifiers);
        let final_flag = if before.is_compile_time_constant() {
            DeltaFlag::FinalToNonFinalStaticConstant
        } else {
            DeltaFlag::FinalToNonFinal
        };
        let mut flags = Vec::new();
        flags.extend(modifier_transition(m1.is_final, m2.is_final, DeltaFlag::NonFinalToFinal, final_flag));
        flags.extend(modifier_transition(m1.is_static, m2.is_static, DeltaFlag::NonStaticToStatic, DeltaFlag::StaticToNonStatic));
        flags.extend(access_change(m1, m2));
        for flag in flags {
            deltas.push(changed(flag).with_comparison(m1.to_string(), m2.to_string()));
        }

        if let Some(kind) = deprecation_change(m1, m2) {
            deltas.push(
                self.member_delta(
                    kind,
                    ElementType::Field,
                    DeltaFlag::Deprecation,
                    before.name.clone(),
                    before.modifiers,
                    before.restrictions,
                ),
            );
        }

        if before.restrictions != after.restrictions {
            deltas.push(
                changed(DeltaFlag::Restrictions)
                    .with_current_restrictions(after.restrictions)
                    .with_comparison(before.restrictions.to_string(), after.restrictions.to_string()),
            );
        }

        for delta in deltas {
            self.push(delta);
        }
    }

    fn removal_flag(&self, method: &MethodDescriptor) -> DeltaFlag {
        if method.is_constructor() {
            DeltaFlag::Constructor
        } else if self.reference.kind == TypeKind::Annotation {
            if method.default_value.is_some() {
                DeltaFlag::MethodWithDefaultValue
            } else {
                DeltaFlag::MethodWithoutDefaultValue
            }
        } else {
            DeltaFlag::Method
        }
    }

    fn compare_methods(&mut self) {
        let (reference, current) = (self.reference, self.current);
        let current_hierarchy = Hierarchy::new(self.ctx.current);

        for before in &reference.methods {
            if !before.modifiers.visibility.is_client_visible() {
                continue;
            }
            let key = before.key();
            if let Some(after) = current.method(&key) {
                self.compare_method(before, after);
                continue;
            }

            // Still callable through a superclass
            if !before.is_constructor() {
                let inherited = current_hierarchy.inherited_method(self.ctx.component_id, current, &key);
                if let Some((owner, method)) = inherited {
                    if method.modifiers.visibility >= before.modifiers.visibility && !method.modifiers.is_static {
                        tracing::debug!(
                            method = %key,
                            from = %owner.descriptor.name,
                            "removed method is inherited"
                        );
                        continue;
                    }
                }
            }

            let delta = self
                .member_delta(
                    DeltaKind::Removed,
                    self.element_type,
                    self.removal_flag(before),
                    before.display_signature(&reference.name),
                    before.modifiers,
                    before.restrictions,
                )
                .deprecated(before.modifiers.is_deprecated);
            self.push(delta);
        }

        for after in &current.methods {
            let existed = reference
                .method(&after.key())
                .is_some_and(|m| m.modifiers.visibility.is_client_visible());
            if existed || !after.modifiers.visibility.is_client_visible() {
                continue;
            }
            let delta = self.member_delta(
                DeltaKind::Added,
                self.element_type,
                self.removal_flag(after),
                after.display_signature(&current.name),
                after.modifiers,
                after.restrictions,
            );
            self.push(delta);
        }
    }

    fn compare_method(&mut self, before: &MethodDescriptor, after: &MethodDescriptor) {
        let element_type = if before.is_constructor() {
            ElementType::Constructor
        } else {
            ElementType::Method
        };
        let signature = before.display_signature(&self.reference.name);
        let make = |kind: DeltaKind, flag: DeltaFlag| {
            self.member_delta(kind, element_type, flag, signature.clone(), before.modifiers, before.restrictions)
        };
        let mut deltas = Vec::new();

        if erase_generics(&before.return_type) != erase_generics(&after.return_type) {
            deltas.push(
                make(DeltaKind::Changed, DeltaFlag::ReturnType).with_comparison(&before.return_type, &after.return_type),
            );
        }

        let (m1, m2) = (before.modifiers, after.modifiers);
        let mut flags = Vec::new();
        flags.extend(modifier_transition(m1.is_final, m2.is_final, DeltaFlag::NonFinalToFinal, DeltaFlag::FinalToNonFinal));
        flags.extend(modifier_transition(
            self.is_abstract(before),
            self.is_abstract(after),
            DeltaFlag::NonAbstractToAbstract,
            DeltaFlag::AbstractToNonAbstract,
        ));
        flags.extend(modifier_transition(m1.is_static, m2.is_static, DeltaFlag::NonStaticToStatic, DeltaFlag::StaticToNonStatic));
        flags.extend(access_change(m1, m2));
        for flag in flags {
            deltas.push(make(DeltaKind::Changed, flag).with_comparison(m1.to_string(), m2.to_string()));
        }

        if let Some(kind) = deprecation_change(m1, m2) {
            deltas.push(make(kind, DeltaFlag::Deprecation));
        }

        if before.restrictions != after.restrictions {
            deltas.push(
                make(DeltaKind::Changed, DeltaFlag::Restrictions)
                    .with_current_restrictions(after.restrictions)
                    .with_comparison(before.restrictions.to_string(), after.restrictions.to_string()),
            );
        }

        if self.reference.kind == TypeKind::Annotation {
            let kind = match (&before.default_value, &after.default_value) {
                (Some(_), None) => Some(DeltaKind::Removed),
                (None, Some(_)) => Some(DeltaKind::Added),
                (Some(a), Some(b)) if a != b => Some(DeltaKind::Changed),
                _ => None,
            };
            if let Some(kind) = kind {
                let mut delta = make(kind, DeltaFlag::AnnotationDefaultValue);
                if let (Some(a), Some(b)) = (&before.default_value, &after.default_value) {
                    delta = delta.with_comparison(a, b);
                }
                deltas.push(delta);
            }
        }

        for delta in deltas {
            self.push(delta);
        }
    }

    /// Abstract in the sense that implementors must provide a body
    fn is_abstract(&self, method: &MethodDescriptor) -> bool {
        match self.reference.kind {
            TypeKind::Interface => !method.modifiers.is_default && !method.modifiers.is_static,
            _ => method.modifiers.is_abstract,
        }
    }
}

fn modifier_transition(before: bool, after: bool, gained: DeltaFlag, lost: DeltaFlag) -> Option<DeltaFlag> {
    match (before, after) {
        (false, true) => Some(gained),
        (true, false) => Some(lost),
        _ => None,
    }
}

fn access_change(before: Modifiers, after: Modifiers) -> Option<DeltaFlag> {
    match after.visibility.cmp(&before.visibility) {
        std::cmp::Ordering::Less => Some(DeltaFlag::DecreaseAccess),
        std::cmp::Ordering::Greater => Some(DeltaFlag::IncreaseAccess),
        std::cmp::Ordering::Equal => None,
    }
}

fn deprecation_change(before: Modifiers, after: Modifiers) -> Option<DeltaKind> {
    match (before.is_deprecated, after.is_deprecated) {
        (false, true) => Some(DeltaKind::Added),
        (true, false) => Some(DeltaKind::Removed),
        _ => None,
    }
}

fn join(names: &std::collections::BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}
