//! Component and baseline level comparison
//!
//! Pairs the API types of a reference component with the same-named types
//! of the current component and collects the deltas of every pair, plus
//! deltas for API types that appeared or disappeared.

use crate::error::EngineError;
use crate::type_delta::{DiffContext, TypeDiff};
use apicheck_baseline::Baseline;
use apicheck_core::model::simple_type_name;
use apicheck_core::{Component, ComponentRules, Delta, DeltaFlag, DeltaKind, ElementType, TypeDescriptor};

/// Deltas of one component present in both baselines
#[derive(Debug, Clone)]
pub struct ComponentComparison {
    pub component_id: String,
    pub deltas: Vec<Delta>,
    pub types_compared: usize,
}

impl ComponentComparison {
    /// Compare the component `id` of both baselines
    pub fn compare(reference: &Baseline, current: &Baseline, id: &str) -> Result<Self, EngineError> {
        let (Some(before), Some(after)) = (reference.component(id), current.component(id)) else {
            return Err(EngineError::MissingComponent(id.to_string()));
        };

        let ctx = DiffContext::new(id, reference, current);
        let mut deltas = Vec::new();
        let mut types_compared = 0;

        for old in before.api_types() {
            match after.find_type(&old.name) {
                Some(new) if after.is_api_type(&new.name) => {
                    types_compared += 1;
                    deltas.extend(TypeDiff::compare(ctx, old, new)?);
                }
                Some(_) => {
                    deltas.push(
                        component_delta(id, DeltaKind::Removed, DeltaFlag::ApiType, old)
                            .with_args(vec![old.name.clone(), id.to_string()]),
                    );
                }
                None => {
                    if let Some(delta) = removed_type(current, id, old, after) {
                        deltas.push(delta);
                    }
                }
            }
        }

        for new in after.api_types() {
            if before.is_api_type(&new.name) {
                continue;
            }
            if before.find_type(&new.name).is_some() {
                deltas.push(
                    component_delta(id, DeltaKind::Added, DeltaFlag::ApiType, new)
                        .with_args(vec![new.name.clone(), id.to_string()]),
                );
                continue;
            }
            match new.enclosing_type().and_then(|outer| before.find_type(outer)) {
                Some(outer) => deltas.push(member_type_delta(id, DeltaKind::Added, outer, new)),
                None if new.is_member_type() => {}
                None => deltas.push(
                    component_delta(id, DeltaKind::Added, DeltaFlag::Type, new)
                        .with_args(vec![new.name.clone(), id.to_string()]),
                ),
            }
        }

        tracing::debug!(
            component = %id,
            types = types_compared,
            deltas = deltas.len(),
            "compared component"
        );

        Ok(Self {
            component_id: id.to_string(),
            deltas,
            types_compared,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

/// Delta for an API type missing from the current component, if any.
///
/// Member types are reported on their enclosing type; when the enclosing
/// type is gone too its own removal covers them. A top-level type is not
/// removed when a re-exported requirement still provides it.
fn removed_type(current: &Baseline, id: &str, old: &TypeDescriptor, after: &Component) -> Option<Delta> {
    if let Some(outer) = old.enclosing_type() {
        let outer = after.find_type(outer)?;
        return Some(member_type_delta(id, DeltaKind::Removed, outer, old).deprecated(old.modifiers.is_deprecated));
    }

    let reexported = after
        .requires
        .iter()
        .filter(|r| r.reexport)
        .filter_map(|r| current.component(&r.id))
        .find(|provider| provider.is_api_type(&old.name));
    if let Some(provider) = reexported {
        tracing::debug!(type_name = %old.name, provider = %provider.id, "type moved to re-exported component");
        return None;
    }

    Some(
        component_delta(id, DeltaKind::Removed, DeltaFlag::Type, old)
            .with_args(vec![old.name.clone(), id.to_string()])
            .deprecated(old.modifiers.is_deprecated),
    )
}

fn component_delta(id: &str, kind: DeltaKind, flag: DeltaFlag, descriptor: &TypeDescriptor) -> Delta {
    Delta::new(id, kind, ElementType::Component, flag, &descriptor.name).with_type_context(descriptor)
}

fn member_type_delta(id: &str, kind: DeltaKind, outer: &TypeDescriptor, member: &TypeDescriptor) -> Delta {
    let simple = simple_type_name(&member.name);
    Delta::new(id, kind, ElementType::for_type_kind(outer.kind), DeltaFlag::TypeMember, &outer.name)
        .with_type_context(outer)
        .with_args(vec![outer.name.clone(), simple.clone()])
        .with_member(simple, member.modifiers, member.restrictions)
}

/// Deltas of every component of two baselines
#[derive(Debug, Clone, Default)]
pub struct BaselineComparison {
    pub comparisons: Vec<ComponentComparison>,

    /// Components added or removed as a whole
    pub deltas: Vec<Delta>,

    pub types_compared: usize,
}

impl BaselineComparison {
    /// Compare all non-system components accepted by `rules`, sorted by id
    pub fn compare(reference: &Baseline, current: &Baseline, rules: &ComponentRules) -> Result<Self, EngineError> {
        let mut comparison = Self::default();
        let included = |c: &&Component| !c.system_library && rules.is_included(&c.id);

        for before in reference.components().filter(included) {
            if current.component(&before.id).is_none() {
                comparison.deltas.push(
                    Delta::new(&before.id, DeltaKind::Removed, ElementType::Baseline, DeltaFlag::ApiComponent, "")
                        .with_args(vec![before.id.clone()]),
                );
                continue;
            }
            let component = ComponentComparison::compare(reference, current, &before.id)?;
            comparison.types_compared += component.types_compared;
            comparison.comparisons.push(component);
        }

        for after in current.components().filter(included) {
            if reference.component(&after.id).is_none() {
                comparison.deltas.push(
                    Delta::new(&after.id, DeltaKind::Added, ElementType::Baseline, DeltaFlag::ApiComponent, "")
                        .with_args(vec![after.id.clone()]),
                );
            }
        }

        Ok(comparison)
    }

    /// All deltas, whole-component ones first
    pub fn all_deltas(&self) -> impl Iterator<Item = &Delta> {
        self.deltas
            .iter()
            .chain(self.comparisons.iter().flat_map(|c| c.deltas.iter()))
    }

    /// Deltas of one component
    pub fn deltas_for<'s>(&'s self, id: &'s str) -> impl Iterator<Item = &'s Delta> + 's {
        self.all_deltas().filter(move |d| d.component_id == id)
    }
}
