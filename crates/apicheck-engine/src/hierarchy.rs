//! Type hierarchy lookups through a baseline
//!
//! Supertypes are resolved from the perspective of the component that
//! declares the subtype, so only packages that component can see are
//! searched. Unresolved supertypes and cycles end the walk.

use apicheck_baseline::Baseline;
use apicheck_core::{Component, MethodDescriptor, MethodKey, TypeDescriptor, TypeKind};
use std::collections::{BTreeSet, HashSet, VecDeque};

const OBJECT: &str = "java.lang.Object";

/// A type together with the component declaring it
#[derive(Debug, Clone, Copy)]
pub struct TypeRef<'a> {
    pub component: &'a Component,
    pub descriptor: &'a TypeDescriptor,
}

/// Hierarchy queries against one baseline
#[derive(Debug, Clone, Copy)]
pub struct Hierarchy<'a> {
    baseline: &'a Baseline,
}

impl<'a> Hierarchy<'a> {
    pub fn new(baseline: &'a Baseline) -> Self {
        Self { baseline }
    }

    /// Resolve a type name as seen from `component_id`
    pub fn resolve(&self, component_id: &str, type_name: &str) -> Option<TypeRef<'a>> {
        self.baseline
            .find_type(component_id, type_name)
            .map(|(component, descriptor)| TypeRef { component, descriptor })
    }

    /// Superclasses of a type, nearest first, that resolve in the baseline
    pub fn superclasses(&self, component_id: &str, descriptor: &TypeDescriptor) -> Vec<TypeRef<'a>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([descriptor.name.clone()]);
        let mut from = component_id.to_string();
        let mut next = descriptor.superclass.clone();

        while let Some(name) = next.take() {
            if !seen.insert(name.clone()) {
                break;
            }
            let Some(found) = self.resolve(&from, &name) else {
                break;
            };
            from = found.component.id.clone();
            next = found.descriptor.superclass.clone();
            chain.push(found);
        }

        chain
    }

    /// Names in the superclass chain, including a final unresolved name.
    ///
    /// `java.lang.Object` is implicit and never listed.
    pub fn superclass_names(&self, component_id: &str, descriptor: &TypeDescriptor) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut seen = HashSet::from([descriptor.name.clone()]);
        let mut from = component_id.to_string();
        let mut next = descriptor.superclass.clone();

        while let Some(name) = next.take() {
            if name == OBJECT || !seen.insert(name.clone()) {
                break;
            }
            names.insert(name.clone());
            if let Some(found) = self.resolve(&from, &name) {
                from = found.component.id.clone();
                next = found.descriptor.superclass.clone();
            }
        }

        names
    }

    /// All interfaces a type implements or extends, directly or through
    /// its superclasses and superinterfaces
    pub fn superinterface_names(&self, component_id: &str, descriptor: &TypeDescriptor) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut queue: VecDeque<(String, String)> = VecDeque::new();

        fn enqueue_direct(owner: &str, t: &TypeDescriptor, queue: &mut VecDeque<(String, String)>) {
            for interface in &t.interfaces {
                queue.push_back((owner.to_string(), interface.clone()));
            }
        }

        enqueue_direct(component_id, descriptor, &mut queue);
        for superclass in self.superclasses(component_id, descriptor) {
            enqueue_direct(&superclass.component.id, superclass.descriptor, &mut queue);
        }

        while let Some((from, name)) = queue.pop_front() {
            if !names.insert(name.clone()) {
                continue;
            }
            if let Some(found) = self.resolve(&from, &name) {
                enqueue_direct(&found.component.id, found.descriptor, &mut queue);
            }
        }

        names
    }

    /// Resolved superinterfaces of an interface or class, excluding itself
    pub fn superinterfaces(&self, component_id: &str, descriptor: &TypeDescriptor) -> Vec<TypeRef<'a>> {
        let queue = descriptor
            .interfaces
            .iter()
            .map(|i| (component_id.to_string(), i.clone()))
            .collect();
        self.walk_interfaces(queue)
    }

    /// Resolved superinterfaces of a type and of its superclasses
    pub fn all_superinterfaces(&self, component_id: &str, descriptor: &TypeDescriptor) -> Vec<TypeRef<'a>> {
        let mut queue: VecDeque<(String, String)> = descriptor
            .interfaces
            .iter()
            .map(|i| (component_id.to_string(), i.clone()))
            .collect();
        for superclass in self.superclasses(component_id, descriptor) {
            for interface in &superclass.descriptor.interfaces {
                queue.push_back((superclass.component.id.clone(), interface.clone()));
            }
        }
        self.walk_interfaces(queue)
    }

    fn walk_interfaces(&self, mut queue: VecDeque<(String, String)>) -> Vec<TypeRef<'a>> {
        let mut resolved = Vec::new();
        let mut seen = HashSet::new();

        while let Some((from, name)) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(found) = self.resolve(&from, &name) {
                for interface in &found.descriptor.interfaces {
                    queue.push_back((found.component.id.clone(), interface.clone()));
                }
                resolved.push(found);
            }
        }

        resolved
    }

    /// A method inherited from the superclass chain
    pub fn inherited_method(
        &self,
        component_id: &str,
        descriptor: &TypeDescriptor,
        key: &MethodKey,
    ) -> Option<(TypeRef<'a>, &'a MethodDescriptor)> {
        self.superclasses(component_id, descriptor)
            .into_iter()
            .find_map(|superclass| superclass.descriptor.method(key).map(|m| (superclass, m)))
    }

    /// A method declared by one of the interfaces a type inherits, nearest first
    pub fn interface_method(
        &self,
        component_id: &str,
        descriptor: &TypeDescriptor,
        key: &MethodKey,
    ) -> Option<(TypeRef<'a>, &'a MethodDescriptor)> {
        self.all_superinterfaces(component_id, descriptor)
            .into_iter()
            .find_map(|interface| interface.descriptor.method(key).map(|m| (interface, m)))
    }

    /// Whether an interface, or any interface it extends, declares methods
    /// implementors must provide
    pub fn interface_has_abstract_methods(&self, component_id: &str, interface_name: &str) -> bool {
        let Some(interface) = self.resolve(component_id, interface_name) else {
            return false;
        };
        if interface.descriptor.kind != TypeKind::Interface {
            return false;
        }
        interface.descriptor.abstract_methods().next().is_some()
            || self
                .superinterfaces(&interface.component.id, interface.descriptor)
                .iter()
                .any(|i| i.descriptor.abstract_methods().next().is_some())
    }
}
