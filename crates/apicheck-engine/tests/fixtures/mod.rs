//! Test fixtures for engine integration tests
//!
//! The method-removal fixture pairs a reference baseline whose classes carry
//! every combination of type tags with a current baseline where the methods
//! are gone. Which removals are problems depends only on the reference tags.

use apicheck_baseline::Baseline;
use apicheck_core::{
    BundleRequirement, Component, MethodDescriptor, Modifiers, PackageExport, RestrictionTag, Restrictions,
    TypeDescriptor, Version, Visibility,
};

pub const API: &str = "org.example.api";
pub const CLIENT: &str = "org.example.client";

/// Classes of the removal fixture with their type-level tags
pub const CLASSES: &[(&str, &[RestrictionTag])] = &[
    ("Plain", &[]),
    ("NoExtend", &[RestrictionTag::NoExtend]),
    ("NoInstantiate", &[RestrictionTag::NoInstantiate]),
    (
        "NoExtendNoInstantiate",
        &[RestrictionTag::NoExtend, RestrictionTag::NoInstantiate],
    ),
];

pub fn qualified(simple: &str) -> String {
    format!("{}.{}", API, simple)
}

fn method(name: &str, visibility: Visibility, tags: &[RestrictionTag]) -> MethodDescriptor {
    MethodDescriptor::new(name, vec!["java.lang.String".to_string()], Modifiers::with_visibility(visibility))
        .with_restrictions(Restrictions::new(tags))
}

/// Public, protected and private methods, all tagged with `tags`
fn methods(tags: &[RestrictionTag]) -> Vec<MethodDescriptor> {
    vec![
        method("publicMethod", Visibility::Public, tags),
        method("protectedMethod", Visibility::Protected, tags),
        method("privateMethod", Visibility::Private, tags),
    ]
}

/// An exported API component
pub fn api_component(version: Version, types: Vec<TypeDescriptor>) -> Component {
    let mut component = Component::new(API, version).with_export(PackageExport::new(API));
    for t in types {
        component.add_type(t);
    }
    component
}

fn removal_types(with_methods: bool) -> Vec<TypeDescriptor> {
    let mut types = Vec::new();
    for (name, tags) in CLASSES {
        let mut class = TypeDescriptor::class(qualified(name)).with_restrictions(Restrictions::new(tags));
        if with_methods {
            class.methods = methods(&[]);
        }
        types.push(class);
    }

    for (name, member_tags) in [
        ("NoOverrideMethods", RestrictionTag::NoOverride),
        ("NoReferenceMethods", RestrictionTag::NoReference),
    ] {
        let mut class = TypeDescriptor::class(qualified(name));
        if with_methods {
            class.methods = methods(&[member_tags]);
        }
        types.push(class);
    }
    types
}

/// Reference baseline of the method-removal fixture
pub fn removal_reference() -> Baseline {
    Baseline::new("reference", vec![api_component(Version::new(1, 0, 0), removal_types(true))])
}

/// Current baseline of the method-removal fixture
pub fn removal_current(version: Version) -> Baseline {
    Baseline::new("current", vec![api_component(version, removal_types(false))])
}

/// A client implementing a `noimplement` interface through its own interface
pub fn indirect_implement() -> Baseline {
    let v = Version::new(1, 0, 0);
    let api = api_component(
        v.clone(),
        vec![TypeDescriptor::interface(qualified("INoImpl"))
            .with_restrictions(Restrictions::new(&[RestrictionTag::NoImplement]))],
    );
    let client = Component::new(CLIENT, v)
        .with_requirement(BundleRequirement::new(API))
        .with_type(TypeDescriptor::interface("org.example.client.ILocal").with_interface(qualified("INoImpl")))
        .with_type(TypeDescriptor::class("org.example.client.Impl").with_interface("org.example.client.ILocal"));
    Baseline::new("indirect", vec![api, client])
}
