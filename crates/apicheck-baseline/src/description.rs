//! API descriptions
//!
//! An API description records, for one component, which packages are API
//! and which restriction tags apply to each element. It also knows where
//! each tag may legally appear.

use apicheck_core::{
    Component, FieldDescriptor, MethodDescriptor, MethodKey, RestrictionTag, Restrictions, TypeDescriptor, TypeKind,
};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// API visibility of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiVisibility {
    /// Exported without restriction
    Api,

    /// Not exported, or exported as `x-internal`
    Private,

    /// Internal, but API for the listed friends
    PrivatePermissible(Vec<String>),
}

/// An element addressed by an API description
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKey {
    Type(String),
    Field { type_name: String, name: String },
    Method { type_name: String, method: MethodKey },
}

impl ElementKey {
    pub fn field(type_name: &str, name: &str) -> Self {
        Self::Field {
            type_name: type_name.to_string(),
            name: name.to_string(),
        }
    }

    pub fn method(type_name: &str, method: &MethodDescriptor) -> Self {
        Self::Method {
            type_name: type_name.to_string(),
            method: method.key(),
        }
    }

    /// Type owning the element
    pub fn type_name(&self) -> &str {
        match self {
            Self::Type(name) => name,
            Self::Field { type_name, .. } | Self::Method { type_name, .. } => type_name,
        }
    }
}

/// Restriction tags and package visibility of one component
#[derive(Debug, Clone, Default)]
pub struct ApiDescription {
    component_id: String,
    packages: BTreeMap<String, ApiVisibility>,
    elements: HashMap<ElementKey, Restrictions>,
}

impl ApiDescription {
    /// Build the description of a component
    pub fn from_component(component: &Component) -> Self {
        let mut packages = BTreeMap::new();
        for package in component.package_names() {
            packages.insert(package.to_string(), ApiVisibility::Private);
        }
        for export in &component.exports {
            let visibility = match (export.internal, export.friends.is_empty()) {
                (false, _) => ApiVisibility::Api,
                (true, true) => ApiVisibility::Private,
                (true, false) => ApiVisibility::PrivatePermissible(export.friends.clone()),
            };
            packages.insert(export.name.clone(), visibility);
        }

        let mut elements = HashMap::new();
        for descriptor in component.types.values() {
            elements.insert(ElementKey::Type(descriptor.name.clone()), descriptor.restrictions);
            for field in &descriptor.fields {
                elements.insert(ElementKey::field(&descriptor.name, &field.name), field.restrictions);
            }
            for method in &descriptor.methods {
                elements.insert(ElementKey::method(&descriptor.name, method), method.restrictions);
            }
        }

        Self {
            component_id: component.id.clone(),
            packages,
            elements,
        }
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    /// Visibility of a package; unknown packages are private
    pub fn package_visibility(&self, package: &str) -> ApiVisibility {
        self.packages.get(package).cloned().unwrap_or(ApiVisibility::Private)
    }

    /// Whether a package is API for the given client component
    pub fn is_api_for(&self, package: &str, client: &str) -> bool {
        match self.package_visibility(package) {
            ApiVisibility::Api => true,
            ApiVisibility::Private => false,
            ApiVisibility::PrivatePermissible(friends) => friends.iter().any(|f| f == client),
        }
    }

    /// Tags declared on the element itself
    pub fn restrictions(&self, key: &ElementKey) -> Restrictions {
        self.elements.get(key).copied().unwrap_or_default()
    }

    /// Tags in force for an element.
    ///
    /// `noreference` on a type (or any enclosing type) covers all its members.
    pub fn effective_restrictions(&self, key: &ElementKey) -> Restrictions {
        let mut restrictions = self.restrictions(key);
        let mut owner = match key {
            ElementKey::Type(name) => name.rsplit_once('$').map(|(outer, _)| outer),
            other => Some(other.type_name()),
        };
        while let Some(type_name) = owner {
            if self.restrictions(&ElementKey::Type(type_name.to_string())).no_reference() {
                restrictions.insert(RestrictionTag::NoReference);
            }
            owner = type_name.rsplit_once('$').map(|(outer, _)| outer);
        }
        restrictions
    }

    /// Number of elements carrying at least one tag
    pub fn tagged_elements(&self) -> usize {
        self.elements.values().filter(|r| !r.is_empty()).count()
    }
}

fn tag_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?m)(?:^|\s|\*)@(no[a-z]+)\b").ok())
        .as_ref()
}

/// Extract restriction tags from javadoc text, ignoring unknown tags
pub fn parse_tags(doc: &str) -> Restrictions {
    let Some(pattern) = tag_pattern() else {
        return Restrictions::NONE;
    };
    pattern
        .captures_iter(doc)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| RestrictionTag::from_name(m.as_str()))
        .collect()
}

/// Where a tag is being placed
#[derive(Debug, Clone, Copy)]
pub enum TagContext<'a> {
    Type(&'a TypeDescriptor),
    Field {
        owner: &'a TypeDescriptor,
        field: &'a FieldDescriptor,
    },
    Method {
        owner: &'a TypeDescriptor,
        method: &'a MethodDescriptor,
    },
}

impl TagContext<'_> {
    /// Human-readable description of the element, e.g. `a final class`
    pub fn describe(&self) -> String {
        match self {
            Self::Type(t) => match t.kind {
                TypeKind::Class if t.modifiers.is_final => "a final class".to_string(),
                TypeKind::Class if t.modifiers.is_abstract => "an abstract class".to_string(),
                TypeKind::Class => "a class".to_string(),
                TypeKind::Interface => "an interface".to_string(),
                TypeKind::Enum => "an enum".to_string(),
                TypeKind::Annotation => "an annotation".to_string(),
            },
            Self::Field { owner, field } => {
                let place = owner_phrase(owner.kind);
                if field.enum_constant {
                    format!("an enum constant {}", place)
                } else if field.is_compile_time_constant() {
                    format!("a constant field {}", place)
                } else {
                    format!("a field {}", place)
                }
            }
            Self::Method { owner, method } => {
                let place = owner_phrase(owner.kind);
                if method.is_constructor() {
                    format!("a constructor {}", place)
                } else if method.modifiers.is_final {
                    format!("a final method {}", place)
                } else if method.modifiers.is_static {
                    format!("a static method {}", place)
                } else if method.modifiers.is_default {
                    format!("a default method {}", place)
                } else {
                    format!("a method {}", place)
                }
            }
        }
    }

    fn own_visibility_allows_tags(&self) -> bool {
        match self {
            Self::Type(t) => t.modifiers.visibility.is_client_visible(),
            Self::Field { field, .. } => field.modifiers.visibility.is_client_visible(),
            Self::Method { method, .. } => method.modifiers.visibility.is_client_visible(),
        }
    }
}

fn owner_phrase(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Class => "in a class",
        TypeKind::Interface => "in an interface",
        TypeKind::Enum => "in an enum",
        TypeKind::Annotation => "in an annotation",
    }
}

/// Tags that may legally appear on an element
pub fn supported_tags(context: TagContext<'_>) -> Restrictions {
    use RestrictionTag::*;

    if !context.own_visibility_allows_tags() {
        return Restrictions::NONE;
    }

    let mut tags = Restrictions::NONE;
    match context {
        TagContext::Type(t) => match t.kind {
            TypeKind::Class => {
                tags.insert(NoReference);
                if !t.modifiers.is_final {
                    tags.insert(NoExtend);
                }
                if !t.modifiers.is_abstract {
                    tags.insert(NoInstantiate);
                }
            }
            TypeKind::Interface => {
                tags.insert(NoReference);
                tags.insert(NoImplement);
                tags.insert(NoExtend);
            }
            TypeKind::Enum | TypeKind::Annotation => tags.insert(NoReference),
        },
        TagContext::Field { field, .. } => {
            if !field.is_compile_time_constant() {
                tags.insert(NoReference);
            }
        }
        TagContext::Method { owner, method } => {
            tags.insert(NoReference);
            if method.is_constructor() {
                return tags;
            }
            let m = &method.modifiers;
            match owner.kind {
                TypeKind::Class if !m.is_final && !m.is_static && !owner.modifiers.is_final => {
                    tags.insert(NoOverride)
                }
                TypeKind::Interface if m.is_default => tags.insert(NoOverride),
                _ => {}
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicheck_core::{Modifiers, PackageExport, Version, Visibility};

    #[test]
    fn parse_javadoc_tags() {
        let doc = "/**\n * Widget factory.\n * @noextend This class is not intended to be subclassed.\n * @noinstantiate\n * @since 3.4\n * @nofoo\n */";
        let tags = parse_tags(doc);
        assert_eq!(tags, Restrictions::new(&[RestrictionTag::NoExtend, RestrictionTag::NoInstantiate]));

        assert!(parse_tags("mail me at someone@noreference.org").is_empty());
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn package_visibility() {
        let component = Component::new("a", Version::new(1, 0, 0))
            .with_export(PackageExport::new("a.api"))
            .with_export(PackageExport::new("a.internal").internal())
            .with_export(PackageExport::new("a.shared").with_friends(vec!["b".into()]))
            .with_type(TypeDescriptor::class("a.impl.Hidden"));
        let description = ApiDescription::from_component(&component);

        assert_eq!(description.package_visibility("a.api"), ApiVisibility::Api);
        assert_eq!(description.package_visibility("a.internal"), ApiVisibility::Private);
        assert_eq!(description.package_visibility("a.impl"), ApiVisibility::Private);
        assert!(description.is_api_for("a.shared", "b"));
        assert!(!description.is_api_for("a.shared", "c"));
    }

    #[test]
    fn type_noreference_covers_members() {
        let method = MethodDescriptor::new("run", vec![], Modifiers::public());
        let component = Component::new("a", Version::new(1, 0, 0))
            .with_type(
                TypeDescriptor::class("a.Outer")
                    .with_restrictions(Restrictions::NONE.with(RestrictionTag::NoReference))
                    .with_method(method.clone()),
            )
            .with_type(TypeDescriptor::class("a.Outer$Inner"));
        let description = ApiDescription::from_component(&component);

        let key = ElementKey::method("a.Outer", &method);
        assert!(description.restrictions(&key).is_empty());
        assert!(description.effective_restrictions(&key).no_reference());
        assert!(description
            .effective_restrictions(&ElementKey::Type("a.Outer$Inner".into()))
            .no_reference());
        assert_eq!(description.tagged_elements(), 1);
    }

    #[test]
    fn class_tag_rules() {
        let final_class = TypeDescriptor::new("a.F", TypeKind::Class, Modifiers::public().set_final());
        let supported = supported_tags(TagContext::Type(&final_class));
        assert!(!supported.no_extend());
        assert!(supported.no_instantiate());

        let abstract_class = TypeDescriptor::new("a.A", TypeKind::Class, Modifiers::public().set_abstract());
        assert!(!supported_tags(TagContext::Type(&abstract_class)).no_instantiate());

        let annotation = TypeDescriptor::new("a.Ann", TypeKind::Annotation, Modifiers::public());
        assert_eq!(
            supported_tags(TagContext::Type(&annotation)),
            Restrictions::NONE.with(RestrictionTag::NoReference)
        );

        let hidden = TypeDescriptor::new("a.H", TypeKind::Class, Modifiers::with_visibility(Visibility::Package));
        assert!(supported_tags(TagContext::Type(&hidden)).is_empty());
    }

    #[test]
    fn member_tag_rules() {
        let class = TypeDescriptor::class("a.C");
        let method = MethodDescriptor::new("m", vec![], Modifiers::public());
        let supported = supported_tags(TagContext::Method {
            owner: &class,
            method: &method,
        });
        assert!(supported.no_override());
        assert!(!supported.no_instantiate());

        let ctor = MethodDescriptor::constructor(vec![], Modifiers::public());
        assert_eq!(
            supported_tags(TagContext::Method {
                owner: &class,
                method: &ctor
            }),
            Restrictions::NONE.with(RestrictionTag::NoReference)
        );

        let interface = TypeDescriptor::interface("a.I");
        let abstract_method = MethodDescriptor::new("m", vec![], Modifiers::public().set_abstract());
        assert!(!supported_tags(TagContext::Method {
            owner: &interface,
            method: &abstract_method
        })
        .no_override());

        let constant = FieldDescriptor::new("MAX", "int", Modifiers::public().set_static().set_final()).with_constant("10");
        assert!(supported_tags(TagContext::Field {
            owner: &class,
            field: &constant
        })
        .is_empty());

        let enum_type = TypeDescriptor::new("a.E", TypeKind::Enum, Modifiers::public());
        let enum_constant = FieldDescriptor::enum_constant("RED", "a.E");
        let context = TagContext::Field {
            owner: &enum_type,
            field: &enum_constant,
        };
        assert_eq!(supported_tags(context), Restrictions::NONE.with(RestrictionTag::NoReference));
        assert_eq!(context.describe(), "an enum constant in an enum");
    }
}
