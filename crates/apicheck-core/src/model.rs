//! API model: components, type descriptors and restriction tags
//!
//! These types describe one snapshot of an API surface. They carry no
//! behaviour beyond lookups and the visibility rules every check shares.

use crate::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared Java visibility, ordered from least to most visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Package,
    Protected,
    Public,
}

impl Visibility {
    /// Whether clients outside the declaring package can see the element
    pub fn is_client_visible(self) -> bool {
        matches!(self, Self::Public | Self::Protected)
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Package
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Package => write!(f, "package"),
            Self::Protected => write!(f, "protected"),
            Self::Public => write!(f, "public"),
        }
    }
}

/// Element modifiers
///
/// Serialized as a keyword list, e.g. `["public", "static", "final"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_deprecated: bool,
    /// Interface method with a body
    pub is_default: bool,
}

impl Modifiers {
    /// Public modifiers with no other flags
    pub fn public() -> Self {
        Self::with_visibility(Visibility::Public)
    }

    /// Protected modifiers with no other flags
    pub fn protected() -> Self {
        Self::with_visibility(Visibility::Protected)
    }

    /// Modifiers with the given visibility and no other flags
    pub fn with_visibility(visibility: Visibility) -> Self {
        Self {
            visibility,
            ..Self::default()
        }
    }

    pub fn set_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn set_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn set_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn set_deprecated(mut self) -> Self {
        self.is_deprecated = true;
        self
    }

    pub fn set_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Keyword list in source order
    pub fn keywords(&self) -> Vec<&'static str> {
        let mut words = Vec::new();
        match self.visibility {
            Visibility::Public => words.push("public"),
            Visibility::Protected => words.push("protected"),
            Visibility::Private => words.push("private"),
            Visibility::Package => {}
        }
        if self.is_abstract {
            words.push("abstract");
        }
        if self.is_default {
            words.push("default");
        }
        if self.is_static {
            words.push("static");
        }
        if self.is_final {
            words.push("final");
        }
        if self.is_deprecated {
            words.push("deprecated");
        }
        words
    }
}

impl TryFrom<Vec<String>> for Modifiers {
    type Error = String;

    fn try_from(words: Vec<String>) -> Result<Self, Self::Error> {
        let mut modifiers = Modifiers::default();
        for word in &words {
            match word.as_str() {
                "public" => modifiers.visibility = Visibility::Public,
                "protected" => modifiers.visibility = Visibility::Protected,
                "private" => modifiers.visibility = Visibility::Private,
                "package" => modifiers.visibility = Visibility::Package,
                "final" => modifiers.is_final = true,
                "abstract" => modifiers.is_abstract = true,
                "static" => modifiers.is_static = true,
                "deprecated" => modifiers.is_deprecated = true,
                "default" => modifiers.is_default = true,
                other => return Err(format!("unknown modifier '{}'", other)),
            }
        }
        Ok(modifiers)
    }
}

impl From<Modifiers> for Vec<String> {
    fn from(modifiers: Modifiers) -> Self {
        modifiers.keywords().into_iter().map(String::from).collect()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keywords().join(" "))
    }
}

/// An API restriction tag constraining how clients may use an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionTag {
    NoExtend,
    NoInstantiate,
    NoReference,
    NoImplement,
    NoOverride,
}

impl RestrictionTag {
    pub const ALL: [RestrictionTag; 5] = [
        Self::NoExtend,
        Self::NoInstantiate,
        Self::NoReference,
        Self::NoImplement,
        Self::NoOverride,
    ];

    /// Tag name without the leading `@`
    pub fn name(self) -> &'static str {
        match self {
            Self::NoExtend => "noextend",
            Self::NoInstantiate => "noinstantiate",
            Self::NoReference => "noreference",
            Self::NoImplement => "noimplement",
            Self::NoOverride => "nooverride",
        }
    }

    /// Javadoc spelling, e.g. `@noextend`
    pub fn javadoc(self) -> String {
        format!("@{}", self.name())
    }

    /// Parse a tag name, with or without the leading `@`
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix('@').unwrap_or(name);
        Self::ALL.into_iter().find(|tag| tag.name() == name)
    }

    fn bit(self) -> u8 {
        match self {
            Self::NoExtend => 0b0_0001,
            Self::NoInstantiate => 0b0_0010,
            Self::NoReference => 0b0_0100,
            Self::NoImplement => 0b0_1000,
            Self::NoOverride => 0b1_0000,
        }
    }
}

impl fmt::Display for RestrictionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// Set of restriction tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<RestrictionTag>", into = "Vec<RestrictionTag>")]
pub struct Restrictions(u8);

impl Restrictions {
    pub const NONE: Restrictions = Restrictions(0);

    pub fn new(tags: &[RestrictionTag]) -> Self {
        tags.iter().copied().collect()
    }

    pub fn contains(self, tag: RestrictionTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn insert(&mut self, tag: RestrictionTag) {
        self.0 |= tag.bit();
    }

    pub fn with(mut self, tag: RestrictionTag) -> Self {
        self.insert(tag);
        self
    }

    pub fn union(self, other: Restrictions) -> Self {
        Restrictions(self.0 | other.0)
    }

    /// Tags present in `self` but not in `other`
    pub fn difference(self, other: Restrictions) -> Self {
        Restrictions(self.0 & !other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = RestrictionTag> {
        RestrictionTag::ALL
            .into_iter()
            .filter(move |tag| self.contains(*tag))
    }

    pub fn no_extend(self) -> bool {
        self.contains(RestrictionTag::NoExtend)
    }

    pub fn no_instantiate(self) -> bool {
        self.contains(RestrictionTag::NoInstantiate)
    }

    pub fn no_reference(self) -> bool {
        self.contains(RestrictionTag::NoReference)
    }

    pub fn no_implement(self) -> bool {
        self.contains(RestrictionTag::NoImplement)
    }

    pub fn no_override(self) -> bool {
        self.contains(RestrictionTag::NoOverride)
    }
}

impl FromIterator<RestrictionTag> for Restrictions {
    fn from_iter<I: IntoIterator<Item = RestrictionTag>>(iter: I) -> Self {
        let mut set = Restrictions::NONE;
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl From<Vec<RestrictionTag>> for Restrictions {
    fn from(tags: Vec<RestrictionTag>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<Restrictions> for Vec<RestrictionTag> {
    fn from(set: Restrictions) -> Self {
        set.iter().collect()
    }
}

impl fmt::Display for Restrictions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<String> = self.iter().map(|t| t.javadoc()).collect();
        if tags.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", tags.join(" "))
        }
    }
}

/// Kind of a Java type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Interface => write!(f, "interface"),
            Self::Enum => write!(f, "enum"),
            Self::Annotation => write!(f, "annotation"),
        }
    }
}

/// Drop the package and generic arguments from a type name:
/// `java.util.List<java.lang.String>` becomes `List`, `a.B$C` becomes `B.C`.
pub fn simple_type_name(type_name: &str) -> String {
    let erased = erase_generics(type_name);
    let (base, dims) = match erased.find('[') {
        Some(idx) => (&erased[..idx], &erased[idx..]),
        None => (erased.as_str(), ""),
    };
    let simple = base.rsplit('.').next().unwrap_or(base);
    format!("{}{}", simple.replace('$', "."), dims)
}

/// Remove generic arguments: `Map<K, List<V>>` becomes `Map`
pub fn erase_generics(type_name: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(type_name.len());
    for c in type_name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }
    out
}

/// Package part of a qualified type name (empty for the default package)
pub fn package_of(type_name: &str) -> &str {
    type_name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
}

/// A field declared by a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    /// Declared type, fully qualified
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,

    #[serde(default)]
    pub modifiers: Modifiers,

    #[serde(default, skip_serializing_if = "Restrictions::is_empty")]
    pub restrictions: Restrictions,

    /// Compile-time constant value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<String>,

    /// Whether this field is an enum constant
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enum_constant: bool,

    /// Javadoc text, scanned for restriction tags on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

fn default_field_type() -> String {
    "java.lang.Object".to_string()
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            modifiers,
            restrictions: Restrictions::NONE,
            constant: None,
            enum_constant: false,
            doc: None,
        }
    }

    /// Create a public static final enum constant
    pub fn enum_constant(name: impl Into<String>, enum_type: impl Into<String>) -> Self {
        let mut field = Self::new(name, enum_type, Modifiers::public().set_static().set_final());
        field.enum_constant = true;
        field
    }

    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub fn with_constant(mut self, value: impl Into<String>) -> Self {
        self.constant = Some(value.into());
        self
    }

    /// A `static final` field with a constant value, inlined by compilers
    pub fn is_compile_time_constant(&self) -> bool {
        self.modifiers.is_static && self.modifiers.is_final && self.constant.is_some()
    }
}

/// Key identifying a method within its type: name plus erased parameter types
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodKey {
    pub name: String,
    pub parameters: Vec<String>,
}

impl MethodKey {
    pub fn new(name: impl Into<String>, parameters: &[String]) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().map(|p| erase_generics(p)).collect(),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.parameters.join(", "))
    }
}

/// Name used for constructors
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// A method or constructor declared by a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,

    /// Parameter types, fully qualified
    #[serde(default)]
    pub parameters: Vec<String>,

    #[serde(default = "default_return_type")]
    pub return_type: String,

    #[serde(default)]
    pub modifiers: Modifiers,

    #[serde(default, skip_serializing_if = "Restrictions::is_empty")]
    pub restrictions: Restrictions,

    /// Default value of an annotation member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

fn default_return_type() -> String {
    "void".to_string()
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, parameters: Vec<String>, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type: default_return_type(),
            modifiers,
            restrictions: Restrictions::NONE,
            default_value: None,
            type_parameters: Vec::new(),
            doc: None,
        }
    }

    /// Create a constructor
    pub fn constructor(parameters: Vec<String>, modifiers: Modifiers) -> Self {
        Self::new(CONSTRUCTOR_NAME, parameters, modifiers)
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn key(&self) -> MethodKey {
        MethodKey::new(self.name.clone(), &self.parameters)
    }

    /// Signature with simple parameter type names, e.g. `publicMethod(String)`.
    ///
    /// Constructors are shown with the simple name of `owner`.
    pub fn display_signature(&self, owner: &str) -> String {
        let name = if self.is_constructor() {
            simple_type_name(owner)
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            self.name.clone()
        };
        let params: Vec<String> = self.parameters.iter().map(|p| simple_type_name(p)).collect();
        format!("{}({})", name, params.join(", "))
    }
}

/// How a type's code uses another element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Method or constructor invocation
    Call,
    FieldAccess,
    /// `new T(...)`
    Instantiate,
    /// Plain use of a type (declaration, cast, class literal)
    TypeReference,
}

/// A reference from a type's code to an element of another type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,

    /// Referenced type, fully qualified
    pub target_type: String,

    /// Referenced member name (`<init>` for constructors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,

    /// Parameter types of a referenced method
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,

    /// Member of the source type containing the reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_member: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Reference {
    pub fn new(kind: ReferenceKind, target_type: impl Into<String>) -> Self {
        Self {
            kind,
            target_type: target_type.into(),
            member: None,
            parameters: Vec::new(),
            source_member: None,
            line: None,
        }
    }

    /// Reference to a method (or constructor) of `target_type`
    pub fn call(target_type: impl Into<String>, member: impl Into<String>, parameters: Vec<String>) -> Self {
        let mut reference = Self::new(ReferenceKind::Call, target_type);
        reference.member = Some(member.into());
        reference.parameters = parameters;
        reference
    }

    pub fn field(target_type: impl Into<String>, member: impl Into<String>) -> Self {
        let mut reference = Self::new(ReferenceKind::FieldAccess, target_type);
        reference.member = Some(member.into());
        reference
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// A Java type with its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Qualified name; member types use `Outer$Inner`
    pub name: String,

    pub kind: TypeKind,

    #[serde(default)]
    pub modifiers: Modifiers,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,

    #[serde(default, skip_serializing_if = "Restrictions::is_empty")]
    pub restrictions: Restrictions,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers,
            superclass: None,
            interfaces: Vec::new(),
            type_parameters: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            restrictions: Restrictions::NONE,
            references: Vec::new(),
            doc: None,
        }
    }

    /// Public class shorthand
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class, Modifiers::public())
    }

    /// Public interface shorthand
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface, Modifiers::public().set_abstract())
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    /// Package of the type (empty for the default package)
    pub fn package(&self) -> &str {
        let outer = self.name.split('$').next().unwrap_or(&self.name);
        package_of(outer)
    }

    pub fn simple_name(&self) -> String {
        simple_type_name(&self.name)
    }

    /// Enclosing type of a member type
    pub fn enclosing_type(&self) -> Option<&str> {
        self.name.rsplit_once('$').map(|(outer, _)| outer)
    }

    pub fn is_member_type(&self) -> bool {
        self.enclosing_type().is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, key: &MethodKey) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| &m.key() == key)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    /// Whether clients may subclass this type.
    ///
    /// A class without declared constructors gets the implicit default one.
    pub fn is_extendable(&self) -> bool {
        if self.kind != TypeKind::Class || self.modifiers.is_final || self.restrictions.no_extend() {
            return false;
        }
        let mut constructors = self.constructors().peekable();
        constructors.peek().is_none()
            || constructors.any(|c| c.modifiers.visibility.is_client_visible())
    }

    /// Whether clients may create instances with `new`
    pub fn is_instantiable(&self) -> bool {
        if self.kind != TypeKind::Class || self.modifiers.is_abstract || self.restrictions.no_instantiate() {
            return false;
        }
        let mut constructors = self.constructors().peekable();
        constructors.peek().is_none()
            || constructors.any(|c| c.modifiers.visibility == Visibility::Public)
    }

    /// Whether clients may implement this interface
    pub fn is_implementable(&self) -> bool {
        self.kind == TypeKind::Interface && !self.restrictions.no_implement()
    }

    /// Abstract methods a concrete implementor must provide
    pub fn abstract_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        let kind = self.kind;
        self.methods.iter().filter(move |m| {
            if m.is_constructor() || m.modifiers.is_static {
                return false;
            }
            match kind {
                TypeKind::Interface => !m.modifiers.is_default,
                _ => m.modifiers.is_abstract,
            }
        })
    }
}

/// A package exported by a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageExport {
    pub name: String,

    #[serde(default)]
    pub version: Version,

    /// Exported for technical reasons only (`x-internal`)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub internal: bool,

    /// Components allowed to use this package as API (`x-friends`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub friends: Vec<String>,
}

impl PackageExport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Version::zero(),
            internal: false,
            friends: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn with_friends(mut self, friends: Vec<String>) -> Self {
        self.internal = true;
        self.friends = friends;
        self
    }
}

/// An Import-Package requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageImport {
    pub name: String,

    #[serde(default)]
    pub range: VersionRange,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl PackageImport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: VersionRange::any(),
            optional: false,
        }
    }
}

/// A Require-Bundle requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRequirement {
    pub id: String,

    #[serde(default)]
    pub range: VersionRange,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    /// Re-export the required bundle's packages to our own dependents
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reexport: bool,
}

impl BundleRequirement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            range: VersionRange::any(),
            optional: false,
            reexport: false,
        }
    }

    pub fn reexported(mut self) -> Self {
        self.reexport = true;
        self
    }
}

/// Fragment host specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    pub id: String,

    #[serde(default)]
    pub range: VersionRange,
}

/// A distributable unit (bundle) of API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Symbolic name
    pub id: String,

    #[serde(default)]
    pub version: Version,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<PackageExport>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<PackageImport>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<BundleRequirement>,

    /// Host of a fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostSpec>,

    /// Provides the `java.*` system packages
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub system_library: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub execution_environments: Vec<String>,

    /// Declared types keyed by qualified name
    #[serde(default, with = "type_list")]
    pub types: BTreeMap<String, TypeDescriptor>,
}

impl Component {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            exports: Vec::new(),
            imports: Vec::new(),
            requires: Vec::new(),
            host: None,
            system_library: false,
            execution_environments: Vec::new(),
            types: BTreeMap::new(),
        }
    }

    pub fn with_export(mut self, export: PackageExport) -> Self {
        self.exports.push(export);
        self
    }

    pub fn with_import(mut self, import: PackageImport) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_requirement(mut self, requirement: BundleRequirement) -> Self {
        self.requires.push(requirement);
        self
    }

    pub fn with_host(mut self, id: impl Into<String>) -> Self {
        self.host = Some(HostSpec {
            id: id.into(),
            range: VersionRange::any(),
        });
        self
    }

    /// Add a type, replacing any type with the same name
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.add_type(descriptor);
        self
    }

    pub fn add_type(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn is_fragment(&self) -> bool {
        self.host.is_some()
    }

    pub fn export(&self, package: &str) -> Option<&PackageExport> {
        self.exports.iter().find(|e| e.name == package)
    }

    /// Packages containing at least one declared type, sorted
    pub fn package_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.values().map(|t| t.package()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn declares_package(&self, package: &str) -> bool {
        self.types.values().any(|t| t.package() == package)
    }

    /// Whether `package` is API for `client` (any client when `None`)
    pub fn is_api_package(&self, package: &str, client: Option<&str>) -> bool {
        match self.export(package) {
            Some(export) if !export.internal => true,
            Some(export) => client.map_or(false, |c| export.friends.iter().any(|f| f == c)),
            None => false,
        }
    }

    /// Whether the named type is part of this component's API
    pub fn is_api_type(&self, name: &str) -> bool {
        let Some(descriptor) = self.types.get(name) else {
            return false;
        };
        if !self.is_api_package(descriptor.package(), None) {
            return false;
        }
        match descriptor.enclosing_type() {
            None => descriptor.modifiers.visibility == Visibility::Public,
            Some(outer) => {
                descriptor.modifiers.visibility.is_client_visible() && self.is_api_type(outer)
            }
        }
    }

    /// API types sorted by name
    pub fn api_types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values().filter(move |t| self.is_api_type(&t.name))
    }
}

/// Serialize the type map as a plain list, rejecting duplicate names
mod type_list {
    use super::TypeDescriptor;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(types: &BTreeMap<String, TypeDescriptor>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(types.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<String, TypeDescriptor>, D::Error> {
        let list = Vec::<TypeDescriptor>::deserialize(deserializer)?;
        let mut types = BTreeMap::new();
        for descriptor in list {
            let name = descriptor.name.clone();
            if types.insert(name.clone(), descriptor).is_some() {
                return Err(D::Error::custom(format!("duplicate type '{}'", name)));
            }
        }
        Ok(types)
    }
}
