//! Type descriptors consumed from the member catalog.
//!
//! A [`TypeInfo`] is the runtime-independent description of a type the pipeline needs to know
//! about: proxied classes and interfaces, mixin runtime types, generic witnesses and the
//! types appearing in member signatures. Descriptors are shared through [`TypeRef`]
//! (`Arc<TypeInfo>`) and compare structurally by identity (kind, full name, generic arguments
//! and element type), never by pointer.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bitflags::bitflags;

/// Shared reference to a type descriptor
pub type TypeRef = Arc<TypeInfo>;

/// Namespace of the well-known primitive types
pub const SYSTEM_NAMESPACE: &str = "System";

/// Primitive types every signature can refer to without a catalog lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum PrimitiveKind {
    /// `System.Void`
    Void,
    /// `System.Boolean`
    Boolean,
    /// `System.Char`
    Char,
    /// `System.Int32`
    Int32,
    /// `System.Int64`
    Int64,
    /// `System.Double`
    Double,
    /// `System.String`
    String,
    /// `System.Object`
    Object,
}

/// Category of a type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Reference type that can be subclassed by a class proxy
    Class,
    /// Interface, the contract of interface proxies and mixins
    Interface,
    /// User defined value type
    ValueType,
    /// One of the well-known primitives
    Primitive(PrimitiveKind),
    /// Single dimension array of `element`
    Array,
    /// By-reference `element`
    ByRef,
    /// Unbound generic parameter at the given position
    GenericParameter(u32),
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Type attributes that influence whether and how a type can be proxied
    pub struct TypeFlags: u32 {
        /// Type cannot be derived from
        const SEALED = 0x0100;
        /// Type cannot be instantiated, it has abstract members
        const ABSTRACT = 0x0080;
        /// Type implements the serializable contract
        const SERIALIZABLE = 0x2000;
        /// Type provides the serialization constructor
        const SERIALIZATION_CTOR = 0x4000;
    }
}

/// Descriptor of a single type.
pub struct TypeInfo {
    /// Namespace, can be empty
    pub namespace: String,
    /// Simple name, without generic arguments
    pub name: String,
    /// Category of the type
    pub kind: TypeKind,
    /// Attribute flags
    pub flags: TypeFlags,
    /// Base type (`extends`), if any
    pub base: Option<TypeRef>,
    /// Directly implemented interfaces
    pub interfaces: Vec<TypeRef>,
    /// Generic arguments of a closed generic type
    pub generic_args: Vec<TypeRef>,
    /// Element type of arrays and by-ref types
    pub element: Option<TypeRef>,
}

impl TypeInfo {
    /// Creates a descriptor without base, interfaces or generic arguments
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        TypeInfo {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            flags: TypeFlags::empty(),
            base: None,
            interfaces: Vec::new(),
            generic_args: Vec::new(),
            element: None,
        }
    }

    /// Creates a class descriptor
    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, TypeKind::Class)
    }

    /// Creates an interface descriptor
    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, TypeKind::Interface)
    }

    /// Returns the shared descriptor of a primitive type
    #[must_use]
    pub fn primitive(kind: PrimitiveKind) -> TypeRef {
        Arc::new(Self::new(
            SYSTEM_NAMESPACE,
            kind.to_string(),
            TypeKind::Primitive(kind),
        ))
    }

    /// Returns an unbound generic parameter descriptor, e.g. `T` at `position`
    #[must_use]
    pub fn generic_parameter(name: impl Into<String>, position: u32) -> TypeRef {
        Arc::new(Self::new("", name, TypeKind::GenericParameter(position)))
    }

    /// Closes the generic `definition` over `args`
    #[must_use]
    pub fn instantiate(definition: &TypeRef, args: Vec<TypeRef>) -> TypeRef {
        Arc::new(TypeInfo {
            namespace: definition.namespace.clone(),
            name: definition.name.clone(),
            kind: definition.kind,
            flags: definition.flags,
            base: definition.base.clone(),
            interfaces: definition.interfaces.clone(),
            generic_args: args,
            element: None,
        })
    }

    /// Returns the single dimension array type of `element`
    #[must_use]
    pub fn array_of(element: &TypeRef) -> TypeRef {
        let mut array = Self::new(
            element.namespace.clone(),
            format!("{}[]", element.name),
            TypeKind::Array,
        );
        array.element = Some(element.clone());
        Arc::new(array)
    }

    /// Returns the by-reference type of `element`
    #[must_use]
    pub fn by_ref(element: &TypeRef) -> TypeRef {
        let mut by_ref = Self::new(
            element.namespace.clone(),
            format!("{}&", element.name),
            TypeKind::ByRef,
        );
        by_ref.element = Some(element.clone());
        Arc::new(by_ref)
    }

    /// Sets the base type
    #[must_use]
    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    /// Adds directly implemented interfaces
    #[must_use]
    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = TypeRef>) -> Self {
        self.interfaces.extend(interfaces);
        self
    }

    /// Adds attribute flags
    #[must_use]
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Wraps the descriptor into a shared [`TypeRef`]
    #[must_use]
    pub fn into_ref(self) -> TypeRef {
        Arc::new(self)
    }

    /// Returns the full name (Namespace.Name) of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }

    /// True for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// True if the type cannot be derived from
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(TypeFlags::SEALED)
            || matches!(self.kind, TypeKind::Primitive(_) | TypeKind::ValueType)
    }

    /// True if the type (or one of its generic arguments / element) is an unbound generic parameter
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.kind, TypeKind::GenericParameter(_))
            || self.generic_args.iter().any(|arg| arg.is_open())
            || self.element.as_ref().is_some_and(|element| element.is_open())
    }

    /// Returns true if this type is, inherits from, or implements `other`
    #[must_use]
    pub fn implements(&self, other: &TypeInfo) -> bool {
        if self == other {
            return true;
        }

        if self.interfaces.iter().any(|iface| iface.implements(other)) {
            return true;
        }

        self.base.as_ref().is_some_and(|base| base.implements(other))
    }

    /// All interfaces implemented by this type, including the ones inherited through the base
    /// chain and through interface inheritance. Each interface is listed once, in discovery
    /// order.
    #[must_use]
    pub fn all_interfaces(&self) -> Vec<TypeRef> {
        let mut found: Vec<TypeRef> = Vec::new();
        self.collect_interfaces(&mut found);
        found
    }

    fn collect_interfaces(&self, found: &mut Vec<TypeRef>) {
        for iface in &self.interfaces {
            if !found.contains(iface) {
                found.push(iface.clone());
            }
            iface.collect_interfaces(found);
        }

        if let Some(base) = &self.base {
            base.collect_interfaces(found);
        }
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.namespace == other.namespace
            && self.name == other.name
            && self.generic_args == other.generic_args
            && self.element == other.element
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.namespace.hash(state);
        self.name.hash(state);
        self.generic_args.hash(state);
        self.element.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("fullname", &self.fullname())
            .field("kind", &self.kind)
            .field("generic_args", &self.generic_args)
            .finish_non_exhaustive()
    }
}

/// Short display form as used in member signatures, e.g. `List<Int32>`
impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.generic_args.is_empty() {
            f.write_str("<")?;
            for (index, arg) in self.generic_args.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}
