//! Proxied member descriptors.
//!
//! A [`MethodMember`] is what the member catalog produces for every member a proxy type
//! exposes: its stable [`MemberToken`], declaring type, signature, generic parameters and the
//! modifiers deciding whether the member can be intercepted at all.

use std::fmt::{self, Write};
use std::sync::Arc;

use bitflags::bitflags;

use crate::model::{signature::TypeSig, token::MemberToken, types::TypeRef};

/// Reference to a `MethodMember`
pub type MemberRef = Arc<MethodMember>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Member modifiers and properties
    pub struct MemberModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Member cannot be overridden
        const FINAL = 0x0020;
        /// Member is virtual
        const VIRTUAL = 0x0040;
        /// Member does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Member is special (property or event accessor)
        const SPECIAL_NAME = 0x0800;
    }
}

/// Accessibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberAccess {
    /// Accessible only by the declaring type
    Private,
    /// Accessible within the declaring assembly
    Assembly,
    /// Accessible by the type and its sub-types
    Family,
    /// Accessible by anyone
    Public,
}

/// A single parameter of a member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter type, `TypeSig::ByRef` for ref/out parameters
    pub sig: TypeSig,
}

impl Parameter {
    /// True for ref/out parameters
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        self.sig.is_by_ref()
    }
}

/// Descriptor of a proxied method (or property/event accessor).
#[derive(Debug, Clone)]
pub struct MethodMember {
    /// Stable identity of the member
    pub token: MemberToken,
    /// The type declaring the member
    pub declaring_type: TypeRef,
    /// Member name
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    /// Return type
    pub return_type: TypeSig,
    /// Names of the method level generic parameters, empty for non-generic members
    pub generic_params: Vec<String>,
    /// Modifiers
    pub modifiers: MemberModifiers,
    /// Accessibility
    pub access: MemberAccess,
}

impl MethodMember {
    /// Create a new public, virtual, non-generic `void` member without parameters
    pub fn new(token: MemberToken, declaring_type: TypeRef, name: impl Into<String>) -> Self {
        MethodMember {
            token,
            declaring_type,
            name: name.into(),
            parameters: Vec::new(),
            return_type: TypeSig::void(),
            generic_params: Vec::new(),
            modifiers: MemberModifiers::VIRTUAL,
            access: MemberAccess::Public,
        }
    }

    /// Sets the return type
    #[must_use]
    pub fn returns(mut self, sig: impl Into<TypeSig>) -> Self {
        self.return_type = sig.into();
        self
    }

    /// Appends a parameter
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, sig: impl Into<TypeSig>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            sig: sig.into(),
        });
        self
    }

    /// Appends a method level generic parameter
    #[must_use]
    pub fn generic_param(mut self, name: impl Into<String>) -> Self {
        self.generic_params.push(name.into());
        self
    }

    /// Replaces the modifiers
    #[must_use]
    pub fn modifiers(mut self, modifiers: MemberModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Sets the accessibility
    #[must_use]
    pub fn access(mut self, access: MemberAccess) -> Self {
        self.access = access;
        self
    }

    /// Wraps the member into a shared [`MemberRef`]
    #[must_use]
    pub fn into_ref(self) -> MemberRef {
        Arc::new(self)
    }

    /// True if the member declares method level generic parameters
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// True if the member has no implementation of its own
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(MemberModifiers::ABSTRACT) || self.declaring_type.is_interface()
    }

    /// True if a proxy can override this member.
    ///
    /// Interface members always are, class members must be virtual, not final, not static
    /// and visible to a derived type.
    #[must_use]
    pub fn is_proxyable(&self) -> bool {
        if self.modifiers.contains(MemberModifiers::STATIC) {
            return false;
        }

        if self.declaring_type.is_interface() {
            return true;
        }

        self.modifiers.contains(MemberModifiers::VIRTUAL)
            && !self.modifiers.contains(MemberModifiers::FINAL)
            && self.access != MemberAccess::Private
    }

    fn write_sig(&self, f: &mut impl Write, sig: &TypeSig) -> fmt::Result {
        match sig {
            TypeSig::MethodParam(index) => match self.generic_params.get(*index as usize) {
                Some(name) => f.write_str(name),
                None => write!(f, "!!{index}"),
            },
            TypeSig::TypeParam(index) => {
                match self.declaring_type.generic_args.get(*index as usize) {
                    Some(arg) => write!(f, "{arg}"),
                    None => write!(f, "!{index}"),
                }
            }
            TypeSig::GenericInst(definition, args) => {
                write!(f, "{}<", definition.name)?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    self.write_sig(f, arg)?;
                }
                f.write_str(">")
            }
            TypeSig::ByRef(inner) => {
                self.write_sig(f, inner)?;
                f.write_str("&")
            }
            TypeSig::SzArray(inner) => {
                self.write_sig(f, inner)?;
                f.write_str("[]")
            }
            TypeSig::Type(ty) => write!(f, "{ty}"),
        }
    }
}

/// Members are identified by token and declaring type
impl PartialEq for MethodMember {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token && self.declaring_type == other.declaring_type
    }
}

impl Eq for MethodMember {}

impl std::hash::Hash for MethodMember {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.token.hash(state);
        self.declaring_type.hash(state);
    }
}

/// Display form used in diagnostics, e.g. `Int32 ICalc.Sum(Int32, Int32)`
impl fmt::Display for MethodMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_sig(&mut out, &self.return_type)?;
        write!(out, " {}.{}", self.declaring_type, self.name)?;

        if self.is_generic() {
            write!(out, "<{}>", self.generic_params.join(", "))?;
        }

        out.push('(');
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            self.write_sig(&mut out, &parameter.sig)?;
        }
        out.push(')');

        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{PrimitiveKind, TypeInfo};

    fn calc() -> TypeRef {
        TypeInfo::interface("Acme", "ICalc").into_ref()
    }

    #[test]
    fn display_simple_member() {
        let member = MethodMember::new(MemberToken::method(1), calc(), "Sum")
            .returns(TypeSig::primitive(PrimitiveKind::Int32))
            .parameter("a", TypeSig::primitive(PrimitiveKind::Int32))
            .parameter("b", TypeSig::primitive(PrimitiveKind::Int32));
        assert_eq!(member.to_string(), "Int32 ICalc.Sum(Int32, Int32)");
        assert!(!member.is_generic());
    }

    #[test]
    fn display_generic_member_uses_parameter_names() {
        let member = MethodMember::new(MemberToken::method(2), calc(), "Wrap")
            .generic_param("T")
            .returns(TypeSig::SzArray(Box::new(TypeSig::MethodParam(0))))
            .parameter("item", TypeSig::MethodParam(0));
        assert_eq!(member.to_string(), "T[] ICalc.Wrap<T>(T)");
        assert!(member.is_generic());
    }

    #[test]
    fn proxyable_members() {
        let class = TypeInfo::class("Acme", "Service").into_ref();
        let virtual_member = MethodMember::new(MemberToken::method(3), class.clone(), "Run");
        let sealed_member = MethodMember::new(MemberToken::method(4), class.clone(), "Stop")
            .modifiers(MemberModifiers::VIRTUAL | MemberModifiers::FINAL);
        let plain_member = MethodMember::new(MemberToken::method(5), class.clone(), "Pause")
            .modifiers(MemberModifiers::empty());
        let private_member =
            MethodMember::new(MemberToken::method(6), class, "Reset").access(MemberAccess::Private);
        let interface_member = MethodMember::new(MemberToken::method(7), calc(), "Clear")
            .modifiers(MemberModifiers::empty());

        assert!(virtual_member.is_proxyable());
        assert!(!sealed_member.is_proxyable());
        assert!(!plain_member.is_proxyable());
        assert!(!private_member.is_proxyable());
        assert!(interface_member.is_proxyable());
        assert!(interface_member.is_abstract());
        assert!(!virtual_member.is_abstract());
    }

    #[test]
    fn by_ref_parameters() {
        let member = MethodMember::new(MemberToken::method(8), calc(), "TryGet").parameter(
            "value",
            TypeSig::ByRef(Box::new(TypeSig::primitive(PrimitiveKind::Int32))),
        );
        assert!(member.parameters[0].is_by_ref());
        assert_eq!(member.to_string(), "Void ICalc.TryGet(Int32&)");
    }
}
