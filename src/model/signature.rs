//! Type signatures of member parameters and return values.
//!
//! Unlike a [`TypeRef`], a [`TypeSig`] may still refer to generic parameters of the declaring
//! type ([`TypeSig::TypeParam`]) or of the method itself ([`TypeSig::MethodParam`]). Such
//! signatures are closed by [`crate::model::generic::close_method`] once the witnesses of a
//! concrete call are known.

use std::fmt;

use crate::model::types::{PrimitiveKind, TypeInfo, TypeRef};

/// Represents a type in a member signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    /// A fully known type
    Type(TypeRef),
    /// Generic parameter of the declaring type, by position
    TypeParam(u32),
    /// Generic parameter of the method, by position
    MethodParam(u32),
    /// Generic type definition and its (possibly open) arguments
    GenericInst(TypeRef, Vec<TypeSig>),
    /// Type by reference
    ByRef(Box<TypeSig>),
    /// Single dimension array
    SzArray(Box<TypeSig>),
}

impl TypeSig {
    /// `System.Void`
    #[must_use]
    pub fn void() -> Self {
        TypeSig::Type(TypeInfo::primitive(PrimitiveKind::Void))
    }

    /// Signature of a primitive type
    #[must_use]
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeSig::Type(TypeInfo::primitive(kind))
    }

    /// True if the signature refers to a generic parameter anywhere
    #[must_use]
    pub fn is_open(&self) -> bool {
        match self {
            TypeSig::Type(ty) => ty.is_open(),
            TypeSig::TypeParam(_) | TypeSig::MethodParam(_) => true,
            TypeSig::GenericInst(_, args) => args.iter().any(TypeSig::is_open),
            TypeSig::ByRef(inner) | TypeSig::SzArray(inner) => inner.is_open(),
        }
    }

    /// True for by-reference signatures
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        matches!(self, TypeSig::ByRef(_))
    }
}

impl From<TypeRef> for TypeSig {
    fn from(ty: TypeRef) -> Self {
        TypeSig::Type(ty)
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Type(ty) => write!(f, "{ty}"),
            TypeSig::TypeParam(index) => write!(f, "!{index}"),
            TypeSig::MethodParam(index) => write!(f, "!!{index}"),
            TypeSig::GenericInst(definition, args) => {
                write!(f, "{}<", definition.name)?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            TypeSig::ByRef(inner) => write!(f, "{inner}&"),
            TypeSig::SzArray(inner) => write!(f, "{inner}[]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_signatures() {
        assert!(!TypeSig::primitive(PrimitiveKind::Int32).is_open());
        assert!(TypeSig::MethodParam(0).is_open());
        assert!(TypeSig::SzArray(Box::new(TypeSig::TypeParam(1))).is_open());

        let list = TypeInfo::class("System.Collections.Generic", "List`1").into_ref();
        let closed = TypeSig::GenericInst(
            list.clone(),
            vec![TypeSig::primitive(PrimitiveKind::String)],
        );
        let open = TypeSig::GenericInst(list, vec![TypeSig::MethodParam(0)]);
        assert!(!closed.is_open());
        assert!(open.is_open());
    }

    #[test]
    fn display() {
        let list = TypeInfo::class("System.Collections.Generic", "List`1").into_ref();
        let sig = TypeSig::ByRef(Box::new(TypeSig::GenericInst(
            list,
            vec![TypeSig::MethodParam(0)],
        )));
        assert_eq!(sig.to_string(), "List`1<!!0>&");
        assert!(sig.is_by_ref());
        assert_eq!(TypeSig::void().to_string(), "Void");
    }
}
