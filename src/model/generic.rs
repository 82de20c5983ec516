//! Generic-argument rebinding.
//!
//! An open generic member such as `T Wrap<T>(T item)` has no concrete parameter or return
//! types until a call supplies its witnesses. [`close_method`] substitutes the witnesses (and
//! the generic arguments of a closed declaring type) into every signature of the member and
//! yields a [`ConcreteMethod`].
//!
//! Closing is a pure function of `(member, witnesses)`. Invocations close their member afresh
//! on every call; hosts that want to memoize closures inject a [`GenericClosureCache`], which
//! is keyed by the member token and the witness list and never shared implicitly.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    model::{
        member::{MemberRef, MethodMember},
        signature::TypeSig,
        token::MemberToken,
        types::{TypeInfo, TypeRef},
    },
    Error::{GenericArity, RecursionLimit},
    Result,
};

/// Maximum nesting depth of a signature that is closed
const MAX_RECURSION_DEPTH: usize = 64;

/// A member closed over the generic witnesses of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteMethod {
    /// The (possibly open) member definition
    pub definition: MemberRef,
    /// The witnesses the definition was closed with, empty for non-generic members
    pub generic_arguments: Vec<TypeRef>,
    /// Concrete parameter types
    pub parameter_types: Vec<TypeRef>,
    /// Concrete return type
    pub return_type: TypeRef,
}

impl ConcreteMethod {
    /// Returns true if this closure was built from the given witnesses
    #[must_use]
    pub fn is_closed_over(&self, witnesses: &[TypeRef]) -> bool {
        self.generic_arguments == witnesses
    }
}

/// Closes `member` over `witnesses`.
///
/// Method level generic parameters are replaced by the witnesses, type level parameters by
/// the generic arguments of the member's declaring type.
///
/// # Errors
/// - [`crate::Error::GenericArity`] if the number of witnesses does not match
/// - [`crate::Error::RecursionLimit`] for pathologically nested signatures
pub fn close_method(member: &MemberRef, witnesses: &[TypeRef]) -> Result<ConcreteMethod> {
    if member.generic_params.len() != witnesses.len() {
        return Err(GenericArity {
            member: member.to_string(),
            expected: member.generic_params.len(),
            found: witnesses.len(),
        });
    }

    let binder = Binder { member, witnesses };
    let parameter_types = member
        .parameters
        .iter()
        .map(|parameter| binder.resolve(&parameter.sig, 0))
        .collect::<Result<Vec<_>>>()?;
    let return_type = binder.resolve(&member.return_type, 0)?;

    Ok(ConcreteMethod {
        definition: member.clone(),
        generic_arguments: witnesses.to_vec(),
        parameter_types,
        return_type,
    })
}

struct Binder<'a> {
    member: &'a MethodMember,
    witnesses: &'a [TypeRef],
}

impl Binder<'_> {
    fn resolve(&self, sig: &TypeSig, depth: usize) -> Result<TypeRef> {
        if depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        match sig {
            TypeSig::Type(ty) => Ok(ty.clone()),
            TypeSig::MethodParam(index) => {
                self.witnesses
                    .get(*index as usize)
                    .cloned()
                    .ok_or_else(|| GenericArity {
                        member: self.member.to_string(),
                        expected: *index as usize + 1,
                        found: self.witnesses.len(),
                    })
            }
            TypeSig::TypeParam(index) => Ok(self
                .member
                .declaring_type
                .generic_args
                .get(*index as usize)
                .cloned()
                // The declaring type itself is still open, keep the parameter unbound
                .unwrap_or_else(|| TypeInfo::generic_parameter(format!("!{index}"), *index))),
            TypeSig::GenericInst(definition, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.resolve(arg, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(TypeInfo::instantiate(definition, args))
            }
            TypeSig::ByRef(inner) => Ok(TypeInfo::by_ref(&self.resolve(inner, depth + 1)?)),
            TypeSig::SzArray(inner) => Ok(TypeInfo::array_of(&self.resolve(inner, depth + 1)?)),
        }
    }
}

/// Thread-safe cache of closed members, keyed by `(member token, witnesses)`.
///
/// Owned by the host and handed to invocations explicitly; there is no process-wide
/// instance.
#[derive(Default)]
pub struct GenericClosureCache {
    entries: DashMap<(MemberToken, Vec<TypeRef>), Arc<ConcreteMethod>>,
}

impl GenericClosureCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the closure of `member` over `witnesses`, computing it on first use
    ///
    /// # Errors
    /// Returns the errors of [`close_method`].
    pub fn get_or_close(
        &self,
        member: &MemberRef,
        witnesses: &[TypeRef],
    ) -> Result<Arc<ConcreteMethod>> {
        let key = (member.token, witnesses.to_vec());
        if let Some(existing) = self.entries.get(&key) {
            return Ok(existing.clone());
        }

        let closed = Arc::new(close_method(member, witnesses)?);
        Ok(self.entries.entry(key).or_insert(closed).clone())
    }

    /// Number of cached closures
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been cached yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached closure
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::PrimitiveKind;
    use crate::test::{int32, string, wrap_member};

    #[test]
    fn closes_method_parameters() {
        let wrap = wrap_member();
        let closed = close_method(&wrap, &[int32()]).unwrap();
        assert_eq!(closed.parameter_types, vec![int32()]);
        assert_eq!(closed.return_type.to_string(), "Int32[]");
        assert!(closed.is_closed_over(&[int32()]));

        let closed = close_method(&wrap, &[string()]).unwrap();
        assert_eq!(closed.parameter_types, vec![string()]);
        assert_eq!(closed.return_type.to_string(), "String[]");
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let wrap = wrap_member();
        match close_method(&wrap, &[]) {
            Err(GenericArity {
                expected, found, ..
            }) => {
                assert_eq!(expected, 1);
                assert_eq!(found, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn type_params_come_from_declaring_type() {
        let repository = TypeInfo::interface("Acme", "IRepository`1").into_ref();
        let closed_repository = TypeInfo::instantiate(&repository, vec![string()]);
        let member = MethodMember::new(MemberToken::method(40), closed_repository, "Find")
            .returns(TypeSig::TypeParam(0))
            .parameter("id", TypeSig::primitive(PrimitiveKind::Int32))
            .into_ref();

        let closed = close_method(&member, &[]).unwrap();
        assert_eq!(closed.return_type, string());
    }

    #[test]
    fn nested_generic_instances() {
        let list = TypeInfo::class("System.Collections.Generic", "List`1").into_ref();
        let member = MethodMember::new(MemberToken::method(41), list.clone(), "ToList")
            .generic_param("T")
            .returns(TypeSig::GenericInst(list.clone(), vec![TypeSig::MethodParam(0)]))
            .into_ref();

        let closed = close_method(&member, &[int32()]).unwrap();
        assert_eq!(closed.return_type, TypeInfo::instantiate(&list, vec![int32()]));
    }

    #[test]
    fn cache_is_keyed_by_witnesses() {
        let cache = GenericClosureCache::new();
        let wrap = wrap_member();

        let first = cache.get_or_close(&wrap, &[int32()]).unwrap();
        let again = cache.get_or_close(&wrap, &[int32()]).unwrap();
        let other = cache.get_or_close(&wrap, &[string()]).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
