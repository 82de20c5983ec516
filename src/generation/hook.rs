use std::any::TypeId;

use crate::model::{
    member::MethodMember,
    types::{TypeRef, SYSTEM_NAMESPACE},
};

/// Decides which members of a proxied type get intercepted.
///
/// The hook is consulted once per member while a proxy is built, never at call time.
/// Members the hook declines dispatch straight to their implementation.
pub trait ProxyGenerationHook: Send + Sync + 'static {
    /// Returns true if calls to `member` should go through the interceptor chain
    fn should_intercept_method(&self, proxied_type: &TypeRef, member: &MethodMember) -> bool;

    /// Called for every member that cannot be overridden by the proxy (static, final,
    /// non-virtual or private members)
    fn non_proxyable_member_notification(&self, proxied_type: &TypeRef, member: &MethodMember);

    /// Called once after all members of the proxied type were inspected
    fn methods_inspected(&self);

    /// Identity of the hook's type, used by generation options equality. Two hooks of the
    /// same type are considered equivalent.
    fn type_key(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

/// The default hook: intercepts every proxyable member except the ones declared by
/// `System.Object`.
///
/// Non-proxyable members are logged as warnings; the
/// [`ProxyBuilder`](crate::proxy::ProxyBuilder) records them into the proxy's [`Diagnostics`].
///
/// [`Diagnostics`]: crate::generation::Diagnostics
#[derive(Debug, Default, Clone, Copy)]
pub struct AllMethodsHook;

impl AllMethodsHook {
    /// Creates the hook
    #[must_use]
    pub fn new() -> Self {
        AllMethodsHook
    }

    fn is_skipped(member: &MethodMember) -> bool {
        let declaring = &member.declaring_type;
        declaring.namespace == SYSTEM_NAMESPACE && declaring.name == "Object"
    }
}

impl ProxyGenerationHook for AllMethodsHook {
    fn should_intercept_method(&self, _proxied_type: &TypeRef, member: &MethodMember) -> bool {
        !Self::is_skipped(member)
    }

    fn non_proxyable_member_notification(&self, proxied_type: &TypeRef, member: &MethodMember) {
        tracing::warn!(
            member = %member,
            proxied_type = %proxied_type.fullname(),
            "member cannot be proxied and will not be intercepted"
        );
    }

    fn methods_inspected(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        model::{
            token::MemberToken,
            types::{PrimitiveKind, TypeInfo},
        },
        test::{simple_class, sum_member},
    };

    struct Other;

    impl ProxyGenerationHook for Other {
        fn should_intercept_method(&self, _: &TypeRef, _: &MethodMember) -> bool {
            false
        }

        fn non_proxyable_member_notification(&self, _: &TypeRef, _: &MethodMember) {}

        fn methods_inspected(&self) {}
    }

    #[test]
    fn intercepts_everything_but_object_members() {
        let hook = AllMethodsHook::new();
        let object = TypeInfo::primitive(PrimitiveKind::Object);
        let to_string = MethodMember::new(MemberToken::method(90), object, "ToString");

        assert!(hook.should_intercept_method(&simple_class(), &sum_member()));
        assert!(!hook.should_intercept_method(&simple_class(), &to_string));
    }

    #[test]
    fn type_key_is_per_hook_type() {
        let first: Arc<dyn ProxyGenerationHook> = Arc::new(AllMethodsHook::new());
        let second: Arc<dyn ProxyGenerationHook> = Arc::new(AllMethodsHook::new());
        let other: Arc<dyn ProxyGenerationHook> = Arc::new(Other);

        assert_eq!(first.type_key(), second.type_key());
        assert_ne!(first.type_key(), other.type_key());
    }
}
