//! Built proxies and their call path.

use std::fmt;
use std::sync::Arc;

use crate::{
    generation::{Diagnostics, MixinData, ProxyGenerationOptions},
    interception::{
        CompletedCall, ExternalTarget, InterceptorChain, Invocation, InvocationTarget,
        ProxyTargetCell, SelectorCache,
    },
    model::{
        generic::GenericClosureCache,
        member::MemberRef,
        token::MemberToken,
        types::TypeRef,
        value::{ObjectRef, Value},
    },
    proxy::{DispatchEntry, DispatchTable, ProxyKind},
    Error, Result,
};

/// The immutable part of a built proxy, shared by every call
pub struct ProxyType {
    pub(crate) kind: ProxyKind,
    pub(crate) runtime_type: TypeRef,
    pub(crate) proxied_type: TypeRef,
    pub(crate) interceptors: InterceptorChain,
    pub(crate) dispatch: DispatchTable,
    pub(crate) mixin_data: Arc<MixinData>,
    pub(crate) options: Arc<ProxyGenerationOptions>,
    pub(crate) diagnostics: Arc<Diagnostics>,
}

impl ProxyType {
    /// The proxy flavor
    #[must_use]
    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    /// The synthesized runtime type of the proxy
    #[must_use]
    pub fn runtime_type(&self) -> &TypeRef {
        &self.runtime_type
    }

    /// The proxied class or interface
    #[must_use]
    pub fn proxied_type(&self) -> &TypeRef {
        &self.proxied_type
    }

    /// All interceptors of the proxy, before selection
    #[must_use]
    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    /// Per-member dispatch decisions
    #[must_use]
    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// The mixin mapping
    #[must_use]
    pub fn mixin_data(&self) -> &Arc<MixinData> {
        &self.mixin_data
    }

    /// The options the proxy was built with
    #[must_use]
    pub fn options(&self) -> &Arc<ProxyGenerationOptions> {
        &self.options
    }

    /// Non-fatal findings of the build
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }
}

impl fmt::Debug for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyType")
            .field("kind", &self.kind)
            .field("runtime_type", &self.runtime_type.fullname())
            .field("proxied_type", &self.proxied_type.fullname())
            .field("interceptors", &self.interceptors.len())
            .field("members", &self.dispatch.len())
            .field("mixins", &self.mixin_data.len())
            .finish()
    }
}

/// A proxy object.
///
/// Every call resolves the member's dispatch entry, narrows the interceptors through the
/// options' selector (once per member, cached for the lifetime of the instance), builds an
/// [`Invocation`] of the flavor matching the proxy kind and proceeds it.
pub struct ProxyInstance {
    proxy_type: Arc<ProxyType>,
    object: ObjectRef,
    target: ProxyTargetCell,
    selector_cache: SelectorCache,
    closure_cache: Option<Arc<GenericClosureCache>>,
}

impl ProxyInstance {
    pub(crate) fn new(
        proxy_type: Arc<ProxyType>,
        object: ObjectRef,
        target: ProxyTargetCell,
        closure_cache: Option<Arc<GenericClosureCache>>,
    ) -> Self {
        ProxyInstance {
            proxy_type,
            object,
            target,
            selector_cache: SelectorCache::new(),
            closure_cache,
        }
    }

    /// The proxy type
    #[must_use]
    pub fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.proxy_type
    }

    /// The proxy itself, as an object
    #[must_use]
    pub fn as_object(&self) -> &ObjectRef {
        &self.object
    }

    /// The synthesized runtime type of the proxy
    #[must_use]
    pub fn runtime_type(&self) -> &TypeRef {
        self.object.runtime_type()
    }

    /// The current target of the proxy. Always `None` for class proxies and proxies
    /// without target.
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the target cell is poisoned.
    pub fn target(&self) -> Result<Option<ObjectRef>> {
        let target = with_read!(self.target, |target: &Option<ObjectRef>| target.clone());
        Ok(target)
    }

    /// The mixin contributing `interface`
    #[must_use]
    pub fn mixin(&self, interface: &TypeRef) -> Option<&ObjectRef> {
        self.proxy_type.mixin_data.mixin_for(interface)
    }

    /// The interceptor chain calls of `token` go through, once selection ran for the member
    #[must_use]
    pub fn selected_interceptors(&self, token: MemberToken) -> Option<InterceptorChain> {
        self.selector_cache.get(token)
    }

    /// Calls the member `token` and returns its return value
    ///
    /// # Errors
    /// - [`Error::MemberNotFound`] if the proxy has no member `token`
    /// - [`Error::GenericArguments`] if the member is generic
    /// - the errors of [`Invocation::proceed`]
    pub fn invoke(&self, token: MemberToken, arguments: Vec<Value>) -> Result<Value> {
        self.call(token, arguments)
            .map(|completed| completed.return_value)
    }

    /// Calls the generic member `token` closed over `witnesses`
    ///
    /// # Errors
    /// Returns the errors of [`ProxyInstance::invoke`], and [`Error::GenericArity`] if the
    /// number of witnesses does not match the member.
    pub fn invoke_generic(
        &self,
        token: MemberToken,
        witnesses: Vec<TypeRef>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        self.dispatch(token, Some(witnesses), arguments)
            .map(|completed| completed.return_value)
    }

    /// Calls the member `token`, returning the return value and the final arguments so
    /// by-ref arguments can be copied back
    ///
    /// # Errors
    /// Returns the errors of [`ProxyInstance::invoke`].
    pub fn call(&self, token: MemberToken, arguments: Vec<Value>) -> Result<CompletedCall> {
        self.dispatch(token, None, arguments)
    }

    fn dispatch(
        &self,
        token: MemberToken,
        witnesses: Option<Vec<TypeRef>>,
        arguments: Vec<Value>,
    ) -> Result<CompletedCall> {
        let entry = self
            .proxy_type
            .dispatch
            .get(token)
            .ok_or(Error::MemberNotFound(token))?;

        if entry.member.is_generic() && witnesses.is_none() {
            return Err(Error::GenericArguments(format!(
                "Method '{}' is generic, call it with generic arguments",
                entry.member
            )));
        }

        let mut builder = Invocation::builder(self.object.clone(), entry.member.clone())
            .arguments(arguments)
            .interceptors(self.interceptors_for(entry))
            .target(self.invocation_target(entry)?);

        if let Some(witnesses) = witnesses {
            builder = builder.generic_arguments(witnesses);
        }

        if let Some(cache) = &self.closure_cache {
            builder = builder.closure_cache(cache.clone());
        }

        let mut invocation = builder.build()?;
        invocation.proceed()?;
        Ok(invocation.into_completed())
    }

    fn interceptors_for(&self, entry: &DispatchEntry) -> InterceptorChain {
        if !entry.intercepted {
            return Arc::from(Vec::new());
        }

        let proxy_type = &self.proxy_type;
        match proxy_type.options.selector() {
            Some(selector) => self.selector_cache.get_or_select(
                selector.as_ref(),
                &proxy_type.proxied_type,
                &entry.member,
                &proxy_type.interceptors,
            ),
            None => proxy_type.interceptors.clone(),
        }
    }

    fn invocation_target(&self, entry: &DispatchEntry) -> Result<InvocationTarget> {
        let implementation = entry.implementation.clone();

        if let Some(position) = entry.mixin_position {
            let mixin = self.proxy_type.mixin_data.mixin_at(position).cloned();
            return Ok(match implementation {
                Some(method) => InvocationTarget::External(ExternalTarget::new(mixin, method)),
                None => InvocationTarget::Missing,
            });
        }

        let kind = self.proxy_type.kind;
        let target = match (kind, implementation) {
            (ProxyKind::Class, implementation) => InvocationTarget::SelfDelegating(implementation),
            (ProxyKind::InterfaceWithoutTarget, _) | (_, None) => InvocationTarget::Missing,
            (_, Some(method)) => {
                let external = ExternalTarget::new(self.target()?, method);
                if kind.allows_retargeting() {
                    InvocationTarget::External(external.with_retargeting(self.target.clone()))
                } else {
                    InvocationTarget::External(external)
                }
            }
        };

        Ok(target)
    }

    /// The members of the proxy
    pub fn members(&self) -> impl Iterator<Item = &MemberRef> {
        self.proxy_type.dispatch.iter().map(|entry| &entry.member)
    }
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("proxy_type", &self.proxy_type)
            .field("selected", &self.selector_cache.len())
            .finish_non_exhaustive()
    }
}
