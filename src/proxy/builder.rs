//! Proxy assembly and eager validation.
//!
//! [`ProxyBuilder`] plays the role of the proxy type generator: it takes the proxied type, the
//! members handed over by the member catalog together with their real implementations, the
//! interceptors and the [`ProxyGenerationOptions`], and decides once per member how calls are
//! dispatched. Every configuration problem is reported by [`ProxyBuilder::build`], before the
//! first call is made.
//!
//! # Example
//!
//! ```rust
//! use dynproxy::prelude::*;
//!
//! let calc = TypeInfo::interface("Acme", "ICalc").into_ref();
//! let calc_impl = TypeInfo::class("Acme", "Calc")
//!     .with_interfaces([calc.clone()])
//!     .into_ref();
//! let sum = MethodMember::new(MemberToken::method(1), calc.clone(), "Sum")
//!     .returns(TypeSig::primitive(PrimitiveKind::Int32))
//!     .parameter("a", TypeSig::primitive(PrimitiveKind::Int32))
//!     .parameter("b", TypeSig::primitive(PrimitiveKind::Int32))
//!     .into_ref();
//!
//! let proxy = ProxyBuilder::interface_proxy_with_target(calc, ObjectRef::new(calc_impl, ()))
//!     .member(
//!         sum,
//!         target_method(|_, invocation| {
//!             let a = invocation.get_argument(0)?.as_i4().unwrap_or_default();
//!             let b = invocation.get_argument(1)?.as_i4().unwrap_or_default();
//!             Ok(Value::I4(a + b))
//!         }),
//!     )
//!     .build()?;
//!
//! let sum = proxy.invoke(MemberToken::method(1), vec![Value::I4(2), Value::I4(3)])?;
//! assert_eq!(sum, Value::I4(5));
//! # Ok::<(), dynproxy::Error>(())
//! ```

use std::any::Any;
use std::sync::{Arc, RwLock};

use crate::{
    generation::{
        Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics, MixinData,
        ProxyGenerationOptions,
    },
    interception::{InterceptorRef, TargetMethod},
    model::{
        generic::GenericClosureCache,
        member::MemberRef,
        types::{PrimitiveKind, TypeFlags, TypeInfo, TypeKind, TypeRef},
        value::ObjectRef,
    },
    proxy::{DispatchEntry, DispatchTable, ProxyInstance, ProxyKind, ProxyType},
    Error, Result,
};

/// Namespace of synthesized proxy types
pub const PROXY_NAMESPACE: &str = "DynProxy.Proxies";

/// Assembles a [`ProxyInstance`].
pub struct ProxyBuilder {
    kind: ProxyKind,
    proxied_type: TypeRef,
    target: Option<ObjectRef>,
    interceptors: Vec<InterceptorRef>,
    options: ProxyGenerationOptions,
    members: Vec<(MemberRef, Option<TargetMethod>)>,
    state: Arc<dyn Any + Send + Sync>,
    closure_cache: Option<Arc<GenericClosureCache>>,
    diagnostics: Arc<Diagnostics>,
}

impl ProxyBuilder {
    fn new(kind: ProxyKind, proxied_type: TypeRef, target: Option<ObjectRef>) -> Self {
        ProxyBuilder {
            kind,
            proxied_type,
            target,
            interceptors: Vec::new(),
            options: ProxyGenerationOptions::default(),
            members: Vec::new(),
            state: Arc::new(()),
            closure_cache: None,
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }

    /// A proxy deriving from `class`; members proceed to their base implementation
    #[must_use]
    pub fn class_proxy(class: TypeRef) -> Self {
        Self::new(ProxyKind::Class, class, None)
    }

    /// A proxy implementing `interface` and forwarding to `target`
    #[must_use]
    pub fn interface_proxy_with_target(interface: TypeRef, target: ObjectRef) -> Self {
        Self::new(ProxyKind::InterfaceWithTarget, interface, Some(target))
    }

    /// Like [`ProxyBuilder::interface_proxy_with_target`], but interceptors may replace the
    /// target of an invocation or of the whole proxy
    #[must_use]
    pub fn interface_proxy_with_target_interface(interface: TypeRef, target: ObjectRef) -> Self {
        Self::new(ProxyKind::InterfaceWithTargetInterface, interface, Some(target))
    }

    /// A proxy implementing `interface` without any target
    #[must_use]
    pub fn interface_proxy_without_target(interface: TypeRef) -> Self {
        Self::new(ProxyKind::InterfaceWithoutTarget, interface, None)
    }

    /// Appends an interceptor
    #[must_use]
    pub fn interceptor(mut self, interceptor: InterceptorRef) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Appends interceptors, in the order they are consulted
    #[must_use]
    pub fn interceptors(mut self, interceptors: impl IntoIterator<Item = InterceptorRef>) -> Self {
        self.interceptors.extend(interceptors);
        self
    }

    /// Replaces the generation options
    #[must_use]
    pub fn options(mut self, options: ProxyGenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a member together with its real implementation: the base member for class
    /// proxies, the target member for interface proxies, the mixin member for members of
    /// mixed-in interfaces
    #[must_use]
    pub fn member(mut self, member: MemberRef, implementation: TargetMethod) -> Self {
        self.members.push((member, Some(implementation)));
        self
    }

    /// Adds a member without implementation, e.g. an abstract class member or a member of a
    /// proxy without target
    #[must_use]
    pub fn abstract_member(mut self, member: MemberRef) -> Self {
        self.members.push((member, None));
        self
    }

    /// The state of the proxy object, passed as the target to base implementations of
    /// class proxies
    #[must_use]
    pub fn state<T: Any + Send + Sync>(mut self, state: T) -> Self {
        self.state = Arc::new(state);
        self
    }

    /// A cache for closed generic members shared by the proxy's invocations
    #[must_use]
    pub fn closure_cache(mut self, cache: Arc<GenericClosureCache>) -> Self {
        self.closure_cache = Some(cache);
        self
    }

    /// Diagnostics container for non-fatal findings of the build
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Validates the configuration, decides the dispatch of every member and creates the
    /// proxy.
    ///
    /// # Errors
    /// - [`Error::InvalidMixinConfiguration`] if two mixins contribute the same interface
    /// - [`Error::MissingSerializationConstructor`] for serializable bases without one
    /// - [`Error::Configuration`] for sealed or mismatched proxied types, targets not
    ///   implementing the interface, and members not belonging to the proxy
    pub fn build(self) -> Result<ProxyInstance> {
        self.options.initialize()?;
        let mixin_data = self.options.mixin_data()?;

        self.validate_proxied_type()?;
        self.validate_mixins(&mixin_data)?;

        let dispatch = self.dispatch_table(&mixin_data)?;
        self.options.hook().methods_inspected();

        let runtime_type = self.runtime_type(&mixin_data);
        tracing::debug!(
            proxy_type = %runtime_type.fullname(),
            kind = %self.kind,
            members = dispatch.len(),
            intercepted = dispatch.intercepted_count(),
            "proxy built"
        );

        let proxy_type = Arc::new(ProxyType {
            kind: self.kind,
            runtime_type: runtime_type.clone(),
            proxied_type: self.proxied_type,
            interceptors: Arc::from(self.interceptors),
            dispatch,
            mixin_data,
            options: Arc::new(self.options),
            diagnostics: self.diagnostics,
        });

        Ok(ProxyInstance::new(
            proxy_type,
            ObjectRef::from_arc(runtime_type, self.state),
            Arc::new(RwLock::new(self.target)),
            self.closure_cache,
        ))
    }

    fn validate_proxied_type(&self) -> Result<()> {
        let proxied = &self.proxied_type;

        if self.kind == ProxyKind::Class {
            if proxied.kind != TypeKind::Class {
                return Err(config_error!(
                    "Type '{}' is not a class, only classes can be proxied by a class proxy",
                    proxied.fullname()
                ));
            }

            if proxied.is_sealed() {
                return Err(config_error!(
                    "Can not create a proxy for type '{}' because it is sealed",
                    proxied.fullname()
                ));
            }

            if proxied.flags.contains(TypeFlags::SERIALIZABLE)
                && !proxied.flags.contains(TypeFlags::SERIALIZATION_CTOR)
            {
                return Err(Error::MissingSerializationConstructor(proxied.fullname()));
            }

            return Ok(());
        }

        if !proxied.is_interface() {
            return Err(config_error!(
                "Type '{}' is not an interface, interface proxies require one",
                proxied.fullname()
            ));
        }

        let base = self.options.base_type_for_interface_proxy();
        let object_base = base.kind == TypeKind::Primitive(PrimitiveKind::Object);
        if !object_base && (base.kind != TypeKind::Class || base.is_sealed()) {
            return Err(config_error!(
                "Base type for interface proxies '{}' must be a non-sealed class",
                base.fullname()
            ));
        }

        if self.kind.has_target() {
            let target = self.target.as_ref().ok_or(Error::NullArgument("target"))?;
            if !target.is_instance_of(proxied) {
                return Err(config_error!(
                    "Target type '{}' does not implement interface '{}'",
                    target.runtime_type().fullname(),
                    proxied.fullname()
                ));
            }
        }

        Ok(())
    }

    fn validate_mixins(&self, mixin_data: &MixinData) -> Result<()> {
        for interface in mixin_data.mixin_interfaces() {
            if self.proxied_type.implements(interface) {
                return Err(config_error!(
                    "Mixin interface '{}' is already implemented by the proxied type '{}'",
                    interface.fullname(),
                    self.proxied_type.fullname()
                ));
            }
        }

        if self.options.has_mixins() && mixin_data.is_empty() {
            self.diagnostics.info(
                DiagnosticCategory::Mixin,
                "Registered mixins contribute no interface and are ignored",
            );
        }

        Ok(())
    }

    fn dispatch_table(&self, mixin_data: &MixinData) -> Result<DispatchTable> {
        let hook = self.options.hook();
        let mut table = DispatchTable::new();

        for (member, implementation) in &self.members {
            if table.get(member.token).is_some() {
                return Err(config_error!("Member '{}' is registered twice", member));
            }

            if let Some(position) = mixin_data.mixin_position(&member.declaring_type) {
                if implementation.is_none() {
                    return Err(config_error!(
                        "Mixin member '{}' has no implementation",
                        member
                    ));
                }

                table.insert(DispatchEntry {
                    member: member.clone(),
                    implementation: implementation.clone(),
                    intercepted: false,
                    mixin_position: Some(position),
                });
                continue;
            }

            if !self.proxied_type.implements(&member.declaring_type) {
                return Err(config_error!(
                    "Member '{}' does not belong to proxied type '{}'",
                    member,
                    self.proxied_type.fullname()
                ));
            }

            if self.kind.has_target() && implementation.is_none() {
                return Err(config_error!(
                    "Member '{}' has no implementation on the target",
                    member
                ));
            }

            let intercepted = if member.is_proxyable() {
                let intercepted = hook.should_intercept_method(&self.proxied_type, member);
                if !intercepted {
                    self.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticSeverity::Info,
                            DiagnosticCategory::Hook,
                            format!("'{member}' was declined by the generation hook"),
                        )
                        .with_token(member.token)
                        .with_type(self.proxied_type.fullname()),
                    );
                }
                intercepted
            } else {
                hook.non_proxyable_member_notification(&self.proxied_type, member);
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::Member,
                        format!("'{member}' cannot be proxied and will not be intercepted"),
                    )
                    .with_token(member.token)
                    .with_type(self.proxied_type.fullname()),
                );
                false
            };

            table.insert(DispatchEntry {
                member: member.clone(),
                implementation: implementation.clone(),
                intercepted,
                mixin_position: None,
            });
        }

        Ok(table)
    }

    fn runtime_type(&self, mixin_data: &MixinData) -> TypeRef {
        let (base, mut interfaces) = if self.kind == ProxyKind::Class {
            (self.proxied_type.clone(), Vec::new())
        } else {
            (
                self.options.base_type_for_interface_proxy().clone(),
                vec![self.proxied_type.clone()],
            )
        };
        interfaces.extend(mixin_data.mixin_interfaces().cloned());

        TypeInfo::class(PROXY_NAMESPACE, format!("{}Proxy", self.proxied_type.name))
            .with_base(base)
            .with_interfaces(interfaces)
            .into_ref()
    }
}
