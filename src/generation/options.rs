//! Proxy generation options.
//!
//! [`ProxyGenerationOptions`] carries everything that shapes a proxy type besides the proxied
//! type and the interceptors: the generation hook, the interceptor selector, mixins, the base
//! class of interface proxies and additional attributes to put on the proxy type.
//!
//! Options are compared and hashed so a host can cache proxy types per `(type, options)`.
//! Equality looks at the hook's type (not its instance), at whether a selector is present
//! (not which one), at the base type, at the additional attributes and at the mixin data.
//!
//! # Example
//!
//! ```rust
//! use dynproxy::prelude::*;
//!
//! let logger = TypeInfo::class("Acme", "Logger")
//!     .with_interfaces([TypeInfo::interface("Acme", "ILogger").into_ref()])
//!     .into_ref();
//!
//! let mut options = ProxyGenerationOptions::default();
//! options.add_mixin_instance(ObjectRef::new(logger, ()))?;
//! options.initialize()?;
//! assert_eq!(options.mixin_data()?.len(), 1);
//! # Ok::<(), dynproxy::Error>(())
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::{
    generation::{hook::AllMethodsHook, mixin::MixinData, ProxyGenerationHook},
    interception::InterceptorSelector,
    model::{
        types::{PrimitiveKind, TypeInfo, TypeRef},
        value::Value,
    },
    Error, Result,
};

/// An attribute to be placed on the proxy type
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    /// The attribute's type
    pub attribute_type: TypeRef,
    /// Constructor arguments
    pub arguments: Vec<Value>,
}

impl AttributeInfo {
    /// Creates an attribute without arguments
    #[must_use]
    pub fn new(attribute_type: TypeRef) -> Self {
        AttributeInfo {
            attribute_type,
            arguments: Vec::new(),
        }
    }

    /// Appends a constructor argument
    #[must_use]
    pub fn argument(mut self, value: impl Into<Value>) -> Self {
        self.arguments.push(value.into());
        self
    }
}

/// Options shaping a proxy type.
pub struct ProxyGenerationOptions {
    hook: Arc<dyn ProxyGenerationHook>,
    selector: Option<Arc<dyn InterceptorSelector>>,
    mixins: Vec<Value>,
    mixin_data: RwLock<Option<Arc<MixinData>>>,
    base_type_for_interface_proxy: TypeRef,
    additional_attributes: Vec<AttributeInfo>,
}

impl Default for ProxyGenerationOptions {
    fn default() -> Self {
        Self::new(Arc::new(AllMethodsHook::new()))
    }
}

impl ProxyGenerationOptions {
    /// Creates options using `hook`
    #[must_use]
    pub fn new(hook: Arc<dyn ProxyGenerationHook>) -> Self {
        ProxyGenerationOptions {
            hook,
            selector: None,
            mixins: Vec::new(),
            mixin_data: RwLock::new(None),
            base_type_for_interface_proxy: TypeInfo::primitive(PrimitiveKind::Object),
            additional_attributes: Vec::new(),
        }
    }

    /// Replaces the generation hook
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn ProxyGenerationHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Sets the interceptor selector
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn InterceptorSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Sets the base class of interface proxies, `System.Object` by default
    #[must_use]
    pub fn with_base_type_for_interface_proxy(mut self, base: TypeRef) -> Self {
        self.base_type_for_interface_proxy = base;
        self
    }

    /// Adds an attribute to put on the proxy type
    #[must_use]
    pub fn with_additional_attribute(mut self, attribute: AttributeInfo) -> Self {
        self.additional_attributes.push(attribute);
        self
    }

    /// The generation hook
    #[must_use]
    pub fn hook(&self) -> &Arc<dyn ProxyGenerationHook> {
        &self.hook
    }

    /// The interceptor selector, if any
    #[must_use]
    pub fn selector(&self) -> Option<&Arc<dyn InterceptorSelector>> {
        self.selector.as_ref()
    }

    /// The base class of interface proxies
    #[must_use]
    pub fn base_type_for_interface_proxy(&self) -> &TypeRef {
        &self.base_type_for_interface_proxy
    }

    /// Attributes to put on the proxy type
    #[must_use]
    pub fn additional_attributes(&self) -> &[AttributeInfo] {
        &self.additional_attributes
    }

    /// Registers a mixin instance. Invalidates mixin data computed by an earlier
    /// [`ProxyGenerationOptions::initialize`].
    ///
    /// # Errors
    /// Returns [`Error::NullArgument`] if `instance` is null.
    pub fn add_mixin_instance(&mut self, instance: impl Into<Value>) -> Result<()> {
        let instance = instance.into();
        if instance.is_null() {
            return Err(Error::NullArgument("instance"));
        }

        self.mixins.push(instance);
        match self.mixin_data.get_mut() {
            Ok(data) => *data = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        Ok(())
    }

    /// Returns true if any mixin instance was registered
    #[must_use]
    pub fn has_mixins(&self) -> bool {
        !self.mixins.is_empty()
    }

    /// The registered mixin instances, in registration order
    #[must_use]
    pub fn mixins_as_array(&self) -> Vec<Value> {
        self.mixins.clone()
    }

    /// Computes the mixin data. Does nothing if it is already computed and no mixin was
    /// added since.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMixinConfiguration`] if two mixins contribute the same
    /// interface, or [`Error::LockError`].
    pub fn initialize(&self) -> Result<()> {
        let mut data = write_lock!(self.mixin_data);
        if data.is_none() {
            *data = Some(Arc::new(MixinData::new(&self.mixins)?));
        }
        Ok(())
    }

    /// The mixin data computed by [`ProxyGenerationOptions::initialize`]
    ///
    /// # Errors
    /// Returns [`Error::MixinsNotInitialized`] before `initialize()`.
    pub fn mixin_data(&self) -> Result<Arc<MixinData>> {
        read_lock!(self.mixin_data)
            .clone()
            .ok_or(Error::MixinsNotInitialized)
    }

    /// The computed mixin data, or a temporary computation when not yet initialized
    fn effective_mixin_data(&self) -> Option<Arc<MixinData>> {
        if let Ok(data) = self.mixin_data() {
            return Some(data);
        }
        MixinData::new(&self.mixins).ok().map(Arc::new)
    }
}

impl PartialEq for ProxyGenerationOptions {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        if self.hook.type_key() != other.hook.type_key()
            || self.selector.is_some() != other.selector.is_some()
            || self.base_type_for_interface_proxy != other.base_type_for_interface_proxy
            || self.additional_attributes != other.additional_attributes
        {
            return false;
        }

        match (self.effective_mixin_data(), other.effective_mixin_data()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }
}

impl Hash for ProxyGenerationOptions {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hook.type_key().hash(state);
        self.selector.is_some().hash(state);
        self.base_type_for_interface_proxy.hash(state);
        self.additional_attributes.len().hash(state);
        if let Some(data) = self.effective_mixin_data() {
            data.hash(state);
        }
    }
}

impl fmt::Debug for ProxyGenerationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyGenerationOptions")
            .field("has_selector", &self.selector.is_some())
            .field("mixins", &self.mixins.len())
            .field(
                "base_type_for_interface_proxy",
                &self.base_type_for_interface_proxy.fullname(),
            )
            .field("additional_attributes", &self.additional_attributes)
            .finish_non_exhaustive()
    }
}
