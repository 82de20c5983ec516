//! The per-call invocation record and its proceed state machine.
//!
//! # Cursor states
//!
//! The invocation tracks its position in the interceptor chain with a cursor that starts below
//! the first element:
//!
//! | cursor | meaning |
//! |---|---|
//! | `< 0` | no interceptor entered yet |
//! | `0..len` | inside the interceptor at that index |
//! | `== len` | chain exhausted, the real implementation runs |
//! | `> len` | illegal, `proceed()` was called once too often |
//!
//! Every `proceed()` increments the cursor on entry and decrements it on exit through a guard,
//! so the decrement also happens when an interceptor or the real implementation fails. A chain
//! of N interceptors that each proceed once walks the cursor `0, 1, .., N` and back down to
//! `-1`, and a failed call leaves the cursor exactly where it was before.
//!
//! # Example
//!
//! ```rust
//! use dynproxy::prelude::*;
//! use std::sync::Arc;
//!
//! let calc = TypeInfo::class("Acme", "Calc").into_ref();
//! let answer = MethodMember::new(MemberToken::method(1), calc.clone(), "Answer")
//!     .returns(TypeSig::primitive(PrimitiveKind::Int32))
//!     .into_ref();
//!
//! let double: InterceptorRef = FnInterceptor::shared(|invocation: &mut Invocation| {
//!     invocation.proceed()?;
//!     let value = invocation.return_value().as_i4().unwrap_or_default();
//!     invocation.set_return_value(Value::I4(value * 2));
//!     Ok(())
//! });
//!
//! let mut invocation = Invocation::builder(ObjectRef::new(calc, ()), answer)
//!     .interceptors(vec![double])
//!     .target(InvocationTarget::base(target_method(|_, _| Ok(Value::I4(21)))))
//!     .build()?;
//! invocation.proceed()?;
//! assert_eq!(invocation.return_value(), &Value::I4(42));
//! # Ok::<(), dynproxy::Error>(())
//! ```

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::{
    interception::{
        resolve_interceptors, ChangeTarget, InterceptorChain, InterceptorRef,
        InterceptorSelector, InvocationTarget,
    },
    model::{
        generic::{close_method, ConcreteMethod, GenericClosureCache},
        member::MemberRef,
        types::TypeRef,
        value::{ObjectRef, Value},
    },
    Error, Result,
};

/// Cursor value of an invocation that has not entered its chain
const CURSOR_START: isize = -1;

/// Per-call record of a proxied member call.
///
/// Created fresh for every call and exclusively owned by the call stack that created it. It
/// must not be retained beyond the call.
pub struct Invocation {
    proxy: ObjectRef,
    member: MemberRef,
    arguments: Vec<Value>,
    interceptors: InterceptorChain,
    cursor: isize,
    started: bool,
    generic_arguments: Option<Vec<TypeRef>>,
    concrete: OnceCell<Arc<ConcreteMethod>>,
    closure_cache: Option<Arc<GenericClosureCache>>,
    return_value: Value,
    target: InvocationTarget,
}

impl Invocation {
    /// Starts building the invocation of `member` on `proxy`
    #[must_use]
    pub fn builder(proxy: ObjectRef, member: MemberRef) -> InvocationBuilder {
        InvocationBuilder::new(proxy, member)
    }

    /// The proxy instance the call was made on
    #[must_use]
    pub fn proxy(&self) -> &ObjectRef {
        &self.proxy
    }

    /// The proxied member, as declared (possibly open generic)
    #[must_use]
    pub fn method(&self) -> &MemberRef {
        &self.member
    }

    /// The call's arguments
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Number of arguments
    #[must_use]
    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// Returns the argument at `index`
    ///
    /// # Errors
    /// Returns [`Error::ArgumentIndex`] if `index` is out of range.
    pub fn get_argument(&self, index: usize) -> Result<&Value> {
        self.arguments.get(index).ok_or(Error::ArgumentIndex {
            index,
            count: self.arguments.len(),
        })
    }

    /// Replaces the argument at `index`
    ///
    /// # Errors
    /// Returns [`Error::ArgumentIndex`] if `index` is out of range.
    pub fn set_argument(&mut self, index: usize, value: Value) -> Result<()> {
        let count = self.arguments.len();
        let slot = self
            .arguments
            .get_mut(index)
            .ok_or(Error::ArgumentIndex { index, count })?;
        *slot = value;
        Ok(())
    }

    /// The return value, [`Value::Void`] until the real implementation ran or an
    /// interceptor set one
    #[must_use]
    pub fn return_value(&self) -> &Value {
        &self.return_value
    }

    /// Sets the return value
    pub fn set_return_value(&mut self, value: Value) {
        self.return_value = value;
    }

    /// Takes the return value out, leaving [`Value::Void`]
    pub fn take_return_value(&mut self) -> Value {
        std::mem::take(&mut self.return_value)
    }

    /// The generic witnesses of this call, if the member is generic
    #[must_use]
    pub fn generic_arguments(&self) -> Option<&[TypeRef]> {
        self.generic_arguments.as_deref()
    }

    /// Supplies the concrete types closing an open generic member for this call.
    ///
    /// Must be called exactly once for generic members, before the first `proceed()`.
    ///
    /// # Errors
    /// - [`Error::GenericArguments`] if witnesses were already supplied, or the chain was
    ///   already entered
    /// - [`Error::GenericArity`] if the number of witnesses does not match the member
    pub fn set_generic_arguments(&mut self, witnesses: Vec<TypeRef>) -> Result<()> {
        if self.generic_arguments.is_some() {
            return Err(Error::GenericArguments(format!(
                "Generic arguments of '{}' have already been set for this invocation",
                self.member
            )));
        }

        if self.started {
            return Err(Error::GenericArguments(format!(
                "Generic arguments of '{}' must be set before the first proceed()",
                self.member
            )));
        }

        if witnesses.len() != self.member.generic_params.len() {
            return Err(Error::GenericArity {
                member: self.member.to_string(),
                expected: self.member.generic_params.len(),
                found: witnesses.len(),
            });
        }

        self.generic_arguments = Some(witnesses);
        Ok(())
    }

    /// The member closed over this call's generic witnesses.
    ///
    /// Computed on first access and kept for the rest of this invocation only.
    ///
    /// # Errors
    /// Returns [`Error::GenericArguments`] if the member is generic and no witnesses were
    /// supplied, or the errors of [`close_method`].
    pub fn concrete_method(&self) -> Result<Arc<ConcreteMethod>> {
        if let Some(concrete) = self.concrete.get() {
            return Ok(concrete.clone());
        }

        let witnesses = match (&self.generic_arguments, self.member.is_generic()) {
            (Some(witnesses), _) => witnesses.as_slice(),
            (None, false) => &[],
            (None, true) => {
                return Err(Error::GenericArguments(format!(
                    "Generic arguments of '{}' have not been supplied",
                    self.member
                )))
            }
        };

        let concrete = match &self.closure_cache {
            Some(cache) => cache.get_or_close(&self.member, witnesses)?,
            None => Arc::new(close_method(&self.member, witnesses)?),
        };

        Ok(self.concrete.get_or_init(|| concrete).clone())
    }

    /// The object the real implementation is invoked on: the proxy itself for class proxies,
    /// the target for interface proxies, `None` without target
    #[must_use]
    pub fn invocation_target(&self) -> Option<&ObjectRef> {
        self.target.object(&self.proxy)
    }

    /// The runtime type of [`Invocation::invocation_target`]
    #[must_use]
    pub fn target_type(&self) -> Option<TypeRef> {
        self.invocation_target()
            .map(|target| target.runtime_type().clone())
    }

    /// The interceptors of this invocation, in the order they are consulted
    #[must_use]
    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    /// Index of the interceptor currently executing, `None` outside the chain
    #[must_use]
    pub fn current_interceptor_index(&self) -> Option<usize> {
        usize::try_from(self.cursor)
            .ok()
            .filter(|index| *index < self.interceptors.len())
    }

    /// True if interceptors may retarget this invocation
    #[must_use]
    pub fn can_change_target(&self) -> bool {
        matches!(&self.target, InvocationTarget::External(external) if external.can_change_target())
    }

    /// The retargeting capability, only available for external-target invocations with
    /// retargeting enabled
    pub fn change_target(&mut self) -> Option<ChangeTarget<'_>> {
        match &mut self.target {
            InvocationTarget::External(external) if external.can_change_target() => {
                Some(ChangeTarget::new(external))
            }
            _ => None,
        }
    }

    /// Captures the current chain position, so the rest of the chain can be run again later
    /// through [`ProceedInfo::invoke`]
    #[must_use]
    pub fn capture_proceed_info(&self) -> ProceedInfo {
        ProceedInfo {
            cursor: self.cursor,
        }
    }

    /// Advances to the next interceptor, or to the real implementation once the chain is
    /// exhausted.
    ///
    /// # Errors
    /// - [`Error::Protocol`] if called once more than the chain allows
    /// - [`Error::NoTarget`] if the chain is exhausted and there is no implementation
    /// - any error raised by an interceptor or the real implementation, unmodified
    pub fn proceed(&mut self) -> Result<()> {
        let mut frame = ProceedFrame::enter(self);
        let chain_len = frame.interceptors.len();

        tracing::trace!(
            member = %frame.member,
            cursor = frame.cursor,
            interceptors = chain_len,
            "proceed"
        );

        // The cursor is at least 0 after entering a frame
        let position = frame.cursor.unsigned_abs();
        match position.cmp(&chain_len) {
            Ordering::Less => {
                let interceptor: InterceptorRef = frame.interceptors[position].clone();
                interceptor.intercept(&mut frame)
            }
            Ordering::Equal => frame.invoke_target(),
            Ordering::Greater => Err(Error::Protocol {
                member: frame.member.to_string(),
                interceptors: chain_len,
            }),
        }
    }

    fn invoke_target(&mut self) -> Result<()> {
        let member = self.member.to_string();
        let (target, method) = self.target.resolve(&self.proxy, &member)?;
        let value = method(&target, self)?;
        self.return_value = value;
        Ok(())
    }

    /// Consumes the invocation, returning the return value and the final arguments so
    /// by-ref arguments can be copied back to the caller
    #[must_use]
    pub fn into_completed(self) -> CompletedCall {
        CompletedCall {
            return_value: self.return_value,
            arguments: self.arguments,
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("member", &self.member.to_string())
            .field("arguments", &self.arguments)
            .field("interceptors", &self.interceptors.len())
            .field("cursor", &self.cursor)
            .field("generic_arguments", &self.generic_arguments)
            .field("return_value", &self.return_value)
            .field("target", &self.target)
            .finish()
    }
}

/// One `proceed()` activation. Entering increments the cursor, dropping decrements it.
struct ProceedFrame<'a> {
    invocation: &'a mut Invocation,
}

impl<'a> ProceedFrame<'a> {
    fn enter(invocation: &'a mut Invocation) -> Self {
        invocation.cursor += 1;
        invocation.started = true;
        ProceedFrame { invocation }
    }
}

impl Drop for ProceedFrame<'_> {
    fn drop(&mut self) {
        self.invocation.cursor -= 1;
    }
}

impl Deref for ProceedFrame<'_> {
    type Target = Invocation;

    fn deref(&self) -> &Invocation {
        self.invocation
    }
}

impl DerefMut for ProceedFrame<'_> {
    fn deref_mut(&mut self) -> &mut Invocation {
        self.invocation
    }
}

/// A captured chain position, see [`Invocation::capture_proceed_info`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProceedInfo {
    cursor: isize,
}

impl ProceedInfo {
    /// Proceeds `invocation` from the captured position. The invocation's own cursor is
    /// restored afterwards, also on failure.
    ///
    /// # Errors
    /// Returns the errors of [`Invocation::proceed`].
    pub fn invoke(&self, invocation: &mut Invocation) -> Result<()> {
        let restore = CursorRestore {
            previous: invocation.cursor,
            invocation,
        };
        restore.invocation.cursor = self.cursor;
        restore.invocation.proceed()
    }
}

struct CursorRestore<'a> {
    previous: isize,
    invocation: &'a mut Invocation,
}

impl Drop for CursorRestore<'_> {
    fn drop(&mut self) {
        self.invocation.cursor = self.previous;
    }
}

/// Outcome of a finished call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedCall {
    /// The final return value
    pub return_value: Value,
    /// The final arguments, including by-ref values written by interceptors or the target
    pub arguments: Vec<Value>,
}

/// Builds an [`Invocation`].
///
/// This is the single construction path used by generated (or runtime-dispatched) proxy code;
/// every optional piece of a call site is a builder method rather than a constructor
/// overload.
pub struct InvocationBuilder {
    proxy: ObjectRef,
    member: MemberRef,
    arguments: Vec<Value>,
    interceptors: InterceptorChain,
    target: InvocationTarget,
    generic_arguments: Option<Vec<TypeRef>>,
    closure_cache: Option<Arc<GenericClosureCache>>,
    selector: Option<(Arc<dyn InterceptorSelector>, TypeRef)>,
}

impl InvocationBuilder {
    fn new(proxy: ObjectRef, member: MemberRef) -> Self {
        InvocationBuilder {
            proxy,
            member,
            arguments: Vec::new(),
            interceptors: Arc::from(Vec::new()),
            target: InvocationTarget::Missing,
            generic_arguments: None,
            closure_cache: None,
            selector: None,
        }
    }

    /// The call arguments
    #[must_use]
    pub fn arguments(mut self, arguments: Vec<Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// The interceptors to consult, already narrowed to this member unless a selector is
    /// supplied as well
    #[must_use]
    pub fn interceptors(mut self, interceptors: impl Into<InterceptorChain>) -> Self {
        self.interceptors = interceptors.into();
        self
    }

    /// Where to proceed to once the chain is exhausted, [`InvocationTarget::Missing`] by
    /// default
    #[must_use]
    pub fn target(mut self, target: InvocationTarget) -> Self {
        self.target = target;
        self
    }

    /// The generic witnesses of this call
    #[must_use]
    pub fn generic_arguments(mut self, witnesses: Vec<TypeRef>) -> Self {
        self.generic_arguments = Some(witnesses);
        self
    }

    /// A host-owned cache for closed generic members
    #[must_use]
    pub fn closure_cache(mut self, cache: Arc<GenericClosureCache>) -> Self {
        self.closure_cache = Some(cache);
        self
    }

    /// Narrows the interceptors through `selector` when building; `declaring_type` is the
    /// proxied type passed to the selector. The resolved subset is available through
    /// [`Invocation::interceptors`] so the caller can cache it.
    #[must_use]
    pub fn selector(
        mut self,
        selector: Arc<dyn InterceptorSelector>,
        declaring_type: TypeRef,
    ) -> Self {
        self.selector = Some((selector, declaring_type));
        self
    }

    /// Builds the invocation
    ///
    /// # Errors
    /// Returns the errors of [`Invocation::set_generic_arguments`].
    pub fn build(self) -> Result<Invocation> {
        let interceptors = match &self.selector {
            Some((selector, declaring_type)) => resolve_interceptors(
                selector.as_ref(),
                declaring_type,
                &self.member,
                &self.interceptors,
            ),
            None => self.interceptors,
        };

        let mut invocation = Invocation {
            proxy: self.proxy,
            member: self.member,
            arguments: self.arguments,
            interceptors,
            cursor: CURSOR_START,
            started: false,
            generic_arguments: None,
            concrete: OnceCell::new(),
            closure_cache: self.closure_cache,
            return_value: Value::Void,
            target: self.target,
        };

        if let Some(witnesses) = self.generic_arguments {
            invocation.set_generic_arguments(witnesses)?;
        }

        Ok(invocation)
    }
}
