//! The call-time interception pipeline.
//!
//! Every call of a proxied member builds one [`Invocation`] and drives it through an ordered
//! chain of [`Interceptor`]s. The last step of the chain is the real implementation, found
//! through the invocation's [`InvocationTarget`].
//!
//! # Key Components
//!
//! - [`Invocation`] / [`InvocationBuilder`] - per-call record and the proceed state machine
//! - [`Interceptor`] / [`FnInterceptor`] - the extension point observing or altering calls
//! - [`InvocationTarget`] - self-delegating or external-target resolution of the real
//!   implementation, including the retargeting capability [`ChangeTarget`]
//! - [`InterceptorSelector`] / [`SelectorCache`] - per-member narrowing of the chain

mod interceptor;
mod invocation;
mod selector;
mod target;

pub use interceptor::{
    same_chain, same_interceptor, FnInterceptor, Interceptor, InterceptorChain, InterceptorRef,
};
pub use invocation::{CompletedCall, Invocation, InvocationBuilder, ProceedInfo};
pub(crate) use selector::resolve_interceptors;
pub use selector::{InterceptorSelector, SelectorCache};
pub use target::{
    target_method, ChangeTarget, ExternalTarget, InvocationTarget, ProxyTargetCell, TargetMethod,
};
