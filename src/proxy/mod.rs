//! Runtime-dispatched proxies.
//!
//! A proxy type is assembled once by [`ProxyBuilder`] from the proxied type, the member
//! catalog's members and their implementations, the interceptors and the generation options.
//! The resulting [`ProxyInstance`] routes every call through a [`DispatchTable`]:
//!
//! - intercepted members build an [`Invocation`](crate::interception::Invocation) over the
//!   (selected) interceptor chain,
//! - members the hook declined, and non-proxyable members, proceed straight to their
//!   implementation,
//! - members of mixed-in interfaces go to their mixin instance without interception.

mod builder;
mod dispatch;
mod instance;

pub use builder::{ProxyBuilder, PROXY_NAMESPACE};
pub use dispatch::{DispatchEntry, DispatchTable, ProxyKind};
pub use instance::{ProxyInstance, ProxyType};
