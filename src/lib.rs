// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dynproxy
//!
//! Call interception for dynamically dispatched objects. A proxy stands in for an object (a
//! class, or an interface with or without a target) and routes every call of its members
//! through an ordered chain of interceptors before, optionally, reaching the real
//! implementation.
//!
//! ## Features
//!
//! - **Interceptor chains** - interceptors observe and rewrite arguments and return values,
//!   call the rest of the chain any number of times, or short-circuit it
//! - **Per-member selection** - an interceptor selector narrows the chain per member, once
//!   per proxy and member
//! - **Target flavors** - class proxies proceed to the base implementation, interface proxies
//!   forward to a target that interceptors may replace
//! - **Mixins** - extra objects whose interfaces the proxy exposes
//! - **Generic members** - open generic members are closed over the witnesses of each call
//!
//! ## Quick Start
//!
//! ```rust
//! use dynproxy::prelude::*;
//!
//! let service = TypeInfo::class("Acme", "Service").into_ref();
//! let answer = MethodMember::new(MemberToken::method(1), service.clone(), "Answer")
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
//! let proxy = ProxyBuilder::class_proxy(service)
//!     .interceptor(double)
//!     .member(answer, target_method(|_, _| Ok(Value::I4(21))))
//!     .build()?;
//!
//! assert_eq!(proxy.invoke(MemberToken::method(1), vec![])?, Value::I4(42));
//! # Ok::<(), dynproxy::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`model`] - types, members, signatures and values handed over by the member catalog
//! - [`interception`] - the per-call [`interception::Invocation`] and its proceed state
//!   machine, interceptors, selectors and target resolution
//! - [`generation`] - generation options, hooks, mixin composition and diagnostics
//! - [`proxy`] - building proxies and dispatching their calls
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result`]. [`Error::kind`] classifies a failure as a
//! protocol violation, a missing target, a configuration problem, API misuse, or an
//! application error raised by an interceptor or the real implementation. Application
//! errors pass through every interception layer unmodified.
//!
//! ## Logging
//!
//! The crate logs through `tracing`: every `proceed()` step at `TRACE`, selector and mixin
//! computations at `DEBUG`, non-proxyable members at `WARN`. Install any `tracing`
//! subscriber to see them.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dynproxy::prelude::*;
///
/// let calc = TypeInfo::interface("Acme", "ICalc").into_ref();
/// let proxy = ProxyBuilder::interface_proxy_without_target(calc).build()?;
/// assert_eq!(proxy.proxy_type().kind(), ProxyKind::InterfaceWithoutTarget);
/// # Ok::<(), dynproxy::Error>(())
/// ```
pub mod prelude;

pub mod generation;
pub mod interception;
pub mod model;
pub mod proxy;

/// `dynproxy` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dynproxy` Error type, its classification and the reasons a call has no target
pub use error::{Error, ErrorKind, NoTargetReason};
