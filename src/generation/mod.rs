//! Proxy generation configuration.
//!
//! Everything in this module is consulted once, when a proxy is built, and never on the call
//! path:
//!
//! - [`ProxyGenerationOptions`] - hook, selector, mixins and proxy type shaping
//! - [`ProxyGenerationHook`] / [`AllMethodsHook`] - which members get intercepted
//! - [`MixinData`] - interface to mixin mapping
//! - [`Diagnostics`] - non-fatal findings collected while building

pub mod diagnostics;
mod hook;
mod mixin;
mod options;

pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
pub use hook::{AllMethodsHook, ProxyGenerationHook};
pub use mixin::MixinData;
pub use options::{AttributeInfo, ProxyGenerationOptions};
