//! # dynproxy Prelude
//!
//! The most commonly used types and traits, for glob imports.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dynproxy operations
pub use crate::Error;

/// Error classification and no-target reasons
pub use crate::{ErrorKind, NoTargetReason};

/// The result type used throughout dynproxy
pub use crate::Result;

// ================================================================================================
// Object and Member Model
// ================================================================================================

/// Type descriptors
pub use crate::model::types::{PrimitiveKind, TypeFlags, TypeInfo, TypeKind, TypeRef};

/// Member descriptors and identities
pub use crate::model::{
    member::{MemberAccess, MemberModifiers, MemberRef, MethodMember, Parameter},
    signature::TypeSig,
    token::MemberToken,
};

/// Dynamic values
pub use crate::model::value::{ObjectRef, Value};

/// Generic member closure
pub use crate::model::generic::{close_method, ConcreteMethod, GenericClosureCache};

// ================================================================================================
// Interception
// ================================================================================================

/// Invocation and its builder
pub use crate::interception::{CompletedCall, Invocation, InvocationBuilder, ProceedInfo};

/// Interceptors and selection
pub use crate::interception::{
    FnInterceptor, Interceptor, InterceptorChain, InterceptorRef, InterceptorSelector,
};

/// Target resolution
pub use crate::interception::{
    target_method, ChangeTarget, ExternalTarget, InvocationTarget, TargetMethod,
};

// ================================================================================================
// Generation and Proxies
// ================================================================================================

/// Generation options, hooks and mixins
pub use crate::generation::{
    AllMethodsHook, AttributeInfo, MixinData, ProxyGenerationHook, ProxyGenerationOptions,
};

/// Diagnostics
pub use crate::generation::{DiagnosticCategory, DiagnosticSeverity, Diagnostics};

/// Building and calling proxies
pub use crate::proxy::{ProxyBuilder, ProxyInstance, ProxyKind};
