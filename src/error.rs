use thiserror::Error;

use crate::model::token::MemberToken;

/// Builds an [`Error::Configuration`] carrying the source location where the
/// misconfiguration was detected.
macro_rules! config_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Configuration {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Configuration {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Why an invocation could not reach a real implementation.
///
/// Both situations are programmer errors from the framework's point of view: the
/// interceptor is expected to provide the return value (and any by-ref arguments)
/// itself instead of calling [`crate::interception::Invocation::proceed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoTargetReason {
    /// The proxied class member is abstract, there is no base implementation.
    AbstractMethod,
    /// The proxy was deliberately created without a target object.
    NoTargetProxy,
    /// An interceptor changed the invocation target to no object at all.
    TargetCleared,
}

impl NoTargetReason {
    fn describe(self, member: &str) -> String {
        match self {
            NoTargetReason::AbstractMethod => format!(
                "The interceptor attempted to 'proceed' for abstract method '{member}', which has no \
                 implementation to proceed to. It is the responsibility of the interceptor to mimic \
                 the implementation (set the return value, out arguments etc)"
            ),
            NoTargetReason::NoTargetProxy => format!(
                "The interceptor attempted to 'proceed' for method '{member}' which has no target. \
                 When calling a method without target there is no implementation to proceed to and \
                 it is the responsibility of the interceptor to mimic the implementation (set the \
                 return value, out arguments etc)"
            ),
            NoTargetReason::TargetCleared => format!(
                "The interceptor attempted to 'proceed' for method '{member}' after the invocation \
                 target was changed to none. There is no implementation to proceed to, either \
                 provide a valid target or mimic the implementation in the interceptor"
            ),
        }
    }
}

/// Coarse classification of an [`Error`].
///
/// Host code uses this to decide whether a failure is a configuration-time problem, an
/// interceptor-authoring bug or an application error that should simply be rethrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum ErrorKind {
    /// `proceed()` was driven past the end of the chain.
    Protocol,
    /// The chain was exhausted but no real implementation exists.
    NoTarget,
    /// Invalid proxy or options configuration, raised before any interception.
    Configuration,
    /// Misuse of the call-time API (bad argument index, late generic arguments, ...).
    Usage,
    /// An error raised by an interceptor or by the real implementation.
    Application,
}

/// The generic Error type, which covers every failure the interception pipeline can report.
///
/// # Error Categories
///
/// ## Call protocol
/// - [`Error::Protocol`] - `proceed()` called more often than the chain allows
/// - [`Error::NoTarget`] - chain exhausted without a real implementation
///
/// ## Configuration
/// - [`Error::InvalidMixinConfiguration`] - two mixins expose the same interface
/// - [`Error::NullArgument`] - a required instance was null
/// - [`Error::MissingSerializationConstructor`] - serializable base without the constructor
/// - [`Error::Configuration`] - any other invalid proxy configuration
///
/// ## Usage
/// - [`Error::GenericArity`], [`Error::GenericArguments`] - generic witnesses misuse
/// - [`Error::ArgumentIndex`] - argument index outside the call's argument list
/// - [`Error::MemberNotFound`] - the proxy does not know the member
///
/// # Examples
///
/// ```rust
/// use dynproxy::{Error, ErrorKind};
///
/// fn report(error: &Error) {
///     match error.kind() {
///         ErrorKind::Application => eprintln!("rethrowing: {error}"),
///         kind => eprintln!("{kind} failure: {error}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// `proceed()` was called more times than the number of interceptors plus the one call
    /// to the real implementation.
    ///
    /// Always a bug in interceptor code, never retried.
    #[error(
        "proceed() has been called more times than expected for method '{member}' with {interceptors} \
         interceptor(s) configured. This usually signifies a bug in the calling code. Make sure that the \
         last interceptor selected for this invocation does not call proceed() again after the real \
         implementation ran"
    )]
    Protocol {
        /// Display form of the offending member
        member: String,
        /// Number of interceptors in the invocation's chain
        interceptors: usize,
    },

    /// The chain was exhausted but there is no real implementation to call.
    #[error("{}", .reason.describe(.member))]
    NoTarget {
        /// Display form of the member that was proceeded
        member: String,
        /// Distinguishes abstract members from deliberate no-target proxies
        reason: NoTargetReason,
    },

    /// Two mixins contribute the same interface, dispatch would be ambiguous.
    #[error(
        "Invalid mixin configuration - the mixins '{first}' and '{second}' both implement interface \
         '{interface}', a proxy can only route an interface to a single mixin"
    )]
    InvalidMixinConfiguration {
        /// Full name of the conflicting interface
        interface: String,
        /// Runtime type of the first mixin that contributes the interface
        first: String,
        /// Runtime type of the second mixin that contributes the interface
        second: String,
    },

    /// A required instance was null.
    #[error("Argument '{0}' must not be null")]
    NullArgument(&'static str),

    /// Mixin data was requested before [`crate::generation::ProxyGenerationOptions::initialize`].
    #[error("Mixin data has not been computed yet, call initialize() on the options first")]
    MixinsNotInitialized,

    /// A serializable base class lacks the serialization constructor a proxy must chain to.
    #[error(
        "The type '{0}' implements the serializable contract, but does not provide a serialization \
         constructor. Proxies of serializable types must be able to chain to it"
    )]
    MissingSerializationConstructor(String),

    /// Invalid proxy configuration.
    ///
    /// Includes the source location where the problem was detected.
    #[error("Configuration - {file}:{line}: {message}")]
    Configuration {
        /// The message describing the misconfiguration
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The number of generic witnesses does not match the member's generic parameters.
    #[error("Method '{member}' expects {expected} generic argument(s), but {found} were supplied")]
    GenericArity {
        /// Display form of the member
        member: String,
        /// Number of generic parameters declared by the member
        expected: usize,
        /// Number of witnesses supplied
        found: usize,
    },

    /// Generic witnesses were supplied twice or too late.
    #[error("{0}")]
    GenericArguments(String),

    /// An argument index outside the call's argument list.
    #[error("Argument index {index} is out of range, the invocation has {count} argument(s)")]
    ArgumentIndex {
        /// The requested index
        index: usize,
        /// Number of arguments of the invocation
        count: usize,
    },

    /// The proxy has no member with this token.
    #[error("The proxy has no member with token {0}")]
    MemberNotFound(MemberToken),

    /// Recursion limit reached while closing a generic signature.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// Failed to lock target.
    #[error("Failed to lock target")]
    LockError,

    /// An error raised by an interceptor or by the real implementation.
    ///
    /// Passed through every `proceed()` frame untouched.
    #[error(transparent)]
    Application(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Protocol { .. } => ErrorKind::Protocol,
            Error::NoTarget { .. } => ErrorKind::NoTarget,
            Error::InvalidMixinConfiguration { .. }
            | Error::NullArgument(_)
            | Error::MixinsNotInitialized
            | Error::MissingSerializationConstructor(_)
            | Error::Configuration { .. } => ErrorKind::Configuration,
            Error::GenericArity { .. }
            | Error::GenericArguments(_)
            | Error::ArgumentIndex { .. }
            | Error::MemberNotFound(_)
            | Error::RecursionLimit(_)
            | Error::LockError => ErrorKind::Usage,
            Error::Application(_) | Error::Error(_) => ErrorKind::Application,
        }
    }

    /// Wraps any error raised by application code.
    pub fn application<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Application(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn no_target_messages_are_distinct() {
        let abstract_method = Error::NoTarget {
            member: "Void Dispose()".to_string(),
            reason: NoTargetReason::AbstractMethod,
        }
        .to_string();
        let no_target = Error::NoTarget {
            member: "Void Dispose()".to_string(),
            reason: NoTargetReason::NoTargetProxy,
        }
        .to_string();

        assert!(abstract_method.contains("abstract method 'Void Dispose()'"));
        assert!(no_target.contains("'Void Dispose()' which has no target"));
        assert!(no_target.contains("no implementation to proceed to"));
        assert_ne!(abstract_method, no_target);
    }

    #[test]
    fn protocol_message_names_member_and_count() {
        let error = Error::Protocol {
            member: "Int32 ICalc.Sum(Int32, Int32)".to_string(),
            interceptors: 2,
        };
        let message = error.to_string();
        assert!(message.contains("'Int32 ICalc.Sum(Int32, Int32)'"));
        assert!(message.contains("2 interceptor(s)"));
        assert_eq!(error.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn config_error_records_location() {
        let error = config_error!("class {} is sealed", "Acme.Sealed");
        match &error {
            Error::Configuration { message, file, .. } => {
                assert_eq!(message, "class Acme.Sealed is sealed");
                assert!(file.ends_with("error.rs"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn application_errors_pass_through() {
        let error = Error::application("disk on fire");
        assert_eq!(error.to_string(), "disk on fire");
        assert_eq!(error.kind(), ErrorKind::Application);
    }

    #[test]
    fn every_kind_has_a_label() {
        let labels: Vec<String> = ErrorKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            labels,
            ["Protocol", "NoTarget", "Configuration", "Usage", "Application"]
        );
    }
}
