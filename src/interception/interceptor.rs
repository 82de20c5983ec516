use std::fmt;
use std::sync::Arc;

use crate::{interception::Invocation, Result};

/// Shared reference to an interceptor
pub type InterceptorRef = Arc<dyn Interceptor>;

/// Ordered, immutable list of interceptors consulted by an invocation
pub type InterceptorChain = Arc<[InterceptorRef]>;

/// A capability that observes or alters a single call.
///
/// The interceptor receives the invocation of the current call and may
/// - read and rewrite arguments before calling [`Invocation::proceed`],
/// - call `proceed()` zero or more times,
/// - read and rewrite the return value afterwards,
/// - set the return value without proceeding at all (short-circuit).
///
/// Interceptors are shared between proxies and threads. Any state they hold is the
/// implementor's own synchronization responsibility.
pub trait Interceptor: Send + Sync {
    /// Intercepts one call at this interceptor's position in the chain
    ///
    /// # Errors
    /// Errors are propagated to the caller unmodified.
    fn intercept(&self, invocation: &mut Invocation) -> Result<()>;
}

/// Interceptor backed by a closure.
///
/// ```rust
/// use dynproxy::interception::{FnInterceptor, InterceptorRef, Invocation};
/// use std::sync::Arc;
///
/// let logging: InterceptorRef = Arc::new(FnInterceptor::new(|invocation: &mut Invocation| {
///     println!("calling {}", invocation.method());
///     invocation.proceed()
/// }));
/// ```
pub struct FnInterceptor<F> {
    callback: F,
}

impl<F> FnInterceptor<F>
where
    F: Fn(&mut Invocation) -> Result<()> + Send + Sync,
{
    /// Creates an interceptor calling `callback` for every intercepted call
    pub fn new(callback: F) -> Self {
        FnInterceptor { callback }
    }

    /// Creates the interceptor and wraps it into an [`InterceptorRef`]
    pub fn shared(callback: F) -> InterceptorRef
    where
        F: 'static,
    {
        Arc::new(Self::new(callback))
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&mut Invocation) -> Result<()> + Send + Sync,
{
    fn intercept(&self, invocation: &mut Invocation) -> Result<()> {
        (self.callback)(invocation)
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnInterceptor")
    }
}

/// Reference equality of two interceptors
#[must_use]
pub fn same_interceptor(first: &InterceptorRef, second: &InterceptorRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(first), Arc::as_ptr(second))
}

/// Returns true if both chains hold the same interceptor instances in the same order
#[must_use]
pub fn same_chain(first: &[InterceptorRef], second: &[InterceptorRef]) -> bool {
    first.len() == second.len()
        && first
            .iter()
            .zip(second)
            .all(|(left, right)| same_interceptor(left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::counting_interceptor;

    #[test]
    fn identity_is_by_reference() {
        let (first, _) = counting_interceptor();
        let (second, _) = counting_interceptor();
        let alias = first.clone();

        assert!(same_interceptor(&first, &alias));
        assert!(!same_interceptor(&first, &second));

        assert!(same_chain(&[first.clone(), second.clone()], &[alias, second.clone()]));
        assert!(!same_chain(&[first.clone(), second.clone()], &[second, first]));
    }
}
