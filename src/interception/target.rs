//! Target resolution strategies.
//!
//! Both flavors plug into the same proceed state machine and differ only in where "the real
//! implementation" lives once the chain is exhausted:
//!
//! - **Self-delegating** (class proxies): the target is the proxy object itself and the real
//!   implementation is the base class member. Abstract members have none.
//! - **External-target** (interface proxies with a target): the target is a distinct object.
//!   With retargeting enabled, interceptors can swap the target of the running invocation
//!   through [`ChangeTarget`], or the target of the proxy for all later calls.
//!
//! Interface proxies without a target use [`InvocationTarget::Missing`].

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::{
    interception::Invocation,
    model::value::{ObjectRef, Value},
    Error, NoTargetReason, Result,
};

/// The "invoke the real implementation" callback of one member.
///
/// Receives the object to call the member on and the invocation, from which it reads the
/// (possibly rewritten) arguments and to which it may write back by-ref arguments. The
/// returned value becomes the invocation's return value.
pub type TargetMethod = Arc<dyn Fn(&ObjectRef, &mut Invocation) -> Result<Value> + Send + Sync>;

/// The proxy's current target, shared between the proxy and invocations allowed to change it
pub type ProxyTargetCell = Arc<RwLock<Option<ObjectRef>>>;

/// Wraps a closure into a [`TargetMethod`]
pub fn target_method<F>(callback: F) -> TargetMethod
where
    F: Fn(&ObjectRef, &mut Invocation) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Where an invocation proceeds to once its interceptor chain is exhausted
#[derive(Clone)]
pub enum InvocationTarget {
    /// Class proxy, the target is the proxy itself. `None` for abstract members.
    SelfDelegating(Option<TargetMethod>),
    /// Interface proxy with a distinct target object
    External(ExternalTarget),
    /// Interface proxy created without target
    Missing,
}

impl InvocationTarget {
    /// Self-delegating target calling the base implementation
    #[must_use]
    pub fn base(implementation: TargetMethod) -> Self {
        InvocationTarget::SelfDelegating(Some(implementation))
    }

    /// Self-delegating target of an abstract member
    #[must_use]
    pub fn abstract_member() -> Self {
        InvocationTarget::SelfDelegating(None)
    }

    /// External target without retargeting
    #[must_use]
    pub fn external(target: ObjectRef, method: TargetMethod) -> Self {
        InvocationTarget::External(ExternalTarget::new(Some(target), method))
    }

    /// Resolves the object and callback to call, or the reason why there is none
    pub(crate) fn resolve(
        &self,
        proxy: &ObjectRef,
        member: &str,
    ) -> Result<(ObjectRef, TargetMethod)> {
        let no_target = |reason| Error::NoTarget {
            member: member.to_string(),
            reason,
        };

        match self {
            InvocationTarget::SelfDelegating(Some(base)) => Ok((proxy.clone(), base.clone())),
            InvocationTarget::SelfDelegating(None) => Err(no_target(NoTargetReason::AbstractMethod)),
            InvocationTarget::External(external) => match &external.target {
                Some(target) => Ok((target.clone(), external.method.clone())),
                None => Err(no_target(NoTargetReason::TargetCleared)),
            },
            InvocationTarget::Missing => Err(no_target(NoTargetReason::NoTargetProxy)),
        }
    }

    /// The object the member is invoked on, if any
    #[must_use]
    pub fn object<'a>(&'a self, proxy: &'a ObjectRef) -> Option<&'a ObjectRef> {
        match self {
            InvocationTarget::SelfDelegating(_) => Some(proxy),
            InvocationTarget::External(external) => external.target.as_ref(),
            InvocationTarget::Missing => None,
        }
    }
}

impl fmt::Debug for InvocationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationTarget::SelfDelegating(base) => f
                .debug_struct("SelfDelegating")
                .field("has_base", &base.is_some())
                .finish(),
            InvocationTarget::External(external) => f
                .debug_struct("External")
                .field("target", &external.target)
                .field("can_change_target", &external.proxy_target.is_some())
                .finish(),
            InvocationTarget::Missing => f.write_str("Missing"),
        }
    }
}

/// A distinct target object and the member implementation on it
#[derive(Clone)]
pub struct ExternalTarget {
    target: Option<ObjectRef>,
    method: TargetMethod,
    proxy_target: Option<ProxyTargetCell>,
}

impl ExternalTarget {
    /// Creates an external target, `None` if the proxy's target has been cleared
    #[must_use]
    pub fn new(target: Option<ObjectRef>, method: TargetMethod) -> Self {
        ExternalTarget {
            target,
            method,
            proxy_target: None,
        }
    }

    /// Enables retargeting; `proxy_target` is the cell holding the proxy's own target
    #[must_use]
    pub fn with_retargeting(mut self, proxy_target: ProxyTargetCell) -> Self {
        self.proxy_target = Some(proxy_target);
        self
    }

    /// True if interceptors may change the target
    #[must_use]
    pub fn can_change_target(&self) -> bool {
        self.proxy_target.is_some()
    }
}

/// Retargeting capability handed out by [`Invocation::change_target`].
///
/// This deliberately breaks the "target is fixed for the call" assumption: after
/// [`ChangeTarget::change_invocation_target`] every further `proceed()` of the same invocation
/// reaches the new object. It only exists for external-target invocations with retargeting
/// enabled.
pub struct ChangeTarget<'a> {
    target: &'a mut ExternalTarget,
}

impl<'a> ChangeTarget<'a> {
    pub(crate) fn new(target: &'a mut ExternalTarget) -> Self {
        ChangeTarget { target }
    }

    /// Changes the target of the running invocation only.
    ///
    /// Passing `None` makes the next proceed fail with [`NoTargetReason::TargetCleared`].
    pub fn change_invocation_target(&mut self, target: Option<ObjectRef>) {
        self.target.target = target;
    }

    /// Changes the proxy's target permanently, for every later call.
    ///
    /// The running invocation keeps its current target.
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the proxy's target cell is poisoned.
    pub fn change_proxy_target(&mut self, target: Option<ObjectRef>) -> Result<()> {
        if let Some(cell) = &self.target.proxy_target {
            with_write!(cell, |current: &mut Option<ObjectRef>| *current = target);
        }
        Ok(())
    }

    /// The current target of the running invocation
    #[must_use]
    pub fn invocation_target(&self) -> Option<&ObjectRef> {
        self.target.target.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{object_of, simple_class};

    fn echo() -> TargetMethod {
        target_method(|_, _| Ok(Value::I4(1)))
    }

    #[test]
    fn resolve_reports_reason() {
        let proxy = object_of(simple_class());
        let reason = |target: InvocationTarget| match target.resolve(&proxy, "Void Do()") {
            Err(Error::NoTarget { reason, .. }) => Some(reason),
            _ => None,
        };

        assert_eq!(
            reason(InvocationTarget::abstract_member()),
            Some(NoTargetReason::AbstractMethod)
        );
        assert_eq!(
            reason(InvocationTarget::Missing),
            Some(NoTargetReason::NoTargetProxy)
        );
        assert_eq!(
            reason(InvocationTarget::External(ExternalTarget::new(None, echo()))),
            Some(NoTargetReason::TargetCleared)
        );
        assert_eq!(reason(InvocationTarget::base(echo())), None);
    }

    #[test]
    fn self_delegating_targets_the_proxy() {
        let proxy = object_of(simple_class());
        let target = InvocationTarget::base(echo());
        let (object, _) = target.resolve(&proxy, "Void Do()").unwrap();
        assert!(object.ptr_eq(&proxy));
        assert!(target.object(&proxy).is_some_and(|o| o.ptr_eq(&proxy)));
    }

    #[test]
    fn change_proxy_target_writes_the_cell() {
        let first = object_of(simple_class());
        let second = object_of(simple_class());
        let cell: ProxyTargetCell = Arc::new(RwLock::new(Some(first.clone())));
        let mut external =
            ExternalTarget::new(Some(first.clone()), echo()).with_retargeting(cell.clone());
        assert!(external.can_change_target());

        let mut handle = ChangeTarget::new(&mut external);
        handle.change_proxy_target(Some(second.clone())).unwrap();
        assert!(handle.invocation_target().is_some_and(|t| t.ptr_eq(&first)));

        let current = cell.read().unwrap().clone();
        assert!(current.is_some_and(|t| t.ptr_eq(&second)));
    }
}
