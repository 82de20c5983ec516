//! Per-member interceptor selection.
//!
//! A proxy holds one list of interceptors for all of its members. An [`InterceptorSelector`]
//! narrows (or reorders) that list for a single member. Selection runs at most once per
//! (proxy, member) pair: the result is stored in a [`SelectorCache`] and every later call of
//! the member reuses it, so selectors must be deterministic.
//!
//! # Thread Safety
//!
//! The cache is a [`DashMap`]. Two threads making the first call of the same member at the
//! same time may both run the selector, the first result stored wins and both calls see the
//! stored chain from then on.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    interception::{InterceptorChain, InterceptorRef},
    model::{member::MethodMember, token::MemberToken, types::TypeRef},
};

/// Chooses the interceptors applied to one member.
pub trait InterceptorSelector: Send + Sync {
    /// Returns the interceptors for `member`, in the order they should be consulted.
    ///
    /// `interceptors` is the proxy's full list. Returning `None` is the same as returning an
    /// empty list. The result may contain interceptors not found in `interceptors`.
    fn select_interceptors(
        &self,
        declaring_type: &TypeRef,
        member: &MethodMember,
        interceptors: &[InterceptorRef],
    ) -> Option<Vec<InterceptorRef>>;
}

/// Runs `selector` for `member` and normalizes its answer into a chain
pub(crate) fn resolve_interceptors(
    selector: &dyn InterceptorSelector,
    declaring_type: &TypeRef,
    member: &MethodMember,
    interceptors: &[InterceptorRef],
) -> InterceptorChain {
    let selected = selector
        .select_interceptors(declaring_type, member, interceptors)
        .unwrap_or_default();

    tracing::debug!(
        member = %member,
        available = interceptors.len(),
        selected = selected.len(),
        "interceptors selected"
    );

    Arc::from(selected)
}

/// Memoized selector results of one proxy, keyed by member token
#[derive(Default)]
pub struct SelectorCache {
    chains: DashMap<MemberToken, InterceptorChain>,
}

impl SelectorCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chain of `member`, running the selector on the first call only
    pub fn get_or_select(
        &self,
        selector: &dyn InterceptorSelector,
        declaring_type: &TypeRef,
        member: &MethodMember,
        interceptors: &[InterceptorRef],
    ) -> InterceptorChain {
        if let Some(chain) = self.chains.get(&member.token) {
            return chain.clone();
        }

        // The selector runs outside the map shard lock, it is user code
        let chain = resolve_interceptors(selector, declaring_type, member, interceptors);
        self.chains.entry(member.token).or_insert(chain).clone()
    }

    /// The cached chain of `token`, if selection already ran
    #[must_use]
    pub fn get(&self, token: MemberToken) -> Option<InterceptorChain> {
        self.chains.get(&token).map(|chain| chain.clone())
    }

    /// Number of members with a cached chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns true if no member has been selected for yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        interception::same_chain,
        test::{counting_interceptor, simple_class, sum_member},
    };

    struct Reversing {
        calls: AtomicUsize,
    }

    impl InterceptorSelector for Reversing {
        fn select_interceptors(
            &self,
            _declaring_type: &TypeRef,
            _member: &MethodMember,
            interceptors: &[InterceptorRef],
        ) -> Option<Vec<InterceptorRef>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(interceptors.iter().rev().cloned().collect())
        }
    }

    struct Nothing;

    impl InterceptorSelector for Nothing {
        fn select_interceptors(
            &self,
            _declaring_type: &TypeRef,
            _member: &MethodMember,
            _interceptors: &[InterceptorRef],
        ) -> Option<Vec<InterceptorRef>> {
            None
        }
    }

    #[test]
    fn selection_runs_once_per_member() {
        let (first, _) = counting_interceptor();
        let (second, _) = counting_interceptor();
        let all = vec![first.clone(), second.clone()];
        let selector = Reversing {
            calls: AtomicUsize::new(0),
        };
        let cache = SelectorCache::new();
        let member = sum_member();

        let chain = cache.get_or_select(&selector, &simple_class(), &member, &all);
        let again = cache.get_or_select(&selector, &simple_class(), &member, &all);

        assert!(same_chain(&chain, &[second, first]));
        assert!(Arc::ptr_eq(&chain, &again));
        assert_eq!(selector.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(member.token).is_some());
    }

    #[test]
    fn none_means_no_interceptors() {
        let (first, _) = counting_interceptor();
        let chain = resolve_interceptors(&Nothing, &simple_class(), &sum_member(), &[first]);
        assert!(chain.is_empty());
    }
}
