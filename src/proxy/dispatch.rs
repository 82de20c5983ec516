//! Per-member dispatch decisions of a built proxy type.

use std::collections::HashMap;
use std::fmt;

use strum::{Display, EnumIter};

use crate::{
    interception::TargetMethod,
    model::{member::MemberRef, token::MemberToken},
};

/// The flavor of a proxy, deciding where the real implementation of a member lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ProxyKind {
    /// Subclass of the proxied class, proceeds to the base implementation
    Class,
    /// Implements an interface and forwards to a fixed target object
    InterfaceWithTarget,
    /// Implements an interface and forwards to a target that interceptors may replace
    InterfaceWithTargetInterface,
    /// Implements an interface without any target, interceptors provide every result
    InterfaceWithoutTarget,
}

impl ProxyKind {
    /// True for the interface flavors
    #[must_use]
    pub fn is_interface_proxy(self) -> bool {
        self != ProxyKind::Class
    }

    /// True for the flavors forwarding to a distinct target object
    #[must_use]
    pub fn has_target(self) -> bool {
        matches!(
            self,
            ProxyKind::InterfaceWithTarget | ProxyKind::InterfaceWithTargetInterface
        )
    }

    /// True if interceptors may retarget invocations of this flavor
    #[must_use]
    pub fn allows_retargeting(self) -> bool {
        self == ProxyKind::InterfaceWithTargetInterface
    }
}

/// How calls of one member are dispatched
#[derive(Clone)]
pub struct DispatchEntry {
    /// The member
    pub member: MemberRef,
    /// The real implementation: base member, target member or mixin member. `None` for
    /// abstract members and for proxies without target.
    pub implementation: Option<TargetMethod>,
    /// True if calls go through the interceptor chain
    pub intercepted: bool,
    /// Position of the mixin implementing the member, for mixin interface members
    pub mixin_position: Option<usize>,
}

impl fmt::Debug for DispatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchEntry")
            .field("member", &self.member.to_string())
            .field("has_implementation", &self.implementation.is_some())
            .field("intercepted", &self.intercepted)
            .field("mixin_position", &self.mixin_position)
            .finish()
    }
}

/// Member token to dispatch entry map of a proxy type
#[derive(Debug, Default, Clone)]
pub struct DispatchTable {
    entries: HashMap<MemberToken, DispatchEntry>,
}

impl DispatchTable {
    /// Creates an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry of the entry's member
    pub fn insert(&mut self, entry: DispatchEntry) {
        self.entries.insert(entry.member.token, entry);
    }

    /// The entry of `token`
    #[must_use]
    pub fn get(&self, token: MemberToken) -> Option<&DispatchEntry> {
        self.entries.get(&token)
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no member
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &DispatchEntry> {
        self.entries.values()
    }

    /// Number of members going through the interceptor chain
    #[must_use]
    pub fn intercepted_count(&self) -> usize {
        self.iter().filter(|entry| entry.intercepted).count()
    }
}
