//! Mixin composition.
//!
//! A mixin is an extra object whose interfaces the proxy exposes. [`MixinData`] maps every
//! interface contributed by the registered mixins to the single mixin implementing it, and
//! gives each interface a stable position used by the dispatch table.
//!
//! # Rules
//!
//! - Mixins whose runtime type implements no interface contribute nothing and are ignored.
//! - Two mixins contributing the same interface is a configuration error, it would make
//!   dispatch ambiguous.
//! - Interfaces are ordered by full name, so positions do not depend on registration order.
//! - Two `MixinData` are equal if they hold the same interfaces mapped to mixins of the same
//!   runtime types; instance identity does not matter.

use std::hash::{Hash, Hasher};

use crate::{
    model::{
        types::{TypeInfo, TypeRef},
        value::{ObjectRef, Value},
    },
    Error, Result,
};

/// One interface and the mixin implementing it
#[derive(Debug, Clone)]
struct MixinEntry {
    interface: TypeRef,
    mixin: ObjectRef,
}

/// Interface to mixin mapping computed from a set of mixin instances.
#[derive(Debug, Clone, Default)]
pub struct MixinData {
    entries: Vec<MixinEntry>,
}

impl MixinData {
    /// Computes the mapping of `mixins`.
    ///
    /// # Errors
    /// - [`Error::NullArgument`] if a mixin is null
    /// - [`Error::InvalidMixinConfiguration`] if two mixins contribute the same interface
    pub fn new<'a>(mixins: impl IntoIterator<Item = &'a Value>) -> Result<Self> {
        let mut entries: Vec<MixinEntry> = Vec::new();

        for value in mixins {
            let mixin = match value {
                Value::Object(mixin) => mixin,
                Value::Null | Value::Void => return Err(Error::NullArgument("mixin")),
                // Primitive values implement no interface the proxy could expose
                _ => continue,
            };

            let interfaces = mixin.runtime_type().all_interfaces();
            if interfaces.is_empty() {
                tracing::debug!(
                    mixin = %mixin.runtime_type().fullname(),
                    "mixin implements no interface and is ignored"
                );
                continue;
            }

            for interface in interfaces {
                if let Some(existing) = entries.iter().find(|e| e.interface == interface) {
                    return Err(Error::InvalidMixinConfiguration {
                        interface: interface.fullname(),
                        first: existing.mixin.runtime_type().fullname(),
                        second: mixin.runtime_type().fullname(),
                    });
                }

                entries.push(MixinEntry {
                    interface,
                    mixin: mixin.clone(),
                });
            }
        }

        entries.sort_by_cached_key(|entry| entry.interface.fullname());

        tracing::debug!(interfaces = entries.len(), "mixin data computed");
        Ok(MixinData { entries })
    }

    /// Number of mixed-in interfaces
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no interface is mixed in
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The mixed-in interfaces, ordered by full name
    pub fn mixin_interfaces(&self) -> impl Iterator<Item = &TypeRef> {
        self.entries.iter().map(|entry| &entry.interface)
    }

    /// The mixin of every interface, in the order of [`MixinData::mixin_interfaces`]. A mixin
    /// contributing several interfaces is yielded once per interface.
    pub fn mixins(&self) -> impl Iterator<Item = &ObjectRef> {
        self.entries.iter().map(|entry| &entry.mixin)
    }

    /// Position of `interface` in the ordered interface list
    #[must_use]
    pub fn mixin_position(&self, interface: &TypeInfo) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| *entry.interface == *interface)
    }

    /// Returns true if some mixin contributes `interface`
    #[must_use]
    pub fn contains_mixin(&self, interface: &TypeInfo) -> bool {
        self.mixin_position(interface).is_some()
    }

    /// The mixin contributing `interface`
    #[must_use]
    pub fn mixin_for(&self, interface: &TypeInfo) -> Option<&ObjectRef> {
        self.mixin_position(interface)
            .map(|position| &self.entries[position].mixin)
    }

    /// The mixin at `position`
    #[must_use]
    pub fn mixin_at(&self, position: usize) -> Option<&ObjectRef> {
        self.entries.get(position).map(|entry| &entry.mixin)
    }
}

impl PartialEq for MixinData {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().zip(&other.entries).all(|(left, right)| {
                left.interface == right.interface
                    && left.mixin.runtime_type() == right.mixin.runtime_type()
            })
    }
}

impl Eq for MixinData {}

impl Hash for MixinData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.len().hash(state);
        for entry in &self.entries {
            entry.interface.hash(state);
            entry.mixin.runtime_type().hash(state);
        }
    }
}
