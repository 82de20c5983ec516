//! Member tokens, the stable identities of proxied members.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Table byte used for method members
pub const TABLE_METHOD: u8 = 0x06;
/// Table byte used for property accessors
pub const TABLE_PROPERTY: u8 = 0x17;
/// Table byte used for event accessors
pub const TABLE_EVENT: u8 = 0x14;

/// Stable identity of a proxied member.
///
/// Like a metadata token, a member token consists of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the member table (method, property, event)
/// - The low 24 bits (bits 0-23) indicate the row within that table
///
/// The member catalog hands out one token per member; the token is what per-proxy caches
/// and dispatch tables are keyed by.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemberToken(pub u32);

impl MemberToken {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        MemberToken(value)
    }

    /// Creates a method token for the given row
    #[must_use]
    pub fn method(row: u32) -> Self {
        MemberToken((u32::from(TABLE_METHOD) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for MemberToken {
    fn from(value: u32) -> Self {
        MemberToken(value)
    }
}

impl From<MemberToken> for u32 {
    fn from(token: MemberToken) -> Self {
        token.0
    }
}

impl fmt::Debug for MemberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemberToken(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for MemberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for MemberToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
