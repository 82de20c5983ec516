//! Object and member model shared by the interception pipeline.
//!
//! The pipeline does not enumerate or reflect over members itself, an external member catalog
//! does. This module holds the data the catalog hands over:
//!
//! - [`types`] - type descriptors ([`types::TypeInfo`], [`types::TypeRef`])
//! - [`token`] - stable member identities ([`token::MemberToken`])
//! - [`signature`] - member signatures which may still be generic ([`signature::TypeSig`])
//! - [`member`] - proxied member descriptors ([`member::MethodMember`])
//! - [`value`] - dynamic argument and return values ([`value::Value`], [`value::ObjectRef`])
//! - [`generic`] - closing open generic members over per-call witnesses

pub mod generic;
pub mod member;
pub mod signature;
pub mod token;
pub mod types;
pub mod value;
