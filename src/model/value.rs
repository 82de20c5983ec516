//! Dynamic values flowing through an invocation.
//!
//! Arguments, return values, targets and mixins are all represented as [`Value`]s. Objects
//! are carried as [`ObjectRef`] handles which pair the instance with its runtime type, the
//! equivalent of asking an object for its type at runtime.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::model::types::{PrimitiveKind, TypeInfo, TypeRef};

/// Shared handle to an object together with its runtime type.
///
/// Equality is reference equality: two handles are equal only if they point at the same
/// instance.
#[derive(Clone)]
pub struct ObjectRef {
    runtime_type: TypeRef,
    instance: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wraps `instance` with the given runtime type
    pub fn new<T: Any + Send + Sync>(runtime_type: TypeRef, instance: T) -> Self {
        ObjectRef {
            runtime_type,
            instance: Arc::new(instance),
        }
    }

    /// Wraps an already shared instance
    pub fn from_arc(runtime_type: TypeRef, instance: Arc<dyn Any + Send + Sync>) -> Self {
        ObjectRef {
            runtime_type,
            instance,
        }
    }

    /// The runtime type of the object
    #[must_use]
    pub fn runtime_type(&self) -> &TypeRef {
        &self.runtime_type
    }

    /// Access the instance as a concrete Rust type
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }

    /// Returns true if both handles refer to the same instance
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }

    /// Returns true if the runtime type is, inherits from or implements `ty`
    #[must_use]
    pub fn is_instance_of(&self, ty: &TypeInfo) -> bool {
        self.runtime_type.implements(ty)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ObjectRef({} @ {:p})",
            self.runtime_type.fullname(),
            Arc::as_ptr(&self.instance)
        )
    }
}

/// A dynamically typed value: an argument, a return value, a mixin or a target.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value, the return value of `void` members and of calls not yet completed
    #[default]
    Void,
    /// The null reference
    Null,
    /// `System.Boolean`
    Boolean(bool),
    /// `System.Char`
    Char(char),
    /// `System.Int32`
    I4(i32),
    /// `System.Int64`
    I8(i64),
    /// `System.Double`
    R8(f64),
    /// `System.String`
    String(String),
    /// A type used as a value
    Type(TypeRef),
    /// Any other object
    Object(ObjectRef),
}

impl Value {
    /// Returns true for [`Value::Null`] and [`Value::Void`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Void)
    }

    /// The runtime type of the value, `None` for null and void
    #[must_use]
    pub fn runtime_type(&self) -> Option<TypeRef> {
        let kind = match self {
            Value::Void | Value::Null => return None,
            Value::Object(object) => return Some(object.runtime_type().clone()),
            Value::Boolean(_) => PrimitiveKind::Boolean,
            Value::Char(_) => PrimitiveKind::Char,
            Value::I4(_) => PrimitiveKind::Int32,
            Value::I8(_) => PrimitiveKind::Int64,
            Value::R8(_) => PrimitiveKind::Double,
            Value::String(_) => PrimitiveKind::String,
            Value::Type(_) => return Some(TypeInfo::class("System", "Type").into_ref()),
        };
        Some(TypeInfo::primitive(kind))
    }

    /// Returns the contained `Int32`
    #[must_use]
    pub fn as_i4(&self) -> Option<i32> {
        match self {
            Value::I4(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the contained `Int64`
    #[must_use]
    pub fn as_i8(&self) -> Option<i64> {
        match self {
            Value::I8(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the contained `Boolean`
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the contained string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the contained object
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I4(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I8(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::R8(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<Option<ObjectRef>> for Value {
    fn from(value: Option<ObjectRef>) -> Self {
        value.map_or(Value::Null, Value::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);

    #[test]
    fn object_refs_compare_by_identity() {
        let ty = TypeInfo::class("Acme", "Counter").into_ref();
        let first = ObjectRef::new(ty.clone(), Counter(1));
        let alias = first.clone();
        let second = ObjectRef::new(ty, Counter(1));

        assert_eq!(first, alias);
        assert_ne!(first, second);
        assert_eq!(first.downcast_ref::<Counter>().map(|c| c.0), Some(1));
        assert!(first.downcast_ref::<String>().is_none());
    }

    #[test]
    fn runtime_types_of_primitives() {
        assert_eq!(
            Value::I4(3).runtime_type().map(|t| t.fullname()),
            Some("System.Int32".to_string())
        );
        assert_eq!(
            Value::from("x").runtime_type().map(|t| t.fullname()),
            Some("System.String".to_string())
        );
        assert!(Value::Null.runtime_type().is_none());
        assert!(Value::Void.runtime_type().is_none());
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::from(7).as_i4(), Some(7));
        assert_eq!(Value::from(7_i64).as_i8(), Some(7));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(None::<ObjectRef>), Value::Null);
        assert!(Value::default().is_null());
    }
}
