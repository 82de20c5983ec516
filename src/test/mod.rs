//! Shared fixtures: sample types, members and interceptors.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::{
    interception::{FnInterceptor, InterceptorRef, Invocation},
    model::{
        member::{MemberRef, MethodMember},
        signature::TypeSig,
        token::MemberToken,
        types::{PrimitiveKind, TypeInfo, TypeRef},
        value::{ObjectRef, Value},
    },
};

pub fn int32() -> TypeRef {
    TypeInfo::primitive(PrimitiveKind::Int32)
}

pub fn string() -> TypeRef {
    TypeInfo::primitive(PrimitiveKind::String)
}

/// `Acme.<name>` interface without members
pub fn named_interface(name: &str) -> TypeRef {
    TypeInfo::interface("Acme", name).into_ref()
}

/// `Acme.ICalc`
pub fn calc_interface() -> TypeRef {
    named_interface("ICalc")
}

/// `Acme.Calc : ICalc`
pub fn simple_class() -> TypeRef {
    TypeInfo::class("Acme", "Calc")
        .with_interfaces([calc_interface()])
        .into_ref()
}

/// `int ICalc.Sum(int a, int b)`
pub fn sum_member() -> MemberRef {
    MethodMember::new(MemberToken::method(1), calc_interface(), "Sum")
        .returns(TypeSig::primitive(PrimitiveKind::Int32))
        .parameter("a", TypeSig::primitive(PrimitiveKind::Int32))
        .parameter("b", TypeSig::primitive(PrimitiveKind::Int32))
        .into_ref()
}

/// `T[] ICalc.Wrap<T>(T item)`
pub fn wrap_member() -> MemberRef {
    MethodMember::new(MemberToken::method(2), calc_interface(), "Wrap")
        .generic_param("T")
        .returns(TypeSig::SzArray(Box::new(TypeSig::MethodParam(0))))
        .parameter("item", TypeSig::MethodParam(0))
        .into_ref()
}

pub fn object_of(runtime_type: TypeRef) -> ObjectRef {
    ObjectRef::new(runtime_type, ())
}

/// A mixin instance of class `Acme.<class_name>` implementing `interfaces`
pub fn mixin_of(class_name: &str, interfaces: &[TypeRef]) -> ObjectRef {
    let class = TypeInfo::class("Acme", class_name)
        .with_interfaces(interfaces.iter().cloned())
        .into_ref();
    object_of(class)
}

/// Proceeds once and counts its calls
pub fn counting_interceptor() -> (InterceptorRef, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let interceptor = FnInterceptor::shared(move |invocation: &mut Invocation| {
        counter.fetch_add(1, Ordering::SeqCst);
        invocation.proceed()
    });
    (interceptor, count)
}

/// Proceeds, then doubles an `Int32` return value
pub fn doubling_interceptor() -> InterceptorRef {
    FnInterceptor::shared(|invocation: &mut Invocation| {
        invocation.proceed()?;
        let value = invocation.return_value().as_i4().unwrap_or_default();
        invocation.set_return_value(Value::I4(value * 2));
        Ok(())
    })
}

/// Proceeds, then adds one to an `Int32` return value
pub fn add_one_interceptor() -> InterceptorRef {
    FnInterceptor::shared(|invocation: &mut Invocation| {
        invocation.proceed()?;
        let value = invocation.return_value().as_i4().unwrap_or_default();
        invocation.set_return_value(Value::I4(value + 1));
        Ok(())
    })
}

/// Sets `value` as the return value without proceeding
pub fn short_circuit_interceptor(value: Value) -> InterceptorRef {
    FnInterceptor::shared(move |invocation: &mut Invocation| {
        invocation.set_return_value(value.clone());
        Ok(())
    })
}

pub fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
