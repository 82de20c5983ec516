//! Integration tests for calls of open generic members.

use dynproxy::prelude::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

const WRAP: MemberToken = MemberToken(0x0600_0001);

fn container() -> TypeRef {
    TypeInfo::interface("Acme", "IContainer").into_ref()
}

/// `T[] IContainer.Wrap<T>(T item)`
fn wrap_member() -> MemberRef {
    MethodMember::new(WRAP, container(), "Wrap")
        .generic_param("T")
        .returns(TypeSig::SzArray(Box::new(TypeSig::MethodParam(0))))
        .parameter("item", TypeSig::MethodParam(0))
        .into_ref()
}

/// Builds a proxy without target whose interceptor records the concrete return type of every
/// call and answers with the item's type name
fn recording_proxy(seen: Arc<Mutex<Vec<String>>>, cache: Option<Arc<GenericClosureCache>>) -> Result<ProxyInstance> {
    let recorder = FnInterceptor::shared(move |invocation: &mut Invocation| {
        let concrete = invocation.concrete_method()?;
        seen.lock().unwrap().push(concrete.return_type.fullname());
        invocation.set_return_value(Value::from(concrete.parameter_types[0].fullname()));
        Ok(())
    });

    let mut builder = ProxyBuilder::interface_proxy_without_target(container())
        .interceptor(recorder)
        .abstract_member(wrap_member());
    if let Some(cache) = cache {
        builder = builder.closure_cache(cache);
    }
    builder.build()
}

/// Each call closes the member over its own witnesses.
#[test]
fn test_witnesses_per_call() -> Result<()> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let proxy = recording_proxy(seen.clone(), None)?;

    let int32 = TypeInfo::primitive(PrimitiveKind::Int32);
    let string = TypeInfo::primitive(PrimitiveKind::String);

    let first = proxy.invoke_generic(WRAP, vec![int32], vec![Value::I4(7)])?;
    let second = proxy.invoke_generic(WRAP, vec![string], vec![Value::from("seven")])?;

    assert_eq!(first, Value::from("System.Int32"));
    assert_eq!(second, Value::from("System.String"));
    assert_eq!(*seen.lock().unwrap(), ["System.Int32[]", "System.String[]"]);
    Ok(())
}

/// A generic member called without witnesses is rejected before the chain runs.
#[test]
fn test_missing_witnesses() -> Result<()> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let proxy = recording_proxy(seen.clone(), None)?;

    let error = proxy.invoke(WRAP, vec![Value::I4(7)]).unwrap_err();
    assert!(matches!(error, Error::GenericArguments(_)));
    assert_eq!(error.kind(), ErrorKind::Usage);
    assert!(seen.lock().unwrap().is_empty());
    Ok(())
}

/// The number of witnesses has to match the member's generic parameters.
#[test]
fn test_witness_arity() -> Result<()> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let proxy = recording_proxy(seen, None)?;

    let int32 = TypeInfo::primitive(PrimitiveKind::Int32);
    let error = proxy
        .invoke_generic(WRAP, vec![int32.clone(), int32], vec![Value::I4(7)])
        .unwrap_err();

    match error {
        Error::GenericArity { expected, found, .. } => {
            assert_eq!(expected, 1);
            assert_eq!(found, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

/// An injected closure cache is shared by the invocations of the proxy.
#[test]
fn test_shared_closure_cache() -> Result<()> {
    let cache = Arc::new(GenericClosureCache::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let proxy = recording_proxy(seen.clone(), Some(cache.clone()))?;

    let int32 = TypeInfo::primitive(PrimitiveKind::Int32);
    let string = TypeInfo::primitive(PrimitiveKind::String);

    proxy.invoke_generic(WRAP, vec![int32.clone()], vec![Value::I4(1)])?;
    proxy.invoke_generic(WRAP, vec![int32.clone()], vec![Value::I4(2)])?;
    assert_eq!(cache.len(), 1);

    proxy.invoke_generic(WRAP, vec![string], vec![Value::from("three")])?;
    assert_eq!(cache.len(), 2);

    let closed = cache.get_or_close(&wrap_member(), &[int32.clone()])?;
    assert!(closed.is_closed_over(&[int32]));
    assert_eq!(seen.lock().unwrap().len(), 3);
    Ok(())
}

/// Witnesses can also be set on the invocation before the chain starts.
#[test]
fn test_witnesses_set_on_invocation() -> Result<()> {
    let proxy = ObjectRef::new(container(), ());
    let int32 = TypeInfo::primitive(PrimitiveKind::Int32);

    let mut invocation = Invocation::builder(proxy, wrap_member())
        .arguments(vec![Value::I4(3)])
        .interceptors(vec![FnInterceptor::shared(|invocation: &mut Invocation| {
            let concrete = invocation.concrete_method()?;
            invocation.set_return_value(Value::from(concrete.return_type.fullname()));
            Ok(())
        })])
        .build()?;

    invocation.set_generic_arguments(vec![int32.clone()])?;
    assert!(invocation.set_generic_arguments(vec![int32]).is_err());

    invocation.proceed()?;
    assert_eq!(invocation.return_value(), &Value::from("System.Int32[]"));
    Ok(())
}

/// The base implementation of a class proxy sees the member closed over each call's witnesses.
#[test]
fn test_implementation_sees_concrete_member() -> Result<()> {
    let storage = TypeInfo::class("Acme", "Storage").into_ref();
    let wrap = MethodMember::new(WRAP, storage.clone(), "Wrap")
        .generic_param("T")
        .returns(TypeSig::SzArray(Box::new(TypeSig::MethodParam(0))))
        .parameter("item", TypeSig::MethodParam(0))
        .into_ref();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let proxy = ProxyBuilder::class_proxy(storage)
        .interceptor(FnInterceptor::shared(|invocation: &mut Invocation| {
            invocation.proceed()
        }))
        .member(
            wrap,
            target_method(move |_, invocation| {
                counter.fetch_add(1, Ordering::SeqCst);
                let concrete = invocation.concrete_method()?;
                Ok(Value::from(concrete.return_type.fullname()))
            }),
        )
        .build()?;

    let int32 = TypeInfo::primitive(PrimitiveKind::Int32);
    let string = TypeInfo::primitive(PrimitiveKind::String);

    let first = proxy.invoke_generic(WRAP, vec![int32], vec![Value::I4(7)])?;
    let second = proxy.invoke_generic(WRAP, vec![string], vec![Value::from("seven")])?;

    assert_eq!(first, Value::from("System.Int32[]"));
    assert_eq!(second, Value::from("System.String[]"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}
