//! Benchmarks for the call path of proxies.
//!
//! Measures the overhead of interception for:
//! - Calls without interceptors
//! - Interceptor chains of growing length
//! - Calls going through a cached selector
//! - Generic members, with and without a closure cache

extern crate dynproxy;

use criterion::{criterion_group, criterion_main, Criterion};
use dynproxy::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

const SUM: MemberToken = MemberToken(0x0600_0001);
const WRAP: MemberToken = MemberToken(0x0600_0002);

fn calculator() -> TypeRef {
    TypeInfo::class("Acme", "Calculator").into_ref()
}

fn sum_member() -> MemberRef {
    MethodMember::new(SUM, calculator(), "Sum")
        .returns(TypeSig::primitive(PrimitiveKind::Int32))
        .parameter("a", TypeSig::primitive(PrimitiveKind::Int32))
        .parameter("b", TypeSig::primitive(PrimitiveKind::Int32))
        .into_ref()
}

fn wrap_member() -> MemberRef {
    MethodMember::new(WRAP, calculator(), "Wrap")
        .generic_param("T")
        .returns(TypeSig::SzArray(Box::new(TypeSig::MethodParam(0))))
        .parameter("item", TypeSig::MethodParam(0))
        .into_ref()
}

fn sum_implementation() -> TargetMethod {
    target_method(|_, invocation| {
        let a = invocation.get_argument(0)?.as_i4().unwrap_or_default();
        let b = invocation.get_argument(1)?.as_i4().unwrap_or_default();
        Ok(Value::I4(a + b))
    })
}

fn passthrough() -> InterceptorRef {
    FnInterceptor::shared(|invocation: &mut Invocation| invocation.proceed())
}

fn calculator_proxy(interceptors: usize, options: ProxyGenerationOptions) -> ProxyInstance {
    ProxyBuilder::class_proxy(calculator())
        .options(options)
        .interceptors((0..interceptors).map(|_| passthrough()))
        .member(sum_member(), sum_implementation())
        .build()
        .unwrap()
}

/// Keeps every interceptor
struct KeepAll;

impl InterceptorSelector for KeepAll {
    fn select_interceptors(
        &self,
        _declaring_type: &TypeRef,
        _member: &MethodMember,
        interceptors: &[InterceptorRef],
    ) -> Option<Vec<InterceptorRef>> {
        Some(interceptors.to_vec())
    }
}

/// Benchmark a call that reaches the base implementation directly.
fn bench_call_no_interceptors(c: &mut Criterion) {
    let proxy = calculator_proxy(0, ProxyGenerationOptions::default());

    c.bench_function("proceed_no_interceptors", |b| {
        b.iter(|| {
            let value = proxy
                .invoke(SUM, black_box(vec![Value::I4(2), Value::I4(3)]))
                .unwrap();
            black_box(value)
        });
    });
}

/// Benchmark a call through a single pass-through interceptor.
fn bench_call_one_interceptor(c: &mut Criterion) {
    let proxy = calculator_proxy(1, ProxyGenerationOptions::default());

    c.bench_function("proceed_one_interceptor", |b| {
        b.iter(|| {
            let value = proxy
                .invoke(SUM, black_box(vec![Value::I4(2), Value::I4(3)]))
                .unwrap();
            black_box(value)
        });
    });
}

/// Benchmark a call through eight pass-through interceptors.
fn bench_call_eight_interceptors(c: &mut Criterion) {
    let proxy = calculator_proxy(8, ProxyGenerationOptions::default());

    c.bench_function("proceed_eight_interceptors", |b| {
        b.iter(|| {
            let value = proxy
                .invoke(SUM, black_box(vec![Value::I4(2), Value::I4(3)]))
                .unwrap();
            black_box(value)
        });
    });
}

/// Benchmark a call whose chain comes from the selector cache.
fn bench_call_selected(c: &mut Criterion) {
    let options = ProxyGenerationOptions::default().with_selector(Arc::new(KeepAll));
    let proxy = calculator_proxy(4, options);

    c.bench_function("proceed_selected_four_interceptors", |b| {
        b.iter(|| {
            let value = proxy
                .invoke(SUM, black_box(vec![Value::I4(2), Value::I4(3)]))
                .unwrap();
            black_box(value)
        });
    });
}

/// Benchmark closing a generic member on every call.
/// Method: T[] Wrap<T>(T item)
fn bench_generic_uncached(c: &mut Criterion) {
    let proxy = ProxyBuilder::class_proxy(calculator())
        .interceptor(FnInterceptor::shared(|invocation: &mut Invocation| {
            let concrete = invocation.concrete_method()?;
            invocation.set_return_value(Value::Type(concrete.return_type.clone()));
            Ok(())
        }))
        .abstract_member(wrap_member())
        .build()
        .unwrap();
    let int32 = TypeInfo::primitive(PrimitiveKind::Int32);

    c.bench_function("proceed_generic_uncached", |b| {
        b.iter(|| {
            let value = proxy
                .invoke_generic(WRAP, black_box(vec![int32.clone()]), vec![Value::I4(1)])
                .unwrap();
            black_box(value)
        });
    });
}

/// Benchmark a generic member backed by a closure cache.
/// Method: T[] Wrap<T>(T item)
fn bench_generic_cached(c: &mut Criterion) {
    let proxy = ProxyBuilder::class_proxy(calculator())
        .interceptor(FnInterceptor::shared(|invocation: &mut Invocation| {
            let concrete = invocation.concrete_method()?;
            invocation.set_return_value(Value::Type(concrete.return_type.clone()));
            Ok(())
        }))
        .abstract_member(wrap_member())
        .closure_cache(Arc::new(GenericClosureCache::new()))
        .build()
        .unwrap();
    let int32 = TypeInfo::primitive(PrimitiveKind::Int32);

    c.bench_function("proceed_generic_cached", |b| {
        b.iter(|| {
            let value = proxy
                .invoke_generic(WRAP, black_box(vec![int32.clone()]), vec![Value::I4(1)])
                .unwrap();
            black_box(value)
        });
    });
}

criterion_group!(
    benches,
    // Interceptor chains
    bench_call_no_interceptors,
    bench_call_one_interceptor,
    bench_call_eight_interceptors,
    bench_call_selected,
    // Generic members
    bench_generic_uncached,
    bench_generic_cached,
);
criterion_main!(benches);
