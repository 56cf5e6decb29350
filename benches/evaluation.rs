use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use evalix_rs::evaluate_expression;
use evalix_rs::functions::default_builder;

/// Benchmark simple arithmetic expressions
fn benchmark_simple_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simple arithmetic Expression Evaluation");

    let builder = default_builder();
    let expr = "2 + 3 * 4";
    let prebuilt = builder.build(expr).unwrap();

    group.bench_function("one_shot_arithmetic", |b| {
        b.iter(|| evaluate_expression(black_box(expr), &black_box(HashMap::new())).unwrap())
    });

    group.bench_function("prebuilt_arithmetic", |b| {
        b.iter(|| black_box(&prebuilt).evaluate().unwrap())
    });

    group.bench_function("native_rust_arithmetic", |b| {
        b.iter(|| black_box(2.0 + 3.0 * 4.0))
    });
}

/// Benchmark complex arithmetic expressions
fn benchmark_complex_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("Complex arithmetic Expression Evaluation");

    let builder = default_builder();
    let expr = "(10 + 20) * 3 / (4 - 1) + 5 ^ 2";
    let prebuilt = builder.build(expr).unwrap();

    group.bench_function("one_shot_complex_arithmetic", |b| {
        b.iter(|| evaluate_expression(black_box(expr), &black_box(HashMap::new())).unwrap())
    });

    group.bench_function("prebuilt_complex_arithmetic", |b| {
        b.iter(|| black_box(&prebuilt).evaluate().unwrap())
    });

    group.bench_function("native_rust_complex_arithmetic", |b| {
        b.iter(|| black_box((10.0 + 20.0) * 3.0 / (4.0 - 1.0) + 5.0f64.powf(2.0)))
    });
}

/// Benchmark expressions over variable bindings
fn benchmark_variable_bindings(c: &mut Criterion) {
    let mut group = c.benchmark_group("Variable Binding Evaluation");

    let builder = default_builder();
    let expr = "if(price > 100, price * rate, 0)";
    let prebuilt = builder.build(expr).unwrap();
    let bindings = HashMap::from([
        ("price".to_string(), 120.0),
        ("rate".to_string(), 0.2),
    ]);

    group.bench_function("prebuilt_with_bindings", |b| {
        b.iter(|| prebuilt.evaluate_with(black_box(&bindings)).unwrap())
    });

    group.bench_function("native_rust_with_bindings", |b| {
        b.iter(|| {
            let (price, rate) = (120.0, 0.2);
            black_box(if price > 100.0 { price * rate } else { 0.0 })
        })
    });
}

/// Benchmark function calls
fn benchmark_function_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("Function Call Evaluation");

    let builder = default_builder();
    let expr = "max(sqrt(16), abs(-3), 2)";
    let prebuilt = builder.build(expr).unwrap();

    group.bench_function("one_shot_function_call", |b| {
        b.iter(|| evaluate_expression(black_box(expr), &black_box(HashMap::new())).unwrap())
    });

    group.bench_function("prebuilt_function_call", |b| {
        b.iter(|| black_box(&prebuilt).evaluate().unwrap())
    });

    group.bench_function("native_rust_function_call", |b| {
        b.iter(|| black_box(16.0f64.sqrt().max((-3.0f64).abs()).max(2.0)))
    });
}

/// Grouping benchmarks
criterion_group!(
    benches,
    benchmark_simple_arithmetic,
    benchmark_complex_arithmetic,
    benchmark_variable_bindings,
    benchmark_function_calls,
);
criterion_main!(benches);
