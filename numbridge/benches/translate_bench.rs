//! Benchmarks for the host boundary.
//!
//! Measures the overhead a guarded call adds on the success path and the cost
//! of building host exceptions on the failure paths, against the mock host.
//! Run with: cargo bench -p numbridge
//!
//! Performance targets:
//! - guard, successful call: within a few ns of the bare call
//! - guard, native error: dominated by message formatting

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use numbridge::mocks::{MockExceptionType, MockHost, MockModule};
use numbridge::{BoundaryTranslator, BridgeConfig, ErrorKind, ExceptionRegistry, NativeError};

// ============================================================================
// Helper Functions
// ============================================================================

fn setup(config: &BridgeConfig) -> (MockHost, ExceptionRegistry<MockExceptionType>) {
    let host = MockHost::new();
    let module = MockModule::new(config.module_name.clone());
    let registry = ExceptionRegistry::initialize(&host, &module, config).unwrap();
    (host, registry)
}

/// Build an error with `depth` nested sources below it.
fn nested_error(depth: usize) -> NativeError {
    (0..depth).fold(NativeError::out_of_memory("cannot allocate 4096 bytes"), |inner, level| {
        NativeError::backend(format!("kernel stage {level} failed")).with_source(inner)
    })
}

// ============================================================================
// Guard Benchmarks
// ============================================================================

fn bench_guard_ok(c: &mut Criterion) {
    let config = BridgeConfig::default();
    let (host, registry) = setup(&config);

    let mut group = c.benchmark_group("guard_ok");
    for catch_panics in [true, false] {
        let config = config.clone().with_panic_capture(catch_panics);
        let translator = BoundaryTranslator::new(&registry, &config);

        group.bench_function(BenchmarkId::new("catch_panics", catch_panics), |b| {
            b.iter(|| {
                translator
                    .guard(&host, || Ok::<_, NativeError>(black_box(42u64)))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_guard_native_error(c: &mut Criterion) {
    let config = BridgeConfig::default();
    let (host, registry) = setup(&config);
    let translator = BoundaryTranslator::new(&registry, &config);

    let mut group = c.benchmark_group("guard_native_error");
    for kind in [ErrorKind::Dimension, ErrorKind::Device, ErrorKind::OutOfMemory] {
        group.bench_function(BenchmarkId::from_parameter(kind), |b| {
            b.iter(|| {
                let err = translator
                    .guard(&host, || -> Result<(), _> {
                        Err(NativeError::new(kind, "shapes (2,3) and (4,5) are incompatible"))
                    })
                    .unwrap_err();
                black_box(err)
            })
        });
    }
    group.finish();
}

fn bench_guard_foreign_error(c: &mut Criterion) {
    let config = BridgeConfig::default();
    let (host, registry) = setup(&config);
    let translator = BoundaryTranslator::new(&registry, &config);

    c.bench_function("guard_foreign_error", |b| {
        b.iter(|| {
            let err = translator
                .guard(&host, || -> Result<(), _> { Err(std::io::Error::other("unexpected backend fault")) })
                .unwrap_err();
            black_box(err)
        })
    });
}

// ============================================================================
// Cause Chain Benchmarks
// ============================================================================

fn bench_translate_cause_chain(c: &mut Criterion) {
    let config = BridgeConfig::default();
    let (host, registry) = setup(&config);
    let translator = BoundaryTranslator::new(&registry, &config);

    let mut group = c.benchmark_group("translate_cause_chain");
    for depth in [0usize, 4, 16, 64] {
        let err = nested_error(depth);
        group.bench_with_input(BenchmarkId::new("depth", depth), &err, |b, err| {
            b.iter(|| black_box(translator.translate(&host, black_box(err))))
        });
    }
    group.finish();
}

criterion_group!(
    name = guard;
    config = Criterion::default();
    targets = bench_guard_ok, bench_guard_native_error, bench_guard_foreign_error
);

criterion_group!(
    name = causes;
    config = Criterion::default();
    targets = bench_translate_cause_chain
);

criterion_main!(guard, causes);
