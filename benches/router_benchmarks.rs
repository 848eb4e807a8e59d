//! Criterion benchmarks for log_router

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use log_router::prelude::*;
use std::sync::Arc;

fn quiet_registry() -> Registry {
    Registry::builder().last_resort(None).build().unwrap()
}

/// Discards output so long runs measure routing, not buffer growth
struct NullSink;

impl Sink for NullSink {
    fn write(&mut self, text: &str) -> log_router::Result<()> {
        black_box(text);
        Ok(())
    }

    fn flush(&mut self) -> log_router::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn null_handler(template: &str) -> Arc<Handler> {
    Handler::builder(NullSink)
        .formatter(TemplateFormatter::new(template).unwrap())
        .build()
}

// ============================================================================
// Logger Lookup Benchmarks
// ============================================================================

fn bench_logger_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("logger_lookup");
    group.throughput(Throughput::Elements(1));

    let registry = quiet_registry();
    registry.get_logger("app.service.db").unwrap();

    group.bench_function("existing", |b| {
        b.iter(|| black_box(registry.get_logger(black_box("app.service.db")).unwrap()));
    });

    group.bench_function("fresh_registry_deep_name", |b| {
        b.iter(|| {
            let registry = quiet_registry();
            black_box(registry.get_logger("a.b.c.d.e").unwrap())
        });
    });

    group.finish();
}

// ============================================================================
// Level Gating Benchmarks
// ============================================================================

fn bench_level_gating(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_gating");
    group.throughput(Throughput::Elements(1));

    let registry = quiet_registry();
    let logger = registry.get_logger("app.service").unwrap();
    registry.root().set_level(Level::Warning);
    logger.add_handler(null_handler("{message}")).unwrap();

    group.bench_function("below_threshold", |b| {
        b.iter(|| logger.debug(black_box("dropped before a record exists")));
    });

    group.bench_function("below_threshold_macro", |b| {
        b.iter(|| log_router::debug!(logger, "value {}", black_box(42)));
    });

    group.bench_function("above_threshold", |b| {
        b.iter(|| logger.error(black_box("emitted")));
    });

    group.finish();
}

// ============================================================================
// Propagation Benchmarks
// ============================================================================

fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation");
    group.throughput(Throughput::Elements(1));

    let registry = quiet_registry();
    registry.root().set_level(Level::Debug);
    let leaf = registry.get_logger("a.b.c.d").unwrap();
    for name in ["a", "a.b", "a.b.c", "a.b.c.d"] {
        registry
            .get_logger(name)
            .unwrap()
            .add_handler(null_handler("{name} {message}"))
            .unwrap();
    }

    group.bench_function("four_levels", |b| {
        b.iter(|| leaf.info(black_box("propagated")));
    });

    leaf.set_propagate(false);
    group.bench_function("stopped_at_leaf", |b| {
        b.iter(|| leaf.info(black_box("kept local")));
    });

    group.finish();
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatters(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatters");
    group.throughput(Throughput::Elements(1));

    let record = LogRecord::new(Level::Info, "app.http", Message::new("GET {} -> {}").arg("/users").arg(200))
        .with_extra(Extra::new().with("request_id", "req-123").with("latency_ms", 12));

    let template = TemplateFormatter::default();
    group.bench_function("template", |b| {
        b.iter(|| black_box(template.format(black_box(&record))));
    });

    let json = JsonFormatter::new();
    group.bench_function("json", |b| {
        b.iter(|| black_box(json.format(black_box(&record))));
    });

    let logfmt = LogfmtFormatter::new();
    group.bench_function("logfmt", |b| {
        b.iter(|| black_box(logfmt.format(black_box(&record))));
    });

    group.finish();
}

// ============================================================================
// Concurrency Benchmarks
// ============================================================================

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");
    group.throughput(Throughput::Elements(400));

    let registry = quiet_registry();
    let logger = registry.get_logger("workers").unwrap();
    logger.set_level(Level::Info);
    logger.add_handler(null_handler("{message}")).unwrap();

    group.bench_function("multi_thread_4", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let logger = logger.clone();
                    std::thread::spawn(move || {
                        for _ in 0..100 {
                            logger.info("concurrent");
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_logger_lookup,
    bench_level_gating,
    bench_propagation,
    bench_formatters,
    bench_concurrent_logging,
);
criterion_main!(benches);
