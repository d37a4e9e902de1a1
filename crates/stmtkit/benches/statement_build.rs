use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Map, Value};
use std::sync::Arc;
use stmtkit::{
    Argument, BuilderConfig, ColumnDescriptor, SchemaRegistry, SelectSpec, ShapeSchema,
    Statements, TemplateCache, UserContext, WriteOptions,
};

/// A shape with an identity key and `n` plain columns `col0..col{n-1}`.
fn wide_shape(n: usize) -> ShapeSchema {
    let mut shape = ShapeSchema::new("Wide").column(ColumnDescriptor::new("Id").primary_key().identity());
    for i in 0..n {
        shape = shape.column(ColumnDescriptor::new(format!("col{i}")));
    }
    shape
}

fn args(n: usize) -> Map<String, Value> {
    let mut map = Map::with_capacity(n + 1);
    map.insert("Id".into(), Value::from(1));
    for i in 0..n {
        map.insert(format!("col{i}"), Value::from(i as i64));
    }
    map
}

fn statements(n: usize) -> Statements {
    let registry = SchemaRegistry::new().with_shape(wide_shape(n));
    Statements::new(Arc::new(registry), BuilderConfig::new())
}

fn bench_checkout(c: &mut Criterion) {
    let mut group = c.benchmark_group("template/checkout");

    for n in [5, 20, 100] {
        let cache = TemplateCache::new(Arc::new(SchemaRegistry::new().with_shape(wide_shape(n))));
        // Warm the template.
        let _ = cache.template("Wide");
        group.bench_with_input(BenchmarkId::from_parameter(n), &cache, |b, cache| {
            b.iter(|| black_box(cache.checkout("Wide")));
        });
    }

    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/insert");
    let user = UserContext::anonymous();

    for n in [5, 20, 100] {
        let statements = statements(n);
        let args = args(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &args, |b, args| {
            b.iter(|| black_box(statements.insert("Wide", Argument::map(args), &user)));
        });
    }

    group.finish();
}

fn bench_update_by_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/update_by_key");
    let user = UserContext::anonymous();

    for n in [5, 20, 100] {
        let statements = statements(n);
        let args = args(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &args, |b, args| {
            b.iter(|| {
                black_box(statements.update_by_key(
                    "Wide",
                    Argument::map(args),
                    WriteOptions::new(),
                    &user,
                ))
            });
        });
    }

    group.finish();
}

fn bench_select_by_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/select_by_filter");
    let user = UserContext::anonymous();
    let spec = SelectSpec::new();

    for n in [5, 20, 100] {
        let statements = statements(n);
        let mut filter = Map::new();
        filter.insert("col0".into(), Value::from(0));
        group.bench_with_input(BenchmarkId::from_parameter(n), &filter, |b, filter| {
            b.iter(|| {
                black_box(statements.select_by_filter(
                    "Wide",
                    Some(Argument::map(filter)),
                    &spec,
                    &user,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_checkout,
    bench_insert,
    bench_update_by_key,
    bench_select_by_filter
);
criterion_main!(benches);
