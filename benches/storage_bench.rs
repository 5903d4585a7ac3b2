use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use tablestore::operation::map::names;
use tablestore::storage::{DoubleStorage, LongStorage, ObjectStorage, TextStorage};
use tablestore::{cast, run_binary_map, run_zip, Column, Context, ProblemAggregator, Storage};
use tablestore::{IntegerType, StorageType, TextType, Value};

// --- Deterministic Data Generation ---

/// Integers with every seventh row null.
fn generate_longs(size: usize) -> Storage {
    let values = (0..size as i64)
        .map(|i| (i % 7 != 0).then_some(i * 31 % 1_000))
        .collect();
    Storage::Long(LongStorage::from_options(values, IntegerType::INT_64))
}

fn generate_doubles(size: usize) -> Storage {
    let values = (0..size).map(|i| Some(i as f64 * 0.5)).collect();
    Storage::Double(DoubleStorage::from_options(values))
}

fn generate_texts(size: usize) -> Storage {
    let owned: Vec<String> = (0..size).map(|i| format!("row-{i:06}")).collect();
    let values: Vec<Option<&str>> = owned.iter().map(|s| Some(s.as_str())).collect();
    Storage::Text(TextStorage::from_strs(&values, TextType::VARIABLE_LENGTH))
}

/// A mixed storage alternating between integers and floats.
fn generate_mixed(size: usize) -> Storage {
    let values = (0..size)
        .map(|i| {
            Some(if i % 2 == 0 {
                Value::Long(i as i64)
            } else {
                Value::Double(i as f64 + 0.25)
            })
        })
        .collect();
    Storage::Mixed(ObjectStorage::new(values))
}

// --- Benchmark Suite ---

const BENCH_ROWS: usize = 100_000;

fn bench_binary_operations(c: &mut Criterion) {
    let longs = generate_longs(BENCH_ROWS);
    let other = generate_longs(BENCH_ROWS);
    let doubles = generate_doubles(BENCH_ROWS);
    let mixed = generate_mixed(BENCH_ROWS);
    let texts = generate_texts(BENCH_ROWS);

    let mut group = c.benchmark_group("Binary Operations");
    group.throughput(Throughput::Elements(BENCH_ROWS as u64));

    group.bench_function("Long + Long (zip)", |b| {
        b.iter(|| {
            let ctx = Context::default();
            let problems = ProblemAggregator::new();
            black_box(run_zip(black_box(&longs), names::ADD, &other, &ctx, &problems).unwrap())
        })
    });
    group.bench_function("Long < scalar", |b| {
        b.iter(|| {
            let ctx = Context::default();
            let problems = ProblemAggregator::new();
            black_box(run_binary_map(&longs, names::LT, &Value::Long(500), &ctx, &problems).unwrap())
        })
    });
    group.bench_function("Double * scalar", |b| {
        b.iter(|| {
            let ctx = Context::default();
            let problems = ProblemAggregator::new();
            black_box(run_binary_map(&doubles, names::MUL, &Value::Double(1.5), &ctx, &problems).unwrap())
        })
    });
    group.bench_function("Mixed + scalar (boxed)", |b| {
        b.iter(|| {
            let ctx = Context::default();
            let problems = ProblemAggregator::new();
            black_box(run_binary_map(&mixed, names::ADD, &Value::Long(1), &ctx, &problems).unwrap())
        })
    });
    group.bench_function("Text LIKE", |b| {
        b.iter(|| {
            let ctx = Context::default();
            let problems = ProblemAggregator::new();
            black_box(run_binary_map(&texts, names::LIKE, &Value::from("row-%5"), &ctx, &problems).unwrap())
        })
    });
    group.finish();
}

fn bench_casts(c: &mut Criterion) {
    let longs = Column::new("longs", generate_longs(BENCH_ROWS));
    let texts = Column::new("texts", generate_texts(BENCH_ROWS));

    let mut group = c.benchmark_group("Casts");
    group.throughput(Throughput::Elements(BENCH_ROWS as u64));

    group.bench_function("INT_64 -> INT_16 (bound-checked)", |b| {
        b.iter(|| {
            let ctx = Context::default();
            let problems = ProblemAggregator::new();
            let target = StorageType::Integer(IntegerType::INT_16);
            black_box(cast(&longs, target, &ctx, &problems).unwrap())
        })
    });
    group.bench_function("INT_64 -> Text", |b| {
        b.iter(|| {
            let ctx = Context::default();
            let problems = ProblemAggregator::new();
            black_box(cast(&longs, StorageType::TEXT, &ctx, &problems).unwrap())
        })
    });
    group.bench_function("Text -> bounded Text (retype)", |b| {
        b.iter(|| {
            let ctx = Context::default();
            let problems = ProblemAggregator::new();
            let target = StorageType::Text(TextType::variable_length_with_limit(32));
            black_box(cast(&texts, target, &ctx, &problems).unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_binary_operations, bench_casts);
criterion_main!(benches);
