use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kuzu_core::common::MemoryManager;
use kuzu_core::function::arithmetic::{Add, BinaryArithmeticOperation};
use kuzu_core::function::BinaryFunctionExecutor;
use kuzu_core::types::{LogicalType, Value};
use kuzu_core::vector::{DataChunkState, SelectionVector, SharedChunkState, ValueVector};

const NUM_VALUES: usize = 2048;

fn int64_vector(state: &SharedChunkState, mm: &MemoryManager, with_nulls: bool) -> ValueVector {
    let mut vector = ValueVector::with_state(LogicalType::int64(), mm, state.clone());
    let size = state.read().get_selected_size();
    for pos in 0..size {
        let value = if with_nulls && pos % 7 == 0 {
            Value::create_null_value_of(LogicalType::int64())
        } else {
            Value::from(pos as i64)
        };
        vector
            .copy_from_value(pos, &value)
            .expect("int64 value fits an int64 vector");
    }
    vector
}

fn bench_binary_add(c: &mut Criterion) {
    let mm = MemoryManager::default();
    let mut group = c.benchmark_group("binary_add_int64");

    for with_nulls in [false, true] {
        let state = DataChunkState::new_shared(NUM_VALUES);
        let left = int64_vector(&state, &mm, with_nulls);
        let right = int64_vector(&state, &mm, false);
        let mut result = ValueVector::with_state(LogicalType::int64(), &mm, state.clone());
        group.bench_with_input(
            BenchmarkId::new("unflat_unflat", if with_nulls { "nulls" } else { "no_nulls" }),
            &with_nulls,
            |b, _| {
                b.iter(|| {
                    BinaryFunctionExecutor::execute(
                        black_box(&left),
                        black_box(&right),
                        &mut result,
                        Add::operation::<i64>,
                    )
                    .expect("no overflow")
                })
            },
        );
    }

    let state = DataChunkState::new_shared(NUM_VALUES);
    let unflat = int64_vector(&state, &mm, false);
    let flat = int64_vector(&DataChunkState::single_value_shared(), &mm, false);
    let mut result = ValueVector::with_state(LogicalType::int64(), &mm, state.clone());
    group.bench_function("flat_unflat", |b| {
        b.iter(|| {
            BinaryFunctionExecutor::execute(
                black_box(&flat),
                black_box(&unflat),
                &mut result,
                Add::operation::<i64>,
            )
            .expect("no overflow")
        })
    });
    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mm = MemoryManager::default();
    let state = DataChunkState::new_shared(NUM_VALUES);
    let left = int64_vector(&state, &mm, false);
    let threshold = {
        let flat_state = DataChunkState::single_value_shared();
        let mut v = ValueVector::with_state(LogicalType::int64(), &mm, flat_state);
        v.copy_from_value(0, &Value::from((NUM_VALUES / 2) as i64))
            .expect("int64 value fits an int64 vector");
        v
    };
    let mut sel = SelectionVector::new(NUM_VALUES);
    c.bench_function("select_greater_than_flat", |b| {
        b.iter(|| {
            BinaryFunctionExecutor::select(&left, &threshold, &mut sel, |l: i64, r: i64| Ok(l > r))
                .expect("comparison cannot fail")
        })
    });
}

criterion_group!(benches, bench_binary_add, bench_select);
criterion_main!(benches);
