//! Helpers shared by the integration tests

#![allow(dead_code)]

use kuzu_core::common::{init_logging, MemoryManager};
use kuzu_core::types::{LogicalType, Value};
use kuzu_core::vector::{DataChunkState, SharedChunkState, ValueVector};

pub fn setup() {
    init_logging("warn");
}

/// Vector over `state` holding `values` at positions `0..values.len()`
pub fn vector_with(data_type: LogicalType, state: &SharedChunkState, values: &[Value]) -> ValueVector {
    let mut vector = ValueVector::with_state(data_type, &MemoryManager::default(), state.clone());
    for (pos, value) in values.iter().enumerate() {
        vector
            .copy_from_value(pos, value)
            .expect("value matches the vector type");
    }
    vector
}

pub fn flat_vector(data_type: LogicalType, value: Value) -> ValueVector {
    vector_with(data_type, &DataChunkState::single_value_shared(), &[value])
}

pub fn int64_values(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&v| Value::from(v)).collect()
}
