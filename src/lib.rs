//! Kuzu core - the value model and execution substrate of an embeddable graph database
//!
//! The crate provides the pieces a query processor evaluates expressions on:
//! a logical/physical type system, columnar value vectors with null masks and
//! selection vectors, a function execution framework that handles flat and
//! unflat operands uniformly, and the bookkeeping of write transactions.
//!
pub mod common;
pub mod function;
pub mod transaction;
pub mod types;
pub mod vector;

// Re-export common types for convenience
pub use common::{KuzuError, Result, SystemConfig};

// Re-export type system for convenience
pub use types::{LogicalType, LogicalTypeID, PhysicalTypeID, TypeUtils, Value};

// Re-export vectors for convenience
pub use vector::{DataChunk, DataChunkState, SelectionVector, ValueVector};

// Re-export function framework for convenience
pub use function::{
    BinaryFunctionExecutor, BuiltInFunctions, CastFunction, ScalarFunction,
    TernaryFunctionExecutor, UnaryFunctionExecutor,
};

// Re-export transactions for convenience
pub use transaction::{Transaction, TransactionManager, TransactionType, Wal, WalRecord};
