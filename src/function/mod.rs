//! Scalar function evaluation
//!
//! Executors apply an element-wise operation across vectors honouring flat
//! and unflat states, selection and nulls. On top of them sit the arithmetic,
//! comparison, string and cast operations, the overload catalog and UDFs.

pub mod arithmetic;
pub mod binary_executor;
pub mod cast;
pub mod comparison;
pub mod nullary_executor;
pub mod scalar_function;
pub mod string_functions;
pub mod ternary_executor;
pub mod udf;
pub mod unary_executor;

pub use binary_executor::{BinaryFunctionExecutor, BinaryOpArgs, BinaryOperationWrapper};
pub use cast::{CastFunction, CastStringOptions};
pub use nullary_executor::{ConstFunctionExecutor, NullaryFunctionExecutor};
pub use scalar_function::{
    BuiltInFunctions, ScalarExecFunc, ScalarFunction, ScalarFunctionSet, ScalarSelectFunc,
};
pub use string_functions::RegexBindData;
pub use ternary_executor::{TernaryFunctionExecutor, TernaryOpArgs, TernaryOperationWrapper};
pub use udf::{create_binary_udf, create_ternary_udf, create_unary_udf};
pub use unary_executor::{UnaryFunctionExecutor, UnaryOperationWrapper};
