//! User defined scalar functions
//!
//! A UDF is a plain Rust closure over storage values. The helpers here wrap
//! it in the matching executor and produce a [`ScalarFunction`] that can be
//! registered next to the built-ins with `BuiltInFunctions::add_function`.

use std::sync::Arc;

use crate::common::error::{KuzuError, Result};
use crate::function::binary_executor::BinaryFunctionExecutor;
use crate::function::scalar_function::ScalarFunction;
use crate::function::ternary_executor::TernaryFunctionExecutor;
use crate::function::unary_executor::UnaryFunctionExecutor;
use crate::types::logical_type::{LogicalType, LogicalTypeID};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::{physical_type_id_for, ScalarValue};
use crate::vector::value_vector::ValueVector;

/// Logical type a storage type maps to when none is given explicitly
fn default_type_id<T: ScalarValue>() -> Result<LogicalTypeID> {
    let type_id = match physical_type_id_for::<T>() {
        PhysicalTypeID::Bool => LogicalTypeID::Bool,
        PhysicalTypeID::Int8 => LogicalTypeID::Int8,
        PhysicalTypeID::Int16 => LogicalTypeID::Int16,
        PhysicalTypeID::Int32 => LogicalTypeID::Int32,
        PhysicalTypeID::Int64 => LogicalTypeID::Int64,
        PhysicalTypeID::Int128 => LogicalTypeID::Int128,
        PhysicalTypeID::Uint8 => LogicalTypeID::Uint8,
        PhysicalTypeID::Uint16 => LogicalTypeID::Uint16,
        PhysicalTypeID::Uint32 => LogicalTypeID::Uint32,
        PhysicalTypeID::Uint64 => LogicalTypeID::Uint64,
        PhysicalTypeID::Uint128 => LogicalTypeID::Uint128,
        PhysicalTypeID::Float => LogicalTypeID::Float,
        PhysicalTypeID::Double => LogicalTypeID::Double,
        PhysicalTypeID::Interval => LogicalTypeID::Interval,
        PhysicalTypeID::InternalId => LogicalTypeID::InternalId,
        other => {
            return Err(KuzuError::Binder(format!(
                "Unsupported type {:?} for udf.",
                other
            )))
        }
    };
    Ok(type_id)
}

fn validate_type<T: ScalarValue>(type_id: LogicalTypeID) -> Result<()> {
    if LogicalType::new(type_id).physical_type() != physical_type_id_for::<T>() {
        return Err(KuzuError::Binder(
            "Incompatible udf parameter/return type and templated type.".to_string(),
        ));
    }
    Ok(())
}

pub fn create_unary_udf<O, Res, F>(name: &str, func: F) -> Result<ScalarFunction>
where
    O: ScalarValue,
    Res: ScalarValue,
    F: Fn(O) -> Res + Send + Sync + 'static,
{
    create_unary_udf_with_types(name, default_type_id::<O>()?, default_type_id::<Res>()?, func)
}

/// Like [`create_unary_udf`] for logical types that share a storage type, e.g. `DATE` over `i32`
pub fn create_unary_udf_with_types<O, Res, F>(
    name: &str,
    operand_type: LogicalTypeID,
    return_type: LogicalTypeID,
    func: F,
) -> Result<ScalarFunction>
where
    O: ScalarValue,
    Res: ScalarValue,
    F: Fn(O) -> Res + Send + Sync + 'static,
{
    validate_type::<O>(operand_type)?;
    validate_type::<Res>(return_type)?;
    Ok(ScalarFunction::new(
        name,
        vec![operand_type],
        return_type,
        Arc::new(move |params: &[&ValueVector], result: &mut ValueVector| {
            UnaryFunctionExecutor::execute(params[0], result, |operand: O| Ok(func(operand)))
        }),
    ))
}

pub fn create_binary_udf<L, R, Res, F>(name: &str, func: F) -> Result<ScalarFunction>
where
    L: ScalarValue,
    R: ScalarValue,
    Res: ScalarValue,
    F: Fn(L, R) -> Res + Send + Sync + 'static,
{
    create_binary_udf_with_types(
        name,
        [default_type_id::<L>()?, default_type_id::<R>()?],
        default_type_id::<Res>()?,
        func,
    )
}

pub fn create_binary_udf_with_types<L, R, Res, F>(
    name: &str,
    parameter_types: [LogicalTypeID; 2],
    return_type: LogicalTypeID,
    func: F,
) -> Result<ScalarFunction>
where
    L: ScalarValue,
    R: ScalarValue,
    Res: ScalarValue,
    F: Fn(L, R) -> Res + Send + Sync + 'static,
{
    validate_type::<L>(parameter_types[0])?;
    validate_type::<R>(parameter_types[1])?;
    validate_type::<Res>(return_type)?;
    Ok(ScalarFunction::new(
        name,
        parameter_types.to_vec(),
        return_type,
        Arc::new(move |params: &[&ValueVector], result: &mut ValueVector| {
            BinaryFunctionExecutor::execute(params[0], params[1], result, |l: L, r: R| {
                Ok(func(l, r))
            })
        }),
    ))
}

pub fn create_ternary_udf<A, B, C, Res, F>(name: &str, func: F) -> Result<ScalarFunction>
where
    A: ScalarValue,
    B: ScalarValue,
    C: ScalarValue,
    Res: ScalarValue,
    F: Fn(A, B, C) -> Res + Send + Sync + 'static,
{
    let parameter_types = vec![
        default_type_id::<A>()?,
        default_type_id::<B>()?,
        default_type_id::<C>()?,
    ];
    let return_type = default_type_id::<Res>()?;
    Ok(ScalarFunction::new(
        name,
        parameter_types,
        return_type,
        Arc::new(move |params: &[&ValueVector], result: &mut ValueVector| {
            TernaryFunctionExecutor::execute(
                params[0],
                params[1],
                params[2],
                result,
                |a: A, b: B, c: C| Ok(func(a, b, c)),
            )
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::function::scalar_function::BuiltInFunctions;
    use crate::types::temporal::Date;
    use crate::types::value::Value;
    use crate::vector::data_chunk::DataChunkState;

    #[test]
    fn test_binary_udf_registers_and_runs() {
        let mut functions = BuiltInFunctions::new().unwrap();
        functions
            .add_function(create_binary_udf("weighted", |a: i64, b: i64| a * 10 + b).unwrap())
            .unwrap();
        let udf = functions
            .match_function("WEIGHTED", &[LogicalType::int64(), LogicalType::int32()])
            .unwrap();

        let mm = MemoryManager::default();
        let state = DataChunkState::new_shared(2);
        let mut left = ValueVector::with_state(LogicalType::int64(), &mm, state.clone());
        let mut right = ValueVector::with_state(LogicalType::int64(), &mm, state.clone());
        let mut result = ValueVector::with_state(LogicalType::int64(), &mm, state);
        left.copy_from_value(0, &Value::from(4i64)).unwrap();
        left.copy_from_value(1, &Value::from(1i64)).unwrap();
        right.copy_from_value(0, &Value::from(2i64)).unwrap();
        right.copy_from_value(1, &Value::create_null_value_of(LogicalType::int64())).unwrap();
        udf.execute(&[&left, &right], &mut result).unwrap();
        assert_eq!(result.get_value::<i64>(0), 42);
        assert!(result.is_null(1));
    }

    #[test]
    fn test_explicit_types_are_validated() {
        let add_days = create_unary_udf_with_types(
            "next_day",
            LogicalTypeID::Date,
            LogicalTypeID::Date,
            |d: Date| Date::new(d.days + 1),
        );
        assert!(add_days.is_ok());

        let mismatched =
            create_unary_udf_with_types("bad", LogicalTypeID::String, LogicalTypeID::Int64, |x: i64| x);
        assert!(matches!(mismatched, Err(KuzuError::Binder(_))));
    }

    #[test]
    fn test_ternary_udf_signature() {
        let clamp = create_ternary_udf("clamp", |x: f64, lo: f64, hi: f64| x.max(lo).min(hi)).unwrap();
        assert_eq!(clamp.signature(), "(DOUBLE,DOUBLE,DOUBLE) -> DOUBLE");
    }
}
