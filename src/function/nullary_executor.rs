//! Execution of functions without operands

use crate::common::error::Result;
use crate::types::physical_value::PhysicalValue;
use crate::types::value::Value;
use crate::vector::value_vector::ValueVector;

pub struct NullaryFunctionExecutor;

impl NullaryFunctionExecutor {
    /// Fill every selected position of `result` with a fresh value from `func`
    pub fn execute<Res, F>(result: &mut ValueVector, mut func: F) -> Result<()>
    where
        Res: PhysicalValue,
        F: FnMut() -> Result<Res>,
    {
        Self::execute_switch(result, |result, pos| {
            let value = func()?;
            result.set_value(pos, value);
            Ok(())
        })
    }

    pub fn execute_switch<F>(result: &mut ValueVector, mut func: F) -> Result<()>
    where
        F: FnMut(&mut ValueVector, usize) -> Result<()>,
    {
        result.reset_aux_buffer();
        let state = result.state().clone();
        let guard = state.read_recursive();
        let sel = guard.sel_vector();
        if guard.is_flat() {
            let pos = sel.get(0);
            result.set_null(pos, false);
            return func(result, pos);
        }
        result.set_all_non_null();
        sel.try_for_each(|pos| func(result, pos))
    }
}

/// Writes a constant into the single position of a flat result
pub struct ConstFunctionExecutor;

impl ConstFunctionExecutor {
    pub fn execute(result: &mut ValueVector, value: &Value) -> Result<()> {
        crate::ku_assert!(result.is_flat(), "constant functions produce flat results");
        result.reset_aux_buffer();
        let pos = result.state().read_recursive().sel_vector().get(0);
        result.copy_from_value(pos, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::types::LogicalType;
    use crate::vector::data_chunk::DataChunkState;

    #[test]
    fn test_nullary_fills_selection() {
        let mut result = ValueVector::with_state(
            LogicalType::int64(),
            &MemoryManager::default(),
            DataChunkState::new_shared(4),
        );
        let mut next = 0i64;
        NullaryFunctionExecutor::execute(&mut result, || {
            next += 1;
            Ok(next)
        })
        .unwrap();
        assert_eq!(result.get_value::<i64>(3), 4);
    }

    #[test]
    fn test_const_writes_flat_position() {
        let mut result = ValueVector::with_state(
            LogicalType::string(),
            &MemoryManager::default(),
            DataChunkState::single_value_shared(),
        );
        ConstFunctionExecutor::execute(&mut result, &Value::from("a constant string value"))
            .unwrap();
        assert_eq!(result.get_as_value(0), Value::from("a constant string value"));
    }
}
