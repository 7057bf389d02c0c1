//! Element-wise execution of one-operand functions

use std::marker::PhantomData;

use crate::common::error::Result;
use crate::function::cast::CastStringOptions;
use crate::types::physical_value::PhysicalValue;
use crate::vector::accessors::StringVector;
use crate::vector::value_vector::ValueVector;

pub trait UnaryOperationWrapper {
    fn operation(
        &mut self,
        input: &ValueVector,
        input_pos: usize,
        result: &mut ValueVector,
        result_pos: usize,
    ) -> Result<()>;
}

pub struct UnaryFunctionWrapper<O, Res, F> {
    func: F,
    _types: PhantomData<fn(O) -> Res>,
}

impl<O, Res, F> UnaryFunctionWrapper<O, Res, F> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _types: PhantomData,
        }
    }
}

impl<O, Res, F> UnaryOperationWrapper for UnaryFunctionWrapper<O, Res, F>
where
    O: PhysicalValue,
    Res: PhysicalValue,
    F: FnMut(O) -> Result<Res>,
{
    #[inline]
    fn operation(
        &mut self,
        input: &ValueVector,
        input_pos: usize,
        result: &mut ValueVector,
        result_pos: usize,
    ) -> Result<()> {
        let value = (self.func)(input.get_value::<O>(input_pos))?;
        result.set_value(result_pos, value);
        Ok(())
    }
}

/// Function over a string payload that writes its own result
pub struct UnaryStringFunctionWrapper<F> {
    func: F,
}

impl<F> UnaryStringFunctionWrapper<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> UnaryOperationWrapper for UnaryStringFunctionWrapper<F>
where
    F: FnMut(&[u8], &mut ValueVector, usize) -> Result<()>,
{
    #[inline]
    fn operation(
        &mut self,
        input: &ValueVector,
        input_pos: usize,
        result: &mut ValueVector,
        result_pos: usize,
    ) -> Result<()> {
        (self.func)(StringVector::get_bytes(input, input_pos), result, result_pos)
    }
}

/// Function that reads the whole input slot, nested payloads included
pub struct UnaryNestedFunctionWrapper<F> {
    func: F,
}

impl<F> UnaryNestedFunctionWrapper<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> UnaryOperationWrapper for UnaryNestedFunctionWrapper<F>
where
    F: FnMut(&ValueVector, usize, &mut ValueVector, usize) -> Result<()>,
{
    #[inline]
    fn operation(
        &mut self,
        input: &ValueVector,
        input_pos: usize,
        result: &mut ValueVector,
        result_pos: usize,
    ) -> Result<()> {
        (self.func)(input, input_pos, result, result_pos)
    }
}

/// String cast that also sees the parsing options bound with the cast
pub struct UnaryCastStringFunctionWrapper<'a, F> {
    options: &'a CastStringOptions,
    func: F,
}

impl<'a, F> UnaryCastStringFunctionWrapper<'a, F> {
    pub fn new(options: &'a CastStringOptions, func: F) -> Self {
        Self { options, func }
    }
}

impl<F> UnaryOperationWrapper for UnaryCastStringFunctionWrapper<'_, F>
where
    F: FnMut(&[u8], &mut ValueVector, usize, &CastStringOptions) -> Result<()>,
{
    #[inline]
    fn operation(
        &mut self,
        input: &ValueVector,
        input_pos: usize,
        result: &mut ValueVector,
        result_pos: usize,
    ) -> Result<()> {
        (self.func)(
            StringVector::get_bytes(input, input_pos),
            result,
            result_pos,
            self.options,
        )
    }
}

pub struct UnaryFunctionExecutor;

impl UnaryFunctionExecutor {
    pub fn execute<O, Res, F>(operand: &ValueVector, result: &mut ValueVector, func: F) -> Result<()>
    where
        O: PhysicalValue,
        Res: PhysicalValue,
        F: FnMut(O) -> Result<Res>,
    {
        Self::execute_switch(operand, result, &mut UnaryFunctionWrapper::new(func))
    }

    pub fn execute_string<F>(operand: &ValueVector, result: &mut ValueVector, func: F) -> Result<()>
    where
        F: FnMut(&[u8], &mut ValueVector, usize) -> Result<()>,
    {
        Self::execute_switch(operand, result, &mut UnaryStringFunctionWrapper::new(func))
    }

    pub fn execute_switch<W: UnaryOperationWrapper>(
        operand: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        result.reset_aux_buffer();
        if operand.is_flat() {
            Self::execute_flat(operand, result, wrapper)
        } else {
            Self::execute_unflat(operand, result, wrapper)
        }
    }

    fn execute_flat<W: UnaryOperationWrapper>(
        operand: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        let input_pos = operand.state().read_recursive().sel_vector().get(0);
        let result_pos = result.state().read_recursive().sel_vector().get(0);
        let is_null = operand.is_null(input_pos);
        result.set_null(result_pos, is_null);
        if is_null {
            return Ok(());
        }
        wrapper.operation(operand, input_pos, result, result_pos)
    }

    fn execute_unflat<W: UnaryOperationWrapper>(
        operand: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        let state = operand.state().read_recursive();
        let sel = state.sel_vector();
        if operand.has_no_nulls_guarantee() {
            result.set_all_non_null();
            return sel.try_for_each(|pos| wrapper.operation(operand, pos, result, pos));
        }
        sel.try_for_each(|pos| {
            let is_null = operand.is_null(pos);
            result.set_null(pos, is_null);
            if is_null {
                return Ok(());
            }
            wrapper.operation(operand, pos, result, pos)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::types::LogicalType;
    use crate::vector::data_chunk::DataChunkState;

    #[test]
    fn test_unflat_skips_nulls() {
        let mm = MemoryManager::default();
        let state = DataChunkState::new_shared(4);
        let mut input = ValueVector::with_state(LogicalType::int16(), &mm, state.clone());
        let mut result = ValueVector::with_state(LogicalType::int64(), &mm, state);
        input.set_value(0, 3i16);
        input.set_null(1, true);
        input.set_value(2, -4i16);
        input.set_value(3, 0i16);
        let mut calls = 0;
        UnaryFunctionExecutor::execute(&input, &mut result, |v: i16| {
            calls += 1;
            Ok(i64::from(v) * 2)
        })
        .unwrap();
        assert_eq!(calls, 3);
        assert_eq!(result.get_value::<i64>(0), 6);
        assert!(result.is_null(1));
        assert_eq!(result.get_value::<i64>(2), -8);
    }

    #[test]
    fn test_flat_string_operand() {
        let mm = MemoryManager::default();
        let mut input =
            ValueVector::with_state(LogicalType::string(), &mm, DataChunkState::single_value_shared());
        let mut result =
            ValueVector::with_state(LogicalType::int64(), &mm, DataChunkState::single_value_shared());
        StringVector::add_string(&mut input, 0, b"hello world, long enough").unwrap();
        UnaryFunctionExecutor::execute_string(&input, &mut result, |bytes, result, pos| {
            result.set_value(pos, bytes.len() as i64);
            Ok(())
        })
        .unwrap();
        assert_eq!(result.get_value::<i64>(0), 24);
    }
}
