//! Element-wise execution of two-operand functions
//!
//! The executor picks one of four handlers from the flatness of the operands
//! and owns all null handling; wrappers only see positions whose operands are
//! both non-null.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::common::error::Result;
use crate::types::physical_value::PhysicalValue;
use crate::vector::accessors::StringVector;
use crate::vector::selection_vector::{SelectionVector, SelectionView};
use crate::vector::value_vector::ValueVector;

/// Operand positions of one invocation
#[derive(Clone, Copy)]
pub struct BinaryOpArgs<'a> {
    pub left: &'a ValueVector,
    pub left_pos: usize,
    pub right: &'a ValueVector,
    pub right_pos: usize,
    pub result_pos: usize,
}

/// Adapts an operation to the executor's calling convention
pub trait BinaryOperationWrapper {
    fn operation(&mut self, args: &BinaryOpArgs<'_>, result: &mut ValueVector) -> Result<()>;
}

impl<F> BinaryOperationWrapper for F
where
    F: FnMut(&BinaryOpArgs<'_>, &mut ValueVector) -> Result<()>,
{
    fn operation(&mut self, args: &BinaryOpArgs<'_>, result: &mut ValueVector) -> Result<()> {
        self(args, result)
    }
}

/// Predicate form used by [`BinaryFunctionExecutor::select_switch`]
pub trait BinarySelectWrapper {
    fn select(
        &mut self,
        left: &ValueVector,
        left_pos: usize,
        right: &ValueVector,
        right_pos: usize,
    ) -> Result<bool>;
}

/// Pure function over fixed-width operands
pub struct BinaryFunctionWrapper<L, R, Res, F> {
    func: F,
    _types: PhantomData<fn(L, R) -> Res>,
}

impl<L, R, Res, F> BinaryFunctionWrapper<L, R, Res, F> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _types: PhantomData,
        }
    }
}

impl<L, R, Res, F> BinaryOperationWrapper for BinaryFunctionWrapper<L, R, Res, F>
where
    L: PhysicalValue,
    R: PhysicalValue,
    Res: PhysicalValue,
    F: FnMut(L, R) -> Result<Res>,
{
    #[inline]
    fn operation(&mut self, args: &BinaryOpArgs<'_>, result: &mut ValueVector) -> Result<()> {
        let value = (self.func)(
            args.left.get_value::<L>(args.left_pos),
            args.right.get_value::<R>(args.right_pos),
        )?;
        result.set_value(args.result_pos, value);
        Ok(())
    }
}

impl<L, R, Res, F> BinarySelectWrapper for BinaryFunctionWrapper<L, R, Res, F>
where
    L: PhysicalValue,
    R: PhysicalValue,
    F: FnMut(L, R) -> Result<bool>,
{
    #[inline]
    fn select(
        &mut self,
        left: &ValueVector,
        left_pos: usize,
        right: &ValueVector,
        right_pos: usize,
    ) -> Result<bool> {
        (self.func)(left.get_value::<L>(left_pos), right.get_value::<R>(right_pos))
    }
}

/// Function over two string payloads that writes its own result
pub struct BinaryStringFunctionWrapper<F> {
    func: F,
}

impl<F> BinaryStringFunctionWrapper<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> BinaryOperationWrapper for BinaryStringFunctionWrapper<F>
where
    F: FnMut(&[u8], &[u8], &mut ValueVector, usize) -> Result<()>,
{
    #[inline]
    fn operation(&mut self, args: &BinaryOpArgs<'_>, result: &mut ValueVector) -> Result<()> {
        (self.func)(
            StringVector::get_bytes(args.left, args.left_pos),
            StringVector::get_bytes(args.right, args.right_pos),
            result,
            args.result_pos,
        )
    }
}

/// Predicate over two string payloads
pub struct BinaryStringSelectWrapper<F> {
    func: F,
}

impl<F> BinaryStringSelectWrapper<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> BinarySelectWrapper for BinaryStringSelectWrapper<F>
where
    F: FnMut(&[u8], &[u8]) -> Result<bool>,
{
    #[inline]
    fn select(
        &mut self,
        left: &ValueVector,
        left_pos: usize,
        right: &ValueVector,
        right_pos: usize,
    ) -> Result<bool> {
        (self.func)(
            StringVector::get_bytes(left, left_pos),
            StringVector::get_bytes(right, right_pos),
        )
    }
}

/// Write the positions of `input` accepted by `pred` into `sel_out`
///
/// Returns whether any position was accepted.
pub(crate) fn select_positions<F>(
    input: &SelectionView<'_>,
    sel_out: &mut SelectionVector,
    mut pred: F,
) -> Result<bool>
where
    F: FnMut(usize) -> Result<bool>,
{
    let mut num_selected = 0;
    {
        let buffer = sel_out.get_mutable_buffer();
        input.try_for_each(|pos| {
            if pred(pos)? {
                buffer[num_selected] = pos;
                num_selected += 1;
            }
            Ok::<(), crate::common::error::KuzuError>(())
        })?;
    }
    if num_selected == input.get_selected_size() && input.is_unfiltered() {
        sel_out.set_to_unfiltered_with(num_selected);
    } else {
        sel_out.set_to_filtered_with(num_selected);
    }
    Ok(num_selected > 0)
}

pub struct BinaryFunctionExecutor;

impl BinaryFunctionExecutor {
    /// Apply a pure function to every selected pair
    pub fn execute<L, R, Res, F>(
        left: &ValueVector,
        right: &ValueVector,
        result: &mut ValueVector,
        func: F,
    ) -> Result<()>
    where
        L: PhysicalValue,
        R: PhysicalValue,
        Res: PhysicalValue,
        F: FnMut(L, R) -> Result<Res>,
    {
        Self::execute_switch(left, right, result, &mut BinaryFunctionWrapper::new(func))
    }

    /// Apply a function over string payloads that writes into `result`
    pub fn execute_string<F>(
        left: &ValueVector,
        right: &ValueVector,
        result: &mut ValueVector,
        func: F,
    ) -> Result<()>
    where
        F: FnMut(&[u8], &[u8], &mut ValueVector, usize) -> Result<()>,
    {
        Self::execute_switch(left, right, result, &mut BinaryStringFunctionWrapper::new(func))
    }

    pub fn execute_switch<W: BinaryOperationWrapper>(
        left: &ValueVector,
        right: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        result.reset_aux_buffer();
        match (left.is_flat(), right.is_flat()) {
            (true, true) => Self::execute_both_flat(left, right, result, wrapper),
            (true, false) => Self::execute_flat_unflat(left, right, result, wrapper),
            (false, true) => Self::execute_unflat_flat(left, right, result, wrapper),
            (false, false) => Self::execute_both_unflat(left, right, result, wrapper),
        }
    }

    fn execute_both_flat<W: BinaryOperationWrapper>(
        left: &ValueVector,
        right: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        let left_pos = left.state().read_recursive().sel_vector().get(0);
        let right_pos = right.state().read_recursive().sel_vector().get(0);
        let result_pos = result.state().read_recursive().sel_vector().get(0);
        let is_null = left.is_null(left_pos) || right.is_null(right_pos);
        result.set_null(result_pos, is_null);
        if is_null {
            return Ok(());
        }
        let args = BinaryOpArgs {
            left,
            left_pos,
            right,
            right_pos,
            result_pos,
        };
        wrapper.operation(&args, result)
    }

    fn execute_flat_unflat<W: BinaryOperationWrapper>(
        left: &ValueVector,
        right: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        let left_pos = left.state().read_recursive().sel_vector().get(0);
        if left.is_null(left_pos) {
            result.set_all_null();
            return Ok(());
        }
        let right_state = right.state().read_recursive();
        let sel = right_state.sel_vector();
        let check_nulls = !right.has_no_nulls_guarantee();
        if !check_nulls {
            result.set_all_non_null();
        }
        sel.try_for_each(|pos| {
            if check_nulls {
                result.set_null(pos, right.is_null(pos));
                if right.is_null(pos) {
                    return Ok(());
                }
            }
            let args = BinaryOpArgs {
                left,
                left_pos,
                right,
                right_pos: pos,
                result_pos: pos,
            };
            wrapper.operation(&args, result)
        })
    }

    fn execute_unflat_flat<W: BinaryOperationWrapper>(
        left: &ValueVector,
        right: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        let right_pos = right.state().read_recursive().sel_vector().get(0);
        if right.is_null(right_pos) {
            result.set_all_null();
            return Ok(());
        }
        let left_state = left.state().read_recursive();
        let sel = left_state.sel_vector();
        let check_nulls = !left.has_no_nulls_guarantee();
        if !check_nulls {
            result.set_all_non_null();
        }
        sel.try_for_each(|pos| {
            if check_nulls {
                result.set_null(pos, left.is_null(pos));
                if left.is_null(pos) {
                    return Ok(());
                }
            }
            let args = BinaryOpArgs {
                left,
                left_pos: pos,
                right,
                right_pos,
                result_pos: pos,
            };
            wrapper.operation(&args, result)
        })
    }

    fn execute_both_unflat<W: BinaryOperationWrapper>(
        left: &ValueVector,
        right: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        crate::ku_assert!(
            Arc::ptr_eq(left.state(), right.state()),
            "unflat operands must share one selection"
        );
        let state = left.state().read_recursive();
        let sel = state.sel_vector();
        let check_nulls = !left.has_no_nulls_guarantee() || !right.has_no_nulls_guarantee();
        if !check_nulls {
            result.set_all_non_null();
        }
        sel.try_for_each(|pos| {
            if check_nulls {
                let is_null = left.is_null(pos) || right.is_null(pos);
                result.set_null(pos, is_null);
                if is_null {
                    return Ok(());
                }
            }
            let args = BinaryOpArgs {
                left,
                left_pos: pos,
                right,
                right_pos: pos,
                result_pos: pos,
            };
            wrapper.operation(&args, result)
        })
    }

    /// Filter with a pure predicate
    ///
    /// When both operands are flat only the return value is meaningful.
    /// Otherwise the accepted positions of the unflat side are written to
    /// `sel_out`.
    pub fn select<L, R, F>(
        left: &ValueVector,
        right: &ValueVector,
        sel_out: &mut SelectionVector,
        func: F,
    ) -> Result<bool>
    where
        L: PhysicalValue,
        R: PhysicalValue,
        F: FnMut(L, R) -> Result<bool>,
    {
        Self::select_switch(left, right, sel_out, &mut BinaryFunctionWrapper::<L, R, bool, F>::new(func))
    }

    pub fn select_string<F>(
        left: &ValueVector,
        right: &ValueVector,
        sel_out: &mut SelectionVector,
        func: F,
    ) -> Result<bool>
    where
        F: FnMut(&[u8], &[u8]) -> Result<bool>,
    {
        Self::select_switch(left, right, sel_out, &mut BinaryStringSelectWrapper::new(func))
    }

    pub fn select_switch<W: BinarySelectWrapper>(
        left: &ValueVector,
        right: &ValueVector,
        sel_out: &mut SelectionVector,
        wrapper: &mut W,
    ) -> Result<bool> {
        match (left.is_flat(), right.is_flat()) {
            (true, true) => {
                let left_pos = left.state().read_recursive().sel_vector().get(0);
                let right_pos = right.state().read_recursive().sel_vector().get(0);
                if left.is_null(left_pos) || right.is_null(right_pos) {
                    return Ok(false);
                }
                wrapper.select(left, left_pos, right, right_pos)
            }
            (true, false) => {
                let left_pos = left.state().read_recursive().sel_vector().get(0);
                if left.is_null(left_pos) {
                    return Ok(false);
                }
                let right_state = right.state().read_recursive();
                let check_nulls = !right.has_no_nulls_guarantee();
                select_positions(&right_state.sel_vector().view(), sel_out, |pos| {
                    if check_nulls && right.is_null(pos) {
                        return Ok(false);
                    }
                    wrapper.select(left, left_pos, right, pos)
                })
            }
            (false, true) => {
                let right_pos = right.state().read_recursive().sel_vector().get(0);
                if right.is_null(right_pos) {
                    return Ok(false);
                }
                let left_state = left.state().read_recursive();
                let check_nulls = !left.has_no_nulls_guarantee();
                select_positions(&left_state.sel_vector().view(), sel_out, |pos| {
                    if check_nulls && left.is_null(pos) {
                        return Ok(false);
                    }
                    wrapper.select(left, pos, right, right_pos)
                })
            }
            (false, false) => {
                crate::ku_assert!(
                    Arc::ptr_eq(left.state(), right.state()),
                    "unflat operands must share one selection"
                );
                let state = left.state().read_recursive();
                let check_nulls =
                    !left.has_no_nulls_guarantee() || !right.has_no_nulls_guarantee();
                select_positions(&state.sel_vector().view(), sel_out, |pos| {
                    if check_nulls && (left.is_null(pos) || right.is_null(pos)) {
                        return Ok(false);
                    }
                    wrapper.select(left, pos, right, pos)
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::types::LogicalType;
    use crate::vector::data_chunk::{DataChunkState, SharedChunkState};
    use std::cell::Cell;

    fn flat_vector(data_type: LogicalType, value: Option<i64>) -> ValueVector {
        let mut v = ValueVector::with_state(
            data_type,
            &MemoryManager::default(),
            DataChunkState::single_value_shared(),
        );
        match value {
            Some(value) => v.set_value(0, value),
            None => v.set_null(0, true),
        }
        v
    }

    fn unflat_state(positions: &[usize]) -> SharedChunkState {
        let state = DataChunkState::new_shared(8);
        {
            let mut guard = state.write();
            let sel = guard.sel_vector_mut();
            sel.get_mutable_buffer()[..positions.len()].copy_from_slice(positions);
            sel.set_to_filtered_with(positions.len());
        }
        state
    }

    #[test]
    fn test_flat_null_short_circuits() {
        let left = flat_vector(LogicalType::int64(), None);
        let right = flat_vector(LogicalType::int64(), Some(2));
        let mut result = flat_vector(LogicalType::int64(), Some(0));
        let calls = Cell::new(0);
        BinaryFunctionExecutor::execute(&left, &right, &mut result, |l: i64, r: i64| {
            calls.set(calls.get() + 1);
            Ok(l + r)
        })
        .unwrap();
        assert_eq!(calls.get(), 0);
        assert!(result.is_null(0));
    }

    #[test]
    fn test_unflat_no_nulls_with_permuted_selection() {
        let mm = MemoryManager::default();
        let state = unflat_state(&[4, 2, 0, 3, 1]);
        let mut left = ValueVector::with_state(LogicalType::int32(), &mm, state.clone());
        let mut right = ValueVector::with_state(LogicalType::int32(), &mm, state.clone());
        let mut result = ValueVector::with_state(LogicalType::int32(), &mm, state);
        for i in 0..5 {
            left.set_value(i, i as i32 * 10);
            right.set_value(i, i as i32);
        }
        result.set_null(3, true);
        BinaryFunctionExecutor::execute(&left, &right, &mut result, |l: i32, r: i32| Ok(l + r))
            .unwrap();
        assert!(result.has_no_nulls_guarantee());
        for i in 0..5 {
            assert_eq!(result.get_value::<i32>(i), i as i32 * 11);
        }
    }

    #[test]
    fn test_flat_unflat_propagates_nulls() {
        let mm = MemoryManager::default();
        let state = unflat_state(&[0, 1, 2]);
        let left = flat_vector(LogicalType::int64(), Some(100));
        let mut right = ValueVector::with_state(LogicalType::int64(), &mm, state.clone());
        let mut result = ValueVector::with_state(LogicalType::int64(), &mm, state);
        right.set_value(0, 1i64);
        right.set_null(1, true);
        right.set_value(2, 3i64);
        BinaryFunctionExecutor::execute(&left, &right, &mut result, |l: i64, r: i64| Ok(l - r))
            .unwrap();
        assert_eq!(result.get_value::<i64>(0), 99);
        assert!(result.is_null(1));
        assert_eq!(result.get_value::<i64>(2), 97);
    }

    #[test]
    fn test_errors_stop_execution() {
        let mm = MemoryManager::default();
        let state = unflat_state(&[0, 1]);
        let left = ValueVector::with_state(LogicalType::int64(), &mm, state.clone());
        let right = ValueVector::with_state(LogicalType::int64(), &mm, state.clone());
        let mut result = ValueVector::with_state(LogicalType::int64(), &mm, state);
        let err = BinaryFunctionExecutor::execute(&left, &right, &mut result, |_: i64, _: i64| {
            Err::<i64, _>(crate::common::error::KuzuError::Runtime("boom".into()))
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_select_writes_passing_positions() {
        let mm = MemoryManager::default();
        let state = unflat_state(&[5, 1, 3, 0]);
        let mut left = ValueVector::with_state(LogicalType::int64(), &mm, state);
        for (pos, v) in [(5, 10i64), (1, -1), (3, 7), (0, 2)] {
            left.set_value(pos, v);
        }
        left.set_null(0, true);
        let right = flat_vector(LogicalType::int64(), Some(0));
        let mut sel = SelectionVector::new(8);
        let any = BinaryFunctionExecutor::select(&left, &right, &mut sel, |l: i64, r: i64| Ok(l > r))
            .unwrap();
        assert!(any);
        assert_eq!(sel.view().to_vec(), vec![5, 3]);
    }
}
