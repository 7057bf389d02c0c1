//! Element-wise execution of three-operand functions
//!
//! The flat/unflat combination of the operands picks the arm. Flat operands
//! contribute one fixed position, unflat operands all iterate over the same
//! shared selection. A null flat operand nulls every selected result.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::common::error::Result;
use crate::function::string_functions::RegexBindData;
use crate::types::physical_value::PhysicalValue;
use crate::vector::accessors::StringVector;
use crate::vector::data_chunk::SharedChunkState;
use crate::vector::value_vector::ValueVector;

#[derive(Clone, Copy)]
pub struct TernaryOpArgs<'a> {
    pub a: &'a ValueVector,
    pub a_pos: usize,
    pub b: &'a ValueVector,
    pub b_pos: usize,
    pub c: &'a ValueVector,
    pub c_pos: usize,
    pub result_pos: usize,
}

pub trait TernaryOperationWrapper {
    fn operation(&mut self, args: &TernaryOpArgs<'_>, result: &mut ValueVector) -> Result<()>;
}

impl<F> TernaryOperationWrapper for F
where
    F: FnMut(&TernaryOpArgs<'_>, &mut ValueVector) -> Result<()>,
{
    fn operation(&mut self, args: &TernaryOpArgs<'_>, result: &mut ValueVector) -> Result<()> {
        self(args, result)
    }
}

pub struct TernaryFunctionWrapper<A, B, C, Res, F> {
    func: F,
    _types: PhantomData<fn(A, B, C) -> Res>,
}

impl<A, B, C, Res, F> TernaryFunctionWrapper<A, B, C, Res, F> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _types: PhantomData,
        }
    }
}

impl<A, B, C, Res, F> TernaryOperationWrapper for TernaryFunctionWrapper<A, B, C, Res, F>
where
    A: PhysicalValue,
    B: PhysicalValue,
    C: PhysicalValue,
    Res: PhysicalValue,
    F: FnMut(A, B, C) -> Result<Res>,
{
    #[inline]
    fn operation(&mut self, args: &TernaryOpArgs<'_>, result: &mut ValueVector) -> Result<()> {
        let value = (self.func)(
            args.a.get_value::<A>(args.a_pos),
            args.b.get_value::<B>(args.b_pos),
            args.c.get_value::<C>(args.c_pos),
        )?;
        result.set_value(args.result_pos, value);
        Ok(())
    }
}

/// First operand is a string, the other two fixed width; writes its own result
pub struct TernaryStringFunctionWrapper<B, C, F> {
    func: F,
    _types: PhantomData<fn(B, C)>,
}

impl<B, C, F> TernaryStringFunctionWrapper<B, C, F> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _types: PhantomData,
        }
    }
}

impl<B, C, F> TernaryOperationWrapper for TernaryStringFunctionWrapper<B, C, F>
where
    B: PhysicalValue,
    C: PhysicalValue,
    F: FnMut(&[u8], B, C, &mut ValueVector, usize) -> Result<()>,
{
    #[inline]
    fn operation(&mut self, args: &TernaryOpArgs<'_>, result: &mut ValueVector) -> Result<()> {
        (self.func)(
            StringVector::get_bytes(args.a, args.a_pos),
            args.b.get_value::<B>(args.b_pos),
            args.c.get_value::<C>(args.c_pos),
            result,
            args.result_pos,
        )
    }
}

/// Three string operands plus the compiled-pattern cache bound with the call
pub struct TernaryRegexFunctionWrapper<'a, F> {
    bind_data: &'a RegexBindData,
    func: F,
}

impl<'a, F> TernaryRegexFunctionWrapper<'a, F> {
    pub fn new(bind_data: &'a RegexBindData, func: F) -> Self {
        Self { bind_data, func }
    }
}

impl<F> TernaryOperationWrapper for TernaryRegexFunctionWrapper<'_, F>
where
    F: FnMut(&[u8], &[u8], &[u8], &mut ValueVector, usize, &RegexBindData) -> Result<()>,
{
    #[inline]
    fn operation(&mut self, args: &TernaryOpArgs<'_>, result: &mut ValueVector) -> Result<()> {
        (self.func)(
            StringVector::get_bytes(args.a, args.a_pos),
            StringVector::get_bytes(args.b, args.b_pos),
            StringVector::get_bytes(args.c, args.c_pos),
            result,
            args.result_pos,
            self.bind_data,
        )
    }
}

/// How an operand takes part in one call
#[derive(Clone, Copy)]
enum Operand {
    /// Flat operand at the given position, `None` when that value is null
    Flat(Option<usize>),
    Unflat,
}

impl Operand {
    /// Reads the operand's state once per call
    fn of(vector: &ValueVector) -> Self {
        let state = vector.state().read_recursive();
        if state.is_flat() {
            let pos = state.sel_vector().get(0);
            Operand::Flat((!vector.is_null(pos)).then_some(pos))
        } else {
            Operand::Unflat
        }
    }

    fn flat_position(self) -> Option<usize> {
        match self {
            Operand::Flat(pos) => pos,
            Operand::Unflat => None,
        }
    }
}

pub struct TernaryFunctionExecutor;

impl TernaryFunctionExecutor {
    pub fn execute<A, B, C, Res, F>(
        a: &ValueVector,
        b: &ValueVector,
        c: &ValueVector,
        result: &mut ValueVector,
        func: F,
    ) -> Result<()>
    where
        A: PhysicalValue,
        B: PhysicalValue,
        C: PhysicalValue,
        Res: PhysicalValue,
        F: FnMut(A, B, C) -> Result<Res>,
    {
        Self::execute_switch(a, b, c, result, &mut TernaryFunctionWrapper::new(func))
    }

    pub fn execute_switch<W: TernaryOperationWrapper>(
        a: &ValueVector,
        b: &ValueVector,
        c: &ValueVector,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        use Operand::{Flat, Unflat};

        result.reset_aux_buffer();
        match (Operand::of(a), Operand::of(b), Operand::of(c)) {
            (Flat(a_pos), Flat(b_pos), Flat(c_pos)) => {
                Self::execute_all_flat(a, a_pos, b, b_pos, c, c_pos, result, wrapper)
            }
            (Flat(None), _, _) | (_, Flat(None), _) | (_, _, Flat(None)) => {
                Self::set_selected_null(result);
                Ok(())
            }
            (a_op @ Flat(_), b_op, c_op)
            | (a_op, b_op @ Flat(_), c_op)
            | (a_op, b_op, c_op @ Flat(_)) => Self::execute_with_unflat(
                a,
                a_op.flat_position(),
                b,
                b_op.flat_position(),
                c,
                c_op.flat_position(),
                result,
                wrapper,
            ),
            (Unflat, Unflat, Unflat) => {
                Self::execute_with_unflat(a, None, b, None, c, None, result, wrapper)
            }
        }
    }

    fn set_selected_null(result: &mut ValueVector) {
        let state = result.state().clone();
        let guard = state.read_recursive();
        guard.sel_vector().for_each(|pos| result.set_null(pos, true));
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_all_flat<W: TernaryOperationWrapper>(
        a: &ValueVector,
        a_pos: Option<usize>,
        b: &ValueVector,
        b_pos: Option<usize>,
        c: &ValueVector,
        c_pos: Option<usize>,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        let result_pos = result.state().read_recursive().sel_vector().get(0);
        let (Some(a_pos), Some(b_pos), Some(c_pos)) = (a_pos, b_pos, c_pos) else {
            result.set_null(result_pos, true);
            return Ok(());
        };
        result.set_null(result_pos, false);
        let args = TernaryOpArgs {
            a,
            a_pos,
            b,
            b_pos,
            c,
            c_pos,
            result_pos,
        };
        wrapper.operation(&args, result)
    }

    /// Iterate the shared selection of the unflat operands
    ///
    /// A `Some` position marks a flat, non-null operand.
    #[allow(clippy::too_many_arguments)]
    fn execute_with_unflat<W: TernaryOperationWrapper>(
        a: &ValueVector,
        a_flat: Option<usize>,
        b: &ValueVector,
        b_flat: Option<usize>,
        c: &ValueVector,
        c_flat: Option<usize>,
        result: &mut ValueVector,
        wrapper: &mut W,
    ) -> Result<()> {
        let operands = [(a, a_flat), (b, b_flat), (c, c_flat)];
        let mut unflat = operands
            .iter()
            .filter(|(_, flat)| flat.is_none())
            .map(|(vector, _)| *vector);
        let Some(first) = unflat.next() else {
            crate::ku_unreachable!("execute_with_unflat needs an unflat operand");
        };
        let state: SharedChunkState = first.state().clone();
        let mut check_nulls = !first.has_no_nulls_guarantee();
        for vector in unflat {
            crate::ku_assert!(
                Arc::ptr_eq(vector.state(), &state),
                "unflat operands must share one selection"
            );
            check_nulls |= !vector.has_no_nulls_guarantee();
        }
        if !check_nulls {
            result.set_all_non_null();
        }
        let guard = state.read_recursive();
        guard.sel_vector().try_for_each(|pos| {
            let args = TernaryOpArgs {
                a,
                a_pos: a_flat.unwrap_or(pos),
                b,
                b_pos: b_flat.unwrap_or(pos),
                c,
                c_pos: c_flat.unwrap_or(pos),
                result_pos: pos,
            };
            if check_nulls {
                let is_null = (a_flat.is_none() && a.is_null(pos))
                    || (b_flat.is_none() && b.is_null(pos))
                    || (c_flat.is_none() && c.is_null(pos));
                result.set_null(pos, is_null);
                if is_null {
                    return Ok(());
                }
            }
            wrapper.operation(&args, result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::types::LogicalType;
    use crate::vector::data_chunk::DataChunkState;

    fn flat(value: Option<i64>) -> ValueVector {
        let mut v = ValueVector::with_state(
            LogicalType::int64(),
            &MemoryManager::default(),
            DataChunkState::single_value_shared(),
        );
        match value {
            Some(value) => v.set_value(0, value),
            None => v.set_null(0, true),
        }
        v
    }

    fn unflat(state: &SharedChunkState, values: &[Option<i64>]) -> ValueVector {
        let mut v =
            ValueVector::with_state(LogicalType::int64(), &MemoryManager::default(), state.clone());
        for (pos, value) in values.iter().enumerate() {
            match value {
                Some(value) => v.set_value(pos, *value),
                None => v.set_null(pos, true),
            }
        }
        v
    }

    fn clamp(v: i64, lo: i64, hi: i64) -> Result<i64> {
        Ok(v.clamp(lo, hi))
    }

    #[test]
    fn test_mixed_flat_and_unflat() {
        let state = DataChunkState::new_shared(3);
        let a = unflat(&state, &[Some(-5), None, Some(50)]);
        let b = flat(Some(0));
        let c = unflat(&state, &[Some(10), Some(10), Some(20)]);
        let mut result = unflat(&state, &[None, None, None]);
        TernaryFunctionExecutor::execute(&a, &b, &c, &mut result, clamp).unwrap();
        assert_eq!(result.get_value::<i64>(0), 0);
        assert!(result.is_null(1));
        assert_eq!(result.get_value::<i64>(2), 20);
    }

    #[test]
    fn test_flat_null_nulls_everything() {
        let state = DataChunkState::new_shared(2);
        let a = unflat(&state, &[Some(1), Some(2)]);
        let b = flat(None);
        let c = flat(Some(9));
        let mut result = unflat(&state, &[Some(0), Some(0)]);
        TernaryFunctionExecutor::execute(
            &a,
            &b,
            &c,
            &mut result,
            |_: i64, _: i64, _: i64| -> Result<i64> { panic!("must not be called") },
        )
        .unwrap();
        assert!(result.is_null(0) && result.is_null(1));
    }

    #[test]
    fn test_all_flat() {
        let (a, b, c) = (flat(Some(7)), flat(Some(1)), flat(Some(5)));
        let mut result = flat(Some(0));
        TernaryFunctionExecutor::execute(&a, &b, &c, &mut result, clamp).unwrap();
        assert_eq!(result.get_value::<i64>(0), 5);
    }

    /// Unflat vector over positions `0..6` whose selection is `{4, 2, 0}`
    fn filtered_state() -> SharedChunkState {
        let state = DataChunkState::new_shared(6);
        {
            let mut guard = state.write();
            let sel = guard.sel_vector_mut();
            sel.get_mutable_buffer()[..3].copy_from_slice(&[4, 2, 0]);
            sel.set_to_filtered_with(3);
        }
        state
    }

    #[test]
    fn test_every_flat_unflat_combination_on_a_filtered_selection() {
        const SENTINEL: i64 = -1;
        const FLAT_VALUES: [i64; 3] = [7, 8, 9];
        let unflat_value = |operand: usize, pos: usize| (operand as i64 + 1) * 10 + pos as i64;
        let combine = |a: i64, b: i64, c: i64| a * 10_000 + b * 100 + c;

        for with_nulls in [false, true] {
            for flat_mask in 0..8usize {
                let state = filtered_state();
                let is_flat = |operand: usize| flat_mask & (1 << operand) != 0;
                let operands: Vec<ValueVector> = (0..3)
                    .map(|operand| {
                        if is_flat(operand) {
                            return flat(Some(FLAT_VALUES[operand]));
                        }
                        let values: Vec<Option<i64>> = (0..6)
                            .map(|pos| {
                                // 2 is selected, 3 is not
                                let null = with_nulls && (pos == 2 || pos == 3);
                                (!null).then(|| unflat_value(operand, pos))
                            })
                            .collect();
                        unflat(&state, &values)
                    })
                    .collect();
                let all_flat = flat_mask == 7;
                let mut result = if all_flat {
                    flat(Some(SENTINEL))
                } else {
                    unflat(&state, &[Some(SENTINEL); 6])
                };

                let mut calls = 0;
                TernaryFunctionExecutor::execute(
                    &operands[0],
                    &operands[1],
                    &operands[2],
                    &mut result,
                    |a: i64, b: i64, c: i64| {
                        calls += 1;
                        Ok(combine(a, b, c))
                    },
                )
                .unwrap();

                let label = format!("flat_mask={:03b} with_nulls={}", flat_mask, with_nulls);
                let expected_at = |pos: usize| {
                    let arg = |operand: usize| {
                        if is_flat(operand) {
                            FLAT_VALUES[operand]
                        } else {
                            unflat_value(operand, pos)
                        }
                    };
                    combine(arg(0), arg(1), arg(2))
                };
                if all_flat {
                    assert_eq!(calls, 1, "{}", label);
                    assert!(!result.is_null(0), "{}", label);
                    assert_eq!(result.get_value::<i64>(0), combine(7, 8, 9), "{}", label);
                    continue;
                }

                let null_selected = with_nulls;
                assert_eq!(calls, if null_selected { 2 } else { 3 }, "{}", label);
                for pos in [4, 2, 0] {
                    if null_selected && pos == 2 {
                        assert!(result.is_null(pos), "{} pos {}", label, pos);
                    } else {
                        assert!(!result.is_null(pos), "{} pos {}", label, pos);
                        assert_eq!(result.get_value::<i64>(pos), expected_at(pos), "{} pos {}", label, pos);
                    }
                }
                for pos in [1, 3, 5] {
                    assert!(!result.is_null(pos), "{} pos {}", label, pos);
                    assert_eq!(result.get_value::<i64>(pos), SENTINEL, "{} pos {}", label, pos);
                }
                if !with_nulls {
                    assert!(result.has_no_nulls_guarantee(), "{}", label);
                }
            }
        }
    }

    #[test]
    fn test_flat_null_leaves_unselected_positions_alone() {
        let state = filtered_state();
        let a = unflat(&state, &[Some(1); 6]);
        let b = flat(None);
        let c = unflat(&state, &[Some(2); 6]);
        let mut result = unflat(&state, &[Some(-1); 6]);
        TernaryFunctionExecutor::execute(&a, &b, &c, &mut result, clamp).unwrap();
        for pos in [4, 2, 0] {
            assert!(result.is_null(pos));
        }
        for pos in [1, 3, 5] {
            assert!(!result.is_null(pos));
            assert_eq!(result.get_value::<i64>(pos), -1);
        }
    }
}
