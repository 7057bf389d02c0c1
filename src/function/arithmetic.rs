//! Arithmetic operations over numeric storage types
//!
//! Integral results that leave the range of their type raise `Overflow`
//! errors, so do finite floating point inputs whose result is infinite.

use crate::common::error::{KuzuError, Result};
use crate::types::physical_value::NumericValue;

pub trait BinaryArithmeticOperation {
    const NAME: &'static str;

    fn operation<T: NumericValue>(left: T, right: T) -> Result<T>;
}

pub trait UnaryArithmeticOperation {
    const NAME: &'static str;

    fn operation<T: NumericValue>(input: T) -> Result<T>;
}

fn overflow<T: NumericValue>(left: T, op: &str, right: T) -> KuzuError {
    KuzuError::Overflow(format!(
        "Value {} {} {} is not within {} range",
        left,
        op,
        right,
        T::TYPE_NAME
    ))
}

pub struct Add;

impl BinaryArithmeticOperation for Add {
    const NAME: &'static str = "ADD";

    #[inline]
    fn operation<T: NumericValue>(left: T, right: T) -> Result<T> {
        left.checked_add_value(right)
            .ok_or_else(|| overflow(left, "+", right))
    }
}

pub struct Subtract;

impl BinaryArithmeticOperation for Subtract {
    const NAME: &'static str = "SUBTRACT";

    #[inline]
    fn operation<T: NumericValue>(left: T, right: T) -> Result<T> {
        left.checked_sub_value(right)
            .ok_or_else(|| overflow(left, "-", right))
    }
}

pub struct Multiply;

impl BinaryArithmeticOperation for Multiply {
    const NAME: &'static str = "MULTIPLY";

    #[inline]
    fn operation<T: NumericValue>(left: T, right: T) -> Result<T> {
        left.checked_mul_value(right)
            .ok_or_else(|| overflow(left, "*", right))
    }
}

pub struct Divide;

impl BinaryArithmeticOperation for Divide {
    const NAME: &'static str = "DIVIDE";

    #[inline]
    fn operation<T: NumericValue>(left: T, right: T) -> Result<T> {
        if right.is_zero() {
            return Err(KuzuError::Runtime("Divide by zero.".to_string()));
        }
        left.checked_div_value(right)
            .ok_or_else(|| overflow(left, "/", right))
    }
}

pub struct Modulo;

impl BinaryArithmeticOperation for Modulo {
    const NAME: &'static str = "MODULO";

    #[inline]
    fn operation<T: NumericValue>(left: T, right: T) -> Result<T> {
        if right.is_zero() {
            return Err(KuzuError::Runtime("Modulo by zero.".to_string()));
        }
        // MIN % -1 is mathematically 0 even though the hardware division overflows.
        Ok(left.checked_rem_value(right).unwrap_or_else(T::zero))
    }
}

pub struct Negate;

impl UnaryArithmeticOperation for Negate {
    const NAME: &'static str = "NEGATE";

    #[inline]
    fn operation<T: NumericValue>(input: T) -> Result<T> {
        input.checked_neg_value().ok_or_else(|| {
            KuzuError::Overflow(format!(
                "Value -{} is not within {} range",
                input,
                T::TYPE_NAME
            ))
        })
    }
}

pub struct Abs;

impl UnaryArithmeticOperation for Abs {
    const NAME: &'static str = "ABS";

    #[inline]
    fn operation<T: NumericValue>(input: T) -> Result<T> {
        input.checked_abs_value().ok_or_else(|| {
            KuzuError::Overflow(format!(
                "Cannot take the absolute value of {} within {} range.",
                input,
                T::TYPE_NAME
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::int128::Int128;

    #[test]
    fn test_integral_overflow_messages() {
        let err = Add::operation(i8::MAX, 1i8).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Overflow exception: Value 127 + 1 is not within INT8 range"
        );
        assert!(Subtract::operation(0u32, 1u32).is_err());
        assert!(Multiply::operation(i64::MAX, 2).is_err());
        assert_eq!(Multiply::operation(-3i16, 4).unwrap(), -12);
    }

    #[test]
    fn test_division() {
        assert_eq!(Divide::operation(7i32, 2).unwrap(), 3);
        assert!(matches!(Divide::operation(1i64, 0), Err(KuzuError::Runtime(_))));
        assert!(matches!(Divide::operation(1.0f64, 0.0), Err(KuzuError::Runtime(_))));
        assert!(Divide::operation(i32::MIN, -1).is_err());
        assert_eq!(Modulo::operation(-7i64, 3).unwrap(), -1);
        assert_eq!(Modulo::operation(i64::MIN, -1).unwrap(), 0);
        assert!(Modulo::operation(3u8, 0).is_err());
    }

    #[test]
    fn test_unary() {
        assert_eq!(Negate::operation(5i64).unwrap(), -5);
        assert!(Negate::operation(i16::MIN).is_err());
        assert!(Negate::operation(Int128::MIN).is_err());
        assert_eq!(Abs::operation(-2.5f32).unwrap(), 2.5);
        assert!(Abs::operation(i32::MIN).is_err());
        assert_eq!(Abs::operation(9u64).unwrap(), 9);
    }

    #[test]
    fn test_float_overflow() {
        assert!(Multiply::operation(f64::MAX, 2.0).is_err());
        assert!(Add::operation(f64::INFINITY, 1.0).unwrap().is_infinite());
    }
}
