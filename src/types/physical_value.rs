//! Storage-level value traits
//!
//! [`PhysicalValue`] is implemented by every type that can occupy a slot in a
//! vector buffer. Slots are read and written as little-endian bytes, so vector
//! buffers are plain `Vec<u8>` with no alignment requirements.

use std::fmt;

use num_traits::{NumCast, ToPrimitive};

use crate::types::physical_type::PhysicalTypeID;
use crate::types::value::Val;

/// A fixed-width value stored in a vector slot
pub trait PhysicalValue: Copy + Default + fmt::Debug + Send + Sync + 'static {
    const PHYSICAL_TYPE: PhysicalTypeID;

    /// Decode from the first `PHYSICAL_TYPE.fixed_type_size()` bytes
    fn read_from(bytes: &[u8]) -> Self;

    fn write_to(&self, bytes: &mut [u8]);
}

/// Physical type id of a storage type, resolved at compile time
pub fn physical_type_id_for<T: PhysicalValue>() -> PhysicalTypeID {
    T::PHYSICAL_TYPE
}

/// Fixed-width values that need no auxiliary storage and can be held in a [`Val`]
pub trait ScalarValue: PhysicalValue + PartialOrd {
    fn into_val(self) -> Val;

    fn from_val(val: &Val) -> Option<Self>;
}

/// Numeric scalars with checked arithmetic
///
/// `checked_*` return `None` on overflow. Integral division by zero also
/// returns `None`; callers report it separately.
pub trait NumericValue: ScalarValue + fmt::Display + NumCast + ToPrimitive {
    const IS_INTEGRAL: bool;
    const TYPE_NAME: &'static str;

    fn zero() -> Self;
    fn checked_add_value(self, rhs: Self) -> Option<Self>;
    fn checked_sub_value(self, rhs: Self) -> Option<Self>;
    fn checked_mul_value(self, rhs: Self) -> Option<Self>;
    fn checked_div_value(self, rhs: Self) -> Option<Self>;
    fn checked_rem_value(self, rhs: Self) -> Option<Self>;
    fn checked_neg_value(self) -> Option<Self>;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn checked_abs_value(self) -> Option<Self> {
        if self < Self::zero() {
            self.checked_neg_value()
        } else {
            Some(self)
        }
    }
}

macro_rules! impl_primitive_value {
    ($($ty:ty => $physical:ident),* $(,)?) => {$(
        impl PhysicalValue for $ty {
            const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::$physical;

            #[inline]
            fn read_from(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                <$ty>::from_le_bytes(buf)
            }

            #[inline]
            fn write_to(&self, bytes: &mut [u8]) {
                bytes[..std::mem::size_of::<$ty>()].copy_from_slice(&self.to_le_bytes());
            }
        }

        impl ScalarValue for $ty {
            fn into_val(self) -> Val {
                Val::$physical(self)
            }

            fn from_val(val: &Val) -> Option<Self> {
                match val {
                    Val::$physical(v) => Some(*v),
                    _ => None,
                }
            }
        }
    )*};
}

impl_primitive_value!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    u128 => Uint128,
    f32 => Float,
    f64 => Double,
);

impl PhysicalValue for bool {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::Bool;

    #[inline]
    fn read_from(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    #[inline]
    fn write_to(&self, bytes: &mut [u8]) {
        bytes[0] = <u8 as From<bool>>::from(*self);
    }
}

impl ScalarValue for bool {
    fn into_val(self) -> Val {
        Val::Bool(self)
    }

    fn from_val(val: &Val) -> Option<Self> {
        match val {
            Val::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! impl_integral_numeric {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl NumericValue for $ty {
            const IS_INTEGRAL: bool = true;
            const TYPE_NAME: &'static str = $name;

            fn zero() -> Self {
                0
            }

            fn checked_add_value(self, rhs: Self) -> Option<Self> {
                self.checked_add(rhs)
            }

            fn checked_sub_value(self, rhs: Self) -> Option<Self> {
                self.checked_sub(rhs)
            }

            fn checked_mul_value(self, rhs: Self) -> Option<Self> {
                self.checked_mul(rhs)
            }

            fn checked_div_value(self, rhs: Self) -> Option<Self> {
                self.checked_div(rhs)
            }

            fn checked_rem_value(self, rhs: Self) -> Option<Self> {
                self.checked_rem(rhs)
            }

            fn checked_neg_value(self) -> Option<Self> {
                self.checked_neg()
            }
        }
    )*};
}

impl_integral_numeric!(
    i8 => "INT8",
    i16 => "INT16",
    i32 => "INT32",
    i64 => "INT64",
    u8 => "UINT8",
    u16 => "UINT16",
    u32 => "UINT32",
    u64 => "UINT64",
    u128 => "UINT128",
);

// Floating point results only overflow when finite inputs produce an infinity.
macro_rules! impl_float_numeric {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl NumericValue for $ty {
            const IS_INTEGRAL: bool = false;
            const TYPE_NAME: &'static str = $name;

            fn zero() -> Self {
                0.0
            }

            fn checked_add_value(self, rhs: Self) -> Option<Self> {
                finite_or_none(self, rhs, self + rhs)
            }

            fn checked_sub_value(self, rhs: Self) -> Option<Self> {
                finite_or_none(self, rhs, self - rhs)
            }

            fn checked_mul_value(self, rhs: Self) -> Option<Self> {
                finite_or_none(self, rhs, self * rhs)
            }

            fn checked_div_value(self, rhs: Self) -> Option<Self> {
                if rhs == 0.0 {
                    return None;
                }
                finite_or_none(self, rhs, self / rhs)
            }

            fn checked_rem_value(self, rhs: Self) -> Option<Self> {
                if rhs == 0.0 {
                    return None;
                }
                Some(self % rhs)
            }

            fn checked_neg_value(self) -> Option<Self> {
                Some(-self)
            }
        }
    )*};
}

impl_float_numeric!(f32 => "FLOAT", f64 => "DOUBLE");

fn finite_or_none<T: num_traits::Float>(lhs: T, rhs: T, result: T) -> Option<T> {
    if result.is_infinite() && lhs.is_finite() && rhs.is_finite() {
        None
    } else {
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_slots() {
        let mut buf = [0u8; 8];
        0x0102_0304i32.write_to(&mut buf);
        assert_eq!(&buf[..4], &[4, 3, 2, 1]);
        assert_eq!(i32::read_from(&buf), 0x0102_0304);

        (-1.5f64).write_to(&mut buf);
        assert_eq!(f64::read_from(&buf), -1.5);

        true.write_to(&mut buf);
        assert!(bool::read_from(&buf));
    }

    #[test]
    fn test_physical_type_ids() {
        assert_eq!(physical_type_id_for::<i64>(), PhysicalTypeID::Int64);
        assert_eq!(physical_type_id_for::<u8>(), PhysicalTypeID::Uint8);
        assert_eq!(physical_type_id_for::<f32>(), PhysicalTypeID::Float);
        assert_eq!(physical_type_id_for::<bool>(), PhysicalTypeID::Bool);
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(i8::MAX.checked_add_value(1), None);
        assert_eq!(5i32.checked_div_value(0), None);
        assert_eq!(i64::MIN.checked_abs_value(), None);
        assert_eq!((-3i16).checked_abs_value(), Some(3));
        assert_eq!(7u8.checked_abs_value(), Some(7));
        assert_eq!(f64::MAX.checked_mul_value(2.0), None);
        assert_eq!(1.5f64.checked_add_value(1.0), Some(2.5));
    }

    #[test]
    fn test_val_conversion() {
        assert_eq!(42i64.into_val(), Val::Int64(42));
        assert_eq!(i64::from_val(&Val::Int64(7)), Some(7));
        assert_eq!(i64::from_val(&Val::Int32(7)), None);
    }
}
