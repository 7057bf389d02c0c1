//! 128-bit signed integer stored as a `(low, high)` word pair

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_traits::{NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::common::error::{KuzuError, Result};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::{NumericValue, PhysicalValue, ScalarValue};
use crate::types::value::Val;

/// Two's complement 128-bit integer: `high` carries the sign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Int128 {
    pub low: u64,
    pub high: i64,
}

impl Int128 {
    pub const MIN: Int128 = Int128 {
        low: 0,
        high: i64::MIN,
    };
    pub const MAX: Int128 = Int128 {
        low: u64::MAX,
        high: i64::MAX,
    };

    pub const fn new(low: u64, high: i64) -> Self {
        Self { low, high }
    }

    pub const fn from_i128(value: i128) -> Self {
        Self {
            low: value as u64,
            high: (value >> 64) as i64,
        }
    }

    pub const fn to_i128(self) -> i128 {
        ((self.high as i128) << 64) | self.low as i128
    }

    /// Negate, failing on the one value with no positive counterpart
    pub fn negate(self) -> Result<Int128> {
        if self == Self::MIN {
            return Err(KuzuError::Overflow(
                "INT128 is out of range: cannot negate INT128_MIN".to_string(),
            ));
        }
        Ok(Self::from_i128(-self.to_i128()))
    }

    pub fn try_add(self, rhs: Int128) -> Result<Int128> {
        self.to_i128()
            .checked_add(rhs.to_i128())
            .map(Self::from_i128)
            .ok_or_else(|| KuzuError::Overflow("INT128 is out of range: cannot add.".to_string()))
    }

    pub fn try_sub(self, rhs: Int128) -> Result<Int128> {
        self.to_i128()
            .checked_sub(rhs.to_i128())
            .map(Self::from_i128)
            .ok_or_else(|| {
                KuzuError::Overflow("INT128 is out of range: cannot subtract.".to_string())
            })
    }

    pub fn try_mul(self, rhs: Int128) -> Result<Int128> {
        self.to_i128()
            .checked_mul(rhs.to_i128())
            .map(Self::from_i128)
            .ok_or_else(|| {
                KuzuError::Overflow("INT128 is out of range: cannot multiply.".to_string())
            })
    }

    /// Narrow to another numeric type
    pub fn try_cast<T: NumCast>(self) -> Result<T> {
        <T as NumCast>::from(self).ok_or_else(|| {
            KuzuError::Overflow(format!(
                "Cast failed. {} is not within {} range.",
                self,
                std::any::type_name::<T>()
            ))
        })
    }
}

impl From<i64> for Int128 {
    fn from(value: i64) -> Self {
        Self::from_i128(value as i128)
    }
}

impl From<i128> for Int128 {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}

impl From<Int128> for i128 {
    fn from(value: Int128) -> Self {
        value.to_i128()
    }
}

impl PartialOrd for Int128 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Int128 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.high
            .cmp(&other.high)
            .then_with(|| self.low.cmp(&other.low))
    }
}

impl fmt::Display for Int128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Int128::to_i128(*self))
    }
}

impl FromStr for Int128 {
    type Err = KuzuError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim().parse::<i128>().map(Self::from_i128).map_err(|_| {
            KuzuError::Conversion(format!("Cast failed. {} is not in INT128 range.", s))
        })
    }
}

impl ToPrimitive for Int128 {
    fn to_i64(&self) -> Option<i64> {
        Int128::to_i128(*self).to_i64()
    }

    fn to_u64(&self) -> Option<u64> {
        Int128::to_i128(*self).to_u64()
    }

    fn to_i128(&self) -> Option<i128> {
        Some(Int128::to_i128(*self))
    }

    fn to_u128(&self) -> Option<u128> {
        Int128::to_i128(*self).to_u128()
    }

    fn to_f64(&self) -> Option<f64> {
        Some(Int128::to_i128(*self) as f64)
    }
}

impl NumCast for Int128 {
    fn from<T: ToPrimitive>(n: T) -> Option<Self> {
        n.to_i128().map(Self::from_i128)
    }
}

impl PhysicalValue for Int128 {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::Int128;

    fn read_from(bytes: &[u8]) -> Self {
        Self {
            low: u64::read_from(&bytes[..8]),
            high: i64::read_from(&bytes[8..16]),
        }
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.low.write_to(&mut bytes[..8]);
        self.high.write_to(&mut bytes[8..16]);
    }
}

impl ScalarValue for Int128 {
    fn into_val(self) -> Val {
        Val::Int128(self)
    }

    fn from_val(val: &Val) -> Option<Self> {
        match val {
            Val::Int128(v) => Some(*v),
            _ => None,
        }
    }
}

impl NumericValue for Int128 {
    const IS_INTEGRAL: bool = true;
    const TYPE_NAME: &'static str = "INT128";

    fn zero() -> Self {
        Int128::default()
    }

    fn checked_add_value(self, rhs: Self) -> Option<Self> {
        self.try_add(rhs).ok()
    }

    fn checked_sub_value(self, rhs: Self) -> Option<Self> {
        self.try_sub(rhs).ok()
    }

    fn checked_mul_value(self, rhs: Self) -> Option<Self> {
        self.try_mul(rhs).ok()
    }

    fn checked_div_value(self, rhs: Self) -> Option<Self> {
        self.to_i128()
            .checked_div(rhs.to_i128())
            .map(Self::from_i128)
    }

    fn checked_rem_value(self, rhs: Self) -> Option<Self> {
        self.to_i128()
            .checked_rem(rhs.to_i128())
            .map(Self::from_i128)
    }

    fn checked_neg_value(self) -> Option<Self> {
        self.negate().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate_min_overflows() {
        let err = Int128::MIN.negate().unwrap_err();
        assert!(matches!(err, KuzuError::Overflow(_)));
    }

    #[test]
    fn test_negate_round_trips_through_i64() {
        let negated = Int128::new(5, 0).negate().unwrap();
        assert_eq!(negated, Int128::new(u64::MAX - 4, -1));
        assert_eq!(negated.try_cast::<i64>().unwrap(), -5);
    }

    #[test]
    fn test_ordering_uses_signed_high_word() {
        let minus_one = <Int128 as From<i64>>::from(-1i64);
        let one = <Int128 as From<i64>>::from(1i64);
        assert!(minus_one < one);
        assert!(Int128::MIN < minus_one);
        assert!(Int128::new(u64::MAX, 0) < Int128::new(0, 1));
    }

    #[test]
    fn test_overflowing_ops() {
        assert!(Int128::MAX.try_add(<Int128 as From<i64>>::from(1i64)).is_err());
        assert!(Int128::MIN.try_sub(<Int128 as From<i64>>::from(1i64)).is_err());
        assert!(Int128::MAX.try_mul(<Int128 as From<i64>>::from(2i64)).is_err());
        assert_eq!(
            <Int128 as From<i64>>::from(6i64).try_mul(<Int128 as From<i64>>::from(-7i64)).unwrap(),
            <Int128 as From<i64>>::from(-42i64)
        );
    }

    #[test]
    fn test_narrowing_cast() {
        let big = Int128::from_i128(i64::MAX as i128 + 1);
        assert!(big.try_cast::<i64>().is_err());
        assert_eq!(<Int128 as From<i64>>::from(300i64).try_cast::<i16>().unwrap(), 300);
        assert!(<Int128 as From<i64>>::from(300i64).try_cast::<i8>().is_err());
    }

    #[test]
    fn test_parse_and_display() {
        let value: Int128 = "-170141183460469231731687303715884105728".parse().unwrap();
        assert_eq!(value, Int128::MIN);
        assert_eq!(<Int128 as From<i64>>::from(-12i64).to_string(), "-12");
        assert!("12x".parse::<Int128>().is_err());
    }
}
