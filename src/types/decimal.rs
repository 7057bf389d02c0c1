//! Fixed-point helpers for DECIMAL values stored as scaled integers

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::common::error::{KuzuError, Result};

pub struct DecimalUtils;

impl DecimalUtils {
    pub fn pow10(exp: u32) -> i128 {
        10i128.pow(exp)
    }

    /// Whether `unscaled` has at most `precision` digits
    pub fn fits_precision(unscaled: i128, precision: u32) -> bool {
        unscaled.unsigned_abs() < Self::pow10(precision) as u128
    }

    pub fn to_string(unscaled: i128, scale: u32) -> String {
        if let Ok(decimal) = Decimal::try_from_i128_with_scale(unscaled, scale) {
            return decimal.to_string();
        }
        // Wider than rust_decimal's 96-bit mantissa
        let sign = if unscaled < 0 { "-" } else { "" };
        let digits = unscaled.unsigned_abs().to_string();
        if scale == 0 {
            return format!("{}{}", sign, digits);
        }
        let scale = scale as usize;
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        format!("{}{}.{}", sign, int_part, frac_part)
    }

    /// Parse a decimal literal and rescale it to `scale`, rounding half away from zero
    pub fn from_str(s: &str, precision: u32, scale: u32) -> Result<i128> {
        let invalid = || {
            KuzuError::Conversion(format!(
                "Cast failed. {} is not a valid DECIMAL({}, {}).",
                s, precision, scale
            ))
        };
        let mut decimal = Decimal::from_str(s.trim()).map_err(|_| invalid())?;
        decimal = decimal.round_dp_with_strategy(
            scale,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        );
        decimal.rescale(scale);
        if decimal.scale() != scale {
            return Err(invalid());
        }
        let unscaled = decimal.mantissa();
        if !Self::fits_precision(unscaled, precision) {
            return Err(KuzuError::Overflow(format!(
                "To Decimal Cast Failed: {} is not in DECIMAL({}, {}) range",
                s, precision, scale
            )));
        }
        Ok(unscaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string() {
        assert_eq!(DecimalUtils::to_string(12345, 2), "123.45");
        assert_eq!(DecimalUtils::to_string(-5, 3), "-0.005");
        assert_eq!(DecimalUtils::to_string(7, 0), "7");
        let wide = 10i128.pow(37) + 1;
        assert_eq!(
            DecimalUtils::to_string(wide, 30),
            "10000000.000000000000000000000000000001"
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(DecimalUtils::from_str("123.45", 10, 2).unwrap(), 12345);
        assert_eq!(DecimalUtils::from_str("1.005", 10, 2).unwrap(), 101);
        assert_eq!(DecimalUtils::from_str("-2", 5, 1).unwrap(), -20);
        assert!(matches!(
            DecimalUtils::from_str("1000", 4, 2),
            Err(KuzuError::Overflow(_))
        ));
        assert!(DecimalUtils::from_str("abc", 4, 2).is_err());
    }
}
