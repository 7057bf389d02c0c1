//! Comparison operators
//!
//! Fixed-width values compare through `PartialOrd` on their storage type,
//! strings and blobs compare their payload bytes lexicographically.

pub trait ComparisonOperation {
    const NAME: &'static str;

    fn operation<T: PartialOrd + ?Sized>(left: &T, right: &T) -> bool;
}

macro_rules! comparison_operation {
    ($name:ident, $fn_name:literal, $op:tt) => {
        pub struct $name;

        impl ComparisonOperation for $name {
            const NAME: &'static str = $fn_name;

            #[inline]
            fn operation<T: PartialOrd + ?Sized>(left: &T, right: &T) -> bool {
                left $op right
            }
        }
    };
}

comparison_operation!(Equals, "EQUALS", ==);
comparison_operation!(NotEquals, "NOT_EQUALS", !=);
comparison_operation!(GreaterThan, "GREATER_THAN", >);
comparison_operation!(GreaterThanEquals, "GREATER_THAN_EQUALS", >=);
comparison_operation!(LessThan, "LESS_THAN", <);
comparison_operation!(LessThanEquals, "LESS_THAN_EQUALS", <=);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::temporal::Interval;

    #[test]
    fn test_scalars() {
        assert!(Equals::operation(&3i64, &3));
        assert!(NotEquals::operation(&1u8, &2));
        assert!(GreaterThan::operation(&2.5f64, &-1.0));
        assert!(!LessThan::operation(&f64::NAN, &1.0));
        assert!(LessThanEquals::operation(&true, &true));
    }

    #[test]
    fn test_bytes_are_lexicographic() {
        assert!(LessThan::operation(b"abc".as_slice(), b"abd".as_slice()));
        assert!(GreaterThan::operation(b"ab".as_slice(), b"a".as_slice()));
        assert!(GreaterThanEquals::operation("b".as_bytes(), "abc".as_bytes()));
    }

    #[test]
    fn test_intervals_normalize() {
        assert!(Equals::operation(&Interval::new(1, 0, 0), &Interval::new(0, 30, 0)));
    }
}
