//! Type dispatch and type arithmetic
//!
//! Generic code is monomorphised per storage type. [`TypeUtils::visit`] is the
//! single runtime switch from a [`LogicalType`] to the matching storage type;
//! callers supply a visitor with one generic entry point per family.

use crate::common::error::{KuzuError, Result};
use crate::types::entries::{InternalId, Pointer};
use crate::types::int128::Int128;
use crate::types::logical_type::{
    ArrayType, DecimalType, ExtraTypeInfo, ListType, LogicalType, LogicalTypeID, MapType,
    StructField, StructType, DECIMAL_MAX_PRECISION,
};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::{NumericValue, ScalarValue};
use crate::types::temporal::{
    Date, Interval, Timestamp, TimestampMs, TimestampNs, TimestampSec, TimestampTz,
};

/// Callback invoked by [`TypeUtils::visit`] with the storage type of a logical type
pub trait TypeVisitor {
    type Output;

    fn visit_scalar<T: ScalarValue>(self, data_type: &LogicalType) -> Self::Output;

    fn visit_string(self, data_type: &LogicalType) -> Self::Output;

    fn visit_list(self, data_type: &LogicalType) -> Self::Output;

    fn visit_struct(self, data_type: &LogicalType) -> Self::Output;
}

/// Callback invoked by [`TypeUtils::visit_numeric`]
pub trait NumericTypeVisitor {
    type Output;

    fn visit<T: NumericValue>(self) -> Self::Output;
}

pub struct TypeUtils;

impl TypeUtils {
    /// Dispatch on the storage type of `data_type`
    ///
    /// Every logical type except ANY routes to exactly one visitor method.
    pub fn visit<V: TypeVisitor>(data_type: &LogicalType, visitor: V) -> V::Output {
        match data_type.type_id() {
            LogicalTypeID::Bool => visitor.visit_scalar::<bool>(data_type),
            LogicalTypeID::Int64 | LogicalTypeID::Serial => visitor.visit_scalar::<i64>(data_type),
            LogicalTypeID::Int32 => visitor.visit_scalar::<i32>(data_type),
            LogicalTypeID::Int16 => visitor.visit_scalar::<i16>(data_type),
            LogicalTypeID::Int8 => visitor.visit_scalar::<i8>(data_type),
            LogicalTypeID::Uint64 => visitor.visit_scalar::<u64>(data_type),
            LogicalTypeID::Uint32 => visitor.visit_scalar::<u32>(data_type),
            LogicalTypeID::Uint16 => visitor.visit_scalar::<u16>(data_type),
            LogicalTypeID::Uint8 => visitor.visit_scalar::<u8>(data_type),
            LogicalTypeID::Int128 | LogicalTypeID::Uuid => {
                visitor.visit_scalar::<Int128>(data_type)
            }
            LogicalTypeID::Uint128 => visitor.visit_scalar::<u128>(data_type),
            LogicalTypeID::Double => visitor.visit_scalar::<f64>(data_type),
            LogicalTypeID::Float => visitor.visit_scalar::<f32>(data_type),
            LogicalTypeID::Date => visitor.visit_scalar::<Date>(data_type),
            LogicalTypeID::Timestamp => visitor.visit_scalar::<Timestamp>(data_type),
            LogicalTypeID::TimestampSec => visitor.visit_scalar::<TimestampSec>(data_type),
            LogicalTypeID::TimestampMs => visitor.visit_scalar::<TimestampMs>(data_type),
            LogicalTypeID::TimestampNs => visitor.visit_scalar::<TimestampNs>(data_type),
            LogicalTypeID::TimestampTz => visitor.visit_scalar::<TimestampTz>(data_type),
            LogicalTypeID::Interval => visitor.visit_scalar::<Interval>(data_type),
            LogicalTypeID::InternalId => visitor.visit_scalar::<InternalId>(data_type),
            LogicalTypeID::Pointer => visitor.visit_scalar::<Pointer>(data_type),
            LogicalTypeID::Decimal => match data_type.physical_type() {
                PhysicalTypeID::Int16 => visitor.visit_scalar::<i16>(data_type),
                PhysicalTypeID::Int32 => visitor.visit_scalar::<i32>(data_type),
                PhysicalTypeID::Int64 => visitor.visit_scalar::<i64>(data_type),
                PhysicalTypeID::Int128 => visitor.visit_scalar::<Int128>(data_type),
                other => crate::ku_unreachable!("DECIMAL stored as {}", other),
            },
            LogicalTypeID::String | LogicalTypeID::Blob => visitor.visit_string(data_type),
            LogicalTypeID::List | LogicalTypeID::Array | LogicalTypeID::Map => {
                visitor.visit_list(data_type)
            }
            LogicalTypeID::Struct
            | LogicalTypeID::Node
            | LogicalTypeID::Rel
            | LogicalTypeID::RecursiveRel
            | LogicalTypeID::Union => visitor.visit_struct(data_type),
            LogicalTypeID::Any => crate::ku_unreachable!("cannot dispatch on ANY"),
        }
    }

    /// Dispatch on a numeric type, failing at bind time for anything else
    pub fn visit_numeric<V: NumericTypeVisitor>(
        data_type: &LogicalType,
        visitor: V,
    ) -> Result<V::Output> {
        let output = match data_type.physical_type() {
            PhysicalTypeID::Int8 => visitor.visit::<i8>(),
            PhysicalTypeID::Int16 => visitor.visit::<i16>(),
            PhysicalTypeID::Int32 if data_type.type_id() != LogicalTypeID::Date => {
                visitor.visit::<i32>()
            }
            PhysicalTypeID::Int64 if data_type.type_id().is_numeric() => visitor.visit::<i64>(),
            PhysicalTypeID::Int128 if data_type.type_id() != LogicalTypeID::Uuid => {
                visitor.visit::<Int128>()
            }
            PhysicalTypeID::Uint8 => visitor.visit::<u8>(),
            PhysicalTypeID::Uint16 => visitor.visit::<u16>(),
            PhysicalTypeID::Uint32 => visitor.visit::<u32>(),
            PhysicalTypeID::Uint64 => visitor.visit::<u64>(),
            PhysicalTypeID::Uint128 => visitor.visit::<u128>(),
            PhysicalTypeID::Float => visitor.visit::<f32>(),
            PhysicalTypeID::Double => visitor.visit::<f64>(),
            _ => {
                return Err(KuzuError::Binder(format!(
                    "{} is not a numeric type.",
                    data_type
                )))
            }
        };
        Ok(output)
    }

    /// Common supertype of two types under implicit casting, if any
    pub fn try_get_max_logical_type(left: &LogicalType, right: &LogicalType) -> Option<LogicalType> {
        if left == right {
            return Some(left.clone());
        }
        let left_id = normalize_serial(left.type_id());
        let right_id = normalize_serial(right.type_id());
        if left_id == LogicalTypeID::Any {
            return Some(right.clone());
        }
        if right_id == LogicalTypeID::Any {
            return Some(left.clone());
        }
        if left.udt_name().is_some() || right.udt_name().is_some() {
            return None;
        }
        if left_id == right_id {
            return match left_id {
                LogicalTypeID::Int64 => Some(LogicalType::int64()),
                LogicalTypeID::List => max_child(left, right).map(LogicalType::list),
                LogicalTypeID::Array => {
                    let child = max_child(left, right)?;
                    if ArrayType::get_num_elements(left) == ArrayType::get_num_elements(right) {
                        Some(LogicalType::array(child, ArrayType::get_num_elements(left)))
                    } else {
                        Some(LogicalType::list(child))
                    }
                }
                LogicalTypeID::Map => {
                    let key = Self::try_get_max_logical_type(
                        MapType::get_key_type(left),
                        MapType::get_key_type(right),
                    )?;
                    let value = Self::try_get_max_logical_type(
                        MapType::get_value_type(left),
                        MapType::get_value_type(right),
                    )?;
                    Some(LogicalType::map(key, value))
                }
                LogicalTypeID::Struct => {
                    combine_struct_fields(left, right, Self::try_get_max_logical_type)
                        .map(LogicalType::struct_type)
                }
                LogicalTypeID::Decimal => max_decimal(left, right),
                _ => None,
            };
        }
        match (left_id, right_id) {
            (LogicalTypeID::List, LogicalTypeID::Array)
            | (LogicalTypeID::Array, LogicalTypeID::List) => {
                max_child(left, right).map(LogicalType::list)
            }
            (l, r) if l.is_numeric() && r.is_numeric() => max_numeric(left, right),
            (l, r) if is_timestamp_like(l) && is_timestamp_like(r) => Some(LogicalType::timestamp()),
            (LogicalTypeID::String, r) if accepts_string_literal(r) => Some(right.clone()),
            (l, LogicalTypeID::String) if accepts_string_literal(l) => Some(left.clone()),
            _ => None,
        }
    }

    /// Like [`Self::try_get_max_logical_type`], falling back to STRING
    pub fn combine_types(left: &LogicalType, right: &LogicalType) -> LogicalType {
        if let Some(max) = Self::try_get_max_logical_type(left, right) {
            return max;
        }
        match (left.type_id(), right.type_id()) {
            (LogicalTypeID::List, LogicalTypeID::List) => LogicalType::list(Self::combine_types(
                ListType::get_child_type(left),
                ListType::get_child_type(right),
            )),
            (LogicalTypeID::Map, LogicalTypeID::Map) => LogicalType::map(
                Self::combine_types(MapType::get_key_type(left), MapType::get_key_type(right)),
                Self::combine_types(MapType::get_value_type(left), MapType::get_value_type(right)),
            ),
            (LogicalTypeID::Struct, LogicalTypeID::Struct) => {
                combine_struct_fields(left, right, |l, r| Some(Self::combine_types(l, r)))
                    .map(LogicalType::struct_type)
                    .unwrap_or_else(LogicalType::string)
            }
            _ => LogicalType::string(),
        }
    }

    /// Replace every ANY inside `data_type` with `replacement`
    pub fn purge_any(data_type: &LogicalType, replacement: &LogicalType) -> LogicalType {
        match (data_type.type_id(), data_type.extra_type_info()) {
            (LogicalTypeID::Any, _) => replacement.clone(),
            (LogicalTypeID::List, Some(ExtraTypeInfo::List { child_type })) => {
                LogicalType::list(Self::purge_any(child_type, replacement))
            }
            (
                LogicalTypeID::Array,
                Some(ExtraTypeInfo::Array {
                    child_type,
                    num_elements,
                }),
            ) => LogicalType::array(Self::purge_any(child_type, replacement), *num_elements),
            (LogicalTypeID::Map, Some(_)) => LogicalType::map(
                Self::purge_any(MapType::get_key_type(data_type), replacement),
                Self::purge_any(MapType::get_value_type(data_type), replacement),
            ),
            (LogicalTypeID::Struct, Some(ExtraTypeInfo::Struct { fields })) => {
                LogicalType::struct_type(purge_fields(fields, replacement))
            }
            (LogicalTypeID::Union, Some(ExtraTypeInfo::Struct { fields })) => {
                LogicalType::union_type(purge_fields(&fields[1..], replacement))
            }
            _ => data_type.clone(),
        }
    }
}

fn purge_fields(fields: &[StructField], replacement: &LogicalType) -> Vec<StructField> {
    fields
        .iter()
        .map(|field| {
            StructField::new(
                field.name(),
                TypeUtils::purge_any(field.data_type(), replacement),
            )
        })
        .collect()
}

fn normalize_serial(type_id: LogicalTypeID) -> LogicalTypeID {
    if type_id == LogicalTypeID::Serial {
        LogicalTypeID::Int64
    } else {
        type_id
    }
}

fn is_timestamp_like(type_id: LogicalTypeID) -> bool {
    type_id.is_temporal() && type_id != LogicalTypeID::Interval
}

/// Types a STRING literal converts to implicitly
fn accepts_string_literal(type_id: LogicalTypeID) -> bool {
    type_id.is_temporal() || matches!(type_id, LogicalTypeID::Uuid | LogicalTypeID::Blob)
}

fn max_child(left: &LogicalType, right: &LogicalType) -> Option<LogicalType> {
    TypeUtils::try_get_max_logical_type(
        ListType::get_child_type(left),
        ListType::get_child_type(right),
    )
}

fn combine_struct_fields(
    left: &LogicalType,
    right: &LogicalType,
    combine: impl Fn(&LogicalType, &LogicalType) -> Option<LogicalType>,
) -> Option<Vec<StructField>> {
    let left_fields = StructType::get_fields(left);
    let right_fields = StructType::get_fields(right);
    if left_fields.len() != right_fields.len() {
        return None;
    }
    left_fields
        .iter()
        .zip(right_fields)
        .map(|(l, r)| {
            if !l.name().eq_ignore_ascii_case(r.name()) {
                return None;
            }
            combine(l.data_type(), r.data_type()).map(|ty| StructField::new(l.name(), ty))
        })
        .collect()
}

/// `(signed, digits, bits)` of an integral type
fn integral_info(type_id: LogicalTypeID) -> Option<(bool, u32, u32)> {
    match type_id {
        LogicalTypeID::Int8 => Some((true, 3, 8)),
        LogicalTypeID::Int16 => Some((true, 5, 16)),
        LogicalTypeID::Int32 => Some((true, 10, 32)),
        LogicalTypeID::Int64 | LogicalTypeID::Serial => Some((true, 19, 64)),
        LogicalTypeID::Int128 => Some((true, 38, 128)),
        LogicalTypeID::Uint8 => Some((false, 3, 8)),
        LogicalTypeID::Uint16 => Some((false, 5, 16)),
        LogicalTypeID::Uint32 => Some((false, 10, 32)),
        LogicalTypeID::Uint64 => Some((false, 20, 64)),
        LogicalTypeID::Uint128 => Some((false, 39, 128)),
        _ => None,
    }
}

fn signed_of_bits(bits: u32) -> Option<LogicalType> {
    match bits {
        8 => Some(LogicalType::int8()),
        16 => Some(LogicalType::int16()),
        32 => Some(LogicalType::int32()),
        64 => Some(LogicalType::int64()),
        128 => Some(LogicalType::int128()),
        _ => None,
    }
}

fn unsigned_of_bits(bits: u32) -> Option<LogicalType> {
    match bits {
        8 => Some(LogicalType::uint8()),
        16 => Some(LogicalType::uint16()),
        32 => Some(LogicalType::uint32()),
        64 => Some(LogicalType::uint64()),
        128 => Some(LogicalType::uint128()),
        _ => None,
    }
}

fn max_numeric(left: &LogicalType, right: &LogicalType) -> Option<LogicalType> {
    let (l, r) = (left.type_id(), right.type_id());
    if l == LogicalTypeID::Double || r == LogicalTypeID::Double {
        return Some(LogicalType::double());
    }
    if l == LogicalTypeID::Float || r == LogicalTypeID::Float {
        let other = if l == LogicalTypeID::Float { r } else { l };
        let fits_float = other == LogicalTypeID::Float
            || integral_info(other).is_some_and(|(_, _, bits)| bits <= 16);
        return Some(if fits_float {
            LogicalType::float()
        } else {
            LogicalType::double()
        });
    }
    if l == LogicalTypeID::Decimal || r == LogicalTypeID::Decimal {
        let (decimal, other) = if l == LogicalTypeID::Decimal {
            (left, right)
        } else {
            (right, left)
        };
        let (_, digits, _) = integral_info(other.type_id())?;
        let scale = DecimalType::get_scale(decimal);
        let integer_digits = (DecimalType::get_precision(decimal) - scale).max(digits);
        return Some(decimal_or_double(integer_digits + scale, scale));
    }
    let (l_signed, _, l_bits) = integral_info(l)?;
    let (r_signed, _, r_bits) = integral_info(r)?;
    if l_signed == r_signed {
        let bits = l_bits.max(r_bits);
        return if l_signed {
            signed_of_bits(bits)
        } else {
            unsigned_of_bits(bits)
        };
    }
    let (signed_bits, unsigned_bits) = if l_signed {
        (l_bits, r_bits)
    } else {
        (r_bits, l_bits)
    };
    if signed_bits > unsigned_bits {
        signed_of_bits(signed_bits)
    } else {
        signed_of_bits(unsigned_bits * 2).or_else(|| Some(LogicalType::double()))
    }
}

fn max_decimal(left: &LogicalType, right: &LogicalType) -> Option<LogicalType> {
    let scale = DecimalType::get_scale(left).max(DecimalType::get_scale(right));
    let integer_digits = (DecimalType::get_precision(left) - DecimalType::get_scale(left))
        .max(DecimalType::get_precision(right) - DecimalType::get_scale(right));
    Some(decimal_or_double(integer_digits + scale, scale))
}

fn decimal_or_double(precision: u32, scale: u32) -> LogicalType {
    if precision > DECIMAL_MAX_PRECISION {
        LogicalType::double()
    } else {
        LogicalType::decimal(precision, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SizeVisitor;

    impl TypeVisitor for SizeVisitor {
        type Output = (&'static str, usize);

        fn visit_scalar<T: ScalarValue>(self, _: &LogicalType) -> Self::Output {
            ("scalar", std::mem::size_of::<T>())
        }

        fn visit_string(self, _: &LogicalType) -> Self::Output {
            ("string", 16)
        }

        fn visit_list(self, _: &LogicalType) -> Self::Output {
            ("list", 16)
        }

        fn visit_struct(self, _: &LogicalType) -> Self::Output {
            ("struct", 8)
        }
    }

    struct NameVisitor;

    impl NumericTypeVisitor for NameVisitor {
        type Output = &'static str;

        fn visit<T: NumericValue>(self) -> Self::Output {
            T::TYPE_NAME
        }
    }

    #[test]
    fn test_visit_routes_by_storage_type() {
        assert_eq!(TypeUtils::visit(&LogicalType::int16(), SizeVisitor), ("scalar", 2));
        assert_eq!(TypeUtils::visit(&LogicalType::date(), SizeVisitor), ("scalar", 4));
        assert_eq!(
            TypeUtils::visit(&LogicalType::decimal(20, 2), SizeVisitor),
            ("scalar", 16)
        );
        assert_eq!(TypeUtils::visit(&LogicalType::blob(), SizeVisitor).0, "string");
        assert_eq!(
            TypeUtils::visit(&LogicalType::map(LogicalType::int64(), LogicalType::int64()), SizeVisitor).0,
            "list"
        );
        assert_eq!(TypeUtils::visit(&LogicalType::node(vec![]), SizeVisitor).0, "struct");
    }

    #[test]
    fn test_visit_numeric() {
        assert_eq!(TypeUtils::visit_numeric(&LogicalType::serial(), NameVisitor).unwrap(), "INT64");
        assert_eq!(
            TypeUtils::visit_numeric(&LogicalType::decimal(9, 2), NameVisitor).unwrap(),
            "INT32"
        );
        assert!(TypeUtils::visit_numeric(&LogicalType::date(), NameVisitor).is_err());
        assert!(TypeUtils::visit_numeric(&LogicalType::timestamp(), NameVisitor).is_err());
        assert!(TypeUtils::visit_numeric(&LogicalType::string(), NameVisitor).is_err());
    }

    #[test]
    fn test_numeric_promotion() {
        let max = |l: LogicalType, r: LogicalType| TypeUtils::try_get_max_logical_type(&l, &r);
        assert_eq!(max(LogicalType::int8(), LogicalType::int32()), Some(LogicalType::int32()));
        assert_eq!(max(LogicalType::uint8(), LogicalType::int8()), Some(LogicalType::int16()));
        assert_eq!(max(LogicalType::uint32(), LogicalType::int64()), Some(LogicalType::int64()));
        assert_eq!(max(LogicalType::uint64(), LogicalType::int64()), Some(LogicalType::int128()));
        assert_eq!(max(LogicalType::int16(), LogicalType::float()), Some(LogicalType::float()));
        assert_eq!(max(LogicalType::int64(), LogicalType::float()), Some(LogicalType::double()));
        assert_eq!(
            max(LogicalType::decimal(10, 2), LogicalType::int32()),
            Some(LogicalType::decimal(12, 2))
        );
        assert_eq!(
            max(LogicalType::decimal(10, 2), LogicalType::decimal(5, 4)),
            Some(LogicalType::decimal(12, 4))
        );
        assert_eq!(max(LogicalType::serial(), LogicalType::int64()), Some(LogicalType::int64()));
    }

    #[test]
    fn test_max_type_is_stricter_than_combine() {
        let l = LogicalType::int64();
        let r = LogicalType::string();
        assert_eq!(TypeUtils::try_get_max_logical_type(&l, &r), None);
        assert_eq!(TypeUtils::combine_types(&l, &r), LogicalType::string());

        assert_eq!(
            TypeUtils::try_get_max_logical_type(&LogicalType::string(), &LogicalType::date()),
            Some(LogicalType::date())
        );
        assert_eq!(
            TypeUtils::try_get_max_logical_type(&LogicalType::any(), &LogicalType::bool()),
            Some(LogicalType::bool())
        );
    }

    #[test]
    fn test_nested_promotion() {
        let l = LogicalType::list(LogicalType::int32());
        let r = LogicalType::array(LogicalType::int64(), 3);
        assert_eq!(
            TypeUtils::try_get_max_logical_type(&l, &r),
            Some(LogicalType::list(LogicalType::int64()))
        );

        let l = LogicalType::list(LogicalType::bool());
        let r = LogicalType::list(LogicalType::interval());
        assert_eq!(TypeUtils::try_get_max_logical_type(&l, &r), None);
        assert_eq!(
            TypeUtils::combine_types(&l, &r),
            LogicalType::list(LogicalType::string())
        );
    }

    #[test]
    fn test_purge_any() {
        let ty = LogicalType::struct_type(vec![
            StructField::new("a", LogicalType::list(LogicalType::any())),
            StructField::new("b", LogicalType::int64()),
        ]);
        assert!(ty.contains_any());
        let purged = TypeUtils::purge_any(&ty, &LogicalType::string());
        assert!(!purged.contains_any());
        assert_eq!(
            StructType::get_field(&purged, 0).data_type(),
            &LogicalType::list(LogicalType::string())
        );
    }
}
