use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical types decide how a value is laid out inside a vector buffer
///
/// Every logical type maps to exactly one physical type; the physical type is
/// the dispatch key for storage-level code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PhysicalTypeID {
    /// Unresolved placeholder
    Any = 0,
    Bool = 1,
    Int64 = 2,
    Int32 = 3,
    Int16 = 4,
    Int8 = 5,
    Uint64 = 6,
    Uint32 = 7,
    Uint16 = 8,
    Uint8 = 9,
    Int128 = 10,
    Double = 11,
    Float = 12,
    Interval = 13,
    InternalId = 14,
    Uint128 = 15,
    /// 16 byte `KuString` cell, payload inline or in an overflow buffer
    String = 20,
    /// `ListEntry` handle into a child data vector
    List = 22,
    /// Fixed length list, same layout as `List`
    Array = 23,
    /// `StructEntry` position; fields live in child vectors
    Struct = 24,
    Pointer = 25,
}

impl PhysicalTypeID {
    /// Bytes one value occupies inside a vector buffer
    pub fn fixed_type_size(self) -> usize {
        match self {
            PhysicalTypeID::Bool | PhysicalTypeID::Int8 | PhysicalTypeID::Uint8 => 1,
            PhysicalTypeID::Int16 | PhysicalTypeID::Uint16 => 2,
            PhysicalTypeID::Int32 | PhysicalTypeID::Uint32 | PhysicalTypeID::Float => 4,
            PhysicalTypeID::Int64
            | PhysicalTypeID::Uint64
            | PhysicalTypeID::Double
            | PhysicalTypeID::Pointer
            | PhysicalTypeID::Struct => 8,
            PhysicalTypeID::Int128
            | PhysicalTypeID::Uint128
            | PhysicalTypeID::Interval
            | PhysicalTypeID::InternalId
            | PhysicalTypeID::String
            | PhysicalTypeID::List
            | PhysicalTypeID::Array => 16,
            PhysicalTypeID::Any => {
                crate::ku_unreachable!("ANY has no physical size")
            }
        }
    }

    /// Values whose payload lives outside the fixed slot
    pub fn is_variable_size(self) -> bool {
        matches!(
            self,
            PhysicalTypeID::String
                | PhysicalTypeID::List
                | PhysicalTypeID::Array
                | PhysicalTypeID::Struct
        )
    }

    pub fn is_nested(self) -> bool {
        matches!(
            self,
            PhysicalTypeID::List | PhysicalTypeID::Array | PhysicalTypeID::Struct
        )
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PhysicalTypeID::Int8
                | PhysicalTypeID::Int16
                | PhysicalTypeID::Int32
                | PhysicalTypeID::Int64
                | PhysicalTypeID::Int128
                | PhysicalTypeID::Uint8
                | PhysicalTypeID::Uint16
                | PhysicalTypeID::Uint32
                | PhysicalTypeID::Uint64
                | PhysicalTypeID::Uint128
        )
    }
}

impl fmt::Display for PhysicalTypeID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhysicalTypeID::Any => "ANY",
            PhysicalTypeID::Bool => "BOOL",
            PhysicalTypeID::Int64 => "INT64",
            PhysicalTypeID::Int32 => "INT32",
            PhysicalTypeID::Int16 => "INT16",
            PhysicalTypeID::Int8 => "INT8",
            PhysicalTypeID::Uint64 => "UINT64",
            PhysicalTypeID::Uint32 => "UINT32",
            PhysicalTypeID::Uint16 => "UINT16",
            PhysicalTypeID::Uint8 => "UINT8",
            PhysicalTypeID::Int128 => "INT128",
            PhysicalTypeID::Double => "DOUBLE",
            PhysicalTypeID::Float => "FLOAT",
            PhysicalTypeID::Interval => "INTERVAL",
            PhysicalTypeID::InternalId => "INTERNAL_ID",
            PhysicalTypeID::Uint128 => "UINT128",
            PhysicalTypeID::String => "STRING",
            PhysicalTypeID::List => "LIST",
            PhysicalTypeID::Array => "ARRAY",
            PhysicalTypeID::Struct => "STRUCT",
            PhysicalTypeID::Pointer => "POINTER",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_type_sizes() {
        assert_eq!(PhysicalTypeID::Int8.fixed_type_size(), 1);
        assert_eq!(PhysicalTypeID::Int32.fixed_type_size(), 4);
        assert_eq!(PhysicalTypeID::Double.fixed_type_size(), 8);
        assert_eq!(PhysicalTypeID::String.fixed_type_size(), 16);
        assert_eq!(PhysicalTypeID::List.fixed_type_size(), 16);
        assert_eq!(PhysicalTypeID::Struct.fixed_type_size(), 8);
    }

    #[test]
    fn test_variable_size_types() {
        assert!(PhysicalTypeID::String.is_variable_size());
        assert!(PhysicalTypeID::List.is_variable_size());
        assert!(!PhysicalTypeID::Int32.is_variable_size());
        assert!(!PhysicalTypeID::Interval.is_variable_size());
    }

    #[test]
    fn test_display() {
        assert_eq!(PhysicalTypeID::InternalId.to_string(), "INTERNAL_ID");
        assert_eq!(PhysicalTypeID::Uint128.to_string(), "UINT128");
    }
}
