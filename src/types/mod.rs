//! Type system
//!
//! - [`LogicalType`]: semantic types with their extra parameters
//! - [`PhysicalTypeID`]: storage layouts and the dispatch key for generic code
//! - Storage types ([`Int128`], [`KuString`], entries, temporal values)
//! - [`Value`]: a single boxed value used at API boundaries

pub mod decimal;
pub mod entries;
pub mod int128;
pub mod ku_string;
pub mod ku_uuid;
pub mod logical_type;
pub mod nested_value;
pub mod physical_type;
pub mod physical_value;
pub mod serialization;
pub mod temporal;
pub mod type_utils;
pub mod value;

pub use decimal::DecimalUtils;
pub use entries::{InternalId, ListEntry, MapEntry, Pointer, StructEntry, UnionEntry};
pub use int128::Int128;
pub use ku_string::KuString;
pub use ku_uuid::KuUuid;
pub use logical_type::{
    ArrayType, DecimalType, ExtraTypeInfo, ListType, LogicalType, LogicalTypeID, MapType,
    StructField, StructType, UnionType,
};
pub use nested_value::{NodeVal, RecursiveRelVal, RelVal};
pub use physical_type::PhysicalTypeID;
pub use physical_value::{physical_type_id_for, NumericValue, PhysicalValue, ScalarValue};
pub use serialization::{Deserializer, Serializer};
pub use temporal::{Date, Interval, Timestamp, TimestampMs, TimestampNs, TimestampSec, TimestampTz};
pub use type_utils::{NumericTypeVisitor, TypeUtils, TypeVisitor};
pub use value::{FromValue, Val, Value};
