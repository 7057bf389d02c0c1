use crate::common::constants::internal_keyword;
use crate::common::error::{KuzuError, Result};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::serialization::{Deserializer, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical types are the user-facing types of the query language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogicalTypeID {
    /// Placeholder resolved during binding
    Any = 0,
    Node = 10,
    Rel = 11,
    RecursiveRel = 12,
    /// Auto-incrementing INT64
    Serial = 13,
    Bool = 22,
    Int64 = 23,
    Int32 = 24,
    Int16 = 25,
    Int8 = 26,
    Uint64 = 27,
    Uint32 = 28,
    Uint16 = 29,
    Uint8 = 30,
    Int128 = 31,
    Double = 32,
    Float = 33,
    Date = 34,
    Timestamp = 35,
    TimestampSec = 36,
    TimestampMs = 37,
    TimestampNs = 38,
    TimestampTz = 39,
    Interval = 40,
    Decimal = 41,
    InternalId = 42,
    Uint128 = 43,
    String = 50,
    Blob = 51,
    List = 52,
    Array = 53,
    Struct = 54,
    Map = 55,
    Union = 56,
    Pointer = 58,
    Uuid = 59,
}

impl LogicalTypeID {
    pub const ALL: &'static [LogicalTypeID] = &[
        LogicalTypeID::Any,
        LogicalTypeID::Node,
        LogicalTypeID::Rel,
        LogicalTypeID::RecursiveRel,
        LogicalTypeID::Serial,
        LogicalTypeID::Bool,
        LogicalTypeID::Int64,
        LogicalTypeID::Int32,
        LogicalTypeID::Int16,
        LogicalTypeID::Int8,
        LogicalTypeID::Uint64,
        LogicalTypeID::Uint32,
        LogicalTypeID::Uint16,
        LogicalTypeID::Uint8,
        LogicalTypeID::Int128,
        LogicalTypeID::Double,
        LogicalTypeID::Float,
        LogicalTypeID::Date,
        LogicalTypeID::Timestamp,
        LogicalTypeID::TimestampSec,
        LogicalTypeID::TimestampMs,
        LogicalTypeID::TimestampNs,
        LogicalTypeID::TimestampTz,
        LogicalTypeID::Interval,
        LogicalTypeID::Decimal,
        LogicalTypeID::InternalId,
        LogicalTypeID::Uint128,
        LogicalTypeID::String,
        LogicalTypeID::Blob,
        LogicalTypeID::List,
        LogicalTypeID::Array,
        LogicalTypeID::Struct,
        LogicalTypeID::Map,
        LogicalTypeID::Union,
        LogicalTypeID::Pointer,
        LogicalTypeID::Uuid,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| *id as u8 == value)
    }

    pub fn name(self) -> &'static str {
        match self {
            LogicalTypeID::Any => "ANY",
            LogicalTypeID::Node => "NODE",
            LogicalTypeID::Rel => "REL",
            LogicalTypeID::RecursiveRel => "RECURSIVE_REL",
            LogicalTypeID::Serial => "SERIAL",
            LogicalTypeID::Bool => "BOOL",
            LogicalTypeID::Int64 => "INT64",
            LogicalTypeID::Int32 => "INT32",
            LogicalTypeID::Int16 => "INT16",
            LogicalTypeID::Int8 => "INT8",
            LogicalTypeID::Uint64 => "UINT64",
            LogicalTypeID::Uint32 => "UINT32",
            LogicalTypeID::Uint16 => "UINT16",
            LogicalTypeID::Uint8 => "UINT8",
            LogicalTypeID::Int128 => "INT128",
            LogicalTypeID::Double => "DOUBLE",
            LogicalTypeID::Float => "FLOAT",
            LogicalTypeID::Date => "DATE",
            LogicalTypeID::Timestamp => "TIMESTAMP",
            LogicalTypeID::TimestampSec => "TIMESTAMP_SEC",
            LogicalTypeID::TimestampMs => "TIMESTAMP_MS",
            LogicalTypeID::TimestampNs => "TIMESTAMP_NS",
            LogicalTypeID::TimestampTz => "TIMESTAMP_TZ",
            LogicalTypeID::Interval => "INTERVAL",
            LogicalTypeID::Decimal => "DECIMAL",
            LogicalTypeID::InternalId => "INTERNAL_ID",
            LogicalTypeID::Uint128 => "UINT128",
            LogicalTypeID::String => "STRING",
            LogicalTypeID::Blob => "BLOB",
            LogicalTypeID::List => "LIST",
            LogicalTypeID::Array => "ARRAY",
            LogicalTypeID::Struct => "STRUCT",
            LogicalTypeID::Map => "MAP",
            LogicalTypeID::Union => "UNION",
            LogicalTypeID::Pointer => "POINTER",
            LogicalTypeID::Uuid => "UUID",
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            LogicalTypeID::Int8
                | LogicalTypeID::Int16
                | LogicalTypeID::Int32
                | LogicalTypeID::Int64
                | LogicalTypeID::Int128
                | LogicalTypeID::Serial
                | LogicalTypeID::Uint8
                | LogicalTypeID::Uint16
                | LogicalTypeID::Uint32
                | LogicalTypeID::Uint64
                | LogicalTypeID::Uint128
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral()
            || matches!(
                self,
                LogicalTypeID::Float | LogicalTypeID::Double | LogicalTypeID::Decimal
            )
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            LogicalTypeID::Date
                | LogicalTypeID::Timestamp
                | LogicalTypeID::TimestampSec
                | LogicalTypeID::TimestampMs
                | LogicalTypeID::TimestampNs
                | LogicalTypeID::TimestampTz
                | LogicalTypeID::Interval
        )
    }

    pub fn is_nested(self) -> bool {
        matches!(
            self,
            LogicalTypeID::List
                | LogicalTypeID::Array
                | LogicalTypeID::Struct
                | LogicalTypeID::Map
                | LogicalTypeID::Union
                | LogicalTypeID::Node
                | LogicalTypeID::Rel
                | LogicalTypeID::RecursiveRel
        )
    }
}

impl fmt::Display for LogicalTypeID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Named field of a struct-shaped type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    name: String,
    data_type: LogicalType,
}

impl StructField {
    pub fn new(name: impl Into<String>, data_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &LogicalType {
        &self.data_type
    }
}

/// Parameters carried by parameterized logical types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtraTypeInfo {
    Decimal { precision: u32, scale: u32 },
    List { child_type: LogicalType },
    Array { child_type: LogicalType, num_elements: u64 },
    Struct { fields: Vec<StructField> },
    /// User-defined alias over a non-parameterized base type
    Udt { type_name: String },
}

impl ExtraTypeInfo {
    fn serialize_tag(&self) -> u8 {
        match self {
            ExtraTypeInfo::Decimal { .. } => 1,
            ExtraTypeInfo::List { .. } => 2,
            ExtraTypeInfo::Array { .. } => 3,
            ExtraTypeInfo::Struct { .. } => 4,
            ExtraTypeInfo::Udt { .. } => 5,
        }
    }
}

pub const DECIMAL_MAX_PRECISION: u32 = 38;
pub const DECIMAL_DEFAULT_PRECISION: u32 = 18;
pub const DECIMAL_DEFAULT_SCALE: u32 = 3;

/// A logical type together with its cached physical type
///
/// Parameterized types (DECIMAL, LIST, ARRAY, STRUCT and the types built on
/// STRUCT) carry their parameters in `extra_type_info`. Equality compares the
/// id and the parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalType {
    type_id: LogicalTypeID,
    physical_type: PhysicalTypeID,
    extra_type_info: Option<Box<ExtraTypeInfo>>,
}

impl Default for LogicalType {
    fn default() -> Self {
        Self::any()
    }
}

impl LogicalType {
    /// Type without parameters; DECIMAL gets the default precision and scale
    pub fn new(type_id: LogicalTypeID) -> Self {
        if type_id == LogicalTypeID::Decimal {
            return Self::decimal(DECIMAL_DEFAULT_PRECISION, DECIMAL_DEFAULT_SCALE);
        }
        Self::with_extra_type_info(type_id, None)
    }

    fn with_extra_type_info(type_id: LogicalTypeID, extra: Option<ExtraTypeInfo>) -> Self {
        let physical_type = Self::get_physical_type_for(type_id, extra.as_ref());
        Self {
            type_id,
            physical_type,
            extra_type_info: extra.map(Box::new),
        }
    }

    pub fn any() -> Self {
        Self::with_extra_type_info(LogicalTypeID::Any, None)
    }

    pub fn bool() -> Self {
        Self::new(LogicalTypeID::Bool)
    }

    pub fn int8() -> Self {
        Self::new(LogicalTypeID::Int8)
    }

    pub fn int16() -> Self {
        Self::new(LogicalTypeID::Int16)
    }

    pub fn int32() -> Self {
        Self::new(LogicalTypeID::Int32)
    }

    pub fn int64() -> Self {
        Self::new(LogicalTypeID::Int64)
    }

    pub fn int128() -> Self {
        Self::new(LogicalTypeID::Int128)
    }

    pub fn serial() -> Self {
        Self::new(LogicalTypeID::Serial)
    }

    pub fn uint8() -> Self {
        Self::new(LogicalTypeID::Uint8)
    }

    pub fn uint16() -> Self {
        Self::new(LogicalTypeID::Uint16)
    }

    pub fn uint32() -> Self {
        Self::new(LogicalTypeID::Uint32)
    }

    pub fn uint64() -> Self {
        Self::new(LogicalTypeID::Uint64)
    }

    pub fn uint128() -> Self {
        Self::new(LogicalTypeID::Uint128)
    }

    pub fn float() -> Self {
        Self::new(LogicalTypeID::Float)
    }

    pub fn double() -> Self {
        Self::new(LogicalTypeID::Double)
    }

    pub fn date() -> Self {
        Self::new(LogicalTypeID::Date)
    }

    pub fn timestamp() -> Self {
        Self::new(LogicalTypeID::Timestamp)
    }

    pub fn timestamp_sec() -> Self {
        Self::new(LogicalTypeID::TimestampSec)
    }

    pub fn timestamp_ms() -> Self {
        Self::new(LogicalTypeID::TimestampMs)
    }

    pub fn timestamp_ns() -> Self {
        Self::new(LogicalTypeID::TimestampNs)
    }

    pub fn timestamp_tz() -> Self {
        Self::new(LogicalTypeID::TimestampTz)
    }

    pub fn interval() -> Self {
        Self::new(LogicalTypeID::Interval)
    }

    pub fn internal_id() -> Self {
        Self::new(LogicalTypeID::InternalId)
    }

    pub fn string() -> Self {
        Self::new(LogicalTypeID::String)
    }

    pub fn blob() -> Self {
        Self::new(LogicalTypeID::Blob)
    }

    pub fn uuid() -> Self {
        Self::new(LogicalTypeID::Uuid)
    }

    pub fn pointer() -> Self {
        Self::new(LogicalTypeID::Pointer)
    }

    /// DECIMAL with a precision the caller has already validated
    pub fn decimal(precision: u32, scale: u32) -> Self {
        crate::ku_assert!((1..=DECIMAL_MAX_PRECISION).contains(&precision) && scale <= precision);
        Self::with_extra_type_info(
            LogicalTypeID::Decimal,
            Some(ExtraTypeInfo::Decimal { precision, scale }),
        )
    }

    /// DECIMAL from user input
    pub fn try_decimal(precision: u32, scale: u32) -> Result<Self> {
        if precision == 0 || precision > DECIMAL_MAX_PRECISION {
            return Err(KuzuError::Binder(format!(
                "Precision of DECIMAL must be between 1 and {}, got {}.",
                DECIMAL_MAX_PRECISION, precision
            )));
        }
        if scale > precision {
            return Err(KuzuError::Binder(format!(
                "DECIMAL scale {} cannot be larger than precision {}.",
                scale, precision
            )));
        }
        Ok(Self::decimal(precision, scale))
    }

    pub fn list(child_type: LogicalType) -> Self {
        Self::with_extra_type_info(LogicalTypeID::List, Some(ExtraTypeInfo::List { child_type }))
    }

    pub fn array(child_type: LogicalType, num_elements: u64) -> Self {
        Self::with_extra_type_info(
            LogicalTypeID::Array,
            Some(ExtraTypeInfo::Array {
                child_type,
                num_elements,
            }),
        )
    }

    pub fn struct_type(fields: Vec<StructField>) -> Self {
        Self::with_extra_type_info(LogicalTypeID::Struct, Some(ExtraTypeInfo::Struct { fields }))
    }

    /// MAP(key, value), stored as LIST(STRUCT(KEY key, VALUE value))
    pub fn map(key_type: LogicalType, value_type: LogicalType) -> Self {
        let entry = Self::struct_type(vec![
            StructField::new(internal_keyword::MAP_KEY, key_type),
            StructField::new(internal_keyword::MAP_VALUE, value_type),
        ]);
        Self::with_extra_type_info(
            LogicalTypeID::Map,
            Some(ExtraTypeInfo::List { child_type: entry }),
        )
    }

    /// UNION of the given members, stored as a struct led by an INT8 tag
    pub fn union_type(members: Vec<StructField>) -> Self {
        let mut fields = Vec::with_capacity(members.len() + 1);
        fields.push(StructField::new(internal_keyword::UNION_TAG, Self::int8()));
        fields.extend(members);
        Self::with_extra_type_info(LogicalTypeID::Union, Some(ExtraTypeInfo::Struct { fields }))
    }

    /// NODE with `_ID` and `_LABEL` ahead of its properties
    pub fn node(properties: Vec<StructField>) -> Self {
        let mut fields = vec![
            StructField::new(internal_keyword::ID, Self::internal_id()),
            StructField::new(internal_keyword::LABEL, Self::string()),
        ];
        fields.extend(properties);
        Self::with_extra_type_info(LogicalTypeID::Node, Some(ExtraTypeInfo::Struct { fields }))
    }

    /// REL with `_ID`, `_LABEL`, `_SRC` and `_DST` ahead of its properties
    pub fn rel(properties: Vec<StructField>) -> Self {
        let mut fields = vec![
            StructField::new(internal_keyword::ID, Self::internal_id()),
            StructField::new(internal_keyword::LABEL, Self::string()),
            StructField::new(internal_keyword::SRC, Self::internal_id()),
            StructField::new(internal_keyword::DST, Self::internal_id()),
        ];
        fields.extend(properties);
        Self::with_extra_type_info(LogicalTypeID::Rel, Some(ExtraTypeInfo::Struct { fields }))
    }

    /// RECURSIVE_REL: the nodes and rels of a path
    pub fn recursive_rel(node_type: LogicalType, rel_type: LogicalType) -> Self {
        let fields = vec![
            StructField::new(internal_keyword::NODES, Self::list(node_type)),
            StructField::new(internal_keyword::RELS, Self::list(rel_type)),
        ];
        Self::with_extra_type_info(
            LogicalTypeID::RecursiveRel,
            Some(ExtraTypeInfo::Struct { fields }),
        )
    }

    /// Named alias over a base type without parameters
    pub fn udt(base: LogicalTypeID, type_name: impl Into<String>) -> Result<Self> {
        if base == LogicalTypeID::Decimal || base.is_nested() || base == LogicalTypeID::Any {
            return Err(KuzuError::Binder(format!(
                "Cannot define a user type over {}.",
                base
            )));
        }
        Ok(Self::with_extra_type_info(
            base,
            Some(ExtraTypeInfo::Udt {
                type_name: type_name.into(),
            }),
        ))
    }

    pub fn type_id(&self) -> LogicalTypeID {
        self.type_id
    }

    pub fn physical_type(&self) -> PhysicalTypeID {
        self.physical_type
    }

    pub fn extra_type_info(&self) -> Option<&ExtraTypeInfo> {
        self.extra_type_info.as_deref()
    }

    pub fn udt_name(&self) -> Option<&str> {
        match self.extra_type_info() {
            Some(ExtraTypeInfo::Udt { type_name }) => Some(type_name),
            _ => None,
        }
    }

    /// Whether ANY appears anywhere inside this type
    pub fn contains_any(&self) -> bool {
        if self.type_id == LogicalTypeID::Any {
            return true;
        }
        match self.extra_type_info() {
            Some(ExtraTypeInfo::List { child_type })
            | Some(ExtraTypeInfo::Array { child_type, .. }) => child_type.contains_any(),
            Some(ExtraTypeInfo::Struct { fields }) => {
                fields.iter().any(|field| field.data_type.contains_any())
            }
            _ => false,
        }
    }

    /// Physical layout of a logical type
    pub fn get_physical_type_for(
        type_id: LogicalTypeID,
        extra: Option<&ExtraTypeInfo>,
    ) -> PhysicalTypeID {
        match type_id {
            LogicalTypeID::Any => PhysicalTypeID::Any,
            LogicalTypeID::Bool => PhysicalTypeID::Bool,
            LogicalTypeID::Int64 | LogicalTypeID::Serial => PhysicalTypeID::Int64,
            LogicalTypeID::Int32 | LogicalTypeID::Date => PhysicalTypeID::Int32,
            LogicalTypeID::Int16 => PhysicalTypeID::Int16,
            LogicalTypeID::Int8 => PhysicalTypeID::Int8,
            LogicalTypeID::Uint64 => PhysicalTypeID::Uint64,
            LogicalTypeID::Uint32 => PhysicalTypeID::Uint32,
            LogicalTypeID::Uint16 => PhysicalTypeID::Uint16,
            LogicalTypeID::Uint8 => PhysicalTypeID::Uint8,
            LogicalTypeID::Int128 | LogicalTypeID::Uuid => PhysicalTypeID::Int128,
            LogicalTypeID::Uint128 => PhysicalTypeID::Uint128,
            LogicalTypeID::Double => PhysicalTypeID::Double,
            LogicalTypeID::Float => PhysicalTypeID::Float,
            LogicalTypeID::Timestamp
            | LogicalTypeID::TimestampSec
            | LogicalTypeID::TimestampMs
            | LogicalTypeID::TimestampNs
            | LogicalTypeID::TimestampTz => PhysicalTypeID::Int64,
            LogicalTypeID::Interval => PhysicalTypeID::Interval,
            LogicalTypeID::InternalId => PhysicalTypeID::InternalId,
            LogicalTypeID::String | LogicalTypeID::Blob => PhysicalTypeID::String,
            LogicalTypeID::List | LogicalTypeID::Map => PhysicalTypeID::List,
            LogicalTypeID::Array => PhysicalTypeID::Array,
            LogicalTypeID::Struct
            | LogicalTypeID::Node
            | LogicalTypeID::Rel
            | LogicalTypeID::RecursiveRel
            | LogicalTypeID::Union => PhysicalTypeID::Struct,
            LogicalTypeID::Pointer => PhysicalTypeID::Pointer,
            LogicalTypeID::Decimal => match extra {
                Some(ExtraTypeInfo::Decimal { precision, .. }) => {
                    DecimalType::physical_type_for_precision(*precision)
                }
                _ => DecimalType::physical_type_for_precision(DECIMAL_DEFAULT_PRECISION),
            },
        }
    }

    pub fn serialize(&self, serializer: &mut Serializer) {
        serializer.write_u8(self.type_id as u8);
        match self.extra_type_info() {
            None => serializer.write_u8(0),
            Some(info) => {
                serializer.write_u8(info.serialize_tag());
                match info {
                    ExtraTypeInfo::Decimal { precision, scale } => {
                        serializer.write_varint(*precision as u64);
                        serializer.write_varint(*scale as u64);
                    }
                    ExtraTypeInfo::List { child_type } => child_type.serialize(serializer),
                    ExtraTypeInfo::Array {
                        child_type,
                        num_elements,
                    } => {
                        child_type.serialize(serializer);
                        serializer.write_varint(*num_elements);
                    }
                    ExtraTypeInfo::Struct { fields } => {
                        serializer.write_varint(fields.len() as u64);
                        for field in fields {
                            serializer.write_str(&field.name);
                            field.data_type.serialize(serializer);
                        }
                    }
                    ExtraTypeInfo::Udt { type_name } => serializer.write_str(type_name),
                }
            }
        }
    }

    pub fn deserialize(deserializer: &mut Deserializer) -> Result<Self> {
        let raw_id = deserializer.read_u8()?;
        let type_id = LogicalTypeID::from_u8(raw_id).ok_or_else(|| {
            KuzuError::Serialization(format!("Unknown logical type id {}.", raw_id))
        })?;
        let extra = match deserializer.read_u8()? {
            0 => None,
            1 => {
                let precision = deserializer.read_varint()? as u32;
                let scale = deserializer.read_varint()? as u32;
                if precision == 0 || precision > DECIMAL_MAX_PRECISION || scale > precision {
                    return Err(KuzuError::Serialization(format!(
                        "Invalid DECIMAL({}, {}).",
                        precision, scale
                    )));
                }
                Some(ExtraTypeInfo::Decimal { precision, scale })
            }
            2 => Some(ExtraTypeInfo::List {
                child_type: Self::deserialize(deserializer)?,
            }),
            3 => {
                let child_type = Self::deserialize(deserializer)?;
                let num_elements = deserializer.read_varint()?;
                Some(ExtraTypeInfo::Array {
                    child_type,
                    num_elements,
                })
            }
            4 => {
                let num_fields = deserializer.read_varint()? as usize;
                let mut fields = Vec::with_capacity(num_fields.min(1024));
                for _ in 0..num_fields {
                    let name = deserializer.read_string()?;
                    let data_type = Self::deserialize(deserializer)?;
                    fields.push(StructField::new(name, data_type));
                }
                Some(ExtraTypeInfo::Struct { fields })
            }
            5 => Some(ExtraTypeInfo::Udt {
                type_name: deserializer.read_string()?,
            }),
            tag => {
                return Err(KuzuError::Serialization(format!(
                    "Unknown extra type info tag {}.",
                    tag
                )))
            }
        };
        Self::check_extra_type_info(type_id, extra.as_ref())?;
        Ok(Self::with_extra_type_info(type_id, extra))
    }

    /// Reject parameters that do not belong to `type_id`
    fn check_extra_type_info(type_id: LogicalTypeID, extra: Option<&ExtraTypeInfo>) -> Result<()> {
        let valid = match (type_id, extra) {
            (LogicalTypeID::Decimal, Some(ExtraTypeInfo::Decimal { .. })) => true,
            (LogicalTypeID::List, Some(ExtraTypeInfo::List { .. })) => true,
            (LogicalTypeID::Map, Some(ExtraTypeInfo::List { child_type })) => {
                child_type.type_id == LogicalTypeID::Struct
                    && matches!(
                        child_type.extra_type_info(),
                        Some(ExtraTypeInfo::Struct { fields }) if fields.len() == 2
                    )
            }
            (LogicalTypeID::Array, Some(ExtraTypeInfo::Array { .. })) => true,
            (LogicalTypeID::Union, Some(ExtraTypeInfo::Struct { fields })) => fields
                .first()
                .is_some_and(|tag| tag.data_type.type_id == LogicalTypeID::Int8),
            (
                LogicalTypeID::Struct
                | LogicalTypeID::Node
                | LogicalTypeID::Rel
                | LogicalTypeID::RecursiveRel,
                Some(ExtraTypeInfo::Struct { .. }),
            ) => true,
            (LogicalTypeID::Decimal, _) => false,
            (id, _) if id.is_nested() => false,
            (_, None) => true,
            (LogicalTypeID::Any, Some(ExtraTypeInfo::Udt { .. })) => false,
            (_, Some(ExtraTypeInfo::Udt { .. })) => true,
            (_, Some(_)) => false,
        };
        if valid {
            Ok(())
        } else {
            Err(KuzuError::Serialization(format!(
                "Type parameters {:?} do not match type id {}.",
                extra, type_id
            )))
        }
    }

    /// Standalone versioned encoding
    pub fn to_bytes(&self) -> bytes::Bytes {
        let mut serializer = Serializer::versioned();
        self.serialize(&mut serializer);
        serializer.finish()
    }

    pub fn from_bytes(bytes: impl Into<bytes::Bytes>) -> Result<Self> {
        let mut deserializer = Deserializer::versioned(bytes)?;
        Self::deserialize(&mut deserializer)
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[StructField]) -> fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} {}", field.name, field.data_type)?;
    }
    Ok(())
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.type_id, self.extra_type_info()) {
            (_, Some(ExtraTypeInfo::Udt { type_name })) => write!(f, "{}", type_name),
            (LogicalTypeID::Decimal, Some(ExtraTypeInfo::Decimal { precision, scale })) => {
                write!(f, "DECIMAL({}, {})", precision, scale)
            }
            (LogicalTypeID::List, Some(ExtraTypeInfo::List { child_type })) => {
                write!(f, "{}[]", child_type)
            }
            (
                LogicalTypeID::Array,
                Some(ExtraTypeInfo::Array {
                    child_type,
                    num_elements,
                }),
            ) => write!(f, "{}[{}]", child_type, num_elements),
            (LogicalTypeID::Map, Some(_)) => write!(
                f,
                "MAP({}, {})",
                MapType::get_key_type(self),
                MapType::get_value_type(self)
            ),
            (LogicalTypeID::Struct, Some(ExtraTypeInfo::Struct { fields })) => {
                write!(f, "STRUCT(")?;
                write_fields(f, fields)?;
                write!(f, ")")
            }
            (LogicalTypeID::Union, Some(ExtraTypeInfo::Struct { fields })) => {
                write!(f, "UNION(")?;
                write_fields(f, &fields[1..])?;
                write!(f, ")")
            }
            (type_id, _) => write!(f, "{}", type_id.name()),
        }
    }
}

/// Accessors for DECIMAL parameters
pub struct DecimalType;

impl DecimalType {
    pub fn get_precision(data_type: &LogicalType) -> u32 {
        match data_type.extra_type_info() {
            Some(ExtraTypeInfo::Decimal { precision, .. }) => *precision,
            _ => crate::ku_unreachable!("{} is not a DECIMAL", data_type),
        }
    }

    pub fn get_scale(data_type: &LogicalType) -> u32 {
        match data_type.extra_type_info() {
            Some(ExtraTypeInfo::Decimal { scale, .. }) => *scale,
            _ => crate::ku_unreachable!("{} is not a DECIMAL", data_type),
        }
    }

    /// Narrowest integer able to hold every value of the given precision
    pub fn physical_type_for_precision(precision: u32) -> PhysicalTypeID {
        match precision {
            0..=4 => PhysicalTypeID::Int16,
            5..=9 => PhysicalTypeID::Int32,
            10..=18 => PhysicalTypeID::Int64,
            _ => PhysicalTypeID::Int128,
        }
    }
}

/// Accessors for LIST-shaped types (LIST, ARRAY and MAP)
pub struct ListType;

impl ListType {
    pub fn get_child_type(data_type: &LogicalType) -> &LogicalType {
        match data_type.extra_type_info() {
            Some(ExtraTypeInfo::List { child_type })
            | Some(ExtraTypeInfo::Array { child_type, .. }) => child_type,
            _ => crate::ku_unreachable!("{} has no child type", data_type),
        }
    }
}

pub struct ArrayType;

impl ArrayType {
    pub fn get_child_type(data_type: &LogicalType) -> &LogicalType {
        ListType::get_child_type(data_type)
    }

    pub fn get_num_elements(data_type: &LogicalType) -> u64 {
        match data_type.extra_type_info() {
            Some(ExtraTypeInfo::Array { num_elements, .. }) => *num_elements,
            _ => crate::ku_unreachable!("{} is not an ARRAY", data_type),
        }
    }
}

/// Accessors for STRUCT-shaped types (STRUCT, UNION, NODE, REL, RECURSIVE_REL)
pub struct StructType;

impl StructType {
    pub fn get_fields(data_type: &LogicalType) -> &[StructField] {
        match data_type.extra_type_info() {
            Some(ExtraTypeInfo::Struct { fields }) => fields,
            _ => crate::ku_unreachable!("{} has no fields", data_type),
        }
    }

    pub fn get_num_fields(data_type: &LogicalType) -> usize {
        Self::get_fields(data_type).len()
    }

    pub fn get_field(data_type: &LogicalType, idx: usize) -> &StructField {
        &Self::get_fields(data_type)[idx]
    }

    pub fn get_field_types(data_type: &LogicalType) -> Vec<&LogicalType> {
        Self::get_fields(data_type)
            .iter()
            .map(|field| &field.data_type)
            .collect()
    }

    pub fn get_field_names(data_type: &LogicalType) -> Vec<&str> {
        Self::get_fields(data_type)
            .iter()
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Field names match case-insensitively
    pub fn get_field_idx(data_type: &LogicalType, name: &str) -> Option<usize> {
        Self::get_fields(data_type)
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))
    }
}

pub struct MapType;

impl MapType {
    pub fn get_key_type(data_type: &LogicalType) -> &LogicalType {
        StructType::get_field(ListType::get_child_type(data_type), 0).data_type()
    }

    pub fn get_value_type(data_type: &LogicalType) -> &LogicalType {
        StructType::get_field(ListType::get_child_type(data_type), 1).data_type()
    }
}

/// Member `tag` of a union is struct field `tag + 1`
pub struct UnionType;

impl UnionType {
    pub const TAG_FIELD_IDX: usize = 0;

    pub fn get_num_fields(data_type: &LogicalType) -> usize {
        StructType::get_num_fields(data_type) - 1
    }

    pub fn get_internal_field_idx(tag: usize) -> usize {
        tag + 1
    }

    pub fn get_field_type(data_type: &LogicalType, tag: usize) -> &LogicalType {
        StructType::get_field(data_type, Self::get_internal_field_idx(tag)).data_type()
    }

    pub fn get_field_name(data_type: &LogicalType, tag: usize) -> &str {
        StructType::get_field(data_type, Self::get_internal_field_idx(tag)).name()
    }
}
