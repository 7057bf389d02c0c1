use crate::common::error::{KuzuError, Result};
use crate::types::decimal::DecimalUtils;
use crate::types::entries::InternalId;
use crate::types::int128::Int128;
use crate::types::ku_uuid::KuUuid;
use crate::types::logical_type::{
    ArrayType, DecimalType, ListType, LogicalType, LogicalTypeID, StructField, StructType,
    UnionType,
};
use crate::types::nested_value::{NodeVal, RecursiveRelVal, RelVal};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::{PhysicalValue, ScalarValue};
use crate::types::serialization::{Deserializer, Serializer};
use crate::types::temporal::{
    Date, Interval, Timestamp, TimestampMs, TimestampNs, TimestampSec, TimestampTz,
};
use crate::types::type_utils::{TypeUtils, TypeVisitor};
use std::fmt;

/// Payload of a [`Value`], keyed by physical type
///
/// Logical types sharing a physical type share a variant: a DATE is held as
/// `Int32`, a UUID as `Int128`. Nested values keep their elements in
/// [`Value::children`].
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    /// Payload of an untyped NULL
    Empty,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Int128(Int128),
    Uint128(u128),
    Float(f32),
    Double(f64),
    Interval(Interval),
    InternalId(InternalId),
    Pointer(u64),
    Str(String),
    Blob(Vec<u8>),
    /// LIST, ARRAY, MAP, STRUCT, NODE, REL and RECURSIVE_REL
    Nested,
    /// UNION; the selected member is the only child
    Union { tag: i8 },
}

/// A single typed value, possibly nested
///
/// Construction is always explicit about the type. Typed access through
/// [`Value::get_value`] treats a type mismatch as a programming error;
/// [`Value::try_get_value`] reports it instead.
#[derive(Debug, Clone)]
pub struct Value {
    data_type: LogicalType,
    is_null: bool,
    val: Val,
    children: Vec<Value>,
}

/// Rust types readable from a [`Value`]
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! scalar_value_conversions {
    ($($ty:ty => $ctor:ident),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::from_scalar(LogicalType::$ctor(), value)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                if value.data_type.physical_type() != <$ty as PhysicalValue>::PHYSICAL_TYPE {
                    return None;
                }
                <$ty as ScalarValue>::from_val(&value.val)
            }
        }
    )*};
}

scalar_value_conversions!(
    bool => bool,
    i8 => int8,
    i16 => int16,
    i32 => int32,
    i64 => int64,
    u8 => uint8,
    u16 => uint16,
    u32 => uint32,
    u64 => uint64,
    Int128 => int128,
    u128 => uint128,
    f32 => float,
    f64 => double,
    Interval => interval,
    InternalId => internal_id,
    Date => date,
    Timestamp => timestamp,
    TimestampSec => timestamp_sec,
    TimestampMs => timestamp_ms,
    TimestampNs => timestamp_ns,
    TimestampTz => timestamp_tz,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::from_parts(LogicalType::string(), Val::Str(value.to_string()), Vec::new())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::from_parts(LogicalType::string(), Val::Str(value), Vec::new())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match &value.val {
            Val::Str(s) => Some(s.clone()),
            Val::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match &value.val {
            Val::Blob(b) => Some(b.clone()),
            Val::Str(s) => Some(s.as_bytes().to_vec()),
            _ => None,
        }
    }
}

/// Builds the zero value of a type
struct DefaultValueBuilder;

impl TypeVisitor for DefaultValueBuilder {
    type Output = Value;

    fn visit_scalar<T: ScalarValue>(self, data_type: &LogicalType) -> Value {
        Value::from_parts(data_type.clone(), T::default().into_val(), Vec::new())
    }

    fn visit_string(self, data_type: &LogicalType) -> Value {
        let val = if data_type.type_id() == LogicalTypeID::Blob {
            Val::Blob(Vec::new())
        } else {
            Val::Str(String::new())
        };
        Value::from_parts(data_type.clone(), val, Vec::new())
    }

    fn visit_list(self, data_type: &LogicalType) -> Value {
        let children = if data_type.type_id() == LogicalTypeID::Array {
            let child_type = ArrayType::get_child_type(data_type);
            (0..ArrayType::get_num_elements(data_type))
                .map(|_| Value::create_default_value(child_type))
                .collect()
        } else {
            Vec::new()
        };
        Value::from_parts(data_type.clone(), Val::Nested, children)
    }

    fn visit_struct(self, data_type: &LogicalType) -> Value {
        if data_type.type_id() == LogicalTypeID::Union {
            let member = Value::create_default_value(UnionType::get_field_type(data_type, 0));
            return Value::from_parts(data_type.clone(), Val::Union { tag: 0 }, vec![member]);
        }
        let children = StructType::get_fields(data_type)
            .iter()
            .map(|field| Value::create_default_value(field.data_type()))
            .collect();
        Value::from_parts(data_type.clone(), Val::Nested, children)
    }
}

/// Decodes the payload of a non-null value
struct PayloadReader<'a> {
    deserializer: &'a mut Deserializer,
}

impl TypeVisitor for PayloadReader<'_> {
    type Output = Result<(Val, Vec<Value>)>;

    fn visit_scalar<T: ScalarValue>(self, _: &LogicalType) -> Self::Output {
        Ok((self.deserializer.read_fixed::<T>()?.into_val(), Vec::new()))
    }

    fn visit_string(self, data_type: &LogicalType) -> Self::Output {
        let val = if data_type.type_id() == LogicalTypeID::Blob {
            Val::Blob(self.deserializer.read_bytes()?.to_vec())
        } else {
            Val::Str(self.deserializer.read_string()?)
        };
        Ok((val, Vec::new()))
    }

    fn visit_list(self, data_type: &LogicalType) -> Self::Output {
        let num_children = self.deserializer.read_varint()? as usize;
        if data_type.type_id() == LogicalTypeID::Array
            && num_children as u64 != ArrayType::get_num_elements(data_type)
        {
            return Err(KuzuError::Serialization(format!(
                "{} value has {} elements.",
                data_type, num_children
            )));
        }
        let child_type = ListType::get_child_type(data_type);
        let mut children = Vec::with_capacity(num_children.min(1024));
        for _ in 0..num_children {
            children.push(read_child(self.deserializer, child_type)?);
        }
        Ok((Val::Nested, children))
    }

    fn visit_struct(self, data_type: &LogicalType) -> Self::Output {
        if data_type.type_id() == LogicalTypeID::Union {
            let tag = self.deserializer.read_fixed::<i8>()?;
            if tag < 0 || tag as usize >= UnionType::get_num_fields(data_type) {
                return Err(KuzuError::Serialization(format!(
                    "Union tag {} is out of range for {}.",
                    tag, data_type
                )));
            }
            let member_type = UnionType::get_field_type(data_type, tag as usize);
            let member = read_child(self.deserializer, member_type)?;
            return Ok((Val::Union { tag }, vec![member]));
        }
        let fields = StructType::get_fields(data_type);
        let num_children = self.deserializer.read_varint()? as usize;
        if num_children != fields.len() {
            return Err(KuzuError::Serialization(format!(
                "{} value has {} fields.",
                data_type, num_children
            )));
        }
        let children = fields
            .iter()
            .map(|field| read_child(self.deserializer, field.data_type()))
            .collect::<Result<Vec<_>>>()?;
        Ok((Val::Nested, children))
    }
}

/// Decode a nested child and check it has the type its parent declares
fn read_child(deserializer: &mut Deserializer, expected: &LogicalType) -> Result<Value> {
    let child = Value::deserialize(deserializer)?;
    let untyped_null = child.is_null && child.data_type.type_id() == LogicalTypeID::Any;
    if child.data_type != *expected && !untyped_null {
        return Err(KuzuError::Serialization(format!(
            "Expected a {} child but found {}.",
            expected, child.data_type
        )));
    }
    Ok(Value::retype(expected, child))
}

impl Value {
    pub(crate) fn from_parts(data_type: LogicalType, val: Val, children: Vec<Value>) -> Self {
        Self {
            data_type,
            is_null: false,
            val,
            children,
        }
    }

    /// Untyped NULL
    pub fn create_null_value() -> Self {
        Self {
            data_type: LogicalType::any(),
            is_null: true,
            val: Val::Empty,
            children: Vec::new(),
        }
    }

    /// NULL of a given type; the payload is the type's zero value
    pub fn create_null_value_of(data_type: LogicalType) -> Self {
        let mut value = Self::create_default_value(&data_type);
        value.is_null = true;
        value
    }

    pub fn create_default_value(data_type: &LogicalType) -> Self {
        if data_type.type_id() == LogicalTypeID::Any {
            return Self::create_null_value();
        }
        TypeUtils::visit(data_type, DefaultValueBuilder)
    }

    /// Scalar of an explicit type whose storage type is `T`
    pub fn from_scalar<T: ScalarValue>(data_type: LogicalType, value: T) -> Self {
        crate::ku_assert!(data_type.physical_type() == T::PHYSICAL_TYPE);
        Self::from_parts(data_type, value.into_val(), Vec::new())
    }

    pub fn blob(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_parts(LogicalType::blob(), Val::Blob(bytes.into()), Vec::new())
    }

    pub fn uuid(text: &str) -> Result<Self> {
        Ok(Self::from_scalar(LogicalType::uuid(), KuUuid::from_string(text)?))
    }

    /// DECIMAL(precision, scale) holding `unscaled / 10^scale`
    pub fn decimal(unscaled: i128, precision: u32, scale: u32) -> Result<Self> {
        let data_type = LogicalType::try_decimal(precision, scale)?;
        if !DecimalUtils::fits_precision(unscaled, precision) {
            return Err(KuzuError::Overflow(format!(
                "Value {} is not within DECIMAL({}, {}) range.",
                unscaled, precision, scale
            )));
        }
        let val = match data_type.physical_type() {
            PhysicalTypeID::Int16 => Val::Int16(unscaled as i16),
            PhysicalTypeID::Int32 => Val::Int32(unscaled as i32),
            PhysicalTypeID::Int64 => Val::Int64(unscaled as i64),
            _ => Val::Int128(Int128::from_i128(unscaled)),
        };
        Ok(Self::from_parts(data_type, val, Vec::new()))
    }

    pub fn list(child_type: LogicalType, children: Vec<Value>) -> Self {
        let children = Self::retype_children(&child_type, children);
        Self::from_parts(LogicalType::list(child_type), Val::Nested, children)
    }

    pub fn array(child_type: LogicalType, children: Vec<Value>) -> Self {
        let num_elements = children.len() as u64;
        let children = Self::retype_children(&child_type, children);
        Self::from_parts(LogicalType::array(child_type, num_elements), Val::Nested, children)
    }

    pub fn struct_value(fields: Vec<(String, Value)>) -> Self {
        let (struct_fields, children): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|(name, value)| (StructField::new(name, value.data_type.clone()), value))
            .unzip();
        Self::from_parts(LogicalType::struct_type(struct_fields), Val::Nested, children)
    }

    pub fn map(key_type: LogicalType, value_type: LogicalType, entries: Vec<(Value, Value)>) -> Self {
        let data_type = LogicalType::map(key_type, value_type);
        let entry_type = ListType::get_child_type(&data_type).clone();
        let key_type = StructType::get_field(&entry_type, 0).data_type().clone();
        let value_type = StructType::get_field(&entry_type, 1).data_type().clone();
        let children = entries
            .into_iter()
            .map(|(key, value)| {
                Self::from_parts(
                    entry_type.clone(),
                    Val::Nested,
                    vec![Self::retype(&key_type, key), Self::retype(&value_type, value)],
                )
            })
            .collect();
        Self::from_parts(data_type, Val::Nested, children)
    }

    /// UNION value selecting member `tag`
    pub fn union_value(union_type: LogicalType, tag: i8, member: Value) -> Self {
        crate::ku_assert!(union_type.type_id() == LogicalTypeID::Union);
        let member_type = UnionType::get_field_type(&union_type, tag as usize).clone();
        let member = Self::retype(&member_type, member);
        Self::from_parts(union_type, Val::Union { tag }, vec![member])
    }

    /// Nested value of an explicit type, one child per element or field
    pub fn new_nested(data_type: LogicalType, children: Vec<Value>) -> Self {
        crate::ku_assert!(data_type.physical_type().is_nested());
        crate::ku_assert!(
            data_type.type_id() == LogicalTypeID::List
                || data_type.type_id() == LogicalTypeID::Map
                || data_type.type_id() == LogicalTypeID::Array
                || StructType::get_num_fields(&data_type) == children.len()
        );
        Self::from_parts(data_type, Val::Nested, children)
    }

    fn retype(data_type: &LogicalType, value: Value) -> Value {
        if value.is_null && value.data_type.type_id() == LogicalTypeID::Any {
            return Self::create_null_value_of(data_type.clone());
        }
        value
    }

    fn retype_children(child_type: &LogicalType, children: Vec<Value>) -> Vec<Value> {
        children
            .into_iter()
            .map(|child| Self::retype(child_type, child))
            .collect()
    }

    pub fn data_type(&self) -> &LogicalType {
        &self.data_type
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }

    pub fn set_null(&mut self, is_null: bool) {
        self.is_null = is_null;
    }

    pub fn val(&self) -> &Val {
        &self.val
    }

    pub fn children(&self) -> &[Value] {
        &self.children
    }

    pub fn get_children_size(&self) -> usize {
        self.children.len()
    }

    pub fn get_child(&self, idx: usize) -> &Value {
        &self.children[idx]
    }

    /// Overwrite payload and null flag with those of a value of the same type
    pub fn copy_value_from(&mut self, other: &Value) {
        crate::ku_assert!(self.data_type == other.data_type || self.data_type.type_id() == LogicalTypeID::Any);
        self.data_type = other.data_type.clone();
        self.is_null = other.is_null;
        self.val = other.val.clone();
        self.children = other.children.clone();
    }

    /// Typed read; a mismatched type is a caller bug
    pub fn get_value<T: FromValue>(&self) -> T {
        T::from_value(self).unwrap_or_else(|| {
            crate::ku_unreachable!(
                "cannot read a {} value as {}",
                self.data_type,
                std::any::type_name::<T>()
            )
        })
    }

    /// Typed read for values crossing an API boundary
    pub fn try_get_value<T: FromValue>(&self) -> Result<T> {
        T::from_value(self).ok_or_else(|| {
            KuzuError::Conversion(format!(
                "Cannot read a {} value as {}.",
                self.data_type,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Borrow a STRING payload
    pub fn get_str(&self) -> &str {
        match &self.val {
            Val::Str(s) => s,
            _ => crate::ku_unreachable!("{} value is not a STRING", self.data_type),
        }
    }

    /// Borrow a BLOB or STRING payload
    pub fn get_bytes(&self) -> &[u8] {
        match &self.val {
            Val::Blob(b) => b,
            Val::Str(s) => s.as_bytes(),
            _ => crate::ku_unreachable!("{} value has no byte payload", self.data_type),
        }
    }

    pub fn serialize(&self, serializer: &mut Serializer) {
        self.data_type.serialize(serializer);
        serializer.write_bool(self.is_null);
        if self.is_null {
            return;
        }
        match &self.val {
            Val::Empty => {}
            Val::Bool(v) => serializer.write_fixed(*v),
            Val::Int8(v) => serializer.write_fixed(*v),
            Val::Int16(v) => serializer.write_fixed(*v),
            Val::Int32(v) => serializer.write_fixed(*v),
            Val::Int64(v) => serializer.write_fixed(*v),
            Val::Uint8(v) => serializer.write_fixed(*v),
            Val::Uint16(v) => serializer.write_fixed(*v),
            Val::Uint32(v) => serializer.write_fixed(*v),
            Val::Uint64(v) => serializer.write_fixed(*v),
            Val::Int128(v) => serializer.write_fixed(*v),
            Val::Uint128(v) => serializer.write_fixed(*v),
            Val::Float(v) => serializer.write_fixed(*v),
            Val::Double(v) => serializer.write_fixed(*v),
            Val::Interval(v) => serializer.write_fixed(*v),
            Val::InternalId(v) => serializer.write_fixed(*v),
            Val::Pointer(v) => serializer.write_fixed(*v),
            Val::Str(s) => serializer.write_str(s),
            Val::Blob(b) => serializer.write_bytes(b),
            Val::Nested => {
                serializer.write_varint(self.children.len() as u64);
                for child in &self.children {
                    child.serialize(serializer);
                }
            }
            Val::Union { tag } => {
                serializer.write_fixed(*tag);
                self.children[0].serialize(serializer);
            }
        }
    }

    pub fn deserialize(deserializer: &mut Deserializer) -> Result<Self> {
        let data_type = LogicalType::deserialize(deserializer)?;
        let is_null = deserializer.read_bool()?;
        if data_type.type_id() == LogicalTypeID::Any {
            return Ok(Self::create_null_value());
        }
        if is_null {
            return Ok(Self::create_null_value_of(data_type));
        }
        let (val, children) = TypeUtils::visit(&data_type, PayloadReader { deserializer })?;
        Ok(Self::from_parts(data_type, val, children))
    }

    pub fn to_bytes(&self) -> bytes::Bytes {
        let mut serializer = Serializer::versioned();
        self.serialize(&mut serializer);
        serializer.finish()
    }

    pub fn from_bytes(bytes: impl Into<bytes::Bytes>) -> Result<Self> {
        let mut deserializer = Deserializer::versioned(bytes)?;
        Self::deserialize(&mut deserializer)
    }

    fn unscaled_decimal(&self) -> i128 {
        match &self.val {
            Val::Int16(v) => *v as i128,
            Val::Int32(v) => *v as i128,
            Val::Int64(v) => *v as i128,
            Val::Int128(v) => v.to_i128(),
            _ => crate::ku_unreachable!("DECIMAL payload {:?}", self.val),
        }
    }

    fn fmt_scalar(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.data_type.type_id(), &self.val) {
            (LogicalTypeID::Bool, Val::Bool(v)) => write!(f, "{}", if *v { "True" } else { "False" }),
            (LogicalTypeID::Decimal, _) => write!(
                f,
                "{}",
                DecimalUtils::to_string(self.unscaled_decimal(), DecimalType::get_scale(&self.data_type))
            ),
            (LogicalTypeID::Uuid, Val::Int128(v)) => write!(f, "{}", KuUuid::to_string(*v)),
            (LogicalTypeID::Date, Val::Int32(v)) => write!(f, "{}", Date::new(*v)),
            (LogicalTypeID::Timestamp, Val::Int64(v)) => write!(f, "{}", Timestamp::new(*v)),
            (LogicalTypeID::TimestampSec, Val::Int64(v)) => write!(f, "{}", TimestampSec::new(*v)),
            (LogicalTypeID::TimestampMs, Val::Int64(v)) => write!(f, "{}", TimestampMs::new(*v)),
            (LogicalTypeID::TimestampNs, Val::Int64(v)) => write!(f, "{}", TimestampNs::new(*v)),
            (LogicalTypeID::TimestampTz, Val::Int64(v)) => write!(f, "{}", TimestampTz::new(*v)),
            (_, Val::Int8(v)) => write!(f, "{}", v),
            (_, Val::Int16(v)) => write!(f, "{}", v),
            (_, Val::Int32(v)) => write!(f, "{}", v),
            (_, Val::Int64(v)) => write!(f, "{}", v),
            (_, Val::Uint8(v)) => write!(f, "{}", v),
            (_, Val::Uint16(v)) => write!(f, "{}", v),
            (_, Val::Uint32(v)) => write!(f, "{}", v),
            (_, Val::Uint64(v)) => write!(f, "{}", v),
            (_, Val::Int128(v)) => write!(f, "{}", v),
            (_, Val::Uint128(v)) => write!(f, "{}", v),
            (_, Val::Float(v)) => write!(f, "{}", v),
            (_, Val::Double(v)) => write!(f, "{}", v),
            (_, Val::Interval(v)) => write!(f, "{}", v),
            (_, Val::InternalId(v)) => write!(f, "{}", v),
            (_, Val::Pointer(v)) => write!(f, "{}", v),
            (_, Val::Str(s)) => write!(f, "{}", s),
            (_, Val::Blob(bytes)) => write!(f, "{}", blob_to_string(bytes)),
            (_, Val::Bool(v)) => write!(f, "{}", v),
            _ => Ok(()),
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data_type.type_id() {
            LogicalTypeID::List | LogicalTypeID::Array => {
                write!(f, "[")?;
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, "]")
            }
            LogicalTypeID::Map => {
                write!(f, "{{")?;
                for (i, entry) in self.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", entry.children[0], entry.children[1])?;
                }
                write!(f, "}}")
            }
            LogicalTypeID::Union => write!(f, "{}", self.children[0]),
            LogicalTypeID::Node => match NodeVal::to_string(self) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => self.fmt_struct(f),
            },
            LogicalTypeID::Rel => match RelVal::to_string(self) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => self.fmt_struct(f),
            },
            LogicalTypeID::RecursiveRel => match RecursiveRelVal::to_string(self) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => self.fmt_struct(f),
            },
            _ => self.fmt_struct(f),
        }
    }

    fn fmt_struct(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let fields = StructType::get_fields(&self.data_type);
        for (i, (field, child)) in fields.iter().zip(&self.children).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name(), child)?;
        }
        write!(f, "}}")
    }
}

/// Printable ASCII stays as is; everything else becomes `\xHH`
pub fn blob_to_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        if (byte.is_ascii_graphic() && byte != b'\\') || byte == b' ' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("\\x{:02X}", byte));
        }
    }
    out
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.data_type != other.data_type || self.is_null != other.is_null {
            return false;
        }
        self.is_null || (self.val == other.val && self.children == other.children)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null {
            return Ok(());
        }
        if self.data_type.physical_type().is_nested() {
            self.fmt_nested(f)
        } else {
            self.fmt_scalar(f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_construction_and_access() {
        let v = Value::from(42i64);
        assert_eq!(v.data_type(), &LogicalType::int64());
        assert_eq!(v.get_value::<i64>(), 42);
        assert!(v.try_get_value::<i32>().is_err());

        let d = Value::from(Date::new(3));
        assert_eq!(d.data_type().type_id(), LogicalTypeID::Date);
        assert_eq!(d.get_value::<Date>(), Date::new(3));
        assert_eq!(d.to_string(), "1970-01-04");

        let s = Value::from("kuzu");
        assert_eq!(s.get_str(), "kuzu");
        assert_eq!(s.get_value::<String>(), "kuzu");
    }

    #[test]
    #[should_panic(expected = "KU_UNREACHABLE")]
    fn test_mismatched_access_fails_loudly() {
        Value::from(1.5f64).get_value::<i64>();
    }

    #[test]
    fn test_null_values() {
        let null = Value::create_null_value_of(LogicalType::int32());
        assert!(null.is_null());
        assert_eq!(null.to_string(), "");
        assert_eq!(null.get_value::<i32>(), 0);
        assert_ne!(null, Value::from(0i32));
        assert_eq!(null, Value::create_null_value_of(LogicalType::int32()));

        let list = Value::list(LogicalType::int64(), vec![Value::from(1i64), Value::create_null_value()]);
        assert_eq!(list.get_child(1).data_type(), &LogicalType::int64());
        assert_eq!(list.to_string(), "[1,]");
    }

    #[test]
    fn test_decimal_value() {
        let v = Value::decimal(12345, 10, 2).unwrap();
        assert_eq!(v.data_type().physical_type(), PhysicalTypeID::Int64);
        assert_eq!(v.to_string(), "123.45");
        assert!(Value::decimal(100_000, 4, 2).is_err());
    }

    #[test]
    fn test_nested_display() {
        let st = Value::struct_value(vec![
            ("a".to_string(), Value::from(1i64)),
            ("b".to_string(), Value::from("x")),
        ]);
        assert_eq!(st.to_string(), "{a: 1, b: x}");

        let map = Value::map(
            LogicalType::string(),
            LogicalType::int64(),
            vec![(Value::from("k"), Value::from(2i64))],
        );
        assert_eq!(map.to_string(), "{k=2}");

        assert_eq!(Value::from(true).to_string(), "True");
        assert_eq!(Value::blob(vec![b'a', 0xff]).to_string(), "a\\xFF");
    }

    #[test]
    fn test_serialization_round_trip() {
        let union_type = LogicalType::union_type(vec![
            StructField::new("i", LogicalType::int64()),
            StructField::new("s", LogicalType::string()),
        ]);
        let value = Value::struct_value(vec![
            ("dec".to_string(), Value::decimal(-705, 10, 2).unwrap()),
            ("uuid".to_string(), Value::uuid("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap()),
            (
                "list".to_string(),
                Value::list(LogicalType::string(), vec![Value::from("a"), Value::create_null_value()]),
            ),
            ("u".to_string(), Value::union_value(union_type, 1, Value::from("member"))),
            ("blob".to_string(), Value::blob(vec![0u8, 1, 2])),
        ]);
        let decoded = Value::from_bytes(value.to_bytes()).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decoded.get_child(0).to_string(), "-7.05");
        assert_eq!(decoded.get_child(3).to_string(), "member");
    }

    #[test]
    fn test_default_values() {
        let ty = LogicalType::array(LogicalType::int16(), 2);
        let value = Value::create_default_value(&ty);
        assert_eq!(value.get_children_size(), 2);
        assert_eq!(value.to_string(), "[0,0]");
    }

    fn decode_value(write: impl FnOnce(&mut Serializer)) -> Result<Value> {
        let mut serializer = Serializer::versioned();
        write(&mut serializer);
        Value::from_bytes(serializer.finish())
    }

    #[test]
    fn test_corrupt_type_is_an_error() {
        // STRUCT without fields, NULL flag set
        let result = decode_value(|s| {
            s.write_u8(LogicalTypeID::Struct as u8);
            s.write_u8(0);
            s.write_bool(true);
        });
        assert!(matches!(result, Err(KuzuError::Serialization(_))));
    }

    #[test]
    fn test_children_must_match_declared_type() {
        let list_type = LogicalType::list(LogicalType::int64());
        let result = decode_value(|s| {
            list_type.serialize(s);
            s.write_bool(false);
            s.write_varint(1);
            Value::from("not a number").serialize(s);
        });
        assert!(matches!(result, Err(KuzuError::Serialization(_))));

        let array_type = LogicalType::array(LogicalType::int64(), 3);
        let result = decode_value(|s| {
            array_type.serialize(s);
            s.write_bool(false);
            s.write_varint(2);
            Value::from(1i64).serialize(s);
            Value::from(2i64).serialize(s);
        });
        assert!(matches!(result, Err(KuzuError::Serialization(_))));

        let struct_type = LogicalType::struct_type(vec![
            StructField::new("a", LogicalType::int64()),
            StructField::new("b", LogicalType::string()),
        ]);
        let result = decode_value(|s| {
            struct_type.serialize(s);
            s.write_bool(false);
            s.write_varint(1);
            Value::from(1i64).serialize(s);
        });
        assert!(matches!(result, Err(KuzuError::Serialization(_))));
    }

    #[test]
    fn test_union_tag_out_of_range() {
        let union_type = LogicalType::union_type(vec![
            StructField::new("i", LogicalType::int64()),
            StructField::new("s", LogicalType::string()),
        ]);
        for tag in [2i8, -1] {
            let result = decode_value(|s| {
                union_type.serialize(s);
                s.write_bool(false);
                s.write_fixed(tag);
                Value::from("x").serialize(s);
            });
            assert!(matches!(result, Err(KuzuError::Serialization(_))), "tag {}", tag);
        }

        let valid = Value::union_value(union_type, 0, Value::create_null_value());
        let decoded = Value::from_bytes(valid.to_bytes()).unwrap();
        assert_eq!(decoded, valid);
    }
}
