//! Casts between logical types
//!
//! Numeric casts are monomorphised per source and destination storage type.
//! Casts to STRING print the value; casts from STRING parse it, nested types
//! included, with the delimiters of [`CastStringOptions`].

use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::error::{KuzuError, Result};
use crate::function::scalar_function::{ScalarExecFunc, ScalarFunction};
use crate::function::unary_executor::{
    UnaryCastStringFunctionWrapper, UnaryFunctionExecutor, UnaryNestedFunctionWrapper,
};
use crate::types::decimal::DecimalUtils;
use crate::types::entries::InternalId;
use crate::types::int128::Int128;
use crate::types::logical_type::{
    ArrayType, DecimalType, ListType, LogicalType, LogicalTypeID, StructType, UnionType,
};
use crate::types::physical_value::NumericValue;
use crate::types::temporal::{
    Date, Timestamp, TimestampMs, TimestampNs, TimestampSec, TimestampTz,
};
use crate::types::type_utils::{NumericTypeVisitor, TypeUtils};
use crate::types::value::Value;
use crate::vector::accessors::StringVector;
use crate::vector::value_vector::ValueVector;

/// Delimiters used when parsing nested values out of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastStringOptions {
    pub delimiter: char,
    pub quote_char: char,
    pub escape_char: char,
}

impl Default for CastStringOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            escape_char: '\\',
        }
    }
}

fn cast_error(input: &str, target: &LogicalType) -> KuzuError {
    KuzuError::Conversion(format!(
        "Cast failed. Could not convert \"{}\" to {}.",
        input, target
    ))
}

/// Convert between numeric storage types, rounding floats to the nearest integer
pub fn try_cast_numeric<S: NumericValue, D: NumericValue>(value: S) -> Result<D> {
    let cast = if !S::IS_INTEGRAL && D::IS_INTEGRAL {
        value.to_f64().and_then(|v| <D as num_traits::NumCast>::from(v.round()))
    } else {
        <D as num_traits::NumCast>::from(value)
    };
    cast.ok_or_else(|| {
        KuzuError::Overflow(format!("Value {} is not within {} range", value, D::TYPE_NAME))
    })
}

fn parse_as<T: FromStr>(input: &str, target: &LogicalType) -> Result<T> {
    input.trim().parse::<T>().map_err(|_| cast_error(input, target))
}

/// Parse `input` as a value of `target`
pub fn cast_string_to_value(
    input: &str,
    target: &LogicalType,
    options: &CastStringOptions,
) -> Result<Value> {
    let trimmed = input.trim();
    let value = match target.type_id() {
        LogicalTypeID::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                Value::from(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Value::from(false)
            } else {
                return Err(cast_error(input, target));
            }
        }
        LogicalTypeID::Int8 => Value::from(parse_as::<i8>(input, target)?),
        LogicalTypeID::Int16 => Value::from(parse_as::<i16>(input, target)?),
        LogicalTypeID::Int32 => Value::from(parse_as::<i32>(input, target)?),
        LogicalTypeID::Int64 | LogicalTypeID::Serial => {
            Value::from_scalar(target.clone(), parse_as::<i64>(input, target)?)
        }
        LogicalTypeID::Uint8 => Value::from(parse_as::<u8>(input, target)?),
        LogicalTypeID::Uint16 => Value::from(parse_as::<u16>(input, target)?),
        LogicalTypeID::Uint32 => Value::from(parse_as::<u32>(input, target)?),
        LogicalTypeID::Uint64 => Value::from(parse_as::<u64>(input, target)?),
        LogicalTypeID::Uint128 => Value::from(parse_as::<u128>(input, target)?),
        LogicalTypeID::Int128 => Value::from(parse_as::<Int128>(input, target)?),
        LogicalTypeID::Float => Value::from(parse_as::<f32>(input, target)?),
        LogicalTypeID::Double => Value::from(parse_as::<f64>(input, target)?),
        LogicalTypeID::Decimal => {
            let precision = DecimalType::get_precision(target);
            let scale = DecimalType::get_scale(target);
            Value::decimal(DecimalUtils::from_str(trimmed, precision, scale)?, precision, scale)?
        }
        LogicalTypeID::Date => Value::from(trimmed.parse::<Date>()?),
        LogicalTypeID::Timestamp => Value::from(trimmed.parse::<Timestamp>()?),
        LogicalTypeID::TimestampSec => Value::from(trimmed.parse::<TimestampSec>()?),
        LogicalTypeID::TimestampMs => Value::from(trimmed.parse::<TimestampMs>()?),
        LogicalTypeID::TimestampNs => Value::from(trimmed.parse::<TimestampNs>()?),
        LogicalTypeID::TimestampTz => Value::from(trimmed.parse::<TimestampTz>()?),
        LogicalTypeID::Uuid => Value::uuid(trimmed)?,
        LogicalTypeID::InternalId => Value::from(trimmed.parse::<InternalId>()?),
        LogicalTypeID::String => Value::from(input),
        LogicalTypeID::Blob => Value::blob(parse_blob(input)?),
        LogicalTypeID::List | LogicalTypeID::Array => parse_list(trimmed, target, options)?,
        LogicalTypeID::Map => parse_map(trimmed, target, options)?,
        LogicalTypeID::Struct | LogicalTypeID::Node | LogicalTypeID::Rel => {
            parse_struct(trimmed, target, options)?
        }
        LogicalTypeID::Union => parse_union(input, target, options)?,
        LogicalTypeID::Interval
        | LogicalTypeID::RecursiveRel
        | LogicalTypeID::Pointer
        | LogicalTypeID::Any => {
            return Err(KuzuError::Conversion(format!(
                "Unsupported casting function from STRING to {}.",
                target
            )))
        }
    };
    Ok(value)
}

/// Printable bytes are taken literally, `\xHH` escapes decode to one byte
fn parse_blob(input: &str) -> Result<Vec<u8>> {
    let invalid = || {
        KuzuError::Conversion(format!(
            "Invalid byte encountered in STRING -> BLOB conversion of \"{}\".",
            input
        ))
    };
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        if bytes.get(i + 1) != Some(&b'x') || i + 4 > bytes.len() {
            return Err(invalid());
        }
        let hex = std::str::from_utf8(&bytes[i + 2..i + 4]).map_err(|_| invalid())?;
        out.push(u8::from_str_radix(hex, 16).map_err(|_| invalid())?);
        i += 4;
    }
    Ok(out)
}

/// Split `input` at every `target` outside quotes and nested brackets
fn split_top_level<'a>(input: &'a str, target: char, options: &CastStringOptions) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == options.escape_char {
            escaped = true;
        } else if ch == options.quote_char {
            in_quote = !in_quote;
        } else if in_quote {
            continue;
        } else if matches!(ch, '[' | '{' | '(') {
            depth += 1;
        } else if matches!(ch, ']' | '}' | ')') {
            depth = depth.saturating_sub(1);
        } else if ch == target && depth == 0 {
            parts.push(&input[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn split_once_top_level<'a>(
    input: &'a str,
    target: char,
    options: &CastStringOptions,
) -> Option<(&'a str, &'a str)> {
    let parts = split_top_level(input, target, options);
    if parts.len() < 2 {
        return None;
    }
    let key_len = parts[0].len();
    Some((&input[..key_len], &input[key_len + target.len_utf8()..]))
}

fn strip_brackets<'a>(input: &'a str, open: char, close: char, target: &LogicalType) -> Result<&'a str> {
    input
        .strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .ok_or_else(|| cast_error(input, target))
}

/// Element of a nested literal: empty and NULL are nulls, quoted strings are unquoted
fn parse_element(input: &str, data_type: &LogicalType, options: &CastStringOptions) -> Result<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(Value::create_null_value_of(data_type.clone()));
    }
    let quote = options.quote_char;
    if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
        let inner = &trimmed[quote.len_utf8()..trimmed.len() - quote.len_utf8()];
        let mut unescaped = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch == options.escape_char {
                if let Some(next) = chars.next() {
                    unescaped.push(next);
                }
            } else {
                unescaped.push(ch);
            }
        }
        return cast_string_to_value(&unescaped, data_type, options);
    }
    cast_string_to_value(trimmed, data_type, options)
}

fn parse_list(input: &str, target: &LogicalType, options: &CastStringOptions) -> Result<Value> {
    let body = strip_brackets(input, '[', ']', target)?;
    let child_type = ListType::get_child_type(target);
    let children = if body.trim().is_empty() {
        Vec::new()
    } else {
        split_top_level(body, options.delimiter, options)
            .into_iter()
            .map(|element| parse_element(element, child_type, options))
            .collect::<Result<Vec<_>>>()?
    };
    if target.type_id() == LogicalTypeID::Array {
        let expected = ArrayType::get_num_elements(target) as usize;
        if children.len() != expected {
            return Err(KuzuError::Conversion(format!(
                "Expected type {} but list {} has {} elements.",
                target,
                input,
                children.len()
            )));
        }
    }
    Ok(Value::new_nested(target.clone(), children))
}

fn parse_map(input: &str, target: &LogicalType, options: &CastStringOptions) -> Result<Value> {
    let body = strip_brackets(input, '{', '}', target)?;
    let entry_type = ListType::get_child_type(target);
    let key_type = StructType::get_field(entry_type, 0).data_type();
    let value_type = StructType::get_field(entry_type, 1).data_type();
    let mut entries = Vec::new();
    if !body.trim().is_empty() {
        for entry in split_top_level(body, options.delimiter, options) {
            let (key, value) =
                split_once_top_level(entry, '=', options).ok_or_else(|| cast_error(input, target))?;
            let key = parse_element(key, key_type, options)?;
            if key.is_null() {
                return Err(KuzuError::Conversion("Map does not allow null as key.".to_string()));
            }
            let value = parse_element(value, value_type, options)?;
            entries.push(Value::new_nested(entry_type.clone(), vec![key, value]));
        }
    }
    Ok(Value::new_nested(target.clone(), entries))
}

fn parse_struct(input: &str, target: &LogicalType, options: &CastStringOptions) -> Result<Value> {
    let body = strip_brackets(input, '{', '}', target)?;
    let fields = StructType::get_fields(target);
    let mut children: Vec<Option<Value>> = vec![None; fields.len()];
    if !body.trim().is_empty() {
        for entry in split_top_level(body, options.delimiter, options) {
            let (name, value) =
                split_once_top_level(entry, ':', options).ok_or_else(|| cast_error(input, target))?;
            let name = name.trim();
            let idx = fields
                .iter()
                .position(|field| field.name().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    KuzuError::Conversion(format!("Invalid struct field name: {}.", name))
                })?;
            children[idx] = Some(parse_element(value, fields[idx].data_type(), options)?);
        }
    }
    let children = children
        .into_iter()
        .zip(fields)
        .map(|(child, field)| {
            child.unwrap_or_else(|| Value::create_null_value_of(field.data_type().clone()))
        })
        .collect();
    Ok(Value::new_nested(target.clone(), children))
}

/// First member type that accepts the input wins
fn parse_union(input: &str, target: &LogicalType, options: &CastStringOptions) -> Result<Value> {
    for tag in 0..UnionType::get_num_fields(target) {
        let member_type = UnionType::get_field_type(target, tag);
        if let Ok(member) = cast_string_to_value(input, member_type, options) {
            return Ok(Value::union_value(target.clone(), tag as i8, member));
        }
    }
    Err(cast_error(input, target))
}

struct NumericCastSource {
    target: LogicalType,
}

impl NumericTypeVisitor for NumericCastSource {
    type Output = Result<ScalarExecFunc>;

    fn visit<S: NumericValue>(self) -> Result<ScalarExecFunc> {
        TypeUtils::visit_numeric(&self.target, NumericCastTarget::<S>(PhantomData))
    }
}

struct NumericCastTarget<S>(PhantomData<S>);

impl<S: NumericValue> NumericTypeVisitor for NumericCastTarget<S> {
    type Output = ScalarExecFunc;

    fn visit<D: NumericValue>(self) -> ScalarExecFunc {
        Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
            UnaryFunctionExecutor::execute(params[0], result, try_cast_numeric::<S, D>)
        })
    }
}

pub struct CastFunction;

impl CastFunction {
    /// Bind the cast from `source` to `target`
    pub fn bind_cast_function(source: &LogicalType, target: &LogicalType) -> Result<ScalarFunction> {
        Self::bind_cast_function_with_options(source, target, CastStringOptions::default())
    }

    pub fn bind_cast_function_with_options(
        source: &LogicalType,
        target: &LogicalType,
        options: CastStringOptions,
    ) -> Result<ScalarFunction> {
        let exec_func = Self::bind_exec_func(source, target, options)?;
        Ok(ScalarFunction::new(
            format!("CAST_TO_{}", target.type_id()),
            vec![source.type_id()],
            target.type_id(),
            exec_func,
        ))
    }

    fn bind_exec_func(
        source: &LogicalType,
        target: &LogicalType,
        options: CastStringOptions,
    ) -> Result<ScalarExecFunc> {
        if source == target {
            return Ok(Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                UnaryFunctionExecutor::execute_switch(
                    params[0],
                    result,
                    &mut UnaryNestedFunctionWrapper::new(
                        |input: &ValueVector, input_pos: usize, result: &mut ValueVector, result_pos: usize| {
                            result.copy_from_vector_data(result_pos, input, input_pos)
                        },
                    ),
                )
            }));
        }
        let (source_id, target_id) = (source.type_id(), target.type_id());
        if target_id == LogicalTypeID::String {
            return Ok(Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                UnaryFunctionExecutor::execute_switch(
                    params[0],
                    result,
                    &mut UnaryNestedFunctionWrapper::new(
                        |input: &ValueVector, input_pos: usize, result: &mut ValueVector, result_pos: usize| {
                            let text = input.get_as_value(input_pos).to_string();
                            StringVector::add_string(result, result_pos, text.as_bytes())
                        },
                    ),
                )
            }));
        }
        if source_id == LogicalTypeID::String {
            let target = target.clone();
            return Ok(Arc::new(move |params: &[&ValueVector], result: &mut ValueVector| {
                UnaryFunctionExecutor::execute_switch(
                    params[0],
                    result,
                    &mut UnaryCastStringFunctionWrapper::new(
                        &options,
                        |input: &[u8], result: &mut ValueVector, pos: usize, options: &CastStringOptions| {
                            let text = String::from_utf8_lossy(input);
                            let value = cast_string_to_value(&text, &target, options)?;
                            result.copy_from_value(pos, &value)
                        },
                    ),
                )
            }));
        }
        if source_id == LogicalTypeID::Date && target_id == LogicalTypeID::Timestamp {
            return Ok(Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                UnaryFunctionExecutor::execute(params[0], result, |date: Date| {
                    Ok(Timestamp::from_date(date))
                })
            }));
        }
        if source_id == LogicalTypeID::Timestamp && target_id == LogicalTypeID::Date {
            return Ok(Arc::new(|params: &[&ValueVector], result: &mut ValueVector| {
                UnaryFunctionExecutor::execute(params[0], result, |ts: Timestamp| Ok(ts.date()))
            }));
        }
        let is_plain_numeric = |id: LogicalTypeID| id.is_numeric() && id != LogicalTypeID::Decimal;
        if is_plain_numeric(source_id) && is_plain_numeric(target_id) {
            return TypeUtils::visit_numeric(
                source,
                NumericCastSource {
                    target: target.clone(),
                },
            )?;
        }
        Err(KuzuError::Binder(format!(
            "Unsupported casting function from {} to {}.",
            source, target
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::types::logical_type::StructField;
    use crate::vector::data_chunk::DataChunkState;

    fn run_cast(source: &LogicalType, target: &LogicalType, inputs: &[Value]) -> Result<Vec<Value>> {
        let mm = MemoryManager::default();
        let state = DataChunkState::new_shared(inputs.len());
        let mut input = ValueVector::with_state(source.clone(), &mm, state.clone());
        for (pos, value) in inputs.iter().enumerate() {
            input.copy_from_value(pos, value)?;
        }
        let mut result = ValueVector::with_state(target.clone(), &mm, state);
        let function = CastFunction::bind_cast_function(source, target)?;
        function.execute(&[&input], &mut result)?;
        Ok((0..inputs.len()).map(|pos| result.get_as_value(pos)).collect())
    }

    #[test]
    fn test_numeric_casts() {
        assert_eq!(try_cast_numeric::<i64, i8>(100).unwrap(), 100i8);
        let err = try_cast_numeric::<i64, i8>(300).unwrap_err();
        assert_eq!(err.to_string(), "Overflow exception: Value 300 is not within INT8 range");
        assert_eq!(try_cast_numeric::<f64, i32>(2.5).unwrap(), 3);
        assert_eq!(try_cast_numeric::<f64, i32>(-2.4).unwrap(), -2);
        assert!(try_cast_numeric::<i32, u16>(-1).is_err());
        assert_eq!(try_cast_numeric::<Int128, i64>(Int128::from(5i64)).unwrap(), 5);
    }

    #[test]
    fn test_vectorised_numeric_cast() {
        let out = run_cast(
            &LogicalType::int64(),
            &LogicalType::int16(),
            &[Value::from(7i64), Value::create_null_value_of(LogicalType::int64())],
        )
        .unwrap();
        assert_eq!(out[0], Value::from(7i16));
        assert!(out[1].is_null());
        assert!(run_cast(&LogicalType::int64(), &LogicalType::int8(), &[Value::from(1000i64)]).is_err());
    }

    #[test]
    fn test_cast_to_string() {
        let list_type = LogicalType::list(LogicalType::int64());
        let list = Value::list(LogicalType::int64(), vec![Value::from(1i64), Value::from(2i64)]);
        let out = run_cast(&list_type, &LogicalType::string(), &[list]).unwrap();
        assert_eq!(out[0], Value::from("[1,2]"));
    }

    #[test]
    fn test_string_to_scalars() {
        let options = CastStringOptions::default();
        assert_eq!(
            cast_string_to_value(" 42 ", &LogicalType::int64(), &options).unwrap(),
            Value::from(42i64)
        );
        assert_eq!(
            cast_string_to_value("TRUE", &LogicalType::bool(), &options).unwrap(),
            Value::from(true)
        );
        let err = cast_string_to_value("abc", &LogicalType::int64(), &options).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Conversion exception: Cast failed. Could not convert \"abc\" to INT64."
        );
        assert!(cast_string_to_value("300", &LogicalType::int8(), &options).is_err());
        assert_eq!(
            cast_string_to_value("12.345", &LogicalType::decimal(5, 2), &options).unwrap(),
            Value::decimal(1235, 5, 2).unwrap()
        );
        assert_eq!(
            cast_string_to_value("1970-01-04", &LogicalType::date(), &options).unwrap(),
            Value::from(Date::new(3))
        );
        assert_eq!(
            cast_string_to_value("a\\x00b", &LogicalType::blob(), &options).unwrap(),
            Value::blob(vec![b'a', 0, b'b'])
        );
        assert!(cast_string_to_value("1 day", &LogicalType::interval(), &options).is_err());
    }

    #[test]
    fn test_string_to_nested() {
        let options = CastStringOptions::default();
        let list = cast_string_to_value(
            "[1, NULL, 3]",
            &LogicalType::list(LogicalType::int32()),
            &options,
        )
        .unwrap();
        assert_eq!(list.get_children_size(), 3);
        assert!(list.get_child(1).is_null());
        assert_eq!(list.get_child(2), &Value::from(3i32));

        let nested = cast_string_to_value(
            "[[1,2],[3]]",
            &LogicalType::list(LogicalType::list(LogicalType::int64())),
            &options,
        )
        .unwrap();
        assert_eq!(nested.to_string(), "[[1,2],[3]]");

        let words = cast_string_to_value(
            "[\"a,b\", c]",
            &LogicalType::list(LogicalType::string()),
            &options,
        )
        .unwrap();
        assert_eq!(words.get_child(0), &Value::from("a,b"));

        let st_type = LogicalType::struct_type(vec![
            StructField::new("a", LogicalType::int64()),
            StructField::new("b", LogicalType::string()),
        ]);
        let st = cast_string_to_value("{a: 1, b: x}", &st_type, &options).unwrap();
        assert_eq!(st.to_string(), "{a: 1, b: x}");
        assert!(cast_string_to_value("{z: 1}", &st_type, &options).is_err());

        let map_type = LogicalType::map(LogicalType::string(), LogicalType::int64());
        let map = cast_string_to_value("{k=1, j=2}", &map_type, &options).unwrap();
        assert_eq!(map.to_string(), "{k=1, j=2}");

        let array_type = LogicalType::array(LogicalType::int64(), 2);
        assert!(cast_string_to_value("[1,2,3]", &array_type, &options).is_err());
    }

    #[test]
    fn test_string_to_union_picks_first_match() {
        let options = CastStringOptions::default();
        let union_type = LogicalType::union_type(vec![
            StructField::new("i", LogicalType::int64()),
            StructField::new("s", LogicalType::string()),
        ]);
        let number = cast_string_to_value("12", &union_type, &options).unwrap();
        assert_eq!(number, Value::union_value(union_type.clone(), 0, Value::from(12i64)));
        let text = cast_string_to_value("twelve", &union_type, &options).unwrap();
        assert_eq!(text, Value::union_value(union_type, 1, Value::from("twelve")));
    }

    #[test]
    fn test_vectorised_string_cast() {
        let out = run_cast(
            &LogicalType::string(),
            &LogicalType::list(LogicalType::int64()),
            &[Value::from("[4,5,6]"), Value::from("[]")],
        )
        .unwrap();
        assert_eq!(out[0].to_string(), "[4,5,6]");
        assert_eq!(out[1].get_children_size(), 0);
        assert!(run_cast(&LogicalType::string(), &LogicalType::int64(), &[Value::from("x")]).is_err());
    }

    #[test]
    fn test_unsupported_cast_is_a_binder_error() {
        let err = CastFunction::bind_cast_function(&LogicalType::bool(), &LogicalType::date())
            .unwrap_err();
        assert!(matches!(err, KuzuError::Binder(_)));
    }
}
