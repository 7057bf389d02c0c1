//! Read-only views over NODE, REL and RECURSIVE_REL values
//!
//! Each view checks the logical type of the value it is handed and reports a
//! mismatch as a runtime error instead of indexing blindly.

use crate::common::constants::internal_keyword;
use crate::common::error::{KuzuError, Result};
use crate::types::entries::InternalId;
use crate::types::logical_type::{LogicalTypeID, StructType};
use crate::types::value::Value;

const NODE_PROPERTY_OFFSET: usize = 2;
const REL_PROPERTY_OFFSET: usize = 4;

fn check_type(value: &Value, expected: LogicalTypeID) -> Result<()> {
    if value.data_type().type_id() != expected {
        return Err(KuzuError::Runtime(format!(
            "Expected {} type, but got {} type",
            expected,
            value.data_type().type_id()
        )));
    }
    Ok(())
}

fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value> {
    StructType::get_field_idx(value.data_type(), name)
        .and_then(|idx| value.children().get(idx))
        .ok_or_else(|| KuzuError::Runtime(format!("Cannot find field {} in {}.", name, value.data_type())))
}

fn property_at(value: &Value, offset: usize, idx: usize) -> Result<(&str, &Value)> {
    let fields = StructType::get_fields(value.data_type());
    let pos = offset + idx;
    match (fields.get(pos), value.children().get(pos)) {
        (Some(field), Some(child)) => Ok((field.name(), child)),
        _ => Err(KuzuError::Runtime(format!(
            "Property index {} is out of range for {}.",
            idx,
            value.data_type()
        ))),
    }
}

fn fmt_properties(out: &mut String, value: &Value, offset: usize) {
    let fields = StructType::get_fields(value.data_type());
    for (field, child) in fields.iter().zip(value.children()).skip(offset) {
        if child.is_null() {
            continue;
        }
        out.push_str(&format!(", {}: {}", field.name(), child));
    }
}

pub struct NodeVal;

impl NodeVal {
    pub fn get_node_id_val(value: &Value) -> Result<&Value> {
        check_type(value, LogicalTypeID::Node)?;
        field(value, internal_keyword::ID)
    }

    pub fn get_label_val(value: &Value) -> Result<&Value> {
        check_type(value, LogicalTypeID::Node)?;
        field(value, internal_keyword::LABEL)
    }

    pub fn get_node_id(value: &Value) -> Result<InternalId> {
        Self::get_node_id_val(value)?.try_get_value()
    }

    pub fn get_label_name(value: &Value) -> Result<String> {
        Self::get_label_val(value)?.try_get_value()
    }

    pub fn get_num_properties(value: &Value) -> Result<usize> {
        check_type(value, LogicalTypeID::Node)?;
        Ok(value.get_children_size().saturating_sub(NODE_PROPERTY_OFFSET))
    }

    pub fn get_property_name(value: &Value, idx: usize) -> Result<&str> {
        check_type(value, LogicalTypeID::Node)?;
        Ok(property_at(value, NODE_PROPERTY_OFFSET, idx)?.0)
    }

    pub fn get_property_value(value: &Value, idx: usize) -> Result<&Value> {
        check_type(value, LogicalTypeID::Node)?;
        Ok(property_at(value, NODE_PROPERTY_OFFSET, idx)?.1)
    }

    /// `{_ID: 0:1, _LABEL: person, name: Alice}`; NULL properties are omitted
    pub fn to_string(value: &Value) -> Result<String> {
        let id = Self::get_node_id_val(value)?;
        let label = Self::get_label_val(value)?;
        let mut out = format!(
            "{{{}: {}, {}: {}",
            internal_keyword::ID,
            id,
            internal_keyword::LABEL,
            label
        );
        fmt_properties(&mut out, value, NODE_PROPERTY_OFFSET);
        out.push('}');
        Ok(out)
    }
}

pub struct RelVal;

impl RelVal {
    pub fn get_src_node_id_val(value: &Value) -> Result<&Value> {
        check_type(value, LogicalTypeID::Rel)?;
        field(value, internal_keyword::SRC)
    }

    pub fn get_dst_node_id_val(value: &Value) -> Result<&Value> {
        check_type(value, LogicalTypeID::Rel)?;
        field(value, internal_keyword::DST)
    }

    pub fn get_id_val(value: &Value) -> Result<&Value> {
        check_type(value, LogicalTypeID::Rel)?;
        field(value, internal_keyword::ID)
    }

    pub fn get_label_val(value: &Value) -> Result<&Value> {
        check_type(value, LogicalTypeID::Rel)?;
        field(value, internal_keyword::LABEL)
    }

    pub fn get_src_node_id(value: &Value) -> Result<InternalId> {
        Self::get_src_node_id_val(value)?.try_get_value()
    }

    pub fn get_dst_node_id(value: &Value) -> Result<InternalId> {
        Self::get_dst_node_id_val(value)?.try_get_value()
    }

    pub fn get_label_name(value: &Value) -> Result<String> {
        Self::get_label_val(value)?.try_get_value()
    }

    pub fn get_num_properties(value: &Value) -> Result<usize> {
        check_type(value, LogicalTypeID::Rel)?;
        Ok(value.get_children_size().saturating_sub(REL_PROPERTY_OFFSET))
    }

    pub fn get_property_name(value: &Value, idx: usize) -> Result<&str> {
        check_type(value, LogicalTypeID::Rel)?;
        Ok(property_at(value, REL_PROPERTY_OFFSET, idx)?.0)
    }

    pub fn get_property_value(value: &Value, idx: usize) -> Result<&Value> {
        check_type(value, LogicalTypeID::Rel)?;
        Ok(property_at(value, REL_PROPERTY_OFFSET, idx)?.1)
    }

    /// `(0:0)-{_LABEL: knows, _ID: 1:0, since: 2020}->(0:1)`
    pub fn to_string(value: &Value) -> Result<String> {
        let src = Self::get_src_node_id_val(value)?;
        let dst = Self::get_dst_node_id_val(value)?;
        let mut out = format!(
            "({})-{{{}: {}, {}: {}",
            src,
            internal_keyword::LABEL,
            Self::get_label_val(value)?,
            internal_keyword::ID,
            Self::get_id_val(value)?
        );
        fmt_properties(&mut out, value, REL_PROPERTY_OFFSET);
        out.push_str(&format!("}}->({})", dst));
        Ok(out)
    }
}

pub struct RecursiveRelVal;

impl RecursiveRelVal {
    /// LIST of the path's nodes
    pub fn get_nodes(value: &Value) -> Result<&Value> {
        check_type(value, LogicalTypeID::RecursiveRel)?;
        field(value, internal_keyword::NODES)
    }

    /// LIST of the path's rels
    pub fn get_rels(value: &Value) -> Result<&Value> {
        check_type(value, LogicalTypeID::RecursiveRel)?;
        field(value, internal_keyword::RELS)
    }

    pub fn to_string(value: &Value) -> Result<String> {
        let join = |list: &Value| {
            list.children()
                .iter()
                .map(|child| child.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        Ok(format!(
            "{{{}: [{}], {}: [{}]}}",
            internal_keyword::NODES,
            join(Self::get_nodes(value)?),
            internal_keyword::RELS,
            join(Self::get_rels(value)?)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::logical_type::{LogicalType, StructField};

    fn person(offset: u64, name: Option<&str>) -> Value {
        let ty = LogicalType::node(vec![StructField::new("name", LogicalType::string())]);
        let name = match name {
            Some(name) => Value::from(name),
            None => Value::create_null_value_of(LogicalType::string()),
        };
        Value::new_nested(
            ty,
            vec![Value::from(InternalId::new(offset, 0)), Value::from("person"), name],
        )
    }

    fn knows(src: u64, dst: u64) -> Value {
        let ty = LogicalType::rel(vec![StructField::new("since", LogicalType::int64())]);
        Value::new_nested(
            ty,
            vec![
                Value::from(InternalId::new(0, 1)),
                Value::from("knows"),
                Value::from(InternalId::new(src, 0)),
                Value::from(InternalId::new(dst, 0)),
                Value::from(2020i64),
            ],
        )
    }

    #[test]
    fn test_node_accessors() {
        let node = person(1, Some("Alice"));
        assert_eq!(NodeVal::get_node_id(&node).unwrap(), InternalId::new(1, 0));
        assert_eq!(NodeVal::get_label_name(&node).unwrap(), "person");
        assert_eq!(NodeVal::get_num_properties(&node).unwrap(), 1);
        assert_eq!(NodeVal::get_property_name(&node, 0).unwrap(), "name");
        assert_eq!(NodeVal::get_property_value(&node, 0).unwrap().get_str(), "Alice");
        assert!(NodeVal::get_property_value(&node, 1).is_err());
        assert_eq!(node.to_string(), "{_ID: 0:1, _LABEL: person, name: Alice}");
        assert_eq!(person(2, None).to_string(), "{_ID: 0:2, _LABEL: person}");
    }

    #[test]
    fn test_rel_accessors() {
        let rel = knows(0, 1);
        assert_eq!(RelVal::get_src_node_id(&rel).unwrap(), InternalId::new(0, 0));
        assert_eq!(RelVal::get_dst_node_id(&rel).unwrap(), InternalId::new(1, 0));
        assert_eq!(RelVal::get_num_properties(&rel).unwrap(), 1);
        assert_eq!(RelVal::get_property_value(&rel, 0).unwrap().get_value::<i64>(), 2020);
        assert_eq!(rel.to_string(), "(0:0)-{_LABEL: knows, _ID: 1:0, since: 2020}->(0:1)");
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let err = NodeVal::get_label_val(&knows(0, 1)).unwrap_err();
        assert_eq!(err.to_string(), "Runtime exception: Expected NODE type, but got REL type");
        assert!(RelVal::get_src_node_id(&Value::from(1i64)).is_err());
    }

    #[test]
    fn test_recursive_rel() {
        let node_type = person(0, None).data_type().clone();
        let rel_type = knows(0, 1).data_type().clone();
        let path = Value::new_nested(
            LogicalType::recursive_rel(node_type.clone(), rel_type.clone()),
            vec![
                Value::list(node_type, vec![person(0, Some("A")), person(1, Some("B"))]),
                Value::list(rel_type, vec![knows(0, 1)]),
            ],
        );
        assert_eq!(RecursiveRelVal::get_nodes(&path).unwrap().get_children_size(), 2);
        assert_eq!(RecursiveRelVal::get_rels(&path).unwrap().get_children_size(), 1);
        assert!(path.to_string().starts_with("{_NODES: [{_ID: 0:0, _LABEL: person, name: A},"));
    }
}
