//! Fixed-size handles stored in nested and id vectors

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::{KuzuError, Result};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::{PhysicalValue, ScalarValue};
use crate::types::value::Val;

/// A list value: `size` consecutive elements from `offset` in the child data vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListEntry {
    pub offset: u64,
    pub size: u32,
}

impl ListEntry {
    pub fn new(offset: u64, size: u32) -> Self {
        Self { offset, size }
    }
}

impl PhysicalValue for ListEntry {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::List;

    fn read_from(bytes: &[u8]) -> Self {
        Self {
            offset: u64::read_from(&bytes[..8]),
            size: u32::read_from(&bytes[8..12]),
        }
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.offset.write_to(&mut bytes[..8]);
        self.size.write_to(&mut bytes[8..12]);
        bytes[12..16].fill(0);
    }
}

/// Position of a struct value inside its field vectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructEntry {
    pub pos: u64,
}

impl PhysicalValue for StructEntry {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::Struct;

    fn read_from(bytes: &[u8]) -> Self {
        Self {
            pos: u64::read_from(bytes),
        }
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.pos.write_to(bytes);
    }
}

/// A map is a list of key/value structs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapEntry {
    pub entry: ListEntry,
}

/// A union is a struct whose first field is the tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnionEntry {
    pub entry: StructEntry,
}

/// Node or relationship identifier: an offset within a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InternalId {
    pub table_id: u64,
    pub offset: u64,
}

impl InternalId {
    pub fn new(offset: u64, table_id: u64) -> Self {
        Self { table_id, offset }
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.offset)
    }
}

impl FromStr for InternalId {
    type Err = KuzuError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || KuzuError::Conversion(format!("Cannot parse {} as INTERNAL_ID.", s));
        let (table_id, offset) = s.trim().split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            table_id: table_id.parse().map_err(|_| invalid())?,
            offset: offset.parse().map_err(|_| invalid())?,
        })
    }
}

impl PhysicalValue for InternalId {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::InternalId;

    fn read_from(bytes: &[u8]) -> Self {
        Self {
            offset: u64::read_from(&bytes[..8]),
            table_id: u64::read_from(&bytes[8..16]),
        }
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.offset.write_to(&mut bytes[..8]);
        self.table_id.write_to(&mut bytes[8..16]);
    }
}

impl ScalarValue for InternalId {
    fn into_val(self) -> Val {
        Val::InternalId(self)
    }

    fn from_val(val: &Val) -> Option<Self> {
        match val {
            Val::InternalId(v) => Some(*v),
            _ => None,
        }
    }
}

/// Opaque address-sized value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pointer(pub u64);

impl PhysicalValue for Pointer {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::Pointer;

    fn read_from(bytes: &[u8]) -> Self {
        Pointer(u64::read_from(bytes))
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.0.write_to(bytes);
    }
}

impl ScalarValue for Pointer {
    fn into_val(self) -> Val {
        Val::Pointer(self.0)
    }

    fn from_val(val: &Val) -> Option<Self> {
        match val {
            Val::Pointer(v) => Some(Pointer(*v)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_entry_slot_is_padded() {
        let mut slot = [0xffu8; 16];
        ListEntry::new(3, 3).write_to(&mut slot);
        assert_eq!(&slot[12..], &[0, 0, 0, 0]);
        assert_eq!(ListEntry::read_from(&slot), ListEntry::new(3, 3));
    }

    #[test]
    fn test_internal_id_text_form() {
        let id = InternalId::new(42, 1);
        assert_eq!(id.to_string(), "1:42");
        assert_eq!("1:42".parse::<InternalId>().unwrap(), id);
        assert!("142".parse::<InternalId>().is_err());
    }

    #[test]
    fn test_internal_id_orders_by_table_then_offset() {
        assert!(InternalId::new(9, 0) < InternalId::new(0, 1));
        assert!(InternalId::new(1, 1) < InternalId::new(2, 1));
    }
}
