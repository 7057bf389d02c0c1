//! Row-major encoding of vector slots, used by hash tables and sorting
//!
//! Fixed-width values are stored as their slot bytes. Strings are a 16-byte
//! string cell whose long payload lives in a row overflow buffer. Lists are
//! `{size: u64, handle: u64}` where the handle addresses a null bitmap
//! followed by the element rows. Structs are a null bitmap followed by the
//! field rows. Nulls of the encoded value itself are the caller's business.

use crate::common::error::Result;
use crate::common::memory_manager::InMemOverflowBuffer;
use crate::types::entries::ListEntry;
use crate::types::ku_string::KuString;
use crate::types::logical_type::{ListType, LogicalType, StructType};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::PhysicalValue;
use crate::vector::accessors::{ListVector, StringVector, StructVector};
use crate::vector::value_vector::ValueVector;

/// Byte bitmap marking null children inside a row
pub struct NullBuffer;

impl NullBuffer {
    pub fn num_null_bytes(num_values: usize) -> usize {
        num_values.div_ceil(8)
    }

    pub fn set_null(bytes: &mut [u8], idx: usize) {
        bytes[idx / 8] |= 1 << (idx % 8);
    }

    pub fn is_null(bytes: &[u8], idx: usize) -> bool {
        bytes[idx / 8] & (1 << (idx % 8)) != 0
    }
}

/// Row encoding of a list: element count plus overflow handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowList {
    pub size: u64,
    pub handle: u64,
}

impl RowList {
    pub const SIZE: usize = 16;

    pub fn read_from(bytes: &[u8]) -> Self {
        Self {
            size: u64::read_from(&bytes[..8]),
            handle: u64::read_from(&bytes[8..16]),
        }
    }

    pub fn write_to(&self, bytes: &mut [u8]) {
        self.size.write_to(&mut bytes[..8]);
        self.handle.write_to(&mut bytes[8..16]);
    }
}

/// Number of bytes a value of `data_type` occupies inside a row
pub fn get_row_layout_size(data_type: &LogicalType) -> usize {
    match data_type.physical_type() {
        PhysicalTypeID::String => std::mem::size_of::<KuString>(),
        PhysicalTypeID::List | PhysicalTypeID::Array => RowList::SIZE,
        PhysicalTypeID::Struct => {
            let fields = StructType::get_fields(data_type);
            NullBuffer::num_null_bytes(fields.len())
                + fields
                    .iter()
                    .map(|field| get_row_layout_size(field.data_type()))
                    .sum::<usize>()
        }
        physical_type => physical_type.fixed_type_size(),
    }
}

impl ValueVector {
    /// Encode the non-null value at `pos` into `row`
    pub fn copy_to_row_data(
        &self,
        pos: usize,
        row: &mut [u8],
        row_overflow: &mut InMemOverflowBuffer,
    ) -> Result<()> {
        match self.physical_type() {
            PhysicalTypeID::String => {
                let bytes = StringVector::get_bytes(self, pos);
                let cell = if KuString::is_short_string(bytes.len()) {
                    KuString::new_short(bytes)
                } else {
                    KuString::new_long(bytes, row_overflow.add_bytes(bytes)?)
                };
                cell.write_to(row);
            }
            PhysicalTypeID::List | PhysicalTypeID::Array => {
                let entry = self.get_value::<ListEntry>(pos);
                let data_vector = ListVector::get_data_vector(self);
                let child_size = get_row_layout_size(ListType::get_child_type(self.data_type()));
                let num_elements = entry.size as usize;
                let null_bytes = NullBuffer::num_null_bytes(num_elements);
                let mut elements = vec![0u8; null_bytes + num_elements * child_size];
                for i in 0..num_elements {
                    let element_pos = entry.offset as usize + i;
                    if data_vector.is_null(element_pos) {
                        NullBuffer::set_null(&mut elements, i);
                        continue;
                    }
                    let start = null_bytes + i * child_size;
                    data_vector.copy_to_row_data(
                        element_pos,
                        &mut elements[start..start + child_size],
                        row_overflow,
                    )?;
                }
                let handle = if num_elements == 0 {
                    0
                } else {
                    row_overflow.add_bytes(&elements)?
                };
                RowList {
                    size: num_elements as u64,
                    handle,
                }
                .write_to(row);
            }
            PhysicalTypeID::Struct => {
                let fields = StructVector::get_field_vectors(self);
                let null_bytes = NullBuffer::num_null_bytes(fields.len());
                row[..null_bytes].fill(0);
                let mut offset = null_bytes;
                for (i, field) in fields.iter().enumerate() {
                    let size = get_row_layout_size(field.data_type());
                    if field.is_null(pos) {
                        NullBuffer::set_null(row, i);
                    } else {
                        field.copy_to_row_data(pos, &mut row[offset..offset + size], row_overflow)?;
                    }
                    offset += size;
                }
            }
            _ => {
                let size = self.num_bytes_per_value();
                row[..size].copy_from_slice(self.slot_bytes(pos));
            }
        }
        Ok(())
    }

    /// Decode `row` into position `pos`, which is marked non-null by the caller
    pub fn copy_from_row_data(
        &mut self,
        pos: usize,
        row: &[u8],
        row_overflow: &InMemOverflowBuffer,
    ) -> Result<()> {
        match self.physical_type() {
            PhysicalTypeID::String => {
                let cell = KuString::read_from(row);
                if cell.is_short() {
                    self.set_value(pos, cell);
                } else {
                    let bytes = row_overflow.get(cell.overflow_handle(), cell.len());
                    StringVector::add_string(self, pos, bytes)?;
                }
            }
            PhysicalTypeID::List | PhysicalTypeID::Array => {
                let row_list = RowList::read_from(row);
                let num_elements = row_list.size as usize;
                let child_size = get_row_layout_size(ListType::get_child_type(self.data_type()));
                let null_bytes = NullBuffer::num_null_bytes(num_elements);
                let elements =
                    row_overflow.get(row_list.handle, null_bytes + num_elements * child_size);
                let entry = ListVector::add_list(self, row_list.size);
                self.set_value(pos, entry);
                let data_vector = ListVector::get_data_vector_mut(self);
                for i in 0..num_elements {
                    let element_pos = entry.offset as usize + i;
                    let is_null = NullBuffer::is_null(elements, i);
                    data_vector.set_null(element_pos, is_null);
                    if is_null {
                        continue;
                    }
                    let start = null_bytes + i * child_size;
                    data_vector.copy_from_row_data(
                        element_pos,
                        &elements[start..start + child_size],
                        row_overflow,
                    )?;
                }
            }
            PhysicalTypeID::Struct => {
                let fields = StructVector::get_field_vectors_mut(self);
                let mut offset = NullBuffer::num_null_bytes(fields.len());
                for (i, field) in fields.iter_mut().enumerate() {
                    let size = get_row_layout_size(field.data_type());
                    let is_null = NullBuffer::is_null(row, i);
                    field.set_null(pos, is_null);
                    if !is_null {
                        field.copy_from_row_data(pos, &row[offset..offset + size], row_overflow)?;
                    }
                    offset += size;
                }
            }
            _ => self.copy_slot_bytes_from(pos, row),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::types::logical_type::StructField;
    use crate::types::value::Value;

    #[test]
    fn test_row_layout_sizes() {
        assert_eq!(get_row_layout_size(&LogicalType::int32()), 4);
        assert_eq!(get_row_layout_size(&LogicalType::string()), 16);
        assert_eq!(get_row_layout_size(&LogicalType::list(LogicalType::int64())), 16);
        let st = LogicalType::struct_type(vec![
            StructField::new("a", LogicalType::int64()),
            StructField::new("b", LogicalType::string()),
        ]);
        assert_eq!(get_row_layout_size(&st), 1 + 8 + 16);
    }

    #[test]
    fn test_nested_row_round_trip() {
        let mm = MemoryManager::default();
        let value = Value::struct_value(vec![
            ("id".to_string(), Value::from(9i64)),
            ("name".to_string(), Value::from("a name longer than twelve bytes")),
            ("missing".to_string(), Value::create_null_value_of(LogicalType::int32())),
            (
                "tags".to_string(),
                Value::list(
                    LogicalType::string(),
                    vec![Value::from("t1"), Value::create_null_value(), Value::from("tag number three!")],
                ),
            ),
        ]);
        let mut src = ValueVector::new(value.data_type().clone(), &mm);
        src.copy_from_value(1, &value).unwrap();

        let mut row = vec![0u8; get_row_layout_size(value.data_type())];
        let mut row_overflow = InMemOverflowBuffer::new(mm.clone());
        src.copy_to_row_data(1, &mut row, &mut row_overflow).unwrap();

        let mut dst = ValueVector::new(value.data_type().clone(), &mm);
        dst.copy_from_row_data(7, &row, &row_overflow).unwrap();
        assert_eq!(dst.get_as_value(7), value);
    }

    #[test]
    fn test_empty_list_needs_no_overflow_block() {
        let mm = MemoryManager::default();
        let value = Value::list(LogicalType::int64(), Vec::new());
        let mut src = ValueVector::new(value.data_type().clone(), &mm);
        src.copy_from_value(0, &value).unwrap();

        let mut row = vec![0u8; get_row_layout_size(value.data_type())];
        let mut row_overflow = InMemOverflowBuffer::new(mm.clone());
        let used_before = mm.used_memory();
        src.copy_to_row_data(0, &mut row, &mut row_overflow).unwrap();
        assert_eq!(row_overflow.num_blocks(), 0);
        assert_eq!(mm.used_memory(), used_before);

        let mut dst = ValueVector::new(value.data_type().clone(), &mm);
        dst.copy_from_row_data(3, &row, &row_overflow).unwrap();
        assert_eq!(dst.get_as_value(3), value);
    }
}
