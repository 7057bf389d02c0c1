//! Typed views over the auxiliary buffers of STRING, LIST, STRUCT, UNION and MAP vectors

use crate::common::error::Result;
use crate::common::memory_manager::InMemOverflowBuffer;
use crate::types::entries::ListEntry;
use crate::types::ku_string::KuString;
use crate::types::logical_type::UnionType;
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::PhysicalValue;
use crate::vector::auxiliary_buffer::{AuxiliaryBuffer, ListAuxiliaryBuffer};
use crate::vector::value_vector::ValueVector;

const STRING_LEN_BYTES: usize = 4;

pub struct StringVector;

impl StringVector {
    pub fn get_overflow_buffer(vector: &ValueVector) -> &InMemOverflowBuffer {
        match vector.aux_buffer() {
            Some(AuxiliaryBuffer::String(buffer)) => buffer.overflow(),
            _ => crate::ku_unreachable!("{} vector has no string buffer", vector.data_type()),
        }
    }

    pub fn get_overflow_buffer_mut(vector: &mut ValueVector) -> &mut InMemOverflowBuffer {
        if !matches!(vector.aux_buffer(), Some(AuxiliaryBuffer::String(_))) {
            crate::ku_unreachable!("{} vector has no string buffer", vector.data_type());
        }
        match vector.aux_buffer_mut() {
            Some(AuxiliaryBuffer::String(buffer)) => buffer.overflow_mut(),
            _ => crate::ku_unreachable!(),
        }
    }

    /// Payload of the string at `pos`
    pub fn get_bytes(vector: &ValueVector, pos: usize) -> &[u8] {
        let slot = vector.slot_bytes(pos);
        let cell = KuString::read_from(slot);
        if cell.is_short() {
            &slot[STRING_LEN_BYTES..STRING_LEN_BYTES + cell.len()]
        } else {
            Self::get_overflow_buffer(vector).get(cell.overflow_handle(), cell.len())
        }
    }

    /// String at `pos`, with invalid UTF-8 replaced
    pub fn get_string(vector: &ValueVector, pos: usize) -> String {
        String::from_utf8_lossy(Self::get_bytes(vector, pos)).into_owned()
    }

    /// Store `bytes` at `pos`; only long strings allocate overflow space
    pub fn add_string(vector: &mut ValueVector, pos: usize, bytes: &[u8]) -> Result<()> {
        let cell = if KuString::is_short_string(bytes.len()) {
            KuString::new_short(bytes)
        } else {
            let handle = Self::get_overflow_buffer_mut(vector).add_bytes(bytes)?;
            KuString::new_long(bytes, handle)
        };
        vector.set_value(pos, cell);
        Ok(())
    }

    /// Reserve `len` bytes at `pos` and let `fill` write the payload
    pub fn reserve_string<F: FnOnce(&mut [u8])>(
        vector: &mut ValueVector,
        pos: usize,
        len: usize,
        fill: F,
    ) -> Result<()> {
        if KuString::is_short_string(len) {
            let mut inline = [0u8; crate::common::constants::SHORT_STR_LENGTH];
            fill(&mut inline[..len]);
            vector.set_value(pos, KuString::new_short(&inline[..len]));
            return Ok(());
        }
        let overflow = Self::get_overflow_buffer_mut(vector);
        let handle = overflow.allocate_space(len)?;
        let payload = overflow.get_mut(handle, len);
        fill(payload);
        let cell = KuString::new_long(payload, handle);
        vector.set_value(pos, cell);
        Ok(())
    }
}

pub struct ListVector;

impl ListVector {
    fn aux(vector: &ValueVector) -> &ListAuxiliaryBuffer {
        match vector.aux_buffer() {
            Some(AuxiliaryBuffer::List(buffer)) => buffer,
            _ => crate::ku_unreachable!("{} vector has no list buffer", vector.data_type()),
        }
    }

    fn aux_mut(vector: &mut ValueVector) -> &mut ListAuxiliaryBuffer {
        if !matches!(vector.aux_buffer(), Some(AuxiliaryBuffer::List(_))) {
            crate::ku_unreachable!("{} vector has no list buffer", vector.data_type());
        }
        match vector.aux_buffer_mut() {
            Some(AuxiliaryBuffer::List(buffer)) => buffer,
            _ => crate::ku_unreachable!(),
        }
    }

    pub fn get_data_vector(vector: &ValueVector) -> &ValueVector {
        Self::aux(vector).data_vector()
    }

    pub fn get_data_vector_mut(vector: &mut ValueVector) -> &mut ValueVector {
        Self::aux_mut(vector).data_vector_mut()
    }

    pub fn get_data_vector_size(vector: &ValueVector) -> u64 {
        Self::aux(vector).size()
    }

    /// Append a list of `size` elements and return its entry
    pub fn add_list(vector: &mut ValueVector, size: u64) -> ListEntry {
        Self::aux_mut(vector).add_list(size)
    }

    pub fn resize_data_vector(vector: &mut ValueVector, size: u64) {
        Self::aux_mut(vector).set_size(size);
    }

    pub fn get_list_entry(vector: &ValueVector, pos: usize) -> ListEntry {
        vector.get_value::<ListEntry>(pos)
    }

    /// Position in the data vector of element `idx` of `entry`
    pub fn get_list_values_pos(entry: ListEntry, idx: usize) -> usize {
        crate::ku_assert!(idx < entry.size as usize);
        entry.offset as usize + idx
    }
}

pub struct StructVector;

impl StructVector {
    pub fn get_field_vectors(vector: &ValueVector) -> &[ValueVector] {
        match vector.aux_buffer() {
            Some(AuxiliaryBuffer::Struct(buffer)) => buffer.children(),
            _ => crate::ku_unreachable!("{} vector has no field vectors", vector.data_type()),
        }
    }

    pub fn get_field_vectors_mut(vector: &mut ValueVector) -> &mut [ValueVector] {
        if !matches!(vector.aux_buffer(), Some(AuxiliaryBuffer::Struct(_))) {
            crate::ku_unreachable!("{} vector has no field vectors", vector.data_type());
        }
        match vector.aux_buffer_mut() {
            Some(AuxiliaryBuffer::Struct(buffer)) => buffer.children_mut(),
            _ => crate::ku_unreachable!(),
        }
    }

    pub fn get_field_vector(vector: &ValueVector, idx: usize) -> &ValueVector {
        &Self::get_field_vectors(vector)[idx]
    }

    pub fn get_field_vector_mut(vector: &mut ValueVector, idx: usize) -> &mut ValueVector {
        &mut Self::get_field_vectors_mut(vector)[idx]
    }
}

/// A union vector is a struct vector whose field 0 holds INT8 tags
pub struct UnionVector;

impl UnionVector {
    pub fn get_tag_vector(vector: &ValueVector) -> &ValueVector {
        StructVector::get_field_vector(vector, UnionType::TAG_FIELD_IDX)
    }

    pub fn get_val_vector(vector: &ValueVector, tag: i8) -> &ValueVector {
        StructVector::get_field_vector(vector, UnionType::get_internal_field_idx(tag as usize))
    }

    pub fn get_val_vector_mut(vector: &mut ValueVector, tag: i8) -> &mut ValueVector {
        StructVector::get_field_vector_mut(vector, UnionType::get_internal_field_idx(tag as usize))
    }

    pub fn get_tag(vector: &ValueVector, pos: usize) -> i8 {
        Self::get_tag_vector(vector).get_value::<i8>(pos)
    }

    pub fn set_tag(vector: &mut ValueVector, pos: usize, tag: i8) {
        let tag_vector = StructVector::get_field_vector_mut(vector, UnionType::TAG_FIELD_IDX);
        tag_vector.set_null(pos, false);
        tag_vector.set_value(pos, tag);
    }
}

/// A map vector is a list vector over `STRUCT(KEY, VALUE)`
pub struct MapVector;

impl MapVector {
    pub fn get_key_vector(vector: &ValueVector) -> &ValueVector {
        StructVector::get_field_vector(ListVector::get_data_vector(vector), 0)
    }

    pub fn get_value_vector(vector: &ValueVector) -> &ValueVector {
        StructVector::get_field_vector(ListVector::get_data_vector(vector), 1)
    }

    pub fn get_key_vector_mut(vector: &mut ValueVector) -> &mut ValueVector {
        StructVector::get_field_vector_mut(ListVector::get_data_vector_mut(vector), 0)
    }

    pub fn get_value_vector_mut(vector: &mut ValueVector) -> &mut ValueVector {
        StructVector::get_field_vector_mut(ListVector::get_data_vector_mut(vector), 1)
    }
}

/// Whether the vector stores payloads outside its slots
pub fn has_auxiliary_storage(physical_type: PhysicalTypeID) -> bool {
    matches!(
        physical_type,
        PhysicalTypeID::String | PhysicalTypeID::List | PhysicalTypeID::Array | PhysicalTypeID::Struct
    )
}
