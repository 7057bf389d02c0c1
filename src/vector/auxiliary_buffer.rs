//! Out-of-slot storage of a value vector
//!
//! STRING vectors keep long payloads in an overflow buffer, STRUCT vectors own
//! one child vector per field, LIST and ARRAY vectors own a single data vector
//! that list entries index into.

use tracing::trace;

use crate::common::constants::{CHUNK_RESIZE_RATIO, DEFAULT_VECTOR_CAPACITY};
use crate::common::memory_manager::{InMemOverflowBuffer, MemoryManager};
use crate::types::entries::ListEntry;
use crate::types::logical_type::{ListType, LogicalType, StructType};
use crate::types::physical_type::PhysicalTypeID;
use crate::vector::data_chunk::DataChunkState;
use crate::vector::value_vector::ValueVector;

#[derive(Debug)]
pub enum AuxiliaryBuffer {
    String(StringAuxiliaryBuffer),
    Struct(StructAuxiliaryBuffer),
    List(ListAuxiliaryBuffer),
}

impl AuxiliaryBuffer {
    /// Buffer matching the physical type, if it needs one
    pub fn new(
        data_type: &LogicalType,
        memory_manager: &MemoryManager,
        capacity: usize,
    ) -> Option<Self> {
        match data_type.physical_type() {
            PhysicalTypeID::String => Some(Self::String(StringAuxiliaryBuffer::new(memory_manager))),
            PhysicalTypeID::Struct => Some(Self::Struct(StructAuxiliaryBuffer::new(
                data_type,
                memory_manager,
                capacity,
            ))),
            PhysicalTypeID::List | PhysicalTypeID::Array => Some(Self::List(
                ListAuxiliaryBuffer::new(ListType::get_child_type(data_type).clone(), memory_manager),
            )),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::String(buffer) => buffer.reset(),
            Self::Struct(buffer) => buffer.reset(),
            Self::List(buffer) => buffer.reset(),
        }
    }
}

#[derive(Debug)]
pub struct StringAuxiliaryBuffer {
    overflow: InMemOverflowBuffer,
}

impl StringAuxiliaryBuffer {
    pub fn new(memory_manager: &MemoryManager) -> Self {
        Self {
            overflow: InMemOverflowBuffer::new(memory_manager.clone()),
        }
    }

    pub fn overflow(&self) -> &InMemOverflowBuffer {
        &self.overflow
    }

    pub fn overflow_mut(&mut self) -> &mut InMemOverflowBuffer {
        &mut self.overflow
    }

    pub fn reset(&mut self) {
        self.overflow.reset_buffer();
    }
}

#[derive(Debug)]
pub struct StructAuxiliaryBuffer {
    children: Vec<ValueVector>,
}

impl StructAuxiliaryBuffer {
    pub fn new(data_type: &LogicalType, memory_manager: &MemoryManager, capacity: usize) -> Self {
        let children = StructType::get_fields(data_type)
            .iter()
            .map(|field| {
                ValueVector::with_capacity(field.data_type().clone(), memory_manager, capacity)
            })
            .collect();
        Self { children }
    }

    pub fn children(&self) -> &[ValueVector] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [ValueVector] {
        &mut self.children
    }

    pub fn reset(&mut self) {
        for child in &mut self.children {
            child.reset_aux_buffer();
        }
    }
}

/// Element storage of a LIST vector
///
/// Entries handed out by [`ListAuxiliaryBuffer::add_list`] stay valid while
/// the data vector grows; growth reallocates the buffer, so callers must not
/// hold raw slices of the data vector across appends.
#[derive(Debug)]
pub struct ListAuxiliaryBuffer {
    data_vector: Box<ValueVector>,
    capacity: u64,
    size: u64,
}

impl ListAuxiliaryBuffer {
    pub fn new(child_type: LogicalType, memory_manager: &MemoryManager) -> Self {
        let mut data_vector = ValueVector::new(child_type, memory_manager);
        data_vector.set_state(DataChunkState::new_shared(DEFAULT_VECTOR_CAPACITY));
        Self {
            capacity: data_vector.capacity() as u64,
            data_vector: Box::new(data_vector),
            size: 0,
        }
    }

    /// Append room for a list of `list_size` elements
    pub fn add_list(&mut self, list_size: u64) -> ListEntry {
        let entry = ListEntry::new(self.size, list_size as u32);
        let new_size = self.size + list_size;
        if new_size > self.capacity {
            let mut capacity = self.capacity.max(1);
            while capacity < new_size {
                capacity *= CHUNK_RESIZE_RATIO as u64;
            }
            self.resize(capacity);
        }
        self.size = new_size;
        entry
    }

    pub fn resize(&mut self, capacity: u64) {
        if capacity <= self.capacity {
            return;
        }
        trace!(from = self.capacity, to = capacity, "grow list data vector");
        self.data_vector.resize(capacity as usize);
        self.data_vector
            .set_state(DataChunkState::new_shared(capacity as usize));
        self.capacity = capacity;
    }

    pub fn data_vector(&self) -> &ValueVector {
        &self.data_vector
    }

    pub fn data_vector_mut(&mut self) -> &mut ValueVector {
        &mut self.data_vector
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Set the number of used elements, growing when needed
    pub fn set_size(&mut self, size: u64) {
        if size > self.capacity {
            self.resize(size);
        }
        self.size = size;
    }

    pub fn reset(&mut self) {
        self.size = 0;
        self.data_vector.reset_aux_buffer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_list_grows_geometrically() {
        let mm = MemoryManager::default();
        let mut buffer = ListAuxiliaryBuffer::new(LogicalType::int64(), &mm);
        let initial = buffer.capacity();
        assert_eq!(buffer.add_list(3), ListEntry::new(0, 3));
        assert_eq!(buffer.add_list(3), ListEntry::new(3, 3));
        assert_eq!(buffer.size(), 6);

        let entry = buffer.add_list(initial);
        assert_eq!(entry.offset, 6);
        assert_eq!(buffer.capacity(), initial * 2);
        assert!(buffer.data_vector().capacity() as u64 >= initial + 6);
        let state = buffer.data_vector().state().read_recursive();
        assert_eq!(state.sel_vector().capacity() as u64, initial * 2);
        assert_eq!(state.get_selected_size() as u64, initial * 2);
        drop(state);

        buffer.reset();
        assert_eq!(buffer.size(), 0);
        assert_eq!(buffer.capacity(), initial * 2);
    }
}
