use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::constants::DEFAULT_VECTOR_CAPACITY;
use crate::vector::selection_vector::SelectionVector;
use crate::vector::value_vector::ValueVector;

/// Whether a chunk currently exposes one row (flat) or its whole selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FStateType {
    Flat,
    Unflat,
}

/// Selection and flatness shared by all vectors of one chunk
#[derive(Debug, Clone)]
pub struct DataChunkState {
    sel_vector: SelectionVector,
    f_state_type: FStateType,
}

/// State handle shared between sibling vectors
///
/// Vectors that are unflat together must hold the same handle, so identity
/// is checked with [`Arc::ptr_eq`].
pub type SharedChunkState = Arc<RwLock<DataChunkState>>;

impl DataChunkState {
    pub fn new(capacity: usize) -> Self {
        Self {
            sel_vector: SelectionVector::new(capacity),
            f_state_type: FStateType::Unflat,
        }
    }

    /// Flat state selecting position 0 only
    pub fn single_value() -> Self {
        let mut state = Self::new(1);
        state.sel_vector.set_to_unfiltered_with(1);
        state.f_state_type = FStateType::Flat;
        state
    }

    pub fn new_shared(capacity: usize) -> SharedChunkState {
        Arc::new(RwLock::new(Self::new(capacity)))
    }

    pub fn single_value_shared() -> SharedChunkState {
        Arc::new(RwLock::new(Self::single_value()))
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.f_state_type == FStateType::Flat
    }

    pub fn f_state_type(&self) -> FStateType {
        self.f_state_type
    }

    pub fn set_to_flat(&mut self) {
        self.f_state_type = FStateType::Flat;
    }

    pub fn set_to_unflat(&mut self) {
        self.f_state_type = FStateType::Unflat;
    }

    #[inline]
    pub fn sel_vector(&self) -> &SelectionVector {
        &self.sel_vector
    }

    pub fn sel_vector_mut(&mut self) -> &mut SelectionVector {
        &mut self.sel_vector
    }

    pub fn get_selected_size(&self) -> usize {
        self.sel_vector.get_selected_size()
    }

    /// Select the first `size` positions
    pub fn init_original_and_selected_size(&mut self, size: usize) {
        self.sel_vector.set_to_unfiltered_with(size);
    }
}

impl Default for DataChunkState {
    fn default() -> Self {
        Self::new(DEFAULT_VECTOR_CAPACITY)
    }
}

/// Vectors that advance in lock-step through one shared state
#[derive(Debug)]
pub struct DataChunk {
    state: SharedChunkState,
    vectors: Vec<ValueVector>,
}

impl DataChunk {
    pub fn new(state: SharedChunkState) -> Self {
        Self {
            state,
            vectors: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(DataChunkState::new_shared(capacity))
    }

    /// Attach a vector to this chunk's state
    pub fn insert(&mut self, mut vector: ValueVector) -> usize {
        vector.set_state(self.state.clone());
        self.vectors.push(vector);
        self.vectors.len() - 1
    }

    pub fn state(&self) -> &SharedChunkState {
        &self.state
    }

    pub fn get_num_value_vectors(&self) -> usize {
        self.vectors.len()
    }

    pub fn get_value_vector(&self, idx: usize) -> &ValueVector {
        &self.vectors[idx]
    }

    pub fn get_value_vector_mut(&mut self, idx: usize) -> &mut ValueVector {
        &mut self.vectors[idx]
    }

    pub fn vectors(&self) -> &[ValueVector] {
        &self.vectors
    }

    pub fn get_selected_size(&self) -> usize {
        self.state.read().get_selected_size()
    }

    /// Select the first `size` rows and drop payloads of previous batches
    pub fn reset(&mut self, size: usize) {
        self.state.write().init_original_and_selected_size(size);
        for vector in &mut self.vectors {
            vector.reset_aux_buffer();
            vector.set_all_non_null();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::types::LogicalType;

    #[test]
    fn test_vectors_share_state() {
        let mm = MemoryManager::default();
        let mut chunk = DataChunk::with_capacity(DEFAULT_VECTOR_CAPACITY);
        let a = chunk.insert(ValueVector::new(LogicalType::int64(), &mm));
        let b = chunk.insert(ValueVector::new(LogicalType::string(), &mm));
        assert!(Arc::ptr_eq(
            chunk.get_value_vector(a).state(),
            chunk.get_value_vector(b).state()
        ));

        chunk.reset(3);
        assert_eq!(chunk.get_selected_size(), 3);
        chunk.state().write().set_to_flat();
        assert!(chunk.get_value_vector(b).is_flat());
    }

    #[test]
    fn test_single_value_state() {
        let state = DataChunkState::single_value();
        assert!(state.is_flat());
        assert_eq!(state.get_selected_size(), 1);
        assert_eq!(state.sel_vector().get(0), 0);
    }
}
