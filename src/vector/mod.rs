//! Columnar execution data
//!
//! - [`NullMask`]: null bitmap with a "no nulls" hint
//! - [`SelectionVector`]: which positions of a vector are live
//! - [`ValueVector`]: typed slots plus auxiliary storage
//! - [`DataChunk`]: vectors sharing one [`DataChunkState`]

pub mod accessors;
pub mod auxiliary_buffer;
pub mod data_chunk;
pub mod null_mask;
pub mod row_layout;
pub mod selection_vector;
pub mod value_vector;

pub use accessors::{ListVector, MapVector, StringVector, StructVector, UnionVector};
pub use auxiliary_buffer::AuxiliaryBuffer;
pub use data_chunk::{DataChunk, DataChunkState, FStateType, SharedChunkState};
pub use null_mask::NullMask;
pub use row_layout::{get_row_layout_size, NullBuffer, RowList};
pub use selection_vector::{SelectionState, SelectionVector, SelectionView};
pub use value_vector::ValueVector;
