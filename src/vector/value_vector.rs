//! Columnar container of one logical type
//!
//! A vector owns a fixed-width slot per position, a null mask and, for
//! variable-size or nested types, an [`AuxiliaryBuffer`]. Which positions are
//! live is decided by the shared [`DataChunkState`](super::DataChunkState).

use crate::common::constants::DEFAULT_VECTOR_CAPACITY;
use crate::common::error::{KuzuError, Result};
use crate::common::memory_manager::MemoryManager;
use crate::types::entries::ListEntry;
use crate::types::logical_type::{LogicalType, LogicalTypeID, StructType};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::{PhysicalValue, ScalarValue};
use crate::types::type_utils::{TypeUtils, TypeVisitor};
use crate::types::value::{Val, Value};
use crate::vector::accessors::{ListVector, StringVector, StructVector, UnionVector};
use crate::vector::auxiliary_buffer::AuxiliaryBuffer;
use crate::vector::data_chunk::SharedChunkState;
use crate::vector::null_mask::NullMask;

#[derive(Debug)]
pub struct ValueVector {
    data_type: LogicalType,
    num_bytes_per_value: usize,
    capacity: usize,
    buffer: Vec<u8>,
    null_mask: NullMask,
    state: Option<SharedChunkState>,
    aux_buffer: Option<AuxiliaryBuffer>,
}

impl ValueVector {
    pub fn new(data_type: LogicalType, memory_manager: &MemoryManager) -> Self {
        Self::with_capacity(data_type, memory_manager, DEFAULT_VECTOR_CAPACITY)
    }

    pub fn with_capacity(
        data_type: LogicalType,
        memory_manager: &MemoryManager,
        capacity: usize,
    ) -> Self {
        let num_bytes_per_value = data_type.physical_type().fixed_type_size();
        let aux_buffer = AuxiliaryBuffer::new(&data_type, memory_manager, capacity);
        Self {
            data_type,
            num_bytes_per_value,
            capacity,
            buffer: vec![0; capacity * num_bytes_per_value],
            null_mask: NullMask::new(capacity),
            state: None,
            aux_buffer,
        }
    }

    /// Vector already attached to `state`
    pub fn with_state(
        data_type: LogicalType,
        memory_manager: &MemoryManager,
        state: SharedChunkState,
    ) -> Self {
        let mut vector = Self::new(data_type, memory_manager);
        vector.set_state(state);
        vector
    }

    pub fn data_type(&self) -> &LogicalType {
        &self.data_type
    }

    pub fn physical_type(&self) -> PhysicalTypeID {
        self.data_type.physical_type()
    }

    pub fn num_bytes_per_value(&self) -> usize {
        self.num_bytes_per_value
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Attach to a chunk state; struct fields follow their parent
    pub fn set_state(&mut self, state: SharedChunkState) {
        if let Some(AuxiliaryBuffer::Struct(buffer)) = &mut self.aux_buffer {
            for child in buffer.children_mut() {
                child.set_state(state.clone());
            }
        }
        self.state = Some(state);
    }

    pub fn state(&self) -> &SharedChunkState {
        match &self.state {
            Some(state) => state,
            None => crate::ku_unreachable!("vector of type {} has no chunk state", self.data_type),
        }
    }

    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_flat(&self) -> bool {
        self.state().read_recursive().is_flat()
    }

    pub(crate) fn aux_buffer(&self) -> Option<&AuxiliaryBuffer> {
        self.aux_buffer.as_ref()
    }

    pub(crate) fn aux_buffer_mut(&mut self) -> Option<&mut AuxiliaryBuffer> {
        self.aux_buffer.as_mut()
    }

    pub fn reset_aux_buffer(&mut self) {
        if let Some(buffer) = &mut self.aux_buffer {
            buffer.reset();
        }
    }

    /// Grow every slot array, including struct fields, to `capacity`
    pub fn resize(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        self.buffer.resize(capacity * self.num_bytes_per_value, 0);
        self.null_mask.resize(capacity);
        self.capacity = capacity;
        if let Some(AuxiliaryBuffer::Struct(buffer)) = &mut self.aux_buffer {
            for child in buffer.children_mut() {
                child.resize(capacity);
            }
        }
    }

    pub fn null_mask(&self) -> &NullMask {
        &self.null_mask
    }

    pub fn null_mask_mut(&mut self) -> &mut NullMask {
        &mut self.null_mask
    }

    #[inline]
    pub fn is_null(&self, pos: usize) -> bool {
        self.null_mask.is_null(pos)
    }

    #[inline]
    pub fn set_null(&mut self, pos: usize, is_null: bool) {
        self.null_mask.set_null(pos, is_null);
    }

    pub fn set_null_range(&mut self, offset: usize, num_values: usize, is_null: bool) {
        self.null_mask.set_null_range(offset, num_values, is_null);
    }

    pub fn set_all_null(&mut self) {
        self.null_mask.set_all_null();
    }

    pub fn set_all_non_null(&mut self) {
        self.null_mask.set_all_non_null();
    }

    #[inline]
    pub fn has_no_nulls_guarantee(&self) -> bool {
        self.null_mask.has_no_nulls_guarantee()
    }

    pub fn set_may_contain_nulls(&mut self) {
        self.null_mask.set_may_contain_nulls();
    }

    /// Slot bytes of every position
    pub fn get_data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn get_data_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    #[inline]
    fn slot(&self, pos: usize) -> &[u8] {
        let start = pos * self.num_bytes_per_value;
        &self.buffer[start..start + self.num_bytes_per_value]
    }

    #[inline]
    fn slot_mut(&mut self, pos: usize) -> &mut [u8] {
        let start = pos * self.num_bytes_per_value;
        &mut self.buffer[start..start + self.num_bytes_per_value]
    }

    #[inline]
    fn accepts<T: PhysicalValue>(&self) -> bool {
        let physical_type = self.physical_type();
        T::PHYSICAL_TYPE == physical_type
            || (T::PHYSICAL_TYPE == PhysicalTypeID::List && physical_type == PhysicalTypeID::Array)
    }

    /// Read the slot at `pos` as `T`, which must match the physical type
    #[inline]
    pub fn get_value<T: PhysicalValue>(&self, pos: usize) -> T {
        crate::ku_assert!(
            self.accepts::<T>(),
            "reading {} slot of a {} vector",
            T::PHYSICAL_TYPE,
            self.physical_type()
        );
        T::read_from(self.slot(pos))
    }

    #[inline]
    pub fn set_value<T: PhysicalValue>(&mut self, pos: usize, value: T) {
        crate::ku_assert!(
            self.accepts::<T>(),
            "writing {} slot of a {} vector",
            T::PHYSICAL_TYPE,
            self.physical_type()
        );
        value.write_to(self.slot_mut(pos));
    }

    pub(crate) fn copy_slot_bytes_from(&mut self, pos: usize, bytes: &[u8]) {
        let num_bytes = self.num_bytes_per_value;
        self.slot_mut(pos).copy_from_slice(&bytes[..num_bytes]);
    }

    pub(crate) fn slot_bytes(&self, pos: usize) -> &[u8] {
        self.slot(pos)
    }

    /// Copy position `src_pos` of `src`, null flag and nested payload included
    pub fn copy_from_vector_data(
        &mut self,
        dst_pos: usize,
        src: &ValueVector,
        src_pos: usize,
    ) -> Result<()> {
        crate::ku_assert!(self.physical_type() == src.physical_type());
        self.set_null(dst_pos, src.is_null(src_pos));
        if src.is_null(src_pos) {
            return Ok(());
        }
        match self.physical_type() {
            PhysicalTypeID::String => {
                StringVector::add_string(self, dst_pos, StringVector::get_bytes(src, src_pos))
            }
            PhysicalTypeID::List | PhysicalTypeID::Array => {
                let src_entry = src.get_value::<ListEntry>(src_pos);
                let dst_entry = ListVector::add_list(self, src_entry.size as u64);
                self.set_value(dst_pos, dst_entry);
                let src_data = ListVector::get_data_vector(src);
                let dst_data = ListVector::get_data_vector_mut(self);
                for i in 0..src_entry.size as usize {
                    dst_data.copy_from_vector_data(
                        dst_entry.offset as usize + i,
                        src_data,
                        src_entry.offset as usize + i,
                    )?;
                }
                Ok(())
            }
            PhysicalTypeID::Struct => {
                let src_fields = StructVector::get_field_vectors(src);
                let dst_fields = StructVector::get_field_vectors_mut(self);
                for (dst_field, src_field) in dst_fields.iter_mut().zip(src_fields) {
                    dst_field.copy_from_vector_data(dst_pos, src_field, src_pos)?;
                }
                Ok(())
            }
            _ => {
                self.copy_slot_bytes_from(dst_pos, src.slot(src_pos));
                Ok(())
            }
        }
    }

    /// Store `value` at `pos`, recursing into nested payloads
    pub fn copy_from_value(&mut self, pos: usize, value: &Value) -> Result<()> {
        self.set_null(pos, value.is_null());
        if value.is_null() {
            return Ok(());
        }
        if value.data_type().physical_type() != self.physical_type() {
            return Err(KuzuError::Conversion(format!(
                "Cannot copy a {} value into a {} vector.",
                value.data_type(),
                self.data_type
            )));
        }
        let data_type = self.data_type.clone();
        TypeUtils::visit(
            &data_type,
            SlotWriter {
                vector: self,
                pos,
                value,
            },
        )
    }

    /// Materialise position `pos` as a [`Value`]
    pub fn get_as_value(&self, pos: usize) -> Value {
        if self.is_null(pos) {
            return Value::create_null_value_of(self.data_type.clone());
        }
        TypeUtils::visit(&self.data_type, SlotReader { vector: self, pos })
    }
}

struct SlotReader<'a> {
    vector: &'a ValueVector,
    pos: usize,
}

impl TypeVisitor for SlotReader<'_> {
    type Output = Value;

    fn visit_scalar<T: ScalarValue>(self, data_type: &LogicalType) -> Value {
        let value = self.vector.get_value::<T>(self.pos);
        Value::from_parts(data_type.clone(), value.into_val(), Vec::new())
    }

    fn visit_string(self, data_type: &LogicalType) -> Value {
        let bytes = StringVector::get_bytes(self.vector, self.pos);
        let val = if data_type.type_id() == LogicalTypeID::Blob {
            Val::Blob(bytes.to_vec())
        } else {
            Val::Str(String::from_utf8_lossy(bytes).into_owned())
        };
        Value::from_parts(data_type.clone(), val, Vec::new())
    }

    fn visit_list(self, data_type: &LogicalType) -> Value {
        let entry = self.vector.get_value::<ListEntry>(self.pos);
        let data_vector = ListVector::get_data_vector(self.vector);
        let children = (0..entry.size as usize)
            .map(|i| data_vector.get_as_value(entry.offset as usize + i))
            .collect();
        Value::from_parts(data_type.clone(), Val::Nested, children)
    }

    fn visit_struct(self, data_type: &LogicalType) -> Value {
        if data_type.type_id() == LogicalTypeID::Union {
            let tag = UnionVector::get_tag(self.vector, self.pos);
            let member = UnionVector::get_val_vector(self.vector, tag).get_as_value(self.pos);
            return Value::from_parts(data_type.clone(), Val::Union { tag }, vec![member]);
        }
        let children = StructVector::get_field_vectors(self.vector)
            .iter()
            .map(|field| field.get_as_value(self.pos))
            .collect();
        Value::from_parts(data_type.clone(), Val::Nested, children)
    }
}

struct SlotWriter<'a> {
    vector: &'a mut ValueVector,
    pos: usize,
    value: &'a Value,
}

impl SlotWriter<'_> {
    fn mismatch(&self) -> KuzuError {
        KuzuError::Conversion(format!(
            "Cannot copy a {} value into a {} vector.",
            self.value.data_type(),
            self.vector.data_type
        ))
    }
}

impl TypeVisitor for SlotWriter<'_> {
    type Output = Result<()>;

    fn visit_scalar<T: ScalarValue>(self, _: &LogicalType) -> Result<()> {
        let value = T::from_val(self.value.val()).ok_or_else(|| self.mismatch())?;
        self.vector.set_value(self.pos, value);
        Ok(())
    }

    fn visit_string(self, _: &LogicalType) -> Result<()> {
        let bytes = match self.value.val() {
            Val::Str(s) => s.as_bytes(),
            Val::Blob(b) => b.as_slice(),
            _ => return Err(self.mismatch()),
        };
        StringVector::add_string(self.vector, self.pos, bytes)
    }

    fn visit_list(self, _: &LogicalType) -> Result<()> {
        let children = self.value.children();
        let entry = ListVector::add_list(self.vector, children.len() as u64);
        self.vector.set_value(self.pos, entry);
        let data_vector = ListVector::get_data_vector_mut(self.vector);
        for (i, child) in children.iter().enumerate() {
            data_vector.copy_from_value(entry.offset as usize + i, child)?;
        }
        Ok(())
    }

    fn visit_struct(self, data_type: &LogicalType) -> Result<()> {
        if data_type.type_id() == LogicalTypeID::Union {
            let &Val::Union { tag } = self.value.val() else {
                return Err(self.mismatch());
            };
            UnionVector::set_tag(self.vector, self.pos, tag);
            let num_members = StructType::get_num_fields(data_type) - 1;
            for member in 0..num_members as i8 {
                if member != tag {
                    UnionVector::get_val_vector_mut(self.vector, member).set_null(self.pos, true);
                }
            }
            return UnionVector::get_val_vector_mut(self.vector, tag)
                .copy_from_value(self.pos, self.value.get_child(0));
        }
        let fields = StructVector::get_field_vectors_mut(self.vector);
        if fields.len() != self.value.get_children_size() {
            return Err(KuzuError::Conversion(format!(
                "Cannot copy a {} value into a {} vector.",
                self.value.data_type(),
                data_type
            )));
        }
        for (field, child) in fields.iter_mut().zip(self.value.children()) {
            field.copy_from_value(self.pos, child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::logical_type::StructField;
    use crate::types::temporal::Date;
    use crate::vector::data_chunk::DataChunkState;

    fn vector(data_type: LogicalType) -> ValueVector {
        let mm = MemoryManager::default();
        ValueVector::with_state(data_type, &mm, DataChunkState::new_shared(DEFAULT_VECTOR_CAPACITY))
    }

    #[test]
    fn test_fixed_width_slots() {
        let mut v = vector(LogicalType::int32());
        assert_eq!(v.num_bytes_per_value(), 4);
        v.set_value(3, 42i32);
        assert_eq!(v.get_value::<i32>(3), 42);
        v.set_null(3, true);
        assert!(v.is_null(3));
        assert!(v.get_as_value(3).is_null());
    }

    #[test]
    fn test_value_round_trip_through_slots() {
        let values = vec![
            Value::from(Date::new(10)),
            Value::from("short"),
            Value::from("a string well beyond the inline limit"),
            Value::decimal(12345, 10, 2).unwrap(),
            Value::list(
                LogicalType::string(),
                vec![Value::from("x"), Value::create_null_value(), Value::from("yyyyyyyyyyyyyyyyy")],
            ),
            Value::struct_value(vec![
                ("a".to_string(), Value::from(1i64)),
                ("b".to_string(), Value::list(LogicalType::int16(), vec![Value::from(7i16)])),
            ]),
            Value::map(
                LogicalType::string(),
                LogicalType::int64(),
                vec![(Value::from("k"), Value::from(1i64))],
            ),
            Value::union_value(
                LogicalType::union_type(vec![
                    StructField::new("i", LogicalType::int64()),
                    StructField::new("s", LogicalType::string()),
                ]),
                1,
                Value::from("member"),
            ),
        ];
        for value in values {
            let mut v = vector(value.data_type().clone());
            v.copy_from_value(5, &value).unwrap();
            assert_eq!(v.get_as_value(5), value);
        }
    }

    #[test]
    fn test_copy_from_value_rejects_other_types() {
        let mut v = vector(LogicalType::int64());
        assert!(v.copy_from_value(0, &Value::from("x")).is_err());
    }

    #[test]
    fn test_copy_from_vector_data() {
        let list_type = LogicalType::list(LogicalType::string());
        let mut src = vector(list_type.clone());
        let value = Value::list(
            LogicalType::string(),
            vec![Value::from("first"), Value::from("a long second element string")],
        );
        src.copy_from_value(2, &value).unwrap();
        src.set_null(3, true);

        let mut dst = vector(list_type);
        dst.copy_from_vector_data(0, &src, 2).unwrap();
        dst.copy_from_vector_data(1, &src, 3).unwrap();
        assert_eq!(dst.get_as_value(0), value);
        assert!(dst.is_null(1));
    }

    #[test]
    fn test_struct_fields_share_parent_state() {
        let v = vector(LogicalType::struct_type(vec![StructField::new(
            "a",
            LogicalType::int64(),
        )]));
        let field = StructVector::get_field_vector(&v, 0);
        assert!(std::sync::Arc::ptr_eq(field.state(), v.state()));
    }
}
