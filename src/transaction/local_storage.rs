//! Rows a write transaction has appended but not yet committed
//!
//! Each touched table gets a [`LocalTable`] holding its new rows in
//! columnar [`DataChunk`]s. On commit every local table is handed to the
//! committer it was registered with; on rollback the rows are dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::common::error::{KuzuError, Result};
use crate::common::memory_manager::MemoryManager;
use crate::types::logical_type::LogicalType;
use crate::types::value::Value;
use crate::vector::data_chunk::DataChunk;
use crate::vector::value_vector::ValueVector;

/// Moves the rows of a local table into persistent storage
pub trait LocalTableCommitter: Send + Sync {
    fn commit_local_table(&self, table: &LocalTable) -> Result<()>;
}

pub struct LocalTable {
    table_id: u64,
    column_types: Vec<LogicalType>,
    chunk_capacity: usize,
    chunks: Vec<DataChunk>,
    num_rows: usize,
    memory_manager: MemoryManager,
    committer: Arc<dyn LocalTableCommitter>,
}

impl LocalTable {
    fn new(
        table_id: u64,
        column_types: Vec<LogicalType>,
        chunk_capacity: usize,
        memory_manager: MemoryManager,
        committer: Arc<dyn LocalTableCommitter>,
    ) -> Self {
        Self {
            table_id,
            column_types,
            chunk_capacity: chunk_capacity.max(1),
            chunks: Vec::new(),
            num_rows: 0,
            memory_manager,
            committer,
        }
    }

    pub fn table_id(&self) -> u64 {
        self.table_id
    }

    pub fn column_types(&self) -> &[LogicalType] {
        &self.column_types
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Full chunks followed by the partially filled last one
    pub fn chunks(&self) -> &[DataChunk] {
        &self.chunks
    }

    /// Append one row; returns its local offset
    pub fn append(&mut self, row: &[Value]) -> Result<usize> {
        if row.len() != self.column_types.len() {
            return Err(KuzuError::Runtime(format!(
                "Table {} expects {} values per row but got {}.",
                self.table_id,
                self.column_types.len(),
                row.len()
            )));
        }
        for (value, column_type) in row.iter().zip(&self.column_types) {
            if !value.is_null() && value.data_type() != column_type {
                return Err(KuzuError::Conversion(format!(
                    "Expected a value of type {} but got {}.",
                    column_type,
                    value.data_type()
                )));
            }
        }
        let pos = self.num_rows % self.chunk_capacity;
        if pos == 0 {
            self.chunks.push(self.new_chunk());
        }
        let Some(chunk) = self.chunks.last_mut() else {
            crate::ku_unreachable!("a chunk was just added");
        };
        for (col_idx, value) in row.iter().enumerate() {
            chunk.get_value_vector_mut(col_idx).copy_from_value(pos, value)?;
        }
        chunk.state().write().init_original_and_selected_size(pos + 1);
        self.num_rows += 1;
        Ok(self.num_rows - 1)
    }

    pub fn get_row(&self, offset: usize) -> Option<Vec<Value>> {
        if offset >= self.num_rows {
            return None;
        }
        let chunk = &self.chunks[offset / self.chunk_capacity];
        let pos = offset % self.chunk_capacity;
        Some(chunk.vectors().iter().map(|v| v.get_as_value(pos)).collect())
    }

    fn new_chunk(&self) -> DataChunk {
        let mut chunk = DataChunk::with_capacity(self.chunk_capacity);
        for column_type in &self.column_types {
            chunk.insert(ValueVector::new(column_type.clone(), &self.memory_manager));
        }
        chunk.reset(0);
        chunk
    }
}

impl std::fmt::Debug for LocalTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTable")
            .field("table_id", &self.table_id)
            .field("column_types", &self.column_types)
            .field("num_rows", &self.num_rows)
            .finish()
    }
}

#[derive(Debug)]
pub struct LocalStorage {
    tables: Mutex<BTreeMap<u64, LocalTable>>,
    chunk_capacity: usize,
    memory_manager: MemoryManager,
}

impl LocalStorage {
    pub fn new(memory_manager: MemoryManager, chunk_capacity: usize) -> Self {
        Self {
            tables: Mutex::new(BTreeMap::new()),
            chunk_capacity,
            memory_manager,
        }
    }

    /// Register a table the first time it is written; later calls keep the existing one
    pub fn create_local_table(
        &self,
        table_id: u64,
        column_types: Vec<LogicalType>,
        committer: Arc<dyn LocalTableCommitter>,
    ) {
        self.tables.lock().entry(table_id).or_insert_with(|| {
            LocalTable::new(
                table_id,
                column_types,
                self.chunk_capacity,
                self.memory_manager.clone(),
                committer,
            )
        });
    }

    pub fn append(&self, table_id: u64, row: &[Value]) -> Result<usize> {
        let mut tables = self.tables.lock();
        let table = tables.get_mut(&table_id).ok_or_else(|| {
            KuzuError::Runtime(format!("Table {} has no local storage.", table_id))
        })?;
        table.append(row)
    }

    pub fn num_rows(&self, table_id: u64) -> usize {
        self.tables.lock().get(&table_id).map_or(0, LocalTable::num_rows)
    }

    pub fn get_row(&self, table_id: u64, offset: usize) -> Option<Vec<Value>> {
        self.tables.lock().get(&table_id)?.get_row(offset)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }

    /// Hand every table to its committer in table id order
    pub fn commit(&self) -> Result<()> {
        let tables = std::mem::take(&mut *self.tables.lock());
        for table in tables.values() {
            debug!(table_id = table.table_id, num_rows = table.num_rows, "commit local table");
            table.committer.commit_local_table(table)?;
        }
        Ok(())
    }

    pub fn rollback(&self) {
        self.tables.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CollectingCommitter {
        committed: Mutex<Vec<(u64, Vec<Vec<Value>>)>>,
    }

    impl LocalTableCommitter for CollectingCommitter {
        fn commit_local_table(&self, table: &LocalTable) -> Result<()> {
            let rows = (0..table.num_rows())
                .filter_map(|offset| table.get_row(offset))
                .collect();
            self.committed.lock().push((table.table_id(), rows));
            Ok(())
        }
    }

    fn storage() -> LocalStorage {
        LocalStorage::new(MemoryManager::default(), 2)
    }

    #[test]
    fn test_append_spans_chunks() {
        let committer = Arc::new(CollectingCommitter::default());
        let storage = storage();
        storage.create_local_table(
            1,
            vec![LogicalType::int64(), LogicalType::string()],
            committer.clone(),
        );
        for i in 0..5i64 {
            let name = format!("person number {}", i);
            assert_eq!(
                storage
                    .append(1, &[Value::from(i), Value::from(name.as_str())])
                    .unwrap(),
                i as usize
            );
        }
        assert_eq!(storage.num_rows(1), 5);
        assert_eq!(
            storage.get_row(1, 4).unwrap(),
            vec![Value::from(4i64), Value::from("person number 4")]
        );

        storage.commit().unwrap();
        let committed = committer.committed.lock();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].1.len(), 5);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let storage = storage();
        storage.create_local_table(
            1,
            vec![LogicalType::int64()],
            Arc::new(CollectingCommitter::default()),
        );
        assert!(storage.append(1, &[Value::from("x")]).is_err());
        assert!(storage.append(1, &[]).is_err());
        assert!(storage.append(2, &[Value::from(1i64)]).is_err());
        storage
            .append(1, &[Value::create_null_value()])
            .unwrap();
        storage.rollback();
        assert_eq!(storage.num_rows(1), 0);
    }
}
