//! Undo records of a write transaction
//!
//! Each record names the mutation it covers and the handler that knows how
//! to finalize or reverse it. Commit replays records in push order, rollback
//! in reverse push order. Replay drains the buffer, so it runs at most once.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::common::error::Result;
use crate::types::value::Value;

/// Rows `[start_row, start_row + num_rows)` of one node group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub table_id: u64,
    pub node_group_idx: u64,
    pub start_row: u64,
    pub num_rows: u64,
}

/// In-place updates of one column vector; `prev_values[i]` was stored at `positions[i]`
#[derive(Debug, Clone, PartialEq)]
pub struct VectorUpdateInfo {
    pub table_id: u64,
    pub column_id: u32,
    pub vector_idx: u64,
    pub positions: Vec<u64>,
    pub prev_values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogChange {
    Create,
    Drop,
    Alter { description: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntryChange {
    pub entry_name: String,
    pub change: CatalogChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceChange {
    pub sequence_id: u64,
    pub prev_value: i64,
    pub new_value: i64,
}

/// Stamps or removes row versions created by inserts and deletes
pub trait VersionRecordHandler: Send + Sync {
    fn commit_insert(&self, range: &VersionRange, commit_ts: u64) -> Result<()>;
    fn rollback_insert(&self, range: &VersionRange) -> Result<()>;
    fn commit_delete(&self, range: &VersionRange, commit_ts: u64) -> Result<()>;
    fn rollback_delete(&self, range: &VersionRange) -> Result<()>;
}

pub trait UpdateInfoHandler: Send + Sync {
    fn commit_update(&self, info: &VectorUpdateInfo, commit_ts: u64) -> Result<()>;
    /// Restore `prev_values`
    fn rollback_update(&self, info: &VectorUpdateInfo) -> Result<()>;
}

pub trait CatalogSetHandler: Send + Sync {
    fn commit_entry(&self, change: &CatalogEntryChange, commit_ts: u64) -> Result<()>;
    fn rollback_entry(&self, change: &CatalogEntryChange) -> Result<()>;
}

pub trait SequenceHandler: Send + Sync {
    fn commit_sequence(&self, change: &SequenceChange, commit_ts: u64) -> Result<()>;
    fn rollback_sequence(&self, change: &SequenceChange) -> Result<()>;
}

#[derive(Clone)]
pub enum UndoRecord {
    Insert {
        range: VersionRange,
        handler: Arc<dyn VersionRecordHandler>,
    },
    Delete {
        range: VersionRange,
        handler: Arc<dyn VersionRecordHandler>,
    },
    VectorUpdate {
        info: VectorUpdateInfo,
        handler: Arc<dyn UpdateInfoHandler>,
    },
    CatalogEntry {
        change: CatalogEntryChange,
        handler: Arc<dyn CatalogSetHandler>,
    },
    Sequence {
        change: SequenceChange,
        handler: Arc<dyn SequenceHandler>,
    },
}

impl UndoRecord {
    fn commit(&self, commit_ts: u64) -> Result<()> {
        match self {
            UndoRecord::Insert { range, handler } => handler.commit_insert(range, commit_ts),
            UndoRecord::Delete { range, handler } => handler.commit_delete(range, commit_ts),
            UndoRecord::VectorUpdate { info, handler } => handler.commit_update(info, commit_ts),
            UndoRecord::CatalogEntry { change, handler } => handler.commit_entry(change, commit_ts),
            UndoRecord::Sequence { change, handler } => handler.commit_sequence(change, commit_ts),
        }
    }

    fn rollback(&self) -> Result<()> {
        match self {
            UndoRecord::Insert { range, handler } => handler.rollback_insert(range),
            UndoRecord::Delete { range, handler } => handler.rollback_delete(range),
            UndoRecord::VectorUpdate { info, handler } => handler.rollback_update(info),
            UndoRecord::CatalogEntry { change, handler } => handler.rollback_entry(change),
            UndoRecord::Sequence { change, handler } => handler.rollback_sequence(change),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            UndoRecord::Insert { .. } => "insert",
            UndoRecord::Delete { .. } => "delete",
            UndoRecord::VectorUpdate { .. } => "vector_update",
            UndoRecord::CatalogEntry { .. } => "catalog_entry",
            UndoRecord::Sequence { .. } => "sequence",
        }
    }
}

impl fmt::Debug for UndoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoRecord::Insert { range, .. } => f.debug_tuple("Insert").field(range).finish(),
            UndoRecord::Delete { range, .. } => f.debug_tuple("Delete").field(range).finish(),
            UndoRecord::VectorUpdate { info, .. } => {
                f.debug_tuple("VectorUpdate").field(info).finish()
            }
            UndoRecord::CatalogEntry { change, .. } => {
                f.debug_tuple("CatalogEntry").field(change).finish()
            }
            UndoRecord::Sequence { change, .. } => f.debug_tuple("Sequence").field(change).finish(),
        }
    }
}

#[derive(Debug, Default)]
pub struct UndoBuffer {
    records: Mutex<Vec<UndoRecord>>,
}

impl UndoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: UndoRecord) {
        trace!(kind = record.kind(), "push undo record");
        self.records.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finalize every record with `commit_ts`, oldest first
    ///
    /// On a handler error every record goes back into the buffer so the
    /// caller can still roll the whole transaction back.
    pub fn commit(&self, commit_ts: u64) -> Result<()> {
        let records = std::mem::take(&mut *self.records.lock());
        debug!(num_records = records.len(), commit_ts, "commit undo buffer");
        let result = records.iter().try_for_each(|record| record.commit(commit_ts));
        if let Err(e) = result {
            let mut guard = self.records.lock();
            let pushed_since = std::mem::replace(&mut *guard, records);
            guard.extend(pushed_since);
            return Err(e);
        }
        Ok(())
    }

    /// Reverse every record, newest first
    ///
    /// A failing record does not stop the replay; the first error is returned
    /// once every record has been visited.
    pub fn rollback(&self) -> Result<()> {
        let records = std::mem::take(&mut *self.records.lock());
        debug!(num_records = records.len(), "roll back undo buffer");
        let mut first_error = None;
        for record in records.iter().rev() {
            if let Err(e) = record.rollback() {
                warn!(kind = record.kind(), error = %e, "undo record rollback failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
