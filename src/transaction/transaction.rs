//! A single transaction and its private state
//!
//! Write transactions collect undo records, uncommitted rows and WAL frames
//! while they run. `commit` and `rollback` are the only ways out; a finished
//! transaction rejects further use. Dropping an unfinished transaction rolls
//! it back.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::error::{KuzuError, Result};
use crate::common::memory_manager::MemoryManager;
use crate::common::constants::DEFAULT_VECTOR_CAPACITY;
use crate::transaction::local_cache::LocalCacheManager;
use crate::transaction::local_storage::LocalStorage;
use crate::transaction::undo_buffer::{
    CatalogChange, CatalogEntryChange, CatalogSetHandler, SequenceChange, SequenceHandler,
    UndoBuffer, UndoRecord, UpdateInfoHandler, VectorUpdateInfo, VersionRange,
    VersionRecordHandler,
};
use crate::transaction::wal::{LocalWal, Wal, WalRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    ReadOnly,
    Write,
    Checkpoint,
    Dummy,
    Recovery,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionType::ReadOnly => "READ_ONLY",
            TransactionType::Write => "WRITE",
            TransactionType::Checkpoint => "CHECKPOINT",
            TransactionType::Dummy => "DUMMY",
            TransactionType::Recovery => "RECOVERY",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// Ids of transactions a manager considers running
pub(crate) type ActiveTransactions = Mutex<BTreeSet<u64>>;

pub struct Transaction {
    transaction_type: TransactionType,
    id: u64,
    start_ts: u64,
    commit_ts: Option<u64>,
    state: TransactionState,
    local_storage: LocalStorage,
    undo_buffer: UndoBuffer,
    local_wal: Option<LocalWal>,
    local_cache: LocalCacheManager,
    active_set: Option<Weak<ActiveTransactions>>,
}

impl Transaction {
    pub fn new(transaction_type: TransactionType, id: u64, start_ts: u64) -> Self {
        Self::with_memory_manager(
            transaction_type,
            id,
            start_ts,
            MemoryManager::default(),
            DEFAULT_VECTOR_CAPACITY,
        )
    }

    pub fn with_memory_manager(
        transaction_type: TransactionType,
        id: u64,
        start_ts: u64,
        memory_manager: MemoryManager,
        vector_capacity: usize,
    ) -> Self {
        let local_wal = (transaction_type == TransactionType::Write).then(LocalWal::new);
        Self {
            transaction_type,
            id,
            start_ts,
            commit_ts: None,
            state: TransactionState::Active,
            local_storage: LocalStorage::new(memory_manager, vector_capacity),
            undo_buffer: UndoBuffer::new(),
            local_wal,
            local_cache: LocalCacheManager::new(),
            active_set: None,
        }
    }

    /// Sees every committed version; used outside any real transaction
    pub fn dummy() -> Self {
        Self::new(TransactionType::Dummy, 0, u64::MAX)
    }

    pub(crate) fn register_with(&mut self, active_set: &Arc<ActiveTransactions>) {
        active_set.lock().insert(self.id);
        self.active_set = Some(Arc::downgrade(active_set));
    }

    pub fn get_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn get_id(&self) -> u64 {
        self.id
    }

    pub fn get_start_ts(&self) -> u64 {
        self.start_ts
    }

    pub fn get_commit_ts(&self) -> Option<u64> {
        self.commit_ts
    }

    pub(crate) fn set_commit_ts(&mut self, commit_ts: u64) {
        self.commit_ts = Some(commit_ts);
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    pub fn is_read_only(&self) -> bool {
        self.transaction_type == TransactionType::ReadOnly
    }

    pub fn is_write_transaction(&self) -> bool {
        self.transaction_type == TransactionType::Write
    }

    pub fn is_recovery(&self) -> bool {
        self.transaction_type == TransactionType::Recovery
    }

    pub fn is_dummy(&self) -> bool {
        self.transaction_type == TransactionType::Dummy
    }

    pub fn should_append_to_undo_buffer(&self) -> bool {
        matches!(
            self.transaction_type,
            TransactionType::Write | TransactionType::Recovery
        )
    }

    /// Recovery replays the WAL, so only plain write transactions log to it
    pub fn should_log_to_wal(&self) -> bool {
        self.local_wal.is_some()
    }

    pub fn local_storage(&self) -> &LocalStorage {
        &self.local_storage
    }

    pub fn local_cache(&self) -> &LocalCacheManager {
        &self.local_cache
    }

    pub fn num_undo_records(&self) -> usize {
        self.undo_buffer.len()
    }

    fn check_writable(&self) -> Result<()> {
        if !self.is_active() {
            return Err(self.finished_error());
        }
        if !self.should_append_to_undo_buffer() {
            return Err(KuzuError::Transaction(format!(
                "Cannot record changes in a {} transaction.",
                self.transaction_type
            )));
        }
        Ok(())
    }

    fn finished_error(&self) -> KuzuError {
        KuzuError::Transaction(format!(
            "Transaction {} has already been committed or rolled back.",
            self.id
        ))
    }

    fn log(&self, record: WalRecord) -> Result<()> {
        match &self.local_wal {
            Some(local_wal) => local_wal.log(&record),
            None => Ok(()),
        }
    }

    pub fn push_insert_info(
        &self,
        range: VersionRange,
        handler: Arc<dyn VersionRecordHandler>,
    ) -> Result<()> {
        self.check_writable()?;
        self.log(WalRecord::TableInsertion {
            table_id: range.table_id,
            start_row: range.start_row,
            num_rows: range.num_rows,
        })?;
        self.undo_buffer.push(UndoRecord::Insert { range, handler });
        Ok(())
    }

    pub fn push_delete_info(
        &self,
        range: VersionRange,
        handler: Arc<dyn VersionRecordHandler>,
    ) -> Result<()> {
        self.check_writable()?;
        self.log(WalRecord::Deletion {
            table_id: range.table_id,
            start_row: range.start_row,
            num_rows: range.num_rows,
        })?;
        self.undo_buffer.push(UndoRecord::Delete { range, handler });
        Ok(())
    }

    pub fn push_vector_update_info(
        &self,
        info: VectorUpdateInfo,
        handler: Arc<dyn UpdateInfoHandler>,
    ) -> Result<()> {
        self.check_writable()?;
        crate::ku_assert!(info.positions.len() == info.prev_values.len());
        self.log(WalRecord::Update {
            table_id: info.table_id,
            column_id: info.column_id,
            vector_idx: info.vector_idx,
            num_updates: info.positions.len() as u64,
        })?;
        self.undo_buffer
            .push(UndoRecord::VectorUpdate { info, handler });
        Ok(())
    }

    pub fn push_create_drop_catalog_entry(
        &self,
        entry_name: impl Into<String>,
        is_create: bool,
        handler: Arc<dyn CatalogSetHandler>,
    ) -> Result<()> {
        self.check_writable()?;
        let entry_name = entry_name.into();
        let (record, change) = if is_create {
            (
                WalRecord::CreateCatalogEntry {
                    entry_name: entry_name.clone(),
                },
                CatalogChange::Create,
            )
        } else {
            (
                WalRecord::DropCatalogEntry {
                    entry_name: entry_name.clone(),
                },
                CatalogChange::Drop,
            )
        };
        self.log(record)?;
        self.undo_buffer.push(UndoRecord::CatalogEntry {
            change: CatalogEntryChange { entry_name, change },
            handler,
        });
        Ok(())
    }

    pub fn push_alter_catalog_entry(
        &self,
        entry_name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn CatalogSetHandler>,
    ) -> Result<()> {
        self.check_writable()?;
        let entry_name = entry_name.into();
        let description = description.into();
        self.log(WalRecord::AlterCatalogEntry {
            entry_name: entry_name.clone(),
            description: description.clone(),
        })?;
        self.undo_buffer.push(UndoRecord::CatalogEntry {
            change: CatalogEntryChange {
                entry_name,
                change: CatalogChange::Alter { description },
            },
            handler,
        });
        Ok(())
    }

    pub fn push_sequence_change(
        &self,
        change: SequenceChange,
        handler: Arc<dyn SequenceHandler>,
    ) -> Result<()> {
        self.check_writable()?;
        self.log(WalRecord::UpdateSequence {
            sequence_id: change.sequence_id,
            value: change.new_value,
        })?;
        self.undo_buffer.push(UndoRecord::Sequence { change, handler });
        Ok(())
    }

    /// Publish local rows, stamp undo records and flush the local WAL into `wal`
    ///
    /// If any step fails the transaction is rolled back and the error of the
    /// failed step is returned.
    pub fn commit(&mut self, wal: &dyn Wal) -> Result<()> {
        if !self.is_active() {
            return Err(self.finished_error());
        }
        if self.should_append_to_undo_buffer() {
            let commit_ts = self.commit_ts.ok_or_else(|| {
                KuzuError::Transaction(format!(
                    "Transaction {} has no commit timestamp.",
                    self.id
                ))
            })?;
            let published = self.publish(commit_ts, wal);
            if let Err(e) = published {
                warn!(id = self.id, error = %e, "commit failed, rolling back");
                self.commit_ts = None;
                if let Err(rollback_error) = self.rollback_local() {
                    warn!(id = self.id, error = %rollback_error, "rollback after failed commit");
                }
                return Err(e);
            }
        }
        self.finish(TransactionState::Committed);
        debug!(
            id = self.id,
            transaction_type = %self.transaction_type,
            commit_ts = ?self.commit_ts,
            "committed transaction"
        );
        Ok(())
    }

    fn publish(&self, commit_ts: u64, wal: &dyn Wal) -> Result<()> {
        self.local_storage.commit()?;
        self.undo_buffer.commit(commit_ts)?;
        if let Some(local_wal) = &self.local_wal {
            if !local_wal.is_empty() {
                local_wal.log(&WalRecord::Commit {
                    transaction_id: self.id,
                    commit_ts,
                })?;
                local_wal.flush_into(wal)?;
            }
        }
        Ok(())
    }

    /// Reverse every recorded change; a WAL that never saw the changes only gets a rollback marker
    pub fn rollback(&mut self, wal: &dyn Wal) -> Result<()> {
        if !self.is_active() {
            return Err(self.finished_error());
        }
        let had_changes = !self.undo_buffer.is_empty();
        self.rollback_local()?;
        if had_changes && self.should_log_to_wal() {
            let mut frames = Vec::new();
            WalRecord::Rollback {
                transaction_id: self.id,
            }
            .write_frame(&mut frames)?;
            wal.append(&frames)?;
        }
        debug!(id = self.id, transaction_type = %self.transaction_type, "rolled back transaction");
        Ok(())
    }

    fn rollback_local(&mut self) -> Result<()> {
        self.local_storage.rollback();
        if let Some(local_wal) = &self.local_wal {
            local_wal.clear();
        }
        let result = self.undo_buffer.rollback();
        self.finish(TransactionState::RolledBack);
        result
    }

    fn finish(&mut self, state: TransactionState) {
        self.state = state;
        self.local_cache.clear();
        if let Some(active_set) = self.active_set.take().and_then(|set| set.upgrade()) {
            active_set.lock().remove(&self.id);
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.is_active() {
            if let Err(e) = self.rollback_local() {
                warn!(id = self.id, error = %e, "rollback on drop failed");
            }
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("type", &self.transaction_type)
            .field("id", &self.id)
            .field("start_ts", &self.start_ts)
            .field("commit_ts", &self.commit_ts)
            .field("state", &self.state)
            .finish()
    }
}
