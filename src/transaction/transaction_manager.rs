//! Hands out transactions and serializes their commits

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::common::config::SystemConfig;
use crate::common::constants::START_TRANSACTION_ID;
use crate::common::error::{KuzuError, Result};
use crate::common::memory_manager::MemoryManager;
use crate::transaction::transaction::{ActiveTransactions, Transaction, TransactionType};
use crate::transaction::wal::Wal;

#[derive(Debug)]
struct Counters {
    last_transaction_id: u64,
    /// Commit timestamp of the newest committed write transaction
    last_timestamp: u64,
}

#[derive(Debug)]
pub struct TransactionManager {
    config: SystemConfig,
    memory_manager: MemoryManager,
    counters: Mutex<Counters>,
    active: Arc<ActiveTransactions>,
}

impl TransactionManager {
    pub fn new(config: SystemConfig, memory_manager: MemoryManager) -> Self {
        Self {
            config,
            memory_manager,
            counters: Mutex::new(Counters {
                last_transaction_id: START_TRANSACTION_ID,
                last_timestamp: 0,
            }),
            active: Arc::new(ActiveTransactions::default()),
        }
    }

    pub fn begin_transaction(&self, transaction_type: TransactionType) -> Result<Transaction> {
        if self.config.read_only && transaction_type == TransactionType::Write {
            return Err(KuzuError::Transaction(
                "Cannot start a write transaction in read-only mode.".to_string(),
            ));
        }
        if transaction_type == TransactionType::Dummy {
            return Ok(Transaction::dummy());
        }
        let (id, start_ts) = {
            let mut counters = self.counters.lock();
            counters.last_transaction_id += 1;
            (counters.last_transaction_id, counters.last_timestamp)
        };
        let mut transaction = Transaction::with_memory_manager(
            transaction_type,
            id,
            start_ts,
            self.memory_manager.clone(),
            self.config.vector_capacity,
        );
        transaction.register_with(&self.active);
        debug!(id, start_ts, %transaction_type, "began transaction");
        Ok(transaction)
    }

    /// Assign the next commit timestamp and commit; commits never interleave
    pub fn commit(&self, transaction: &mut Transaction, wal: &dyn Wal) -> Result<()> {
        if !transaction.should_append_to_undo_buffer() {
            return transaction.commit(wal);
        }
        let mut counters = self.counters.lock();
        let commit_ts = counters.last_timestamp + 1;
        transaction.set_commit_ts(commit_ts);
        transaction.commit(wal)?;
        counters.last_timestamp = commit_ts;
        Ok(())
    }

    pub fn rollback(&self, transaction: &mut Transaction, wal: &dyn Wal) -> Result<()> {
        transaction.rollback(wal)
    }

    pub fn last_timestamp(&self) -> u64 {
        self.counters.lock().last_timestamp
    }

    /// Ids of transactions that have begun and not yet finished
    pub fn active_transaction_ids(&self) -> Vec<u64> {
        self.active.lock().iter().copied().collect()
    }

    /// Whether `wal` has grown past the automatic checkpoint threshold
    pub fn needs_checkpoint(&self, wal: &dyn Wal) -> bool {
        let needed = self.config.auto_checkpoint && wal.size() >= self.config.checkpoint_threshold;
        if needed {
            info!(wal_size = wal.size(), "WAL passed the checkpoint threshold");
        }
        needed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::wal::InMemoryWal;

    fn manager(config: SystemConfig) -> TransactionManager {
        TransactionManager::new(config, MemoryManager::default())
    }

    #[test]
    fn test_ids_and_timestamps_are_monotonic() {
        let manager = manager(SystemConfig::default());
        let wal = InMemoryWal::new();
        let mut first = manager.begin_transaction(TransactionType::Write).unwrap();
        let mut second = manager.begin_transaction(TransactionType::Write).unwrap();
        assert!(second.get_id() > first.get_id());
        assert!(first.get_id() > START_TRANSACTION_ID);
        assert_eq!(manager.active_transaction_ids().len(), 2);

        manager.commit(&mut first, &wal).unwrap();
        manager.commit(&mut second, &wal).unwrap();
        assert_eq!(first.get_commit_ts(), Some(1));
        assert_eq!(second.get_commit_ts(), Some(2));
        assert_eq!(manager.last_timestamp(), 2);

        let reader = manager.begin_transaction(TransactionType::ReadOnly).unwrap();
        assert_eq!(reader.get_start_ts(), 2);
        drop(reader);
        assert!(manager.active_transaction_ids().is_empty());
    }

    #[test]
    fn test_read_only_database_rejects_writes() {
        let manager = manager(SystemConfig::default().with_read_only(true));
        assert!(matches!(
            manager.begin_transaction(TransactionType::Write),
            Err(KuzuError::Transaction(_))
        ));
        let mut reader = manager.begin_transaction(TransactionType::ReadOnly).unwrap();
        manager.commit(&mut reader, &InMemoryWal::new()).unwrap();
        assert_eq!(manager.last_timestamp(), 0);
    }

    #[test]
    fn test_checkpoint_threshold() {
        let manager = manager(SystemConfig::default().with_auto_checkpoint(true, 1));
        let wal = InMemoryWal::new();
        assert!(!manager.needs_checkpoint(&wal));
        wal.append(&[0u8; 4]).unwrap();
        assert!(manager.needs_checkpoint(&wal));
    }
}
