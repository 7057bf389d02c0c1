//! Transactions, undo records and the write-ahead log
//!
//! - [`TransactionManager`]: ids, timestamps and serialized commits
//! - [`Transaction`]: undo buffer, local storage, local WAL and cache of one transaction
//! - [`UndoBuffer`]: reversible mutation records replayed through handler traits
//! - [`Wal`]: sink for framed [`WalRecord`]s

pub mod local_cache;
pub mod local_storage;
#[allow(clippy::module_inception)]
pub mod transaction;
pub mod transaction_manager;
pub mod undo_buffer;
pub mod wal;

pub use local_cache::LocalCacheManager;
pub use local_storage::{LocalStorage, LocalTable, LocalTableCommitter};
pub use transaction::{Transaction, TransactionState, TransactionType};
pub use transaction_manager::TransactionManager;
pub use undo_buffer::{
    CatalogChange, CatalogEntryChange, CatalogSetHandler, SequenceChange, SequenceHandler,
    UndoBuffer, UndoRecord, UpdateInfoHandler, VectorUpdateInfo, VersionRange,
    VersionRecordHandler,
};
pub use wal::{decode_frames, FileWal, InMemoryWal, LocalWal, Wal, WalRecord};
