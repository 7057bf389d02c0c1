//! Common utilities and shared components

pub mod active_query;
pub mod assert;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod memory_manager;
pub mod storage_version;

pub use active_query::ActiveQuery;
pub use config::SystemConfig;
pub use constants::*;
pub use error::*;
pub use logging::init_logging;
pub use memory_manager::{InMemOverflowBuffer, MemoryBuffer, MemoryManager};
pub use storage_version::{DatabaseHeader, StorageVersionInfo};
