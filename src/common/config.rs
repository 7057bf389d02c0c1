//! System configuration
//!
//! Settings an embedding database hands to the core when it opens.

use serde::{Deserialize, Serialize};

use crate::common::constants::{
    DEFAULT_BUFFER_POOL_SIZE, DEFAULT_CHECKPOINT_THRESHOLD, DEFAULT_VECTOR_CAPACITY,
};

/// Database wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Maximum bytes the memory manager may hand out
    pub buffer_pool_size: usize,
    /// Number of worker threads for parallel execution
    pub max_num_threads: usize,
    /// Enable on-disk compression
    pub enable_compression: bool,
    /// Open the database read only
    pub read_only: bool,
    /// Maximum size of the database file
    pub max_db_size: u64,
    /// Checkpoint automatically once the WAL grows past the threshold
    pub auto_checkpoint: bool,
    /// WAL size in bytes that triggers an automatic checkpoint
    pub checkpoint_threshold: u64,
    /// Number of values each vector holds
    pub vector_capacity: usize,
}

impl SystemConfig {
    pub fn with_buffer_pool_size(mut self, size: usize) -> Self {
        self.buffer_pool_size = size;
        self
    }

    pub fn with_max_num_threads(mut self, threads: usize) -> Self {
        self.max_num_threads = threads.max(1);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_auto_checkpoint(mut self, enabled: bool, threshold: u64) -> Self {
        self.auto_checkpoint = enabled;
        self.checkpoint_threshold = threshold;
        self
    }

    pub fn with_vector_capacity(mut self, capacity: usize) -> Self {
        self.vector_capacity = capacity;
        self
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            buffer_pool_size: DEFAULT_BUFFER_POOL_SIZE,
            max_num_threads: num_cpus::get(),
            enable_compression: true,
            read_only: false,
            max_db_size: 1 << 43, // 8TB
            auto_checkpoint: true,
            checkpoint_threshold: DEFAULT_CHECKPOINT_THRESHOLD,
            vector_capacity: DEFAULT_VECTOR_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SystemConfig::default();
        assert_eq!(config.vector_capacity, DEFAULT_VECTOR_CAPACITY);
        assert!(config.max_num_threads >= 1);
        assert!(!config.read_only);
    }

    #[test]
    fn test_builder() {
        let config = SystemConfig::default()
            .with_buffer_pool_size(4096)
            .with_max_num_threads(0)
            .with_read_only(true)
            .with_auto_checkpoint(false, 10);
        assert_eq!(config.buffer_pool_size, 4096);
        assert_eq!(config.max_num_threads, 1);
        assert!(config.read_only);
        assert!(!config.auto_checkpoint);
        assert_eq!(config.checkpoint_threshold, 10);
    }
}
