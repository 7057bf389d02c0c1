//! Constants used throughout the execution core

/// Default number of values a vector holds
pub const DEFAULT_VECTOR_CAPACITY: usize = 2048;

/// Growth factor applied when a list data vector runs out of room
pub const CHUNK_RESIZE_RATIO: usize = 2;

/// Strings up to this length are stored entirely inside a `KuString`
pub const SHORT_STR_LENGTH: usize = 12;

/// Longest string a function may produce
pub const MAX_STRING_LENGTH: usize = 256 * 1024;

/// Number of prefix bytes kept inline for long strings
pub const PREFIX_LENGTH: usize = 4;

/// Size of one overflow block handed out by the memory manager
pub const OVERFLOW_BLOCK_SIZE: usize = 256 * 1024;

/// Bits stored in one null mask word
pub const NUM_BITS_PER_NULL_ENTRY: usize = 64;

/// Default memory budget for the buffer pool (1GB)
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 1024 * 1024 * 1024;

/// WAL size in bytes that triggers an automatic checkpoint
pub const DEFAULT_CHECKPOINT_THRESHOLD: u64 = 16 * 1024 * 1024;

/// First id handed to a transaction; ids stay disjoint from commit timestamps
pub const START_TRANSACTION_ID: u64 = 1 << 63;

/// Magic bytes at the start of every database file
pub const MAGIC_BYTES: &[u8; 4] = b"KUZU";

/// Field names of the internal node/rel struct layouts
pub mod internal_keyword {
    pub const ID: &str = "_ID";
    pub const LABEL: &str = "_LABEL";
    pub const SRC: &str = "_SRC";
    pub const DST: &str = "_DST";
    pub const NODES: &str = "_NODES";
    pub const RELS: &str = "_RELS";
    pub const MAP_KEY: &str = "KEY";
    pub const MAP_VALUE: &str = "VALUE";
    pub const UNION_TAG: &str = "tag";
}
