//! Memory management for vector payloads
//!
//! The [`MemoryManager`] hands out zeroed buffers against a fixed budget and
//! takes the bytes back when a [`MemoryBuffer`] is dropped. The
//! [`InMemOverflowBuffer`] is a bump allocator over such buffers that owns
//! string and row overflow bytes.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{trace, warn};

use crate::common::config::SystemConfig;
use crate::common::constants::OVERFLOW_BLOCK_SIZE;
use crate::common::error::{KuzuError, Result};

#[derive(Debug)]
struct MemoryManagerInner {
    used: AtomicUsize,
    limit: usize,
}

impl MemoryManagerInner {
    fn release(&self, size: usize) {
        self.used.fetch_sub(size, Ordering::AcqRel);
    }
}

/// Shared handle to the buffer budget
#[derive(Debug, Clone)]
pub struct MemoryManager {
    inner: Arc<MemoryManagerInner>,
}

impl MemoryManager {
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_limit(config.buffer_pool_size)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            inner: Arc::new(MemoryManagerInner {
                used: AtomicUsize::new(0),
                limit,
            }),
        }
    }

    /// Allocate a zeroed buffer of `size` bytes
    pub fn allocate_buffer(&self, size: usize) -> Result<MemoryBuffer> {
        let limit = self.inner.limit;
        let reserved = self
            .inner
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(size).filter(|total| *total <= limit)
            });
        if reserved.is_err() {
            warn!(
                requested = size,
                used = self.used_memory(),
                limit,
                "buffer pool exhausted"
            );
            return Err(KuzuError::BufferManager(format!(
                "Unable to allocate memory! The buffer pool is full and no memory could be freed! Requested {} bytes, {} of {} bytes in use.",
                size,
                self.used_memory(),
                limit
            )));
        }
        Ok(MemoryBuffer {
            data: vec![0u8; size],
            owner: self.inner.clone(),
        })
    }

    pub fn used_memory(&self) -> usize {
        self.inner.used.load(Ordering::Acquire)
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new(&SystemConfig::default())
    }
}

/// A buffer accounted against a [`MemoryManager`]
pub struct MemoryBuffer {
    data: Vec<u8>,
    owner: Arc<MemoryManagerInner>,
}

impl MemoryBuffer {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Deref for MemoryBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for MemoryBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBuffer")
            .field("len", &self.data.len())
            .finish()
    }
}

impl Drop for MemoryBuffer {
    fn drop(&mut self) {
        self.owner.release(self.data.len());
    }
}

struct OverflowBlock {
    buffer: MemoryBuffer,
    used: usize,
}

/// Bump allocator owning variable-length payload bytes
///
/// Allocations are addressed by `u64` handles encoding the block index in the
/// high 32 bits and the byte offset in the low 32 bits. Handles stay valid
/// until [`InMemOverflowBuffer::reset_buffer`] is called.
pub struct InMemOverflowBuffer {
    memory_manager: MemoryManager,
    blocks: Vec<OverflowBlock>,
}

impl InMemOverflowBuffer {
    pub fn new(memory_manager: MemoryManager) -> Self {
        Self {
            memory_manager,
            blocks: Vec::new(),
        }
    }

    pub fn memory_manager(&self) -> &MemoryManager {
        &self.memory_manager
    }

    /// Reserve `size` bytes and return their handle
    ///
    /// Zero bytes need no block; their handle is 0 and reads back empty.
    pub fn allocate_space(&mut self, size: usize) -> Result<u64> {
        if size == 0 {
            return Ok(0);
        }
        let fits = self
            .blocks
            .last()
            .is_some_and(|block| block.used + size <= block.buffer.len());
        if !fits {
            let block_size = size.max(OVERFLOW_BLOCK_SIZE);
            let buffer = self.memory_manager.allocate_buffer(block_size)?;
            trace!(block_size, num_blocks = self.blocks.len() + 1, "new overflow block");
            self.blocks.push(OverflowBlock { buffer, used: 0 });
        }
        let block_idx = self.blocks.len() - 1;
        let block = &mut self.blocks[block_idx];
        let offset = block.used;
        block.used += size;
        crate::ku_assert!(offset <= u32::MAX as usize && block_idx <= u32::MAX as usize);
        Ok(((block_idx as u64) << 32) | offset as u64)
    }

    /// Copy `bytes` into freshly allocated space
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<u64> {
        let handle = self.allocate_space(bytes.len())?;
        self.get_mut(handle, bytes.len()).copy_from_slice(bytes);
        Ok(handle)
    }

    pub fn get(&self, handle: u64, len: usize) -> &[u8] {
        if len == 0 {
            return &[];
        }
        let (block_idx, offset) = Self::decode(handle);
        &self.blocks[block_idx].buffer[offset..offset + len]
    }

    pub fn get_mut(&mut self, handle: u64, len: usize) -> &mut [u8] {
        if len == 0 {
            return &mut [];
        }
        let (block_idx, offset) = Self::decode(handle);
        &mut self.blocks[block_idx].buffer[offset..offset + len]
    }

    /// Drop every block but the first and rewind it
    pub fn reset_buffer(&mut self) {
        self.blocks.truncate(1);
        if let Some(block) = self.blocks.first_mut() {
            block.used = 0;
        }
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn used_bytes(&self) -> usize {
        self.blocks.iter().map(|block| block.used).sum()
    }

    fn decode(handle: u64) -> (usize, usize) {
        ((handle >> 32) as usize, (handle & u32::MAX as u64) as usize)
    }
}

impl fmt::Debug for InMemOverflowBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemOverflowBuffer")
            .field("num_blocks", &self.blocks.len())
            .field("used_bytes", &self.used_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_accounting() {
        let mm = MemoryManager::with_limit(1024);
        let buffer = mm.allocate_buffer(1000).unwrap();
        assert_eq!(buffer.len(), 1000);
        assert_eq!(mm.used_memory(), 1000);

        let err = mm.allocate_buffer(100).unwrap_err();
        assert!(matches!(err, KuzuError::BufferManager(_)));

        drop(buffer);
        assert_eq!(mm.used_memory(), 0);
        assert!(mm.allocate_buffer(100).is_ok());
    }

    #[test]
    fn test_overflow_handles_are_stable() {
        let mut overflow = InMemOverflowBuffer::new(MemoryManager::default());
        let first = overflow.add_bytes(b"hello world, long string").unwrap();
        let big = vec![7u8; OVERFLOW_BLOCK_SIZE + 10];
        let second = overflow.add_bytes(&big).unwrap();
        let third = overflow.add_bytes(b"tail").unwrap();

        assert_eq!(overflow.num_blocks(), 3);
        assert_eq!(overflow.get(first, 24), b"hello world, long string");
        assert_eq!(overflow.get(second, big.len()), &big[..]);
        assert_eq!(overflow.get(third, 4), b"tail");
    }

    #[test]
    fn test_reset_buffer_keeps_first_block() {
        let mm = MemoryManager::default();
        let mut overflow = InMemOverflowBuffer::new(mm.clone());
        overflow.add_bytes(&[1u8; 16]).unwrap();
        overflow.add_bytes(&vec![2u8; OVERFLOW_BLOCK_SIZE]).unwrap();
        overflow.reset_buffer();
        assert_eq!(overflow.num_blocks(), 1);
        assert_eq!(overflow.used_bytes(), 0);
        assert_eq!(mm.used_memory(), OVERFLOW_BLOCK_SIZE);
    }

    #[test]
    fn test_zero_bytes_allocate_nothing() {
        let mm = MemoryManager::default();
        let mut overflow = InMemOverflowBuffer::new(mm.clone());
        let handle = overflow.add_bytes(&[]).unwrap();
        assert_eq!(overflow.num_blocks(), 0);
        assert_eq!(mm.used_memory(), 0);
        assert!(overflow.get(handle, 0).is_empty());
    }
}
