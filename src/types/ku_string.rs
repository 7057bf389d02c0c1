//! 16-byte string cell
//!
//! Layout: `len: u32` followed by 12 bytes. Strings of at most 12 bytes live
//! entirely inline. Longer strings keep their first 4 bytes inline as a
//! comparison prefix and store a `u64` overflow handle in the remaining 8.

use std::fmt;

use crate::common::constants::{PREFIX_LENGTH, SHORT_STR_LENGTH};
use crate::common::memory_manager::InMemOverflowBuffer;
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::PhysicalValue;

#[derive(Clone, Copy, Default)]
pub struct KuString {
    len: u32,
    data: [u8; SHORT_STR_LENGTH],
}

impl KuString {
    pub fn is_short_string(len: usize) -> bool {
        len <= SHORT_STR_LENGTH
    }

    /// Inline cell for a string of at most 12 bytes
    pub fn new_short(bytes: &[u8]) -> Self {
        crate::ku_assert!(Self::is_short_string(bytes.len()));
        let mut data = [0u8; SHORT_STR_LENGTH];
        data[..bytes.len()].copy_from_slice(bytes);
        Self {
            len: bytes.len() as u32,
            data,
        }
    }

    /// Cell for a long string whose payload sits at `handle`
    pub fn new_long(bytes: &[u8], handle: u64) -> Self {
        crate::ku_assert!(!Self::is_short_string(bytes.len()));
        let mut data = [0u8; SHORT_STR_LENGTH];
        data[..PREFIX_LENGTH].copy_from_slice(&bytes[..PREFIX_LENGTH]);
        data[PREFIX_LENGTH..].copy_from_slice(&handle.to_le_bytes());
        Self {
            len: bytes.len() as u32,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_short(&self) -> bool {
        Self::is_short_string(self.len())
    }

    pub fn prefix(&self) -> &[u8] {
        &self.data[..self.len().min(PREFIX_LENGTH)]
    }

    pub fn inline_data(&self) -> &[u8] {
        crate::ku_assert!(self.is_short());
        &self.data[..self.len()]
    }

    pub fn overflow_handle(&self) -> u64 {
        crate::ku_assert!(!self.is_short());
        u64::read_from(&self.data[PREFIX_LENGTH..])
    }

    /// Resolve the payload, looking long strings up in `overflow`
    pub fn as_bytes<'a>(&'a self, overflow: &'a InMemOverflowBuffer) -> &'a [u8] {
        if self.is_short() {
            self.inline_data()
        } else {
            overflow.get(self.overflow_handle(), self.len())
        }
    }
}

impl PhysicalValue for KuString {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::String;

    fn read_from(bytes: &[u8]) -> Self {
        let mut data = [0u8; SHORT_STR_LENGTH];
        data.copy_from_slice(&bytes[4..16]);
        Self {
            len: u32::read_from(&bytes[..4]),
            data,
        }
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.len.write_to(&mut bytes[..4]);
        bytes[4..16].copy_from_slice(&self.data);
    }
}

impl fmt::Debug for KuString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("KuString");
        s.field("len", &self.len);
        if self.is_short() {
            s.field("data", &String::from_utf8_lossy(self.inline_data()));
        } else {
            s.field("prefix", &String::from_utf8_lossy(self.prefix()))
                .field("handle", &self.overflow_handle());
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;

    #[test]
    fn test_short_string_is_inline() {
        let s = KuString::new_short(b"hello world!");
        assert_eq!(s.len(), 12);
        assert!(s.is_short());
        assert_eq!(s.inline_data(), b"hello world!");
        assert_eq!(s.prefix(), b"hell");
    }

    #[test]
    fn test_long_string_resolves_through_overflow() {
        let mut overflow = InMemOverflowBuffer::new(MemoryManager::default());
        let payload = b"a string that does not fit inline";
        let handle = overflow.add_bytes(payload).unwrap();
        let s = KuString::new_long(payload, handle);

        assert!(!s.is_short());
        assert_eq!(s.prefix(), b"a st");
        assert_eq!(s.overflow_handle(), handle);
        assert_eq!(s.as_bytes(&overflow), payload);
    }

    #[test]
    fn test_slot_encoding() {
        let mut slot = [0u8; 16];
        KuString::new_short(b"abc").write_to(&mut slot);
        assert_eq!(&slot[..4], &3u32.to_le_bytes());
        let decoded = KuString::read_from(&slot);
        assert_eq!(decoded.inline_data(), b"abc");
    }
}
