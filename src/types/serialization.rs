//! Binary encoding for types and values
//!
//! Lengths and counts are LEB128 varints; fixed-width payloads reuse the
//! little-endian slot encoding of [`PhysicalValue`]. Top-level blobs start
//! with [`SERIALIZATION_FORMAT_VERSION`].

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::common::error::{KuzuError, Result};
use crate::types::physical_value::PhysicalValue;

pub const SERIALIZATION_FORMAT_VERSION: u8 = 1;

const MAX_VARINT_BYTES: usize = 10;

#[derive(Debug, Default)]
pub struct Serializer {
    buf: BytesMut,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializer whose output starts with the format version byte
    pub fn versioned() -> Self {
        let mut serializer = Self::new();
        serializer.write_u8(SERIALIZATION_FORMAT_VERSION);
        serializer
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.put_u8((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.put_u8(value as u8);
    }

    /// Write the slot encoding of a fixed-width value
    pub fn write_fixed<T: PhysicalValue>(&mut self, value: T) {
        let mut slot = [0u8; 16];
        value.write_to(&mut slot);
        self.buf
            .put_slice(&slot[..T::PHYSICAL_TYPE.fixed_type_size()]);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.put_slice(bytes);
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[derive(Debug, Clone)]
pub struct Deserializer {
    buf: Bytes,
}

impl Deserializer {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { buf: bytes.into() }
    }

    /// Consume and check the leading format version byte
    pub fn versioned(bytes: impl Into<Bytes>) -> Result<Self> {
        let mut deserializer = Self::new(bytes);
        let version = deserializer.read_u8()?;
        if version != SERIALIZATION_FORMAT_VERSION {
            return Err(KuzuError::Serialization(format!(
                "Unsupported serialization format version {}, expected {}.",
                version, SERIALIZATION_FORMAT_VERSION
            )));
        }
        Ok(deserializer)
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(KuzuError::Serialization(format!(
                "Unexpected end of buffer: need {} bytes, {} left.",
                needed,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7f) as u64) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(KuzuError::Serialization("Malformed varint.".to_string()))
    }

    pub fn read_fixed<T: PhysicalValue>(&mut self) -> Result<T> {
        let size = T::PHYSICAL_TYPE.fixed_type_size();
        self.ensure(size)?;
        let value = T::read_from(&self.buf[..size]);
        self.buf.advance(size);
        Ok(value)
    }

    pub fn read_bytes(&mut self) -> Result<Bytes> {
        let len = self.read_varint()? as usize;
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| KuzuError::Serialization(format!("Invalid UTF-8 string: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::int128::Int128;

    #[test]
    fn test_varint_encoding() {
        let mut serializer = Serializer::new();
        serializer.write_varint(1);
        serializer.write_varint(300);
        serializer.write_varint(u64::MAX);
        let bytes = serializer.finish();
        assert_eq!(&bytes[..3], &[0x01, 0xac, 0x02]);

        let mut deserializer = Deserializer::new(bytes);
        assert_eq!(deserializer.read_varint().unwrap(), 1);
        assert_eq!(deserializer.read_varint().unwrap(), 300);
        assert_eq!(deserializer.read_varint().unwrap(), u64::MAX);
        assert!(deserializer.is_empty());
    }

    #[test]
    fn test_mixed_payload() {
        let mut serializer = Serializer::versioned();
        serializer.write_str("person");
        serializer.write_fixed(-7i32);
        serializer.write_fixed(Int128::MIN);
        serializer.write_bool(true);

        let mut deserializer = Deserializer::versioned(serializer.finish()).unwrap();
        assert_eq!(deserializer.read_string().unwrap(), "person");
        assert_eq!(deserializer.read_fixed::<i32>().unwrap(), -7);
        assert_eq!(deserializer.read_fixed::<Int128>().unwrap(), Int128::MIN);
        assert!(deserializer.read_bool().unwrap());
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let mut deserializer = Deserializer::new(vec![0x05, b'a']);
        assert!(matches!(
            deserializer.read_string(),
            Err(KuzuError::Serialization(_))
        ));
        assert!(Deserializer::versioned(vec![9u8]).is_err());
    }
}
