//! Storage format versioning
//!
//! Maps released engine versions to the integer storage format they write and
//! validates the header at the start of a database file.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::common::constants::MAGIC_BYTES;
use crate::common::error::{KuzuError, Result};

pub type StorageVersion = u64;

/// Engine version this crate writes
pub const CURRENT_VERSION: &str = "0.11.0";

const STORAGE_VERSION_INFO: &[(&str, StorageVersion)] = &[
    ("0.11.0", 39),
    ("0.10.0", 38),
    ("0.9.0", 37),
    ("0.8.0", 36),
    ("0.7.1.1", 35),
    ("0.7.0", 34),
    ("0.6.0", 33),
    ("0.5.0", 32),
    ("0.4.2", 31),
    ("0.4.1", 31),
    ("0.4.0", 31),
    ("0.3.2", 30),
    ("0.3.1", 29),
    ("0.3.0", 28),
    ("0.2.1", 27),
    ("0.2.0", 26),
    ("0.1.0", 25),
];

/// Static lookups over the version table
pub struct StorageVersionInfo;

impl StorageVersionInfo {
    pub fn get_storage_version_info() -> &'static [(&'static str, StorageVersion)] {
        STORAGE_VERSION_INFO
    }

    /// Storage version of the current build
    pub fn get_storage_version() -> StorageVersion {
        Self::get_storage_version_for(CURRENT_VERSION).unwrap_or_else(|| {
            crate::ku_unreachable!("current version {} missing from version table", CURRENT_VERSION)
        })
    }

    pub fn get_storage_version_for(version: &str) -> Option<StorageVersion> {
        STORAGE_VERSION_INFO
            .iter()
            .find(|(name, _)| *name == version)
            .map(|(_, storage_version)| *storage_version)
    }

    pub fn is_known_storage_version(storage_version: StorageVersion) -> bool {
        STORAGE_VERSION_INFO
            .iter()
            .any(|(_, known)| *known == storage_version)
    }
}

/// Header written at offset zero of a database file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseHeader {
    pub storage_version: StorageVersion,
}

impl DatabaseHeader {
    pub fn current() -> Self {
        Self {
            storage_version: StorageVersionInfo::get_storage_version(),
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(MAGIC_BYTES)?;
        writer.write_u64::<LittleEndian>(self.storage_version)?;
        Ok(())
    }

    /// Read and validate a header, rejecting foreign files and other formats
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC_BYTES {
            return Err(KuzuError::Runtime(
                "Unable to open database. The file is not a valid Kuzu database file!".to_string(),
            ));
        }
        let storage_version = reader.read_u64::<LittleEndian>()?;
        let current = StorageVersionInfo::get_storage_version();
        debug!(storage_version, current, "read database header");
        if storage_version != current {
            let hint = if StorageVersionInfo::is_known_storage_version(storage_version) {
                "was created by a different Kuzu release"
            } else {
                "has an unknown storage version"
            };
            return Err(KuzuError::Runtime(format!(
                "Trying to read a database file with a different version. Database file version: {}, Current build storage version: {}. The file {}.",
                storage_version, current, hint
            )));
        }
        Ok(Self { storage_version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_version_lookup() {
        assert_eq!(StorageVersionInfo::get_storage_version(), 39);
        assert_eq!(StorageVersionInfo::get_storage_version_for("0.4.1"), Some(31));
        assert_eq!(StorageVersionInfo::get_storage_version_for("9.9.9"), None);
    }

    #[test]
    fn test_header_round_trip() {
        let mut bytes = Vec::new();
        DatabaseHeader::current().write_to(&mut bytes).unwrap();
        assert_eq!(&bytes[..4], b"KUZU");
        let header = DatabaseHeader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(header, DatabaseHeader::current());
    }

    #[test]
    fn test_header_rejects_bad_magic_and_version() {
        let err = DatabaseHeader::read_from(&mut Cursor::new(b"DUCK\0\0\0\0\0\0\0\0".to_vec()))
            .unwrap_err();
        assert!(matches!(err, KuzuError::Runtime(_)));

        let mut bytes = Vec::new();
        DatabaseHeader { storage_version: 31 }
            .write_to(&mut bytes)
            .unwrap();
        let err = DatabaseHeader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("different Kuzu release"));
    }
}
