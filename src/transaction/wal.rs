//! Write-ahead log records and sinks
//!
//! Records are `bincode` encoded and framed with a little-endian `u32`
//! length. A write transaction buffers its frames in a [`LocalWal`] and hands
//! them to the shared [`Wal`] in one piece when it commits.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::common::error::{KuzuError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalRecord {
    Commit {
        transaction_id: u64,
        commit_ts: u64,
    },
    Rollback {
        transaction_id: u64,
    },
    TableInsertion {
        table_id: u64,
        start_row: u64,
        num_rows: u64,
    },
    Deletion {
        table_id: u64,
        start_row: u64,
        num_rows: u64,
    },
    Update {
        table_id: u64,
        column_id: u32,
        vector_idx: u64,
        num_updates: u64,
    },
    CreateCatalogEntry {
        entry_name: String,
    },
    DropCatalogEntry {
        entry_name: String,
    },
    AlterCatalogEntry {
        entry_name: String,
        description: String,
    },
    UpdateSequence {
        sequence_id: u64,
        value: i64,
    },
    Checkpoint,
}

impl WalRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            KuzuError::Serialization(format!("Failed to serialize WAL record: {}", e))
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (record, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| {
                KuzuError::Serialization(format!("Failed to deserialize WAL record: {}", e))
            })?;
        Ok(record)
    }

    /// Append the length prefixed encoding to `out`
    pub fn write_frame(&self, out: &mut Vec<u8>) -> Result<()> {
        let bytes = self.to_bytes()?;
        out.write_u32::<LittleEndian>(bytes.len() as u32)?;
        out.extend_from_slice(&bytes);
        Ok(())
    }
}

/// Decode a sequence of frames; a truncated trailing frame is an error
pub fn decode_frames(bytes: &[u8]) -> Result<Vec<WalRecord>> {
    let mut reader = Cursor::new(bytes);
    let mut records = Vec::new();
    while (reader.position() as usize) < bytes.len() {
        let length = reader.read_u32::<LittleEndian>().map_err(|e| {
            KuzuError::Serialization(format!("Failed to read WAL record length: {}", e))
        })?;
        let mut buffer = vec![0u8; length as usize];
        reader.read_exact(&mut buffer).map_err(|e| {
            KuzuError::Serialization(format!("Failed to read WAL record data: {}", e))
        })?;
        records.push(WalRecord::from_bytes(&buffer)?);
    }
    Ok(records)
}

/// The database-wide log committed transactions write into
pub trait Wal: Send + Sync {
    /// Append already framed records
    fn append(&self, frames: &[u8]) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// Bytes appended so far
    fn size(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct InMemoryWal {
    buffer: Mutex<Vec<u8>>,
}

impl InMemoryWal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Result<Vec<WalRecord>> {
        decode_frames(&self.buffer.lock())
    }
}

impl Wal for InMemoryWal {
    fn append(&self, frames: &[u8]) -> Result<()> {
        self.buffer.lock().extend_from_slice(frames);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> u64 {
        self.buffer.lock().len() as u64
    }
}

/// Append-only WAL file
#[derive(Debug)]
pub struct FileWal {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    size: AtomicU64,
}

impl FileWal {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        debug!(path = %path.display(), size, "opened WAL file");
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            size: AtomicU64::new(size),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record currently in the file at `path`
    pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<WalRecord>> {
        let mut bytes = Vec::new();
        File::open(path.as_ref())?.read_to_end(&mut bytes)?;
        decode_frames(&bytes)
    }
}

impl Wal for FileWal {
    fn append(&self, frames: &[u8]) -> Result<()> {
        self.writer.lock().write_all(frames)?;
        self.size.fetch_add(frames.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct LocalWalBuffer {
    frames: Vec<u8>,
    num_records: usize,
}

/// Per-transaction buffer of WAL frames
#[derive(Debug, Default)]
pub struct LocalWal {
    buffer: Mutex<LocalWalBuffer>,
}

impl LocalWal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, record: &WalRecord) -> Result<()> {
        let mut buffer = self.buffer.lock();
        record.write_frame(&mut buffer.frames)?;
        buffer.num_records += 1;
        trace!(?record, "buffered WAL record");
        Ok(())
    }

    pub fn num_records(&self) -> usize {
        self.buffer.lock().num_records
    }

    pub fn is_empty(&self) -> bool {
        self.num_records() == 0
    }

    /// Move every buffered frame into `wal` and flush it
    pub fn flush_into(&self, wal: &dyn Wal) -> Result<()> {
        let frames = {
            let mut buffer = self.buffer.lock();
            buffer.num_records = 0;
            std::mem::take(&mut buffer.frames)
        };
        wal.append(&frames)?;
        wal.flush()
    }

    pub fn clear(&self) {
        let mut buffer = self.buffer.lock();
        buffer.frames.clear();
        buffer.num_records = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_wal_flushes_frames() {
        let local = LocalWal::new();
        local
            .log(&WalRecord::TableInsertion {
                table_id: 3,
                start_row: 0,
                num_rows: 10,
            })
            .unwrap();
        local
            .log(&WalRecord::CreateCatalogEntry {
                entry_name: "person".to_string(),
            })
            .unwrap();
        assert_eq!(local.num_records(), 2);

        let wal = InMemoryWal::new();
        local.flush_into(&wal).unwrap();
        assert!(local.is_empty());
        assert_eq!(
            wal.records().unwrap(),
            vec![
                WalRecord::TableInsertion {
                    table_id: 3,
                    start_row: 0,
                    num_rows: 10
                },
                WalRecord::CreateCatalogEntry {
                    entry_name: "person".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let mut frames = Vec::new();
        WalRecord::Checkpoint.write_frame(&mut frames).unwrap();
        WalRecord::Rollback { transaction_id: 9 }
            .write_frame(&mut frames)
            .unwrap();
        frames.pop();
        assert!(matches!(
            decode_frames(&frames),
            Err(KuzuError::Serialization(_))
        ));
    }
}
