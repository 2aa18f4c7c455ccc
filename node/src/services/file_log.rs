// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! File-Backed Append Log
//!
//! Durable devnet log. Every append is written and fsync'd before the
//! receipt is returned; the in-memory index is rebuilt on open.
//!
//! # File Format
//! ```text
//! [Header: 16 bytes][Frame][Frame][Frame]...
//! ```
//!
//! Header:
//! - version: u32 (1)
//! - max_message_bytes: u32
//! - reserved: u64 (0)
//!
//! Frame:
//! - len: u32 (payload length)
//! - crc32: u32 (of payload)
//! - payload: bincode `LogEntry`
//!
//! A torn final frame (crash mid-write) is cut off on open. A checksum
//! failure anywhere else is corruption and refuses to open.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use anchor_kernel::ConsensusTimestamp;

use super::memory::{check_message_size, lock, StoredMessage, TopicStore};
use super::{AppendLog, AppendReceipt};
use crate::errors::AnchorError;

const HEADER_LEN: usize = 16;
const FRAME_PREFIX_LEN: usize = 8;
const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum FileLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid header")]
    InvalidHeader,

    #[error("Corrupted frame at offset {0}")]
    Corrupted(u64),
}

pub type Result<T> = std::result::Result<T, FileLogError>;

impl From<FileLogError> for AnchorError {
    fn from(e: FileLogError) -> Self {
        AnchorError::AppendFailure(e.to_string())
    }
}

struct FileLogHeader {
    version: u32,
    max_message_bytes: u32,
    reserved: u64,
}

impl FileLogHeader {
    fn new(max_message_bytes: usize) -> Self {
        Self {
            version: FORMAT_VERSION,
            max_message_bytes: max_message_bytes.min(u32::MAX as usize) as u32,
            reserved: 0,
        }
    }

    fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.version.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.max_message_bytes.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.reserved.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        let word = |range: std::ops::Range<usize>| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[range]);
            u32::from_le_bytes(buf)
        };
        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&bytes[8..16]);
        Self {
            version: word(0..4),
            max_message_bytes: word(4..8),
            reserved: u64::from_le_bytes(reserved),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION || self.reserved != 0 {
            return Err(FileLogError::InvalidHeader);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogEntry {
    topic_id: String,
    sequence_number: u64,
    timestamp: ConsensusTimestamp,
    message: Vec<u8>,
}

fn encode_frame(entry: &LogEntry) -> Result<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(entry, bincode::config::standard())
        .map_err(|e| FileLogError::Serialization(e.to_string()))?;
    let len = u32::try_from(payload.len())
        .map_err(|_| FileLogError::Serialization("entry too large".into()))?;

    let mut frame = Vec::with_capacity(FRAME_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode every frame after the header. Returns the entries and the offset
/// of the end of the last intact frame.
fn scan_frames(body: &[u8]) -> Result<(Vec<LogEntry>, usize)> {
    let mut entries = Vec::new();
    let mut offset = 0usize;

    while offset < body.len() {
        let remaining = body.len() - offset;
        if remaining < FRAME_PREFIX_LEN {
            break;
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&body[offset..offset + 4]);
        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&body[offset + 4..offset + 8]);
        let len = u32::from_le_bytes(len_bytes) as usize;

        let start = offset + FRAME_PREFIX_LEN;
        if body.len() - start < len {
            break;
        }
        let payload = &body[start..start + len];
        let frame_end = start + len;

        if crc32fast::hash(payload) != u32::from_le_bytes(crc_bytes) {
            // Only the tail may be torn.
            if frame_end == body.len() {
                break;
            }
            return Err(FileLogError::Corrupted((HEADER_LEN + offset) as u64));
        }

        let (entry, _) = bincode::serde::decode_from_slice::<LogEntry, _>(payload, bincode::config::standard())
            .map_err(|e| FileLogError::Serialization(e.to_string()))?;
        entries.push(entry);
        offset = frame_end;
    }

    Ok((entries, offset))
}

struct Inner {
    file: BufWriter<File>,
    store: TopicStore,
}

pub struct FileLog {
    path: PathBuf,
    max_message_bytes: usize,
    inner: Mutex<Inner>,
}

impl FileLog {
    /// Open or create a log file.
    ///
    /// An existing file is validated and replayed into the index; new
    /// appends continue after the last intact frame.
    pub fn open(path: impl AsRef<Path>, max_message_bytes: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file_exists = path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;

        let mut store = TopicStore::default();

        if file_exists {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            if contents.len() < HEADER_LEN {
                return Err(FileLogError::InvalidHeader);
            }
            let mut header_bytes = [0u8; HEADER_LEN];
            header_bytes.copy_from_slice(&contents[..HEADER_LEN]);
            FileLogHeader::from_bytes(&header_bytes).validate()?;

            let body = &contents[HEADER_LEN..];
            let (entries, valid_len) = scan_frames(body)?;
            if valid_len < body.len() {
                tracing::warn!(
                    path = %path.display(),
                    dropped = body.len() - valid_len,
                    "truncating torn tail of log file"
                );
                file.set_len((HEADER_LEN + valid_len) as u64)?;
                file.sync_all()?;
            }

            let count = entries.len();
            for entry in entries {
                store.insert(
                    &entry.topic_id,
                    StoredMessage {
                        sequence_number: entry.sequence_number,
                        timestamp: entry.timestamp,
                        message: entry.message,
                    },
                );
            }
            tracing::info!(path = %path.display(), messages = count, "log file replayed");
        } else {
            file.write_all(&FileLogHeader::new(max_message_bytes).to_bytes())?;
            file.sync_all()?; // fsync header
        }

        file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path,
            max_message_bytes,
            inner: Mutex::new(Inner { file: BufWriter::new(file), store }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn message_count(&self) -> usize {
        self.inner.lock().map(|i| i.store.len()).unwrap_or(0)
    }
}

impl AppendLog for FileLog {
    fn append(&self, topic_id: &str, message: &[u8]) -> std::result::Result<AppendReceipt, AnchorError> {
        check_message_size(message, self.max_message_bytes)?;

        let mut inner = lock(&self.inner)?;
        let receipt = AppendReceipt {
            sequence_number: inner.store.next_sequence(topic_id),
            timestamp: inner.store.next_timestamp(),
        };
        let entry = LogEntry {
            topic_id: topic_id.to_string(),
            sequence_number: receipt.sequence_number,
            timestamp: receipt.timestamp,
            message: message.to_vec(),
        };

        // Durable before visible.
        let frame = encode_frame(&entry)?;
        inner.file.write_all(&frame).map_err(FileLogError::from)?;
        inner.file.flush().map_err(FileLogError::from)?;
        inner.file.get_ref().sync_all().map_err(FileLogError::from)?;

        inner.store.insert(
            topic_id,
            StoredMessage {
                sequence_number: entry.sequence_number,
                timestamp: entry.timestamp,
                message: entry.message,
            },
        );
        Ok(receipt)
    }

    fn read_at(
        &self,
        topic_id: &str,
        timestamp: ConsensusTimestamp,
    ) -> std::result::Result<Option<Vec<u8>>, AnchorError> {
        let inner = lock(&self.inner)?;
        Ok(inner.store.get(topic_id, timestamp).map(|m| m.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anchor.log");

        let (a, b) = {
            let log = FileLog::open(&path, 1024).unwrap();
            let a = log.append("0.0.6006", br#"{"a":1}"#).unwrap();
            let b = log.append("0.0.6006", br#"{"b":2}"#).unwrap();
            (a, b)
        };

        let log = FileLog::open(&path, 1024).unwrap();
        assert_eq!(log.message_count(), 2);
        assert_eq!(log.read_at("0.0.6006", a.timestamp).unwrap(), Some(br#"{"a":1}"#.to_vec()));
        assert_eq!(log.read_at("0.0.6006", b.timestamp).unwrap(), Some(br#"{"b":2}"#.to_vec()));

        // Sequence and clock continue after the replayed entries.
        let c = log.append("0.0.6006", b"c").unwrap();
        assert_eq!(c.sequence_number, 3);
        assert!(c.timestamp > b.timestamp);
    }

    #[test]
    fn test_torn_tail_is_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anchor.log");
        let first = {
            let log = FileLog::open(&path, 1024).unwrap();
            log.append("0.0.1", b"kept").unwrap()
        };

        // Simulate a crash halfway through a frame.
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&[42, 0, 0, 0, 1, 2]).unwrap();
        drop(f);

        let log = FileLog::open(&path, 1024).unwrap();
        assert_eq!(log.message_count(), 1);
        assert_eq!(log.read_at("0.0.1", first.timestamp).unwrap(), Some(b"kept".to_vec()));
        let next = log.append("0.0.1", b"after").unwrap();
        drop(log);

        let reopened = FileLog::open(&path, 1024).unwrap();
        assert_eq!(reopened.read_at("0.0.1", next.timestamp).unwrap(), Some(b"after".to_vec()));
    }

    #[test]
    fn test_corruption_in_the_middle_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anchor.log");
        {
            let log = FileLog::open(&path, 1024).unwrap();
            log.append("0.0.1", b"first message").unwrap();
            log.append("0.0.1", b"second message").unwrap();
        }

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[HEADER_LEN + FRAME_PREFIX_LEN + 2] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(FileLog::open(&path, 1024), Err(FileLogError::Corrupted(_))));
    }

    #[test]
    fn test_bad_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anchor.log");
        std::fs::write(&path, [9u8; HEADER_LEN]).unwrap();
        assert!(matches!(FileLog::open(&path, 1024), Err(FileLogError::InvalidHeader)));
    }

    #[test]
    fn test_oversize_message_is_not_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anchor.log");
        let log = FileLog::open(&path, 8).unwrap();
        assert!(matches!(log.append("0.0.1", b"123456789"), Err(AnchorError::AppendFailure(_))));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), HEADER_LEN as u64);
    }
}
