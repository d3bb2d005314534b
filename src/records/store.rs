//! Durable per-callsign identification records.
//!
//! The table lives in a single JSON document keyed by callsign. It is read
//! once when the store is opened and rewritten in full by [`NodeRecordStore::save`].
//! The store does no locking of its own: whoever owns it must run the
//! load, mutate, save cycle for one pass at a time.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::scanner::{PacketType, ScannedPacket};

/// Error type for record table I/O.
#[derive(Debug)]
pub enum StoreError {
    FileReadError(String),
    ParseError(String),
    WriteError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::FileReadError(msg) => write!(f, "Failed to read record store: {}", msg),
            StoreError::ParseError(msg) => write!(f, "Failed to parse record store: {}", msg),
            StoreError::WriteError(msg) => write!(f, "Failed to write record store: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Latest identification seen from one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub callsign: String,
    pub latest_payload: String,
    /// `HH:MM:SS[.frac]` or `unknown`.
    pub last_timestamp: String,
    pub packet_type: PacketType,
    /// Timestamp of the first detection, never overwritten.
    pub first_seen: String,
}

/// One page of records, newest first.
#[derive(Debug, Serialize)]
pub struct RecordPage<'a> {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub records: Vec<&'a NodeRecord>,
}

/// Keyed record table bound to its backing file.
#[derive(Debug)]
pub struct NodeRecordStore {
    path: PathBuf,
    records: BTreeMap<String, NodeRecord>,
}

impl NodeRecordStore {
    /// Open the store at `path`, loading whatever table it holds.
    ///
    /// A missing or unreadable file yields an empty table; the cause is
    /// logged and never returned.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = if path.exists() {
            match read_table(&path) {
                Ok(records) => {
                    log::info!("Loaded {} node records from {}", records.len(), path.display());
                    records
                }
                Err(e) => {
                    log::warn!("{}; starting with an empty record table", e);
                    BTreeMap::new()
                }
            }
        } else {
            log::info!("No record store at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, callsign: &str) -> Option<&NodeRecord> {
        self.records.get(callsign)
    }

    /// Insert or update the record for a scanned packet.
    ///
    /// Returns `true` if the callsign was new.
    pub fn apply(&mut self, packet: ScannedPacket) -> bool {
        match self.records.get_mut(&packet.callsign) {
            Some(record) => {
                record.latest_payload = packet.payload;
                record.last_timestamp = packet.timestamp;
                record.packet_type = packet.packet_type;
                false
            }
            None => {
                log::debug!("New {} record for {}", packet.packet_type, packet.callsign);
                let record = NodeRecord {
                    callsign: packet.callsign.clone(),
                    latest_payload: packet.payload,
                    first_seen: packet.timestamp.clone(),
                    last_timestamp: packet.timestamp,
                    packet_type: packet.packet_type,
                };
                self.records.insert(packet.callsign, record);
                true
            }
        }
    }

    /// Write the full table, replacing the file atomically.
    pub fn try_save(&self) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(&self.records)
            .context("Failed to serialize records")
            .map_err(|e| StoreError::WriteError(format!("{:#}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))
                .map_err(|e| StoreError::WriteError(format!("{:#}", e)))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data)
            .with_context(|| format!("Failed to write {}", tmp.display()))
            .map_err(|e| StoreError::WriteError(format!("{:#}", e)))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))
            .map_err(|e| StoreError::WriteError(format!("{:#}", e)))?;

        Ok(())
    }

    /// Write the full table; a failure is logged and otherwise ignored.
    pub fn save(&self) {
        match self.try_save() {
            Ok(()) => log::debug!("Saved {} node records to {}", self.records.len(), self.path.display()),
            Err(e) => log::warn!("{}", e),
        }
    }

    /// Records ordered by descending `last_timestamp`.
    ///
    /// Timestamps compare as plain strings, which is only meaningful within
    /// a single day. Ties are ordered by callsign.
    pub fn page(&self, offset: usize, limit: usize) -> RecordPage<'_> {
        let mut sorted: Vec<&NodeRecord> = self.records.values().collect();
        sorted.sort_by(|a, b| {
            b.last_timestamp
                .cmp(&a.last_timestamp)
                .then_with(|| a.callsign.cmp(&b.callsign))
        });

        RecordPage {
            total: sorted.len(),
            offset,
            limit,
            records: sorted.into_iter().skip(offset).take(limit).collect(),
        }
    }
}

fn read_table(path: &Path) -> Result<BTreeMap<String, NodeRecord>, StoreError> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
        .map_err(|e| StoreError::FileReadError(format!("{:#}", e)))?;

    serde_json::from_str(&data)
        .context("Invalid JSON format")
        .map_err(|e| StoreError::ParseError(format!("{:#}", e)))
}
