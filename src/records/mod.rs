//! Station identification records.
//!
//! [`RecordScanner`] stitches `ID`/`BEACON` packets out of a log stream and
//! [`NodeRecordStore`] keeps the latest one per callsign on disk.

pub mod scanner;
pub mod store;

pub use scanner::{PacketType, RecordScanner, ScannedPacket, scan_records};
pub use store::{NodeRecord, NodeRecordStore, RecordPage, StoreError};
