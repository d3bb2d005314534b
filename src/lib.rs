//! Digipeater topology and station records from AX.25 `listen` logs.
//!
//! - [`analyzer`] turns log lines into an immutable [`analyzer::TopologySnapshot`]
//! - [`records`] stitches ID/BEACON packets into a persisted per-callsign table
//! - [`render`] prints snapshots as DOT, Mermaid, TSV or JSON
//! - [`config`] holds the optional TOML defaults

pub mod analyzer;
pub mod config;
pub mod records;
pub mod render;
