//! Log analysis: line parsing, topology building and pass orchestration.
//!
//! Provides functionality for:
//! - Extracting source and via path from free-form `listen` log lines
//! - Folding a log into an immutable [`TopologySnapshot`]
//! - One-shot passes over a file or stdin, and followed files

pub mod log_loader;
pub mod log_parser;
pub mod task;
pub mod topology;
pub mod types;

pub use log_loader::{LogLoader, LogSource};
pub use task::{PassOutcome, PassSettings, follow_file, run_pass};
pub use topology::{Edge, TopologyBuilder, TopologySnapshot, build_topology};
pub use types::{DecodeMode, ParseOptions};
