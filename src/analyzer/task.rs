//! Parse pass driver.
//!
//! One pass streams every line of the input through the topology builder
//! and, when a record store is attached, through the identification scanner.
//! Holding `&mut NodeRecordStore` for the whole pass is what keeps the
//! store's load, mutate, save cycle single-writer.

use std::io;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::Duration;

use crate::records::{NodeRecordStore, RecordScanner};

use super::log_loader::{FileStamp, LogLoader, LogSource};
use super::topology::{TopologyBuilder, TopologySnapshot};
use super::types::{DecodeMode, ParseOptions};

/// Settings that hold for one whole pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassSettings {
    pub options: ParseOptions,
    pub decode: DecodeMode,
}

/// Result of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub snapshot: TopologySnapshot,
    pub lines: usize,
    /// Identification packets applied to the record store.
    pub records_updated: usize,
}

/// Run a full pass over a log source.
///
/// # Returns
///
/// `Err` only if the source cannot be opened. Records found during the pass
/// are applied to `store` and saved once the input is exhausted.
pub fn run_pass(
    source: &LogSource,
    settings: &PassSettings,
    store: Option<&mut NodeRecordStore>,
) -> Result<PassOutcome, io::Error> {
    let loader = LogLoader::open(source, settings.decode)?;
    log::debug!("Parsing {}", source.describe());
    Ok(process_lines(loader, settings.options, store))
}

/// Run a pass over already decoded lines.
pub fn process_lines<I, S>(lines: I, options: ParseOptions, mut store: Option<&mut NodeRecordStore>) -> PassOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = TopologyBuilder::new(options);
    let mut scanner = store.is_some().then(|| RecordScanner::new(options.keep_ssid));
    let mut records_updated = 0;

    for line in lines {
        let line = line.as_ref();
        builder.push_line(line);

        if let (Some(scanner), Some(store)) = (scanner.as_mut(), store.as_deref_mut()) {
            if let Some(packet) = scanner.handle_line(line) {
                store.apply(packet);
                records_updated += 1;
            }
        }
    }

    if let (Some(scanner), Some(store)) = (scanner.as_mut(), store) {
        if let Some(packet) = scanner.finish() {
            store.apply(packet);
            records_updated += 1;
        }
        store.save();
    }

    PassOutcome {
        lines: builder.lines_seen(),
        snapshot: builder.finish(),
        records_updated,
    }
}

/// Re-run a full pass every time `path` changes.
///
/// The first pass runs immediately. A pass that cannot open the file
/// reports an empty topology instead of failing. `on_update` is called
/// after every pass and stops the loop by returning `ControlFlow::Break`.
pub fn follow_file<F>(
    path: &Path,
    settings: &PassSettings,
    mut store: Option<&mut NodeRecordStore>,
    poll_interval: Duration,
    mut on_update: F,
) where
    F: FnMut(&TopologySnapshot) -> ControlFlow<()>,
{
    let source = LogSource::File(path.to_path_buf());
    let mut last_stamp: Option<Option<FileStamp>> = None;

    loop {
        let stamp = FileStamp::probe(path);
        if last_stamp != Some(stamp) {
            last_stamp = Some(stamp);

            let snapshot = match run_pass(&source, settings, store.as_deref_mut()) {
                Ok(outcome) => {
                    log::info!(
                        "Parsed {} lines from {}: {} nodes, {} edges, {} records updated",
                        outcome.lines,
                        path.display(),
                        outcome.snapshot.node_count(),
                        outcome.snapshot.edge_count(),
                        outcome.records_updated
                    );
                    outcome.snapshot
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}; using an empty topology", path.display(), e);
                    TopologySnapshot::default()
                }
            };

            if on_update(&snapshot).is_break() {
                return;
            }
        }

        std::thread::sleep(poll_interval);
    }
}
