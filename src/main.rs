//! ax25-topology
//!
//! Reads AX.25 `listen` logs and prints the digipeater hearing graph as DOT,
//! Mermaid, a tab-separated edge list or a JSON report. Stations heard
//! directly are colored apart from relay-only stations.
//!
//! ```text
//! ax25-topology -i listen.log --directed > graph.dot
//! dot -Tpng graph.dot -o graph.png
//! ```
//!
//! With `--records` the same pass also tracks station identification and
//! beacon packets in a JSON record store that survives between runs.

use anyhow::{Context, bail};
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info};
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use ax25_topology::analyzer::{DecodeMode, LogSource, ParseOptions, PassSettings, TopologySnapshot, follow_file, run_pass};
use ax25_topology::config::GrapherConfig;
use ax25_topology::records::NodeRecordStore;
use ax25_topology::render::{OutputFormat, RenderOptions, render};

#[derive(Parser, Debug)]
#[command(name = "ax25-topology")]
#[command(author, version, about = "Build a digipeater hearing graph from AX.25 listen logs", long_about = None)]
struct Cli {
    /// Log file to read (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Dot)]
    format: OutputFormat,

    /// Emit a directed graph
    #[arg(long)]
    directed: bool,

    /// Keep CALL-SSID instead of folding onto the base callsign
    #[arg(long)]
    keep_ssid: bool,

    /// Add SRC -> first relayed hop edges
    #[arg(long)]
    include_origins: bool,

    /// Show every callsign seen, even without edges
    #[arg(long)]
    emit_isolated: bool,

    /// Node record store (JSON) for ID/BEACON tracking
    #[arg(long)]
    records: Option<PathBuf>,

    /// Print a page of stored node records instead of the graph
    #[arg(long)]
    list_records: bool,

    /// Page number for --list-records, starting at 0
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Records per page for --list-records
    #[arg(long)]
    page_size: Option<usize>,

    /// Re-parse the input file whenever it changes
    #[arg(long, requires = "input")]
    follow: bool,

    /// Poll interval for --follow in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// How invalid UTF-8 in the log is handled
    #[arg(long, value_enum)]
    decode: Option<DecodeMode>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pass_settings(&self, config: &GrapherConfig) -> PassSettings {
        PassSettings {
            options: ParseOptions {
                keep_ssid: self.keep_ssid || config.keep_ssid,
                include_origins: self.include_origins || config.include_origins,
            },
            decode: self.decode.unwrap_or(config.decode),
        }
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            directed: self.directed,
            emit_isolated: self.emit_isolated,
        }
    }

    fn records_path(&self, config: &GrapherConfig) -> Option<PathBuf> {
        self.records.clone().or_else(|| config.records.clone())
    }
}

fn init_logging(verbose: bool) {
    let crate_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter(Some("ax25_topology"), crate_level)
        .parse_default_env()
        .init();
}

fn write_snapshot(snapshot: &TopologySnapshot, format: OutputFormat, options: RenderOptions) -> io::Result<()> {
    let last_updated = (format == OutputFormat::Json).then(|| chrono::Local::now().to_rfc3339());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&mut out, snapshot, format, options, last_updated)?;
    out.flush()
}

fn list_records(store: &NodeRecordStore, page: usize, page_size: usize) -> anyhow::Result<()> {
    let page = store.page(page.saturating_mul(page_size), page_size);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &page).context("Failed to write records")?;
    writeln!(out)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => GrapherConfig::load(path).map_err(anyhow::Error::msg)?,
        None => GrapherConfig::default(),
    };
    let settings = cli.pass_settings(&config);
    let mut store = cli.records_path(&config).map(NodeRecordStore::load);

    if cli.list_records && store.is_none() {
        bail!("--list-records needs a record store (--records or `records` in the config file)");
    }

    if cli.follow {
        let Some(path) = cli.input.clone() else {
            bail!("--follow needs --input");
        };
        info!("Following {}", path.display());

        let poll = Duration::from_millis(cli.poll_ms.unwrap_or_else(|| config.poll_ms()));
        let format = cli.format;
        let options = cli.render_options();
        follow_file(&path, &settings, store.as_mut(), poll, |snapshot| {
            match write_snapshot(snapshot, format, options) {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    log::warn!("Stopping: failed to write output: {}", e);
                    ControlFlow::Break(())
                }
            }
        });
        return Ok(());
    }

    // listing alone never touches stdin
    if cli.list_records && cli.input.is_none() {
        if let Some(store) = &store {
            list_records(store, cli.page, cli.page_size.unwrap_or_else(|| config.page_size()))?;
        }
        return Ok(());
    }

    let source = LogSource::from_arg(cli.input.clone());
    let outcome = run_pass(&source, &settings, store.as_mut())
        .with_context(|| format!("Failed to read {}", source.describe()))?;
    info!(
        "Parsed {} lines: {} nodes, {} edges, {} hearable, {} records updated",
        outcome.lines,
        outcome.snapshot.node_count(),
        outcome.snapshot.edge_count(),
        outcome.snapshot.hearable_count(),
        outcome.records_updated
    );

    if cli.list_records {
        if let Some(store) = &store {
            list_records(store, cli.page, cli.page_size.unwrap_or_else(|| config.page_size()))?;
        }
    } else {
        write_snapshot(&outcome.snapshot, cli.format, cli.render_options()).context("Failed to write output")?;
    }

    Ok(())
}
