//! Text renderers for topology snapshots.
//!
//! Every renderer emits nodes and edges in lexicographic order, so the same
//! snapshot always produces byte-identical output.

pub mod dot;
pub mod edges;
pub mod json;
pub mod mermaid;

use std::collections::BTreeSet;
use std::io;

use crate::analyzer::TopologySnapshot;

pub use json::TopologyReport;

/// Output format selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Dot,
    Mermaid,
    Edges,
    Json,
}

/// Options shared by the graph renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Use directed edge syntax.
    pub directed: bool,
    /// Also emit nodes that touch no edge.
    pub emit_isolated: bool,
}

/// Render a snapshot in the requested format.
///
/// `last_updated` is only used by the JSON report.
pub fn render(
    out: &mut dyn io::Write,
    snapshot: &TopologySnapshot,
    format: OutputFormat,
    options: RenderOptions,
    last_updated: Option<String>,
) -> io::Result<()> {
    match format {
        OutputFormat::Dot => dot::write_dot(out, snapshot, options),
        OutputFormat::Mermaid => mermaid::write_mermaid(out, snapshot, options),
        OutputFormat::Edges => edges::write_edges(out, snapshot, options),
        OutputFormat::Json => json::write_json(out, snapshot, last_updated),
    }
}

/// Nodes a graph renderer should declare.
fn emitted_nodes(snapshot: &TopologySnapshot, emit_isolated: bool) -> BTreeSet<&str> {
    let mut nodes = snapshot.connected_nodes();
    if emit_isolated {
        nodes.extend(snapshot.nodes());
    }
    nodes
}
