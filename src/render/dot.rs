//! Graphviz DOT output.

use std::io;

use super::{RenderOptions, emitted_nodes};
use crate::analyzer::TopologySnapshot;

/// Fill color for stations heard directly.
pub const HEARABLE_FILL: &str = "#ffaa66";
/// Fill color for relay-only stations.
pub const RELAY_FILL: &str = "#e6f2ff";

pub fn write_dot(out: &mut dyn io::Write, snapshot: &TopologySnapshot, options: RenderOptions) -> io::Result<()> {
    let (graph_type, connector) = if options.directed { ("digraph", "->") } else { ("graph", "--") };

    writeln!(out, "{} G {{", graph_type)?;
    writeln!(out, "  graph [overlap=false, splines=true];")?;
    writeln!(out, "  node [shape=ellipse, style=filled, fillcolor=\"{}\"];", RELAY_FILL)?;

    for node in emitted_nodes(snapshot, options.emit_isolated) {
        if snapshot.is_hearable(node) {
            writeln!(out, "  \"{}\" [fillcolor=\"{}\"];", quote(node), HEARABLE_FILL)?;
        } else {
            writeln!(out, "  \"{}\";", quote(node))?;
        }
    }

    for edge in snapshot.edges() {
        writeln!(
            out,
            "  \"{}\" {} \"{}\" [label=\"{}\"];",
            quote(edge.from),
            connector,
            quote(edge.to),
            edge.count
        )?;
    }

    writeln!(out, "}}")
}

/// Escape a node name for use inside a DOT double-quoted string.
fn quote(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
