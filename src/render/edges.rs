//! Tab-separated edge list.

use std::io;

use super::RenderOptions;
use crate::analyzer::TopologySnapshot;

/// Write `from\tto\tcount` rows; isolated nodes get a `node\t\t0` row when requested.
pub fn write_edges(out: &mut dyn io::Write, snapshot: &TopologySnapshot, options: RenderOptions) -> io::Result<()> {
    writeln!(out, "from\tto\tcount")?;
    for edge in snapshot.edges() {
        writeln!(out, "{}\t{}\t{}", edge.from, edge.to, edge.count)?;
    }

    if options.emit_isolated {
        for node in snapshot.isolated_nodes() {
            writeln!(out, "{}\t\t0", node)?;
        }
    }
    Ok(())
}
