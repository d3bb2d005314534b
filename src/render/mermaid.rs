//! Mermaid flowchart output.

use std::io;

use super::{RenderOptions, emitted_nodes};
use crate::analyzer::TopologySnapshot;

pub fn write_mermaid(out: &mut dyn io::Write, snapshot: &TopologySnapshot, options: RenderOptions) -> io::Result<()> {
    let arrow = if options.directed { "-->" } else { "---" };
    writeln!(out, "flowchart LR")?;

    for node in emitted_nodes(snapshot, options.emit_isolated) {
        if snapshot.is_hearable(node) {
            writeln!(out, "  {}[\"{}\"]:::hearable", node_id(node), label(node))?;
        } else {
            writeln!(out, "  {}[\"{}\"]", node_id(node), label(node))?;
        }
    }

    for edge in snapshot.edges() {
        writeln!(out, "  {} {} |{}| {}", node_id(edge.from), arrow, edge.count, node_id(edge.to))?;
    }

    if snapshot.hearable_count() > 0 {
        writeln!(out, "  classDef hearable fill:#ffaa66,stroke:#ff6600,stroke-width:2px")?;
    }
    Ok(())
}

/// Mermaid ids only take word characters; `-` and anything else becomes `_`.
fn node_id(callsign: &str) -> String {
    callsign
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Mermaid labels take entity codes for quotes.
fn label(callsign: &str) -> String {
    callsign.replace('"', "#quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{ParseOptions, build_topology};
    use crate::render::test_support::{render_to_string, sample_snapshot};

    #[test]
    fn test_mermaid() {
        let snapshot = sample_snapshot();
        let chart = render_to_string(|out| write_mermaid(out, &snapshot, RenderOptions::default()));

        let expected = concat!(
            "flowchart LR\n",
            "  X[\"X\"]:::hearable\n",
            "  Y[\"Y\"]\n",
            "  Z[\"Z\"]:::hearable\n",
            "  X --- |2| Y\n",
            "  Y --- |1| Z\n",
            "  classDef hearable fill:#ffaa66,stroke:#ff6600,stroke-width:2px\n",
        );
        assert_eq!(chart, expected);
    }

    #[test]
    fn test_ssid_ids_are_sanitized() {
        let options = ParseOptions {
            keep_ssid: true,
            ..Default::default()
        };
        let snapshot = build_topology(["fm S to B via WIDE1-1* RELAY-2* ctl"], options);
        let chart = render_to_string(|out| {
            write_mermaid(
                out,
                &snapshot,
                RenderOptions {
                    directed: true,
                    emit_isolated: false,
                },
            )
        });

        assert!(chart.contains("  WIDE1_1[\"WIDE1-1\"]\n"));
        assert!(chart.contains("  RELAY_2[\"RELAY-2\"]:::hearable\n"));
        assert!(chart.contains("  WIDE1_1 --> |1| RELAY_2\n"));
    }

    #[test]
    fn test_quoted_labels_are_escaped() {
        let snapshot = build_topology(["fm S to B via N0\"X* Y ctl"], ParseOptions::default());
        let chart = render_to_string(|out| write_mermaid(out, &snapshot, RenderOptions::default()));

        assert!(chart.contains("  N0_X[\"N0#quot;X\"]:::hearable\n"));
        assert!(chart.contains("  N0_X --- |1| Y\n"));
    }

    #[test]
    fn test_no_class_without_hearable_nodes() {
        let chart = render_to_string(|out| write_mermaid(out, &TopologySnapshot::default(), RenderOptions::default()));
        assert_eq!(chart, "flowchart LR\n");
    }
}
