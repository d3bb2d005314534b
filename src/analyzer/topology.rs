//! Fold parsed log lines into a digipeater network snapshot.
//!
//! Hearability rules, per line:
//! - A source heard without any via path was received directly.
//! - A source whose path still holds an unrelayed hop was received before
//!   any digipeater repeated it, so it is hearable too.
//! - The rightmost relayed hop (`*`) is the digipeater we actually heard.
//!
//! Every relayed hop followed by another hop yields an edge `hop -> next`.

use std::collections::{BTreeMap, BTreeSet};

use super::log_parser::{extract_route, normalize_callsign, tokenize_path};
use super::types::ParseOptions;

/// A directed, weighted link between two stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<'a> {
    pub from: &'a str,
    pub to: &'a str,
    /// Number of transmissions that contributed this hop.
    pub count: u64,
}

impl Edge<'_> {
    /// Stable identifier derived from the endpoints.
    pub fn id(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }
}

/// Immutable result of one full pass over a log.
///
/// All collections are ordered, so two snapshots built from the same input
/// compare equal and render identically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopologySnapshot {
    node_counts: BTreeMap<String, u64>,
    edges: BTreeMap<(String, String), u64>,
    hearable: BTreeSet<String>,
}

impl TopologySnapshot {
    /// All callsigns seen as a source or path hop, sorted.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.node_counts.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.node_counts.len()
    }

    /// Number of times the callsign was sighted, 0 if unknown.
    pub fn packet_count(&self, callsign: &str) -> u64 {
        self.node_counts.get(callsign).copied().unwrap_or(0)
    }

    /// Edges ordered by `(from, to)`.
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> {
        self.edges.iter().map(|((from, to), count)| Edge {
            from,
            to,
            count: *count,
        })
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Occurrence count of `from -> to`, 0 if the edge does not exist.
    pub fn edge_weight(&self, from: &str, to: &str) -> u64 {
        self.edges.get(&(from.to_string(), to.to_string())).copied().unwrap_or(0)
    }

    pub fn hearable_nodes(&self) -> impl Iterator<Item = &str> {
        self.hearable.iter().map(String::as_str)
    }

    pub fn hearable_count(&self) -> usize {
        self.hearable.len()
    }

    pub fn is_hearable(&self, callsign: &str) -> bool {
        self.hearable.contains(callsign)
    }

    /// Callsigns that touch at least one edge.
    pub fn connected_nodes(&self) -> BTreeSet<&str> {
        self.edges
            .keys()
            .flat_map(|(from, to)| [from.as_str(), to.as_str()])
            .collect()
    }

    /// Callsigns that touch no edge at all.
    pub fn isolated_nodes(&self) -> Vec<&str> {
        let connected = self.connected_nodes();
        self.nodes().filter(|node| !connected.contains(node)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.node_counts.is_empty()
    }
}

/// Incremental topology builder.
///
/// Feed lines with [`TopologyBuilder::push_line`] and call
/// [`TopologyBuilder::finish`] once the input is exhausted.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    options: ParseOptions,
    snapshot: TopologySnapshot,
    lines_seen: usize,
    routed_lines: usize,
}

impl TopologyBuilder {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Process a single decoded log line.
    pub fn push_line(&mut self, line: &str) {
        self.lines_seen += 1;
        let keep_ssid = self.options.keep_ssid;
        let route = extract_route(line);

        let source = route
            .source
            .map(|raw| normalize_callsign(raw, keep_ssid))
            .filter(|call| !call.is_empty());

        if source.is_some() || route.via.is_some() {
            self.routed_lines += 1;
        }
        if let Some(source) = source {
            self.sight(source);
        }

        let Some(via) = route.via else {
            if let Some(source) = source {
                self.mark_hearable(source);
            }
            return;
        };

        let hops = tokenize_path(via);
        let calls: Vec<String> = hops.iter().map(|hop| hop.callsign(keep_ssid)).collect();
        for call in &calls {
            self.sight(call);
        }

        // an unrelayed hop means the original transmission reached us
        if let Some(source) = source {
            if hops.iter().any(|hop| !hop.is_relayed()) {
                self.mark_hearable(source);
            }
        }

        if let Some(last) = hops.iter().rposition(|hop| hop.is_relayed()) {
            self.mark_hearable(&calls[last]);
        }

        for (idx, hop) in hops.iter().enumerate() {
            if hop.is_relayed() && idx + 1 < hops.len() {
                self.add_edge(&calls[idx], &calls[idx + 1]);
            }
        }

        if self.options.include_origins {
            if let (Some(source), Some(first)) = (source, hops.iter().position(|hop| hop.is_relayed())) {
                self.add_edge(source, &calls[first]);
            }
        }
    }

    /// Number of lines pushed so far.
    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    /// Number of lines that carried a source or a via path.
    pub fn routed_lines(&self) -> usize {
        self.routed_lines
    }

    pub fn finish(self) -> TopologySnapshot {
        log::debug!(
            "Topology pass done: {} lines, {} routed, {} nodes, {} edges, {} hearable",
            self.lines_seen,
            self.routed_lines,
            self.snapshot.node_count(),
            self.snapshot.edge_count(),
            self.snapshot.hearable_count()
        );
        self.snapshot
    }

    fn sight(&mut self, callsign: &str) {
        if callsign.is_empty() {
            return;
        }
        *self.snapshot.node_counts.entry(callsign.to_string()).or_insert(0) += 1;
    }

    fn mark_hearable(&mut self, callsign: &str) {
        if !callsign.is_empty() {
            self.snapshot.hearable.insert(callsign.to_string());
        }
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if from.is_empty() || to.is_empty() || from == to {
            return;
        }
        *self.snapshot.edges.entry((from.to_string(), to.to_string())).or_insert(0) += 1;
    }
}

/// Build a snapshot from a complete sequence of lines.
pub fn build_topology<I, S>(lines: I, options: ParseOptions) -> TopologySnapshot
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = TopologyBuilder::new(options);
    for line in lines {
        builder.push_line(line.as_ref());
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(lines: &[&str]) -> TopologySnapshot {
        build_topology(lines.iter().copied(), ParseOptions::default())
    }

    fn hearable(snapshot: &TopologySnapshot) -> Vec<&str> {
        snapshot.hearable_nodes().collect()
    }

    #[test]
    fn test_relayed_path() {
        let snapshot = build(&["12:00:01 ax0: fm N0CALL to APRS via DIGI1*,DIGI2 ctl UI^ len 10"]);

        assert_eq!(snapshot.nodes().collect::<Vec<_>>(), vec!["DIGI1", "DIGI2", "N0CALL"]);
        assert_eq!(snapshot.edge_count(), 1);
        assert_eq!(snapshot.edge_weight("DIGI1", "DIGI2"), 1);
        assert_eq!(hearable(&snapshot), vec!["DIGI1", "N0CALL"]);
    }

    #[test]
    fn test_direct_source_is_hearable() {
        let snapshot = build(&["fm N0CALL-9 to CQ ctl UI^ len 4"]);
        assert_eq!(hearable(&snapshot), vec!["N0CALL"]);
        assert_eq!(snapshot.packet_count("N0CALL"), 1);
        assert_eq!(snapshot.edge_count(), 0);
    }

    #[test]
    fn test_fully_relayed_source_is_not_hearable() {
        let snapshot = build(&["fm FAR to APRS via HOP1* HOP2* ctl UI"]);

        assert_eq!(hearable(&snapshot), vec!["HOP2"]);
        assert_eq!(snapshot.edge_weight("HOP1", "HOP2"), 1);
        // HOP2 is last, nothing follows it
        assert_eq!(snapshot.edge_count(), 1);
        assert!(!snapshot.is_hearable("FAR"));
    }

    #[test]
    fn test_counts_accumulate() {
        let snapshot = build(&[
            "fm A to B via X* Y ctl",
            "fm C to B via X* Y ctl",
            "fm A to B via X* Z* ctl",
        ]);

        assert_eq!(snapshot.edge_weight("X", "Y"), 2);
        assert_eq!(snapshot.edge_weight("X", "Z"), 1);
        assert_eq!(snapshot.packet_count("A"), 2);
        assert_eq!(snapshot.packet_count("X"), 3);
        assert_eq!(snapshot.packet_count("Y"), 2);
        assert_eq!(hearable(&snapshot), vec!["A", "C", "X", "Z"]);
    }

    #[test]
    fn test_idempotent_and_order_independent() {
        let lines = [
            "fm A to B via X* Y ctl",
            "fm C to B via Y* X ctl",
            "noise line",
            "fm D to B via X* Y* W ctl",
        ];
        let first = build(&lines);
        let second = build(&lines);
        assert_eq!(first, second);

        let mut reversed = lines;
        reversed.reverse();
        let backwards = build(&reversed);
        assert_eq!(
            first.edges().collect::<Vec<_>>(),
            backwards.edges().collect::<Vec<_>>()
        );
        assert_eq!(first.edge_weight("X", "Y"), 2);
    }

    #[test]
    fn test_hex_dump_lines_contribute_nothing() {
        let snapshot = build(&["ax0: 0000 fm A to B via X* Y ctl"]);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.edge_count(), 0);
        assert_eq!(snapshot.hearable_count(), 0);
    }

    #[test]
    fn test_empty_via_keeps_source_undetermined() {
        let snapshot = build(&["fm A to B via ctl UI"]);
        assert_eq!(snapshot.nodes().collect::<Vec<_>>(), vec!["A"]);
        assert!(!snapshot.is_hearable("A"));
        assert_eq!(snapshot.edge_count(), 0);
    }

    #[test]
    fn test_ssid_folding() {
        let lines = ["fm N0CALL-5 to APRS via WIDE1-1* WIDE1-2 ctl"];

        let folded = build(&lines);
        assert_eq!(folded.nodes().collect::<Vec<_>>(), vec!["N0CALL", "WIDE1"]);
        // WIDE1-1 -> WIDE1-2 folds onto a self edge and is dropped
        assert_eq!(folded.edge_count(), 0);

        let kept = build_topology(
            lines,
            ParseOptions {
                keep_ssid: true,
                ..Default::default()
            },
        );
        assert_eq!(kept.edge_weight("WIDE1-1", "WIDE1-2"), 1);
        assert_eq!(hearable(&kept), vec!["N0CALL-5", "WIDE1-1"]);
    }

    #[test]
    fn test_include_origins() {
        let lines = ["fm SRC to APRS via A B* C ctl"];
        let options = ParseOptions {
            include_origins: true,
            ..Default::default()
        };

        let snapshot = build_topology(lines, options);
        assert_eq!(snapshot.edge_weight("SRC", "B"), 1);
        assert_eq!(snapshot.edge_weight("B", "C"), 1);

        let without = build(&lines);
        assert_eq!(without.edge_weight("SRC", "B"), 0);
    }

    #[test]
    fn test_isolated_nodes() {
        let snapshot = build(&["fm A to B via X* Y ctl", "fm LONE to CQ"]);
        assert_eq!(snapshot.isolated_nodes(), vec!["A", "LONE"]);
        assert_eq!(snapshot.connected_nodes().len(), 2);
    }

    #[test]
    fn test_builder_counters() {
        let mut builder = TopologyBuilder::new(ParseOptions::default());
        builder.push_line("fm A to B");
        builder.push_line("garbage");
        builder.push_line("via X*");
        assert_eq!(builder.lines_seen(), 3);
        assert_eq!(builder.routed_lines(), 2);

        let snapshot = builder.finish();
        // a path without a source still marks its relay
        assert_eq!(hearable(&snapshot), vec!["A", "X"]);
    }
}
