//! JSON topology report, the shape consumed by web front ends.

use serde::Serialize;
use std::io;

use crate::analyzer::TopologySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Hearable,
    Relay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub is_hearable: bool,
    pub packet_count: u64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeView {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub hearable_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Serializable view of a [`TopologySnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyReport {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub hearable_nodes: Vec<String>,
    pub stats: TopologyStats,
}

impl TopologyReport {
    pub fn from_snapshot(snapshot: &TopologySnapshot) -> Self {
        let nodes = snapshot
            .nodes()
            .map(|node| {
                let is_hearable = snapshot.is_hearable(node);
                NodeView {
                    id: node.to_string(),
                    label: node.to_string(),
                    is_hearable,
                    packet_count: snapshot.packet_count(node),
                    kind: if is_hearable { NodeKind::Hearable } else { NodeKind::Relay },
                }
            })
            .collect();

        let edges = snapshot
            .edges()
            .map(|edge| EdgeView {
                id: edge.id(),
                source: edge.from.to_string(),
                target: edge.to.to_string(),
                label: edge.count.to_string(),
                count: edge.count,
            })
            .collect();

        Self {
            nodes,
            edges,
            hearable_nodes: snapshot.hearable_nodes().map(str::to_string).collect(),
            stats: TopologyStats {
                total_nodes: snapshot.node_count(),
                total_edges: snapshot.edge_count(),
                hearable_count: snapshot.hearable_count(),
                last_updated: None,
            },
        }
    }

    pub fn with_last_updated(mut self, last_updated: Option<String>) -> Self {
        self.stats.last_updated = last_updated;
        self
    }
}

pub fn write_json(out: &mut dyn io::Write, snapshot: &TopologySnapshot, last_updated: Option<String>) -> io::Result<()> {
    let report = TopologyReport::from_snapshot(snapshot).with_last_updated(last_updated);
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}
