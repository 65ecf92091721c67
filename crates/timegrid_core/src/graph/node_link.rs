//! Node-link interchange shape for timetable graphs.
//!
//! # Responsibility
//! - Convert graphs to and from the `{nodes, links}` JSON document persisted
//!   between pipeline stages.
//!
//! # Invariants
//! - Node and link order in the document follows graph insertion order.
//! - Attribute keys match `LayoutNode` / `LayoutEdge` field names.

use crate::graph::{GraphError, TimetableGraph};
use crate::model::edge::LayoutEdge;
use crate::model::node::{LayoutNode, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialized node entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub node: LayoutNode,
}

/// Serialized edge entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(flatten)]
    pub edge: LayoutEdge,
}

/// Whole-graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkData {
    pub directed: bool,
    pub multigraph: bool,
    #[serde(default)]
    pub graph: Map<String, Value>,
    pub nodes: Vec<NodeLinkNode>,
    #[serde(default)]
    pub links: Vec<NodeLinkEdge>,
}

/// Captures `graph` as a node-link document.
pub fn to_node_link(graph: &TimetableGraph) -> NodeLinkData {
    NodeLinkData {
        directed: true,
        multigraph: true,
        graph: Map::new(),
        nodes: graph
            .nodes()
            .map(|(id, node)| NodeLinkNode {
                id: *id,
                node: node.clone(),
            })
            .collect(),
        links: graph
            .edges()
            .map(|(source, target, edge)| NodeLinkEdge {
                source: *source,
                target: *target,
                edge: *edge,
            })
            .collect(),
    }
}

/// Rebuilds a graph from a node-link document.
///
/// Stored entity spans are re-validated against each node's `raw_text`.
///
/// # Errors
/// - `GraphError::DuplicateNode` when two entries share an id.
/// - `GraphError::MissingNode` when a link references an undeclared node.
/// - `GraphError::InvalidEntity` when a stored span does not match its text.
pub fn from_node_link(data: NodeLinkData) -> Result<TimetableGraph, GraphError> {
    let mut graph = TimetableGraph::new();
    for entry in data.nodes {
        for entity in entry.node.entities.iter().flatten() {
            entity
                .validate(&entry.node.raw_text)
                .map_err(|source| GraphError::InvalidEntity {
                    node: entry.id,
                    source,
                })?;
        }
        graph.add_node(entry.id, entry.node)?;
    }
    for link in data.links {
        graph.add_edge(link.source, link.target, link.edge)?;
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::{from_node_link, to_node_link, NodeLinkData};
    use crate::graph::GraphError;
    use crate::model::entity::EntitySpanError;
    use crate::model::node::NodeId;

    #[test]
    fn document_uses_flat_attribute_keys() {
        let data: NodeLinkData = serde_json::from_value(serde_json::json!({
            "directed": true,
            "multigraph": true,
            "graph": {},
            "nodes": [
                { "id": [0, 0], "raw_text": "2024", "node_type": "Year" },
                { "id": [0, 1], "raw_text": "May" }
            ],
            "links": [
                { "source": [0, 0], "target": [0, 1], "direction": "right", "edge_type": "Layout", "distance": 1 }
            ]
        }))
        .expect("valid document");

        let graph = from_node_link(data.clone()).expect("valid graph");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(to_node_link(&graph), data);
    }

    #[test]
    fn stored_spans_must_match_raw_text() {
        let data: NodeLinkData = serde_json::from_value(serde_json::json!({
            "directed": true,
            "multigraph": true,
            "nodes": [{
                "id": [0, 0],
                "raw_text": "Salsa night",
                "entities": [{ "text": "March", "label": "DATE", "start_char": 0, "end_char": 5 }]
            }]
        }))
        .expect("valid document");

        let err = from_node_link(data).expect_err("mismatched span");
        assert!(matches!(
            err,
            GraphError::InvalidEntity { node, source: EntitySpanError::Mismatch { .. } }
                if node == NodeId::cell(0, 0)
        ));
    }

    #[test]
    fn links_to_undeclared_nodes_are_rejected() {
        let data: NodeLinkData = serde_json::from_value(serde_json::json!({
            "directed": true,
            "multigraph": true,
            "nodes": [{ "id": [0, 0], "raw_text": "2024" }],
            "links": [{ "source": [0, 0], "target": [5, 5], "edge_type": "YearToMonth" }]
        }))
        .expect("valid document");

        assert_eq!(
            from_node_link(data).expect_err("dangling link"),
            GraphError::MissingNode(NodeId::cell(5, 5))
        );
    }
}
