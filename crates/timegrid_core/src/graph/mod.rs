//! Timetable graph container.
//!
//! # Responsibility
//! - Store nodes keyed by `NodeId` and directed, attributed edges.
//! - Offer deterministic iteration so stage outputs are reproducible.
//!
//! # Invariants
//! - Node ids are unique.
//! - Nodes and edges iterate in insertion order.
//! - Parallel edges are allowed (a layout edge and a hierarchy edge may join
//!   the same pair of nodes).
//! - Stages never delete in place; filtering returns a new graph.

pub mod layout;
pub mod node_link;

use crate::model::edge::{Direction, LayoutEdge};
use crate::model::entity::EntitySpanError;
use crate::model::node::{LayoutNode, NodeId, NodeType};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction as Orientation;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Graph construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateNode(NodeId),
    MissingNode(NodeId),
    /// A stored entity span does not reproduce its node's raw text.
    InvalidEntity {
        node: NodeId,
        source: EntitySpanError,
    },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNode(id) => write!(f, "node already exists: {id}"),
            Self::MissingNode(id) => write!(f, "node not found: {id}"),
            Self::InvalidEntity { node, source } => write!(f, "node {node}: {source}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEntity { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Optional node attribute that can be stripped from a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAttribute {
    NodeType,
    Entities,
    ParentId,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    id: NodeId,
    node: LayoutNode,
}

/// Directed multigraph of timetable nodes.
#[derive(Debug, Clone, Default)]
pub struct TimetableGraph {
    graph: DiGraph<NodeRecord, LayoutEdge>,
    index: HashMap<NodeId, NodeIndex>,
}

impl TimetableGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    ///
    /// # Errors
    /// - Returns `GraphError::DuplicateNode` when `id` already exists.
    pub fn add_node(&mut self, id: NodeId, node: LayoutNode) -> Result<(), GraphError> {
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.insert(id, node);
        Ok(())
    }

    /// Adds a directed edge between two existing nodes.
    ///
    /// # Errors
    /// - Returns `GraphError::MissingNode` when either endpoint is unknown.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, edge: LayoutEdge) -> Result<(), GraphError> {
        let source = self.index_of(&from)?;
        let target = self.index_of(&to)?;
        self.connect(source, target, edge);
        Ok(())
    }

    pub fn node(&self, id: &NodeId) -> Option<&LayoutNode> {
        self.index.get(id).map(|idx| &self.graph[*idx].node)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Iterates nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &LayoutNode)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (&self.graph[idx].id, &self.graph[idx].node))
    }

    /// Iterates node ids of one semantic type in insertion order.
    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes()
            .filter(move |(_, node)| node.is_type(node_type))
            .map(|(id, _)| id)
    }

    /// Iterates edges as `(source, target, attributes)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId, &LayoutEdge)> + '_ {
        self.graph.edge_indices().filter_map(move |idx| {
            let (source, target) = self.graph.edge_endpoints(idx)?;
            Some((
                &self.graph[source].id,
                &self.graph[target].id,
                &self.graph[idx],
            ))
        })
    }

    /// Outgoing edges of `id` in insertion order; empty for unknown ids.
    pub fn outgoing(&self, id: &NodeId) -> Vec<(&NodeId, &LayoutEdge)> {
        self.incident(id, Orientation::Outgoing)
    }

    /// Incoming edges of `id` in insertion order; empty for unknown ids.
    pub fn incoming(&self, id: &NodeId) -> Vec<(&NodeId, &LayoutEdge)> {
        self.incident(id, Orientation::Incoming)
    }

    /// Targets of outgoing `Layout` edges pointing in `direction`.
    pub fn neighbors_in_direction(&self, id: &NodeId, direction: Direction) -> Vec<NodeId> {
        self.outgoing(id)
            .into_iter()
            .filter(|(_, edge)| edge.is_layout_towards(direction))
            .map(|(target, _)| *target)
            .collect()
    }

    /// Returns a copy with all nodes of `node_type` (and their edges) removed.
    pub fn without_nodes_of_type(&self, node_type: NodeType) -> Self {
        self.filter_nodes(|_, node| !node.is_type(node_type))
    }

    /// Returns a copy keeping only nodes accepted by `keep`.
    pub fn filter_nodes<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&NodeId, &LayoutNode) -> bool,
    {
        let mut filtered = Self::new();
        for (id, node) in self.nodes() {
            if keep(id, node) {
                filtered.insert(*id, node.clone());
            }
        }
        for (source, target, edge) in self.edges() {
            if let (Some(from), Some(to)) = (
                filtered.index.get(source).copied(),
                filtered.index.get(target).copied(),
            ) {
                filtered.connect(from, to, *edge);
            }
        }
        filtered
    }

    /// Returns a copy with `attribute` cleared on every node.
    pub fn without_attribute(&self, attribute: NodeAttribute) -> Self {
        let mut copy = self.clone();
        for record in copy.graph.node_weights_mut() {
            match attribute {
                NodeAttribute::NodeType => record.node.node_type = None,
                NodeAttribute::Entities => record.node.entities = None,
                NodeAttribute::ParentId => record.node.parent_id = None,
            }
        }
        copy
    }

    /// Returns a copy with every node rewritten by `f`; edges are preserved.
    pub fn try_map_nodes<F, E>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&NodeId, &LayoutNode) -> Result<LayoutNode, E>,
    {
        let mut mapped = self.clone();
        for record in mapped.graph.node_weights_mut() {
            record.node = f(&record.id, &record.node)?;
        }
        Ok(mapped)
    }

    pub(crate) fn insert(&mut self, id: NodeId, node: LayoutNode) -> NodeIndex {
        let idx = self.graph.add_node(NodeRecord { id, node });
        self.index.insert(id, idx);
        idx
    }

    pub(crate) fn connect(&mut self, from: NodeIndex, to: NodeIndex, edge: LayoutEdge) -> EdgeIndex {
        self.graph.add_edge(from, to, edge)
    }

    pub(crate) fn index_of(&self, id: &NodeId) -> Result<NodeIndex, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or(GraphError::MissingNode(*id))
    }

    fn incident(&self, id: &NodeId, orientation: Orientation) -> Vec<(&NodeId, &LayoutEdge)> {
        let Some(idx) = self.index.get(id).copied() else {
            return Vec::new();
        };
        // petgraph walks adjacency lists newest-first.
        let mut edges: Vec<_> = self.graph.edges_directed(idx, orientation).collect();
        edges.sort_by_key(|edge| edge.id());
        edges
            .into_iter()
            .map(|edge| {
                let other = match orientation {
                    Orientation::Outgoing => edge.target(),
                    Orientation::Incoming => edge.source(),
                };
                (&self.graph[other].id, edge.weight())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{GraphError, NodeAttribute, TimetableGraph};
    use crate::model::edge::{Direction, EdgeType, LayoutEdge};
    use crate::model::node::{LayoutNode, NodeId, NodeType};

    fn sample() -> TimetableGraph {
        let mut graph = TimetableGraph::new();
        graph
            .add_node(NodeId::cell(0, 0), LayoutNode::new("2024").with_node_type(NodeType::Year))
            .expect("add year");
        graph
            .add_node(NodeId::cell(0, 1), LayoutNode::new("May").with_node_type(NodeType::Month))
            .expect("add month");
        graph
            .add_edge(
                NodeId::cell(0, 0),
                NodeId::cell(0, 1),
                LayoutEdge::layout(Direction::Right, 1),
            )
            .expect("add layout edge");
        graph
            .add_edge(
                NodeId::cell(0, 0),
                NodeId::cell(0, 1),
                LayoutEdge::hierarchy(EdgeType::YearToMonth),
            )
            .expect("add hierarchy edge");
        graph
    }

    #[test]
    fn rejects_duplicate_nodes_and_dangling_edges() {
        let mut graph = sample();
        assert_eq!(
            graph.add_node(NodeId::cell(0, 0), LayoutNode::new("dup")),
            Err(GraphError::DuplicateNode(NodeId::cell(0, 0)))
        );
        assert_eq!(
            graph.add_edge(
                NodeId::cell(0, 0),
                NodeId::cell(9, 9),
                LayoutEdge::layout(Direction::Down, 1)
            ),
            Err(GraphError::MissingNode(NodeId::cell(9, 9)))
        );
    }

    #[test]
    fn outgoing_keeps_insertion_order_and_parallel_edges() {
        let graph = sample();
        let outgoing = graph.outgoing(&NodeId::cell(0, 0));
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].1.edge_type, EdgeType::Layout);
        assert_eq!(outgoing[1].1.edge_type, EdgeType::YearToMonth);
        assert_eq!(
            graph.neighbors_in_direction(&NodeId::cell(0, 0), Direction::Right),
            vec![NodeId::cell(0, 1)]
        );
        assert_eq!(graph.incoming(&NodeId::cell(0, 1)).len(), 2);
    }

    #[test]
    fn filtering_returns_a_new_graph() {
        let graph = sample();
        let filtered = graph.without_nodes_of_type(NodeType::Month);
        assert_eq!(filtered.node_count(), 1);
        assert_eq!(filtered.edge_count(), 0);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn without_attribute_clears_only_the_copy() {
        let graph = sample();
        let stripped = graph.without_attribute(NodeAttribute::NodeType);
        assert!(stripped.nodes().all(|(_, node)| node.node_type.is_none()));
        assert_eq!(
            graph.node(&NodeId::cell(0, 0)).and_then(|node| node.node_type),
            Some(NodeType::Year)
        );
    }
}
