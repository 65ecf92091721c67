//! Fine-graining of coarse cell nodes into per-entity nodes.
//!
//! # Responsibility
//! - Split every coarse node into one child per extracted entity.
//! - Carry layout connectivity over to the children.
//!
//! # Invariants
//! - Children of `(row, col)` are `(row, col, 0..n)` in entity order.
//! - A node without entities yields exactly one `Other` child with the full
//!   raw text.
//! - Every coarse edge `a -> b` becomes `ca -> cb` for each child `ca` of `a`
//!   and each child `cb` of `b`.
//! - Siblings are chained by `right` (forward) and `left` (backward) layout
//!   edges of distance 1.
//! - The coarse graph is only read; a new graph is returned.

use crate::graph::TimetableGraph;
use crate::model::edge::{Direction, LayoutEdge};
use crate::model::entity::EntityLabel;
use crate::model::node::{LayoutNode, NodeId, NodeType, UnmappedLabelError};
use log::info;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fine-graining failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FineGrainError {
    /// An entity label has no node type mapping.
    UnmappedLabel { node: NodeId, label: EntityLabel },
    /// The node has not been through the annotator stage.
    MissingEntities(NodeId),
    /// The input already contains fine-grained nodes.
    AlreadyFineGrained(NodeId),
}

impl Display for FineGrainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmappedLabel { node, label } => {
                write!(f, "node {node}: {}", UnmappedLabelError(*label))
            }
            Self::MissingEntities(node) => {
                write!(f, "node {node} has no entity annotation; run the annotator first")
            }
            Self::AlreadyFineGrained(node) => {
                write!(f, "node {node} is already fine-grained")
            }
        }
    }
}

impl Error for FineGrainError {}

/// Forward (`i -> i+1`) and backward (`i+1 -> i`) sibling pairs.
///
/// The backward list runs from the last sibling to the first.
pub fn sibling_chain<T: Copy>(children: &[T]) -> (Vec<(T, T)>, Vec<(T, T)>) {
    let forward: Vec<(T, T)> = children.windows(2).map(|pair| (pair[0], pair[1])).collect();
    let backward = forward.iter().rev().map(|(a, b)| (*b, *a)).collect();
    (forward, backward)
}

/// Children a coarse node splits into, as `(id, node)` pairs.
///
/// # Errors
/// - `FineGrainError::MissingEntities` when `node.entities` is unset.
/// - `FineGrainError::UnmappedLabel` when an entity label has no node type.
pub fn split_node(
    id: NodeId,
    node: &LayoutNode,
) -> Result<Vec<(NodeId, LayoutNode)>, FineGrainError> {
    let NodeId::Cell(position) = id else {
        return Err(FineGrainError::AlreadyFineGrained(id));
    };
    let entities = node
        .entities
        .as_deref()
        .ok_or(FineGrainError::MissingEntities(id))?;

    if entities.is_empty() {
        let mut child = LayoutNode::new(node.raw_text.clone()).with_node_type(NodeType::Other);
        child.parent_id = Some(position);
        return Ok(vec![(NodeId::fine(position.row, position.col, 0), child)]);
    }

    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| {
            let node_type = NodeType::try_from(entity.label).map_err(|_| {
                FineGrainError::UnmappedLabel {
                    node: id,
                    label: entity.label,
                }
            })?;
            let mut child = LayoutNode::new(entity.text.clone()).with_node_type(node_type);
            child.parent_id = Some(position);
            Ok((NodeId::fine(position.row, position.col, index), child))
        })
        .collect()
}

/// Builds the fine-grained graph of a coarse, annotated graph.
pub fn fine_grain(graph: &TimetableGraph) -> Result<TimetableGraph, FineGrainError> {
    let mut fine = TimetableGraph::new();
    let mut children: HashMap<NodeId, Vec<NodeIndex>> = HashMap::new();

    for (id, node) in graph.nodes() {
        let split = split_node(*id, node)?;
        let indices = split
            .into_iter()
            .map(|(child_id, child)| fine.insert(child_id, child))
            .collect();
        children.insert(*id, indices);
    }

    let mut inherited = 0usize;
    for (source, target, edge) in graph.edges() {
        let (Some(from_children), Some(to_children)) = (children.get(source), children.get(target))
        else {
            continue;
        };
        for from in from_children {
            for to in to_children {
                fine.connect(*from, *to, *edge);
                inherited += 1;
            }
        }
    }

    let mut chained = 0usize;
    for (id, _) in graph.nodes() {
        let Some(siblings) = children.get(id) else {
            continue;
        };
        let (forward, backward) = sibling_chain(siblings.as_slice());
        for (from, to) in forward {
            fine.connect(from, to, LayoutEdge::layout(Direction::Right, 1));
            chained += 1;
        }
        for (from, to) in backward {
            fine.connect(from, to, LayoutEdge::layout(Direction::Left, 1));
            chained += 1;
        }
    }

    info!(
        "event=graph_fine_grained module=semantics status=ok coarse_nodes={} fine_nodes={} inherited_edges={} sibling_edges={}",
        graph.node_count(),
        fine.node_count(),
        inherited,
        chained
    );
    Ok(fine)
}

#[cfg(test)]
mod tests {
    use super::{sibling_chain, split_node, FineGrainError};
    use crate::model::entity::{EntityLabel, ExtractedEntity};
    use crate::model::node::{LayoutNode, NodeId};

    #[test]
    fn sibling_chain_pairs_consecutive_children() {
        let children = [(1, 2, 3), (4, 5, 6), (7, 8, 9)];
        let (forward, backward) = sibling_chain(&children[..]);
        assert_eq!(forward, vec![((1, 2, 3), (4, 5, 6)), ((4, 5, 6), (7, 8, 9))]);
        assert_eq!(backward, vec![((7, 8, 9), (4, 5, 6)), ((4, 5, 6), (1, 2, 3))]);
    }

    #[test]
    fn sibling_chain_is_empty_for_zero_or_one_child() {
        let (forward, backward) = sibling_chain::<u8>(&[]);
        assert!(forward.is_empty() && backward.is_empty());
        let (forward, backward) = sibling_chain(&[(1, 2, 3)][..]);
        assert!(forward.is_empty() && backward.is_empty());
    }

    #[test]
    fn split_rejects_fine_grained_input() {
        let node = LayoutNode::new("x").with_entities(Vec::new());
        assert_eq!(
            split_node(NodeId::fine(0, 0, 0), &node),
            Err(FineGrainError::AlreadyFineGrained(NodeId::fine(0, 0, 0)))
        );
    }

    #[test]
    fn split_rejects_remove_label() {
        let node = LayoutNode::new("should be").with_entities(vec![ExtractedEntity::unchecked(
            "should be",
            EntityLabel::Remove,
            0,
            9,
        )]);
        assert_eq!(
            split_node(NodeId::cell(2, 2), &node),
            Err(FineGrainError::UnmappedLabel {
                node: NodeId::cell(2, 2),
                label: EntityLabel::Remove,
            })
        );
    }
}
