//! Layout graph construction.
//!
//! # Responsibility
//! - Turn a grid snapshot into a directed nearest-visible-neighbor graph.
//!
//! # Invariants
//! - One coarse node per present cell, `raw_text` = cell text.
//! - At most one `Layout` edge per (node, direction), pointing at the nearest
//!   present cell; `distance` = intervening empty cells + 1.
//! - No edge when the scan reaches the grid boundary first.

use crate::graph::TimetableGraph;
use crate::model::edge::{Direction, LayoutEdge};
use crate::model::grid::{Grid, GridPosition};
use crate::model::node::{LayoutNode, NodeId};
use log::{debug, info};
use std::collections::HashMap;

/// Builds the layout graph for `grid`.
///
/// Nodes are added in row-major order; for each node, edges are added in
/// `up, down, left, right` order.
pub fn build_layout_graph(grid: &Grid) -> TimetableGraph {
    let mut graph = TimetableGraph::new();
    let mut indices = HashMap::new();

    for (position, text) in grid.present_cells() {
        let idx = graph.insert(NodeId::Cell(position), LayoutNode::new(text));
        indices.insert(position, idx);
    }

    let mut edge_count = 0usize;
    for (position, _) in grid.present_cells() {
        let Some(&source) = indices.get(&position) else {
            continue;
        };
        for direction in Direction::ALL {
            let Some((target, distance)) = nearest_present(grid, position, direction) else {
                continue;
            };
            if let Some(&target) = indices.get(&target) {
                graph.connect(source, target, LayoutEdge::layout(direction, distance));
                edge_count += 1;
            }
        }
    }

    info!(
        "event=layout_graph_built module=graph status=ok rows={} cols={} nodes={} edges={}",
        grid.rows(),
        grid.cols(),
        graph.node_count(),
        edge_count
    );
    if let Some((source, target, edge)) = graph.edges().next() {
        debug!(
            "event=layout_edge_example module=graph source={} target={} direction={:?} distance={:?}",
            source, target, edge.direction, edge.distance
        );
    }

    graph
}

/// Scans from `origin` along `direction` and returns the first present cell
/// with its distance, or `None` at the boundary.
pub fn nearest_present(
    grid: &Grid,
    origin: GridPosition,
    direction: Direction,
) -> Option<(GridPosition, usize)> {
    let mut current = origin;
    let mut distance = 0usize;
    while let Some(next) = direction.step(current, grid.rows(), grid.cols()) {
        distance += 1;
        if grid.is_present(next.row, next.col) {
            return Some((next, distance));
        }
        current = next;
    }
    None
}
