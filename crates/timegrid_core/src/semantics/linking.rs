//! Rule-based date hierarchy linking.
//!
//! # Responsibility
//! - Derive `YearToMonth`, `MonthToDayOfWeek` and `DayOfWeekToEvent` edges
//!   from the rightward layout structure of a classified graph.
//!
//! # Invariants
//! - Walks follow `right` layout edges only; every right neighbor is visited,
//!   each node at most once per source.
//! - A source links to every target-typed node its walk reaches; the walk
//!   continues past a target.
//! - A level with zero edges is reported, never treated as an error.

use crate::graph::TimetableGraph;
use crate::model::edge::{Direction, EdgeType, LayoutEdge};
use crate::model::node::{NodeId, NodeType};
use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};
use std::fmt::{Display, Formatter};

/// One source-type to target-type linking rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyLevel {
    pub source: NodeType,
    pub target: NodeType,
    pub edge_type: EdgeType,
}

/// The three hierarchy levels, top-down.
pub const HIERARCHY_LEVELS: [HierarchyLevel; 3] = [
    HierarchyLevel {
        source: NodeType::Year,
        target: NodeType::Month,
        edge_type: EdgeType::YearToMonth,
    },
    HierarchyLevel {
        source: NodeType::Month,
        target: NodeType::DayOfWeek,
        edge_type: EdgeType::MonthToDayOfWeek,
    },
    HierarchyLevel {
        source: NodeType::DayOfWeek,
        target: NodeType::Event,
        edge_type: EdgeType::DayOfWeekToEvent,
    },
];

/// Derived hierarchy edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HierarchyEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub edge_type: EdgeType,
}

/// Non-fatal linking observation surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDiagnostic {
    /// A level produced no edges; usually an upstream classification issue.
    EmptyLevel {
        edge_type: EdgeType,
        sources: usize,
        targets: usize,
    },
}

impl Display for LinkDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLevel {
                edge_type,
                sources,
                targets,
            } => write!(
                f,
                "no {edge_type} edges found ({sources} source nodes, {targets} target nodes)"
            ),
        }
    }
}

/// Graph with hierarchy edges added, plus diagnostics.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
    pub graph: TimetableGraph,
    pub edges: Vec<HierarchyEdge>,
    pub diagnostics: Vec<LinkDiagnostic>,
}

/// Collects hierarchy edges for one level.
///
/// Sources are processed in graph order; each source's targets are emitted in
/// breadth-first walk order.
pub fn gather_hierarchy_edges(graph: &TimetableGraph, level: HierarchyLevel) -> Vec<HierarchyEdge> {
    let mut edges = Vec::new();
    for source in graph.nodes_of_type(level.source) {
        for target in walk_right(graph, source) {
            let is_target = graph
                .node(&target)
                .is_some_and(|node| node.is_type(level.target));
            if is_target {
                edges.push(HierarchyEdge {
                    source: *source,
                    target,
                    edge_type: level.edge_type,
                });
            }
        }
    }
    edges
}

/// Returns a copy of `graph` with the edges of every hierarchy level added.
pub fn link_semantics(graph: &TimetableGraph) -> LinkOutcome {
    let mut linked = graph.clone();
    let mut all_edges = Vec::new();
    let mut diagnostics = Vec::new();

    for level in HIERARCHY_LEVELS {
        let edges = gather_hierarchy_edges(graph, level);
        if edges.is_empty() {
            let diagnostic = LinkDiagnostic::EmptyLevel {
                edge_type: level.edge_type,
                sources: graph.nodes_of_type(level.source).count(),
                targets: graph.nodes_of_type(level.target).count(),
            };
            warn!(
                "event=link_level_empty module=semantics status=warn edge_type={} detail=\"{}\"",
                level.edge_type, diagnostic
            );
            diagnostics.push(diagnostic);
            continue;
        }

        info!(
            "event=link_level_done module=semantics status=ok edge_type={} edges={}",
            level.edge_type,
            edges.len()
        );
        if let Some(example) = edges.first() {
            debug!(
                "event=link_example module=semantics edge_type={} source_text={:?} target_text={:?}",
                level.edge_type,
                graph.node(&example.source).map(|node| node.raw_text.as_str()),
                graph.node(&example.target).map(|node| node.raw_text.as_str())
            );
        }

        for edge in &edges {
            // Endpoints come from `graph`, so both exist in the copy.
            if let (Ok(from), Ok(to)) = (linked.index_of(&edge.source), linked.index_of(&edge.target)) {
                linked.connect(from, to, LayoutEdge::hierarchy(edge.edge_type));
            }
        }
        all_edges.extend(edges);
    }

    LinkOutcome {
        graph: linked,
        edges: all_edges,
        diagnostics,
    }
}

// Breadth-first over `right` layout edges, excluding `start` itself.
fn walk_right(graph: &TimetableGraph, start: &NodeId) -> Vec<NodeId> {
    let mut visited: HashSet<NodeId> = HashSet::from([*start]);
    let mut queue: VecDeque<NodeId> = graph
        .neighbors_in_direction(start, Direction::Right)
        .into_iter()
        .collect();
    let mut order = Vec::new();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        order.push(current);
        queue.extend(graph.neighbors_in_direction(&current, Direction::Right));
    }
    order
}
