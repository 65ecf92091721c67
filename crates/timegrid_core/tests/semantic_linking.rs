use timegrid_core::semantics::linking::{gather_hierarchy_edges, HierarchyEdge, HIERARCHY_LEVELS};
use timegrid_core::{
    annotate_graph, build_layout_graph, classify_graph, link_semantics, Direction, EdgeType, Grid,
    LayoutEdge, LayoutNode, LinkDiagnostic, NodeId, NodeType, PatternAnnotator, TimetableGraph,
};

fn classified(grid: &Grid) -> TimetableGraph {
    let annotated = annotate_graph(&build_layout_graph(grid), &PatternAnnotator::builtin())
        .expect("valid spans");
    classify_graph(&annotated).expect("unambiguous grid")
}

fn hierarchy_edges(graph: &TimetableGraph, edge_type: EdgeType) -> Vec<(NodeId, NodeId)> {
    graph
        .edges()
        .filter(|(_, _, edge)| edge.edge_type == edge_type)
        .map(|(source, target, _)| (*source, *target))
        .collect()
}

#[test]
fn two_by_three_example_links_rightward_only() {
    let grid = Grid::from_rows(vec![
        vec![Some("2024"), Some("January"), None],
        vec![None, Some("Monday"), Some("Meeting")],
    ])
    .expect("grid");
    let graph = classified(&grid);

    assert_eq!(
        graph.neighbors_in_direction(&NodeId::cell(0, 1), Direction::Down),
        vec![NodeId::cell(1, 1)]
    );
    assert_eq!(
        graph.node(&NodeId::cell(1, 2)).and_then(|node| node.node_type),
        Some(NodeType::Event)
    );

    let outcome = link_semantics(&graph);
    assert_eq!(
        hierarchy_edges(&outcome.graph, EdgeType::YearToMonth),
        vec![(NodeId::cell(0, 0), NodeId::cell(0, 1))]
    );
    assert!(hierarchy_edges(&outcome.graph, EdgeType::MonthToDayOfWeek).is_empty());
    assert_eq!(
        hierarchy_edges(&outcome.graph, EdgeType::DayOfWeekToEvent),
        vec![(NodeId::cell(1, 1), NodeId::cell(1, 2))]
    );

    assert_eq!(
        outcome.diagnostics,
        vec![LinkDiagnostic::EmptyLevel {
            edge_type: EdgeType::MonthToDayOfWeek,
            sources: 1,
            targets: 1,
        }]
    );
    assert_eq!(outcome.edges.len(), 2);
    assert_eq!(outcome.graph.edge_count(), graph.edge_count() + 2);
    assert_eq!(outcome.graph.node_count(), graph.node_count());
}

#[test]
fn hierarchy_edges_carry_no_layout_attributes() {
    let grid = Grid::from_rows(vec![vec![Some("2024"), Some("March")]]).expect("grid");
    let outcome = link_semantics(&classified(&grid));
    let (_, _, edge) = outcome
        .graph
        .edges()
        .find(|(_, _, edge)| edge.edge_type.is_hierarchy())
        .expect("year to month edge");
    assert_eq!(*edge, LayoutEdge::hierarchy(EdgeType::YearToMonth));
    assert_eq!(edge.direction, None);
    assert_eq!(edge.distance, None);
}

#[test]
fn walk_continues_past_targets_and_gaps() {
    let grid = Grid::from_rows(vec![vec![
        Some("Monday"),
        Some("Salsa"),
        None,
        Some("Bachata"),
        Some("Tuesday"),
        Some("Kizomba"),
    ]])
    .expect("grid");
    let graph = classified(&grid);

    let edges = gather_hierarchy_edges(&graph, HIERARCHY_LEVELS[2]);
    let monday: Vec<NodeId> = edges
        .iter()
        .filter(|edge| edge.source == NodeId::cell(0, 0))
        .map(|edge| edge.target)
        .collect();
    assert_eq!(
        monday,
        vec![NodeId::cell(0, 1), NodeId::cell(0, 3), NodeId::cell(0, 5)]
    );
    assert!(edges.contains(&HierarchyEdge {
        source: NodeId::cell(0, 4),
        target: NodeId::cell(0, 5),
        edge_type: EdgeType::DayOfWeekToEvent,
    }));
    assert_eq!(edges.len(), 4);
}

#[test]
fn year_without_right_neighbors_links_nothing() {
    let grid = Grid::from_rows(vec![vec![Some("March"), Some("2024")]]).expect("grid");
    let outcome = link_semantics(&classified(&grid));

    assert!(outcome.edges.is_empty());
    assert_eq!(outcome.diagnostics.len(), HIERARCHY_LEVELS.len());
    assert_eq!(outcome.graph.edge_count(), 2);
}

#[test]
fn empty_graph_links_cleanly() {
    let outcome = link_semantics(&TimetableGraph::new());
    assert!(outcome.graph.is_empty());
    assert!(outcome.edges.is_empty());
    assert!(outcome
        .diagnostics
        .iter()
        .all(|diagnostic| matches!(diagnostic, LinkDiagnostic::EmptyLevel { sources: 0, targets: 0, .. })));
}

#[test]
fn branching_right_edges_are_each_followed_once() {
    let mut graph = TimetableGraph::new();
    let typed = |text: &str, node_type| LayoutNode::new(text).with_node_type(node_type);
    graph.add_node(NodeId::fine(0, 0, 0), typed("Monday", NodeType::DayOfWeek)).expect("add");
    graph.add_node(NodeId::fine(0, 1, 0), typed("Salsa", NodeType::Event)).expect("add");
    graph.add_node(NodeId::fine(0, 1, 1), typed("Will", NodeType::Person)).expect("add");
    graph.add_node(NodeId::fine(0, 2, 0), typed("Social", NodeType::Event)).expect("add");
    let right = LayoutEdge::layout(Direction::Right, 1);
    for (from, to) in [
        (NodeId::fine(0, 0, 0), NodeId::fine(0, 1, 0)),
        (NodeId::fine(0, 0, 0), NodeId::fine(0, 1, 1)),
        (NodeId::fine(0, 1, 0), NodeId::fine(0, 2, 0)),
        (NodeId::fine(0, 1, 1), NodeId::fine(0, 2, 0)),
        (NodeId::fine(0, 1, 0), NodeId::fine(0, 1, 1)),
    ] {
        graph.add_edge(from, to, right).expect("edge");
    }

    let outcome = link_semantics(&graph);
    assert_eq!(
        hierarchy_edges(&outcome.graph, EdgeType::DayOfWeekToEvent),
        vec![
            (NodeId::fine(0, 0, 0), NodeId::fine(0, 1, 0)),
            (NodeId::fine(0, 0, 0), NodeId::fine(0, 2, 0)),
        ]
    );
}
