use timegrid_core::semantics::classify::COARSE_TYPES;
use timegrid_core::{
    annotate_graph, build_layout_graph, classify_graph, classify_node, ClassificationError,
    EntityLabel, ExtractedEntity, Grid, NodeId, NodeType, PatternAnnotator,
};

fn entity(text: &str, label: EntityLabel, start: usize) -> ExtractedEntity {
    ExtractedEntity::unchecked(text, label, start, start + text.chars().count())
}

#[test]
fn every_node_gets_exactly_one_coarse_type() {
    let grid = Grid::from_rows(vec![
        vec![Some("2024"), Some("January"), Some("Term 1")],
        vec![None, Some("Monday"), Some("Salsa with Will")],
        vec![Some("1999 reunion"), Some("sunday "), Some("Feb 14th")],
    ])
    .expect("grid");
    let annotated = annotate_graph(&build_layout_graph(&grid), &PatternAnnotator::builtin())
        .expect("builtin spans are valid");

    let classified = classify_graph(&annotated).expect("unambiguous grid");
    assert_eq!(classified.node_count(), annotated.node_count());
    assert_eq!(classified.edge_count(), annotated.edge_count());

    let type_of = |row, col| {
        classified
            .node(&NodeId::cell(row, col))
            .and_then(|node| node.node_type)
            .expect("classified node")
    };
    assert_eq!(type_of(0, 0), NodeType::Year);
    assert_eq!(type_of(0, 1), NodeType::Month);
    assert_eq!(type_of(0, 2), NodeType::Event);
    assert_eq!(type_of(1, 1), NodeType::DayOfWeek);
    assert_eq!(type_of(1, 2), NodeType::Event);
    assert_eq!(type_of(2, 0), NodeType::Year);
    assert_eq!(type_of(2, 1), NodeType::DayOfWeek);
    // A month-day span is not a bare month.
    assert_eq!(type_of(2, 2), NodeType::Event);

    for (_, node) in classified.nodes() {
        let node_type = node.node_type.expect("typed");
        assert!(COARSE_TYPES.contains(&node_type));
    }
}

#[test]
fn month_needs_a_single_date_entity() {
    let id = NodeId::cell(0, 0);
    assert_eq!(
        classify_node(id, "March", &[entity("March", EntityLabel::Date, 0)]).expect("month"),
        NodeType::Month
    );
    assert_eq!(
        classify_node(id, "March", &[]).expect("event"),
        NodeType::Event
    );
    assert_eq!(
        classify_node(
            id,
            "March madness",
            &[
                entity("March", EntityLabel::Date, 0),
                entity("madness", EntityLabel::Event, 6),
            ],
        )
        .expect("event"),
        NodeType::Event
    );
}

#[test]
fn year_and_day_checks_ignore_entities() {
    let id = NodeId::cell(1, 1);
    assert_eq!(classify_node(id, "2031", &[]).expect("year"), NodeType::Year);
    assert_eq!(classify_node(id, "1850", &[]).expect("event"), NodeType::Event);
    assert_eq!(classify_node(id, " Friday ", &[]).expect("day"), NodeType::DayOfWeek);
    assert_eq!(classify_node(id, "Fridays", &[]).expect("event"), NodeType::Event);
}

#[test]
fn unannotated_graph_is_rejected() {
    let grid = Grid::from_rows(vec![vec![Some("2024")]]).expect("grid");
    let err = classify_graph(&build_layout_graph(&grid)).expect_err("missing entities");
    assert_eq!(err, ClassificationError::MissingEntities(NodeId::cell(0, 0)));
    assert!(err.to_string().contains("annotator"));
}
