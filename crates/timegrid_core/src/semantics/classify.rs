//! Coarse node classification.
//!
//! # Responsibility
//! - Assign exactly one of `Year | Month | DayOfWeek | Event` to each node from
//!   its raw text and entity list.
//!
//! # Invariants
//! - Classification is a pure function of `(raw_text, entities)`.
//! - Exactly one predicate must hold; anything else aborts the run.
//! - `Event` is the fallback: it holds iff no other predicate does.

use crate::graph::TimetableGraph;
use crate::model::entity::{EntityLabel, ExtractedEntity};
use crate::model::node::{LayoutNode, NodeId, NodeType};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:19|20)\d{2}").expect("valid year regex"));
static MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)",
    )
    .expect("valid month regex")
});

const DAYS_OF_WEEK: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Node types a coarse node can be classified into, in predicate order.
pub const COARSE_TYPES: [NodeType; 4] = [
    NodeType::Year,
    NodeType::Month,
    NodeType::DayOfWeek,
    NodeType::Event,
];

/// Classification failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    /// Zero or several predicates held for one node.
    Ambiguous {
        node: NodeId,
        raw_text: String,
        entities: Vec<ExtractedEntity>,
        matches: Vec<NodeType>,
    },
    /// The node has not been through the annotator stage.
    MissingEntities(NodeId),
}

impl Display for ClassificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ambiguous {
                node,
                raw_text,
                entities,
                matches,
            } => write!(
                f,
                "node {node} with text `{raw_text}` and entities {entities:?} matches {} node types {matches:?}; expected exactly one",
                matches.len()
            ),
            Self::MissingEntities(node) => {
                write!(f, "node {node} has no entity annotation; run the annotator first")
            }
        }
    }
}

impl Error for ClassificationError {}

/// Classifies one node.
///
/// # Errors
/// - `ClassificationError::Ambiguous` when the match count is not exactly one.
pub fn classify_node(
    id: NodeId,
    raw_text: &str,
    entities: &[ExtractedEntity],
) -> Result<NodeType, ClassificationError> {
    let year = is_year(raw_text);
    let month = is_month(raw_text, entities);
    let day_of_week = is_day_of_week(raw_text);
    let event = !(year || month || day_of_week);
    resolve(id, raw_text, entities, [year, month, day_of_week, event])
}

/// Returns a copy of `graph` with `node_type` set on every node.
///
/// # Errors
/// - `ClassificationError::MissingEntities` when a node lacks entities.
/// - `ClassificationError::Ambiguous` from `classify_node`.
pub fn classify_graph(graph: &TimetableGraph) -> Result<TimetableGraph, ClassificationError> {
    let mut frequencies: BTreeMap<NodeType, usize> = BTreeMap::new();
    let classified = graph.try_map_nodes(|id, node| -> Result<LayoutNode, ClassificationError> {
        let entities = node
            .entities
            .as_deref()
            .ok_or(ClassificationError::MissingEntities(*id))?;
        let node_type = classify_node(*id, &node.raw_text, entities)?;
        *frequencies.entry(node_type).or_default() += 1;
        Ok(node.clone().with_node_type(node_type))
    })?;

    info!(
        "event=graph_classified module=semantics status=ok nodes={} distribution={:?}",
        classified.node_count(),
        frequencies
    );
    Ok(classified)
}

fn resolve(
    id: NodeId,
    raw_text: &str,
    entities: &[ExtractedEntity],
    flags: [bool; 4],
) -> Result<NodeType, ClassificationError> {
    let matches: Vec<NodeType> = COARSE_TYPES
        .iter()
        .zip(flags)
        .filter(|(_, hit)| *hit)
        .map(|(node_type, _)| *node_type)
        .collect();

    match matches.as_slice() {
        [single] => Ok(*single),
        _ => Err(ClassificationError::Ambiguous {
            node: id,
            raw_text: raw_text.to_string(),
            entities: entities.to_vec(),
            matches,
        }),
    }
}

fn is_year(text: &str) -> bool {
    YEAR_RE.is_match(text)
}

// Mixed cells (several entities, or a non-date entity) never count as months.
fn is_month(text: &str, entities: &[ExtractedEntity]) -> bool {
    let [only] = entities else {
        return false;
    };
    if only.label != EntityLabel::Date {
        return false;
    }
    MONTH_RE.is_match(text.trim().to_lowercase().as_str())
}

fn is_day_of_week(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    DAYS_OF_WEEK.contains(&normalized.as_str())
}
