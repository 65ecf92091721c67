//! Graph node model.
//!
//! # Responsibility
//! - Identify coarse (per-cell) and fine-grained (per-entity) nodes.
//! - Define the fixed set of semantic node types.
//!
//! # Invariants
//! - Coarse ids are `(row, col)`; fine-grained ids are `(row, col, index)`.
//! - `parent_id` is a back-reference only and is set on fine-grained nodes.

use crate::model::entity::{EntityLabel, ExtractedEntity};
use crate::model::grid::GridPosition;
use serde::de::{Deserializer, Error as DeError};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Node identity.
///
/// Serialized as a JSON array of 2 (coarse) or 3 (fine-grained) integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Cell(GridPosition),
    Fine { position: GridPosition, index: usize },
}

impl NodeId {
    pub fn cell(row: usize, col: usize) -> Self {
        Self::Cell(GridPosition::new(row, col))
    }

    pub fn fine(row: usize, col: usize, index: usize) -> Self {
        Self::Fine {
            position: GridPosition::new(row, col),
            index,
        }
    }

    /// Grid position of the source cell.
    pub fn position(&self) -> GridPosition {
        match self {
            Self::Cell(position) => *position,
            Self::Fine { position, .. } => *position,
        }
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cell(position) => write!(f, "{position}"),
            Self::Fine { position, index } => {
                write!(f, "({}, {}, {index})", position.row, position.col)
            }
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let position = self.position();
        match self {
            Self::Cell(_) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&position.row)?;
                seq.serialize_element(&position.col)?;
                seq.end()
            }
            Self::Fine { index, .. } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&position.row)?;
                seq.serialize_element(&position.col)?;
                seq.serialize_element(index)?;
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = Vec::<usize>::deserialize(deserializer)?;
        match parts.as_slice() {
            [row, col] => Ok(Self::cell(*row, *col)),
            [row, col, index] => Ok(Self::fine(*row, *col, *index)),
            other => Err(D::Error::custom(format!(
                "node id must have 2 or 3 integers, got {}",
                other.len()
            ))),
        }
    }
}

/// Semantic type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    Year,
    Month,
    Day,
    DayOfWeek,
    Event,
    Duration,
    MonthDay,
    Loc,
    Person,
    Time,
    Other,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Month => "Month",
            Self::Day => "Day",
            Self::DayOfWeek => "DayOfWeek",
            Self::Event => "Event",
            Self::Duration => "Duration",
            Self::MonthDay => "MonthDay",
            Self::Loc => "Loc",
            Self::Person => "Person",
            Self::Time => "Time",
            Self::Other => "Other",
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity label with no node type mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmappedLabelError(pub EntityLabel);

impl Display for UnmappedLabelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity label `{}` has no node type mapping", self.0)
    }
}

impl Error for UnmappedLabelError {}

impl TryFrom<EntityLabel> for NodeType {
    type Error = UnmappedLabelError;

    fn try_from(label: EntityLabel) -> Result<Self, Self::Error> {
        match label {
            EntityLabel::Year => Ok(Self::Year),
            EntityLabel::Month | EntityLabel::Date => Ok(Self::Month),
            EntityLabel::Day | EntityLabel::DayOfMonth => Ok(Self::Day),
            EntityLabel::DayOfWeek => Ok(Self::DayOfWeek),
            EntityLabel::Event => Ok(Self::Event),
            EntityLabel::Duration => Ok(Self::Duration),
            EntityLabel::MonthDay | EntityLabel::DayMonth => Ok(Self::MonthDay),
            EntityLabel::Loc => Ok(Self::Loc),
            EntityLabel::Person => Ok(Self::Person),
            EntityLabel::Time => Ok(Self::Time),
            EntityLabel::SpecialDate => Ok(Self::Other),
            EntityLabel::Remove => Err(UnmappedLabelError(label)),
        }
    }
}

/// Attributes carried by one graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    /// `None` until the annotator stage has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<ExtractedEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<GridPosition>,
}

impl LayoutNode {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            node_type: None,
            entities: None,
            parent_id: None,
        }
    }

    pub fn with_entities(mut self, entities: Vec<ExtractedEntity>) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn is_type(&self, node_type: NodeType) -> bool {
        self.node_type == Some(node_type)
    }
}
