//! Graph edge model.
//!
//! # Invariants
//! - `Layout` edges always carry `direction` and `distance >= 1`.
//! - Hierarchy edges carry neither.

use crate::model::grid::GridPosition;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Axis direction of a layout edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Moves one cell from `from`, or `None` when leaving a `rows × cols` grid.
    pub fn step(self, from: GridPosition, rows: usize, cols: usize) -> Option<GridPosition> {
        let GridPosition { row, col } = from;
        match self {
            Self::Up => row.checked_sub(1).map(|row| GridPosition::new(row, col)),
            Self::Down => (row + 1 < rows).then(|| GridPosition::new(row + 1, col)),
            Self::Left => col.checked_sub(1).map(|col| GridPosition::new(row, col)),
            Self::Right => (col + 1 < cols).then(|| GridPosition::new(row, col + 1)),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge category: spatial layout or one of the date-hierarchy levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeType {
    Layout,
    YearToMonth,
    MonthToDayOfWeek,
    DayOfWeekToEvent,
}

impl EdgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layout => "Layout",
            Self::YearToMonth => "YearToMonth",
            Self::MonthToDayOfWeek => "MonthToDayOfWeek",
            Self::DayOfWeekToEvent => "DayOfWeekToEvent",
        }
    }

    pub fn is_hierarchy(self) -> bool {
        !matches!(self, Self::Layout)
    }
}

impl Display for EdgeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes carried by one directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<usize>,
}

impl LayoutEdge {
    /// Spatial edge to the nearest present cell in `direction`.
    pub fn layout(direction: Direction, distance: usize) -> Self {
        Self {
            direction: Some(direction),
            edge_type: EdgeType::Layout,
            distance: Some(distance),
        }
    }

    /// Date-hierarchy edge.
    pub fn hierarchy(edge_type: EdgeType) -> Self {
        Self {
            direction: None,
            edge_type,
            distance: None,
        }
    }

    pub fn is_layout_towards(&self, direction: Direction) -> bool {
        self.edge_type == EdgeType::Layout && self.direction == Some(direction)
    }
}
