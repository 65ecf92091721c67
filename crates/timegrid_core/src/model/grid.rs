//! Timetable grid model.
//!
//! # Responsibility
//! - Hold a rectangular snapshot of optional cell texts.
//! - Address cells by `(row, col)` in row-major order.
//!
//! # Invariants
//! - Every row has exactly `cols` cells.
//! - A present cell always carries non-empty text; empty strings are stored
//!   as absent.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Address of one source cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

impl GridPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Display for GridPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Grid construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A row does not have the same width as the first row.
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ragged {
                row,
                expected,
                actual,
            } => write!(
                f,
                "grid row {row} has {actual} cells, expected {expected}"
            ),
        }
    }
}

impl Error for GridError {}

/// Rectangular table of optional cell texts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<String>>,
}

impl Grid {
    /// Creates an all-absent grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Builds a grid from row vectors.
    ///
    /// # Errors
    /// - Returns `GridError::Ragged` when rows differ in width.
    pub fn from_rows<S: Into<String>>(rows: Vec<Vec<Option<S>>>) -> Result<Self, GridError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::Ragged {
                    row: row_idx,
                    expected: cols,
                    actual: row.len(),
                });
            }
            cells.extend(row.into_iter().map(|cell| normalize_cell(cell.map(Into::into))));
        }

        Ok(Self {
            rows: row_count,
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the text at `(row, col)`, or `None` when absent or out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col].as_deref()
    }

    pub fn is_present(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some()
    }

    /// Iterates present cells in row-major order.
    pub fn present_cells(&self) -> impl Iterator<Item = (GridPosition, &str)> + '_ {
        let cols = self.cols;
        self.cells.iter().enumerate().filter_map(move |(offset, cell)| {
            cell.as_deref()
                .map(|text| (GridPosition::new(offset / cols, offset % cols), text))
        })
    }

    /// Returns the column-major view of this grid as a new grid.
    pub fn transpose(&self) -> Self {
        let mut transposed = Self::new(self.cols, self.rows);
        for (position, text) in self.present_cells() {
            transposed.cells[position.col * self.rows + position.row] = Some(text.to_string());
        }
        transposed
    }
}

fn normalize_cell(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
