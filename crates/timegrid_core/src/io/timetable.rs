//! Timetable CSV access.
//!
//! # Responsibility
//! - Read headerless timetable CSV exports into a `Grid`.
//! - Write grids back and export unique cell texts for annotation tooling.
//!
//! # Invariants
//! - Ragged rows are padded with absent cells; empty fields are absent.
//! - Reading never reorders cells other than by the explicit `transpose`.

use crate::model::grid::{Grid, GridError};
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Timetable I/O errors.
#[derive(Debug)]
pub enum TimetableIoError {
    Io(std::io::Error),
    Csv(csv::Error),
    Grid(GridError),
}

impl Display for TimetableIoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "timetable io failed: {err}"),
            Self::Csv(err) => write!(f, "invalid timetable csv: {err}"),
            Self::Grid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TimetableIoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Grid(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TimetableIoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for TimetableIoError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<GridError> for TimetableIoError {
    fn from(value: GridError) -> Self {
        Self::Grid(value)
    }
}

/// Options applied while reading a timetable export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimetableCsvOptions {
    /// Swap rows and columns after reading (column-oriented sheets).
    pub transpose: bool,
    /// Rewrite integral numeric text such as `2024.0` as `2024`.
    pub normalize_numbers: bool,
}

impl Default for TimetableCsvOptions {
    fn default() -> Self {
        Self {
            transpose: false,
            normalize_numbers: true,
        }
    }
}

/// Reads a headerless timetable CSV.
pub fn read_grid_csv<R: Read>(reader: R, options: TimetableCsvOptions) -> Result<Grid, TimetableIoError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if options.normalize_numbers {
                        normalize_number(field)
                    } else {
                        field.to_string()
                    }
                })
                .map(Some)
                .collect(),
        );
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.iter().any(|row| row.len() != width) {
        warn!(
            "event=timetable_ragged_rows module=io status=warn width={} detail=\"short rows padded with empty cells\"",
            width
        );
    }
    for row in &mut rows {
        row.resize(width, None);
    }

    let grid = Grid::from_rows(rows)?;
    let grid = if options.transpose {
        grid.transpose()
    } else {
        grid
    };
    info!(
        "event=timetable_loaded module=io status=ok rows={} cols={} transposed={}",
        grid.rows(),
        grid.cols(),
        options.transpose
    );
    Ok(grid)
}

pub fn load_grid_csv(path: &Path, options: TimetableCsvOptions) -> Result<Grid, TimetableIoError> {
    let file = File::open(path)?;
    read_grid_csv(BufReader::new(file), options)
}

/// Writes `grid` as headerless CSV; absent cells become empty fields.
pub fn write_grid_csv<W: Write>(writer: W, grid: &Grid) -> Result<(), TimetableIoError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for row in 0..grid.rows() {
        let record: Vec<&str> = (0..grid.cols())
            .map(|col| grid.get(row, col).unwrap_or(""))
            .collect();
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_grid_csv(path: &Path, grid: &Grid) -> Result<(), TimetableIoError> {
    let file = File::create(path)?;
    write_grid_csv(BufWriter::new(file), grid)?;
    info!(
        "event=timetable_saved module=io status=ok path={}",
        path.display()
    );
    Ok(())
}

/// Writes each distinct present cell text once, in row-major first-seen order.
///
/// Returns the number of lines written.
pub fn write_annotation_input<W: Write>(mut writer: W, grid: &Grid) -> Result<usize, TimetableIoError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut written = 0usize;
    for (_, text) in grid.present_cells() {
        if seen.insert(text) {
            writeln!(writer, "{text}")?;
            written += 1;
        }
    }
    writer.flush()?;
    info!(
        "event=annotation_input_written module=io status=ok unique_texts={}",
        written
    );
    Ok(written)
}

fn normalize_number(field: &str) -> String {
    match field.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        _ => field.to_string(),
    }
}
