//! CSV grid loading.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::geometry::{parse_geometry, GeometryParseError};
use super::Cell;

/// A grid row that could not be turned into a cell. The row is skipped.
#[derive(Debug, thiserror::Error)]
pub enum GridRowError {
    #[error("row {row}: unreadable record: {source}")]
    Record {
        row: u64,
        #[source]
        source: csv::Error,
    },
    #[error("row {row}: geometry field is missing")]
    MissingGeometry { row: u64 },
    #[error("row {row}: {source}")]
    Geometry {
        row: u64,
        #[source]
        source: GeometryParseError,
    },
}

impl GridRowError {
    pub fn row(&self) -> u64 {
        match self {
            GridRowError::Record { row, .. }
            | GridRowError::MissingGeometry { row }
            | GridRowError::Geometry { row, .. } => *row,
        }
    }
}

/// Cells read from a grid plus the rows that had to be skipped.
#[derive(Debug, Default)]
pub struct GridLoad {
    pub cells: Vec<Cell>,
    pub skipped: Vec<GridRowError>,
}

/// Open and read a CSV grid file. A missing file or missing geometry column
/// is fatal; malformed individual rows are not.
pub fn load_grid(path: &Path, geometry_column: &str) -> Result<GridLoad> {
    let file = File::open(path).with_context(|| format!("open grid: {}", path.display()))?;
    read_grid(file, geometry_column).with_context(|| format!("read grid: {}", path.display()))
}

/// Read a CSV grid with a header row. The cell id is the zero-based data row
/// index, so ids stay stable even when earlier rows are skipped.
pub fn read_grid<R: Read>(reader: R, geometry_column: &str) -> Result<GridLoad> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("grid has no header row")?.clone();
    let geo_index = headers
        .iter()
        .position(|h| h.trim() == geometry_column)
        .with_context(|| format!("grid has no {:?} column", geometry_column))?;

    let mut load = GridLoad::default();
    for (row, record) in rdr.records().enumerate() {
        let row = row as u64;
        let parsed = record
            .map_err(|source| GridRowError::Record { row, source })
            .and_then(|record| {
                let raw = record
                    .get(geo_index)
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(GridRowError::MissingGeometry { row })?;
                parse_geometry(raw).map_err(|source| GridRowError::Geometry { row, source })
            });
        match parsed {
            Ok(polygon) => load.cells.push(Cell::new(row, polygon)),
            Err(e) => {
                tracing::warn!("skipping grid {}", e);
                load.skipped.push(e);
            }
        }
    }

    tracing::debug!(
        cells = load.cells.len(),
        skipped = load.skipped.len(),
        "grid loaded"
    );
    Ok(load)
}
