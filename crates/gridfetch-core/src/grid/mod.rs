//! Grid source: cells and their polygon geometries.
//!
//! Cells are read once from a CSV file at startup and never mutated. A row
//! whose geometry cannot be parsed is skipped with a warning; it never aborts
//! loading the rest of the grid.

mod geometry;
mod load;

pub use geometry::{parse_geometry, GeometryParseError, Polygon, Position, SpecError};
pub use load::{load_grid, read_grid, GridLoad, GridRowError};

use std::sync::Arc;

/// One grid unit: stable row-index id plus its outer boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: u64,
    pub geometry: Arc<Polygon>,
}

impl Cell {
    pub fn new(id: u64, geometry: Polygon) -> Self {
        Self {
            id,
            geometry: Arc::new(geometry),
        }
    }
}
