//! Polygon geometry parsed from the grid's JSON column.

use serde::Serialize;
use serde_json::Value;

/// `[lon, lat]` pair.
pub type Position = [f64; 2];

/// Closed outer ring of a cell. Inner rings are not used for clipping exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    ring: Vec<Position>,
}

/// Reasons a polygon cannot be sent to the resolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecError {
    #[error("geometry is empty")]
    EmptyGeometry,
    #[error("ring has {0} positions, need at least 4")]
    TooFewPositions(usize),
    #[error("ring is not closed")]
    UnclosedRing,
    #[error("coordinate {0} is not finite")]
    NonFiniteCoordinate(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum GeometryParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported geometry type {0:?}")]
    UnsupportedType(String),
    #[error("expected a list of rings of [lon, lat] positions")]
    BadCoordinates,
}

impl Polygon {
    pub fn new(ring: Vec<Position>) -> Self {
        Self { ring }
    }

    pub fn ring(&self) -> &[Position] {
        &self.ring
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// A ring is usable when it has at least four finite positions and
    /// its first and last positions coincide.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.ring.is_empty() {
            return Err(SpecError::EmptyGeometry);
        }
        if let Some(i) = self
            .ring
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(SpecError::NonFiniteCoordinate(i));
        }
        if self.ring.len() < 4 {
            return Err(SpecError::TooFewPositions(self.ring.len()));
        }
        if self.ring.first() != self.ring.last() {
            return Err(SpecError::UnclosedRing);
        }
        Ok(())
    }

    /// GeoJSON `Polygon` object for the resolver request.
    pub fn to_geojson(&self) -> Value {
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [self.ring],
        })
    }
}

/// Parses either a GeoJSON Polygon object or a bare `[[[lon, lat], ...]]`
/// coordinate list. Only the first ring is kept. Positions with a third
/// (elevation) component are accepted and truncated.
pub fn parse_geometry(raw: &str) -> Result<Polygon, GeometryParseError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    let coordinates = match value {
        Value::Object(mut obj) => {
            match obj.get("type").and_then(Value::as_str) {
                Some("Polygon") | None => {}
                Some(other) => return Err(GeometryParseError::UnsupportedType(other.to_string())),
            }
            obj.remove("coordinates")
                .ok_or(GeometryParseError::BadCoordinates)?
        }
        other => other,
    };

    let rings: Vec<Vec<Vec<f64>>> =
        serde_json::from_value(coordinates).map_err(|_| GeometryParseError::BadCoordinates)?;
    let Some(outer) = rings.into_iter().next() else {
        return Ok(Polygon::new(Vec::new()));
    };
    let ring = outer
        .into_iter()
        .map(|pos| match pos.as_slice() {
            [lon, lat, ..] => Ok([*lon, *lat]),
            _ => Err(GeometryParseError::BadCoordinates),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(ring))
}
