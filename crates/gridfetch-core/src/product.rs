//! Product types, render parameters and per-cell product requests.
//!
//! A product is one derived raster requested per grid cell. The output key
//! `"{cell_id}-{product_type}"` names both the output directory and the
//! resumption marker, so it must stay stable across releases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::grid::{Polygon, SpecError};

/// Category of derived raster output requested per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductType {
    /// Cloud-filtered multispectral mosaic clipped to the cell.
    MultispectralMosaic,
    /// Per-pixel land-cover classification clipped to the cell.
    LandCoverClassification,
}

impl ProductType {
    pub const ALL: [ProductType; 2] = [
        ProductType::MultispectralMosaic,
        ProductType::LandCoverClassification,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::MultispectralMosaic => "multispectral-mosaic",
            ProductType::LandCoverClassification => "land-cover-classification",
        }
    }

    /// Render parameters used when the config does not list products explicitly.
    pub fn default_render(self) -> RenderParams {
        match self {
            ProductType::MultispectralMosaic => RenderParams {
                crs: "EPSG:4326".to_string(),
                scale: Some(10.0),
                bands: ["B2", "B3", "B4", "B8"].iter().map(|b| b.to_string()).collect(),
                file_per_band: false,
                extra: None,
            },
            ProductType::LandCoverClassification => RenderParams {
                crs: "EPSG:4326".to_string(),
                ..RenderParams::default()
            },
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product type: {0:?}")]
pub struct UnknownProduct(pub String);

impl FromStr for ProductType {
    type Err = UnknownProduct;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProduct(s.to_string()))
    }
}

/// Output-location key for one (cell, product) pair.
pub fn output_key(cell_id: u64, product: ProductType) -> String {
    format!("{}-{}", cell_id, product)
}

/// Render parameters passed through to the resolver untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderParams {
    /// Output projection, e.g. `EPSG:4326`.
    pub crs: String,
    /// Pixel size in metres; `None` lets the service use the native resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Band selection; empty means all bands.
    #[serde(default)]
    pub bands: Vec<String>,
    #[serde(default)]
    pub file_per_band: bool,
    /// Free-form service-specific parameters (collection ids, date windows, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// A product the planner should request for every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRequest {
    pub product: ProductType,
    pub render: Arc<RenderParams>,
}

impl ProductRequest {
    pub fn new(product: ProductType, render: RenderParams) -> Self {
        Self {
            product,
            render: Arc::new(render),
        }
    }

    /// Both product types with their default render parameters, mosaic first.
    pub fn defaults() -> Vec<ProductRequest> {
        ProductType::ALL
            .into_iter()
            .map(|p| ProductRequest::new(p, p.default_render()))
            .collect()
    }
}

/// Request descriptor for one (cell, product) pair. Created by the planner,
/// consumed once by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSpec {
    pub cell_id: u64,
    pub product: ProductType,
    pub geometry: Arc<Polygon>,
    pub render: Arc<RenderParams>,
}

impl ProductSpec {
    pub fn key(&self) -> String {
        output_key(self.cell_id, self.product)
    }

    /// Checks the product spec can be sent to the resolver at all.
    pub fn validate(&self) -> Result<(), SpecError> {
        self.geometry.validate()
    }
}
