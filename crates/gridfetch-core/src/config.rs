use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::downloader::CurlOptions;
use crate::product::{ProductRequest, ProductType, RenderParams};
use crate::retry::RetryPolicy;

/// Retry policy parameters (`[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per task (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: f64,
    /// Optional upper bound on a single backoff delay, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_secs: Option<f64>,
    /// Randomize each delay within [delay/2, delay].
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_secs: 1.0,
            max_delay_secs: None,
            jitter: true,
        }
    }
}

/// Imagery resolver endpoint (`[resolver]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// URL the export requests are POSTed to. Required for `run`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Hard timeout for one resolver round trip, in seconds.
    pub timeout_secs: u64,
    /// Static headers sent with every resolver request (e.g. Authorization).
    pub headers: BTreeMap<String, String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
            headers: BTreeMap::new(),
        }
    }
}

/// One `[[products]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub product: ProductType,
    pub crs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default)]
    pub bands: Vec<String>,
    #[serde(default)]
    pub file_per_band: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl ProductConfig {
    fn from_defaults(product: ProductType) -> Self {
        let render = product.default_render();
        Self {
            product,
            crs: render.crs,
            scale: render.scale,
            bands: render.bands,
            file_per_band: render.file_per_band,
            extra: render.extra,
        }
    }

    pub fn to_request(&self) -> ProductRequest {
        ProductRequest::new(
            self.product,
            RenderParams {
                crs: self.crs.clone(),
                scale: self.scale,
                bands: self.bands.clone(),
                file_per_band: self.file_per_band,
                extra: self.extra.clone(),
            },
        )
    }
}

/// Global configuration loaded from `~/.config/gridfetch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridfetchConfig {
    /// Directory holding one sub-directory per (cell, product).
    pub output_root: PathBuf,
    /// Hard ceiling on tasks planned per run (None = unbounded).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_cap: Option<usize>,
    /// Number of tasks executed concurrently.
    pub concurrency: usize,
    /// Abort a download that stalls for this many seconds.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Hard wall-clock limit for one archive download.
    pub transfer_timeout_secs: u64,
    /// CSV column holding the cell polygon.
    pub geometry_column: String,
    pub retry: RetryConfig,
    pub resolver: ResolverConfig,
    pub products: Vec<ProductConfig>,
}

impl Default for GridfetchConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("images"),
            request_cap: None,
            concurrency: 25,
            request_timeout_secs: 10,
            connect_timeout_secs: 10,
            transfer_timeout_secs: 600,
            geometry_column: ".geo".to_string(),
            retry: RetryConfig::default(),
            resolver: ResolverConfig::default(),
            products: ProductType::ALL
                .into_iter()
                .map(ProductConfig::from_defaults)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("retry.max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("retry delays must be finite and non-negative")]
    InvalidDelay,
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("at least one product must be configured")]
    NoProducts,
    #[error("product {0} is configured more than once")]
    DuplicateProduct(ProductType),
}

impl GridfetchConfig {
    /// Reject settings no run could make sense of.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        // Rejects negative, NaN, infinite and values too large for a Duration.
        let delay_ok = |d: f64| Duration::try_from_secs_f64(d).is_ok();
        if !delay_ok(self.retry.base_delay_secs) || !self.retry.max_delay_secs.map_or(true, delay_ok) {
            return Err(ConfigError::InvalidDelay);
        }
        for (name, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("transfer_timeout_secs", self.transfer_timeout_secs),
            ("resolver.timeout_secs", self.resolver.timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout(name));
            }
        }
        if self.products.is_empty() {
            return Err(ConfigError::NoProducts);
        }
        let mut seen = HashSet::new();
        for p in &self.products {
            if !seen.insert(p.product) {
                return Err(ConfigError::DuplicateProduct(p.product));
            }
        }
        Ok(())
    }

    pub fn product_requests(&self) -> Vec<ProductRequest> {
        self.products.iter().map(ProductConfig::to_request).collect()
    }

    /// Effective plan cap (unbounded when unset).
    pub fn cap(&self) -> usize {
        self.request_cap.unwrap_or(usize::MAX)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            stall_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            transfer_timeout: Duration::from_secs(self.transfer_timeout_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gridfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load and validate configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<GridfetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: GridfetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GridfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GridfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}
