//! Resolver backed by an HTTP export endpoint.
//!
//! POSTs one JSON export request per product and expects `{"url": "..."}`
//! back. The returned URL must be an absolute http(s) URL.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use super::{ResolveError, ResolvedDownload, Resolver};
use crate::config::ResolverConfig;
use crate::product::ProductSpec;

/// Longest error body echoed back in a `Rejected` message.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpResolver {
    endpoint: Url,
    headers: BTreeMap<String, String>,
    timeout: Duration,
    connect_timeout: Duration,
}

/// JSON body describing one export.
pub fn export_request_body(spec: &ProductSpec) -> Value {
    let render = &spec.render;
    let mut body = json!({
        "name": spec.key(),
        "product": spec.product.as_str(),
        "region": spec.geometry.to_geojson(),
        "crs": render.crs,
        "filePerBand": render.file_per_band,
    });
    if let Some(scale) = render.scale {
        body["scale"] = json!(scale);
    }
    if !render.bands.is_empty() {
        body["bands"] = json!(render.bands);
    }
    if let Some(extra) = &render.extra {
        body["extra"] = extra.clone();
    }
    body
}

impl HttpResolver {
    pub fn new(endpoint: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid resolver endpoint: {}", endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("resolver endpoint must be http(s): {}", endpoint);
        }
        Ok(Self {
            endpoint,
            headers: BTreeMap::new(),
            timeout,
            connect_timeout,
        })
    }

    /// Build from the `[resolver]` config section. A missing endpoint is fatal.
    pub fn from_config(cfg: &ResolverConfig, connect_timeout: Duration) -> Result<Self> {
        let endpoint = cfg
            .endpoint
            .as_deref()
            .context("resolver.endpoint is not configured")?;
        let mut resolver = Self::new(endpoint, Duration::from_secs(cfg.timeout_secs), connect_timeout)?;
        resolver.headers = cfg.headers.clone();
        Ok(resolver)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn easy(&self) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(self.endpoint.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(5)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        Ok(easy)
    }

    fn header_list(&self) -> Result<curl::easy::List, curl::Error> {
        let mut list = curl::easy::List::new();
        list.append("Content-Type: application/json")?;
        list.append("Accept: application/json")?;
        for (k, v) in &self.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        Ok(list)
    }
}

fn parse_response(body: &[u8]) -> Result<ResolvedDownload, ResolveError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ResolveError::InvalidResponse(format!("not JSON: {}", e)))?;
    let raw = value
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| ResolveError::InvalidResponse("missing \"url\" field".to_string()))?;
    let url = Url::parse(raw)
        .map_err(|e| ResolveError::InvalidResponse(format!("bad url {:?}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ResolveError::InvalidResponse(format!(
            "unsupported url scheme: {}",
            url.scheme()
        )));
    }
    Ok(ResolvedDownload::new(url.to_string()))
}

impl Resolver for HttpResolver {
    fn resolve(&self, spec: &ProductSpec) -> Result<ResolvedDownload, ResolveError> {
        let payload = serde_json::to_vec(&export_request_body(spec))
            .map_err(|e| ResolveError::Unavailable(format!("encode request: {}", e)))?;

        let mut easy = self.easy()?;
        easy.post(true)?;
        easy.post_fields_copy(&payload)?;
        easy.http_headers(self.header_list()?)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        if !(200..300).contains(&status) {
            let mut message = String::from_utf8_lossy(&body).trim().to_string();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            return Err(ResolveError::Rejected { status, message });
        }
        let resolved = parse_response(&body)?;
        tracing::debug!(key = %spec.key(), "resolved download url");
        Ok(resolved)
    }

    /// Any HTTP response proves the endpoint is reachable; only transport
    /// failures count.
    fn check_reachable(&self) -> Result<()> {
        let mut easy = self
            .easy()
            .context("configure resolver reachability check")?;
        easy.nobody(true).context("configure resolver reachability check")?;
        easy.http_headers(self.header_list().context("configure resolver reachability check")?)
            .context("configure resolver reachability check")?;
        easy.perform()
            .with_context(|| format!("resolver endpoint unreachable: {}", self.endpoint))?;
        let status = easy.response_code().unwrap_or(0);
        tracing::debug!(endpoint = %self.endpoint, status, "resolver endpoint reachable");
        Ok(())
    }
}
