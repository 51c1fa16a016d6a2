//! In-memory resolver and downloader doubles for executor tests.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Mutex;

use zip::write::SimpleFileOptions;

use crate::downloader::Downloader;
use crate::grid::{Cell, Polygon};
use crate::product::ProductSpec;
use crate::resolver::{ResolveError, ResolvedDownload, Resolver};
use crate::retry::FetchError;

const SCHEME: &str = "mem://";

pub(crate) fn cell(id: u64) -> Cell {
    let x = id as f64 * 0.1;
    Cell::new(
        id,
        Polygon::new(vec![[x, 44.0], [x + 0.1, 44.0], [x + 0.1, 44.1], [x, 44.1], [x, 44.0]]),
    )
}

pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, body) in entries {
        writer.start_file(*name, opts).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Archive holding a single `{key}.tif`.
pub(crate) fn raster_zip(key: &str) -> Vec<u8> {
    let name = format!("{}.tif", key);
    zip_bytes(&[(name.as_str(), key.as_bytes())])
}

/// Archive whose second entry fails its checksum during extraction.
pub(crate) fn corrupt_zip() -> Vec<u8> {
    let mut bytes = zip_bytes(&[("a.tif", &[b'A'; 64][..]), ("b.tif", &[b'B'; 64][..])]);
    let pos = bytes
        .windows(8)
        .position(|w| w == [b'B'; 8])
        .unwrap();
    bytes[pos] = b'X';
    bytes
}

fn bump(calls: &Mutex<HashMap<String, u32>>, key: &str) -> u32 {
    let mut calls = calls.lock().unwrap();
    let n = calls.entry(key.to_string()).or_insert(0);
    *n += 1;
    *n
}

/// Resolves every spec to `mem://{key}`; can fail the first N calls per key.
#[derive(Default)]
pub(crate) struct MemResolver {
    fail_first: HashMap<String, u32>,
    calls: Mutex<HashMap<String, u32>>,
}

impl MemResolver {
    pub(crate) fn failing_first(mut self, key: &str, n: u32) -> Self {
        self.fail_first.insert(key.to_string(), n);
        self
    }

    pub(crate) fn calls(&self, key: &str) -> u32 {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

impl Resolver for MemResolver {
    fn resolve(&self, spec: &ProductSpec) -> Result<ResolvedDownload, ResolveError> {
        let key = spec.key();
        let n = bump(&self.calls, &key);
        if n <= self.fail_first.get(&key).copied().unwrap_or(0) {
            return Err(ResolveError::Unavailable("export quota exceeded".to_string()));
        }
        Ok(ResolvedDownload::new(format!("{}{}", SCHEME, key)))
    }
}

/// Serves `raster_zip(key)` for `mem://{key}` unless scripted otherwise.
#[derive(Default)]
pub(crate) struct MemDownloader {
    fail_first: HashMap<String, u32>,
    always_fail: HashSet<String>,
    bodies: HashMap<String, Vec<u8>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl MemDownloader {
    pub(crate) fn failing_first(mut self, key: &str, n: u32) -> Self {
        self.fail_first.insert(key.to_string(), n);
        self
    }

    pub(crate) fn always_failing(mut self, key: &str) -> Self {
        self.always_fail.insert(key.to_string());
        self
    }

    pub(crate) fn with_body(mut self, key: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(key.to_string(), body);
        self
    }

    pub(crate) fn calls(&self, key: &str) -> u32 {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

impl Downloader for MemDownloader {
    fn fetch(&self, source: &ResolvedDownload, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let key = source
            .url
            .strip_prefix(SCHEME)
            .expect("mem:// url from MemResolver");
        let n = bump(&self.calls, key);
        if self.always_fail.contains(key) || n <= self.fail_first.get(key).copied().unwrap_or(0) {
            return Err(FetchError::Http(503));
        }
        let body = self
            .bodies
            .get(key)
            .cloned()
            .unwrap_or_else(|| raster_zip(key));
        sink.write_all(&body).map_err(FetchError::Storage)?;
        sink.flush().map_err(FetchError::Storage)?;
        Ok(body.len() as u64)
    }
}
