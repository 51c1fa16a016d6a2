#![allow(dead_code)]

pub mod export_server;

use std::io::{Cursor, Write};

use gridfetch_core::grid::{Cell, Polygon};

/// Square cell one tenth of a degree wide, offset by its id.
pub fn cell(id: u64) -> Cell {
    let x = -83.0 + id as f64 * 0.1;
    Cell::new(
        id,
        Polygon::new(vec![[x, 42.0], [x + 0.1, 42.0], [x + 0.1, 42.1], [x, 42.1], [x, 42.0]]),
    )
}

/// Stored (uncompressed) zip of the given entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, body) in entries {
        writer.start_file(*name, opts).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
