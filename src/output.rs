// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JSON sidecar files: `photo.png` gets `photo.json` in the same directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::stego::MetadataRecord;

/// Where the sidecar for `image` goes.
pub fn sidecar_path(image: &Path) -> PathBuf {
    image.with_extension("json")
}

/// Pretty-printed JSON (2-space indent) for a record.
pub fn to_json(record: &MetadataRecord) -> serde_json::Result<String> {
    serde_json::to_string_pretty(record)
}

/// Write the sidecar for `image`, replacing any existing one.
///
/// Returns the path written.
pub fn write_sidecar(image: &Path, record: &MetadataRecord) -> io::Result<PathBuf> {
    let path = sidecar_path(image);
    let json = to_json(record)?;
    fs::write(&path, json.as_bytes())?;
    tracing::info!(path = %path.display(), bytes = json.len(), "wrote metadata");
    Ok(path)
}
