// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Decompression of the framed payload block.
//!
//! The block is a standard gzip member (RFC 1952) wrapping the JSON record.

use std::io::{self, Read};

use flate2::read::GzDecoder;

use crate::stego::error::CodecError;

/// Ceiling on the inflated record size. Real records are a few KB; anything
/// beyond this is treated as a decompression bomb.
pub const MAX_INFLATED_BYTES: u64 = 16 * 1024 * 1024;

/// Inflate a gzip block into the raw serialized record.
pub fn inflate(block: &[u8]) -> Result<Vec<u8>, CodecError> {
    inflate_limited(block, MAX_INFLATED_BYTES)
}

fn inflate_limited(block: &[u8], limit: u64) -> Result<Vec<u8>, CodecError> {
    if block.is_empty() {
        return Err(CodecError::CorruptPayload(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "empty payload block",
        )));
    }
    let mut output = Vec::new();
    // Read one byte past the limit to tell "exactly at limit" from "over".
    GzDecoder::new(block)
        .take(limit + 1)
        .read_to_end(&mut output)
        .map_err(CodecError::CorruptPayload)?;
    if output.len() as u64 > limit {
        return Err(CodecError::CorruptPayload(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("inflated payload exceeds {limit} bytes"),
        )));
    }
    tracing::debug!(compressed = block.len(), inflated = output.len(), "payload inflated");
    Ok(output)
}
