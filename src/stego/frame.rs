// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload frame parsing.
//!
//! The frame is read from the alpha-LSB stream:
//!
//! ```text
//! [15 bytes] magic "stealth_pngcomp"
//! [4 bytes ] payload length in BITS (big-endian u32)
//! [L bytes ] gzip stream, L = length / 8
//! ```

use crate::stego::error::CodecError;
use crate::stego::lsb::LsbReader;

/// Marker identifying a compressed stealth payload.
pub const MAGIC: &[u8; 15] = b"stealth_pngcomp";

/// Size of the length field in bytes.
pub const LENGTH_LEN: usize = 4;

/// Fixed overhead before the compressed block.
pub const FRAME_HEADER_LEN: usize = MAGIC.len() + LENGTH_LEN; // 19

/// Read and validate the frame header, then return the compressed block.
///
/// # Errors
/// - [`CodecError::BadMagic`] if the first 15 bytes are not the marker.
/// - [`CodecError::Truncated`] if the image is too small for the header or
///   for the declared block length.
pub fn parse_frame(reader: &mut LsbReader<'_>) -> Result<Vec<u8>, CodecError> {
    let mut magic = [0u8; MAGIC.len()];
    reader.read_into(&mut magic)?;
    if &magic != MAGIC {
        return Err(CodecError::BadMagic);
    }

    let mut len_bytes = [0u8; LENGTH_LEN];
    reader.read_into(&mut len_bytes)?;
    let bit_len = u32::from_be_bytes(len_bytes);
    let byte_len = (bit_len / 8) as usize;

    // Check before allocating: a foreign payload may declare up to 512 MiB.
    let available = reader.remaining_bytes();
    if byte_len > available {
        return Err(CodecError::Truncated { needed: byte_len, available });
    }

    tracing::debug!(bit_len, byte_len, "stealth frame header");
    reader.read(byte_len)
}
