// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Stealth-PNG metadata extraction and verification.
//!
//! The extraction pipeline runs strictly in order:
//!
//! 1. [`lsb`]: harvest alpha-channel LSBs, column-major, into bytes.
//! 2. [`frame`]: check the `stealth_pngcomp` marker and read the
//!    length-prefixed block.
//! 3. [`payload`]: gunzip the block.
//! 4. [`record`]: parse the JSON record and its nested `Comment` string.
//!
//! [`signature`] branches off after step 4: it needs the verbatim comment
//! and the decoded pixels, which the record carries privately.

pub mod error;
pub mod frame;
pub mod lsb;
pub mod payload;
pub mod record;
pub mod signature;

use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

pub use error::{CodecError, ErrorKind, VerifyError};
pub use record::{GenerationParameters, MetadataRecord};
pub use signature::Verifier;

use lsb::LsbReader;

/// Extract the embedded record from a decoded RGBA image.
///
/// The image is kept (shared, not copied) by the returned record when it
/// carries a comment, so that [`MetadataRecord::verify`] can run later.
///
/// # Errors
/// - [`CodecError::BadMagic`] if the image carries no stealth payload.
/// - [`CodecError::Truncated`] if the image is smaller than the payload claims.
/// - [`CodecError::CorruptPayload`] if the block does not inflate.
/// - [`CodecError::MalformedRecord`] if the JSON has the wrong shape.
pub fn extract(image: RgbaImage) -> Result<MetadataRecord, CodecError> {
    extract_shared(Arc::new(image))
}

/// Like [`extract`], for an image the caller already shares.
pub fn extract_shared(image: Arc<RgbaImage>) -> Result<MetadataRecord, CodecError> {
    let block = {
        let mut reader = LsbReader::new(&image);
        frame::parse_frame(&mut reader)?
    };
    let json = payload::inflate(&block)?;
    record::parse_record(&json, &image)
}

/// Decode PNG bytes and extract the embedded record.
///
/// Decode failures surface as [`CodecError::Image`].
///
/// 16-bit PNGs are narrowed to 8 bits per channel with rounding
/// (`(a + 128) / 257`), not by dropping the low byte, so the alpha LSBs of
/// such files can differ from a truncating reader's.
pub fn extract_from_bytes(png: &[u8]) -> Result<MetadataRecord, CodecError> {
    let image = image::load_from_memory_with_format(png, ImageFormat::Png)?.into_rgba8();
    tracing::trace!(width = image.width(), height = image.height(), "decoded png");
    extract(image)
}

/// Read a PNG file and extract the embedded record.
pub fn extract_from_path(path: &Path) -> Result<MetadataRecord, CodecError> {
    let bytes = std::fs::read(path)?;
    extract_from_bytes(&bytes)
}
