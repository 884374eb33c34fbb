// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Alpha-channel LSB bit extraction.
//!
//! The embedded stream is carried one bit per pixel in the least-significant
//! bit of the alpha channel. Pixels are visited **column-major**: the outer
//! loop walks columns `0..W`, the inner loop walks rows `0..H`. Bits are
//! packed MSB-first into bytes.
//!
//! ```text
//! bit k  ->  pixel (row = k % H, col = k / H)
//! ```
//!
//! Note that signature verification hashes pixels in row-major order; the
//! two traversals are deliberately different.

use image::RgbaImage;

use crate::stego::error::CodecError;

/// Byte offset of the alpha sample within one RGBA pixel.
const ALPHA: usize = 3;

/// Sequential reader over the alpha-LSB bit plane of an RGBA image.
///
/// Indexes straight into the image's flat RGBA buffer, so no per-pixel copy
/// of the raster is made.
pub struct LsbReader<'a> {
    pixels: &'a [u8],
    width: usize,
    height: usize,
    /// Next bit index in column-major order.
    pos: usize,
}

impl<'a> LsbReader<'a> {
    /// Create a reader positioned at the first pixel (row 0, column 0).
    pub fn new(image: &'a RgbaImage) -> Self {
        Self {
            pixels: image.as_raw(),
            width: image.width() as usize,
            height: image.height() as usize,
            pos: 0,
        }
    }

    /// Total number of carrier bits (one per pixel).
    pub fn capacity_bits(&self) -> usize {
        self.width * self.height
    }

    /// Bits not yet consumed.
    pub fn remaining_bits(&self) -> usize {
        self.capacity_bits() - self.pos
    }

    /// Whole bytes that can still be read.
    pub fn remaining_bytes(&self) -> usize {
        self.remaining_bits() / 8
    }

    /// Read the next bit, or `None` once the last pixel has been consumed.
    pub fn next_bit(&mut self) -> Option<u8> {
        if self.pos >= self.capacity_bits() {
            return None;
        }
        let col = self.pos / self.height;
        let row = self.pos % self.height;
        self.pos += 1;
        let idx = (row * self.width + col) * 4 + ALPHA;
        Some(self.pixels[idx] & 1)
    }

    /// Assemble the next 8 bits into a byte, MSB first.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.remaining_bits() < 8 {
            return None;
        }
        let mut byte = 0u8;
        for _ in 0..8 {
            // Capacity was checked above, every bit is present.
            let bit = self.next_bit().unwrap_or(0);
            byte = (byte << 1) | bit;
        }
        Some(byte)
    }

    /// Fill `buf` completely or fail with [`CodecError::Truncated`].
    ///
    /// On failure nothing is consumed.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        let available = self.remaining_bytes();
        if buf.len() > available {
            return Err(CodecError::Truncated { needed: buf.len(), available });
        }
        for slot in buf.iter_mut() {
            *slot = self.read_byte().unwrap_or(0);
        }
        Ok(())
    }

    /// Read exactly `n` bytes.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>, CodecError> {
        let mut buf = vec![0u8; n.min(self.remaining_bytes())];
        if buf.len() < n {
            return Err(CodecError::Truncated { needed: n, available: buf.len() });
        }
        self.read_into(&mut buf)?;
        Ok(buf)
    }
}
