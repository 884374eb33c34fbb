// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for extraction and signature verification.
//!
//! [`CodecError`] covers every failure from image decoding through record
//! parsing. [`VerifyError`] covers the cases where authenticity cannot be
//! determined at all. A signature that simply does not match is *not* an
//! error: verification returns `Ok(false)`.

use std::io;

use thiserror::Error;

/// Errors that can occur while extracting an embedded record.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The image does not start with the `stealth_pngcomp` marker.
    /// It carries no compatible payload.
    #[error("no embedded payload (magic marker mismatch)")]
    BadMagic,
    /// The image ran out of carrier bits before the declared payload ended.
    #[error("payload truncated: needed {needed} bytes, only {available} available")]
    Truncated { needed: usize, available: usize },
    /// The gzip block failed to inflate.
    #[error("corrupt compressed payload: {0}")]
    CorruptPayload(#[source] io::Error),
    /// The decompressed JSON does not have the expected shape.
    #[error("malformed record at `{path}`: {source}")]
    MalformedRecord {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// Reading the input failed.
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
    /// The input could not be decoded as an image.
    #[error("image decode failure: {0}")]
    Image(#[from] image::ImageError),
}

/// Coarse classification of [`CodecError`], for callers that decide
/// skip-versus-abort without inspecting payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadMagic,
    Truncated,
    CorruptPayload,
    MalformedRecord,
    IoFailure,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadMagic => ErrorKind::BadMagic,
            Self::Truncated { .. } => ErrorKind::Truncated,
            Self::CorruptPayload(_) => ErrorKind::CorruptPayload,
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::Io(_) | Self::Image(_) => ErrorKind::IoFailure,
        }
    }

    /// `true` when the image is simply not a carrier (as opposed to a carrier
    /// whose payload is damaged).
    pub fn is_no_payload(&self) -> bool {
        matches!(self, Self::BadMagic)
    }
}

/// Errors that prevent signature verification from reaching a verdict.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The record was not produced by [`extract`](crate::extract) in this
    /// process, so the verbatim comment and pixel data are unknown.
    #[error("verification unavailable: record has no raw extraction context")]
    VerificationUnavailable,
    /// `signed_hash` is not valid base64.
    #[error("malformed signature encoding: {0}")]
    MalformedSignature(#[from] base64::DecodeError),
    /// The verification key could not be decoded into an Ed25519 point.
    #[error("malformed verification key: {0}")]
    MalformedKey(String),
}
