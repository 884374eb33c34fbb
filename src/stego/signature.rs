// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Ed25519 verification of embedded records.
//!
//! The signer signs the concatenation
//!
//! ```text
//! [3·W·H bytes] R,G,B of every pixel, row-major (alpha dropped)
//! [N bytes    ] comment JSON as it was *before* `signed_hash` was appended
//! ```
//!
//! and then appends `"signed_hash": "<base64 sig>"` as the last key of the
//! comment. Verification reverses that last step on the verbatim comment
//! text ([`canonicalize_comment`]) and rebuilds the message.
//!
//! Outcomes are kept distinct:
//! - `Ok(true)`: signature present and valid.
//! - `Ok(false)`: unsigned record, or signature does not match.
//! - `Err(VerifyError::VerificationUnavailable)`: signed record without its
//!   extraction context.
//! - other `Err`: the signature or key is not decodable.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ed25519_dalek::{Signature, Verifier as _, VerifyingKey, PUBLIC_KEY_LENGTH};
use image::RgbaImage;
use once_cell::sync::OnceCell;

use crate::stego::error::VerifyError;
use crate::stego::record::MetadataRecord;

/// Base64 Ed25519 public key of the trusted signer.
pub const TRUSTED_KEY_B64: &str = "Y2JcQAOhLwzwSDUJPNgL04nS0Tbqm7cSRc4xk0vRMic=";

/// Key the signer appends last to the comment object.
const SIGNED_HASH_FIELD: &str = "\"signed_hash\":";

static TRUSTED: OnceCell<Verifier> = OnceCell::new();

/// Checks record signatures against one Ed25519 public key.
#[derive(Debug, Clone)]
pub struct Verifier {
    key: VerifyingKey,
}

impl Verifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Decode a base64 32-byte public key.
    pub fn from_base64(encoded: &str) -> Result<Self, VerifyError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| VerifyError::MalformedKey(e.to_string()))?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            VerifyError::MalformedKey(format!(
                "expected {PUBLIC_KEY_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| VerifyError::MalformedKey(e.to_string()))?;
        Ok(Self::new(key))
    }

    /// The process-wide verifier for [`TRUSTED_KEY_B64`].
    ///
    /// Decoded on first use; concurrent first callers observe one instance.
    pub fn trusted() -> Result<&'static Verifier, VerifyError> {
        TRUSTED.get_or_try_init(|| Verifier::from_base64(TRUSTED_KEY_B64))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }

    /// Verify `record` against this key.
    ///
    /// Unsigned records return `Ok(false)` without consulting the raw context.
    pub fn verify(&self, record: &MetadataRecord) -> Result<bool, VerifyError> {
        let Some(signed_hash) = record.comment.as_ref().and_then(|c| c.signed_hash.as_deref())
        else {
            return Ok(false);
        };
        let raw = record.raw.as_ref().ok_or(VerifyError::VerificationUnavailable)?;

        let sig_bytes = STANDARD.decode(signed_hash)?;
        let Ok(signature) = Signature::from_slice(&sig_bytes) else {
            tracing::debug!(len = sig_bytes.len(), "signature has wrong length");
            return Ok(false);
        };

        let message = signed_message(&raw.image, &raw.comment);
        Ok(self.key.verify(&message, &signature).is_ok())
    }
}

impl MetadataRecord {
    /// Verify the record against the trusted signer key.
    pub fn verify(&self) -> Result<bool, VerifyError> {
        Verifier::trusted()?.verify(self)
    }
}

/// Rebuild the comment text as it was before `signed_hash` was appended.
///
/// Assumes the signer always writes `signed_hash` as the final key. The
/// prefix before the last `"signed_hash":` is stripped of trailing
/// whitespace, commas and braces, then closed with a single `}`. Text
/// without the key is returned unchanged.
pub fn canonicalize_comment(comment: &str) -> String {
    let Some(idx) = comment.rfind(SIGNED_HASH_FIELD) else {
        tracing::trace!("comment has no signed_hash key, left as is");
        return comment.to_owned();
    };
    let prefix = comment[..idx]
        .trim_end_matches(|c: char| c.is_ascii_whitespace() || c == ',' || c == '}');
    let mut out = String::with_capacity(prefix.len() + 1);
    out.push_str(prefix);
    out.push('}');
    out
}

/// R,G,B bytes of every pixel, rows top to bottom, left to right.
pub fn rgb_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);
    for px in image.as_raw().chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    out
}

/// The exact byte string the signer signed: pixel RGB bytes followed by the
/// canonical comment.
pub fn signed_message(image: &RgbaImage, raw_comment: &str) -> Vec<u8> {
    let canonical = canonicalize_comment(raw_comment);
    let mut message = rgb_bytes(image);
    message.extend_from_slice(canonical.as_bytes());
    message
}
