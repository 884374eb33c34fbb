// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embedded metadata record and its JSON parsing.
//!
//! The decompressed payload is a JSON object:
//!
//! ```text
//! {
//!   "Description": "...",
//!   "Software": "...",
//!   "Source": "...",
//!   "Generation time": "...",        (optional)
//!   "Comment": "{\"prompt\": ...}"  (optional, a JSON object encoded as a string)
//! }
//! ```
//!
//! `Comment` is captured as a raw string first. The verbatim text is what the
//! signer signed, so it is kept alongside the parsed [`GenerationParameters`]
//! for signature verification.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::stego::error::CodecError;

/// JSON key holding the nested generation parameters.
pub const COMMENT_KEY: &str = "Comment";

/// Metadata recovered from a stealth PNG.
///
/// Serializes with the same key names as the embedded record; optional
/// fields are omitted when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(rename = "Comment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<GenerationParameters>,
    #[serde(rename = "Description", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "Generation time", default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<String>,
    #[serde(rename = "Software", default, deserialize_with = "null_as_default")]
    pub software: String,
    #[serde(rename = "Source", default, deserialize_with = "null_as_default")]
    pub source: String,

    /// Present only on records produced by [`extract`](crate::extract) that
    /// carry a comment.
    #[serde(skip)]
    pub(crate) raw: Option<RawContext>,
}

impl MetadataRecord {
    /// `true` if the record carries a signature in its comment.
    pub fn is_signed(&self) -> bool {
        self.comment
            .as_ref()
            .is_some_and(|c| c.signed_hash.is_some())
    }

    /// `true` if this record still holds the extraction context needed to
    /// verify its signature.
    pub fn has_raw_context(&self) -> bool {
        self.raw.is_some()
    }

    /// Drop the verbatim comment and the image reference. Afterwards the
    /// record can no longer be verified.
    pub(crate) fn discard_raw(&mut self) {
        self.raw = None;
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Generation parameters carried in the nested `Comment` record.
///
/// Missing or `null` fields take their zero value; unknown fields are ignored.
/// When present, `signed_hash` is the last key the signer wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters {
    #[serde(deserialize_with = "null_as_default")]
    pub prompt: String,
    #[serde(deserialize_with = "null_as_default")]
    pub steps: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub height: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub width: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub scale: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub uncond_scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg_rescale: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub seed: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub n_samples: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_debug_overlay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_v3_extend: Option<bool>,
    pub reference_information_extracted_multiple: Option<Vec<Value>>,
    pub reference_strength_multiple: Option<Vec<Value>>,
    #[serde(deserialize_with = "null_as_default")]
    pub sampler: String,
    #[serde(deserialize_with = "null_as_default")]
    pub controlnet_strength: f64,
    pub controlnet_model: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub dynamic_thresholding: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub dynamic_thresholding_percentile: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub dynamic_thresholding_mimic_scale: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub sm: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub sm_dyn: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub skip_cfg_below_sigma: f64,
    pub lora_unet_weights: Value,
    pub lora_clip_weights: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_noise_seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub uc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub request_type: String,
    /// Base64 Ed25519 signature over pixels + comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_hash: Option<String>,
}

/// Verbatim comment text plus the image it was extracted from.
#[derive(Clone)]
pub(crate) struct RawContext {
    pub(crate) comment: String,
    pub(crate) image: Arc<RgbaImage>,
}

impl fmt::Debug for RawContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawContext")
            .field("comment_len", &self.comment.len())
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

/// Top-level shape as embedded: `Comment` is still an unparsed string.
#[derive(Deserialize)]
struct EmbeddedRecord {
    #[serde(rename = "Comment", default)]
    comment: Option<String>,
    #[serde(rename = "Description", default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(rename = "Generation time", default)]
    generation_time: Option<String>,
    #[serde(rename = "Software", default, deserialize_with = "null_as_default")]
    software: String,
    #[serde(rename = "Source", default, deserialize_with = "null_as_default")]
    source: String,
}

/// Parse the decompressed payload, attaching `image` as the raw context when
/// a comment is present.
pub(crate) fn parse_record(
    bytes: &[u8],
    image: &Arc<RgbaImage>,
) -> Result<MetadataRecord, CodecError> {
    let embedded: EmbeddedRecord = serde_json::from_slice(bytes)
        .map_err(|source| CodecError::MalformedRecord { path: "$".into(), source })?;

    let (comment, raw) = match embedded.comment {
        Some(text) if !text.is_empty() => {
            let params: GenerationParameters = serde_json::from_str(&text).map_err(|source| {
                CodecError::MalformedRecord { path: format!("$.{COMMENT_KEY}"), source }
            })?;
            let raw = RawContext { comment: text, image: Arc::clone(image) };
            (Some(params), Some(raw))
        }
        _ => (None, None),
    };

    Ok(MetadataRecord {
        comment,
        description: embedded.description,
        generation_time: embedded.generation_time,
        software: embedded.software,
        source: embedded.source,
        raw,
    })
}
