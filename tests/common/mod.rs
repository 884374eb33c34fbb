// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Shared helpers: build carrier images and sign comments the way the
//! generator does. Only the test side ever writes payloads.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ed25519_dalek::{Signer, SigningKey};
use flate2::write::GzEncoder;
use flate2::Compression;
use image::{ImageFormat, Rgba, RgbaImage};

use stealth_meta::stego::frame::MAGIC;
use stealth_meta::stego::signature::rgb_bytes;

/// Opaque cover image with varied RGB content.
pub fn cover(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 + y) as u8, (y * 13) as u8, (x ^ y) as u8, 255])
    })
}

/// Write `bytes` into alpha LSBs, column-major, MSB first.
pub fn write_alpha_bits(image: &mut RgbaImage, bytes: &[u8]) {
    let height = image.height() as usize;
    let capacity = image.width() as usize * height;
    assert!(bytes.len() * 8 <= capacity, "carrier too small for test payload");
    for (i, byte) in bytes.iter().enumerate() {
        for b in 0..8 {
            let k = i * 8 + b;
            let bit = (byte >> (7 - b)) & 1;
            let (row, col) = ((k % height) as u32, (k / height) as u32);
            let px = image.get_pixel_mut(col, row);
            px.0[3] = (px.0[3] & !1) | bit;
        }
    }
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::best());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// `MAGIC || u32 BE bit length || block`.
pub fn frame(block: &[u8]) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&((block.len() * 8) as u32).to_be_bytes());
    out.extend_from_slice(block);
    out
}

/// Embed a JSON record into `image` in the stealth format.
pub fn embed_json(image: &mut RgbaImage, json: &[u8]) {
    write_alpha_bits(image, &frame(&gzip(json)));
}

/// Outer record JSON with an optional comment string.
pub fn record_json(description: &str, comment: Option<&str>) -> Vec<u8> {
    let mut value = serde_json::json!({
        "Description": description,
        "Software": "NovelAI",
        "Source": "NovelAI Diffusion V4 4F6B4AF1",
        "Generation time": "2.7",
    });
    if let Some(c) = comment {
        value["Comment"] = serde_json::Value::String(c.to_owned());
    }
    serde_json::to_vec(&value).unwrap()
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

/// Unsigned comment as the generator writes it.
pub fn unsigned_comment(prompt: &str) -> String {
    format!(
        r#"{{"prompt": "{prompt}", "steps": 28, "height": 64, "width": 48, "scale": 5.0, "uncond_scale": 0.0, "cfg_rescale": 0.0, "seed": 1234567890, "n_samples": 1, "noise_schedule": "karras", "sampler": "k_euler_ancestral", "uc": "lowres", "request_type": "PromptGenerateRequest"}}"#
    )
}

/// Sign pixels + comment and append `signed_hash` as the final key.
pub fn sign_comment(image: &RgbaImage, comment: &str, key: &SigningKey) -> String {
    let mut message = rgb_bytes(image);
    message.extend_from_slice(comment.as_bytes());
    let sig = key.sign(&message);
    let body = comment.trim_end().strip_suffix('}').unwrap();
    format!(r#"{body}, "signed_hash": "{}"}}"#, STANDARD.encode(sig.to_bytes()))
}

/// A carrier with a signed record embedded, plus the signed comment text.
pub fn signed_carrier(width: u32, height: u32, prompt: &str) -> (RgbaImage, String) {
    let mut image = cover(width, height);
    let comment = sign_comment(&image, &unsigned_comment(prompt), &signing_key());
    embed_json(&mut image, &record_json(prompt, Some(&comment)));
    (image, comment)
}

pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
