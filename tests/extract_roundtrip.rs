// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Round-trip integration tests for stealth PNG extraction.

mod common;

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
use stealth_meta::stego::frame::{parse_frame, MAGIC};
use stealth_meta::stego::lsb::LsbReader;
use stealth_meta::stego::payload::inflate;
use stealth_meta::{extract, extract_from_bytes, CodecError, ErrorKind};

use common::*;

#[test]
fn payload_bytes_roundtrip_exactly() {
    let comment = unsigned_comment("a lighthouse at dusk");
    let json = record_json("a lighthouse at dusk", Some(&comment));
    let mut image = cover(128, 128);
    embed_json(&mut image, &json);

    let mut reader = LsbReader::new(&image);
    let block = parse_frame(&mut reader).unwrap();
    assert_eq!(inflate(&block).unwrap(), json);
}

#[test]
fn record_without_comment() {
    let json = record_json("plain record", None);
    let mut image = cover(96, 96);
    embed_json(&mut image, &json);

    let record = extract(image).unwrap();
    assert_eq!(record.description, "plain record");
    assert_eq!(record.software, "NovelAI");
    assert_eq!(record.source, "NovelAI Diffusion V4 4F6B4AF1");
    assert_eq!(record.generation_time.as_deref(), Some("2.7"));
    assert!(record.comment.is_none());
    assert!(!record.has_raw_context());

    // Output JSON mirrors the embedded record exactly.
    let original: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(serde_json::to_value(&record).unwrap(), original);
}

#[test]
fn record_with_comment() {
    let comment = unsigned_comment("a red fox");
    let mut image = cover(128, 128);
    embed_json(&mut image, &record_json("a red fox", Some(&comment)));

    let record = extract(image).unwrap();
    let params = record.comment.as_ref().unwrap();
    assert_eq!(params.prompt, "a red fox");
    assert_eq!(params.steps, 28);
    assert_eq!(params.seed, 1_234_567_890);
    assert_eq!(params.sampler, "k_euler_ancestral");
    assert_eq!(params.noise_schedule.as_deref(), Some("karras"));
    assert_eq!(params.uc, "lowres");
    assert!(params.signed_hash.is_none());
    assert!(record.has_raw_context());
    assert!(!record.is_signed());

    // Re-serialized comment is a JSON object, not a string.
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["Comment"]["prompt"], "a red fox");
}

#[test]
fn extract_through_png_encoding() {
    let (image, _) = signed_carrier(128, 128, "through png");
    let png = encode_png(&image);

    let record = extract_from_bytes(&png).unwrap();
    assert_eq!(record.description, "through png");
    assert!(record.is_signed());
}

#[test]
fn plain_image_is_bad_magic() {
    let image = cover(64, 64);
    let err = extract(image).unwrap_err();
    assert!(matches!(err, CodecError::BadMagic));
    assert_eq!(err.kind(), ErrorKind::BadMagic);
}

#[test]
fn fully_transparent_image_is_bad_magic() {
    let image = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0]));
    assert!(matches!(extract(image), Err(CodecError::BadMagic)));
}

#[test]
fn tiny_image_is_truncated_not_panic() {
    let image = cover(3, 2);
    assert!(matches!(extract(image), Err(CodecError::Truncated { .. })));
}

#[test]
fn declared_length_beyond_capacity_is_truncated() {
    let mut image = cover(32, 32);
    let mut stream = MAGIC.to_vec();
    stream.extend_from_slice(&(1_000_000u32 * 8).to_be_bytes());
    write_alpha_bits(&mut image, &stream);

    match extract(image) {
        Err(CodecError::Truncated { needed, available }) => {
            assert_eq!(needed, 1_000_000);
            assert_eq!(available, 32 * 32 / 8 - 19);
        }
        other => panic!("expected Truncated, got {other:?}"),
    }
}

#[test]
fn garbage_block_is_corrupt_payload() {
    let mut image = cover(64, 64);
    write_alpha_bits(&mut image, &frame(b"this is not gzip data"));
    let err = extract(image).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptPayload);
}

#[test]
fn non_json_payload_is_malformed_record() {
    let mut image = cover(64, 64);
    embed_json(&mut image, b"<xml/>");
    let err = extract(image).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedRecord);
}

#[test]
fn bad_nested_comment_is_malformed_record() {
    let mut image = cover(96, 96);
    embed_json(&mut image, &record_json("x", Some("{not json")));
    match extract(image) {
        Err(CodecError::MalformedRecord { path, .. }) => assert_eq!(path, "$.Comment"),
        other => panic!("expected MalformedRecord, got {other:?}"),
    }
}

#[test]
fn non_png_bytes_are_io_failure() {
    let err = extract_from_bytes(b"GIF89a....").unwrap_err();
    assert!(matches!(err, CodecError::Image(_)));
    assert_eq!(err.kind(), ErrorKind::IoFailure);
}

#[test]
fn sixteen_bit_png_narrows_by_rounding() {
    let (carrier, _) = signed_carrier(128, 128, "sixteen bits");
    // Exact 8-to-16 bit widening survives the rounding narrow unchanged.
    let wide: ImageBuffer<Rgba<u16>, Vec<u16>> = ImageBuffer::from_fn(128, 128, |x, y| {
        Rgba(carrier.get_pixel(x, y).0.map(|c| u16::from(c) * 257))
    });
    let mut png = Cursor::new(Vec::new());
    wide.write_to(&mut png, ImageFormat::Png).unwrap();

    let record = extract_from_bytes(&png.into_inner()).unwrap();
    assert_eq!(record.description, "sixteen bits");
    assert!(record.is_signed());

    // A high-byte-only alpha rounds down: 0xFF00 becomes 254, not 255.
    let edge = ImageBuffer::from_pixel(1, 1, Rgba([0u16, 0, 0, 0xFF00]));
    let narrowed = DynamicImage::ImageRgba16(edge).into_rgba8();
    assert_eq!(narrowed.get_pixel(0, 0).0[3], 254);
}
