// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # stealth-meta
//!
//! Recovers generation metadata hidden in the alpha-channel least-significant
//! bits of PNG images and verifies the Ed25519 signature that the generator
//! attached to it.
//!
//! Embedded format, read column-major from the alpha LSBs:
//!
//! ```text
//! "stealth_pngcomp" || u32 BE bit length || gzip(JSON record)
//! ```
//!
//! - [`stego`]: the bit-exact codec and signature verifier.
//! - [`batch`]: concurrent extraction over files and directories.
//! - [`output`]: JSON sidecar files next to each image.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use stealth_meta::extract_from_bytes;
//!
//! let png = std::fs::read("image.png").unwrap();
//! let record = extract_from_bytes(&png).unwrap();
//! println!("{}", record.description);
//! let authentic = record.verify().unwrap();
//! ```

pub mod batch;
pub mod output;
pub mod stego;

pub use batch::{discover, run_batch, BatchOptions, BatchReport, FileOutcome};
pub use stego::{extract, extract_from_bytes, extract_from_path, extract_shared};
pub use stego::{CodecError, ErrorKind, VerifyError};
pub use stego::{GenerationParameters, MetadataRecord, Verifier};
