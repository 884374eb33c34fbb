// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Batch extraction over files and directories.
//!
//! One task per file. With the `parallel` feature the tasks run on a rayon
//! pool sized to `jobs` (or the available parallelism); without it they run
//! one after another. Either way [`run_batch`] returns only after every file
//! has been processed, and a failing file never stops the others.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::stego::{extract_from_path, CodecError, MetadataRecord, VerifyError};

/// Knobs for [`run_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Worker count. `None` uses the available parallelism.
    pub jobs: Option<usize>,
    /// Also check each record's signature.
    pub verify: bool,
}

/// Result of processing one file successfully.
#[derive(Debug)]
pub struct FileOutcome {
    /// Extracted record, without its raw context.
    pub record: MetadataRecord,
    /// Signature verdict, `None` when verification was not requested.
    pub authentic: Option<Result<bool, VerifyError>>,
}

/// Per-file results of a batch, keyed by path.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: BTreeMap<PathBuf, Result<FileOutcome, CodecError>>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&PathBuf, &FileOutcome)> {
        self.results
            .iter()
            .filter_map(|(path, r)| r.as_ref().ok().map(|o| (path, o)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&PathBuf, &CodecError)> {
        self.results
            .iter()
            .filter_map(|(path, r)| r.as_ref().err().map(|e| (path, e)))
    }
}

/// `true` for paths ending in `.png` (any case).
pub fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// Expand files and directories into the sorted, de-duplicated list of PNG
/// files beneath them. Unreadable entries are logged and skipped.
pub fn discover(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for path in paths {
        walk(path, &mut found);
    }
    found.sort();
    found.dedup();
    found
}

fn walk(path: &Path, found: &mut Vec<PathBuf>) {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot stat path");
            return;
        }
    };

    if meta.is_dir() {
        tracing::debug!(path = %path.display(), "entering directory");
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read directory");
                return;
            }
        };
        for entry in entries {
            match entry {
                Ok(entry) => walk(&entry.path(), found),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "bad directory entry"),
            }
        }
    } else if is_png(path) {
        found.push(path.to_path_buf());
    } else {
        tracing::debug!(path = %path.display(), "skipping non-PNG file");
    }
}

/// Extract (and optionally verify) every file, collecting one entry per path.
pub fn run_batch(files: &[PathBuf], options: &BatchOptions) -> BatchReport {
    let results = Mutex::new(BTreeMap::new());

    let task = |path: &PathBuf| {
        let outcome = process_file(path, options.verify);
        match &outcome {
            Ok(_) => tracing::debug!(path = %path.display(), "extracted"),
            Err(e) if e.is_no_payload() => {
                tracing::debug!(path = %path.display(), "no embedded metadata")
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "extraction failed"),
        }
        results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.clone(), outcome);
    };

    dispatch(files, options.jobs, task);

    let report = BatchReport {
        results: results.into_inner().unwrap_or_else(PoisonError::into_inner),
    };
    tracing::info!(
        files = report.len(),
        ok = report.succeeded().count(),
        failed = report.failed().count(),
        "batch complete"
    );
    report
}

fn process_file(path: &Path, verify: bool) -> Result<FileOutcome, CodecError> {
    let mut record = extract_from_path(path)?;
    let authentic = verify.then(|| {
        let verdict = record.verify();
        if let Err(e) = &verdict {
            tracing::warn!(path = %path.display(), error = %e, "signature check unavailable");
        }
        verdict
    });
    // The verdict is final here; the pixel buffer need not outlive the task.
    record.discard_raw();
    Ok(FileOutcome { record, authentic })
}

#[cfg(feature = "parallel")]
fn dispatch<F>(files: &[PathBuf], jobs: Option<usize>, task: F)
where
    F: Fn(&PathBuf) + Send + Sync,
{
    use rayon::prelude::*;

    let Some(jobs) = jobs else {
        files.par_iter().for_each(&task);
        return;
    };
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| files.par_iter().for_each(&task)),
        Err(e) => {
            tracing::warn!(jobs, error = %e, "cannot build worker pool, using global pool");
            files.par_iter().for_each(&task);
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn dispatch<F>(files: &[PathBuf], _jobs: Option<usize>, task: F)
where
    F: Fn(&PathBuf),
{
    files.iter().for_each(task);
}
