// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stealth_meta::{batch, output, BatchOptions};

/// Extract stealth PNG generation metadata into JSON sidecar files.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// PNG files or directories (prompted for on stdin when omitted)
    paths: Vec<PathBuf>,

    /// Worker threads (defaults to available parallelism)
    #[arg(short, long, env = "STEALTH_META_JOBS")]
    jobs: Option<usize>,

    /// Check each record's signature against the trusted key
    #[arg(long)]
    verify: bool,

    /// Print JSON to stdout instead of writing sidecar files
    #[arg(long)]
    stdout: bool,

    /// Extract only; write nothing
    #[arg(long, conflicts_with = "stdout")]
    dry_run: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let paths = if args.paths.is_empty() {
        prompt_for_paths()?
    } else {
        args.paths.clone()
    };

    let files = batch::discover(&paths);
    tracing::info!(count = files.len(), "discovered PNG files");

    let options = BatchOptions {
        jobs: args.jobs,
        verify: args.verify,
    };
    let report = batch::run_batch(&files, &options);

    let stdout = io::stdout();
    for (path, outcome) in report.succeeded() {
        match &outcome.authentic {
            Some(Ok(true)) => tracing::info!(path = %path.display(), "signature valid"),
            Some(Ok(false)) => tracing::info!(path = %path.display(), "unsigned or signature invalid"),
            Some(Err(_)) | None => {}
        }

        if args.dry_run {
            continue;
        }
        if args.stdout {
            let json = output::to_json(&outcome.record)
                .with_context(|| format!("serializing metadata for {}", path.display()))?;
            writeln!(stdout.lock(), "{json}")?;
            continue;
        }
        if let Err(e) = output::write_sidecar(path, &outcome.record) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write metadata");
        }
    }

    Ok(())
}

/// Read whitespace-separated paths from one line of stdin.
fn prompt_for_paths() -> Result<Vec<PathBuf>> {
    print!("Enter image files or directories separated by space: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading paths from stdin")?;

    let paths: Vec<PathBuf> = line.split_whitespace().map(PathBuf::from).collect();
    if paths.is_empty() {
        bail!("no input provided");
    }
    Ok(paths)
}
