// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fetching and unpacking RDF dumps

use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Progress bar for a known byte count, or a spinner when the size is unknown
pub fn byte_progress(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) => {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] [{bar:40}] {bytes}/{total_bytes} ({eta})",
            ) {
                bar.set_style(style.progress_chars("=> "));
            }
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bytes}") {
                bar.set_style(style);
            }
            bar
        }
    }
}

/// Progress bar counting items, used when indexing documents
pub fn item_progress(total: u64, unit: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let template = format!("[{{elapsed_precise}}] [{{bar:40}}] {{pos}}/{{len}} {}", unit);
    if let Ok(style) = ProgressStyle::with_template(&template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Stream a URL to disk, showing download progress. Returns bytes written.
pub async fn download_file(url: &str, output_path: &Path) -> Result<u64> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to request {}", url))?;
    if !response.status().is_success() {
        return Err(anyhow!("Download of {} failed with status {}", url, response.status()));
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bar = byte_progress(response.content_length());
    let mut file = tokio::fs::File::create(output_path)
        .await
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Download interrupted")?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        bar.set_position(written);
    }
    file.flush().await?;
    bar.finish_and_clear();

    info!("Downloaded {} bytes to {}", written, output_path.display());
    Ok(written)
}

/// Decompress a `.gz` file next to itself, dropping the extension.
/// Returns the path of the decompressed file.
pub fn gunzip_file(path: &Path) -> Result<PathBuf> {
    let is_gz = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if !is_gz {
        return Err(anyhow!("{} is not a .gz file", path.display()));
    }

    let output = path.with_extension("");
    let input = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let mut writer = BufWriter::new(
        File::create(&output).with_context(|| format!("Failed to create {}", output.display()))?,
    );
    let bytes = std::io::copy(&mut decoder, &mut writer)
        .with_context(|| format!("Failed to decompress {}", path.display()))?;

    info!("Decompressed {} ({} bytes)", output.display(), bytes);
    Ok(output)
}
