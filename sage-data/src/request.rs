// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use anyhow::{Context, Result};
use kdam::BarExt;
use reqwest::{Client, redirect::Policy};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use sage_core::ut::track::{progress_bar, progress_log};

/// Download a file over HTTPS with a progress bar
///
/// # Arguments
///
/// * `url` - Direct download URL
/// * `output_dir` - Directory to download file to
/// * `filename` - Filename of downloaded file
/// * `silent` - Turn off download messages
#[tokio::main]
pub async fn download_file(
    url: &str,
    output_dir: &Path,
    filename: &str,
    silent: bool,
) -> Result<()> {
    let client = create_http_client()?;
    download_file_with_progress(&client, url, output_dir, filename, silent).await?;
    if !silent {
        println!();
    }
    progress_log("Complete", !silent);
    Ok(())
}

fn create_http_client() -> Result<Client> {
    Client::builder()
        .user_agent("sage/0.1")
        .redirect(Policy::limited(10))
        .build()
        .context("Failed to create HTTP client")
}

async fn download_file_with_progress(
    client: &Client,
    url: &str,
    output_dir: &Path,
    filename: &str,
    silent: bool,
) -> Result<()> {
    let mut resp = client
        .get(url)
        .send()
        .await
        .context("Failed to send download request")?;

    let total_size = resp.content_length().unwrap_or(0);
    let mut pb = progress_bar(
        total_size as usize,
        format!("Downloading {}", filename).as_str(),
        !silent,
    );

    let total_gigabytes = total_size as f64 / 1e9;

    if !silent {
        progress_log(
            format!("Starting {} download ({:.2} GB)", filename, total_gigabytes).as_str(),
            !silent,
        );
    }

    if total_gigabytes == 0.0 {
        println!("Download could not be started. Please check connection and try again.");
        std::process::exit(1);
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .context("Failed to create output directory")?;
    let filepath = output_dir.join(filename);
    let mut file = File::create(&filepath)
        .await
        .context("Failed to create output file")?;

    while let Some(chunk) = resp.chunk().await.context("Failed to read chunk")? {
        file.write_all(&chunk)
            .await
            .context("Failed to write chunk to file")?;

        if !silent {
            pb.update(chunk.len())?;
        }
    }

    Ok(())
}
