//! HTTP download of the published time-series files.
//!
//! There is no retry and no request timeout: a failed download is reported to
//! the caller, which keeps whatever data it already has.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

/// Performs a GET and returns the body. Non-2xx responses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = url.parse().with_context(|| format!("invalid URL '{url}'"))?;

    let resp = client.get(parsed).await?.error_for_status()?;
    let bytes = resp.bytes().await?.to_vec();
    debug!(url, bytes = bytes.len(), "Download complete");
    Ok(bytes)
}

/// Loads a source that is either an `http(s)` URL or a local file path.
#[tracing::instrument(skip_all, fields(source = %source))]
pub async fn fetch_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http") {
        fetch_bytes(client, source).await
    } else {
        std::fs::read(source).with_context(|| format!("failed to read '{source}'"))
    }
}
