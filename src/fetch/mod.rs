//! Loading input datasets from local files or over HTTP.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::dataset::{Dataset, InputFormat};

/// Downloads `url`, failing on non-success status codes.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Picks a decoder from the extension of a path or URL.
///
/// CSV is assumed when there is no extension, or when a URL ends in one we
/// do not recognise.
pub fn format_for_source(source: &str) -> Result<InputFormat> {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) => match InputFormat::from_extension(ext) {
            Ok(format) => Ok(format),
            Err(_) if is_url(source) => Ok(InputFormat::Csv),
            Err(e) => Err(e.into()),
        },
        None => Ok(InputFormat::Csv),
    }
}

/// Loads a dataset from a local file path or an `http(s)` URL.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Dataset> {
    let format = format_for_source(source)?;

    let bytes = if is_url(source) {
        fetch_bytes(client, source).await?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("reading '{source}'"))?
    };
    debug!(bytes = bytes.len(), ?format, "Input bytes received, decoding");

    let dataset = Dataset::from_bytes(&bytes, format)
        .with_context(|| format!("decoding '{source}'"))?;
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_source() {
        assert_eq!(format_for_source("ride.csv").unwrap(), InputFormat::Csv);
        assert_eq!(format_for_source("/tmp/ride.JSON").unwrap(), InputFormat::Json);
        assert_eq!(
            format_for_source("https://example.com/ride.json?token=abc").unwrap(),
            InputFormat::Json
        );
        assert_eq!(format_for_source("https://example.com/upload").unwrap(), InputFormat::Csv);
        assert_eq!(format_for_source("https://example.com").unwrap(), InputFormat::Csv);
        assert!(format_for_source("ride.xlsx").is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let client = BasicClient::new();
        assert!(load_source(&client, "/nonexistent/ride.csv").await.is_err());
    }
}
