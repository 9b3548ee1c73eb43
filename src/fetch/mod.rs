mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::io::Read;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads a feed from a local path or fetches it over HTTP, gunzipping it
/// when the payload is gzip-compressed.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(client, source)
            .await
            .with_context(|| format!("failed to fetch {}", source))?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("failed to read {}", source))?
    };
    debug!(bytes = bytes.len(), "Feed bytes loaded");
    maybe_gunzip(bytes)
}

/// Returns `bytes` unchanged unless they start with the gzip magic number.
pub fn maybe_gunzip(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut decoded = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut decoded)
        .context("failed to decompress gzip feed")?;
    debug!(compressed = bytes.len(), decompressed = decoded.len(), "Feed gunzipped");
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_maybe_gunzip_passthrough() {
        let plain = b"started_at,ended_at\n".to_vec();
        assert_eq!(maybe_gunzip(plain.clone()).unwrap(), plain);
    }

    #[test]
    fn test_maybe_gunzip_decodes() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello trips").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(maybe_gunzip(compressed).unwrap(), b"hello trips");
    }

    #[test]
    fn test_maybe_gunzip_corrupt() {
        assert!(maybe_gunzip(vec![0x1f, 0x8b, 0x00, 0x01]).is_err());
    }

    #[tokio::test]
    async fn test_load_source_local_file() {
        let path = temp_path("bikeshare_traffic_test_load.json");
        fs::write(&path, b"[]").unwrap();

        let bytes = load_source(&BasicClient::new(), &path).await.unwrap();
        assert_eq!(bytes, b"[]");

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_source_missing_file() {
        let path = temp_path("bikeshare_traffic_test_missing.csv");
        let _ = fs::remove_file(&path);

        let err = load_source(&BasicClient::new(), &path).await.unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
