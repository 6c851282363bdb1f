use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::StatusCode;

use super::ReadAt;
use crate::error::{Result, XarError};

/// HTTP Range reader for remote XAR files
///
/// Each read is one `GET` with a `Range` header. Failures are reported, not
/// retried.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Create a new HTTP Range reader
    ///
    /// This will send a HEAD request to verify Range support and get file size
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| XarError::Source(e.to_string()))?;

        let resp = client
            .head(&url)
            .send()
            .map_err(|e| XarError::Source(format!("{url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(XarError::Source(format!(
                "HTTP request failed with status: {}",
                resp.status()
            )));
        }

        let accept_ranges = resp
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");

        if !accept_ranges.contains("bytes") {
            return Err(XarError::Source(
                "Remote server does not support Range requests".to_string(),
            ));
        }

        let size = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                XarError::Source("Remote server did not return Content-Length".to_string())
            })?;

        tracing::debug!(%url, size, "opened remote source");

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Whether `location` should be opened with [`HttpRangeReader`].
pub fn is_http_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Inclusive `Range` header value covering `len` bytes from `offset`.
fn range_header(offset: u64, len: u64) -> String {
    format!("bytes={}-{}", offset, offset + len - 1)
}

impl ReadAt for HttpRangeReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }

        let len = buf.len() as u64;
        let fail = |e: io::Error| XarError::read(offset, len, e);

        if offset.checked_add(len).is_none_or(|end| end > self.size) {
            return Err(fail(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "range outside remote file",
            )));
        }

        let mut received = 0usize;
        while received < buf.len() {
            let current = offset + received as u64;
            let resp = self
                .client
                .get(&self.url)
                .header(RANGE, range_header(current, len - received as u64))
                .send()
                .map_err(|e| fail(io::Error::other(e)))?;

            if resp.status() != StatusCode::PARTIAL_CONTENT {
                return Err(fail(io::Error::other(format!(
                    "HTTP request failed with status: {}",
                    resp.status()
                ))));
            }

            let bytes = resp.bytes().map_err(|e| fail(io::Error::other(e)))?;
            if bytes.is_empty() {
                return Err(fail(io::ErrorKind::UnexpectedEof.into()));
            }

            let chunk_len = bytes.len().min(buf.len() - received);
            buf[received..received + chunk_len].copy_from_slice(&bytes[..chunk_len]);
            received += chunk_len;

            self.transferred_bytes
                .fetch_add(chunk_len as u64, Ordering::Relaxed);
        }

        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}
