use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RETRIES: u32 = 3;
const MAX_DOCUMENT_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Size cap and retry pacing for one fetch.
#[derive(Debug, Clone, Copy)]
struct Limits {
    max_size: usize,
    /// First retry delay; each further retry doubles it.
    backoff_unit: Duration,
}

const DEFAULT_LIMITS: Limits = Limits {
    max_size: MAX_DOCUMENT_SIZE,
    backoff_unit: Duration::from_secs(1),
};

/// Errors that can occur while retrieving the page to scrape.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    #[error("Document too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    #[error("No such file: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a configured `path` points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Remote(Url),
    Local(PathBuf),
}

fn locate(path: &str) -> Location {
    match Url::parse(path) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Location::Remote(url),
        Ok(url) if url.scheme() == "file" => match url.to_file_path() {
            Ok(file) => Location::Local(file),
            Err(()) => Location::Local(PathBuf::from(path)),
        },
        _ => Location::Local(PathBuf::from(path)),
    }
}

/// Retrieves the document at `path` as text.
///
/// `http`/`https` URLs are fetched with `client`; anything else (including
/// `file://` URLs) is read from the local filesystem. Bytes that are not
/// valid UTF-8 are replaced rather than rejected.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection or TLS errors
/// - [`FetchError::Timeout`] - A request exceeded `timeout`
/// - [`FetchError::HttpStatus`] - Non-2xx response (5xx after retries)
/// - [`FetchError::RateLimited`] - 429 response after max retries
/// - [`FetchError::ResponseTooLarge`] - Document exceeded 10MB
/// - [`FetchError::PathNotFound`] - Local file does not exist
/// - [`FetchError::Io`] - Local file could not be read
pub async fn fetch_document(
    client: &reqwest::Client,
    path: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let bytes = match locate(path) {
        Location::Remote(url) => fetch_remote(client, url, timeout, DEFAULT_LIMITS).await?,
        Location::Local(file) => read_local(&file, DEFAULT_LIMITS.max_size).await?,
    };

    tracing::debug!(path = %path, bytes = bytes.len(), "Fetched document");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn read_local(path: &Path, max_size: usize) -> Result<Vec<u8>, FetchError> {
    let io_error = |source: std::io::Error| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FetchError::PathNotFound(path.to_path_buf())
        } else {
            FetchError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    };

    let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
    if metadata.len() > max_size as u64 {
        return Err(FetchError::ResponseTooLarge(max_size));
    }

    tokio::fs::read(path).await.map_err(io_error)
}

async fn fetch_remote(
    client: &reqwest::Client,
    url: Url,
    timeout: Duration,
    limits: Limits,
) -> Result<Vec<u8>, FetchError> {
    let mut retry_count = 0;

    loop {
        let response = tokio::time::timeout(timeout, client.get(url.clone()).send())
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
            .map_err(FetchError::Network)?;

        let status = response.status();

        // Rate limiting and server errors back off exponentially: 1s, 2s, 4s
        // with the default limits
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if retry_count >= MAX_RETRIES {
                return Err(if status.is_server_error() {
                    FetchError::HttpStatus(status.as_u16())
                } else {
                    FetchError::RateLimited(MAX_RETRIES)
                });
            }

            let delay = limits.backoff_unit * 2u32.pow(retry_count);
            tracing::warn!(
                url = %url,
                status = %status,
                retry = retry_count,
                delay = ?delay,
                "Request not served, retrying after delay"
            );

            tokio::time::sleep(delay).await;
            retry_count += 1;
            continue;
        }

        // Other non-2xx statuses fail immediately
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        match tokio::time::timeout(timeout, read_limited_bytes(response, limits.max_size)).await {
            Ok(Ok(bytes)) => return Ok(bytes),
            Ok(Err(FetchError::IncompleteResponse { expected, received })) => {
                if retry_count >= MAX_RETRIES {
                    return Err(FetchError::IncompleteResponse { expected, received });
                }

                let delay = limits.backoff_unit * 2u32.pow(retry_count);
                tracing::debug!(
                    url = %url,
                    expected = expected,
                    received = received,
                    attempt = retry_count + 1,
                    delay = ?delay,
                    "Retrying incomplete download"
                );

                tokio::time::sleep(delay).await;
                retry_count += 1;
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(FetchError::Timeout(timeout)),
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
