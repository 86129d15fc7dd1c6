//! Remote retrieval of tile archives.
//!
//! The cache does not talk HTTP itself; it asks a [`TileTransport`] to
//! place `<identifier>.zip` into the cache directory. [`HttpTransport`]
//! is the stock implementation and is only available when the `download`
//! feature is enabled (it is by default).
//!
//! # Data Source
//!
//! The 5° × 5° tiles are published by CGIAR-CSI as zipped ASCII grids under
//! a flat directory, one archive per tile:
//!
//! `http://srtm.csi.cgiar.org/wp-content/uploads/files/srtm_5x5/ASCII/srtm_13_06.zip`
//!
//! Open-ocean partitions have no archive upstream and answer 404.

use std::path::Path;

use crate::error::Result;

/// Default location of the zipped ASCII tiles.
pub const DEFAULT_BASE_URL: &str =
    "http://srtm.csi.cgiar.org/wp-content/uploads/files/srtm_5x5/ASCII/";

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Something that can fetch a tile archive to a local file.
///
/// Implementations must either leave a complete file at `dest` and return
/// `Ok(())`, or return an error. A tile that does not exist upstream is
/// reported as [`GridError::TileUnavailable`](crate::GridError::TileUnavailable).
pub trait TileTransport: Send + Sync {
    /// Fetch `url` and store the response body at `dest`.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Build the archive URL for a tile.
///
/// # Examples
///
/// ```
/// use srtm_grid::download::archive_url;
///
/// assert_eq!(
///     archive_url("https://example.com/srtm/", "srtm_13_06"),
///     "https://example.com/srtm/srtm_13_06.zip"
/// );
/// assert_eq!(
///     archive_url("https://example.com/srtm", "srtm_13_06"),
///     "https://example.com/srtm/srtm_13_06.zip"
/// );
/// ```
pub fn archive_url(base_url: &str, identifier: &str) -> String {
    format!("{}/{}.zip", base_url.trim_end_matches('/'), identifier)
}

/// Configuration for downloading tile archives.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directory URL the archives are published under.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Number of retry attempts on failure.
    pub max_retries: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 3,
        }
    }
}

impl DownloadConfig {
    /// Create a configuration for a mirror of the tile directory.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[cfg(feature = "download")]
pub use http::HttpTransport;

#[cfg(feature = "download")]
mod http {
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use reqwest::blocking::Client;
    use reqwest::StatusCode;

    use super::{DownloadConfig, TileTransport};
    use crate::error::{GridError, Result};

    /// Blocking HTTP transport with timeout and retries.
    pub struct HttpTransport {
        client: Client,
        max_retries: u32,
    }

    impl HttpTransport {
        /// Create a new transport with the given configuration.
        pub fn new(config: &DownloadConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| GridError::TileUnavailable {
                    identifier: String::new(),
                    reason: format!("Failed to create HTTP client: {}", e),
                })?;

            Ok(Self {
                client,
                max_retries: config.max_retries,
            })
        }

        fn do_download(&self, url: &str, dest: &Path) -> Result<()> {
            let unavailable = |reason: String| GridError::TileUnavailable {
                identifier: file_stem(dest),
                reason,
            };

            let response = self
                .client
                .get(url)
                .send()
                .map_err(|e| unavailable(e.to_string()))?;

            if !response.status().is_success() {
                return Err(unavailable(format!("HTTP {}", response.status())));
            }

            let bytes = response.bytes().map_err(|e| unavailable(e.to_string()))?;

            let dir = dest.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(dest).map_err(|e| e.error)?;

            Ok(())
        }
    }

    impl TileTransport for HttpTransport {
        fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
            let mut last_error = None;
            for attempt in 0..=self.max_retries {
                if attempt > 0 {
                    // Brief delay before retry
                    std::thread::sleep(Duration::from_millis(500 * attempt as u64));
                }

                match self.do_download(url, dest) {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        // A missing tile will not appear on retry
                        let not_found = matches!(
                            &e,
                            GridError::TileUnavailable { reason, .. }
                                if reason.starts_with(&format!("HTTP {}", StatusCode::NOT_FOUND))
                        );
                        tracing::debug!(url, attempt, error = %e, "Tile download attempt failed");
                        last_error = Some(e);
                        if not_found {
                            break;
                        }
                    }
                }
            }

            Err(last_error.unwrap_or_else(|| GridError::TileUnavailable {
                identifier: file_stem(dest),
                reason: "Unknown error".to_string(),
            }))
        }
    }

    fn file_stem(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_url() {
        assert_eq!(
            archive_url(DEFAULT_BASE_URL, "srtm_13_06"),
            "http://srtm.csi.cgiar.org/wp-content/uploads/files/srtm_5x5/ASCII/srtm_13_06.zip"
        );
        assert_eq!(
            archive_url("file:///mirror//", "srtm_01_01"),
            "file:///mirror/srtm_01_01.zip"
        );
    }

    #[test]
    fn test_download_config_builder() {
        let config = DownloadConfig::with_base_url("https://mirror.example.com/srtm")
            .with_timeout(60)
            .with_max_retries(5);

        assert_eq!(config.base_url, "https://mirror.example.com/srtm");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_download_config_default() {
        let config = DownloadConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_retries, 3);
    }

    #[cfg(feature = "download")]
    #[test]
    fn test_http_transport_unreachable_host() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = DownloadConfig::default()
            .with_timeout(2)
            .with_max_retries(0);
        let transport = HttpTransport::new(&config).unwrap();
        let dest = temp_dir.path().join("srtm_13_06.zip");

        // Port 9 on localhost is the discard service, normally closed
        let result = transport.fetch("http://127.0.0.1:9/srtm_13_06.zip", &dest);

        assert!(result.unwrap_err().is_unavailable());
        assert!(!dest.exists());
    }
}
