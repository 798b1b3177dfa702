#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset fetching for the Getaround services.
//!
//! Both services read a single static file on demand: the pricing API
//! re-downloads its CSV on every request and the dashboard downloads its
//! workbook once at start-up. A [`DataLocation`] is either an `http(s)`
//! URL, fetched with `reqwest`, or a local path, read with `tokio::fs`.
//! Nothing is retried or cached here.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while fetching a dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Where a dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    /// Remote file served over HTTP(S).
    Url(String),
    /// File on the local filesystem.
    Path(PathBuf),
}

impl DataLocation {
    /// Interprets `s` as a URL if it starts with `http://` or `https://`,
    /// otherwise as a filesystem path.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    /// Downloads or reads the whole file into memory.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails, the server answers with
    /// an error status, or the local file cannot be read.
    pub async fn fetch_bytes(&self) -> Result<Vec<u8>, SourceError> {
        match self {
            Self::Url(url) => {
                let response = reqwest::get(url).await?.error_for_status()?;
                let bytes = response.bytes().await?;
                log::debug!("Downloaded {} bytes from {url}", bytes.len());
                Ok(bytes.to_vec())
            }
            Self::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.clone(),
                        source,
                    })?;
                log::debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(bytes)
            }
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<&str> for DataLocation {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
