use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;

use super::error::LoadError;

/// Repository that hosts the published copy of the data file.
pub const DEFAULT_FALLBACK_BASE_URL: &str =
    "https://github.com/jacek-jonca/interactive-enrollment-sources/raw/main";

/// Default local data file, also the file name requested from the fallback.
pub const DEFAULT_DATA_PATH: &str = "data.csv";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// DataSource – where the coordinates are read from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Local(PathBuf),
    Remote(String),
}

impl DataSource {
    /// Use `local_path` if it exists, otherwise the same file name under
    /// `fallback_base_url`.
    pub fn resolve(local_path: &Path, fallback_base_url: &str) -> Self {
        if local_path.is_file() {
            return DataSource::Local(local_path.to_path_buf());
        }
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_DATA_PATH);
        let base = fallback_base_url.trim_end_matches('/');
        DataSource::Remote(format!("{base}/{file_name}"))
    }

    /// Lower-cased extension of the file or URL path, if any.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            DataSource::Local(path) => path.file_name()?.to_str()?.to_string(),
            DataSource::Remote(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next()?.to_string()
            }
        };
        let (_, ext) = name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Local(path) => write!(f, "{}", path.display()),
            DataSource::Remote(url) => write!(f, "{url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Reads the raw bytes of a [`DataSource`]. One call is one attempt.
pub trait SourceFetcher {
    fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, LoadError>;
}

/// Local files through `std::fs`, remote URLs through a blocking HTTP GET.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFetcher;

impl SourceFetcher for DefaultFetcher {
    fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, LoadError> {
        match source {
            DataSource::Local(path) => {
                log::debug!("Reading local data file {}", path.display());
                std::fs::read(path).map_err(|e| LoadError::unavailable(source.to_string(), e))
            }
            DataSource::Remote(url) => {
                log::info!("Local data file missing, fetching {url}");
                let client = Client::builder()
                    .timeout(REQUEST_TIMEOUT)
                    .build()
                    .map_err(|e| LoadError::unavailable(url.clone(), e))?;
                let response = client
                    .get(url)
                    .send()
                    .map_err(|e| LoadError::unavailable(url.clone(), e))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::unavailable(url.clone(), format!("HTTP {status}")));
                }
                let body = response
                    .bytes()
                    .map_err(|e| LoadError::unavailable(url.clone(), e))?;
                Ok(body.to_vec())
            }
        }
    }
}
