//! Credentials and run configuration
//!
//! Credentials are an explicit value handed to the downloader rather than
//! process-wide state, so everything below the CLI can be exercised without
//! touching the environment.

use crate::error::{GeoliteError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the MaxMind account id
pub const ACCOUNT_ID_VAR: &str = "MAXMIND_ACCOUNT_ID";

/// Environment variable holding the MaxMind license key
pub const LICENSE_KEY_VAR: &str = "MAXMIND_LICENSE_KEY";

/// MaxMind legacy download endpoint
pub const DEFAULT_DOWNLOAD_URL: &str = "https://download.maxmind.com/app/geoip_download";

/// Database edition fetched from the download endpoint
pub const EDITION_ID: &str = "GeoLite2-Country-CSV";

/// Destination consumed by the downstream in-memory resolver
pub const DEFAULT_OUTPUT_PATH: &str = "geofence_validator/data/ip_ranges.csv";

/// Fixed request timeout; the run fails on expiry
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// MaxMind account credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    account_id: String,
    license_key: String,
}

impl Credentials {
    /// Validate a pair of optional credential values
    ///
    /// Both must be present and non-blank, otherwise a
    /// [`GeoliteError::Config`] is returned.
    pub fn new(account_id: Option<String>, license_key: Option<String>) -> Result<Self> {
        let account_id = account_id.filter(|v| !v.trim().is_empty());
        let license_key = license_key.filter(|v| !v.trim().is_empty());

        match (account_id, license_key) {
            (Some(account_id), Some(license_key)) => Ok(Self {
                account_id,
                license_key,
            }),
            _ => Err(GeoliteError::Config(format!(
                "{} and {} environment variables must be set.",
                ACCOUNT_ID_VAR, LICENSE_KEY_VAR
            ))),
        }
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(lookup(ACCOUNT_ID_VAR), lookup(LICENSE_KEY_VAR))
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn license_key(&self) -> &str {
        &self.license_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("license_key", &"<redacted>")
            .finish()
    }
}

/// Settings for a single update run
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    download_url: String,
    output_path: PathBuf,
    timeout: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl UpdateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the download endpoint (query parameters are appended per request)
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
