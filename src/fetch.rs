//! Archive retrieval
//!
//! The rest of the pipeline only sees archive bytes. Where they come from is
//! behind [`ArchiveSource`]: the MaxMind download endpoint for real runs, or a
//! zip already on disk.

use crate::config::{Credentials, UpdateConfig, EDITION_ID};
use crate::error::{GeoliteError, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Producer of raw GeoLite2 Country CSV archive bytes
pub trait ArchiveSource {
    /// Retrieve the complete archive
    fn fetch(&self) -> Result<Vec<u8>>;

    /// Human-readable origin, used in progress output
    fn describe(&self) -> String;
}

/// Downloads the archive from MaxMind with a single blocking request
#[derive(Debug)]
pub struct MaxMindDownloader {
    credentials: Credentials,
    download_url: String,
    timeout: Duration,
}

impl MaxMindDownloader {
    pub fn new(credentials: Credentials, config: &UpdateConfig) -> Self {
        Self {
            credentials,
            download_url: config.download_url().to_string(),
            timeout: config.timeout(),
        }
    }
}

impl ArchiveSource for MaxMindDownloader {
    fn fetch(&self) -> Result<Vec<u8>> {
        info!("Downloading GeoLite2 data from MaxMind...");

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(&self.download_url)
            .query(&[
                ("edition_id", EDITION_ID),
                ("license_key", self.credentials.license_key()),
                ("suffix", "zip"),
            ])
            .basic_auth(
                self.credentials.account_id(),
                Some(self.credentials.license_key()),
            )
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoliteError::Retrieval(format!(
                "download failed with HTTP status {}",
                status
            )));
        }

        let bytes = response.bytes()?;
        debug!(bytes = bytes.len(), "archive downloaded");
        info!("Download complete.");
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.download_url.clone()
    }
}

/// Reads an archive that was downloaded earlier
#[derive(Debug, Clone)]
pub struct LocalArchive {
    path: PathBuf,
}

impl LocalArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArchiveSource for LocalArchive {
    fn fetch(&self) -> Result<Vec<u8>> {
        info!("Reading archive from {}", self.path.display());
        fs::read(&self.path).map_err(|e| {
            GeoliteError::Io(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_archive_reads_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archive.zip");
        fs::write(&path, b"PK\x03\x04").unwrap();

        let source = LocalArchive::new(&path);
        assert_eq!(source.fetch().unwrap(), b"PK\x03\x04");
        assert_eq!(source.describe(), path.display().to_string());
    }

    #[test]
    fn test_local_archive_missing_file() {
        let dir = TempDir::new().unwrap();
        let source = LocalArchive::new(dir.path().join("nope.zip"));
        assert!(matches!(source.fetch(), Err(GeoliteError::Io(_))));
    }

    #[test]
    fn test_non_success_status_is_retrieval_error() {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            // Drain the request head before answering.
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let mut stream = stream;
            stream
                .write_all(
                    b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                )
                .unwrap();
        });

        let creds = Credentials::new(Some("1".into()), Some("bad-key".into())).unwrap();
        let config = UpdateConfig::new()
            .with_download_url(format!("http://{}/app/geoip_download", addr))
            .with_timeout(Duration::from_secs(5));
        let result = MaxMindDownloader::new(creds, &config).fetch();
        server.join().unwrap();

        match result {
            Err(GeoliteError::Retrieval(msg)) => assert!(msg.contains("401"), "{}", msg),
            other => panic!("expected retrieval error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_endpoint_is_retrieval_error() {
        let creds = Credentials::new(Some("1".into()), Some("key".into())).unwrap();
        // Port 9 on loopback: nothing listens, the connect fails immediately.
        let config = UpdateConfig::new()
            .with_download_url("http://127.0.0.1:9/geoip_download")
            .with_timeout(Duration::from_secs(2));
        let source = MaxMindDownloader::new(creds, &config);
        assert!(matches!(source.fetch(), Err(GeoliteError::Retrieval(_))));
    }
}
