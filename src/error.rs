/// Error types for the GeoLite2 range updater
use std::fmt;

/// Result type alias for updater operations
pub type Result<T> = std::result::Result<T, GeoliteError>;

/// Main error type for updater operations
///
/// Every variant is fatal: the run aborts before the output file is touched.
/// Block rows whose location does not resolve are not errors and never show up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoliteError {
    /// Missing or empty credentials, detected before any network activity
    Config(String),

    /// Network failure, timeout, or non-success response from the download endpoint
    Retrieval(String),

    /// Archive does not have the expected layout (or is not an archive at all)
    Format(String),

    /// Malformed CSV content inside one of the datasets
    Csv(String),

    /// I/O errors
    Io(String),
}

impl fmt::Display for GeoliteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoliteError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GeoliteError::Retrieval(msg) => write!(f, "Retrieval error: {}", msg),
            GeoliteError::Format(msg) => write!(f, "Format error: {}", msg),
            GeoliteError::Csv(msg) => write!(f, "CSV error: {}", msg),
            GeoliteError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for GeoliteError {}

impl From<std::io::Error> for GeoliteError {
    fn from(err: std::io::Error) -> Self {
        GeoliteError::Io(err.to_string())
    }
}

impl From<csv::Error> for GeoliteError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(_) => GeoliteError::Io(err.to_string()),
            _ => GeoliteError::Csv(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for GeoliteError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => GeoliteError::Io(io.to_string()),
            other => GeoliteError::Format(format!("Invalid zip archive: {}", other)),
        }
    }
}

impl From<reqwest::Error> for GeoliteError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GeoliteError::Retrieval(format!("HTTP {}: {}", status.as_u16(), err)),
            None if err.is_timeout() => GeoliteError::Retrieval(format!("request timed out: {}", err)),
            None => GeoliteError::Retrieval(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            GeoliteError::Config("missing".into()).to_string(),
            "Configuration error: missing"
        );
        assert_eq!(
            GeoliteError::Format("no locations".into()).to_string(),
            "Format error: no locations"
        );
    }

    #[test]
    fn test_zip_error_is_format() {
        let err: GeoliteError = zip::result::ZipError::InvalidArchive("bad".into()).into();
        assert!(matches!(err, GeoliteError::Format(_)));
    }
}
