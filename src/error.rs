use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageWatchError {
    #[error("Fetch error: {address} - {message}")]
    Fetch {
        address: String,
        message: String,
    },

    #[error("Status code error: {address} - {status}")]
    Status {
        address: String,
        status: u16,
    },

    #[error("Extraction error: {address} ({selector}) - {message}")]
    Extraction {
        address: String,
        selector: String,
        message: String,
    },

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Patch does not apply at line {line}")]
    PatchMismatch {
        line: usize,
    },

    #[error("All {0} targets are degraded, nothing left to watch")]
    AllTargetsDegraded(usize),

    #[error("File error: {path:?} - {message}")]
    File {
        path: PathBuf,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PageWatchError {
    /// Whether the error came out of a snapshot source (transport, status or extraction)
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            PageWatchError::Fetch { .. } | PageWatchError::Status { .. } | PageWatchError::Extraction { .. }
        )
    }
}

impl From<anyhow::Error> for PageWatchError {
    fn from(error: anyhow::Error) -> Self {
        PageWatchError::Unexpected(error.to_string())
    }
}

impl From<serde_json::Error> for PageWatchError {
    fn from(error: serde_json::Error) -> Self {
        PageWatchError::Serialization(error.to_string())
    }
}

pub type PageWatchResult<T> = std::result::Result<T, PageWatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_grouping() {
        let status = PageWatchError::Status { address: "site1".to_string(), status: 503 };
        let extraction = PageWatchError::Extraction {
            address: "site1".to_string(),
            selector: "div[".to_string(),
            message: "bad selector".to_string(),
        };

        assert!(status.is_fetch_error());
        assert!(extraction.is_fetch_error());
        assert!(!PageWatchError::Delivery("refused".to_string()).is_fetch_error());
        assert_eq!(status.to_string(), "Status code error: site1 - 503");
    }
}
