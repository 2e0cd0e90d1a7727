//! Error types for source fetches and union pagination.

use std::time::Duration;
use thiserror::Error;

/// A failure while reading one page of a single source.
///
/// `Clone` so failed responses can be kept in the page cache during backoff.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("rate limited, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// A failure of a whole union page. A source failure never yields a partial page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnionError {
    #[error("source A ({source_name}) fetch failed: {source}")]
    SourceAFetch {
        source_name: String,
        #[source]
        source: FetchError,
    },
    #[error("source B ({source_name}) fetch failed: {source}")]
    SourceBFetch {
        source_name: String,
        #[source]
        source: FetchError,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl UnionError {
    /// Name of the failing source, if the failure came from one.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Self::SourceAFetch { source_name, .. } | Self::SourceBFetch { source_name, .. } => {
                Some(source_name)
            }
            Self::InvalidRequest(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_message_shows_seconds() {
        let err = FetchError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 42s");
    }

    #[test]
    fn union_error_names_failing_source() {
        let err = UnionError::SourceBFetch {
            source_name: "course-product-relations".to_string(),
            source: FetchError::Status {
                status: 500,
                url: "https://joanie.endpoint/api/v1.0/course-product-relations/".to_string(),
            },
        };
        assert_eq!(err.source_name(), Some("course-product-relations"));
        assert!(err.to_string().starts_with("source B (course-product-relations)"));
        assert_eq!(UnionError::InvalidRequest("x".into()).source_name(), None);
    }
}
