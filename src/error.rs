//! Error types shared by backends and pipelines

use thiserror::Error;

/// Failure reported by a single translation backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("access forbidden, check the API key")]
    Forbidden,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Network(String),

    #[error("unexpected response format: {0}")]
    MalformedResponse(String),

    #[error("backend returned an empty result")]
    EmptyResult,

    #[error("{0} API key is required")]
    MissingApiKey(&'static str),
}

impl BackendError {
    /// Rate-limit and auth failures go straight to the next backend.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::MalformedResponse(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::RateLimited | Self::Forbidden | Self::EmptyResult | Self::MissingApiKey(_) => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported language code: {0}")]
    UnsupportedLanguage(String),

    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("failed to parse {kind}: {message}")]
    Parse { kind: &'static str, message: String },

    #[error("markup translation failed: {0}")]
    Markup(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn xml(err: impl std::fmt::Display) -> Self {
        Self::Parse {
            kind: "XML",
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(!BackendError::RateLimited.is_retryable());
        assert!(!BackendError::Forbidden.is_retryable());
        assert!(BackendError::Network("timeout".into()).is_retryable());
        assert!(
            BackendError::Http {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !BackendError::Http {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_missing_columns_message() {
        let err = PipelineError::MissingColumns(vec!["title".into(), "body".into()]);
        assert_eq!(err.to_string(), "missing columns: title, body");
    }
}
