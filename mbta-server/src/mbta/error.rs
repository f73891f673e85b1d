//! MBTA client error types.

/// Errors from talking to the MBTA v3 API.
///
/// `Clone` so one failed upstream call can be handed to every caller that
/// was coalesced onto it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (connect error, timeout, etc.)
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid API key or unauthorized
    #[error("unauthorized (check MBTA_API_KEY)")]
    Unauthorized,

    /// Rate limited by the API
    #[error("rate limited by MBTA API")]
    RateLimited,

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A response body could not be decoded
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

impl FetchError {
    /// Whether repeating the request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::RateLimited => true,
            FetchError::Api { status, .. } => *status >= 500,
            FetchError::Unauthorized | FetchError::Json { .. } => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FetchError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");

        let err = FetchError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "transport error: connection refused");

        let err = FetchError::Json {
            message: "expected value".into(),
        };
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn retryable_classification() {
        assert!(FetchError::Transport("timed out".into()).is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
        assert!(
            FetchError::Api {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !FetchError::Api {
                status: 404,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!FetchError::Unauthorized.is_retryable());
    }
}
