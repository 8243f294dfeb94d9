use reqwest::StatusCode;

/// Failure of a single backend call. The client never retries; every error
/// is handed straight back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` carries the backend's `detail` field when
    /// the error body had one, otherwise the status line's reason text.
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),
}
