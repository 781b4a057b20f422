use thiserror::Error;

pub type Result<T> = std::result::Result<T, YouTubeApiError>;

#[derive(Debug, Error)]
pub enum YouTubeApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Daily quota exhausted upstream")]
    QuotaExceeded,
}

impl YouTubeApiError {
    /// Quota denials from the platform come back as 403 with a quota reason
    /// in the body. Classified separately so the orchestrator can report
    /// "back off" instead of "bad input".
    pub fn classify(status: u16, body: String) -> Self {
        if status == 403 && body.to_lowercase().contains("quota") {
            YouTubeApiError::QuotaExceeded
        } else {
            YouTubeApiError::Api {
                status,
                message: body,
            }
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, YouTubeApiError::QuotaExceeded)
    }
}

impl From<reqwest::Error> for YouTubeApiError {
    fn from(err: reqwest::Error) -> Self {
        YouTubeApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for YouTubeApiError {
    fn from(err: serde_json::Error) -> Self {
        YouTubeApiError::Parse(err.to_string())
    }
}
