use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Network-level scrape failures. Parse failures are never errors: a page
/// whose heuristics don't match yields "no data", which callers treat the
/// same as an empty successful response.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Page fetch failed (status {status})")]
    Status { status: u16 },
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Network(err.to_string())
    }
}
