use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrendLensError {
    #[error(
        "Could not resolve channel reference '{0}'. Accepted formats: a raw channel ID \
         (UCxxxx...), https://www.youtube.com/channel/UCxxxx, /c/Name, /user/Name, or @handle"
    )]
    Resolution(String),

    #[error("API quota exceeded: {used}/{limit} units used. The budget resets daily at the platform's local midnight")]
    BudgetExceeded { used: u64, limit: u64 },

    #[error("Outbound call rate limit saturated, try again shortly")]
    RateLimited,

    #[error("Upstream rejected the call: provider quota exhausted")]
    UpstreamQuota,

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("{0} resolved but no content was found after all fallbacks")]
    NoContent(String),

    #[error("Could not extract a username from page reference '{0}'")]
    PageResolution(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl TrendLensError {
    /// Budget denials are reported distinctly so callers back off instead of
    /// retrying or blaming their input.
    pub fn is_quota(&self) -> bool {
        matches!(
            self,
            TrendLensError::BudgetExceeded { .. } | TrendLensError::UpstreamQuota
        )
    }
}
