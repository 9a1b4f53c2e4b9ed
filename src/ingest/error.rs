use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failure of a remote feed request or of the request it would have issued.
///
/// An empty result is never an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("feed returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("feed request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("could not decode feed payload from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("custom range query needs an end date")]
    OpenEndedRange,
}

impl FetchError {
    /// Errors produced by the remote side (as opposed to a rejected request shape).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            FetchError::Status { .. } | FetchError::Transport { .. } | FetchError::Decode { .. }
        )
    }
}
