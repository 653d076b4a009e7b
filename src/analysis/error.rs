use thiserror::Error;

/// Why a provider could not produce analysis text.
///
/// Classified from the HTTP status or the transport error itself, never from
/// message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("cannot connect to analysis server: {0}")]
    Connection(String),
    #[error("analysis service not found at {0}")]
    NotFound(String),
    #[error("server error during analysis (status {0})")]
    Server(u16),
    #[error("analysis request timed out")]
    Timeout,
    #[error("analysis failed: {0}")]
    Unknown(String),
}

impl AnalysisError {
    /// Short hint shown under the generic failure message.
    pub fn hint(&self) -> &'static str {
        match self {
            AnalysisError::Connection(_) => {
                "Cannot connect to analysis server. Make sure it's running."
            }
            AnalysisError::NotFound(_) => "Analysis service not found. Check the server URL.",
            AnalysisError::Server(_) => "Server error during analysis. Please try again.",
            AnalysisError::Timeout => "The analysis server took too long to answer.",
            AnalysisError::Unknown(_) => {
                "Failed to analyze image. Please check your connection and try again."
            }
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AnalysisError::Timeout
        } else if err.is_connect() || err.is_request() {
            AnalysisError::Connection(err.to_string())
        } else {
            AnalysisError::Unknown(err.to_string())
        }
    }
}
