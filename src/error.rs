//! Error types.
//!
//! - `FeedError` is the typed outcome of talking to the upstream feed. Callers
//!   can tell "upstream refused" apart from "upstream unreachable" apart from
//!   "we asked for something invalid".
//! - `AppError` is what the binary reports: a message plus a process exit code.

use thiserror::Error;

/// Exit code for bad input, configuration or reference files.
pub const EXIT_INPUT: u8 = 2;
/// Exit code when a query produced no rows.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for upstream feed failures.
pub const EXIT_FEED: u8 = 4;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid query: {0}")]
    Validation(String),

    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream timed out: {0}")]
    Timeout(String),

    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        let code = match &err {
            FeedError::Validation(_) => EXIT_INPUT,
            _ => EXIT_FEED,
        };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_errors_map_to_exit_codes() {
        let err: AppError = FeedError::Validation("end before start".to_string()).into();
        assert_eq!(err.exit_code(), EXIT_INPUT);

        let err: AppError = FeedError::Upstream {
            status: 503,
            body: "busy".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), EXIT_FEED);
        assert_eq!(err.to_string(), "upstream returned status 503: busy");
    }
}
