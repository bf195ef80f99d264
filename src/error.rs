use std::time::Duration;

use thiserror::Error;

use crate::client::retry::is_retryable_http_error;

/// Failures at the dashboard boundary.
///
/// An empty ledger is not represented here: it is a valid state that the
/// renderers answer with a placeholder.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Sign-in rejected, or the response carried no usable credential.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// No credential, or the data endpoint refused it. The session has been torn down.
    #[error("session invalid: {0}")]
    SessionInvalid(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Credential cache could not be read or written.
    #[error("credential cache error: {0}")]
    Credential(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of a single data query. Recovered locally by the orchestrator.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("no credential available")]
    MissingCredential,

    #[error("transport error: {message}")]
    Transport { message: String, retryable: bool },

    #[error("query endpoint returned status {0}")]
    Status(u16),

    /// 401/403, or a GraphQL error that names the token.
    #[error("credential rejected: {0}")]
    Rejected(String),

    #[error("graphql errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

impl QueryError {
    pub fn is_session_rejection(&self) -> bool {
        matches!(self, QueryError::Rejected(_) | QueryError::MissingCredential)
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            QueryError::Transport { retryable, .. } => *retryable,
            QueryError::Status(code) => is_retryable_http_error(*code),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        let retryable = err.is_timeout() || err.is_connect() || err.is_request();
        QueryError::Transport { message: err.to_string(), retryable }
    }
}

/// Validation failure while reading a ledger record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("amount is not an integer: {0}")]
    NonIntegerAmount(String),

    #[error("unparsable timestamp: {0}")]
    Timestamp(String),
}
