//! Typed failures of a single GraphQL query.

use thiserror::Error;

/// Why one logical query against the portal did not produce a payload.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Rate limited (HTTP 429)")]
    RateLimited,

    #[error("Request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("GraphQL Error: {0}")]
    Application(String),

    #[error("Invalid JSON response: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: Box<QueryError> },
}

impl QueryError {
    /// Returns the final underlying failure, unwrapping `ExhaustedRetries`.
    pub fn root(&self) -> &QueryError {
        match self {
            QueryError::ExhaustedRetries { last, .. } => last.root(),
            other => other,
        }
    }
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
