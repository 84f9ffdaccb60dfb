//! Error taxonomy for report server operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The report name does not resolve to a document on the server.
    #[error("Report not found: {0}")]
    ReportNotFound(String),

    /// The report exists but is disabled server-side.
    #[error("Report {0} is disabled")]
    ReportDisabled(String),

    /// The settings script RPC rejected (network or server error).
    #[error("Failed to fetch report script for {report}: {source}")]
    ScriptFetchFailure {
        report: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Server returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed server response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ReportNotFound(_))
    }
}
