//! Tool-level errors.
//!
//! Every handler returns `Result<ToolCallResult, ToolError>`; the dispatcher
//! turns the error into an `isError` text result, so nothing here ever reaches
//! the JSON-RPC layer.

use buildkite_output::ProcessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("required argument \"{0}\" not found")]
    MissingArgument(String),

    #[error("{0}")]
    InvalidArgument(String),

    /// Upstream failure. Displays the raw response body when there is one.
    #[error("{}", upstream_message(.0))]
    Upstream(#[from] buildkite_core::Error),

    #[error("failed to get {what}: status {status}")]
    UnexpectedStatus { what: &'static str, status: u16 },

    #[error("no organization found for the current user token")]
    NoOrganization,

    #[error("failed to process job log: {0}")]
    Processing(#[from] ProcessError),

    #[error("failed to marshal response: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn upstream_message(err: &buildkite_core::Error) -> String {
    err.raw_body()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}

impl ToolError {
    pub fn required(field: &str) -> Self {
        ToolError::InvalidArgument(format!("{} is required", field))
    }
}
