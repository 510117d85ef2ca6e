//! Output shaping for buildkite-mcp-server tools.
//!
//! Everything here is pure: job log processing, pagination, job list
//! shaping and token estimation. Nothing touches the network.

pub mod joblogs;
pub mod pagination;
pub mod shaping;
pub mod tokens;

pub use joblogs::{LogProcessor, ProcessError};
pub use pagination::{
    paginate, ClientPaginatedResult, ClientPaginationParams, PaginatedResult,
    ServerPaginationParams,
};
pub use shaping::{filter_jobs_by_state, redact_agents, JobSummary};
pub use tokens::estimate_tokens;
