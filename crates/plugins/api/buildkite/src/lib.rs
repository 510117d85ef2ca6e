//! Buildkite provider implementation for buildkite-mcp-server.
//!
//! Talks to the Buildkite REST API v2 and the Test Engine analytics API.

mod client;

pub use buildkite_core::config::DEFAULT_BASE_URL;
pub use client::{default_user_agent, BuildkiteClient};
