//! MCP (Model Context Protocol) server for Buildkite.
//!
//! Exposes pipelines, builds, jobs, artifacts, clusters and Test Engine data
//! as tools over newline-delimited JSON-RPC on stdio, along with a small
//! catalogue of prompts.

pub mod error;
pub mod handlers;
pub mod prompts;
pub mod protocol;
pub mod request;
pub mod server;
pub mod tools;
pub mod transport;

pub use error::ToolError;
pub use handlers::ToolHandler;
pub use server::McpServer;
