//! Core traits, types, and error handling for buildkite-mcp-server.
//!
//! This crate provides the foundational abstractions shared by the API client,
//! the output plugins and the MCP tool handlers.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use error::{Error, Result};
pub use provider::{
    AccountProvider, AnnotationProvider, ApiResponse, ArtifactProvider, BuildGetOptions,
    BuildListOptions, BuildProvider, BuildkiteProvider, ClusterProvider, JobProvider, ListOptions,
    PipelineProvider, ResponseMeta, TestEngineProvider,
};
pub use types::*;
