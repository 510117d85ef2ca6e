//! Tool handlers for the MCP server.
//!
//! Each submodule owns a resource family: its tool definitions and the async
//! handler functions. Handlers are generic over the narrowest provider trait
//! they need and return `Result<ToolCallResult, ToolError>`; [`ToolHandler`]
//! dispatches by name and converts failures into error results.

mod account;
mod artifacts;
mod builds;
mod clusters;
mod jobs;
mod pipelines;
mod test_engine;

use std::sync::Arc;

use buildkite_core::{ApiResponse, BuildkiteProvider};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::ToolError;
use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::request::ToolArguments;

pub(crate) type ToolResult = Result<ToolCallResult, ToolError>;

/// Tool handler that executes tools against a Buildkite provider.
pub struct ToolHandler {
    provider: Arc<dyn BuildkiteProvider>,
}

impl ToolHandler {
    pub fn new(provider: Arc<dyn BuildkiteProvider>) -> Self {
        Self { provider }
    }

    /// Every tool this server exposes.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        catalog()
    }

    /// Execute a tool by name with arguments.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let args = ToolArguments::new(arguments);

        match self.dispatch(name, &args).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, name: &str, args: &ToolArguments) -> ToolResult {
        let p = self.provider.as_ref();

        match name {
            "list_pipelines" => pipelines::list_pipelines(p, args).await,
            "get_pipeline" => pipelines::get_pipeline(p, args).await,
            "create_pipeline" => pipelines::create_pipeline(p, args).await,
            "update_pipeline" => pipelines::update_pipeline(p, args).await,
            "list_builds" => builds::list_builds(p, args).await,
            "get_build" => builds::get_build(p, args).await,
            "get_build_test_engine_runs" => builds::get_build_test_engine_runs(p, args).await,
            "create_build" => builds::create_build(p, args).await,
            "get_jobs" => jobs::get_jobs(p, args).await,
            "get_job_logs" => jobs::get_job_logs(p, args).await,
            "list_artifacts" => artifacts::list_artifacts(p, args).await,
            "get_artifact" => artifacts::get_artifact(p, args).await,
            "list_annotations" => artifacts::list_annotations(p, args).await,
            "list_clusters" => clusters::list_clusters(p, args).await,
            "get_cluster" => clusters::get_cluster(p, args).await,
            "list_cluster_queues" => clusters::list_cluster_queues(p, args).await,
            "get_cluster_queue" => clusters::get_cluster_queue(p, args).await,
            "list_test_runs" => test_engine::list_test_runs(p, args).await,
            "get_test_run" => test_engine::get_test_run(p, args).await,
            "get_failed_executions" => test_engine::get_failed_executions(p, args).await,
            "get_test" => test_engine::get_test(p, args).await,
            "current_user" => account::current_user(p, args).await,
            "user_token_organization" => account::user_token_organization(p, args).await,
            "access_token" => account::access_token(p, args).await,
            _ => Ok(ToolCallResult::error(format!("Unknown tool: {}", name))),
        }
    }
}

/// Tool definitions in catalog order.
pub fn catalog() -> Vec<ToolDefinition> {
    [
        pipelines::tools(),
        builds::tools(),
        jobs::tools(),
        artifacts::tools(),
        clusters::tools(),
        test_engine::tools(),
        account::tools(),
    ]
    .concat()
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Serialize `value` as the text of a successful result.
pub(crate) fn json_result<T: Serialize + ?Sized>(value: &T) -> ToolResult {
    Ok(ToolCallResult::text(serde_json::to_string(value)?))
}

/// Reject any response that is not a plain `200 OK`.
pub(crate) fn ensure_ok<T>(resp: &ApiResponse<T>, what: &'static str) -> Result<(), ToolError> {
    if resp.meta.status == 200 {
        Ok(())
    } else {
        Err(ToolError::UnexpectedStatus {
            what,
            status: resp.meta.status,
        })
    }
}

// Shared parameter descriptions.
pub(crate) const ORG_DESC: &str = "The organization slug for the owner of the pipeline";
pub(crate) const PIPELINE_DESC: &str = "The slug of the pipeline";
pub(crate) const BUILD_DESC: &str = "The number of the build";
