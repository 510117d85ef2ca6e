//! Build tools.

use buildkite_core::{Build, BuildGetOptions, BuildListOptions, BuildProvider, CreateBuildInput};
use buildkite_output::{JobSummary, PaginatedResult};
use serde::Serialize;
use tracing::{instrument, Span};

use super::{ensure_ok, json_result, ToolResult, BUILD_DESC, ORG_DESC, PIPELINE_DESC};
use crate::error::ToolError;
use crate::protocol::ToolDefinition;
use crate::request::ToolArguments;
use crate::tools::{ToolBuilder, MAX_SERVER_PER_PAGE};

pub(super) fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolBuilder::new(
            "list_builds",
            "List all builds for a pipeline with their status, commit information, and metadata",
        )
        .required_string("org", ORG_DESC)
        .required_string("pipeline_slug", PIPELINE_DESC)
        .string("branch", "Filter builds by git branch name")
        .pagination(MAX_SERVER_PER_PAGE)
        .annotate("List Builds", true)
        .build(),
        ToolBuilder::new(
            "get_build",
            "Get detailed information about a specific build including its jobs, timing, and execution details",
        )
        .required_string("org", ORG_DESC)
        .required_string("pipeline_slug", PIPELINE_DESC)
        .required_string("build_number", BUILD_DESC)
        .annotate("Get Build", true)
        .build(),
        ToolBuilder::new(
            "get_build_test_engine_runs",
            "Get test engine runs data for a specific build in Buildkite. This can be used to look up Test Runs.",
        )
        .required_string("org", ORG_DESC)
        .required_string("pipeline_slug", PIPELINE_DESC)
        .required_string("build_number", BUILD_DESC)
        .annotate("Get Build Test Engine Runs", true)
        .build(),
        ToolBuilder::new(
            "create_build",
            "Trigger a new build on a Buildkite pipeline for a specific commit and branch, with optional environment variables, metadata, and author information",
        )
        .required_string("org", ORG_DESC)
        .required_string("pipeline_slug", PIPELINE_DESC)
        .required_string("commit", "The commit SHA to build")
        .required_string("branch", "The branch to build")
        .required_string("message", "The commit message for the build")
        .entries("environment", "Environment variables to set for the build")
        .entries("metadata", "Meta-data values to set for the build")
        .annotate("Create Build", false)
        .build(),
    ]
}

/// A build with its job list replaced by counts.
#[derive(Debug, Serialize)]
struct BuildOverview {
    #[serde(flatten)]
    build: Build,
    job_summary: JobSummary,
}

impl From<Build> for BuildOverview {
    fn from(mut build: Build) -> Self {
        let job_summary = JobSummary::from_jobs(&build.jobs);
        build.jobs = Vec::new();
        Self { build, job_summary }
    }
}

#[instrument(
    skip_all,
    name = "buildkite.list_builds",
    fields(org, pipeline_slug, branch, page, per_page)
)]
pub(super) async fn list_builds<P: BuildProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pipeline_slug = args.require_string("pipeline_slug")?;
    let branch = args.get_optional_string("branch");
    let pagination = args.server_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());
    span.record("branch", branch.as_deref().unwrap_or_default());
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let opts = BuildListOptions {
        branch,
        list: pagination.into(),
    };

    let resp = client.list_builds(&org, &pipeline_slug, opts).await?;
    ensure_ok(&resp, "builds")?;

    let link = resp.link().to_string();
    json_result(&PaginatedResult::new(resp.data, link))
}

#[instrument(
    skip_all,
    name = "buildkite.get_build",
    fields(org, pipeline_slug, build_number)
)]
pub(super) async fn get_build<P: BuildProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let build = fetch_build(client, args).await?;
    json_result(&BuildOverview::from(build))
}

#[instrument(
    skip_all,
    name = "buildkite.get_build_test_engine_runs",
    fields(org, pipeline_slug, build_number)
)]
pub(super) async fn get_build_test_engine_runs<P: BuildProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let build = fetch_build(client, args).await?;
    let runs = build.test_engine.map(|t| t.runs).unwrap_or_default();
    json_result(&runs)
}

/// Shared by the single-build tools; records request fields on the current span.
async fn fetch_build<P: BuildProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> Result<Build, ToolError> {
    let org = args.require_string("org")?;
    let pipeline_slug = args.require_string("pipeline_slug")?;
    let build_number = args.require_string("build_number")?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());
    span.record("build_number", build_number.as_str());

    let opts = BuildGetOptions {
        include_test_engine: true,
    };
    let resp = client
        .get_build(&org, &pipeline_slug, &build_number, opts)
        .await?;
    ensure_ok(&resp, "build")?;

    Ok(resp.data)
}

#[instrument(skip_all, name = "buildkite.create_build", fields(org, pipeline_slug, branch))]
pub(super) async fn create_build<P: BuildProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pipeline_slug = args.require_string("pipeline_slug")?;
    let commit = args.require_string("commit")?;
    let branch = args.require_string("branch")?;
    let message = args.require_string("message")?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());
    span.record("branch", branch.as_str());

    let input = CreateBuildInput {
        commit,
        branch,
        message,
        env: args.get_entries("environment")?,
        meta_data: args.get_entries("metadata")?,
    };

    let resp = client.create_build(&org, &pipeline_slug, input).await?;
    json_result(&resp.data)
}
