//! Pipeline tools.

use buildkite_core::{CreatePipelineInput, PipelineProvider, UpdatePipelineInput};
use buildkite_output::PaginatedResult;
use tracing::{instrument, Span};

use super::{ensure_ok, json_result, ToolResult, ORG_DESC, PIPELINE_DESC};
use crate::error::ToolError;
use crate::protocol::ToolDefinition;
use crate::request::ToolArguments;
use crate::tools::{ToolBuilder, MAX_SERVER_PER_PAGE};

pub(super) fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolBuilder::new(
            "list_pipelines",
            "List all pipelines in an organization with their basic details, build counts, and current status",
        )
        .required_string("org", ORG_DESC)
        .pagination(MAX_SERVER_PER_PAGE)
        .annotate("List Pipelines", true)
        .build(),
        ToolBuilder::new(
            "get_pipeline",
            "Get detailed information about a specific pipeline including its configuration, steps, environment variables, and build statistics",
        )
        .required_string("org", ORG_DESC)
        .required_string("pipeline_slug", PIPELINE_DESC)
        .annotate("Get Pipeline", true)
        .build(),
        ToolBuilder::new(
            "create_pipeline",
            "Create a new pipeline in Buildkite using the provided repository URL. The repository URL must be a valid Git repository URL that is accessible to Buildkite",
        )
        .required_string(
            "org_slug",
            "The organization slug for the owner of the pipeline. This is used to determine where to create the pipeline",
        )
        .required_string("name", "The name of the pipeline")
        .required_string("repository_url", "The Git repository URL to use for the pipeline")
        .required_string(
            "cluster_id",
            "The ID value of the cluster the pipeline will be associated with",
        )
        .required_string(
            "configuration",
            "The pipeline configuration in YAML format. Contains the build steps and pipeline settings",
        )
        .string("description", "The description of the pipeline")
        .string("default_branch", "The default branch for builds and metrics filtering")
        .boolean(
            "skip_queued_branch_builds",
            "Skip intermediate builds when new builds are created on the same branch",
        )
        .boolean(
            "cancel_running_branch_builds",
            "Cancel running builds when new builds are created on the same branch",
        )
        .annotate("Create Pipeline", false)
        .build(),
        ToolBuilder::new(
            "update_pipeline",
            "Update an existing pipeline in Buildkite using the provided repository URL. The repository URL must be a valid Git repository URL that is accessible to Buildkite",
        )
        .required_string(
            "org_slug",
            "The organization slug for the owner of the pipeline. This is used to determine where to update the pipeline",
        )
        .required_string("pipeline_slug", "The slug of the pipeline to update")
        .required_string("repository_url", "The Git repository URL to use for the pipeline")
        .required_string(
            "configuration",
            "The pipeline configuration in YAML format. Contains the build steps and pipeline settings",
        )
        .string("name", "The name of the pipeline")
        .string(
            "cluster_id",
            "The ID value of the cluster the pipeline will be associated with",
        )
        .string("description", "The description of the pipeline")
        .string("default_branch", "The default branch for builds and metrics filtering")
        .boolean(
            "skip_queued_branch_builds",
            "Skip intermediate builds when new builds are created on the same branch",
        )
        .boolean(
            "cancel_running_branch_builds",
            "Cancel running builds when new builds are created on the same branch",
        )
        .annotate("Update Pipeline", false)
        .build(),
    ]
}

#[instrument(skip_all, name = "buildkite.list_pipelines", fields(org, page, per_page))]
pub(super) async fn list_pipelines<P: PipelineProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pagination = args.server_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let resp = client.list_pipelines(&org, pagination.into()).await?;
    ensure_ok(&resp, "pipelines")?;

    let link = resp.link().to_string();
    json_result(&PaginatedResult::new(resp.data, link))
}

#[instrument(skip_all, name = "buildkite.get_pipeline", fields(org, pipeline_slug))]
pub(super) async fn get_pipeline<P: PipelineProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pipeline_slug = args.require_string("pipeline_slug")?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());

    let resp = client.get_pipeline(&org, &pipeline_slug).await?;
    ensure_ok(&resp, "pipeline")?;

    json_result(&resp.data)
}

#[instrument(skip_all, name = "buildkite.create_pipeline", fields(org, name))]
pub(super) async fn create_pipeline<P: PipelineProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = required_field(args, "org_slug")?;
    let name = required_field(args, "name")?;
    let repository = required_field(args, "repository_url")?;
    let cluster_id = required_field(args, "cluster_id")?;
    let configuration = required_field(args, "configuration")?;
    validate_repository_url(&repository)?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("name", name.as_str());

    let input = CreatePipelineInput {
        name,
        repository,
        cluster_id,
        configuration,
        description: args.get_optional_string("description"),
        default_branch: args.get_optional_string("default_branch"),
        skip_queued_branch_builds: args.get_bool("skip_queued_branch_builds", false),
        cancel_running_branch_builds: args.get_bool("cancel_running_branch_builds", false),
    };

    let resp = client.create_pipeline(&org, input).await?;
    json_result(&resp.data)
}

#[instrument(skip_all, name = "buildkite.update_pipeline", fields(org, pipeline_slug))]
pub(super) async fn update_pipeline<P: PipelineProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = required_field(args, "org_slug")?;
    let repository = required_field(args, "repository_url")?;
    let pipeline_slug = required_field(args, "pipeline_slug")?;
    let configuration = required_field(args, "configuration")?;
    validate_repository_url(&repository)?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());

    let input = UpdatePipelineInput {
        name: args.get_optional_string("name"),
        repository: Some(repository),
        cluster_id: args.get_optional_string("cluster_id"),
        configuration: Some(configuration),
        description: args.get_optional_string("description"),
        default_branch: args.get_optional_string("default_branch"),
        skip_queued_branch_builds: args.get_optional_bool("skip_queued_branch_builds"),
        cancel_running_branch_builds: args.get_optional_bool("cancel_running_branch_builds"),
    };

    let resp = client.update_pipeline(&org, &pipeline_slug, input).await?;
    json_result(&resp.data)
}

/// A string argument that must be present and non-empty.
fn required_field(args: &ToolArguments, name: &str) -> Result<String, ToolError> {
    args.get_optional_string(name)
        .ok_or_else(|| ToolError::required(name))
}

fn validate_repository_url(url: &str) -> Result<(), ToolError> {
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ToolError::InvalidArgument(format!(
            "invalid repository URL: {:?} contains whitespace or control characters",
            url
        )));
    }
    Ok(())
}
