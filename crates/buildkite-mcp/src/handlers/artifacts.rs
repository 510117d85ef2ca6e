//! Build output tools: artifacts and annotations.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use buildkite_core::{AnnotationProvider, ArtifactProvider};
use buildkite_output::PaginatedResult;
use serde::Serialize;
use tracing::{instrument, Span};

use super::{ensure_ok, json_result, ToolResult, ORG_DESC, PIPELINE_DESC};
use crate::protocol::ToolDefinition;
use crate::request::ToolArguments;
use crate::tools::{ToolBuilder, MAX_SERVER_PER_PAGE};

pub(super) fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolBuilder::new("list_artifacts", "List the artifacts for a Buildkite build")
            .required_string("org", ORG_DESC)
            .required_string("pipeline_slug", PIPELINE_DESC)
            .required_string("build_number", "The build number")
            .pagination(MAX_SERVER_PER_PAGE)
            .annotate("List Artifacts", true)
            .build(),
        ToolBuilder::new("get_artifact", "Get an artifact from a Buildkite build")
            .required_string("url", "The URL of the artifact to get")
            .annotate("Get Artifact", true)
            .build(),
        ToolBuilder::new("list_annotations", "List the annotations for a Buildkite build")
            .required_string("org", ORG_DESC)
            .required_string("pipeline_slug", PIPELINE_DESC)
            .required_string("build_number", "The build number")
            .pagination(MAX_SERVER_PER_PAGE)
            .annotate("List Annotations", true)
            .build(),
    ]
}

/// Artifact content, base64 encoded so binary files survive JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactContent {
    status_code: u16,
    encoding: &'static str,
    data: String,
}

#[instrument(
    skip_all,
    name = "buildkite.list_artifacts",
    fields(org, pipeline_slug, build_number, page, per_page)
)]
pub(super) async fn list_artifacts<P: ArtifactProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pipeline_slug = args.require_string("pipeline_slug")?;
    let build_number = args.require_string("build_number")?;
    let pagination = args.server_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());
    span.record("build_number", build_number.as_str());
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let resp = client
        .list_artifacts(&org, &pipeline_slug, &build_number, pagination.into())
        .await?;
    ensure_ok(&resp, "artifacts")?;

    let link = resp.link().to_string();
    json_result(&PaginatedResult::new(resp.data, link))
}

#[instrument(skip_all, name = "buildkite.get_artifact", fields(url))]
pub(super) async fn get_artifact<P: ArtifactProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let url = args.require_string("url")?;
    Span::current().record("url", url.as_str());

    let resp = client.download_artifact(&url).await?;
    ensure_ok(&resp, "artifact")?;

    json_result(&ArtifactContent {
        status_code: resp.meta.status,
        encoding: "base64",
        data: STANDARD.encode(&resp.data),
    })
}

#[instrument(
    skip_all,
    name = "buildkite.list_annotations",
    fields(org, pipeline_slug, build_number, page, per_page)
)]
pub(super) async fn list_annotations<P: AnnotationProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pipeline_slug = args.require_string("pipeline_slug")?;
    let build_number = args.require_string("build_number")?;
    let pagination = args.server_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());
    span.record("build_number", build_number.as_str());
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let resp = client
        .list_annotations(&org, &pipeline_slug, &build_number, pagination.into())
        .await?;
    ensure_ok(&resp, "annotations")?;

    let link = resp.link().to_string();
    json_result(&PaginatedResult::new(resp.data, link))
}
