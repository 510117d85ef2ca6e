//! Job tools: job listing over a fetched build, and processed job logs.

use buildkite_core::{BuildGetOptions, BuildProvider, Job, JobProvider};
use buildkite_output::{
    estimate_tokens, filter_jobs_by_state, joblogs, paginate, redact_agents,
    ClientPaginatedResult, JobSummary,
};
use serde::Serialize;
use tracing::{instrument, Span};

use super::{ensure_ok, json_result, ToolResult, BUILD_DESC, ORG_DESC, PIPELINE_DESC};
use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::request::ToolArguments;
use crate::tools::{ToolBuilder, MAX_JOBS_PER_PAGE};

pub(super) fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolBuilder::new(
            "get_jobs",
            "Get jobs for a specific build in Buildkite. Optionally filter by job state.",
        )
        .required_string("org", ORG_DESC)
        .required_string("pipeline_slug", PIPELINE_DESC)
        .required_string("build_number", BUILD_DESC)
        .string(
            "job_state",
            "Filter jobs by state. Supports actual states (scheduled, running, passed, failed, canceled, skipped, etc.)",
        )
        .boolean(
            "include_agent",
            "Include detailed agent information in the response. When false (default), only agent ID is included to reduce response size.",
        )
        .pagination(MAX_JOBS_PER_PAGE)
        .annotate("Get Jobs", true)
        .build(),
        ToolBuilder::new("get_job_logs", "Get the logs of a job in a Buildkite build")
            .required_string("org", ORG_DESC)
            .required_string("pipeline_slug", PIPELINE_DESC)
            .required_string("build_number", "The build number")
            .required_string("job_uuid", "The UUID of the job")
            .annotate("Get Job Logs", true)
            .build(),
    ]
}

/// One page of jobs plus counts over the whole build.
#[derive(Debug, Serialize)]
struct JobsPage {
    #[serde(flatten)]
    page: ClientPaginatedResult<Job>,
    job_summary: JobSummary,
}

#[instrument(
    skip_all,
    name = "buildkite.get_jobs",
    fields(org, pipeline_slug, build_number, job_state, include_agent, page, per_page)
)]
pub(super) async fn get_jobs<P: BuildProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pipeline_slug = args.require_string("pipeline_slug")?;
    let build_number = args.require_string("build_number")?;
    let job_state = args.get_string("job_state", "");
    let include_agent = args.get_bool("include_agent", false);
    let pagination = args.client_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());
    span.record("build_number", build_number.as_str());
    span.record("job_state", job_state.as_str());
    span.record("include_agent", include_agent);
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let resp = client
        .get_build(&org, &pipeline_slug, &build_number, BuildGetOptions::default())
        .await?;
    ensure_ok(&resp, "build")?;

    let jobs = resp.data.jobs;
    let job_summary = JobSummary::from_jobs(&jobs);
    let selected = filter_jobs_by_state(&jobs, Some(job_state.as_str()));
    let selected = redact_agents(&selected, include_agent);

    json_result(&JobsPage {
        page: paginate(selected, pagination),
        job_summary,
    })
}

#[instrument(
    skip_all,
    name = "buildkite.get_job_logs",
    fields(org, pipeline_slug, build_number, job_uuid, tokens)
)]
pub(super) async fn get_job_logs<P: JobProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pipeline_slug = args.require_string("pipeline_slug")?;
    let build_number = args.require_string("build_number")?;
    let job_uuid = args.require_string("job_uuid")?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("pipeline_slug", pipeline_slug.as_str());
    span.record("build_number", build_number.as_str());
    span.record("job_uuid", job_uuid.as_str());

    let resp = client
        .get_job_log(&org, &pipeline_slug, &build_number, &job_uuid)
        .await?;
    ensure_ok(&resp, "job log")?;

    let text = joblogs::process(&resp.data)?;
    span.record("tokens", estimate_tokens(&text));

    Ok(ToolCallResult::text(text))
}
