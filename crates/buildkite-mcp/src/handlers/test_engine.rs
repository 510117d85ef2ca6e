//! Test Engine tools.
//!
//! These address a test suite by slug within an organization. Failed
//! executions are paginated locally because the upstream endpoint returns the
//! whole run at once.

use buildkite_core::TestEngineProvider;
use buildkite_output::{paginate, PaginatedResult};
use tracing::{instrument, Span};

use super::{ensure_ok, json_result, ToolResult};
use crate::protocol::ToolDefinition;
use crate::request::ToolArguments;
use crate::tools::{ToolBuilder, MAX_SERVER_PER_PAGE};

const SUITE_ORG_DESC: &str = "The organization slug for the owner of the test suite";
const SUITE_DESC: &str = "The slug of the test suite";
const RUN_DESC: &str = "The ID of the test run";

pub(super) fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolBuilder::new(
            "list_test_runs",
            "List all test runs for a test suite in Buildkite Test Engine",
        )
        .required_string("org", SUITE_ORG_DESC)
        .required_string("test_suite_slug", SUITE_DESC)
        .pagination(MAX_SERVER_PER_PAGE)
        .annotate("List Test Runs", true)
        .build(),
        ToolBuilder::new("get_test_run", "Get a specific test run in Buildkite Test Engine")
            .required_string("org", SUITE_ORG_DESC)
            .required_string("test_suite_slug", SUITE_DESC)
            .required_string("run_id", RUN_DESC)
            .annotate("Get Test Run", true)
            .build(),
        ToolBuilder::new(
            "get_failed_executions",
            "Get failed test executions for a specific test run in Buildkite Test Engine. Optionally get the expanded failure details such as full error messages and stack traces.",
        )
        .required_string("org", SUITE_ORG_DESC)
        .required_string("test_suite_slug", "The slug of the test suite the run belongs to")
        .required_string("run_id", RUN_DESC)
        .boolean(
            "include_failure_expanded",
            "Include the expanded failure details such as full error messages and stack traces. This can be used to explain and diagnose the cause of test failures.",
        )
        .pagination(MAX_SERVER_PER_PAGE)
        .annotate("Get Failed Test Executions", true)
        .build(),
        ToolBuilder::new("get_test", "Get a specific test in Buildkite Test Engine")
            .required_string("org", SUITE_ORG_DESC)
            .required_string("test_suite_slug", SUITE_DESC)
            .required_string("test_id", "The ID of the test")
            .annotate("Get Test", true)
            .build(),
    ]
}

#[instrument(
    skip_all,
    name = "buildkite.list_test_runs",
    fields(org, test_suite_slug, page, per_page)
)]
pub(super) async fn list_test_runs<P: TestEngineProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let suite = args.require_string("test_suite_slug")?;
    let pagination = args.server_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("test_suite_slug", suite.as_str());
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let resp = client.list_test_runs(&org, &suite, pagination.into()).await?;
    ensure_ok(&resp, "test runs")?;

    let link = resp.link().to_string();
    json_result(&PaginatedResult::new(resp.data, link))
}

#[instrument(skip_all, name = "buildkite.get_test_run", fields(org, test_suite_slug, run_id))]
pub(super) async fn get_test_run<P: TestEngineProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let suite = args.require_string("test_suite_slug")?;
    let run_id = args.require_string("run_id")?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("test_suite_slug", suite.as_str());
    span.record("run_id", run_id.as_str());

    let resp = client.get_test_run(&org, &suite, &run_id).await?;
    ensure_ok(&resp, "test run")?;

    json_result(&resp.data)
}

#[instrument(
    skip_all,
    name = "buildkite.get_failed_executions",
    fields(org, test_suite_slug, run_id, include_failure_expanded, page, per_page)
)]
pub(super) async fn get_failed_executions<P: TestEngineProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let suite = args.require_string("test_suite_slug")?;
    let run_id = args.require_string("run_id")?;
    let include_failure_expanded = args.get_bool("include_failure_expanded", false);
    let pagination = args.client_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("test_suite_slug", suite.as_str());
    span.record("run_id", run_id.as_str());
    span.record("include_failure_expanded", include_failure_expanded);
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let resp = client
        .get_failed_executions(&org, &suite, &run_id, include_failure_expanded)
        .await?;
    ensure_ok(&resp, "failed executions")?;

    json_result(&paginate(resp.data, pagination))
}

#[instrument(skip_all, name = "buildkite.get_test", fields(org, test_suite_slug, test_id))]
pub(super) async fn get_test<P: TestEngineProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let suite = args.require_string("test_suite_slug")?;
    let test_id = args.require_string("test_id")?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("test_suite_slug", suite.as_str());
    span.record("test_id", test_id.as_str());

    let resp = client.get_test(&org, &suite, &test_id).await?;
    ensure_ok(&resp, "test")?;

    json_result(&resp.data)
}
