//! Cluster and queue tools.

use buildkite_core::ClusterProvider;
use tracing::{instrument, Span};

use super::{ensure_ok, json_result, ToolResult, ORG_DESC};
use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::request::ToolArguments;
use crate::tools::{ToolBuilder, MAX_SERVER_PER_PAGE};

const CLUSTER_DESC: &str = "The id of the cluster";

pub(super) fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolBuilder::new("list_clusters", "List all buildkite clusters in an organization")
            .required_string("org", ORG_DESC)
            .pagination(MAX_SERVER_PER_PAGE)
            .annotate("List Clusters", true)
            .build(),
        ToolBuilder::new(
            "get_cluster",
            "Get details of a buildkite cluster in an organization",
        )
        .required_string("org", ORG_DESC)
        .required_string("cluster_id", CLUSTER_DESC)
        .annotate("Get Cluster", true)
        .build(),
        ToolBuilder::new("list_cluster_queues", "List all buildkite queues in a cluster")
            .required_string("org", ORG_DESC)
            .required_string("cluster_id", CLUSTER_DESC)
            .pagination(MAX_SERVER_PER_PAGE)
            .annotate("List Cluster Queues", true)
            .build(),
        ToolBuilder::new(
            "get_cluster_queue",
            "Get details of a buildkite cluster queue in an organization",
        )
        .required_string("org", ORG_DESC)
        .required_string("cluster_id", CLUSTER_DESC)
        .required_string("queue_id", "The id of the queue")
        .annotate("Get Cluster Queue", true)
        .build(),
    ]
}

#[instrument(skip_all, name = "buildkite.list_clusters", fields(org, page, per_page))]
pub(super) async fn list_clusters<P: ClusterProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let pagination = args.server_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let resp = client.list_clusters(&org, pagination.into()).await?;
    ensure_ok(&resp, "clusters")?;

    if resp.data.is_empty() {
        return Ok(ToolCallResult::text("No clusters found"));
    }
    json_result(&resp.data)
}

#[instrument(skip_all, name = "buildkite.get_cluster", fields(org, cluster_id))]
pub(super) async fn get_cluster<P: ClusterProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let cluster_id = args.require_string("cluster_id")?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("cluster_id", cluster_id.as_str());

    let resp = client.get_cluster(&org, &cluster_id).await?;
    ensure_ok(&resp, "cluster")?;

    json_result(&resp.data)
}

#[instrument(
    skip_all,
    name = "buildkite.list_cluster_queues",
    fields(org, cluster_id, page, per_page)
)]
pub(super) async fn list_cluster_queues<P: ClusterProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let cluster_id = args.require_string("cluster_id")?;
    let pagination = args.server_pagination();

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("cluster_id", cluster_id.as_str());
    span.record("page", pagination.page);
    span.record("per_page", pagination.per_page);

    let resp = client
        .list_cluster_queues(&org, &cluster_id, pagination.into())
        .await?;
    ensure_ok(&resp, "cluster queues")?;

    if resp.data.is_empty() {
        return Ok(ToolCallResult::text("No queues found"));
    }
    json_result(&resp.data)
}

#[instrument(
    skip_all,
    name = "buildkite.get_cluster_queue",
    fields(org, cluster_id, queue_id)
)]
pub(super) async fn get_cluster_queue<P: ClusterProvider + ?Sized>(
    client: &P,
    args: &ToolArguments,
) -> ToolResult {
    let org = args.require_string("org")?;
    let cluster_id = args.require_string("cluster_id")?;
    let queue_id = args.require_string("queue_id")?;

    let span = Span::current();
    span.record("org", org.as_str());
    span.record("cluster_id", cluster_id.as_str());
    span.record("queue_id", queue_id.as_str());

    let resp = client.get_cluster_queue(&org, &cluster_id, &queue_id).await?;
    ensure_ok(&resp, "cluster queue")?;

    json_result(&resp.data)
}
