//! Tools about the API token's owner.

use buildkite_core::AccountProvider;
use tracing::instrument;

use super::{ensure_ok, json_result, ToolResult};
use crate::error::ToolError;
use crate::protocol::ToolDefinition;
use crate::request::ToolArguments;
use crate::tools::ToolBuilder;

pub(super) fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolBuilder::new(
            "current_user",
            "Get details about the user account that owns the API token, including name, email, avatar, and account creation date",
        )
        .annotate("Get Current User", true)
        .build(),
        ToolBuilder::new(
            "user_token_organization",
            "Get the organization associated with the user token used for this request",
        )
        .annotate("Get Organization for User Token", true)
        .build(),
        ToolBuilder::new(
            "access_token",
            "Get the details for the API access token that was used to authenticate the request",
        )
        .annotate("Get Access Token", true)
        .build(),
    ]
}

#[instrument(skip_all, name = "buildkite.current_user")]
pub(super) async fn current_user<P: AccountProvider + ?Sized>(
    client: &P,
    _args: &ToolArguments,
) -> ToolResult {
    let resp = client.current_user().await?;
    ensure_ok(&resp, "current user")?;
    json_result(&resp.data)
}

/// The first organization the token can see.
#[instrument(skip_all, name = "buildkite.user_token_organization")]
pub(super) async fn user_token_organization<P: AccountProvider + ?Sized>(
    client: &P,
    _args: &ToolArguments,
) -> ToolResult {
    let resp = client.list_organizations().await?;
    ensure_ok(&resp, "current user organizations")?;

    let org = resp.data.first().ok_or(ToolError::NoOrganization)?;
    json_result(org)
}

#[instrument(skip_all, name = "buildkite.access_token")]
pub(super) async fn access_token<P: AccountProvider + ?Sized>(
    client: &P,
    _args: &ToolArguments,
) -> ToolResult {
    let resp = client.access_token().await?;
    ensure_ok(&resp, "access token")?;
    json_result(&resp.data)
}
