//! Buildkite API client implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use buildkite_core::{
    AccessToken, AccountProvider, Annotation, AnnotationProvider, ApiResponse, Artifact,
    ArtifactProvider, Build, BuildGetOptions, BuildListOptions, BuildProvider, Cluster,
    ClusterProvider, ClusterQueue, CreateBuildInput, CreatePipelineInput, Error, FailedExecution,
    JobLog, JobProvider, ListOptions, Organization, Pipeline, PipelineProvider, ResponseMeta,
    Result, Test, TestEngineProvider, TestRun, UpdatePipelineInput, User,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::DEFAULT_BASE_URL;

/// `User-Agent` sent when none is configured.
pub fn default_user_agent() -> String {
    format!(
        "buildkite-mcp-server/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Buildkite API client.
pub struct BuildkiteClient {
    base_url: String,
    token: String,
    user_agent: String,
    headers: BTreeMap<String, String>,
    client: reqwest::Client,
}

impl BuildkiteClient {
    /// Create a new client against the public Buildkite API.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Extra headers sent with every request.
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Build request with common headers.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, &self.user_agent);

        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
    }

    /// Whether `url` has the same origin as the configured base URL.
    fn is_api_url(&self, url: &str) -> bool {
        match (reqwest::Url::parse(&self.base_url), reqwest::Url::parse(url)) {
            (Ok(base), Ok(url)) => base.origin() == url.origin(),
            _ => false,
        }
    }

    /// Get the API URL for a v2 endpoint.
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/v2{}", self.base_url, endpoint)
    }

    /// Get the API URL for an organization-scoped endpoint.
    fn org_url(&self, org: &str, endpoint: &str) -> String {
        self.api_url(&format!("/organizations/{}{}", org, endpoint))
    }

    /// Get the API URL for a build-scoped endpoint.
    fn build_url(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        endpoint: &str,
    ) -> String {
        self.org_url(
            org,
            &format!(
                "/pipelines/{}/builds/{}{}",
                pipeline_slug, build_number, endpoint
            ),
        )
    }

    /// Get the API URL for a Test Engine suite endpoint.
    fn suite_url(&self, org: &str, test_suite_slug: &str, endpoint: &str) -> String {
        self.api_url(&format!(
            "/analytics/organizations/{}/suites/{}{}",
            org, test_suite_slug, endpoint
        ))
    }

    /// Make an authenticated GET request with typed deserialization.
    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        debug!(url = url, "Buildkite GET request");

        let response = self
            .request(reqwest::Method::GET, url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        debug!(url = url, "Buildkite POST request");

        let response = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make an authenticated PATCH request.
    async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        debug!(url = url, "Buildkite PATCH request");

        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Check the status and capture response metadata.
    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<(ResponseMeta, reqwest::Response)> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Buildkite API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        let link = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let meta = ResponseMeta {
            status: status.as_u16(),
            link,
        };
        Ok((meta, response))
    }

    /// Handle response and map errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<ApiResponse<T>> {
        let (meta, response) = self.check_response(response).await?;

        let data = response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;

        Ok(ApiResponse::new(data, meta))
    }
}

fn page_query(opts: ListOptions) -> Vec<(&'static str, String)> {
    vec![
        ("page", opts.page.to_string()),
        ("per_page", opts.per_page.to_string()),
    ]
}

// =============================================================================
// Trait implementations
// =============================================================================

#[async_trait]
impl PipelineProvider for BuildkiteClient {
    async fn list_pipelines(
        &self,
        org: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Pipeline>>> {
        self.get(&self.org_url(org, "/pipelines"), &page_query(opts))
            .await
    }

    async fn get_pipeline(&self, org: &str, pipeline_slug: &str) -> Result<ApiResponse<Pipeline>> {
        let url = self.org_url(org, &format!("/pipelines/{}", pipeline_slug));
        self.get(&url, &[]).await
    }

    async fn create_pipeline(
        &self,
        org: &str,
        input: CreatePipelineInput,
    ) -> Result<ApiResponse<Pipeline>> {
        self.post(&self.org_url(org, "/pipelines"), &input).await
    }

    async fn update_pipeline(
        &self,
        org: &str,
        pipeline_slug: &str,
        input: UpdatePipelineInput,
    ) -> Result<ApiResponse<Pipeline>> {
        let url = self.org_url(org, &format!("/pipelines/{}", pipeline_slug));
        self.patch(&url, &input).await
    }
}

#[async_trait]
impl BuildProvider for BuildkiteClient {
    async fn list_builds(
        &self,
        org: &str,
        pipeline_slug: &str,
        opts: BuildListOptions,
    ) -> Result<ApiResponse<Vec<Build>>> {
        let url = self.org_url(org, &format!("/pipelines/{}/builds", pipeline_slug));

        let mut query = page_query(opts.list);
        if let Some(branch) = opts.branch.filter(|b| !b.is_empty()) {
            query.push(("branch", branch));
        }
        query.push(("exclude_jobs", "true".to_string()));
        query.push(("exclude_pipeline", "true".to_string()));

        self.get(&url, &query).await
    }

    async fn get_build(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        opts: BuildGetOptions,
    ) -> Result<ApiResponse<Build>> {
        let url = self.build_url(org, pipeline_slug, build_number, "");

        let mut query = Vec::new();
        if opts.include_test_engine {
            query.push(("include_test_engine", "true".to_string()));
        }

        self.get(&url, &query).await
    }

    async fn create_build(
        &self,
        org: &str,
        pipeline_slug: &str,
        input: CreateBuildInput,
    ) -> Result<ApiResponse<Build>> {
        let url = self.org_url(org, &format!("/pipelines/{}/builds", pipeline_slug));
        self.post(&url, &input).await
    }
}

#[async_trait]
impl JobProvider for BuildkiteClient {
    async fn get_job_log(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        job_id: &str,
    ) -> Result<ApiResponse<JobLog>> {
        let url = self.build_url(
            org,
            pipeline_slug,
            build_number,
            &format!("/jobs/{}/log", job_id),
        );
        self.get(&url, &[]).await
    }
}

#[async_trait]
impl ArtifactProvider for BuildkiteClient {
    async fn list_artifacts(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Artifact>>> {
        let url = self.build_url(org, pipeline_slug, build_number, "/artifacts");
        self.get(&url, &page_query(opts)).await
    }

    async fn download_artifact(&self, url: &str) -> Result<ApiResponse<Vec<u8>>> {
        debug!(url = url, "Buildkite artifact download");

        // Credentials and configured headers only go to the API host.
        let request = if self.is_api_url(url) {
            self.request(reqwest::Method::GET, url)
        } else {
            warn!(
                url = url,
                "Artifact URL is outside the API host, sending without credentials"
            );
            self.client
                .get(url)
                .header(reqwest::header::USER_AGENT, &self.user_agent)
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let (meta, response) = self.check_response(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("Failed to read artifact body: {}", e)))?;

        Ok(ApiResponse::new(bytes.to_vec(), meta))
    }
}

#[async_trait]
impl AnnotationProvider for BuildkiteClient {
    async fn list_annotations(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Annotation>>> {
        let url = self.build_url(org, pipeline_slug, build_number, "/annotations");
        self.get(&url, &page_query(opts)).await
    }
}

#[async_trait]
impl ClusterProvider for BuildkiteClient {
    async fn list_clusters(
        &self,
        org: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Cluster>>> {
        self.get(&self.org_url(org, "/clusters"), &page_query(opts))
            .await
    }

    async fn get_cluster(&self, org: &str, cluster_id: &str) -> Result<ApiResponse<Cluster>> {
        let url = self.org_url(org, &format!("/clusters/{}", cluster_id));
        self.get(&url, &[]).await
    }

    async fn list_cluster_queues(
        &self,
        org: &str,
        cluster_id: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<ClusterQueue>>> {
        let url = self.org_url(org, &format!("/clusters/{}/queues", cluster_id));
        self.get(&url, &page_query(opts)).await
    }

    async fn get_cluster_queue(
        &self,
        org: &str,
        cluster_id: &str,
        queue_id: &str,
    ) -> Result<ApiResponse<ClusterQueue>> {
        let url = self.org_url(
            org,
            &format!("/clusters/{}/queues/{}", cluster_id, queue_id),
        );
        self.get(&url, &[]).await
    }
}

#[async_trait]
impl TestEngineProvider for BuildkiteClient {
    async fn list_test_runs(
        &self,
        org: &str,
        test_suite_slug: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<TestRun>>> {
        let url = self.suite_url(org, test_suite_slug, "/runs");
        self.get(&url, &page_query(opts)).await
    }

    async fn get_test_run(
        &self,
        org: &str,
        test_suite_slug: &str,
        run_id: &str,
    ) -> Result<ApiResponse<TestRun>> {
        let url = self.suite_url(org, test_suite_slug, &format!("/runs/{}", run_id));
        self.get(&url, &[]).await
    }

    async fn get_failed_executions(
        &self,
        org: &str,
        test_suite_slug: &str,
        run_id: &str,
        include_failure_expanded: bool,
    ) -> Result<ApiResponse<Vec<FailedExecution>>> {
        let url = self.suite_url(
            org,
            test_suite_slug,
            &format!("/runs/{}/failed_executions", run_id),
        );

        let mut query = Vec::new();
        if include_failure_expanded {
            query.push(("include_failure_expanded", "true".to_string()));
        }

        self.get(&url, &query).await
    }

    async fn get_test(
        &self,
        org: &str,
        test_suite_slug: &str,
        test_id: &str,
    ) -> Result<ApiResponse<Test>> {
        let url = self.suite_url(org, test_suite_slug, &format!("/tests/{}", test_id));
        self.get(&url, &[]).await
    }
}

#[async_trait]
impl AccountProvider for BuildkiteClient {
    async fn current_user(&self) -> Result<ApiResponse<User>> {
        self.get(&self.api_url("/user"), &[]).await
    }

    async fn list_organizations(&self) -> Result<ApiResponse<Vec<Organization>>> {
        self.get(&self.api_url("/organizations"), &[]).await
    }

    async fn access_token(&self) -> Result<ApiResponse<AccessToken>> {
        self.get(&self.api_url("/access-token"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BuildkiteClient::with_base_url("https://bk.example.com/", "t");
        assert_eq!(client.api_url("/user"), "https://bk.example.com/v2/user");
    }

    #[test]
    fn test_url_builders() {
        let client = BuildkiteClient::new("t");
        assert_eq!(
            client.build_url("acme", "web", "42", "/annotations"),
            "https://api.buildkite.com/v2/organizations/acme/pipelines/web/builds/42/annotations"
        );
        assert_eq!(
            client.suite_url("acme", "rspec", "/tests/t1"),
            "https://api.buildkite.com/v2/analytics/organizations/acme/suites/rspec/tests/t1"
        );
    }

    #[test]
    fn test_is_api_url_compares_origin() {
        let client = BuildkiteClient::with_base_url("https://api.buildkite.com/", "token");

        assert!(client.is_api_url("https://api.buildkite.com/v2/organizations/acme/artifacts/a1"));
        assert!(!client.is_api_url("https://evil.example.com/v2/organizations/acme"));
        assert!(!client.is_api_url("http://api.buildkite.com/v2/organizations/acme"));
        assert!(!client.is_api_url("https://api.buildkite.com:8443/v2"));
        assert!(!client.is_api_url("/v2/organizations/acme"));
    }

    #[test]
    fn test_default_user_agent() {
        let ua = default_user_agent();
        assert!(ua.starts_with("buildkite-mcp-server/"));
        assert!(ua.contains(std::env::consts::OS));
    }

    mod integration {
        use super::*;
        use httpmock::prelude::*;

        fn create_test_client(server: &MockServer) -> BuildkiteClient {
            BuildkiteClient::with_base_url(server.base_url(), "test-token")
        }

        #[tokio::test]
        async fn test_list_pipelines_with_link_header() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/v2/organizations/acme/pipelines")
                    .query_param("page", "2")
                    .query_param("per_page", "1")
                    .header("Authorization", "Bearer test-token");
                then.status(200)
                    .header(
                        "Link",
                        "<https://api.buildkite.com/v2/organizations/acme/pipelines?page=3>; rel=\"next\"",
                    )
                    .json_body(serde_json::json!([
                        {"id": "p1", "name": "Web", "slug": "web", "repository": "git@github.com:acme/web.git"}
                    ]));
            });

            let client = create_test_client(&server);
            let resp = client
                .list_pipelines("acme", ListOptions { page: 2, per_page: 1 })
                .await
                .unwrap();

            assert_eq!(resp.meta.status, 200);
            assert!(resp.link().contains("page=3"));
            assert_eq!(resp.data.len(), 1);
            assert_eq!(resp.data[0].slug, "web");
        }

        #[tokio::test]
        async fn test_custom_headers_and_user_agent() {
            let server = MockServer::start();

            let mock = server.mock(|when, then| {
                when.method(GET)
                    .path("/v2/user")
                    .header("User-Agent", "custom/1.0")
                    .header("X-Team", "platform");
                then.status(200)
                    .json_body(serde_json::json!({"id": "u1", "name": "Jane"}));
            });

            let mut headers = BTreeMap::new();
            headers.insert("X-Team".to_string(), "platform".to_string());
            let client = create_test_client(&server)
                .with_user_agent("custom/1.0")
                .with_headers(headers);

            let user = client.current_user().await.unwrap();
            mock.assert();
            assert_eq!(user.data.name.as_deref(), Some("Jane"));
            assert!(user.link().is_empty());
        }

        #[tokio::test]
        async fn test_list_builds_excludes_jobs_and_pipeline() {
            let server = MockServer::start();

            let mock = server.mock(|when, then| {
                when.method(GET)
                    .path("/v2/organizations/acme/pipelines/web/builds")
                    .query_param("branch", "main")
                    .query_param("exclude_jobs", "true")
                    .query_param("exclude_pipeline", "true");
                then.status(200).json_body(serde_json::json!([
                    {"id": "b1", "number": 7, "state": "passed", "branch": "main"}
                ]));
            });

            let client = create_test_client(&server);
            let resp = client
                .list_builds(
                    "acme",
                    "web",
                    BuildListOptions {
                        branch: Some("main".to_string()),
                        list: ListOptions::default(),
                    },
                )
                .await
                .unwrap();

            mock.assert();
            assert_eq!(resp.data[0].number, 7);
        }

        #[tokio::test]
        async fn test_get_build_with_test_engine() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/v2/organizations/acme/pipelines/web/builds/42")
                    .query_param("include_test_engine", "true");
                then.status(200).json_body(serde_json::json!({
                    "id": "b42",
                    "number": 42,
                    "state": "failed",
                    "jobs": [{"id": "j1", "type": "script", "state": "failed"}],
                    "test_engine": {"runs": [{"id": "r1", "suite": {"id": "s1", "slug": "rspec"}}]}
                }));
            });

            let client = create_test_client(&server);
            let build = client
                .get_build(
                    "acme",
                    "web",
                    "42",
                    BuildGetOptions {
                        include_test_engine: true,
                    },
                )
                .await
                .unwrap()
                .data;

            assert_eq!(build.jobs.len(), 1);
            assert_eq!(build.jobs[0].job_type, "script");
            let runs = build.test_engine.unwrap().runs;
            assert_eq!(runs[0].id, "r1");
        }

        #[tokio::test]
        async fn test_create_build_posts_body() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(POST)
                    .path("/v2/organizations/acme/pipelines/web/builds")
                    .body_includes("\"commit\":\"HEAD\"")
                    .body_includes("\"FOO\":\"bar\"");
                then.status(201)
                    .json_body(serde_json::json!({"id": "b9", "number": 9, "state": "scheduled"}));
            });

            let mut env = BTreeMap::new();
            env.insert("FOO".to_string(), "bar".to_string());

            let client = create_test_client(&server);
            let resp = client
                .create_build(
                    "acme",
                    "web",
                    CreateBuildInput {
                        commit: "HEAD".to_string(),
                        branch: "main".to_string(),
                        message: "Deploy".to_string(),
                        env: Some(env),
                        meta_data: None,
                    },
                )
                .await
                .unwrap();

            assert_eq!(resp.meta.status, 201);
            assert_eq!(resp.data.number, 9);
        }

        #[tokio::test]
        async fn test_update_pipeline_uses_patch() {
            let server = MockServer::start();

            let mock = server.mock(|when, then| {
                when.method(PATCH)
                    .path("/v2/organizations/acme/pipelines/web")
                    .body_includes("\"repository\":\"git@github.com:acme/web.git\"");
                then.status(200)
                    .json_body(serde_json::json!({"id": "p1", "name": "Web", "slug": "web"}));
            });

            let client = create_test_client(&server);
            let resp = client
                .update_pipeline(
                    "acme",
                    "web",
                    UpdatePipelineInput {
                        repository: Some("git@github.com:acme/web.git".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();

            mock.assert();
            assert_eq!(resp.data.name, "Web");
        }

        #[tokio::test]
        async fn test_get_job_log() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/v2/organizations/acme/pipelines/web/builds/42/jobs/j-1/log");
                then.status(200).json_body(serde_json::json!({
                    "url": "https://api.buildkite.com/log",
                    "content": "\u{1b}[32mok\u{1b}[0m\n",
                    "size": 14,
                    "header_times": []
                }));
            });

            let client = create_test_client(&server);
            let log = client.get_job_log("acme", "web", "42", "j-1").await.unwrap();
            assert_eq!(log.data.content, "\u{1b}[32mok\u{1b}[0m\n");
            assert_eq!(log.data.size, 14);
        }

        #[tokio::test]
        async fn test_download_artifact_returns_bytes() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/artifacts/a1/download")
                    .header("authorization", "Bearer test-token");
                then.status(200).body(vec![0u8, 159, 146, 150]);
            });

            let client = create_test_client(&server);
            let resp = client
                .download_artifact(&server.url("/artifacts/a1/download"))
                .await
                .unwrap();

            assert_eq!(resp.meta.status, 200);
            assert_eq!(resp.data, vec![0u8, 159, 146, 150]);
        }

        #[tokio::test]
        async fn test_download_artifact_from_other_host_omits_credentials() {
            let api = MockServer::start();
            let other = MockServer::start();

            let download = other.mock(|when, then| {
                when.method(GET)
                    .path("/bucket/report.txt")
                    .header_missing("authorization")
                    .header_missing("x-team");
                then.status(200).body("report");
            });

            let mut headers = BTreeMap::new();
            headers.insert("X-Team".to_string(), "platform".to_string());
            let client = create_test_client(&api).with_headers(headers);
            let resp = client
                .download_artifact(&other.url("/bucket/report.txt"))
                .await
                .unwrap();

            download.assert();
            assert_eq!(resp.data, b"report".to_vec());
        }

        #[tokio::test]
        async fn test_cluster_queues() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/v2/organizations/acme/clusters/c1/queues")
                    .query_param("per_page", "100");
                then.status(200).json_body(serde_json::json!([
                    {"id": "q1", "key": "default", "dispatch_paused": false}
                ]));
            });

            let client = create_test_client(&server);
            let resp = client
                .list_cluster_queues(
                    "acme",
                    "c1",
                    ListOptions {
                        page: 1,
                        per_page: 100,
                    },
                )
                .await
                .unwrap();

            assert_eq!(resp.data[0].key, "default");
        }

        #[tokio::test]
        async fn test_failed_executions_expanded() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET)
                    .path("/v2/analytics/organizations/acme/suites/rspec/runs/r1/failed_executions")
                    .query_param("include_failure_expanded", "true");
                then.status(200).json_body(serde_json::json!([{
                    "execution_id": "e1",
                    "run_id": "r1",
                    "test_id": "t1",
                    "test_name": "it works",
                    "failure_reason": "expected true",
                    "failure_expanded": [{"backtrace": ["spec.rb:3"], "expanded": ["got false"]}]
                }]));
            });

            let client = create_test_client(&server);
            let resp = client
                .get_failed_executions("acme", "rspec", "r1", true)
                .await
                .unwrap();

            assert_eq!(resp.data.len(), 1);
            assert_eq!(resp.data[0].failure_expanded[0].backtrace, vec!["spec.rb:3"]);
        }

        #[tokio::test]
        async fn test_not_found_keeps_raw_body() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/v2/organizations/acme/pipelines/missing");
                then.status(404)
                    .body("{\"message\":\"No pipeline found\"}");
            });

            let client = create_test_client(&server);
            let err = client.get_pipeline("acme", "missing").await.unwrap_err();

            assert!(matches!(err, Error::NotFound(_)));
            assert_eq!(err.raw_body(), Some("{\"message\":\"No pipeline found\"}"));
        }

        #[tokio::test]
        async fn test_unauthorized() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/v2/access-token");
                then.status(401).body("{\"message\":\"Authentication required\"}");
            });

            let client = create_test_client(&server);
            let err = client.access_token().await.unwrap_err();
            assert!(matches!(err, Error::Unauthorized(_)));
            assert_eq!(err.status(), Some(401));
        }

        #[tokio::test]
        async fn test_invalid_json_is_invalid_data() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(GET).path("/v2/organizations");
                then.status(200).body("not json");
            });

            let client = create_test_client(&server);
            let err = client.list_organizations().await.unwrap_err();
            assert!(matches!(err, Error::InvalidData(_)));
        }
    }
}
