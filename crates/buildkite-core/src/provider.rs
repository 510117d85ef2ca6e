//! Provider traits for the Buildkite API.
//!
//! Each resource family gets its own trait so tool handlers only ask for what
//! they use. `BuildkiteProvider` bundles all of them for the server.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    AccessToken, Annotation, Artifact, Build, Cluster, ClusterQueue, CreateBuildInput,
    CreatePipelineInput, FailedExecution, JobLog, Organization, Pipeline, Test, TestRun,
    UpdatePipelineInput, User,
};

/// Metadata of the HTTP response a value came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,
    /// Raw `Link` header, used for cursor pagination
    pub link: Option<String>,
}

/// A decoded API value together with its response metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, meta: ResponseMeta) -> Self {
        Self { data, meta }
    }

    /// Wrap a value as a plain `200 OK` response without a `Link` header.
    pub fn ok(data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta {
                status: 200,
                link: None,
            },
        }
    }

    /// `Link` header value, or an empty string when the response had none.
    pub fn link(&self) -> &str {
        self.meta.link.as_deref().unwrap_or_default()
    }
}

/// Page selection forwarded to list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub page: i64,
    pub per_page: i64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 30,
        }
    }
}

/// Options for listing builds of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildListOptions {
    pub branch: Option<String>,
    pub list: ListOptions,
}

/// Options for fetching a single build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildGetOptions {
    pub include_test_engine: bool,
}

#[async_trait]
pub trait PipelineProvider: Send + Sync {
    async fn list_pipelines(&self, org: &str, opts: ListOptions)
        -> Result<ApiResponse<Vec<Pipeline>>>;

    async fn get_pipeline(&self, org: &str, pipeline_slug: &str) -> Result<ApiResponse<Pipeline>>;

    async fn create_pipeline(
        &self,
        org: &str,
        input: CreatePipelineInput,
    ) -> Result<ApiResponse<Pipeline>>;

    async fn update_pipeline(
        &self,
        org: &str,
        pipeline_slug: &str,
        input: UpdatePipelineInput,
    ) -> Result<ApiResponse<Pipeline>>;
}

#[async_trait]
pub trait BuildProvider: Send + Sync {
    async fn list_builds(
        &self,
        org: &str,
        pipeline_slug: &str,
        opts: BuildListOptions,
    ) -> Result<ApiResponse<Vec<Build>>>;

    async fn get_build(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        opts: BuildGetOptions,
    ) -> Result<ApiResponse<Build>>;

    async fn create_build(
        &self,
        org: &str,
        pipeline_slug: &str,
        input: CreateBuildInput,
    ) -> Result<ApiResponse<Build>>;
}

#[async_trait]
pub trait JobProvider: Send + Sync {
    /// Fetch the raw log of a single job.
    async fn get_job_log(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        job_id: &str,
    ) -> Result<ApiResponse<JobLog>>;
}

#[async_trait]
pub trait ArtifactProvider: Send + Sync {
    async fn list_artifacts(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Artifact>>>;

    /// Download artifact content from its API URL.
    async fn download_artifact(&self, url: &str) -> Result<ApiResponse<Vec<u8>>>;
}

#[async_trait]
pub trait AnnotationProvider: Send + Sync {
    async fn list_annotations(
        &self,
        org: &str,
        pipeline_slug: &str,
        build_number: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Annotation>>>;
}

#[async_trait]
pub trait ClusterProvider: Send + Sync {
    async fn list_clusters(&self, org: &str, opts: ListOptions)
        -> Result<ApiResponse<Vec<Cluster>>>;

    async fn get_cluster(&self, org: &str, cluster_id: &str) -> Result<ApiResponse<Cluster>>;

    async fn list_cluster_queues(
        &self,
        org: &str,
        cluster_id: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<ClusterQueue>>>;

    async fn get_cluster_queue(
        &self,
        org: &str,
        cluster_id: &str,
        queue_id: &str,
    ) -> Result<ApiResponse<ClusterQueue>>;
}

#[async_trait]
pub trait TestEngineProvider: Send + Sync {
    async fn list_test_runs(
        &self,
        org: &str,
        test_suite_slug: &str,
        opts: ListOptions,
    ) -> Result<ApiResponse<Vec<TestRun>>>;

    async fn get_test_run(
        &self,
        org: &str,
        test_suite_slug: &str,
        run_id: &str,
    ) -> Result<ApiResponse<TestRun>>;

    async fn get_failed_executions(
        &self,
        org: &str,
        test_suite_slug: &str,
        run_id: &str,
        include_failure_expanded: bool,
    ) -> Result<ApiResponse<Vec<FailedExecution>>>;

    async fn get_test(
        &self,
        org: &str,
        test_suite_slug: &str,
        test_id: &str,
    ) -> Result<ApiResponse<Test>>;
}

#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn current_user(&self) -> Result<ApiResponse<User>>;

    async fn list_organizations(&self) -> Result<ApiResponse<Vec<Organization>>>;

    async fn access_token(&self) -> Result<ApiResponse<AccessToken>>;
}

/// Everything the MCP server needs from Buildkite.
pub trait BuildkiteProvider:
    PipelineProvider
    + BuildProvider
    + JobProvider
    + ArtifactProvider
    + AnnotationProvider
    + ClusterProvider
    + TestEngineProvider
    + AccountProvider
{
}

impl<T> BuildkiteProvider for T where
    T: PipelineProvider
        + BuildProvider
        + JobProvider
        + ArtifactProvider
        + AnnotationProvider
        + ClusterProvider
        + TestEngineProvider
        + AccountProvider
{
}
