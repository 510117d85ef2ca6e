//! Common test utilities.
//!
//! `FixtureProvider` answers provider calls from the JSON and log files in
//! `tests/fixtures/buildkite/`. Lookups of anything the fixtures don't cover
//! fail with a 404 carrying Buildkite's usual error body.

#![allow(dead_code)]

use std::path::PathBuf;

use async_trait::async_trait;
use buildkite_core::{
    AccessToken, AccountProvider, Annotation, AnnotationProvider, ApiResponse, Artifact,
    ArtifactProvider, Build, BuildGetOptions, BuildListOptions, BuildProvider, Cluster,
    ClusterProvider, ClusterQueue, CreateBuildInput, CreatePipelineInput, Error, FailedExecution,
    JobLog, JobProvider, ListOptions, Organization, Pipeline, PipelineProvider, Result, Test,
    TestEngineProvider, TestRun, UpdatePipelineInput, User,
};
use serde::de::DeserializeOwned;

const NOT_FOUND_BODY: &str = "{\"message\":\"Not Found\"}";

/// Path of a file under `tests/fixtures/buildkite/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("buildkite")
        .join(name)
}

/// Read a fixture file as text.
pub fn load_text(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", path.display(), e))
}

/// Read and decode a JSON fixture.
pub fn load_json<T: DeserializeOwned>(name: &str) -> T {
    serde_json::from_str(&load_text(name))
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", name, e))
}

fn not_found<T>() -> Result<ApiResponse<T>> {
    Err(Error::from_status(404, NOT_FOUND_BODY.to_string()))
}

/// Provider backed by on-disk fixtures.
pub struct FixtureProvider {
    pipelines: Vec<Pipeline>,
    build: Build,
    job_log: String,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self {
            pipelines: load_json("pipelines.json"),
            build: load_json("build.json"),
            job_log: load_text("job_log.raw"),
        }
    }

    fn is_fixture_build(&self, pipeline_slug: &str, build_number: &str) -> bool {
        pipeline_slug == "web" && build_number == self.build.number.to_string()
    }
}

#[async_trait]
impl PipelineProvider for FixtureProvider {
    async fn list_pipelines(
        &self,
        _org: &str,
        _opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Pipeline>>> {
        Ok(ApiResponse::ok(self.pipelines.clone()))
    }

    async fn get_pipeline(&self, _org: &str, pipeline_slug: &str) -> Result<ApiResponse<Pipeline>> {
        match self.pipelines.iter().find(|p| p.slug == pipeline_slug) {
            Some(pipeline) => Ok(ApiResponse::ok(pipeline.clone())),
            None => not_found(),
        }
    }

    async fn create_pipeline(
        &self,
        _org: &str,
        input: CreatePipelineInput,
    ) -> Result<ApiResponse<Pipeline>> {
        Ok(ApiResponse::ok(Pipeline {
            id: "pl-new".to_string(),
            slug: input.name.to_lowercase().replace(' ', "-"),
            name: input.name,
            repository: Some(input.repository),
            cluster_id: Some(input.cluster_id),
            configuration: Some(input.configuration),
            ..Default::default()
        }))
    }

    async fn update_pipeline(
        &self,
        _org: &str,
        pipeline_slug: &str,
        input: UpdatePipelineInput,
    ) -> Result<ApiResponse<Pipeline>> {
        let Some(mut pipeline) = self.pipelines.iter().find(|p| p.slug == pipeline_slug).cloned()
        else {
            return not_found();
        };
        if let Some(name) = input.name {
            pipeline.name = name;
        }
        if input.description.is_some() {
            pipeline.description = input.description;
        }
        Ok(ApiResponse::ok(pipeline))
    }
}

#[async_trait]
impl BuildProvider for FixtureProvider {
    async fn list_builds(
        &self,
        _org: &str,
        pipeline_slug: &str,
        opts: BuildListOptions,
    ) -> Result<ApiResponse<Vec<Build>>> {
        let builds = if pipeline_slug == "web" {
            vec![self.build.clone()]
        } else {
            Vec::new()
        };
        let builds = builds
            .into_iter()
            .filter(|b| opts.branch.is_none() || b.branch == opts.branch)
            .collect();
        Ok(ApiResponse::ok(builds))
    }

    async fn get_build(
        &self,
        _org: &str,
        pipeline_slug: &str,
        build_number: &str,
        _opts: BuildGetOptions,
    ) -> Result<ApiResponse<Build>> {
        if self.is_fixture_build(pipeline_slug, build_number) {
            Ok(ApiResponse::ok(self.build.clone()))
        } else {
            not_found()
        }
    }

    async fn create_build(
        &self,
        _org: &str,
        _pipeline_slug: &str,
        input: CreateBuildInput,
    ) -> Result<ApiResponse<Build>> {
        Ok(ApiResponse::ok(Build {
            id: "build-new".to_string(),
            number: self.build.number + 1,
            state: "scheduled".to_string(),
            commit: Some(input.commit),
            branch: Some(input.branch),
            message: Some(input.message),
            meta_data: input.meta_data,
            ..Default::default()
        }))
    }
}

#[async_trait]
impl JobProvider for FixtureProvider {
    async fn get_job_log(
        &self,
        _org: &str,
        pipeline_slug: &str,
        build_number: &str,
        job_id: &str,
    ) -> Result<ApiResponse<JobLog>> {
        if !self.is_fixture_build(pipeline_slug, build_number) || job_id != "job-rspec" {
            return not_found();
        }
        Ok(ApiResponse::ok(JobLog {
            url: "https://api.buildkite.com/v2/organizations/acme/pipelines/web/builds/42/jobs/job-rspec/log".to_string(),
            size: self.job_log.len() as i64,
            content: self.job_log.clone(),
            header_times: Vec::new(),
        }))
    }
}

#[async_trait]
impl ArtifactProvider for FixtureProvider {
    async fn list_artifacts(
        &self,
        _org: &str,
        _pipeline_slug: &str,
        _build_number: &str,
        _opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Artifact>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }

    async fn download_artifact(&self, _url: &str) -> Result<ApiResponse<Vec<u8>>> {
        not_found()
    }
}

#[async_trait]
impl AnnotationProvider for FixtureProvider {
    async fn list_annotations(
        &self,
        _org: &str,
        _pipeline_slug: &str,
        _build_number: &str,
        _opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Annotation>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }
}

#[async_trait]
impl ClusterProvider for FixtureProvider {
    async fn list_clusters(
        &self,
        _org: &str,
        _opts: ListOptions,
    ) -> Result<ApiResponse<Vec<Cluster>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }

    async fn get_cluster(&self, _org: &str, _cluster_id: &str) -> Result<ApiResponse<Cluster>> {
        not_found()
    }

    async fn list_cluster_queues(
        &self,
        _org: &str,
        _cluster_id: &str,
        _opts: ListOptions,
    ) -> Result<ApiResponse<Vec<ClusterQueue>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }

    async fn get_cluster_queue(
        &self,
        _org: &str,
        _cluster_id: &str,
        _queue_id: &str,
    ) -> Result<ApiResponse<ClusterQueue>> {
        not_found()
    }
}

#[async_trait]
impl TestEngineProvider for FixtureProvider {
    async fn list_test_runs(
        &self,
        _org: &str,
        _test_suite_slug: &str,
        _opts: ListOptions,
    ) -> Result<ApiResponse<Vec<TestRun>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }

    async fn get_test_run(
        &self,
        _org: &str,
        _test_suite_slug: &str,
        _run_id: &str,
    ) -> Result<ApiResponse<TestRun>> {
        not_found()
    }

    async fn get_failed_executions(
        &self,
        _org: &str,
        _test_suite_slug: &str,
        _run_id: &str,
        _include_failure_expanded: bool,
    ) -> Result<ApiResponse<Vec<FailedExecution>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }

    async fn get_test(
        &self,
        _org: &str,
        _test_suite_slug: &str,
        _test_id: &str,
    ) -> Result<ApiResponse<Test>> {
        not_found()
    }
}

#[async_trait]
impl AccountProvider for FixtureProvider {
    async fn current_user(&self) -> Result<ApiResponse<User>> {
        Ok(ApiResponse::ok(self.build.creator.clone().unwrap_or_default()))
    }

    async fn list_organizations(&self) -> Result<ApiResponse<Vec<Organization>>> {
        Ok(ApiResponse::ok(vec![Organization {
            id: "o-1".to_string(),
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            ..Default::default()
        }]))
    }

    async fn access_token(&self) -> Result<ApiResponse<AccessToken>> {
        Ok(ApiResponse::ok(AccessToken {
            uuid: "tok-1".to_string(),
            scopes: vec!["read_builds".to_string()],
            ..Default::default()
        }))
    }
}
