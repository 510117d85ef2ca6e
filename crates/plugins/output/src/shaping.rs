//! Job list shaping: state filtering, agent redaction and summaries.
//!
//! All functions take borrowed input and return new values; the caller's
//! collection is never modified.

use std::collections::BTreeMap;

use buildkite_core::{Agent, Job};
use serde::{Deserialize, Serialize};

/// Counts of a build's jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Every job, including those without a state
    pub total: usize,
    /// Jobs grouped by non-empty state
    pub by_state: BTreeMap<String, usize>,
}

impl JobSummary {
    pub fn from_jobs(jobs: &[Job]) -> Self {
        let mut by_state = BTreeMap::new();
        for job in jobs.iter().filter(|j| !j.state.is_empty()) {
            *by_state.entry(job.state.clone()).or_insert(0) += 1;
        }

        Self {
            total: jobs.len(),
            by_state,
        }
    }
}

/// Keep only jobs whose state equals `state` exactly.
///
/// `None` or an empty filter keeps every job.
pub fn filter_jobs_by_state(jobs: &[Job], state: Option<&str>) -> Vec<Job> {
    match state {
        Some(state) if !state.is_empty() => {
            jobs.iter().filter(|j| j.state == state).cloned().collect()
        }
        _ => jobs.to_vec(),
    }
}

/// Copy `jobs`, reducing each agent to its id unless `include_agent` is set.
pub fn redact_agents(jobs: &[Job], include_agent: bool) -> Vec<Job> {
    if include_agent {
        return jobs.to_vec();
    }

    jobs.iter()
        .map(|job| Job {
            agent: job.agent.as_ref().map(|agent| Agent {
                id: agent.id.clone(),
                ..Agent::default()
            }),
            ..job.clone()
        })
        .collect()
}
