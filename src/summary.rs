//! Machine-readable record of a finished run.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{JobOutcome, OrchestrationResult};
use crate::orchestrator::RunReport;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub name: String,
    pub outcome: JobOutcome,
}

/// Everything a run did, including the detail of every failed job, not only
/// the one surfaced as the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub concurrency: usize,
    pub result: OrchestrationResult,
    pub jobs: Vec<JobRecord>,
}

impl RunSummary {
    pub fn from_report(report: &RunReport, concurrency: usize, started_at: DateTime<Utc>) -> Self {
        let completed_at = Utc::now();
        Self {
            started_at,
            completed_at,
            duration_ms: (completed_at - started_at).num_milliseconds(),
            concurrency,
            result: report.result.clone(),
            jobs: report
                .outcomes
                .iter()
                .map(|(name, outcome)| JobRecord {
                    name: name.clone(),
                    outcome: outcome.clone(),
                })
                .collect(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write run summary to {}", path.display()))
    }
}
