use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::CatalogError;

/// One unit of build work.
///
/// `build` blocks until the work is done. On failure the returned string is
/// the complete diagnostic output of the attempt.
pub trait BuildUnit: Send + Sync {
    fn build(&self) -> Result<(), String>;
}

impl<F> BuildUnit for F
where
    F: Fn() -> Result<(), String> + Send + Sync,
{
    fn build(&self) -> Result<(), String> {
        self()
    }
}

/// A named build task. The name doubles as the line label in the progress
/// display and must be unique within a catalog.
#[derive(Clone)]
pub struct Job {
    pub name: String,
    pub unit: Arc<dyn BuildUnit>,
}

impl Job {
    pub fn new(name: impl Into<String>, unit: impl BuildUnit + 'static) -> Self {
        Self {
            name: name.into(),
            unit: Arc::new(unit),
        }
    }

    /// Builds a job from a closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        Self::new(name, f)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("name", &self.name).finish_non_exhaustive()
    }
}

/// The ordered, fixed set of jobs for one run.
///
/// Order is display order. Construction is the only place names are checked,
/// so a `JobCatalog` in hand always has unique, non-empty names.
#[derive(Debug, Clone, Default)]
pub struct JobCatalog {
    jobs: Vec<Job>,
}

impl JobCatalog {
    pub fn new(jobs: Vec<Job>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(jobs.len());
        for job in &jobs {
            if job.name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if !seen.insert(job.name.as_str()) {
                return Err(CatalogError::DuplicateName(job.name.clone()));
            }
        }
        Ok(Self { jobs })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.jobs.iter().map(|job| job.name.clone()).collect()
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }
}
