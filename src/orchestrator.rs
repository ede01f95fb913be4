use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, OrchestrationError};
use crate::job::{Job, JobCatalog, JobFailure, JobOutcome, OrchestrationResult};
use crate::progress::{ProgressRenderer, ProgressSink};
use crate::runner;

/// Default number of builds allowed to run at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Runs a catalog of independent builds under a concurrency cap and stops
/// admitting new builds once one has failed.
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator {
    budget: usize,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self {
            budget: DEFAULT_CONCURRENCY,
        }
    }
}

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub result: OrchestrationResult,
    /// Final outcome of every job, in catalog order. Jobs skipped after a
    /// failure stay `Pending`.
    pub outcomes: Vec<(String, JobOutcome)>,
}

impl RunReport {
    /// Jobs that never started because the run was cancelled first.
    pub fn not_run(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == JobOutcome::Pending)
            .map(|(name, _)| name.as_str())
    }
}

/// State shared by every worker task, guarded by one lock.
struct Shared<S> {
    names: Vec<String>,
    outcomes: Vec<JobOutcome>,
    cancelled: bool,
    first_failure: Option<JobFailure>,
    renderer: ProgressRenderer<S>,
}

impl<S: ProgressSink> Shared<S> {
    /// Moves job `index` to `next` and redraws its line.
    fn record(&mut self, index: usize, next: JobOutcome) -> Result<(), OrchestrationError> {
        let current = &mut self.outcomes[index];
        let from = current.to_string();
        if let Err(rejected) = current.advance(next) {
            return Err(OrchestrationError::InvalidTransition {
                job: self.names[index].clone(),
                from,
                to: rejected.to_string(),
            });
        }
        self.renderer.update(index, &self.outcomes[index])?;
        Ok(())
    }

    /// First caller wins; later failures are left in the outcome table only.
    fn claim_failure(&mut self, index: usize, detail: &str) -> bool {
        if self.first_failure.is_some() {
            return false;
        }
        self.first_failure = Some(JobFailure {
            job: self.names[index].clone(),
            detail: detail.to_string(),
        });
        self.cancelled = true;
        true
    }
}

fn lock<S>(shared: &Mutex<Shared<S>>) -> MutexGuard<'_, Shared<S>> {
    // Nothing panics while holding the lock; a poisoned guard still holds
    // consistent bookkeeping.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Orchestrator {
    pub fn new(budget: usize) -> Result<Self, CatalogError> {
        if budget == 0 {
            return Err(CatalogError::ZeroBudget);
        }
        Ok(Self { budget })
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Runs every job in `catalog`, drawing progress on `sink`.
    ///
    /// Job failures never produce `Err`: the first one to be recorded becomes
    /// the report's result. Which failure is "first" follows the order in
    /// which failing jobs take the shared lock, not catalog order. `Err` is
    /// reserved for a broken display or runtime, in which case the run is
    /// abandoned without waiting for builds already in flight.
    pub async fn run_all<S>(
        &self,
        catalog: JobCatalog,
        sink: S,
    ) -> Result<RunReport, OrchestrationError>
    where
        S: ProgressSink + Send + 'static,
    {
        if catalog.is_empty() {
            return Ok(RunReport {
                result: OrchestrationResult::Success,
                outcomes: Vec::new(),
            });
        }

        let names = catalog.names();
        let mut renderer = ProgressRenderer::new(&names, sink);
        renderer.render_pending()?;

        info!(jobs = names.len(), budget = self.budget, "starting builds");

        let shared = Arc::new(Mutex::new(Shared {
            outcomes: vec![JobOutcome::Pending; names.len()],
            names,
            cancelled: false,
            first_failure: None,
            renderer,
        }));
        let admission = Arc::new(Semaphore::new(self.budget));

        let mut tasks = JoinSet::new();
        for (index, job) in catalog.into_jobs().into_iter().enumerate() {
            tasks.spawn(run_slot(
                index,
                job,
                Arc::clone(&shared),
                Arc::clone(&admission),
            ));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined.map_err(OrchestrationError::from).and_then(|res| res) {
                warn!(error = %err, "abandoning run");
                tasks.abort_all();
                return Err(err);
            }
        }

        let mut state = lock(&shared);
        let result = match state.first_failure.take() {
            Some(failure) => OrchestrationResult::Failure(failure),
            None => OrchestrationResult::Success,
        };
        let outcomes = state
            .names
            .iter()
            .cloned()
            .zip(state.outcomes.iter().cloned())
            .collect();

        info!(success = result.is_success(), "builds finished");
        Ok(RunReport { result, outcomes })
    }
}

/// One worker: wait for a slot, build, report. Returns early without a
/// trace on the display if the run was cancelled before admission.
async fn run_slot<S>(
    index: usize,
    job: Job,
    shared: Arc<Mutex<Shared<S>>>,
    admission: Arc<Semaphore>,
) -> Result<(), OrchestrationError>
where
    S: ProgressSink + Send + 'static,
{
    if lock(&shared).cancelled {
        debug!(job = %job.name, "skipped before admission");
        return Ok(());
    }

    // Released on every exit path when the permit drops.
    let _permit = admission
        .acquire_owned()
        .await
        .map_err(|_| OrchestrationError::AdmissionClosed)?;

    {
        let mut state = lock(&shared);
        // Queueing may have taken a while.
        if state.cancelled {
            debug!(job = %job.name, "skipped after admission");
            return Ok(());
        }
        state.record(index, JobOutcome::Running)?;
    }

    debug!(job = %job.name, "admitted");
    let name = job.name.clone();
    let outcome = tokio::task::spawn_blocking(move || runner::run(&job)).await?;

    let mut state = lock(&shared);
    if let JobOutcome::Failed(detail) = &outcome {
        if state.claim_failure(index, detail) {
            debug!(job = %name, "first failure, cancelling queued builds");
        } else {
            debug!(job = %name, "failed after cancellation");
        }
    } else {
        debug!(job = %name, "succeeded");
    }
    state.record(index, outcome)
}
