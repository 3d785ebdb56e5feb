//! Single-flight coordinator for the detection job.
//!
//! [`JobCoordinator`] owns the job status behind one mutex. `trigger` does
//! its check-and-set and spawn under that lock, so concurrent triggers start
//! at most one process. The watcher task reads the result document before
//! marking the job done, so `poll` hands out that cached document and never
//! touches the file or waits for a state change.
//!
//! ```text
//! Idle    --trigger--> Running --exit/timeout--> Done --poll--> Idle
//! Running --trigger--> Running (rejected)
//! Done    --trigger--> Running (unconsumed result discarded)
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::cube_state::{load_or_unavailable, unavailable_document};
use crate::error::CoreError;
use crate::job::DetectionJob;
use crate::status::{JobOutcome, JobSnapshot, JobStatus, PollOutcome, TriggerOutcome};

#[derive(Debug)]
struct CoordinatorState {
    status: JobStatus,
    last_outcome: Option<JobOutcome>,
    jobs_started: u64,
    /// Bumped on every start and on shutdown; a watcher only records its
    /// outcome if the generation it was started with is still current.
    generation: u64,
    /// Document read when the job finished; present only while `Done`.
    result: Option<Value>,
    task: Option<JoinHandle<()>>,
}

/// Runs at most one [`DetectionJob`] at a time and reports its status.
#[derive(Debug)]
pub struct JobCoordinator {
    job: DetectionJob,
    state: Arc<Mutex<CoordinatorState>>,
}

impl JobCoordinator {
    pub fn new(job: DetectionJob) -> Self {
        Self {
            job,
            state: Arc::new(Mutex::new(CoordinatorState {
                status: JobStatus::Idle,
                last_outcome: None,
                jobs_started: 0,
                generation: 0,
                result: None,
                task: None,
            })),
        }
    }

    /// Start the detection program unless one is already running.
    ///
    /// Returns as soon as the process is spawned. Must be called from within
    /// a tokio runtime. On a spawn failure the status is left untouched.
    pub fn trigger(&self) -> Result<TriggerOutcome, CoreError> {
        let mut state = lock_unpoisoned(&self.state);

        match state.status {
            JobStatus::Running => {
                tracing::debug!("Trigger rejected, job already running");
                return Ok(TriggerOutcome::AlreadyRunning);
            }
            JobStatus::Done => {
                tracing::info!("Starting new job, discarding unconsumed result");
                state.result = None;
            }
            JobStatus::Idle => {}
        }

        let child = self.job.spawn()?;
        let pid = child.id();

        state.generation += 1;
        state.jobs_started += 1;
        state.status = JobStatus::Running;

        let generation = state.generation;
        let job = self.job.clone();
        let shared = Arc::clone(&self.state);
        state.task = Some(tokio::spawn(async move {
            let outcome = job.wait(child).await;
            let result = load_or_unavailable(&job.result_path()).await;
            record_outcome(&shared, generation, outcome, result);
        }));

        tracing::info!(
            pid,
            program = %self.job.program,
            jobs_started = state.jobs_started,
            "Detection job started"
        );

        Ok(TriggerOutcome::Started)
    }

    /// Report the current status, consuming the result if the job is done.
    ///
    /// Taking the cached document and the `Done -> Idle` transition happen
    /// under one lock, so exactly one poll receives each result and a trigger
    /// racing it cannot replace the document being returned.
    pub fn poll(&self) -> PollOutcome {
        let mut state = lock_unpoisoned(&self.state);
        match state.status {
            JobStatus::Idle => PollOutcome::NotFound,
            JobStatus::Running => PollOutcome::InProgress,
            JobStatus::Done => {
                state.status = JobStatus::Idle;
                state.task = None;
                let document = state
                    .result
                    .take()
                    .unwrap_or_else(unavailable_document);
                tracing::debug!("Job result consumed");
                PollOutcome::Ready(document)
            }
        }
    }

    pub fn status(&self) -> JobSnapshot {
        let state = lock_unpoisoned(&self.state);
        JobSnapshot {
            status: state.status,
            last_outcome: state.last_outcome.clone(),
            jobs_started: state.jobs_started,
        }
    }

    /// Stop any running job and return to `Idle`.
    ///
    /// Aborting the watcher drops the child, which kills the process.
    pub async fn shutdown(&self) {
        let task = {
            let mut state = lock_unpoisoned(&self.state);
            state.generation += 1;
            state.status = JobStatus::Idle;
            state.result = None;
            state.task.take()
        };

        if let Some(task) = task {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!(error = %e, "Job watcher task failed");
                }
            }
            tracing::info!("Job watcher stopped");
        }
    }
}

fn record_outcome(
    shared: &Mutex<CoordinatorState>,
    generation: u64,
    outcome: JobOutcome,
    result: Value,
) {
    let mut state = lock_unpoisoned(shared);
    if state.generation != generation {
        tracing::debug!(generation, "Ignoring outcome of superseded job");
        return;
    }

    match &outcome {
        JobOutcome::Succeeded => tracing::info!("Detection job finished"),
        JobOutcome::Failed { exit_code } => {
            tracing::warn!(?exit_code, "Detection job exited unsuccessfully")
        }
        JobOutcome::TimedOut { after_secs } => {
            tracing::warn!(after_secs, "Detection job timed out and was killed")
        }
    }

    state.status = JobStatus::Done;
    state.last_outcome = Some(outcome);
    state.result = Some(result);
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
