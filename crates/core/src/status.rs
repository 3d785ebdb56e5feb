//! Job lifecycle status and outcome types.
//!
//! A coordinator cycles `Idle -> Running -> Done -> Idle`. The outcome of the
//! most recent job is tracked separately so a failed exit never changes what
//! a poll reports.

use std::fmt;

use serde::Serialize;

/// Lifecycle position of the single detection job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// No job has run, or the last result was consumed.
    Idle,
    /// The external program is running.
    Running,
    /// The program exited and its result has not been polled yet.
    Done,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the most recent external job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Exited with status 0.
    Succeeded,
    /// Exited non-zero. `exit_code` is `None` when killed by a signal.
    Failed { exit_code: Option<i32> },
    /// Killed after exceeding the configured timeout.
    TimedOut { after_secs: u64 },
}

/// Result of a trigger request that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new job was spawned.
    Started,
    /// A job is already in flight; nothing was spawned.
    AlreadyRunning,
}

/// Result of a poll request.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Nothing to report: no job ran or the result was already consumed.
    NotFound,
    /// The job is still running.
    InProgress,
    /// The job finished; carries the result document (or the error document).
    Ready(serde_json::Value),
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub last_outcome: Option<JobOutcome>,
    pub jobs_started: u64,
}
