//! External detection program execution.
//!
//! Spawning and waiting are split so the coordinator can spawn under its
//! status lock and hand the child to a background task.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::cube_state::RESULT_FILE_NAME;
use crate::error::CoreError;
use crate::status::JobOutcome;

/// How to invoke the detection program.
#[derive(Debug, Clone)]
pub struct DetectionJob {
    /// Executable name or path.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
    /// Working directory of the child; the result file is read from here.
    pub working_dir: PathBuf,
    /// Kill the child after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl DetectionJob {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the result document the program is expected to write.
    pub fn result_path(&self) -> PathBuf {
        self.working_dir.join(RESULT_FILE_NAME)
    }

    /// Start the program without waiting for it.
    ///
    /// The child is killed if its handle is dropped, so aborting the task
    /// that owns it also stops the process.
    pub fn spawn(&self) -> Result<Child, CoreError> {
        Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CoreError::Spawn {
                program: self.program.clone(),
                source,
            })
    }

    /// Wait for `child` to exit, enforcing the configured timeout.
    pub async fn wait(&self, mut child: Child) -> JobOutcome {
        let waited = match self.timeout {
            Some(limit) => {
                let wait_result = tokio::time::timeout(limit, child.wait()).await;
                match wait_result {
                    Ok(result) => result,
                    Err(_elapsed) => {
                        if let Err(e) = child.kill().await {
                            tracing::error!(error = %e, "Failed to kill timed out job");
                        }
                        return JobOutcome::TimedOut {
                            after_secs: limit.as_secs(),
                        };
                    }
                }
            }
            None => child.wait().await,
        };

        match waited {
            Ok(status) if status.success() => JobOutcome::Succeeded,
            Ok(status) => JobOutcome::Failed {
                exit_code: status.code(),
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to wait on job process");
                JobOutcome::Failed { exit_code: None }
            }
        }
    }
}
