use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use cubescan_core::error::CoreError;
use cubescan_core::job::DetectionJob;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for running next to the detection
/// script during local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for the running job to stop on shutdown (default: `10`).
    pub shutdown_timeout_secs: u64,
    /// Detection program to execute (default: `python3`).
    pub job_program: String,
    /// Fixed arguments completing the program's command line (default:
    /// `detect_cube.py`). Requests never add arguments of their own.
    pub job_args: Vec<String>,
    /// Working directory of the detection program; the result file is read
    /// from here (default: `.`).
    pub job_working_dir: PathBuf,
    /// Kill the detection program after this many seconds; `0` disables the
    /// limit (default: `0`).
    pub job_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `8000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `10`                    |
    /// | `JOB_PROGRAM`           | `python3`               |
    /// | `JOB_ARGS`              | `detect_cube.py`        |
    /// | `JOB_WORKING_DIR`       | `.`                     |
    /// | `JOB_TIMEOUT_SECS`      | `0`                     |
    ///
    /// `JOB_PROGRAM` and `JOB_ARGS` together name the detection program: the
    /// default command line `python3 detect_cube.py` is the whole program, and
    /// each trigger runs it exactly as configured with nothing appended.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");
        let port: u16 = parse_var("PORT", &var("PORT", "8000"))?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 =
            parse_var("REQUEST_TIMEOUT_SECS", &var("REQUEST_TIMEOUT_SECS", "30"))?;
        let shutdown_timeout_secs: u64 =
            parse_var("SHUTDOWN_TIMEOUT_SECS", &var("SHUTDOWN_TIMEOUT_SECS", "10"))?;

        let job_program = var("JOB_PROGRAM", "python3").trim().to_string();
        if job_program.is_empty() {
            return Err(CoreError::Validation(
                "JOB_PROGRAM must not be empty".to_string(),
            ));
        }

        let job_args: Vec<String> = var("JOB_ARGS", "detect_cube.py")
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let job_working_dir = PathBuf::from(var("JOB_WORKING_DIR", "."));
        let job_timeout_secs: u64 = parse_var("JOB_TIMEOUT_SECS", &var("JOB_TIMEOUT_SECS", "0"))?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            job_program,
            job_args,
            job_working_dir,
            job_timeout_secs,
        })
    }

    /// The detection job described by this configuration.
    pub fn detection_job(&self) -> DetectionJob {
        let timeout = (self.job_timeout_secs > 0).then(|| Duration::from_secs(self.job_timeout_secs));

        DetectionJob::new(self.job_program.clone(), self.job_working_dir.clone())
            .with_args(self.job_args.iter().cloned())
            .with_timeout(timeout)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| CoreError::Validation(format!("{key} must be a valid number: {e}")))
}
