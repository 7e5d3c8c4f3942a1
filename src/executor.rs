use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::config::RuntimeConfig;
use crate::job::Job;

/// How the command terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitInfo {
    /// Normal exit with this status code.
    Exited(i32),

    /// Terminated by a signal that was not ours.
    Signaled,

    /// Killed by the supervisor because the time bound was exceeded.
    TimedOut,
}

/// Raw outcome of running a command.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit: ExitInfo,
}

/// Capability to run an external command, time-bounded and killable.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `command`, killing it once `timeout` elapses.
    ///
    /// Whatever output was captured before an abnormal termination is
    /// still returned. An `Err` here means the command could not even be
    /// started.
    async fn run(&self, command: &str, timeout: Duration) -> std::io::Result<ExecOutcome>;
}

/// Runs commands through `sh -c` with piped, concurrently drained stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

#[async_trait]
impl Executor for ShellExecutor {
    async fn run(&self, command: &str, timeout: Duration) -> std::io::Result<ExecOutcome> {
        let mut child = Command::new("sh")
            .args(["-c", command])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Drain the pipes while waiting, so a chatty command cannot
        // deadlock on a full pipe buffer, and a killed one still yields
        // its partial output.
        let stdout_task = tokio::spawn(drain(child.stdout.take()));
        let stderr_task = tokio::spawn(drain(child.stderr.take()));

        let exit = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => match status?.code() {
                Some(code) => ExitInfo::Exited(code),
                None => ExitInfo::Signaled,
            },
            Err(_) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                ExitInfo::TimedOut
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        Ok(ExecOutcome {
            stdout,
            stderr,
            exit,
        })
    }
}

async fn drain<R>(pipe: Option<R>) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

/// Result of one supervised execution attempt, ready for the resolver.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Captured stdout, trimmed of surrounding whitespace.
    pub stdout: String,

    /// Captured stderr, trimmed of surrounding whitespace.
    ///
    /// Non-empty stderr alone is not a failure signal.
    pub stderr: String,

    /// Whether the supervisor's time-bound kill caused the termination.
    pub timed_out: bool,

    /// Human-readable failure reason; `None` means success.
    pub failure: Option<String>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Run a claimed job through the executor, bounded by the job's timeout
/// or the configured default.
///
/// Never errors: a command that cannot be spawned is a failed attempt
/// like any other and goes through the retry machinery.
pub(crate) async fn execute(
    executor: &dyn Executor,
    job: &Job,
    config: &RuntimeConfig,
) -> ExecutionResult {
    let bound = job.timeout.unwrap_or(config.job_timeout);
    match executor.run(&job.command, bound).await {
        Ok(outcome) => {
            let failure = match outcome.exit {
                ExitInfo::Exited(0) => None,
                ExitInfo::Exited(code) => Some(format!("command exited with status {}", code)),
                ExitInfo::Signaled => Some("command terminated by signal".to_string()),
                ExitInfo::TimedOut => {
                    Some(format!("command timed out after {}ms", bound.as_millis()))
                }
            };
            ExecutionResult {
                stdout: outcome.stdout.trim().to_string(),
                stderr: outcome.stderr.trim().to_string(),
                timed_out: outcome.exit == ExitInfo::TimedOut,
                failure,
            }
        }
        Err(e) => ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            failure: Some(format!("failed to run command: {}", e)),
        },
    }
}
