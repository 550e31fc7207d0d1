//! Supervised execution of external tools.
//!
//! yt-dlp and ffmpeg run under the same rules: stdout lines are handed to a
//! callback as they arrive, stderr is collected for error messages, and the
//! child is killed as soon as the job's kill switch fires or the optional
//! deadline passes.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Maximum number of stderr bytes retained for error reporting.
const STDERR_LIMIT: usize = 16 * 1024;

/// How a supervised process ended.
#[derive(Debug)]
pub enum ProcessExit {
    /// The process exited on its own.
    Exited { status: ExitStatus, stderr: String },
    /// The kill switch fired and the process was terminated.
    Killed,
    /// The deadline passed and the process was terminated.
    TimedOut,
}

impl ProcessExit {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited { status, .. } if status.success())
    }
}

/// Runs `command` to completion under supervision.
///
/// `on_line` is called for every stdout line. Spawn errors are returned as-is
/// so callers can tell a missing binary apart from other I/O failures.
pub async fn run_supervised<F>(
    mut command: Command,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
    mut on_line: F,
) -> std::io::Result<ProcessExit>
where
    F: FnMut(&str) + Send,
{
    if cancel.is_cancelled() {
        return Ok(ProcessExit::Killed);
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;

    let stderr_task = tokio::spawn(collect_stderr(stderr));
    let mut lines = BufReader::new(stdout).lines();

    let deadline = async {
        match timeout {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut stdout_open = true;
    let status = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                terminate(&mut child).await;
                stderr_task.abort();
                return Ok(ProcessExit::Killed);
            }
            _ = &mut deadline => {
                terminate(&mut child).await;
                stderr_task.abort();
                return Ok(ProcessExit::TimedOut);
            }
            line = lines.next_line(), if stdout_open => match line {
                Ok(Some(line)) => on_line(&line),
                Ok(None) => stdout_open = false,
                Err(e) => {
                    debug!("Stopped reading stdout: {}", e);
                    stdout_open = false;
                }
            },
            status = child.wait(), if !stdout_open => break status?,
        }
    };

    let stderr = stderr_task.await.unwrap_or_default();
    Ok(ProcessExit::Exited { status, stderr })
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill child process: {}", e);
    }
}

/// Drains stderr to the end, keeping at most `STDERR_LIMIT` bytes.
async fn collect_stderr<R: AsyncRead + Unpin>(reader: R) -> String {
    let mut lines = BufReader::new(reader).lines();
    let mut output = String::new();

    while let Ok(Some(line)) = lines.next_line().await {
        if output.len() < STDERR_LIMIT {
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}
