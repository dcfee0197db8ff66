use std::{
    process::{ExitStatus, Stdio},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
    task::JoinHandle,
};
use tracing::debug;

use crate::error::AppError;

/// Bytes read so far from one output stream
type Captured = Arc<Mutex<Vec<u8>>>;

/// Captured result of an external process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    fn collect(status: Option<ExitStatus>, stdout: &Captured, stderr: &Captured) -> Self {
        Self {
            code: status.and_then(|status| status.code()),
            success: status.is_some_and(|status| status.success()),
            stdout: String::from_utf8_lossy(&stdout.lock()).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.lock()).into_owned(),
        }
    }

    /// Standard output followed by standard error
    pub fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }

    /// Best available failure description: stderr, then stdout, then the exit code
    pub fn failure_message(&self) -> String {
        let combined = self.combined();
        if !combined.is_empty() {
            return combined;
        }
        match self.code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Reads `reader` to the end in the background, keeping what arrives
fn capture<R>(reader: Option<R>) -> (Captured, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buffer = Captured::default();
    let sink = Arc::clone(&buffer);
    let task = tokio::spawn(async move {
        let Some(mut reader) = reader else {
            return;
        };
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(read) => {
                    sink.lock().extend_from_slice(&chunk[..read]);
                }
            }
        }
    });
    (buffer, task)
}

/// Runs `command` to completion, capturing its output
///
/// # Arguments
/// * `command` - Fully configured command
/// * `limit` - Optional upper bound on the run time; the child is killed when it
///   elapses and the output captured so far is returned in the error
pub async fn run(mut command: Command, limit: Option<Duration>) -> Result<ProcessOutput, AppError> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(%program, "spawning process");
    let mut child = command.spawn()?;
    let (stdout, stdout_task) = capture(child.stdout.take());
    let (stderr, stderr_task) = capture(child.stderr.take());

    let waited = match limit {
        Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
        None => Some(child.wait().await),
    };

    let Some(status) = waited else {
        if let Err(err) = child.kill().await {
            debug!(%program, error = %err, "could not kill timed out process");
        }
        stdout_task.abort();
        stderr_task.abort();
        let partial = ProcessOutput::collect(None, &stdout, &stderr);
        return Err(AppError::ProcessTimeout {
            program,
            seconds: limit.map_or(0, |limit| limit.as_secs()),
            output: partial.combined(),
        });
    };
    let status = status?;

    // pipes close once the child is gone
    for task in [stdout_task, stderr_task] {
        if let Err(err) = task.await {
            debug!(%program, error = %err, "output reader stopped early");
        }
    }

    let output = ProcessOutput::collect(Some(status), &stdout, &stderr);
    debug!(%program, code = ?output.code, "process exited");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_output_joins_both_streams() {
        let output = ProcessOutput {
            code: Some(1),
            success: false,
            stdout: "out\n".to_string(),
            stderr: "err\n".to_string(),
        };
        assert_eq!(output.combined(), "out\nerr");
    }

    #[test]
    fn failure_message_falls_back_to_exit_code() {
        let output = ProcessOutput {
            code: Some(3),
            success: false,
            stdout: String::new(),
            stderr: "  ".to_string(),
        };
        assert_eq!(output.failure_message(), "exited with status 3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let mut command = Command::new("sleep");
        command.arg("5");

        let result = run(command, Some(Duration::from_millis(100))).await;
        assert!(matches!(result, Err(AppError::ProcessTimeout { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_keeps_output_written_before_the_deadline() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo started; echo warming up >&2; sleep 5"]);

        match run(command, Some(Duration::from_millis(500))).await {
            Err(AppError::ProcessTimeout { program, output, .. }) => {
                assert_eq!(program, "sh");
                assert_eq!(output, "started\nwarming up");
            }
            other => panic!("expected a timeout, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn finished_process_output_is_captured() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = run(command, None).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert!(!output.success);
        assert_eq!(output.combined(), "out\nerr");
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let command = Command::new("gitid-definitely-missing-program");
        assert!(matches!(run(command, None).await, Err(AppError::Io(_))));
    }
}
