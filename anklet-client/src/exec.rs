//! Bounded execution of child processes
//!
//! Runs a command to completion on the calling thread, killing it when it
//! exceeds its time bound or when the owning session is closed.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// How often a running child is checked for exit
const POLL_STEP: Duration = Duration::from_millis(20);

/// Captured result of a finished command
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Fails with a backend error unless the command exited successfully
    pub fn into_success(self, command: &str) -> Result<String> {
        if self.status.success() {
            return Ok(self.stdout);
        }

        let stderr = self.stderr.trim();
        let detail = if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        };
        Err(ClientError::Backend(format!(
            "`{}` exited with {}: {}",
            command, self.status, detail
        )))
    }
}

/// Renders a command line for logs and error messages
pub fn describe(command: &Command) -> String {
    let mut line = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Runs `command` until it exits, `timeout` elapses or `closed` is set
pub fn run(mut command: Command, timeout: Duration, closed: &Arc<AtomicBool>) -> Result<CommandOutput> {
    let line = describe(&command);
    debug!("Running `{}`", line);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ClientError::Backend(format!("failed to spawn `{}`: {}", line, e)))?;

    // Drain both pipes concurrently so a chatty child never blocks on a full pipe
    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let deadline = Instant::now().checked_add(timeout);
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }

        if closed.load(Ordering::SeqCst) {
            kill(&mut child, &line);
            return Err(ClientError::SessionClosed);
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            kill(&mut child, &line);
            return Err(ClientError::CommandTimeout {
                command: line,
                timeout,
            });
        }

        thread::sleep(POLL_STEP);
    };

    Ok(CommandOutput {
        status,
        stdout: join_reader(stdout),
        stderr: join_reader(stderr),
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn kill(child: &mut std::process::Child, line: &str) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill `{}`: {}", line, e);
    }
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    fn open() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn test_captures_output() {
        let output = run(sh("echo hello; echo oops >&2"), Duration::from_secs(5), &open()).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "oops\n");
    }

    #[test]
    fn test_failure_becomes_backend_error() {
        let output = run(sh("echo denied >&2; exit 3"), Duration::from_secs(5), &open()).unwrap();
        let err = output.into_success("ank get state").unwrap_err();
        assert!(err.is_backend());
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_timeout_kills_child() {
        let started = Instant::now();
        let err = run(sh("sleep 5"), Duration::from_millis(100), &open()).unwrap_err();

        assert!(matches!(err, ClientError::CommandTimeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_unbounded_timeout_runs_to_completion() {
        let output = run(sh("echo done"), Duration::from_secs(u64::MAX), &open()).unwrap();
        assert_eq!(output.stdout, "done\n");
    }

    #[test]
    fn test_closed_session_interrupts_child() {
        let closed = Arc::new(AtomicBool::new(true));
        let err = run(sh("sleep 5"), Duration::from_secs(10), &closed).unwrap_err();
        assert!(matches!(err, ClientError::SessionClosed));
    }

    #[test]
    fn test_missing_binary() {
        let err = run(
            Command::new("/nonexistent/ank"),
            Duration::from_secs(1),
            &open(),
        )
        .unwrap_err();
        assert!(err.is_backend());
    }

    #[test]
    fn test_describe() {
        let mut command = Command::new("ank");
        command.args(["get", "state", "-o", "json"]);
        assert_eq!(describe(&command), "ank get state -o json");
    }
}
