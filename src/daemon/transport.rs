//! Subprocess transport to the session daemon.
//!
//! Each request is one process invocation: the daemon executable is started
//! with the request's arguments, stdin closed, and everything it writes to
//! stdout is handed back untouched once it exits. There is no connection to
//! keep alive, so a crashed call never poisons the next one.

use std::io::{self, Read};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Default upper bound on a single daemon call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often a running child is polled while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Something that can run one daemon command and return its raw stdout.
pub trait Transport: Send + Sync {
    /// Run the daemon with `args` and return its stdout verbatim.
    fn invoke(&self, args: &[String]) -> Result<String>;
}

/// What to do when the daemon exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatusPolicy {
    /// Ignore the exit status and return whatever stdout was produced.
    #[default]
    Permissive,
    /// Treat a non-zero exit as an execution failure.
    Strict,
}

/// Transport that spawns the daemon executable once per request.
#[derive(Debug, Clone)]
pub struct ProcessTransport {
    program: String,
    timeout: Option<Duration>,
    exit_status: ExitStatusPolicy,
}

impl ProcessTransport {
    /// Create a transport for `program` with the default timeout and a
    /// permissive exit status policy.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            exit_status: ExitStatusPolicy::Permissive,
        }
    }

    /// Set the per-call timeout. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the exit status policy.
    pub fn with_exit_status(mut self, policy: ExitStatusPolicy) -> Self {
        self.exit_status = policy;
        self
    }

    /// The executable this transport runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn spawn(&self, args: &[String]) -> Result<Child> {
        // Own process group, so anything the daemon leaves holding our pipes
        // can be killed along with it.
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(|e| SessionError::execution(&self.program, e))
    }

    fn timed_out(&self, child: &Child) -> io::Error {
        kill_group(child);
        let millis = self.timeout.unwrap_or_default().as_millis();
        io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no response after {}ms", millis),
        )
    }

    fn wait(&self, child: &mut Child, deadline: Option<Instant>) -> io::Result<ExitStatus> {
        let Some(deadline) = deadline else {
            return child.wait();
        };

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let err = self.timed_out(child);
                let _ = child.kill();
                let _ = child.wait();
                return Err(err);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Wait for a pipe to reach EOF. The pipe can outlive the child when a
    /// background process inherited it, so the deadline applies here too.
    fn collect(&self, child: &Child, pipe: &Receiver<Vec<u8>>, deadline: Option<Instant>) -> io::Result<Vec<u8>> {
        let Some(deadline) = deadline else {
            return Ok(pipe.recv().unwrap_or_default());
        };

        match pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(bytes) => Ok(bytes),
            Err(RecvTimeoutError::Disconnected) => Ok(Vec::new()),
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out(child)),
        }
    }
}

impl Transport for ProcessTransport {
    fn invoke(&self, args: &[String]) -> Result<String> {
        tracing::debug!(program = %self.program, ?args, "invoking daemon");

        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let mut child = self.spawn(args)?;

        // Pipes are drained on their own threads so a chatty child can't fill
        // the pipe buffer and stall before exiting.
        let stdout = drain_in_background(child.stdout.take());
        let stderr = drain_in_background(child.stderr.take());

        let execution = |e: io::Error| SessionError::execution(&self.program, e);
        let status = self.wait(&mut child, deadline).map_err(execution)?;
        let stdout = self.collect(&child, &stdout, deadline).map_err(execution)?;
        let stderr = self.collect(&child, &stderr, deadline).map_err(execution)?;
        let stdout = String::from_utf8_lossy(&stdout).into_owned();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            tracing::debug!(program = %self.program, %status, stderr = %stderr.trim(), "daemon exited unsuccessfully");

            if self.exit_status == ExitStatusPolicy::Strict {
                return Err(SessionError::execution(
                    &self.program,
                    io::Error::other(format!("exited with {}: {}", status, stderr.trim())),
                ));
            }
        }

        Ok(stdout)
    }
}

fn kill_group(child: &Child) {
    if let Ok(pid) = i32::try_from(child.id()) {
        let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
    }
}

fn drain_in_background<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(drain(pipe));
    });
    rx
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn invoke_returns_stdout_without_trimming() {
        let transport = ProcessTransport::new("echo");
        let out = transport.invoke(&args(&["list"])).unwrap();
        assert_eq!(out, "list\n");
    }

    #[test]
    fn invoke_passes_arguments_in_order() {
        let transport = ProcessTransport::new("echo");
        let out = transport.invoke(&args(&["send", "--no-newline", "s1", "a b"])).unwrap();
        assert_eq!(out, "send --no-newline s1 a b\n");
    }

    #[test]
    fn missing_executable_is_an_execution_error() {
        let transport = ProcessTransport::new("/nonexistent/sessiond-binary");
        let err = transport.invoke(&args(&["list"])).unwrap_err();
        match err {
            SessionError::Execution { program, source } => {
                assert_eq!(program, "/nonexistent/sessiond-binary");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn hung_call_times_out_as_execution_error() {
        let transport =
            ProcessTransport::new("sleep").with_timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();
        let err = transport.invoke(&args(&["5"])).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        match err {
            SessionError::Execution { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::TimedOut);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn background_process_holding_pipes_does_not_outlive_timeout() {
        let transport =
            ProcessTransport::new("sh").with_timeout(Some(Duration::from_millis(500)));
        let started = Instant::now();
        let err = transport
            .invoke(&args(&["-c", "sleep 5 & echo id1"]))
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(3));
        match err {
            SessionError::Execution { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::TimedOut);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn permissive_policy_returns_partial_output_on_failure() {
        let transport = ProcessTransport::new("sh");
        let out = transport
            .invoke(&args(&["-c", "printf partial; exit 3"]))
            .unwrap();
        assert_eq!(out, "partial");
    }

    #[test]
    fn strict_policy_reports_nonzero_exit() {
        let transport = ProcessTransport::new("sh").with_exit_status(ExitStatusPolicy::Strict);
        let err = transport
            .invoke(&args(&["-c", "echo boom >&2; exit 3"]))
            .unwrap_err();
        assert!(matches!(err, SessionError::Execution { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn no_timeout_waits_for_exit() {
        let transport = ProcessTransport::new("sh").with_timeout(None);
        let out = transport.invoke(&args(&["-c", "sleep 0.1; echo done"])).unwrap();
        assert_eq!(out, "done\n");
    }
}
