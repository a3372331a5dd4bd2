//! Tool invocation boundary
//!
//! The harness reaches the external provisioning tool only through the
//! [`ToolRunner`] trait. The default [`CommandRunner`] shells out to the
//! configured executable; tests substitute scripted runners to exercise the
//! lifecycle without spawning processes.
//!
//! All invocations are blocking: the calling scenario suspends until the
//! process exits or the configured deadline passes.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::HarnessError;

/// How often the deadline loop polls a running child process.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of one external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit code, if the process ran to completion
    pub status: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the invocation succeeded (exit code zero).
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Combined stdout and stderr, used for marker checks and retry
    /// classification.
    pub fn diagnostic(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// Boundary over the external process.
///
/// Implementations must be synchronous and hold no state shared across
/// scenarios. Concurrent use against the *same* working directory is
/// undefined behavior delegated to the tool's own locking.
pub trait ToolRunner {
    /// Run the tool with `args` inside `working_dir`, capturing output.
    ///
    /// Returns `Err` only when the process could not be run at all (spawn
    /// failure, timeout); a non-zero exit is an `Ok` with a non-success
    /// status, so callers can classify the diagnostic text.
    fn run(&self, working_dir: &Path, args: &[&str]) -> Result<ToolOutput, HarnessError>;
}

/// Resolve the tool executable: the `GROUNDWORK_TOOL` environment variable
/// when set, `terraform` otherwise.
pub fn resolve_tool() -> PathBuf {
    std::env::var_os("GROUNDWORK_TOOL")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("terraform"))
}

/// Whether the configured tool can be invoked at all.
///
/// Used by scenario gating: validation scenarios skip with a notice when the
/// tool is absent instead of failing the suite.
pub fn tool_available() -> bool {
    Command::new(resolve_tool())
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Default runner: spawns the configured executable as a child process.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Runner for the tool resolved from the environment, with no timeout.
    pub fn new() -> Self {
        Self {
            program: resolve_tool(),
            timeout: None,
        }
    }

    /// Use a specific executable instead of the resolved default.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Bound each invocation by a wall-clock deadline. On expiry the child
    /// is killed and the invocation fails with a timeout diagnostic.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The executable this runner spawns.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn_error(&self, args: &[&str], err: &std::io::Error) -> HarnessError {
        HarnessError::ToolInvocation {
            command: args.join(" "),
            status: None,
            diagnostic: format!("failed to spawn `{}`: {err}", self.program.display()),
        }
    }

    fn run_with_deadline(
        &self,
        working_dir: &Path,
        args: &[&str],
        limit: Duration,
    ) -> Result<ToolOutput, HarnessError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(args, &e))?;

        // Drain both pipes on threads so a chatty child cannot deadlock the
        // deadline loop on a full pipe buffer.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let deadline = Instant::now() + limit;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    kill_child(&mut child);
                    return Err(HarnessError::ToolInvocation {
                        command: args.join(" "),
                        status: None,
                        diagnostic: format!("timed out after {limit:?}"),
                    });
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        Ok(ToolOutput {
            status: status.code(),
            stdout: stdout_reader.map(join_reader).unwrap_or_default(),
            stderr: stderr_reader.map(join_reader).unwrap_or_default(),
        })
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRunner for CommandRunner {
    fn run(&self, working_dir: &Path, args: &[&str]) -> Result<ToolOutput, HarnessError> {
        debug!(
            tool = %self.program.display(),
            dir = %working_dir.display(),
            args = ?args,
            "invoking tool"
        );
        if let Some(limit) = self.timeout {
            return self.run_with_deadline(working_dir, args, limit);
        }
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(args, &e))?;
        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn spawn_pipe_reader<P: Read + Send + 'static>(
    pipe: Option<P>,
) -> Option<std::thread::JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: std::thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

fn kill_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
