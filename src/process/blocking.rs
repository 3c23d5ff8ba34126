//! Blocking "run to completion" primitive.

use std::io::{ErrorKind, Read};
use std::process::Child;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::request::ProcessRequest;

/// Poll interval while waiting for the child to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read buffer size for child pipes.
const READ_BUFFER_SIZE: usize = 4096;

/// Outcome of a blocking run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Captured stdout (empty unless stdout was piped).
    pub stdout: Vec<u8>,
    /// Captured stderr (empty unless stderr was piped).
    pub stderr: Vec<u8>,
    /// Exit code, `None` if killed by a signal or timed out.
    pub exit_code: Option<i32>,
    /// Execution duration.
    pub duration: Duration,
    /// Whether the run was cut short by its timeout.
    pub timed_out: bool,
}

impl RunOutput {
    /// Create a result for a process that exited with `code`.
    pub fn exited(code: i32, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            stdout,
            stderr,
            exit_code: Some(code),
            ..Default::default()
        }
    }

    /// Create a result indicating timeout.
    pub fn timeout(duration: Duration) -> Self {
        Self {
            duration,
            timed_out: true,
            ..Default::default()
        }
    }

    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Stdout decoded lossily.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs a command to completion, blocking the caller.
pub trait BlockingRunner: Send + Sync {
    /// Run `request` and return its captured output.
    ///
    /// Errors are reserved for failures to start or wait on the process;
    /// non-zero exits and timeouts are reported through [`RunOutput`].
    fn run(&self, request: &ProcessRequest) -> std::io::Result<RunOutput>;
}

/// [`BlockingRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl BlockingRunner for SystemRunner {
    fn run(&self, request: &ProcessRequest) -> std::io::Result<RunOutput> {
        let start = Instant::now();
        let deadline = request.timeout.map(|limit| start + limit);
        let mut child = request.to_std_command().spawn()?;
        debug!(command = %request.command, pid = child.id(), "spawned blocking child");

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            drain(stdout, Pipe::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            drain(stderr, Pipe::Stderr, tx.clone());
        }
        drop(tx);

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if deadline.is_some_and(|at| Instant::now() >= at) {
                kill(&mut child, &request.command);
                return Ok(RunOutput::timeout(start.elapsed()));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let mut output = RunOutput {
            exit_code: status.code(),
            ..Default::default()
        };
        collect(&rx, deadline, &mut output, &request.command);
        output.duration = start.elapsed();
        Ok(output)
    }
}

/// Which child pipe a chunk came from.
#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

fn drain(mut pipe: impl Read + Send + 'static, which: Pipe, tx: mpsc::Sender<(Pipe, Vec<u8>)>) {
    std::thread::spawn(move || {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            let n = match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            };
            if tx.send((which, buf[..n].to_vec())).is_err() {
                break;
            }
        }
    });
}

/// Gather reader output after the child exited.
///
/// Stops at end of both pipes, or at `deadline`: a background grandchild
/// may keep a pipe open long after the child is gone. Its readers are then
/// detached and whatever arrived so far is kept.
fn collect(
    rx: &mpsc::Receiver<(Pipe, Vec<u8>)>,
    deadline: Option<Instant>,
    output: &mut RunOutput,
    command: &str,
) {
    loop {
        let received = match deadline {
            Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok((Pipe::Stdout, chunk)) => output.stdout.extend_from_slice(&chunk),
            Ok((Pipe::Stderr, chunk)) => output.stderr.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                debug!(command = %command, "pipes still open after exit, detaching readers");
                break;
            }
        }
    }
}

fn kill(child: &mut Child, command: &str) {
    if let Err(e) = child.kill() {
        warn!(command = %command, error = %e, "failed to kill timed out child");
    }
    let _ = child.wait();
}
