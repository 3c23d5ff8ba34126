//! Asynchronous executor.

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::deferred::Deferred;
use super::state::{ExecutionState, Settler};
use super::{failure, forward};
use crate::error::{ShellError, ShellErrorKind};
use crate::options::{NormalizedOptions, OutputSink};
use crate::process::ChildStream;
use crate::transform::{LineTransformer, Transform};

/// Default buffer size for reading child output.
const READ_BUFFER_SIZE: usize = 4096;

/// Start `command` without blocking and return its deferred result.
///
/// The command runs on the current Tokio runtime. Output is forwarded to
/// the parent's channels line by line as it arrives (unless `silent`)
/// while stdout is accumulated for the result. A partial line is held
/// until its newline or the end of the stream, so an interactive prompt
/// without a trailing newline is not shown until its line completes.
///
/// The timeout covers the child only. After the child exits, its exit
/// status decides the outcome; pipes still held open by a background job
/// are drained until the timeout would have fired, then detached.
///
/// When called outside a runtime the deferred is already rejected with a
/// spawn failure.
pub fn run_async(command: &str, options: NormalizedOptions) -> Deferred {
    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(e) => {
            warn!(command = %command, "no async runtime available");
            let err = failure(
                &options,
                ShellErrorKind::Spawn,
                command,
                &ShellError::spawn_message(command, &e),
            );
            return Deferred::settled(command, Err(err));
        }
    };

    let (tx, rx) = oneshot::channel();
    handle.spawn(drive(command.to_string(), options, Settler::new(tx)));
    Deferred::waiting(command, rx)
}

async fn drive(command: String, options: NormalizedOptions, mut settler: Settler) {
    let request = options.request(&command);

    let mut child = match options.spawner().spawn(&request) {
        Ok(child) => child,
        Err(e) => {
            warn!(command = %command, error = %e, "failed to start command");
            let err = failure(
                &options,
                ShellErrorKind::Spawn,
                &command,
                &ShellError::spawn_message(&command, &e),
            );
            settler.settle(ExecutionState::Failed, Err(err));
            return;
        }
    };
    settler.start();
    debug!(command = %command, pid = ?child.id(), stdio = ?options.stdio().as_array(), "command started");

    let forwards = options.forwards();
    let mut stdout_route = Route::new(
        options.transform().clone(),
        forwards.then(|| options.parent().stdout().clone()),
        true,
    );
    let mut stderr_route = Route::new(
        options.transform().clone(),
        forwards.then(|| options.parent().stderr().clone()),
        false,
    );
    let stdout = child.take_stdout();
    let stderr = child.take_stderr();
    let mut pumps = Box::pin(async {
        tokio::join!(pump(stdout, &mut stdout_route), pump(stderr, &mut stderr_route));
    });
    let timer = deadline(options.timeout());
    tokio::pin!(timer);

    // The timer only races the child itself; once it has exited, the
    // remaining time bounds how long open pipes are drained.
    let mut drained = false;
    let status = loop {
        tokio::select! {
            status = child.wait() => break Some(status),
            _ = &mut pumps, if !drained => drained = true,
            _ = &mut timer => break None,
        }
    };

    let Some(status) = status else {
        drop(pumps);
        warn!(command = %command, timeout = ?options.timeout(), "command timed out, killing");
        if let Err(e) = child.kill() {
            warn!(command = %command, error = %e, "failed to kill timed out command");
        }
        let err = failure(
            &options,
            ShellErrorKind::Timeout,
            &command,
            &ShellError::timeout_message(&command),
        );
        settler.settle(ExecutionState::TimedOut, Err(err));
        trace!(command = %command, state = ?settler.state(), "execution settled");
        return;
    };

    if !drained {
        tokio::select! {
            _ = &mut pumps => {}
            _ = &mut timer => {
                debug!(command = %command, "streams still open after exit, detaching");
            }
        }
    }
    drop(pumps);
    let captured = stdout_route.finish();
    stderr_route.finish();

    match status {
        Ok(Some(0)) => {
            debug!(command = %command, captured_bytes = captured.len(), "command succeeded");
            let output = (!captured.is_empty()).then_some(captured);
            settler.settle(ExecutionState::Succeeded, Ok(output));
        }
        Ok(code) => {
            debug!(command = %command, exit_code = ?code, "command failed");
            let message = match code {
                Some(code) => format!("Command failed: {} with exit code {}", command, code),
                None => format!("Command failed: {} terminated by signal", command),
            };
            let err = failure(&options, ShellErrorKind::Exit, &command, &message).with_exit_code(code);
            settler.settle(ExecutionState::Failed, Err(err));
        }
        Err(e) => {
            warn!(command = %command, error = %e, "failed to wait for command");
            let message = format!("Command failed: {}; {}", command, e);
            let err = failure(&options, ShellErrorKind::Exit, &command, &message);
            settler.settle(ExecutionState::Failed, Err(err));
        }
    }
    trace!(command = %command, state = ?settler.state(), "execution settled");
}

/// Resolves when `timeout` elapses, or never if there is none.
async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending().await,
    }
}

/// Where one child stream goes after the line transform.
struct Route {
    stage: LineTransformer,
    sink: Option<OutputSink>,
    captured: Option<String>,
}

impl Route {
    fn new(transform: Transform, sink: Option<OutputSink>, capture: bool) -> Self {
        Self {
            stage: LineTransformer::new(transform),
            sink,
            captured: capture.then(String::new),
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        if let Some(text) = self.stage.push(chunk) {
            self.emit(&text);
        }
    }

    /// Flush the trailing partial line and hand back the captured text.
    fn finish(&mut self) -> String {
        if let Some(text) = self.stage.finish() {
            self.emit(&text);
        }
        self.captured.take().unwrap_or_default()
    }

    fn emit(&mut self, text: &str) {
        if let Some(sink) = &self.sink {
            forward(sink, text);
        }
        if let Some(captured) = self.captured.as_mut() {
            captured.push_str(text);
        }
    }
}

/// Copy one child stream through its route until end of stream.
async fn pump(stream: Option<ChildStream>, route: &mut Route) {
    let Some(mut stream) = stream else {
        return;
    };
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "child stream read failed");
                break;
            }
        };
        trace!("child stream: read {} bytes", n);
        route.push(&buf[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{OutputRecorder, ParentProcess, ShellOptions, StdioConfig};
    use crate::process::{ChildProcess, ExitFuture, ProcessRequest, ProcessSpawner};
    use crate::transform::prefix;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tokio_test::{assert_err, assert_ok};

    /// Child whose streams replay fixed chunks.
    struct FakeChild {
        stdout: Option<ChildStream>,
        stderr: Option<ChildStream>,
        exit: Option<i32>,
        hang: bool,
        killed: Arc<Mutex<bool>>,
    }

    impl ChildProcess for FakeChild {
        fn take_stdout(&mut self) -> Option<ChildStream> {
            self.stdout.take()
        }

        fn take_stderr(&mut self) -> Option<ChildStream> {
            self.stderr.take()
        }

        fn wait(&mut self) -> ExitFuture<'_> {
            let hang = self.hang;
            let exit = self.exit;
            Box::pin(async move {
                if hang {
                    std::future::pending::<()>().await;
                }
                Ok(exit)
            })
        }

        fn kill(&mut self) -> io::Result<()> {
            *self.killed.lock().unwrap() = true;
            Ok(())
        }

        fn id(&self) -> Option<u32> {
            Some(4242)
        }
    }

    fn stream(chunks: &[&str], stall: Option<Duration>) -> ChildStream {
        let mut builder = tokio_test::io::Builder::new();
        for chunk in chunks {
            builder.read(chunk.as_bytes());
        }
        if let Some(stall) = stall {
            builder.wait(stall);
        }
        Box::new(builder.build())
    }

    #[derive(Default)]
    struct FakeSpawner {
        stdout: Vec<&'static str>,
        stderr: Vec<&'static str>,
        exit: Option<i32>,
        hang: bool,
        /// Keep stdout open this long after its chunks, like a background job.
        stall: Option<Duration>,
        fail: bool,
        killed: Arc<Mutex<bool>>,
        requests: Mutex<Vec<ProcessRequest>>,
    }

    impl ProcessSpawner for FakeSpawner {
        fn spawn(&self, request: &ProcessRequest) -> io::Result<Box<dyn ChildProcess>> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::NotFound, "not found"));
            }
            let piped = request.stdio.captures();
            Ok(Box::new(FakeChild {
                stdout: piped.then(|| stream(&self.stdout, self.stall)),
                stderr: piped.then(|| stream(&self.stderr, None)),
                exit: self.exit,
                hang: self.hang,
                killed: self.killed.clone(),
            }))
        }
    }

    struct Harness {
        stdout: OutputRecorder,
        stderr: OutputRecorder,
        spawner: Arc<FakeSpawner>,
    }

    impl Harness {
        fn new(spawner: FakeSpawner) -> Self {
            Self {
                stdout: OutputRecorder::new(),
                stderr: OutputRecorder::new(),
                spawner: Arc::new(spawner),
            }
        }

        fn options(&self) -> ShellOptions {
            ShellOptions::new()
                .async_mode(true)
                .parent_process(ParentProcess::with_writers(
                    self.stdout.clone(),
                    self.stderr.clone(),
                ))
                .spawner(self.spawner.clone())
        }

        fn run(&self, command: &str, options: ShellOptions) -> Deferred {
            run_async(command, NormalizedOptions::new(options))
        }
    }

    fn exiting(code: i32, stdout: Vec<&'static str>) -> FakeSpawner {
        FakeSpawner {
            stdout,
            exit: Some(code),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_resolves_with_output() {
        let h = Harness::new(exiting(0, vec!["command output\n"]));
        let output = assert_ok!(h.run("echo 'command output'", h.options()).await);

        assert_eq!(output.as_deref(), Some("command output\n"));
        assert_eq!(h.stdout.writes(), vec!["command output\n".to_string()]);
    }

    #[tokio::test]
    async fn test_spawner_receives_request() {
        let h = Harness::new(exiting(0, vec![]));
        let opts = h.options().cwd("./sandbox").env("CUSTOM_ENV", "test");
        assert_ok!(h.run("echo 'command output'", opts).await);

        let req = h.spawner.requests.lock().unwrap()[0].clone();
        assert_eq!(req.command, "echo 'command output'");
        assert_eq!(req.cwd, Some("./sandbox".into()));
        assert_eq!(req.env.len(), 2);
        assert_eq!(req.env.get("FORCE_COLOR"), Some(&"1".to_string()));
        assert_eq!(req.stdio, StdioConfig::resolve(false, false));
    }

    #[tokio::test]
    async fn test_accumulates_chunks_across_line_boundaries() {
        let h = Harness::new(exiting(0, vec!["command out", "put 1\ncommand ", "output 2\n"]));
        let output = assert_ok!(
            h.run("script", h.options().transform(prefix("[prefix]")))
                .await
        );

        let expected = "[prefix] command output 1\n[prefix] command output 2\n";
        assert_eq!(output.as_deref(), Some(expected));
        assert_eq!(h.stdout.contents(), expected);
    }

    #[tokio::test]
    async fn test_partial_line_forwarded_at_end_of_stream() {
        let h = Harness::new(exiting(0, vec!["prompt> "]));
        let output = assert_ok!(h.run("printf 'prompt> '", h.options()).await);

        assert_eq!(output.as_deref(), Some("prompt> "));
        assert_eq!(h.stdout.writes(), vec!["prompt> ".to_string()]);
    }

    #[tokio::test]
    async fn test_silent_does_not_forward() {
        let h = Harness::new(exiting(0, vec!["command output\n"]));
        let output = assert_ok!(h.run("echo", h.options().silent(true)).await);

        assert_eq!(output.as_deref(), Some("command output\n"));
        assert_eq!(h.stdout.write_count(), 0);
    }

    #[tokio::test]
    async fn test_nopipe_resolves_none() {
        let h = Harness::new(exiting(0, vec!["ignored\n"]));
        let output = assert_ok!(h.run("echo", h.options().nopipe(true)).await);

        assert_eq!(output, None);
        assert_eq!(h.stdout.write_count(), 0);
        let req = h.spawner.requests.lock().unwrap()[0].clone();
        assert_eq!(req.stdio, StdioConfig::resolve(true, false));
    }

    #[tokio::test]
    async fn test_stderr_goes_to_parent_stderr() {
        let h = Harness::new(FakeSpawner {
            stderr: vec!["warn\n"],
            exit: Some(0),
            ..Default::default()
        });
        let output = assert_ok!(h.run("cmd", h.options()).await);

        assert_eq!(output, None);
        assert_eq!(h.stderr.contents(), "warn\n");
        assert_eq!(h.stdout.write_count(), 0);
    }

    #[tokio::test]
    async fn test_nonzero_exit_rejects() {
        let h = Harness::new(exiting(1, vec![]));
        let err = assert_err!(h.run("exit 1", h.options()).await);

        assert_eq!(err.to_string(), "Command failed: exit 1 with exit code 1");
        assert_eq!(err.exit_code(), Some(1));
    }

    #[tokio::test]
    async fn test_error_message_transformed() {
        let h = Harness::new(exiting(1, vec![]));
        let opts = h.options().transform(prefix("[prefix]"));
        let err = assert_err!(h.run("exit 1", opts).await);

        assert_eq!(
            err.to_string(),
            "[prefix] Command failed: exit 1 with exit code 1"
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_rejects() {
        let h = Harness::new(FakeSpawner {
            fail: true,
            ..Default::default()
        });
        let err = assert_err!(h.run("missing", h.options()).await);

        assert_eq!(err.kind(), ShellErrorKind::Spawn);
        assert_eq!(err.to_string(), "Failed to start command: missing; not found");
    }

    #[tokio::test]
    async fn test_timeout_kills_and_rejects() {
        let h = Harness::new(FakeSpawner {
            hang: true,
            ..Default::default()
        });
        let opts = h.options().timeout(Duration::from_millis(50));
        let err = assert_err!(h.run("sleep 5", opts).await);

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Command timeout: sleep 5");
        assert!(*h.spawner.killed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_completion_before_timeout_wins() {
        let h = Harness::new(exiting(0, vec!["fast\n"]));
        let opts = h.options().timeout(Duration::from_secs(5));
        let output = assert_ok!(h.run("echo fast", opts).await);

        assert_eq!(output.as_deref(), Some("fast\n"));
        assert!(!*h.spawner.killed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_exit_wins_over_open_stream() {
        let h = Harness::new(FakeSpawner {
            stdout: vec!["hi\n"],
            stall: Some(Duration::from_secs(10)),
            exit: Some(0),
            ..Default::default()
        });
        let opts = h.options().timeout(Duration::from_millis(100));
        let output = assert_ok!(h.run("sleep 10 & echo hi", opts).await);

        assert_eq!(output.as_deref(), Some("hi\n"));
        assert_eq!(h.stdout.contents(), "hi\n");
        assert!(!*h.spawner.killed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_failed_exit_with_open_stream_rejects() {
        let h = Harness::new(FakeSpawner {
            stall: Some(Duration::from_secs(10)),
            exit: Some(2),
            ..Default::default()
        });
        let opts = h.options().timeout(Duration::from_millis(100));
        let err = assert_err!(h.run("sleep 10 & exit 2", opts).await);

        assert!(!err.is_timeout());
        assert_eq!(err.exit_code(), Some(2));
    }

    #[test]
    fn test_outside_runtime_rejects() {
        let h = Harness::new(exiting(0, vec![]));
        let deferred = h.run("echo hi", h.options());
        let err = assert_err!(tokio_test::block_on(deferred));

        assert_eq!(err.kind(), ShellErrorKind::Spawn);
        assert!(err.to_string().starts_with("Failed to start command: echo hi;"));
        assert!(h.spawner.requests.lock().unwrap().is_empty());
    }
}
