//! Parent-process handle: output channels and environment.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Shared writable channel of the parent process.
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<Mutex<dyn Write + Send>>,
}

impl OutputSink {
    /// Wrap any writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write `data` in a single call and flush.
    pub fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("output sink lock poisoned"))?;
        writer.write_all(data)?;
        writer.flush()
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutputSink")
    }
}

/// Handle to the process that launches commands.
///
/// Executors only ever write to these sinks and read this environment;
/// the calling process's ambient state is consulted once, in
/// [`ParentProcess::current`].
#[derive(Debug, Clone)]
pub struct ParentProcess {
    stdout: OutputSink,
    stderr: OutputSink,
    env: HashMap<String, String>,
}

impl ParentProcess {
    /// Snapshot the calling process: its stdout, stderr and environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped and
    /// logged at debug level.
    pub fn current() -> Self {
        Self {
            stdout: OutputSink::new(io::stdout()),
            stderr: OutputSink::new(io::stderr()),
            env: utf8_env(std::env::vars_os()),
        }
    }

    /// Build a handle around custom writers with an empty environment.
    pub fn with_writers(
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
    ) -> Self {
        Self {
            stdout: OutputSink::new(stdout),
            stderr: OutputSink::new(stderr),
            env: HashMap::new(),
        }
    }

    /// Replace the environment map.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Output channel.
    pub fn stdout(&self) -> &OutputSink {
        &self.stdout
    }

    /// Error channel.
    pub fn stderr(&self) -> &OutputSink {
        &self.stderr
    }

    /// Environment map.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }
}

fn utf8_env(vars: impl IntoIterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
    let mut env = HashMap::new();
    for (key, value) in vars {
        match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => {
                env.insert(key, value);
            }
            (Ok(key), Err(_)) => {
                debug!(key = %key, "skipping environment variable with non-UTF-8 value");
            }
            (Err(key), _) => {
                debug!(key = ?key, "skipping environment variable with non-UTF-8 name");
            }
        }
    }
    env
}

/// Writer that records every write call separately.
///
/// Useful as a parent channel when the caller wants to inspect exactly
/// what was forwarded, and how many times.
#[derive(Debug, Clone, Default)]
pub struct OutputRecorder {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl OutputRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded write, decoded lossily.
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .map(|w| {
                w.iter()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of write calls observed.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| w.len()).unwrap_or_default()
    }

    /// All recorded bytes concatenated.
    pub fn contents(&self) -> String {
        self.writes().concat()
    }
}

impl Write for OutputRecorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes
            .lock()
            .map_err(|_| io::Error::other("recorder lock poisoned"))?
            .push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
