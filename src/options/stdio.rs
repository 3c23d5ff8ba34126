//! Stdio routing policy.

use std::fmt;

/// Routing for a single stdio slot of the child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Connect the slot to a pipe read by shellmux.
    Pipe,
    /// Share the parent's own descriptor.
    Inherit,
    /// Connect the slot to the null device.
    Ignore,
}

impl StdioMode {
    /// Convert into a `std::process::Stdio` for spawning.
    pub fn to_stdio(self) -> std::process::Stdio {
        match self {
            StdioMode::Pipe => std::process::Stdio::piped(),
            StdioMode::Inherit => std::process::Stdio::inherit(),
            StdioMode::Ignore => std::process::Stdio::null(),
        }
    }

    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StdioMode::Pipe => "pipe",
            StdioMode::Inherit => "inherit",
            StdioMode::Ignore => "ignore",
        }
    }
}

impl fmt::Display for StdioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-slot routing descriptor for input, output and error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdioConfig {
    pub stdin: StdioMode,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
}

impl StdioConfig {
    /// Derive the descriptor from the forwarding flags.
    ///
    /// | nopipe | silent | output/error |
    /// |--------|--------|--------------|
    /// | false  | any    | pipe         |
    /// | true   | false  | inherit      |
    /// | true   | true   | ignore       |
    ///
    /// Input is always inherited.
    pub fn resolve(nopipe: bool, silent: bool) -> Self {
        let output = match (nopipe, silent) {
            (false, _) => StdioMode::Pipe,
            (true, false) => StdioMode::Inherit,
            (true, true) => StdioMode::Ignore,
        };
        Self {
            stdin: StdioMode::Inherit,
            stdout: output,
            stderr: output,
        }
    }

    /// Whether child output is piped back so a result can be captured.
    pub fn captures(&self) -> bool {
        self.stdout == StdioMode::Pipe
    }

    /// Slots in `[stdin, stdout, stderr]` order.
    pub fn as_array(&self) -> [StdioMode; 3] {
        [self.stdin, self.stdout, self.stderr]
    }
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self::resolve(false, false)
    }
}
