//! Command-line interface for shellmux.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Run through the deferred (async) path.
    pub async_mode: bool,
    /// Do not forward output to this process's stdout/stderr.
    pub silent: bool,
    /// Let the child inherit stdio instead of capturing it.
    pub nopipe: bool,
    /// Timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Prefix prepended to every output line.
    pub prefix: Option<String>,
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables, layered over the inherited environment.
    pub env: Vec<(String, String)>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
    /// Command words, joined with spaces before running.
    pub command: Vec<String>,
}

impl Args {
    /// The command line to run, if one was given.
    pub fn command_line(&self) -> Option<String> {
        if self.command.is_empty() {
            None
        } else {
            Some(self.command.join(" "))
        }
    }
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
///
/// Everything from the first positional argument on is taken verbatim as
/// the command, so `shellmux ls -la` runs `ls -la`.
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('a') | Long("async") => {
                result.async_mode = true;
            }
            Short('s') | Long("silent") => {
                result.silent = true;
            }
            Short('n') | Long("nopipe") => {
                result.nopipe = true;
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                result.timeout_ms = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("timeout", value))?,
                );
            }
            Short('p') | Long("prefix") => {
                result.prefix = Some(parser.value()?.parse()?);
            }
            Short('C') | Long("cwd") => {
                result.cwd = Some(parser.value()?.parse()?);
            }
            Short('e') | Long("env") => {
                let value: String = parser.value()?.parse()?;
                let (key, val) = value
                    .split_once('=')
                    .filter(|(k, _)| !k.is_empty())
                    .ok_or_else(|| ArgsError::InvalidValue("env", value.clone()))?;
                result.env.push((key.to_string(), val.to_string()));
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                result.command.push(val.string()?);
                for rest in parser.raw_args()? {
                    result
                        .command
                        .push(rest.into_string().map_err(lexopt::Error::NonUnicodeValue)?);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"shellmux {version}
Run a shell command with captured, transformed output

USAGE:
    shellmux [OPTIONS] [--] <COMMAND>...

OPTIONS:
    -a, --async             Run through the non-blocking path
    -s, --silent            Do not echo output
    -n, --nopipe            Inherit stdio instead of capturing
    -t, --timeout <MS>      Kill the command after MS milliseconds
    -p, --prefix <STR>      Prefix every output line with STR
    -C, --cwd <DIR>         Working directory for the command
    -e, --env <KEY=VALUE>   Set an environment variable (repeatable)
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SHELLMUX_TIMEOUT_MS     Default timeout (overrides config)
    SHELLMUX_PREFIX         Default line prefix (overrides config)
    SHELLMUX_LOG_LEVEL      Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Run and echo output
    shellmux echo hi

    # Tag every line and give up after 5 seconds
    shellmux -p '[build]' -t 5000 -- make all

    # Capture without echoing
    shellmux --silent -- ls -la
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("shellmux {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("shellmux")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(!result.async_mode);
        assert!(!result.silent);
        assert!(!result.nopipe);
        assert!(result.timeout_ms.is_none());
        assert!(result.command_line().is_none());
    }

    #[test]
    fn test_command_words() {
        let result = parse_args_from(args(&["echo", "hi"])).unwrap();
        assert_eq!(result.command_line(), Some("echo hi".to_string()));
    }

    #[test]
    fn test_command_keeps_its_flags() {
        let result = parse_args_from(args(&["-s", "ls", "-la", "--color"])).unwrap();
        assert!(result.silent);
        assert_eq!(result.command, vec!["ls", "-la", "--color"]);
    }

    #[test]
    fn test_double_dash() {
        let result = parse_args_from(args(&["--", "-weird", "arg"])).unwrap();
        assert_eq!(result.command_line(), Some("-weird arg".to_string()));
    }

    #[test]
    fn test_mode_flags() {
        let result = parse_args_from(args(&["-a", "-n", "--silent", "true"])).unwrap();
        assert!(result.async_mode);
        assert!(result.nopipe);
        assert!(result.silent);
    }

    #[test]
    fn test_timeout_and_prefix() {
        let result = parse_args_from(args(&["-t", "1500", "--prefix", "[x]", "make"])).unwrap();
        assert_eq!(result.timeout_ms, Some(1500));
        assert_eq!(result.prefix, Some("[x]".to_string()));
    }

    #[test]
    fn test_env_pairs() {
        let result =
            parse_args_from(args(&["-e", "A=1", "--env", "B=x=y", "env"])).unwrap();
        assert_eq!(
            result.env,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "x=y".to_string())
            ]
        );
    }

    #[test]
    fn test_invalid_env() {
        assert!(parse_args_from(args(&["-e", "NOEQUALS", "env"])).is_err());
        assert!(parse_args_from(args(&["-e", "=value", "env"])).is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let result = parse_args_from(args(&["-t", "soon"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_cwd_and_config() {
        let result =
            parse_args_from(args(&["-C", "/tmp", "-c", "/etc/shellmux.json", "pwd"])).unwrap();
        assert_eq!(result.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(result.config, Some(PathBuf::from("/etc/shellmux.json")));
    }

    #[test]
    fn test_help_and_version_flags() {
        assert!(parse_args_from(args(&["-h"])).unwrap().help);
        assert!(parse_args_from(args(&["--help"])).unwrap().help);
        assert!(parse_args_from(args(&["-V"])).unwrap().version);
        assert!(parse_args_from(args(&["--version"])).unwrap().version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_unknown_option() {
        assert!(parse_args_from(args(&["--bogus"])).is_err());
    }
}
