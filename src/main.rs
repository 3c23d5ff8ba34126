//! shellmux binary entry point.

use std::process::ExitCode;

use shellmux::cli::{self, Args};
use shellmux::config::Config;
use shellmux::{logging, shell, ParentProcess};
use tracing::{debug, error};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'shellmux --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, String> {
    let Some(command) = args.command_line() else {
        cli::print_help();
        return Ok(ExitCode::from(2));
    };

    let config = Config::load(args).map_err(|e| e.to_string())?;
    let _ = logging::try_init_with_level(config.log_filter());
    debug!(command = %command, defaults = ?config.defaults, "configuration loaded");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {}", e))?;

    let options = config.to_options(ParentProcess::current());
    let result = runtime.block_on(async { shell(&command, options).output().await });

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(command = %e.command(), kind = ?e.kind(), "command failed");
            Err(e.to_string())
        }
    }
}
