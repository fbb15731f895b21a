//! Command-line front ends for the flip fractal.
//!
//! Each binary under `src/bin` is a thin wrapper around one of the program
//! modules here; the modules declare their positional arguments with `clap`,
//! run the computation and write the text output.

pub mod adaptive;
pub mod args;
pub mod time_history;
pub mod uniform;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use pendulum_core::error::ConfigError;
use pendulum_core::parallel::WorkerPool;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the number of worker threads.
pub const THREADS_VAR: &str = "PENDULUM_THREADS";

/// Installs the stderr log subscriber. The level comes from `RUST_LOG` and
/// defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_threads(value: Option<&str>) -> Result<Option<usize>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid {THREADS_VAR} value \"{raw}\"."))
        })
        .transpose()
}

/// Worker pool sized from `PENDULUM_THREADS`, or from the hardware when unset.
pub fn worker_pool() -> Result<WorkerPool> {
    let threads = parse_threads(env::var(THREADS_VAR).ok().as_deref())?;
    WorkerPool::new(threads)
}

/// Exit status for a command line that clap refused: 1 for real errors,
/// 0 for `--help`.
fn parse_failure_code(err: &clap::Error) -> u8 {
    u8::from(err.use_stderr())
}

/// Parses the process arguments into `C` and runs `program` on them.
///
/// Argument errors are reported by clap together with the usage line.
/// Errors from the program are printed to stderr, followed by the usage
/// line when they come from an invalid configuration. Every failure exits
/// with code 1.
pub fn run<C, F>(program: F) -> ExitCode
where
    C: Parser,
    F: FnOnce(C) -> Result<()>,
{
    init_tracing();
    let cli = match C::try_parse_from(env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(parse_failure_code(&err));
        }
    };

    match program(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            if err.downcast_ref::<ConfigError>().is_some() {
                eprintln!();
                eprintln!("{}", C::command().render_usage());
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_failure_code, parse_threads};
    use crate::args::to_args;
    use crate::uniform::UniformArgs;
    use clap::Parser;

    #[test]
    fn threads_default_to_hardware_when_unset() {
        assert_eq!(parse_threads(None).expect("unset"), None);
    }

    #[test]
    fn threads_parse_from_environment_value() {
        assert_eq!(parse_threads(Some(" 4 ")).expect("four"), Some(4));
        let err = parse_threads(Some("many")).expect_err("not a number");
        assert!(err.to_string().contains("PENDULUM_THREADS"));
    }

    #[test]
    fn rejected_command_lines_exit_with_one() {
        let err = UniformArgs::try_parse_from(to_args("fractal_gen", "a b"))
            .expect_err("too few arguments");
        assert_eq!(parse_failure_code(&err), 1);

        let err = UniformArgs::try_parse_from(to_args("fractal_gen", "--help"))
            .expect_err("help is reported as an error");
        assert_eq!(parse_failure_code(&err), 0);
    }
}
