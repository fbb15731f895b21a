use pendulum_cli::time_history;
use std::process::ExitCode;

fn main() -> ExitCode {
    pendulum_cli::run(time_history::main)
}
