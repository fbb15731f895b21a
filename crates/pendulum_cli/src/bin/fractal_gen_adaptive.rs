use pendulum_cli::adaptive;
use std::process::ExitCode;

fn main() -> ExitCode {
    pendulum_cli::run(adaptive::main)
}
