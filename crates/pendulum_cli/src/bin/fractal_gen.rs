use pendulum_cli::uniform;
use std::process::ExitCode;

fn main() -> ExitCode {
    pendulum_cli::run(uniform::main)
}
