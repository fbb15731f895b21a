//! `time_history`: coordinates and energy of a single pendulum run.

use crate::args::{build_pendulum, output_path};
use anyhow::{Context, Result};
use clap::Parser;
use pendulum_core::error::ConfigError;
use pendulum_core::output::{write_values, SEPARATOR};
use pendulum_core::pendulum::{Pendulum, Variant};
use pendulum_core::state::StateVector;
use pendulum_core::trajectory::{time_history_values, Trajectory};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// Positions of the notable points and total energy of a double pendulum,
/// one line per time step.
#[derive(Debug, Clone, Parser)]
#[command(name = "time_history")]
pub struct TimeHistoryArgs {
    /// Output file name.
    #[arg(value_name = "outFile", value_parser = output_path)]
    pub output: PathBuf,
    /// Type of pendulum, one of [simple, compound].
    #[arg(value_name = "type")]
    pub variant: Variant,
    /// Mass of the first rod [kg].
    #[arg(value_name = "M1", allow_negative_numbers = true)]
    pub m1: f64,
    /// Mass of the second rod [kg].
    #[arg(value_name = "M2", allow_negative_numbers = true)]
    pub m2: f64,
    /// Length of the first rod [m].
    #[arg(value_name = "L1", allow_negative_numbers = true)]
    pub l1: f64,
    /// Length of the second rod [m].
    #[arg(value_name = "L2", allow_negative_numbers = true)]
    pub l2: f64,
    /// Starting angle of the first rod from the downward vertical [rad].
    #[arg(value_name = "ai1", allow_negative_numbers = true)]
    pub a1: f64,
    /// Starting angle of the second rod [rad].
    #[arg(value_name = "ai2", allow_negative_numbers = true)]
    pub a2: f64,
    /// Starting angular velocity of the first rod [rad/s].
    #[arg(value_name = "wi1", allow_negative_numbers = true)]
    pub w1: f64,
    /// Starting angular velocity of the second rod [rad/s].
    #[arg(value_name = "wi2", allow_negative_numbers = true)]
    pub w2: f64,
    /// Time step of the simulation [s].
    #[arg(value_name = "dt", allow_negative_numbers = true)]
    pub dt: f64,
    /// Number of steps of the simulation.
    #[arg(value_name = "nStepMax")]
    pub max_steps: u32,
}

impl TimeHistoryArgs {
    pub fn pendulum(&self) -> Result<Pendulum, ConfigError> {
        build_pendulum(self.variant, [self.m1, self.m2, self.l1, self.l2], self.dt)
    }

    pub fn initial_state(&self) -> StateVector {
        StateVector::new(self.a1, self.w1, self.a2, self.w2)
    }
}

/// One `xO yO xA yA xB yB E` line for each of the `max_steps - 1` states
/// following `initial`.
pub fn render<W: Write>(
    out: &mut W,
    pendulum: &Pendulum,
    initial: StateVector,
    max_steps: u32,
) -> Result<()> {
    let steps = (max_steps as usize).saturating_sub(1);
    for state in Trajectory::new(pendulum, initial, steps) {
        write_values(out, &time_history_values(pendulum, &state), SEPARATOR)?;
    }
    Ok(())
}

pub fn main(args: TimeHistoryArgs) -> Result<()> {
    let pendulum = args.pendulum()?;
    info!(output = %args.output.display(), steps = args.max_steps, "writing time history");

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}.", args.output.display()))?;
    let mut out = BufWriter::new(file);
    render(&mut out, &pendulum, args.initial_state(), args.max_steps)?;
    out.flush()
        .with_context(|| format!("Failed to write {}.", args.output.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::to_args;
    use pendulum_core::output::read_text_output;
    use pendulum_core::pendulum::DoublePendulum;

    fn parse(line: &str) -> Result<TimeHistoryArgs, clap::Error> {
        TimeHistoryArgs::try_parse_from(to_args("time_history", line))
    }

    #[test]
    fn parses_velocities_after_angles() {
        let args = parse("th.txt compound 1 1 1 1 0.1 -0.2 0.3 -0.4 0.01 10")
            .expect("valid arguments");
        assert_eq!(args.initial_state(), StateVector::new(0.1, 0.3, -0.2, -0.4));
        assert_eq!(args.pendulum().expect("pendulum").params().dt, 0.01);
    }

    #[test]
    fn rejects_wrong_argument_count() {
        assert!(parse("th.txt simple 1 1 1 1 0 0 0 0 0.01").is_err());
    }

    #[test]
    fn render_writes_seven_columns_per_step() {
        let args = parse("th.txt simple 1 1 1 1 1 -1 0 0 0.001 50").expect("valid arguments");
        let pendulum = args.pendulum().expect("pendulum");
        let mut out = Vec::new();
        render(&mut out, &pendulum, args.initial_state(), args.max_steps).expect("render");

        let parsed = read_text_output(out.as_slice(), SEPARATOR).expect("parse");
        assert_eq!(parsed.rows.len(), 49);
        let initial_energy = pendulum.energy(&args.initial_state());
        for row in &parsed.rows {
            assert_eq!(row.len(), 7);
            assert!((row[6] - initial_energy).abs() < 1e-3 * initial_energy.abs().max(1.0));
        }
    }
}
