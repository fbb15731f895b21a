//! `fractal_gen`: steps to flip over a uniform grid of starting angles.

use crate::args::{build_pendulum, output_path};
use crate::worker_pool;
use anyhow::{Context, Result};
use clap::Parser;
use pendulum_core::error::ConfigError;
use pendulum_core::fractal::Fractal;
use pendulum_core::output::{
    uniform_header, write_elapsed, write_header, write_uniform_grid, SEPARATOR,
};
use pendulum_core::parallel::WorkerPool;
use pendulum_core::pendulum::{Pendulum, Variant};
use pendulum_core::uniform::{sample_uniform, UniformDomain};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Steps to flip of a double pendulum over a uniform grid of starting angles.
///
/// The number of worker threads is read from PENDULUM_THREADS (default: all
/// cores).
#[derive(Debug, Clone, Parser)]
#[command(name = "fractal_gen")]
pub struct UniformArgs {
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
    /// Lowest starting angle of the first rod from the downward vertical [rad].
    #[arg(value_name = "ai1Min", allow_negative_numbers = true)]
    pub a1_min: f64,
    /// Highest starting angle of the first rod [rad].
    #[arg(value_name = "ai1Max", allow_negative_numbers = true)]
    pub a1_max: f64,
    /// Lowest starting angle of the second rod [rad].
    #[arg(value_name = "ai2Min", allow_negative_numbers = true)]
    pub a2_min: f64,
    /// Highest starting angle of the second rod [rad].
    #[arg(value_name = "ai2Max", allow_negative_numbers = true)]
    pub a2_max: f64,
    /// Increment of the starting angles [rad].
    #[arg(value_name = "gridSize", allow_negative_numbers = true)]
    pub grid_size: f64,
    /// Time step of the simulation [s].
    #[arg(value_name = "dt", allow_negative_numbers = true)]
    pub dt: f64,
    /// Maximum number of steps of each simulation.
    #[arg(value_name = "nStepMax")]
    pub max_steps: u32,
}

impl UniformArgs {
    pub fn pendulum(&self) -> Result<Pendulum, ConfigError> {
        build_pendulum(self.variant, [self.m1, self.m2, self.l1, self.l2], self.dt)
    }

    pub fn domain(&self) -> Result<UniformDomain, ConfigError> {
        let domain = UniformDomain::new(
            self.a1_min,
            self.a1_max,
            self.a2_min,
            self.a2_max,
            self.grid_size,
        );
        domain.validate()?;
        Ok(domain)
    }
}

/// Writes the header, one line per cell and the elapsed time footer.
pub fn render<W: Write>(
    out: &mut W,
    pendulum: Pendulum,
    domain: &UniformDomain,
    max_steps: u32,
    pool: &WorkerPool,
) -> Result<()> {
    let start = Instant::now();
    write_header(out, &uniform_header(&pendulum, domain, max_steps))?;

    let flip_time = Fractal::new(pendulum).flip_time(max_steps);
    let grid = sample_uniform(domain, |a1, a2| flip_time.steps(a1, a2), pool)?;
    write_uniform_grid(out, &grid, SEPARATOR)?;
    write_elapsed(out, start.elapsed())
}

pub fn main(args: UniformArgs) -> Result<()> {
    let pendulum = args.pendulum()?;
    let domain = args.domain()?;
    let pool = worker_pool()?;
    let (width, height) = domain.dimensions();
    info!(
        output = %args.output.display(),
        width,
        height,
        workers = pool.workers(),
        "computing uniform fractal"
    );

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}.", args.output.display()))?;
    let mut out = BufWriter::new(file);
    render(&mut out, pendulum, &domain, args.max_steps, &pool)?;
    out.flush()
        .with_context(|| format!("Failed to write {}.", args.output.display()))
}
