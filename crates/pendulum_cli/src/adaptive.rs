//! `fractal_gen_adaptive`: steps to flip sampled by adaptive refinement.

use crate::args::{build_pendulum, output_path};
use crate::worker_pool;
use anyhow::{Context, Result};
use clap::Parser;
use pendulum_core::adaptive::{AdaptiveDomain, AdaptiveGrid};
use pendulum_core::error::ConfigError;
use pendulum_core::fractal::{Fractal, StepsToFlip};
use pendulum_core::output::{
    adaptive_header, write_data_points, write_elapsed, write_header, SEPARATOR,
};
use pendulum_core::pendulum::{Pendulum, Variant};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

pub type FlipGrid = AdaptiveGrid<StepsToFlip<Pendulum>>;

/// Steps to flip of a double pendulum, sampled more densely where they vary
/// the most.
///
/// The number of worker threads is read from PENDULUM_THREADS (default: all
/// cores).
#[derive(Debug, Clone, Parser)]
#[command(name = "fractal_gen_adaptive")]
pub struct AdaptiveArgs {
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
    /// Center of the domain along the first rod's starting angle [rad].
    #[arg(value_name = "ai1Central", allow_negative_numbers = true)]
    pub center_x: f64,
    /// Center of the domain along the second rod's starting angle [rad].
    #[arg(value_name = "ai2Central", allow_negative_numbers = true)]
    pub center_y: f64,
    /// Side of the square domain of starting angles [rad].
    #[arg(value_name = "aiSize", allow_negative_numbers = true)]
    pub size: f64,
    /// Time step of the simulation [s].
    #[arg(value_name = "dt", allow_negative_numbers = true)]
    pub dt: f64,
    /// Maximum number of steps of each simulation.
    #[arg(value_name = "nStepMax")]
    pub max_steps: u32,
    /// Number of refinement cycles to run.
    #[arg(value_name = "nCycles")]
    pub cycles: usize,
    /// Rewrite outFile with the partial data every nCyclesPrint cycles.
    /// Zero or negative never does.
    #[arg(value_name = "nCyclesPrint", allow_negative_numbers = true)]
    pub cycles_print: Option<i64>,
}

impl AdaptiveArgs {
    pub fn pendulum(&self) -> Result<Pendulum, ConfigError> {
        build_pendulum(self.variant, [self.m1, self.m2, self.l1, self.l2], self.dt)
    }

    pub fn domain(&self) -> Result<AdaptiveDomain, ConfigError> {
        let domain = AdaptiveDomain::new(self.center_x, self.center_y, self.size);
        domain.validate()?;
        Ok(domain)
    }

    /// Cycles between two checkpoints, if checkpoints are enabled.
    pub fn checkpoint_every(&self) -> Option<usize> {
        self.cycles_print
            .and_then(|every| usize::try_from(every).ok())
            .filter(|&every| every > 0)
    }
}

/// Splits `cycles` into the batches run between two snapshots.
fn batches(cycles: usize, checkpoint_every: Option<usize>) -> Vec<usize> {
    match checkpoint_every {
        Some(every) if every < cycles => {
            let mut batches = vec![every; cycles / every];
            if cycles % every != 0 {
                batches.push(cycles % every);
            }
            batches
        }
        _ => vec![cycles],
    }
}

/// Header and every current data point, optionally followed by the elapsed
/// time footer.
pub fn write_snapshot<W: Write>(
    out: &mut W,
    grid: &FlipGrid,
    elapsed: Option<Duration>,
) -> Result<()> {
    let flip_time = grid.function();
    let header = adaptive_header(
        flip_time.fractal().pendulum(),
        grid.domain(),
        flip_time.max_steps(),
        grid.cycles_run(),
    );
    write_header(out, &header)?;
    write_data_points(out, &grid.data_points(), SEPARATOR)?;
    if let Some(elapsed) = elapsed {
        write_elapsed(out, elapsed)?;
    }
    Ok(())
}

fn save(path: &Path, grid: &FlipGrid, elapsed: Option<Duration>) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}.", path.display()))?;
    let mut out = BufWriter::new(file);
    write_snapshot(&mut out, grid, elapsed)?;
    out.flush()
        .with_context(|| format!("Failed to write {}.", path.display()))
}

/// Runs `cycles` cycles, rewriting `output` after each checkpoint batch and
/// once more at the end.
pub fn run(
    output: &Path,
    grid: &mut FlipGrid,
    cycles: usize,
    checkpoint_every: Option<usize>,
) -> Result<()> {
    let start = Instant::now();
    let batches = batches(cycles, checkpoint_every);
    let last = batches.len() - 1;
    for (index, batch) in batches.into_iter().enumerate() {
        grid.cycle(batch);
        if index < last {
            save(output, grid, None)?;
            info!(cycles = grid.cycles_run(), regions = grid.len(), "checkpoint written");
        }
    }
    save(output, grid, Some(start.elapsed()))
}

pub fn main(args: AdaptiveArgs) -> Result<()> {
    let pendulum = args.pendulum()?;
    let domain = args.domain()?;
    let pool = worker_pool()?;
    info!(
        output = %args.output.display(),
        cycles = args.cycles,
        workers = pool.workers(),
        "computing adaptive fractal"
    );

    let flip_time = Fractal::new(pendulum).flip_time(args.max_steps);
    let mut grid = AdaptiveGrid::new(flip_time, domain, pool)?;
    run(&args.output, &mut grid, args.cycles, args.checkpoint_every())
}
