//! Argument helpers shared by the programs.

use pendulum_core::error::ConfigError;
use pendulum_core::pendulum::{Pendulum, PendulumParams, Variant};
use std::path::PathBuf;

/// Value parser for the `outFile` argument.
pub fn output_path(raw: &str) -> Result<PathBuf, String> {
    if raw.is_empty() {
        return Err("Empty output file name!".to_string());
    }
    Ok(PathBuf::from(raw))
}

/// Validated pendulum from the rod arguments and the time step.
pub fn build_pendulum(
    variant: Variant,
    [m1, m2, l1, l2]: [f64; 4],
    dt: f64,
) -> Result<Pendulum, ConfigError> {
    let params = PendulumParams::new(m1, m2, l1, l2, dt);
    params.validate()?;
    Ok(Pendulum::new(params, variant))
}

#[cfg(test)]
pub(crate) fn to_args(program: &str, line: &str) -> Vec<String> {
    std::iter::once(program)
        .chain(line.split_whitespace())
        .map(str::to_string)
        .collect()
}
