//! Uniform sampling: the domain is divided in a grid of square cells of the
//! same size and the target function is evaluated once per cell.

use crate::error::ConfigError;
use crate::parallel::WorkerPool;
use serde::{Deserialize, Serialize};
use tracing::info_span;

/// Rectangular domain of initial angles together with the grid resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformDomain {
    pub a1_min: f64,
    pub a1_max: f64,
    pub a2_min: f64,
    pub a2_max: f64,
    pub cell_size: f64,
}

impl UniformDomain {
    pub fn new(a1_min: f64, a1_max: f64, a2_min: f64, a2_max: f64, cell_size: f64) -> Self {
        Self {
            a1_min,
            a1_max,
            a2_min,
            a2_max,
            cell_size,
        }
    }

    /// Grid size as `(width, height)`: columns along `a1`, rows along `a2`.
    pub fn dimensions(&self) -> (usize, usize) {
        let cells = |span: f64| (span / self.cell_size).ceil().max(0.0) as usize;
        (
            cells(self.a1_max - self.a1_min),
            cells(self.a2_max - self.a2_min),
        )
    }

    /// Total number of cells, or `None` when it does not fit in `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        let cells = |span: f64| {
            let count = (span / self.cell_size).ceil().max(0.0);
            (count.is_finite() && count < usize::MAX as f64).then_some(count as usize)
        };
        cells(self.a1_max - self.a1_min)?.checked_mul(cells(self.a2_max - self.a2_min)?)
    }

    /// Angles sampled by the cell at `(col, row)`.
    ///
    /// Rows count downwards as in an image, so `a2` decreases from `a2_max`
    /// as the row index grows.
    pub fn coordinate(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.a1_min + col as f64 * self.cell_size,
            self.a2_max - row as f64 * self.cell_size,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [self.a1_min, self.a1_max, self.a2_min, self.a2_max];
        if bounds.iter().any(|value| !value.is_finite()) {
            return Err(ConfigError::invalid("domain", "bounds must be finite"));
        }
        if self.a1_max <= self.a1_min || self.a2_max <= self.a2_min {
            return Err(ConfigError::invalid("domain", "max must be greater than min"));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::invalid("gridSize", "must be positive and finite"));
        }
        if self.cell_count().is_none() {
            return Err(ConfigError::invalid("gridSize", "too small for the domain"));
        }
        Ok(())
    }
}

/// Values sampled on a uniform grid, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformGrid<T> {
    pub width: usize,
    pub height: usize,
    pub values: Vec<T>,
}

impl<T> UniformGrid<T> {
    pub fn get(&self, col: usize, row: usize) -> Option<&T> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.values.get(row * self.width + col)
    }

    /// Iterates `(col, row, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        let width = self.width.max(1);
        self.values
            .iter()
            .enumerate()
            .map(move |(index, value)| (index % width, index / width, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluates `f(a1, a2)` on every cell of `domain`, after validating it.
///
/// Cells are spread across the pool's workers by flat index, so the grid is
/// identical for any worker count.
pub fn sample_uniform<T, F>(
    domain: &UniformDomain,
    f: F,
    pool: &WorkerPool,
) -> Result<UniformGrid<T>, ConfigError>
where
    T: Send,
    F: Fn(f64, f64) -> T + Sync,
{
    domain.validate()?;
    let (width, height) = domain.dimensions();
    let cells = width
        .checked_mul(height)
        .ok_or_else(|| ConfigError::invalid("gridSize", "too small for the domain"))?;
    let _span = info_span!("sample_uniform", width, height, workers = pool.workers()).entered();

    let values = pool.strided_map(cells, |index| {
        let (a1, a2) = domain.coordinate(index % width, index / width);
        f(a1, a2)
    });

    Ok(UniformGrid {
        width,
        height,
        values,
    })
}
