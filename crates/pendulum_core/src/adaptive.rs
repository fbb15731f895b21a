//! Adaptive sampling of a function over a square domain.
//!
//! The domain is split in [`AdaptiveRegion`]s, each sampling the function on
//! a small K×K grid and carrying a priority derived from its size and from
//! how much its samples vary. [`AdaptiveGrid`] keeps refining the region with
//! the highest priority, so flat areas receive few samples and chaotic areas
//! receive many.

use crate::error::ConfigError;
use crate::parallel::WorkerPool;
use crate::traits::DomainFunction;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use tracing::{debug, info_span};

/// Samples per side of a region when not configured otherwise.
pub const DEFAULT_POINTS_PER_SIDE: usize = 3;

/// A single sample representing the square cell of side `size` centered on
/// `(x, y)`. The value refers to the exact center position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub size: f64,
}

/// Parameters shared by every region of one adaptive grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionLayout {
    /// Odd and at least 3, so every sample can become the center of a
    /// child region.
    pub points_per_side: usize,
    /// Side of the root region, used to normalize priorities.
    pub full_domain_size: f64,
}

/// Square domain sampled by an [`AdaptiveGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveDomain {
    pub center_x: f64,
    pub center_y: f64,
    pub size: f64,
    pub points_per_side: usize,
}

impl AdaptiveDomain {
    pub fn new(center_x: f64, center_y: f64, size: f64) -> Self {
        Self {
            center_x,
            center_y,
            size,
            points_per_side: DEFAULT_POINTS_PER_SIDE,
        }
    }

    pub fn with_points_per_side(mut self, points_per_side: usize) -> Self {
        self.points_per_side = points_per_side;
        self
    }

    pub fn layout(&self) -> RegionLayout {
        RegionLayout {
            points_per_side: self.points_per_side,
            full_domain_size: self.size,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.center_x.is_finite() || !self.center_y.is_finite() {
            return Err(ConfigError::invalid("center", "must be finite"));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(ConfigError::invalid("aiSize", "must be positive and finite"));
        }
        if self.points_per_side < 3 || self.points_per_side % 2 == 0 {
            return Err(ConfigError::invalid(
                "points per side",
                "must be an odd number of at least 3",
            ));
        }
        Ok(())
    }
}

/// Refinement priority of a region whose samples are `values` and whose
/// cells have side `cell_size`.
///
/// Larger cells and a larger coefficient of variation both raise the
/// priority. A zero mean leaves the variation term out.
pub fn region_priority(values: &[f64], cell_size: f64, full_domain_size: f64) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    // Small-sample correction of the coefficient of variation.
    let cv = if mean == 0.0 {
        0.0
    } else {
        (1.0 + 0.25 / n) * variance.sqrt() / mean
    };

    (1.0 + cv).powi(2) * cell_size / full_domain_size
}

/// A square area of side `side` centered on `(center_x, center_y)`, split
/// in K×K cells with one [`DataPoint`] at the center of each.
///
/// Cell `(i, j)`, with `i, j` in `-K/2..=K/2` growing along x and y, is
/// stored at index `(i + K/2) * K + (j + K/2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveRegion {
    center_x: f64,
    center_y: f64,
    side: f64,
    layout: RegionLayout,
    points: Vec<DataPoint>,
    priority: f64,
}

impl AdaptiveRegion {
    pub fn new<F: DomainFunction + ?Sized>(
        center_x: f64,
        center_y: f64,
        side: f64,
        layout: RegionLayout,
        f: &F,
    ) -> Self {
        let center_value = f.evaluate(center_x, center_y);
        Self::with_center_value(center_x, center_y, side, layout, f, center_value)
    }

    /// Builds a region whose central sample is already known, saving one
    /// evaluation of `f`.
    pub fn with_center_value<F: DomainFunction + ?Sized>(
        center_x: f64,
        center_y: f64,
        side: f64,
        layout: RegionLayout,
        f: &F,
        center_value: f64,
    ) -> Self {
        let per_side = layout.points_per_side;
        let half = (per_side / 2) as i64;
        let cell_size = side / per_side as f64;

        let mut points = Vec::with_capacity(per_side * per_side);
        for i in -half..=half {
            let x = center_x + i as f64 * cell_size;
            for j in -half..=half {
                let y = center_y + j as f64 * cell_size;
                let value = if i == 0 && j == 0 {
                    center_value
                } else {
                    f.evaluate(x, y)
                };
                points.push(DataPoint {
                    x,
                    y,
                    value,
                    size: cell_size,
                });
            }
        }

        let values: Vec<f64> = points.iter().map(|point| point.value).collect();
        let priority = region_priority(&values, cell_size, layout.full_domain_size);

        Self {
            center_x,
            center_y,
            side,
            layout,
            points,
            priority,
        }
    }

    /// Builds the region that refines the cell represented by `point`.
    pub fn from_data_point<F: DomainFunction + ?Sized>(
        point: &DataPoint,
        layout: RegionLayout,
        f: &F,
    ) -> Self {
        Self::with_center_value(point.x, point.y, point.size, layout, f, point.value)
    }

    /// Splits the region in one child per cell, each sampled K×K times.
    ///
    /// Children are independent, so they are built across the pool's
    /// workers; their order follows the order of the data points.
    pub fn subdivide<F: DomainFunction + ?Sized>(
        &self,
        f: &F,
        pool: &WorkerPool,
    ) -> Vec<AdaptiveRegion> {
        pool.strided_map(self.points.len(), |index| {
            AdaptiveRegion::from_data_point(&self.points[index], self.layout, f)
        })
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_x, self.center_y)
    }

    pub fn side(&self) -> f64 {
        self.side
    }

    pub fn cell_size(&self) -> f64 {
        self.side / self.layout.points_per_side as f64
    }

    pub fn layout(&self) -> RegionLayout {
        self.layout
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn data_points(&self) -> &[DataPoint] {
        &self.points
    }
}

/// Heap entry: highest priority first, earliest insertion first among equal
/// priorities.
#[derive(Debug)]
struct QueuedRegion {
    sequence: u64,
    region: AdaptiveRegion,
}

impl Ord for QueuedRegion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.region
            .priority
            .total_cmp(&other.region.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedRegion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedRegion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedRegion {}

/// Samples a square domain with a resolution that adapts to the function.
///
/// The grid starts with one region covering the whole domain. Every cycle
/// removes the region with the highest priority and replaces it with its
/// K² children. There is no stopping criterion: callers run as many cycles
/// as their evaluation budget allows, and may read the data points between
/// batches of cycles.
pub struct AdaptiveGrid<F> {
    function: F,
    domain: AdaptiveDomain,
    pool: WorkerPool,
    regions: BinaryHeap<QueuedRegion>,
    next_sequence: u64,
    cycles_run: usize,
}

impl<F> fmt::Debug for AdaptiveGrid<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveGrid")
            .field("domain", &self.domain)
            .field("workers", &self.pool.workers())
            .field("regions", &self.regions.len())
            .field("cycles_run", &self.cycles_run)
            .finish_non_exhaustive()
    }
}

impl<F: DomainFunction> AdaptiveGrid<F> {
    pub fn new(
        function: F,
        domain: AdaptiveDomain,
        pool: WorkerPool,
    ) -> Result<Self, ConfigError> {
        domain.validate()?;
        let root = AdaptiveRegion::new(
            domain.center_x,
            domain.center_y,
            domain.size,
            domain.layout(),
            &function,
        );

        let mut grid = Self {
            function,
            domain,
            pool,
            regions: BinaryHeap::new(),
            next_sequence: 0,
            cycles_run: 0,
        };
        grid.push(root);
        Ok(grid)
    }

    fn push(&mut self, region: AdaptiveRegion) {
        self.regions.push(QueuedRegion {
            sequence: self.next_sequence,
            region,
        });
        self.next_sequence += 1;
    }

    /// Refines the highest-priority region `cycles` times.
    pub fn cycle(&mut self, cycles: usize) {
        let _span = info_span!("adaptive_cycle", cycles, workers = self.pool.workers()).entered();
        for _ in 0..cycles {
            let Some(QueuedRegion { region, .. }) = self.regions.pop() else {
                return;
            };
            let (x, y) = region.center();
            debug!(
                priority = region.priority(),
                x,
                y,
                side = region.side(),
                regions = self.regions.len() + 1,
                "refining region"
            );

            let children = region.subdivide(&self.function, &self.pool);
            for child in children {
                self.push(child);
            }
            self.cycles_run += 1;
        }
    }

    pub fn domain(&self) -> &AdaptiveDomain {
        &self.domain
    }

    pub fn function(&self) -> &F {
        &self.function
    }

    /// Number of regions currently in the working set.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn cycles_run(&self) -> usize {
        self.cycles_run
    }

    /// Evaluations of the domain function performed so far.
    pub fn evaluations(&self) -> usize {
        let per_region = self.domain.points_per_side.pow(2);
        per_region + self.cycles_run * per_region * (per_region - 1)
    }

    /// Priority of the region the next cycle will refine.
    pub fn peek_priority(&self) -> Option<f64> {
        self.regions.peek().map(|queued| queued.region.priority())
    }

    /// Regions in the order they would be refined.
    pub fn regions(&self) -> Vec<&AdaptiveRegion> {
        let mut queued: Vec<&QueuedRegion> = self.regions.iter().collect();
        queued.sort_by(|a, b| b.cmp(a));
        queued.into_iter().map(|entry| &entry.region).collect()
    }

    /// Every sample currently held, region by region.
    pub fn data_points(&self) -> Vec<DataPoint> {
        self.regions()
            .into_iter()
            .flat_map(|region| region.data_points().iter().copied())
            .collect()
    }
}
