//! Adaptive grid bindings.

use crate::system::WasmFractal;
use js_sys::Float64Array;
use pendulum_core::adaptive::{AdaptiveDomain, AdaptiveGrid};
use pendulum_core::fractal::StepsToFlip;
use pendulum_core::output::adaptive_header;
use pendulum_core::parallel::WorkerPool;
use pendulum_core::pendulum::Pendulum;
use wasm_bindgen::prelude::*;

/// Adaptive flip-time grid driven from JavaScript, a batch of cycles at a
/// time so the page can redraw between batches.
#[wasm_bindgen]
pub struct WasmAdaptiveGrid {
    grid: AdaptiveGrid<StepsToFlip<Pendulum>>,
}

impl WasmAdaptiveGrid {
    fn build(fractal: &WasmFractal, domain: AdaptiveDomain) -> Result<Self, String> {
        let grid = AdaptiveGrid::new(fractal.flip_time.clone(), domain, WorkerPool::serial())
            .map_err(|err| format!("{err}"))?;
        Ok(Self { grid })
    }

    fn flattened_points(&self) -> Vec<f64> {
        self.grid
            .data_points()
            .iter()
            .flat_map(|point| [point.x, point.y, point.size, point.value])
            .collect()
    }
}

#[wasm_bindgen]
impl WasmAdaptiveGrid {
    #[wasm_bindgen(constructor)]
    pub fn new(
        fractal: &WasmFractal,
        center_x: f64,
        center_y: f64,
        size: f64,
    ) -> Result<WasmAdaptiveGrid, JsValue> {
        console_error_panic_hook::set_once();

        Self::build(fractal, AdaptiveDomain::new(center_x, center_y, size))
            .map_err(|e| JsValue::from_str(&e))
    }

    pub fn cycle(&mut self, cycles: u32) {
        self.grid.cycle(cycles as usize);
    }

    pub fn region_count(&self) -> u32 {
        self.grid.len() as u32
    }

    pub fn cycles_run(&self) -> u32 {
        self.grid.cycles_run() as u32
    }

    pub fn next_priority(&self) -> Option<f64> {
        self.grid.peek_priority()
    }

    /// Every sample as consecutive `x, y, size, value` quadruples.
    pub fn data_points(&self) -> Float64Array {
        Float64Array::from(self.flattened_points().as_slice())
    }

    pub fn header(&self) -> Result<JsValue, JsValue> {
        let flip_time = self.grid.function();
        let header = adaptive_header(
            flip_time.fractal().pendulum(),
            self.grid.domain(),
            flip_time.max_steps(),
            self.grid.cycles_run(),
        );
        serde_wasm_bindgen::to_value(&header)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize header: {err}")))
    }
}
