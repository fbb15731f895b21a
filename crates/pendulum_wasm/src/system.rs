//! Core WASM fractal wrapper and low-level utilities.

use js_sys::Uint32Array;
use pendulum_core::fractal::{Fractal, StepsToFlip};
use pendulum_core::output::uniform_header;
use pendulum_core::parallel::WorkerPool;
use pendulum_core::pendulum::{DoublePendulum, Pendulum, PendulumParams, Variant};
use pendulum_core::state::StateVector;
use pendulum_core::trajectory::{time_history_values, Trajectory};
use pendulum_core::uniform::{sample_uniform, UniformDomain};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmFractal {
    pub(crate) flip_time: StepsToFlip<Pendulum>,
}

pub(crate) fn build_pendulum(pendulum_type: &str, params: PendulumParams) -> Result<Pendulum, String> {
    let variant: Variant = pendulum_type.parse().map_err(|err| format!("{err}"))?;
    params.validate().map_err(|err| format!("{err}"))?;
    Ok(Pendulum::new(params, variant))
}

impl WasmFractal {
    pub(crate) fn pendulum(&self) -> &Pendulum {
        self.flip_time.fractal().pendulum()
    }

    fn uniform_steps(&self, domain: &UniformDomain) -> Result<Vec<u32>, String> {
        // Browsers run the bridge on a single thread.
        let grid = sample_uniform(domain, |a1, a2| self.flip_time.steps(a1, a2), &WorkerPool::serial())
            .map_err(|err| format!("{err}"))?;
        Ok(grid.values)
    }
}

#[wasm_bindgen]
impl WasmFractal {
    #[allow(clippy::too_many_arguments)]
    #[wasm_bindgen(constructor)]
    pub fn new(
        pendulum_type: &str,
        m1: f64,
        m2: f64,
        l1: f64,
        l2: f64,
        dt: f64,
        g: f64,
        max_steps: u32,
    ) -> Result<WasmFractal, JsValue> {
        console_error_panic_hook::set_once();

        let params = PendulumParams::new(m1, m2, l1, l2, dt).with_gravity(g);
        let pendulum = build_pendulum(pendulum_type, params).map_err(|e| JsValue::from_str(&e))?;
        Ok(WasmFractal {
            flip_time: Fractal::new(pendulum).flip_time(max_steps),
        })
    }

    pub fn max_steps(&self) -> u32 {
        self.flip_time.max_steps()
    }

    pub fn pendulum_type(&self) -> String {
        self.pendulum().variant().to_string()
    }

    pub fn steps_to_flip(&self, a1: f64, a2: f64) -> u32 {
        self.flip_time.steps(a1, a2)
    }

    pub fn energy(&self, state: &[f64]) -> Result<f64, JsValue> {
        let state = to_state(state).map_err(|e| JsValue::from_str(&e))?;
        Ok(self.pendulum().energy(&state))
    }

    /// Width and height of the grid `compute_uniform_grid` would produce.
    pub fn uniform_dimensions(
        &self,
        a1_min: f64,
        a1_max: f64,
        a2_min: f64,
        a2_max: f64,
        cell_size: f64,
    ) -> Result<Vec<u32>, JsValue> {
        let domain = UniformDomain::new(a1_min, a1_max, a2_min, a2_max, cell_size);
        grid_dimensions(&domain).map_err(|e| JsValue::from_str(&e))
    }

    /// Steps to flip for every cell, row-major, first row at `a2_max`.
    pub fn compute_uniform_grid(
        &self,
        a1_min: f64,
        a1_max: f64,
        a2_min: f64,
        a2_max: f64,
        cell_size: f64,
    ) -> Result<Uint32Array, JsValue> {
        let domain = UniformDomain::new(a1_min, a1_max, a2_min, a2_max, cell_size);
        let steps = self.uniform_steps(&domain).map_err(|e| JsValue::from_str(&e))?;
        Ok(Uint32Array::from(steps.as_slice()))
    }

    pub fn uniform_header(
        &self,
        a1_min: f64,
        a1_max: f64,
        a2_min: f64,
        a2_max: f64,
        cell_size: f64,
    ) -> Result<JsValue, JsValue> {
        let domain = UniformDomain::new(a1_min, a1_max, a2_min, a2_max, cell_size);
        domain
            .validate()
            .map_err(|err| JsValue::from_str(&format!("{err}")))?;
        let header = uniform_header(self.pendulum(), &domain, self.max_steps());
        serde_wasm_bindgen::to_value(&header)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize header: {err}")))
    }

    /// Time history starting from `state` (`[a1, w1, a2, w2]`): for each of
    /// the `steps` following states, the positions of O, A, B and the total
    /// energy, flattened.
    pub fn trajectory(&self, state: &[f64], steps: u32) -> Result<Vec<f64>, JsValue> {
        let initial = to_state(state).map_err(|e| JsValue::from_str(&e))?;
        Ok(self.time_history(initial, steps as usize))
    }
}

impl WasmFractal {
    fn time_history(&self, initial: StateVector, steps: usize) -> Vec<f64> {
        let pendulum = self.pendulum();
        Trajectory::new(pendulum, initial, steps)
            .flat_map(|state| time_history_values(pendulum, &state))
            .collect()
    }
}

fn grid_dimensions(domain: &UniformDomain) -> Result<Vec<u32>, String> {
    domain.validate().map_err(|err| format!("{err}"))?;
    let (width, height) = domain.dimensions();
    let to_u32 = |count: usize| {
        u32::try_from(count).map_err(|_| format!("Grid of {width}x{height} cells is too large."))
    };
    Ok(vec![to_u32(width)?, to_u32(height)?])
}

pub(crate) fn to_state(values: &[f64]) -> Result<StateVector, String> {
    let values: [f64; 4] = values
        .try_into()
        .map_err(|_| format!("State must have 4 components, got {}.", values.len()))?;
    Ok(StateVector::from_array(values))
}
