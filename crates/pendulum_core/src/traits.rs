use crate::state::StateVector;

/// Represents a continuous dynamical system in state form, dy/dt = f(y).
pub trait DynamicalSystem {
    /// Evaluates the vector field at `state` and returns dy/dt.
    fn apply(&self, state: &StateVector) -> StateVector;
}

impl<F> DynamicalSystem for F
where
    F: Fn(&StateVector) -> StateVector,
{
    fn apply(&self, state: &StateVector) -> StateVector {
        self(state)
    }
}

/// A trait for solvers that can step a system forward.
pub trait Steppable {
    /// Returns the state reached after one step of size dt.
    fn step(&self, system: &impl DynamicalSystem, state: &StateVector, dt: f64) -> StateVector;
}

/// A scalar function sampled over a 2D domain, f(x, y).
///
/// Samplers evaluate it from several worker threads at once, hence `Sync`.
pub trait DomainFunction: Sync {
    fn evaluate(&self, x: f64, y: f64) -> f64;
}

impl<F> DomainFunction for F
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}
