use crate::pendulum::DoublePendulum;
use crate::state::StateVector;

/// Successive states of a pendulum integrated from an arbitrary initial
/// state, one time step apart.
#[derive(Debug, Clone)]
pub struct Trajectory<'a, P> {
    pendulum: &'a P,
    state: StateVector,
    remaining: usize,
}

impl<'a, P: DoublePendulum> Trajectory<'a, P> {
    /// Yields the `steps` states following `initial` (the initial state
    /// itself is not included).
    pub fn new(pendulum: &'a P, initial: StateVector, steps: usize) -> Self {
        Self {
            pendulum,
            state: initial,
            remaining: steps,
        }
    }
}

impl<P: DoublePendulum> Iterator for Trajectory<'_, P> {
    type Item = StateVector;

    fn next(&mut self) -> Option<StateVector> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.state = self.pendulum.next_state(&self.state);
        Some(self.state)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P: DoublePendulum> ExactSizeIterator for Trajectory<'_, P> {}

/// Positions of O, A and B followed by the total energy, the values dumped
/// for each step of a time history.
pub fn time_history_values(pendulum: &impl DoublePendulum, state: &StateVector) -> [f64; 7] {
    let coords = pendulum.cartesian_coordinates(state);
    [
        coords.origin[0],
        coords.origin[1],
        coords.a[0],
        coords.a[1],
        coords.b[0],
        coords.b[1],
        pendulum.energy(state),
    ]
}
