//! Flip-time fractal of a double pendulum.
//!
//! A fractal emerges when measuring, for each pair of initial angles, after
//! how long one of the rods flips over the upward vertical.

use crate::pendulum::DoublePendulum;
use crate::state::StateVector;
use crate::traits::DomainFunction;
use std::f64::consts::PI;
use tracing::trace;

/// Number of complete turns made by a rod, counted from the upward vertical.
///
/// Floor division keeps negative angles on the correct side of each turn.
pub fn rotation_count(angle: f64) -> f64 {
    ((angle - PI) / (2.0 * PI)).floor()
}

/// Whether either rod passed through the upward vertical (angle ≡ π mod 2π)
/// between two consecutive states, in either direction.
pub fn detect_flip(prev: &StateVector, curr: &StateVector) -> bool {
    rotation_count(prev.a1()) != rotation_count(curr.a1())
        || rotation_count(prev.a2()) != rotation_count(curr.a2())
}

/// Energy bound for a pendulum released at rest: when this returns false
/// neither rod can ever reach the upward vertical.
pub fn can_flip(l1: f64, l2: f64, a1: f64, a2: f64) -> bool {
    3.0 * l1 * a1.cos() + l2 * a2.cos() <= 2.0
}

/// Evaluates flip times for a given pendulum.
#[derive(Debug, Clone)]
pub struct Fractal<P> {
    pendulum: P,
}

impl<P: DoublePendulum> Fractal<P> {
    pub fn new(pendulum: P) -> Self {
        Self { pendulum }
    }

    pub fn pendulum(&self) -> &P {
        &self.pendulum
    }

    /// Number of steps before one of the rods flips, starting at rest from
    /// the angles `(a1, a2)`.
    ///
    /// Returns `max_steps` when no flip happens within the budget, including
    /// the case where a flip is ruled out without integrating at all.
    pub fn steps_to_flip(&self, a1: f64, a2: f64, max_steps: u32) -> u32 {
        let params = self.pendulum.params();
        if !can_flip(params.l1, params.l2, a1, a2) {
            return max_steps;
        }

        let mut current = StateVector::at_rest(a1, a2);
        for count in 0..max_steps {
            let next = self.pendulum.next_state(&current);

            // The first two steps are never checked.
            if count > 1 && detect_flip(&current, &next) {
                trace!(a1, a2, steps = count, "flip detected");
                return count;
            }

            current = next;
        }
        max_steps
    }

    /// Binds the evaluator to a step budget, producing a sampler-ready
    /// domain function.
    pub fn flip_time(self, max_steps: u32) -> StepsToFlip<P> {
        StepsToFlip {
            fractal: self,
            max_steps,
        }
    }
}

/// Flip time as a function of the initial angles, for a fixed budget.
#[derive(Debug, Clone)]
pub struct StepsToFlip<P> {
    fractal: Fractal<P>,
    max_steps: u32,
}

impl<P: DoublePendulum> StepsToFlip<P> {
    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn fractal(&self) -> &Fractal<P> {
        &self.fractal
    }

    pub fn steps(&self, a1: f64, a2: f64) -> u32 {
        self.fractal.steps_to_flip(a1, a2, self.max_steps)
    }
}

impl<P: DoublePendulum + Sync> DomainFunction for StepsToFlip<P> {
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        f64::from(self.steps(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::{can_flip, detect_flip, rotation_count, Fractal};
    use crate::pendulum::{DoublePendulum, Pendulum, PendulumParams, Variant};
    use crate::state::StateVector;
    use crate::traits::DomainFunction;
    use proptest::prelude::*;
    use std::f64::consts::PI;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts every evaluation of the equation of motion.
    struct CountingPendulum {
        inner: Pendulum,
        calls: AtomicUsize,
    }

    impl CountingPendulum {
        fn new(variant: Variant) -> Self {
            Self {
                inner: Pendulum::new(PendulumParams::new(1.0, 1.0, 1.0, 1.0, 0.01), variant),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DoublePendulum for CountingPendulum {
        fn params(&self) -> &PendulumParams {
            self.inner.params()
        }

        fn variant(&self) -> Variant {
            self.inner.variant()
        }

        fn motion_equation(&self, state: &StateVector) -> StateVector {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.inner.motion_equation(state)
        }

        fn energy(&self, state: &StateVector) -> f64 {
            self.inner.energy(state)
        }
    }

    fn state_with_angles(a1: f64, a2: f64) -> StateVector {
        StateVector::at_rest(a1, a2)
    }

    #[test]
    fn rotation_count_floors_negative_angles() {
        assert_eq!(rotation_count(0.0), -1.0);
        assert_eq!(rotation_count(PI + 1e-9), 0.0);
        assert_eq!(rotation_count(PI - 1e-9), -1.0);
        assert_eq!(rotation_count(-PI - 1e-9), -2.0);
        assert_eq!(rotation_count(-PI + 1e-9), -1.0);
        assert_eq!(rotation_count(3.0 * PI + 1e-9), 1.0);
    }

    #[test]
    fn crossing_upward_vertical_flips_either_rod() {
        let eps = 1e-6;
        assert!(detect_flip(&state_with_angles(PI - eps, 0.0), &state_with_angles(PI + eps, 0.0)));
        assert!(detect_flip(&state_with_angles(0.0, PI - eps), &state_with_angles(0.0, PI + eps)));
        assert!(detect_flip(&state_with_angles(-PI + eps, 0.0), &state_with_angles(-PI - eps, 0.0)));
    }

    #[test]
    fn crossing_downward_vertical_does_not_flip() {
        assert!(!detect_flip(&state_with_angles(-0.1, 0.2), &state_with_angles(0.1, -0.2)));
        assert!(!detect_flip(&state_with_angles(-3.0, 3.0), &state_with_angles(3.0, -3.0)));
    }

    #[test]
    fn can_flip_follows_energy_bound() {
        assert!(!can_flip(1.0, 1.0, 0.0, 0.0));
        assert!(can_flip(1.0, 1.0, PI, 0.0));
        assert!(can_flip(1.0, 1.0, PI / 2.0, PI / 2.0));
    }

    #[test]
    fn short_circuit_returns_budget_without_integrating() {
        let fractal = Fractal::new(CountingPendulum::new(Variant::Simple));
        assert_eq!(fractal.steps_to_flip(0.1, -0.2, 500), 500);
        assert_eq!(fractal.pendulum().calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn exhausted_budget_returns_max_steps() {
        let fractal = Fractal::new(CountingPendulum::new(Variant::Compound));
        // Allowed by the energy bound but far too few steps to flip.
        assert_eq!(fractal.steps_to_flip(2.0, 2.0, 3), 3);
        assert_eq!(fractal.pendulum().calls.load(Ordering::Relaxed), 3 * 4);
    }

    /// First rod spinning at a constant 1 rad/s, second rod still.
    struct Spinner {
        params: PendulumParams,
    }

    impl DoublePendulum for Spinner {
        fn params(&self) -> &PendulumParams {
            &self.params
        }

        fn variant(&self) -> Variant {
            Variant::Simple
        }

        fn motion_equation(&self, _state: &StateVector) -> StateVector {
            StateVector::new(1.0, 0.0, 0.0, 0.0)
        }

        fn energy(&self, _state: &StateVector) -> f64 {
            0.0
        }
    }

    fn spinner() -> Fractal<Spinner> {
        Fractal::new(Spinner {
            params: PendulumParams::new(1.0, 1.0, 1.0, 1.0, 0.01),
        })
    }

    #[test]
    fn returns_index_of_step_that_crosses_the_vertical() {
        // a1 reaches π between the 51st and 52nd step.
        assert_eq!(spinner().steps_to_flip(PI - 0.505, 0.0, 1000), 50);
    }

    #[test]
    fn crossings_in_the_first_two_steps_are_ignored() {
        assert_eq!(spinner().steps_to_flip(PI - 0.005, 0.0, 100), 100);
        assert_eq!(spinner().steps_to_flip(PI - 0.015, 0.0, 100), 100);
        assert_eq!(spinner().steps_to_flip(PI - 0.025, 0.0, 100), 2);
    }

    #[test]
    fn flip_time_binds_the_budget() {
        let flip_time = Fractal::new(Pendulum::new(PendulumParams::default(), Variant::Simple))
            .flip_time(250);
        assert_eq!(flip_time.max_steps(), 250);
        assert_eq!(flip_time.evaluate(0.0, 0.0), 250.0);
        assert_eq!(flip_time.steps(0.3, 0.3), 250);
    }

    proptest! {
        #[test]
        fn no_flip_without_motion(a1 in -20.0f64..20.0, a2 in -20.0f64..20.0) {
            let state = state_with_angles(a1, a2);
            prop_assert!(!detect_flip(&state, &state));
        }

        #[test]
        fn small_moves_inside_a_turn_do_not_flip(
            turn in -5i32..5,
            offset in 0.01f64..6.27,
            delta in -0.005f64..0.005,
        ) {
            let base = PI + 2.0 * PI * f64::from(turn) + offset;
            let prev = state_with_angles(base, base);
            let curr = state_with_angles(base + delta, base - delta);
            prop_assert!(!detect_flip(&prev, &curr));
        }
    }
}
