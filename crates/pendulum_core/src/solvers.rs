use crate::state::StateVector;
use crate::traits::{DynamicalSystem, Steppable};

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug, Clone, Copy, Default)]
pub struct RK4;

impl RK4 {
    /// Advances `state` by one step of size `dt` along `system`.
    ///
    /// Non-finite values produced by the vector field are carried into the
    /// result unchanged.
    pub fn advance(state: StateVector, system: &impl DynamicalSystem, dt: f64) -> StateVector {
        // k1 = f(y)
        let k1 = system.apply(&state);

        // k2 = f(y + dt*k1/2)
        let k2 = system.apply(&(state + k1 * dt / 2.0));

        // k3 = f(y + dt*k2/2)
        let k3 = system.apply(&(state + k2 * dt / 2.0));

        // k4 = f(y + dt*k3)
        let k4 = system.apply(&(state + k3 * dt));

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        state + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * dt / 6.0
    }
}

impl Steppable for RK4 {
    fn step(&self, system: &impl DynamicalSystem, state: &StateVector, dt: f64) -> StateVector {
        RK4::advance(*state, system, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::RK4;
    use crate::state::StateVector;
    use crate::traits::Steppable;
    use proptest::prelude::*;

    fn assert_close(actual: StateVector, expected: StateVector, tol: f64) {
        for (a, e) in actual.to_array().iter().zip(expected.to_array()) {
            assert!((a - e).abs() <= tol, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn linear_decay_matches_exponential() {
        let decay = |s: &StateVector| *s * -1.0;
        let mut state = StateVector::new(1.0, 1.0, 1.0, 1.0);
        for _ in 0..100 {
            state = RK4.step(&decay, &state, 0.01);
        }
        let expected = (-1.0_f64).exp();
        assert_close(state, StateVector::new(expected, expected, expected, expected), 1e-9);
    }

    #[test]
    fn non_finite_derivatives_propagate() {
        let blow_up = |_: &StateVector| StateVector::new(f64::NAN, 0.0, f64::INFINITY, 0.0);
        let next = RK4::advance(StateVector::default(), &blow_up, 0.1);
        assert!(next.a1().is_nan());
        assert!(next.a2().is_infinite() || next.a2().is_nan());
        assert_eq!(next.w1(), 0.0);
    }

    #[test]
    fn advance_is_reproducible() {
        let field = |s: &StateVector| StateVector::new(s.w1(), -s.a1().sin(), s.w2(), -s.a2().sin());
        let start = StateVector::new(0.3, 0.1, -1.2, 0.0);
        let first = RK4::advance(start, &field, 0.01);
        let second = RK4::advance(start, &field, 0.01);
        assert_eq!(first.to_array().map(f64::to_bits), second.to_array().map(f64::to_bits));
    }

    proptest! {
        #[test]
        fn constant_field_steps_exactly(
            k in prop::array::uniform4(-10.0f64..10.0),
            y in prop::array::uniform4(-10.0f64..10.0),
            dt in 1e-4f64..0.5,
        ) {
            let rate = StateVector::from_array(k);
            let field = move |_: &StateVector| rate;
            let next = RK4::advance(StateVector::from_array(y), &field, dt);
            for i in 0..4 {
                let expected = y[i] + k[i] * dt;
                prop_assert!((next.to_array()[i] - expected).abs() < 1e-12);
            }
        }
    }
}
