//! Double pendulum models.
//!
//! Two rods: the first is pinned to the origin O at one end and to the second
//! rod at its other end A; the free end of the second rod is B. G1 and G2 are
//! the midpoints of the two rods. How the mass is distributed along the rods
//! is left to the concrete models:
//! - [`SimpleDoublePendulum`]: point masses at A and B.
//! - [`CompoundDoublePendulum`]: mass spread uniformly along each rod.
//!
//! Coordinates use a y axis pointing down, so the rest position of a rod is
//! at angle 0 and the upward vertical is at angle ±π.

use crate::error::ConfigError;
use crate::solvers::RK4;
use crate::state::StateVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical and integration parameters shared by every pendulum model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumParams {
    /// Masses of the rods [kg].
    pub m1: f64,
    pub m2: f64,
    /// Lengths of the rods [m].
    pub l1: f64,
    pub l2: f64,
    /// Integration time step [s].
    pub dt: f64,
    /// Gravitational acceleration [m/s^2].
    pub g: f64,
}

impl PendulumParams {
    pub const STANDARD_GRAVITY: f64 = 9.81;

    /// Parameters under standard gravity.
    pub fn new(m1: f64, m2: f64, l1: f64, l2: f64, dt: f64) -> Self {
        Self {
            m1,
            m2,
            l1,
            l2,
            dt,
            g: Self::STANDARD_GRAVITY,
        }
    }

    pub fn with_gravity(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    /// Checks the parameters describe a physical system that can be integrated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("M1", self.m1), ("M2", self.m2), ("L1", self.l1), ("L2", self.l2)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(name, "must be positive and finite"));
            }
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::invalid("dt", "must be positive and finite"));
        }
        if !self.g.is_finite() {
            return Err(ConfigError::invalid("g", "must be finite"));
        }
        Ok(())
    }
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0, 0.001)
    }
}

/// Mass distribution of a double pendulum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Simple,
    Compound,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Simple => "simple",
            Variant::Compound => "compound",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Variant::Simple),
            "compound" => Ok(Variant::Compound),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }
}

/// Positions (or velocities) of the notable points of the pendulum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PendulumPoints {
    pub origin: [f64; 2],
    pub g1: [f64; 2],
    pub a: [f64; 2],
    pub g2: [f64; 2],
    pub b: [f64; 2],
}

impl PendulumPoints {
    fn from_joints(a: [f64; 2], b: [f64; 2]) -> Self {
        Self {
            origin: [0.0, 0.0],
            g1: [a[0] / 2.0, a[1] / 2.0],
            a,
            g2: [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0],
            b,
        }
    }
}

/// Behaviour shared by every double pendulum model.
pub trait DoublePendulum {
    fn params(&self) -> &PendulumParams;

    fn variant(&self) -> Variant;

    /// Equation of motion in state form: returns dy/dt at `state`.
    fn motion_equation(&self, state: &StateVector) -> StateVector;

    /// Total mechanical energy of the system at `state`.
    fn energy(&self, state: &StateVector) -> f64;

    /// Integrates the motion over one time step with RK4.
    fn next_state(&self, state: &StateVector) -> StateVector {
        RK4::advance(
            *state,
            &|y: &StateVector| self.motion_equation(y),
            self.params().dt,
        )
    }

    fn cartesian_coordinates(&self, state: &StateVector) -> PendulumPoints {
        let p = self.params();
        let a = [p.l1 * state.a1().sin(), p.l1 * state.a1().cos()];
        let b = [
            a[0] + p.l2 * state.a2().sin(),
            a[1] + p.l2 * state.a2().cos(),
        ];
        PendulumPoints::from_joints(a, b)
    }

    fn cartesian_velocities(&self, state: &StateVector) -> PendulumPoints {
        let p = self.params();
        let a = [
            p.l1 * state.a1().cos() * state.w1(),
            -p.l1 * state.a1().sin() * state.w1(),
        ];
        let b = [
            a[0] + p.l2 * state.a2().cos() * state.w2(),
            a[1] - p.l2 * state.a2().sin() * state.w2(),
        ];
        PendulumPoints::from_joints(a, b)
    }
}

fn speed_squared(v: [f64; 2]) -> f64 {
    v[0] * v[0] + v[1] * v[1]
}

/// Double pendulum with the masses concentrated at the far end of each rod.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleDoublePendulum {
    params: PendulumParams,
}

impl SimpleDoublePendulum {
    pub fn new(params: PendulumParams) -> Self {
        Self { params }
    }
}

impl DoublePendulum for SimpleDoublePendulum {
    fn params(&self) -> &PendulumParams {
        &self.params
    }

    fn variant(&self) -> Variant {
        Variant::Simple
    }

    // Point-mass equations, with delta = a2 - a1.
    fn motion_equation(&self, y: &StateVector) -> StateVector {
        let PendulumParams { m1, m2, l1, l2, g, .. } = self.params;
        let delta = y.a2() - y.a1();
        let (sin_d, cos_d) = delta.sin_cos();
        let total = m1 + m2;

        let dw1 = (m2 * l1 * cos_d * sin_d * y.w1().powi(2)
            + m2 * l2 * sin_d * y.w2().powi(2)
            - total * g * y.a1().sin()
            + m2 * g * cos_d * y.a2().sin())
            / (total * l1 - m2 * l1 * cos_d.powi(2));

        let dw2 = (-total * l1 * sin_d * y.w1().powi(2)
            - m2 * l2 * cos_d * sin_d * y.w2().powi(2)
            + total * g * cos_d * y.a1().sin()
            - total * g * y.a2().sin())
            / (total * l2 - m2 * l2 * cos_d.powi(2));

        StateVector::new(y.w1(), dw1, y.w2(), dw2)
    }

    fn energy(&self, state: &StateVector) -> f64 {
        let PendulumParams { m1, m2, l1, l2, g, .. } = self.params;
        let coords = self.cartesian_coordinates(state);
        let vel = self.cartesian_velocities(state);

        // The center of mass of each rod is its far end; point masses carry
        // no rotational inertia.
        let base = m1 * g * l1 + m2 * g * l2;
        let potential = -m1 * g * coords.a[1] - m2 * g * coords.b[1];
        let kinetic = m1 * speed_squared(vel.a) / 2.0 + m2 * speed_squared(vel.b) / 2.0;

        base + potential + kinetic
    }
}

/// Double pendulum whose rods have their mass spread uniformly along them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundDoublePendulum {
    params: PendulumParams,
    // Lagrangian coefficients: L = c0*w1^2 + c1*w2^2 + c2*w1*w2*cos(a1-a2)
    //                              + c3*cos(a1) + c4*cos(a2)
    c: [f64; 5],
}

impl CompoundDoublePendulum {
    pub fn new(params: PendulumParams) -> Self {
        let PendulumParams { m1, m2, l1, l2, g, .. } = params;
        let c = [
            m1 * (l1 / 2.0).powi(2) / 2.0 + m1 * l1.powi(2) / 12.0 / 2.0 + m2 * l1.powi(2) / 2.0,
            m2 * (l2 / 2.0).powi(2) / 2.0 + m2 * l2.powi(2) / 12.0 / 2.0,
            m2 * l1 * l2 / 2.0,
            g * (m1 * l1 / 2.0 + m2 * l1),
            g * m2 * l2 / 2.0,
        ];
        Self { params, c }
    }
}

impl DoublePendulum for CompoundDoublePendulum {
    fn params(&self) -> &PendulumParams {
        &self.params
    }

    fn variant(&self) -> Variant {
        Variant::Compound
    }

    // Euler-Lagrange equations of the Lagrangian above, solved for dw1 and dw2.
    fn motion_equation(&self, y: &StateVector) -> StateVector {
        let [c0, c1, c2, c3, c4] = self.c;
        let delta = y.a1() - y.a2();
        let (sin_d, cos_d) = delta.sin_cos();
        let denom = c2.powi(2) * cos_d.powi(2) - 4.0 * c0 * c1;

        let dw1 = (2.0 * c1 * c3 * y.a1().sin()
            + c2.powi(2) * y.w1().powi(2) * sin_d * cos_d
            + 2.0 * c1 * c2 * y.w2().powi(2) * sin_d
            - c2 * c4 * cos_d * y.a2().sin())
            / denom;

        let dw2 = (2.0 * c0 * c4 * y.a2().sin()
            - c2.powi(2) * y.w2().powi(2) * sin_d * cos_d
            - 2.0 * c0 * c2 * y.w1().powi(2) * sin_d
            - c2 * c3 * cos_d * y.a1().sin())
            / denom;

        StateVector::new(y.w1(), dw1, y.w2(), dw2)
    }

    fn energy(&self, state: &StateVector) -> f64 {
        let PendulumParams { m1, m2, l1, l2, g, .. } = self.params;
        let coords = self.cartesian_coordinates(state);
        let vel = self.cartesian_velocities(state);

        // The center of mass of each rod is its midpoint.
        let base = m1 * g * l1 + m2 * g * l2;
        let potential = -m1 * g * coords.g1[1] - m2 * g * coords.g2[1];
        let translational = m1 * speed_squared(vel.g1) / 2.0 + m2 * speed_squared(vel.g2) / 2.0;
        let rotational = m1 * l1.powi(2) / 12.0 * state.w1().powi(2) / 2.0
            + m2 * l2.powi(2) / 12.0 * state.w2().powi(2) / 2.0;

        base + potential + translational + rotational
    }
}

/// A double pendulum of either variant, chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pendulum {
    Simple(SimpleDoublePendulum),
    Compound(CompoundDoublePendulum),
}

impl Pendulum {
    pub fn new(params: PendulumParams, variant: Variant) -> Self {
        match variant {
            Variant::Simple => Pendulum::Simple(SimpleDoublePendulum::new(params)),
            Variant::Compound => Pendulum::Compound(CompoundDoublePendulum::new(params)),
        }
    }
}

impl DoublePendulum for Pendulum {
    fn params(&self) -> &PendulumParams {
        match self {
            Pendulum::Simple(p) => p.params(),
            Pendulum::Compound(p) => p.params(),
        }
    }

    fn variant(&self) -> Variant {
        match self {
            Pendulum::Simple(_) => Variant::Simple,
            Pendulum::Compound(_) => Variant::Compound,
        }
    }

    fn motion_equation(&self, state: &StateVector) -> StateVector {
        match self {
            Pendulum::Simple(p) => p.motion_equation(state),
            Pendulum::Compound(p) => p.motion_equation(state),
        }
    }

    fn energy(&self, state: &StateVector) -> f64 {
        match self {
            Pendulum::Simple(p) => p.energy(state),
            Pendulum::Compound(p) => p.energy(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CompoundDoublePendulum, DoublePendulum, Pendulum, PendulumParams, SimpleDoublePendulum,
        Variant,
    };
    use crate::error::ConfigError;
    use crate::state::StateVector;

    fn energy_drift(pendulum: &impl DoublePendulum, start: StateVector, steps: usize) -> f64 {
        let initial = pendulum.energy(&start);
        let mut state = start;
        let mut worst: f64 = 0.0;
        for _ in 0..steps {
            state = pendulum.next_state(&state);
            worst = worst.max((pendulum.energy(&state) - initial).abs());
        }
        worst / initial.abs()
    }

    #[test]
    fn variant_round_trips_through_strings() {
        for variant in [Variant::Simple, Variant::Compound] {
            assert_eq!(variant.to_string().parse::<Variant>(), Ok(variant));
        }
        assert_eq!(
            "triple".parse::<Variant>(),
            Err(ConfigError::UnknownVariant("triple".to_string()))
        );
    }

    #[test]
    fn validate_rejects_non_physical_parameters() {
        assert!(PendulumParams::default().validate().is_ok());
        let err = PendulumParams::new(0.0, 1.0, 1.0, 1.0, 0.01)
            .validate()
            .expect_err("zero mass should be rejected");
        assert!(err.to_string().contains("M1"));
        let err = PendulumParams::new(1.0, 1.0, 1.0, 1.0, -0.01)
            .validate()
            .expect_err("negative dt should be rejected");
        assert!(err.to_string().contains("dt"));
        let err = PendulumParams::default()
            .with_gravity(f64::NAN)
            .validate()
            .expect_err("NaN gravity should be rejected");
        assert!(err.to_string().contains("g"));
    }

    #[test]
    fn resting_pendulum_stays_at_rest() {
        let params = PendulumParams::default();
        for pendulum in [
            Pendulum::new(params, Variant::Simple),
            Pendulum::new(params, Variant::Compound),
        ] {
            let rate = pendulum.motion_equation(&StateVector::default());
            assert_eq!(rate.to_array(), [0.0, 0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn simple_energy_conserved_over_integration() {
        let pendulum = SimpleDoublePendulum::new(PendulumParams::default());
        let drift = energy_drift(&pendulum, StateVector::at_rest(2.0, 1.0), 1000);
        assert!(drift < 0.01, "relative drift {drift}");
    }

    #[test]
    fn compound_energy_conserved_over_integration() {
        let pendulum = CompoundDoublePendulum::new(PendulumParams::new(1.0, 2.0, 1.5, 1.0, 0.001));
        let drift = energy_drift(&pendulum, StateVector::at_rest(2.0, -1.0), 1000);
        assert!(drift < 0.01, "relative drift {drift}");
    }

    #[test]
    fn energy_conserved_with_initial_velocity() {
        let pendulum = Pendulum::new(PendulumParams::default(), Variant::Simple);
        let drift = energy_drift(&pendulum, StateVector::new(0.5, 3.0, -0.5, -2.0), 1000);
        assert!(drift < 0.01, "relative drift {drift}");
    }

    #[test]
    fn cartesian_coordinates_place_rods_end_to_end() {
        let pendulum = SimpleDoublePendulum::new(PendulumParams::new(1.0, 1.0, 2.0, 1.0, 0.01));
        let half_pi = std::f64::consts::FRAC_PI_2;
        let coords = pendulum.cartesian_coordinates(&StateVector::at_rest(half_pi, 0.0));
        assert!((coords.a[0] - 2.0).abs() < 1e-12);
        assert!(coords.a[1].abs() < 1e-12);
        assert!((coords.b[0] - 2.0).abs() < 1e-12);
        assert!((coords.b[1] - 1.0).abs() < 1e-12);
        assert!((coords.g2[1] - 0.5).abs() < 1e-12);
        assert_eq!(coords.origin, [0.0, 0.0]);
    }

    #[test]
    fn horizontal_rods_at_rest_carry_baseline_energy() {
        // Joints level with the pivot contribute no potential term.
        let params = PendulumParams::default();
        let pendulum = SimpleDoublePendulum::new(params);
        let half_pi = std::f64::consts::FRAC_PI_2;
        let energy = pendulum.energy(&StateVector::at_rest(half_pi, half_pi));
        let expected = params.m1 * params.g * params.l1 + params.m2 * params.g * params.l2;
        assert!((energy - expected).abs() < 1e-9);
    }

    #[test]
    fn enum_dispatch_matches_concrete_models() {
        let params = PendulumParams::new(1.0, 0.5, 1.2, 0.8, 0.01);
        let state = StateVector::new(0.4, 0.2, -1.1, 0.7);
        let simple = SimpleDoublePendulum::new(params);
        let compound = CompoundDoublePendulum::new(params);
        assert_eq!(
            Pendulum::new(params, Variant::Simple).next_state(&state),
            simple.next_state(&state)
        );
        assert_eq!(
            Pendulum::new(params, Variant::Compound).energy(&state),
            compound.energy(&state)
        );
        assert_eq!(Pendulum::new(params, Variant::Compound).variant(), Variant::Compound);
    }
}
