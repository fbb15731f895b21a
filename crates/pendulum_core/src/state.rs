use nalgebra::Vector4;
use std::ops::{Add, Div, Mul, Sub};

/// State of a double pendulum: angle and angular velocity of each rod.
///
/// Components are stored in the order `[a1, w1, a2, w2]`. Angles are measured
/// from the downward vertical, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateVector(Vector4<f64>);

impl StateVector {
    pub fn new(a1: f64, w1: f64, a2: f64, w2: f64) -> Self {
        Self(Vector4::new(a1, w1, a2, w2))
    }

    /// Both rods at the given angles with zero angular velocity.
    pub fn at_rest(a1: f64, a2: f64) -> Self {
        Self::new(a1, 0.0, a2, 0.0)
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self(Vector4::from(values))
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }

    pub fn a1(&self) -> f64 {
        self.0[0]
    }

    pub fn w1(&self) -> f64 {
        self.0[1]
    }

    pub fn a2(&self) -> f64 {
        self.0[2]
    }

    pub fn w2(&self) -> f64 {
        self.0[3]
    }
}

impl From<[f64; 4]> for StateVector {
    fn from(values: [f64; 4]) -> Self {
        Self::from_array(values)
    }
}

// Member by member operations between state vectors.

impl Add for StateVector {
    type Output = StateVector;

    fn add(self, rhs: StateVector) -> StateVector {
        StateVector(self.0 + rhs.0)
    }
}

impl Sub for StateVector {
    type Output = StateVector;

    fn sub(self, rhs: StateVector) -> StateVector {
        StateVector(self.0 - rhs.0)
    }
}

impl Mul for StateVector {
    type Output = StateVector;

    fn mul(self, rhs: StateVector) -> StateVector {
        StateVector(self.0.component_mul(&rhs.0))
    }
}

impl Div for StateVector {
    type Output = StateVector;

    fn div(self, rhs: StateVector) -> StateVector {
        StateVector(self.0.component_div(&rhs.0))
    }
}

// Componentwise arithmetic with a scalar.

impl Add<f64> for StateVector {
    type Output = StateVector;

    fn add(self, rhs: f64) -> StateVector {
        StateVector(self.0.add_scalar(rhs))
    }
}

impl Sub<f64> for StateVector {
    type Output = StateVector;

    fn sub(self, rhs: f64) -> StateVector {
        StateVector(self.0.add_scalar(-rhs))
    }
}

impl Mul<f64> for StateVector {
    type Output = StateVector;

    fn mul(self, rhs: f64) -> StateVector {
        StateVector(self.0 * rhs)
    }
}

impl Div<f64> for StateVector {
    type Output = StateVector;

    fn div(self, rhs: f64) -> StateVector {
        StateVector(self.0 / rhs)
    }
}
