//! Plant models.
//!
//! A [`Plant`] is described by two right-hand sides:
//!
//! - the **dynamics** `x' = f(x, u)`, and
//! - the **growth bound** `r' = g(r, u)`, a componentwise over-approximation
//!   of how fast a ball of radius `r` around a trajectory may expand.
//!
//! Both are integrated over one sampling period with the classical
//! fourth-order Runge-Kutta scheme. The integrator state is always passed in
//! explicitly and never stored in the plant, so a single plant can be shared
//! by all workers that materialize transitions concurrently.

use crate::error::{Error, Result};
use crate::vector::Vector;

/// Sampling period and number of Runge-Kutta sub-steps per period.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Integration {
    pub sampling_time: f64,
    pub steps: usize,
}

impl Default for Integration {
    fn default() -> Self {
        Self {
            sampling_time: 0.1,
            steps: 10,
        }
    }
}

/// Integrates `x' = f(x)` from `x0` over one sampling period.
pub fn runge_kutta4(f: impl Fn(&Vector) -> Vector, x0: &Vector, integration: Integration) -> Vector {
    let steps = integration.steps.max(1);
    let h = integration.sampling_time / steps as f64;
    let mut x = x0.clone();
    for _ in 0..steps {
        let k1 = f(&x);
        let k2 = f(&(&x + &(&k1 * (h / 2.0))));
        let k3 = f(&(&x + &(&k2 * (h / 2.0))));
        let k4 = f(&(&x + &(&k3 * h)));
        let slope = &(&k1 + &(&k2 * 2.0)) + &(&(&k3 * 2.0) + &k4);
        x = &x + &(&slope * (h / 6.0));
    }
    x
}

pub trait Plant: Sync {
    fn state_dimension(&self) -> usize;
    fn input_dimension(&self) -> usize;

    /// Right-hand side of the plant ODE.
    fn dynamics(&self, state: &Vector, input: &Vector) -> Vector;

    /// Right-hand side of the radial growth bound ODE.
    fn growth_bound(&self, radius: &Vector, input: &Vector) -> Vector;

    fn integration(&self) -> Integration;

    /// Whether the dynamics are affine in the state.
    ///
    /// Refined (hyperplane) transitions are only sound for linear plants.
    fn is_linear(&self) -> bool {
        false
    }

    /// State reached after one sampling period from `state` under `input`.
    fn evaluate_dynamics(&self, state: &Vector, input: &Vector) -> Vector {
        runge_kutta4(|x| self.dynamics(x, input), state, self.integration())
    }

    /// Radius reached after one sampling period from `radius` under `input`.
    fn evaluate_radial_growth_bound(&self, radius: &Vector, input: &Vector) -> Vector {
        runge_kutta4(|r| self.growth_bound(r, input), radius, self.integration())
    }
}

/// Linear time-invariant plant `x' = A x + B u`.
#[derive(Debug, Clone)]
pub struct LinearPlant {
    a: Vec<Vec<f64>>,
    b: Vec<Vec<f64>>,
    integration: Integration,
}

impl LinearPlant {
    /// Creates a plant from a `n x n` state matrix and a `n x m` input matrix.
    pub fn new(a: Vec<Vec<f64>>, b: Vec<Vec<f64>>, integration: Integration) -> Result<Self> {
        let n = a.len();
        if n == 0 {
            return Err(Error::ZeroDimension);
        }
        if let Some(row) = a.iter().find(|row| row.len() != n) {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: row.len(),
            });
        }
        if b.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: b.len(),
            });
        }
        let m = b[0].len();
        if let Some(row) = b.iter().find(|row| row.len() != m) {
            return Err(Error::DimensionMismatch {
                expected: m,
                actual: row.len(),
            });
        }
        Ok(Self { a, b, integration })
    }
}

impl Plant for LinearPlant {
    fn state_dimension(&self) -> usize {
        self.a.len()
    }

    fn input_dimension(&self) -> usize {
        self.b[0].len()
    }

    fn dynamics(&self, state: &Vector, input: &Vector) -> Vector {
        Vector::new(
            self.a
                .iter()
                .zip(&self.b)
                .map(|(a_row, b_row)| {
                    let ax: f64 = a_row.iter().zip(state.iter()).map(|(a, x)| a * x).sum();
                    let bu: f64 = b_row.iter().zip(input.iter()).map(|(b, u)| b * u).sum();
                    ax + bu
                })
                .collect(),
        )
    }

    /// Metzler majorant of `A`: the diagonal is kept, off-diagonal entries
    /// are replaced by their absolute values.
    fn growth_bound(&self, radius: &Vector, _input: &Vector) -> Vector {
        Vector::new(
            self.a
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    row.iter()
                        .enumerate()
                        .map(|(j, &a)| (if i == j { a } else { a.abs() }) * radius[j])
                        .sum()
                })
                .collect(),
        )
    }

    fn integration(&self) -> Integration {
        self.integration
    }

    fn is_linear(&self) -> bool {
        true
    }
}

/// Damped pendulum with a torque input.
///
/// ```text
/// theta' = omega
/// omega' = -(g/l) sin(theta) - damping * omega + u
/// ```
#[derive(Debug, Clone)]
pub struct Pendulum {
    pub gravity_over_length: f64,
    pub damping: f64,
    pub integration: Integration,
}

impl Default for Pendulum {
    fn default() -> Self {
        Self {
            gravity_over_length: 9.81,
            damping: 0.5,
            integration: Integration::default(),
        }
    }
}

impl Plant for Pendulum {
    fn state_dimension(&self) -> usize {
        2
    }

    fn input_dimension(&self) -> usize {
        1
    }

    fn dynamics(&self, state: &Vector, input: &Vector) -> Vector {
        Vector::from([
            state[1],
            -self.gravity_over_length * state[0].sin() - self.damping * state[1] + input[0],
        ])
    }

    fn growth_bound(&self, radius: &Vector, _input: &Vector) -> Vector {
        Vector::from([
            radius[1],
            self.gravity_over_length * radius[0] - self.damping * radius[1],
        ])
    }

    fn integration(&self) -> Integration {
        self.integration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oscillator() -> LinearPlant {
        LinearPlant::new(vec![vec![0.0, 1.0], vec![-1.0, -1.0]], vec![vec![0.0], vec![1.0]], Integration::default()).unwrap()
    }

    #[test]
    fn test_runge_kutta_exponential() {
        let integration = Integration {
            sampling_time: 1.0,
            steps: 100,
        };
        let x = runge_kutta4(|x| x.clone(), &Vector::from([1.0]), integration);
        assert!((x[0] - std::f64::consts::E).abs() < 1e-9);
    }

    #[test]
    fn test_linear_dynamics() {
        let plant = oscillator();
        assert_eq!(plant.state_dimension(), 2);
        assert_eq!(plant.input_dimension(), 1);
        assert!(plant.is_linear());

        let dx = plant.dynamics(&Vector::from([1.0, 2.0]), &Vector::from([0.5]));
        assert_eq!(dx, Vector::from([2.0, -2.5]));

        // The origin is an equilibrium under zero input.
        let x = plant.evaluate_dynamics(&Vector::zeros(2), &Vector::zeros(1));
        assert_eq!(x, Vector::zeros(2));
    }

    #[test]
    fn test_linear_growth_bound_is_metzler() {
        let plant = oscillator();
        let dr = plant.growth_bound(&Vector::from([1.0, 1.0]), &Vector::zeros(1));
        assert_eq!(dr, Vector::from([1.0, 0.0]));

        let r = plant.evaluate_radial_growth_bound(&Vector::from([0.05, 0.05]), &Vector::zeros(1));
        assert!(r[0] > 0.05);
    }

    #[test]
    fn test_linear_plant_validation() {
        let err = LinearPlant::new(vec![vec![0.0, 1.0]], vec![vec![1.0]], Integration::default()).unwrap_err();
        assert_eq!(err, Error::DimensionMismatch { expected: 1, actual: 2 });

        let err = LinearPlant::new(vec![], vec![], Integration::default()).unwrap_err();
        assert_eq!(err, Error::ZeroDimension);
    }

    #[test]
    fn test_pendulum() {
        let plant = Pendulum::default();
        assert!(!plant.is_linear());

        let down = plant.evaluate_dynamics(&Vector::zeros(2), &Vector::zeros(1));
        assert_eq!(down, Vector::zeros(2));

        let pushed = plant.evaluate_dynamics(&Vector::zeros(2), &Vector::from([1.0]));
        assert!(pushed[1] > 0.0);
    }
}
