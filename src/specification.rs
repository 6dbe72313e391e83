//! Control goals.

use std::fmt;

use crate::error::{Error, Result};
use crate::vector::Vector;

/// Temporal goal checked against the closed-loop abstraction.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Goal {
    /// Stay inside the target forever.
    Invariance,
    /// Eventually enter the target.
    Reachability,
    /// Eventually enter the target and stay there forever.
    ReachAndStay,
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Invariance => write!(f, "invariance"),
            Goal::Reachability => write!(f, "reachability"),
            Goal::ReachAndStay => write!(f, "reach-and-stay"),
        }
    }
}

/// A goal together with its target hyper-interval `[lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSpecification {
    goal: Goal,
    lower: Vector,
    upper: Vector,
}

impl ControlSpecification {
    pub fn new(goal: Goal, lower: Vector, upper: Vector) -> Result<Self> {
        if lower.dimension() == 0 {
            return Err(Error::ZeroDimension);
        }
        if lower.dimension() != upper.dimension() {
            return Err(Error::DimensionMismatch {
                expected: lower.dimension(),
                actual: upper.dimension(),
            });
        }
        for axis in 0..lower.dimension() {
            if !(lower[axis] <= upper[axis]) {
                return Err(Error::InvalidInterval {
                    axis,
                    lower: lower[axis],
                    upper: upper[axis],
                });
            }
        }
        Ok(Self { goal, lower, upper })
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }
    pub fn lower(&self) -> &Vector {
        &self.lower
    }
    pub fn upper(&self) -> &Vector {
        &self.upper
    }
    pub fn dimension(&self) -> usize {
        self.lower.dimension()
    }

    pub fn center(&self) -> Vector {
        &(&self.lower + &self.upper) * 0.5
    }

    /// Closed interval containment, axis by axis.
    pub fn contains(&self, v: &Vector) -> bool {
        v.dimension() == self.dimension() && (0..self.dimension()).all(|k| self.lower[k] <= v[k] && v[k] <= self.upper[k])
    }

    /// Same specification with a different goal.
    pub fn with_goal(&self, goal: Goal) -> Self {
        Self {
            goal,
            ..self.clone()
        }
    }
}
