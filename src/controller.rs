//! Control policies.
//!
//! The verifier treats a policy as an opaque map from state cell index to an
//! input vector. How that map was obtained (a trained network, a lookup table,
//! a hand-written law) is irrelevant here.

use crate::quantizer::Quantizer;
use crate::specification::ControlSpecification;
use crate::vector::Vector;

pub trait Controller: Sync {
    /// Input applied in the state cell `state_index`, or `None` if the policy
    /// does not cover that cell.
    fn control_action(&self, state_index: usize) -> Option<Vector>;

    fn specification(&self) -> &ControlSpecification;
}

/// Applies the same input everywhere.
#[derive(Debug, Clone)]
pub struct ConstantController {
    input: Vector,
    specification: ControlSpecification,
}

impl ConstantController {
    pub fn new(input: Vector, specification: ControlSpecification) -> Self {
        Self { input, specification }
    }
}

impl Controller for ConstantController {
    fn control_action(&self, _state_index: usize) -> Option<Vector> {
        Some(self.input.clone())
    }

    fn specification(&self) -> &ControlSpecification {
        &self.specification
    }
}

/// One precomputed input per state cell.
///
/// Cells past the end of the table have no action; the verifier reports them
/// as [`Error::MissingControlAction`][crate::error::Error::MissingControlAction].
#[derive(Debug, Clone)]
pub struct TableController {
    inputs: Vec<Vector>,
    specification: ControlSpecification,
}

impl TableController {
    pub fn new(inputs: Vec<Vector>, specification: ControlSpecification) -> Self {
        Self { inputs, specification }
    }

    /// Tabulates `law` at every cell center of `state_space`.
    pub fn from_fn(state_space: &Quantizer, specification: ControlSpecification, law: impl Fn(&Vector) -> Vector) -> Self {
        let inputs = (0..state_space.cardinality())
            .filter_map(|i| state_space.vector_from_index(i))
            .map(|x| law(&x))
            .collect();
        Self { inputs, specification }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Replaces the input of one cell, returning the previous one. Returns
    /// `None` and leaves the table unchanged if the cell is not tabulated.
    pub fn set(&mut self, state_index: usize, input: Vector) -> Option<Vector> {
        let slot = self.inputs.get_mut(state_index)?;
        Some(std::mem::replace(slot, input))
    }
}

impl Controller for TableController {
    fn control_action(&self, state_index: usize) -> Option<Vector> {
        self.inputs.get(state_index).cloned()
    }

    fn specification(&self) -> &ControlSpecification {
        &self.specification
    }
}
