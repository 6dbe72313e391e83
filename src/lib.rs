//! # abscheck-rs: abstraction-based verification of control policies
//!
//! **`abscheck-rs`** checks whether a discrete-time control policy satisfies an
//! invariance, reachability or reach-and-stay goal over a bounded continuous
//! state space, and reports the set of grid cells where it provably does.
//!
//! ## How it works
//!
//! The state and input spaces are cut into uniform grids by a
//! [`Quantizer`][crate::quantizer::Quantizer]. For every state cell, the
//! policy's input is applied to the plant and the one-step image of the
//! *whole cell* is over-approximated, either by a bounding hyper-rectangle or,
//! for linear plants, by flood-filling the cells between the evolved faces.
//! This yields a finite transition system that contains every behavior of the
//! real closed loop. A fixed-point iteration over that system then computes
//! the **winning set**: the cells from which the goal is guaranteed.
//!
//! ## Key Features
//!
//! - **Conservative**: any part of an image that leaves the state space is an
//!   explicit [`Successor::OutOfSpace`][crate::types::Successor::OutOfSpace],
//!   never a silently dropped transition.
//! - **Parallel**: transitions are materialized by rayon tasks over disjoint
//!   slices of the transition arena.
//! - **Memoized**: each (state cell, input cell) pair is computed at most once,
//!   so re-verifying an improved policy only pays for the inputs that changed.
//!
//! ## Basic Usage
//!
//! ```rust
//! use abscheck_rs::controller::ConstantController;
//! use abscheck_rs::plant::{Integration, LinearPlant};
//! use abscheck_rs::quantizer::Quantizer;
//! use abscheck_rs::specification::{ControlSpecification, Goal};
//! use abscheck_rs::vector::Vector;
//! use abscheck_rs::verifier::{Verifier, VerifierConfig};
//!
//! // 1. A damped oscillator x'' = -x - x' + u
//! let plant = LinearPlant::new(
//!     vec![vec![0.0, 1.0], vec![-1.0, -1.0]],
//!     vec![vec![0.0], vec![1.0]],
//!     Integration::default(),
//! )
//! .unwrap();
//!
//! // 2. Quantize states and inputs
//! let states = Quantizer::new([-2.0, -2.0].into(), [2.0, 2.0].into(), [0.2, 0.2].into()).unwrap();
//! let inputs = Quantizer::new([-0.5].into(), [0.5].into(), [1.0].into()).unwrap();
//!
//! // 3. The policy: always apply zero input, and try to stay in [-1, 1]^2
//! let spec = ControlSpecification::new(Goal::Invariance, [-1.0, -1.0].into(), [1.0, 1.0].into()).unwrap();
//! let policy = ConstantController::new(Vector::zeros(1), spec);
//!
//! // 4. Verify
//! let mut verifier = Verifier::new(&plant, states, inputs, VerifierConfig::default()).unwrap();
//! let report = verifier.verify(&plant, &policy).unwrap();
//! assert!(report.invariance.windows(2).all(|w| w[0] >= w[1]));
//! println!("winning: {:.1}%", verifier.winning_set_percentage());
//! ```
//!
//! ## Core Components
//!
//! - **[`quantizer`]**: grid geometry and the cell-index bijection.
//! - **[`abstraction`]**: over-approximated transition construction.
//! - **[`verifier`]**: parallel materialization and the fixed point.
//! - **[`plant`]** and **[`controller`]**: the plant and policy interfaces.

pub mod abstraction;
pub mod cellset;
pub mod controller;
pub mod error;
pub mod hyperplane;
pub mod plant;
pub mod quantizer;
pub mod specification;
pub mod transition;
pub mod types;
pub mod vector;
pub mod verifier;
