//! Closed-loop verification by fixed-point iteration.
//!
//! A [`Verifier`] runs one cycle in two phases:
//!
//! 1. **Transition materialization** ([`Verifier::compute_transitions`]):
//!    the state cells are split into contiguous partitions, and every
//!    partition is handled by one rayon task. For each cell the task asks the
//!    controller for its input and computes the over-approximated transition
//!    under that input. Partitions own disjoint slices of the transition
//!    arena, so no locking is needed; the join is the phase barrier.
//! 2. **Winning set** ([`Verifier::compute_winning_set`]): single-threaded
//!    fixed-point iteration over a [`CellSet`], seeded with the cells whose
//!    center satisfies the specification.
//!
//! # Fixed point
//!
//! Each scan walks the cells in index order and updates the winning set in
//! place, so a cell examined later in a scan already sees the updates made
//! earlier in the same scan (Gauss-Seidel rather than Jacobi iteration).
//! Scans repeat until one changes nothing.
//!
//! - **Invariance**: a winning cell is removed unless its successors under
//!   the policy input are non-empty, all in the space, and all winning.
//! - **Reachability**: a losing cell is added if its successors are
//!   non-empty, all in the space, and all winning.
//! - **ReachAndStay**: invariance first, then reachability of the
//!   resulting invariant region.
//!
//! Only the single input chosen by the policy is considered: this checks a
//! fixed closed loop, it does not synthesize a controller.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;

use crate::abstraction::Abstraction;
use crate::cellset::CellSet;
use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::plant::Plant;
use crate::quantizer::Quantizer;
use crate::specification::{ControlSpecification, Goal};
use crate::transition::Transition;
use crate::types::Successor;
use crate::vector::Vector;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Idle,
    ComputingTransitions,
    ComputingWinningSet,
    Converged,
}

/// Verifier options.
///
/// ```
/// use abscheck_rs::verifier::VerifierConfig;
///
/// let config = VerifierConfig::default()
///     .with_refined_transitions(true)
///     .with_retained_transitions(false)
///     .with_workers(4);
/// assert_eq!(config.workers, Some(4));
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VerifierConfig {
    /// Enumerate successors by flood fill between evolved faces. Requires a
    /// linear plant.
    pub refined_transitions: bool,
    /// Keep computed transitions across materialization passes. Disable to
    /// bound memory on large grids.
    pub retain_transitions: bool,
    /// Number of partitions; defaults to the size of the rayon pool.
    pub workers: Option<usize>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            refined_transitions: false,
            retain_transitions: true,
            workers: None,
        }
    }
}

impl VerifierConfig {
    pub fn with_refined_transitions(mut self, refined: bool) -> Self {
        self.refined_transitions = refined;
        self
    }

    pub fn with_retained_transitions(mut self, retain: bool) -> Self {
        self.retain_transitions = retain;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
}

/// Winning-set size after every scan of every pass that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedPointReport {
    pub invariance: Vec<usize>,
    pub reachability: Vec<usize>,
}

impl FixedPointReport {
    pub fn scans(&self) -> usize {
        self.invariance.len() + self.reachability.len()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Statistics {
    pub winning: usize,
    pub cardinality: usize,
    pub transitions_computed: usize,
    pub completeness: f64,
}

impl Statistics {
    pub fn winning_percentage(&self) -> f64 {
        if self.cardinality == 0 {
            0.0
        } else {
            100.0 * self.winning as f64 / self.cardinality as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct Verifier {
    abstraction: Abstraction,
    config: VerifierConfig,
    phase: Phase,
    winning: CellSet,
    losing: Vec<usize>,
    losing_neighbors: Vec<usize>,
}

impl Verifier {
    /// Creates a verifier for `plant` over the given quantized spaces.
    ///
    /// Fails if the quantizers do not match the plant's dimensions, or if
    /// refined transitions are requested for a non-linear plant.
    pub fn new<P: Plant + ?Sized>(
        plant: &P,
        state_space: Quantizer,
        input_space: Quantizer,
        config: VerifierConfig,
    ) -> Result<Self> {
        if state_space.dimension() != plant.state_dimension() {
            return Err(Error::DimensionMismatch {
                expected: plant.state_dimension(),
                actual: state_space.dimension(),
            });
        }
        if input_space.dimension() != plant.input_dimension() {
            return Err(Error::DimensionMismatch {
                expected: plant.input_dimension(),
                actual: input_space.dimension(),
            });
        }
        if config.refined_transitions && !plant.is_linear() {
            return Err(Error::RefinedRequiresLinearPlant);
        }

        let cardinality = state_space.cardinality();
        Ok(Self {
            abstraction: Abstraction::new(state_space, input_space, config.refined_transitions),
            config,
            phase: Phase::Idle,
            winning: CellSet::new(cardinality),
            losing: Vec::new(),
            losing_neighbors: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn abstraction(&self) -> &Abstraction {
        &self.abstraction
    }

    pub fn state_space(&self) -> &Quantizer {
        self.abstraction.state_space()
    }

    fn partitions(&self) -> usize {
        self.config.workers.unwrap_or_else(rayon::current_num_threads).max(1)
    }

    /// Materializes the transition of every state cell under the input the
    /// controller chooses for it.
    pub fn compute_transitions<P, C>(&mut self, plant: &P, controller: &C) -> Result<()>
    where
        P: Plant + ?Sized,
        C: Controller + ?Sized,
    {
        self.phase = Phase::ComputingTransitions;
        if !self.config.retain_transitions {
            self.abstraction.clear_transitions();
        }

        let partitions = self.partitions();
        let (overapproximator, transitions) = self.abstraction.split_mut();
        let chunk = transitions.len().div_ceil(partitions).max(1);
        info!(
            "Computing transitions for {} cells in {} partitions of up to {} cells",
            transitions.len(),
            partitions,
            chunk
        );

        let result = transitions
            .par_chunks_mut(chunk)
            .enumerate()
            .try_for_each(|(partition, slice)| -> Result<()> {
                let offset = partition * chunk;
                for (k, transition) in slice.iter_mut().enumerate() {
                    let state = offset + k;
                    let input = controller
                        .control_action(state)
                        .ok_or(Error::MissingControlAction(state))?;
                    let input_index = overapproximator.compute(plant, state, &input, transition)?;
                    transition.select_input(input_index);
                }
                debug!("Partition {} done ({} cells)", partition, slice.len());
                Ok(())
            });

        if let Err(e) = result {
            self.reset_winning_set();
            return Err(e);
        }

        info!(
            "Transitions computed: {} (completeness {:.4})",
            self.abstraction.transitions_computed(),
            self.abstraction_completeness()
        );
        Ok(())
    }

    /// Computes the winning set of `specification` over the materialized
    /// transitions.
    pub fn compute_winning_set(&mut self, specification: &ControlSpecification) -> Result<FixedPointReport> {
        if self.phase == Phase::Idle {
            return Err(Error::TransitionsNotComputed);
        }
        let state_space = self.abstraction.state_space();
        if specification.dimension() != state_space.dimension() {
            return Err(Error::DimensionMismatch {
                expected: state_space.dimension(),
                actual: specification.dimension(),
            });
        }

        self.phase = Phase::ComputingWinningSet;
        let mut winning = CellSet::from_predicate(state_space.cardinality(), |i| {
            state_space
                .vector_from_index(i)
                .is_some_and(|x| specification.contains(&x))
        });
        info!(
            "Computing {} winning set from {} target cells",
            specification.goal(),
            winning.len()
        );

        let transitions = self.abstraction.transitions();
        let mut report = FixedPointReport::default();
        match specification.goal() {
            Goal::Invariance => {
                report.invariance = invariance_fixed_point(transitions, &mut winning);
            }
            Goal::Reachability => {
                report.reachability = reachability_fixed_point(transitions, &mut winning);
            }
            Goal::ReachAndStay => {
                report.invariance = invariance_fixed_point(transitions, &mut winning);
                report.reachability = reachability_fixed_point(transitions, &mut winning);
            }
        }

        self.winning = winning;
        self.update_losing_domains();
        self.phase = Phase::Converged;
        info!(
            "Winning set converged after {} scans: {} of {} cells ({:.2}%)",
            report.scans(),
            self.winning_set_size(),
            self.winning.universe(),
            self.winning_set_percentage()
        );
        Ok(report)
    }

    /// Runs both phases for `controller` against its own specification.
    pub fn verify<P, C>(&mut self, plant: &P, controller: &C) -> Result<FixedPointReport>
    where
        P: Plant + ?Sized,
        C: Controller + ?Sized,
    {
        self.compute_transitions(plant, controller)?;
        self.compute_winning_set(controller.specification())
    }

    /// Back to `Idle` with an empty winning set and no losing domains.
    fn reset_winning_set(&mut self) {
        self.phase = Phase::Idle;
        self.winning.clear();
        self.losing.clear();
        self.losing_neighbors.clear();
    }

    fn update_losing_domains(&mut self) {
        let state_space = self.abstraction.state_space();
        self.losing = self.winning.complement().iter().collect();

        let mut neighbors = CellSet::new(self.winning.universe());
        for &cell in &self.losing {
            neighbors.extend(
                state_space
                    .neighbors(cell)
                    .into_iter()
                    .filter(|&n| self.winning.contains(n)),
            );
        }
        self.losing_neighbors = neighbors.iter().collect();
        debug!(
            "{} losing cells, {} winning cells on the boundary",
            self.losing.len(),
            self.losing_neighbors.len()
        );
    }

    /// `false` for indices outside the state space.
    pub fn is_index_in_winning_set(&self, index: usize) -> bool {
        self.winning.contains(index)
    }

    pub fn winning_set(&self) -> &CellSet {
        &self.winning
    }

    pub fn winning_indices(&self) -> Vec<usize> {
        self.winning.iter().collect()
    }

    pub fn winning_set_size(&self) -> usize {
        self.winning.len()
    }

    pub fn winning_set_percentage(&self) -> f64 {
        self.statistics().winning_percentage()
    }

    pub fn losing_indices(&self) -> &[usize] {
        &self.losing
    }

    /// Winning cells adjacent to at least one losing cell.
    pub fn losing_neighbor_indices(&self) -> &[usize] {
        &self.losing_neighbors
    }

    fn sample_from<R: Rng + ?Sized>(&self, indices: &[usize], rng: &mut R) -> Vector {
        let state_space = self.abstraction.state_space();
        indices
            .choose(rng)
            .and_then(|&i| state_space.vector_from_index(i))
            .unwrap_or_else(|| state_space.random_vector(rng))
    }

    /// Center of a uniformly chosen losing cell, or a uniform random state if
    /// there is none.
    pub fn vector_from_losing_domain<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector {
        self.sample_from(&self.losing, rng)
    }

    /// Center of a uniformly chosen losing-neighbor cell, or a uniform random
    /// state if there is none.
    pub fn vector_from_losing_neighbor_domain<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector {
        self.sample_from(&self.losing_neighbors, rng)
    }

    /// Fraction of all (state, input) pairs whose transition is computed.
    pub fn abstraction_completeness(&self) -> f64 {
        let total = self.abstraction.state_space().cardinality() as f64 * self.abstraction.input_space().cardinality() as f64;
        self.abstraction.transitions_computed() as f64 / total
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            winning: self.winning_set_size(),
            cardinality: self.winning.universe(),
            transitions_computed: self.abstraction.transitions_computed(),
            completeness: self.abstraction_completeness(),
        }
    }
}

/// Whether the policy successors are non-empty, in the space and winning.
fn all_successors_winning(ends: Option<&[Successor]>, winning: &CellSet) -> bool {
    match ends {
        Some(ends) if !ends.is_empty() => ends
            .iter()
            .all(|end| end.index().is_some_and(|j| winning.contains(j))),
        _ => false,
    }
}

fn invariance_fixed_point(transitions: &[Transition], winning: &mut CellSet) -> Vec<usize> {
    let mut sizes = Vec::new();
    loop {
        let mut changed = false;
        for (cell, transition) in transitions.iter().enumerate() {
            if winning.contains(cell) && !all_successors_winning(transition.selected_ends(), winning) {
                winning.remove(cell);
                changed = true;
            }
        }
        sizes.push(winning.len());
        debug!("Invariance scan {}: {} winning", sizes.len(), winning.len());
        if !changed {
            return sizes;
        }
    }
}

fn reachability_fixed_point(transitions: &[Transition], winning: &mut CellSet) -> Vec<usize> {
    let mut sizes = Vec::new();
    loop {
        let mut changed = false;
        for (cell, transition) in transitions.iter().enumerate() {
            if !winning.contains(cell) && all_successors_winning(transition.selected_ends(), winning) {
                winning.insert(cell);
                changed = true;
            }
        }
        sizes.push(winning.len());
        debug!("Reachability scan {}: {} winning", sizes.len(), winning.len());
        if !changed {
            return sizes;
        }
    }
}
