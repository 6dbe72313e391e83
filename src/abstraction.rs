//! Over-approximated abstract transitions.
//!
//! For a state cell and an input, the plant's one-step image of the whole cell
//! is over-approximated and every grid cell it may touch becomes a successor.
//!
//! # Algorithm
//!
//! 1. Evolve the cell center. If it leaves the state space the transition is
//!    `{OutOfSpace}` and nothing else is computed.
//! 2. Over-approximate the evolved cell:
//!    - **linear plant**: evolve all `2^d` vertices. In refined mode,
//!      additionally build one [`Hyperplane`] per face and push it forward.
//!    - **non-linear plant**: evolve the center only and inflate it by the
//!      radial growth bound of half a cell, giving an axis-aligned hull.
//! 3. If any evolved vertex leaves the state space, the transition is
//!    `{OutOfSpace}`.
//! 4. Record the tight axis-aligned bound of the evolved vertices.
//! 5. Enumerate successors, either by flood fill between the hyperplanes
//!    (refined, linear) or by filling the bounding hyper-rectangle.
//!
//! The flood fill follows a rotated or sheared image much more closely than
//! its bounding box, at the cost of extra plant evaluations per cell.
//!
//! # Storage
//!
//! [`Abstraction`] owns one [`Transition`] per state cell. Each
//! (state, input) pair is computed at most once. The read-only part of the
//! abstraction ([`Overapproximator`]) is separate from the transition arena,
//! so disjoint slices of the arena can be filled concurrently.

use std::collections::{HashSet, VecDeque};

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::hyperplane::Hyperplane;
use crate::plant::Plant;
use crate::quantizer::Quantizer;
use crate::transition::{Image, Transition};
use crate::types::Successor;
use crate::vector::Vector;

/// One face of a cell: the vertices whose coordinate on `axis` lies on the
/// `direction` side of the center.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub axis: usize,
    pub direction: f64,
    pub vertices: Vec<usize>,
}

/// Assignment of the canonically ordered cell vertices to faces, computed once
/// per dimension.
///
/// Also records, for every vertex, the per-axis sign of its offset from the
/// center, which is the direction the radial growth bound inflates it in.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDistribution {
    faces: Vec<Face>,
    signs: Vec<Vector>,
}

impl FaceDistribution {
    pub fn new(dimension: usize) -> Self {
        let vertex_count = 1usize << dimension;
        let mut faces = Vec::with_capacity(2 * dimension);
        for axis in 0..dimension {
            for direction in [1.0, -1.0] {
                let vertices = (0..vertex_count)
                    .filter(|&j| (j & (1 << axis) != 0) == (direction > 0.0))
                    .collect();
                faces.push(Face {
                    axis,
                    direction,
                    vertices,
                });
            }
        }
        let signs = (0..vertex_count)
            .map(|j| Vector::new((0..dimension).map(|k| if j & (1 << k) != 0 { 1.0 } else { -1.0 }).collect()))
            .collect();
        Self { faces, signs }
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn signs(&self) -> &[Vector] {
        &self.signs
    }
}

/// Evolved cell: vertex images, plus the pushed-forward faces in refined mode.
#[derive(Debug, Clone)]
pub struct Evolution {
    pub vertices: Vec<Vector>,
    pub hyperplanes: Option<Vec<Hyperplane>>,
}

impl Evolution {
    /// Tight axis-aligned bound `(lower, upper)` of the evolved vertices.
    pub fn bounds(&self) -> Option<(Vector, Vector)> {
        let first = self.vertices.first()?;
        let init = (first.clone(), first.clone());
        Some(self.vertices[1..].iter().fold(init, |(lower, upper), v| {
            (lower.component_min(v), upper.component_max(v))
        }))
    }
}

/// Read-only half of the abstraction: quantizers, mode and face layout.
#[derive(Debug, Clone)]
pub struct Overapproximator {
    state_space: Quantizer,
    input_space: Quantizer,
    refined: bool,
    faces: FaceDistribution,
}

impl Overapproximator {
    fn new(state_space: Quantizer, input_space: Quantizer, refined: bool) -> Self {
        let faces = FaceDistribution::new(state_space.dimension());
        Self {
            state_space,
            input_space,
            refined,
            faces,
        }
    }

    pub fn state_space(&self) -> &Quantizer {
        &self.state_space
    }

    pub fn input_space(&self) -> &Quantizer {
        &self.input_space
    }

    pub fn face_distribution(&self) -> &FaceDistribution {
        &self.faces
    }

    /// Input cell index of `input`.
    pub fn input_index(&self, input: &Vector) -> Result<usize> {
        self.input_space
            .index_from_vector(input)
            .ok_or_else(|| Error::InputOutOfSpace(input.to_string()))
    }

    /// Computes the image of `state_index` under `input` into `transition`,
    /// unless it is already there. Returns the input cell index.
    pub fn compute<P: Plant + ?Sized>(
        &self,
        plant: &P,
        state_index: usize,
        input: &Vector,
        transition: &mut Transition,
    ) -> Result<usize> {
        let input_index = self.input_index(input)?;
        if transition.is_processed(input_index) {
            return Ok(input_index);
        }

        let center = self
            .state_space
            .vector_from_index(state_index)
            .ok_or(Error::IndexOutOfRange {
                index: state_index,
                cardinality: self.state_space.cardinality(),
            })?;
        // Evaluate at the input cell center so the memoized image does not
        // depend on where inside the input cell the policy's output fell.
        let input = self
            .input_space
            .vector_from_index(input_index)
            .ok_or(Error::IndexOutOfRange {
                index: input_index,
                cardinality: self.input_space.cardinality(),
            })?;

        let image = self.image(plant, &center, &input);
        trace!("cell {} under input {}: {} successors", state_index, input_index, image.ends().len());
        transition.record(input_index, image);
        Ok(input_index)
    }

    fn image<P: Plant + ?Sized>(&self, plant: &P, center: &Vector, input: &Vector) -> Image {
        let post = plant.evaluate_dynamics(center, input);
        if !self.state_space.is_in_closed_bounds(&post) {
            return Image::out_of_space(post);
        }

        // Cells are closed boxes here: a vertex on `upper` is still inside.
        let evolution = self.over_approximate_evolution(plant, center, &post, input);
        if evolution.vertices.iter().any(|v| !self.state_space.is_in_closed_bounds(v)) {
            return Image::out_of_space(post);
        }
        let Some((lower, upper)) = evolution.bounds() else {
            return Image::out_of_space(post);
        };

        let ends = match &evolution.hyperplanes {
            Some(hyperplanes) => self.floodfill_between_hyperplanes(&post, hyperplanes, &lower, &upper),
            None => self.fill_hyper_rectangle_between_bounds(&lower, &upper),
        };

        let mut image = Image::new(post);
        for end in ends {
            image.add_end(end);
        }
        image.set_bounds(lower, upper);
        image
    }

    /// Whether successors of a linear plant are enumerated by flood fill.
    fn uses_hyperplanes<P: Plant + ?Sized>(&self, plant: &P) -> bool {
        self.refined && plant.is_linear()
    }

    /// Over-approximates the image of the cell centered at `center`, whose
    /// center evolves to `post`.
    pub fn over_approximate_evolution<P: Plant + ?Sized>(
        &self,
        plant: &P,
        center: &Vector,
        post: &Vector,
        input: &Vector,
    ) -> Evolution {
        if !plant.is_linear() {
            let half_cell = self.state_space.eta() * 0.5;
            let radius = plant.evaluate_radial_growth_bound(&half_cell, input);
            let vertices = self
                .faces
                .signs()
                .iter()
                .map(|sign| post + &sign.component_mul(&radius))
                .collect();
            return Evolution {
                vertices,
                hyperplanes: None,
            };
        }

        let cell_vertices = self.state_space.cell_vertices(center);
        let vertices = cell_vertices.iter().map(|v| plant.evaluate_dynamics(v, input)).collect();

        let hyperplanes = self.uses_hyperplanes(plant).then(|| {
            let dimension = self.state_space.dimension();
            self.faces
                .faces()
                .iter()
                .map(|face| {
                    let points = face.vertices.iter().map(|&j| cell_vertices[j].clone()).collect();
                    let mut plane = Hyperplane::new(points);
                    plane.set_normal(Vector::axis(dimension, face.axis, face.direction), center);
                    plane.over_approximate_normal(plant, input);
                    plane
                })
                .collect()
        });

        Evolution { vertices, hyperplanes }
    }

    fn axis_box_contains(low: &[usize], high: &[usize], axes: &[usize]) -> bool {
        axes.iter()
            .zip(low.iter().zip(high))
            .all(|(a, (l, h))| l <= a && a <= h)
    }

    /// Whether some vertex of `cell` lies inside every half-space.
    fn intersects(&self, cell: usize, hyperplanes: &[Hyperplane]) -> bool {
        self.state_space
            .cell_vertices_from_index(cell)
            .is_some_and(|vertices| {
                vertices
                    .iter()
                    .any(|v| hyperplanes.iter().all(|plane| plane.is_point_on_internal_side(v)))
            })
    }

    /// Breadth-first flood fill from the cell of `post` over axis neighbors.
    ///
    /// A cell is accepted, and expanded, if it is the seed or one of its
    /// vertices lies on the internal side of every hyperplane. Candidates are
    /// restricted to the cells overlapped by `[lower, upper]`.
    pub fn floodfill_between_hyperplanes(
        &self,
        post: &Vector,
        hyperplanes: &[Hyperplane],
        lower: &Vector,
        upper: &Vector,
    ) -> Vec<Successor> {
        let q = &self.state_space;
        let Some((low, high)) = q.axis_box_from_bounds(lower, upper) else {
            return vec![Successor::OutOfSpace];
        };

        // Rounding may put the evolved center a hair outside its own bound.
        let seed_axes: Vec<usize> = q
            .nearest_axis_indices(post)
            .iter()
            .zip(low.iter().zip(&high))
            .map(|(&a, (&l, &h))| a.clamp(l, h))
            .collect();
        let Some(seed) = q.index_from_axis_indices(&seed_axes) else {
            return vec![Successor::OutOfSpace];
        };

        let mut ends = Vec::new();
        let mut visited = HashSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        while let Some(cell) = queue.pop_front() {
            if cell != seed && !self.intersects(cell, hyperplanes) {
                continue;
            }
            ends.push(Successor::InBounds(cell));
            for neighbor in q.neighbors(cell) {
                let inside = q
                    .axis_indices_from_index(neighbor)
                    .is_some_and(|axes| Self::axis_box_contains(&low, &high, &axes));
                if inside && visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        ends
    }

    /// Every cell overlapped by the closed box `[lower, upper]`.
    pub fn fill_hyper_rectangle_between_bounds(&self, lower: &Vector, upper: &Vector) -> Vec<Successor> {
        let q = &self.state_space;
        let Some((low, high)) = q.axis_box_from_bounds(lower, upper) else {
            return vec![Successor::OutOfSpace];
        };

        let mut ends = Vec::new();
        let mut current = low.clone();
        loop {
            ends.extend(q.index_from_axis_indices(&current).map(Successor::InBounds));

            // Odometer increment, axis 0 fastest.
            let mut k = 0;
            loop {
                if k == current.len() {
                    return ends;
                }
                if current[k] < high[k] {
                    current[k] += 1;
                    break;
                }
                current[k] = low[k];
                k += 1;
            }
        }
    }
}

/// Transition table of the closed-loop abstraction.
#[derive(Debug, Clone)]
pub struct Abstraction {
    overapproximator: Overapproximator,
    transitions: Vec<Transition>,
}

impl Abstraction {
    pub fn new(state_space: Quantizer, input_space: Quantizer, refined: bool) -> Self {
        let transitions = vec![Transition::default(); state_space.cardinality()];
        Self {
            overapproximator: Overapproximator::new(state_space, input_space, refined),
            transitions,
        }
    }

    pub fn state_space(&self) -> &Quantizer {
        self.overapproximator.state_space()
    }

    pub fn input_space(&self) -> &Quantizer {
        self.overapproximator.input_space()
    }

    pub fn is_refined(&self) -> bool {
        self.overapproximator.refined
    }

    pub fn overapproximator(&self) -> &Overapproximator {
        &self.overapproximator
    }

    pub fn transition(&self, state_index: usize) -> Option<&Transition> {
        self.transitions.get(state_index)
    }

    /// Transition arena, indexed by state cell.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Successors of `state_index` under the input cell `input_index`, if
    /// computed.
    pub fn successors(&self, state_index: usize, input_index: usize) -> Option<&[Successor]> {
        self.transition(state_index)?.ends(input_index)
    }

    /// Computes (once) the transition of `state_index` under `input` and
    /// returns the input cell index it is stored under.
    pub fn compute_transition_for_index<P: Plant + ?Sized>(
        &mut self,
        plant: &P,
        state_index: usize,
        input: &Vector,
    ) -> Result<usize> {
        let cardinality = self.transitions.len();
        let transition = self
            .transitions
            .get_mut(state_index)
            .ok_or(Error::IndexOutOfRange {
                index: state_index,
                cardinality,
            })?;
        self.overapproximator.compute(plant, state_index, input, transition)
    }

    /// Read-only geometry together with the mutable transition arena.
    pub(crate) fn split_mut(&mut self) -> (&Overapproximator, &mut [Transition]) {
        (&self.overapproximator, &mut self.transitions)
    }

    /// Total number of computed (state, input) pairs.
    pub fn transitions_computed(&self) -> usize {
        self.transitions.iter().map(Transition::len).sum()
    }

    pub fn clear_transitions(&mut self) {
        debug!("Dropping {} computed transitions", self.transitions_computed());
        self.transitions.iter_mut().for_each(Transition::clear);
    }
}
