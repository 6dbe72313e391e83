//! Uniform quantization of a bounded hyper-rectangle.
//!
//! A [`Quantizer`] cuts `[lower, upper)` into cells of per-axis width `eta`
//! and numbers them with a mixed-radix index:
//!
//! ```text
//! axis[k] = floor((x[k] - lower[k]) / eta[k])
//! index   = axis[0] + axis[1] * n[0] + axis[2] * n[0] * n[1] + ...
//! ```
//!
//! Every cell is represented by its center. `eta` must divide every axis, so
//! all cells have the same shape and every center lies inside the space.
//! Point lookups use the half-open convention `lower[k] <= x[k] < upper[k]`,
//! so that [`Quantizer::is_in_bounds`] and [`Quantizer::index_from_vector`]
//! agree on every point.
//!
//! Images of whole cells are closed boxes. [`Quantizer::axis_box_from_bounds`]
//! maps such a box to the cells it overlaps: an upper coordinate lying on a
//! cell edge belongs to the cell below the edge, so a box equal to a cell maps
//! to that cell alone.
//!
//! # Example
//!
//! ```
//! use abscheck_rs::quantizer::Quantizer;
//! use abscheck_rs::vector::Vector;
//!
//! let q = Quantizer::new([0.0, 0.0].into(), [1.0, 2.0].into(), [0.5, 0.5].into()).unwrap();
//! assert_eq!(q.cardinality(), 8);
//!
//! let i = q.index_from_vector(&Vector::from([0.7, 1.1])).unwrap();
//! assert_eq!(i, 1 + 2 * 2);
//! assert_eq!(q.vector_from_index(i), Some(Vector::from([0.75, 1.25])));
//! ```

use rand::Rng;

use crate::error::{Error, Result};
use crate::vector::Vector;

/// Relative tolerance when deciding whether `eta` divides an axis evenly, and
/// when snapping box coordinates onto cell edges.
const DIVISION_TOLERANCE: f64 = 1e-9;

/// `r` rounded to the nearest integer when within tolerance of it.
fn snap(r: f64) -> f64 {
    if (r - r.round()).abs() < DIVISION_TOLERANCE * r.abs().max(1.0) {
        r.round()
    } else {
        r
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantizer {
    lower: Vector,
    upper: Vector,
    eta: Vector,
    cardinality_per_axis: Vec<usize>,
    cardinality: usize,
}

impl Quantizer {
    pub fn new(lower: Vector, upper: Vector, eta: Vector) -> Result<Self> {
        let dimension = lower.dimension();
        if dimension == 0 {
            return Err(Error::ZeroDimension);
        }
        for other in [&upper, &eta] {
            if other.dimension() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: other.dimension(),
                });
            }
        }

        let mut cardinality_per_axis = Vec::with_capacity(dimension);
        for axis in 0..dimension {
            let (l, u, e) = (lower[axis], upper[axis], eta[axis]);
            if !(e > 0.0 && e.is_finite()) {
                return Err(Error::InvalidCellWidth { axis, eta: e });
            }
            if !(l < u && l.is_finite() && u.is_finite()) {
                return Err(Error::InvalidInterval { axis, lower: l, upper: u });
            }
            let ratio = (u - l) / e;
            let cells = snap(ratio);
            if cells != cells.round() || cells < 1.0 {
                return Err(Error::NonDividingCellWidth {
                    axis,
                    eta: e,
                    width: u - l,
                });
            }
            cardinality_per_axis.push(cells as usize);
        }
        let cardinality = cardinality_per_axis.iter().product();

        Ok(Self {
            lower,
            upper,
            eta,
            cardinality_per_axis,
            cardinality,
        })
    }

    pub fn dimension(&self) -> usize {
        self.lower.dimension()
    }
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }
    pub fn cardinality_per_axis(&self) -> &[usize] {
        &self.cardinality_per_axis
    }
    pub fn lower(&self) -> &Vector {
        &self.lower
    }
    pub fn upper(&self) -> &Vector {
        &self.upper
    }
    pub fn eta(&self) -> &Vector {
        &self.eta
    }

    pub fn is_in_bounds(&self, v: &Vector) -> bool {
        v.dimension() == self.dimension()
            && (0..self.dimension()).all(|k| self.lower[k] <= v[k] && v[k] < self.upper[k])
    }

    /// Closed-box check `lower[k] <= x[k] <= upper[k]`, up to rounding of the
    /// cell edges.
    pub fn is_in_closed_bounds(&self, v: &Vector) -> bool {
        v.dimension() == self.dimension()
            && (0..self.dimension()).all(|k| {
                let slack = DIVISION_TOLERANCE * self.eta[k];
                self.lower[k] - slack <= v[k] && v[k] <= self.upper[k] + slack
            })
    }

    /// Per-axis index range `(low, high)`, inclusive, of the cells overlapped
    /// by the closed box `[lower, upper]`, or `None` if the box is not inside
    /// the space.
    ///
    /// Coordinates within tolerance of a cell edge are snapped onto it. A
    /// lower coordinate on an edge starts at the cell above the edge, an upper
    /// coordinate on an edge ends at the cell below it.
    pub fn axis_box_from_bounds(&self, lower: &Vector, upper: &Vector) -> Option<(Vec<usize>, Vec<usize>)> {
        if !self.is_in_closed_bounds(lower) || !self.is_in_closed_bounds(upper) {
            return None;
        }
        let mut low = Vec::with_capacity(self.dimension());
        let mut high = Vec::with_capacity(self.dimension());
        for k in 0..self.dimension() {
            let last = self.cardinality_per_axis[k] - 1;
            let a = snap((lower[k] - self.lower[k]) / self.eta[k]).floor().max(0.0) as usize;
            let b = snap((upper[k] - self.lower[k]) / self.eta[k]).ceil().max(1.0) as usize - 1;
            let a = a.min(last);
            low.push(a);
            high.push(b.min(last).max(a));
        }
        Some((low, high))
    }

    /// Per-axis indices of the cell nearest to `v`, clamped into the grid.
    pub fn nearest_axis_indices(&self, v: &Vector) -> Vec<usize> {
        (0..self.dimension())
            .map(|k| {
                let a = ((v[k] - self.lower[k]) / self.eta[k]).floor().max(0.0) as usize;
                a.min(self.cardinality_per_axis[k] - 1)
            })
            .collect()
    }

    /// Decomposes `v` into per-axis cell indices, or `None` if out of bounds.
    pub fn axis_indices_from_vector(&self, v: &Vector) -> Option<Vec<usize>> {
        if !self.is_in_bounds(v) {
            return None;
        }
        let axes = (0..self.dimension())
            .map(|k| {
                let a = ((v[k] - self.lower[k]) / self.eta[k]).floor() as usize;
                // Points just below `upper` may round onto the boundary.
                a.min(self.cardinality_per_axis[k] - 1)
            })
            .collect();
        Some(axes)
    }

    pub fn index_from_axis_indices(&self, axes: &[usize]) -> Option<usize> {
        if axes.len() != self.dimension() {
            return None;
        }
        let mut index = 0;
        let mut stride = 1;
        for (&a, &n) in axes.iter().zip(&self.cardinality_per_axis) {
            if a >= n {
                return None;
            }
            index += a * stride;
            stride *= n;
        }
        Some(index)
    }

    pub fn axis_indices_from_index(&self, index: usize) -> Option<Vec<usize>> {
        if index >= self.cardinality {
            return None;
        }
        let mut rest = index;
        let axes = self
            .cardinality_per_axis
            .iter()
            .map(|&n| {
                let a = rest % n;
                rest /= n;
                a
            })
            .collect();
        Some(axes)
    }

    pub fn index_from_vector(&self, v: &Vector) -> Option<usize> {
        let axes = self.axis_indices_from_vector(v)?;
        self.index_from_axis_indices(&axes)
    }

    /// Center of the cell with the given per-axis indices.
    pub fn vector_from_axis_indices(&self, axes: &[usize]) -> Vector {
        debug_assert_eq!(axes.len(), self.dimension());
        Vector::new(
            axes.iter()
                .enumerate()
                .map(|(k, &a)| self.lower[k] + (a as f64 + 0.5) * self.eta[k])
                .collect(),
        )
    }

    /// Center of cell `index`, or `None` if the index is out of range.
    pub fn vector_from_index(&self, index: usize) -> Option<Vector> {
        let axes = self.axis_indices_from_index(index)?;
        Some(self.vector_from_axis_indices(&axes))
    }

    /// Snaps `v` to the center of its cell.
    pub fn quantize_vector(&self, v: &Vector) -> Option<Vector> {
        let axes = self.axis_indices_from_vector(v)?;
        Some(self.vector_from_axis_indices(&axes))
    }

    /// The `2^d` corners of the cell centered at `center`.
    ///
    /// Vertex `j` is offset by `+eta[k]/2` on axis `k` when bit `k` of `j` is
    /// set, and by `-eta[k]/2` otherwise. This ordering never changes.
    pub fn cell_vertices(&self, center: &Vector) -> Vec<Vector> {
        let d = self.dimension();
        (0..1usize << d)
            .map(|j| {
                Vector::new(
                    (0..d)
                        .map(|k| {
                            let half = self.eta[k] / 2.0;
                            if j & (1 << k) != 0 {
                                center[k] + half
                            } else {
                                center[k] - half
                            }
                        })
                        .collect(),
                )
            })
            .collect()
    }

    pub fn cell_vertices_from_index(&self, index: usize) -> Option<Vec<Vector>> {
        let center = self.vector_from_index(index)?;
        Some(self.cell_vertices(&center))
    }

    /// Indices of the axis-adjacent cells of `index` (at most `2d`).
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let Some(axes) = self.axis_indices_from_index(index) else {
            return Vec::new();
        };
        let mut result = Vec::with_capacity(2 * self.dimension());
        let mut stride = 1;
        for k in 0..self.dimension() {
            if axes[k] > 0 {
                result.push(index - stride);
            }
            if axes[k] + 1 < self.cardinality_per_axis[k] {
                result.push(index + stride);
            }
            stride *= self.cardinality_per_axis[k];
        }
        result
    }

    /// Draws a point uniformly from `[lower, upper)`.
    pub fn random_vector<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector {
        Vector::new(
            (0..self.dimension())
                .map(|k| rng.gen_range(self.lower[k]..self.upper[k]))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn grid() -> Quantizer {
        Quantizer::new([-5.0, -10.0].into(), [5.0, 10.0].into(), [0.1, 0.1].into()).unwrap()
    }

    #[test]
    fn test_cardinality() {
        let q = grid();
        assert_eq!(q.cardinality_per_axis(), &[100, 200]);
        assert_eq!(q.cardinality(), 20_000);

        // Rounding in the ratio is tolerated.
        let q = Quantizer::new([-0.15].into(), [0.15].into(), [0.05].into()).unwrap();
        assert_eq!(q.cardinality(), 6);
    }

    #[test]
    fn test_non_dividing_cell_width_is_rejected() {
        assert_eq!(
            Quantizer::new([0.0].into(), [1.0].into(), [0.3].into()),
            Err(Error::NonDividingCellWidth {
                axis: 0,
                eta: 0.3,
                width: 1.0
            })
        );
        // Wider than the space.
        assert!(matches!(
            Quantizer::new([0.0, 0.0].into(), [1.0, 1.0].into(), [0.5, 2.0].into()),
            Err(Error::NonDividingCellWidth { axis: 1, .. })
        ));
    }

    #[test]
    fn test_every_center_round_trips() {
        let q = Quantizer::new([-1.0, 0.0].into(), [2.0, 0.7].into(), [0.3, 0.1].into()).unwrap();
        assert_eq!(q.cardinality_per_axis(), &[10, 7]);
        for index in 0..q.cardinality() {
            let center = q.vector_from_index(index).unwrap();
            assert!(q.is_in_bounds(&center), "center {} of cell {}", center, index);
            assert_eq!(q.index_from_vector(&center), Some(index));
            assert_eq!(q.quantize_vector(&center), Some(center.clone()));
            for vertex in q.cell_vertices(&center) {
                assert!(q.is_in_closed_bounds(&vertex), "vertex {} of cell {}", vertex, index);
            }
        }
    }

    #[test]
    fn test_axis_box_of_a_cell_is_the_cell() {
        let q = Quantizer::new([0.0, 0.0].into(), [1.0, 1.0].into(), [0.1, 0.1].into()).unwrap();
        for index in [0, 45, 99] {
            let vertices = q.cell_vertices_from_index(index).unwrap();
            let (lower, upper) = (&vertices[0], &vertices[3]);
            let (low, high) = q.axis_box_from_bounds(lower, upper).unwrap();
            assert_eq!(low, high);
            assert_eq!(q.index_from_axis_indices(&low), Some(index));
        }
    }

    #[test]
    fn test_axis_box_edges() {
        let q = Quantizer::new([0.0].into(), [1.0].into(), [0.25].into()).unwrap();
        let range = |l: f64, u: f64| {
            q.axis_box_from_bounds(&Vector::from([l]), &Vector::from([u]))
                .map(|(low, high)| (low[0], high[0]))
        };
        // Upper edges belong to the cell below.
        assert_eq!(range(0.25, 0.5), Some((1, 1)));
        assert_eq!(range(0.75, 1.0), Some((3, 3)));
        assert_eq!(range(0.0, 1.0), Some((0, 3)));
        // Rounding noise around an edge is snapped away.
        assert_eq!(range(0.25 - 1e-14, 0.5 + 1e-14), Some((1, 1)));
        // Crossing an edge by more than rounding noise adds the cell.
        assert_eq!(range(0.2, 0.51), Some((0, 2)));
        // A degenerate box on an edge is the cell above it.
        assert_eq!(range(0.5, 0.5), Some((2, 2)));
        // Outside the closed box.
        assert_eq!(range(-0.01, 0.5), None);
        assert_eq!(range(0.5, 1.01), None);
    }

    #[test]
    fn test_invalid_configuration() {
        assert_eq!(
            Quantizer::new(Vector::zeros(0), Vector::zeros(0), Vector::zeros(0)),
            Err(Error::ZeroDimension)
        );
        assert_eq!(
            Quantizer::new([0.0].into(), [1.0, 2.0].into(), [0.1].into()),
            Err(Error::DimensionMismatch { expected: 1, actual: 2 })
        );
        assert_eq!(
            Quantizer::new([0.0].into(), [1.0].into(), [0.0].into()),
            Err(Error::InvalidCellWidth { axis: 0, eta: 0.0 })
        );
        assert_eq!(
            Quantizer::new([0.0, 1.0].into(), [1.0, 1.0].into(), [0.1, 0.1].into()),
            Err(Error::InvalidInterval { axis: 1, lower: 1.0, upper: 1.0 })
        );
    }

    #[test]
    fn test_round_trip() {
        let q = grid();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let v = q.random_vector(&mut rng);
            assert!(q.is_in_bounds(&v));
            let center = q.quantize_vector(&v).unwrap();
            let index = q.index_from_vector(&center).unwrap();
            assert_eq!(q.index_from_vector(&v), Some(index));
            assert_eq!(q.vector_from_index(index), Some(center));
        }
    }

    #[test]
    fn test_index_bijection() {
        let q = Quantizer::new([0.0, 0.0, 0.0].into(), [3.0, 2.0, 4.0].into(), [1.0, 1.0, 1.0].into()).unwrap();
        for index in 0..q.cardinality() {
            let axes = q.axis_indices_from_index(index).unwrap();
            assert_eq!(q.index_from_axis_indices(&axes), Some(index));
            let center = q.vector_from_index(index).unwrap();
            assert_eq!(q.index_from_vector(&center), Some(index));
        }
        assert_eq!(q.axis_indices_from_index(q.cardinality()), None);
        assert_eq!(q.index_from_axis_indices(&[3, 0, 0]), None);
    }

    #[test]
    fn test_half_open_bounds() {
        let q = Quantizer::new([0.0].into(), [1.0].into(), [0.25].into()).unwrap();
        assert_eq!(q.index_from_vector(&Vector::from([0.0])), Some(0));
        assert_eq!(q.index_from_vector(&Vector::from([0.999_999])), Some(3));
        assert_eq!(q.index_from_vector(&Vector::from([1.0])), None);
        assert_eq!(q.index_from_vector(&Vector::from([-1e-12])), None);
        assert!(!q.is_in_bounds(&Vector::from([1.0])));
        assert_eq!(q.quantize_vector(&Vector::from([2.0])), None);
        assert_eq!(q.vector_from_index(4), None);
    }

    #[test]
    fn test_cell_vertices_ordering() {
        let q = Quantizer::new([0.0, 0.0].into(), [2.0, 2.0].into(), [1.0, 1.0].into()).unwrap();
        let vertices = q.cell_vertices_from_index(0).unwrap();
        assert_eq!(
            vertices,
            vec![
                Vector::from([0.0, 0.0]),
                Vector::from([1.0, 0.0]),
                Vector::from([0.0, 1.0]),
                Vector::from([1.0, 1.0]),
            ]
        );
    }

    #[test]
    fn test_neighbors() {
        let q = Quantizer::new([0.0, 0.0].into(), [3.0, 3.0].into(), [1.0, 1.0].into()).unwrap();
        let mut center = q.neighbors(4);
        center.sort();
        assert_eq!(center, vec![1, 3, 5, 7]);

        let mut corner = q.neighbors(0);
        corner.sort();
        assert_eq!(corner, vec![1, 3]);

        assert!(q.neighbors(9).is_empty());
    }
}
