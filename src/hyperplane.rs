//! Bounded affine boundaries of evolved cells.
//!
//! A [`Hyperplane`] is spanned by the vertices of one face of a grid cell.
//! After [`Hyperplane::over_approximate_normal`] the plane follows the face
//! through one step of the plant: its defining points are evolved, and its
//! normal is re-estimated from two probe points (the face centroid and the
//! cell center) instead of re-deriving the full evolved polytope. For a
//! linear plant the two probes move exactly as the face does.
//!
//! The normal always points away from the cell, so the internal side of the
//! plane is the side containing the (evolved) cell center.

use crate::plant::Plant;
use crate::vector::Vector;

/// Tolerance for points lying on the plane itself.
const SIDE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct Hyperplane {
    points: Vec<Vector>,
    normal: Option<Vector>,
    /// Face centroid and cell center.
    probes: Option<(Vector, Vector)>,
}

impl Hyperplane {
    pub fn new(points: Vec<Vector>) -> Self {
        Self {
            points,
            normal: None,
            probes: None,
        }
    }

    pub fn points(&self) -> &[Vector] {
        &self.points
    }

    pub fn normal(&self) -> Option<&Vector> {
        self.normal.as_ref()
    }

    /// Sets the outward unit normal and records the probe points.
    ///
    /// The normal is flipped if it points towards `cell_center`. Without
    /// defining points the plane stays without a normal.
    pub fn set_normal(&mut self, normal: Vector, cell_center: &Vector) {
        let Some(centroid) = Vector::centroid(&self.points) else {
            return;
        };
        let outward = &centroid - cell_center;
        let oriented = if outward.dot(&normal) < 0.0 { -normal } else { normal };
        self.normal = oriented.normalized();
        self.probes = Some((centroid, cell_center.clone()));
    }

    /// Moves the plane one step forward under `plant` with `input`.
    pub fn over_approximate_normal<P: Plant + ?Sized>(&mut self, plant: &P, input: &Vector) {
        let Some((centroid, center)) = &self.probes else {
            return;
        };
        let centroid = plant.evaluate_dynamics(centroid, input);
        let center = plant.evaluate_dynamics(center, input);
        if let Some(normal) = (&centroid - &center).normalized() {
            self.normal = Some(normal);
        }
        self.probes = Some((centroid, center));
        for point in &mut self.points {
            *point = plant.evaluate_dynamics(point, input);
        }
    }

    /// Half-space test against the plane through the first defining point.
    ///
    /// Points on the plane count as internal.
    pub fn is_point_on_internal_side(&self, point: &Vector) -> bool {
        let (Some(origin), Some(normal)) = (self.points.first(), &self.normal) else {
            debug_assert!(false, "hyperplane queried before its normal was set");
            return true;
        };
        if point.dimension() == 1 {
            return if normal[0] >= 0.0 {
                point[0] <= origin[0] + SIDE_TOLERANCE
            } else {
                point[0] >= origin[0] - SIDE_TOLERANCE
            };
        }
        (point - origin).dot(normal) <= SIDE_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::{Integration, LinearPlant};

    fn right_face() -> Hyperplane {
        // Face x = 1 of the cell [0, 1]^2.
        Hyperplane::new(vec![Vector::from([1.0, 0.0]), Vector::from([1.0, 1.0])])
    }

    #[test]
    fn test_normal_is_oriented_outward() {
        let center = Vector::from([0.5, 0.5]);
        let mut plane = right_face();
        plane.set_normal(Vector::from([-1.0, 0.0]), &center);
        assert_eq!(plane.normal(), Some(&Vector::from([1.0, 0.0])));

        assert!(plane.is_point_on_internal_side(&center));
        assert!(plane.is_point_on_internal_side(&Vector::from([1.0, 0.3])));
        assert!(!plane.is_point_on_internal_side(&Vector::from([1.1, 0.3])));
    }

    #[test]
    fn test_empty_plane_has_no_normal() {
        let mut plane = Hyperplane::new(vec![]);
        plane.set_normal(Vector::from([1.0, 0.0]), &Vector::zeros(2));
        assert_eq!(plane.normal(), None);
    }

    #[test]
    fn test_one_dimensional() {
        let mut plane = Hyperplane::new(vec![Vector::from([2.0])]);
        plane.set_normal(Vector::from([1.0]), &Vector::from([3.0]));
        // Oriented away from the center at 3.
        assert_eq!(plane.normal(), Some(&Vector::from([-1.0])));
        assert!(plane.is_point_on_internal_side(&Vector::from([2.5])));
        assert!(!plane.is_point_on_internal_side(&Vector::from([1.5])));
    }

    #[test]
    fn test_translation_moves_plane() {
        // x' = 0 x + 1 u: a pure shift by `u * tau` along x.
        let integration = Integration {
            sampling_time: 1.0,
            steps: 4,
        };
        let plant = LinearPlant::new(vec![vec![0.0, 0.0], vec![0.0, 0.0]], vec![vec![1.0], vec![0.0]], integration).unwrap();

        let mut plane = right_face();
        plane.set_normal(Vector::from([1.0, 0.0]), &Vector::from([0.5, 0.5]));
        plane.over_approximate_normal(&plant, &Vector::from([2.0]));

        let normal = plane.normal().unwrap();
        assert!((normal[0] - 1.0).abs() < 1e-12);
        assert!(normal[1].abs() < 1e-12);
        assert!((plane.points()[0][0] - 3.0).abs() < 1e-12);
        assert!(plane.is_point_on_internal_side(&Vector::from([2.9, 0.5])));
        assert!(!plane.is_point_on_internal_side(&Vector::from([3.1, 0.5])));
    }

    #[test]
    fn test_rotation_tilts_normal() {
        // x' = -y, y' = x: rotation, the face normal rotates with the cell.
        let integration = Integration {
            sampling_time: std::f64::consts::FRAC_PI_2,
            steps: 50,
        };
        let plant = LinearPlant::new(vec![vec![0.0, -1.0], vec![1.0, 0.0]], vec![vec![0.0], vec![0.0]], integration).unwrap();

        let mut plane = Hyperplane::new(vec![Vector::from([1.0, -0.5]), Vector::from([1.0, 0.5])]);
        plane.set_normal(Vector::from([1.0, 0.0]), &Vector::zeros(2));
        plane.over_approximate_normal(&plant, &Vector::zeros(1));

        // A quarter turn maps the +x normal onto +y.
        let normal = plane.normal().unwrap();
        assert!(normal[0].abs() < 1e-6);
        assert!((normal[1] - 1.0).abs() < 1e-6);
        assert!(plane.is_point_on_internal_side(&Vector::zeros(2)));
        assert!(!plane.is_point_on_internal_side(&Vector::from([0.0, 1.5])));
    }
}
