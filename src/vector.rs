//! Fixed-length real vectors.
//!
//! [`Vector`] is the coordinate type shared by the quantizer, the plant models
//! and the hyperplane geometry. All binary operations are elementwise and
//! expect both operands to have the same dimension.

use std::fmt::{Display, Formatter};
use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector(Vec<f64>);

impl Vector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn zeros(dimension: usize) -> Self {
        Self(vec![0.0; dimension])
    }

    /// Unit vector along `axis`, scaled by `sign`.
    pub fn axis(dimension: usize, axis: usize, sign: f64) -> Self {
        let mut v = Self::zeros(dimension);
        v.0[axis] = sign;
        v
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.0.iter()
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        debug_assert_eq!(self.dimension(), other.dimension());
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the vector scaled to unit length, or `None` for the zero vector.
    pub fn normalized(&self) -> Option<Vector> {
        let norm = self.norm();
        if norm > 0.0 && norm.is_finite() {
            Some(self * (1.0 / norm))
        } else {
            None
        }
    }

    /// Elementwise (Hadamard) product.
    pub fn component_mul(&self, other: &Vector) -> Vector {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn component_min(&self, other: &Vector) -> Vector {
        self.zip_with(other, f64::min)
    }

    pub fn component_max(&self, other: &Vector) -> Vector {
        self.zip_with(other, f64::max)
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Vector {
        Vector(self.0.iter().map(|&a| f(a)).collect())
    }

    pub fn zip_with(&self, other: &Vector, f: impl Fn(f64, f64) -> f64) -> Vector {
        debug_assert_eq!(self.dimension(), other.dimension());
        Vector(self.0.iter().zip(&other.0).map(|(&a, &b)| f(a, b)).collect())
    }

    /// Arithmetic mean of a non-empty set of points.
    pub fn centroid(points: &[Vector]) -> Option<Vector> {
        let first = points.first()?;
        let sum = points[1..].iter().fold(first.clone(), |acc, p| &acc + p);
        Some(&sum * (1.0 / points.len() as f64))
    }
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[f64; N]> for Vector {
    fn from(values: [f64; N]) -> Self {
        Self(values.to_vec())
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl Add for &Vector {
    type Output = Vector;

    fn add(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Sub for &Vector {
    type Output = Vector;

    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Mul<f64> for &Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Self::Output {
        self.map(|a| a * rhs)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Self::Output {
        &self * rhs
    }
}

impl Neg for &Vector {
    type Output = Vector;

    fn neg(self) -> Self::Output {
        self.map(|a| -a)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Self::Output {
        -&self
    }
}

impl Display for Vector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, x) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Vector::from([1.0, 2.0, 3.0]);
        let b = Vector::from([4.0, -1.0, 0.5]);

        assert_eq!(&a + &b, Vector::from([5.0, 1.0, 3.5]));
        assert_eq!(&a - &b, Vector::from([-3.0, 3.0, 2.5]));
        assert_eq!(&a * 2.0, Vector::from([2.0, 4.0, 6.0]));
        assert_eq!(-a.clone(), Vector::from([-1.0, -2.0, -3.0]));
        assert_eq!(a.component_mul(&b), Vector::from([4.0, -2.0, 1.5]));
    }

    #[test]
    fn test_dot_and_norm() {
        let a = Vector::from([3.0, 4.0]);
        assert_eq!(a.dot(&Vector::from([1.0, 1.0])), 7.0);
        assert_eq!(a.norm(), 5.0);

        let n = a.normalized().unwrap();
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert!(Vector::zeros(2).normalized().is_none());
    }

    #[test]
    fn test_min_max_centroid() {
        let a = Vector::from([1.0, 5.0]);
        let b = Vector::from([2.0, -5.0]);
        assert_eq!(a.component_min(&b), Vector::from([1.0, -5.0]));
        assert_eq!(a.component_max(&b), Vector::from([2.0, 5.0]));
        assert_eq!(Vector::centroid(&[a, b]), Some(Vector::from([1.5, 0.0])));
        assert_eq!(Vector::centroid(&[]), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Vector::from([1.0, -0.5]).to_string(), "(1, -0.5)");
    }
}
