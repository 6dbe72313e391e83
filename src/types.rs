//! Successor cells of an abstract transition.

use std::fmt;

/// Target of one abstract transition.
///
/// An evolved cell either lands (partially) on a grid cell, or some part of it
/// leaves the quantized state space. The latter is a regular outcome of the
/// over-approximation: it violates invariance and never counts as reaching.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Successor {
    InBounds(usize),
    OutOfSpace,
}

impl Successor {
    /// Returns the cell index, or `None` for [`Successor::OutOfSpace`].
    pub fn index(self) -> Option<usize> {
        match self {
            Successor::InBounds(index) => Some(index),
            Successor::OutOfSpace => None,
        }
    }

    pub fn is_out_of_space(self) -> bool {
        matches!(self, Successor::OutOfSpace)
    }
}

impl fmt::Display for Successor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Successor::InBounds(index) => write!(f, "#{}", index),
            Successor::OutOfSpace => write!(f, "out"),
        }
    }
}

impl From<Option<usize>> for Successor {
    fn from(index: Option<usize>) -> Self {
        index.map_or(Successor::OutOfSpace, Successor::InBounds)
    }
}
