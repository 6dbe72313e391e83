//! Memoized abstract transitions of a single state cell.

use std::collections::HashMap;

use crate::types::Successor;
use crate::vector::Vector;

/// Over-approximated image of one (state cell, input cell) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    ends: Vec<Successor>,
    post: Vector,
    bounds: Option<(Vector, Vector)>,
}

impl Image {
    pub fn new(post: Vector) -> Self {
        Self {
            ends: Vec::new(),
            post,
            bounds: None,
        }
    }

    /// Image that (partially) leaves the state space.
    pub fn out_of_space(post: Vector) -> Self {
        Self {
            ends: vec![Successor::OutOfSpace],
            post,
            bounds: None,
        }
    }

    /// Successor cells. Duplicates are not removed.
    pub fn ends(&self) -> &[Successor] {
        &self.ends
    }

    /// Evolved cell center.
    pub fn post(&self) -> &Vector {
        &self.post
    }

    /// Axis-aligned bound `(lower, upper)` of the evolved cell, if it stayed in
    /// the state space.
    pub fn bounds(&self) -> Option<(&Vector, &Vector)> {
        self.bounds.as_ref().map(|(l, u)| (l, u))
    }

    pub fn add_end(&mut self, end: Successor) {
        self.ends.push(end);
    }

    pub fn set_bounds(&mut self, lower: Vector, upper: Vector) {
        self.bounds = Some((lower, upper));
    }

    pub fn leaves_space(&self) -> bool {
        self.ends.iter().any(|e| e.is_out_of_space())
    }
}

/// All computed images of one state cell, keyed by input cell index.
#[derive(Debug, Clone, Default)]
pub struct Transition {
    images: HashMap<usize, Image>,
    selected_input: Option<usize>,
}

impl Transition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processed(&self, input_index: usize) -> bool {
        self.images.contains_key(&input_index)
    }

    pub fn image(&self, input_index: usize) -> Option<&Image> {
        self.images.get(&input_index)
    }

    pub fn ends(&self, input_index: usize) -> Option<&[Successor]> {
        self.image(input_index).map(Image::ends)
    }

    /// Stores the image for `input_index`. The first recorded image wins.
    pub fn record(&mut self, input_index: usize, image: Image) {
        self.images.entry(input_index).or_insert(image);
    }

    /// Input cell chosen by the policy for this state cell.
    pub fn selected_input(&self) -> Option<usize> {
        self.selected_input
    }

    pub fn select_input(&mut self, input_index: usize) {
        self.selected_input = Some(input_index);
    }

    /// Successors under the policy-selected input.
    pub fn selected_ends(&self) -> Option<&[Successor]> {
        self.ends(self.selected_input?)
    }

    /// Number of processed inputs.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.selected_input = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_once() {
        let mut t = Transition::new();
        assert!(!t.is_processed(2));

        let mut image = Image::new(Vector::from([0.0]));
        image.add_end(Successor::InBounds(4));
        image.add_end(Successor::InBounds(4));
        t.record(2, image);

        t.record(2, Image::out_of_space(Vector::from([9.0])));
        assert!(t.is_processed(2));
        assert_eq!(t.ends(2), Some(&[Successor::InBounds(4), Successor::InBounds(4)][..]));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_selected_input() {
        let mut t = Transition::new();
        assert_eq!(t.selected_ends(), None);

        t.record(1, Image::out_of_space(Vector::from([9.0])));
        t.select_input(1);
        assert_eq!(t.selected_ends(), Some(&[Successor::OutOfSpace][..]));
        assert!(t.image(1).unwrap().leaves_space());

        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.selected_input(), None);
    }

    #[test]
    fn test_bounds() {
        let mut image = Image::new(Vector::from([0.5]));
        assert_eq!(image.bounds(), None);
        image.set_bounds(Vector::from([0.0]), Vector::from([1.0]));
        assert_eq!(image.bounds(), Some((&Vector::from([0.0]), &Vector::from([1.0]))));
    }
}
