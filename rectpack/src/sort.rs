//! Orderings applied to the input before placement.
//!
//! Placement algorithms consume rects in the order a [`SortHeuristic`] gives
//! them. The heuristic only compares sizes; sorting is always stable, so rects
//! the heuristic considers equal keep their input order.

use std::cmp::Ordering;

use crate::geometry::Rect;

pub trait SortHeuristic: Send + Sync {
    fn compare(&self, a: &Rect, b: &Rect) -> Ordering;

    /// Returns the input indices in placement order.
    fn order(&self, rects: &[Rect]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..rects.len()).collect();
        indices.sort_by(|&a, &b| self.compare(&rects[a], &rects[b]));
        indices
    }
}

/// Tallest first, then widest first. Large items placed first leave less
/// fragmented space behind, which suits shelf-like placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeightThenWidthDescending;

impl SortHeuristic for HeightThenWidthDescending {
    fn compare(&self, a: &Rect, b: &Rect) -> Ordering {
        b.height()
            .cmp(&a.height())
            .then_with(|| b.width().cmp(&a.width()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeightThenWidthAscending;

impl SortHeuristic for HeightThenWidthAscending {
    fn compare(&self, a: &Rect, b: &Rect) -> Ordering {
        a.height()
            .cmp(&b.height())
            .then_with(|| a.width().cmp(&b.width()))
    }
}

/// Keeps the caller's order, for inputs that were already arranged by an
/// outer search.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveOrder;

impl SortHeuristic for PreserveOrder {
    fn compare(&self, _a: &Rect, _b: &Rect) -> Ordering {
        Ordering::Equal
    }

    fn order(&self, rects: &[Rect]) -> Vec<usize> {
        (0..rects.len()).collect()
    }
}
