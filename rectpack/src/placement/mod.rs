//! Placement algorithms: pack a set of items into a box of a fixed size.

mod free_rects;
mod guillotine;
mod skyline;

pub use free_rects::*;
pub use guillotine::*;
pub use skyline::*;

use crate::{
    error::{validate_box, validate_rects, PackError},
    geometry::Rect,
    progress::{CancelToken, Progress, ReportProgress},
    types::{Item, PackingResult},
};

/// Tries to place every item inside a `width` x `height` box.
///
/// Implementations reset all of their internal state at the start of each
/// call, so one instance can be reused for many attempts, but only one attempt
/// at a time. The input items are never modified; placed copies are returned
/// in the same order as the input.
///
/// Returns `Ok(None)` when the items don't fit or when `cancel` fires before
/// placement finishes. There are no partial results at this level.
pub trait PlacementAlgorithm<P>: ReportProgress {
    fn place_rects(
        &mut self,
        width: u32,
        height: u32,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError>;
}

impl<T: ReportProgress + ?Sized> ReportProgress for Box<T> {
    fn progress(&self) -> &Progress {
        (**self).progress()
    }

    fn progress_mut(&mut self) -> &mut Progress {
        (**self).progress_mut()
    }
}

impl<P, A: PlacementAlgorithm<P> + ?Sized> PlacementAlgorithm<P> for Box<A> {
    fn place_rects(
        &mut self,
        width: u32,
        height: u32,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError> {
        (**self).place_rects(width, height, rects, cancel)
    }
}

/// Validates a placement request and returns the bare input rects.
pub(crate) fn prepare<P>(
    width: u32,
    height: u32,
    rects: &[Item<P>],
) -> Result<Vec<Rect>, PackError> {
    validate_box(width, height)?;
    validate_rects(rects.iter().map(|item| &item.rect))?;

    Ok(rects
        .iter()
        .map(|item| Rect::from_size(item.rect.width(), item.rect.height()))
        .collect())
}

/// Items with no area can't collide with anything, so they're parked at the
/// origin as long as their one nonzero side fits in the box.
pub(crate) fn place_empty(size: (u32, u32), width: u32, height: u32) -> Option<Rect> {
    if size.0 <= width && size.1 <= height {
        Some(Rect::from_size(size.0, size.1))
    } else {
        None
    }
}

/// Collects placements made in sorted order back into input order.
pub(crate) struct Placements<P> {
    slots: Vec<Option<Item<P>>>,
}

impl<P: Clone> Placements<P> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
        }
    }

    pub fn place(&mut self, rects: &[Item<P>], index: usize, rect: Rect, rotated: bool) {
        self.slots[index] = Some(rects[index].placed_at(rect, rotated));
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn finish(self, width: u32, height: u32) -> Option<PackingResult<P>> {
        let items: Option<Vec<Item<P>>> = self.slots.into_iter().collect();
        items.map(|items| PackingResult::new(width, height, items))
    }
}
