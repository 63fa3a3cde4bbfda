//! Strategies that search for the smallest box a set of items packs into.

mod fixed_size;
mod genetic;
mod power_of_two;
mod unknown_size;

pub use fixed_size::*;
pub use genetic::*;
pub use power_of_two::*;
pub use unknown_size::*;

use crate::{
    error::PackError,
    progress::{CancelToken, ReportProgress},
    types::{Item, PackingResult},
};

/// Finds a box, as small as the strategy can manage, that fits every item.
///
/// An empty input always produces an empty 0x0 result. The input items are
/// never modified.
///
/// Strategies differ in what they return when cancelled: see each
/// implementation. `Ok(None)` means no packing was found at all.
pub trait BoundingBoxFinder<P>: ReportProgress {
    fn find_minimum_bounding_box(
        &mut self,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError>;
}

impl<P, F: BoundingBoxFinder<P> + ?Sized> BoundingBoxFinder<P> for Box<F> {
    fn find_minimum_bounding_box(
        &mut self,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError> {
        (**self).find_minimum_bounding_box(rects, cancel)
    }
}

/// The largest width and height among the items.
fn max_item_size<P>(rects: &[Item<P>]) -> (u32, u32) {
    rects.iter().fold((0, 0), |(width, height), item| {
        (width.max(item.rect.width()), height.max(item.rect.height()))
    })
}
