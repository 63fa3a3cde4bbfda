use crate::{
    error::{validate_rects, PackError},
    finder::{max_item_size, BoundingBoxFinder},
    geometry::MAX_DIMENSION,
    placement::PlacementAlgorithm,
    progress::{CancelToken, Progress, ReportProgress},
    types::{Item, PackingResult},
};

/// Searches for the smallest box without any size constraints.
///
/// The search first finds any box that works by packing everything into one
/// very wide strip, adding a row at a time until the items fit. It then walks
/// the width down one unit at a time, growing the height whenever a width no
/// longer fits, and keeps the smallest result along the way. Widths whose box
/// is already larger than the best result are skipped without packing.
///
/// Once the first packing succeeds this packer never returns `None`: when
/// cancelled, it returns the best result so far.
pub struct UnknownSizePacker<A> {
    algorithm: A,
    progress: Progress,
}

impl<A> UnknownSizePacker<A> {
    pub fn new(algorithm: A) -> Self {
        Self {
            algorithm,
            progress: Progress::new(true),
        }
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// Packs everything into a strip as wide as the engine allows, adding one
    /// row of the tallest item's height per failed attempt.
    fn find_initial_bound<P>(
        &mut self,
        rects: &[Item<P>],
        row_height: u32,
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError>
    where
        A: PlacementAlgorithm<P>,
    {
        let mut height = row_height;

        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            log::trace!("Looking for an initial bound at height {}", height);

            if let Some(mut result) =
                self.algorithm
                    .place_rects(MAX_DIMENSION, height, rects, cancel)?
            {
                result.shrink_to_fit();
                return Ok(Some(result));
            }

            height = match height.checked_add(row_height.max(1)) {
                Some(next) if next <= MAX_DIMENSION => next,
                _ => return Ok(None),
            };
        }
    }
}

impl<A> ReportProgress for UnknownSizePacker<A> {
    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }
}

impl<P, A> BoundingBoxFinder<P> for UnknownSizePacker<A>
where
    A: PlacementAlgorithm<P>,
{
    fn find_minimum_bounding_box(
        &mut self,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError> {
        validate_rects(rects.iter().map(|item| &item.rect))?;
        self.progress.reset();

        if rects.is_empty() {
            self.progress.finish();
            return Ok(Some(PackingResult::empty()));
        }

        let (min_width, tallest) = max_item_size(rects);

        let mut best = match self.find_initial_bound(rects, tallest, cancel)? {
            Some(best) => best,
            None => {
                self.progress.finish();
                return Ok(None);
            }
        };

        log::debug!("Initial bound is {}x{}", best.width, best.height);

        let min_width = min_width.max(1);
        let mut height = best.height;
        let mut width = best.width.saturating_sub(1);
        let start_width = width;

        while width >= min_width {
            if cancel.is_cancelled() {
                log::debug!("Search cancelled at width {}", width);
                break;
            }

            self.progress.set_fraction(
                u64::from(start_width - width),
                u64::from(start_width - min_width) + 1,
            );

            if u64::from(width) * u64::from(height) > best.area() {
                width -= 1;
                continue;
            }

            match self.algorithm.place_rects(width, height, rects, cancel)? {
                Some(mut result) => {
                    result.shrink_to_fit();

                    if result.area() < best.area() {
                        log::debug!("New best bound {}x{}", result.width, result.height);
                        best = result;
                    }

                    width -= 1;
                }
                None => {
                    if cancel.is_cancelled() || height >= MAX_DIMENSION {
                        break;
                    }

                    height += 1;
                }
            }
        }

        self.progress.finish();
        Ok(Some(best))
    }
}
