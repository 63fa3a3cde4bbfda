use crate::{
    error::{validate_box, validate_rects, PackError},
    finder::BoundingBoxFinder,
    placement::PlacementAlgorithm,
    progress::{CancelToken, Progress, ReportProgress},
    types::{Item, PackingResult},
};

/// Packs into one box of a known size. There is nothing to search for, but
/// this lets a fixed size be used anywhere a finder is expected.
///
/// Successful results always report exactly the configured size, even if the
/// placement algorithm used less of it.
pub struct FixedSizePacker<A> {
    width: u32,
    height: u32,
    algorithm: A,
    progress: Progress,
}

impl<A> FixedSizePacker<A> {
    pub fn new(width: u32, height: u32, algorithm: A) -> Self {
        Self {
            width,
            height,
            algorithm,
            progress: Progress::new(true),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }
}

impl<A> ReportProgress for FixedSizePacker<A> {
    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }
}

impl<P, A> BoundingBoxFinder<P> for FixedSizePacker<A>
where
    A: PlacementAlgorithm<P>,
{
    fn find_minimum_bounding_box(
        &mut self,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError> {
        validate_box(self.width, self.height)?;
        validate_rects(rects.iter().map(|item| &item.rect))?;
        self.progress.reset();

        if rects.is_empty() {
            self.progress.finish();
            return Ok(Some(PackingResult::empty()));
        }

        let result = self
            .algorithm
            .place_rects(self.width, self.height, rects, cancel)?;

        match result {
            Some(mut result) => {
                result.width = self.width;
                result.height = self.height;
                self.progress.finish();
                Ok(Some(result))
            }
            None => {
                log::debug!(
                    "{} items do not fit in {}x{}",
                    rects.len(),
                    self.width,
                    self.height
                );
                Ok(None)
            }
        }
    }
}
