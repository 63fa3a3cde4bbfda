use crate::{
    error::{validate_rects, PackError},
    finder::{max_item_size, BoundingBoxFinder},
    geometry::{is_power_of_two, next_power_of_two, MAX_DIMENSION},
    placement::PlacementAlgorithm,
    progress::{CancelToken, Progress, ReportProgress},
    types::{Item, PackingResult},
};

/// Searches for the smallest box whose sides are both powers of two.
///
/// Every width and height pair from 2 up to the next power of two above the
/// sum of the item widths (or heights) is a candidate. Pairs that can't
/// possibly work, either because they're smaller than the total item area or
/// narrower than the largest item, are skipped without packing.
///
/// When cancelled, this returns the best result found so far, which may be
/// `None`.
pub struct PowerOfTwoSizePacker<A> {
    algorithm: A,
    progress: Progress,
}

impl<A> PowerOfTwoSizePacker<A> {
    pub fn new(algorithm: A) -> Self {
        Self {
            algorithm,
            progress: Progress::new(true),
        }
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }
}

impl<A> ReportProgress for PowerOfTwoSizePacker<A> {
    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }
}

impl<P, A> BoundingBoxFinder<P> for PowerOfTwoSizePacker<A>
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

        let (max_width, max_height) = max_item_size(rects);
        let total_area: u64 = rects.iter().map(|item| item.rect.area()).sum();
        let total_width: u64 = rects.iter().map(|item| u64::from(item.rect.width())).sum();
        let total_height: u64 = rects.iter().map(|item| u64::from(item.rect.height())).sum();

        let widths = powers_of_two_up_to(total_width);
        let heights = powers_of_two_up_to(total_height);
        let candidates = (widths.len() * heights.len()) as u64;

        log::debug!(
            "Trying {} power of two sizes up to {}x{}",
            candidates,
            widths.last().copied().unwrap_or(2),
            heights.last().copied().unwrap_or(2)
        );

        let mut best: Option<PackingResult<P>> = None;
        let mut tried = 0;

        'search: for &width in &widths {
            for &height in &heights {
                if cancel.is_cancelled() {
                    log::debug!("Search cancelled at {}x{}", width, height);
                    break 'search;
                }

                tried += 1;
                self.progress.set_fraction(tried, candidates);

                let area = u64::from(width) * u64::from(height);
                if width < max_width || height < max_height || area < total_area {
                    continue;
                }

                if let Some(best) = &best {
                    if area >= rounded_area(best) {
                        continue;
                    }
                }

                if let Some(mut result) = self.algorithm.place_rects(width, height, rects, cancel)? {
                    result.shrink_to_fit();
                    log::debug!(
                        "Packed into {}x{}, using {}x{}",
                        width,
                        height,
                        result.width,
                        result.height
                    );

                    best = Some(result);
                }
            }
        }

        self.progress.finish();

        Ok(best.map(|mut result| {
            if !is_power_of_two(result.width) || !is_power_of_two(result.height) {
                result.width = next_power_of_two(result.width);
                result.height = next_power_of_two(result.height);
            }
            result
        }))
    }
}

/// Every power of two from 2 up to the next power of two at or above `total`.
fn powers_of_two_up_to(total: u64) -> Vec<u32> {
    let capped = total.min(u64::from(MAX_DIMENSION)) as u32;
    let bound = next_power_of_two(capped).max(2);

    std::iter::successors(Some(2u32), |size| size.checked_mul(2))
        .take_while(|size| *size <= bound)
        .collect()
}

/// The area of a result once its sides are rounded up to powers of two.
fn rounded_area<P>(result: &PackingResult<P>) -> u64 {
    u64::from(next_power_of_two(result.width)) * u64::from(next_power_of_two(result.height))
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::placement::{GuillotinePlacement, SkylinePlacement};

    #[test]
    fn candidate_sizes() {
        assert_eq!(powers_of_two_up_to(0), vec![2]);
        assert_eq!(powers_of_two_up_to(2), vec![2]);
        assert_eq!(powers_of_two_up_to(3), vec![2, 4]);
        assert_eq!(powers_of_two_up_to(100), vec![2, 4, 8, 16, 32, 64, 128]);
    }

    #[test]
    fn four_squares() {
        let items: Vec<Item<usize>> = (0..4).map(|id| Item::new((64, 64), id)).collect();

        let mut packer = PowerOfTwoSizePacker::new(GuillotinePlacement::new());
        let result = packer
            .find_minimum_bounding_box(&items, &CancelToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(result.area(), 128 * 128);
        assert!(is_power_of_two(result.width));
        assert!(is_power_of_two(result.height));
        assert_eq!(packer.progress().get(), 100);
    }

    #[test]
    fn odd_sizes_round_up() {
        let items = vec![Item::new((5, 3), ()), Item::new((7, 2), ())];

        let mut packer = PowerOfTwoSizePacker::new(SkylinePlacement::new());
        let result = packer
            .find_minimum_bounding_box(&items, &CancelToken::new())
            .unwrap()
            .unwrap();

        assert!(is_power_of_two(result.width));
        assert!(is_power_of_two(result.height));
        assert!(result.area() >= 29);
        assert_eq!(result.out_of_bounds(), None);
        assert_eq!(result.find_overlap(), None);
    }

    #[test]
    fn empty_input() {
        let mut packer = PowerOfTwoSizePacker::new(GuillotinePlacement::new());
        let result = packer
            .find_minimum_bounding_box(&[] as &[Item<()>], &CancelToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(result.size(), (0, 0));
    }

    #[test]
    fn cancelled_midway_keeps_best_so_far() {
        // Sixteen candidates from 2x2 to 16x16; 4x16 is the eighth and fits.
        let items: Vec<Item<usize>> = (0..4).map(|id| Item::new((4, 4), id)).collect();

        let cancel = CancelToken::new();
        let trigger = cancel.clone();

        let mut packer = PowerOfTwoSizePacker::new(GuillotinePlacement::new());
        packer.progress_mut().subscribe(move |percent| {
            if percent >= 55 {
                trigger.cancel();
            }
        });

        let result = packer
            .find_minimum_bounding_box(&items, &cancel)
            .unwrap()
            .unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(result.size(), (4, 16));
        assert_eq!(result.find_overlap(), None);
        assert_eq!(result.out_of_bounds(), None);
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let items = vec![Item::new((10, 10), ())];
        let mut packer = PowerOfTwoSizePacker::new(GuillotinePlacement::new());

        assert!(packer
            .find_minimum_bounding_box(&items, &cancel)
            .unwrap()
            .is_none());
    }
}
