use crate::{
    error::PackError,
    geometry::Rect,
    placement::{place_empty, prepare, PlacementAlgorithm, Placements},
    progress::{CancelToken, Progress, ReportProgress},
    sort::{HeightThenWidthDescending, SortHeuristic},
    types::{Item, PackingResult},
};

/// A corner of the skyline where an item can be anchored by its top-left
/// corner.
///
/// Each point starts a segment of the skyline: the columns `x..x + span` are
/// considered full down to `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeasiblePoint {
    pub x: u32,
    pub y: u32,
    pub span: u32,

    /// How far right an item anchored here can extend before it would hit a
    /// deeper part of the skyline or the edge of the box.
    pub horizontal: u32,

    /// Height of the wall on the left of this point, or the distance to the
    /// bottom of the box if there is no wall.
    pub vertical: u32,
}

impl FeasiblePoint {
    fn segment(x: u32, y: u32, span: u32) -> Self {
        Self {
            x,
            y,
            span,
            horizontal: 0,
            vertical: 0,
        }
    }
}

/// The envelope of everything placed so far, stored as the feasible points
/// that start each segment, ordered by `x`.
///
/// Space underneath an overhang is never reused; the skyline only ever grows
/// downward, which is what keeps placements from overlapping.
#[derive(Debug, Clone)]
pub struct Skyline {
    width: u32,
    height: u32,
    points: Vec<FeasiblePoint>,
}

impl Skyline {
    pub fn new(width: u32, height: u32) -> Self {
        let mut skyline = Self {
            width,
            height,
            points: vec![FeasiblePoint::segment(0, 0, width)],
        };

        skyline.refresh_edges();
        skyline
    }

    #[inline]
    pub fn points(&self) -> &[FeasiblePoint] {
        &self.points
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether an item of the given size anchored at the point would stay
    /// clear of the skyline and inside the box.
    pub fn fits(&self, index: usize, width: u32, height: u32) -> bool {
        let point = &self.points[index];
        width <= point.horizontal && height <= self.height - point.y
    }

    /// Anchors an item at the given point, which must fit it, and returns the
    /// rect it now occupies.
    ///
    /// Points under the item's footprint are dropped. Two points take their
    /// place: one under the item's bottom-left corner and one at its top-right
    /// corner, if the segment it covered continues past the item.
    pub fn place(&mut self, index: usize, width: u32, height: u32) -> Rect {
        let anchor = self.points[index];
        let right = anchor.x + width;

        let mut points = Vec::with_capacity(self.points.len() + 2);
        points.extend_from_slice(&self.points[..index]);
        points.push(FeasiblePoint::segment(anchor.x, anchor.y + height, width));

        for point in &self.points[index..] {
            let end = point.x + point.span;

            if end <= right {
                continue;
            }

            if point.x < right {
                points.push(FeasiblePoint::segment(right, point.y, end - right));
            } else {
                points.push(*point);
            }
        }

        self.points = points;
        self.join_level_segments();
        self.refresh_edges();

        Rect::new(anchor.x, anchor.y, right, anchor.y + height)
    }

    /// Fills in parts of the skyline that no remaining item could use, given
    /// the smallest remaining width and height.
    ///
    /// Points too close to the bottom of the box are pushed all the way down.
    /// Wells, segments with deeper neighbors (or the box edge) on both sides,
    /// that are too narrow are filled up to their shallower neighbor. Neither
    /// change hides space that a remaining item could have been anchored in.
    pub fn prune(&mut self, min_width: u32, min_height: u32) {
        loop {
            let mut changed = false;

            for i in 0..self.points.len() {
                let point = self.points[i];

                if point.y < self.height && self.height - point.y < min_height {
                    self.points[i].y = self.height;
                    changed = true;
                    continue;
                }

                if point.horizontal >= min_width {
                    continue;
                }

                let left = i.checked_sub(1).map(|left| self.points[left].y);
                let right = self.points.get(i + 1).map(|right| right.y);

                let walled_left = left.map_or(true, |y| y > point.y);
                let walled_right = right.map_or(true, |y| y > point.y);

                let fill_to = match (left, right) {
                    (Some(left), Some(right)) => left.min(right),
                    (Some(y), None) | (None, Some(y)) => y,
                    (None, None) => continue,
                };

                if walled_left && walled_right {
                    self.points[i].y = fill_to;
                    changed = true;
                }
            }

            if !changed {
                break;
            }

            self.join_level_segments();
            self.refresh_edges();
        }
    }

    fn join_level_segments(&mut self) {
        self.points.dedup_by(|next, previous| {
            if next.y == previous.y {
                previous.span += next.span;
                true
            } else {
                false
            }
        });
    }

    fn refresh_edges(&mut self) {
        for i in 0..self.points.len() {
            let y = self.points[i].y;

            let horizontal = self.points[i..]
                .iter()
                .take_while(|point| point.y <= y)
                .map(|point| point.span)
                .sum();

            let vertical = match i.checked_sub(1).map(|left| self.points[left].y) {
                Some(left_y) if left_y > y => left_y - y,
                _ => self.height - y,
            };

            let point = &mut self.points[i];
            point.horizontal = horizontal;
            point.vertical = vertical;
        }
    }
}

/// Chooses the next item to place and the feasible point to put it at.
pub trait PointPicker: Send + Sync {
    /// `remaining` holds the sizes of unplaced items in sorted order. Returns
    /// `(item, point)` indices, or `None` if nothing fits anywhere.
    fn pick(&self, remaining: &[(u32, u32)], skyline: &Skyline) -> Option<(usize, usize)>;
}

/// Considers every remaining item at every feasible point and picks the pair
/// that wastes the least area between the item and the walls around it.
///
/// Ties prefer pairs where the item exactly matches the width or height of
/// its spot, then the leftmost point, then the earliest item.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalWastePicker;

impl PointPicker for MinimalWastePicker {
    fn pick(&self, remaining: &[(u32, u32)], skyline: &Skyline) -> Option<(usize, usize)> {
        // (waste, goodness, item, point)
        let mut best: Option<(u64, u8, usize, usize)> = None;

        for (item, &(width, height)) in remaining.iter().enumerate() {
            for (index, point) in skyline.points().iter().enumerate() {
                if !skyline.fits(index, width, height) {
                    continue;
                }

                let waste = u64::from(point.vertical.saturating_sub(height))
                    * u64::from(point.horizontal - width);
                let goodness = (width == point.horizontal) as u8 + (height == point.vertical) as u8;

                let better = match best {
                    None => true,
                    Some((best_waste, best_goodness, _, best_point)) => {
                        (waste, std::cmp::Reverse(goodness), index)
                            < (best_waste, std::cmp::Reverse(best_goodness), best_point)
                    }
                };

                if better {
                    best = Some((waste, goodness, item, index));
                }
            }
        }

        best.map(|(_, _, item, point)| (item, point))
    }
}

/// Always places the first remaining item, at the highest and then leftmost
/// point that fits it. Much cheaper than `MinimalWastePicker` and honors the
/// input order exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct BottomLeftPicker;

impl PointPicker for BottomLeftPicker {
    fn pick(&self, remaining: &[(u32, u32)], skyline: &Skyline) -> Option<(usize, usize)> {
        let &(width, height) = remaining.first()?;

        skyline
            .points()
            .iter()
            .enumerate()
            .filter(|(index, _)| skyline.fits(*index, width, height))
            .min_by_key(|(_, point)| (point.y, point.x))
            .map(|(index, _)| (0, index))
    }
}

/// Packs items against an evolving skyline of everything placed so far.
pub struct SkylinePlacement {
    sorter: Box<dyn SortHeuristic>,
    picker: Box<dyn PointPicker>,

    skyline: Skyline,
    progress: Progress,
}

impl SkylinePlacement {
    pub fn new() -> Self {
        Self {
            sorter: Box::new(HeightThenWidthDescending),
            picker: Box::new(MinimalWastePicker),
            skyline: Skyline::new(0, 0),
            progress: Progress::new(true),
        }
    }

    /// A skyline packer using [`BottomLeftPicker`].
    pub fn lightweight() -> Self {
        Self::new().with_picker(BottomLeftPicker)
    }

    pub fn with_sorter<S: SortHeuristic + 'static>(mut self, sorter: S) -> Self {
        self.sorter = Box::new(sorter);
        self
    }

    pub fn with_picker<T: PointPicker + 'static>(mut self, picker: T) -> Self {
        self.picker = Box::new(picker);
        self
    }

    /// The skyline left over from the most recent call to `place_rects`.
    pub fn skyline(&self) -> &Skyline {
        &self.skyline
    }
}

impl Default for SkylinePlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportProgress for SkylinePlacement {
    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }
}

impl<P: Clone> PlacementAlgorithm<P> for SkylinePlacement {
    fn place_rects(
        &mut self,
        width: u32,
        height: u32,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError> {
        let sizes = prepare(width, height, rects)?;

        self.progress.reset();
        self.skyline = Skyline::new(width, height);

        let mut placements = Placements::new(rects.len());
        let mut remaining = Vec::with_capacity(rects.len());

        for index in self.sorter.order(&sizes) {
            let size = sizes[index].size();

            if !sizes[index].is_empty() {
                remaining.push(index);
                continue;
            }

            match place_empty(size, width, height) {
                Some(rect) => placements.place(rects, index, rect, false),
                None => {
                    self.progress.reset();
                    return Ok(None);
                }
            }
        }

        let total = remaining.len() as u64;

        while !remaining.is_empty() {
            if cancel.is_cancelled() {
                log::trace!("Skyline placement cancelled");
                self.progress.reset();
                return Ok(None);
            }

            let remaining_sizes: Vec<(u32, u32)> =
                remaining.iter().map(|&index| sizes[index].size()).collect();

            let (item, point) = match self.picker.pick(&remaining_sizes, &self.skyline) {
                Some(pick) => pick,
                None => break,
            };

            let index = remaining.remove(item);
            let (item_width, item_height) = remaining_sizes[item];
            let rect = self.skyline.place(point, item_width, item_height);
            placements.place(rects, index, rect, false);

            let min_width = remaining.iter().map(|&index| sizes[index].width()).min();
            let min_height = remaining.iter().map(|&index| sizes[index].height()).min();

            if let (Some(min_width), Some(min_height)) = (min_width, min_height) {
                self.skyline.prune(min_width, min_height);
            }

            self.progress
                .set_fraction(total - remaining.len() as u64, total);
        }

        if placements.count() != rects.len() {
            log::trace!(
                "Skyline placed {} of {} items into {}x{}",
                placements.count(),
                rects.len(),
                width,
                height
            );

            self.progress.reset();
            return Ok(None);
        }

        self.progress.finish();
        Ok(placements.finish(width, height))
    }
}
