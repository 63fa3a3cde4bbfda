use crate::{
    error::PackError,
    geometry::Rect,
    placement::{
        free_rects::{
            BestAreaFit, FreeRectExtractor, FreeRectMerger, FreeRectPostProcessor,
            FreeRectSplitter, KeepOrientation, LongerAxisSplit, MaximalRectsPostProcessor,
            MaximalSplit, OrientationSelector, SortedByArea,
        },
        place_empty, prepare, PlacementAlgorithm, Placements,
    },
    progress::{CancelToken, Progress, ReportProgress},
    sort::{HeightThenWidthDescending, SortHeuristic},
    types::{Item, PackingResult},
};

/// Packs items by repeatedly cutting free space into smaller free rects.
///
/// The packer keeps a list of free rects, starting with one that covers the
/// whole box. Each item, in sorted order, takes a free rect from the list and
/// the remainder of that free rect is split and merged back in. Every step is
/// pluggable; see the `free_rects` strategies.
///
/// The defaults are a best-area-fit extractor, no rotation, a longer-axis
/// splitter and a merger that keeps the free list sorted by area.
pub struct GuillotinePlacement {
    sorter: Box<dyn SortHeuristic>,
    extractor: Box<dyn FreeRectExtractor>,
    orientation: Box<dyn OrientationSelector>,
    splitter: Box<dyn FreeRectSplitter>,
    merger: Box<dyn FreeRectMerger>,
    post_processor: Option<Box<dyn FreeRectPostProcessor>>,

    free_rects: Vec<Rect>,
    progress: Progress,
}

impl GuillotinePlacement {
    pub fn new() -> Self {
        Self {
            sorter: Box::new(HeightThenWidthDescending),
            extractor: Box::new(BestAreaFit),
            orientation: Box::new(KeepOrientation),
            splitter: Box::new(LongerAxisSplit),
            merger: Box::new(SortedByArea),
            post_processor: None,
            free_rects: Vec::new(),
            progress: Progress::new(true),
        }
    }

    /// A maximal rectangles packer built from the guillotine hooks. Free rects
    /// are allowed to overlap, and every free rect touched by a placement is
    /// carved around it.
    pub fn maximal_rects() -> Self {
        Self::new()
            .with_splitter(MaximalSplit)
            .with_post_processor(MaximalRectsPostProcessor)
    }

    pub fn with_sorter<S: SortHeuristic + 'static>(mut self, sorter: S) -> Self {
        self.sorter = Box::new(sorter);
        self
    }

    pub fn with_extractor<E: FreeRectExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_orientation<O: OrientationSelector + 'static>(mut self, orientation: O) -> Self {
        self.orientation = Box::new(orientation);
        self
    }

    pub fn with_splitter<S: FreeRectSplitter + 'static>(mut self, splitter: S) -> Self {
        self.splitter = Box::new(splitter);
        self
    }

    pub fn with_merger<M: FreeRectMerger + 'static>(mut self, merger: M) -> Self {
        self.merger = Box::new(merger);
        self
    }

    pub fn with_post_processor<T: FreeRectPostProcessor + 'static>(
        mut self,
        post_processor: T,
    ) -> Self {
        self.post_processor = Some(Box::new(post_processor));
        self
    }

    /// The free rects left over from the most recent call to `place_rects`.
    pub fn free_rects(&self) -> &[Rect] {
        &self.free_rects
    }

    /// Places a single item, returning where it went.
    fn place_one(&mut self, size: (u32, u32), width: u32, height: u32) -> Option<(Rect, bool)> {
        if size.0 == 0 || size.1 == 0 {
            return match place_empty(size, width, height) {
                Some(rect) => Some((rect, false)),
                None => {
                    self.progress.reset();
                    None
                }
            };
        }

        let host = match self.extractor.extract(&mut self.free_rects, size.0, size.1) {
            Some(host) => host,
            None => {
                self.progress.reset();
                return None;
            }
        };

        let (size, rotated) = self.orientation.orient(size, &host);
        let placed = Rect::from_pos_size(host.position(), size);

        let pieces: Vec<Rect> = self
            .splitter
            .split(&host, &placed)
            .iter()
            .copied()
            .filter(|piece| !piece.is_empty())
            .collect();

        self.merger.merge(&mut self.free_rects, &pieces);

        if let Some(post_processor) = &self.post_processor {
            post_processor.process(&mut self.free_rects, &placed);
        }

        Some((placed, rotated))
    }
}

impl Default for GuillotinePlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportProgress for GuillotinePlacement {
    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }
}

impl<P: Clone> PlacementAlgorithm<P> for GuillotinePlacement {
    fn place_rects(
        &mut self,
        width: u32,
        height: u32,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError> {
        let sizes = prepare(width, height, rects)?;

        self.progress.reset();
        self.free_rects.clear();

        let bounds = Rect::from_size(width, height);
        if !bounds.is_empty() {
            self.free_rects.push(bounds);
        }

        let order = self.sorter.order(&sizes);
        let mut placements = Placements::new(rects.len());

        for (done, &index) in order.iter().enumerate() {
            if cancel.is_cancelled() {
                log::trace!("Guillotine placement cancelled after {} items", done);
                self.progress.reset();
                return Ok(None);
            }

            match self.place_one(sizes[index].size(), width, height) {
                Some((rect, rotated)) => placements.place(rects, index, rect, rotated),
                None => {
                    log::trace!(
                        "Item #{} ({}x{}) does not fit in {}x{}",
                        index,
                        sizes[index].width(),
                        sizes[index].height(),
                        width,
                        height
                    );

                    return Ok(None);
                }
            }

            self.progress.set_fraction(done as u64 + 1, order.len() as u64);
        }

        self.progress.finish();
        Ok(placements.finish(width, height))
    }
}
