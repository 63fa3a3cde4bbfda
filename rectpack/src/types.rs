use crate::geometry::Rect;

/// A rectangle to pack, or one that has been packed.
///
/// `Item` is a [`Rect`] plus a payload that Rectpack never looks at. It's
/// expected that consumers will use the payload (an ID, a name, a handle to
/// an image) to associate placements back to the application's own objects.
///
/// Inputs are usually created with [`Item::new`], which anchors the rect at
/// the origin; only the size matters on the way in.
#[derive(Debug, Clone)]
pub struct Item<P> {
    pub rect: Rect,
    pub payload: P,

    /// Set on packed items whose width and height were swapped relative to
    /// the input.
    pub rotated: bool,
}

impl<P> Item<P> {
    #[inline]
    pub fn new(size: (u32, u32), payload: P) -> Self {
        Self::from_rect(Rect::from_size(size.0, size.1), payload)
    }

    #[inline]
    pub fn from_rect(rect: Rect, payload: P) -> Self {
        Self {
            rect,
            payload,
            rotated: false,
        }
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.rect.size()
    }

    #[inline]
    pub fn position(&self) -> (u32, u32) {
        self.rect.position()
    }
}

impl<P: Clone> Item<P> {
    /// Creates the packed counterpart of this item at the given rect.
    pub(crate) fn placed_at(&self, rect: Rect, rotated: bool) -> Self {
        Self {
            rect,
            payload: self.payload.clone(),
            rotated: rotated != self.rotated,
        }
    }
}

/// The result of a successful packing.
///
/// `width` and `height` describe the box the items were packed into. Every
/// item from the input appears exactly once in `items`, carrying its original
/// payload.
#[derive(Debug, Clone)]
pub struct PackingResult<P> {
    pub width: u32,
    pub height: u32,
    pub items: Vec<Item<P>>,
}

impl<P> PackingResult<P> {
    pub fn new(width: u32, height: u32, items: Vec<Item<P>>) -> Self {
        Self {
            width,
            height,
            items,
        }
    }

    /// The result of packing nothing: a zero-sized box with no items.
    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new())
    }

    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The smallest size, anchored at the origin, that contains every item.
    pub fn used_bounds(&self) -> (u32, u32) {
        self.items.iter().fold((0, 0), |(width, height), item| {
            (width.max(item.rect.right), height.max(item.rect.bottom))
        })
    }

    /// Shrinks the reported box down to `used_bounds`.
    pub fn shrink_to_fit(&mut self) {
        let (width, height) = self.used_bounds();
        self.width = width;
        self.height = height;
    }

    /// The fraction of the box covered by items, between 0 and 1.
    pub fn occupancy(&self) -> f64 {
        let area = self.area();

        if area == 0 {
            return 0.0;
        }

        let covered: u64 = self.items.iter().map(|item| item.rect.area()).sum();
        covered as f64 / area as f64
    }

    /// Returns the indices of the first pair of items found to overlap.
    pub fn find_overlap(&self) -> Option<(usize, usize)> {
        for (i, a) in self.items.iter().enumerate() {
            for (j, b) in self.items.iter().enumerate().skip(i + 1) {
                if a.rect.intersects(&b.rect) {
                    return Some((i, j));
                }
            }
        }

        None
    }

    /// Returns the index of the first item that pokes out of the box.
    pub fn out_of_bounds(&self) -> Option<usize> {
        let bounds = Rect::from_size(self.width, self.height);
        self.items
            .iter()
            .position(|item| !bounds.contains(&item.rect))
    }
}
