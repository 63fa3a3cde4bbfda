/// The largest width or height the engine will search or pack into.
///
/// Half of `i32::MAX`, so that a width and a height can always be summed or
/// multiplied in 64-bit space, and handed to consumers that store signed
/// coordinates, without overflowing.
pub const MAX_DIMENSION: u32 = (i32::MAX / 2) as u32;

/// An axis-aligned rectangle in integer coordinates.
///
/// `left` and `top` are inclusive, `right` and `bottom` are exclusive, so the
/// width is `right - left`. A well-formed rect has `right >= left` and
/// `bottom >= top`; a rect with no width or no height is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    #[inline]
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rect of the given size anchored at the origin.
    #[inline]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn from_pos_size(pos: (u32, u32), size: (u32, u32)) -> Self {
        Self::new(pos.0, pos.1, pos.0 + size.0, pos.1 + size.1)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    #[inline]
    pub fn position(&self) -> (u32, u32) {
        (self.left, self.top)
    }

    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Whether the coordinates describe a rect at all.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.right >= self.left && self.bottom >= self.top
    }

    /// Whether a rect of the given size would fit inside this one.
    #[inline]
    pub fn fits(&self, width: u32, height: u32) -> bool {
        width <= self.width() && height <= self.height()
    }

    /// Returns the same rect moved so that its top-left corner is at `pos`.
    #[inline]
    pub fn moved_to(&self, pos: (u32, u32)) -> Self {
        Self::from_pos_size(pos, self.size())
    }

    /// Returns the same rect with its width and height swapped, keeping the
    /// top-left corner.
    #[inline]
    pub fn rotated(&self) -> Self {
        Self::from_pos_size(self.position(), (self.height(), self.width()))
    }

    /// Tells whether the interiors of the two rects overlap. Rects that only
    /// share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }
}

#[inline]
pub fn is_power_of_two(value: u32) -> bool {
    value.is_power_of_two()
}

/// Rounds up to the next power of two, saturating at the largest power of two
/// that does not exceed `MAX_DIMENSION`.
pub fn next_power_of_two(value: u32) -> u32 {
    const LIMIT: u32 = (MAX_DIMENSION / 2) + 1;

    if value > LIMIT {
        LIMIT
    } else {
        value.max(1).next_power_of_two()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0, 0, 64, 64);
        let b = Rect::new(64, 0, 128, 64);
        let c = Rect::new(0, 64, 64, 128);

        assert!(!a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(!b.intersects(&c));
    }

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::new(0, 0, 64, 64);
        let b = Rect::new(63, 63, 65, 65);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(a.intersects(&a));
    }

    #[test]
    fn empty_rects() {
        assert!(Rect::new(5, 5, 5, 10).is_empty());
        assert!(Rect::new(5, 5, 10, 5).is_empty());
        assert!(!Rect::new(5, 5, 6, 6).is_empty());
        assert!(!Rect::new(6, 0, 5, 1).is_well_formed());
    }

    #[test]
    fn containment() {
        let outer = Rect::new(0, 0, 100, 100);

        assert!(outer.contains(&Rect::new(0, 0, 100, 100)));
        assert!(outer.contains(&Rect::new(10, 20, 30, 40)));
        assert!(!outer.contains(&Rect::new(90, 90, 101, 95)));
    }

    #[test]
    fn rotation_keeps_anchor() {
        let rect = Rect::new(3, 4, 13, 6).rotated();
        assert_eq!(rect, Rect::new(3, 4, 5, 14));
    }

    #[test]
    fn powers_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(64), 64);
        assert_eq!(next_power_of_two(65), 128);
        assert_eq!(next_power_of_two(u32::MAX), 1 << 29);

        assert!(is_power_of_two(1024));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(96));
    }
}
