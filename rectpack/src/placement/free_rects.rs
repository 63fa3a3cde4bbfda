//! Strategies for managing the free rect list of [`GuillotinePlacement`].
//!
//! Each placement step runs the same five hooks in order: an extractor picks
//! and removes the free rect that will host the item, an orientation selector
//! may rotate the item, a splitter cuts the host around the item, a merger
//! puts the leftover pieces back into the list, and an optional post-processor
//! tidies up the whole list.
//!
//! Items are always anchored at the top-left corner of their host.
//!
//! [`GuillotinePlacement`]: struct.GuillotinePlacement.html

use crate::geometry::Rect;

pub trait FreeRectExtractor: Send + Sync {
    /// Removes and returns the free rect that should host an item of the
    /// given size, or `None` if no free rect is large enough.
    fn extract(&self, free_rects: &mut Vec<Rect>, width: u32, height: u32) -> Option<Rect>;
}

pub trait OrientationSelector: Send + Sync {
    /// Picks the size to place inside `host`. The returned flag is true when
    /// the width and height were swapped. The returned size must still fit
    /// inside `host`.
    fn orient(&self, size: (u32, u32), host: &Rect) -> ((u32, u32), bool);
}

pub trait FreeRectSplitter: Send + Sync {
    /// Splits the remainder of `host` after `placed` was put in its top-left
    /// corner. Empty pieces are discarded by the caller.
    fn split(&self, host: &Rect, placed: &Rect) -> [Rect; 2];
}

pub trait FreeRectMerger: Send + Sync {
    fn merge(&self, free_rects: &mut Vec<Rect>, new_rects: &[Rect]);
}

pub trait FreeRectPostProcessor: Send + Sync {
    /// Runs over the whole list after every placement.
    fn process(&self, free_rects: &mut Vec<Rect>, placed: &Rect);
}

////////////////////////////////////////////////////////////////////////////////

/// Picks the free rect whose area is closest to the item's area. Ties go to
/// whichever candidate comes first in the list.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestAreaFit;

impl FreeRectExtractor for BestAreaFit {
    fn extract(&self, free_rects: &mut Vec<Rect>, width: u32, height: u32) -> Option<Rect> {
        let item_area = u64::from(width) * u64::from(height);

        let best = free_rects
            .iter()
            .enumerate()
            .filter(|(_, free)| free.fits(width, height))
            .fold(None, |best: Option<(usize, u64)>, (index, free)| {
                let waste = free.area() - item_area;

                match best {
                    Some((_, best_waste)) if best_waste <= waste => best,
                    _ => Some((index, waste)),
                }
            });

        best.map(|(index, _)| free_rects.remove(index))
    }
}

/// Picks the first free rect in the list that is large enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl FreeRectExtractor for FirstFit {
    fn extract(&self, free_rects: &mut Vec<Rect>, width: u32, height: u32) -> Option<Rect> {
        let index = free_rects
            .iter()
            .position(|free| free.fits(width, height))?;

        Some(free_rects.remove(index))
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, Default)]
pub struct KeepOrientation;

impl OrientationSelector for KeepOrientation {
    fn orient(&self, size: (u32, u32), _host: &Rect) -> ((u32, u32), bool) {
        (size, false)
    }
}

/// Rotates the item so that its long side runs along the long side of its
/// host, when the rotated item still fits.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignLongSides;

impl OrientationSelector for AlignLongSides {
    fn orient(&self, size: (u32, u32), host: &Rect) -> ((u32, u32), bool) {
        let (width, height) = size;
        let item_is_wide = width > height;
        let host_is_wide = host.width() > host.height();

        let misaligned = width != height
            && host.width() != host.height()
            && item_is_wide != host_is_wide;

        if misaligned && host.fits(height, width) {
            ((height, width), true)
        } else {
            (size, false)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Cuts along the placed item's longer side.
///
/// For a wide item the cut is horizontal: the piece below the item spans the
/// host's full width. For a tall item the cut is vertical: the piece to the
/// right spans the host's full height.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongerAxisSplit;

impl FreeRectSplitter for LongerAxisSplit {
    fn split(&self, host: &Rect, placed: &Rect) -> [Rect; 2] {
        if placed.width() >= placed.height() {
            horizontal_cut(host, placed)
        } else {
            vertical_cut(host, placed)
        }
    }
}

/// Cuts along the placed item's shorter side.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShorterAxisSplit;

impl FreeRectSplitter for ShorterAxisSplit {
    fn split(&self, host: &Rect, placed: &Rect) -> [Rect; 2] {
        if placed.width() >= placed.height() {
            vertical_cut(host, placed)
        } else {
            horizontal_cut(host, placed)
        }
    }
}

/// Keeps both maximal strips beside and below the item. The two pieces
/// overlap, so this splitter only makes sense together with
/// [`MaximalRectsPostProcessor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximalSplit;

impl FreeRectSplitter for MaximalSplit {
    fn split(&self, host: &Rect, placed: &Rect) -> [Rect; 2] {
        [
            Rect::new(placed.right, host.top, host.right, host.bottom),
            Rect::new(host.left, placed.bottom, host.right, host.bottom),
        ]
    }
}

fn horizontal_cut(host: &Rect, placed: &Rect) -> [Rect; 2] {
    [
        Rect::new(placed.right, host.top, host.right, placed.bottom),
        Rect::new(host.left, placed.bottom, host.right, host.bottom),
    ]
}

fn vertical_cut(host: &Rect, placed: &Rect) -> [Rect; 2] {
    [
        Rect::new(placed.right, host.top, host.right, host.bottom),
        Rect::new(host.left, placed.bottom, placed.right, host.bottom),
    ]
}

////////////////////////////////////////////////////////////////////////////////

/// Keeps the list sorted by ascending area, inserting new rects after any
/// existing rects of the same area.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedByArea;

impl FreeRectMerger for SortedByArea {
    fn merge(&self, free_rects: &mut Vec<Rect>, new_rects: &[Rect]) {
        for new_rect in new_rects {
            let area = new_rect.area();
            let index = free_rects.partition_point(|free| free.area() <= area);
            free_rects.insert(index, *new_rect);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppendMerger;

impl FreeRectMerger for AppendMerger {
    fn merge(&self, free_rects: &mut Vec<Rect>, new_rects: &[Rect]) {
        free_rects.extend_from_slice(new_rects);
    }
}

/// Joins free rects that share a whole edge into one larger rect, then sorts
/// the list by area. Requires a list of disjoint free rects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinAdjacentMerger;

impl FreeRectMerger for JoinAdjacentMerger {
    fn merge(&self, free_rects: &mut Vec<Rect>, new_rects: &[Rect]) {
        free_rects.extend_from_slice(new_rects);

        while let Some((i, j, joined)) = find_joinable(free_rects) {
            free_rects[i] = joined;
            free_rects.remove(j);
        }

        free_rects.sort_by_key(|free| free.area());
    }
}

fn find_joinable(free_rects: &[Rect]) -> Option<(usize, usize, Rect)> {
    for (i, a) in free_rects.iter().enumerate() {
        for (j, b) in free_rects.iter().enumerate().skip(i + 1) {
            if let Some(joined) = join(a, b) {
                return Some((i, j, joined));
            }
        }
    }

    None
}

fn join(a: &Rect, b: &Rect) -> Option<Rect> {
    if a.left == b.left && a.right == b.right {
        if a.bottom == b.top {
            return Some(Rect::new(a.left, a.top, a.right, b.bottom));
        }
        if b.bottom == a.top {
            return Some(Rect::new(a.left, b.top, a.right, a.bottom));
        }
    }

    if a.top == b.top && a.bottom == b.bottom {
        if a.right == b.left {
            return Some(Rect::new(a.left, a.top, b.right, a.bottom));
        }
        if b.right == a.left {
            return Some(Rect::new(b.left, a.top, a.right, a.bottom));
        }
    }

    None
}

////////////////////////////////////////////////////////////////////////////////

/// Turns the free list into a list of maximal free rects.
///
/// Every free rect overlapping the newly placed item is replaced by up to four
/// strips around the item, and free rects contained in another free rect are
/// dropped. The list is left sorted by ascending area.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximalRectsPostProcessor;

impl FreeRectPostProcessor for MaximalRectsPostProcessor {
    fn process(&self, free_rects: &mut Vec<Rect>, placed: &Rect) {
        let mut carved = Vec::with_capacity(free_rects.len() + 4);

        for free in free_rects.drain(..) {
            if !free.intersects(placed) {
                carved.push(free);
                continue;
            }

            if placed.left > free.left {
                carved.push(Rect::new(free.left, free.top, placed.left, free.bottom));
            }
            if placed.right < free.right {
                carved.push(Rect::new(placed.right, free.top, free.right, free.bottom));
            }
            if placed.top > free.top {
                carved.push(Rect::new(free.left, free.top, free.right, placed.top));
            }
            if placed.bottom < free.bottom {
                carved.push(Rect::new(free.left, placed.bottom, free.right, free.bottom));
            }
        }

        for (i, free) in carved.iter().enumerate() {
            // Of two identical rects, only the first survives.
            let redundant = carved
                .iter()
                .enumerate()
                .any(|(j, other)| i != j && other.contains(free) && (other != free || j < i));

            if !redundant {
                free_rects.push(*free);
            }
        }

        free_rects.sort_by_key(|free| free.area());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn best_area_fit_prefers_snug_host() {
        let mut free = vec![
            Rect::new(0, 0, 100, 100),
            Rect::new(100, 0, 120, 20),
            Rect::new(0, 100, 30, 130),
        ];

        assert_eq!(BestAreaFit.extract(&mut free, 20, 20), Some(Rect::new(100, 0, 120, 20)));
        assert_eq!(free.len(), 2);
        assert_eq!(BestAreaFit.extract(&mut free, 25, 5), Some(Rect::new(0, 100, 30, 130)));
        assert_eq!(BestAreaFit.extract(&mut free, 101, 5), None);
        assert_eq!(free, vec![Rect::new(0, 0, 100, 100)]);
    }

    #[test]
    fn best_area_fit_ties_go_to_first() {
        let mut free = vec![Rect::new(0, 0, 10, 10), Rect::new(10, 0, 20, 10)];
        assert_eq!(BestAreaFit.extract(&mut free, 5, 5), Some(Rect::new(0, 0, 10, 10)));
    }

    #[test]
    fn first_fit() {
        let mut free = vec![Rect::new(0, 0, 5, 5), Rect::new(5, 0, 100, 100)];
        assert_eq!(FirstFit.extract(&mut free, 6, 6), Some(Rect::new(5, 0, 100, 100)));
    }

    #[test]
    fn longer_axis_split_wide_item() {
        let host = Rect::new(0, 0, 100, 50);
        let placed = Rect::new(0, 0, 40, 10);

        assert_eq!(
            LongerAxisSplit.split(&host, &placed),
            [Rect::new(40, 0, 100, 10), Rect::new(0, 10, 100, 50)]
        );
    }

    #[test]
    fn longer_axis_split_tall_item() {
        let host = Rect::new(0, 0, 100, 50);
        let placed = Rect::new(0, 0, 10, 40);

        assert_eq!(
            LongerAxisSplit.split(&host, &placed),
            [Rect::new(10, 0, 100, 50), Rect::new(0, 40, 10, 50)]
        );
        assert_eq!(
            ShorterAxisSplit.split(&host, &placed),
            [Rect::new(10, 0, 100, 40), Rect::new(0, 40, 100, 50)]
        );
    }

    #[test]
    fn sorted_merge_keeps_order() {
        let mut free = vec![Rect::from_size(2, 2), Rect::from_size(4, 4)];
        SortedByArea.merge(
            &mut free,
            &[Rect::new(9, 9, 12, 12), Rect::new(20, 20, 22, 22)],
        );

        assert_eq!(
            free,
            vec![
                Rect::from_size(2, 2),
                Rect::new(20, 20, 22, 22),
                Rect::new(9, 9, 12, 12),
                Rect::from_size(4, 4),
            ]
        );
    }

    #[test]
    fn join_adjacent() {
        let mut free = vec![Rect::new(0, 0, 10, 10)];
        JoinAdjacentMerger.merge(
            &mut free,
            &[Rect::new(10, 0, 20, 10), Rect::new(0, 10, 20, 15)],
        );

        assert_eq!(free, vec![Rect::new(0, 0, 20, 15)]);
    }

    #[test]
    fn align_long_sides() {
        let host = Rect::new(0, 0, 100, 20);

        assert_eq!(AlignLongSides.orient((10, 20), &host), ((20, 10), true));
        assert_eq!(AlignLongSides.orient((20, 10), &host), ((20, 10), false));
        assert_eq!(
            AlignLongSides.orient((30, 30), &Rect::from_size(31, 30)),
            ((30, 30), false)
        );
    }

    #[test]
    fn maximal_rects_carves_overlaps() {
        let mut free = vec![Rect::new(0, 0, 10, 10), Rect::new(5, 0, 30, 4)];
        let placed = Rect::new(5, 2, 8, 6);

        MaximalRectsPostProcessor.process(&mut free, &placed);

        for free_rect in &free {
            assert!(!free_rect.intersects(&placed), "{:?} overlaps", free_rect);
        }

        assert!(free.contains(&Rect::new(0, 0, 5, 10)));
        assert!(free.contains(&Rect::new(8, 0, 30, 4)));
        assert!(free.contains(&Rect::new(5, 0, 30, 2)));
        assert!(free.contains(&Rect::new(0, 6, 10, 10)));
        assert!(free.contains(&Rect::new(8, 0, 10, 10)));
    }
}
