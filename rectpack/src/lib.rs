//! Rectpack is a library for packing rectangles into boxes. It was built for
//! sheetpack, a tool that lays out sprite sheets, but has no opinion about
//! what is being packed: every item carries a payload of your choosing.
//!
//! There are two layers:
//!
//! - Placement algorithms, like [`GuillotinePlacement`][GuillotinePlacement]
//!   and [`SkylinePlacement`][SkylinePlacement], pack items into a box of a
//!   given size or report that they don't fit.
//! - Bounding box finders search for the smallest box a placement algorithm
//!   can pack everything into. [`GeneticPacker`][GeneticPacker] does its own
//!   layout instead.
//!
//! Long searches can be watched through [`Progress`][Progress] and stopped
//! early with a [`CancelToken`][CancelToken].
//!
//! ## Example
//! ```
//! use rectpack::{BoundingBoxFinder, CancelToken, GuillotinePlacement, Item, UnknownSizePacker};
//!
//! // Describe the rectangles you want to pack. The second value is a payload
//! // that rides along with each item.
//! let items = vec![
//!     Item::new((128, 64), "banner"),
//!     Item::new((64, 64), "icon"),
//!     Item::new((1, 300), "rule"),
//! ];
//!
//! // Pick a placement algorithm and a strategy for sizing the box.
//! let mut packer = UnknownSizePacker::new(GuillotinePlacement::new());
//!
//! // Results come back in the same order as the input.
//! let result = packer
//!     .find_minimum_bounding_box(&items, &CancelToken::new())
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(result.items[1].payload, "icon");
//! assert_eq!(result.find_overlap(), None);
//! ```
//!
//! [GuillotinePlacement]: struct.GuillotinePlacement.html
//! [SkylinePlacement]: struct.SkylinePlacement.html
//! [GeneticPacker]: struct.GeneticPacker.html
//! [Progress]: struct.Progress.html
//! [CancelToken]: struct.CancelToken.html

mod error;
mod finder;
mod geometry;
mod placement;
mod progress;
mod sort;
mod types;

pub use error::*;
pub use finder::*;
pub use geometry::*;
pub use placement::*;
pub use progress::*;
pub use sort::*;
pub use types::*;
