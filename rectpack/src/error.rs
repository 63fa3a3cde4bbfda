use thiserror::Error;

use crate::geometry::{Rect, MAX_DIMENSION};

/// Errors for input that no packing strategy can work with.
///
/// Running out of room is not an error: packers report that by returning
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("Input rect #{index} is malformed: {rect:?} ends before it starts")]
    MalformedRect { index: usize, rect: Rect },

    #[error(
        "Cannot pack into a {width}x{height} box, dimensions are limited to {}",
        MAX_DIMENSION
    )]
    TooLarge { width: u32, height: u32 },

    #[error("Invalid genetic search configuration: {0}")]
    InvalidGeneticConfig(String),
}

/// Checks that every rect in the input is usable, returning the first one that
/// isn't.
pub(crate) fn validate_rects<'a, I>(rects: I) -> Result<(), PackError>
where
    I: IntoIterator<Item = &'a Rect>,
{
    for (index, rect) in rects.into_iter().enumerate() {
        if !rect.is_well_formed() {
            return Err(PackError::MalformedRect { index, rect: *rect });
        }

        if rect.width() > MAX_DIMENSION || rect.height() > MAX_DIMENSION {
            return Err(PackError::TooLarge {
                width: rect.width(),
                height: rect.height(),
            });
        }
    }

    Ok(())
}

pub(crate) fn validate_box(width: u32, height: u32) -> Result<(), PackError> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        Err(PackError::TooLarge { width, height })
    } else {
        Ok(())
    }
}
