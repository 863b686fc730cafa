//! Text shaping: measuring, wrapping and sizing strings against a font.
//!
//! The wrapping and sizing functions are generic over [`Measure`] and
//! [`Scalable`] so they run identically against real glyph metrics and
//! against fixed-advance measurers in tests.

pub mod face;
pub mod fit;
pub mod normalize;
pub mod wrap;

pub use face::{Face, FontInstance, FontRole, FontSet, Stroke};
pub use fit::{FitRange, TextBlock, break_wide_lines, fit_font, shrink_to_fit, truncate_to_height};
pub use normalize::normalize;
pub use wrap::{wrap, wrap_headline_balanced};

/// Something that can report the pixel extent of a single line of text.
pub trait Measure {
    /// Horizontal advance of `text` laid out on one line.
    fn measure(&self, text: &str) -> f32;

    /// Height of one line box (ascent to descent), without extra leading.
    fn line_height(&self) -> f32;
}

/// A font that can be instantiated at any pixel size.
pub trait Scalable {
    type Instance: Measure + Clone;

    fn at(&self, px: f32) -> Self::Instance;
}

impl<M: Measure + ?Sized> Measure for &M {
    fn measure(&self, text: &str) -> f32 {
        (**self).measure(text)
    }

    fn line_height(&self) -> f32 {
        (**self).line_height()
    }
}
