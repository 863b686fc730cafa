//! Card geometry and rendered output types.
//!
//! A deck is a sequence of fixed-resolution raster cards, one per planned
//! slide. Cards carry no mutable state after rendering: they are created,
//! drawn once, then encoded.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::CardResult;

/// A rectangle defined in pixel coordinates.
///
/// Used for regions within a card, such as the header strip where the logo
/// sits or the frame text must stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    /// X offset from the left edge of the image
    pub x: u32,
    /// Y offset from the top edge of the image
    pub y: u32,
    /// Width of the rectangle
    pub width: u32,
    /// Height of the rectangle
    pub height: u32,
}

impl RectPx {
    /// Creates a new rectangle with the given position and dimensions.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle starting at origin (0, 0) with the given dimensions.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Returns the bottom edge coordinate (y + height).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Clips this rectangle to an image of the given size.
    pub fn clamp_to(&self, size: SizePx) -> Self {
        let x = self.x.min(size.width);
        let y = self.y.min(size.height);
        Self {
            x,
            y,
            width: self.width.min(size.width - x),
            height: self.height.min(size.height - y),
        }
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if width equals height.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

/// Output aspect ratio of every card in a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AspectRatio {
    /// 1080x1080 feed card.
    #[default]
    Square,
    /// 1080x1920 story card.
    Story,
}

impl AspectRatio {
    /// Returns the fixed canvas size for this aspect ratio.
    pub fn canvas(self) -> SizePx {
        match self {
            Self::Square => SizePx::new(1080, 1080),
            Self::Story => SizePx::new(1080, 1920),
        }
    }
}

/// One rendered slide.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCard {
    /// 1-based position of the slide in its deck.
    pub index: usize,

    /// The composited pixels.
    pub image: RgbaImage,
}

impl RenderedCard {
    pub fn new(index: usize, image: RgbaImage) -> Self {
        Self { index, image }
    }

    /// Returns the pixel dimensions of the card.
    pub fn dimensions(&self) -> SizePx {
        SizePx::new(self.image.width(), self.image.height())
    }

    /// File name used when the card is exported, derived from its index.
    pub fn file_name(&self) -> String {
        format!("card_{:02}.png", self.index)
    }

    /// Encodes the card as PNG bytes.
    pub fn to_png(&self) -> CardResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.image.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

/// The rendered cards of one deck, in slide order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CardDeck {
    pub cards: Vec<RenderedCard>,
}

impl CardDeck {
    /// Creates a new empty deck.
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    /// Creates a deck from a vector of cards.
    pub fn from_cards(cards: Vec<RenderedCard>) -> Self {
        Self { cards }
    }

    /// Appends a card to the deck.
    pub fn push(&mut self, card: RenderedCard) {
        self.cards.push(card);
    }

    /// Returns the number of cards in the deck.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns true if the deck holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Finds a card by its 1-based index.
    pub fn find_by_index(&self, index: usize) -> Option<&RenderedCard> {
        self.cards.iter().find(|card| card.index == index)
    }

    /// Returns an iterator over the cards.
    pub fn iter(&self) -> impl Iterator<Item = &RenderedCard> {
        self.cards.iter()
    }
}

impl IntoIterator for CardDeck {
    type Item = RenderedCard;
    type IntoIter = std::vec::IntoIter<RenderedCard>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

impl<'a> IntoIterator for &'a CardDeck {
    type Item = &'a RenderedCard;
    type IntoIter = std::slice::Iter<'a, RenderedCard>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_px_new() {
        let rect = RectPx::new(10, 20, 100, 200);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 220);
    }

    #[test]
    fn rect_clamps_to_canvas() {
        let rect = RectPx::new(1000, 50, 200, 40).clamp_to(SizePx::new(1080, 1080));
        assert_eq!(rect.width, 80);
        assert_eq!(rect.height, 40);

        let outside = RectPx::new(2000, 2000, 10, 10).clamp_to(SizePx::new(100, 100));
        assert_eq!(outside.width, 0);
        assert_eq!(outside.height, 0);
    }

    #[test]
    fn aspect_canvas_sizes() {
        assert!(AspectRatio::Square.canvas().is_square());
        assert_eq!(AspectRatio::Story.canvas(), SizePx::new(1080, 1920));
    }

    #[test]
    fn aspect_serializes_kebab_case() {
        let json = serde_json::to_string(&AspectRatio::Story).unwrap();
        assert_eq!(json, "\"story\"");
    }

    #[test]
    fn card_file_name_uses_index() {
        let card = RenderedCard::new(3, RgbaImage::new(4, 4));
        assert_eq!(card.file_name(), "card_03.png");
    }

    #[test]
    fn card_png_has_signature() {
        let card = RenderedCard::new(1, RgbaImage::new(8, 8));
        let png = card.to_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn deck_operations() {
        let mut deck = CardDeck::new();
        assert!(deck.is_empty());

        deck.push(RenderedCard::new(1, RgbaImage::new(2, 2)));
        deck.push(RenderedCard::new(2, RgbaImage::new(2, 2)));

        assert_eq!(deck.len(), 2);
        assert_eq!(deck.find_by_index(2).unwrap().index, 2);
        assert!(deck.find_by_index(5).is_none());
    }
}
