//! Font faces backed by `rusttype`.
//!
//! A [`Face`] owns parsed font data for one role. Pixel size is not part of
//! a face's identity: [`Face::at`] builds a cheap [`FontInstance`] for each
//! size a layout asks for.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rusttype::{Font, Scale, point};
use serde::{Deserialize, Serialize};

use super::{Measure, Scalable};
use crate::error::{CardError, CardResult};
use crate::layer::paint::blend_pixel;

/// Logical font roles used by the layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontRole {
    /// Display face for headings and numerals.
    Heading,
    /// Running text.
    Body,
    /// Serif display face for the closing slogan.
    Serif,
}

impl FontRole {
    pub const ALL: [FontRole; 3] = [FontRole::Heading, FontRole::Body, FontRole::Serif];

    pub fn name(self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Body => "body",
            Self::Serif => "serif",
        }
    }
}

impl fmt::Display for FontRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed font data, shareable across threads and sizes.
#[derive(Clone)]
pub struct Face {
    font: Arc<Font<'static>>,
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl Face {
    /// Parses TrueType/OpenType bytes (the first face of a collection).
    pub fn from_bytes(bytes: Vec<u8>) -> CardResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| CardError::font("font data could not be parsed"))?;
        Ok(Self { font: Arc::new(font) })
    }

    pub fn from_path(path: &Path) -> CardResult<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Instantiates the face at `px` pixels.
    pub fn at(&self, px: f32) -> FontInstance {
        FontInstance {
            font: Arc::clone(&self.font),
            scale: Scale::uniform(px.max(1.0)),
        }
    }
}

impl Scalable for Face {
    type Instance = FontInstance;

    fn at(&self, px: f32) -> FontInstance {
        Face::at(self, px)
    }
}

/// Text outline drawn beneath a fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: u32,
    pub color: Rgba<u8>,
}

/// A face at one pixel size.
#[derive(Clone)]
pub struct FontInstance {
    font: Arc<Font<'static>>,
    scale: Scale,
}

impl fmt::Debug for FontInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontInstance").field("px", &self.scale.y).finish()
    }
}

impl FontInstance {
    pub fn px(&self) -> f32 {
        self.scale.y
    }

    pub fn ascent(&self) -> f32 {
        self.font.v_metrics(self.scale).ascent
    }

    /// Distance below the baseline (positive).
    pub fn descent(&self) -> f32 {
        -self.font.v_metrics(self.scale).descent
    }

    /// Draws `text` with its line box's top-left corner at (`x`, `y`).
    pub fn draw(&self, canvas: &mut RgbaImage, x: f32, y: f32, text: &str, color: Rgba<u8>) {
        let baseline = y + self.ascent();
        for glyph in self.font.layout(text, self.scale, point(x, baseline)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                blend_pixel(
                    canvas,
                    bb.min.x + gx as i32,
                    bb.min.y + gy as i32,
                    color,
                    coverage,
                );
            });
        }
    }

    /// Draws `text` over an outline described by `stroke`.
    pub fn draw_stroked(
        &self,
        canvas: &mut RgbaImage,
        x: f32,
        y: f32,
        text: &str,
        color: Rgba<u8>,
        stroke: Stroke,
    ) {
        let r = stroke.width as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                if (dx != 0 || dy != 0) && dx * dx + dy * dy <= r * r {
                    self.draw(canvas, x + dx as f32, y + dy as f32, text, stroke.color);
                }
            }
        }
        self.draw(canvas, x, y, text, color);
    }

    /// Draws `text` horizontally centered on `cx`.
    pub fn draw_centered(&self, canvas: &mut RgbaImage, cx: f32, y: f32, text: &str, color: Rgba<u8>) {
        let x = cx - self.measure(text) / 2.0;
        self.draw(canvas, x, y, text, color);
    }
}

impl Measure for FontInstance {
    fn measure(&self, text: &str) -> f32 {
        let mut width: f32 = 0.0;
        for glyph in self.font.layout(text, self.scale, point(0.0, 0.0)) {
            let end = glyph.position().x + glyph.unpositioned().h_metrics().advance_width;
            width = width.max(end);
        }
        width
    }

    fn line_height(&self) -> f32 {
        let v = self.font.v_metrics(self.scale);
        v.ascent - v.descent
    }
}

/// The three faces a deck is rendered with.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub heading: Face,
    pub body: Face,
    pub serif: Face,
}

impl FontSet {
    pub fn new(heading: Face, body: Face, serif: Face) -> Self {
        Self { heading, body, serif }
    }

    /// A set that uses one face for every role.
    pub fn uniform(face: Face) -> Self {
        Self {
            heading: face.clone(),
            body: face.clone(),
            serif: face,
        }
    }
}

/// Well-known locations of CJK-capable system fonts, most preferred first.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/nanum/NanumGothicBold.ttf",
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "/Library/Fonts/AppleGothic.ttf",
    "C:\\Windows\\Fonts\\malgun.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
];

/// Loads the first parseable system font from [`SYSTEM_FONT_CANDIDATES`].
pub fn system_fallback() -> Option<Face> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .filter(|path| path.is_file())
        .find_map(|path| match Face::from_path(path) {
            Ok(face) => {
                tracing::debug!(path = %path.display(), "using system font");
                Some(face)
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "system font unusable");
                None
            }
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Path of the bundled test font (public-domain Tuffy, Latin only;
    /// Hangul falls back to its outlined notdef box).
    pub(crate) const FIXTURE_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/Tuffy.ttf");

    pub(crate) fn fixture_face() -> Face {
        Face::from_bytes(include_bytes!("../../tests/fixtures/Tuffy.ttf").to_vec()).expect("bundled test font")
    }

    pub(crate) fn fixture_fonts() -> FontSet {
        FontSet::uniform(fixture_face())
    }

    #[test]
    fn garbage_bytes_are_a_font_error() {
        let err = Face::from_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, CardError::Font(_)));
    }

    #[test]
    fn role_names() {
        assert_eq!(FontRole::ALL.map(FontRole::name), ["heading", "body", "serif"]);
        assert_eq!(FontRole::Serif.to_string(), "serif");
    }

    #[test]
    fn measure_grows_with_text_and_size() {
        let fonts = fixture_fonts();
        let small = fonts.body.at(20.0);
        let large = fonts.body.at(40.0);

        assert_eq!(small.measure(""), 0.0);
        assert!(small.measure("abc") < small.measure("abcdef"));
        assert!(small.measure("abc") < large.measure("abc"));
        assert!(large.line_height() > small.line_height());
    }

    #[test]
    fn draw_marks_pixels_inside_line_box() {
        let fonts = fixture_fonts();
        let font = fonts.heading.at(48.0);
        let mut canvas = RgbaImage::from_pixel(200, 80, Rgba([0, 0, 0, 255]));

        font.draw(&mut canvas, 10.0, 10.0, "Hi", Rgba([255, 255, 255, 255]));

        let lit = canvas.pixels().filter(|p| p[0] > 128).count();
        assert!(lit > 0);
        assert!(canvas.get_pixel(199, 79)[0] == 0);
    }

    #[test]
    fn missing_glyphs_still_draw_a_box() {
        let font = fixture_face().at(48.0);
        let mut canvas = RgbaImage::from_pixel(200, 80, Rgba([0, 0, 0, 255]));

        font.draw(&mut canvas, 10.0, 10.0, "가", Rgba([255, 255, 255, 255]));

        assert!(font.measure("가") > 0.0);
        assert!(canvas.pixels().any(|p| p[0] > 128));
    }
}
