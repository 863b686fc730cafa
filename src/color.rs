//! Accent color handling.
//!
//! A deck shares one accent color. It either comes from the planning
//! collaborator as a hex string or is sampled from the primary background.

use std::fmt;
use std::sync::LazyLock;

use image::{Rgba, RgbaImage, imageops};
use palette::{IntoColor, Lab, Srgb};
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#([0-9A-Fa-f]{6}|[0-9A-Fa-f]{3})\b|\b([0-9A-Fa-f]{6})\b")
        .expect("static hex color pattern")
});

/// CIE L* below which a color counts as dark.
const DARK_LIGHTNESS: f32 = 50.0;

/// Side length of the thumbnail used for dominant-color sampling.
const SAMPLE_EDGE: u32 = 64;

/// An opaque RGB accent color. Serializes as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccentColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AccentColor {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const INK: Self = Self::new(17, 17, 17);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses the first hex color found in `text` (`#RRGGBB`, `RRGGBB` or
    /// `#RGB`). Returns `None` when there is none.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = HEX_COLOR.captures(text)?;
        let digits = caps.get(1).or_else(|| caps.get(2))?.as_str();
        let expanded: String = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };
        let value = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self::new(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ))
    }

    /// Parses `text`, falling back to `default` when it holds no valid color.
    pub fn parse_or(text: Option<&str>, default: Self) -> Self {
        text.and_then(Self::parse).unwrap_or(default)
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Perceptual lightness (CIE L*, 0-100).
    pub fn lightness(&self) -> f32 {
        let rgb: Srgb = Srgb::new(self.r, self.g, self.b).into_format();
        let lab: Lab = rgb.into_color();
        lab.l
    }

    /// True when the perceptual lightness is below 50%.
    pub fn is_dark(&self) -> bool {
        self.lightness() < DARK_LIGHTNESS
    }

    /// A text color that reads on top of this color: white on dark accents,
    /// near-black ink on light ones.
    pub fn foreground(&self) -> Self {
        if self.is_dark() { Self::WHITE } else { Self::INK }
    }

    pub fn rgba(&self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }

    pub fn opaque(&self) -> Rgba<u8> {
        self.rgba(255)
    }
}

impl fmt::Display for AccentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<AccentColor> for String {
    fn from(color: AccentColor) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for AccentColor {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text).ok_or_else(|| format!("invalid hex color {text:?}"))
    }
}

/// Samples the dominant color of an image.
///
/// Equivalent to quantizing to a single-entry adaptive palette: the image is
/// reduced to a thumbnail and its alpha-weighted mean color is returned.
pub fn dominant_color(image: &RgbaImage) -> AccentColor {
    let sample = if image.width() > SAMPLE_EDGE || image.height() > SAMPLE_EDGE {
        imageops::thumbnail(image, SAMPLE_EDGE, SAMPLE_EDGE)
    } else {
        image.clone()
    };

    let mut total = [0u64; 3];
    let mut total_a: u64 = 0;
    for pixel in sample.pixels() {
        let a = pixel[3] as u64;
        total[0] += pixel[0] as u64 * a;
        total[1] += pixel[1] as u64 * a;
        total[2] += pixel[2] as u64 * a;
        total_a += a;
    }

    if total_a == 0 {
        return AccentColor::new(128, 128, 128);
    }

    let channel = |sum: u64| ((sum + total_a / 2) / total_a).min(255) as u8;
    AccentColor::new(channel(total[0]), channel(total[1]), channel(total[2]))
}
