//! Serializable render profile.
//!
//! A [`RenderProfile`] captures every tunable of a job: canvas aspect, color
//! policy, layout metrics, background treatment constants, branding strings
//! and asset sources. It round-trips through JSON so a tuned look can be
//! stored next to a deck and reused.
//!
//! # Example
//!
//! ```
//! use cardnews_renderer::{AspectRatio, RenderProfile};
//!
//! let mut profile = RenderProfile::new();
//! profile.aspect = AspectRatio::Story;
//! profile.background.content_blur_sigma = 12.0;
//!
//! let json = profile.to_json().unwrap();
//! let restored = RenderProfile::from_json(&json).unwrap();
//! assert_eq!(restored.aspect, AspectRatio::Story);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::card::AspectRatio;
use crate::color::AccentColor;
use crate::error::CardResult;

// ============================================================================
// Layout
// ============================================================================

/// Margins, type sizes and decoration metrics shared by the layout renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    /// Left/right margin of the content column.
    pub margin: u32,
    /// Distance from the top edge to the header row.
    pub top_margin: u32,
    /// Distance from the bottom edge to the lowest text line.
    pub bottom_margin: u32,
    /// Line advance as a multiple of the font's ascent-descent height.
    pub line_spacing: f32,
    /// Vertical gap between a heading block and its body block.
    pub block_gap: u32,
    /// Largest heading size tried by the auto-fit search.
    pub heading_max_size: f32,
    /// Smallest heading size the auto-fit search may return.
    pub heading_min_size: f32,
    /// Step of the auto-fit search.
    pub heading_size_step: f32,
    /// Measured single-line width may exceed the column by this factor.
    pub heading_fit_tolerance: f32,
    pub body_size: f32,
    pub body_min_size: f32,
    /// Numeral size on data callouts.
    pub data_size: f32,
    /// Size of the watermark quotation glyph.
    pub quote_glyph_size: f32,
    /// Alpha of the watermark quotation glyph.
    pub quote_glyph_alpha: u8,
    pub rule_width: u32,
    pub rule_thickness: u32,
    pub bar_width: u32,
    /// Gap between the vertical bar and the text column.
    pub bar_gap: u32,
    /// Top of the text block on bar layouts.
    pub bar_top: u32,
    pub box_padding: u32,
    pub box_radius: u32,
    /// Alpha of the black glass panel.
    pub glass_alpha: u8,
    /// The glass panel never starts above this offset.
    pub box_min_top: u32,
    pub outro_slogan_size: f32,
    pub outro_brand_size: f32,
    pub outro_caption_size: f32,
    pub qr_size: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            margin: 80,
            top_margin: 64,
            bottom_margin: 96,
            line_spacing: 1.35,
            block_gap: 36,
            heading_max_size: 112.0,
            heading_min_size: 56.0,
            heading_size_step: 4.0,
            heading_fit_tolerance: 1.9,
            body_size: 44.0,
            body_min_size: 30.0,
            data_size: 220.0,
            quote_glyph_size: 420.0,
            quote_glyph_alpha: 56,
            rule_width: 120,
            rule_thickness: 8,
            bar_width: 10,
            bar_gap: 32,
            bar_top: 260,
            box_padding: 56,
            box_radius: 32,
            glass_alpha: 160,
            box_min_top: 200,
            outro_slogan_size: 76.0,
            outro_brand_size: 40.0,
            outro_caption_size: 30.0,
            qr_size: 260,
        }
    }
}

// ============================================================================
// Background
// ============================================================================

/// Constants of the three background treatments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackgroundSettings {
    /// Brightness multiplier applied to the cover photo.
    pub cover_brightness: f32,
    /// Row ratio (0-1) where the cover gradient starts.
    pub gradient_threshold: f32,
    /// Exponent sharpening the gradient transition.
    pub gradient_gamma: f32,
    /// Alpha reached at the bottom row.
    pub gradient_max_alpha: u8,
    /// Gaussian sigma for content-slide backgrounds.
    pub content_blur_sigma: f32,
    /// Brightness multiplier applied after the blur.
    pub content_brightness: f32,
    /// Flat color used when no background image is available.
    pub placeholder_color: String,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            cover_brightness: 0.85,
            gradient_threshold: 0.3,
            gradient_gamma: 1.6,
            gradient_max_alpha: 245,
            content_blur_sigma: 18.0,
            content_brightness: 0.55,
            placeholder_color: "#1a1a2e".into(),
        }
    }
}

impl BackgroundSettings {
    pub fn placeholder(&self) -> AccentColor {
        AccentColor::parse_or(Some(&self.placeholder_color), AccentColor::new(26, 26, 46))
    }
}

// ============================================================================
// Overlay
// ============================================================================

/// Header row: logo, category badge and page counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub symbol_height: u32,
    pub wordmark_height: u32,
    /// Gap between symbol and wordmark, and between logo and badge.
    pub logo_gap: u32,
    /// Mean luma (0-255) under the logo below which it is recolored white.
    pub luminance_threshold: f32,
    /// Size of the text label drawn when no logo asset is available.
    pub label_size: f32,
    pub badge_size: f32,
    pub badge_padding_x: u32,
    pub badge_padding_y: u32,
    pub counter_size: f32,
    pub counter_stroke: u32,
    pub show_page_counter: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            symbol_height: 60,
            wordmark_height: 38,
            logo_gap: 16,
            luminance_threshold: 140.0,
            label_size: 36.0,
            badge_size: 28.0,
            badge_padding_x: 22,
            badge_padding_y: 10,
            counter_size: 32.0,
            counter_stroke: 3,
            show_page_counter: true,
        }
    }
}

// ============================================================================
// Branding and assets
// ============================================================================

/// Brand strings and logo asset locations (file paths or http(s) URLs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branding {
    pub brand_name: String,
    pub slogan: String,
    pub brand_line: String,
    pub qr_caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_wordmark: Option<String>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            brand_name: "세계일보".into(),
            slogan: "First in, Last out".into(),
            brand_line: "세상을 보는 눈, 세계일보".into(),
            qr_caption: "기사 원문 보기".into(),
            logo_symbol: None,
            logo_wordmark: None,
        }
    }
}

/// Where font bytes come from, and where fetched assets are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontSources {
    pub heading: String,
    pub body: String,
    pub serif: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for FontSources {
    fn default() -> Self {
        Self {
            heading: "https://github.com/google/fonts/raw/main/ofl/blackhansans/BlackHanSans-Regular.ttf"
                .into(),
            body: "https://github.com/google/fonts/raw/main/ofl/nanumgothic/NanumGothic-Bold.ttf"
                .into(),
            serif: "https://github.com/google/fonts/raw/main/ofl/nanummyeongjo/NanumMyeongjo-ExtraBold.ttf"
                .into(),
            cache_dir: None,
        }
    }
}

// ============================================================================
// Planning and acquisition
// ============================================================================

/// Planning collaborator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanSettings {
    /// Exact slide count of a repaired plan (clamped to 4..=8).
    pub slide_count: usize,
    pub primary_model: String,
    pub fallback_model: String,
    /// Body characters embedded in the prompt.
    pub prompt_char_limit: usize,
    /// Minimum extracted body length before planning is attempted.
    pub min_body_chars: usize,
    pub request_timeout_secs: u64,
}

impl PlanSettings {
    /// Slide count clamped to the valid plan range.
    pub fn target_slides(&self) -> usize {
        self.slide_count.clamp(4, 8)
    }
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            slide_count: 8,
            primary_model: "gemini-2.0-flash-exp".into(),
            fallback_model: "gemini-1.5-flash".into(),
            prompt_char_limit: 4000,
            min_body_chars: 50,
            request_timeout_secs: 60,
        }
    }
}

/// Background pool selection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolSettings {
    pub min_width: u32,
    pub min_height: u32,
    pub max_images: usize,
    pub download_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min_width: 300,
            min_height: 300,
            max_images: 5,
            download_timeout_secs: 5,
        }
    }
}

// ============================================================================
// RenderProfile
// ============================================================================

/// A serializable profile containing every job setting.
///
/// # JSON Format
///
/// ```json
/// {
///   "aspect": "square",
///   "autoColor": false,
///   "accentFallback": "#FFD700",
///   "layout": { "margin": 80, "glassAlpha": 160 },
///   "background": { "gradientThreshold": 0.3 }
/// }
/// ```
///
/// Missing sections and fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderProfile {
    pub aspect: AspectRatio,
    /// Sample the accent from the primary background instead of trusting the
    /// planner's suggestion.
    pub auto_color: bool,
    /// Accent used when the planner's suggestion is missing or malformed.
    pub accent_fallback: String,
    pub layout: LayoutSettings,
    pub background: BackgroundSettings,
    pub overlay: OverlaySettings,
    pub branding: Branding,
    pub fonts: FontSources,
    pub plan: PlanSettings,
    pub pool: PoolSettings,
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::Square,
            auto_color: false,
            accent_fallback: "#FFD700".into(),
            layout: LayoutSettings::default(),
            background: BackgroundSettings::default(),
            overlay: OverlaySettings::default(),
            branding: Branding::default(),
            fonts: FontSources::default(),
            plan: PlanSettings::default(),
            pool: PoolSettings::default(),
        }
    }
}

impl RenderProfile {
    /// Creates a profile with every setting at its default.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aspect(mut self, aspect: AspectRatio) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_auto_color(mut self, auto_color: bool) -> Self {
        self.auto_color = auto_color;
        self
    }

    pub fn with_branding(mut self, branding: Branding) -> Self {
        self.branding = branding;
        self
    }

    /// The accent used when no other source yields one.
    pub fn fallback_accent(&self) -> AccentColor {
        AccentColor::parse_or(Some(&self.accent_fallback), AccentColor::new(255, 215, 0))
    }

    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads a profile from a JSON file.
    pub fn from_path(path: &Path) -> CardResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
