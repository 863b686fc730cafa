//! Content layer: one renderer per slide kind.
//!
//! Every renderer works inside a [`Frame`], the part of the canvas between
//! the header row and the bottom margin, and sizes its text blocks so they
//! never leave it.

mod bar;
mod boxed;
mod cover;
mod data;
mod outro;
mod quote;

use image::{Rgba, RgbaImage};

use super::paint::fill_rect;
use super::{HeaderFootprint, LayerConfig, LayerEffect, RenderContext, Scene};
use crate::card::RectPx;
use crate::color::AccentColor;
use crate::error::CardResult;
use crate::plan::SlideKind;
use crate::profile::{Branding, LayoutSettings};
use crate::text::{
    FitRange, FontInstance, TextBlock, fit_font, shrink_to_fit, wrap_headline_balanced,
};

/// Size step used when shrinking body copy.
const BODY_STEP: f32 = 2.0;

/// Body copy is drawn slightly off-white so headings stand out.
const BODY_COLOR: Rgba<u8> = Rgba([235, 235, 235, 255]);

/// Configuration for the content layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutConfig {
    pub settings: LayoutSettings,
    /// Outro slogan, brand line and QR caption.
    pub branding: Branding,
}

impl LayoutConfig {
    pub fn new(settings: LayoutSettings, branding: Branding) -> Self {
        Self { settings, branding }
    }

    fn heading_range(&self) -> FitRange {
        let s = &self.settings;
        FitRange::new(s.heading_max_size, s.heading_min_size, s.heading_size_step)
    }

    fn body_range(&self) -> FitRange {
        FitRange::new(self.settings.body_size, self.settings.body_min_size, BODY_STEP)
    }

    /// Auto-fitted heading, split into two balanced lines where possible.
    ///
    /// When the balanced block is taller than `max_height` or wider than
    /// `width` the heading is re-wrapped greedily at decreasing sizes instead.
    fn heading_block(&self, scene: &Scene<'_>, text: &str, width: f32, max_height: f32) -> TextBlock<FontInstance> {
        let face = &scene.assets.fonts.heading;
        let font = fit_font(text, face, width, self.heading_range(), self.settings.heading_fit_tolerance);
        let lines = wrap_headline_balanced(text, &font, width);
        let block = TextBlock::new(lines, font, self.settings.line_spacing);
        let fits = block.height() <= max_height && block.width() <= width;
        if fits || text.trim().is_empty() {
            return block;
        }
        let range = FitRange::new(block.font.px(), self.settings.heading_min_size, self.settings.heading_size_step);
        shrink_to_fit(text, face, range, width, max_height, self.settings.line_spacing)
    }

    fn body_block(&self, scene: &Scene<'_>, text: &str, width: f32, max_height: f32) -> TextBlock<FontInstance> {
        shrink_to_fit(
            text,
            &scene.assets.fonts.body,
            self.body_range(),
            width,
            max_height.max(0.0),
            self.settings.line_spacing,
        )
    }

    /// Draws the accent rule with its top-left at (`x`, `y`).
    fn draw_rule(&self, canvas: &mut RgbaImage, x: f32, y: f32, accent: AccentColor) {
        let s = &self.settings;
        fill_rect(
            canvas,
            RectPx::new(x.max(0.0) as u32, y.max(0.0) as u32, s.rule_width, s.rule_thickness),
            accent.opaque(),
        );
    }

    fn gap(&self) -> f32 {
        self.settings.block_gap as f32
    }
}

impl LayerConfig for LayoutConfig {
    fn differs_from(&self, other: &Self) -> bool {
        self != other
    }
}

impl LayerEffect for LayoutConfig {
    fn transform(&self, ctx: &mut RenderContext, scene: &Scene<'_>) -> CardResult<()> {
        let frame = Frame::new(&self.settings, ctx, scene);
        match scene.slide.kind {
            SlideKind::Cover => cover::draw(self, ctx, scene, frame),
            SlideKind::ContentBox => boxed::draw(self, ctx, scene, frame),
            SlideKind::ContentBar => bar::draw(self, ctx, scene, frame),
            SlideKind::ContentQuote => quote::draw(self, ctx, scene, frame),
            SlideKind::ContentData => data::draw(self, ctx, scene, frame),
            SlideKind::Outro => outro::draw(self, ctx, scene, frame),
        }
        Ok(())
    }
}

// ============================================================================
// Frame
// ============================================================================

/// The drawable area of a card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Frame {
    /// Left edge of the text column.
    pub left: f32,
    pub width: f32,
    /// First row below the header (plus a gap), or the top margin.
    pub top: f32,
    /// Lowest row text may reach.
    pub bottom: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl Frame {
    fn new(s: &LayoutSettings, ctx: &RenderContext, scene: &Scene<'_>) -> Self {
        let top = ctx
            .get::<HeaderFootprint>()
            .map_or(s.top_margin, |h| h.bottom + s.block_gap);
        let height = scene.canvas.height as f32;
        Self {
            left: s.margin as f32,
            width: scene.column_width(s.margin) as f32,
            top: top as f32,
            bottom: (height - s.bottom_margin as f32).max(top as f32),
            canvas_width: scene.canvas.width as f32,
            canvas_height: height,
        }
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        self.canvas_width / 2.0
    }
}

// ============================================================================
// Drawing helpers
// ============================================================================

/// Draws a block left-aligned at `x` with its first line box at `y`.
/// Returns the block's bottom edge.
fn draw_block(canvas: &mut RgbaImage, block: &TextBlock<FontInstance>, x: f32, y: f32, color: Rgba<u8>) -> f32 {
    for (i, line) in block.lines.iter().enumerate() {
        block.font.draw(canvas, x, y + i as f32 * block.advance, line, color);
    }
    y + block.height()
}

/// Draws a block with every line centered on `cx`. Returns the bottom edge.
fn draw_block_centered(
    canvas: &mut RgbaImage,
    block: &TextBlock<FontInstance>,
    cx: f32,
    y: f32,
    color: Rgba<u8>,
) -> f32 {
    for (i, line) in block.lines.iter().enumerate() {
        block.font.draw_centered(canvas, cx, y + i as f32 * block.advance, line, color);
    }
    y + block.height()
}
