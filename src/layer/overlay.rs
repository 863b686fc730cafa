//! Header overlay: brand logo, category badge and page counter.

use image::{Rgba, RgbaImage};

use super::paint::{fill_pill, mean_luma};
use super::svg::composite_over;
use super::{HeaderFootprint, LayerConfig, LayerEffect, RenderContext, Scene};
use crate::card::RectPx;
use crate::color::AccentColor;
use crate::error::CardResult;
use crate::plan::SlideKind;
use crate::profile::{Branding, LayoutSettings, OverlaySettings};
use crate::text::{FontInstance, Measure, Stroke};

// ============================================================================
// OverlayConfig
// ============================================================================

/// Configuration for the header row drawn on every slide except the outro.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub settings: OverlaySettings,
    /// Left/right inset of the header row.
    pub margin: u32,
    /// Top inset of the header row.
    pub top_margin: u32,
    /// Text drawn in place of the logo when no logo asset is available.
    pub brand_name: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::new(
            OverlaySettings::default(),
            &LayoutSettings::default(),
            &Branding::default(),
        )
    }
}

impl OverlayConfig {
    pub fn new(settings: OverlaySettings, layout: &LayoutSettings, branding: &Branding) -> Self {
        Self {
            settings,
            margin: layout.margin,
            top_margin: layout.top_margin,
            brand_name: branding.brand_name.clone(),
        }
    }

    /// Positions every header element for `scene`.
    fn place(&self, scene: &Scene<'_>) -> HeaderLayout {
        let s = &self.settings;
        let fonts = &scene.assets.fonts;
        let logo = &scene.assets.logo;
        let (x, y) = (self.margin, self.top_margin);

        let mark = if logo.is_empty() {
            let font = fonts.heading.at(s.label_size);
            let width = font.measure(&self.brand_name).ceil() as u32;
            let height = font.line_height().ceil() as u32;
            Mark::Label { font, rect: RectPx::new(x, y, width, height) }
        } else {
            let symbol_w = logo.symbol.as_ref().map_or(0, RgbaImage::width);
            let wordmark_w = logo.wordmark.as_ref().map_or(0, RgbaImage::width);
            let gap = if symbol_w > 0 && wordmark_w > 0 { s.logo_gap } else { 0 };
            let height = logo
                .symbol
                .iter()
                .chain(logo.wordmark.iter())
                .map(RgbaImage::height)
                .max()
                .unwrap_or(0);
            Mark::Logo {
                rect: RectPx::new(x, y, symbol_w + gap + wordmark_w, height),
                wordmark_x: x + symbol_w + gap,
            }
        };
        let mark_rect = mark.rect();

        let badge = scene.slide.tag.as_deref().filter(|t| !t.trim().is_empty()).map(|tag| {
            let font = fonts.body.at(s.badge_size);
            let width = font.measure(tag).ceil() as u32 + s.badge_padding_x * 2;
            let height = font.line_height().ceil() as u32 + s.badge_padding_y * 2;
            let top = centered(mark_rect, height);
            Badge {
                text: tag.trim().to_string(),
                font,
                rect: RectPx::new(mark_rect.right() + s.logo_gap, top, width, height),
            }
        });

        let counter = s.show_page_counter.then(|| {
            let font = fonts.body.at(s.counter_size);
            let text = format!("{} / {}", scene.slide.index, scene.slide.total);
            let width = font.measure(&text).ceil() as u32;
            let height = font.line_height().ceil() as u32;
            let left = scene.canvas.width.saturating_sub(self.margin + width);
            Counter {
                rect: RectPx::new(left, centered(mark_rect, height), width, height),
                text,
                font,
            }
        });

        HeaderLayout { mark, badge, counter }
    }
}

/// Top edge that vertically centers an element of `height` on `anchor`.
fn centered(anchor: RectPx, height: u32) -> u32 {
    let offset = (anchor.height as i64 - height as i64) / 2;
    (anchor.y as i64 + offset).max(0) as u32
}

// ============================================================================
// Geometry
// ============================================================================

enum Mark {
    Logo { rect: RectPx, wordmark_x: u32 },
    Label { font: FontInstance, rect: RectPx },
}

impl Mark {
    fn rect(&self) -> RectPx {
        match self {
            Self::Logo { rect, .. } | Self::Label { rect, .. } => *rect,
        }
    }
}

struct Badge {
    text: String,
    font: FontInstance,
    rect: RectPx,
}

struct Counter {
    text: String,
    font: FontInstance,
    rect: RectPx,
}

struct HeaderLayout {
    mark: Mark,
    badge: Option<Badge>,
    counter: Option<Counter>,
}

impl HeaderLayout {
    fn footprint(&self) -> HeaderFootprint {
        let mark = self.mark.rect();
        let mut bottom = mark.bottom();
        let mut right = mark.right();
        if let Some(badge) = &self.badge {
            bottom = bottom.max(badge.rect.bottom());
            right = badge.rect.right();
        }
        if let Some(counter) = &self.counter {
            bottom = bottom.max(counter.rect.bottom());
        }
        HeaderFootprint { bottom, right }
    }
}

// ============================================================================
// Layer
// ============================================================================

impl LayerConfig for OverlayConfig {
    fn differs_from(&self, other: &Self) -> bool {
        self != other
    }
}

impl LayerEffect for OverlayConfig {
    fn transform(&self, ctx: &mut RenderContext, scene: &Scene<'_>) -> CardResult<()> {
        if scene.slide.kind == SlideKind::Outro {
            return Ok(());
        }
        let header = self.place(scene);
        let mark_rect = header.mark.rect();

        // Chameleon logo: white on dark photos, untouched on light ones.
        let luma = mean_luma(&ctx.image, mark_rect);
        let on_dark = luma < self.settings.luminance_threshold;
        tracing::trace!(luma, on_dark, "logo backdrop sampled");

        match &header.mark {
            Mark::Logo { rect, wordmark_x } => {
                let logo = &scene.assets.logo;
                if let Some(symbol) = &logo.symbol {
                    paste_logo(&mut ctx.image, symbol, rect.x, centered(*rect, symbol.height()), on_dark);
                }
                if let Some(wordmark) = &logo.wordmark {
                    let top = centered(*rect, wordmark.height());
                    paste_logo(&mut ctx.image, wordmark, *wordmark_x, top, on_dark);
                }
            }
            Mark::Label { font, rect } => {
                let color = if on_dark { AccentColor::WHITE } else { AccentColor::INK };
                font.draw(&mut ctx.image, rect.x as f32, rect.y as f32, &self.brand_name, color.opaque());
            }
        }

        if let Some(badge) = &header.badge {
            let accent = scene.assets.accent;
            fill_pill(&mut ctx.image, badge.rect, accent.opaque());
            badge.font.draw(
                &mut ctx.image,
                (badge.rect.x + self.settings.badge_padding_x) as f32,
                (badge.rect.y + self.settings.badge_padding_y) as f32,
                &badge.text,
                accent.foreground().opaque(),
            );
        }

        if let Some(counter) = &header.counter {
            counter.font.draw_stroked(
                &mut ctx.image,
                counter.rect.x as f32,
                counter.rect.y as f32,
                &counter.text,
                AccentColor::WHITE.opaque(),
                Stroke {
                    width: self.settings.counter_stroke,
                    color: Rgba([0, 0, 0, 255]),
                },
            );
        }
        Ok(())
    }

    fn emit(&self, ctx: &mut RenderContext, scene: &Scene<'_>) {
        if scene.slide.kind != SlideKind::Outro {
            ctx.set(self.place(scene).footprint());
        }
    }
}

/// Pastes a logo part, recolored to white (alpha kept) when `whiten` is set.
fn paste_logo(canvas: &mut RgbaImage, part: &RgbaImage, x: u32, y: u32, whiten: bool) {
    if whiten {
        composite_over(canvas, &whitened(part), x as i32, y as i32);
    } else {
        composite_over(canvas, part, x as i32, y as i32);
    }
}

/// Replaces every pixel's RGB with white, keeping the alpha mask.
pub fn whitened(part: &RgbaImage) -> RgbaImage {
    let mut out = part.clone();
    for p in out.pixels_mut() {
        p.0 = [255, 255, 255, p[3]];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{BackgroundPool, DeckAssets, LogoParts};
    use crate::card::SizePx;
    use crate::plan::SlideSpec;
    use crate::text::face::tests::fixture_fonts;

    const CANVAS: SizePx = SizePx { width: 1080, height: 1080 };

    fn logo() -> LogoParts {
        LogoParts {
            symbol: Some(RgbaImage::from_pixel(60, 60, Rgba([20, 40, 200, 255]))),
            wordmark: Some(RgbaImage::from_pixel(150, 38, Rgba([20, 40, 200, 255]))),
        }
    }

    /// Draws the header; `None` when the slide has no header row.
    fn render(background: [u8; 3], logo: LogoParts, slide: &SlideSpec) -> Option<(RgbaImage, HeaderFootprint)> {
        let fonts = fixture_fonts();
        let assets = DeckAssets {
            pool: BackgroundPool::placeholder(SizePx::new(8, 8), AccentColor::INK),
            fonts,
            logo,
            accent: AccentColor::new(255, 215, 0),
        };
        let scene = Scene { slide, assets: &assets, source_url: "", canvas: CANVAS };
        let [r, g, b] = background;
        let mut ctx = RenderContext::new(RgbaImage::from_pixel(1080, 1080, Rgba([r, g, b, 255])));
        let config = OverlayConfig::default();
        config.transform(&mut ctx, &scene).unwrap();
        config.emit(&mut ctx, &scene);
        let footprint = *ctx.get::<HeaderFootprint>()?;
        Some((ctx.image, footprint))
    }

    fn content_slide() -> SlideSpec {
        let mut slide = SlideSpec::new(SlideKind::ContentBox, "h", "b");
        slide.index = 3;
        slide.total = 8;
        slide
    }

    #[test]
    fn logo_turns_white_on_dark_backgrounds() {
        let (image, _) = render([10, 10, 10], logo(), &content_slide()).expect("header drawn");
        assert_eq!(image.get_pixel(80 + 30, 64 + 30).0, [255, 255, 255, 255]);
    }

    #[test]
    fn logo_is_untouched_on_light_backgrounds() {
        let (image, _) = render([240, 240, 240], logo(), &content_slide()).expect("header drawn");
        assert_eq!(image.get_pixel(80 + 30, 64 + 30).0, [20, 40, 200, 255]);
        // wordmark starts after the symbol and the gap
        assert_eq!(image.get_pixel(80 + 60 + 16 + 5, 64 + 30).0, [20, 40, 200, 255]);
    }

    #[test]
    fn badge_sits_right_of_logo_in_accent() {
        let mut slide = content_slide();
        slide.tag = Some("단독".into());
        let (image, footprint) = render([10, 10, 10], logo(), &slide).expect("header drawn");

        let logo_right = 80 + 60 + 16 + 150;
        assert!(footprint.right > logo_right + 16);
        // pill edge pixel, just inside the left cap at mid height
        let pill_mid = image.get_pixel(logo_right + 16 + 20, 64 + 30);
        assert_eq!(pill_mid.0, [255, 215, 0, 255]);
    }

    #[test]
    fn counter_is_right_aligned() {
        let (image, footprint) = render([90, 90, 90], logo(), &content_slide()).expect("header drawn");

        let lit_right = (800..1080)
            .filter(|&x| (64..140).any(|y| image.get_pixel(x, y).0 != [90, 90, 90, 255]))
            .max()
            .unwrap_or(0);
        assert!(lit_right > 900 && lit_right <= 1000 + 4);
        assert!(footprint.bottom >= 64 + 60);
    }

    #[test]
    fn text_label_stands_in_for_missing_logo() {
        let (image, footprint) = render([10, 10, 10], LogoParts::default(), &content_slide()).expect("header drawn");
        assert!(footprint.right > 80);
        let lit = (80..footprint.right)
            .flat_map(|x| (64..footprint.bottom).map(move |y| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y)[0] > 200)
            .count();
        assert!(lit > 0);
    }

    #[test]
    fn outro_has_no_header() {
        let mut slide = content_slide();
        slide.kind = SlideKind::Outro;
        assert!(render([10, 10, 10], logo(), &slide).is_none());
    }

    #[test]
    fn whitening_keeps_alpha() {
        let part = RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 99]));
        assert_eq!(whitened(&part).get_pixel(0, 0).0, [255, 255, 255, 99]);
    }
}
