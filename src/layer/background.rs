//! Background layer: the photo (or flat color) behind every card.
//!
//! Three treatments exist. The cover shows the primary photo dimmed slightly
//! with a dark gradient rising from the bottom edge. Content slides show a
//! pool photo heavily blurred and dimmed. The outro is a flat accent canvas.

use image::{Rgba, RgbaImage, imageops};

use super::{CacheKey, LayerConfig, LayerEffect, RenderContext, Scene};
use crate::card::SizePx;
use crate::error::CardResult;
use crate::plan::SlideKind;
use crate::profile::BackgroundSettings;

/// How a background image is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Treatment {
    /// Dimmed photo under a bottom gradient.
    SharpGradient,
    /// Gaussian-blurred, dimmed photo.
    BlurDim,
    /// Flat accent color.
    Solid,
}

impl Treatment {
    pub fn for_kind(kind: SlideKind) -> Self {
        match kind {
            SlideKind::Cover => Self::SharpGradient,
            SlideKind::Outro => Self::Solid,
            _ => Self::BlurDim,
        }
    }
}

/// Configuration for the background layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundConfig {
    pub settings: BackgroundSettings,
}

impl BackgroundConfig {
    pub fn new(settings: BackgroundSettings) -> Self {
        Self { settings }
    }

    /// Pool slot used for `scene`: the primary image on the cover, otherwise
    /// the deck position modulo the pool size.
    fn slot(scene: &Scene<'_>) -> usize {
        match scene.slide.kind {
            SlideKind::Cover => 0,
            _ => scene.slide.index.saturating_sub(1) % scene.assets.pool.len().max(1),
        }
    }
}

impl LayerConfig for BackgroundConfig {
    fn differs_from(&self, other: &Self) -> bool {
        self != other
    }
}

impl LayerEffect for BackgroundConfig {
    fn cache_key(&self, scene: &Scene<'_>) -> Option<CacheKey> {
        match Treatment::for_kind(scene.slide.kind) {
            Treatment::Solid => None,
            treatment => Some(CacheKey::new(
                scene.assets.pool.fingerprint(),
                Self::slot(scene),
                treatment,
                scene.canvas,
            )),
        }
    }

    fn transform(&self, ctx: &mut RenderContext, scene: &Scene<'_>) -> CardResult<()> {
        let s = &self.settings;
        let treatment = Treatment::for_kind(scene.slide.kind);
        ctx.image = match treatment {
            Treatment::Solid => {
                RgbaImage::from_pixel(scene.canvas.width, scene.canvas.height, scene.assets.accent.opaque())
            }
            Treatment::SharpGradient => {
                let mut image = cover_fit(scene.assets.pool.primary(), scene.canvas);
                dim(&mut image, s.cover_brightness);
                apply_gradient(&mut image, s.gradient_threshold, s.gradient_gamma, s.gradient_max_alpha);
                image
            }
            Treatment::BlurDim => {
                let fitted = cover_fit(scene.assets.pool.get(Self::slot(scene)), scene.canvas);
                let mut image = if s.content_blur_sigma > 0.0 {
                    imageops::fast_blur(&fitted, s.content_blur_sigma)
                } else {
                    fitted
                };
                dim(&mut image, s.content_brightness);
                image
            }
        };
        tracing::trace!(?treatment, slot = Self::slot(scene), "background prepared");
        Ok(())
    }
}

/// Scales `image` to cover `size` and center-crops the overflow.
pub fn cover_fit(image: &RgbaImage, size: SizePx) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return RgbaImage::from_pixel(size.width, size.height, Rgba([0, 0, 0, 255]));
    }
    if (w, h) == (size.width, size.height) {
        return image.clone();
    }

    let scale = (size.width as f32 / w as f32).max(size.height as f32 / h as f32);
    let sw = ((w as f32 * scale).round() as u32).max(size.width);
    let sh = ((h as f32 * scale).round() as u32).max(size.height);
    let scaled = imageops::resize(image, sw, sh, imageops::FilterType::Triangle);

    let x = (sw - size.width) / 2;
    let y = (sh - size.height) / 2;
    imageops::crop_imm(&scaled, x, y, size.width, size.height).to_image()
}

/// Multiplies RGB by `factor`, leaving alpha untouched.
pub fn dim(image: &mut RgbaImage, factor: f32) {
    let factor = factor.max(0.0);
    for p in image.pixels_mut() {
        for c in 0..3 {
            p[c] = (p[c] as f32 * factor).round().min(255.0) as u8;
        }
    }
}

/// Alpha of the gradient row at `ratio` (0 at the top edge, 1 at the bottom).
///
/// Zero above `threshold`; below it `max * ((ratio - t) / (1 - t))^gamma`.
pub fn gradient_alpha(ratio: f32, threshold: f32, gamma: f32, max: u8) -> u8 {
    if ratio <= threshold || threshold >= 1.0 {
        return 0;
    }
    let t = ((ratio - threshold) / (1.0 - threshold)).clamp(0.0, 1.0);
    (max as f32 * t.powf(gamma)).round() as u8
}

/// Blends near-black rows over `image` following [`gradient_alpha`].
pub fn apply_gradient(image: &mut RgbaImage, threshold: f32, gamma: f32, max: u8) {
    let (w, h) = image.dimensions();
    let last = h.saturating_sub(1).max(1) as f32;
    for y in 0..h {
        let alpha = gradient_alpha(y as f32 / last, threshold, gamma, max);
        if alpha == 0 {
            continue;
        }
        let a = alpha as f32 / 255.0;
        for x in 0..w {
            let p = image.get_pixel_mut(x, y);
            for c in 0..3 {
                p[c] = (p[c] as f32 * (1.0 - a) + 8.0 * a).round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{BackgroundPool, DeckAssets, LogoParts};
    use crate::color::AccentColor;
    use crate::layer::Layer;
    use crate::plan::SlideSpec;
    use crate::text::face::tests::fixture_fonts;

    #[test]
    fn gradient_is_zero_above_threshold_and_grows() {
        assert_eq!(gradient_alpha(0.0, 0.3, 1.6, 245), 0);
        assert_eq!(gradient_alpha(0.3, 0.3, 1.6, 245), 0);
        assert_eq!(gradient_alpha(1.0, 0.3, 1.6, 245), 245);

        let mid = gradient_alpha(0.65, 0.3, 1.6, 245);
        assert!(mid > 0 && mid < 245);
        assert!(gradient_alpha(0.8, 0.3, 1.6, 245) > mid);
    }

    #[test]
    fn gamma_sharpens_transition() {
        let soft = gradient_alpha(0.5, 0.3, 1.0, 255);
        let sharp = gradient_alpha(0.5, 0.3, 2.0, 255);
        assert!(sharp < soft);
    }

    #[test]
    fn cover_fit_fills_and_crops() {
        let mut wide = RgbaImage::from_pixel(400, 100, Rgba([0, 0, 255, 255]));
        for y in 0..100 {
            wide.put_pixel(0, y, Rgba([255, 0, 0, 255]));
        }

        let fitted = cover_fit(&wide, SizePx::new(100, 100));

        assert_eq!(fitted.dimensions(), (100, 100));
        assert!(fitted.get_pixel(0, 50)[2] > 200, "left edge cropped away");
    }

    #[test]
    fn dim_keeps_alpha() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 77]));
        dim(&mut img, 0.5);
        assert_eq!(img.get_pixel(1, 1).0, [100, 50, 25, 77]);
    }

    #[test]
    fn gradient_darkens_bottom_only() {
        let mut img = RgbaImage::from_pixel(4, 100, Rgba([200, 200, 200, 255]));
        apply_gradient(&mut img, 0.3, 1.6, 245);
        assert_eq!(img.get_pixel(0, 10)[0], 200);
        assert!(img.get_pixel(0, 99)[0] < 30);
    }

    #[test]
    fn treatments_follow_kind() {
        assert_eq!(Treatment::for_kind(SlideKind::Cover), Treatment::SharpGradient);
        assert_eq!(Treatment::for_kind(SlideKind::ContentQuote), Treatment::BlurDim);
        assert_eq!(Treatment::for_kind(SlideKind::Outro), Treatment::Solid);
    }

    #[test]
    fn layer_caches_photo_treatments_but_not_solid() {
        let fonts = fixture_fonts();
        let canvas = SizePx::new(32, 32);
        let assets = DeckAssets {
            pool: BackgroundPool::new(vec![
                RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255])),
                RgbaImage::from_pixel(64, 64, Rgba([0, 200, 0, 255])),
            ])
            .unwrap(),
            fonts,
            logo: LogoParts::default(),
            accent: AccentColor::new(10, 20, 30),
        };
        let mut layer = Layer::with_config(BackgroundConfig::default());

        let mut render = |kind: SlideKind, index: usize| {
            let mut slide = SlideSpec::new(kind, "", "");
            slide.index = index;
            slide.total = 8;
            let scene = Scene {
                slide: &slide,
                assets: &assets,
                source_url: "",
                canvas,
            };
            let mut ctx = RenderContext::blank(canvas);
            layer.apply(&mut ctx, &scene).unwrap();
            ctx.image
        };

        let cover = render(SlideKind::Cover, 1);
        let second = render(SlideKind::ContentBox, 2);
        let third = render(SlideKind::ContentBar, 3);
        let outro = render(SlideKind::Outro, 8);

        assert!(cover.get_pixel(16, 2)[0] > 200, "top of cover is only lightly dimmed");
        assert!(cover.get_pixel(16, 31)[0] < 40, "bottom of cover under gradient");
        assert!(second.get_pixel(16, 16)[1] > second.get_pixel(16, 16)[0], "slot 1 is the green image");
        assert_eq!(third.get_pixel(16, 16)[1], third.get_pixel(16, 16)[0], "slot 2 wraps to white");
        assert_eq!(outro.get_pixel(5, 5).0, [10, 20, 30, 255]);
        assert_eq!(layer.cached_len(), 3);
    }
}
