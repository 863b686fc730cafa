//! Outro: slogan, brand line, article QR code and caption, centered on the
//! flat accent background.

use super::{Frame, LayoutConfig, draw_block_centered};
use crate::layer::qr::qr_image;
use crate::layer::svg::composite_over;
use crate::layer::{RenderContext, Scene};
use crate::text::{Face, FitRange, shrink_to_fit};

pub(super) fn draw(cfg: &LayoutConfig, ctx: &mut RenderContext, scene: &Scene<'_>, frame: Frame) {
    let s = &cfg.settings;
    let brand = &cfg.branding;
    let fonts = &scene.assets.fonts;
    let gap = cfg.gap();
    let color = scene.assets.accent.foreground().opaque();

    let qr = if scene.source_url.trim().is_empty() {
        None
    } else {
        match qr_image(scene.source_url, s.qr_size) {
            Ok(qr) => Some(qr),
            Err(err) => {
                tracing::warn!(%err, "outro drawn without QR code");
                None
            }
        }
    };
    let qr_height = qr.as_ref().map_or(0.0, |q| q.height() as f32);

    let text_block = |face: &Face, size: f32, text: &str, max_height: f32| {
        let range = FitRange::new(size, size * 0.6, 2.0);
        shrink_to_fit(text, face, range, frame.width, max_height, s.line_spacing)
    };
    let slogan = text_block(&fonts.serif, s.outro_slogan_size, &brand.slogan, frame.height() * 0.3);
    let brand_line = text_block(&fonts.body, s.outro_brand_size, &brand.brand_line, frame.height() * 0.15);
    let caption = text_block(&fonts.body, s.outro_caption_size, &brand.qr_caption, frame.height() * 0.1);

    let mut total = slogan.height() + gap + brand_line.height();
    if qr.is_some() {
        total += gap * 2.0 + qr_height + gap / 2.0 + caption.height();
    }
    let mut y = ((frame.canvas_height - total) / 2.0).max(0.0);
    let cx = frame.center_x();

    y = draw_block_centered(&mut ctx.image, &slogan, cx, y, color) + gap;
    y = draw_block_centered(&mut ctx.image, &brand_line, cx, y, color);

    if let Some(qr) = qr {
        y += gap * 2.0;
        let x = (cx - qr.width() as f32 / 2.0).round() as i32;
        composite_over(&mut ctx.image, &qr, x, y.round() as i32);
        y += qr_height + gap / 2.0;
        draw_block_centered(&mut ctx.image, &caption, cx, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{render_layout, slide};
    use crate::plan::SlideKind;

    #[test]
    fn outro_contains_a_qr_code() {
        let s = slide(SlideKind::Outro, "", "");
        let image = render_layout(&s, None);

        let white = image.pixels().filter(|p| p.0 == [255, 255, 255, 255]).count();
        let black = image.pixels().filter(|p| p.0 == [0, 0, 0, 255]).count();
        assert!(white > 1000, "QR light modules and quiet zone");
        assert!(black > 1000, "QR dark modules");
    }
}
