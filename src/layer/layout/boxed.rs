//! Box: heading, rule and body on a translucent rounded "glass" panel.

use image::Rgba;

use super::{BODY_COLOR, Frame, LayoutConfig, draw_block};
use crate::card::RectPx;
use crate::layer::paint::fill_rounded_rect;
use crate::layer::{RenderContext, Scene};

pub(super) fn draw(cfg: &LayoutConfig, ctx: &mut RenderContext, scene: &Scene<'_>, frame: Frame) {
    let s = &cfg.settings;
    let gap = cfg.gap();
    let pad = s.box_padding as f32;
    let rule = s.rule_thickness as f32;
    let inner_width = (frame.width - pad * 2.0).max(0.0);

    // The panel is centered, but never starts above `min_top`.
    let min_top = frame.top.max(s.box_min_top as f32).min(frame.bottom);
    let room = (frame.bottom - min_top - pad * 2.0 - rule - gap * 2.0).max(0.0);

    let heading = cfg.heading_block(scene, &scene.slide.heading, inner_width, room * 0.5);
    let body = cfg.body_block(scene, &scene.slide.body, inner_width, room - heading.height());

    let panel_height = pad * 2.0 + heading.height() + gap + rule + gap + body.height();
    let top = ((frame.canvas_height - panel_height) / 2.0).max(min_top);

    fill_rounded_rect(
        &mut ctx.image,
        RectPx::new(
            frame.left as u32,
            top.round() as u32,
            frame.width.round() as u32,
            panel_height.round() as u32,
        ),
        s.box_radius,
        Rgba([0, 0, 0, s.glass_alpha]),
    );

    let x = frame.left + pad;
    let accent = scene.assets.accent;
    let heading_bottom = draw_block(&mut ctx.image, &heading, x, top + pad, accent.opaque());
    let rule_top = heading_bottom + gap;
    cfg.draw_rule(&mut ctx.image, x, rule_top, accent);
    draw_block(&mut ctx.image, &body, x, rule_top + rule + gap, BODY_COLOR);
}

#[cfg(test)]
mod tests {
    use super::super::tests::{BACKDROP, render_layout, slide};
    use crate::plan::SlideKind;

    #[test]
    fn glass_panel_darkens_the_backdrop() {
        let s = slide(SlideKind::ContentBox, "가계부채 경고", "가계부채 증가세가 꺾이지 않고 있다.");
        let image = render_layout(&s, Some(150));

        // Just inside the panel's left edge, below the rounded corner.
        let panel = (0..1080)
            .map(|y| image.get_pixel(82, y))
            .filter(|p| p[0] < BACKDROP[0])
            .count();
        assert!(panel > 100);
        let outside = image.get_pixel(40, 540);
        assert_eq!(*outside, BACKDROP);
    }

    #[test]
    fn tall_content_is_pinned_below_header() {
        let body = "긴 본문이 계속 이어진다. ".repeat(60);
        let s = slide(SlideKind::ContentBox, "가계부채 경고", &body);
        let image = render_layout(&s, Some(150));

        let first_dark = (0..1080).find(|&y| image.get_pixel(540, y)[0] < BACKDROP[0]).unwrap();
        assert!(first_dark >= 200);
    }
}
