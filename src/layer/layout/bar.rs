//! Bar: heading and body stacked from a fixed top, with a vertical accent
//! bar spanning the block on its left.

use super::{BODY_COLOR, Frame, LayoutConfig, draw_block};
use crate::card::RectPx;
use crate::color::AccentColor;
use crate::layer::paint::fill_rect;
use crate::layer::{RenderContext, Scene};

pub(super) fn draw(cfg: &LayoutConfig, ctx: &mut RenderContext, scene: &Scene<'_>, frame: Frame) {
    let s = &cfg.settings;
    let gap = cfg.gap();
    let indent = (s.bar_width + s.bar_gap) as f32;
    let x = frame.left + indent;
    let width = (frame.width - indent).max(0.0);
    let top = (s.bar_top as f32).max(frame.top).min(frame.bottom);
    let available = frame.bottom - top;

    let heading = cfg.heading_block(scene, &scene.slide.heading, width, (available - gap) * 0.5);
    let body = cfg.body_block(scene, &scene.slide.body, width, available - heading.height() - gap);

    let heading_bottom = draw_block(&mut ctx.image, &heading, x, top, AccentColor::WHITE.opaque());
    let bottom = if body.is_empty() {
        heading_bottom
    } else {
        draw_block(&mut ctx.image, &body, x, heading_bottom + gap, BODY_COLOR)
    };

    fill_rect(
        &mut ctx.image,
        RectPx::new(
            frame.left as u32,
            top as u32,
            s.bar_width,
            (bottom - top).max(0.0).round() as u32,
        ),
        scene.assets.accent.opaque(),
    );
}
