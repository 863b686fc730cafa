//! Data: a large centered numeral above centered body lines.

use super::{BODY_COLOR, Frame, LayoutConfig, draw_block_centered};
use crate::layer::{RenderContext, Scene};
use crate::text::{FitRange, fit_font, shrink_to_fit};

pub(super) fn draw(cfg: &LayoutConfig, ctx: &mut RenderContext, scene: &Scene<'_>, frame: Frame) {
    let s = &cfg.settings;
    let gap = cfg.gap();
    let center = frame.canvas_height / 2.0;

    // The numeral keeps its display size unless it would not fit on one line.
    let face = &scene.assets.fonts.heading;
    let range = FitRange::new(s.data_size, s.heading_min_size, s.heading_size_step);
    let start = fit_font(&scene.slide.heading, face, frame.width, range, 1.0).px();
    let heading_room = (center - gap / 2.0 - frame.top).max(0.0);
    let heading = shrink_to_fit(
        &scene.slide.heading,
        face,
        FitRange::new(start, s.heading_min_size, s.heading_size_step),
        frame.width,
        heading_room,
        s.line_spacing,
    );

    let heading_top = (center - gap / 2.0 - heading.height()).max(frame.top);
    let body_top = (heading_top + heading.height() + gap).max(center + gap / 2.0);
    let body = cfg.body_block(scene, &scene.slide.body, frame.width, frame.bottom - body_top);

    draw_block_centered(&mut ctx.image, &heading, frame.center_x(), heading_top, scene.assets.accent.opaque());
    draw_block_centered(&mut ctx.image, &body, frame.center_x(), body_top, BODY_COLOR);
}
