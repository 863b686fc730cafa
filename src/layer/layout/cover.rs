//! Cover: a bottom-anchored stack of heading, accent rule and body.
//!
//! The block grows upward from the bottom margin, so its top edge depends on
//! the amount of text. Block sizes are bounded by the frame, which starts
//! below the header row.

use image::RgbaImage;

use super::{BODY_COLOR, Frame, LayoutConfig, draw_block};
use crate::color::AccentColor;
use crate::layer::{RenderContext, Scene};

/// Share of the frame the heading may take before it is re-wrapped smaller.
const HEADING_SHARE: f32 = 0.6;

pub(super) fn draw(cfg: &LayoutConfig, ctx: &mut RenderContext, scene: &Scene<'_>, frame: Frame) {
    let gap = cfg.gap();
    let rule = cfg.settings.rule_thickness as f32;
    let slide = scene.slide;
    let available = (frame.height() - rule - gap * 2.0).max(0.0);

    let heading = cfg.heading_block(scene, &slide.heading, frame.width, available * HEADING_SHARE);
    let body = cfg.body_block(scene, &slide.body, frame.width, available - heading.height());

    let body_top = frame.bottom - body.height();
    let rule_top = if body.is_empty() { frame.bottom - rule } else { body_top - gap - rule };
    let heading_top = rule_top - gap - heading.height();

    let canvas: &mut RgbaImage = &mut ctx.image;
    draw_block(canvas, &heading, frame.left, heading_top, AccentColor::WHITE.opaque());
    cfg.draw_rule(canvas, frame.left, rule_top, scene.assets.accent);
    draw_block(canvas, &body, frame.left, body_top, BODY_COLOR);

    tracing::trace!(
        heading_lines = heading.lines.len(),
        heading_px = heading.font.px(),
        body_lines = body.lines.len(),
        top = heading_top,
        "cover laid out"
    );
}

#[cfg(test)]
mod tests {
    use super::super::tests::{render_layout, slide, touched_rows};
    use crate::plan::SlideKind;

    #[test]
    fn block_is_bottom_anchored() {
        let short = slide(SlideKind::Cover, "금리 동결", "한 줄 요약.");
        let long = slide(
            SlideKind::Cover,
            "금리 동결",
            "한국은행이 기준금리를 동결했다. 물가와 가계부채, 환율을 모두 고려한 결정이다. \
             시장은 연내 인하 가능성에 주목하고 있다.",
        );
        let (a, b) = (render_layout(&short, Some(150)), render_layout(&long, Some(150)));
        let (rows_a, rows_b) = (touched_rows(&a), touched_rows(&b));

        // Same bottom edge, but the longer body pushes the top upward.
        let bottom_a = *rows_a.last().unwrap();
        let bottom_b = *rows_b.last().unwrap();
        assert!(bottom_a.abs_diff(bottom_b) < 20);
        assert!(rows_b[0] < rows_a[0]);
    }

    #[test]
    fn huge_text_never_enters_header() {
        let body = "아주 긴 본문 문장이 반복된다. ".repeat(80);
        let heading = "끝없이 이어지는 제목 문구가 화면을 가득 채우려고 한다".repeat(3);
        let image = render_layout(&slide(SlideKind::Cover, &heading, &body), Some(300));
        assert!(touched_rows(&image)[0] >= 300);
    }
}
