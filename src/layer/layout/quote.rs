//! Quote: a watermark quotation glyph behind a hanging-indented heading.

use super::{BODY_COLOR, Frame, LayoutConfig, draw_block};
use crate::color::AccentColor;
use crate::layer::{RenderContext, Scene};
use crate::text::{
    FitRange, FontInstance, Measure, Scalable, TextBlock, break_wide_lines, fit_font, truncate_to_height, wrap,
};

const WATERMARK: &str = "\u{201C}";

/// Opening marks that trigger the hanging indent.
const OPENERS: &[char] = &['"', '\'', '\u{201C}', '\u{2018}', '「', '『'];

pub(super) fn draw(cfg: &LayoutConfig, ctx: &mut RenderContext, scene: &Scene<'_>, frame: Frame) {
    let s = &cfg.settings;
    let gap = cfg.gap();
    let rule = s.rule_thickness as f32;
    let accent = scene.assets.accent;
    let available = (frame.height() - rule - gap * 2.0).max(0.0);

    let heading = hanging_heading(cfg, scene, frame.width, available * 0.5);
    let body_width = (frame.width - heading.indent).max(0.0);
    let body = cfg.body_block(scene, &scene.slide.body, body_width, available - heading.block.height());

    let total = heading.block.height() + gap + rule + gap + body.height();
    let top = (frame.top + (frame.height() - total) / 2.0).max(frame.top);

    let glyph = scene.assets.fonts.serif.at(s.quote_glyph_size);
    let glyph_top = (top - glyph.line_height() * 0.3).max(frame.top - gap);
    glyph.draw(&mut ctx.image, frame.left - s.margin as f32 * 0.4, glyph_top, WATERMARK, accent.rgba(s.quote_glyph_alpha));

    let white = AccentColor::WHITE.opaque();
    let block = &heading.block;
    for (i, line) in block.lines.iter().enumerate() {
        let x = if i == 0 { frame.left } else { frame.left + heading.indent };
        block.font.draw(&mut ctx.image, x, top + i as f32 * block.advance, line, white);
    }

    let rule_top = top + block.height() + gap;
    cfg.draw_rule(&mut ctx.image, frame.left + heading.indent, rule_top, accent);
    draw_block(&mut ctx.image, &body, frame.left + heading.indent, rule_top + rule + gap, BODY_COLOR);
}

struct Hanging {
    block: TextBlock<FontInstance>,
    /// Offset of continuation lines.
    indent: f32,
}

fn hanging_heading(cfg: &LayoutConfig, scene: &Scene<'_>, width: f32, max_height: f32) -> Hanging {
    let s = &cfg.settings;
    let text = scene.slide.heading.trim();
    let face = &scene.assets.fonts.heading;

    let start = fit_font(text, face, width, cfg.heading_range(), s.heading_fit_tolerance).px();
    let range = FitRange::new(start, s.heading_min_size, s.heading_size_step);
    let (block, indent) = hang(text, face, range, width, max_height, s.line_spacing);
    Hanging { block, indent }
}

/// Wraps `text` so continuation lines align under the text after a leading
/// quotation mark. Returns the block and the continuation indent.
///
/// At `range.min` the block is broken and cut like [`crate::text::shrink_to_fit`].
fn hang<S: Scalable>(
    text: &str,
    face: &S,
    range: FitRange,
    width: f32,
    max_height: f32,
    spacing: f32,
) -> (TextBlock<S::Instance>, f32) {
    let indent_of = |font: &S::Instance| {
        text.chars()
            .next()
            .filter(|c| OPENERS.contains(c))
            .map_or(0.0, |c| font.measure(c.encode_utf8(&mut [0; 4])))
    };

    for size in range.sizes() {
        let font = face.at(size);
        let indent = indent_of(&font);
        let column = (width - indent).max(0.0);
        let block = TextBlock::new(wrap(text, &font, column), font, spacing);
        if block.height() <= max_height && block.width() <= column {
            return (block, indent);
        }
    }

    let font = face.at(range.min);
    let indent = indent_of(&font);
    let column = (width - indent).max(0.0);
    let lines = break_wide_lines(wrap(text, &font, column), &font, column);
    (truncate_to_height(TextBlock::new(lines, font, spacing), column, max_height), indent)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{BACKDROP, render_layout, slide};
    use super::*;
    use crate::plan::SlideKind;
    use crate::text::testing::MonoFace;

    #[test]
    fn opener_sets_the_hanging_indent() {
        let range = FitRange::new(40.0, 30.0, 5.0);
        let (block, indent) = hang("\u{201C}가나다 라마바\u{201D}", &MonoFace, range, 1000.0, 500.0, 1.0);
        assert_eq!(block.font.0, 40.0);
        assert_eq!(indent, 40.0);

        let (_, indent) = hang("가나다 라마바", &MonoFace, range, 1000.0, 500.0, 1.0);
        assert_eq!(indent, 0.0);
    }

    #[test]
    fn floor_cuts_with_an_ellipsis() {
        let text = format!("\u{201C}{}", "가나다라 ".repeat(40));
        let (block, indent) = hang(&text, &MonoFace, FitRange::new(40.0, 30.0, 5.0), 300.0, 100.0, 1.0);

        assert_eq!(block.font.0, 30.0);
        assert!(block.height() <= 100.0);
        assert!(block.width() <= 300.0 - indent);
        assert!(block.lines.last().unwrap().ends_with('\u{2026}'));
    }

    #[test]
    fn unbroken_word_stays_in_the_column() {
        let word = "a".repeat(60);
        let (block, _) = hang(&word, &MonoFace, FitRange::new(40.0, 30.0, 5.0), 300.0, 1000.0, 1.0);
        assert!(block.lines.len() > 1);
        assert!(block.width() <= 300.0, "widest line {}", block.width());
    }

    #[test]
    fn quote_draws_watermark_and_text() {
        let s = slide(SlideKind::ContentQuote, "\u{201C}지금은 인하를 논할 때가 아니다\u{201D}", "한국은행 총재의 발언.");
        let image = render_layout(&s, Some(150));

        // Watermark pixels are a faint blend toward the accent, not full accent.
        let faint = image
            .pixels()
            .filter(|p| **p != BACKDROP && p[0] > 40 && p[0] < 120 && p[2] <= 40)
            .count();
        assert!(faint > 0);
    }
}
