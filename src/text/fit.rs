//! Font-size selection.

use super::wrap::wrap;
use super::{Measure, Scalable};

const ELLIPSIS: char = '…';

/// Pixel-size search range, walked downward from `max` in `step` increments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRange {
    pub max: f32,
    pub min: f32,
    pub step: f32,
}

impl FitRange {
    pub fn new(max: f32, min: f32, step: f32) -> Self {
        Self { max, min, step }
    }

    /// Candidate sizes from `max` down to `min`, always ending on `min`.
    pub fn sizes(self) -> impl Iterator<Item = f32> {
        let step = if self.step > 0.0 { self.step } else { 1.0 };
        let min = self.min.min(self.max);
        let count = ((self.max - min) / step).floor() as usize;
        (0..=count)
            .map(move |i| self.max - i as f32 * step)
            .chain(std::iter::once(min))
    }
}

/// Picks the largest size in `range` whose single-line width is within
/// `tolerance` times `max_width`.
///
/// The tolerance is greater than one because the caller wraps the text
/// afterwards; this only rejects sizes that are absurdly large. Returns the
/// font at `range.min` when no size qualifies.
pub fn fit_font<S: Scalable>(
    text: &str,
    face: &S,
    max_width: f32,
    range: FitRange,
    tolerance: f32,
) -> S::Instance {
    let limit = max_width * tolerance;
    for size in range.sizes() {
        let font = face.at(size);
        if font.measure(text) <= limit {
            return font;
        }
    }
    face.at(range.min)
}

/// Wrapped lines together with the font and line advance they were laid out
/// with.
#[derive(Debug, Clone)]
pub struct TextBlock<I> {
    pub lines: Vec<String>,
    pub font: I,
    /// Baseline-to-baseline distance.
    pub advance: f32,
}

impl<I: Measure> TextBlock<I> {
    pub fn new(lines: Vec<String>, font: I, spacing: f32) -> Self {
        let advance = font.line_height() * spacing;
        Self { lines, font, advance }
    }

    /// Total height from the top of the first line box to the bottom of the
    /// last.
    pub fn height(&self) -> f32 {
        match self.lines.len() {
            0 => 0.0,
            n => (n - 1) as f32 * self.advance + self.font.line_height(),
        }
    }

    /// Width of the widest line.
    pub fn width(&self) -> f32 {
        self.lines
            .iter()
            .map(|line| self.font.measure(line))
            .fold(0.0, f32::max)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Wraps `text` into a block no taller than `max_height` and no wider than
/// `max_width`.
///
/// Sizes are tried from `range.max` downward. If even `range.min` overflows,
/// over-wide words are broken between characters, the block is cut to the
/// lines that fit and the last kept line ends in an ellipsis.
pub fn shrink_to_fit<S: Scalable>(
    text: &str,
    face: &S,
    range: FitRange,
    max_width: f32,
    max_height: f32,
    spacing: f32,
) -> TextBlock<S::Instance> {
    for size in range.sizes() {
        let font = face.at(size);
        let lines = wrap(text, &font, max_width);
        let block = TextBlock::new(lines, font, spacing);
        if block.height() <= max_height && block.width() <= max_width {
            return block;
        }
    }

    let font = face.at(range.min);
    let lines = break_wide_lines(wrap(text, &font, max_width), &font, max_width);
    truncate_to_height(TextBlock::new(lines, font, spacing), max_width, max_height)
}

/// Splits every line wider than `max_width` between characters.
///
/// Each piece keeps at least one character, so a single glyph wider than
/// `max_width` still stands alone.
pub fn break_wide_lines<M: Measure>(lines: Vec<String>, font: &M, max_width: f32) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if font.measure(&line) <= max_width {
            out.push(line);
            continue;
        }
        let mut piece = String::new();
        for c in line.chars() {
            piece.push(c);
            if piece.chars().count() > 1 && font.measure(&piece) > max_width {
                piece.pop();
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
                piece.clear();
                if !c.is_whitespace() {
                    piece.push(c);
                }
            }
        }
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Cuts `block` to the lines that fit in `max_height`; the last kept line
/// ends in an ellipsis when anything was dropped.
pub fn truncate_to_height<I: Measure>(mut block: TextBlock<I>, max_width: f32, max_height: f32) -> TextBlock<I> {
    let line_height = block.font.line_height();
    let keep = if max_height < line_height || block.advance <= 0.0 {
        0
    } else {
        ((max_height - line_height) / block.advance).floor() as usize + 1
    };

    if keep < block.lines.len() {
        block.lines.truncate(keep);
        if let Some(last) = block.lines.pop() {
            block.lines.push(ellipsize(&last, &block.font, max_width));
        }
    }
    block
}

/// Appends an ellipsis to `line`, dropping trailing characters until it fits.
fn ellipsize<M: Measure>(line: &str, font: &M, max_width: f32) -> String {
    let mut chars: Vec<char> = line.chars().collect();
    loop {
        let candidate: String = chars
            .iter()
            .collect::<String>()
            .trim_end()
            .chars()
            .chain(std::iter::once(ELLIPSIS))
            .collect();
        if chars.is_empty() || font.measure(&candidate) <= max_width {
            return candidate;
        }
        chars.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::testing::{Mono, MonoFace};

    #[test]
    fn sizes_end_on_minimum() {
        let sizes: Vec<f32> = FitRange::new(100.0, 90.0, 4.0).sizes().collect();
        assert_eq!(sizes, vec![100.0, 96.0, 92.0, 90.0]);
    }

    #[test]
    fn fit_font_keeps_max_size_for_short_text() {
        let font = fit_font("짧다", &MonoFace, 900.0, FitRange::new(112.0, 56.0, 4.0), 1.0);
        assert_eq!(font.0, 112.0);
    }

    #[test]
    fn fit_font_shrinks_until_within_tolerance() {
        // Ten full-width glyphs: width is 10 * size.
        let text = "가나다라마바사아자차";
        let font = fit_font(text, &MonoFace, 500.0, FitRange::new(112.0, 20.0, 4.0), 1.5);
        assert!(font.measure(text) <= 750.0);
        assert!(Mono(font.0 + 4.0).measure(text) > 750.0);
    }

    #[test]
    fn fit_font_stops_at_floor() {
        let text = "가".repeat(200);
        let font = fit_font(&text, &MonoFace, 100.0, FitRange::new(112.0, 56.0, 4.0), 1.9);
        assert_eq!(font.0, 56.0);
    }

    #[test]
    fn block_height_counts_advances_between_lines() {
        let block = TextBlock::new(vec!["a".into(), "b".into(), "c".into()], Mono(10.0), 1.5);
        assert_eq!(block.height(), 2.0 * 15.0 + 10.0);
        assert_eq!(TextBlock::new(Vec::new(), Mono(10.0), 1.5).height(), 0.0);
    }

    #[test]
    fn shrink_keeps_size_when_block_fits() {
        let block = shrink_to_fit("짧은 본문", &MonoFace, FitRange::new(44.0, 30.0, 2.0), 800.0, 400.0, 1.3);
        assert_eq!(block.font.0, 44.0);
        assert_eq!(block.lines, vec!["짧은 본문"]);
    }

    #[test]
    fn shrink_reduces_size_before_truncating() {
        let text = "가나다 라마바 사아자 차카타 파하가 나다라";
        // At 40px each word is 120 wide; two words per 260px line, three lines.
        let block = shrink_to_fit(text, &MonoFace, FitRange::new(44.0, 30.0, 2.0), 260.0, 130.0, 1.0);
        assert!(block.height() <= 130.0);
        assert!(block.font.0 < 44.0);
        assert!(block.lines.iter().all(|l| !l.ends_with(ELLIPSIS)));
    }

    #[test]
    fn shrink_truncates_with_ellipsis_at_floor() {
        let text = "가나다라 ".repeat(40);
        let block = shrink_to_fit(&text, &MonoFace, FitRange::new(40.0, 30.0, 5.0), 300.0, 100.0, 1.0);

        assert_eq!(block.font.0, 30.0);
        assert!(block.height() <= 100.0);
        let last = block.lines.last().unwrap();
        assert!(last.ends_with(ELLIPSIS));
        assert!(block.font.measure(last) <= 300.0);
    }

    #[test]
    fn shrink_shrinks_for_an_unbroken_word() {
        // 20 ASCII letters: 10 * size wide, so 300px fits at 30 but not at 40.
        let word = "abcdefghijklmnopqrst";
        let block = shrink_to_fit(word, &MonoFace, FitRange::new(40.0, 30.0, 5.0), 300.0, 400.0, 1.0);
        assert_eq!(block.font.0, 30.0);
        assert!(block.width() <= 300.0);
    }

    #[test]
    fn shrink_breaks_a_word_wider_than_the_floor() {
        let word = "a".repeat(60);
        let block = shrink_to_fit(&word, &MonoFace, FitRange::new(40.0, 30.0, 5.0), 300.0, 1000.0, 1.0);

        assert_eq!(block.font.0, 30.0);
        assert!(block.lines.len() > 1);
        assert!(block.width() <= 300.0, "widest line {}", block.width());
        assert_eq!(block.lines.concat(), word);
    }

    #[test]
    fn shrink_breaks_then_truncates_at_floor() {
        let word = "a".repeat(200);
        let block = shrink_to_fit(&word, &MonoFace, FitRange::new(40.0, 30.0, 5.0), 300.0, 100.0, 1.0);

        assert!(block.height() <= 100.0);
        assert!(block.width() <= 300.0);
        assert!(block.lines.last().unwrap().ends_with(ELLIPSIS));
    }

    #[test]
    fn break_wide_lines_leaves_narrow_lines_alone() {
        let lines = vec!["ab cd".to_string(), "abcdefgh".to_string()];
        // "ab cd" is 22.5 wide; each letter 5.
        let broken = break_wide_lines(lines, &Mono(10.0), 25.0);
        assert_eq!(broken, vec!["ab cd", "abcde", "fgh"]);
    }

    #[test]
    fn shrink_returns_nothing_when_no_line_fits() {
        let block = shrink_to_fit("본문", &MonoFace, FitRange::new(40.0, 30.0, 5.0), 300.0, 10.0, 1.0);
        assert!(block.is_empty());
    }
}
