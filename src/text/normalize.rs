//! Cleanup applied to upstream text before it is wrapped.

use std::sync::LazyLock;

use regex::Regex;

static EMPTY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)|\[\s*\]").expect("static pattern"));

// Sentence punctuation glued to the next sentence ("했다.그러나").
static GLUED_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([.!?…])([\p{Hangul}\p{Han}\p{Lu}])").expect("static pattern")
});

static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("static pattern"));

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n[\s]*").expect("static pattern"));

/// Normalizes text for layout.
///
/// Removes empty bracket remnants, separates sentences glued together by the
/// upstream text, collapses runs of inline whitespace to one space and runs
/// of line breaks to a single paragraph break. Idempotent.
pub fn normalize(text: &str) -> String {
    let text = EMPTY_BRACKETS.replace_all(text, "");
    let text = GLUED_SENTENCE.replace_all(&text, "$1 $2");
    let text = INLINE_SPACE.replace_all(&text, " ");
    let text = LINE_BREAKS.replace_all(text.trim(), "\n");
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  a \t  b   c  "), "a b c");
    }

    #[test]
    fn keeps_single_paragraph_breaks() {
        assert_eq!(normalize("first  \n\n\n  second"), "first\nsecond");
    }

    #[test]
    fn separates_glued_sentences() {
        assert_eq!(normalize("발표했다.그러나 반발이"), "발표했다. 그러나 반발이");
        assert_eq!(normalize("It rose.Then fell"), "It rose. Then fell");
    }

    #[test]
    fn leaves_decimals_and_domains_alone() {
        assert_eq!(normalize("3.5% growth"), "3.5% growth");
        assert_eq!(normalize("www.segye.com"), "www.segye.com");
    }

    #[test]
    fn strips_empty_brackets() {
        assert_eq!(normalize("정부( ) 발표 [] 내용"), "정부 발표 내용");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "  세상을 보는 눈,  세계일보 ",
            "끝났다.다음은 ()  무엇인가?\n\n새 문단",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once);
        }
    }
}
