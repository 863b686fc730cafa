//! Line breaking.
//!
//! [`wrap`] is the general greedy word-wrapper used for body copy.
//! [`wrap_headline_balanced`] is reserved for short display headings, where a
//! two-line split that reads naturally beats a greedy wrap that strands a
//! single syllable on the second line.

use super::Measure;
use super::normalize::normalize;

const SENTENCE_BONUS: f32 = 40.0;
const CLAUSE_BONUS: f32 = 25.0;
const PARTICLE_BONUS: f32 = 20.0;
const BALANCE_WEIGHT: f32 = 30.0;
const STICKY_PENALTY: f32 = 40.0;
const SHORT_HALF_PENALTY: f32 = 50.0;

/// Halves shorter than this many visible characters are penalized.
const MIN_HALF_CHARS: usize = 3;

const SENTENCE_END: &[char] = &['.', '!', '?', '…'];
const CLAUSE_END: &[char] = &[',', ';', ':', '·'];
const CLOSERS: &[char] = &['"', '\'', '”', '’', ')', ']', '」', '』'];

/// Korean particles after which a line break reads naturally.
const PARTICLES: &[&str] = &[
    "에서는", "으로는", "에게서", "까지", "부터", "에서", "에게", "께서", "한테", "보다", "처럼",
    "으로", "마저", "조차", "은", "는", "이", "가", "을", "를", "에", "의", "와", "과", "로",
    "도", "만",
];

/// Short adverbs and intensifiers that belong with the word after them and
/// look stranded when they open a line.
const STICKY_WORDS: &[&str] = &[
    "더", "또", "꼭", "잘", "못", "안", "다", "좀", "딱", "곧", "늘", "참", "매우", "아주",
    "너무", "정말", "가장", "바로", "훨씬", "제일", "very", "so", "too", "just", "more", "most",
];

/// Greedy word-wrap.
///
/// Words are accumulated onto the current line while the measured width of
/// the line plus the next word stays within `max_width`. Paragraph breaks in
/// the input always close the line. A single word wider than `max_width` is
/// emitted on its own line rather than split.
pub fn wrap<M: Measure + ?Sized>(text: &str, font: &M, max_width: f32) -> Vec<String> {
    let text = normalize(text);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if font.measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Two-line headline balancer.
///
/// Returns the text unchanged as one line when it fits. Otherwise every word
/// boundary that keeps both halves within `max_width` is scored and the best
/// split wins. When no boundary satisfies the width constraint the result is
/// exactly what [`wrap`] produces.
pub fn wrap_headline_balanced<M: Measure + ?Sized>(
    text: &str,
    font: &M,
    max_width: f32,
) -> Vec<String> {
    let normalized = normalize(text);
    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let single = words.join(" ");
    if font.measure(&single) <= max_width {
        return vec![single];
    }

    let mut best: Option<(f32, usize)> = None;
    for at in 1..words.len() {
        let first = words[..at].join(" ");
        let second = words[at..].join(" ");
        let (w1, w2) = (font.measure(&first), font.measure(&second));
        if w1 > max_width || w2 > max_width {
            continue;
        }
        let score = split_score(&words, at, w1, w2);
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, at));
        }
    }

    match best {
        Some((_, at)) => vec![words[..at].join(" "), words[at..].join(" ")],
        None => wrap(&normalized, font, max_width),
    }
}

fn split_score(words: &[&str], at: usize, w1: f32, w2: f32) -> f32 {
    let tail = words[at - 1];
    let head = words[at];
    let mut score = 0.0;

    let tail_bare = tail.trim_end_matches(CLOSERS);
    if tail_bare.ends_with(SENTENCE_END) {
        score += SENTENCE_BONUS;
    } else if tail_bare.ends_with(CLAUSE_END) {
        score += CLAUSE_BONUS;
    }

    if ends_with_particle(tail_bare) {
        score += PARTICLE_BONUS;
    }

    let wider = w1.max(w2);
    if wider > 0.0 {
        score += BALANCE_WEIGHT * (1.0 - (w1 - w2).abs() / wider);
    }

    if is_sticky(head) {
        score -= STICKY_PENALTY;
    }

    if visible_chars(&words[..at]) < MIN_HALF_CHARS {
        score -= SHORT_HALF_PENALTY;
    }
    if visible_chars(&words[at..]) < MIN_HALF_CHARS {
        score -= SHORT_HALF_PENALTY;
    }

    score
}

fn ends_with_particle(word: &str) -> bool {
    let chars = word.chars().count();
    PARTICLES
        .iter()
        .any(|p| word.ends_with(p) && chars > p.chars().count())
}

fn is_sticky(word: &str) -> bool {
    let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
    STICKY_WORDS.iter().any(|s| bare.eq_ignore_ascii_case(s))
}

fn visible_chars(words: &[&str]) -> usize {
    words.iter().map(|w| w.chars().count()).sum()
}
