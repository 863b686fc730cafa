//! Slide plans: the per-card content a deck is rendered from.
//!
//! A plan comes out of the planning collaborator as loosely formatted text.
//! [`parse`] turns that text into draft records and [`repair`] turns drafts
//! into a [`SlidePlan`] that always satisfies the deck shape: the configured
//! slide count, a cover first, an outro last, and text in every field.

pub mod generate;
pub mod parse;
pub mod prompt;

use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::color::AccentColor;

pub use generate::{GeminiGenerator, Planner, TextGenerator};
pub use parse::{DraftSlide, ParsedPlan, parse_plan};
pub use prompt::build_prompt;

static CATEGORY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[\[【]\s*([^\]】]{1,16}?)\s*[\]】]\s*").expect("static category pattern")
});

/// Heading substituted when a record arrives without one.
pub const PLACEHOLDER_HEADING: &str = "핵심 포인트";

/// Body substituted when a record arrives without one.
pub const PLACEHOLDER_BODY: &str = "자세한 내용은 기사 원문에서 확인하세요.";

/// Layout archetype of one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideKind {
    Cover,
    ContentBox,
    ContentBar,
    ContentQuote,
    ContentData,
    Outro,
}

impl SlideKind {
    /// Kinds a generic content record may be rendered as.
    pub const VARIETY: [SlideKind; 3] = [
        SlideKind::ContentBox,
        SlideKind::ContentBar,
        SlideKind::ContentQuote,
    ];

    pub fn is_content(self) -> bool {
        !matches!(self, Self::Cover | Self::Outro)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::ContentBox => "content-box",
            Self::ContentBar => "content-bar",
            Self::ContentQuote => "content-quote",
            Self::ContentData => "content-data",
            Self::Outro => "outro",
        }
    }
}

/// One planned card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    pub kind: SlideKind,
    pub heading: String,
    pub body: String,
    /// Category label shown as a badge; only ever set on the cover.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// 1-based position in the deck.
    pub index: usize,
    pub total: usize,
}

impl SlideSpec {
    pub fn new(kind: SlideKind, heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            heading: heading.into(),
            body: body.into(),
            tag: None,
            index: 1,
            total: 1,
        }
    }
}

/// A repaired plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidePlan {
    /// Accent suggested by the collaborator, if it sent a valid one.
    pub accent: Option<AccentColor>,
    /// Space-separated `#tag` tokens.
    pub hashtags: String,
    pub slides: Vec<SlideSpec>,
}

impl SlidePlan {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// The suggested accent, or `fallback` when none was usable.
    pub fn accent_or(&self, fallback: AccentColor) -> AccentColor {
        self.accent.unwrap_or(fallback)
    }
}

// ============================================================================
// Layout variety
// ============================================================================

/// Chooses a concrete layout for a generic content record.
pub trait LayoutPicker {
    /// `index` is the 0-based deck position of the record.
    fn pick(&mut self, index: usize) -> SlideKind;
}

/// Uniform choice among [`SlideKind::VARIETY`].
#[derive(Debug, Clone)]
pub struct RandomLayouts {
    rng: StdRng,
}

impl RandomLayouts {
    /// A reproducible picker.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A picker seeded from system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for RandomLayouts {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl LayoutPicker for RandomLayouts {
    fn pick(&mut self, _index: usize) -> SlideKind {
        SlideKind::VARIETY[self.rng.random_range(0..SlideKind::VARIETY.len())]
    }
}

/// Cycles through a fixed list of kinds.
#[derive(Debug, Clone)]
pub struct LayoutSequence {
    kinds: Vec<SlideKind>,
    next: usize,
}

impl LayoutSequence {
    pub fn new(kinds: Vec<SlideKind>) -> Self {
        Self {
            kinds,
            next: 0,
        }
    }
}

impl LayoutPicker for LayoutSequence {
    fn pick(&mut self, _index: usize) -> SlideKind {
        if self.kinds.is_empty() {
            return SlideKind::ContentBox;
        }
        let kind = self.kinds[self.next % self.kinds.len()];
        self.next += 1;
        kind
    }
}

// ============================================================================
// Repair
// ============================================================================

/// Splits a bracketed category prefix off an article title.
///
/// `"[단독] 정부 발표"` yields `(Some("단독"), "정부 발표")`.
pub fn split_category(title: &str) -> (Option<String>, String) {
    match CATEGORY_PREFIX.captures(title) {
        Some(caps) => {
            let tag = caps.get(1).map(|m| m.as_str().trim().to_string());
            let rest = title[caps.get(0).map_or(0, |m| m.end())..].trim().to_string();
            (tag.filter(|t| !t.is_empty()), rest)
        }
        None => (None, title.trim().to_string()),
    }
}

/// Normalizes a hashtag directive into space-separated `#tokens`.
pub fn normalize_hashtags(raw: &str) -> String {
    let mut seen: Vec<String> = Vec::new();
    for token in raw.split(|c: char| c.is_whitespace() || c == ',' || c == '，') {
        let bare: String = token
            .trim_matches(|c: char| c == '#' || !c.is_alphanumeric() && c != '_')
            .to_string();
        if bare.is_empty() {
            continue;
        }
        let tag = format!("#{bare}");
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen.join(" ")
}

/// Forces a parsed plan into the deck shape.
///
/// The result has exactly `target` slides. Slide 1 is the cover and the last
/// slide is the outro. Cover or outro records found mid-deck are demoted to
/// boxed content, missing text is replaced with placeholders, and generic
/// content records get their layout from `picker`. A collaborator outro that
/// arrives early is moved to the end rather than padded over.
pub fn repair(
    parsed: ParsedPlan,
    title: &str,
    target: usize,
    picker: &mut dyn LayoutPicker,
) -> SlidePlan {
    let target = target.max(2);
    let (tag, clean_title) = split_category(title);

    let mut drafts = parsed.slides;
    let outro = match drafts.last() {
        Some(last) if last.kind == Some(SlideKind::Outro) && drafts.len() > 1 => drafts.pop(),
        _ => None,
    };

    let original = drafts.len() + usize::from(outro.is_some());
    if drafts.len() > target - 1 {
        drafts.truncate(target - 1);
    }
    while drafts.len() < target - 1 {
        drafts.push(DraftSlide::with_kind(SlideKind::ContentBox));
    }
    drafts.push(outro.unwrap_or_else(|| DraftSlide::with_kind(SlideKind::Outro)));

    if original != target {
        tracing::info!(parsed = original, target, "repaired slide count");
    }

    let slides = drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let kind = if i == 0 {
                SlideKind::Cover
            } else if i == target - 1 {
                SlideKind::Outro
            } else {
                match draft.kind {
                    Some(SlideKind::Cover | SlideKind::Outro) => SlideKind::ContentBox,
                    Some(kind) => kind,
                    None => picker.pick(i),
                }
            };

            let heading = match draft.heading.trim() {
                "" if kind == SlideKind::Cover && !clean_title.is_empty() => clean_title.clone(),
                "" => PLACEHOLDER_HEADING.to_string(),
                text => text.to_string(),
            };
            let body = match draft.body.trim() {
                "" => PLACEHOLDER_BODY.to_string(),
                text => text.to_string(),
            };

            SlideSpec {
                kind,
                heading,
                body,
                tag: if i == 0 { tag.clone() } else { None },
                index: i + 1,
                total: target,
            }
        })
        .collect();

    SlidePlan {
        accent: parsed.color.as_deref().and_then(AccentColor::parse),
        hashtags: parsed.hashtags.as_deref().map(normalize_hashtags).unwrap_or_default(),
        slides,
    }
}
