//! Parser for the planner's line-oriented reply format.
//!
//! ```text
//! COLOR_MAIN: #1E90FF
//! HASHTAGS: #경제 #금리
//!
//! [SLIDE 1]
//! TYPE: COVER
//! HEAD: 기준금리 또 동결
//! DESC: 한국은행이 기준금리를 3.50%로
//! 유지했다.
//! ```
//!
//! The parser is a small state machine: one open slide accumulator and one
//! open field. Unknown lines continue whichever field is open, so values the
//! model wrapped across lines are joined back together. Nothing here fails;
//! missing fields stay empty and are repaired later.

use std::sync::LazyLock;

use regex::Regex;

use super::SlideKind;

static SLIDE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[?\s*slide\s*#?\s*\d*\s*\]?\s*:?$").expect("static slide marker pattern")
});

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(type|head|headline|title|text|desc|description|sub|body|color_main|color|hashtags?|tags|logo)\s*[:：]\s*(.*)$")
        .expect("static field pattern")
});

static HEADING_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+").expect("static heading mark pattern"));

/// A slide record as the planner sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSlide {
    /// `None` for generic content, whose layout is chosen during repair.
    pub kind: Option<SlideKind>,
    pub heading: String,
    pub body: String,
}

impl DraftSlide {
    pub fn with_kind(kind: SlideKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }
}

/// Everything recognized in a planner reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPlan {
    pub color: Option<String>,
    pub hashtags: Option<String>,
    pub slides: Vec<DraftSlide>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Heading,
    Body,
    Color,
    Hashtags,
    /// A recognized directive whose value is not used.
    Ignored,
}

/// Parses a planner reply.
pub fn parse_plan(reply: &str) -> ParsedPlan {
    let mut plan = ParsedPlan::default();
    let mut current: Option<DraftSlide> = None;
    let mut open: Option<Field> = None;

    for raw in reply.lines() {
        let line = strip_markup(raw);
        if line.is_empty() {
            continue;
        }

        if SLIDE_MARKER.is_match(&line) {
            if let Some(slide) = current.take() {
                plan.slides.push(slide);
            }
            current = Some(DraftSlide::default());
            open = None;
            continue;
        }

        if let Some(caps) = FIELD.captures(&line) {
            let key = caps[1].to_ascii_lowercase();
            let value = unwrap_brackets(caps[2].trim());
            open = match key.as_str() {
                "type" => {
                    current.get_or_insert_with(DraftSlide::default).kind = parse_kind(value);
                    None
                }
                "head" | "headline" | "title" | "text" => {
                    current.get_or_insert_with(DraftSlide::default).heading = value.to_string();
                    Some(Field::Heading)
                }
                "desc" | "description" | "sub" | "body" => {
                    current.get_or_insert_with(DraftSlide::default).body = value.to_string();
                    Some(Field::Body)
                }
                "color_main" | "color" => {
                    plan.color = Some(value.to_string());
                    Some(Field::Color)
                }
                "logo" => Some(Field::Ignored),
                _ => {
                    plan.hashtags = Some(value.to_string());
                    Some(Field::Hashtags)
                }
            };
            continue;
        }

        match (open, current.as_mut()) {
            (Some(Field::Heading), Some(slide)) => append(&mut slide.heading, &line),
            (Some(Field::Body), Some(slide)) => append(&mut slide.body, &line),
            (Some(Field::Hashtags), _) => {
                append(plan.hashtags.get_or_insert_with(String::new), &line)
            }
            _ => {}
        }
    }

    if let Some(slide) = current {
        plan.slides.push(slide);
    }
    plan
}

/// Removes markdown emphasis and heading marks.
fn strip_markup(line: &str) -> String {
    let line: String = line.chars().filter(|&c| c != '*' && c != '`').collect();
    HEADING_MARK.replace(line.trim(), "").trim().to_string()
}

/// Unwraps a value the model copied with the template's square brackets.
fn unwrap_brackets(value: &str) -> &str {
    match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) if !inner.contains(['[', ']']) => inner.trim(),
        _ => value,
    }
}

fn append(field: &mut String, line: &str) {
    if !field.is_empty() {
        field.push(' ');
    }
    field.push_str(line);
}

fn parse_kind(value: &str) -> Option<SlideKind> {
    let key: String = value
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    match key.as_str() {
        "COVER" | "HOOK" | "TITLE" => Some(SlideKind::Cover),
        "BOX" | "CONTENTBOX" | "GLASS" => Some(SlideKind::ContentBox),
        "BAR" | "CONTENTBAR" => Some(SlideKind::ContentBar),
        "QUOTE" | "CONTENTQUOTE" => Some(SlideKind::ContentQuote),
        "DATA" | "CONTENTDATA" | "NUMBER" | "STAT" => Some(SlideKind::ContentData),
        "OUTRO" | "ENDING" | "END" => Some(SlideKind::Outro),
        _ => None,
    }
}
