//! The planning collaborator: a text-generation model behind a trait.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use super::parse::parse_plan;
use super::prompt::build_prompt;
use super::{LayoutPicker, SlidePlan, repair};
use crate::error::{CardError, CardResult};
use crate::profile::{PlanSettings, RenderProfile};
use crate::source::Article;

/// A text-generation backend.
pub trait TextGenerator {
    /// Sends `prompt` to `model` and returns the reply text.
    fn generate(&self, model: &str, prompt: &str) -> CardResult<String>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for &G {
    fn generate(&self, model: &str, prompt: &str) -> CardResult<String> {
        (**self).generate(model, prompt)
    }
}

// ============================================================================
// Gemini REST client
// ============================================================================

/// Blocking client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiGenerator {
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(api_key: impl Into<String>, timeout: Duration) -> CardResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CardError::input("an API key for the planning model is required"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CardError::generation(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
        })
    }
}

impl TextGenerator for GeminiGenerator {
    #[tracing::instrument(skip(self, prompt), fields(prompt_chars = prompt.chars().count()))]
    fn generate(&self, model: &str, prompt: &str) -> CardResult<String> {
        let url = format!("{}/models/{model}:generateContent", self.endpoint);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| CardError::generation(format!("request to {model} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            return Err(CardError::generation(format!("{model} returned {status}: {detail}")));
        }

        let reply: GenerateResponse = response
            .json()
            .map_err(|e| CardError::generation(format!("unreadable reply from {model}: {e}")))?;
        reply.into_text(model)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn into_text(self, model: &str) -> CardResult<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(CardError::generation(format!("{model} blocked the prompt: {reason}")));
        }
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(CardError::generation(format!("{model} returned no text")));
        }
        Ok(text)
    }
}

// ============================================================================
// Planner
// ============================================================================

/// Turns an article into a repaired [`SlidePlan`].
#[derive(Debug, Clone)]
pub struct Planner<G> {
    generator: G,
    settings: PlanSettings,
    brand_name: String,
}

impl<G: TextGenerator> Planner<G> {
    pub fn new(generator: G, settings: PlanSettings, brand_name: impl Into<String>) -> Self {
        Self {
            generator,
            settings,
            brand_name: brand_name.into(),
        }
    }

    pub fn from_profile(generator: G, profile: &RenderProfile) -> Self {
        Self::new(generator, profile.plan.clone(), profile.branding.brand_name.clone())
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Plans a deck for `article`.
    ///
    /// Fails when the body is too short, when both the primary and fallback
    /// models fail, or when the reply contains no slide at all.
    #[tracing::instrument(skip_all, fields(title = %article.title))]
    pub fn plan(&self, article: &Article, picker: &mut dyn LayoutPicker) -> CardResult<SlidePlan> {
        let len = article.body.chars().count();
        if len < self.settings.min_body_chars {
            return Err(CardError::ArticleTooShort {
                len,
                min: self.settings.min_body_chars,
            });
        }

        let target = self.settings.target_slides();
        let prompt = build_prompt(
            &self.brand_name,
            &article.title,
            &article.body,
            self.settings.prompt_char_limit,
            target,
        );

        let reply = self.generate_with_fallback(&prompt)?;
        let parsed = parse_plan(&reply);
        if parsed.slides.is_empty() {
            tracing::warn!(reply_chars = reply.chars().count(), "no slides in planner reply");
            return Err(CardError::EmptyPlan);
        }
        tracing::info!(parsed = parsed.slides.len(), target, "plan parsed");

        let mut plan = repair(parsed, &article.title, target, picker);
        if let (Some(tag), Some(cover)) = (&article.tag, plan.slides.first_mut()) {
            cover.tag.get_or_insert_with(|| tag.clone());
        }
        Ok(plan)
    }

    fn generate_with_fallback(&self, prompt: &str) -> CardResult<String> {
        let primary = &self.settings.primary_model;
        let fallback = &self.settings.fallback_model;

        match self.generator.generate(primary, prompt) {
            Ok(reply) => Ok(reply),
            Err(err) if fallback.is_empty() || fallback == primary => Err(err),
            Err(err) => {
                tracing::warn!(model = %primary, %err, "primary model failed, retrying with fallback");
                self.generator.generate(fallback, prompt).map_err(|fallback_err| {
                    CardError::generation(format!(
                        "{primary}: {err}; {fallback}: {fallback_err}"
                    ))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::plan::{LayoutSequence, SlideKind};

    /// Replies per model; records every model it was asked for.
    struct Scripted {
        replies: Vec<(&'static str, Result<&'static str, &'static str>)>,
        calls: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<(&'static str, Result<&'static str, &'static str>)>) -> Self {
            Self {
                replies,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Scripted {
        fn generate(&self, model: &str, _prompt: &str) -> CardResult<String> {
            self.calls.borrow_mut().push(model.to_string());
            match self.replies.iter().find(|(m, _)| *m == model) {
                Some((_, Ok(text))) => Ok(text.to_string()),
                Some((_, Err(msg))) => Err(CardError::generation(*msg)),
                None => Err(CardError::generation("unknown model")),
            }
        }
    }

    const REPLY: &str = "COLOR_MAIN: #336699\n[SLIDE 1]\nTYPE: COVER\nHEAD: 제목\nDESC: 부제\n[SLIDE 2]\nHEAD: 본문";

    fn article() -> Article {
        Article {
            title: "[단독] 기사 제목".into(),
            body: "본문 ".repeat(40),
            image_urls: Vec::new(),
            tag: Some("단독".into()),
        }
    }

    fn settings() -> PlanSettings {
        PlanSettings {
            primary_model: "primary".into(),
            fallback_model: "fallback".into(),
            ..PlanSettings::default()
        }
    }

    #[test]
    fn plans_with_primary_model() {
        let generator = Scripted::new(vec![("primary", Ok(REPLY))]);
        let planner = Planner::new(&generator, settings(), "세계일보");
        let plan = planner
            .plan(&article(), &mut LayoutSequence::new(vec![SlideKind::ContentBar]))
            .unwrap();

        assert_eq!(plan.len(), 8);
        assert_eq!(plan.slides[0].tag.as_deref(), Some("단독"));
        assert_eq!(plan.slides[1].kind, SlideKind::ContentBar);
        assert_eq!(*generator.calls.borrow(), vec!["primary"]);
    }

    #[test]
    fn out_of_range_slide_count_is_clamped() {
        let generator = Scripted::new(vec![("primary", Ok(REPLY))]);
        let mut many = settings();
        many.slide_count = 20;
        let plan = Planner::new(&generator, many, "세계일보")
            .plan(&article(), &mut LayoutSequence::new(vec![]))
            .unwrap();
        assert_eq!(plan.len(), 8);

        let mut few = settings();
        few.slide_count = 2;
        let plan = Planner::new(&generator, few, "세계일보")
            .plan(&article(), &mut LayoutSequence::new(vec![]))
            .unwrap();
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn retries_once_with_fallback() {
        let generator = Scripted::new(vec![("primary", Err("quota")), ("fallback", Ok(REPLY))]);
        let planner = Planner::new(&generator, settings(), "세계일보");
        let plan = planner.plan(&article(), &mut LayoutSequence::new(vec![])).unwrap();

        assert_eq!(plan.slides[0].kind, SlideKind::Cover);
        assert_eq!(*generator.calls.borrow(), vec!["primary", "fallback"]);
    }

    #[test]
    fn both_models_failing_is_fatal() {
        let generator = Scripted::new(vec![("primary", Err("quota")), ("fallback", Err("safety"))]);
        let planner = Planner::new(&generator, settings(), "세계일보");
        let err = planner.plan(&article(), &mut LayoutSequence::new(vec![])).unwrap_err();

        assert!(err.is_fatal());
        let msg = err.to_string();
        assert!(msg.contains("quota") && msg.contains("safety"));
        assert_eq!(generator.calls.borrow().len(), 2);
    }

    #[test]
    fn reply_without_slides_is_an_empty_plan() {
        let generator = Scripted::new(vec![("primary", Ok("I cannot help with that."))]);
        let planner = Planner::new(&generator, settings(), "세계일보");
        let err = planner.plan(&article(), &mut LayoutSequence::new(vec![])).unwrap_err();
        assert!(matches!(err, CardError::EmptyPlan));
    }

    #[test]
    fn short_article_is_rejected_before_generation() {
        let generator = Scripted::new(vec![("primary", Ok(REPLY))]);
        let planner = Planner::new(&generator, settings(), "세계일보");
        let mut short = article();
        short.body = "짧다".into();

        let err = planner.plan(&short, &mut LayoutSequence::new(vec![])).unwrap_err();
        assert!(matches!(err, CardError::ArticleTooShort { len: 2, min: 50 }));
        assert!(generator.calls.borrow().is_empty());
    }

    #[test]
    fn empty_api_key_is_an_input_error() {
        let err = GeminiGenerator::new("  ", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CardError::Input(_)));
    }

    #[test]
    fn response_text_is_extracted() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"[SLIDE 1]\n"},{"text":"HEAD: x"}]}}]}"#;
        let reply: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(reply.into_text("m").unwrap(), "[SLIDE 1]\nHEAD: x");
    }

    #[test]
    fn blocked_or_empty_responses_are_errors() {
        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(blocked.into_text("m").unwrap_err().to_string().contains("SAFETY"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.into_text("m").is_err());
    }
}
