//! Article acquisition: title, body text and candidate image URLs.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{CardError, CardResult};
use crate::fetch::Fetch;
use crate::plan::split_category;

/// Whole-document text is cut to this many characters when it stands in for
/// missing paragraph markup.
const DOCUMENT_TEXT_LIMIT: usize = 5000;

static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:title"]"#));
static OG_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:image"]"#));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// What the renderer needs from a news article.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Article {
    pub title: String,
    pub body: String,
    /// Candidate background images, best first.
    pub image_urls: Vec<String>,
    /// Category label from a bracketed title prefix.
    pub tag: Option<String>,
}

/// Produces an [`Article`] from a URL.
pub trait ArticleSource {
    fn fetch(&self, url: &str) -> CardResult<Article>;
}

/// Downloads a page and extracts the article with HTML heuristics.
#[derive(Debug)]
pub struct HtmlArticleSource<F> {
    fetcher: F,
    min_body_chars: usize,
}

impl<F: Fetch> HtmlArticleSource<F> {
    pub fn new(fetcher: F, min_body_chars: usize) -> Self {
        Self {
            fetcher,
            min_body_chars,
        }
    }
}

impl<F: Fetch> ArticleSource for HtmlArticleSource<F> {
    #[tracing::instrument(skip(self))]
    fn fetch(&self, url: &str) -> CardResult<Article> {
        let base = Url::parse(url.trim()).map_err(|e| CardError::input(format!("invalid article URL {url:?}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CardError::input(format!("unsupported URL scheme {:?}", base.scheme())));
        }

        let html = match self.fetcher.get_text(base.as_str()) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(%err, "article download failed");
                String::new()
            }
        };

        let article = parse_article(&html, &base, self.min_body_chars);
        let len = article.body.chars().count();
        if len < self.min_body_chars {
            return Err(CardError::ArticleTooShort {
                len,
                min: self.min_body_chars,
            });
        }

        tracing::info!(
            title = %article.title,
            body_chars = len,
            images = article.image_urls.len(),
            "article extracted"
        );
        Ok(article)
    }
}

/// Extracts an article from an HTML document.
///
/// The body is the text of all `<p>` elements. When that is shorter than
/// `min_body_chars` the visible text of the whole document is used instead.
pub fn parse_article(html: &str, base: &Url, min_body_chars: usize) -> Article {
    let document = Html::parse_document(html);

    let title = meta_content(&document, &OG_TITLE)
        .or_else(|| {
            document
                .select(&TITLE)
                .next()
                .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        })
        .unwrap_or_default();

    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();
    let mut body = paragraphs.join("\n");
    if body.chars().count() < min_body_chars {
        body = visible_text(document.root_element())
            .chars()
            .take(DOCUMENT_TEXT_LIMIT)
            .collect();
    }

    let mut image_urls = Vec::new();
    let candidates = meta_content(&document, &OG_IMAGE).into_iter().chain(
        document.select(&IMAGE).filter_map(|img| {
            let el = img.value();
            el.attr("src")
                .or_else(|| el.attr("data-src"))
                .or_else(|| el.attr("data-lazy-src"))
                .map(str::to_string)
        }),
    );
    for candidate in candidates {
        if let Some(url) = resolve_image_url(base, &candidate) {
            if !image_urls.contains(&url) {
                image_urls.push(url);
            }
        }
    }

    let (tag, _) = split_category(&title);
    Article {
        title,
        body,
        image_urls,
        tag,
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|m| m.value().attr("content"))
        .map(collapse_whitespace)
        .find(|c| !c.is_empty())
}

/// Resolves an image reference against the page URL, rejecting inline data,
/// vector images and animations.
fn resolve_image_url(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    let url = base.join(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".svg") || path.ends_with(".gif") {
        return None;
    }
    Some(url.into())
}

/// Text of every node outside `<script>`, `<style>` and `<noscript>`.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element())
            .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
