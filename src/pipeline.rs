//! End-to-end job: article URL in, rendered deck out.
//!
//! Input and collaborator failures abort the job before any image is drawn.
//! Asset problems are absorbed by the asset layer, and individual slide
//! failures are reported alongside the cards that did render.

use std::time::Duration;

use image::RgbaImage;

use crate::assets::{AssetCache, resolve_assets, resolve_pool};
use crate::card::CardDeck;
use crate::compositor::{Configurable, SlideCompositor, SlideFailure};
use crate::error::{CardError, CardResult};
use crate::fetch::{Fetch, HttpFetcher};
use crate::plan::{GeminiGenerator, Planner, RandomLayouts, SlidePlan, TextGenerator};
use crate::profile::RenderProfile;
use crate::source::{ArticleSource, HtmlArticleSource};

const ARTICLE_TIMEOUT: Duration = Duration::from_secs(10);
const ASSET_TIMEOUT: Duration = Duration::from_secs(30);

/// One deck to produce.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub url: String,
    /// Replaces the scraped background pool when present.
    pub user_image: Option<RgbaImage>,
    /// Seeds the layout variety of generic content slides.
    pub seed: Option<u64>,
}

impl RenderRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_user_image(mut self, image: RgbaImage) -> Self {
        self.user_image = Some(image);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Everything a finished job produced.
#[derive(Debug)]
pub struct CardBundle {
    pub plan: SlidePlan,
    pub deck: CardDeck,
    /// Slides that could not be rendered; the rest of the deck is intact.
    pub failures: Vec<SlideFailure>,
    /// Space-separated hashtags for copy-paste.
    pub hashtags: String,
}

/// Wires an article source, a planner and the renderer together.
///
/// The asset cache and the compositor's background cache live as long as
/// the pipeline, so consecutive jobs reuse fonts and logos.
pub struct CardNewsPipeline<S, G, F> {
    source: S,
    planner: Planner<G>,
    images: F,
    cache: AssetCache,
    compositor: SlideCompositor,
}

impl CardNewsPipeline<HtmlArticleSource<HttpFetcher>, GeminiGenerator, HttpFetcher> {
    /// The production pipeline: HTTP scraping, Gemini planning and a disk
    /// asset cache under `profile.fonts.cache_dir`.
    pub fn http(profile: &RenderProfile, api_key: &str) -> CardResult<Self> {
        let generator = GeminiGenerator::new(api_key, Duration::from_secs(profile.plan.request_timeout_secs))?;
        let source = HtmlArticleSource::new(HttpFetcher::new(ARTICLE_TIMEOUT)?, profile.plan.min_body_chars);
        let images = HttpFetcher::new(Duration::from_secs(profile.pool.download_timeout_secs))?;
        let cache = AssetCache::new(HttpFetcher::new(ASSET_TIMEOUT)?, profile.fonts.cache_dir.clone());
        Ok(Self::new(source, generator, images, cache, profile))
    }
}

impl<S: ArticleSource, G: TextGenerator, F: Fetch> CardNewsPipeline<S, G, F> {
    pub fn new(source: S, generator: G, images: F, cache: AssetCache, profile: &RenderProfile) -> Self {
        Self {
            source,
            planner: Planner::from_profile(generator, profile),
            images,
            cache,
            compositor: SlideCompositor::new(profile),
        }
    }

    pub fn profile(&self) -> &RenderProfile {
        self.compositor.profile()
    }

    /// Applies a new profile to the planner and the compositor.
    pub fn set_profile(&mut self, profile: &RenderProfile)
    where
        G: Clone,
    {
        self.planner = Planner::from_profile(self.planner.generator().clone(), profile);
        self.compositor.apply_profile(profile);
    }

    /// Runs one job.
    #[tracing::instrument(skip_all, fields(url = %request.url))]
    pub fn run(&mut self, request: &RenderRequest) -> CardResult<CardBundle> {
        if request.url.trim().is_empty() {
            return Err(CardError::input("an article URL is required"));
        }
        let profile = self.compositor.profile().clone();

        let article = self.source.fetch(request.url.trim())?;

        let mut picker = match request.seed {
            Some(seed) => RandomLayouts::seeded(seed),
            None => RandomLayouts::from_entropy(),
        };
        let plan = self.planner.plan(&article, &mut picker)?;

        let pool = resolve_pool(
            request.user_image.clone(),
            &article.image_urls,
            &self.images,
            &profile.pool,
            profile.aspect.canvas(),
            profile.background.placeholder(),
        );
        let assets = resolve_assets(&self.cache, &profile, &plan, pool)?;
        tracing::info!(accent = %assets.accent, slides = plan.len(), "assets resolved");

        let render = self.compositor.render_deck(&plan, &assets, request.url.trim());
        if render.deck.is_empty() {
            return Err(CardError::render(format!(
                "none of the {} slides could be rendered",
                plan.len()
            )));
        }

        Ok(CardBundle {
            hashtags: plan.hashtags.clone(),
            plan,
            deck: render.deck,
            failures: render.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};

    use super::*;
    use crate::fetch::testing::MapFetcher;
    use crate::plan::SlideKind;
    use crate::profile::FontSources;
    use crate::text::face::tests::FIXTURE_FONT;

    const URL: &str = "https://news.example.com/article/1";

    struct Canned(&'static str);

    impl TextGenerator for Canned {
        fn generate(&self, _model: &str, _prompt: &str) -> CardResult<String> {
            Ok(self.0.to_string())
        }
    }

    const REPLY: &str = "COLOR_MAIN: #1E90FF\nHASHTAGS: 금리, 한국은행\n\
        [SLIDE 1]\nTYPE: COVER\nHEAD: 기준금리 3.50% 동결\nDESC: 물가와 가계부채를 함께 고려했다.\n\
        [SLIDE 2]\nTYPE: CONTENT\nHEAD: 물가 여전히 높아\nDESC: 소비자물가 상승률이 목표를 웃돈다.\n\
        [SLIDE 3]\nTYPE: DATA\nHEAD: 3.50%\nDESC: 7회 연속 동결\n";

    fn page() -> String {
        format!(
            r#"<html><head><meta property="og:title" content="[속보] 기준금리 동결">
            <meta property="og:image" content="https://img.example.com/main.png"></head>
            <body><p>{}</p></body></html>"#,
            "한국은행이 기준금리를 동결했다. ".repeat(10)
        )
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        RgbaImage::from_pixel(width, height, Rgba([90, 120, 150, 255]))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn profile() -> RenderProfile {
        let mut profile = RenderProfile::new();
        profile.fonts = FontSources {
            heading: FIXTURE_FONT.into(),
            body: FIXTURE_FONT.into(),
            serif: FIXTURE_FONT.into(),
            cache_dir: None,
        };
        profile
    }

    fn pipeline(
        page: String,
        reply: &'static str,
    ) -> CardNewsPipeline<HtmlArticleSource<MapFetcher>, Canned, MapFetcher> {
        let profile = profile();
        CardNewsPipeline::new(
            HtmlArticleSource::new(MapFetcher::default().with(URL, page), 50),
            Canned(reply),
            MapFetcher::default().with("https://img.example.com/main.png", png(800, 600)),
            AssetCache::new(MapFetcher::default(), None),
            &profile,
        )
    }

    #[test]
    fn full_job_produces_a_repaired_deck() {
        let mut pipeline = pipeline(page(), REPLY);

        let bundle = pipeline.run(&RenderRequest::new(URL).with_seed(7)).unwrap();

        assert_eq!(bundle.deck.len(), 8);
        assert!(bundle.failures.is_empty());
        assert_eq!(bundle.plan.slides[0].kind, SlideKind::Cover);
        assert_eq!(bundle.plan.slides[0].tag.as_deref(), Some("속보"));
        assert_eq!(bundle.plan.slides[7].kind, SlideKind::Outro);
        assert_eq!(bundle.hashtags, "#금리 #한국은행");
        assert_eq!(bundle.deck.find_by_index(8).unwrap().image.get_pixel(3, 3).0, [30, 144, 255, 255]);
    }

    #[test]
    fn short_article_aborts_before_planning() {
        let mut pipeline = pipeline("<p>짧은 기사</p>".into(), REPLY);
        let err = pipeline.run(&RenderRequest::new(URL)).unwrap_err();
        assert!(matches!(err, CardError::ArticleTooShort { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn empty_plan_is_fatal() {
        let mut pipeline = pipeline(page(), "죄송합니다. 요청을 처리할 수 없습니다.");
        let err = pipeline.run(&RenderRequest::new(URL)).unwrap_err();
        assert!(matches!(err, CardError::EmptyPlan));
    }

    #[test]
    fn missing_url_is_an_input_error() {
        let mut pipeline = pipeline(page(), REPLY);
        let err = pipeline.run(&RenderRequest::new("  ")).unwrap_err();
        assert!(matches!(err, CardError::Input(_)));
    }

    #[test]
    fn user_image_replaces_scraped_pool() {
        let mut pipeline = pipeline(page(), REPLY);
        let request = RenderRequest::new(URL)
            .with_seed(1)
            .with_user_image(RgbaImage::from_pixel(400, 400, Rgba([250, 0, 0, 255])));

        let bundle = pipeline.run(&request).unwrap();

        // the cover's top rows show the dimmed red photo
        let top = bundle.deck.find_by_index(1).unwrap().image.get_pixel(1000, 20).0;
        assert!(top[0] > 150 && top[1] < 20);
    }
}
