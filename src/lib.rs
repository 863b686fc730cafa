//! cardnews-renderer: turn a news article into a deck of card-news images
//!
//! This crate scrapes an article, asks a text-generation model for a slide
//! plan, repairs that plan into a fixed-length deck and renders every slide
//! through a layered compositor (background, header overlay, text layout).
//!
//! # Example
//!
//! ```no_run
//! use cardnews_renderer::{CardNewsPipeline, RenderProfile, RenderRequest, write_archive};
//!
//! let profile = RenderProfile::new();
//! let mut pipeline = CardNewsPipeline::http(&profile, "GEMINI_API_KEY")?;
//!
//! let bundle = pipeline.run(&RenderRequest::new("https://news.example.com/article/1"))?;
//! write_archive("cardnews.zip".as_ref(), &bundle.deck, &bundle.hashtags)?;
//! # Ok::<(), cardnews_renderer::CardError>(())
//! ```
//!
//! # Serializable Profiles
//!
//! Every tunable lives in [`RenderProfile`], which round-trips through JSON
//! and is applied to a compositor with the [`Configurable`] trait:
//!
//! ```
//! use cardnews_renderer::{AspectRatio, Configurable, RenderProfile, SlideCompositor};
//!
//! let mut compositor = SlideCompositor::new(&RenderProfile::new());
//!
//! let profile = RenderProfile::new().with_aspect(AspectRatio::Story);
//! compositor.apply_profile(&profile);
//!
//! let json = compositor.export_profile().to_json().unwrap();
//! assert_eq!(RenderProfile::from_json(&json).unwrap(), profile);
//! ```

mod assets;
mod card;
mod color;
mod compositor;
mod error;
mod fetch;
pub mod layer;
mod package;
mod pipeline;
pub mod plan;
mod profile;
mod source;
pub mod text;

pub use assets::{
    AssetCache, BackgroundPool, DeckAssets, LogoParts, load_user_image, resolve_accent, resolve_assets,
    resolve_pool,
};
pub use card::{AspectRatio, CardDeck, RectPx, RenderedCard, SizePx};
pub use color::{AccentColor, dominant_color};
pub use compositor::{Configurable, DeckRender, SlideCompositor, SlideFailure};
pub use error::{CardError, CardResult};
pub use fetch::{Fetch, HttpFetcher};
pub use layer::{CacheKey, Layer, LayerConfig, LayerEffect, LayerPipeline, RenderContext, Scene};
pub use package::{HASHTAGS_ENTRY, archive_bytes, write_archive, write_cards};
pub use pipeline::{CardBundle, CardNewsPipeline, RenderRequest};
pub use plan::{SlideKind, SlidePlan, SlideSpec};
pub use profile::{
    BackgroundSettings, Branding, FontSources, LayoutSettings, OverlaySettings, PlanSettings, PoolSettings,
    RenderProfile,
};
pub use source::{Article, ArticleSource, HtmlArticleSource, parse_article};
