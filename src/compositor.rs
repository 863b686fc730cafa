//! Slide compositor: renders planned slides through the layer pipeline.

use crate::assets::DeckAssets;
use crate::card::{CardDeck, RenderedCard};
use crate::error::{CardError, CardResult};
use crate::layer::{BackgroundConfig, LayerPipeline, LayoutConfig, OverlayConfig, Scene};
use crate::plan::{SlideKind, SlidePlan, SlideSpec};
use crate::profile::RenderProfile;

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured from a [`RenderProfile`].
pub trait Configurable {
    /// Applies a profile's settings to this instance.
    fn apply_profile(&mut self, profile: &RenderProfile);

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> RenderProfile;
}

// ============================================================================
// SlideCompositor
// ============================================================================

/// Renders [`SlideSpec`]s into [`RenderedCard`]s.
///
/// # Layer Pipeline
///
/// 1. **Background** (`pipeline.background`) - photo treatment or flat accent
/// 2. **Overlay** (`pipeline.overlay`) - logo, category badge, page counter
/// 3. **Layout** (`pipeline.layout`) - the kind-specific text composition
///
/// Layers can be reconfigured or toggled directly through the
/// [`pipeline`](Self::pipeline) field. Treated backgrounds are cached per
/// pool slot, so a compositor should be reused for every slide of a deck.
///
/// # Example
///
/// ```
/// use cardnews_renderer::{Configurable, RenderProfile, SlideCompositor};
///
/// let mut compositor = SlideCompositor::new(&RenderProfile::new());
/// compositor.pipeline.overlay.set_enabled(false);
///
/// let profile = compositor.export_profile();
/// assert_eq!(profile, RenderProfile::new());
/// ```
pub struct SlideCompositor {
    profile: RenderProfile,

    /// The layer pipeline. Access layers directly to configure them.
    pub pipeline: LayerPipeline,
}

impl SlideCompositor {
    /// Creates a compositor configured from `profile`.
    pub fn new(profile: &RenderProfile) -> Self {
        let mut compositor = Self {
            profile: profile.clone(),
            pipeline: LayerPipeline::default(),
        };
        compositor.apply_profile(profile);
        compositor
    }

    pub fn profile(&self) -> &RenderProfile {
        &self.profile
    }

    /// Renders one slide.
    pub fn render(&mut self, slide: &SlideSpec, assets: &DeckAssets, source_url: &str) -> CardResult<RenderedCard> {
        let scene = Scene {
            slide,
            assets,
            source_url,
            canvas: self.profile.aspect.canvas(),
        };
        let image = self.pipeline.render(&scene)?;
        Ok(RenderedCard::new(slide.index, image))
    }

    /// Renders every slide of `plan`.
    ///
    /// A slide that fails is recorded in [`DeckRender::failures`] and the
    /// remaining slides are still rendered. Layer caches live for one deck:
    /// they are dropped before the first slide.
    #[tracing::instrument(skip_all, fields(slides = plan.len()))]
    pub fn render_deck(&mut self, plan: &SlidePlan, assets: &DeckAssets, source_url: &str) -> DeckRender {
        self.pipeline.clear_caches();
        let mut deck = CardDeck::new();
        let mut failures = Vec::new();

        for slide in &plan.slides {
            match self.render(slide, assets, source_url) {
                Ok(card) => {
                    tracing::debug!(index = slide.index, kind = slide.kind.name(), "slide rendered");
                    deck.push(card);
                }
                Err(error) => {
                    tracing::warn!(index = slide.index, kind = slide.kind.name(), %error, "slide failed");
                    failures.push(SlideFailure {
                        index: slide.index,
                        kind: slide.kind,
                        error,
                    });
                }
            }
        }

        tracing::info!(rendered = deck.len(), failed = failures.len(), "deck rendered");
        DeckRender { deck, failures }
    }
}

/// Result of rendering a whole plan.
#[derive(Debug)]
pub struct DeckRender {
    pub deck: CardDeck,
    pub failures: Vec<SlideFailure>,
}

impl DeckRender {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A slide that could not be rendered.
#[derive(Debug)]
pub struct SlideFailure {
    pub index: usize,
    pub kind: SlideKind,
    pub error: CardError,
}

impl Configurable for SlideCompositor {
    /// Applies a profile's settings to this compositor.
    ///
    /// Each layer's cache is cleared only if its configuration changed.
    fn apply_profile(&mut self, profile: &RenderProfile) {
        self.pipeline
            .background
            .set_config(Some(BackgroundConfig::new(profile.background.clone())));
        self.pipeline.overlay.set_config(Some(OverlayConfig::new(
            profile.overlay.clone(),
            &profile.layout,
            &profile.branding,
        )));
        self.pipeline.layout.set_config(Some(LayoutConfig::new(
            profile.layout.clone(),
            profile.branding.clone(),
        )));
        self.profile = profile.clone();
    }

    /// Exports the current settings, including any layer configuration
    /// changed directly through the pipeline.
    fn export_profile(&self) -> RenderProfile {
        let mut profile = self.profile.clone();
        if let Some(background) = self.pipeline.background.config() {
            profile.background = background.settings.clone();
        }
        if let Some(overlay) = self.pipeline.overlay.config() {
            profile.overlay = overlay.settings.clone();
        }
        if let Some(layout) = self.pipeline.layout.config() {
            profile.layout = layout.settings.clone();
            profile.branding = layout.branding.clone();
        }
        profile
    }
}

// ============================================================================
// Tests
// ============================================================================
