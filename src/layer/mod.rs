//! Layer infrastructure for slide rendering.
//!
//! A card is produced by three layers applied in order to a blank canvas:
//! background, header overlay and content layout. Each layer encapsulates a
//! configuration, an enabled state, version tracking for cache invalidation,
//! and an image cache.
//!
//! # Architecture
//!
//! Each layer config implements [`LayerEffect`], which defines:
//! - How the layer renders itself for a given [`Scene`]
//! - Whether its output for that scene can be cached, and under which key
//! - What properties it emits for downstream layers
//!
//! Properties flow through the pipeline via [`RenderContext`], enabling
//! layers to communicate without tight coupling. The overlay, for example,
//! emits a [`HeaderFootprint`] that layouts use as their upper bound.

pub mod background;
pub mod layout;
pub mod overlay;
pub mod paint;
pub mod qr;
pub mod svg;

pub use background::{BackgroundConfig, Treatment};
pub use layout::LayoutConfig;
pub use overlay::OverlayConfig;

use std::any::{Any, TypeId};
use std::collections::HashMap;

use image::RgbaImage;

use crate::assets::DeckAssets;
use crate::card::SizePx;
use crate::error::CardResult;
use crate::plan::SlideSpec;

// ============================================================================
// Render Context
// ============================================================================

/// Context that flows through the rendering pipeline.
///
/// Layers can read properties set by upstream layers and emit new properties
/// for downstream layers to consume.
///
/// # Example
///
/// ```ignore
/// // Upstream layer emits a property
/// ctx.set(HeaderFootprint { bottom: 140, right: 420 });
///
/// // Downstream layer reads the property
/// let top = ctx.get::<HeaderFootprint>().map_or(0, |h| h.bottom);
/// ```
pub struct RenderContext {
    /// The card being drawn.
    pub image: RgbaImage,

    /// Typed property bag for inter-layer communication.
    properties: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RenderContext {
    /// Creates a new render context with the given base image.
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            properties: HashMap::new(),
        }
    }

    /// A fully transparent canvas of `size`.
    pub fn blank(size: SizePx) -> Self {
        Self::new(RgbaImage::new(size.width, size.height))
    }

    /// Sets a typed property that downstream layers can read.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.properties.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Gets a typed property set by an upstream layer.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.properties
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    /// Checks if a property has been set.
    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        self.properties.contains_key(&TypeId::of::<T>())
    }

    pub fn size(&self) -> SizePx {
        SizePx::new(self.image.width(), self.image.height())
    }
}

// ============================================================================
// Common Properties
// ============================================================================

/// Extent of the header row (logo, badge, counter) drawn by the overlay.
///
/// Emitted by the overlay layer. Consumed by layouts whose text grows
/// upward, which must stay below `bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFootprint {
    /// First row below the header.
    pub bottom: u32,
    /// First column right of the logo and badge.
    pub right: u32,
}

// ============================================================================
// Scene
// ============================================================================

/// Everything a layer needs to know about the slide being rendered.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub slide: &'a SlideSpec,
    pub assets: &'a DeckAssets,
    /// Article URL, encoded into the outro QR code.
    pub source_url: &'a str,
    pub canvas: SizePx,
}

impl Scene<'_> {
    /// Content column width: the canvas minus symmetric `margin`s.
    pub fn column_width(&self, margin: u32) -> u32 {
        self.canvas.width.saturating_sub(margin * 2)
    }
}

// ============================================================================
// Layer Traits
// ============================================================================

/// Trait for layer configuration types.
///
/// Implementations must detect when a configuration meaningfully differs
/// from another, which drives cache invalidation.
pub trait LayerConfig: Clone {
    /// Returns true if this config differs from another in a way that
    /// would produce different rendering output.
    fn differs_from(&self, other: &Self) -> bool;
}

/// Trait for layer configurations that know how to apply themselves.
///
/// The separation of [`transform`](Self::transform) and [`emit`](Self::emit)
/// provides a canonical place for property emission and makes the data flow
/// explicit.
pub trait LayerEffect: LayerConfig {
    /// Cache key for this layer's output on `scene`, or `None` when the
    /// output must be rendered every time.
    ///
    /// Only layers whose output depends on nothing but the key may return
    /// one; a cache hit replaces the whole context image.
    fn cache_key(&self, _scene: &Scene<'_>) -> Option<CacheKey> {
        None
    }

    /// Transform the image in the render context.
    ///
    /// Property emission happens in [`emit`](Self::emit), not here.
    fn transform(&self, ctx: &mut RenderContext, scene: &Scene<'_>) -> CardResult<()>;

    /// Emit properties for downstream layers to consume.
    ///
    /// Called after [`transform`](Self::transform), and again on a cache hit
    /// since only the image is cached. The default emits nothing.
    fn emit(&self, _ctx: &mut RenderContext, _scene: &Scene<'_>) {}
}

// ============================================================================
// CacheKey
// ============================================================================

/// Key for cached layer output.
///
/// Identifies the source image (pool fingerprint and slot), the treatment
/// applied to it and the output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub pool: u64,
    pub slot: usize,
    pub treatment: Treatment,
    pub width: u32,
    pub height: u32,
}

impl CacheKey {
    pub fn new(pool: u64, slot: usize, treatment: Treatment, size: SizePx) -> Self {
        Self {
            pool,
            slot,
            treatment,
            width: size.width,
            height: size.height,
        }
    }
}

// ============================================================================
// Generic Layer
// ============================================================================

/// A generic layer with configuration, caching, and version tracking.
///
/// The layer tracks:
/// - Optional configuration of type `C`
/// - Whether the layer is enabled (can be toggled without losing config)
/// - A version number that increments on any state change
/// - A cache of rendered images keyed by [`CacheKey`]
pub struct Layer<C: LayerConfig> {
    config: Option<C>,
    enabled: bool,
    version: u64,
    cache: HashMap<CacheKey, RgbaImage>,
}

impl<C: LayerConfig> Default for Layer<C> {
    fn default() -> Self {
        Self {
            config: None,
            enabled: true,
            version: 0,
            cache: HashMap::new(),
        }
    }
}

impl<C: LayerConfig> Layer<C> {
    /// A layer holding `config`.
    pub fn with_config(config: C) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    /// Returns the current configuration, if any.
    pub fn config(&self) -> Option<&C> {
        self.config.as_ref()
    }

    /// Returns true if this layer is active (has config AND is enabled).
    pub fn is_active(&self) -> bool {
        self.enabled && self.config.is_some()
    }

    /// Returns whether the layer is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets whether the layer is enabled.
    ///
    /// Returns true if the enabled state changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.invalidate();
            true
        } else {
            false
        }
    }

    /// Returns the current version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the configuration. Returns true if it changed.
    ///
    /// Clears the cache and increments version if the config differs.
    pub fn set_config(&mut self, config: Option<C>) -> bool {
        let differs = match (&self.config, &config) {
            (None, None) => false,
            (Some(_), None) | (None, Some(_)) => true,
            (Some(old), Some(new)) => old.differs_from(new),
        };

        if differs {
            self.config = config;
            self.invalidate();
            true
        } else {
            false
        }
    }

    /// Clears the cache and increments version.
    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.cache.clear();
    }

    /// Drops cached images without bumping the version.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of cached images.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl<C: LayerEffect> Layer<C> {
    /// Apply this layer to the render context, using cache if valid.
    ///
    /// An inactive layer leaves the context unchanged. A cache hit replaces
    /// the context image and re-emits properties; otherwise the layer runs
    /// transform then emit, and caches the result when it has a key.
    pub fn apply(&mut self, ctx: &mut RenderContext, scene: &Scene<'_>) -> CardResult<()> {
        let Self {
            config,
            enabled,
            cache,
            ..
        } = self;
        let Some(config) = config.as_ref().filter(|_| *enabled) else {
            return Ok(());
        };

        let key = config.cache_key(scene);
        if let Some(cached) = key.and_then(|k| cache.get(&k)) {
            ctx.image.clone_from(cached);
            config.emit(ctx, scene);
            return Ok(());
        }

        config.transform(ctx, scene)?;
        config.emit(ctx, scene);

        if let Some(key) = key {
            cache.insert(key, ctx.image.clone());
        }
        Ok(())
    }
}

// ============================================================================
// Layer Pipeline
// ============================================================================

/// The fixed layer stack every card is drawn with.
///
/// # Order
///
/// ```text
/// Blank canvas
///     │
///     ▼
/// ┌────────────┐
/// │ Background │ ◄── cached per pool slot and treatment
/// └─────┬──────┘
///       │
///       ▼
/// ┌────────────┐
/// │  Overlay   │ ◄── emits HeaderFootprint (skipped on the outro)
/// └─────┬──────┘
///       │
///       ▼
/// ┌────────────┐
/// │   Layout   │ ◄── reads HeaderFootprint
/// └────────────┘
/// ```
pub struct LayerPipeline {
    pub background: Layer<BackgroundConfig>,
    pub overlay: Layer<OverlayConfig>,
    pub layout: Layer<LayoutConfig>,
}

impl Default for LayerPipeline {
    fn default() -> Self {
        Self {
            background: Layer::with_config(BackgroundConfig::default()),
            overlay: Layer::with_config(OverlayConfig::default()),
            layout: Layer::with_config(LayoutConfig::default()),
        }
    }
}

impl LayerPipeline {
    /// Drops every layer's cached images. Configuration versions are kept.
    pub fn clear_caches(&mut self) {
        self.background.clear_cache();
        self.overlay.clear_cache();
        self.layout.clear_cache();
    }

    /// Renders one card.
    pub fn render(&mut self, scene: &Scene<'_>) -> CardResult<RgbaImage> {
        let mut ctx = RenderContext::blank(scene.canvas);

        self.background.apply(&mut ctx, scene)?;
        self.overlay.apply(&mut ctx, scene)?;
        self.layout.apply(&mut ctx, scene)?;

        Ok(ctx.image)
    }
}
