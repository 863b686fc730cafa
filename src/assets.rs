//! Asset resolution: fonts, logo parts, the background pool and the accent.
//!
//! Network and disk failures are absorbed here. A font that cannot be
//! fetched falls back to a system font, a logo that cannot be loaded is
//! replaced by a text label, and scraped images that cannot be downloaded are
//! skipped until the pool falls back to a flat placeholder. The one failure
//! that escapes is "no usable font anywhere", since nothing can be drawn
//! without one.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::{RgbaImage, imageops};

use crate::card::SizePx;
use crate::color::{AccentColor, dominant_color};
use crate::error::{CardError, CardResult};
use crate::fetch::Fetch;
use crate::layer::svg::{looks_like_svg, render_svg_to_height};
use crate::plan::SlidePlan;
use crate::profile::{Branding, FontSources, OverlaySettings, PoolSettings, RenderProfile};
use crate::text::face::system_fallback;
use crate::text::{Face, FontRole, FontSet};

// ============================================================================
// Process-scoped cache
// ============================================================================

/// Fonts and logo parts, fetched once and reused for every deck.
///
/// Values are populated on first access. Fetched bytes are also persisted
/// under the cache directory when one is configured, so later processes skip
/// the network entirely.
pub struct AssetCache {
    fetcher: Box<dyn Fetch + Send + Sync>,
    dir: Option<PathBuf>,
    fonts: OnceLock<FontSet>,
    logo: OnceLock<LogoParts>,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("dir", &self.dir)
            .field("fonts_loaded", &self.fonts.get().is_some())
            .field("logo_loaded", &self.logo.get().is_some())
            .finish()
    }
}

impl AssetCache {
    pub fn new(fetcher: impl Fetch + Send + Sync + 'static, dir: Option<PathBuf>) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            dir,
            fonts: OnceLock::new(),
            logo: OnceLock::new(),
        }
    }

    /// Returns the deck fonts, loading them on first use.
    ///
    /// Each role is tried from the disk cache, then its source, then the
    /// first usable system font. Fails only when all of those fail.
    pub fn font_set(&self, sources: &FontSources) -> CardResult<FontSet> {
        if let Some(fonts) = self.fonts.get() {
            return Ok(fonts.clone());
        }

        let mut system: Option<Option<Face>> = None;
        let mut load = |role: FontRole, source: &str| -> CardResult<Face> {
            if let Some(face) = self.load_font(role, source) {
                return Ok(face);
            }
            tracing::warn!(%role, source, "font unavailable, using system fallback");
            system
                .get_or_insert_with(system_fallback)
                .clone()
                .ok_or_else(|| CardError::font(format!("no usable {role} font and no system fallback")))
        };

        let fonts = FontSet::new(
            load(FontRole::Heading, &sources.heading)?,
            load(FontRole::Body, &sources.body)?,
            load(FontRole::Serif, &sources.serif)?,
        );
        Ok(self.fonts.get_or_init(|| fonts).clone())
    }

    /// Returns the logo parts, loading them on first use. Parts that cannot
    /// be loaded are `None`.
    pub fn logo(&self, branding: &Branding, overlay: &OverlaySettings) -> LogoParts {
        self.logo
            .get_or_init(|| LogoParts {
                symbol: branding
                    .logo_symbol
                    .as_deref()
                    .and_then(|src| self.load_logo_part("symbol", src, overlay.symbol_height)),
                wordmark: branding
                    .logo_wordmark
                    .as_deref()
                    .and_then(|src| self.load_logo_part("wordmark", src, overlay.wordmark_height)),
            })
            .clone()
    }

    fn load_font(&self, role: FontRole, source: &str) -> Option<Face> {
        let bytes = self.load_bytes(role.name(), "ttf", source)?;
        match Face::from_bytes(bytes) {
            Ok(face) => Some(face),
            Err(err) => {
                tracing::warn!(%role, source, %err, "font data unusable");
                None
            }
        }
    }

    fn load_logo_part(&self, name: &str, source: &str, height: u32) -> Option<RgbaImage> {
        let ext = if source.to_ascii_lowercase().ends_with(".svg") { "svg" } else { "img" };
        let bytes = self.load_bytes(name, ext, source)?;
        match decode_logo(&bytes, height) {
            Some(image) => Some(image),
            None => {
                tracing::warn!(part = name, source, "logo asset could not be decoded");
                None
            }
        }
    }

    /// Reads `source` (a local path or an http(s) URL), going through the
    /// disk cache for URLs.
    fn load_bytes(&self, name: &str, ext: &str, source: &str) -> Option<Vec<u8>> {
        if source.trim().is_empty() {
            return None;
        }

        if !is_remote(source) {
            return match std::fs::read(source) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    tracing::warn!(path = source, %err, "asset file unreadable");
                    None
                }
            };
        }

        let cached = self
            .dir
            .as_ref()
            .map(|dir| dir.join(format!("{name}-{:016x}.{ext}", fnv1a(source.as_bytes()))));
        if let Some(path) = &cached {
            if let Ok(bytes) = std::fs::read(path) {
                tracing::debug!(path = %path.display(), "asset cache hit");
                return Some(bytes);
            }
        }

        match self.fetcher.get(source) {
            Ok(bytes) => {
                if let Some(path) = &cached {
                    persist(path, &bytes);
                }
                Some(bytes)
            }
            Err(err) => {
                tracing::warn!(url = source, %err, "asset download failed");
                None
            }
        }
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn persist(path: &Path, bytes: &[u8]) {
    let result = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|()| std::fs::write(path, bytes));
    if let Err(err) = result {
        tracing::warn!(path = %path.display(), %err, "could not write asset cache");
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

/// 64-bit FNV-1a, stable across runs and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    fnv1a_continue(FNV_OFFSET, bytes)
}

/// Feeds `bytes` into a running FNV-1a hash.
fn fnv1a_continue(hash: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(hash, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

// ============================================================================
// Logo parts
// ============================================================================

/// Brand symbol and wordmark, each already scaled to its header height.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogoParts {
    pub symbol: Option<RgbaImage>,
    pub wordmark: Option<RgbaImage>,
}

impl LogoParts {
    pub fn is_empty(&self) -> bool {
        self.symbol.is_none() && self.wordmark.is_none()
    }
}

fn decode_logo(bytes: &[u8], height: u32) -> Option<RgbaImage> {
    if looks_like_svg(bytes) {
        let svg = std::str::from_utf8(bytes).ok()?;
        return render_svg_to_height(svg, height);
    }
    let image = image::load_from_memory(bytes).ok()?.into_rgba8();
    Some(scale_to_height(&image, height))
}

fn scale_to_height(image: &RgbaImage, height: u32) -> RgbaImage {
    if image.height() == 0 || image.height() == height {
        return image.clone();
    }
    let width = (image.width() as f32 * height as f32 / image.height() as f32).round().max(1.0) as u32;
    imageops::resize(image, width, height.max(1), imageops::FilterType::Lanczos3)
}

// ============================================================================
// Background pool
// ============================================================================

/// The ordered, non-empty list of background images for a deck.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundPool {
    images: Vec<RgbaImage>,
    fingerprint: u64,
}

impl BackgroundPool {
    /// Builds a pool; fails on an empty list.
    pub fn new(images: Vec<RgbaImage>) -> CardResult<Self> {
        if images.is_empty() {
            return Err(CardError::render("a background pool needs at least one image"));
        }
        let fingerprint = images.iter().fold(0u64, |acc, img| {
            acc.rotate_left(7) ^ image_fingerprint(img)
        });
        Ok(Self { images, fingerprint })
    }

    /// A single flat image of `size` in `color`.
    pub fn placeholder(size: SizePx, color: AccentColor) -> Self {
        let image = RgbaImage::from_pixel(size.width, size.height, color.opaque());
        let fingerprint = image_fingerprint(&image);
        Self {
            images: vec![image],
            fingerprint,
        }
    }

    /// The image for deck position `index` (0-based); short pools repeat.
    pub fn get(&self, index: usize) -> &RgbaImage {
        &self.images[index % self.images.len()]
    }

    pub fn primary(&self) -> &RgbaImage {
        &self.images[0]
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Identifies the pool's contents for cache keys.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Hash of an image's size and every pixel.
fn image_fingerprint(image: &RgbaImage) -> u64 {
    let hash = fnv1a(&image.width().to_le_bytes());
    let hash = fnv1a_continue(hash, &image.height().to_le_bytes());
    fnv1a_continue(hash, image.as_raw())
}

/// Builds the background pool.
///
/// A user image wins outright. Otherwise candidate URLs are downloaded in
/// order, keeping images at least `min_width` x `min_height`, until
/// `max_images` are collected. With nothing usable the pool is one flat
/// placeholder of the canvas size.
#[tracing::instrument(skip_all, fields(candidates = urls.len(), user_image = user_image.is_some()))]
pub fn resolve_pool(
    user_image: Option<RgbaImage>,
    urls: &[String],
    fetcher: &dyn Fetch,
    settings: &PoolSettings,
    canvas: SizePx,
    placeholder: AccentColor,
) -> BackgroundPool {
    if let Some(image) = user_image {
        let fingerprint = image_fingerprint(&image);
        return BackgroundPool {
            images: vec![image],
            fingerprint,
        };
    }

    let mut images = Vec::new();
    for url in urls {
        if images.len() >= settings.max_images {
            break;
        }
        let bytes = match fetcher.get(url) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(url, %err, "candidate image skipped");
                continue;
            }
        };
        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image.into_rgba8(),
            Err(err) => {
                tracing::debug!(url, %err, "candidate image undecodable");
                continue;
            }
        };
        if image.width() < settings.min_width || image.height() < settings.min_height {
            tracing::debug!(url, width = image.width(), height = image.height(), "candidate image too small");
            continue;
        }
        images.push(image);
    }

    match BackgroundPool::new(images) {
        Ok(pool) => {
            tracing::info!(images = pool.len(), "background pool ready");
            pool
        }
        Err(_) => {
            tracing::warn!("no usable background image, using placeholder");
            BackgroundPool::placeholder(canvas, placeholder)
        }
    }
}

/// Decodes a user-supplied image file.
pub fn load_user_image(path: &Path) -> CardResult<RgbaImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| CardError::input(format!("cannot read image {}: {e}", path.display())))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| CardError::input(format!("cannot decode image {}: {e}", path.display())))?;
    Ok(image.into_rgba8())
}

// ============================================================================
// Deck assets
// ============================================================================

/// Everything shared read-only by the slides of one deck.
#[derive(Debug, Clone)]
pub struct DeckAssets {
    pub pool: BackgroundPool,
    pub fonts: FontSet,
    pub logo: LogoParts,
    pub accent: AccentColor,
}

/// Picks the deck accent: sampled from the primary background when
/// `auto_color` is set, otherwise the plan's suggestion or `fallback`.
pub fn resolve_accent(
    plan: &SlidePlan,
    pool: &BackgroundPool,
    auto_color: bool,
    fallback: AccentColor,
) -> AccentColor {
    if auto_color {
        let accent = dominant_color(pool.primary());
        tracing::debug!(%accent, "accent sampled from background");
        return accent;
    }
    plan.accent_or(fallback)
}

/// Resolves all assets for one deck.
pub fn resolve_assets(
    cache: &AssetCache,
    profile: &RenderProfile,
    plan: &SlidePlan,
    pool: BackgroundPool,
) -> CardResult<DeckAssets> {
    let fonts = cache.font_set(&profile.fonts)?;
    let logo = cache.logo(&profile.branding, &profile.overlay);
    let accent = resolve_accent(plan, &pool, profile.auto_color, profile.fallback_accent());
    Ok(DeckAssets {
        pool,
        fonts,
        logo,
        accent,
    })
}
