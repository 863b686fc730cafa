//! SVG rasterization via resvg, and raster compositing.
//!
//! Logo assets and QR codes arrive as SVG markup and are turned into
//! straight-alpha RGBA images here before being pasted onto a card.

use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use super::paint::alpha_blend;

// ============================================================================
// SVG Rendering
// ============================================================================

/// Renders an SVG string to an RGBA image at the specified size.
///
/// The SVG is scaled to fit within `size x size` pixels while preserving
/// aspect ratio (the larger dimension will be `size`).
///
/// Returns `None` if the SVG cannot be parsed or rendered.
pub fn render_svg(svg_data: &str, size: u32) -> Option<RgbaImage> {
    let tree = parse(svg_data)?;
    let svg_size = tree.size();
    let scale = (size as f32) / svg_size.width().max(svg_size.height());
    render_scaled(&tree, scale)
}

/// Renders an SVG string scaled so its height is `height` pixels.
pub fn render_svg_to_height(svg_data: &str, height: u32) -> Option<RgbaImage> {
    let tree = parse(svg_data)?;
    let scale = height as f32 / tree.size().height();
    render_scaled(&tree, scale)
}

/// True when `bytes` look like SVG markup rather than a raster format.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

fn parse(svg_data: &str) -> Option<Tree> {
    match Tree::from_str(svg_data, &Options::default()) {
        Ok(tree) => Some(tree),
        Err(err) => {
            tracing::debug!(%err, "svg parse failed");
            None
        }
    }
}

fn render_scaled(tree: &Tree, scale: f32) -> Option<RgbaImage> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let svg_size = tree.size();
    let width = (svg_size.width() * scale).round() as u32;
    let height = (svg_size.height() * scale).round() as u32;

    let mut pixmap = Pixmap::new(width, height)?;
    resvg::render(tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap_to_rgba_image(&pixmap)
}

/// Converts a tiny_skia Pixmap (premultiplied) to a straight-alpha RgbaImage.
pub(super) fn pixmap_to_rgba_image(pixmap: &Pixmap) -> Option<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
}

// ============================================================================
// Compositing
// ============================================================================

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination), so the source's
/// own alpha acts as its paste mask.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i32;
    let dest_height = dest.height() as i32;

    for sy in 0..src.height() {
        for sx in 0..src.width() {
            let dx = x + sx as i32;
            let dy = y + sy as i32;

            if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
                continue;
            }

            let src_pixel = src.get_pixel(sx, sy);
            if src_pixel[3] == 0 {
                continue;
            }
            let dst_pixel = dest.get_pixel(dx as u32, dy as u32);
            let blended = alpha_blend(*src_pixel, *dst_pixel);
            dest.put_pixel(dx as u32, dy as u32, blended);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    const SIMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><circle cx="50" cy="50" r="40" fill="#ff0000"/></svg>"##;
    const WIDE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="50"><rect width="200" height="50" fill="#0000ff"/></svg>"##;

    #[test]
    fn render_simple_svg() {
        let img = render_svg(SIMPLE_SVG, 50).unwrap();
        assert!(img.width() <= 50);
        assert!(img.height() <= 50);

        let center = img.get_pixel(img.width() / 2, img.height() / 2);
        assert_eq!(center.0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn render_to_height_keeps_aspect() {
        let img = render_svg_to_height(WIDE_SVG, 20).unwrap();
        assert_eq!(img.height(), 20);
        assert_eq!(img.width(), 80);
    }

    #[test]
    fn invalid_svg_renders_nothing() {
        assert!(render_svg("<not-svg", 50).is_none());
        assert!(render_svg_to_height(SIMPLE_SVG, 0).is_none());
    }

    #[test]
    fn svg_sniffing() {
        assert!(looks_like_svg(SIMPLE_SVG.as_bytes()));
        assert!(looks_like_svg(b"<?xml version=\"1.0\"?>\n<svg></svg>"));
        assert!(!looks_like_svg(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn composite_simple() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        composite_over(&mut dest, &src, 3, 3);

        assert_eq!(dest.get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_clips_at_edges() {
        let mut dest = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        composite_over(&mut dest, &src, -2, 2);

        assert_eq!(dest.get_pixel(0, 3).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(3, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_with_transparency() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 128]));

        composite_over(&mut dest, &src, 0, 0);

        let pixel = dest.get_pixel(0, 0);
        assert!(pixel[0] > 0, "Should have some red");
        assert!(pixel[2] > 0, "Should have some blue");
    }
}
