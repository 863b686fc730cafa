//! Pixel-level painting primitives: blending and filled shapes.
//!
//! Shapes are rasterized with tiny-skia and composited onto the canvas.
//! Everything here clips silently at the canvas edge, so callers may pass
//! coordinates that fall partly or wholly outside the image.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Transform};

use super::svg::{composite_over, pixmap_to_rgba_image};
use crate::card::RectPx;

/// Alpha blends two RGBA pixels (source over destination).
pub fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

/// Blends `color` into one pixel with its alpha scaled by `coverage` (0-1).
pub fn blend_pixel(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let alpha = (color[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
    if alpha == 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let src = Rgba([color[0], color[1], color[2], alpha]);
    let dst = *img.get_pixel(x, y);
    img.put_pixel(x, y, alpha_blend(src, dst));
}

/// Cubic control-point factor for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Fills an axis-aligned rectangle.
pub fn fill_rect(img: &mut RgbaImage, rect: RectPx, color: Rgba<u8>) {
    let path = Rect::from_xywh(0.0, 0.0, rect.width as f32, rect.height as f32).map(PathBuilder::from_rect);
    fill_shape(img, rect, path, color);
}

/// Fills a rectangle with corners rounded to `radius`.
pub fn fill_rounded_rect(img: &mut RgbaImage, rect: RectPx, radius: u32, color: Rgba<u8>) {
    let path = rounded_rect_path(rect.width as f32, rect.height as f32, radius as f32);
    fill_shape(img, rect, path, color);
}

/// Fills a horizontal pill: a rounded rectangle whose end caps have a
/// diameter of `rect.height`.
pub fn fill_pill(img: &mut RgbaImage, rect: RectPx, color: Rgba<u8>) {
    let path = rounded_rect_path(rect.width as f32, rect.height as f32, rect.height as f32 / 2.0);
    fill_shape(img, rect, path, color);
}

/// Rasterizes `path`, given relative to `rect`'s top-left corner, with
/// anti-aliasing and composites it over `img` at `rect`.
fn fill_shape(img: &mut RgbaImage, rect: RectPx, path: Option<Path>, color: Rgba<u8>) {
    let (Some(path), Some(mut pixmap)) = (path, Pixmap::new(rect.width, rect.height)) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    if let Some(shape) = pixmap_to_rgba_image(&pixmap) {
        composite_over(img, &shape, rect.x as i32, rect.y as i32);
    }
}

/// A `w` x `h` rectangle at the origin with circular corners of `radius`.
fn rounded_rect_path(w: f32, h: f32, radius: f32) -> Option<Path> {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    if r <= 0.0 {
        return Rect::from_xywh(0.0, 0.0, w, h).map(PathBuilder::from_rect);
    }
    let k = r * (1.0 - KAPPA);

    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(w - r, 0.0);
    pb.cubic_to(w - k, 0.0, w, k, w, r);
    pb.line_to(w, h - r);
    pb.cubic_to(w, h - k, w - k, h, w - r, h);
    pb.line_to(r, h);
    pb.cubic_to(k, h, 0.0, h - k, 0.0, h - r);
    pb.line_to(0.0, r);
    pb.cubic_to(0.0, k, k, 0.0, r, 0.0);
    pb.close();
    pb.finish()
}

/// Mean Rec. 601 luma of the pixels inside `rect`, ignoring alpha.
pub fn mean_luma(img: &RgbaImage, rect: RectPx) -> f32 {
    let rect = rect.clamp_to(crate::card::SizePx::new(img.width(), img.height()));
    if rect.width == 0 || rect.height == 0 {
        return 0.0;
    }
    let mut total = 0.0f64;
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let p = img.get_pixel(x, y);
            total += 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64;
        }
    }
    (total / (rect.width as f64 * rect.height as f64)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn opaque_source_replaces_destination() {
        assert_eq!(alpha_blend(RED, BLACK), RED);
    }

    #[test]
    fn transparent_source_keeps_destination() {
        assert_eq!(alpha_blend(Rgba([255, 0, 0, 0]), BLACK), BLACK);
    }

    #[test]
    fn half_coverage_blends() {
        let mut img = RgbaImage::from_pixel(2, 2, BLACK);
        blend_pixel(&mut img, 0, 0, RED, 0.5);
        let p = img.get_pixel(0, 0);
        assert!(p[0] > 100 && p[0] < 160);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut img = RgbaImage::from_pixel(2, 2, BLACK);
        blend_pixel(&mut img, -1, 5, RED, 1.0);
        fill_rect(&mut img, RectPx::new(1, 1, 10, 10), RED);
        assert_eq!(*img.get_pixel(0, 0), BLACK);
        assert_eq!(*img.get_pixel(1, 1), RED);
    }

    #[test]
    fn rounded_rect_leaves_corners_clear() {
        let mut img = RgbaImage::from_pixel(40, 40, BLACK);
        fill_rounded_rect(&mut img, RectPx::new(0, 0, 40, 40), 12, RED);
        assert_eq!(*img.get_pixel(0, 0), BLACK);
        assert_eq!(*img.get_pixel(20, 20), RED);
        assert_eq!(*img.get_pixel(20, 0), RED);
    }

    #[test]
    fn pill_covers_center_and_caps() {
        let mut img = RgbaImage::from_pixel(100, 40, BLACK);
        fill_pill(&mut img, RectPx::new(10, 10, 80, 20), RED);
        assert_eq!(*img.get_pixel(50, 20), RED);
        assert_eq!(*img.get_pixel(12, 20), RED);
        assert_eq!(*img.get_pixel(87, 20), RED);
        assert_eq!(*img.get_pixel(10, 10), BLACK);
        assert_eq!(*img.get_pixel(50, 5), BLACK);
    }

    #[test]
    fn rounded_corner_edges_are_antialiased() {
        let mut img = RgbaImage::from_pixel(60, 60, BLACK);
        fill_rounded_rect(&mut img, RectPx::new(0, 0, 60, 60), 24, RED);

        // Pixels along the corner arc are partially covered.
        let partial = (0..24)
            .flat_map(|x| (0..24).map(move |y| (x, y)))
            .filter(|&(x, y)| {
                let r = img.get_pixel(x, y)[0];
                r > 0 && r < 255
            })
            .count();
        assert!(partial > 10, "only {partial} blended corner pixels");
    }

    #[test]
    fn translucent_fill_blends_over_destination() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([200, 200, 200, 255]));
        fill_rect(&mut img, RectPx::new(0, 0, 10, 10), Rgba([0, 0, 0, 128]));
        let p = img.get_pixel(5, 5);
        assert!(p[0] > 90 && p[0] < 110, "got {p:?}");
        assert_eq!(p[3], 255);
    }

    #[test]
    fn empty_shapes_draw_nothing() {
        let mut img = RgbaImage::from_pixel(4, 4, BLACK);
        fill_rect(&mut img, RectPx::new(1, 1, 0, 3), RED);
        fill_pill(&mut img, RectPx::new(1, 1, 3, 0), RED);
        assert!(img.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn luma_of_regions() {
        let mut img = RgbaImage::from_pixel(10, 10, BLACK);
        fill_rect(&mut img, RectPx::new(5, 0, 5, 10), Rgba([255, 255, 255, 255]));
        assert!(mean_luma(&img, RectPx::new(0, 0, 5, 10)) < 1.0);
        assert!(mean_luma(&img, RectPx::new(5, 0, 5, 10)) > 254.0);
        assert!((mean_luma(&img, RectPx::from_size(10, 10)) - 127.5).abs() < 1.0);
        assert_eq!(mean_luma(&img, RectPx::new(50, 50, 5, 5)), 0.0);
    }
}
