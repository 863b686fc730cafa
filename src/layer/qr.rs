//! QR codes linking an outro card back to its article.

use image::RgbaImage;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use super::svg::render_svg;
use crate::error::{CardError, CardResult};

/// Encodes `url` as a black-on-white QR code, quiet zone included, scaled
/// to `size` x `size` pixels.
pub fn qr_image(url: &str, size: u32) -> CardResult<RgbaImage> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::M)
        .map_err(|e| CardError::render(format!("cannot encode QR code: {e}")))?;

    let markup = code
        .render::<svg::Color<'_>>()
        .quiet_zone(true)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .min_dimensions(size, size)
        .build();

    render_svg(&markup, size).ok_or_else(|| CardError::render("QR code could not be rasterized"))
}
