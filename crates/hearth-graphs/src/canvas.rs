//! In-memory bitmap drawing and PNG encoding.

use hearth_common::{HearthError, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::avatar::Avatar;

/// Dark background used by every chart.
pub const BACKGROUND: RGBColor = RGBColor(0x2C, 0x2F, 0x33);

/// Fallback bar colour when no avatar colour is known.
pub const FALLBACK_BAR: RGBColor = RGBColor(0, 255, 255);

/// An avatar to composite over the finished chart, centred on a pixel.
pub struct Overlay<'a> {
    /// Image to paste.
    pub avatar: &'a Avatar,
    /// Centre in chart pixels.
    pub center: (i32, i32),
}

/// Draw with `draw` on a `width` x `height` bitmap, paste the returned
/// overlays and encode the result as PNG.
pub fn render_png<'a, F>(width: u32, height: u32, draw: F) -> Result<Vec<u8>>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<Vec<Overlay<'a>>>,
{
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    let overlays = {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        let overlays = draw(&root)?;
        root.present()?;
        overlays
    };

    let mut image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| HearthError::graph("Chart buffer does not match its size"))?;
    for overlay in overlays {
        overlay.avatar.paste_centered(&mut image, overlay.center);
    }
    encode_png(&image)
}

/// PNG bytes of an RGB image.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
        .map_err(|e| HearthError::graph_with_source("Failed to encode PNG", e))?;
    Ok(bytes)
}

/// Linear blend from `from` to `to`; `t` is clamped to `0..=1`.
pub fn lerp_color(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_png_without_text() {
        let png = render_png(40, 30, |root| {
            root.fill(&BACKGROUND)?;
            root.draw(&Rectangle::new([(5, 5), (20, 20)], RED.filled()))?;
            Ok(Vec::new())
        })
        .unwrap();

        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
        assert_eq!(decoded.get_pixel(10, 10).0, [255, 0, 0]);
        assert_eq!(decoded.get_pixel(30, 25).0, [0x2C, 0x2F, 0x33]);
    }

    #[test]
    fn test_lerp_color() {
        assert_eq!(lerp_color(BLUE, RED, 0.0), BLUE);
        assert_eq!(lerp_color(BLUE, RED, 1.0), RED);
        assert_eq!(lerp_color(BLUE, RED, 0.5), RGBColor(128, 0, 128));
        assert_eq!(lerp_color(BLUE, RED, 7.0), RED);
    }
}
