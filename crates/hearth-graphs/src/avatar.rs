//! Circular avatars composited onto charts.

use hearth_common::{HearthError, Result};
use image::imageops::FilterType;
use image::{Rgb, RgbImage, RgbaImage};
use plotters::style::RGBColor;

/// A square avatar with everything outside its inscribed circle transparent.
#[derive(Debug, Clone)]
pub struct Avatar {
    image: RgbaImage,
    average: RGBColor,
}

impl Avatar {
    /// Decode image bytes and cut a `size` x `size` circle.
    pub fn decode(bytes: &[u8], size: u32) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| HearthError::graph_with_source("Could not decode avatar", e))?
            .to_rgba8();
        Ok(Self::from_image(&decoded, size))
    }

    /// Resize `image` and cut a circle out of it.
    pub fn from_image(image: &RgbaImage, size: u32) -> Self {
        let size = size.max(1);
        let mut image = image::imageops::resize(image, size, size, FilterType::Lanczos3);
        let average = average_color(&image);

        let radius = f64::from(size) / 2.0;
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let dx = f64::from(x) + 0.5 - radius;
            let dy = f64::from(y) + 0.5 - radius;
            if dx * dx + dy * dy > radius * radius {
                pixel.0[3] = 0;
            }
        }
        Self { image, average }
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Mean colour of the opaque pixels, used to tint bars.
    pub fn average_color(&self) -> RGBColor {
        self.average
    }

    /// Alpha-blend onto `canvas` centred at `center`; parts off the canvas are clipped.
    pub fn paste_centered(&self, canvas: &mut RgbImage, center: (i32, i32)) {
        let half = (self.size() / 2) as i32;
        for (x, y, pixel) in self.image.enumerate_pixels() {
            let alpha = u32::from(pixel.0[3]);
            if alpha == 0 {
                continue;
            }
            let (cx, cy) = (center.0 - half + x as i32, center.1 - half + y as i32);
            let (Ok(cx), Ok(cy)) = (u32::try_from(cx), u32::try_from(cy)) else {
                continue;
            };
            if cx >= canvas.width() || cy >= canvas.height() {
                continue;
            }
            let below = canvas.get_pixel(cx, cy).0;
            let blend = |src: u8, dst: u8| ((u32::from(src) * alpha + u32::from(dst) * (255 - alpha)) / 255) as u8;
            canvas.put_pixel(
                cx,
                cy,
                Rgb([
                    blend(pixel.0[0], below[0]),
                    blend(pixel.0[1], below[1]),
                    blend(pixel.0[2], below[2]),
                ]),
            );
        }
    }
}

fn average_color(image: &RgbaImage) -> RGBColor {
    let (mut sum, mut count) = ([0u64; 3], 0u64);
    for pixel in image.pixels().filter(|p| p.0[3] > 0) {
        for (total, channel) in sum.iter_mut().zip(pixel.0) {
            *total += u64::from(channel);
        }
        count += 1;
    }
    if count == 0 {
        return crate::canvas::FALLBACK_BAR;
    }
    RGBColor((sum[0] / count) as u8, (sum[1] / count) as u8, (sum[2] / count) as u8)
}

/// Download and decode an avatar.
pub async fn fetch_avatar(client: &reqwest::Client, url: &str, size: u32) -> Result<Avatar> {
    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| HearthError::network_with_source("Avatar request failed", e))?
        .bytes()
        .await
        .map_err(|e| HearthError::network_with_source("Avatar download failed", e))?;
    Avatar::decode(&bytes, size)
}
