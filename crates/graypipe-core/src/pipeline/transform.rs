//! Pure raster transforms used by the resize and grayscale stages.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma, Rgba};

use crate::config::TransformConfig;

/// Resizes images to fixed dimensions, ignoring aspect ratio.
#[derive(Debug, Clone)]
pub struct Resizer {
    width: u32,
    height: u32,
    filter: FilterType,
}

impl Resizer {
    /// Create a resizer from the transform settings.
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            filter: config.filter.into(),
        }
    }

    /// Resample `image` to exactly the configured width and height.
    pub fn resize(&self, image: &DynamicImage) -> DynamicImage {
        image.resize_exact(self.width, self.height, self.filter)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new(&TransformConfig::default())
    }
}

/// Convert to 8-bit luminance, one output pixel per input pixel.
///
/// Uses the ITU-R BT.601 weights in 16-bit fixed point
/// (`(19595 R + 38470 G + 7471 B + 2^15) >> 24` over 16-bit samples), with
/// color premultiplied by alpha.
pub fn grayscale(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let gray = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        Luma([luma_601(*rgba.get_pixel(x, y))])
    });
    DynamicImage::ImageLuma8(gray)
}

fn luma_601(pixel: Rgba<u8>) -> u8 {
    let [r, g, b, a] = pixel.0.map(|c| u32::from(c) * 0x101);
    let premultiply = |c: u32| c * a / 0xffff;
    let y = (19595 * premultiply(r) + 38470 * premultiply(g) + 7471 * premultiply(b) + (1 << 15))
        >> 24;
    y as u8
}
