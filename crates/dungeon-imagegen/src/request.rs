//! Request parameters and the decoded result raster.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::ImageGenError;

/// Aspect ratio requested from the workflow's `Ratio` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageRatio {
    Square,
    Landscape,
    Portrait,
}

impl ImageRatio {
    /// The string the workflow node expects.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageRatio::Square => "SQUARE",
            ImageRatio::Landscape => "LANDSCAPE",
            ImageRatio::Portrait => "PORTRAIT",
        }
    }
}

/// Everything needed to generate one image.
///
/// Zero or empty fields leave the corresponding workflow default untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Workflow file name inside the configured workflow folder.
    pub workflow_name: String,
    pub prompt: String,
    pub seed: u64,
    pub steps: u32,
    /// Base edge length in pixels.
    pub size: u32,
    pub ratio: ImageRatio,
}

impl Default for ImageRequest {
    fn default() -> Self {
        Self {
            workflow_name: "default_api.json".to_owned(),
            prompt: "A beautiful space station in the sky, seen from the ground".to_owned(),
            seed: 42,
            steps: 20,
            size: 512,
            ratio: ImageRatio::Portrait,
        }
    }
}

/// A decoded RGBA raster.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pixels: RgbaImage,
}

impl GeneratedImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// An opaque white image.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }

    /// Decode any format the `image` crate was built with (PNG here).
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageGenError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::new(decoded.into_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// RGBA of one pixel, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Mean colour of the `cols × rows` block grid cell `(cx, cy)`.
    ///
    /// Used to draw a coarse mosaic of the image with plain rectangles.
    pub fn block_average(&self, cx: u32, cy: u32, cols: u32, rows: u32) -> [u8; 4] {
        let (w, h) = (self.width(), self.height());
        if cols == 0 || rows == 0 || w == 0 || h == 0 {
            return [0, 0, 0, 0];
        }
        let x0 = (cx * w) / cols;
        let x1 = (((cx + 1) * w) / cols).max(x0 + 1).min(w);
        let y0 = (cy * h) / rows;
        let y1 = (((cy + 1) * h) / rows).max(y0 + 1).min(h);

        let mut sum = [0u64; 4];
        let mut count = 0u64;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = self.pixels.get_pixel(x, y).0;
                for (acc, channel) in sum.iter_mut().zip(p) {
                    *acc += u64::from(channel);
                }
                count += 1;
            }
        }
        if count == 0 {
            return [0, 0, 0, 0];
        }
        sum.map(|s| (s / count) as u8)
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
