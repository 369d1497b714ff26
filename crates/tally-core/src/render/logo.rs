//! # Receipt Logo
//!
//! Decodes the shop logo and prepares it for embedding in the PDF.
//!
//! Any PNG the `image` crate can read is accepted: greyscale, palette,
//! truecolour, with or without alpha, interlaced or not. Pixels are expanded
//! to 8-bit RGB and deflated for a `/FlateDecode` image XObject. When the
//! image is not fully opaque, its alpha channel becomes a separate
//! `/SMask` so transparent corners stay white on the page.
//!
//! ```text
//! PNG bytes ──► image::load_from_memory ──► RGBA8
//!                                             ├── RGB   ──► zlib ──► /Im1
//!                                             └── alpha ──► zlib ──► /SMask (if any < 255)
//! ```

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::ImageFormat;
use std::io::Write;
use thiserror::Error;

/// Why a logo could not be used.
#[derive(Debug, Error)]
pub enum LogoError {
    #[error("could not decode PNG: {0}")]
    Decode(#[from] image::ImageError),

    #[error("could not compress image data: {0}")]
    Compress(#[from] std::io::Error),
}

/// A decoded logo ready for the PDF writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl Logo {
    /// Decodes PNG bytes.
    pub fn from_png(bytes: &[u8]) -> Result<Logo, LogoError> {
        let pixels = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
        let (width, height) = pixels.dimensions();

        let pixel_count = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in pixels.pixels() {
            let [r, g, b, a] = pixel.0;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let opaque = alpha.iter().all(|a| *a == u8::MAX);

        Ok(Logo {
            width,
            height,
            rgb: deflate(&rgb)?,
            alpha: if opaque { None } else { Some(deflate(&alpha)?) },
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Deflated 8-bit RGB samples, row by row.
    pub fn rgb_data(&self) -> &[u8] {
        &self.rgb
    }

    /// Deflated 8-bit alpha samples, present only for translucent images.
    pub fn alpha_data(&self) -> Option<&[u8]> {
        self.alpha.as_deref()
    }

    /// Printed height for a given printed width, keeping the aspect ratio.
    pub fn height_for_width(&self, width: f32) -> f32 {
        width * self.height as f32 / self.width as f32
    }
}

fn deflate(raw: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    encoder.finish()
}

// =============================================================================
// Unit Tests
// =============================================================================
