//! Serialization of the composed surface to encoded image bytes.

use std::io::Cursor;
use std::path::Path;

use anyhow::Context as _;

use crate::{
    error::{FrameError, FrameResult},
    render::{ComposedSurface, RenderedFrame},
};

/// Fixed quality for the lossy export path.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg { quality: u8 },
    Png,
}

impl ExportFormat {
    pub fn jpeg() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Encode the surface, refusing explicitly when there is nothing to
/// export.
///
/// Callers are expected to disable export affordances before a photo has
/// composed; this check is the backstop that prevents a corrupt
/// zero-byte file.
pub fn encode_surface(surface: &ComposedSurface, format: ExportFormat) -> FrameResult<Vec<u8>> {
    if surface.is_empty() {
        return Err(FrameError::encode(
            "surface has zero area; compose a photo before exporting",
        ));
    }
    encode_frame(&surface.to_rgba8()?, format)
}

pub fn encode_frame(frame: &RenderedFrame, format: ExportFormat) -> FrameResult<Vec<u8>> {
    if frame.width == 0 || frame.height == 0 {
        return Err(FrameError::encode("frame has zero area"));
    }

    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
                .ok_or_else(|| FrameError::encode("frame byte length mismatch"))?;
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
                .context("encode png")?;
        }
        ExportFormat::Jpeg { quality } => {
            // The frame is fully opaque by construction; drop alpha.
            let rgb: Vec<u8> = frame
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            let img = image::RgbImage::from_raw(frame.width, frame.height, rgb)
                .ok_or_else(|| FrameError::encode("frame byte length mismatch"))?;
            let mut cursor = Cursor::new(&mut out);
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
            encoder.encode_image(&img).context("encode jpeg")?;
        }
    }
    Ok(out)
}

/// `IMG_1234.jpg` -> `IMG_1234-framed.jpg`.
pub fn framed_file_name(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original);
    format!("{stem}-framed.jpg")
}

/// Timestamped name for the lossless export variant.
pub fn lossless_file_name(prefix: &str, timestamp: u64) -> String {
    format!("{prefix}-{timestamp}.png")
}
