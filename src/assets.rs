use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::error::FrameResult;

pub mod decode;

/// Immutable decoded raster in premultiplied RGBA8 form.
///
/// The compositor references prepared images; it never mutates them.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Build from straight (non-premultiplied) RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> FrameResult<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(crate::error::FrameError::decode(format!(
                "pixel buffer length {} does not match {}x{}",
                rgba.len(),
                width,
                height
            )));
        }
        decode::premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Raw font bytes handed to the text layout engine.
#[derive(Clone, Debug)]
pub struct Typeface {
    pub bytes: Arc<Vec<u8>>,
}

impl Typeface {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }
}

/// Session cache of decoded logo rasters, keyed by resolved asset path.
#[derive(Debug, Default)]
pub struct LogoCache {
    entries: HashMap<String, PreparedImage>,
}

impl LogoCache {
    pub fn get(&self, path: &str) -> Option<&PreparedImage> {
        self.entries.get(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, image: PreparedImage) {
        self.entries.insert(path.into(), image);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of raw asset bytes for resolver paths like
/// `/logos/fujifilm/x100vi_black.png`.
pub trait AssetSource {
    fn load(&mut self, path: &str) -> FrameResult<Vec<u8>>;
}

/// Serves resolver paths from a directory tree on disk, so
/// `/logos/...` maps to `<root>/logos/...`.
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let rel = path.trim_start_matches('/');
        self.root.join(Path::new(rel))
    }
}

impl AssetSource for FsAssetSource {
    fn load(&mut self, path: &str) -> FrameResult<Vec<u8>> {
        let full = self.resolve(path);
        let bytes = std::fs::read(&full)
            .with_context(|| format!("read asset '{}'", full.display()))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba8_premultiplies() {
        let img = PreparedImage::from_rgba8(1, 1, vec![100, 50, 200, 128]).unwrap();
        assert_eq!(
            img.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn from_rgba8_rejects_length_mismatch() {
        assert!(PreparedImage::from_rgba8(2, 2, vec![0; 4]).is_err());
    }

    #[test]
    fn logo_cache_is_keyed_by_path() {
        let mut cache = LogoCache::default();
        assert!(cache.get("/logos/sony/sony_black.png").is_none());

        let img = PreparedImage::from_rgba8(1, 1, vec![255; 4]).unwrap();
        cache.insert("/logos/sony/sony_black.png", img);
        assert!(cache.get("/logos/sony/sony_black.png").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fs_source_strips_leading_slash() {
        let src = FsAssetSource::new("/tmp/assets");
        assert_eq!(
            src.resolve("/logos/a/b.png"),
            PathBuf::from("/tmp/assets/logos/a/b.png")
        );
    }
}
