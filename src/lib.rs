#![forbid(unsafe_code)]

pub mod assets;
pub mod color;
pub mod compositor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod logo;
pub mod metadata;
pub mod model;
pub mod render;
pub mod store;

pub use assets::{AssetSource, FsAssetSource, LogoCache, PreparedImage, Typeface};
pub use compositor::{
    Applied, AssetLoader, Compositor, LoadKind, LoadRequest, Phase, PhotoPayload, RunToken, drive,
};
pub use error::{FrameError, FrameResult};
pub use export::{DEFAULT_JPEG_QUALITY, ExportFormat};
pub use geometry::FrameGeometry;
pub use metadata::ExifSummary;
pub use model::{FrameSettings, Preset, SideWidths, builtin_presets};
pub use render::{ComposedSurface, RenderedFrame};
pub use store::{ConfigStore, ImageSlot, StoredPhoto};
