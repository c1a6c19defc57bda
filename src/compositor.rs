//! The compositing engine: frame geometry, layered full-surface redraws,
//! and the staleness-tagged load state machine.
//!
//! The engine is sans-IO. It never decodes bytes itself; it emits
//! [`LoadRequest`]s for the host to fulfil and consumes the completions.
//! Every completion carries the token of the request that started it, and
//! completions whose token no longer matches the current input generation
//! are discarded without touching the surface. That discard rule is the
//! engine's substitute for cancellation: a superseded decode can finish
//! late, but it can never overwrite a newer composition.

use tracing::{debug, warn};

use crate::{
    assets::{LogoCache, PreparedImage, Typeface},
    color,
    error::{FrameError, FrameResult},
    geometry::FrameGeometry,
    logo,
    metadata::ExifSummary,
    model::FrameSettings,
    render::{ComposedSurface, RenderedFrame, ShapedText, SurfacePainter, TextLayoutEngine},
};

/// The caption drawn to the left of the brand logo.
const SHOT_ON_CAPTION: &str = "Shot on";

/// Identity tag for one asynchronous load, minted per input generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunToken(pub(crate) u64);

/// Externally observable engine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PhotoLoading,
    PhotoReady,
    LogoLoading,
    Rendered,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadKind {
    /// Decode the photo identified by an opaque source string.
    Photo { source: String },
    /// Decode the logo asset at a resolver path.
    Logo { path: String },
}

/// An asynchronous decode the host must perform for the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub token: RunToken,
    pub kind: LoadKind,
}

/// A decoded photo together with the metadata extracted from its bytes.
#[derive(Clone, Debug)]
pub struct PhotoPayload {
    pub image: PreparedImage,
    pub exif: ExifSummary,
}

/// Outcome of feeding a completion to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The completion matched the current generation and was consumed.
    Progressed,
    /// The completion was superseded and discarded untouched.
    Stale,
}

pub struct Compositor {
    settings: FrameSettings,
    typeface: Option<Typeface>,
    surface: ComposedSurface,
    logos: LogoCache,
    text_engine: TextLayoutEngine,
    photo: Option<PreparedImage>,
    exif: ExifSummary,
    geometry: Option<FrameGeometry>,
    phase: Phase,
    generation: u64,
    pending: Option<LoadRequest>,
}

impl Compositor {
    pub fn new(settings: FrameSettings) -> FrameResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            typeface: None,
            surface: ComposedSurface::new(),
            logos: LogoCache::default(),
            text_engine: TextLayoutEngine::new(),
            photo: None,
            exif: ExifSummary::default(),
            geometry: None,
            phase: Phase::Idle,
            generation: 0,
            pending: None,
        })
    }

    /// Provide font bytes for caption/EXIF text. Without a typeface the
    /// text rows are skipped and composition still completes.
    pub fn set_typeface(&mut self, typeface: Typeface) {
        self.typeface = Some(typeface);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn surface(&self) -> &ComposedSurface {
        &self.surface
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    pub fn exif(&self) -> &ExifSummary {
        &self.exif
    }

    pub fn geometry(&self) -> Option<FrameGeometry> {
        self.geometry
    }

    /// The decode the host still owes the engine, if any.
    pub fn pending_request(&self) -> Option<&LoadRequest> {
        self.pending.as_ref()
    }

    /// Begin composing a new photo. Supersedes any in-flight load.
    pub fn request_photo(&mut self, source: impl Into<String>) -> LoadRequest {
        self.generation += 1;
        self.phase = Phase::PhotoLoading;
        let request = LoadRequest {
            token: RunToken(self.generation),
            kind: LoadKind::Photo {
                source: source.into(),
            },
        };
        self.pending = Some(request.clone());
        request
    }

    /// Replace the settings and recompose the current photo, if any.
    ///
    /// Supersedes in-flight loads; a photo decode that was running against
    /// the old settings must be re-requested by the host.
    pub fn update_settings(
        &mut self,
        settings: FrameSettings,
    ) -> FrameResult<Option<LoadRequest>> {
        settings.validate()?;
        self.settings = settings;
        self.generation += 1;
        self.pending = None;
        if self.photo.is_some() {
            self.recompose()
        } else {
            self.phase = Phase::Idle;
            Ok(None)
        }
    }

    /// Feed the result of a photo decode back into the engine.
    pub fn complete_photo(
        &mut self,
        token: RunToken,
        result: FrameResult<PhotoPayload>,
    ) -> FrameResult<Applied> {
        let expected = matches!(
            &self.pending,
            Some(LoadRequest { token: t, kind: LoadKind::Photo { .. } }) if *t == token
        );
        if !expected {
            debug!(token = token.0, "discarding stale photo completion");
            return Ok(Applied::Stale);
        }
        self.pending = None;

        match result {
            Err(err) => {
                warn!(error = %err, "photo decode failed; surface degraded to empty");
                self.photo = None;
                self.exif = ExifSummary::default();
                self.geometry = None;
                self.surface.clear_to_empty();
                self.phase = Phase::Idle;
                Ok(Applied::Progressed)
            }
            Ok(payload) => {
                self.photo = Some(payload.image);
                self.exif = payload.exif;
                self.recompose()?;
                Ok(Applied::Progressed)
            }
        }
    }

    /// Feed the result of a logo decode back into the engine.
    pub fn complete_logo(
        &mut self,
        token: RunToken,
        result: FrameResult<PreparedImage>,
    ) -> FrameResult<Applied> {
        let expected = matches!(
            &self.pending,
            Some(LoadRequest { token: t, kind: LoadKind::Logo { .. } }) if *t == token
        );
        if !expected {
            debug!(token = token.0, "discarding stale logo completion");
            return Ok(Applied::Stale);
        }
        let Some(LoadRequest {
            kind: LoadKind::Logo { path },
            ..
        }) = self.pending.take()
        else {
            return Ok(Applied::Stale);
        };

        match result {
            Err(err) => {
                warn!(error = %err, path = %path, "logo decode failed; keeping base composition");
                self.phase = Phase::Rendered;
                Ok(Applied::Progressed)
            }
            Ok(logo_img) => {
                self.logos.insert(path, logo_img.clone());
                let photo = self
                    .photo
                    .clone()
                    .ok_or_else(|| FrameError::validation("logo completed without a photo"))?;
                let geometry = self
                    .geometry
                    .ok_or_else(|| FrameError::validation("logo completed without geometry"))?;
                self.render_pass(&photo, geometry, Some(&logo_img))?;
                self.phase = Phase::Rendered;
                Ok(Applied::Progressed)
            }
        }
    }

    /// The finished composition, legal only in [`Phase::Rendered`].
    pub fn rendered_frame(&self) -> FrameResult<RenderedFrame> {
        if self.phase != Phase::Rendered {
            return Err(FrameError::validation(
                "composition has not rendered for the current inputs",
            ));
        }
        self.surface.to_rgba8()
    }

    /// Recompute geometry and redraw from the cached photo.
    #[tracing::instrument(skip(self))]
    fn recompose(&mut self) -> FrameResult<Option<LoadRequest>> {
        let Some(photo) = self.photo.clone() else {
            return Ok(None);
        };

        let geometry = FrameGeometry::compute(photo.width, photo.height, &self.settings);
        self.geometry = Some(geometry);

        self.render_pass(&photo, geometry, None)?;
        self.phase = Phase::PhotoReady;

        if !self.settings.text_enabled {
            self.phase = Phase::Rendered;
            return Ok(None);
        }

        let dark = color::is_dark(self.settings.frame_rgb()?);
        let Some(path) =
            logo::resolve_logo_path(self.exif.make.as_deref(), self.exif.model.as_deref(), dark)
        else {
            // No placeholder is drawn for unknown brands.
            self.phase = Phase::Rendered;
            return Ok(None);
        };

        if let Some(logo_img) = self.logos.get(&path).cloned() {
            self.render_pass(&photo, geometry, Some(&logo_img))?;
            self.phase = Phase::Rendered;
            return Ok(None);
        }

        self.phase = Phase::LogoLoading;
        let request = LoadRequest {
            token: RunToken(self.generation),
            kind: LoadKind::Logo { path },
        };
        self.pending = Some(request.clone());
        Ok(Some(request))
    }

    /// One full redraw: background fill, photo, then the optional overlay.
    fn render_pass(
        &mut self,
        photo: &PreparedImage,
        geometry: FrameGeometry,
        logo_img: Option<&PreparedImage>,
    ) -> FrameResult<()> {
        let frame_rgb = self.settings.frame_rgb()?;
        let mut painter = SurfacePainter::new(geometry.canvas_w, geometry.canvas_h)?;
        painter.fill_all(frame_rgb);
        painter.draw_image(
            photo,
            f64::from(geometry.left_px),
            f64::from(geometry.top_px),
            f64::from(photo.width),
            f64::from(photo.height),
        )?;

        if let Some(logo_img) = logo_img {
            let text_rgb = self.settings.effective_text_rgb()?;
            let logo_h = logo_height(geometry.bottom_px);

            let shot_on = if self.settings.show_shot_on_text {
                self.shape_caption(SHOT_ON_CAPTION, (logo_h * 1.3) as f32, text_rgb)
            } else {
                None
            };
            let exif_shaped = if self.settings.show_exif_data {
                self.exif.summary_line().and_then(|line| {
                    self.shape_caption(&line, (logo_h * 0.8) as f32, text_rgb)
                })
            } else {
                None
            };

            let plan = plan_overlay(&OverlayInputs {
                canvas_w: geometry.canvas_w,
                canvas_h: geometry.canvas_h,
                bottom_px: geometry.bottom_px,
                logo_aspect: logo_img.aspect(),
                shot_on: shot_on.as_ref().map(|s| TextMetrics {
                    width: s.width,
                    baseline: s.baseline,
                }),
                exif_width: exif_shaped.as_ref().map(|s| s.width),
            });

            painter.draw_image(logo_img, plan.logo_x, plan.logo_y, plan.logo_w, plan.logo_h)?;

            if let Some(typeface) = &self.typeface {
                let font = vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(typeface.bytes.as_ref().clone()),
                    0,
                );
                if let (Some(shaped), Some((x, y))) = (&shot_on, plan.shot_on_pos) {
                    painter.draw_layout(&shaped.layout, &font, x, y);
                }
                if let (Some(shaped), Some((x, y))) = (&exif_shaped, plan.exif_pos) {
                    painter.draw_layout(&shaped.layout, &font, x, y);
                }
            }
        }

        painter.finish(&mut self.surface)
    }

    /// Shape one caption line; `None` (with a log) when no usable font is
    /// available, so composition degrades instead of failing.
    fn shape_caption(&mut self, text: &str, size_px: f32, rgb: color::Rgb) -> Option<ShapedText> {
        let typeface = self.typeface.as_ref()?;
        match self
            .text_engine
            .shape_line(text, &typeface.bytes, size_px, rgb.into())
        {
            Ok(shaped) => Some(shaped),
            Err(err) => {
                warn!(error = %err, "text shaping failed; skipping caption row");
                None
            }
        }
    }
}

/// Logo row height inside the bottom border.
fn logo_height(bottom_px: u32) -> f64 {
    f64::from(bottom_px) * 0.22
}

/// Measured dimensions of a shaped caption.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TextMetrics {
    pub(crate) width: f64,
    /// Baseline offset from the top of the layout.
    pub(crate) baseline: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct OverlayInputs {
    pub(crate) canvas_w: u32,
    pub(crate) canvas_h: u32,
    pub(crate) bottom_px: u32,
    pub(crate) logo_aspect: f64,
    pub(crate) shot_on: Option<TextMetrics>,
    pub(crate) exif_width: Option<f64>,
}

/// Absolute placement of everything inside the bottom border.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct OverlayPlan {
    pub(crate) logo_x: f64,
    pub(crate) logo_y: f64,
    pub(crate) logo_w: f64,
    pub(crate) logo_h: f64,
    /// Layout origin for the caption; baseline sits on the logo bottom.
    pub(crate) shot_on_pos: Option<(f64, f64)>,
    /// Layout origin for the EXIF line, top-aligned below the group.
    pub(crate) exif_pos: Option<(f64, f64)>,
}

/// Pure layout arithmetic for the bottom-border overlay.
///
/// The caption+logo group is centered as a unit in the canvas width; the
/// EXIF line is centered independently below it. All content stays inside
/// the already-computed bottom border; nothing inflates the canvas.
pub(crate) fn plan_overlay(inputs: &OverlayInputs) -> OverlayPlan {
    let logo_h = logo_height(inputs.bottom_px);
    let logo_w = logo_h * inputs.logo_aspect;
    let gap = logo_h * 0.4;

    let text_block_w = inputs.shot_on.map(|m| m.width + gap).unwrap_or(0.0);
    let group_w = text_block_w + logo_w;
    let group_x = (f64::from(inputs.canvas_w) - group_w) / 2.0;
    let group_top =
        f64::from(inputs.canvas_h - inputs.bottom_px) + f64::from(inputs.bottom_px) * 0.15;
    let logo_bottom = group_top + logo_h;

    let shot_on_pos = inputs
        .shot_on
        .map(|m| (group_x, logo_bottom - m.baseline));
    let exif_pos = inputs.exif_width.map(|w| {
        (
            (f64::from(inputs.canvas_w) - w) / 2.0,
            logo_bottom + logo_h * 0.3,
        )
    });

    OverlayPlan {
        logo_x: group_x + text_block_w,
        logo_y: group_top,
        logo_w,
        logo_h,
        shot_on_pos,
        exif_pos,
    }
}

/// Host-side decode collaborator for the synchronous driver.
pub trait AssetLoader {
    fn load_photo(&mut self, source: &str) -> FrameResult<PhotoPayload>;
    fn load_logo(&mut self, path: &str) -> FrameResult<PreparedImage>;
}

/// Run the engine to quiescence by fulfilling its load requests inline.
pub fn drive(comp: &mut Compositor, loader: &mut dyn AssetLoader) -> FrameResult<()> {
    while let Some(request) = comp.pending_request().cloned() {
        match request.kind {
            LoadKind::Photo { source } => {
                let result = loader.load_photo(&source);
                comp.complete_photo(request.token, result)?;
            }
            LoadKind::Logo { path } => {
                let result = loader.load_logo(&path);
                comp.complete_logo(request.token, result)?;
            }
        }
    }
    Ok(())
}
