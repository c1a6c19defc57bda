//! The composed pixel surface and the CPU draw pass that rewrites it.
//!
//! Every recomposition renders the complete scene into a fresh
//! `vello_cpu` context and commits it to the surface's pixmap in one
//! step; nothing ever patches pixels in place.

use std::sync::Arc;

use crate::{
    assets::PreparedImage,
    color::Rgb,
    error::{FrameError, FrameResult},
};

/// The mutable pixel buffer the compositor owns exclusively.
///
/// Zero-sized until the first photo composes; rewritten in full on every
/// committed state.
#[derive(Default)]
pub struct ComposedSurface {
    width: u32,
    height: u32,
    pixmap: Option<vello_cpu::Pixmap>,
}

/// Readback of the surface in straight (non-premultiplied) RGBA8.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ComposedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True while no photo has composed (zero pixel area).
    pub fn is_empty(&self) -> bool {
        self.pixmap.is_none() || self.width == 0 || self.height == 0
    }

    /// Resize to exactly the given dimensions, discarding all content.
    pub(crate) fn resize_exact(&mut self, width: u32, height: u32) -> FrameResult<()> {
        let w: u16 = width
            .try_into()
            .map_err(|_| FrameError::validation("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| FrameError::validation("surface height exceeds u16"))?;
        self.width = width;
        self.height = height;
        self.pixmap = Some(vello_cpu::Pixmap::new(w, h));
        Ok(())
    }

    /// Drop back to the empty zero-area state.
    pub(crate) fn clear_to_empty(&mut self) {
        self.width = 0;
        self.height = 0;
        self.pixmap = None;
    }

    /// Premultiplied RGBA of one pixel, for spot checks.
    pub fn pixel_rgba8(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let pixmap = self.pixmap.as_ref()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        let data = pixmap.data_as_u8_slice();
        Some([data[at], data[at + 1], data[at + 2], data[at + 3]])
    }

    /// Copy out the whole surface as straight RGBA8.
    pub fn to_rgba8(&self) -> FrameResult<RenderedFrame> {
        let pixmap = self
            .pixmap
            .as_ref()
            .ok_or_else(|| FrameError::validation("surface has no pixels"))?;
        let mut data = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut data);
        Ok(RenderedFrame {
            width: self.width,
            height: self.height,
            data,
        })
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in 0..3 {
            px[c] = ((px[c] as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// One full-scene draw pass; committed to a surface with [`finish`].
///
/// [`finish`]: SurfacePainter::finish
pub(crate) struct SurfacePainter {
    ctx: vello_cpu::RenderContext,
    width: u32,
    height: u32,
}

impl SurfacePainter {
    pub(crate) fn new(width: u32, height: u32) -> FrameResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| FrameError::validation("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| FrameError::validation("surface height exceeds u16"))?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            width,
            height,
        })
    }

    /// Flood the whole canvas with an opaque color.
    pub(crate) fn fill_all(&mut self, color: Rgb) {
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, 255,
        ));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
    }

    /// Draw an image with its top-left corner at `(x, y)`, scaled to
    /// `target_w` x `target_h` pixels.
    pub(crate) fn draw_image(
        &mut self,
        image: &PreparedImage,
        x: f64,
        y: f64,
        target_w: f64,
        target_h: f64,
    ) -> FrameResult<()> {
        let paint = image_paint(image)?;
        let sx = target_w / f64::from(image.width);
        let sy = target_h / f64::from(image.height);

        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(
            vello_cpu::kurbo::Affine::translate((x, y))
                * vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy),
        );
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        Ok(())
    }

    /// Draw a shaped text layout with its top-left corner at `(x, y)`.
    pub(crate) fn draw_layout(
        &mut self,
        layout: &parley::Layout<TextBrushRgba8>,
        font: &vello_cpu::peniko::FontData,
        x: f64,
        y: f64,
    ) {
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((x, y)));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    /// Commit the pass: rasterize everything into the surface's pixmap.
    pub(crate) fn finish(mut self, surface: &mut ComposedSurface) -> FrameResult<()> {
        surface.resize_exact(self.width, self.height)?;
        let pixmap = surface
            .pixmap
            .as_mut()
            .ok_or_else(|| FrameError::validation("surface pixmap missing after resize"))?;
        self.ctx.flush();
        self.ctx.render_to_pixmap(pixmap);
        Ok(())
    }
}

fn image_paint(image: &PreparedImage) -> FrameResult<vello_cpu::Image> {
    let w: u16 = image
        .width
        .try_into()
        .map_err(|_| FrameError::validation("image width exceeds u16"))?;
    let h: u16 = image
        .height
        .try_into()
        .map_err(|_| FrameError::validation("image height exceeds u16"))?;
    if image.rgba8_premul.len() != image.width as usize * image.height as usize * 4 {
        return Err(FrameError::decode("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(image.width as usize * image.height as usize);
    for px in image.rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgb> for TextBrushRgba8 {
    fn from(c: Rgb) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: 255,
        }
    }
}

/// Shaped single-line text plus the measurements layout needs.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) width: f64,
    /// Baseline offset from the top of the layout.
    pub(crate) baseline: f64,
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape one line of text with the given font bytes, size, and brush.
    pub(crate) fn shape_line(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> FrameResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(FrameError::validation("text size_px must be finite and > 0"));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| FrameError::validation("no font families registered from font bytes"))?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| FrameError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        let width = f64::from(layout.width());
        let baseline = layout
            .lines()
            .next()
            .map(|line| f64::from(line.metrics().baseline))
            .unwrap_or(0.0);

        Ok(ShapedText {
            layout,
            width,
            baseline,
        })
    }
}
