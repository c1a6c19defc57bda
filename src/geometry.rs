use crate::model::FrameSettings;

/// Absolute border thicknesses and resulting canvas size for one photo.
///
/// All percentages are taken of the average of the photo's two dimensions,
/// so a given setting produces a visually similar frame across portrait and
/// landscape images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub top_px: u32,
    pub right_px: u32,
    pub bottom_px: u32,
    pub left_px: u32,
    pub canvas_w: u32,
    pub canvas_h: u32,
}

impl FrameGeometry {
    /// Compute border thicknesses from percentage settings.
    ///
    /// When per-side widths are present they take precedence over the
    /// uniform width for every side; the two representations are never
    /// mixed per-side.
    pub fn compute(image_w: u32, image_h: u32, settings: &FrameSettings) -> Self {
        let avg = (f64::from(image_w) + f64::from(image_h)) / 2.0;
        let side = |pct: f64| (avg * pct / 100.0).round() as u32;

        let (top_px, right_px, bottom_px, left_px) = match &settings.frame_widths {
            Some(w) => (side(w.top), side(w.right), side(w.bottom), side(w.left)),
            None => {
                let s = side(settings.frame_width);
                (s, s, s, s)
            }
        };

        Self {
            top_px,
            right_px,
            bottom_px,
            left_px,
            canvas_w: image_w + left_px + right_px,
            canvas_h: image_h + top_px + bottom_px,
        }
    }
}
