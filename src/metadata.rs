//! EXIF extraction and the one-line capture summary.
//!
//! Extraction is per-field tolerant: any field may be absent or fail to
//! parse on its own, and a missing EXIF container yields an empty summary
//! rather than an error. Composition never blocks on metadata.

use std::io::Cursor;

use exif::{In, Tag, Value};

/// The capture metadata the bottom strip can display.
///
/// `None` means unknown; unknown fields are skipped when formatting,
/// never rendered as zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExifSummary {
    pub make: Option<String>,
    pub model: Option<String>,
    pub focal_length_mm: Option<f64>,
    pub iso: Option<u32>,
    pub shutter_speed_s: Option<f64>,
    pub aperture_f: Option<f64>,
}

impl ExifSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The single display line: present fields in capture order, joined
    /// by two spaces. `None` when nothing is known (nothing is drawn).
    pub fn summary_line(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(v) = self.focal_length_mm {
            parts.push(format!("{}mm", format_decimal(v)));
        }
        if let Some(v) = self.aperture_f {
            parts.push(format!("f/{}", format_decimal(v)));
        }
        if let Some(v) = self.shutter_speed_s {
            parts.push(format_shutter(v));
        }
        if let Some(v) = self.iso {
            parts.push(format!("ISO{v}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("  "))
        }
    }
}

/// Format with at most one decimal place, suppressing a trailing `.0`.
fn format_decimal(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    if (rounded - rounded.trunc()).abs() < f64::EPSILON {
        format!("{}", rounded.trunc() as i64)
    } else {
        format!("{rounded:.1}")
    }
}

/// Conventional photographic notation: `2s` but `1/250` (no trailing `s`
/// on the fractional form).
fn format_shutter(seconds: f64) -> String {
    if seconds >= 1.0 {
        format!("{}s", format_decimal(seconds))
    } else {
        format!("1/{}", (1.0 / seconds).round() as i64)
    }
}

/// Parse the EXIF container out of raw file bytes.
///
/// Returns an empty summary when there is no container or it fails to
/// parse; individual fields degrade independently.
pub fn read_summary(bytes: &[u8]) -> ExifSummary {
    let mut cursor = Cursor::new(bytes);
    let parsed = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!(error = %err, "no readable exif container");
            return ExifSummary::default();
        }
    };

    ExifSummary {
        make: ascii_field(&parsed, Tag::Make),
        model: ascii_field(&parsed, Tag::Model),
        focal_length_mm: positive_field(&parsed, Tag::FocalLength),
        iso: uint_field(&parsed, Tag::PhotographicSensitivity),
        shutter_speed_s: positive_field(&parsed, Tag::ExposureTime),
        aperture_f: positive_field(&parsed, Tag::FNumber),
    }
}

fn ascii_field(parsed: &exif::Exif, tag: Tag) -> Option<String> {
    let field = parsed.get_field(tag, In::PRIMARY)?;
    let text = field.display_value().to_string();
    let text = text.trim().trim_matches('"').trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn positive_field(parsed: &exif::Exif, tag: Tag) -> Option<f64> {
    let field = parsed.get_field(tag, In::PRIMARY)?;
    let v = match &field.value {
        Value::Rational(values) => values.first().map(|r| r.to_f64()),
        Value::SRational(values) => values.first().map(|r| r.to_f64()),
        Value::Float(values) => values.first().map(|&f| f64::from(f)),
        Value::Double(values) => values.first().copied(),
        _ => None,
    }?;
    (v.is_finite() && v > 0.0).then_some(v)
}

fn uint_field(parsed: &exif::Exif, tag: Tag) -> Option<u32> {
    let field = parsed.get_field(tag, In::PRIMARY)?;
    let v = match &field.value {
        Value::Byte(values) => values.first().map(|&v| u32::from(v)),
        Value::Short(values) => values.first().map(|&v| u32::from(v)),
        Value::Long(values) => values.first().copied(),
        _ => None,
    }?;
    (v > 0).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focal_length_suppresses_trailing_zero() {
        let s = ExifSummary {
            focal_length_mm: Some(35.0),
            ..ExifSummary::default()
        };
        assert_eq!(s.summary_line().unwrap(), "35mm");
    }

    #[test]
    fn focal_length_keeps_meaningful_decimal() {
        let s = ExifSummary {
            focal_length_mm: Some(23.5),
            ..ExifSummary::default()
        };
        assert_eq!(s.summary_line().unwrap(), "23.5mm");
    }

    #[test]
    fn aperture_formatting() {
        let s = ExifSummary {
            aperture_f: Some(2.8),
            ..ExifSummary::default()
        };
        assert_eq!(s.summary_line().unwrap(), "f/2.8");
    }

    #[test]
    fn fast_shutter_is_a_fraction_without_suffix() {
        assert_eq!(format_shutter(0.004), "1/250");
        assert_eq!(format_shutter(0.0005), "1/2000");
    }

    #[test]
    fn slow_shutter_keeps_seconds_suffix() {
        assert_eq!(format_shutter(2.0), "2s");
        assert_eq!(format_shutter(1.5), "1.5s");
    }

    #[test]
    fn line_joins_present_fields_with_two_spaces() {
        let s = ExifSummary {
            focal_length_mm: Some(35.0),
            iso: Some(200),
            shutter_speed_s: Some(0.004),
            aperture_f: Some(2.8),
            ..ExifSummary::default()
        };
        assert_eq!(s.summary_line().unwrap(), "35mm  f/2.8  1/250  ISO200");
    }

    #[test]
    fn absent_fields_are_skipped_not_zeroed() {
        let s = ExifSummary {
            iso: Some(640),
            ..ExifSummary::default()
        };
        assert_eq!(s.summary_line().unwrap(), "ISO640");
    }

    #[test]
    fn empty_summary_has_no_line() {
        assert_eq!(ExifSummary::default().summary_line(), None);
        assert!(ExifSummary::default().is_empty());
    }

    #[test]
    fn unreadable_bytes_yield_empty_summary() {
        let summary = read_summary(b"definitely not an image");
        assert!(summary.is_empty());
    }
}
