use crate::{
    color::{self, Rgb},
    error::{FrameError, FrameResult},
};

/// Independent per-side frame widths, each a percentage of the average
/// image dimension.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SideWidths {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// User-facing frame configuration.
///
/// `frame_widths`, when present, takes precedence over `frame_width` for
/// all geometry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Uniform border width as a percentage (0-100) of the average image
    /// dimension.
    pub frame_width: f64,
    /// Border fill color, `#rrggbb`.
    pub frame_color: String,
    /// Stored text color, `#rrggbb`; ignored when `contrast_aware_text`.
    pub text_color: String,
    /// Derive the text color from the frame color's luminance instead of
    /// using `text_color`.
    pub contrast_aware_text: bool,
    /// Master switch for the bottom info strip.
    pub text_enabled: bool,
    /// Draw the "Shot on" caption next to the logo.
    pub show_shot_on_text: bool,
    /// Draw the one-line EXIF summary under the logo group.
    pub show_exif_data: bool,
    /// Per-side overrides; `None` means uniform `frame_width`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_widths: Option<SideWidths>,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            frame_width: 5.0,
            frame_color: "#ffffff".to_string(),
            text_color: "#1a1a1a".to_string(),
            contrast_aware_text: true,
            text_enabled: false,
            show_shot_on_text: true,
            show_exif_data: true,
            frame_widths: None,
        }
    }
}

impl FrameSettings {
    pub fn validate(&self) -> FrameResult<()> {
        let check_pct = |name: &str, v: f64| {
            if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                return Err(FrameError::validation(format!(
                    "{name} must be a percentage in 0..=100, got {v}"
                )));
            }
            Ok(())
        };
        check_pct("frame_width", self.frame_width)?;
        if let Some(w) = &self.frame_widths {
            check_pct("frame_widths.top", w.top)?;
            check_pct("frame_widths.right", w.right)?;
            check_pct("frame_widths.bottom", w.bottom)?;
            check_pct("frame_widths.left", w.left)?;
        }
        Rgb::from_hex(&self.frame_color)?;
        Rgb::from_hex(&self.text_color)?;
        Ok(())
    }

    pub fn frame_rgb(&self) -> FrameResult<Rgb> {
        Rgb::from_hex(&self.frame_color)
    }

    /// The color text is actually drawn with: contrast-derived from the
    /// frame color, or the stored one.
    pub fn effective_text_rgb(&self) -> FrameResult<Rgb> {
        if self.contrast_aware_text {
            Ok(color::resolve_text_color(self.frame_rgb()?))
        } else {
            Rgb::from_hex(&self.text_color)
        }
    }
}

/// A named partial settings record.
///
/// Selecting a preset merges its fields over the canonical defaults —
/// never over the previously active settings — so any field a preset
/// omits reverts to its default value.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast_aware_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_shot_on_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_exif_data: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_widths: Option<SideWidths>,
}

impl Preset {
    /// Merge this preset over the default settings.
    pub fn apply(&self) -> FrameSettings {
        let mut s = FrameSettings::default();
        if let Some(v) = self.frame_width {
            s.frame_width = v;
        }
        if let Some(v) = &self.frame_color {
            s.frame_color = v.clone();
        }
        if let Some(v) = &self.text_color {
            s.text_color = v.clone();
        }
        if let Some(v) = self.contrast_aware_text {
            s.contrast_aware_text = v;
        }
        if let Some(v) = self.text_enabled {
            s.text_enabled = v;
        }
        if let Some(v) = self.show_shot_on_text {
            s.show_shot_on_text = v;
        }
        if let Some(v) = self.show_exif_data {
            s.show_exif_data = v;
        }
        if let Some(v) = self.frame_widths {
            s.frame_widths = Some(v);
        }
        s
    }
}

/// The presets the UI ships with.
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "classic-white".to_string(),
            frame_width: Some(5.0),
            frame_color: Some("#ffffff".to_string()),
            ..Preset::default()
        },
        Preset {
            name: "gallery-black".to_string(),
            frame_width: Some(8.0),
            frame_color: Some("#0d0d0d".to_string()),
            ..Preset::default()
        },
        Preset {
            name: "polaroid".to_string(),
            frame_color: Some("#fdfdf8".to_string()),
            frame_widths: Some(SideWidths {
                top: 4.0,
                right: 4.0,
                bottom: 14.0,
                left: 4.0,
            }),
            ..Preset::default()
        },
        Preset {
            name: "shot-on".to_string(),
            frame_color: Some("#000000".to_string()),
            text_enabled: Some(true),
            frame_widths: Some(SideWidths {
                top: 3.0,
                right: 3.0,
                bottom: 16.0,
                left: 3.0,
            }),
            ..Preset::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        FrameSettings::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_percentages_are_rejected() {
        let mut s = FrameSettings {
            frame_width: 101.0,
            ..FrameSettings::default()
        };
        assert!(s.validate().is_err());

        s.frame_width = 5.0;
        s.frame_widths = Some(SideWidths {
            top: -1.0,
            right: 2.0,
            bottom: 2.0,
            left: 2.0,
        });
        assert!(s.validate().is_err());
    }

    #[test]
    fn malformed_colors_are_rejected() {
        let s = FrameSettings {
            frame_color: "white".to_string(),
            ..FrameSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn preset_merge_starts_from_defaults() {
        // A user toggles text on, then selects a preset that says nothing
        // about text: the toggle must revert to the default, not persist.
        let preset = Preset {
            name: "plain".to_string(),
            frame_width: Some(12.0),
            ..Preset::default()
        };

        let merged = preset.apply();
        assert_eq!(merged.frame_width, 12.0);
        assert_eq!(merged.text_enabled, FrameSettings::default().text_enabled);
        assert_eq!(merged.frame_color, FrameSettings::default().frame_color);
    }

    #[test]
    fn preset_fields_override_defaults() {
        let preset = Preset {
            name: "dark".to_string(),
            frame_color: Some("#0d0d0d".to_string()),
            text_enabled: Some(true),
            ..Preset::default()
        };
        let merged = preset.apply();
        assert_eq!(merged.frame_color, "#0d0d0d");
        assert!(merged.text_enabled);
    }

    #[test]
    fn builtin_presets_produce_valid_settings() {
        for preset in builtin_presets() {
            preset
                .apply()
                .validate()
                .unwrap_or_else(|e| panic!("preset '{}': {e}", preset.name));
        }
    }

    #[test]
    fn settings_json_roundtrip() {
        let s = FrameSettings {
            frame_widths: Some(SideWidths {
                top: 1.0,
                right: 2.0,
                bottom: 3.0,
                left: 4.0,
            }),
            ..FrameSettings::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: FrameSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let s: FrameSettings = serde_json::from_str(r#"{"frame_width": 9.5}"#).unwrap();
        assert_eq!(s.frame_width, 9.5);
        assert_eq!(s.frame_color, FrameSettings::default().frame_color);
    }
}
