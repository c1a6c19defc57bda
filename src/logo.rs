//! Resolution of camera make/model strings to logo asset paths.
//!
//! EXIF `Make`/`Model` values are free-form vendor strings, so matching is
//! deliberately permissive: after an exact model lookup fails, a two-way
//! substring scan accepts firmware-suffixed variants like
//! `"X-T5 ver2.01"`. That scan can false-positive on pathological model
//! strings; this is a known approximation, not a bug to tighten.

/// All logo assets ship as PNGs.
pub const LOGO_EXT: &str = "png";

struct Brand {
    /// Directory under `/logos/`.
    folder: &'static str,
    /// File prefix of the generic brand mark.
    generic: &'static str,
    /// Phone-like brands match a whole model family by keyword.
    family: Option<(&'static str, &'static str)>,
    /// Normalized model name -> file prefix, in tie-break order.
    models: &'static [(&'static str, &'static str)],
}

static APPLE: Brand = Brand {
    folder: "apple",
    generic: "apple",
    family: Some(("iphone", "iphone")),
    models: &[],
};

static GOOGLE: Brand = Brand {
    folder: "google",
    generic: "google",
    family: Some(("pixel", "pixel")),
    models: &[],
};

static SAMSUNG: Brand = Brand {
    folder: "samsung",
    generic: "samsung",
    family: Some(("galaxy", "galaxy")),
    models: &[],
};

static FUJIFILM: Brand = Brand {
    folder: "fujifilm",
    generic: "fujifilm",
    family: None,
    models: &[
        ("x100vi", "x100vi"),
        ("x100v", "x100v"),
        ("x-t5", "xt5"),
        ("x-t4", "xt4"),
        ("x-t30 ii", "xt30ii"),
        ("x-pro3", "xpro3"),
        ("x-e4", "xe4"),
        ("x-h2s", "xh2s"),
        ("gfx100 ii", "gfx100ii"),
        ("gfx100s", "gfx100s"),
    ],
};

static CANON: Brand = Brand {
    folder: "canon",
    generic: "canon",
    family: None,
    models: &[
        ("eos r5", "eosr5"),
        ("eos r6", "eosr6"),
        ("eos r8", "eosr8"),
        ("eos r", "eosr"),
        ("eos 5d mark iv", "eos5d4"),
        ("eos 6d mark ii", "eos6d2"),
    ],
};

static NIKON: Brand = Brand {
    folder: "nikon",
    generic: "nikon",
    family: None,
    models: &[
        ("z 9", "z9"),
        ("z 8", "z8"),
        ("z 6iii", "z6iii"),
        ("z 6ii", "z6ii"),
        ("z fc", "zfc"),
        ("zf", "zf"),
        ("d850", "d850"),
        ("d780", "d780"),
    ],
};

static SONY: Brand = Brand {
    folder: "sony",
    generic: "sony",
    family: None,
    models: &[
        ("ilce-7m4", "a7iv"),
        ("ilce-7m3", "a7iii"),
        ("ilce-7rm5", "a7rv"),
        ("ilce-7cm2", "a7cii"),
        ("ilce-6700", "a6700"),
        ("ilce-1", "a1"),
    ],
};

static LEICA: Brand = Brand {
    folder: "leica",
    generic: "leica",
    family: None,
    models: &[
        ("q3", "q3"),
        ("q2", "q2"),
        ("m11", "m11"),
        ("m10", "m10"),
        ("sl3", "sl3"),
    ],
};

static PANASONIC: Brand = Brand {
    folder: "lumix",
    generic: "lumix",
    family: None,
    models: &[
        ("dc-s5m2", "s5ii"),
        ("dc-s5", "s5"),
        ("dc-gh6", "gh6"),
        ("dc-g9m2", "g9ii"),
    ],
};

static OLYMPUS: Brand = Brand {
    folder: "om-system",
    generic: "om-system",
    family: None,
    models: &[
        ("om-1", "om1"),
        ("om-5", "om5"),
        ("e-m1 mark iii", "em1iii"),
        ("e-m10 mark iv", "em10iv"),
    ],
};

static HASSELBLAD: Brand = Brand {
    folder: "hasselblad",
    generic: "hasselblad",
    family: None,
    models: &[("x2d 100c", "x2d"), ("907x", "907x")],
};

static RICOH: Brand = Brand {
    folder: "ricoh",
    generic: "ricoh",
    family: None,
    models: &[("gr iiix", "griiix"), ("gr iii", "griii")],
};

static PENTAX: Brand = Brand {
    folder: "pentax",
    generic: "pentax",
    family: None,
    models: &[("k-3 mark iii", "k3iii"), ("k-1 mark ii", "k1ii")],
};

static DJI: Brand = Brand {
    folder: "dji",
    generic: "dji",
    family: None,
    models: &[
        ("fc3582", "mini3pro"),
        ("fc8282", "mini4pro"),
        ("osmo pocket 3", "pocket3"),
    ],
};

static XIAOMI: Brand = Brand {
    folder: "xiaomi",
    generic: "xiaomi",
    family: Some(("xiaomi", "xiaomi")),
    models: &[],
};

static ONEPLUS: Brand = Brand {
    folder: "oneplus",
    generic: "oneplus",
    family: Some(("oneplus", "oneplus")),
    models: &[],
};

static HUAWEI: Brand = Brand {
    folder: "huawei",
    generic: "huawei",
    family: Some(("mate", "mate")),
    models: &[],
};

/// Known EXIF `Make` spellings, normalized.
fn brand_for(make: &str) -> Option<&'static Brand> {
    match make {
        "apple" => Some(&APPLE),
        "google" => Some(&GOOGLE),
        "samsung" => Some(&SAMSUNG),
        "fujifilm" | "fuji photo film co., ltd." => Some(&FUJIFILM),
        "canon" => Some(&CANON),
        "nikon" | "nikon corporation" => Some(&NIKON),
        "sony" => Some(&SONY),
        "leica" | "leica camera ag" => Some(&LEICA),
        "panasonic" => Some(&PANASONIC),
        "olympus" | "olympus corporation" | "om digital solutions" => Some(&OLYMPUS),
        "hasselblad" => Some(&HASSELBLAD),
        "ricoh" | "ricoh imaging company, ltd." => Some(&RICOH),
        "pentax" | "pentax corporation" => Some(&PENTAX),
        "dji" => Some(&DJI),
        "xiaomi" => Some(&XIAOMI),
        "oneplus" => Some(&ONEPLUS),
        "huawei" => Some(&HUAWEI),
        _ => None,
    }
}

/// Lowercase, trim, and collapse internal whitespace runs to one space.
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn model_prefix(brand: &'static Brand, model: &str) -> &'static str {
    if let Some((_, prefix)) = brand.models.iter().find(|(key, _)| *key == model) {
        return prefix;
    }
    if let Some((keyword, prefix)) = brand.family
        && model.contains(keyword)
    {
        return prefix;
    }
    // Two-way containment tolerates firmware-reported suffixes; first
    // declared pair wins.
    for (key, prefix) in brand.models {
        if model.contains(key) || key.contains(model) {
            return prefix;
        }
    }
    brand.generic
}

/// Resolve a camera make/model to a logo asset path, or `None` when the
/// brand is unknown.
///
/// The variant is `white` on dark backgrounds, `black` otherwise.
pub fn resolve_logo_path(
    make: Option<&str>,
    model: Option<&str>,
    dark_background: bool,
) -> Option<String> {
    let make = normalize(make?);
    if make.is_empty() {
        return None;
    }
    let brand = brand_for(&make)?;

    let prefix = match model.map(normalize).filter(|m| !m.is_empty()) {
        Some(model) => model_prefix(brand, &model),
        None => brand.generic,
    };

    let variant = if dark_background { "white" } else { "black" };
    Some(format!(
        "/logos/{}/{}_{}.{}",
        brand.folder, prefix, variant, LOGO_EXT
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_model_match() {
        let path = resolve_logo_path(Some("FUJIFILM"), Some("X100VI"), false).unwrap();
        assert_eq!(path, "/logos/fujifilm/x100vi_black.png");
    }

    #[test]
    fn dark_background_selects_white_variant() {
        let path = resolve_logo_path(Some("FUJIFILM"), Some("X100VI"), true).unwrap();
        assert!(path.ends_with("x100vi_white.png"));
    }

    #[test]
    fn unknown_make_resolves_to_none() {
        assert_eq!(resolve_logo_path(Some("Kodak"), Some("Portra"), false), None);
        assert_eq!(resolve_logo_path(None, Some("X100VI"), false), None);
    }

    #[test]
    fn make_and_model_are_normalized() {
        let path = resolve_logo_path(Some("  NIKON   CORPORATION "), Some(" Z  9 "), false);
        assert_eq!(path.as_deref(), Some("/logos/nikon/z9_black.png"));
    }

    #[test]
    fn firmware_suffix_matches_by_containment() {
        let path = resolve_logo_path(Some("Fujifilm"), Some("X-T5 ver2.01"), false).unwrap();
        assert!(path.ends_with("xt5_black.png"));
    }

    #[test]
    fn phone_family_keyword_matches() {
        let path = resolve_logo_path(Some("Apple"), Some("iPhone 15 Pro Max"), true).unwrap();
        assert_eq!(path, "/logos/apple/iphone_white.png");
    }

    #[test]
    fn unmatched_model_falls_back_to_brand_mark() {
        let path = resolve_logo_path(Some("Canon"), Some("PowerShot G7"), false).unwrap();
        assert_eq!(path, "/logos/canon/canon_black.png");
    }

    #[test]
    fn missing_model_uses_brand_mark() {
        let path = resolve_logo_path(Some("Sony"), None, false).unwrap();
        assert_eq!(path, "/logos/sony/sony_black.png");
    }

    #[test]
    fn declaration_order_breaks_substring_ties() {
        // "x100vi" also contains "x100v"; the earlier pair must win.
        let path = resolve_logo_path(Some("FUJIFILM"), Some("x100vi fw2"), false).unwrap();
        assert!(path.ends_with("x100vi_black.png"));
    }
}
