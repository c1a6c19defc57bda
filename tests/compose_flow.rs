use std::io::Cursor;

use matboard::{
    Applied, AssetLoader, Compositor, ExportFormat, FrameResult, FrameSettings, LoadKind, Phase,
    PhotoPayload, PreparedImage, SideWidths, builtin_presets, drive, export, metadata,
};

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(
        width,
        height,
        rgba.repeat(width as usize * height as usize),
    )
    .unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

struct Loader {
    photo_png: Vec<u8>,
    make: Option<&'static str>,
    model: Option<&'static str>,
    logo_png: Option<Vec<u8>>,
    logo_paths_seen: Vec<String>,
}

impl AssetLoader for Loader {
    fn load_photo(&mut self, _source: &str) -> FrameResult<PhotoPayload> {
        let image = matboard::assets::decode::decode_image(&self.photo_png)?;
        let mut exif = metadata::read_summary(&self.photo_png);
        exif.make = self.make.map(str::to_string);
        exif.model = self.model.map(str::to_string);
        Ok(PhotoPayload { image, exif })
    }

    fn load_logo(&mut self, path: &str) -> FrameResult<PreparedImage> {
        self.logo_paths_seen.push(path.to_string());
        match &self.logo_png {
            Some(png) => matboard::assets::decode::decode_image(png),
            None => Err(matboard::FrameError::decode("logo asset unavailable")),
        }
    }
}

fn strip_settings() -> FrameSettings {
    FrameSettings {
        frame_color: "#000000".to_string(),
        text_enabled: true,
        show_shot_on_text: false,
        show_exif_data: false,
        frame_widths: Some(SideWidths {
            top: 2.0,
            right: 2.0,
            bottom: 20.0,
            left: 2.0,
        }),
        ..FrameSettings::default()
    }
}

#[test]
fn end_to_end_compose_and_export_jpeg() {
    let settings = FrameSettings {
        frame_width: 10.0,
        frame_color: "#ffffff".to_string(),
        text_enabled: false,
        ..FrameSettings::default()
    };
    let mut comp = Compositor::new(settings).unwrap();
    let mut loader = Loader {
        photo_png: png_bytes(100, 80, [200, 30, 30, 255]),
        make: None,
        model: None,
        logo_png: None,
        logo_paths_seen: Vec::new(),
    };

    comp.request_photo("session-photo");
    drive(&mut comp, &mut loader).unwrap();
    assert_eq!(comp.phase(), Phase::Rendered);

    // avg 90, 10% -> 9px per side.
    let geometry = comp.geometry().unwrap();
    assert_eq!((geometry.canvas_w, geometry.canvas_h), (118, 98));

    let bytes = export::encode_surface(comp.surface(), ExportFormat::jpeg()).unwrap();
    assert!(bytes.starts_with(&[0xff, 0xd8]));

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (118, 98));
}

#[test]
fn logo_flow_requests_resolved_path_once_per_session() {
    let mut comp = Compositor::new(strip_settings()).unwrap();
    let mut loader = Loader {
        photo_png: png_bytes(100, 100, [10, 120, 10, 255]),
        make: Some("FUJIFILM"),
        model: Some("X100VI"),
        logo_png: Some(png_bytes(4, 2, [250, 250, 250, 255])),
        logo_paths_seen: Vec::new(),
    };

    comp.request_photo("first");
    drive(&mut comp, &mut loader).unwrap();
    assert_eq!(comp.phase(), Phase::Rendered);
    assert_eq!(
        loader.logo_paths_seen,
        vec!["/logos/fujifilm/x100vi_white.png".to_string()]
    );

    // Second photo, same brand: served from the logo cache.
    comp.request_photo("second");
    drive(&mut comp, &mut loader).unwrap();
    assert_eq!(comp.phase(), Phase::Rendered);
    assert_eq!(loader.logo_paths_seen.len(), 1);
}

#[test]
fn superseded_composition_never_mixes_inputs() {
    let mut comp = Compositor::new(strip_settings()).unwrap();

    // Photo A resolves a logo and parks in LogoLoading.
    let req_a = comp.request_photo("a");
    let photo_a = matboard::assets::decode::decode_image(&png_bytes(100, 100, [9, 9, 9, 255]))
        .unwrap();
    comp.complete_photo(
        req_a.token,
        Ok(PhotoPayload {
            image: photo_a,
            exif: metadata::ExifSummary {
                make: Some("FUJIFILM".to_string()),
                model: Some("X100VI".to_string()),
                ..metadata::ExifSummary::default()
            },
        }),
    )
    .unwrap();
    let logo_req_a = comp.pending_request().cloned().unwrap();
    assert!(matches!(logo_req_a.kind, LoadKind::Logo { .. }));

    // B arrives before A's logo decode resolves.
    let req_b = comp.request_photo("b");

    // A's logo completes late and must be discarded.
    let late = matboard::assets::decode::decode_image(&png_bytes(4, 2, [255, 0, 0, 255])).unwrap();
    assert_eq!(
        comp.complete_logo(logo_req_a.token, Ok(late)).unwrap(),
        Applied::Stale
    );

    // B is a different size and an unknown brand.
    let photo_b = matboard::assets::decode::decode_image(&png_bytes(60, 40, [0, 0, 200, 255]))
        .unwrap();
    comp.complete_photo(
        req_b.token,
        Ok(PhotoPayload {
            image: photo_b,
            exif: metadata::ExifSummary::default(),
        }),
    )
    .unwrap();

    assert_eq!(comp.phase(), Phase::Rendered);
    let surface = comp.surface();
    assert_eq!((surface.width(), surface.height()), (62, 51));
    // The bottom border carries no trace of A's logo.
    for x in [10, 31, 50] {
        assert_eq!(surface.pixel_rgba8(x, 46), Some([0, 0, 0, 255]));
    }
}

#[test]
fn export_before_any_photo_fails_loudly() {
    let comp = Compositor::new(FrameSettings::default()).unwrap();
    assert!(comp.rendered_frame().is_err());
    assert!(export::encode_surface(comp.surface(), ExportFormat::Png).is_err());
}

#[test]
fn preset_selection_resets_omitted_fields() {
    // The user had text enabled; the preset says nothing about text.
    let preset = builtin_presets()
        .into_iter()
        .find(|p| p.name == "classic-white")
        .unwrap();
    let merged = preset.apply();
    assert_eq!(merged.text_enabled, FrameSettings::default().text_enabled);

    let mut comp = Compositor::new(strip_settings()).unwrap();
    let mut loader = Loader {
        photo_png: png_bytes(100, 100, [80, 80, 80, 255]),
        make: Some("FUJIFILM"),
        model: Some("X100VI"),
        logo_png: Some(png_bytes(4, 2, [255, 255, 255, 255])),
        logo_paths_seen: Vec::new(),
    };
    comp.request_photo("photo");
    drive(&mut comp, &mut loader).unwrap();
    assert_eq!(comp.phase(), Phase::Rendered);

    // Applying the preset turns the strip off and recomposes directly.
    comp.update_settings(merged).unwrap();
    assert_eq!(comp.phase(), Phase::Rendered);
    assert!(comp.pending_request().is_none());
}
