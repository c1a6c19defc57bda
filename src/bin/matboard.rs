use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use matboard::{
    AssetLoader, Compositor, ConfigStore, ExportFormat, FrameResult, FrameSettings, FsAssetSource,
    ImageSlot, PhotoPayload, PreparedImage, Typeface, assets::AssetSource as _,
    assets::decode::decode_image, builtin_presets, drive, export, metadata,
};

#[derive(Parser, Debug)]
#[command(name = "matboard", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a frame around a photo and export it.
    Frame(FrameArgs),
    /// List the built-in presets.
    Presets,
    /// Print the EXIF summary line for a photo.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input photo.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path; defaults to `<stem>-framed.jpg` (or a timestamped
    /// `.png`) next to the input.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Built-in preset to apply (see `matboard presets`).
    #[arg(long)]
    preset: Option<String>,

    /// Settings JSON file overriding preset/stored settings.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Root directory serving `/logos/...` assets.
    #[arg(long)]
    logos: Option<PathBuf>,

    /// TTF/OTF font for caption and EXIF text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = FormatChoice::Jpeg)]
    format: FormatChoice,

    /// Config root override (defaults to the platform config dir).
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Skip persisting settings and the photo slot.
    #[arg(long)]
    no_store: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input photo.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Jpeg,
    Png,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Presets => cmd_presets(),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

struct CliLoader {
    photo_bytes: Vec<u8>,
    logos: Option<FsAssetSource>,
}

impl AssetLoader for CliLoader {
    fn load_photo(&mut self, _source: &str) -> FrameResult<PhotoPayload> {
        let exif = metadata::read_summary(&self.photo_bytes);
        let image = decode_image(&self.photo_bytes)?;
        Ok(PhotoPayload { image, exif })
    }

    fn load_logo(&mut self, path: &str) -> FrameResult<PreparedImage> {
        let source = self.logos.as_mut().ok_or_else(|| {
            matboard::FrameError::decode("no logo root configured (pass --logos)")
        })?;
        decode_image(&source.load(path)?)
    }
}

fn resolve_settings(args: &FrameArgs, store: Option<&ConfigStore>) -> anyhow::Result<FrameSettings> {
    if let Some(path) = &args.settings {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        let settings: FrameSettings =
            serde_json::from_str(&raw).context("parse settings JSON")?;
        settings.validate()?;
        return Ok(settings);
    }
    if let Some(name) = &args.preset {
        let preset = builtin_presets()
            .into_iter()
            .find(|p| p.name == *name)
            .with_context(|| format!("unknown preset '{name}'"))?;
        return Ok(preset.apply());
    }
    Ok(store
        .map(|s| s.settings().clone())
        .unwrap_or_default())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut store = match &args.config_dir {
        Some(root) => Some(ConfigStore::open(root)),
        None => ConfigStore::open_default(),
    };
    let settings = resolve_settings(&args, store.as_ref())?;

    let photo_bytes = fs::read(&args.in_path)
        .with_context(|| format!("read photo '{}'", args.in_path.display()))?;

    let mut comp = Compositor::new(settings.clone())?;
    if let Some(font_path) = &args.font {
        let font_bytes = fs::read(font_path)
            .with_context(|| format!("read font '{}'", font_path.display()))?;
        comp.set_typeface(Typeface::from_bytes(font_bytes));
    }

    let mut loader = CliLoader {
        photo_bytes: photo_bytes.clone(),
        logos: args.logos.as_ref().map(FsAssetSource::new),
    };
    comp.request_photo(args.in_path.display().to_string());
    drive(&mut comp, &mut loader)?;

    let frame = comp.rendered_frame()?;
    let (format, out_path) = match args.format {
        FormatChoice::Jpeg => {
            let name = export::framed_file_name(&input_file_name(&args.in_path));
            (ExportFormat::jpeg(), args.out.clone().unwrap_or_else(|| sibling(&args.in_path, &name)))
        }
        FormatChoice::Png => {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            let name = export::lossless_file_name("frame", timestamp);
            (ExportFormat::Png, args.out.clone().unwrap_or_else(|| sibling(&args.in_path, &name)))
        }
    };
    let bytes = export::encode_frame(&frame, format)?;

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    fs::write(&out_path, &bytes)
        .with_context(|| format!("write output '{}'", out_path.display()))?;

    if !args.no_store {
        if let Some(store) = store.as_mut()
            && let Err(err) = store.set_settings(settings)
        {
            eprintln!("warning: could not persist settings: {err}");
        }
        let slot = match &args.config_dir {
            Some(root) => Some(ImageSlot::open(root)),
            None => ImageSlot::open_default(),
        };
        if let Some(slot) = slot
            && let Err(err) = slot.save(&input_file_name(&args.in_path), &photo_bytes)
        {
            eprintln!("warning: could not persist photo slot: {err}");
        }
    }

    eprintln!("wrote {}", out_path.display());
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    for preset in builtin_presets() {
        let settings = preset.apply();
        println!(
            "{:<16} frame {}  width {}  text {}",
            preset.name,
            settings.frame_color,
            settings
                .frame_widths
                .map(|w| format!("{}/{}/{}/{}", w.top, w.right, w.bottom, w.left))
                .unwrap_or_else(|| format!("{}", settings.frame_width)),
            if settings.text_enabled { "on" } else { "off" },
        );
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let bytes = fs::read(&args.in_path)
        .with_context(|| format!("read photo '{}'", args.in_path.display()))?;
    let summary = metadata::read_summary(&bytes);

    match (&summary.make, &summary.model) {
        (Some(make), Some(model)) => println!("camera: {make} {model}"),
        (Some(make), None) => println!("camera: {make}"),
        (None, Some(model)) => println!("camera: {model}"),
        (None, None) => println!("camera: unknown"),
    }
    match summary.summary_line() {
        Some(line) => println!("capture: {line}"),
        None => println!("capture: no exif data"),
    }
    Ok(())
}

fn input_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo")
        .to_string()
}

fn sibling(input: &Path, name: &str) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(name)
}
