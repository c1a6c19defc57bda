//! Persistence of settings and the last-used photo.
//!
//! Both stores are deliberately forgiving: a missing or corrupt record
//! falls back to defaults (settings) or "no stored image" (photo slot)
//! without raising, and corrupt slots are cleared proactively.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{
    error::{FrameError, FrameResult},
    model::{FrameSettings, Preset},
};

const SETTINGS_FILE: &str = "settings.json";
const SLOT_META_FILE: &str = "image_slot.json";
const SLOT_BYTES_FILE: &str = "image_slot.bin";

/// Everything the UI persists between sessions.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct StoredState {
    settings: FrameSettings,
    preset_name: Option<String>,
    canvas_background: Option<String>,
}

type Subscriber = Box<dyn FnMut(&FrameSettings)>;

/// Explicit configuration store: get/set/subscribe over the frame
/// settings plus the selected preset and canvas background preference.
///
/// Injected into hosts rather than accessed ambiently; the root
/// directory is explicit so tests never touch the real config dir.
pub struct ConfigStore {
    path: PathBuf,
    state: StoredState,
    subscribers: Vec<Subscriber>,
}

impl ConfigStore {
    /// Open (or initialize) the store rooted at `root`.
    ///
    /// A missing or unreadable file yields defaults.
    pub fn open(root: &Path) -> Self {
        let path = root.join(SETTINGS_FILE);
        let state = fs::read_to_string(&path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(state) => Some(state),
                Err(err) => {
                    warn!(error = %err, "corrupt settings file; falling back to defaults");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            path,
            state,
            subscribers: Vec::new(),
        }
    }

    /// Open the store in the platform config directory, when one exists.
    pub fn open_default() -> Option<Self> {
        let dirs = directories::ProjectDirs::from("", "", "matboard")?;
        Some(Self::open(dirs.config_dir()))
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.state.settings
    }

    pub fn preset_name(&self) -> Option<&str> {
        self.state.preset_name.as_deref()
    }

    pub fn canvas_background(&self) -> Option<&str> {
        self.state.canvas_background.as_deref()
    }

    /// Register a callback invoked on every settings change.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&FrameSettings) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn set_settings(&mut self, settings: FrameSettings) -> FrameResult<()> {
        settings.validate()?;
        self.state.settings = settings;
        self.state.preset_name = None;
        self.notify();
        self.save()
    }

    /// Selecting a preset merges it over defaults and remembers its name.
    pub fn select_preset(&mut self, preset: &Preset) -> FrameResult<()> {
        self.state.settings = preset.apply();
        self.state.preset_name = Some(preset.name.clone());
        self.notify();
        self.save()
    }

    pub fn set_canvas_background(&mut self, background: Option<String>) -> FrameResult<()> {
        self.state.canvas_background = background;
        self.save()
    }

    fn notify(&mut self) {
        for subscriber in &mut self.subscribers {
            subscriber(&self.state.settings);
        }
    }

    fn save(&self) -> FrameResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FrameError::persist(format!("create config dir: {e}")))?;
        }
        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| FrameError::persist(format!("serialize settings: {e}")))?;
        fs::write(&self.path, json)
            .map_err(|e| FrameError::persist(format!("write settings: {e}")))?;
        Ok(())
    }
}

/// The most recently framed photo, for restoring an editing session.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredPhoto {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SlotMeta {
    file_name: String,
    byte_len: usize,
}

/// Single fixed slot persisting the last uploaded photo.
///
/// Only one image is retained at a time; saving replaces the previous
/// record.
pub struct ImageSlot {
    dir: PathBuf,
}

impl ImageSlot {
    pub fn open(root: &Path) -> Self {
        Self {
            dir: root.to_path_buf(),
        }
    }

    /// Open the slot in the platform data directory, when one exists.
    pub fn open_default() -> Option<Self> {
        let dirs = directories::ProjectDirs::from("", "", "matboard")?;
        Some(Self::open(dirs.data_dir()))
    }

    pub fn save(&self, file_name: &str, bytes: &[u8]) -> FrameResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| FrameError::persist(format!("create slot dir: {e}")))?;
        let meta = SlotMeta {
            file_name: file_name.to_string(),
            byte_len: bytes.len(),
        };
        let json = serde_json::to_string(&meta)
            .map_err(|e| FrameError::persist(format!("serialize slot meta: {e}")))?;
        fs::write(self.dir.join(SLOT_BYTES_FILE), bytes)
            .map_err(|e| FrameError::persist(format!("write slot bytes: {e}")))?;
        fs::write(self.dir.join(SLOT_META_FILE), json)
            .map_err(|e| FrameError::persist(format!("write slot meta: {e}")))?;
        Ok(())
    }

    /// Load the stored photo, clearing the slot when the record is
    /// corrupt or incomplete.
    pub fn load(&self) -> Option<StoredPhoto> {
        let meta_raw = fs::read_to_string(self.dir.join(SLOT_META_FILE)).ok()?;
        let meta: SlotMeta = match serde_json::from_str(&meta_raw) {
            Ok(meta) => meta,
            Err(err) => {
                warn!(error = %err, "corrupt image slot metadata; clearing slot");
                self.clear();
                return None;
            }
        };
        let bytes = match fs::read(self.dir.join(SLOT_BYTES_FILE)) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "image slot bytes missing; clearing slot");
                self.clear();
                return None;
            }
        };
        if bytes.len() != meta.byte_len {
            warn!("image slot length mismatch; clearing slot");
            self.clear();
            return None;
        }
        Some(StoredPhoto {
            file_name: meta.file_name,
            bytes,
        })
    }

    pub fn clear(&self) {
        let _ = fs::remove_file(self.dir.join(SLOT_META_FILE));
        let _ = fs::remove_file(self.dir.join(SLOT_BYTES_FILE));
    }
}
