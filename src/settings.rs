use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use narrate::audio::DEFAULT_GAP_SECONDS;
use narrate::render::DEFAULT_COLUMNS;

use crate::NarrateApp;

/// Returns the path to the settings file: `~/.config/narrate-rs/settings.json`
fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("narrate-rs");
    path.push("settings.json");
    path
}

/// Persisted application settings.
///
/// Fields use `#[serde(default)]` so that adding new settings
/// won't break existing config files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    // Playback
    pub master_gain: f32,
    pub tick_interval_ms: u64,

    // Composition
    pub gap_seconds: f64,

    // Display
    pub waveform_columns: usize,

    // Files
    pub export_dir: Option<PathBuf>,
    pub background_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            master_gain: 1.0,
            tick_interval_ms: 16,

            gap_seconds: DEFAULT_GAP_SECONDS,

            waveform_columns: DEFAULT_COLUMNS,

            export_dir: None,
            background_path: None,
        }
    }
}

impl AppSettings {
    /// Load settings from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings.sanitized()
                }
                Err(e) => {
                    log::warn!("Failed to parse settings ({}), using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings file found ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk as pretty JSON.
    pub fn save(&self) {
        self.save_to(&settings_path());
    }

    fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create config directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::warn!("Failed to write settings: {}", e);
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize settings: {}", e);
            }
        }
    }

    /// Pull out-of-range values from hand-edited files back into range
    fn sanitized(mut self) -> Self {
        self.master_gain = if self.master_gain.is_finite() {
            self.master_gain.clamp(0.0, 1.0)
        } else {
            1.0
        };
        if !self.gap_seconds.is_finite() || self.gap_seconds < 0.0 {
            self.gap_seconds = DEFAULT_GAP_SECONDS;
        }
        self.waveform_columns = self.waveform_columns.clamp(1, 4096);
        self.tick_interval_ms = self.tick_interval_ms.clamp(1, 1000);
        self
    }

    /// Extract current settings from the running application.
    pub fn from_app(app: &NarrateApp) -> Self {
        Self {
            master_gain: app.player.master_gain(),
            background_path: app.background_path.clone(),
            ..app.settings.clone()
        }
    }

    /// Apply loaded settings to the running application.
    pub fn apply(&self, app: &mut NarrateApp) {
        app.player.set_master_gain(self.master_gain);
        if let Some(path) = &self.background_path {
            app.load_background(path);
        }
        app.settings = self.clone();
    }
}
