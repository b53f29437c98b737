//! Persisted display settings: theme and accent colour.
//!
//! The settings are an explicit value. Callers load a [`Settings`] through a
//! [`SettingsStore`], pass it to whatever needs it, and save it back after
//! every change. The file lives at `<config dir>/filedesk/settings.json`;
//! set `FILEDESK_CONFIG_DIR` to use another directory.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const APP_NAME: &str = "filedesk";
const SETTINGS_FILENAME: &str = "settings.json";
/// Overrides the directory holding `settings.json`.
pub const CONFIG_DIR_ENV: &str = "FILEDESK_CONFIG_DIR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(ConvertError::Settings(format!("unknown theme '{other}'"))),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accent colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    #[default]
    Blue,
    Purple,
    Green,
    Orange,
    Red,
}

impl Accent {
    pub const ALL: [Accent; 5] = [
        Accent::Blue,
        Accent::Purple,
        Accent::Green,
        Accent::Orange,
        Accent::Red,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Accent::Blue => "blue",
            Accent::Purple => "purple",
            Accent::Green => "green",
            Accent::Orange => "orange",
            Accent::Red => "red",
        }
    }

    /// Primary colour as an HSL triple (`"H S% L%"`).
    pub fn hsl(&self) -> &'static str {
        match self {
            Accent::Blue => "262 83% 58%",
            Accent::Purple => "280 89% 60%",
            Accent::Green => "142 71% 45%",
            Accent::Orange => "25 95% 53%",
            Accent::Red => "0 84% 60%",
        }
    }

    /// Closest 256-colour ANSI index, for terminal output.
    pub fn ansi256(&self) -> u8 {
        match self {
            Accent::Blue => 99,
            Accent::Purple => 135,
            Accent::Green => 35,
            Accent::Orange => 208,
            Accent::Red => 203,
        }
    }
}

impl std::str::FromStr for Accent {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Accent::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| ConvertError::Settings(format!("unknown accent colour '{wanted}'")))
    }
}

impl std::fmt::Display for Accent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub theme_color: Accent,
}

/// JSON file adapter for [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location, honouring `FILEDESK_CONFIG_DIR`.
    pub fn default_location() -> Result<Self, ConvertError> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .map(|config| config.join(APP_NAME))
                .ok_or_else(|| ConvertError::Settings("could not determine config directory".into()))?,
        };
        Ok(Self::at(dir.join(SETTINGS_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings. A missing file yields the defaults; a file that
    /// exists but cannot be parsed is an error.
    pub fn load(&self) -> Result<Settings, ConvertError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Settings file not found at {:?}, using defaults", self.path);
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(ConvertError::Settings(format!(
                    "reading {}: {e}",
                    self.path.display()
                )))
            }
        };
        let settings = serde_json::from_str(&content).map_err(|e| {
            warn!("Failed to parse settings file {:?}: {}", self.path, e);
            ConvertError::Settings(format!("parsing {}: {e}", self.path.display()))
        })?;
        debug!("Loaded settings from {:?}", self.path);
        Ok(settings)
    }

    /// Write the settings, creating the directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<(), ConvertError> {
        let err = |e: std::io::Error| ConvertError::Settings(format!("writing {}: {e}", self.path.display()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(err)?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| ConvertError::Settings(format!("serialising settings: {e}")))?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);
        std::fs::write(&tmp_path, json + "\n").map_err(err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(err)?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Load, apply `change`, save, and return the new value.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<Settings, ConvertError> {
        let mut settings = self.load()?;
        change(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}
