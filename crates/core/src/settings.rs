use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::LayoutConfig;

pub const CONFIG_DIR_ENV: &str = "QGRID_CONFIG_DIR";
pub const SETTINGS_FILE: &str = "settings.toml";
pub const FALLBACK_EDITOR: &str = "vim";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config directory is unavailable for this platform")]
    ConfigDirUnavailable,
    #[error("failed to read settings file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Row cap appended to result-producing queries; `0` disables it.
    pub row_limit: usize,
    pub layout: LayoutConfig,
    pub blink_ms: u64,
    pub editor: Option<String>,
    pub color_scheme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            row_limit: 1000,
            layout: LayoutConfig::default(),
            blink_ms: 200,
            editor: None,
            color_scheme: "default".to_string(),
        }
    }
}

impl Settings {
    pub fn load_from_dir(dir: &Path) -> Result<Self, SettingsError> {
        Self::load_from_path(dir.join(SETTINGS_FILE))
    }

    /// A missing or blank file yields the defaults.
    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&raw).map_err(|source| SettingsError::Parse { path, source })
    }

    #[must_use]
    pub fn blink(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }

    /// Configured editor, else `$EDITOR`, else vim.
    #[must_use]
    pub fn editor_command(&self) -> String {
        resolve_editor(self.editor.as_deref(), env::var("EDITOR").ok().as_deref())
    }

    #[must_use]
    pub fn scheme(&self) -> ColorScheme {
        ColorScheme::named(&self.color_scheme)
    }
}

#[must_use]
pub fn resolve_editor(configured: Option<&str>, from_env: Option<&str>) -> String {
    [configured, from_env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|command| !command.is_empty())
        .unwrap_or(FALLBACK_EDITOR)
        .to_string()
}

pub fn config_dir() -> Result<PathBuf, SettingsError> {
    config_dir_from(|name| env::var_os(name), cfg!(target_os = "windows"))
}

/// Resolution order: `QGRID_CONFIG_DIR`, `%APPDATA%` on Windows,
/// `$XDG_CONFIG_HOME`, then `$HOME/.config`.
pub fn config_dir_from<F>(lookup: F, windows: bool) -> Result<PathBuf, SettingsError>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(custom) = lookup(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(custom));
    }

    let base_dir = if windows {
        lookup("APPDATA")
            .map(PathBuf::from)
            .ok_or(SettingsError::ConfigDirUnavailable)?
    } else if let Some(xdg_config_home) = lookup("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home)
    } else {
        let home = lookup("HOME").ok_or(SettingsError::ConfigDirUnavailable)?;
        PathBuf::from(home).join(".config")
    };

    Ok(base_dir.join("qgrid"))
}

/// 256-color palette indices for each role the renderer paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub primary: u8,
    pub success: u8,
    pub error: u8,
    pub normal: u8,
    pub muted: u8,
    pub highlight: u8,
    pub accent: u8,
}

impl ColorScheme {
    pub const DEFAULT: Self = Self {
        primary: 205,
        success: 171,
        error: 196,
        normal: 252,
        muted: 238,
        highlight: 62,
        accent: 86,
    };

    pub const BUILT_IN: [(&'static str, Self); 9] = [
        ("default", Self::DEFAULT),
        (
            "dracula",
            Self {
                primary: 141,
                success: 48,
                error: 203,
                normal: 15,
                muted: 59,
                highlight: 237,
                accent: 117,
            },
        ),
        (
            "gruvbox",
            Self {
                primary: 214,
                success: 142,
                error: 203,
                normal: 223,
                muted: 244,
                highlight: 237,
                accent: 223,
            },
        ),
        (
            "solarized",
            Self {
                primary: 33,
                success: 106,
                error: 203,
                normal: 15,
                muted: 244,
                highlight: 235,
                accent: 220,
            },
        ),
        (
            "nord",
            Self {
                primary: 68,
                success: 150,
                error: 203,
                normal: 15,
                muted: 244,
                highlight: 236,
                accent: 109,
            },
        ),
        (
            "monokai",
            Self {
                primary: 141,
                success: 77,
                error: 203,
                normal: 188,
                muted: 59,
                highlight: 237,
                accent: 81,
            },
        ),
        (
            "catppuccin-mocha",
            Self {
                primary: 117,
                success: 158,
                error: 210,
                normal: 189,
                muted: 146,
                highlight: 59,
                accent: 151,
            },
        ),
        (
            "tokyo-night",
            Self {
                primary: 74,
                success: 149,
                error: 210,
                normal: 146,
                muted: 147,
                highlight: 23,
                accent: 153,
            },
        ),
        (
            "rose-pine",
            Self {
                primary: 182,
                success: 31,
                error: 168,
                normal: 188,
                muted: 97,
                highlight: 54,
                accent: 152,
            },
        ),
    ];

    /// Unknown names fall back to the default scheme.
    #[must_use]
    pub fn named(name: &str) -> Self {
        let wanted = name.trim().to_ascii_lowercase().replace('_', "-");
        Self::BUILT_IN
            .iter()
            .find(|(scheme, _)| *scheme == wanted)
            .map_or(Self::DEFAULT, |(_, scheme)| *scheme)
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::DEFAULT
    }
}
