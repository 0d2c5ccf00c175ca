use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// How two documents are combined into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Page `i` of the second document is flattened onto page `i` of the first.
    /// The output is truncated to the shorter document.
    #[default]
    SideBySide,
    /// All pages of the first document followed by all pages of the second.
    Stacked,
}

impl MergeMode {
    /// Internal string form (`side_by_side` / `stacked`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SideBySide => "side_by_side",
            Self::Stacked => "stacked",
        }
    }

    /// Human readable label for UI controls.
    pub const fn label(self) -> &'static str {
        match self {
            Self::SideBySide => "Side by side",
            Self::Stacked => "Stacked",
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "side_by_side" | "side-by-side" | "sidebyside" | "pairwise" => Ok(Self::SideBySide),
            "stacked" | "concatenate" | "concat" => Ok(Self::Stacked),
            other => Err(Error::UnknownMergeMode(other.to_string())),
        }
    }
}

/// Which pages of a document receive the note overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteScope {
    /// The same overlay is flattened onto every page.
    #[default]
    AllPages,
    /// Only the first page is stamped.
    FirstPage,
}

/// Direction in which a multi-line note block grows from its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteGrowth {
    /// The first line sits on `origin_y`; following lines step down.
    #[default]
    Down,
    /// The last line sits on `origin_y`; earlier lines stack upward.
    Up,
}

/// Text color for note overlays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl TextColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn dark_red() -> Self {
        Self::new(0.8, 0.0, 0.0)
    }

    pub const fn blue() -> Self {
        Self::new(0.0, 0.0, 0.8)
    }

    pub const fn dark_green() -> Self {
        Self::new(0.0, 0.5, 0.0)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "black" => Some(Self::black()),
            "darkred" | "dark_red" | "dark-red" => Some(Self::dark_red()),
            "blue" => Some(Self::blue()),
            "darkgreen" | "dark_green" | "dark-green" => Some(Self::dark_green()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        for (name, value) in [("r", self.r), ("g", self.g), ("b", self.b)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigInvalid {
                    field: format!("notes.color.{name}"),
                    reason: format!("{value} is outside 0.0..=1.0"),
                });
            }
        }
        Ok(())
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::black()
    }
}

/// Layout of the note overlay page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteStyle {
    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Distance of the text block from the left page edge (points)
    #[serde(default = "default_origin")]
    pub origin_x: f32,

    /// Baseline of the anchor line, measured from the bottom page edge (points).
    /// This is the first line unless `growth` is `up`.
    #[serde(default = "default_origin")]
    pub origin_y: f32,

    /// Line spacing as a multiple of the font size
    #[serde(default = "default_leading_factor")]
    pub leading_factor: f32,

    /// Note text color
    #[serde(default)]
    pub color: TextColor,

    /// Pages that receive the overlay
    #[serde(default)]
    pub scope: NoteScope,

    /// Which way multi-line notes extend from `origin_y`
    #[serde(default)]
    pub growth: NoteGrowth,
}

const fn default_font_size() -> f32 {
    10.0
}

const fn default_origin() -> f32 {
    40.0
}

const fn default_leading_factor() -> f32 {
    1.2
}

impl NoteStyle {
    /// Distance between two baselines in points.
    pub fn leading(&self) -> f32 {
        self.font_size * self.leading_factor
    }
}

impl Default for NoteStyle {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            origin_x: default_origin(),
            origin_y: default_origin(),
            leading_factor: default_leading_factor(),
            color: TextColor::default(),
            scope: NoteScope::default(),
            growth: NoteGrowth::default(),
        }
    }
}

/// Merge behaviour and output naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Mode preselected in front ends
    #[serde(default)]
    pub default_mode: MergeMode,

    /// File name offered for the merged download
    #[serde(default = "default_download_filename")]
    pub download_filename: String,
}

fn default_download_filename() -> String {
    DEFAULT_DOWNLOAD_FILENAME.to_string()
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default_mode: MergeMode::default(),
            download_filename: default_download_filename(),
        }
    }
}

/// Web front end limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Maximum request body size for uploads, in MiB
    #[serde(default = "default_upload_limit_mb")]
    pub upload_limit_mb: usize,

    /// Sessions older than this are evicted (seconds)
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
}

const fn default_upload_limit_mb() -> usize {
    300
}

const fn default_session_ttl_seconds() -> u64 {
    3600
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            upload_limit_mb: default_upload_limit_mb(),
            session_ttl_seconds: default_session_ttl_seconds(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Note overlay layout
    #[serde(default)]
    pub notes: NoteStyle,

    /// Merge settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Web server settings
    #[serde(default)]
    pub web: WebConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/pdf-compare/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-compare").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Reject values that would produce an unusable overlay or download.
    pub fn validate(&self) -> Result<(), Error> {
        if self.notes.font_size.is_nan() || self.notes.font_size <= 0.0 {
            return Err(Error::ConfigInvalid {
                field: "notes.font_size".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.notes.leading_factor.is_nan() || self.notes.leading_factor <= 0.0 {
            return Err(Error::ConfigInvalid {
                field: "notes.leading_factor".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.notes.origin_x < 0.0 || self.notes.origin_y < 0.0 {
            return Err(Error::ConfigInvalid {
                field: "notes.origin".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        self.notes.color.validate()?;

        let name = self.merge.download_filename.trim();
        if name.is_empty() || name.contains(['/', '\\', '"']) {
            return Err(Error::ConfigInvalid {
                field: "merge.download_filename".to_string(),
                reason: format!("'{name}' is not a plain file name"),
            });
        }
        Ok(())
    }
}

/// A merge mode option for UI radio buttons
#[derive(Debug, Clone)]
pub struct ModeOption {
    /// Form value (e.g., "side_by_side")
    pub value: &'static str,
    /// Display label (e.g., "Side by side")
    pub label: &'static str,
}

/// Merge modes offered by front ends, in display order.
pub fn merge_modes() -> Vec<ModeOption> {
    [MergeMode::SideBySide, MergeMode::Stacked]
        .into_iter()
        .map(|mode| ModeOption {
            value: mode.as_str(),
            label: mode.label(),
        })
        .collect()
}

/// Default file name of the merged download
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "merged.pdf";
