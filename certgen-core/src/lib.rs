//! # certgen-core
//!
//! Shared data model for the certificate pipeline: render configuration,
//! text color, name entries and the fatal configuration errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub mod error;

pub use error::ConfigError;

/// 8-bit RGB color. Serialized as a `#rrggbb` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    /// Parses `#RRGGBB` or `RRGGBB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ConfigError::InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ConfigError::InvalidColor(s.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn default_advanced_shaping() -> bool {
    true
}

/// Per-batch rendering parameters. Immutable once a batch is validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Path to a TrueType/OpenType font file.
    pub font_path: PathBuf,
    /// Font size in pixels.
    pub font_size: u32,
    /// Baseline offset from the top edge of the template, in pixels.
    pub y_position: u32,
    pub color: Rgb,
    /// Request OpenType shaping. Falls back to per-codepoint shaping when
    /// the font cannot support it.
    #[serde(default = "default_advanced_shaping")]
    pub use_advanced_shaping: bool,
}

impl RenderConfig {
    pub fn new(font_path: impl Into<PathBuf>, font_size: u32, y_position: u32) -> Self {
        Self {
            font_path: font_path.into(),
            font_size,
            y_position,
            color: Rgb::BLACK,
            use_advanced_shaping: true,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_advanced_shaping(mut self, enabled: bool) -> Self {
        self.use_advanced_shaping = enabled;
        self
    }

    /// Check the numeric fields against a template of `width` x `height`
    /// and make sure the font file exists. Loading the font itself is left
    /// to the text layer.
    pub fn validate(&self, width: u32, height: u32) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyCanvas { width, height });
        }
        if self.font_size == 0 {
            return Err(ConfigError::InvalidFontSize(self.font_size));
        }
        if self.y_position > height {
            return Err(ConfigError::PositionOutOfRange {
                y: self.y_position,
                height,
            });
        }
        if !self.font_path.is_file() {
            return Err(ConfigError::FontNotFound(self.font_path.clone()));
        }
        Ok(())
    }

    /// Load a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One input line and its display form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameEntry {
    /// Position in the input, zero-based.
    pub index: usize,
    /// Trimmed input line.
    pub raw: String,
    /// Normalized text that gets drawn.
    pub display: String,
}

impl NameEntry {
    pub fn new(index: usize, raw: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            index,
            raw: raw.into(),
            display: display.into(),
        }
    }

    /// Filesystem-safe form of the display text.
    ///
    /// Alphanumerics, `-` and `_` are kept, everything else becomes `_`.
    pub fn slug(&self) -> String {
        self.display
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Output file stem, `cert_<n>_<slug>` with a one-based `n`.
    pub fn file_stem(&self) -> String {
        format!("cert_{}_{}", self.index + 1, self.slug())
    }
}
