//! Command-line arguments and their merge with an optional JSON config.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use certgen_core::{RenderConfig, Rgb};
use certgen_text::DEFAULT_CACHE_CAPACITY;
use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// Smallest font size accepted; smaller values are raised to it.
pub const MIN_FONT_SIZE: u32 = 10;
pub const DEFAULT_FONT_SIZE: u32 = 48;

/// certgen: overlay names onto a certificate template
#[derive(Parser, Debug)]
#[command(name = "certgen")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Template image (PNG or JPEG)
    #[arg(long)]
    pub template: PathBuf,

    /// Names file, one name per line ("-" reads stdin)
    #[arg(long)]
    pub names: PathBuf,

    /// Font file to draw with
    #[arg(long, conflicts_with = "family")]
    pub font: Option<PathBuf>,

    /// Installed font family to draw with
    #[arg(long)]
    pub family: Option<String>,

    /// Font size in pixels
    #[arg(long)]
    pub size: Option<u32>,

    /// Baseline offset from the top of the template, in pixels
    #[arg(long = "y")]
    pub y: Option<u32>,

    /// Text color as #RRGGBB
    #[arg(long)]
    pub color: Option<Rgb>,

    /// Always use per-codepoint shaping
    #[arg(long)]
    pub no_advanced_shaping: bool,

    /// Sort names alphabetically before numbering
    #[arg(long)]
    pub sort: bool,

    /// Worker threads (default: one per core)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Shaped names cached per worker (0 disables)
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache: usize,

    /// Output formats, comma separated
    #[arg(long, value_enum, value_delimiter = ',', default_value = "png")]
    pub format: Vec<OutputFormat>,

    /// JSON render config; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(long, short)]
    pub out: PathBuf,

    /// Debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum OutputFormat {
    Png,
    #[value(alias = "jpeg")]
    Jpg,
    /// One page holding the JPEG rendition.
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Pdf => "pdf",
        }
    }
}

/// Config file contents. Every field is optional so a file can hold
/// just the values shared between runs.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub font_path: Option<PathBuf>,
    pub font_size: Option<u32>,
    pub y_position: Option<u32>,
    pub color: Option<Rgb>,
    pub use_advanced_shaping: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing config {}", path.display()))
    }
}

impl Args {
    /// Font path from flags or the config file. `None` means the caller
    /// has to pick one from the installed fonts.
    pub fn explicit_font(&self, file: &FileConfig) -> Option<PathBuf> {
        self.font.clone().or_else(|| file.font_path.clone())
    }

    /// Build the render config. Flags win over the file.
    pub fn render_config(&self, file: &FileConfig, font_path: PathBuf) -> Result<RenderConfig> {
        let Some(y) = self.y.or(file.y_position) else {
            bail!("no baseline position: pass --y or set y_position in the config file");
        };
        let requested = self.size.or(file.font_size).unwrap_or(DEFAULT_FONT_SIZE);
        let size = requested.max(MIN_FONT_SIZE);
        if size != requested {
            log::warn!("Font size {} raised to the minimum of {}", requested, MIN_FONT_SIZE);
        }
        let advanced = !self.no_advanced_shaping && file.use_advanced_shaping.unwrap_or(true);

        Ok(RenderConfig::new(font_path, size, y)
            .with_color(self.color.or(file.color).unwrap_or(Rgb::BLACK))
            .with_advanced_shaping(advanced))
    }
}
