//! Loaded font for one batch.
//!
//! A [`FontHandle`] reads the font file once, parses it into a `fontdb`
//! database that every worker engine clones (sources are `Arc`-shared),
//! and records whether the face carries OpenType layout tables. That
//! decides the [`ShapingMode`] for the whole batch up front.

use cosmic_text::fontdb::{self, Database};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use ttf_parser::{Face, Tag};

#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("font {} is not a valid TrueType/OpenType file: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}

impl FontError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Shaping strategy used by every engine of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapingMode {
    /// Contextual OpenType shaping (ligatures, conjuncts, mark placement).
    Advanced,
    /// One glyph per codepoint with the font's plain advances.
    Fallback,
}

impl fmt::Display for ShapingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advanced => f.write_str("advanced"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Outcome of [`FontHandle::resolve_mode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeResolution {
    pub mode: ShapingMode,
    /// Set when advanced shaping was requested but cannot be used.
    pub degraded: Option<String>,
}

/// Properties of the face the engines select.
#[derive(Clone, Debug)]
pub struct FaceMeta {
    pub family: String,
    pub postscript_name: String,
    pub weight: fontdb::Weight,
    pub style: fontdb::Style,
    pub stretch: fontdb::Stretch,
}

/// A parsed font file, shareable across worker threads.
#[derive(Clone)]
pub struct FontHandle {
    path: PathBuf,
    data: Arc<Vec<u8>>,
    db: Database,
    face: FaceMeta,
    has_layout_tables: bool,
}

impl FontHandle {
    /// Read and parse a font file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, data)
    }

    /// Parse font bytes. `path` is only used for reporting.
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self, FontError> {
        let path = path.into();
        let parsed = Face::parse(&data, 0).map_err(|e| FontError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let raw = parsed.raw_face();
        let has_layout_tables = raw.table(Tag::from_bytes(b"GSUB")).is_some()
            || raw.table(Tag::from_bytes(b"GPOS")).is_some();

        let data = Arc::new(data);
        let mut db = Database::new();
        db.load_font_source(fontdb::Source::Binary(data.clone()));

        let face = db
            .faces()
            .next()
            .map(|info| FaceMeta {
                family: info
                    .families
                    .first()
                    .map(|(name, _)| name.clone())
                    .unwrap_or_else(|| info.post_script_name.clone()),
                postscript_name: info.post_script_name.clone(),
                weight: info.weight,
                style: info.style,
                stretch: info.stretch,
            })
            .ok_or_else(|| FontError::Parse {
                path: path.clone(),
                reason: "no usable face in font data".into(),
            })?;

        log::info!(
            "Loaded font {} ({}, {} bytes, layout tables: {})",
            path.display(),
            face.family,
            data.len(),
            has_layout_tables,
        );

        Ok(Self {
            path,
            data,
            db,
            face,
            has_layout_tables,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn face(&self) -> &FaceMeta {
        &self.face
    }

    /// Database holding only this font; engines clone it.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// True when the face has GSUB or GPOS tables.
    pub fn has_layout_tables(&self) -> bool {
        self.has_layout_tables
    }

    /// Whether the font maps `ch` to a real glyph.
    pub fn covers(&self, ch: char) -> bool {
        Face::parse(&self.data, 0)
            .ok()
            .and_then(|face| face.glyph_index(ch))
            .is_some_and(|id| id.0 != 0)
    }

    /// Decide the shaping mode for a batch.
    ///
    /// Advanced shaping needs both the compiled-in capability and layout
    /// tables in the font. Anything else degrades to fallback.
    pub fn resolve_mode(&self, requested_advanced: bool) -> ModeResolution {
        if !requested_advanced {
            return ModeResolution {
                mode: ShapingMode::Fallback,
                degraded: None,
            };
        }
        let reason = if !cfg!(feature = "advanced-shaping") {
            Some("advanced shaping support is not compiled in".to_string())
        } else if !self.has_layout_tables {
            Some(format!(
                "font {} has no OpenType layout tables (GSUB/GPOS)",
                self.path.display()
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => {
                log::warn!("Advanced shaping unavailable, using fallback: {}", reason);
                ModeResolution {
                    mode: ShapingMode::Fallback,
                    degraded: Some(reason),
                }
            }
            None => ModeResolution {
                mode: ShapingMode::Advanced,
                degraded: None,
            },
        }
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("path", &self.path)
            .field("family", &self.face.family)
            .field("bytes", &self.data.len())
            .field("has_layout_tables", &self.has_layout_tables)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::system_font_path;

    #[test]
    fn test_load_missing_file() {
        let err = FontHandle::load("/no/such/font.ttf").unwrap_err();
        assert!(matches!(err, FontError::Io { .. }));
        assert_eq!(err.path(), Path::new("/no/such/font.ttf"));
    }

    #[test]
    fn test_load_garbage() {
        let err = FontHandle::from_bytes("junk.ttf", b"definitely not a font".to_vec()).unwrap_err();
        assert!(matches!(err, FontError::Parse { .. }));
    }

    #[test]
    fn test_load_system_font() {
        let Some(path) = system_font_path() else {
            eprintln!("no system font available, skipping");
            return;
        };
        let handle = FontHandle::load(&path).unwrap();
        assert_eq!(handle.path(), path.as_path());
        assert!(!handle.face().family.is_empty());
        assert!(handle.covers('A'));
        assert!(!handle.covers('\u{0378}'), "unassigned codepoint has no glyph");
        assert_eq!(handle.database().faces().count(), 1);
    }

    #[test]
    fn test_resolve_mode_not_requested() {
        let Some(path) = system_font_path() else { return };
        let handle = FontHandle::load(path).unwrap();
        let res = handle.resolve_mode(false);
        assert_eq!(res.mode, ShapingMode::Fallback);
        assert!(res.degraded.is_none(), "opting out is not a degradation");
    }

    #[test]
    fn test_resolve_mode_requested() {
        let Some(path) = system_font_path() else { return };
        let handle = FontHandle::load(path).unwrap();
        let res = handle.resolve_mode(true);
        if handle.has_layout_tables() && cfg!(feature = "advanced-shaping") {
            assert_eq!(res.mode, ShapingMode::Advanced);
            assert!(res.degraded.is_none());
        } else {
            assert_eq!(res.mode, ShapingMode::Fallback);
            assert!(res.degraded.is_some());
        }
    }

    #[test]
    fn test_resolve_mode_degrades_without_tables() {
        let Some(path) = system_font_path() else { return };
        let bytes = crate::testutil::strip_layout_tables(std::fs::read(&path).unwrap());
        let handle = FontHandle::from_bytes(&path, bytes).unwrap();
        assert!(!handle.has_layout_tables());
        let res = handle.resolve_mode(true);
        assert_eq!(res.mode, ShapingMode::Fallback);
        assert!(res.degraded.unwrap().contains("GSUB"));
    }
}
