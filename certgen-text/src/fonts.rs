//! Font registry: system font discovery and lookup by family or script.
//!
//! Wraps `font-kit` for OS-level font enumeration and caches the result in
//! a hash map keyed by lowercase family name. Used by front ends to turn a
//! user-facing font choice ("arial", "sans-serif", "gujarati") into a font
//! file path for [`RenderConfig`](certgen_core::RenderConfig).
//!
//! ```text
//! FontRegistry
//!   ├── families: HashMap<String, Vec<FontFace>>   (cached)
//!   ├── generic_map: HashMap<GenericFamily, String>
//!   ├── resolve_family(name)          → Option<PathBuf>
//!   └── find_covering(chars, keywords) → Option<PathBuf>
//! ```

use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::{Properties as FkProperties, Style as FkStyle};
use font_kit::source::SystemSource;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Characters probed to decide whether a font can render Gujarati.
pub const GUJARATI_PROBE: [char; 5] = ['અ', 'ક', 'ગ', 'જ', 'ન'];

/// Family-name fragments that usually indicate Gujarati coverage.
pub const GUJARATI_KEYWORDS: [&str; 10] = [
    "gujarati", "gujrati", "shruti", "shvruti", "lohit", "mukta", "noto", "prabhki", "rekha",
    "kalapi",
];

/// Font style (normal, italic, or oblique).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// Generic families a user can ask for instead of a concrete name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    Serif,
    SansSerif,
    Monospace,
    Cursive,
}

/// A single face on disk.
#[derive(Clone, Debug)]
pub struct FontFace {
    pub postscript_name: String,
    pub path: PathBuf,
    /// Weight (100–900).
    pub weight: u16,
    pub style: FontStyle,
}

/// System font registry with cached discovery.
pub struct FontRegistry {
    /// Family name (lowercase) → faces stored as standalone files.
    families: HashMap<String, Vec<FontFace>>,
    generic_map: HashMap<GenericFamily, String>,
    discovery_time_ms: f64,
    face_count: usize,
}

impl FontRegistry {
    /// Enumerate system fonts. I/O bound; call once per process.
    ///
    /// Only faces at index 0 of a file are kept, since the renderer loads
    /// fonts by path.
    pub fn discover() -> Self {
        let start = Instant::now();
        let source = SystemSource::new();

        let mut families: HashMap<String, Vec<FontFace>> = HashMap::new();
        let mut face_count = 0usize;

        if let Ok(family_names) = source.all_families() {
            for family_name in &family_names {
                let Ok(family_handle) = source.select_family_by_name(family_name) else {
                    continue;
                };
                let mut faces = Vec::new();
                for handle in family_handle.fonts() {
                    let path = match handle {
                        Handle::Path { path, font_index: 0 } => path.clone(),
                        _ => continue,
                    };
                    if let Ok(font) = handle.load() {
                        let props = font.properties();
                        faces.push(FontFace {
                            postscript_name: font.postscript_name().unwrap_or_default(),
                            path,
                            weight: props.weight.0 as u16,
                            style: convert_style(props.style),
                        });
                        face_count += 1;
                    }
                }
                if !faces.is_empty() {
                    families.insert(family_name.to_lowercase(), faces);
                }
            }
        }

        let generic_map = resolve_generics(&source);

        let discovery_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::info!(
            "FontRegistry: discovered {} faces in {} families ({:.1}ms)",
            face_count,
            families.len(),
            discovery_time_ms,
        );

        Self {
            families,
            generic_map,
            discovery_time_ms,
            face_count,
        }
    }

    /// Build a registry from an explicit face list. Used by tests and by
    /// callers that ship their own fonts.
    pub fn from_faces(entries: impl IntoIterator<Item = (String, FontFace)>) -> Self {
        let mut families: HashMap<String, Vec<FontFace>> = HashMap::new();
        let mut face_count = 0;
        for (family, face) in entries {
            families.entry(family.to_lowercase()).or_default().push(face);
            face_count += 1;
        }
        Self {
            families,
            generic_map: HashMap::new(),
            discovery_time_ms: 0.0,
            face_count,
        }
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_count
    }

    pub fn discovery_time_ms(&self) -> f64 {
        self.discovery_time_ms
    }

    /// All family names, sorted.
    pub fn all_families(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_family(&self, name: &str) -> bool {
        self.families.contains_key(&name.to_lowercase())
    }

    pub fn get_faces(&self, family: &str) -> Option<&[FontFace]> {
        self.families.get(&family.to_lowercase()).map(|v| v.as_slice())
    }

    pub fn resolve_generic(&self, generic: GenericFamily) -> Option<&str> {
        self.generic_map.get(&generic).map(|s| s.as_str())
    }

    /// Resolve a family name or generic keyword to the regular face's path.
    pub fn resolve_family(&self, name: &str) -> Option<&Path> {
        let key = name.trim().to_lowercase();
        let family = match parse_generic(&key) {
            Some(generic) => self.generic_map.get(&generic)?.clone(),
            None => key,
        };
        let faces = self.families.get(&family)?;
        Some(regular_face(faces).path.as_path())
    }

    /// Families whose name contains any of `keywords` (case-insensitive),
    /// sorted.
    pub fn search(&self, keywords: &[&str]) -> Vec<&str> {
        let mut hits: Vec<&str> = self
            .families
            .keys()
            .filter(|family| keywords.iter().any(|k| family.contains(&k.to_lowercase())))
            .map(|s| s.as_str())
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Find a font that has a glyph for at least one of `probe`.
    ///
    /// Families matching `keywords` are tried first, then every other
    /// family in name order.
    pub fn find_covering(&self, probe: &[char], keywords: &[&str]) -> Option<PathBuf> {
        let preferred = self.search(keywords);
        let rest = self
            .all_families()
            .into_iter()
            .filter(|f| !preferred.contains(&f.as_str()))
            .collect::<Vec<_>>();

        let candidates = preferred
            .iter()
            .copied()
            .chain(rest.iter().map(|s| s.as_str()));

        for family in candidates {
            let Some(faces) = self.families.get(family) else {
                continue;
            };
            let face = regular_face(faces);
            if face_covers(&face.path, probe) {
                log::info!("Font {} covers probe characters", face.path.display());
                return Some(face.path.clone());
            }
        }
        log::warn!("No installed font covers {:?}", probe);
        None
    }

    /// Shortcut for [`find_covering`](Self::find_covering) with the Gujarati probe.
    pub fn find_gujarati(&self) -> Option<PathBuf> {
        self.find_covering(&GUJARATI_PROBE, &GUJARATI_KEYWORDS)
    }
}

impl fmt::Display for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FontRegistry({} families, {} faces, {:.1}ms)",
            self.families.len(),
            self.face_count,
            self.discovery_time_ms,
        )
    }
}

/// Face closest to weight 400, upright style.
fn regular_face(faces: &[FontFace]) -> &FontFace {
    debug_assert!(!faces.is_empty());
    faces
        .iter()
        .min_by_key(|face| match_score(face))
        .unwrap_or(&faces[0])
}

/// Lower is better. Style dominates, then distance from weight 400.
fn match_score(face: &FontFace) -> u32 {
    let style_diff = match face.style {
        FontStyle::Normal => 0,
        FontStyle::Oblique => 1,
        FontStyle::Italic => 2,
    };
    style_diff * 1000 + (face.weight as i32 - 400).unsigned_abs()
}

fn face_covers(path: &Path, probe: &[char]) -> bool {
    match Handle::from_path(path.to_path_buf(), 0).load() {
        Ok(font) => probe
            .iter()
            .any(|&c| font.glyph_for_char(c).is_some_and(|id| id != 0)),
        Err(e) => {
            log::debug!("Skipping {}: {}", path.display(), e);
            false
        }
    }
}

fn parse_generic(name: &str) -> Option<GenericFamily> {
    match name {
        "serif" => Some(GenericFamily::Serif),
        "sans-serif" => Some(GenericFamily::SansSerif),
        "monospace" => Some(GenericFamily::Monospace),
        "cursive" => Some(GenericFamily::Cursive),
        _ => None,
    }
}

fn convert_style(style: FkStyle) -> FontStyle {
    match style {
        FkStyle::Normal => FontStyle::Normal,
        FkStyle::Italic => FontStyle::Italic,
        FkStyle::Oblique => FontStyle::Oblique,
    }
}

fn resolve_generics(source: &SystemSource) -> HashMap<GenericFamily, String> {
    let mut map = HashMap::new();
    let props = FkProperties::new();

    let generics = [
        (GenericFamily::Serif, FamilyName::Serif),
        (GenericFamily::SansSerif, FamilyName::SansSerif),
        (GenericFamily::Monospace, FamilyName::Monospace),
        (GenericFamily::Cursive, FamilyName::Cursive),
    ];

    for (generic, fk_name) in &generics {
        if let Ok(handle) = source.select_best_match(&[fk_name.clone()], &props) {
            if let Ok(font) = handle.load() {
                let name = font.family_name();
                if !name.is_empty() {
                    map.insert(*generic, name.to_lowercase());
                }
            }
        }
    }

    map
}
