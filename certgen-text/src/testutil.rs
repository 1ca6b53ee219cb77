//! Helpers shared by the unit tests of this crate.

use cosmic_text::fontdb;
use std::path::PathBuf;

const PREFERRED: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
];

/// A Latin-capable system font with OpenType tables, if the host has one.
pub(crate) fn system_font_path() -> Option<PathBuf> {
    if let Some(path) = PREFERRED.iter().map(PathBuf::from).find(|p| p.is_file()) {
        return Some(path);
    }
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let found = db
        .faces()
        .filter(|face| face.index == 0)
        .filter(|face| {
            face.families
                .iter()
                .any(|(name, _)| name.contains("Sans") && !name.contains("Mono"))
        })
        .find_map(|face| match &face.source {
            fontdb::Source::File(path) => Some(path.clone()),
            _ => None,
        });
    found
}

/// A font covering Gujarati, if installed.
pub(crate) fn gujarati_font_path() -> Option<PathBuf> {
    [
        "/usr/share/fonts/truetype/noto/NotoSansGujarati-Regular.ttf",
        "/usr/share/fonts/noto/NotoSansGujarati-Regular.ttf",
        "/usr/share/fonts/truetype/lohit-gujarati/Lohit-Gujarati.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.is_file())
}

/// Rename the GSUB and GPOS table tags so the font loads without layout
/// tables. The new tags keep the table directory sorted.
pub(crate) fn strip_layout_tables(mut data: Vec<u8>) -> Vec<u8> {
    let num_tables = u16::from_be_bytes([data[4], data[5]]) as usize;
    for i in 0..num_tables {
        let at = 12 + i * 16;
        let tag = [data[at], data[at + 1], data[at + 2], data[at + 3]];
        match &tag {
            b"GSUB" => data[at + 3] = b'A',
            b"GPOS" => data[at + 3] = b'R',
            _ => {}
        }
    }
    data
}
