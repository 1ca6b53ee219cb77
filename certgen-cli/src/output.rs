//! Writing certificates and the batch manifest to disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use certgen_render::{BatchResult, BatchWarning, RenderedCertificate};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use serde::Serialize;

use crate::args::OutputFormat;

const JPEG_QUALITY: u8 = 100;
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub batch_id: String,
    pub mode: String,
    pub elapsed_ms: u64,
    pub certificates: Vec<ManifestEntry>,
    pub failures: Vec<ManifestFailure>,
    pub warnings: Vec<BatchWarning>,
}

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub index: usize,
    pub name: String,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ManifestFailure {
    pub index: usize,
    pub name: String,
    pub error: String,
}

/// Encode one certificate in every requested format. Returns the file
/// names written, relative to `dir`.
pub fn write_certificate(
    dir: &Path,
    cert: &RenderedCertificate,
    formats: &[OutputFormat],
) -> Result<Vec<String>> {
    let stem = cert.entry.file_stem();
    let mut files = Vec::with_capacity(formats.len());
    for &format in formats {
        let name = format!("{}.{}", stem, format.extension());
        let path = dir.join(&name);
        match format {
            OutputFormat::Png => cert
                .image
                .save_with_format(&path, ImageFormat::Png)
                .with_context(|| format!("writing {}", path.display()))?,
            OutputFormat::Jpg => {
                let file =
                    File::create(&path).with_context(|| format!("creating {}", path.display()))?;
                encode_jpeg(BufWriter::new(file), cert)
                    .with_context(|| format!("encoding {}", path.display()))?
            }
            OutputFormat::Pdf => {
                let mut jpeg = Vec::new();
                encode_jpeg(&mut jpeg, cert)
                    .with_context(|| format!("encoding {}", path.display()))?;
                let pdf = single_page_pdf(&jpeg, cert.image.width(), cert.image.height());
                std::fs::write(&path, pdf).with_context(|| format!("writing {}", path.display()))?
            }
        }
        files.push(name);
    }
    Ok(files)
}

fn encode_jpeg<W: Write>(out: W, cert: &RenderedCertificate) -> image::ImageResult<()> {
    // JPEG has no alpha channel.
    let rgb: RgbImage = cert.image.convert();
    JpegEncoder::new_with_quality(out, JPEG_QUALITY).encode_image(&rgb)
}

/// Wrap a JPEG in a one-page PDF, one point per pixel. The JPEG bytes
/// are embedded as-is behind `DCTDecode`.
fn single_page_pdf(jpeg: &[u8], width: u32, height: u32) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let content_id = Ref::new(5);
    let image_name = Name(b"Im1");
    let (w, h) = (width as f32, height as f32);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, w, h));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(image_name, image_id);
    page.finish();

    let mut image = pdf.image_xobject(image_id, jpeg);
    image.filter(Filter::DctDecode);
    image.width(width as i32);
    image.height(height as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.finish();

    let mut content = Content::new();
    content.save_state();
    content.transform([w, 0.0, 0.0, h, 0.0, 0.0]);
    content.x_object(image_name);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    pdf.finish()
}

/// Write every successful certificate plus `manifest.json` into `dir`.
pub fn write_batch(dir: &Path, result: &BatchResult, formats: &[OutputFormat]) -> Result<Manifest> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut certificates = Vec::new();
    for cert in result.succeeded() {
        let files = write_certificate(dir, cert, formats)?;
        log::debug!("Wrote {}", files.join(", "));
        certificates.push(ManifestEntry {
            index: cert.entry.index,
            name: cert.entry.display.clone(),
            files,
        });
    }

    let manifest = Manifest {
        batch_id: result.id.to_string(),
        mode: result.mode.to_string(),
        elapsed_ms: result.elapsed.as_millis() as u64,
        certificates,
        failures: result
            .failed()
            .map(|(entry, error)| ManifestFailure {
                index: entry.index,
                name: entry.display.clone(),
                error: error.to_string(),
            })
            .collect(),
        warnings: result.warnings.clone(),
    };

    let path: PathBuf = dir.join(MANIFEST_FILE);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &manifest)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use certgen_core::NameEntry;
    use certgen_render::{BatchState, EntryError, EntryOutcome, Placement};
    use certgen_text::ShapingMode;
    use image::{Rgba, RgbaImage};
    use std::time::Duration;
    use uuid::Uuid;

    fn cert(index: usize, display: &str) -> RenderedCertificate {
        RenderedCertificate {
            entry: NameEntry::new(index, display.to_lowercase(), display),
            image: RgbaImage::from_pixel(8, 4, Rgba([10, 200, 30, 255])),
            origin: Placement::new(1, 3),
            run_width: 6,
            glyph_count: 3,
        }
    }

    fn result() -> BatchResult {
        BatchResult {
            id: Uuid::new_v4(),
            outcomes: vec![
                EntryOutcome::Rendered(cert(0, "Ada Lovelace")),
                EntryOutcome::Failed {
                    entry: NameEntry::new(1, "x", "X"),
                    error: EntryError::Cancelled,
                },
                EntryOutcome::Rendered(cert(2, "Grace")),
            ],
            warnings: vec![BatchWarning::ShapingDegraded {
                reason: "no GSUB".into(),
            }],
            mode: ShapingMode::Fallback,
            state: BatchState::Complete,
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_png_and_jpeg_written() {
        let dir = tempfile::tempdir().unwrap();
        let files =
            write_certificate(dir.path(), &cert(0, "Ada Lovelace"), &[OutputFormat::Png, OutputFormat::Jpg])
                .unwrap();
        assert_eq!(files, vec!["cert_1_Ada_Lovelace.png", "cert_1_Ada_Lovelace.jpg"]);

        let png = image::open(dir.path().join(&files[0])).unwrap().into_rgba8();
        assert_eq!(*png.get_pixel(0, 0), Rgba([10, 200, 30, 255]));

        let jpg = image::open(dir.path().join(&files[1])).unwrap();
        assert_eq!((jpg.width(), jpg.height()), (8, 4));
    }

    #[test]
    fn test_pdf_embeds_jpeg_page() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_certificate(dir.path(), &cert(2, "Grace"), &[OutputFormat::Pdf]).unwrap();
        assert_eq!(files, vec!["cert_3_Grace.pdf"]);

        let bytes = std::fs::read(dir.path().join(&files[0])).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/DCTDecode"));
        assert!(text.contains("/MediaBox [0 0 8 4]"), "page matches the image size");
        assert!(text.contains("/Count 1"), "exactly one page");

        // The embedded stream is a decodable JPEG of the certificate.
        let soi = bytes.windows(3).position(|w| w == [0xFF, 0xD8, 0xFF]).unwrap();
        let eoi = bytes.windows(2).rposition(|w| w == [0xFF, 0xD9]).unwrap();
        let jpg = image::load_from_memory_with_format(&bytes[soi..eoi + 2], ImageFormat::Jpeg).unwrap();
        assert_eq!((jpg.width(), jpg.height()), (8, 4));
    }

    #[test]
    fn test_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let manifest = write_batch(&out, &result(), &[OutputFormat::Png, OutputFormat::Pdf]).unwrap();

        assert_eq!(manifest.certificates.len(), 2);
        assert_eq!(manifest.certificates[1].files, vec!["cert_3_Grace.png", "cert_3_Grace.pdf"]);
        assert_eq!(manifest.failures.len(), 1);
        assert_eq!(manifest.failures[0].index, 1);
        assert!(out.join("cert_1_Ada_Lovelace.png").is_file());
        assert!(out.join("cert_1_Ada_Lovelace.pdf").is_file());
        assert!(!out.join("cert_2_X.png").exists());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(json["mode"], "fallback");
        assert_eq!(json["failures"][0]["error"], "batch was cancelled");
        assert_eq!(json["warnings"][0]["kind"], "shaping_degraded");
        assert_eq!(json["elapsed_ms"], 12);
        assert_eq!(json["certificates"][0]["files"][1], "cert_1_Ada_Lovelace.pdf");
    }
}
