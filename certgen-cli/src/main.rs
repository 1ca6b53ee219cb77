//! certgen: batch certificate generator.
//!
//! Reads a template image and a list of names, renders one certificate
//! per name with `certgen-render`, and writes the images plus a JSON
//! manifest into the output directory.

mod args;
mod output;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;

use args::{Args, FileConfig};
use certgen_core::NameEntry;
use certgen_render::{CancelToken, CertificateRenderer, RendererOptions, Template};
use certgen_text::{parse_names, FontRegistry};

fn read_names(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("reading names from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading names {}", path.display()))
}

fn has_gujarati(entries: &[NameEntry]) -> bool {
    entries
        .iter()
        .any(|e| e.display.chars().any(|c| ('\u{0A80}'..='\u{0AFF}').contains(&c)))
}

/// Pick the font file: explicit path, then family name, then a font
/// covering the names' script, then the system sans-serif.
fn resolve_font(args: &Args, file: &FileConfig, entries: &[NameEntry]) -> Result<PathBuf> {
    if let Some(path) = args.explicit_font(file) {
        return Ok(path);
    }

    let registry = FontRegistry::discover();
    info!("{}", registry);

    if let Some(family) = &args.family {
        return registry
            .resolve_family(family)
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("font family {family:?} is not installed"));
    }
    if has_gujarati(entries) {
        if let Some(path) = registry.find_gujarati() {
            return Ok(path);
        }
    }
    registry
        .resolve_family("sans-serif")
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("no usable system font found; pass --font"))
}

fn run(args: Args) -> Result<()> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let template_bytes = std::fs::read(&args.template)
        .with_context(|| format!("reading template {}", args.template.display()))?;
    let template = Template::decode(&template_bytes)
        .with_context(|| format!("decoding template {}", args.template.display()))?;

    let entries = parse_names(&read_names(&args.names)?, args.sort);
    info!("{} names from {}", entries.len(), args.names.display());

    let font_path = resolve_font(&args, &file, &entries)?;
    let config = args.render_config(&file, font_path)?;

    let renderer = CertificateRenderer::new(RendererOptions {
        workers: args.jobs,
        cache_capacity: args.cache,
    })?;
    let result = renderer.render_entries(&template, &config, entries, &CancelToken::new())?;

    for warning in &result.warnings {
        log::warn!("{}", warning);
    }
    let manifest = output::write_batch(&args.out, &result, &args.format)?;

    println!(
        "{} certificates written to {} ({} failed, {} shaping)",
        manifest.certificates.len(),
        args.out.display(),
        manifest.failures.len(),
        manifest.mode,
    );
    for failure in &manifest.failures {
        eprintln!("  #{} {}: {}", failure.index + 1, failure.name, failure.error);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gujarati_detection() {
        let latin = [NameEntry::new(0, "a", "Ada")];
        let mixed = [NameEntry::new(0, "a", "Ada"), NameEntry::new(1, "g", "ગોર શશીકાંત")];
        assert!(!has_gujarati(&latin));
        assert!(has_gujarati(&mixed));
    }

    #[test]
    fn test_explicit_font_skips_discovery() {
        let args = Args::try_parse_from([
            "certgen", "--template", "t", "--names", "n", "--out", "o", "--font", "x.ttf",
        ])
        .unwrap();
        let path = resolve_font(&args, &FileConfig::default(), &[]).unwrap();
        assert_eq!(path, PathBuf::from("x.ttf"));
    }

    #[test]
    fn test_end_to_end() {
        let Some(font) = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file()) else {
            return;
        };

        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.png");
        image::RgbaImage::from_pixel(400, 200, image::Rgba([255, 255, 255, 255]))
            .save(&template)
            .unwrap();
        let names = dir.path().join("names.txt");
        std::fs::write(&names, "zoe adams\n\nbob \u{0378}\nalice smith\n").unwrap();
        let out = dir.path().join("out");

        let argv: Vec<std::ffi::OsString> = vec![
            "certgen".into(),
            "--template".into(),
            template.into(),
            "--names".into(),
            names.into(),
            "--font".into(),
            font.into(),
            "--y".into(),
            "120".into(),
            "--format".into(),
            "png,jpg".into(),
            "--sort".into(),
            "--jobs".into(),
            "2".into(),
            "--out".into(),
            out.clone().into(),
        ];
        let args = Args::try_parse_from(argv).unwrap();
        run(args).unwrap();

        // Sorted by display text; "Bob \u{0378}" takes slot 2 and fails.
        assert!(out.join("cert_1_Alice_Smith.png").is_file());
        assert!(out.join("cert_1_Alice_Smith.jpg").is_file());
        assert!(out.join("cert_3_Zoe_Adams.png").is_file());
        assert!(!out.join("cert_2_Bob__.png").exists());
        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();
        assert_eq!(manifest["certificates"].as_array().unwrap().len(), 2);
        assert_eq!(manifest["failures"].as_array().unwrap().len(), 1);
    }
}
