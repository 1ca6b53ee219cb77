//! Batch inputs and results.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use certgen_core::NameEntry;
use certgen_layout::Placement;
use certgen_text::{ShapeError, ShapingMode};
use image::{DynamicImage, ImageError, RgbaImage};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Decoded certificate background. Cheap to clone; never mutated.
#[derive(Clone, Debug)]
pub struct Template {
    image: Arc<RgbaImage>,
}

impl Template {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.into_rgba8())
    }

    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        Ok(Self::from_dynamic(image::load_from_memory(bytes)?))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl From<RgbaImage> for Template {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}

/// Lifecycle of one batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Validating,
    Rendering { done: usize, total: usize },
    Complete,
    Failed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Idle => write!(f, "idle"),
            BatchState::Validating => write!(f, "validating"),
            BatchState::Rendering { done, total } => write!(f, "rendering {done}/{total}"),
            BatchState::Complete => write!(f, "complete"),
            BatchState::Failed => write!(f, "failed"),
        }
    }
}

/// Non-fatal findings reported alongside the rendered batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchWarning {
    /// Advanced shaping was requested but the batch ran in fallback.
    ShapingDegraded { reason: String },
    /// A name is wider than the canvas and was clipped.
    Overflow {
        index: usize,
        run_width: i32,
        canvas_width: u32,
    },
}

impl fmt::Display for BatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchWarning::ShapingDegraded { reason } => {
                write!(f, "shaping degraded to fallback: {reason}")
            }
            BatchWarning::Overflow {
                index,
                run_width,
                canvas_width,
            } => write!(
                f,
                "name #{} is {}px wide on a {}px canvas",
                index + 1,
                run_width,
                canvas_width
            ),
        }
    }
}

/// Why a single name was not rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("batch was cancelled")]
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct RenderedCertificate {
    pub entry: NameEntry,
    pub image: RgbaImage,
    pub origin: Placement,
    pub run_width: i32,
    pub glyph_count: usize,
}

#[derive(Clone, Debug)]
pub enum EntryOutcome {
    Rendered(RenderedCertificate),
    Failed { entry: NameEntry, error: EntryError },
}

impl EntryOutcome {
    pub fn entry(&self) -> &NameEntry {
        match self {
            EntryOutcome::Rendered(cert) => &cert.entry,
            EntryOutcome::Failed { entry, .. } => entry,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, EntryOutcome::Rendered(_))
    }
}

/// Result of a batch: one outcome per input name, in input order.
#[derive(Clone, Debug)]
pub struct BatchResult {
    pub id: Uuid,
    pub outcomes: Vec<EntryOutcome>,
    pub warnings: Vec<BatchWarning>,
    /// Mode every name was shaped with.
    pub mode: ShapingMode,
    pub state: BatchState,
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn succeeded(&self) -> impl Iterator<Item = &RenderedCertificate> {
        self.outcomes.iter().filter_map(|o| match o {
            EntryOutcome::Rendered(cert) => Some(cert),
            EntryOutcome::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&NameEntry, &EntryError)> {
        self.outcomes.iter().filter_map(|o| match o {
            EntryOutcome::Failed { entry, error } => Some((entry, error)),
            EntryOutcome::Rendered(_) => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn is_degraded(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, BatchWarning::ShapingDegraded { .. }))
    }
}
