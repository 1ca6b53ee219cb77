//! # certgen-layout
//!
//! Places a shaped name on the certificate canvas: horizontally centered,
//! baseline at the configured y position.
//!
//! ```text
//!  x = floor((canvas_width - run_width) / 2)     (may be negative)
//!  y = y_position                                (baseline, unmodified)
//! ```

pub mod engine;

pub use engine::{layout, LayoutEngine, LayoutError, Placement};
