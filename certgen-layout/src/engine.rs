use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("canvas has no width")]
    EmptyCanvas,
    #[error("baseline {y} is below the canvas height {height}")]
    BaselineOutOfRange { y: u32, height: u32 },
}

/// Pen origin for a glyph run: left edge of the run and its baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

impl Placement {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True when a run of `run_width` starting here leaves the canvas.
    pub fn overflows(&self, run_width: i32, canvas_width: u32) -> bool {
        self.x < 0 || self.x as i64 + run_width as i64 > canvas_width as i64
    }
}

/// Center a run of `run_width` pixels on a canvas `canvas_width` wide,
/// with the baseline at `y_position`.
///
/// Floor division keeps the result stable for odd remainders and for
/// runs wider than the canvas (negative `x`).
pub fn layout(run_width: i32, canvas_width: u32, y_position: u32) -> Result<Placement, LayoutError> {
    if canvas_width == 0 {
        return Err(LayoutError::EmptyCanvas);
    }
    let free = canvas_width as i64 - run_width as i64;
    let x = free.div_euclid(2) as i32;
    Ok(Placement::new(x, y_position as i32))
}

/// Layout for a fixed canvas and baseline, reused for every name of a
/// batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEngine {
    canvas_width: u32,
    canvas_height: u32,
    baseline: u32,
}

impl LayoutEngine {
    pub fn new(canvas_width: u32, canvas_height: u32, baseline: u32) -> Result<Self, LayoutError> {
        if canvas_width == 0 || canvas_height == 0 {
            return Err(LayoutError::EmptyCanvas);
        }
        if baseline > canvas_height {
            return Err(LayoutError::BaselineOutOfRange {
                y: baseline,
                height: canvas_height,
            });
        }
        Ok(Self {
            canvas_width,
            canvas_height,
            baseline,
        })
    }

    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }

    /// Place a run. Overflow is allowed and only logged.
    pub fn place(&self, run_width: i32) -> Placement {
        let free = self.canvas_width as i64 - run_width as i64;
        let placement = Placement::new(free.div_euclid(2) as i32, self.baseline as i32);
        if placement.overflows(run_width, self.canvas_width) {
            log::warn!(
                "Run of {}px overflows {}px canvas (x = {})",
                run_width,
                self.canvas_width,
                placement.x,
            );
        }
        placement
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_placement() {
        let p = layout(400, 1000, 400).unwrap();
        assert_eq!(p, Placement::new(300, 400));
    }

    #[test]
    fn test_odd_remainder_floors() {
        assert_eq!(layout(401, 1000, 0).unwrap().x, 299);
        assert_eq!(layout(400, 1001, 0).unwrap().x, 300);
    }

    #[test]
    fn test_centering_invariant() {
        for canvas in [1u32, 2, 99, 640, 1000, 1001] {
            for width in 0..=canvas as i32 {
                let p = layout(width, canvas, 10).unwrap();
                let center_twice = 2 * p.x + width;
                assert!(
                    (center_twice - canvas as i32).abs() <= 1,
                    "canvas {canvas}, width {width}, x {}",
                    p.x
                );
                assert!(!p.overflows(width, canvas));
            }
        }
    }

    #[test]
    fn test_overflow_is_negative() {
        let p = layout(1200, 1000, 50).unwrap();
        assert_eq!(p.x, -100);
        assert!(p.overflows(1200, 1000));

        // Odd overflow floors towards negative infinity.
        assert_eq!(layout(1001, 1000, 0).unwrap().x, -1);
    }

    #[test]
    fn test_y_is_unmodified() {
        for y in [0, 1, 350, 700] {
            assert_eq!(layout(10, 100, y).unwrap().y, y as i32);
        }
    }

    #[test]
    fn test_empty_canvas() {
        assert_eq!(layout(10, 0, 0), Err(LayoutError::EmptyCanvas));
        assert_eq!(LayoutEngine::new(0, 10, 0), Err(LayoutError::EmptyCanvas));
        assert_eq!(LayoutEngine::new(10, 0, 0), Err(LayoutError::EmptyCanvas));
    }

    #[test]
    fn test_engine_matches_function() {
        let engine = LayoutEngine::new(1000, 700, 400).unwrap();
        assert_eq!(engine.canvas_width(), 1000);
        assert_eq!(engine.canvas_height(), 700);
        for width in [0, 1, 333, 999, 1000, 1500] {
            assert_eq!(engine.place(width), layout(width, 1000, 400).unwrap());
        }
    }

    #[test]
    fn test_engine_baseline_range() {
        assert!(LayoutEngine::new(100, 100, 100).is_ok());
        assert_eq!(
            LayoutEngine::new(100, 100, 101),
            Err(LayoutError::BaselineOutOfRange { y: 101, height: 100 })
        );
    }
}
