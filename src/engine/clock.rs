//! Frame clock: decouples fixed physics substeps from display frames.
//!
//! Each host frame reports its wall-clock delta. The clock:
//! - clamps the delta to `[0, max_frame_dt]` (tab resume, debugger pauses)
//! - scales it by `time_scale` (slow motion below 1, time warp above 1)
//! - adds it to an accumulator and hands out whole substeps
//!
//! The remainder smaller than one substep carries into the next frame, so
//! integration accuracy does not depend on the display frame rate and the
//! number of substeps per frame is bounded by [`FrameClock::max_substeps_per_frame`].

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, SimResult};

/// Default wall-clock clamp per frame (s).
pub const DEFAULT_MAX_FRAME_DT: f64 = 0.05;

/// Fixed-substep accumulator clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    substep: f64,
    max_frame_dt: f64,
    time_scale: f64,
    accumulator: f64,
}

impl FrameClock {
    /// Create a clock.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any argument is not positive.
    pub fn new(substep: f64, max_frame_dt: f64, time_scale: f64) -> SimResult<Self> {
        Ok(Self {
            substep: require_positive("clock.substep", substep)?,
            max_frame_dt: require_positive("clock.max_frame_dt", max_frame_dt)?,
            time_scale: require_positive("clock.time_scale", time_scale)?,
            accumulator: 0.0,
        })
    }

    /// Physics substep (s of simulated time).
    #[must_use]
    pub const fn substep(&self) -> f64 {
        self.substep
    }

    /// Wall-clock clamp per frame (s).
    #[must_use]
    pub const fn max_frame_dt(&self) -> f64 {
        self.max_frame_dt
    }

    /// Simulated seconds per wall-clock second.
    #[must_use]
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Simulated time waiting for the next substep (s).
    #[must_use]
    pub const fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Upper bound on substeps a single frame can produce.
    #[must_use]
    pub fn max_substeps_per_frame(&self) -> usize {
        (self.max_frame_dt * self.time_scale / self.substep).ceil() as usize + 1
    }

    /// Consume one frame of wall-clock time.
    ///
    /// Returns the number of whole substeps to execute. Negative or
    /// non-finite deltas count as zero.
    pub fn advance(&mut self, elapsed: f64) -> usize {
        let frame = if elapsed.is_finite() {
            elapsed.clamp(0.0, self.max_frame_dt)
        } else {
            0.0
        };
        self.accumulator += frame * self.time_scale;

        let mut substeps = 0;
        // relative slack so that e.g. 4 × 1/240 reliably fills 1/60
        let threshold = self.substep * (1.0 - 1e-9);
        while self.accumulator >= threshold {
            self.accumulator = (self.accumulator - self.substep).max(0.0);
            substeps += 1;
        }
        substeps
    }

    /// Drop any partially accumulated time.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
