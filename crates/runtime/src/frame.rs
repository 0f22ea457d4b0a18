/// One tick of the host's animation loop.
///
/// Frames carry a fixed step so a run of ticks rotates the globe by the same
/// amount every time it is replayed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    /// Seconds covered by this tick.
    pub dt_s: f64,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        let dt_s = if dt_s.is_finite() && dt_s > 0.0 { dt_s } else { 0.0 };
        Self { index, dt_s }
    }

    pub fn first(dt_s: f64) -> Self {
        Self::new(0, dt_s)
    }

    /// First frame of a loop running at `fps`; a non-positive rate yields
    /// frames that do not advance time.
    pub fn at_fps(fps: f64) -> Self {
        if fps.is_finite() && fps > 0.0 {
            Self::first(1.0 / fps)
        } else {
            Self::first(0.0)
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }

    /// Seconds since the first frame started.
    pub fn elapsed_s(&self) -> f64 {
        self.index as f64 * self.dt_s
    }
}
