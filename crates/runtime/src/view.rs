use tracing::trace;

use crate::frame::Frame;

/// Zoom limits and starting zoom, as multiples of the globe radius.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
    pub initial: f64,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 2.5,
            initial: 1.25,
        }
    }
}

impl ZoomBounds {
    pub fn clamp(&self, zoom: f64) -> f64 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        zoom.clamp(lo, hi)
    }
}

pub const DEFAULT_ROTATION: [f64; 2] = [0.0, -25.0];

/// Rotation and zoom state of the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobeView {
    radius: f64,
    bounds: ZoomBounds,
    scale: f64,
    rotation: [f64; 2],
    initial_rotation: [f64; 2],
}

impl GlobeView {
    pub fn new(radius: f64, bounds: ZoomBounds, rotation: [f64; 2]) -> Self {
        Self {
            radius,
            bounds,
            scale: radius * bounds.clamp(bounds.initial),
            rotation,
            initial_rotation: rotation,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Projection scale in pixels.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotation(&self) -> [f64; 2] {
        self.rotation
    }

    /// Current scale relative to the unzoomed globe.
    pub fn zoom_scale(&self) -> f64 {
        if self.radius > 0.0 {
            self.scale / self.radius
        } else {
            1.0
        }
    }

    /// Multiplies the zoom by `factor`, clamped to the bounds.
    pub fn zoom(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.set_zoom(self.zoom_scale() * factor);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.scale = self.radius * self.bounds.clamp(zoom);
    }

    pub fn rotate_to(&mut self, rotation: [f64; 2]) {
        self.rotation = rotation;
    }

    /// Spins the globe by `degrees_per_second` over the frame's duration.
    pub fn advance(&mut self, frame: &Frame, degrees_per_second: f64) {
        if degrees_per_second == 0.0 || !degrees_per_second.is_finite() {
            return;
        }
        self.rotation[0] = (self.rotation[0] + frame.dt_s * degrees_per_second) % 360.0;
        trace!(frame = frame.index, lambda = self.rotation[0], "globe rotated");
    }

    /// Back to the initial zoom and rotation.
    pub fn reset(&mut self) {
        self.rotation = self.initial_rotation;
        self.set_zoom(self.bounds.initial);
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_ROTATION, GlobeView, ZoomBounds};
    use crate::frame::Frame;

    fn view() -> GlobeView {
        GlobeView::new(200.0, ZoomBounds::default(), DEFAULT_ROTATION)
    }

    #[test]
    fn starts_at_initial_zoom() {
        let v = view();
        assert_eq!(v.scale(), 250.0);
        assert_eq!(v.zoom_scale(), 1.25);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut v = view();
        v.zoom(100.0);
        assert_eq!(v.zoom_scale(), 2.5);
        v.zoom(0.0001);
        assert_eq!(v.zoom_scale(), 0.5);
        v.zoom(-1.0);
        assert_eq!(v.zoom_scale(), 0.5);
    }

    #[test]
    fn advance_uses_frame_duration() {
        let mut v = view();
        let frame = Frame::new(3, 0.5);
        v.advance(&frame, 10.0);
        assert_eq!(v.rotation(), [5.0, -25.0]);
        v.advance(&frame, 0.0);
        assert_eq!(v.rotation(), [5.0, -25.0]);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut v = view();
        v.zoom(2.0);
        v.advance(&Frame::new(0, 1.0), 45.0);
        v.reset();
        assert_eq!(v, view());
    }
}
