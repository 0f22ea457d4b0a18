use foundation::{LatLng, Vec2, rotate_lat_lng};

/// Maps geographic points to screen pixels.
pub trait Projector {
    /// `None` when the point is hidden, e.g. on the far side of the globe.
    fn project(&self, location: LatLng) -> Option<Vec2>;
}

/// Orthographic globe projection with back-hemisphere clipping.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthographicProjector {
    /// Globe radius in pixels.
    pub scale: f64,
    pub center: Vec2,
    /// `[lambda, phi]` rotation in degrees.
    pub rotation: [f64; 2],
}

impl OrthographicProjector {
    pub fn new(scale: f64, center: Vec2, rotation: [f64; 2]) -> Self {
        Self {
            scale,
            center,
            rotation,
        }
    }
}

impl Projector for OrthographicProjector {
    fn project(&self, location: LatLng) -> Option<Vec2> {
        if !location.is_finite() {
            return None;
        }
        let [x, y, z] = rotate_lat_lng(location, self.rotation).to_unit();
        if x <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            self.center.x + self.scale * y,
            self.center.y - self.scale * z,
        ))
    }
}
