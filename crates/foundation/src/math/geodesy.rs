/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat_deg: f64,
    pub lng_deg: f64,
}

impl LatLng {
    pub fn new(lat_deg: f64, lng_deg: f64) -> Self {
        Self { lat_deg, lng_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.lat_deg.is_finite() && self.lng_deg.is_finite()
    }

    /// Unit vector on the sphere; x points at (0°, 0°), z at the north pole.
    pub fn to_unit(&self) -> [f64; 3] {
        let lat = self.lat_deg.to_radians();
        let lng = self.lng_deg.to_radians();
        let cos_lat = lat.cos();
        [cos_lat * lng.cos(), cos_lat * lng.sin(), lat.sin()]
    }
}

/// Rotates a point by `[lambda, phi]` degrees.
///
/// Lambda spins the globe around its polar axis, phi then tilts it around the
/// axis through (0°, 90°E). After rotation the point facing the viewer is
/// (0°, 0°).
pub fn rotate_lat_lng(p: LatLng, rotation_deg: [f64; 2]) -> LatLng {
    let lambda = (p.lng_deg + rotation_deg[0]).to_radians();
    let phi = p.lat_deg.to_radians();
    let (sin_dphi, cos_dphi) = rotation_deg[1].to_radians().sin_cos();

    let cos_phi = phi.cos();
    let x = lambda.cos() * cos_phi;
    let y = lambda.sin() * cos_phi;
    let z = phi.sin();
    let k = z * cos_dphi + x * sin_dphi;

    let out_lambda = y.atan2(x * cos_dphi - z * sin_dphi);
    let out_phi = k.clamp(-1.0, 1.0).asin();
    LatLng::new(out_phi.to_degrees(), out_lambda.to_degrees())
}
