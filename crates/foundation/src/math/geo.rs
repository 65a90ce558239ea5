use super::Vec3;

/// Angular tolerance in radians. Great-circle helpers work on the unit sphere.
pub const EPSILON: f64 = 1e-6;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn from_array(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    pub fn to_radians(self) -> (f64, f64) {
        (self.lon.to_radians(), self.lat.to_radians())
    }

    pub fn from_radians(lambda: f64, phi: f64) -> Self {
        Self::new(lambda.to_degrees(), phi.to_degrees())
    }

    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    pub fn to_cartesian(self) -> Vec3 {
        let (lambda, phi) = self.to_radians();
        let cos_phi = phi.cos();
        Vec3::new(cos_phi * lambda.cos(), cos_phi * lambda.sin(), phi.sin())
    }

    pub fn from_cartesian(v: Vec3) -> Self {
        let v = v.normalize();
        Self::from_radians(v.y.atan2(v.x), v.z.clamp(-1.0, 1.0).asin())
    }
}

/// Wrap a longitude in degrees to [-180, 180).
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Return `target` shifted by whole turns so it lies within 180° of `reference`.
pub fn nearest_longitude(reference: f64, target: f64) -> f64 {
    reference + wrap_longitude(target - reference)
}

/// Great-circle distance in degrees.
pub fn angular_distance(a: LonLat, b: LonLat) -> f64 {
    let (l1, p1) = a.to_radians();
    let (l2, p2) = b.to_radians();
    let sin_dphi = ((p2 - p1) / 2.0).sin();
    let sin_dlambda = ((l2 - l1) / 2.0).sin();
    let h = sin_dphi * sin_dphi + p1.cos() * p2.cos() * sin_dlambda * sin_dlambda;
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

/// Point reached from `origin` after travelling `distance_deg` along `azimuth_deg`
/// (clockwise from north).
pub fn destination(origin: LonLat, azimuth_deg: f64, distance_deg: f64) -> LonLat {
    let (lambda1, phi1) = origin.to_radians();
    let theta = azimuth_deg.to_radians();
    let delta = distance_deg.to_radians();

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let (sin_delta, cos_delta) = delta.sin_cos();

    let sin_phi2 = (sin_phi1 * cos_delta + cos_phi1 * sin_delta * theta.cos()).clamp(-1.0, 1.0);
    let phi2 = sin_phi2.asin();
    let lambda2 =
        lambda1 + (theta.sin() * sin_delta * cos_phi1).atan2(cos_delta - sin_phi1 * sin_phi2);

    LonLat::from_radians(lambda2, phi2)
}

/// Spherical linear interpolation between two points, `t` in [0, 1].
pub fn interpolate_great_circle(a: LonLat, b: LonLat, t: f64) -> LonLat {
    let va = a.to_cartesian();
    let vb = b.to_cartesian();
    let omega = va.dot(vb).clamp(-1.0, 1.0).acos();
    if omega.abs() < EPSILON {
        return a;
    }
    let sin_omega = omega.sin();
    let wa = ((1.0 - t) * omega).sin() / sin_omega;
    let wb = (t * omega).sin() / sin_omega;
    LonLat::from_cartesian(va.scale(wa) + vb.scale(wb))
}
