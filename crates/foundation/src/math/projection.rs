//! Spherical map projections composed the conventional way:
//! degrees -> rotation -> raw projection -> scale/translate (y down).
//!
//! Raw projections work in radians on the unit sphere. Inverses return `None`
//! wherever the raw inverse is undefined, so callers never see NaN coordinates.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use super::{EPSILON, LonLat, Vec2};

/// Latitude at which the Mercator world becomes a square (`atan(sinh(π))`).
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

pub trait RawProjection {
    fn forward(&self, lambda: f64, phi: f64) -> Option<(f64, f64)>;
    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)>;
}

/// Lambert azimuthal equal-area, centered on (0, 0).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct AzimuthalEqualAreaRaw;

impl RawProjection for AzimuthalEqualAreaRaw {
    fn forward(&self, lambda: f64, phi: f64) -> Option<(f64, f64)> {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let denom = 1.0 + cos_lambda * cos_phi;
        if denom <= EPSILON * EPSILON {
            // Antipode of the projection center.
            return None;
        }
        let k = (2.0 / denom).sqrt();
        Some((k * cos_phi * sin_lambda, k * sin_phi))
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let z = x.hypot(y);
        if !z.is_finite() || z > 2.0 + EPSILON {
            return None;
        }
        let c = 2.0 * (z / 2.0).min(1.0).asin();
        let (sc, cc) = c.sin_cos();
        let lambda = (x * sc).atan2(z * cc);
        let phi = if z == 0.0 {
            0.0
        } else {
            (y * sc / z).clamp(-1.0, 1.0).asin()
        };
        Some((lambda, phi))
    }
}

/// Spherical Mercator. Latitudes are clamped to the square-world limit.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MercatorRaw;

impl RawProjection for MercatorRaw {
    fn forward(&self, lambda: f64, phi: f64) -> Option<(f64, f64)> {
        let limit = MERCATOR_MAX_LAT.to_radians();
        let phi = phi.clamp(-limit, limit);
        Some((lambda, (FRAC_PI_4 + phi / 2.0).tan().ln()))
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some((x, 2.0 * y.exp().atan() - FRAC_PI_2))
    }
}

/// Three-axis spherical rotation `[λ, φ, γ]` in degrees.
///
/// λ turns the sphere about its polar axis, then φ tilts it about the y-axis
/// and γ rolls it about the x-axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation {
    angles: [f64; 3],
    delta_lambda: f64,
    sin_phi: f64,
    cos_phi: f64,
    sin_gamma: f64,
    cos_gamma: f64,
}

impl Rotation {
    pub fn new(angles: [f64; 3]) -> Self {
        let delta_lambda = angles[0].to_radians() % TAU;
        let (sin_phi, cos_phi) = angles[1].to_radians().sin_cos();
        let (sin_gamma, cos_gamma) = angles[2].to_radians().sin_cos();
        Self {
            angles,
            delta_lambda,
            sin_phi,
            cos_phi,
            sin_gamma,
            cos_gamma,
        }
    }

    pub fn identity() -> Self {
        Self::new([0.0, 0.0, 0.0])
    }

    pub fn angles(&self) -> [f64; 3] {
        self.angles
    }

    fn tilts(&self) -> bool {
        self.sin_phi != 0.0 || self.sin_gamma != 0.0 || self.cos_phi < 0.0 || self.cos_gamma < 0.0
    }

    /// Rotate a point given in radians.
    pub fn apply(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap_radians(lambda + self.delta_lambda);
        if !self.tilts() {
            return (lambda, phi);
        }
        let cos_p = phi.cos();
        let x = lambda.cos() * cos_p;
        let y = lambda.sin() * cos_p;
        let z = phi.sin();
        let k = z * self.cos_phi + x * self.sin_phi;
        (
            (y * self.cos_gamma - k * self.sin_gamma).atan2(x * self.cos_phi - z * self.sin_phi),
            (k * self.cos_gamma + y * self.sin_gamma).clamp(-1.0, 1.0).asin(),
        )
    }

    /// Undo [`Rotation::apply`].
    pub fn invert(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let (lambda, phi) = if self.tilts() {
            let cos_p = phi.cos();
            let x = lambda.cos() * cos_p;
            let y = lambda.sin() * cos_p;
            let z = phi.sin();
            let k = z * self.cos_gamma - y * self.sin_gamma;
            (
                (y * self.cos_gamma + z * self.sin_gamma).atan2(x * self.cos_phi + k * self.sin_phi),
                (k * self.cos_phi - x * self.sin_phi).clamp(-1.0, 1.0).asin(),
            )
        } else {
            (lambda, phi)
        };
        (wrap_radians(lambda - self.delta_lambda), phi)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

fn wrap_radians(lambda: f64) -> f64 {
    if lambda.abs() > PI {
        lambda - (lambda / TAU).round() * TAU
    } else {
        lambda
    }
}

/// A raw projection plus rotation, center, scale, translate and optional clip angle.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<R> {
    raw: R,
    rotation: Rotation,
    center: LonLat,
    scale: f64,
    translate: Vec2,
    clip_angle: Option<f64>,
    center_raw: (f64, f64),
}

impl<R: RawProjection> Projection<R> {
    pub fn new(raw: R) -> Self {
        let mut projection = Self {
            raw,
            rotation: Rotation::identity(),
            center: LonLat::new(0.0, 0.0),
            scale: 150.0,
            translate: Vec2::new(480.0, 250.0),
            clip_angle: None,
            center_raw: (0.0, 0.0),
        };
        projection.recenter();
        projection
    }

    pub fn raw(&self) -> &R {
        &self.raw
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    pub fn set_translate(&mut self, translate: Vec2) {
        self.translate = translate;
    }

    pub fn center(&self) -> LonLat {
        self.center
    }

    pub fn set_center(&mut self, center: LonLat) {
        self.center = center;
        self.recenter();
    }

    pub fn rotation(&self) -> [f64; 3] {
        self.rotation.angles()
    }

    pub fn set_rotation(&mut self, angles: [f64; 3]) {
        self.rotation = Rotation::new(angles);
    }

    /// Small-circle clip radius in degrees around the rotated origin.
    pub fn clip_angle(&self) -> Option<f64> {
        self.clip_angle
    }

    pub fn set_clip_angle(&mut self, angle: Option<f64>) {
        self.clip_angle = angle.filter(|a| *a > 0.0);
    }

    fn recenter(&mut self) {
        let (lambda, phi) = self.center.to_radians();
        self.center_raw = self.raw.forward(lambda, phi).unwrap_or((0.0, 0.0));
    }

    /// Rotate a geographic point (degrees) into projection space (radians).
    pub fn rotate(&self, p: LonLat) -> (f64, f64) {
        let (lambda, phi) = p.to_radians();
        self.rotation.apply(lambda, phi)
    }

    /// Project a point that is already in rotated space (radians).
    pub fn project_rotated(&self, lambda: f64, phi: f64) -> Option<Vec2> {
        let (x, y) = self.raw.forward(lambda, phi)?;
        let out = Vec2::new(
            self.translate.x + self.scale * (x - self.center_raw.0),
            self.translate.y - self.scale * (y - self.center_raw.1),
        );
        out.is_finite().then_some(out)
    }

    pub fn project(&self, p: LonLat) -> Option<Vec2> {
        let (lambda, phi) = self.rotate(p);
        self.project_rotated(lambda, phi)
    }

    pub fn invert(&self, p: Vec2) -> Option<LonLat> {
        if self.scale == 0.0 {
            return None;
        }
        let x = (p.x - self.translate.x) / self.scale + self.center_raw.0;
        let y = (self.translate.y - p.y) / self.scale + self.center_raw.1;
        let (lambda, phi) = self.raw.invert(x, y)?;
        let (lambda, phi) = self.rotation.invert(lambda, phi);
        let out = LonLat::from_radians(lambda, phi);
        out.is_finite().then_some(out)
    }

    /// Whether a rotated point (radians) lies inside the clip circle.
    pub fn is_visible_rotated(&self, lambda: f64, phi: f64) -> bool {
        match self.clip_angle {
            Some(angle) => lambda.cos() * phi.cos() > angle.to_radians().cos() + EPSILON,
            None => true,
        }
    }
}

pub type AzimuthalEqualArea = Projection<AzimuthalEqualAreaRaw>;
pub type Mercator = Projection<MercatorRaw>;

pub fn azimuthal_equal_area() -> AzimuthalEqualArea {
    Projection::new(AzimuthalEqualAreaRaw)
}

pub fn mercator() -> Mercator {
    Projection::new(MercatorRaw)
}
