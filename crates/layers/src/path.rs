//! Geographic geometry to SVG path data through a composed projection.
//!
//! Edges are treated as great-circle arcs and densified before projecting.
//! Projections with a clip angle pull hidden vertices onto the clip circle
//! and follow the circle between them. Projections without one (Mercator)
//! get continuous longitudes, pole closure for rings that wind around a pole,
//! and one copy per world width that overlaps the extent.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt::Write;

use foundation::math::{LonLat, Projection, RawProjection, Vec2, angular_distance, interpolate_great_circle};
use foundation::Aabb2;
use formats::{FeatureCollection, Geometry};

/// Longest edge drawn without intermediate great-circle samples.
const MAX_EDGE_DEG: f64 = 4.0;
/// Vertices are never placed closer than this to the clip circle.
const RIM_MARGIN_DEG: f64 = 0.01;
/// Vertices this close to the clip circle connect along it.
const RIM_BAND_DEG: f64 = 5.0;
const RIM_STEP_DEG: f64 = 6.0;
/// Largest azimuth jump a line may make inside the rim band.
const RIM_JUMP_DEG: f64 = 30.0;
const POINT_RADIUS: f64 = 4.5;

pub struct GeoPath<'a, R> {
    projection: &'a Projection<R>,
    extent: Option<Aabb2>,
}

impl<'a, R: RawProjection> GeoPath<'a, R> {
    pub fn new(projection: &'a Projection<R>) -> Self {
        Self {
            projection,
            extent: None,
        }
    }

    /// Screen box used to decide which horizontal world copies to emit.
    pub fn with_extent(mut self, extent: Aabb2) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Path data for every feature with a drawable geometry.
    pub fn features(&self, collection: &FeatureCollection) -> Vec<String> {
        collection
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .map(|g| self.geometry(g))
            .filter(|d| !d.is_empty())
            .collect()
    }

    pub fn geometry(&self, geometry: &Geometry) -> String {
        let mut d = String::new();
        match geometry {
            Geometry::Point(p) => self.write_point(&mut d, *p),
            Geometry::MultiPoint(points) => {
                for p in points {
                    self.write_point(&mut d, *p);
                }
            }
            Geometry::LineString(line) => self.write_lines(&mut d, std::slice::from_ref(line)),
            Geometry::MultiLineString(lines) => self.write_lines(&mut d, lines),
            Geometry::Polygon(rings) => self.write_rings(&mut d, rings),
            Geometry::MultiPolygon(polygons) => {
                for rings in polygons {
                    self.write_rings(&mut d, rings);
                }
            }
        }
        d
    }

    pub fn lines(&self, lines: &[Vec<LonLat>]) -> String {
        let mut d = String::new();
        self.write_lines(&mut d, lines);
        d
    }

    pub fn polygon(&self, rings: &[Vec<LonLat>]) -> String {
        let mut d = String::new();
        self.write_rings(&mut d, rings);
        d
    }

    /// Screen rings for one geographic ring, one entry per emitted copy.
    pub fn project_ring(&self, ring: &[LonLat]) -> Vec<Vec<Vec2>> {
        if ring.len() < 3 {
            return Vec::new();
        }
        match self.projection.clip_angle() {
            Some(angle) => self.clipped_ring(ring, angle),
            None => self.world_copies(self.unwrapped_ring(ring)),
        }
    }

    /// Screen polylines for one geographic line.
    pub fn project_line(&self, line: &[LonLat]) -> Vec<Vec<Vec2>> {
        if line.len() < 2 {
            return Vec::new();
        }
        match self.projection.clip_angle() {
            Some(angle) => self.clipped_line(line, angle),
            None => self.world_copies(self.unwrapped(line)),
        }
    }

    fn write_point(&self, d: &mut String, p: LonLat) {
        let (lambda, phi) = self.projection.rotate(p);
        if !self.projection.is_visible_rotated(lambda, phi) {
            return;
        }
        if let Some(s) = self.projection.project_rotated(lambda, phi) {
            let r = POINT_RADIUS;
            let _ = write!(
                d,
                "M{},{}m0,{}a{r},{r} 0 1,1 0,{}a{r},{r} 0 1,1 0,{}z",
                num(s.x),
                num(s.y),
                r,
                -2.0 * r,
                2.0 * r
            );
        }
    }

    fn write_lines(&self, d: &mut String, lines: &[Vec<LonLat>]) {
        for line in lines {
            for part in self.project_line(line) {
                write_polyline(d, &part, false);
            }
        }
    }

    fn write_rings(&self, d: &mut String, rings: &[Vec<LonLat>]) {
        for ring in rings {
            for part in self.project_ring(ring) {
                write_polyline(d, &part, true);
            }
        }
    }

    fn clipped_ring(&self, ring: &[LonLat], clip_deg: f64) -> Vec<Vec<Vec2>> {
        let limit = (clip_deg - RIM_MARGIN_DEG).to_radians();
        let band = (clip_deg - RIM_BAND_DEG).to_radians();
        let step = RIM_STEP_DEG.to_radians();

        let polar_points: Vec<(f64, f64)> = densify(ring)
            .into_iter()
            .map(|p| polar(self.projection.rotate(p)))
            .collect();
        let mut out = Vec::new();
        let mut inside = false;
        let mut previous_rim: Option<f64> = None;
        for &(azimuth, distance) in &polar_points {
            let on_rim = distance > band;
            if let (true, Some(from)) = (on_rim, previous_rim) {
                let delta = wrap_pi(azimuth - from);
                let n = (delta.abs() / step).ceil() as usize;
                for i in 1..n {
                    let az = from + delta * i as f64 / n as f64;
                    out.extend(self.from_polar(az, limit));
                }
            }
            inside |= distance < limit;
            out.extend(self.from_polar(azimuth, distance.min(limit)));
            previous_rim = on_rim.then_some(azimuth);
        }
        if !inside || out.len() < 3 {
            return Vec::new();
        }

        if !encloses_antipode(&polar_points) {
            return vec![out];
        }
        // The fill lies between the ring and the clip circle.
        let n = (TAU / step).ceil() as usize;
        let mut rim: Vec<Vec2> = (0..n)
            .filter_map(|i| self.from_polar(i as f64 * TAU / n as f64, limit))
            .collect();
        if signed_area(&rim).signum() == signed_area(&out).signum() {
            rim.reverse();
        }
        vec![out, rim]
    }

    fn clipped_line(&self, line: &[LonLat], clip_deg: f64) -> Vec<Vec<Vec2>> {
        let limit = (clip_deg - RIM_MARGIN_DEG).to_radians();
        let band = (clip_deg - RIM_BAND_DEG).to_radians();
        let jump = RIM_JUMP_DEG.to_radians();

        let mut parts = Vec::new();
        let mut current: Vec<Vec2> = Vec::new();
        let mut previous_rim: Option<f64> = None;
        for p in densify(line) {
            let (azimuth, distance) = polar(self.projection.rotate(p));
            let on_rim = distance > band;
            let jumps = matches!(previous_rim, Some(from) if on_rim && wrap_pi(azimuth - from).abs() > jump);
            if distance >= limit || jumps {
                flush(&mut parts, &mut current);
            }
            if distance < limit {
                current.extend(self.from_polar(azimuth, distance));
            }
            previous_rim = on_rim.then_some(azimuth);
        }
        flush(&mut parts, &mut current);
        parts
    }

    fn from_polar(&self, azimuth: f64, distance: f64) -> Option<Vec2> {
        let (sin_d, cos_d) = distance.sin_cos();
        let (sin_a, cos_a) = azimuth.sin_cos();
        let lambda = (sin_a * sin_d).atan2(cos_d);
        let phi = (cos_a * sin_d).clamp(-1.0, 1.0).asin();
        self.projection.project_rotated(lambda, phi)
    }

    /// Rotated coordinates with each longitude moved onto the branch nearest
    /// its predecessor.
    fn unwrapped(&self, points: &[LonLat]) -> Vec<(f64, f64)> {
        let mut out: Vec<(f64, f64)> = Vec::with_capacity(points.len());
        for p in densify(points) {
            let (mut lambda, phi) = self.projection.rotate(p);
            if let Some(&(previous, _)) = out.last() {
                lambda = previous + wrap_pi(lambda - previous);
            }
            out.push((lambda, phi));
        }
        out
    }

    fn unwrapped_ring(&self, ring: &[LonLat]) -> Vec<(f64, f64)> {
        let mut points = self.unwrapped(ring);
        let first = points.first().map(|p| p.0);
        let last = points.last().map(|p| p.0);
        if let (Some(first), Some(last)) = (first, last) {
            if (last - first).abs() > PI {
                // Winds around a pole: close the ring along it.
                let mean_phi =
                    points.iter().map(|(_, phi)| phi).sum::<f64>() / points.len() as f64;
                let pole = if mean_phi < 0.0 { -FRAC_PI_2 } else { FRAC_PI_2 };
                points.push((last, pole));
                points.push((first, pole));
            }
        }
        points
    }

    fn world_copies(&self, points: Vec<(f64, f64)>) -> Vec<Vec<Vec2>> {
        let projected: Vec<Vec2> = points
            .into_iter()
            .filter_map(|(lambda, phi)| self.projection.project_rotated(lambda, phi))
            .collect();
        let Some(bounds) = Aabb2::from_points(projected.iter().copied()) else {
            return Vec::new();
        };
        let Some(extent) = self.extent else {
            return vec![projected];
        };

        let world = self.projection.scale() * TAU;
        let mut out = Vec::new();
        for shift in [-1.0, 0.0, 1.0] {
            let dx = shift * world;
            let shifted = Aabb2::new(
                [bounds.min[0] + dx, bounds.min[1]],
                [bounds.max[0] + dx, bounds.max[1]],
            );
            if shifted.intersects(&extent) {
                out.push(projected.iter().map(|p| p.offset(dx, 0.0)).collect());
            }
        }
        out
    }
}

fn flush(parts: &mut Vec<Vec<Vec2>>, current: &mut Vec<Vec2>) {
    if current.len() >= 2 {
        parts.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Azimuth (clockwise from north) and distance of a rotated point from the
/// projection origin, both in radians.
fn polar((lambda, phi): (f64, f64)) -> (f64, f64) {
    let (sin_l, cos_l) = lambda.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    let distance = (cos_l * cos_p).clamp(-1.0, 1.0).acos();
    let azimuth = (sin_l * cos_p).atan2(sin_p);
    (azimuth, distance)
}

/// Whether the smaller region bounded by a closed ring of polar points holds
/// the point opposite the projection origin.
fn encloses_antipode(points: &[(f64, f64)]) -> bool {
    let n = points.len();
    let mut turn = 0.0;
    let mut near_side = 0.0;
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        let delta = wrap_pi(b.0 - a.0);
        turn += delta;
        near_side += (1.0 - ((a.1 + b.1) / 2.0).cos()) * delta;
    }
    // The sphere is 4π; the origin side is the larger one past 2π.
    (turn / TAU).round() != 0.0 && near_side.abs() > TAU
}

fn signed_area(points: &[Vec2]) -> f64 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f64>()
        / 2.0
}

fn wrap_pi(angle: f64) -> f64 {
    angle - (angle / TAU).round() * TAU
}

fn densify(points: &[LonLat]) -> Vec<LonLat> {
    let mut out = Vec::with_capacity(points.len());
    let Some(&first) = points.first() else {
        return out;
    };
    out.push(first);
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let distance = angular_distance(a, b);
        if distance > MAX_EDGE_DEG {
            let n = (distance / MAX_EDGE_DEG).ceil() as usize;
            for i in 1..n {
                out.push(interpolate_great_circle(a, b, i as f64 / n as f64));
            }
        }
        out.push(b);
    }
    out
}

fn write_polyline(d: &mut String, points: &[Vec2], close: bool) {
    let min_len = if close { 3 } else { 2 };
    if points.len() < min_len {
        return;
    }
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{},{}", num(p.x), num(p.y));
    }
    if close {
        d.push('Z');
    }
}

/// Two decimals without trailing zeros or negative zero.
fn num(v: f64) -> f64 {
    (v * 100.0).round() / 100.0 + 0.0
}
