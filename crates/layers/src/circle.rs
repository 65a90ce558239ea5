use foundation::math::{LonLat, destination};

/// Azimuth step between consecutive ring vertices, in degrees.
pub const DEFAULT_STEP_DEG: f64 = 6.0;

/// Closed ring of points at `radius_deg` great-circle distance from `center`.
///
/// Vertices start due north and advance clockwise every `step_deg` of
/// azimuth; the last vertex repeats the first. Longitudes are continuous
/// around the center and may leave [-180, 180) near the antimeridian.
pub fn geo_circle(center: LonLat, radius_deg: f64, step_deg: f64) -> Vec<LonLat> {
    let step = if step_deg > 0.0 { step_deg } else { DEFAULT_STEP_DEG };
    let segments = ((360.0 / step).round() as usize).max(3);

    let mut ring: Vec<LonLat> = (0..segments)
        .map(|i| {
            let azimuth = i as f64 * 360.0 / segments as f64;
            destination(center, azimuth, radius_deg)
        })
        .collect();
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_STEP_DEG, geo_circle};
    use foundation::math::{LonLat, angular_distance};

    #[test]
    fn ring_is_closed_and_equidistant() {
        let center = LonLat::new(-40.0, 60.0);
        let ring = geo_circle(center, 4.5, DEFAULT_STEP_DEG);
        assert_eq!(ring.len(), 61);
        assert_eq!(ring.first(), ring.last());
        for p in &ring {
            assert!((angular_distance(center, *p) - 4.5).abs() < 1e-9);
        }
        // First vertex is due north.
        assert!((ring[0].lon - center.lon).abs() < 1e-9);
        assert!(ring[0].lat > center.lat);
    }

    #[test]
    fn non_positive_step_uses_default() {
        assert_eq!(geo_circle(LonLat::new(0.0, 0.0), 1.0, 0.0).len(), 61);
    }
}
