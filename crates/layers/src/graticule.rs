use foundation::math::{EPSILON, LonLat};

/// Meridians and parallels every `step` degrees.
///
/// Minor meridians stop at ±80°; meridians on multiples of `major_step`
/// run pole to pole. Lines are sampled every `precision` degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Graticule {
    pub step: f64,
    pub major_step: f64,
    pub minor_lat_limit: f64,
    pub precision: f64,
}

impl Default for Graticule {
    fn default() -> Self {
        Self {
            step: 10.0,
            major_step: 90.0,
            minor_lat_limit: 80.0,
            precision: 2.5,
        }
    }
}

impl Graticule {
    pub fn lines(&self) -> Vec<Vec<LonLat>> {
        if [self.step, self.major_step, self.precision]
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.0)
        {
            return Vec::new();
        }
        let limit = self.minor_lat_limit;
        let mut out = Vec::new();

        for lon in stepped(-180.0, 180.0, self.major_step) {
            out.push(meridian(lon, -90.0, 90.0, self.precision));
        }
        for lon in stepped(-180.0, 180.0, self.step) {
            if !is_multiple(lon, self.major_step) {
                out.push(meridian(lon, -limit, limit, self.precision));
            }
        }
        for lat in stepped(-90.0 + self.major_step, 90.0, self.major_step) {
            out.push(parallel(lat, self.precision));
        }
        for lat in stepped(-limit, limit + self.step / 2.0, self.step) {
            if !is_multiple(lat, self.major_step) {
                out.push(parallel(lat, self.precision));
            }
        }
        out
    }
}

/// The conventional 10° graticule.
pub fn graticule10() -> Vec<Vec<LonLat>> {
    Graticule::default().lines()
}

fn stepped(from: f64, to: f64, step: f64) -> impl Iterator<Item = f64> {
    let start = (from / step).ceil() * step;
    (0..)
        .map(move |i| start + i as f64 * step)
        .take_while(move |v| *v < to - EPSILON)
}

fn is_multiple(value: f64, step: f64) -> bool {
    let r = value.rem_euclid(step);
    r < EPSILON || step - r < EPSILON
}

fn samples(from: f64, to: f64, precision: f64) -> Vec<f64> {
    let mut out: Vec<f64> = stepped(from, to, precision).collect();
    out.push(to);
    out
}

fn meridian(lon: f64, from: f64, to: f64, precision: f64) -> Vec<LonLat> {
    samples(from, to, precision)
        .into_iter()
        .map(|lat| LonLat::new(lon, lat))
        .collect()
}

fn parallel(lat: f64, precision: f64) -> Vec<LonLat> {
    samples(-180.0, 180.0, precision)
        .into_iter()
        .map(|lon| LonLat::new(lon, lat))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::graticule10;

    #[test]
    fn ten_degree_graticule_line_counts() {
        let lines = graticule10();
        let meridians = lines.iter().filter(|l| l[0].lon == l[l.len() - 1].lon).count();
        let parallels = lines.len() - meridians;
        // 4 major + 32 minor meridians; 1 major + 16 minor parallels.
        assert_eq!(meridians, 36);
        assert_eq!(parallels, 17);
    }

    #[test]
    fn major_meridians_reach_the_poles() {
        let lines = graticule10();
        let prime = lines
            .iter()
            .find(|l| l[0].lon == 0.0 && l[0].lat == -90.0)
            .expect("prime meridian");
        assert_eq!(prime.last().map(|p| p.lat), Some(90.0));

        let minor = lines
            .iter()
            .find(|l| l[0].lon == 10.0)
            .expect("10E meridian");
        assert_eq!(minor[0].lat, -80.0);
        assert_eq!(minor.last().map(|p| p.lat), Some(80.0));
        // 2.5 degree sampling over 160 degrees.
        assert_eq!(minor.len(), 65);
    }

    #[test]
    fn parallels_span_all_longitudes() {
        let lines = graticule10();
        let equator = lines
            .iter()
            .find(|l| l[0].lat == 0.0 && l[0].lon == -180.0 && l[1].lat == 0.0)
            .expect("equator");
        assert_eq!(equator.last().map(|p| p.lon), Some(180.0));
        assert!(lines.iter().all(|l| l.len() >= 2));
    }
}
