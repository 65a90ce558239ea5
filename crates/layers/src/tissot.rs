//! Tissot indicatrix grid: equal-radius small circles on a regular lat/lng
//! lattice. Projected, their shapes and sizes show the local distortion.

use foundation::math::{EPSILON, LonLat};
use formats::{Feature, FeatureCollection, Geometry};
use serde_json::{Map, Value};

use crate::circle::{DEFAULT_STEP_DEG, geo_circle};

const LAT_LIMIT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TissotIndicator {
    pub center: LonLat,
    pub radius_deg: f64,
    /// Closed 61-point ring.
    pub ring: Vec<LonLat>,
}

/// Grid parameters, all in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TissotGrid {
    pub lat_spacing: f64,
    pub lng_spacing: f64,
    pub radius: f64,
}

impl Default for TissotGrid {
    fn default() -> Self {
        Self {
            lat_spacing: 20.0,
            lng_spacing: 20.0,
            radius: 4.5,
        }
    }
}

impl TissotGrid {
    pub fn new(lat_spacing: f64, lng_spacing: f64, radius: f64) -> Self {
        Self {
            lat_spacing,
            lng_spacing,
            radius,
        }
    }

    /// Same spacing on both axes.
    pub fn uniform(spacing: f64, radius: f64) -> Self {
        Self::new(spacing, spacing, radius)
    }

    /// Latitudes from -80 up to and including 80.
    pub fn latitudes(&self) -> Vec<f64> {
        if !self.lat_spacing.is_finite() || self.lat_spacing <= 0.0 {
            return Vec::new();
        }
        (0..)
            .map(|i| -LAT_LIMIT + i as f64 * self.lat_spacing)
            .take_while(|lat| *lat <= LAT_LIMIT + EPSILON)
            .collect()
    }

    /// Longitudes from -180 up to but excluding 180.
    pub fn longitudes(&self) -> Vec<f64> {
        if !self.lng_spacing.is_finite() || self.lng_spacing <= 0.0 {
            return Vec::new();
        }
        (0..)
            .map(|i| -180.0 + i as f64 * self.lng_spacing)
            .take_while(|lng| *lng < 180.0 - EPSILON)
            .collect()
    }

    /// Row-major by latitude, south first.
    pub fn generate(&self) -> Vec<TissotIndicator> {
        let longitudes = self.longitudes();
        let mut out = Vec::new();
        for lat in self.latitudes() {
            for &lng in &longitudes {
                let center = LonLat::new(lng, lat);
                out.push(TissotIndicator {
                    center,
                    radius_deg: self.radius,
                    ring: geo_circle(center, self.radius, DEFAULT_STEP_DEG),
                });
            }
        }
        out
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection::new(self.generate().iter().map(TissotIndicator::to_feature).collect())
    }
}

impl TissotIndicator {
    pub fn to_feature(&self) -> Feature {
        let mut properties = Map::new();
        properties.insert("center".to_string(), Value::from(self.center.to_array().to_vec()));
        properties.insert("radius".to_string(), Value::from(self.radius_deg));
        Feature {
            id: None,
            properties,
            geometry: Some(Geometry::Polygon(vec![self.ring.clone()])),
        }
    }
}
