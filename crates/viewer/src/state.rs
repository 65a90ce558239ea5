use foundation::math::LonLat;
use serde::{Deserialize, Serialize};

/// Focal point shared by both maps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapCenter {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MapCenter {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            label: None,
        }
    }

    pub fn labelled(longitude: f64, latitude: f64, label: impl Into<String>) -> Self {
        Self {
            longitude,
            latitude,
            label: Some(label.into()),
        }
    }

    pub fn lon_lat(&self) -> LonLat {
        LonLat::new(self.longitude, self.latitude)
    }

    /// Anything other than the unlabelled origin.
    pub fn is_custom(&self) -> bool {
        self.label.is_some() || self.longitude != 0.0 || self.latitude != 0.0
    }
}

impl From<&GeocodingResult> for MapCenter {
    fn from(result: &GeocodingResult) -> Self {
        Self::labelled(result.longitude, result.latitude, result.label.clone())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapControls {
    pub show_tissot: bool,
    pub show_graticule: bool,
}

impl Default for MapControls {
    fn default() -> Self {
        Self {
            show_tissot: false,
            show_graticule: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingResult {
    pub label: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl GeocodingResult {
    pub fn has_valid_coordinates(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapKind {
    EqualArea,
    Mercator,
}

impl MapKind {
    pub const ALL: [MapKind; 2] = [MapKind::EqualArea, MapKind::Mercator];

    pub fn as_str(self) -> &'static str {
        match self {
            MapKind::EqualArea => "equal-area",
            MapKind::Mercator => "mercator",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == text)
    }

    pub fn title(self) -> &'static str {
        match self {
            MapKind::EqualArea => "Equal-Area",
            MapKind::Mercator => "Mercator",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            MapKind::EqualArea => "True sizes, shapes distorted at edges",
            MapKind::Mercator => "True angles, sizes distorted near poles",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GeocodingResult, MapCenter, MapControls, MapKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_show_graticule_only() {
        assert_eq!(
            MapControls::default(),
            MapControls {
                show_tissot: false,
                show_graticule: true
            }
        );
        assert!(!MapCenter::default().is_custom());
        assert!(MapCenter::new(0.0, 0.1).is_custom());
    }

    #[test]
    fn kind_names_round_trip() {
        assert_eq!(serde_json::to_string(&MapKind::EqualArea).unwrap(), "\"equal-area\"");
        assert_eq!(MapKind::parse("mercator"), Some(MapKind::Mercator));
        assert_eq!(MapKind::parse("globe"), None);
    }

    #[test]
    fn coordinate_ranges() {
        let ok = GeocodingResult {
            label: "Quito".into(),
            longitude: -78.5,
            latitude: -0.2,
        };
        assert!(ok.has_valid_coordinates());
        let bad = GeocodingResult {
            latitude: 91.0,
            ..ok.clone()
        };
        assert!(!bad.has_valid_coordinates());
        assert!(!GeocodingResult {
            longitude: f64::NAN,
            ..ok
        }
        .has_valid_coordinates());
    }
}
