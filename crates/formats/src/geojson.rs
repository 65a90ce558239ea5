use foundation::math::LonLat;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LonLat),
    MultiPoint(Vec<LonLat>),
    LineString(Vec<LonLat>),
    MultiLineString(Vec<Vec<LonLat>>),
    Polygon(Vec<Vec<LonLat>>),
    MultiPolygon(Vec<Vec<Vec<LonLat>>>),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    /// `None` for features with a `null` geometry.
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            properties: Map::new(),
            geometry: Some(geometry),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Emits a GeoJSON FeatureCollection. Property order may differ from the input.
    pub fn to_geojson_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );

        let features: Vec<Value> = self.features.iter().map(feature_to_value).collect();
        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson_value())
    }
}

pub(crate) fn id_from_value(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn feature_to_value(feat: &Feature) -> Value {
    let mut fobj = Map::new();
    fobj.insert("type".to_string(), Value::String("Feature".to_string()));
    if let Some(id) = &feat.id {
        fobj.insert("id".to_string(), Value::String(id.clone()));
    }
    fobj.insert(
        "properties".to_string(),
        Value::Object(feat.properties.clone()),
    );
    fobj.insert(
        "geometry".to_string(),
        feat.geometry
            .as_ref()
            .map(geometry_to_value)
            .unwrap_or(Value::Null),
    );
    Value::Object(fobj)
}

fn geometry_to_value(geom: &Geometry) -> Value {
    let coords = match geom {
        Geometry::Point(p) => point_coords(p),
        Geometry::MultiPoint(ps) | Geometry::LineString(ps) => points_coords(ps),
        Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
            Value::Array(lines.iter().map(|l| points_coords(l)).collect())
        }
        Geometry::MultiPolygon(polys) => Value::Array(
            polys
                .iter()
                .map(|poly| Value::Array(poly.iter().map(|r| points_coords(r)).collect()))
                .collect(),
        ),
    };

    let mut obj = Map::new();
    obj.insert(
        "type".to_string(),
        Value::String(geom.type_name().to_string()),
    );
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn point_coords(p: &LonLat) -> Value {
    Value::Array(vec![Value::from(p.lon), Value::from(p.lat)])
}

fn points_coords(ps: &[LonLat]) -> Value {
    Value::Array(ps.iter().map(point_coords).collect())
}
