//! TopoJSON decoding.
//!
//! Arcs are shared between neighbouring geometries and, when a `transform` is
//! present, stored quantized and delta-encoded. Decoding expands each object
//! into plain GeoJSON geometries in degrees.

use std::collections::BTreeMap;

use foundation::math::LonLat;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::geojson::{Feature, FeatureCollection, Geometry, id_from_value};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: BTreeMap<String, TopoObject>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawObject")]
pub struct TopoObject {
    pub id: Option<Value>,
    pub properties: Option<Map<String, Value>>,
    pub geometry: TopoGeometry,
}

/// An object before its `type` is known; world-atlas writes `"type": null`
/// for features without geometry.
#[derive(Deserialize)]
struct RawObject {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawObject> for TopoObject {
    type Error = serde_json::Error;

    fn try_from(raw: RawObject) -> Result<Self, Self::Error> {
        let geometry = match raw.kind {
            None => TopoGeometry::Null,
            Some(kind) => {
                let mut body = raw.rest;
                body.insert("type".to_string(), Value::String(kind));
                serde_json::from_value(Value::Object(body))?
            }
        };
        Ok(Self {
            id: raw.id,
            properties: raw.properties,
            geometry,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TopoGeometry {
    #[serde(skip)]
    Null,
    GeometryCollection { geometries: Vec<TopoObject> },
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
    LineString { arcs: Vec<i64> },
    MultiLineString { arcs: Vec<Vec<i64>> },
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
}

#[derive(Debug)]
pub enum TopologyError {
    Json(serde_json::Error),
    MissingObject(String),
    ArcOutOfRange { index: i64 },
    InvalidPosition,
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::Json(e) => write!(f, "topology parse error: {e}"),
            TopologyError::MissingObject(name) => write!(f, "topology has no object {name:?}"),
            TopologyError::ArcOutOfRange { index } => write!(f, "arc index {index} out of range"),
            TopologyError::InvalidPosition => write!(f, "position must have [x, y]"),
        }
    }
}

impl std::error::Error for TopologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TopologyError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl Topology {
    pub fn from_json_str(payload: &str) -> Result<Self, TopologyError> {
        serde_json::from_str(payload).map_err(TopologyError::Json)
    }

    pub fn from_json_slice(payload: &[u8]) -> Result<Self, TopologyError> {
        serde_json::from_slice(payload).map_err(TopologyError::Json)
    }

    /// Convert the named object into a feature collection. A geometry
    /// collection yields one feature per member; any other object yields one.
    pub fn feature(&self, object: &str) -> Result<FeatureCollection, TopologyError> {
        let obj = self
            .objects
            .get(object)
            .ok_or_else(|| TopologyError::MissingObject(object.to_string()))?;
        let arcs = self.decode_arcs();

        let members: Vec<&TopoObject> = match &obj.geometry {
            TopoGeometry::GeometryCollection { geometries } => geometries.iter().collect(),
            _ => vec![obj],
        };

        let mut features = Vec::with_capacity(members.len());
        for member in members {
            features.push(Feature {
                id: id_from_value(member.id.as_ref()),
                properties: member.properties.clone().unwrap_or_default(),
                geometry: self.geometry(&arcs, &member.geometry)?,
            });
        }
        Ok(FeatureCollection::new(features))
    }

    fn decode_arcs(&self) -> Vec<Vec<LonLat>> {
        self.arcs
            .iter()
            .map(|arc| {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| match self.transform {
                        Some(t) => {
                            x += p[0];
                            y += p[1];
                            LonLat::new(
                                x * t.scale[0] + t.translate[0],
                                y * t.scale[1] + t.translate[1],
                            )
                        }
                        None => LonLat::new(p[0], p[1]),
                    })
                    .collect()
            })
            .collect()
    }

    fn position(&self, p: &[f64]) -> Result<LonLat, TopologyError> {
        if p.len() < 2 {
            return Err(TopologyError::InvalidPosition);
        }
        Ok(match self.transform {
            Some(t) => LonLat::new(
                p[0] * t.scale[0] + t.translate[0],
                p[1] * t.scale[1] + t.translate[1],
            ),
            None => LonLat::new(p[0], p[1]),
        })
    }

    fn geometry(
        &self,
        arcs: &[Vec<LonLat>],
        geometry: &TopoGeometry,
    ) -> Result<Option<Geometry>, TopologyError> {
        let out = match geometry {
            TopoGeometry::Null | TopoGeometry::GeometryCollection { .. } => return Ok(None),
            TopoGeometry::Point { coordinates } => Geometry::Point(self.position(coordinates)?),
            TopoGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(
                coordinates
                    .iter()
                    .map(|p| self.position(p))
                    .collect::<Result<_, _>>()?,
            ),
            TopoGeometry::LineString { arcs: ix } => Geometry::LineString(line(arcs, ix)?),
            TopoGeometry::MultiLineString { arcs: ix } => Geometry::MultiLineString(
                ix.iter()
                    .map(|l| line(arcs, l))
                    .collect::<Result<_, _>>()?,
            ),
            TopoGeometry::Polygon { arcs: ix } => Geometry::Polygon(polygon(arcs, ix)?),
            TopoGeometry::MultiPolygon { arcs: ix } => Geometry::MultiPolygon(
                ix.iter()
                    .map(|p| polygon(arcs, p))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(Some(out))
    }
}

/// Stitch arcs end to end. Consecutive arcs share an endpoint, which is kept once.
fn line(arcs: &[Vec<LonLat>], indices: &[i64]) -> Result<Vec<LonLat>, TopologyError> {
    let mut points: Vec<LonLat> = Vec::new();
    for &i in indices {
        let (idx, reversed) = if i < 0 { (!i, true) } else { (i, false) };
        let arc = usize::try_from(idx)
            .ok()
            .and_then(|idx| arcs.get(idx))
            .ok_or(TopologyError::ArcOutOfRange { index: i })?;

        points.pop();
        let start = points.len();
        points.extend_from_slice(arc);
        if reversed {
            points[start..].reverse();
        }
    }
    if let Some(&first) = points.first() {
        if points.len() < 2 {
            points.push(first);
        }
    }
    Ok(points)
}

fn ring(arcs: &[Vec<LonLat>], indices: &[i64]) -> Result<Vec<LonLat>, TopologyError> {
    let mut points = line(arcs, indices)?;
    if let Some(&first) = points.first() {
        while points.len() < 4 {
            points.push(first);
        }
    }
    Ok(points)
}

fn polygon(arcs: &[Vec<LonLat>], rings: &[Vec<i64>]) -> Result<Vec<Vec<LonLat>>, TopologyError> {
    rings.iter().map(|r| ring(arcs, r)).collect()
}

#[cfg(test)]
mod tests {
    use super::{Topology, TopologyError};
    use crate::geojson::Geometry;
    use foundation::math::LonLat;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = include_str!("../tests/fixtures/two-countries.topo.json");

    fn rounded(ring: &[LonLat]) -> Vec<(i64, i64)> {
        ring.iter()
            .map(|p| ((p.lon * 1000.0).round() as i64, (p.lat * 1000.0).round() as i64))
            .collect()
    }

    #[test]
    fn decodes_quantized_countries() {
        let topo = Topology::from_json_str(FIXTURE).expect("parse");
        let fc = topo.feature("countries").expect("countries");
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].id.as_deref(), Some("001"));
        assert_eq!(
            fc.features[0].properties.get("name").and_then(|v| v.as_str()),
            Some("Alpha")
        );

        let Some(Geometry::Polygon(rings)) = &fc.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rounded(&rings[0]),
            vec![(10_000, 0), (10_000, 10_000), (0, 10_000), (0, 0), (10_000, 0)]
        );
    }

    #[test]
    fn reversed_arc_closes_shared_edge() {
        let topo = Topology::from_json_str(FIXTURE).expect("parse");
        let fc = topo.feature("countries").expect("countries");
        let Some(Geometry::MultiPolygon(polys)) = &fc.features[1].geometry else {
            panic!("expected multipolygon");
        };
        assert_eq!(
            rounded(&polys[0][0]),
            vec![(10_000, 0), (20_000, 0), (20_000, 10_000), (10_000, 10_000), (10_000, 0)]
        );
    }

    #[test]
    fn single_object_becomes_one_feature() {
        let topo = Topology::from_json_str(FIXTURE).expect("parse");
        let fc = topo.feature("land").expect("land");
        assert_eq!(fc.len(), 1);
        let Some(Geometry::Polygon(rings)) = &fc.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 7);
        assert_eq!(rings[0].first(), rings[0].last());
    }

    #[test]
    fn missing_object_and_bad_arc() {
        let topo = Topology::from_json_str(FIXTURE).expect("parse");
        assert!(matches!(
            topo.feature("rivers"),
            Err(TopologyError::MissingObject(_))
        ));

        let bad = r#"{"type":"Topology","arcs":[],"objects":{"x":{"type":"LineString","arcs":[3]}}}"#;
        let topo = Topology::from_json_str(bad).expect("parse");
        assert!(matches!(
            topo.feature("x"),
            Err(TopologyError::ArcOutOfRange { index: 3 })
        ));
    }

    #[test]
    fn null_typed_member_is_a_feature_without_geometry() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[0, 0], [10, 0]]],
            "objects": {"land": {"type": "GeometryCollection", "geometries": [
                {"type": null, "id": "010", "properties": {"name": "Antarctica"}},
                {"type": "LineString", "id": "011", "arcs": [0]}
            ]}}
        }"#;
        let topo = Topology::from_json_str(json).expect("parse");
        let land = topo.feature("land").expect("feature");
        assert_eq!(land.len(), 2);
        assert_eq!(land.features[0].id.as_deref(), Some("010"));
        assert!(land.features[0].geometry.is_none());
        assert!(land.features[1].geometry.is_some());
    }
}
