//! TopoJSON-style topology payloads: quantized, delta-encoded arcs shared
//! between geometries.
//!
//! Arc decoding is a running prefix sum per arc followed by the payload's
//! affine `transform`; arcs decode independently of one another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Absolute point `[x, y]` (longitude/latitude for geographic topologies).
pub type Point = [f64; 2];

#[derive(Debug, Clone, PartialEq)]
pub enum MalformedTopologyError {
    /// A delta (or absolute) point did not have exactly two components.
    PointArity { arc: usize, point: usize, arity: usize },
    /// A geometry referenced an arc that does not exist.
    ArcIndex { index: i64, arcs: usize },
    UnknownObject(String),
    Json(String),
}

impl std::fmt::Display for MalformedTopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedTopologyError::PointArity { arc, point, arity } => write!(
                f,
                "arc {arc} point {point} has {arity} components, expected 2"
            ),
            MalformedTopologyError::ArcIndex { index, arcs } => {
                write!(f, "arc index {index} out of range ({arcs} arcs)")
            }
            MalformedTopologyError::UnknownObject(name) => {
                write!(f, "topology has no object named {name:?}")
            }
            MalformedTopologyError::Json(msg) => write!(f, "topology JSON parse error: {msg}"),
        }
    }
}

impl std::error::Error for MalformedTopologyError {}

/// Quantization transform: `absolute = cumulative * scale + translate`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyTransform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Default for TopologyTransform {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0],
            translate: [0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopoGeometryKind {
    GeometryCollection { geometries: Vec<TopoGeometry> },
    LineString { arcs: Vec<i64> },
    MultiLineString { arcs: Vec<Vec<i64>> },
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopoGeometry {
    #[serde(flatten)]
    pub kind: TopoGeometryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl TopoGeometry {
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub arcs: Vec<Vec<Vec<f64>>>,
    /// Absent for unquantized topologies, whose arcs are already absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TopologyTransform>,
    #[serde(default)]
    pub objects: BTreeMap<String, TopoGeometry>,
}

/// Polygon rings (first ring is the exterior) in absolute coordinates.
pub type Polygon = Vec<Vec<Point>>;

#[derive(Debug, Clone, PartialEq)]
pub struct TopoFeature {
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
    pub polygons: Vec<Polygon>,
}

/// Which shared arcs [`Topology::mesh`] keeps.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MeshSelection {
    All,
    /// Arcs used by a single geometry (outer borders).
    Exterior,
    /// Arcs shared by two different geometries (internal borders).
    Interior,
}

/// Decodes one delta-encoded arc.
///
/// Each output point is the running sum of all preceding deltas in the arc,
/// scaled and translated by `transform`.
pub fn decode_arc(
    arc_index: usize,
    deltas: &[Vec<f64>],
    transform: &TopologyTransform,
) -> Result<Vec<Point>, MalformedTopologyError> {
    let mut out = Vec::with_capacity(deltas.len());
    let (mut x, mut y) = (0.0, 0.0);
    for (point, d) in deltas.iter().enumerate() {
        let [dx, dy] = d.as_slice() else {
            return Err(MalformedTopologyError::PointArity {
                arc: arc_index,
                point,
                arity: d.len(),
            });
        };
        x += dx;
        y += dy;
        out.push([
            x * transform.scale[0] + transform.translate[0],
            y * transform.scale[1] + transform.translate[1],
        ]);
    }
    Ok(out)
}

fn absolute_arc(arc_index: usize, points: &[Vec<f64>]) -> Result<Vec<Point>, MalformedTopologyError> {
    points
        .iter()
        .enumerate()
        .map(|(point, p)| match p.as_slice() {
            [x, y] => Ok([*x, *y]),
            _ => Err(MalformedTopologyError::PointArity {
                arc: arc_index,
                point,
                arity: p.len(),
            }),
        })
        .collect()
}

impl Topology {
    pub fn from_json_str(payload: &str) -> Result<Self, MalformedTopologyError> {
        let topology: Topology = serde_json::from_str(payload)
            .map_err(|e| MalformedTopologyError::Json(e.to_string()))?;
        debug!(
            arcs = topology.arcs.len(),
            objects = topology.objects.len(),
            quantized = topology.transform.is_some(),
            "topology parsed"
        );
        Ok(topology)
    }

    /// Every arc in absolute coordinates, in arc-index order.
    pub fn decode_arcs(&self) -> Result<Vec<Vec<Point>>, MalformedTopologyError> {
        match &self.transform {
            Some(t) => self
                .arcs
                .iter()
                .enumerate()
                .map(|(i, arc)| decode_arc(i, arc, t))
                .collect(),
            None => self
                .arcs
                .iter()
                .enumerate()
                .map(|(i, arc)| absolute_arc(i, arc))
                .collect(),
        }
    }

    pub fn object(&self, name: &str) -> Result<&TopoGeometry, MalformedTopologyError> {
        self.objects
            .get(name)
            .ok_or_else(|| MalformedTopologyError::UnknownObject(name.to_string()))
    }

    /// Drops member geometries of a collection object for which `keep` is false.
    pub fn retain_geometries(
        &mut self,
        name: &str,
        keep: impl Fn(&TopoGeometry) -> bool,
    ) -> Result<(), MalformedTopologyError> {
        let object = self
            .objects
            .get_mut(name)
            .ok_or_else(|| MalformedTopologyError::UnknownObject(name.to_string()))?;
        if let TopoGeometryKind::GeometryCollection { geometries } = &mut object.kind {
            geometries.retain(|g| keep(g));
        }
        Ok(())
    }

    /// Polygon features of an object, with rings stitched from their arcs.
    pub fn feature_rings(&self, name: &str) -> Result<Vec<TopoFeature>, MalformedTopologyError> {
        let decoded = self.decode_arcs()?;
        let mut out = Vec::new();
        collect_features(self.object(name)?, &decoded, &mut out)?;
        Ok(out)
    }

    /// Arcs of an object selected by how many geometries share them.
    pub fn mesh(
        &self,
        name: &str,
        selection: MeshSelection,
    ) -> Result<Vec<Vec<Point>>, MalformedTopologyError> {
        let decoded = self.decode_arcs()?;
        // arc index -> (first signed reference, first geometry, last geometry)
        let mut refs: BTreeMap<usize, (i64, usize, usize)> = BTreeMap::new();
        let mut leaf = 0usize;
        collect_arc_refs(self.object(name)?, decoded.len(), &mut leaf, &mut refs)?;

        let mut lines = Vec::new();
        for (arc, (signed, first, last)) in refs {
            let keep = match selection {
                MeshSelection::All => true,
                MeshSelection::Exterior => first == last,
                MeshSelection::Interior => first != last,
            };
            if !keep {
                continue;
            }
            let mut points = decoded[arc].clone();
            if signed < 0 {
                points.reverse();
            }
            lines.push(points);
        }
        Ok(lines)
    }
}

fn resolve_arc(index: i64, arcs: usize) -> Result<(usize, bool), MalformedTopologyError> {
    let (arc, reversed) = if index < 0 { (!index, true) } else { (index, false) };
    if arc as usize >= arcs {
        return Err(MalformedTopologyError::ArcIndex { index, arcs });
    }
    Ok((arc as usize, reversed))
}

/// Joins consecutive arcs into one ring; the shared joint point appears once.
pub fn stitch_ring(indices: &[i64], decoded: &[Vec<Point>]) -> Result<Vec<Point>, MalformedTopologyError> {
    let mut ring: Vec<Point> = Vec::new();
    for &index in indices {
        let (arc, reversed) = resolve_arc(index, decoded.len())?;
        if !ring.is_empty() {
            ring.pop();
        }
        if reversed {
            ring.extend(decoded[arc].iter().rev());
        } else {
            ring.extend(decoded[arc].iter());
        }
    }
    Ok(ring)
}

fn stitch_polygon(rings: &[Vec<i64>], decoded: &[Vec<Point>]) -> Result<Polygon, MalformedTopologyError> {
    rings.iter().map(|r| stitch_ring(r, decoded)).collect()
}

fn collect_features(
    geom: &TopoGeometry,
    decoded: &[Vec<Point>],
    out: &mut Vec<TopoFeature>,
) -> Result<(), MalformedTopologyError> {
    let polygons = match &geom.kind {
        TopoGeometryKind::GeometryCollection { geometries } => {
            for g in geometries {
                collect_features(g, decoded, out)?;
            }
            return Ok(());
        }
        TopoGeometryKind::Polygon { arcs } => vec![stitch_polygon(arcs, decoded)?],
        TopoGeometryKind::MultiPolygon { arcs } => arcs
            .iter()
            .map(|p| stitch_polygon(p, decoded))
            .collect::<Result<_, _>>()?,
        _ => return Ok(()),
    };
    out.push(TopoFeature {
        id: geom.id.clone(),
        properties: geom.properties.clone(),
        polygons,
    });
    Ok(())
}

fn collect_arc_refs(
    geom: &TopoGeometry,
    arcs: usize,
    leaf: &mut usize,
    refs: &mut BTreeMap<usize, (i64, usize, usize)>,
) -> Result<(), MalformedTopologyError> {
    let mut record = |index: i64, geometry: usize| -> Result<(), MalformedTopologyError> {
        let (arc, _) = resolve_arc(index, arcs)?;
        refs.entry(arc)
            .and_modify(|e| e.2 = geometry)
            .or_insert((index, geometry, geometry));
        Ok(())
    };

    match &geom.kind {
        TopoGeometryKind::GeometryCollection { geometries } => {
            for g in geometries {
                collect_arc_refs(g, arcs, leaf, refs)?;
            }
            return Ok(());
        }
        TopoGeometryKind::LineString { arcs: list } => {
            for &i in list {
                record(i, *leaf)?;
            }
        }
        TopoGeometryKind::MultiLineString { arcs: lists } | TopoGeometryKind::Polygon { arcs: lists } => {
            for &i in lists.iter().flatten() {
                record(i, *leaf)?;
            }
        }
        TopoGeometryKind::MultiPolygon { arcs: polys } => {
            for &i in polys.iter().flatten().flatten() {
                record(i, *leaf)?;
            }
        }
        TopoGeometryKind::Point { .. } | TopoGeometryKind::MultiPoint { .. } => {}
    }
    *leaf += 1;
    Ok(())
}
