use foundation::LonLat;
use serde::{Deserialize, Serialize};

/// GeoJSON position `[lon, lat]`.
pub type Position = [f64; 2];

/// The GeoJSON geometry objects the dashboard exchanges with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    UnexpectedType { expected: &'static str, found: &'static str },
    TooFewPoints(usize),
    NonFinite,
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::UnexpectedType { expected, found } => {
                write!(f, "expected {expected} geometry, found {found}")
            }
            GeometryError::TooFewPoints(n) => {
                write!(f, "line string needs at least 2 points, got {n}")
            }
            GeometryError::NonFinite => write!(f, "geometry has non-finite coordinates"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// A river link's course; always at least two finite points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Geometry", into = "Geometry")]
pub struct LineString {
    points: Vec<LonLat>,
}

impl LineString {
    pub fn new(points: Vec<LonLat>) -> Result<Self, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        if points.iter().any(|p| !p.lon.is_finite() || !p.lat.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[LonLat] {
        &self.points
    }

    pub fn first(&self) -> LonLat {
        self.points[0]
    }

    pub fn last(&self) -> LonLat {
        self.points[self.points.len() - 1]
    }
}

impl TryFrom<Geometry> for LineString {
    type Error = GeometryError;

    fn try_from(value: Geometry) -> Result<Self, Self::Error> {
        match value {
            Geometry::LineString { coordinates } => LineString::new(
                coordinates
                    .into_iter()
                    .map(|[lon, lat]| LonLat::new(lon, lat))
                    .collect(),
            ),
            other => Err(GeometryError::UnexpectedType {
                expected: "LineString",
                found: other.type_name(),
            }),
        }
    }
}

impl From<LineString> for Geometry {
    fn from(value: LineString) -> Self {
        Geometry::LineString {
            coordinates: value.points.iter().map(|p| [p.lon, p.lat]).collect(),
        }
    }
}
