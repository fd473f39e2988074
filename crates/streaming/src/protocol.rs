//! Wire types for the data-assimilation backend.
//!
//! This module defines the JSON shapes for:
//! - Dataset metadata (bounding box, UI parameters)
//! - Map layers (link records, gauge records)
//! - Selection plots (ensemble samples, hydrograph series)
//!
//! Field names follow the backend's camelCase; Rust-side names are snake_case.

use std::collections::BTreeMap;

use foundation::{LinkId, LonLat, LonLatBox, Timestamp};
use formats::LineString;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Endpoint paths, relative to the backend base URL.
pub mod endpoints {
    pub const BOUNDING_BOX: &str = "/getLonLatBoundingBox";
    pub const UI_PARAMETERS: &str = "/getUIParameters";
    pub const MAP_DATA: &str = "/getMapData";
    pub const GAUGE_LOCATIONS: &str = "/getGaugeLocations";
    pub const DISTRIBUTION_DATA: &str = "/getDistributionData";
    pub const HYDROGRAPH_STATE_VARIABLE: &str = "/getHydrographStateVariableData";
    pub const HYDROGRAPH_INFLATION: &str = "/getHydrographInflationData";

    /// Older backends serve the same payloads under these names.
    pub const LEGACY_MAP_DATA: &str = "/getStateData";
    pub const LEGACY_DISTRIBUTION_DATA: &str = "/getEnsembleData";
}

/// Ensemble statistic shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AggregationRepr", into = "String")]
pub enum Aggregation {
    Mean,
    Sd,
    /// A single ensemble member, 1-based.
    Member(u32),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AggregationRepr {
    Number(u32),
    Text(String),
}

impl TryFrom<AggregationRepr> for Aggregation {
    type Error = String;

    fn try_from(value: AggregationRepr) -> Result<Self, Self::Error> {
        match value {
            AggregationRepr::Number(n) => Ok(Aggregation::Member(n)),
            AggregationRepr::Text(s) => Aggregation::parse(&s),
        }
    }
}

impl From<Aggregation> for String {
    fn from(value: Aggregation) -> Self {
        value.to_string()
    }
}

impl Aggregation {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "mean" => Ok(Aggregation::Mean),
            "sd" => Ok(Aggregation::Sd),
            other => other
                .parse::<u32>()
                .map(Aggregation::Member)
                .map_err(|_| format!("unknown aggregation {other:?}")),
        }
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggregation::Mean => write!(f, "mean"),
            Aggregation::Sd => write!(f, "sd"),
            Aggregation::Member(n) => write!(f, "{n}"),
        }
    }
}

/// Data-assimilation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaStage {
    /// Forecast, before assimilation.
    Preassim,
    Analysis,
}

impl DaStage {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "preassim" | "forecast" => Ok(DaStage::Preassim),
            "analysis" => Ok(DaStage::Analysis),
            other => Err(format!("unknown DA stage {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inflation {
    #[default]
    None,
    Priorinf,
    Postinf,
}

impl Inflation {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "none" => Ok(Inflation::None),
            "priorinf" | "prior" => Ok(Inflation::Priorinf),
            "postinf" | "posterior" => Ok(Inflation::Postinf),
            other => Err(format!("unknown inflation {other:?}")),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Inflation::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxResponse {
    pub bbox: LonLatBox,
    pub centroid: LonLat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiParametersResponse {
    pub state_variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ensemble_models: Option<u32>,
    pub timestamps: Vec<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDataRequest {
    pub state_variable: String,
    pub aggregation: Aggregation,
    pub da_stage: DaStage,
    pub inflation: Inflation,
    pub timestamp: Timestamp,
}

/// One river link with its values, keyed by `linkID`.
///
/// Every field besides `linkID` and `line` lands in `values`, keyed by
/// state-variable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(rename = "linkID")]
    pub link_id: LinkId,
    /// `None` when absent or unusable; the record itself still decodes.
    #[serde(
        default,
        deserialize_with = "lenient_line",
        skip_serializing_if = "Option::is_none"
    )]
    pub line: Option<LineString>,
    #[serde(flatten)]
    pub values: BTreeMap<String, serde_json::Value>,
}

fn lenient_line<'de, D: Deserializer<'de>>(d: D) -> Result<Option<LineString>, D::Error> {
    let Some(raw) = Option::<serde_json::Value>::deserialize(d)? else {
        return Ok(None);
    };
    match serde_json::from_value(raw) {
        Ok(line) => Ok(Some(line)),
        Err(e) => {
            warn!(error = %e, "unusable link geometry dropped");
            Ok(None)
        }
    }
}

impl LinkRecord {
    pub fn new(link_id: LinkId, line: LineString) -> Self {
        Self {
            link_id,
            line: Some(line),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, variable: &str, value: f64) -> Self {
        self.values
            .insert(variable.to_string(), serde_json::Value::from(value));
        self
    }

    /// The numeric value of `variable`, if present and finite.
    pub fn value(&self, variable: &str) -> Option<f64> {
        self.values
            .get(variable)
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeRecord {
    #[serde(rename = "linkID", alias = "gaugeID")]
    pub link_id: LinkId,
    /// `[lon, lat]`; longitude may be in `[0, 360)`.
    pub location: [f64; 2],
}

impl GaugeRecord {
    pub fn location(&self) -> LonLat {
        LonLat::new(self.location[0], self.location[1])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
    pub state_variable: String,
    pub timestamp: Timestamp,
    #[serde(rename = "linkID")]
    pub link_id: LinkId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisForecast {
    pub analysis: f64,
    pub forecast: f64,
}

/// One ensemble member's analysis and forecast value for a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSample {
    #[serde(rename = "memberID")]
    pub member_id: u32,
    #[serde(flatten)]
    pub values: BTreeMap<String, AnalysisForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateVariableHydrographRequest {
    #[serde(rename = "linkID")]
    pub link_id: LinkId,
    pub state_variable: String,
    pub aggregation: Aggregation,
    pub read_from_gauge_location: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationHydrographRequest {
    #[serde(rename = "linkID")]
    pub link_id: LinkId,
    pub state_variable: String,
    pub inflation: Inflation,
    pub read_from_gauge_location: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrographPoint {
    pub timestamp: Timestamp,
    /// `null` (or `NaN`) on the wire where the model has no value.
    #[serde(default)]
    pub forecast: Option<f64>,
    #[serde(default)]
    pub analysis: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_sd_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_sd_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_sd_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_sd_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrographResponse {
    #[serde(rename = "linkID", alias = "gaugeID")]
    pub link_id: LinkId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg: Option<Aggregation>,
    pub data: Vec<HydrographPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn aggregation_wire_forms() {
        assert_eq!(serde_json::to_string(&Aggregation::Mean).unwrap(), r#""mean""#);
        assert_eq!(serde_json::to_string(&Aggregation::Member(7)).unwrap(), r#""7""#);
        let parsed: Aggregation = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Aggregation::Member(3));
        let parsed: Aggregation = serde_json::from_str(r#""sd""#).unwrap();
        assert_eq!(parsed, Aggregation::Sd);
        assert!(serde_json::from_str::<Aggregation>(r#""median""#).is_err());
    }

    #[test]
    fn map_request_body() {
        let body = MapDataRequest {
            state_variable: "qlink1".to_string(),
            aggregation: Aggregation::Mean,
            da_stage: DaStage::Preassim,
            inflation: Inflation::None,
            timestamp: Timestamp::parse("2019060100").unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "stateVariable": "qlink1",
                "aggregation": "mean",
                "daStage": "preassim",
                "inflation": "none",
                "timestamp": "2019060100"
            })
        );
    }

    #[test]
    fn link_record_collects_variable_values() {
        let record: LinkRecord = serde_json::from_str(
            r#"{"linkID": 42, "line": {"type":"LineString","coordinates":[[-91.0,40.0],[-91.1,40.2]]}, "qlink1": 3.5}"#,
        )
        .unwrap();
        assert_eq!(record.link_id, LinkId(42));
        assert_eq!(record.value("qlink1"), Some(3.5));
        assert_eq!(record.value("z_gwsubbas"), None);
        assert!(record.line.is_some());
    }

    #[test]
    fn non_numeric_values_are_absent() {
        let record: LinkRecord =
            serde_json::from_str(r#"{"linkID": 1, "qlink1": null, "name": "x"}"#).unwrap();
        assert_eq!(record.value("qlink1"), None);
        assert_eq!(record.value("name"), None);
        assert!(record.line.is_none());
    }

    #[test]
    fn gauge_id_alias() {
        let g: GaugeRecord =
            serde_json::from_str(r#"{"gaugeID": 9, "location": [268.5, 41.25]}"#).unwrap();
        assert_eq!(g.link_id, LinkId(9));
        assert_eq!(g.location().lon, 268.5);
    }

    #[test]
    fn bounding_box_and_ui_parameters() {
        let bb: BoundingBoxResponse = serde_json::from_str(
            r#"{"bbox":{"lonMin":-126.0,"lonMax":-66.0,"latMin":22.0,"latMax":50.0},"centroid":{"lon":-95.0,"lat":38.0}}"#,
        )
        .unwrap();
        assert_eq!(bb.bbox, LonLatBox::new(-126.0, 50.0, -66.0, 22.0));

        let ui: UiParametersResponse = serde_json::from_str(
            r#"{"stateVariables":["qlink1","z_gwsubbas"],"numEnsembleModels":80,"timestamps":["2019060100","2019060106"]}"#,
        )
        .unwrap();
        assert_eq!(ui.num_ensemble_models, Some(80));
        assert_eq!(ui.timestamps[1].hour(), 6);
    }

    #[test]
    fn ensemble_samples_and_hydrograph() {
        let samples: Vec<EnsembleSample> = serde_json::from_str(
            r#"[{"memberID":0,"qlink1":{"analysis":1.5,"forecast":2.0}}]"#,
        )
        .unwrap();
        assert_eq!(samples[0].values["qlink1"].forecast, 2.0);

        let h: HydrographResponse = serde_json::from_str(
            r#"{"linkID":5,"agg":"mean","data":[{"timestamp":"2019060100","forecast":1.0,"analysis":1.2,"observation":1.1}],"lon":-90.0,"lat":40.0}"#,
        )
        .unwrap();
        assert_eq!(h.agg, Some(Aggregation::Mean));
        assert_eq!(h.data[0].observation, Some(1.1));
        assert_eq!(h.data[0].forecast_sd_min, None);
    }
}
