//! The dashboard's UI parameter set and its reducer.

use foundation::{LinkId, LonLat, Timestamp, wrap_lon_once};
use serde::{Deserialize, Serialize};
use streaming::{
    Aggregation, DaStage, DistributionRequest, Inflation, InflationHydrographRequest,
    MapDataRequest, StateVariableHydrographRequest,
};

/// The link (or gauge) whose distribution and hydrographs are shown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub link_id: LinkId,
    pub src: LonLat,
    pub dst: LonLat,
}

impl Selection {
    /// `"{id} at (lon, lat)"` using the midpoint, longitude wrapped once,
    /// both rounded to 2 decimals.
    pub fn label(&self) -> String {
        let lon = wrap_lon_once((self.src.lon + self.dst.lon) / 2.0);
        let lat = (self.src.lat + self.dst.lat) / 2.0;
        format!(
            "{} at ({}, {})",
            self.link_id,
            (lon * 100.0).round() / 100.0,
            (lat * 100.0).round() / 100.0
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiParameters {
    pub state_variable: String,
    pub aggregation: Aggregation,
    pub da_stage: DaStage,
    pub inflation: Inflation,
    pub timestamp: Timestamp,
    pub selection: Option<Selection>,
    pub read_from_gauge_location: bool,
    pub show_gauge_locations: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamAction {
    SetStateVariable(String),
    SetAggregation(Aggregation),
    SetDaStage(DaStage),
    SetInflation(Inflation),
    SetTimestamp(Timestamp),
    SetShowGaugeLocations(bool),
    /// Click on a link: selection spans its first two vertices.
    SelectLink {
        link_id: LinkId,
        src: LonLat,
        dst: LonLat,
    },
    /// Click on a gauge: reads observations at the gauge.
    SelectGauge { link_id: LinkId, location: LonLat },
}

/// Which views must re-render after a parameter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderTrigger {
    /// Link layer and legend.
    pub map: bool,
    pub gauges: bool,
    pub distribution: bool,
    pub hydrograph: bool,
    pub hydrograph_inflation: bool,
}

impl RenderTrigger {
    pub const NONE: RenderTrigger = RenderTrigger {
        map: false,
        gauges: false,
        distribution: false,
        hydrograph: false,
        hydrograph_inflation: false,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Views whose inputs differ between `old` and `new`.
    pub fn between(old: &UiParameters, new: &UiParameters) -> Self {
        let variable = old.state_variable != new.state_variable;
        let selection = old.selection != new.selection
            || old.read_from_gauge_location != new.read_from_gauge_location;
        let selected = new.selection.is_some();
        RenderTrigger {
            map: variable
                || old.aggregation != new.aggregation
                || old.da_stage != new.da_stage
                || old.inflation != new.inflation
                || old.timestamp != new.timestamp,
            gauges: old.show_gauge_locations != new.show_gauge_locations,
            distribution: selected && (selection || variable || old.timestamp != new.timestamp),
            hydrograph: selected && (selection || variable || old.aggregation != new.aggregation),
            hydrograph_inflation: selected
                && (selection || variable || old.inflation != new.inflation),
        }
    }
}

impl UiParameters {
    /// Defaults for a freshly loaded dataset: first variable, earliest timestamp.
    pub fn initial(state_variable: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            state_variable: state_variable.into(),
            aggregation: Aggregation::Mean,
            da_stage: DaStage::Analysis,
            inflation: Inflation::None,
            timestamp,
            selection: None,
            read_from_gauge_location: false,
            show_gauge_locations: false,
        }
    }

    /// Returns the updated parameters and the views that need re-rendering.
    /// Setting a field to its current value triggers nothing.
    pub fn apply(&self, action: ParamAction) -> (UiParameters, RenderTrigger) {
        let mut next = self.clone();
        match action {
            ParamAction::SetStateVariable(v) => next.state_variable = v,
            ParamAction::SetAggregation(a) => next.aggregation = a,
            ParamAction::SetDaStage(d) => next.da_stage = d,
            ParamAction::SetInflation(i) => next.inflation = i,
            ParamAction::SetTimestamp(t) => next.timestamp = t,
            ParamAction::SetShowGaugeLocations(show) => next.show_gauge_locations = show,
            ParamAction::SelectLink { link_id, src, dst } => {
                next.selection = Some(Selection { link_id, src, dst });
                next.read_from_gauge_location = false;
            }
            ParamAction::SelectGauge { link_id, location } => {
                next.selection = Some(Selection {
                    link_id,
                    src: location,
                    dst: location,
                });
                next.read_from_gauge_location = true;
            }
        }
        let trigger = RenderTrigger::between(self, &next);
        (next, trigger)
    }

    pub fn map_request(&self) -> MapDataRequest {
        MapDataRequest {
            state_variable: self.state_variable.clone(),
            aggregation: self.aggregation,
            da_stage: self.da_stage,
            inflation: self.inflation,
            timestamp: self.timestamp,
        }
    }

    pub fn distribution_request(&self) -> Option<DistributionRequest> {
        let selection = self.selection?;
        Some(DistributionRequest {
            state_variable: self.state_variable.clone(),
            timestamp: self.timestamp,
            link_id: selection.link_id,
        })
    }

    pub fn hydrograph_request(&self) -> Option<StateVariableHydrographRequest> {
        let selection = self.selection?;
        Some(StateVariableHydrographRequest {
            link_id: selection.link_id,
            state_variable: self.state_variable.clone(),
            aggregation: self.aggregation,
            read_from_gauge_location: self.read_from_gauge_location,
        })
    }

    /// `None` without a selection or when inflation is off.
    pub fn hydrograph_inflation_request(&self) -> Option<InflationHydrographRequest> {
        let selection = self.selection?;
        if self.inflation.is_none() {
            return None;
        }
        Some(InflationHydrographRequest {
            link_id: selection.link_id,
            state_variable: self.state_variable.clone(),
            inflation: self.inflation,
            read_from_gauge_location: self.read_from_gauge_location,
        })
    }
}
