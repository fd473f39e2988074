//! In-memory backend that serves a recorded set of responses.
//!
//! Used for offline rendering (`hydrovis render --snapshot FILE`) and for
//! driving the controller in tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use foundation::Timestamp;
use serde::{Deserialize, Serialize};
use streaming::{
    Backend, BoundingBoxResponse, BoxFuture, DataFetchError, DistributionRequest, EnsembleSample,
    GaugeRecord, HydrographResponse, InflationHydrographRequest, LinkRecord, MapDataRequest,
    StateVariableHydrographRequest, UiParametersResponse, endpoints, null_non_finite,
};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub bounding_box: Option<BoundingBoxResponse>,
    pub ui_parameters: Option<UiParametersResponse>,
    /// Served for any timestamp without its own entry.
    pub map_data: Option<Vec<LinkRecord>>,
    pub map_data_by_timestamp: BTreeMap<Timestamp, Vec<LinkRecord>>,
    pub gauge_locations: Option<Vec<GaugeRecord>>,
    pub distribution_data: Option<Vec<EnsembleSample>>,
    pub hydrograph_state_variable: Option<HydrographResponse>,
    pub hydrograph_inflation: Option<HydrographResponse>,
}

impl Snapshot {
    /// Parses a recorded snapshot; bare `NaN` and `Infinity` values load as
    /// missing, the way backend responses do.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&null_non_finite(text))
    }
}

pub struct SnapshotBackend {
    snapshot: Snapshot,
    calls: Mutex<Vec<&'static str>>,
}

fn missing(endpoint: &str) -> DataFetchError {
    DataFetchError::Status {
        endpoint: endpoint.to_string(),
        status: 404,
    }
}

impl SnapshotBackend {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Endpoints requested so far, in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, endpoint: &'static str) {
        debug!(endpoint, "snapshot request");
        match self.calls.lock() {
            Ok(mut calls) => calls.push(endpoint),
            Err(poisoned) => poisoned.into_inner().push(endpoint),
        }
    }

    fn serve<T: Clone>(
        &self,
        endpoint: &'static str,
        value: Option<&T>,
    ) -> Result<T, DataFetchError> {
        self.record(endpoint);
        value.cloned().ok_or_else(|| missing(endpoint))
    }
}

impl Backend for SnapshotBackend {
    fn bounding_box(&self) -> BoxFuture<'_, Result<BoundingBoxResponse, DataFetchError>> {
        Box::pin(async move {
            self.serve(endpoints::BOUNDING_BOX, self.snapshot.bounding_box.as_ref())
        })
    }

    fn ui_parameters(&self) -> BoxFuture<'_, Result<UiParametersResponse, DataFetchError>> {
        Box::pin(async move {
            self.serve(endpoints::UI_PARAMETERS, self.snapshot.ui_parameters.as_ref())
        })
    }

    fn map_data(
        &self,
        request: MapDataRequest,
    ) -> BoxFuture<'_, Result<Vec<LinkRecord>, DataFetchError>> {
        Box::pin(async move {
            let records = self
                .snapshot
                .map_data_by_timestamp
                .get(&request.timestamp)
                .or(self.snapshot.map_data.as_ref());
            self.serve(endpoints::MAP_DATA, records)
        })
    }

    fn gauge_locations(&self) -> BoxFuture<'_, Result<Vec<GaugeRecord>, DataFetchError>> {
        Box::pin(async move {
            self.serve(
                endpoints::GAUGE_LOCATIONS,
                self.snapshot.gauge_locations.as_ref(),
            )
        })
    }

    fn distribution_data(
        &self,
        _request: DistributionRequest,
    ) -> BoxFuture<'_, Result<Vec<EnsembleSample>, DataFetchError>> {
        Box::pin(async move {
            self.serve(
                endpoints::DISTRIBUTION_DATA,
                self.snapshot.distribution_data.as_ref(),
            )
        })
    }

    fn hydrograph_state_variable(
        &self,
        _request: StateVariableHydrographRequest,
    ) -> BoxFuture<'_, Result<HydrographResponse, DataFetchError>> {
        Box::pin(async move {
            self.serve(
                endpoints::HYDROGRAPH_STATE_VARIABLE,
                self.snapshot.hydrograph_state_variable.as_ref(),
            )
        })
    }

    fn hydrograph_inflation(
        &self,
        _request: InflationHydrographRequest,
    ) -> BoxFuture<'_, Result<HydrographResponse, DataFetchError>> {
        Box::pin(async move {
            self.serve(
                endpoints::HYDROGRAPH_INFLATION,
                self.snapshot.hydrograph_inflation.as_ref(),
            )
        })
    }
}
