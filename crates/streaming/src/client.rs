//! Backend client: one method per endpoint, behind the [`Backend`] trait so
//! the controller can run against an in-memory backend in tests.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::protocol::{
    BoundingBoxResponse, DistributionRequest, EnsembleSample, GaugeRecord, HydrographResponse,
    InflationHydrographRequest, LinkRecord, MapDataRequest, StateVariableHydrographRequest,
    UiParametersResponse, endpoints,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A backend call failed. Recoverable: the caller keeps its previous view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFetchError {
    /// Connection, timeout or other transport failure.
    Transport { endpoint: String, message: String },
    /// Non-success HTTP status.
    Status { endpoint: String, status: u16 },
    /// The body was not the expected JSON shape.
    Decode { endpoint: String, message: String },
}

impl DataFetchError {
    pub fn endpoint(&self) -> &str {
        match self {
            DataFetchError::Transport { endpoint, .. }
            | DataFetchError::Status { endpoint, .. }
            | DataFetchError::Decode { endpoint, .. } => endpoint,
        }
    }
}

impl std::fmt::Display for DataFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFetchError::Transport { endpoint, message } => {
                write!(f, "request to {endpoint} failed: {message}")
            }
            DataFetchError::Status { endpoint, status } => {
                write!(f, "{endpoint} returned HTTP {status}")
            }
            DataFetchError::Decode { endpoint, message } => {
                write!(f, "could not decode {endpoint} response: {message}")
            }
        }
    }
}

impl std::error::Error for DataFetchError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Use `/getStateData` and `/getEnsembleData` instead of the current names.
    pub legacy_endpoints: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 30_000,
            legacy_endpoints: false,
        }
    }
}

impl ClientConfig {
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    pub fn map_data_endpoint(&self) -> &'static str {
        if self.legacy_endpoints {
            endpoints::LEGACY_MAP_DATA
        } else {
            endpoints::MAP_DATA
        }
    }

    pub fn distribution_endpoint(&self) -> &'static str {
        if self.legacy_endpoints {
            endpoints::LEGACY_DISTRIBUTION_DATA
        } else {
            endpoints::DISTRIBUTION_DATA
        }
    }
}

/// The data-assimilation backend.
pub trait Backend: Send + Sync {
    fn bounding_box(&self) -> BoxFuture<'_, Result<BoundingBoxResponse, DataFetchError>>;

    fn ui_parameters(&self) -> BoxFuture<'_, Result<UiParametersResponse, DataFetchError>>;

    fn map_data(
        &self,
        request: MapDataRequest,
    ) -> BoxFuture<'_, Result<Vec<LinkRecord>, DataFetchError>>;

    fn gauge_locations(&self) -> BoxFuture<'_, Result<Vec<GaugeRecord>, DataFetchError>>;

    fn distribution_data(
        &self,
        request: DistributionRequest,
    ) -> BoxFuture<'_, Result<Vec<EnsembleSample>, DataFetchError>>;

    fn hydrograph_state_variable(
        &self,
        request: StateVariableHydrographRequest,
    ) -> BoxFuture<'_, Result<HydrographResponse, DataFetchError>>;

    fn hydrograph_inflation(
        &self,
        request: InflationHydrographRequest,
    ) -> BoxFuture<'_, Result<HydrographResponse, DataFetchError>>;
}

/// JSON-over-HTTP backend.
pub struct HttpBackend {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, DataFetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| DataFetchError::Transport {
                endpoint: config.base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get(&self, endpoint: &str) -> Result<String, DataFetchError> {
        let url = self.config.url(endpoint);
        debug!("GET {url}");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(endpoint, e))?;
        read_body(endpoint, resp).await
    }

    async fn post<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<String, DataFetchError> {
        let url = self.config.url(endpoint);
        debug!("POST {url}");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(endpoint, e))?;
        read_body(endpoint, resp).await
    }
}

fn transport(endpoint: &str, err: reqwest::Error) -> DataFetchError {
    warn!("request to {endpoint} failed: {err}");
    DataFetchError::Transport {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    }
}

async fn read_body(endpoint: &str, resp: reqwest::Response) -> Result<String, DataFetchError> {
    let status = resp.status();
    if !status.is_success() {
        warn!("{endpoint} returned {status}");
        return Err(DataFetchError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    resp.text().await.map_err(|e| transport(endpoint, e))
}

/// Rewrites the bare `NaN`, `Infinity` and `-Infinity` tokens that Python's
/// `json.dumps` emits as `null`. String contents are left alone.
pub fn null_non_finite(body: &str) -> Cow<'_, str> {
    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];
    let bytes = body.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        match TOKENS.iter().find(|t| bytes[i..].starts_with(t.as_bytes())) {
            Some(token) => {
                let out = out.get_or_insert_with(|| String::with_capacity(body.len()));
                out.push_str(&body[copied..i]);
                out.push_str("null");
                i += token.len();
                copied = i;
            }
            None => i += 1,
        }
    }
    match out {
        Some(mut out) => {
            out.push_str(&body[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(body),
    }
}

/// Parses a response body, tagging failures with the endpoint.
pub fn decode_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, DataFetchError> {
    serde_json::from_str(&null_non_finite(body)).map_err(|e| DataFetchError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Parses a JSON array record by record. Records that do not fit `T` are
/// skipped with a warning; only a body that is not an array fails.
pub fn decode_records<T: DeserializeOwned>(
    endpoint: &str,
    body: &str,
) -> Result<Vec<T>, DataFetchError> {
    let raw: Vec<serde_json::Value> = decode_body(endpoint, body)?;
    let total = raw.len();
    let records: Vec<T> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(endpoint, index, error = %e, "malformed record; skipped");
                None
            }
        })
        .collect();
    if records.len() < total {
        debug!(endpoint, kept = records.len(), total, "partial response");
    }
    Ok(records)
}

impl Backend for HttpBackend {
    fn bounding_box(&self) -> BoxFuture<'_, Result<BoundingBoxResponse, DataFetchError>> {
        Box::pin(async move {
            let body = self.get(endpoints::BOUNDING_BOX).await?;
            decode_body(endpoints::BOUNDING_BOX, &body)
        })
    }

    fn ui_parameters(&self) -> BoxFuture<'_, Result<UiParametersResponse, DataFetchError>> {
        Box::pin(async move {
            let body = self.get(endpoints::UI_PARAMETERS).await?;
            decode_body(endpoints::UI_PARAMETERS, &body)
        })
    }

    fn map_data(
        &self,
        request: MapDataRequest,
    ) -> BoxFuture<'_, Result<Vec<LinkRecord>, DataFetchError>> {
        Box::pin(async move {
            let endpoint = self.config.map_data_endpoint();
            let body = self.post(endpoint, &request).await?;
            decode_records(endpoint, &body)
        })
    }

    fn gauge_locations(&self) -> BoxFuture<'_, Result<Vec<GaugeRecord>, DataFetchError>> {
        Box::pin(async move {
            let body = self.get(endpoints::GAUGE_LOCATIONS).await?;
            decode_records(endpoints::GAUGE_LOCATIONS, &body)
        })
    }

    fn distribution_data(
        &self,
        request: DistributionRequest,
    ) -> BoxFuture<'_, Result<Vec<EnsembleSample>, DataFetchError>> {
        Box::pin(async move {
            let endpoint = self.config.distribution_endpoint();
            let body = self.post(endpoint, &request).await?;
            decode_records(endpoint, &body)
        })
    }

    fn hydrograph_state_variable(
        &self,
        request: StateVariableHydrographRequest,
    ) -> BoxFuture<'_, Result<HydrographResponse, DataFetchError>> {
        Box::pin(async move {
            let body = self
                .post(endpoints::HYDROGRAPH_STATE_VARIABLE, &request)
                .await?;
            decode_body(endpoints::HYDROGRAPH_STATE_VARIABLE, &body)
        })
    }

    fn hydrograph_inflation(
        &self,
        request: InflationHydrographRequest,
    ) -> BoxFuture<'_, Result<HydrographResponse, DataFetchError>> {
        Box::pin(async move {
            let body = self.post(endpoints::HYDROGRAPH_INFLATION, &request).await?;
            decode_body(endpoints::HYDROGRAPH_INFLATION, &body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Backend, ClientConfig, DataFetchError, HttpBackend, decode_body, decode_records,
        null_non_finite,
    };
    use crate::protocol::{
        Aggregation, DaStage, GaugeRecord, HydrographResponse, Inflation, LinkRecord,
        MapDataRequest, endpoints,
    };
    use foundation::{LinkId, Timestamp};
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one HTTP request with `status` and `body`; the task yields the
    /// request line it saw.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                let Some(end) = text.find("\r\n\r\n") else {
                    continue;
                };
                let length = text[..end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            let text = String::from_utf8_lossy(&buf);
            text.lines().next().unwrap_or_default().to_string()
        });
        (base_url, task)
    }

    fn backend(base_url: String, legacy_endpoints: bool) -> HttpBackend {
        HttpBackend::new(ClientConfig {
            base_url,
            timeout_ms: 5_000,
            legacy_endpoints,
        })
        .unwrap()
    }

    fn map_request() -> MapDataRequest {
        MapDataRequest {
            state_variable: "qlink1".to_string(),
            aggregation: Aggregation::Mean,
            da_stage: DaStage::Analysis,
            inflation: Inflation::None,
            timestamp: Timestamp::parse("2019060100").unwrap(),
        }
    }

    const MAP_BODY: &str = r#"[
        {"linkID": 1, "qlink1": NaN, "line": {"type": "LineString", "coordinates": [[-90, 38], [-89.8, 38.1]]}},
        {"linkID": 2, "qlink1": 4.5, "line": {"type": "LineString", "coordinates": [[-91, 39]]}},
        {"linkID": 3, "qlink1": 2.0, "line": {"type": "LineString", "coordinates": [[-92, 40], [-92.1, 40.2]]}},
        {"linkID": "x", "qlink1": 1.0}
    ]"#;

    #[test]
    fn urls_join_without_double_slash() {
        let config = ClientConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.url(endpoints::BOUNDING_BOX),
            "http://localhost:8000/getLonLatBoundingBox"
        );
    }

    #[test]
    fn legacy_endpoint_names() {
        let mut config = ClientConfig::default();
        assert_eq!(config.map_data_endpoint(), "/getMapData");
        config.legacy_endpoints = true;
        assert_eq!(config.map_data_endpoint(), "/getStateData");
        assert_eq!(config.distribution_endpoint(), "/getEnsembleData");
    }

    #[test]
    fn decode_errors_name_the_endpoint() {
        let err = decode_body::<Vec<GaugeRecord>>(endpoints::GAUGE_LOCATIONS, "{not json")
            .unwrap_err();
        assert!(matches!(err, DataFetchError::Decode { .. }));
        assert_eq!(err.endpoint(), "/getGaugeLocations");
    }

    #[test]
    fn config_from_partial_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "http://dart:9000"}"#).unwrap();
        assert_eq!(config.base_url, "http://dart:9000");
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn non_finite_tokens_become_null_outside_strings() {
        assert_eq!(
            null_non_finite(r#"[NaN, -Infinity, Infinity, "NaN", "a\"NaN", 1.5]"#),
            r#"[null, null, null, "NaN", "a\"NaN", 1.5]"#
        );
        assert!(matches!(null_non_finite("[1, 2]"), std::borrow::Cow::Borrowed(_)));
    }

    #[test]
    fn bad_records_are_skipped_not_fatal() {
        let records: Vec<LinkRecord> = decode_records(endpoints::MAP_DATA, MAP_BODY).unwrap();
        let ids: Vec<LinkId> = records.iter().map(|r| r.link_id).collect();
        assert_eq!(ids, vec![LinkId(1), LinkId(2), LinkId(3)]);
        // NaN decodes as a missing value, the one-point line as no geometry.
        assert_eq!(records[0].value("qlink1"), None);
        assert!(records[0].line.is_some());
        assert_eq!(records[1].value("qlink1"), Some(4.5));
        assert!(records[1].line.is_none());
        assert_eq!(records[2].value("qlink1"), Some(2.0));
        assert!(records[2].line.is_some());
    }

    #[test]
    fn non_array_body_still_fails() {
        let err = decode_records::<LinkRecord>(endpoints::MAP_DATA, r#"{"error": "x"}"#)
            .unwrap_err();
        assert!(matches!(err, DataFetchError::Decode { .. }));
    }

    #[test]
    fn nan_hydrograph_points_are_gaps() {
        let h: HydrographResponse = decode_body(
            endpoints::HYDROGRAPH_STATE_VARIABLE,
            r#"{"linkID": 5, "data": [
                {"timestamp": "2019060100", "forecast": NaN, "analysis": 1.2},
                {"timestamp": "2019060101", "forecast": 1.4, "analysis": null}
            ]}"#,
        )
        .unwrap();
        assert_eq!(h.data[0].forecast, None);
        assert_eq!(h.data[0].analysis, Some(1.2));
        assert_eq!(h.data[1].analysis, None);
    }

    #[tokio::test]
    async fn map_data_over_http_keeps_good_records() {
        let (base_url, server) = serve_once("200 OK", MAP_BODY).await;
        let records = backend(base_url, false).map_data(map_request()).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(server.await.unwrap(), "POST /getMapData HTTP/1.1");
    }

    #[tokio::test]
    async fn legacy_names_are_requested() {
        let (base_url, server) = serve_once("200 OK", "[]").await;
        let records = backend(base_url, true).map_data(map_request()).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(server.await.unwrap(), "POST /getStateData HTTP/1.1");
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let (base_url, server) = serve_once("500 Internal Server Error", "{}").await;
        let err = backend(base_url, false).gauge_locations().await.unwrap_err();
        assert_eq!(
            err,
            DataFetchError::Status {
                endpoint: "/getGaugeLocations".to_string(),
                status: 500,
            }
        );
        assert_eq!(server.await.unwrap(), "GET /getGaugeLocations HTTP/1.1");
    }

    #[tokio::test]
    async fn malformed_body_maps_to_decode() {
        let (base_url, server) = serve_once("200 OK", "{\"bbox\": ").await;
        let err = backend(base_url, false).bounding_box().await.unwrap_err();
        assert!(matches!(err, DataFetchError::Decode { .. }));
        assert_eq!(err.endpoint(), "/getLonLatBoundingBox");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_maps_to_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let err = backend(base_url, false).ui_parameters().await.unwrap_err();
        assert!(matches!(err, DataFetchError::Transport { .. }));
        assert_eq!(err.endpoint(), "/getUIParameters");
    }
}
