use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::Error as _, Deserialize, Deserializer};
use tracing::debug;

use crate::domain::{parse_period, HourWindow, Observation, PeriodError, SeriesKind};

pub const DEFAULT_BASE_URL: &str = "https://api.eia.gov/v2/electricity/rto/region-data/data/";

/// Largest `length` the provider honours for a single request.
pub const MAX_PAGE_SIZE: usize = 5000;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request for series {kind} at offset {offset} failed: {source}")]
    Transport {
        kind: SeriesKind,
        offset: usize,
        #[source]
        source: reqwest::Error,
    },
    #[error("region-data API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed region-data response: {0}")]
    Decode(String),
    #[error(transparent)]
    Period(#[from] PeriodError),
}

#[derive(Deserialize)]
struct PagePayload {
    response: PageBody,
}

#[derive(Deserialize)]
struct PageBody {
    #[serde(default)]
    data: Vec<RawRow>,
}

#[derive(Deserialize)]
struct RawRow {
    period: String,
    #[serde(deserialize_with = "deserialize_value")]
    value: Option<f64>,
}

/// Values arrive either as JSON numbers or as numeric strings; `null`
/// (and a literal NaN) means the hour has no reading.
fn deserialize_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let parsed = match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Number(v)) => Some(v),
        Some(Raw::Text(s)) => Some(
            s.trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("non-numeric value '{s}'")))?,
        ),
    };

    Ok(parsed.filter(|v| !v.is_nan()))
}

/// Decode one response body into observations of `kind`, preserving row order.
pub fn decode_page(body: &[u8], kind: SeriesKind) -> Result<Vec<Observation>, ApiError> {
    let payload: PagePayload =
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    payload
        .response
        .data
        .into_iter()
        .map(|row| -> Result<Observation, ApiError> {
            Ok(Observation {
                ts: parse_period(&row.period)?,
                kind,
                value: row.value,
            })
        })
        .collect()
}

/// Client for the EIA v2 `electricity/rto/region-data` resource.
#[derive(Clone)]
pub struct RegionDataClient {
    http: Client,
    base_url: String,
    api_key: String,
    page_size: usize,
    respondent: Option<String>,
}

impl RegionDataClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            page_size: MAX_PAGE_SIZE,
            respondent: None,
        })
    }

    /// Rows requested per call, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Restrict results to one respondent (e.g. `US48`). Without it the API
    /// returns every region for each hour.
    pub fn with_respondent(mut self, respondent: Option<String>) -> Self {
        self.respondent = respondent;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn query(&self, kind: SeriesKind, window: &HourWindow, offset: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("frequency", "hourly".to_string()),
            ("data[0]", "value".to_string()),
            ("facets[type][]", kind.facet().to_string()),
        ];
        if let Some(respondent) = &self.respondent {
            params.push(("facets[respondent][]", respondent.clone()));
        }
        params.extend([
            ("start", window.start_param()),
            ("end", window.end_param()),
            ("sort[0][column]", "period".to_string()),
            ("sort[0][direction]", "asc".to_string()),
            ("offset", offset.to_string()),
            ("length", self.page_size.to_string()),
        ]);
        params
    }

    /// Fetch the page of `kind` starting at row `offset`, sorted ascending by period.
    ///
    /// Any non-success status is returned as [`ApiError::Status`]; there is no retry.
    pub async fn fetch_page(
        &self,
        kind: SeriesKind,
        window: &HourWindow,
        offset: usize,
    ) -> Result<Vec<Observation>, ApiError> {
        // The request URL carries the API key, keep it out of error messages.
        let transport = |source: reqwest::Error| ApiError::Transport {
            kind,
            offset,
            source: source.without_url(),
        };

        let response = self
            .http
            .get(&self.base_url)
            .query(&self.query(kind, window, offset))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let body = response.bytes().await.map_err(transport)?;
        let rows = decode_page(&body, kind)?;

        debug!(series = %kind, offset, rows = rows.len(), "fetched region-data page");
        Ok(rows)
    }
}
