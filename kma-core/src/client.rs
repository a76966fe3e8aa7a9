use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::{
    envelope::{ApiEnvelope, Record},
    error::{Result, TransportError},
    query::{ForecastQuery, ObservationQuery},
    reshape::{ForecastTable, to_forecast_table, to_table},
    retry::{RetryConfig, with_retry},
    table::Table,
    validate::validate,
};

pub const DEFAULT_BASE_URL: &str = "http://apis.data.go.kr/1360000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Hourly ASOS surface observations.
pub const ASOS_HOURLY_ENDPOINT: &str = "AsosHourlyInfoService/getWthrDataList";
/// Short-term (village) forecast.
pub const VILLAGE_FORECAST_ENDPOINT: &str = "VilageFcstInfoService_2.0/getVilageFcst";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

/// GET an endpoint and hand back the raw body.
#[async_trait]
pub trait Fetch: Send + Sync + fmt::Debug {
    async fn fetch(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    base_url: String,
    retry: RetryConfig,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry.clone(),
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, TransportError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let request_failed = |source| TransportError::Request {
            endpoint: endpoint.to_string(),
            source,
        };

        let res = with_retry(&self.retry, || self.http.get(&url).query(query).send())
            .await
            .map_err(request_failed)?;

        let status = res.status();
        let body = res.text().await.map_err(request_failed)?;

        if !status.is_success() {
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        debug!(endpoint, bytes = body.len(), "received response");
        Ok(body)
    }
}

/// Client for the KMA open-data endpoints.
///
/// The service key is passed in by the caller; nothing here reads it from
/// disk or the environment.
#[derive(Clone)]
pub struct KmaClient<F = HttpFetcher> {
    service_key: String,
    fetcher: F,
}

impl KmaClient<HttpFetcher> {
    pub fn new(service_key: impl Into<String>) -> Result<Self> {
        Self::with_config(service_key, &ClientConfig::default())
    }

    pub fn with_config(service_key: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_fetcher(service_key, HttpFetcher::new(config)?))
    }
}

impl<F: Fetch> KmaClient<F> {
    pub fn with_fetcher(service_key: impl Into<String>, fetcher: F) -> Self {
        Self {
            service_key: service_key.into(),
            fetcher,
        }
    }

    /// Hourly observations, one row per station-hour.
    #[instrument(skip(self), fields(station = %query.station_id))]
    pub async fn fetch_observations(&self, query: &ObservationQuery) -> Result<Table> {
        let records = self.call(ASOS_HOURLY_ENDPOINT, query.params()).await?;
        Ok(to_table(&records))
    }

    /// Short-term forecast pivoted to one row per forecast time.
    #[instrument(skip(self), fields(base = %query.dt_base(), nx = %query.nx, ny = %query.ny))]
    pub async fn fetch_forecast(&self, query: &ForecastQuery) -> Result<ForecastTable> {
        let records = self.call(VILLAGE_FORECAST_ENDPOINT, query.params()).await?;
        to_forecast_table(&records, query)
    }

    async fn call(&self, endpoint: &str, params: Vec<(&'static str, String)>) -> Result<Vec<Record>> {
        let mut query = Vec::with_capacity(params.len() + 1);
        query.push(("ServiceKey", self.service_key.clone()));
        query.extend(params);

        let raw = self.fetcher.fetch(endpoint, &query).await?;
        let envelope = ApiEnvelope::from_json(&raw)?;
        let total = envelope.total_count();
        let records = validate(envelope)?;

        if let Some(total) = total {
            if total > records.len() as u64 {
                warn!(
                    total,
                    returned = records.len(),
                    "provider holds more rows than one page; raise num_of_rows"
                );
            }
        }

        debug!(records = records.len(), "validated response");
        Ok(records)
    }
}

impl<F: fmt::Debug> fmt::Debug for KmaClient<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KmaClient")
            .field("service_key", &"<redacted>")
            .field("fetcher", &self.fetcher)
            .finish()
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
