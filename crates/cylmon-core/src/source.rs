use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::types::SensorSample;

pub const HISTORY_PATH: &str = "/api/cylinder/history";
pub const STATUS_PATH: &str = "/api/cylinder/status";

// ---------------------------------------------------------------------------
// StatusReport
// ---------------------------------------------------------------------------

/// The aggregate status object, e.g.
/// `{ "statusCilindro1": "AVANÇADO", "statusCilindro2": "RECUADO" }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    fields: Map<String, Value>,
}

impl StatusReport {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The label stored under `field`, if present and a string.
    pub fn label(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StatusReport {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// SensorSource
// ---------------------------------------------------------------------------

/// Read side of the cylinder history/status service.
///
/// Implementations do not retry; a failed call fails the tick that made it.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// All recent samples for one sensor tag, in no particular order.
    async fn history(&self, tag: &str) -> Result<Vec<SensorSample>>;

    /// The aggregate status object for every actuator.
    async fn status(&self) -> Result<StatusReport>;
}

// ---------------------------------------------------------------------------
// HttpSource
// ---------------------------------------------------------------------------

/// [`SensorSource`] backed by the service's JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| MonitorError::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    /// GET `path` and decode the JSON body. Errors carry the final request
    /// URL, query string encoded.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .get(&url)
            .query(query)
            .build()
            .map_err(|source| MonitorError::Transport {
                url: url.clone(),
                source,
            })?;
        let label = request.url().to_string();

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| MonitorError::Transport {
                url: label.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::HttpStatus {
                url: label,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| MonitorError::Transport {
                url: label.clone(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|e| MonitorError::MalformedPayload {
            url: label,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl SensorSource for HttpSource {
    async fn history(&self, tag: &str) -> Result<Vec<SensorSample>> {
        if tag.trim().is_empty() {
            return Err(MonitorError::EmptySensorId);
        }
        self.get_json(HISTORY_PATH, &[("tag", tag)]).await
    }

    async fn status(&self) -> Result<StatusReport> {
        let fields: Map<String, Value> = self.get_json(STATUS_PATH, &[]).await?;
        Ok(StatusReport::new(fields))
    }
}
