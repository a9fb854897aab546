use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed payload from {url}: {reason}")]
    MalformedPayload { url: String, reason: String },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("sensor identifier must not be empty")]
    EmptySensorId,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown actuator: {0}")]
    UnknownActuator(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    /// Network failure or non-success HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, MonitorError::Transport { .. } | MonitorError::HttpStatus { .. })
    }

    /// The service answered, but not with the shape we expect.
    pub fn is_malformed(&self) -> bool {
        matches!(self, MonitorError::MalformedPayload { .. })
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
