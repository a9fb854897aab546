use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

use crate::error::{MonitorError, Result};
use crate::window::DEFAULT_WINDOW_CAPACITY;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActuatorConfig
// ---------------------------------------------------------------------------

/// One monitored cylinder and the pair of proximity sensors bracketing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Sensor tag that reads 1 when the rod is fully extended.
    pub extended_tag: String,
    /// Sensor tag that reads 1 when the rod is fully retracted.
    pub retracted_tag: String,
    /// Field of the `/api/cylinder/status` object holding this actuator's label.
    pub status_field: String,
}

impl ActuatorConfig {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

fn default_actuators() -> Vec<ActuatorConfig> {
    vec![
        ActuatorConfig {
            id: "cylinder-1".to_string(),
            name: "Cilindro 1".to_string(),
            extended_tag: "Avancado_1S2".to_string(),
            retracted_tag: "Recuado_1S1".to_string(),
            status_field: "statusCilindro1".to_string(),
        },
        ActuatorConfig {
            id: "cylinder-2".to_string(),
            name: "Cilindro 2".to_string(),
            extended_tag: "Avancado_2S2".to_string(),
            retracted_tag: "Recuado_2S1".to_string(),
            status_field: "statusCilindro2".to_string(),
        },
    ]
}

// ---------------------------------------------------------------------------
// MonitorConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub status_interval_ms: u64,
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_actuators")]
    pub actuators: Vec<ActuatorConfig>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_interval_ms() -> u64 {
    3000
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

fn default_request_timeout_ms() -> u64 {
    2_500
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_interval_ms(),
            status_interval_ms: default_interval_ms(),
            window_capacity: default_window_capacity(),
            request_timeout_ms: default_request_timeout_ms(),
            actuators: default_actuators(),
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: MonitorConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the config atomically (tempfile in the same directory, then rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.base_url.trim().is_empty() {
            warnings.push(ConfigWarning::error("base_url is empty"));
        } else if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            warnings.push(ConfigWarning::error(format!(
                "base_url '{}' must start with http:// or https://",
                self.base_url
            )));
        }

        if self.poll_interval_ms == 0 {
            warnings.push(ConfigWarning::error("poll_interval_ms must be greater than 0"));
        }
        if self.status_interval_ms == 0 {
            warnings.push(ConfigWarning::error("status_interval_ms must be greater than 0"));
        }
        if self.window_capacity == 0 {
            warnings.push(ConfigWarning::error("window_capacity must be greater than 0"));
        }
        if self.request_timeout_ms == 0 {
            warnings.push(ConfigWarning::error("request_timeout_ms must be greater than 0"));
        } else if self.request_timeout_ms > self.poll_interval_ms && self.poll_interval_ms > 0 {
            warnings.push(ConfigWarning::warning(format!(
                "request_timeout_ms ({}) exceeds poll_interval_ms ({}); slow requests will skip ticks",
                self.request_timeout_ms, self.poll_interval_ms
            )));
        }

        if self.actuators.is_empty() {
            warnings.push(ConfigWarning::warning("no actuators configured"));
        }

        let mut ids = HashSet::new();
        let mut fields = HashSet::new();
        for actuator in &self.actuators {
            if actuator.id.trim().is_empty() {
                warnings.push(ConfigWarning::error("actuator id is empty"));
            } else if !ids.insert(actuator.id.as_str()) {
                warnings.push(ConfigWarning::error(format!(
                    "duplicate actuator id '{}'",
                    actuator.id
                )));
            }

            if actuator.extended_tag.trim().is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "actuator '{}' has an empty extended_tag",
                    actuator.id
                )));
            }
            if actuator.retracted_tag.trim().is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "actuator '{}' has an empty retracted_tag",
                    actuator.id
                )));
            }
            if !actuator.extended_tag.is_empty() && actuator.extended_tag == actuator.retracted_tag {
                warnings.push(ConfigWarning::warning(format!(
                    "actuator '{}' uses '{}' for both sensors",
                    actuator.id, actuator.extended_tag
                )));
            }

            if actuator.status_field.trim().is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "actuator '{}' has an empty status_field",
                    actuator.id
                )));
            } else if !fields.insert(actuator.status_field.as_str()) {
                warnings.push(ConfigWarning::warning(format!(
                    "status_field '{}' is shared by more than one actuator",
                    actuator.status_field
                )));
            }
        }

        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(MonitorError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}
