use anyhow::Context;
use clap::Args;
use cylmon_core::config::MonitorConfig;
use std::path::{Path, PathBuf};

/// Where the config comes from and which of its values the command line
/// replaces.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Config file (missing file means built-in defaults)
    #[arg(long, global = true, env = "CYLMON_CONFIG", default_value = "cylmon.yaml")]
    pub config: PathBuf,

    /// Override the sensor service base URL
    #[arg(long, global = true, env = "CYLMON_BASE_URL")]
    pub base_url: Option<String>,

    /// Override the history poll period
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Override the status poll period
    #[arg(long, global = true, value_name = "MS")]
    pub status_interval_ms: Option<u64>,

    /// Override the number of points kept per actuator
    #[arg(long, global = true, value_name = "N")]
    pub window_capacity: Option<usize>,
}

impl ConfigArgs {
    /// Load the config file (defaults when it does not exist) and apply the
    /// overrides.
    pub fn load(&self) -> anyhow::Result<MonitorConfig> {
        let mut config = load_file(&self.config)?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut MonitorConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = self.status_interval_ms {
            config.status_interval_ms = ms;
        }
        if let Some(n) = self.window_capacity {
            config.window_capacity = n;
        }
    }
}

fn load_file(path: &Path) -> anyhow::Result<MonitorConfig> {
    MonitorConfig::load_or_default(path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}
