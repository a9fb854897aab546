use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::event::{self, EventSender, MonitorEvent};
use crate::session::HistorySession;
use crate::source::{HttpSource, SensorSource};
use crate::status::StatusPoller;
use crate::types::{ActuatorStatus, Position};
use crate::window::RollingWindow;

/// Point-in-time view of one actuator.
#[derive(Debug, Clone, Serialize)]
pub struct ActuatorSnapshot {
    pub id: String,
    pub name: String,
    pub status: ActuatorStatus,
    pub position: Position,
    pub window: RollingWindow,
}

/// Every history session plus the status poller, wired to one event channel.
pub struct Monitor {
    sessions: Vec<HistorySession>,
    status: StatusPoller,
    events: EventSender,
}

impl Monitor {
    pub fn new(config: MonitorConfig, source: Arc<dyn SensorSource>) -> Self {
        let events = event::channel();
        let sessions = config
            .actuators
            .iter()
            .map(|a| {
                HistorySession::new(
                    a.clone(),
                    source.clone(),
                    config.window_capacity,
                    config.poll_interval(),
                    events.clone(),
                )
            })
            .collect();
        let status = StatusPoller::new(
            config.actuators.clone(),
            source,
            config.status_interval(),
            events.clone(),
        );
        Self {
            sessions,
            status,
            events,
        }
    }

    /// Validate `config` and build a monitor talking HTTP to `config.base_url`.
    pub fn from_config(config: MonitorConfig) -> Result<Self> {
        config.ensure_valid()?;
        let source = HttpSource::from_config(&config)?;
        Ok(Self::new(config, Arc::new(source)))
    }

    pub fn start(&self) {
        for session in &self.sessions {
            session.start();
        }
        self.status.start();
    }

    pub fn stop(&self) {
        for session in &self.sessions {
            session.stop();
        }
        self.status.stop();
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running() || self.sessions.iter().any(HistorySession::is_running)
    }

    pub fn snapshot(&self) -> Vec<ActuatorSnapshot> {
        self.sessions
            .iter()
            .map(|session| {
                let actuator = session.actuator();
                let status = self.status.status(&actuator.id).unwrap_or_default();
                ActuatorSnapshot {
                    id: actuator.id.clone(),
                    name: actuator.display_name().to_string(),
                    position: status.position(),
                    status,
                    window: session.window(),
                }
            })
            .collect()
    }

    pub fn actuator(&self, id: &str) -> Result<ActuatorSnapshot> {
        self.snapshot()
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| MonitorError::UnknownActuator(id.to_string()))
    }

    pub fn window(&self, id: &str) -> Result<RollingWindow> {
        self.session(id).map(HistorySession::window)
    }

    pub fn status(&self, id: &str) -> Result<ActuatorStatus> {
        self.status
            .status(id)
            .ok_or_else(|| MonitorError::UnknownActuator(id.to_string()))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    fn session(&self, id: &str) -> Result<&HistorySession> {
        self.sessions
            .iter()
            .find(|s| s.actuator().id == id)
            .ok_or_else(|| MonitorError::UnknownActuator(id.to_string()))
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StatusReport;
    use crate::testing::ScriptedSource;
    use crate::types::SensorSample;
    use std::time::Duration;

    fn quiet_config() -> MonitorConfig {
        MonitorConfig {
            poll_interval_ms: 3_600_000,
            status_interval_ms: 3_600_000,
            window_capacity: 5,
            ..MonitorConfig::default()
        }
    }

    #[tokio::test]
    async fn unknown_actuator_is_an_error() {
        let monitor = Monitor::new(quiet_config(), Arc::new(ScriptedSource::new()));
        assert!(matches!(
            monitor.window("cylinder-9"),
            Err(MonitorError::UnknownActuator(id)) if id == "cylinder-9"
        ));
        assert!(monitor.status("cylinder-9").is_err());
        assert!(monitor.actuator("cylinder-9").is_err());
    }

    #[tokio::test]
    async fn snapshot_before_start_is_empty_and_undefined() {
        let monitor = Monitor::new(quiet_config(), Arc::new(ScriptedSource::new()));
        let snap = monitor.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].id, "cylinder-1");
        assert_eq!(snap[0].name, "Cilindro 1");
        assert!(snap[0].window.is_empty());
        assert_eq!(snap[0].window.capacity(), 5);
        assert_eq!(snap[0].position, Position::Undefined);
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn start_drives_every_actuator_and_status() {
        let source = Arc::new(ScriptedSource::new());
        source.set_default_history(
            "Avancado_1S2",
            vec![SensorSample::new("2024-05-01T10:00:00Z", true)],
        );
        source.set_default_history(
            "Recuado_2S1",
            vec![SensorSample::new("2024-05-01T10:00:00Z", true)],
        );
        let report: StatusReport = [
            ("statusCilindro1", "AVANÇADO"),
            ("statusCilindro2", "RECUADO"),
        ]
        .into_iter()
        .collect();
        source.set_default_status(report);

        let monitor = Monitor::new(quiet_config(), source);
        let mut events = monitor.subscribe_events();
        monitor.start();
        assert!(monitor.is_running());

        // two window updates + two status updates
        for _ in 0..4 {
            tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .expect("timed out waiting for event")
                .unwrap();
        }

        let one = monitor.actuator("cylinder-1").unwrap();
        assert_eq!(one.window.latest().unwrap().position, Position::Extended);
        assert_eq!(one.position, Position::Extended);
        let two = monitor.actuator("cylinder-2").unwrap();
        assert_eq!(two.window.latest().unwrap().position, Position::Retracted);
        assert_eq!(monitor.status("cylinder-2").unwrap().label, "RECUADO");

        monitor.stop();
        assert!(!monitor.is_running());
        assert!(monitor.window("cylinder-1").unwrap().is_empty());
        assert_eq!(monitor.status("cylinder-1").unwrap().label, "AVANÇADO");
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let config = MonitorConfig {
            base_url: "localhost:5000".into(),
            ..MonitorConfig::default()
        };
        assert!(matches!(
            Monitor::from_config(config),
            Err(MonitorError::InvalidConfig(_))
        ));
    }
}
