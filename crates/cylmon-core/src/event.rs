use serde::Serialize;
use tokio::sync::broadcast;

/// Something an observer may want to know about the polling pipelines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A history tick merged new points into an actuator's window.
    WindowUpdated { actuator: String, len: usize },
    /// The status poller published a new label for an actuator.
    StatusUpdated { actuator: String, status: String },
    /// A tick failed and nothing was applied. `actuator` is `None` for the
    /// status poller, whose payload covers every actuator at once.
    TickFailed {
        actuator: Option<String>,
        error: String,
    },
}

impl MonitorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorEvent::WindowUpdated { .. } => "window_updated",
            MonitorEvent::StatusUpdated { .. } => "status_updated",
            MonitorEvent::TickFailed { .. } => "tick_failed",
        }
    }
}

pub type EventSender = broadcast::Sender<MonitorEvent>;

pub fn channel() -> EventSender {
    let (tx, _) = broadcast::channel(256);
    tx
}

/// Send without caring whether anyone is listening.
pub(crate) fn emit(tx: &EventSender, event: MonitorEvent) {
    let _ = tx.send(event);
}
