use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::config::ActuatorConfig;
use crate::error::{MonitorError, Result};
use crate::event::{self, EventSender, MonitorEvent};
use crate::poll::PollTask;
use crate::source::{SensorSource, StatusReport, STATUS_PATH};
use crate::types::ActuatorStatus;

/// Pick each actuator's label out of the aggregate report.
///
/// All-or-nothing: if any configured field is missing or not a string the
/// whole report is rejected.
pub fn extract_statuses(
    report: &StatusReport,
    actuators: &[ActuatorConfig],
) -> Result<Vec<(String, ActuatorStatus)>> {
    actuators
        .iter()
        .map(|a| match report.label(&a.status_field) {
            Some(label) => Ok((a.id.clone(), ActuatorStatus::new(label))),
            None => Err(MonitorError::MalformedPayload {
                url: STATUS_PATH.to_string(),
                reason: format!("missing string field '{}'", a.status_field),
            }),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// StatusPoller
// ---------------------------------------------------------------------------

/// Periodically fetches the aggregate status and publishes one
/// [`ActuatorStatus`] per actuator.
///
/// Each actuator's status is its own watch channel, so subscribers of one
/// are not woken by changes to another. Values survive `stop()`; before the
/// first successful poll every status is the undefined default.
pub struct StatusPoller {
    actuators: Vec<ActuatorConfig>,
    source: Arc<dyn SensorSource>,
    period: Duration,
    events: EventSender,
    channels: Arc<BTreeMap<String, watch::Sender<ActuatorStatus>>>,
    task: Mutex<Option<PollTask>>,
}

impl StatusPoller {
    pub fn new(
        actuators: Vec<ActuatorConfig>,
        source: Arc<dyn SensorSource>,
        period: Duration,
        events: EventSender,
    ) -> Self {
        let channels = actuators
            .iter()
            .map(|a| (a.id.clone(), watch::channel(ActuatorStatus::default()).0))
            .collect();
        Self {
            actuators,
            source,
            period,
            events,
            channels: Arc::new(channels),
            task: Mutex::new(None),
        }
    }

    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        let source = self.source.clone();
        let fetch = move || {
            let source = source.clone();
            async move { source.status().await }
        };

        let actuators = self.actuators.clone();
        let channels = self.channels.clone();
        let events = self.events.clone();
        let settle = move |outcome: Result<StatusReport>| {
            match outcome.and_then(|report| extract_statuses(&report, &actuators)) {
                Ok(statuses) => {
                    for (id, status) in statuses {
                        let Some(tx) = channels.get(&id) else {
                            continue;
                        };
                        let changed = tx.send_if_modified(|current| {
                            if *current == status {
                                false
                            } else {
                                *current = status.clone();
                                true
                            }
                        });
                        if changed {
                            tracing::debug!(actuator = %id, status = %status, "status updated");
                            event::emit(
                                &events,
                                MonitorEvent::StatusUpdated {
                                    actuator: id,
                                    status: status.label,
                                },
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "status tick failed");
                    event::emit(
                        &events,
                        MonitorEvent::TickFailed {
                            actuator: None,
                            error: e.to_string(),
                        },
                    );
                }
            }
        };

        *task = Some(PollTask::spawn(self.period, fetch, settle));
        tracing::info!(
            actuators = self.actuators.len(),
            period_ms = self.period.as_millis() as u64,
            "status poller started"
        );
    }

    pub fn stop(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = task.take() {
            task.stop(|| ());
            tracing::info!("status poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(PollTask::is_running)
    }

    /// Last published status for `actuator`.
    pub fn status(&self, actuator: &str) -> Option<ActuatorStatus> {
        self.channels.get(actuator).map(|tx| tx.borrow().clone())
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
