use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::config::ActuatorConfig;
use crate::error::Result;
use crate::event::{self, EventSender, MonitorEvent};
use crate::poll::PollTask;
use crate::reconcile::reconcile;
use crate::source::SensorSource;
use crate::types::PositionPoint;
use crate::window::RollingWindow;

/// Fetch both sensor histories of one actuator and reconcile them.
///
/// Both requests run concurrently and the first failure fails the whole
/// call; a half-fetched pair is never reconciled.
pub async fn fetch_positions(
    source: &dyn SensorSource,
    extended_tag: &str,
    retracted_tag: &str,
) -> Result<Vec<PositionPoint>> {
    let (extended, retracted) = tokio::try_join!(
        source.history(extended_tag),
        source.history(retracted_tag)
    )?;
    Ok(reconcile(&extended, &retracted))
}

// ---------------------------------------------------------------------------
// HistorySession
// ---------------------------------------------------------------------------

/// Periodic fetch → reconcile → merge pipeline for one actuator.
///
/// The session owns its [`RollingWindow`] and is the only writer. Readers
/// get snapshots through [`HistorySession::window`] or follow updates with
/// [`HistorySession::subscribe`].
///
/// ```rust,ignore
/// let session = HistorySession::new(actuator, source, capacity, period, events);
/// session.start();
/// let mut rx = session.subscribe();
/// rx.changed().await?;
/// println!("{} points", rx.borrow().len());
/// session.stop();
/// ```
pub struct HistorySession {
    actuator: ActuatorConfig,
    source: Arc<dyn SensorSource>,
    period: Duration,
    capacity: usize,
    events: EventSender,
    window_tx: Arc<watch::Sender<RollingWindow>>,
    task: Mutex<Option<PollTask>>,
}

impl HistorySession {
    pub fn new(
        actuator: ActuatorConfig,
        source: Arc<dyn SensorSource>,
        capacity: usize,
        period: Duration,
        events: EventSender,
    ) -> Self {
        let (window_tx, _) = watch::channel(RollingWindow::new(capacity));
        Self {
            actuator,
            source,
            period,
            capacity,
            events,
            window_tx: Arc::new(window_tx),
            task: Mutex::new(None),
        }
    }

    pub fn actuator(&self) -> &ActuatorConfig {
        &self.actuator
    }

    /// Begin polling with a fresh, empty window. No-op if already running.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        self.window_tx.send_replace(RollingWindow::new(self.capacity));

        let source = self.source.clone();
        let extended_tag = self.actuator.extended_tag.clone();
        let retracted_tag = self.actuator.retracted_tag.clone();
        let fetch = move || {
            let source = source.clone();
            let extended_tag = extended_tag.clone();
            let retracted_tag = retracted_tag.clone();
            async move { fetch_positions(source.as_ref(), &extended_tag, &retracted_tag).await }
        };

        let actuator_id = self.actuator.id.clone();
        let window_tx = self.window_tx.clone();
        let events = self.events.clone();
        let settle = move |outcome: Result<Vec<PositionPoint>>| match outcome {
            Ok(points) => {
                let mut len = 0;
                let changed = window_tx.send_if_modified(|window| {
                    let changed = window.merge(&points);
                    len = window.len();
                    changed
                });
                if changed {
                    tracing::debug!(actuator = %actuator_id, len, "window updated");
                    event::emit(
                        &events,
                        MonitorEvent::WindowUpdated {
                            actuator: actuator_id.clone(),
                            len,
                        },
                    );
                }
            }
            Err(e) => {
                tracing::warn!(actuator = %actuator_id, error = %e, "history tick failed");
                event::emit(
                    &events,
                    MonitorEvent::TickFailed {
                        actuator: Some(actuator_id.clone()),
                        error: e.to_string(),
                    },
                );
            }
        };

        *task = Some(PollTask::spawn(self.period, fetch, settle));
        tracing::info!(
            actuator = %self.actuator.id,
            extended = %self.actuator.extended_tag,
            retracted = %self.actuator.retracted_tag,
            period_ms = self.period.as_millis() as u64,
            "history session started"
        );
    }

    /// Stop polling and discard the window. No-op if not running.
    ///
    /// When this returns, no tick outcome (not even one whose fetch is still
    /// in flight) will touch the window again.
    pub fn stop(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = task.take() {
            task.stop(|| {
                self.window_tx
                    .send_replace(RollingWindow::new(self.capacity));
            });
            tracing::info!(actuator = %self.actuator.id, "history session stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(PollTask::is_running)
    }

    /// Snapshot of the current window.
    pub fn window(&self) -> RollingWindow {
        self.window_tx.borrow().clone()
    }

    /// Follow window updates.
    pub fn subscribe(&self) -> watch::Receiver<RollingWindow> {
        self.window_tx.subscribe()
    }
}

impl Drop for HistorySession {
    fn drop(&mut self) {
        self.stop();
    }
}
