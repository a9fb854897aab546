//! In-memory [`SensorSource`] double for scheduler and monitor tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::error::{MonitorError, Result};
use crate::source::{SensorSource, StatusReport};
use crate::types::SensorSample;

#[derive(Default)]
struct Script {
    history: HashMap<String, VecDeque<Result<Vec<SensorSample>>>>,
    default_history: HashMap<String, Vec<SensorSample>>,
    failing: HashSet<String>,
    status: VecDeque<Result<StatusReport>>,
    default_status: StatusReport,
    hold: Option<Arc<Notify>>,
}

/// Scripted responses: queued results are served first, then the per-tag
/// default (or an empty history).
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<Script>,
    history_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_history(&self, tag: &str, result: Result<Vec<SensorSample>>) {
        self.script
            .lock()
            .unwrap()
            .history
            .entry(tag.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn set_default_history(&self, tag: &str, samples: Vec<SensorSample>) {
        self.script
            .lock()
            .unwrap()
            .default_history
            .insert(tag.to_string(), samples);
    }

    /// Every history call for `tag` fails with HTTP 503 from now on.
    pub fn fail_tag(&self, tag: &str) {
        self.script.lock().unwrap().failing.insert(tag.to_string());
    }

    pub fn push_status(&self, result: Result<StatusReport>) {
        self.script.lock().unwrap().status.push_back(result);
    }

    pub fn set_default_status(&self, report: StatusReport) {
        self.script.lock().unwrap().default_status = report;
    }

    /// Park every later call until the returned `Notify` is triggered.
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.script.lock().unwrap().hold = Some(notify.clone());
        notify
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn held(&self) -> Option<Arc<Notify>> {
        self.script.lock().unwrap().hold.clone()
    }
}

#[async_trait]
impl SensorSource for ScriptedSource {
    async fn history(&self, tag: &str) -> Result<Vec<SensorSample>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(notify) = self.held() {
            notify.notified().await;
        }

        let mut script = self.script.lock().unwrap();
        if script.failing.contains(tag) {
            return Err(MonitorError::HttpStatus {
                url: format!("scripted://history?tag={tag}"),
                status: 503,
            });
        }
        if let Some(next) = script.history.get_mut(tag).and_then(VecDeque::pop_front) {
            return next;
        }
        Ok(script.default_history.get(tag).cloned().unwrap_or_default())
    }

    async fn status(&self) -> Result<StatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(notify) = self.held() {
            notify.notified().await;
        }

        let mut script = self.script.lock().unwrap();
        match script.status.pop_front() {
            Some(next) => next,
            None => Ok(script.default_status.clone()),
        }
    }
}
