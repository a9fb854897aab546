use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Open/closed flag shared by a poll loop and its owner.
///
/// A tick's outcome is applied while holding the gate's lock and only if the
/// gate is open. Closing takes the same lock, so once [`Gate::close`] returns
/// no outcome can be applied any more, even one whose fetch was in flight.
#[derive(Debug, Clone)]
pub(crate) struct Gate(Arc<Mutex<bool>>);

impl Gate {
    pub(crate) fn open() -> Self {
        Gate(Arc::new(Mutex::new(true)))
    }

    pub(crate) fn apply<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let open = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if *open {
            Some(f())
        } else {
            None
        }
    }

    /// Close the gate and run `f` before anyone else can observe it open.
    pub(crate) fn close<R>(&self, f: impl FnOnce() -> R) -> R {
        let mut open = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *open = false;
        f()
    }

    pub(crate) fn is_open(&self) -> bool {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// PollTask
// ---------------------------------------------------------------------------

/// A running fixed-period poll loop.
#[derive(Debug)]
pub(crate) struct PollTask {
    gate: Gate,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Spawn a loop that calls `fetch` immediately and then every `period`,
    /// handing each outcome to `settle` under the gate.
    ///
    /// Ticks run one after another inside a single task. A tick still in
    /// flight when the next one is due makes the loop skip the missed tick
    /// instead of bunching up catch-up ticks, so outcomes settle strictly in
    /// tick order and never concurrently.
    pub(crate) fn spawn<T, F, Fut, S>(period: Duration, mut fetch: F, mut settle: S) -> Self
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        S: FnMut(Result<T>) + Send + 'static,
    {
        let gate = Gate::open();
        let loop_gate = gate.clone();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let outcome = fetch().await;
                if loop_gate.apply(|| settle(outcome)).is_none() {
                    break;
                }
            }
        });

        PollTask { gate, handle }
    }

    /// Close the gate (running `on_close` under it) and abort the loop.
    pub(crate) fn stop<R>(self, on_close: impl FnOnce() -> R) -> R {
        let out = self.gate.close(on_close);
        self.handle.abort();
        out
    }

    pub(crate) fn is_running(&self) -> bool {
        self.gate.is_open() && !self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[test]
    fn closed_gate_refuses_work() {
        let gate = Gate::open();
        assert_eq!(gate.apply(|| 1), Some(1));
        gate.close(|| ());
        assert_eq!(gate.apply(|| 2), None);
        assert!(!gate.is_open());
    }

    #[tokio::test]
    async fn first_tick_fires_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let notify = Arc::new(Notify::new());
        let (h, n) = (hits.clone(), notify.clone());

        let task = PollTask::spawn(
            Duration::from_secs(3600),
            || async { Ok(()) },
            move |_: Result<()>| {
                h.fetch_add(1, Ordering::SeqCst);
                n.notify_one();
            },
        );

        tokio::time::timeout(Duration::from_secs(1), notify.notified())
            .await
            .expect("first tick should not wait for the period");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(task.is_running());
        task.stop(|| ());
    }

    #[tokio::test]
    async fn errors_do_not_stop_the_loop() {
        let settled = Arc::new(AtomicUsize::new(0));
        let s = settled.clone();

        let task = PollTask::spawn(
            Duration::from_millis(10),
            || async { Err::<(), _>(MonitorError::EmptySensorId) },
            move |outcome: Result<()>| {
                assert!(outcome.is_err());
                s.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.stop(|| ());
        assert!(settled.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn outcome_arriving_after_stop_is_discarded() {
        let release = Arc::new(Notify::new());
        let started = Arc::new(Notify::new());
        let settled = Arc::new(AtomicUsize::new(0));

        let (r, st, s) = (release.clone(), started.clone(), settled.clone());
        let task = PollTask::spawn(
            Duration::from_secs(3600),
            move || {
                let r = r.clone();
                let st = st.clone();
                async move {
                    st.notify_one();
                    r.notified().await;
                    Ok(())
                }
            },
            move |_: Result<()>| {
                s.fetch_add(1, Ordering::SeqCst);
            },
        );

        started.notified().await;
        task.stop(|| ());
        release.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(settled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_ticks_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let (f, m) = (in_flight.clone(), max_seen.clone());

        let task = PollTask::spawn(
            Duration::from_millis(5),
            move || {
                let f = f.clone();
                let m = m.clone();
                async move {
                    let now = f.fetch_add(1, Ordering::SeqCst) + 1;
                    m.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    f.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            |_: Result<()>| {},
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        task.stop(|| ());
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
