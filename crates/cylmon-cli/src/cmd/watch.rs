use crate::output::{print_json_line, print_table};
use anyhow::Context;
use cylmon_core::config::MonitorConfig;
use cylmon_core::event::MonitorEvent;
use cylmon_core::window::RollingWindow;
use cylmon_core::Monitor;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

/// One line of `watch --json` output.
#[derive(Serialize)]
struct WatchLine<'a> {
    #[serde(flatten)]
    event: &'a MonitorEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    window: Option<RollingWindow>,
}

pub fn run(config: MonitorConfig, json: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let monitor = Monitor::from_config(config).context("cannot start monitor")?;
        let mut events = monitor.subscribe_events();
        monitor.start();

        loop {
            let event = tokio::select! {
                ev = events.recv() => ev,
                _ = tokio::signal::ctrl_c() => break,
            };
            match event {
                Ok(ev) => render(&monitor, &ev, json)?,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "watch output fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }

        monitor.stop();
        Ok(())
    })
}

fn render(monitor: &Monitor, event: &MonitorEvent, json: bool) -> anyhow::Result<()> {
    if json {
        let window = match event {
            MonitorEvent::WindowUpdated { actuator, .. } => monitor.window(actuator).ok(),
            _ => None,
        };
        return print_json_line(&WatchLine { event, window });
    }

    match event {
        MonitorEvent::TickFailed { actuator, error } => {
            let who = actuator.as_deref().unwrap_or("status");
            eprintln!("[{who}] tick failed: {error}");
        }
        MonitorEvent::WindowUpdated { .. } | MonitorEvent::StatusUpdated { .. } => {
            print_snapshot(monitor);
        }
    }
    Ok(())
}

fn print_snapshot(monitor: &Monitor) {
    let rows: Vec<Vec<String>> = monitor
        .snapshot()
        .into_iter()
        .map(|s| {
            let latest = s.window.latest().copied();
            vec![
                s.id,
                s.status.label,
                latest.map_or_else(|| "-".to_string(), |p| p.position.to_string()),
                latest.map_or_else(
                    || "-".to_string(),
                    |p| p.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                ),
                format!("{}/{}", s.window.len(), s.window.capacity()),
            ]
        })
        .collect();
    print_table(&["ACTUATOR", "STATUS", "LATEST", "AT (UTC)", "POINTS"], rows);
    println!();
}
