use anyhow::Context;
use cylmon_core::config::MonitorConfig;
use cylmon_core::Monitor;
use std::sync::Arc;

pub fn run(config: MonitorConfig, port: u16) -> anyhow::Result<()> {
    let base_url = config.base_url.clone();
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let monitor = Monitor::from_config(config).context("cannot start monitor")?;
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();

        println!("cylinder feed for {base_url} → http://localhost:{actual_port}");
        cylmon_server::serve_on(Arc::new(monitor), listener).await
    })
}
