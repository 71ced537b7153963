mod adapters;
mod application;
mod config;
mod domain;
mod interface;
mod ports;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{DockerApi, ProcfsConfig, ProcfsProcessSource, RuntimeClient, ShipyardClient};
use application::{register_agent, work_queue, CollectionTask, Collector, SyncEngine, Uploader};
use config::Config;
use interface::http::{create_router, serve};

/// How long open proxy connections may keep the process alive after a signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_args()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("shipyard_agent={},tower_http=info", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.register {
        let client = ShipyardClient::new(config.remote_url.clone(), "")?;
        let key = register_agent(&client, config.listen_port, config.host_ip).await?;
        print_agent_key(&mut std::io::stdout().lock(), &key)?;
        return Ok(());
    }

    info!("🚀 Shipyard Agent v{} ({})", env!("CARGO_PKG_VERSION"), config.remote_url);
    if config.agent_key.is_empty() {
        warn!("No agent key configured, Shipyard will reject uploads");
    }

    // Docker must be reachable before any loop starts
    let runtime = RuntimeClient::new(config.runtime.clone())?;
    let docker = DockerApi::new(runtime.clone(), config.api_version.clone());
    match docker.ping().await {
        Ok(()) => info!("✓ Connected to Docker at {}", config.runtime),
        Err(e) if e.is_unreachable() => {
            error!(error = %e, "Error connecting to Docker");
            return Err(e.into());
        }
        Err(e) => warn!(error = %e, "⚠ Docker ping failed, continuing"),
    }

    let mut collector = Collector::new(Arc::new(docker));
    if config.metrics_interval.is_some() {
        collector = collector.with_processes(Arc::new(ProcfsProcessSource::new(ProcfsConfig::new(
            config.proc_path.clone(),
        ))));
    }
    let collector = Arc::new(collector);
    let shipyard = Arc::new(ShipyardClient::new(config.remote_url.clone(), config.agent_key.clone())?);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut engines = Vec::new();
    let mut uploaders = Vec::new();

    // Containers and images share one queue
    let (tx, rx) = work_queue(2);
    uploaders.push(Uploader::new(shipyard.clone()).spawn(rx));
    let inventory = SyncEngine::new(
        "inventory",
        collector.clone(),
        vec![CollectionTask::Containers, CollectionTask::Images],
        config.poll_interval,
        tx,
    );
    engines.push(tokio::spawn(inventory.run(shutdown_tx.subscribe())));

    if let Some(metrics_interval) = config.metrics_interval {
        let (tx, rx) = work_queue(1);
        uploaders.push(Uploader::new(shipyard.clone()).spawn(rx));
        let metrics = SyncEngine::new(
            "metrics",
            collector.clone(),
            vec![CollectionTask::Metrics],
            metrics_interval,
            tx,
        );
        engines.push(tokio::spawn(metrics.run(shutdown_tx.subscribe())));
    }

    // Create HTTP proxy
    let app = create_router(runtime);
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("✓ Listening on {}", addr);

    let signals = tokio::spawn(wait_for_signal(shutdown_tx.clone()));
    let served = serve(listener, app, shutdown_tx.subscribe(), SHUTDOWN_GRACE).await;
    if let Err(e) = &served {
        error!(error = %e, "Proxy server failed");
        let _ = shutdown_tx.send(());
    }
    signals.abort();

    for engine in engines {
        match engine.await {
            Ok(cycles) => info!(cycles, "Sync engine stopped"),
            Err(e) => error!(error = %e, "Sync engine panicked"),
        }
    }
    // Wait for in-flight uploads before exiting
    for uploader in uploaders {
        match uploader.await {
            Ok(stats) => info!(delivered = stats.delivered, dropped = stats.dropped, "Uploader drained"),
            Err(e) => error!(error = %e, "Uploader panicked"),
        }
    }

    served?;
    Ok(())
}

/// Register mode output; goes to stdout whatever the log level
fn print_agent_key(out: &mut impl Write, key: &str) -> std::io::Result<()> {
    writeln!(out, "Agent Key: {}", key)
}

async fn wait_for_signal(shutdown: broadcast::Sender<()>) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to setup SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to setup SIGINT handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down"),
    }
    let _ = shutdown.send(());
}
