use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use trackrec::{
    create_router, AppState, BroadcastHub, Config, FsStorage, HttpEgressClient, ObjectStorage,
    RecordingSupervisor, StreamSettings, SupervisorConfig,
};

#[derive(Debug, Parser)]
#[command(name = "trackrec", about = "Individual participant track recorder")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/trackrec")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "HTTP server will bind to {}:{}",
        cfg.service.http.bind, cfg.service.http.port
    );
    info!("Recording room: {}", cfg.recording.room);

    let storage: Arc<dyn ObjectStorage> = Arc::new(FsStorage::new(&cfg.storage.root_path));
    if !storage.bucket_exists(&cfg.recording.bucket).await? {
        storage.make_bucket(&cfg.recording.bucket).await?;
    }

    let egress = Arc::new(HttpEgressClient::new(&cfg.egress.api_url));

    let supervisor = Arc::new(RecordingSupervisor::new(
        SupervisorConfig {
            room: cfg.recording.room.clone(),
            bucket: cfg.recording.bucket.clone(),
            flush_threshold_secs: cfg.recording.flush_threshold_secs,
            stream_url: cfg.recording.stream_url.clone(),
            poll_interval: Duration::from_secs(cfg.egress.poll_interval_secs),
            finalize_timeout: Duration::from_secs(cfg.egress.shutdown_timeout_secs),
        },
        egress,
        storage,
        BroadcastHub::new(),
    ));

    let poller = supervisor.spawn_poller();

    let state = AppState::new(
        Arc::clone(&supervisor),
        StreamSettings {
            room: cfg.recording.room.clone(),
            sample_rate: cfg.recording.sample_rate,
            channel_count: cfg.recording.channels,
        },
    );
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    // Flush whatever is still buffered before exiting.
    supervisor.shutdown().await;
    poller.await.ok();

    Ok(())
}
