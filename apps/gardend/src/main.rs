use std::sync::Arc;

use coordinator::{run_trigger_worker, spawn_ticker, Coordinator, Trigger, TriggerQueue};
use shared::protocol::DisplayUpdate;
use storage::Storage;
use tokio::{
    io::BufReader,
    sync::broadcast::{error::RecvError, Receiver},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::{load_settings, normalize_database_url};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run());
    // A pending stdin read holds a blocking thread until the next newline.
    runtime.shutdown_background();
    result
}

async fn run() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let coordinator_config = settings.coordinator_config()?;
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    storage.health_check().await?;

    let coordinator = Arc::new(Coordinator::new(storage, coordinator_config));
    let display_log = tokio::spawn(log_display_updates(coordinator.subscribe()));

    let (queue, triggers) = TriggerQueue::channel(64);
    let worker = tokio::spawn(run_trigger_worker(Arc::clone(&coordinator), triggers));
    for surface in &settings.surfaces {
        queue
            .send(Trigger::SurfaceAttached {
                surface_id: surface.surface_id(),
                min_width: surface.min_width,
            })
            .await?;
    }
    let ticker = spawn_ticker(queue.clone(), settings.tick_interval());
    let stdin_task = tokio::spawn(commands::forward_commands(
        BufReader::new(tokio::io::stdin()),
        queue.clone(),
    ));
    drop(queue);

    info!(
        %database_url,
        tick_seconds = settings.tick_interval().as_secs(),
        surfaces = settings.surfaces.len(),
        "gardend running"
    );
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    ticker.abort();
    stdin_task.abort();
    let _ = ticker.await;
    let _ = stdin_task.await;
    worker.await?;
    display_log.abort();
    Ok(())
}

async fn log_display_updates(mut updates: Receiver<DisplayUpdate>) {
    loop {
        match updates.recv().await {
            Ok(update) => match serde_json::to_string(&update) {
                Ok(json) => info!(target: "gardend::display", surfaces = ?update.surface_ids(), "{json}"),
                Err(err) => warn!(%err, "failed to encode display update"),
            },
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "display log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
