//! Trigger intake: each queued trigger runs on its own task, to completion.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use shared::{domain::SurfaceId, error::GardenError, protocol::DisplayUpdate};
use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
    time::MissedTickBehavior,
};
use tracing::{debug, error, warn};

use crate::{Coordinator, PlantStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    WaterRequested {
        plant_id: Option<String>,
    },
    PeriodicTick,
    SurfaceAttached {
        surface_id: SurfaceId,
        min_width: u32,
    },
    SurfaceResized {
        surface_id: SurfaceId,
        min_width: u32,
    },
    SurfaceDetached {
        surface_id: SurfaceId,
    },
}

impl Trigger {
    pub fn name(&self) -> &'static str {
        match self {
            Trigger::WaterRequested { .. } => "water_requested",
            Trigger::PeriodicTick => "periodic_tick",
            Trigger::SurfaceAttached { .. } => "surface_attached",
            Trigger::SurfaceResized { .. } => "surface_resized",
            Trigger::SurfaceDetached { .. } => "surface_detached",
        }
    }
}

#[derive(Clone)]
pub struct TriggerQueue {
    tx: mpsc::Sender<Trigger>,
}

impl TriggerQueue {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Trigger>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Waits for room when the queue is full; fails only once the worker has
    /// stopped.
    pub async fn send(&self, trigger: Trigger) -> Result<()> {
        let name = trigger.name();
        self.tx
            .send(trigger)
            .await
            .map_err(|_| anyhow!("trigger worker stopped; dropped {name}"))?;
        debug!(trigger = name, "queued trigger");
        Ok(())
    }
}

/// Runs until every [`TriggerQueue`] handle is dropped, then waits for the
/// tasks already in flight.
pub async fn run_trigger_worker<S>(coordinator: Arc<Coordinator<S>>, mut rx: mpsc::Receiver<Trigger>)
where
    S: PlantStore + 'static,
{
    let mut inflight = JoinSet::new();
    while let Some(trigger) = rx.recv().await {
        let coordinator = Arc::clone(&coordinator);
        inflight.spawn(async move { coordinator.handle_trigger(trigger).await });
        while let Some(joined) = inflight.try_join_next() {
            log_join_failure(joined);
        }
    }
    while let Some(joined) = inflight.join_next().await {
        log_join_failure(joined);
    }
}

/// Feeds `PeriodicTick` into the queue. The first tick fires immediately.
pub fn spawn_ticker(queue: TriggerQueue, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(err) = queue.send(Trigger::PeriodicTick).await {
                warn!(%err, "stopping ticker");
                break;
            }
        }
    })
}

fn log_join_failure(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        error!(%err, "trigger task panicked");
    }
}

impl<S: PlantStore> Coordinator<S> {
    pub async fn handle_trigger(&self, trigger: Trigger) {
        let name = trigger.name();
        let result: Result<(), GardenError> = match trigger {
            Trigger::WaterRequested { plant_id } => self
                .on_water_requested(plant_id.as_deref())
                .await
                .map(|_| ()),
            Trigger::PeriodicTick => self.on_periodic_tick().await.map(|_| ()),
            Trigger::SurfaceAttached {
                surface_id,
                min_width,
            } => self
                .on_display_surface_attached(surface_id, min_width)
                .await
                .map(|_| ()),
            Trigger::SurfaceResized {
                surface_id,
                min_width,
            } => self
                .on_display_surface_resized(surface_id, min_width)
                .await
                .map(|_| ()),
            Trigger::SurfaceDetached { surface_id } => {
                self.on_display_surface_detached(surface_id).await;
                Ok(())
            }
        };

        if let Err(err) = result {
            warn!(trigger = name, code = ?err.code, message = %err.message, "trigger failed");
            self.emit(DisplayUpdate::Error(err));
        }
    }
}
