//! Attached display surfaces, owned by the coordinator.

use std::collections::BTreeMap;

use shared::domain::{SurfaceId, SurfaceKind};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct SurfaceRegistry {
    surfaces: RwLock<BTreeMap<SurfaceId, SurfaceKind>>,
}

impl SurfaceRegistry {
    /// Returns the previous kind when the surface was already attached.
    pub async fn attach(&self, surface_id: SurfaceId, kind: SurfaceKind) -> Option<SurfaceKind> {
        self.surfaces.write().await.insert(surface_id, kind)
    }

    pub async fn detach(&self, surface_id: SurfaceId) -> bool {
        self.surfaces.write().await.remove(&surface_id).is_some()
    }

    pub async fn kind_of(&self, surface_id: SurfaceId) -> Option<SurfaceKind> {
        self.surfaces.read().await.get(&surface_id).copied()
    }

    /// Ordered by surface id.
    pub async fn snapshot(&self) -> Vec<(SurfaceId, SurfaceKind)> {
        self.surfaces
            .read()
            .await
            .iter()
            .map(|(surface_id, kind)| (*surface_id, *kind))
            .collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.surfaces.read().await.is_empty()
    }
}
