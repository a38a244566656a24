use std::sync::Arc;

use parking_lot::Mutex;

use canvas_core::SceneStore;

use crate::broadcast::BroadcastBus;
use crate::correlator::Correlator;
use crate::supervisor::Supervisor;

/// Shared application state, wrapped for use as axum state. The scene store
/// is the single-writer authoritative state (spec §5); the bus and
/// correlator guard their own interior mutability.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<SceneStore>>,
    pub bus: Arc<BroadcastBus>,
    pub correlator: Arc<Correlator>,
    pub supervisor: Arc<Supervisor>,
}

impl AppState {
    pub fn new(port: u16) -> Self {
        Self {
            store: Arc::new(Mutex::new(SceneStore::new())),
            bus: Arc::new(BroadcastBus::new()),
            correlator: Arc::new(Correlator::new()),
            supervisor: Arc::new(Supervisor::new(port)),
        }
    }
}
