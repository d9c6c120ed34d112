use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::broadcast::LayoutEvent;
use crate::layout_engine::engine::{LayoutEngine, PaneFrame};
use crate::model::snapshot_cell::SnapshotCell;

/// Serialized single-writer access to a [`LayoutEngine`]. Every mutation
/// path (gesture intents, lifecycle callbacks, auto-arrange) funnels
/// through [`Self::update`]; renderers read the latest committed draw
/// list without contending on the lock.
pub struct LayoutHandle {
    engine: Mutex<LayoutEngine>,
    scene: SnapshotCell<Vec<PaneFrame>>,
}

impl LayoutHandle {
    pub fn new(engine: LayoutEngine) -> Self {
        let scene = SnapshotCell::from_value(engine.render_list());
        Self {
            engine: Mutex::new(engine),
            scene,
        }
    }

    /// Runs one serialized mutation, then republishes the render snapshot.
    pub fn update<R>(&self, f: impl FnOnce(&mut LayoutEngine) -> R) -> R {
        let mut engine = self.engine.lock();
        let result = f(&mut engine);
        self.scene.publish(Arc::new(engine.render_list()));
        result
    }

    /// Reads without mutating. No snapshot is republished.
    pub fn read<R>(&self, f: impl FnOnce(&LayoutEngine) -> R) -> R {
        let engine = self.engine.lock();
        f(&engine)
    }

    /// The latest committed draw list. Lock-free; the returned snapshot
    /// stays valid (and unchanged) while newer ones are published.
    pub fn render_list(&self) -> Arc<Vec<PaneFrame>> { self.scene.load() }

    pub fn subscribe(&self) -> Receiver<LayoutEvent> {
        self.engine.lock().subscribe()
    }
}
