use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::collections::HashSet;
use crate::layout_engine::engine::{LayoutEngine, LayoutError};
use crate::layout_engine::pip::PipLayer;
use crate::layout_engine::slot::{PipSlot, Slot};
use crate::layout_engine::templates::{Template, TemplateId};
use crate::model::geometry::Size;

/// Serializable image of the full layout state, used for named saved
/// layouts. Restoring onto a different container size runs the same
/// clamp/recompute path as a container resize.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LayoutSnapshot {
    pub template: TemplateId,
    pub container: Size,
    pub slots: Vec<Slot>,
    pub pip_slots: Vec<PipSlot>,
}

impl LayoutEngine {
    pub fn snapshot(&self) -> LayoutSnapshot {
        let (template, container, slots, pip) = self.state_parts();
        LayoutSnapshot {
            template,
            container,
            slots: slots.to_vec(),
            pip_slots: pip.iter_ordered().map(|(_, slot)| slot.clone()).collect(),
        }
    }

    pub fn restore(&mut self, snapshot: LayoutSnapshot) -> Result<(), LayoutError> {
        let template = snapshot.template.instantiate();
        if snapshot.slots.len() > template.max_slots() {
            return Err(LayoutError::CapacityExceeded {
                max: template.max_slots(),
            });
        }

        let mut seen = HashSet::default();
        let streams = snapshot
            .slots
            .iter()
            .map(|slot| &slot.stream)
            .chain(snapshot.pip_slots.iter().map(|slot| &slot.stream));
        for stream in streams {
            if !seen.insert(stream.clone()) {
                return Err(LayoutError::DuplicateStream(stream.clone()));
            }
        }

        // hand-edited snapshots may violate the single-focus /
        // single-speaker invariants; keep the first holder and drop the rest
        let mut slots = snapshot.slots;
        let mut pip_slots = snapshot.pip_slots;
        let mut audio_seen = false;
        let mut focus_seen = false;
        for slot in &mut slots {
            if slot.focused && std::mem::replace(&mut focus_seen, true) {
                warn!(stream = %slot.stream, "dropping extra focused flag from snapshot");
                slot.focused = false;
            }
            if slot.audio_active && std::mem::replace(&mut audio_seen, true) {
                warn!(stream = %slot.stream, "dropping extra audio flag from snapshot");
                slot.audio_active = false;
            }
        }
        for slot in &mut pip_slots {
            if slot.audio_active && std::mem::replace(&mut audio_seen, true) {
                warn!(stream = %slot.stream, "dropping extra audio flag from snapshot");
                slot.audio_active = false;
            }
        }

        let mut pip = PipLayer::new();
        pip.restore(pip_slots);
        self.replace_state(snapshot.template, slots, pip);
        Ok(())
    }
}

pub fn save_to(path: &Path, snapshot: &LayoutSnapshot) -> anyhow::Result<()> {
    let serialized = ron::ser::to_string_pretty(snapshot, ron::ser::PrettyConfig::default())
        .context("failed to serialize layout snapshot")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write layout snapshot to {}", path.display()))
}

pub fn load_from(path: &Path) -> anyhow::Result<LayoutSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout snapshot from {}", path.display()))?;
    ron::from_str(&raw).context("failed to parse layout snapshot")
}
