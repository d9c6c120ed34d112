use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::layout_engine::slot::{PipId, PipSlot};
use crate::model::geometry::{Point, Size};
use crate::model::stream::StreamId;

/// Floor of the floating layer's z space. Grid z-indices are renumbered
/// densely from 1 and capped well below this, so floating panes always
/// render above the grid.
pub const PIP_Z_BASE: i32 = 1_000;

/// The free-floating overlay layer: detached panes, unconstrained by the
/// template system, clamped to container bounds only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipLayer {
    slots: SlotMap<PipId, PipSlot>,
}

impl PipLayer {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.slots.len() }

    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn contains_stream(&self, stream: &StreamId) -> bool {
        self.id_for_stream(stream).is_some()
    }

    pub fn id_for_stream(&self, stream: &StreamId) -> Option<PipId> {
        self.slots.iter().find(|(_, slot)| slot.stream == *stream).map(|(id, _)| id)
    }

    pub fn get(&self, id: PipId) -> Option<&PipSlot> { self.slots.get(id) }

    pub fn get_mut(&mut self, id: PipId) -> Option<&mut PipSlot> { self.slots.get_mut(id) }

    pub fn insert(&mut self, stream: StreamId, origin: Point, size: Size) -> PipId {
        let z = PIP_Z_BASE + self.slots.len() as i32 + 1;
        self.slots.insert(PipSlot::new(stream, origin, size, z))
    }

    pub fn remove(&mut self, id: PipId) -> Option<PipSlot> {
        let removed = self.slots.remove(id);
        if removed.is_some() {
            self.renumber();
        }
        removed
    }

    pub fn remove_by_stream(&mut self, stream: &StreamId) -> Option<PipSlot> {
        let id = self.id_for_stream(stream)?;
        self.remove(id)
    }

    pub fn bring_to_front(&mut self, id: PipId) -> bool {
        let Some(max_z) = self.slots.values().map(|slot| slot.z_index).max() else {
            return false;
        };
        let Some(slot) = self.slots.get_mut(id) else {
            return false;
        };
        slot.z_index = max_z + 1;
        self.renumber();
        true
    }

    /// Moves a pane, keeping its stored frame inside the container.
    pub fn move_to(&mut self, id: PipId, origin: Point, container: Size) -> bool {
        let Some(slot) = self.slots.get_mut(id) else {
            return false;
        };
        let clamped =
            crate::model::geometry::Rect::from_parts(origin, slot.size).clamp_within(container);
        slot.origin = clamped.origin;
        true
    }

    pub fn set_minimized(&mut self, id: PipId, minimized: bool) -> bool {
        let Some(slot) = self.slots.get_mut(id) else {
            return false;
        };
        slot.minimized = minimized;
        if minimized {
            slot.maximized = false;
        }
        true
    }

    pub fn set_maximized(&mut self, id: PipId, maximized: bool) -> bool {
        let Some(slot) = self.slots.get_mut(id) else {
            return false;
        };
        slot.maximized = maximized;
        if maximized {
            slot.minimized = false;
        }
        true
    }

    pub fn clear_audio(&mut self) {
        for slot in self.slots.values_mut() {
            slot.audio_active = false;
        }
    }

    pub fn audio_active_stream(&self) -> Option<&StreamId> {
        self.slots.values().find(|slot| slot.audio_active).map(|slot| &slot.stream)
    }

    pub fn clamp_all(&mut self, container: Size) {
        for slot in self.slots.values_mut() {
            let clamped = slot.frame().clamp_within(container);
            slot.origin = clamped.origin;
            slot.size = clamped.size;
        }
    }

    /// Panes in draw order (lowest z first).
    pub fn iter_ordered(&self) -> impl Iterator<Item = (PipId, &PipSlot)> {
        let mut entries: Vec<_> = self.slots.iter().collect();
        entries.sort_by_key(|(_, slot)| slot.z_index);
        entries.into_iter()
    }

    pub(crate) fn restore(&mut self, slots: Vec<PipSlot>) {
        self.slots.clear();
        for slot in slots {
            self.slots.insert(slot);
        }
        self.renumber();
    }

    /// Keeps the layer's z space dense, starting just above [`PIP_Z_BASE`].
    fn renumber(&mut self) {
        let mut ids: Vec<_> =
            self.slots.iter().map(|(id, slot)| (id, slot.z_index)).collect();
        ids.sort_by_key(|&(_, z)| z);
        for (i, (id, _)) in ids.into_iter().enumerate() {
            self.slots[id].z_index = PIP_Z_BASE + i as i32 + 1;
        }
    }
}
