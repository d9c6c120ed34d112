use crossbeam_channel::Receiver;
use thiserror::Error;
use tracing::{debug, trace};

use crate::broadcast::{Broadcaster, LayoutEvent};
use crate::common::config::Settings;
use crate::gesture::translator::LayoutIntent;
use crate::layout_engine::arrange::{self, ArrangeStyle};
use crate::layout_engine::pip::PipLayer;
use crate::layout_engine::slot::{PipId, Slot};
use crate::layout_engine::templates::{Template, TemplateId, TemplateKind};
use crate::model::geometry::{Point, Rect, Size, Vec2};
use crate::model::stream::StreamId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("layout is at capacity ({max} slots)")]
    CapacityExceeded { max: usize },
    #[error("stream {0} is already placed")]
    DuplicateStream(StreamId),
    #[error("stream {0} is not present in the expected collection")]
    NotFound(StreamId),
    #[error("template {0} does not allow manual placement")]
    TemplateLocked(TemplateId),
    #[error("rectangle would have non-positive area ({width} x {height})")]
    InvalidGeometry { width: f64, height: f64 },
    #[error("stale container resize (seq {received}, current {current})")]
    StaleResize { received: u64, current: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaneLayer {
    Grid,
    Pip,
}

/// One entry of the flattened draw list, lowest z first.
#[derive(Clone, Debug, PartialEq)]
pub struct PaneFrame {
    pub stream: StreamId,
    pub frame: Rect,
    pub z_index: i32,
    pub layer: PaneLayer,
    pub focused: bool,
    pub audio_active: bool,
    pub minimized: bool,
}

/// Single source of truth for pane placement. Owns the grid slots and the
/// floating layer; every mutation is synchronous, validated up front, and
/// leaves no partial state behind on failure.
pub struct LayoutEngine {
    settings: Settings,
    template: TemplateKind,
    container: Size,
    resize_seq: u64,
    slots: Vec<Slot>,
    pip: PipLayer,
    broadcaster: Broadcaster,
}

impl LayoutEngine {
    pub fn new(settings: Settings, container: Size) -> Self {
        Self::with_template(settings, container, TemplateId::Grid2x2)
    }

    pub fn with_template(settings: Settings, container: Size, template: TemplateId) -> Self {
        Self {
            settings,
            template: template.instantiate(),
            container,
            resize_seq: 0,
            slots: Vec::new(),
            pip: PipLayer::new(),
            broadcaster: Broadcaster::new(),
        }
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn template_id(&self) -> TemplateId { self.template.id() }

    pub fn container(&self) -> Size { self.container }

    pub fn slots(&self) -> &[Slot] { &self.slots }

    pub fn pip(&self) -> &PipLayer { &self.pip }

    pub fn slot(&self, stream: &StreamId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.stream == *stream)
    }

    pub fn contains(&self, stream: &StreamId) -> bool {
        self.slot(stream).is_some() || self.pip.contains_stream(stream)
    }

    pub fn focused_stream(&self) -> Option<&StreamId> {
        self.slots.iter().find(|slot| slot.focused).map(|slot| &slot.stream)
    }

    pub fn audio_active_stream(&self) -> Option<&StreamId> {
        self.slots
            .iter()
            .find(|slot| slot.audio_active)
            .map(|slot| &slot.stream)
            .or_else(|| self.pip.audio_active_stream())
    }

    pub fn fullscreen_stream(&self) -> Option<&StreamId> {
        self.slots.iter().find(|slot| slot.maximized).map(|slot| &slot.stream)
    }

    pub fn subscribe(&mut self) -> Receiver<LayoutEvent> { self.broadcaster.subscribe() }

    /// Applies a new container size. Sizes arrive with a monotonic
    /// sequence number; an out-of-order application is rejected so a stale
    /// rotation event can never clobber a newer one.
    pub fn set_container_size(&mut self, size: Size, seq: u64) -> Result<(), LayoutError> {
        if seq <= self.resize_seq {
            trace!(
                received = seq,
                current = self.resize_seq,
                "rejecting stale container resize"
            );
            return Err(LayoutError::StaleResize {
                received: seq,
                current: self.resize_seq,
            });
        }
        if size.is_degenerate() {
            return Err(LayoutError::InvalidGeometry {
                width: size.width,
                height: size.height,
            });
        }

        debug!(?size, seq, "container resized");
        self.container = size;
        self.resize_seq = seq;
        self.apply_frames();
        self.pip.clamp_all(self.container);
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    /// Switches the canvas partition strategy. Slots survive the switch
    /// with focus/audio intact; only frames are recomputed.
    pub fn set_template(&mut self, id: TemplateId) -> Result<(), LayoutError> {
        let template = id.instantiate();
        if self.slots.len() > template.max_slots() {
            return Err(LayoutError::CapacityExceeded {
                max: template.max_slots(),
            });
        }

        debug!(template = %id, "switching template");
        self.template = template;
        self.apply_frames();
        self.broadcaster.publish(LayoutEvent::TemplateChanged { template: id });
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    pub fn add_stream(&mut self, stream: StreamId) -> Result<(), LayoutError> {
        if self.contains(&stream) {
            return Err(LayoutError::DuplicateStream(stream));
        }
        let capacity = self.slot_capacity();
        if self.slots.len() >= capacity {
            return Err(LayoutError::CapacityExceeded { max: capacity });
        }

        let z = self.slots.len() as i32 + 1;
        let frame = if self.template.allows_manual_placement() {
            // deterministic fallback cell for a slot with no manual
            // position yet
            self.template
                .rectangles(self.container, self.slots.len() + 1, &self.settings.gaps)
                .pop()
                .unwrap_or(Rect::from_parts(Point::default(), self.container))
        } else {
            Rect::default()
        };

        debug!(%stream, z, "adding stream");
        self.slots.push(Slot::new(stream.clone(), frame, z));
        if !self.template.allows_manual_placement() {
            self.apply_frames();
        }
        self.broadcaster.publish(LayoutEvent::SlotAdded { stream });
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    /// Removes a stream from the grid. If it held focus or audio, those
    /// simply become unset; nothing is auto-promoted in its place.
    pub fn remove_stream(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;

        let removed = self.slots.remove(idx);
        debug!(%stream, "removed stream");
        self.renumber_z();
        self.apply_frames();

        self.broadcaster.publish(LayoutEvent::SlotRemoved {
            stream: removed.stream,
        });
        if removed.focused {
            self.broadcaster.publish(LayoutEvent::FocusChanged { stream: None });
        }
        if removed.audio_active {
            self.broadcaster.publish(LayoutEvent::AudioChanged { stream: None });
        }
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    /// Manual placement; only valid while the active template allows it.
    /// The frame is clamped so it stays fully inside the container.
    pub fn move_slot(&mut self, stream: &StreamId, origin: Point) -> Result<(), LayoutError> {
        if !self.template.allows_manual_placement() {
            return Err(LayoutError::TemplateLocked(self.template.id()));
        }
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;

        let size = self.slots[idx].frame.size;
        self.slots[idx].frame = Rect::from_parts(origin, size).clamp_within(self.container);
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    /// Manual resize; same template restriction as [`Self::move_slot`].
    /// Sizes are floored to the configured minimum so pane controls stay
    /// usable.
    pub fn resize_slot(&mut self, stream: &StreamId, size: Size) -> Result<(), LayoutError> {
        if !self.template.allows_manual_placement() {
            return Err(LayoutError::TemplateLocked(self.template.id()));
        }
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        if size.is_degenerate() {
            return Err(LayoutError::InvalidGeometry {
                width: size.width,
                height: size.height,
            });
        }

        let floored = size.at_least(self.settings.min_slot_size).at_most(self.container);
        let origin = self.slots[idx].frame.origin;
        self.slots[idx].frame = Rect::from_parts(origin, floored).clamp_within(self.container);
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    /// Commits a finished drag gesture as a single move.
    pub fn commit_drag(&mut self, stream: &StreamId, translation: Vec2) -> Result<(), LayoutError> {
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        let origin = self.slots[idx].frame.origin.translated(translation);
        self.move_slot(stream, origin)
    }

    /// Commits a finished pinch gesture as a single resize, scaling the
    /// last committed size.
    pub fn commit_resize(&mut self, stream: &StreamId, scale: f64) -> Result<(), LayoutError> {
        if scale <= 0.0 {
            return Err(LayoutError::InvalidGeometry {
                width: scale,
                height: scale,
            });
        }
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        let size = self.slots[idx].frame.size.scaled(scale);
        self.resize_slot(stream, size)
    }

    pub fn bring_to_front(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        let max_z = self.slots.iter().map(|slot| slot.z_index).max().unwrap_or(0);
        self.slots[idx].z_index = max_z + 1;
        self.renumber_z();
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    pub fn send_to_back(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        let min_z = self.slots.iter().map(|slot| slot.z_index).min().unwrap_or(0);
        self.slots[idx].z_index = min_z - 1;
        self.renumber_z();
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    /// Focuses a grid slot, un-focusing any other. Focus never changes
    /// frames or stacking by itself.
    pub fn set_focus(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;

        for slot in &mut self.slots {
            slot.focused = false;
        }
        self.slots[idx].focused = true;
        self.broadcaster.publish(LayoutEvent::FocusChanged {
            stream: Some(stream.clone()),
        });
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        for slot in &mut self.slots {
            slot.focused = false;
        }
        self.broadcaster.publish(LayoutEvent::FocusChanged { stream: None });
    }

    /// Routes audio to one stream, silencing every other slot in both the
    /// grid and the floating layer (single-speaker invariant).
    pub fn set_audio_active(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        if !self.contains(stream) {
            return Err(LayoutError::NotFound(stream.clone()));
        }

        for slot in &mut self.slots {
            slot.audio_active = false;
        }
        self.pip.clear_audio();

        if let Some(idx) = self.find_slot(stream) {
            self.slots[idx].audio_active = true;
        } else if let Some(id) = self.pip.id_for_stream(stream) {
            if let Some(slot) = self.pip.get_mut(id) {
                slot.audio_active = true;
            }
        }
        self.broadcaster.publish(LayoutEvent::AudioChanged {
            stream: Some(stream.clone()),
        });
        Ok(())
    }

    pub fn mute_all(&mut self) {
        for slot in &mut self.slots {
            slot.audio_active = false;
        }
        self.pip.clear_audio();
        self.broadcaster.publish(LayoutEvent::AudioChanged { stream: None });
    }

    /// Re-derives every slot frame with a named heuristic. Positions are
    /// manual afterwards, so the active template becomes `custom`.
    pub fn auto_arrange(&mut self, style: ArrangeStyle) {
        debug!(%style, "auto-arranging {} slots", self.slots.len());
        let rects = arrange::positions(
            style,
            self.container,
            self.slots.len(),
            &self.settings.gaps,
        );
        for (slot, rect) in self.slots.iter_mut().zip(rects) {
            slot.frame = rect;
        }
        self.template = TemplateId::Custom.instantiate();
        self.broadcaster.publish(LayoutEvent::TemplateChanged {
            template: TemplateId::Custom,
        });
        self.broadcaster.publish(LayoutEvent::FramesChanged);
    }

    /// Fullscreen is derived state: the maximized slot renders at full
    /// container size and hides the rest. Stored frames are untouched and
    /// come back on exit.
    pub fn toggle_fullscreen(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;

        if self.slots[idx].maximized {
            self.slots[idx].maximized = false;
        } else {
            for slot in &mut self.slots {
                slot.maximized = false;
            }
            self.slots[idx].maximized = true;
            self.slots[idx].minimized = false;
        }
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    /// Exchanges the screen space (frame and stacking position) of two
    /// grid slots. Focus and audio travel with their streams.
    pub fn swap_slots(&mut self, a: &StreamId, b: &StreamId) -> Result<(), LayoutError> {
        let ia = self.find_slot(a).ok_or_else(|| LayoutError::NotFound(a.clone()))?;
        let ib = self.find_slot(b).ok_or_else(|| LayoutError::NotFound(b.clone()))?;
        if ia == ib {
            return Ok(());
        }

        let (frame_a, z_a) = (self.slots[ia].frame, self.slots[ia].z_index);
        let (frame_b, z_b) = (self.slots[ib].frame, self.slots[ib].z_index);
        self.slots[ia].frame = frame_b;
        self.slots[ia].z_index = z_b;
        self.slots[ib].frame = frame_a;
        self.slots[ib].z_index = z_a;
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    /// Transfers a grid slot into the floating layer. Audio routing is
    /// preserved across the transfer; focus is cleared if the slot held it.
    pub fn detach_to_pip(&mut self, stream: &StreamId) -> Result<PipId, LayoutError> {
        let idx = self
            .find_slot(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;

        let slot = self.slots.remove(idx);
        self.renumber_z();
        self.apply_frames();

        let frame = Rect::from_parts(slot.frame.origin, self.settings.default_pip_size)
            .clamp_within(self.container);
        let id = self.pip.insert(slot.stream.clone(), frame.origin, frame.size);
        if slot.audio_active {
            if let Some(pip_slot) = self.pip.get_mut(id) {
                pip_slot.audio_active = true;
            }
        }

        debug!(%stream, "detached to floating layer");
        if slot.focused {
            self.broadcaster.publish(LayoutEvent::FocusChanged { stream: None });
        }
        self.broadcaster.publish(LayoutEvent::PipChanged);
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(id)
    }

    /// Returns a floating pane to the grid, subject to the same capacity
    /// rules as a fresh add. Audio routing is preserved.
    pub fn reattach_from_pip(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        let id = self
            .pip
            .id_for_stream(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        let capacity = self.slot_capacity();
        if self.slots.len() >= capacity {
            return Err(LayoutError::CapacityExceeded { max: capacity });
        }

        let pip_slot = self.pip.remove(id).expect("pip id resolved above");
        let z = self.slots.len() as i32 + 1;
        let frame = pip_slot.frame().clamp_within(self.container);
        let mut slot = Slot::new(pip_slot.stream, frame, z);
        slot.audio_active = pip_slot.audio_active;
        self.slots.push(slot);
        if !self.template.allows_manual_placement() {
            self.apply_frames();
        }

        debug!(%stream, "reattached from floating layer");
        self.broadcaster.publish(LayoutEvent::PipChanged);
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        Ok(())
    }

    pub fn move_pip(&mut self, stream: &StreamId, origin: Point) -> Result<(), LayoutError> {
        let id = self
            .pip
            .id_for_stream(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        self.pip.move_to(id, origin, self.container);
        self.broadcaster.publish(LayoutEvent::PipChanged);
        Ok(())
    }

    pub fn set_pip_minimized(
        &mut self,
        stream: &StreamId,
        minimized: bool,
    ) -> Result<(), LayoutError> {
        let id = self
            .pip
            .id_for_stream(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        self.pip.set_minimized(id, minimized);
        self.broadcaster.publish(LayoutEvent::PipChanged);
        Ok(())
    }

    pub fn set_pip_maximized(
        &mut self,
        stream: &StreamId,
        maximized: bool,
    ) -> Result<(), LayoutError> {
        let id = self
            .pip
            .id_for_stream(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        self.pip.set_maximized(id, maximized);
        self.broadcaster.publish(LayoutEvent::PipChanged);
        Ok(())
    }

    pub fn bring_pip_to_front(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        let id = self
            .pip
            .id_for_stream(stream)
            .ok_or_else(|| LayoutError::NotFound(stream.clone()))?;
        self.pip.bring_to_front(id);
        self.broadcaster.publish(LayoutEvent::PipChanged);
        Ok(())
    }

    /// Removes a stream from whichever collection holds it.
    pub fn dismiss(&mut self, stream: &StreamId) -> Result<(), LayoutError> {
        if self.find_slot(stream).is_some() {
            self.remove_stream(stream)
        } else if self.pip.remove_by_stream(stream).is_some() {
            self.broadcaster.publish(LayoutEvent::PipChanged);
            Ok(())
        } else {
            Err(LayoutError::NotFound(stream.clone()))
        }
    }

    /// Collaborator status callback: a stream's playback ended. Removes it
    /// from whichever collection holds it; unknown streams are ignored.
    pub fn stream_ended(&mut self, stream: &StreamId) {
        if self.dismiss(stream).is_err() {
            trace!(%stream, "ended stream is not placed, ignoring");
        }
    }

    /// Applies a discrete gesture intent. Preview intents (`DragMove`,
    /// `Resize`) and cancellations never touch committed state; only the
    /// terminal intents commit.
    pub fn apply_intent(&mut self, intent: &LayoutIntent) -> Result<(), LayoutError> {
        match intent {
            LayoutIntent::DragMove { .. }
            | LayoutIntent::Resize { .. }
            | LayoutIntent::DragCancelled { .. }
            | LayoutIntent::ResizeCancelled { .. }
            | LayoutIntent::EnterSelection { .. } => Ok(()),
            LayoutIntent::DragEnd { stream, translation } => {
                self.commit_drag(stream, *translation)
            }
            LayoutIntent::ResizeEnd { stream, scale } => self.commit_resize(stream, *scale),
            LayoutIntent::Focus { stream } => self.set_focus(stream),
            LayoutIntent::ClearFocus => {
                self.clear_focus();
                Ok(())
            }
            LayoutIntent::ToggleFullscreen { stream } => self.toggle_fullscreen(stream),
            LayoutIntent::Dismiss { stream } => self.dismiss(stream),
        }
    }

    /// Flattened draw list, lowest z first. Grid panes come before
    /// floating panes; floating z indices always sit above grid ones.
    pub fn render_list(&self) -> Vec<PaneFrame> {
        let mut panes = Vec::with_capacity(self.slots.len() + self.pip.len());
        let fullscreen = self.slots.iter().any(|slot| slot.maximized);

        let mut grid: Vec<&Slot> = self
            .slots
            .iter()
            .filter(|slot| {
                if fullscreen {
                    slot.maximized
                } else {
                    !slot.minimized
                }
            })
            .collect();
        grid.sort_by_key(|slot| slot.z_index);
        for slot in grid {
            let frame = if slot.maximized {
                Rect::from_parts(Point::default(), self.container)
            } else {
                slot.frame
            };
            panes.push(PaneFrame {
                stream: slot.stream.clone(),
                frame: frame.round(),
                z_index: slot.z_index,
                layer: PaneLayer::Grid,
                focused: slot.focused,
                audio_active: slot.audio_active,
                minimized: false,
            });
        }

        for (_, slot) in self.pip.iter_ordered() {
            let frame = if slot.maximized {
                Rect::from_parts(Point::default(), self.container)
            } else {
                Rect::from_parts(
                    slot.origin,
                    slot.display_size(self.settings.pip_bubble_size),
                )
                .clamp_within(self.container)
            };
            panes.push(PaneFrame {
                stream: slot.stream.clone(),
                frame: frame.round(),
                z_index: slot.z_index,
                layer: PaneLayer::Pip,
                focused: false,
                audio_active: slot.audio_active,
                minimized: slot.minimized,
            });
        }
        panes
    }

    /// Topmost pane under a point, if any.
    pub fn hit_test(&self, point: Point) -> Option<StreamId> {
        self.render_list()
            .into_iter()
            .rev()
            .find(|pane| pane.frame.contains(point))
            .map(|pane| pane.stream)
    }

    pub(crate) fn state_parts(&self) -> (TemplateId, Size, &[Slot], &PipLayer) {
        (self.template.id(), self.container, &self.slots, &self.pip)
    }

    pub(crate) fn replace_state(
        &mut self,
        template: TemplateId,
        slots: Vec<Slot>,
        pip: PipLayer,
    ) {
        self.template = template.instantiate();
        self.slots = slots;
        self.pip = pip;
        self.renumber_z();
        self.apply_frames();
        self.pip.clamp_all(self.container);
        self.broadcaster.publish(LayoutEvent::TemplateChanged { template });
        self.broadcaster.publish(LayoutEvent::FramesChanged);
        self.broadcaster.publish(LayoutEvent::PipChanged);
    }

    fn find_slot(&self, stream: &StreamId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.stream == *stream)
    }

    fn slot_capacity(&self) -> usize {
        self.template.max_slots().min(self.settings.max_concurrent_slots)
    }

    /// Recomputes frames from the active template, or clamps stored manual
    /// frames when the template is free-form.
    fn apply_frames(&mut self) {
        if self.template.allows_manual_placement() {
            for slot in &mut self.slots {
                slot.frame = slot.frame.clamp_within(self.container);
            }
        } else {
            let rects =
                self.template
                    .rectangles(self.container, self.slots.len(), &self.settings.gaps);
            for (slot, rect) in self.slots.iter_mut().zip(rects) {
                slot.frame = rect;
            }
        }
    }

    /// Keeps grid z indices dense (1..=n), preserving relative order.
    fn renumber_z(&mut self) {
        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by_key(|&i| self.slots[i].z_index);
        for (rank, idx) in order.into_iter().enumerate() {
            self.slots[idx].z_index = rank as i32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::pip::PIP_Z_BASE;

    fn engine() -> LayoutEngine {
        LayoutEngine::new(Settings::default(), Size::new(800.0, 600.0))
    }

    fn sid(s: &str) -> StreamId { StreamId::from(s) }

    fn add_streams(engine: &mut LayoutEngine, names: &[&str]) {
        for name in names {
            engine.add_stream(sid(name)).unwrap();
        }
    }

    #[test]
    fn test_grid2x2_fills_quadrants_in_insertion_order() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c", "d"]);

        let frames: Vec<_> = engine.slots().iter().map(|slot| slot.frame).collect();
        assert_eq!(frames, vec![
            Rect::new(0.0, 0.0, 400.0, 300.0),
            Rect::new(400.0, 0.0, 400.0, 300.0),
            Rect::new(0.0, 300.0, 400.0, 300.0),
            Rect::new(400.0, 300.0, 400.0, 300.0),
        ]);
        let z: Vec<_> = engine.slots().iter().map(|slot| slot.z_index).collect();
        assert_eq!(z, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_add_beyond_capacity_is_rejected() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c", "d"]);

        let err = engine.add_stream(sid("e")).unwrap_err();
        assert_eq!(err, LayoutError::CapacityExceeded { max: 4 });
        assert_eq!(engine.slots().len(), 4);
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let mut engine = engine();
        add_streams(&mut engine, &["a"]);

        let err = engine.add_stream(sid("a")).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateStream(sid("a")));

        engine.detach_to_pip(&sid("a")).unwrap();
        // still a duplicate while parked in the floating layer
        let err = engine.add_stream(sid("a")).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateStream(sid("a")));
    }

    #[test]
    fn test_remove_missing_stream_is_not_found() {
        let mut engine = engine();
        let err = engine.remove_stream(&sid("ghost")).unwrap_err();
        assert_eq!(err, LayoutError::NotFound(sid("ghost")));
    }

    #[test]
    fn test_remove_renumbers_and_recomputes() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c"]);
        engine.remove_stream(&sid("b")).unwrap();

        let z: Vec<_> = engine.slots().iter().map(|slot| slot.z_index).collect();
        assert_eq!(z, vec![1, 2]);
        // remaining slots re-flow into the first two cells
        assert_eq!(engine.slot(&sid("c")).unwrap().frame, Rect::new(400.0, 0.0, 400.0, 300.0));
    }

    #[test]
    fn test_remove_focused_slot_leaves_focus_unset() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);
        engine.set_focus(&sid("a")).unwrap();
        engine.remove_stream(&sid("a")).unwrap();

        assert_eq!(engine.focused_stream(), None);
    }

    #[test]
    fn test_remove_audio_slot_goes_silent() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);
        engine.set_audio_active(&sid("a")).unwrap();
        engine.remove_stream(&sid("a")).unwrap();

        assert_eq!(engine.audio_active_stream(), None);
    }

    #[test]
    fn test_single_speaker_invariant() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c"]);
        engine.set_audio_active(&sid("b")).unwrap();
        engine.set_audio_active(&sid("c")).unwrap();

        assert!(!engine.slot(&sid("b")).unwrap().audio_active);
        assert!(engine.slot(&sid("c")).unwrap().audio_active);
        assert_eq!(engine.audio_active_stream(), Some(&sid("c")));
    }

    #[test]
    fn test_single_speaker_spans_pip_layer() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);
        engine.set_audio_active(&sid("a")).unwrap();
        engine.detach_to_pip(&sid("a")).unwrap();

        // audio followed the stream into the floating layer
        assert_eq!(engine.audio_active_stream(), Some(&sid("a")));

        engine.set_audio_active(&sid("b")).unwrap();
        assert_eq!(engine.audio_active_stream(), Some(&sid("b")));
        assert_eq!(engine.pip().audio_active_stream(), None);
    }

    #[test]
    fn test_focus_is_idempotent() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);

        engine.set_focus(&sid("a")).unwrap();
        let once: Vec<_> = engine.slots().to_vec();
        engine.set_focus(&sid("a")).unwrap();

        assert_eq!(engine.slots(), &once[..]);
    }

    #[test]
    fn test_template_downgrade_beyond_capacity_fails() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c", "d"]);

        let err = engine.set_template(TemplateId::Single).unwrap_err();
        assert_eq!(err, LayoutError::CapacityExceeded { max: 1 });
        assert_eq!(engine.template_id(), TemplateId::Grid2x2);
        assert_eq!(engine.slots().len(), 4);
    }

    #[test]
    fn test_template_switch_preserves_slot_state() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);
        engine.set_focus(&sid("a")).unwrap();
        engine.set_audio_active(&sid("b")).unwrap();

        engine.set_template(TemplateId::Grid3x3).unwrap();

        assert_eq!(engine.focused_stream(), Some(&sid("a")));
        assert_eq!(engine.audio_active_stream(), Some(&sid("b")));
        assert_eq!(engine.slots().len(), 2);
    }

    #[test]
    fn test_move_is_locked_under_grid_templates() {
        let mut engine = engine();
        engine.set_template(TemplateId::Grid3x3).unwrap();
        add_streams(&mut engine, &["a"]);

        let err = engine.move_slot(&sid("a"), Point::new(10.0, 10.0)).unwrap_err();
        assert_eq!(err, LayoutError::TemplateLocked(TemplateId::Grid3x3));

        engine.set_template(TemplateId::Custom).unwrap();
        engine.move_slot(&sid("a"), Point::new(10_000.0, 10.0)).unwrap();

        let frame = engine.slot(&sid("a")).unwrap().frame;
        // clamped so the full rectangle stays inside the container
        assert_eq!(frame.max_x(), 800.0);
        assert_eq!(frame.origin.y, 10.0);
    }

    #[test]
    fn test_resize_enforces_minimum_floor() {
        let mut engine = engine();
        engine.set_template(TemplateId::Custom).unwrap();
        add_streams(&mut engine, &["a"]);

        engine.resize_slot(&sid("a"), Size::new(10.0, 10.0)).unwrap();
        assert_eq!(engine.slot(&sid("a")).unwrap().frame.size, Size::new(120.0, 68.0));

        let err = engine.resize_slot(&sid("a"), Size::new(0.0, 50.0)).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_stacking_order_ops_keep_z_dense() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c"]);

        engine.bring_to_front(&sid("a")).unwrap();
        let z: Vec<_> = engine
            .slots()
            .iter()
            .map(|slot| (slot.stream.as_str().to_string(), slot.z_index))
            .collect();
        assert_eq!(z, vec![
            ("a".to_string(), 3),
            ("b".to_string(), 1),
            ("c".to_string(), 2),
        ]);

        engine.send_to_back(&sid("a")).unwrap();
        let z: Vec<_> = engine.slots().iter().map(|slot| slot.z_index).collect();
        assert_eq!(z, vec![1, 2, 3]);
    }

    #[test]
    fn test_auto_arrange_switches_to_custom() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c"]);

        engine.auto_arrange(ArrangeStyle::Cascade);
        assert_eq!(engine.template_id(), TemplateId::Custom);

        // positions are manual now, so moves are allowed
        engine.move_slot(&sid("a"), Point::new(5.0, 5.0)).unwrap();
    }

    #[test]
    fn test_stale_container_resize_is_rejected() {
        let mut engine = engine();
        add_streams(&mut engine, &["a"]);

        engine.set_container_size(Size::new(1024.0, 768.0), 2).unwrap();
        let err = engine.set_container_size(Size::new(640.0, 480.0), 1).unwrap_err();
        assert_eq!(err, LayoutError::StaleResize { received: 1, current: 2 });
        assert_eq!(engine.container(), Size::new(1024.0, 768.0));
    }

    #[test]
    fn test_container_resize_clamps_custom_frames() {
        let mut engine = engine();
        engine.set_template(TemplateId::Custom).unwrap();
        add_streams(&mut engine, &["a"]);
        engine.resize_slot(&sid("a"), Size::new(300.0, 200.0)).unwrap();
        engine.move_slot(&sid("a"), Point::new(600.0, 400.0)).unwrap();

        engine.set_container_size(Size::new(700.0, 500.0), 1).unwrap();
        let frame = engine.slot(&sid("a")).unwrap().frame;
        assert!(frame.max_x() <= 700.0);
        assert!(frame.max_y() <= 500.0);
    }

    #[test]
    fn test_detach_preserves_audio_and_clears_focus() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);
        engine.set_focus(&sid("a")).unwrap();
        engine.set_audio_active(&sid("a")).unwrap();

        engine.detach_to_pip(&sid("a")).unwrap();

        assert!(engine.slot(&sid("a")).is_none());
        assert!(engine.pip().contains_stream(&sid("a")));
        assert_eq!(engine.focused_stream(), None);
        assert_eq!(engine.audio_active_stream(), Some(&sid("a")));
    }

    #[test]
    fn test_reattach_respects_capacity() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c", "d"]);
        engine.detach_to_pip(&sid("a")).unwrap();
        add_streams(&mut engine, &["e"]);

        let err = engine.reattach_from_pip(&sid("a")).unwrap_err();
        assert_eq!(err, LayoutError::CapacityExceeded { max: 4 });
        // the pane stayed in the floating layer
        assert!(engine.pip().contains_stream(&sid("a")));

        engine.remove_stream(&sid("e")).unwrap();
        engine.reattach_from_pip(&sid("a")).unwrap();
        assert!(engine.slot(&sid("a")).is_some());
        assert!(!engine.pip().contains_stream(&sid("a")));
    }

    #[test]
    fn test_fullscreen_hides_other_grid_panes() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c"]);
        let stored = engine.slot(&sid("b")).unwrap().frame;

        engine.toggle_fullscreen(&sid("b")).unwrap();
        let panes = engine.render_list();
        let grid: Vec<_> = panes.iter().filter(|p| p.layer == PaneLayer::Grid).collect();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].stream, sid("b"));
        assert_eq!(grid[0].frame, Rect::new(0.0, 0.0, 800.0, 600.0));

        engine.toggle_fullscreen(&sid("b")).unwrap();
        assert_eq!(engine.render_list().len(), 3);
        assert_eq!(engine.slot(&sid("b")).unwrap().frame, stored);
    }

    #[test]
    fn test_render_list_orders_pip_above_grid() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c"]);
        engine.detach_to_pip(&sid("c")).unwrap();

        let panes = engine.render_list();
        assert_eq!(panes.len(), 3);
        assert_eq!(panes.last().unwrap().layer, PaneLayer::Pip);
        assert!(panes.last().unwrap().z_index > PIP_Z_BASE);
        assert!(panes.windows(2).all(|w| w[0].z_index < w[1].z_index));
    }

    #[test]
    fn test_minimized_pip_renders_as_bubble() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);
        engine.detach_to_pip(&sid("a")).unwrap();
        engine.set_pip_minimized(&sid("a"), true).unwrap();

        let panes = engine.render_list();
        let pip = panes.iter().find(|p| p.layer == PaneLayer::Pip).unwrap();
        assert_eq!(pip.frame.size, Size::new(64.0, 64.0));
        assert!(pip.minimized);

        engine.set_pip_minimized(&sid("a"), false).unwrap();
        let panes = engine.render_list();
        let pip = panes.iter().find(|p| p.layer == PaneLayer::Pip).unwrap();
        assert_eq!(pip.frame.size, Size::new(320.0, 180.0));
    }

    #[test]
    fn test_swap_exchanges_frames_only() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);
        engine.set_focus(&sid("a")).unwrap();
        let frame_a = engine.slot(&sid("a")).unwrap().frame;
        let frame_b = engine.slot(&sid("b")).unwrap().frame;

        engine.swap_slots(&sid("a"), &sid("b")).unwrap();

        assert_eq!(engine.slot(&sid("a")).unwrap().frame, frame_b);
        assert_eq!(engine.slot(&sid("b")).unwrap().frame, frame_a);
        assert_eq!(engine.focused_stream(), Some(&sid("a")));
    }

    #[test]
    fn test_stream_ended_removes_from_either_collection() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b"]);
        engine.detach_to_pip(&sid("b")).unwrap();

        engine.stream_ended(&sid("a"));
        engine.stream_ended(&sid("b"));
        engine.stream_ended(&sid("ghost")); // ignored

        assert!(engine.slots().is_empty());
        assert!(engine.pip().is_empty());
    }

    #[test]
    fn test_hit_test_finds_topmost_pane() {
        let mut engine = engine();
        engine.set_template(TemplateId::Stack).unwrap();
        add_streams(&mut engine, &["a", "b"]);

        // both panes cover the canvas; "b" has the higher z
        assert_eq!(engine.hit_test(Point::new(400.0, 300.0)), Some(sid("b")));
        assert_eq!(engine.hit_test(Point::new(-5.0, -5.0)), None);
    }

    #[test]
    fn test_commit_drag_translates_from_committed_origin() {
        let mut engine = engine();
        engine.set_template(TemplateId::Custom).unwrap();
        add_streams(&mut engine, &["a"]);
        engine.resize_slot(&sid("a"), Size::new(200.0, 150.0)).unwrap();
        let origin = engine.slot(&sid("a")).unwrap().frame.origin;

        engine.commit_drag(&sid("a"), Vec2::new(40.0, 30.0)).unwrap();
        let moved = engine.slot(&sid("a")).unwrap().frame.origin;
        assert_eq!(moved, Point::new(origin.x + 40.0, origin.y + 30.0));
    }

    #[test]
    fn test_subscribers_observe_mutations() {
        let mut engine = engine();
        let rx = engine.subscribe();

        engine.add_stream(sid("a")).unwrap();
        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.contains(&LayoutEvent::SlotAdded { stream: sid("a") }));
        assert!(events.contains(&LayoutEvent::FramesChanged));
    }

    #[test]
    fn test_failed_operations_mutate_nothing() {
        let mut engine = engine();
        add_streams(&mut engine, &["a", "b", "c", "d"]);
        let before: Vec<_> = engine.slots().to_vec();

        let _ = engine.add_stream(sid("e"));
        let _ = engine.set_template(TemplateId::Single);
        let _ = engine.move_slot(&sid("a"), Point::new(1.0, 1.0));
        let _ = engine.remove_stream(&sid("ghost"));

        assert_eq!(engine.slots(), &before[..]);
        assert_eq!(engine.template_id(), TemplateId::Grid2x2);
    }
}
