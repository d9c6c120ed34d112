use serde::{Deserialize, Serialize};

use crate::model::geometry::{Point, Rect, Size};
use crate::model::stream::StreamId;

slotmap::new_key_type! {
    pub struct PipId;
}

/// One stream's assignment to screen space in the main grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub stream: StreamId,
    pub frame: Rect,
    pub z_index: i32,
    pub focused: bool,
    /// Minimized and maximized are mutually exclusive; a slot is "normal"
    /// when both are false. Maximized doubles as the fullscreen state.
    pub minimized: bool,
    pub maximized: bool,
    pub audio_active: bool,
}

impl Slot {
    pub(crate) fn new(stream: StreamId, frame: Rect, z_index: i32) -> Self {
        Self {
            stream,
            frame,
            z_index,
            focused: false,
            minimized: false,
            maximized: false,
            audio_active: false,
        }
    }

    pub fn is_normal(&self) -> bool { !self.minimized && !self.maximized }
}

/// A detached pane in the free-floating overlay layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipSlot {
    pub stream: StreamId,
    pub origin: Point,
    /// Stored pane size. Survives minimize; the rendered footprint while
    /// minimized is the configured bubble size.
    pub size: Size,
    pub minimized: bool,
    pub maximized: bool,
    pub audio_active: bool,
    pub z_index: i32,
}

impl PipSlot {
    pub(crate) fn new(stream: StreamId, origin: Point, size: Size, z_index: i32) -> Self {
        Self {
            stream,
            origin,
            size,
            minimized: false,
            maximized: false,
            audio_active: false,
            z_index,
        }
    }

    pub fn frame(&self) -> Rect { Rect::from_parts(self.origin, self.size) }

    /// The footprint this pane currently renders with.
    pub fn display_size(&self, bubble: Size) -> Size {
        if self.minimized { bubble } else { self.size }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_new_slot_starts_normal_and_silent() {
        let slot = Slot::new(StreamId::from("a"), Rect::new(0.0, 0.0, 10.0, 10.0), 1);
        assert!(slot.is_normal());
        assert!(!slot.focused);
        assert!(!slot.audio_active);
    }

    #[test]
    fn test_minimized_pip_reports_bubble_footprint() {
        let mut pip = PipSlot::new(
            StreamId::from("a"),
            Point::new(5.0, 5.0),
            Size::new(320.0, 180.0),
            1_000,
        );
        let bubble = Size::new(64.0, 64.0);

        assert_eq!(pip.display_size(bubble), Size::new(320.0, 180.0));
        pip.minimized = true;
        assert_eq!(pip.display_size(bubble), bubble);
        // stored size is untouched
        assert_eq!(pip.size, Size::new(320.0, 180.0));
    }
}
