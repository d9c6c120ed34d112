use std::time::Duration;

use crate::model::geometry::Point;
use crate::model::stream::StreamId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Moved,
    Up,
    Cancelled,
}

/// One raw pointer sample from the input layer. `time` is a monotonic,
/// caller-supplied timestamp; `target` is the input layer's hit-test
/// result for the position (None over empty canvas).
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Point,
    pub target: Option<StreamId>,
    pub time: Duration,
}

impl PointerEvent {
    pub fn new(
        phase: PointerPhase,
        position: Point,
        target: Option<StreamId>,
        time: Duration,
    ) -> Self {
        Self {
            phase,
            position,
            target,
            time,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchPhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// One raw pinch/magnify sample. `scale` is relative to the gesture's
/// start (1.0 = unchanged).
#[derive(Clone, Debug, PartialEq)]
pub struct PinchEvent {
    pub phase: PinchPhase,
    pub scale: f64,
    pub target: Option<StreamId>,
    pub time: Duration,
}

impl PinchEvent {
    pub fn new(phase: PinchPhase, scale: f64, target: Option<StreamId>, time: Duration) -> Self {
        Self {
            phase,
            scale,
            target,
            time,
        }
    }
}
