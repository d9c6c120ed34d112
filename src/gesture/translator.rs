use std::time::Duration;

use tracing::{debug, trace};

use crate::common::config::GestureSettings;
use crate::gesture::events::{PinchEvent, PinchPhase, PointerEvent, PointerPhase};
use crate::model::geometry::{Point, Vec2};
use crate::model::stream::StreamId;

/// Discrete layout intents. `DragMove`/`Resize` are preview-only; the
/// engine commits a gesture exactly once, on its terminal intent.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutIntent {
    DragMove { stream: StreamId, translation: Vec2 },
    DragEnd { stream: StreamId, translation: Vec2 },
    DragCancelled { stream: StreamId },
    Resize { stream: StreamId, scale: f64 },
    ResizeEnd { stream: StreamId, scale: f64 },
    ResizeCancelled { stream: StreamId },
    Focus { stream: StreamId },
    ClearFocus,
    ToggleFullscreen { stream: StreamId },
    EnterSelection { stream: StreamId },
    Dismiss { stream: StreamId },
}

#[derive(Debug)]
enum GestureState {
    Idle,
    /// Finger down, not yet committed to a drag.
    Pressed {
        target: Option<StreamId>,
        origin: Point,
        started: Duration,
        selection_fired: bool,
    },
    Dragging {
        target: StreamId,
        origin: Point,
        position: Point,
        last_seen: Duration,
        prev_position: Point,
        prev_time: Duration,
    },
    Pinching {
        target: StreamId,
        scale: f64,
        last_seen: Duration,
    },
}

/// Converts raw pointer/pinch samples into discrete layout intents, with
/// threshold, double-tap, long-press and timeout rules. Pure state
/// machine: time comes in on the events, never from a clock.
///
/// Terminal intents (`DragEnd`/`ResizeEnd`/their cancellations) are
/// emitted exactly once per gesture, even when the underlying event
/// stream is interrupted; [`Self::poll_timeouts`] synthesizes the commit
/// from the last known state after a silence.
pub struct GestureTranslator {
    settings: GestureSettings,
    state: GestureState,
    last_tap: Option<(StreamId, Duration)>,
}

impl GestureTranslator {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            state: GestureState::Idle,
            last_tap: None,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<LayoutIntent> {
        let mut intents = Vec::new();
        match event.phase {
            PointerPhase::Down => {
                // a fresh touch while a gesture is in flight means its Up
                // was lost; commit the old gesture before starting over
                intents.extend(self.finish_in_flight());
                self.state = GestureState::Pressed {
                    target: event.target,
                    origin: event.position,
                    started: event.time,
                    selection_fired: false,
                };
            }
            PointerPhase::Moved => self.on_moved(event, &mut intents),
            PointerPhase::Up => self.on_up(event, &mut intents),
            PointerPhase::Cancelled => {
                if let GestureState::Dragging { target, .. } = &self.state {
                    debug!(stream = %target, "drag cancelled");
                    intents.push(LayoutIntent::DragCancelled { stream: target.clone() });
                }
                self.state = GestureState::Idle;
            }
        }
        intents
    }

    pub fn handle_pinch(&mut self, event: PinchEvent) -> Vec<LayoutIntent> {
        let mut intents = Vec::new();
        match event.phase {
            PinchPhase::Began => {
                intents.extend(self.finish_in_flight());
                if let Some(target) = event.target {
                    self.state = GestureState::Pinching {
                        target,
                        scale: 1.0,
                        last_seen: event.time,
                    };
                }
            }
            PinchPhase::Changed => {
                if let GestureState::Pinching { target, scale, last_seen } = &mut self.state {
                    *scale = event.scale.clamp(self.settings.min_scale, self.settings.max_scale);
                    *last_seen = event.time;
                    intents.push(LayoutIntent::Resize {
                        stream: target.clone(),
                        scale: *scale,
                    });
                }
            }
            PinchPhase::Ended => {
                if let GestureState::Pinching { target, .. } = &self.state {
                    let scale =
                        event.scale.clamp(self.settings.min_scale, self.settings.max_scale);
                    intents.push(LayoutIntent::ResizeEnd {
                        stream: target.clone(),
                        scale,
                    });
                    self.state = GestureState::Idle;
                }
            }
            PinchPhase::Cancelled => {
                if let GestureState::Pinching { target, .. } = &self.state {
                    intents.push(LayoutIntent::ResizeCancelled { stream: target.clone() });
                    self.state = GestureState::Idle;
                }
            }
        }
        intents
    }

    /// Timeout pump. Emits the pending long-press intent and, when an
    /// in-flight gesture has gone silent, its terminal commit.
    pub fn poll_timeouts(&mut self, now: Duration) -> Vec<LayoutIntent> {
        let mut intents = Vec::new();
        let timeout = Duration::from_millis(self.settings.gesture_timeout_ms);
        let long_press = Duration::from_millis(self.settings.long_press_ms);

        match &mut self.state {
            GestureState::Pressed { target, started, selection_fired, .. } => {
                if !*selection_fired
                    && now.saturating_sub(*started) >= long_press
                    && let Some(stream) = target.clone()
                {
                    *selection_fired = true;
                    intents.push(LayoutIntent::EnterSelection { stream });
                }
            }
            GestureState::Dragging { target, origin, position, last_seen, .. } => {
                if now.saturating_sub(*last_seen) >= timeout {
                    trace!(stream = %target, "drag timed out, committing last translation");
                    intents.push(LayoutIntent::DragEnd {
                        stream: target.clone(),
                        translation: Vec2::between(*origin, *position),
                    });
                    self.state = GestureState::Idle;
                }
            }
            GestureState::Pinching { target, scale, last_seen } => {
                if now.saturating_sub(*last_seen) >= timeout {
                    trace!(stream = %target, "pinch timed out, committing last scale");
                    intents.push(LayoutIntent::ResizeEnd {
                        stream: target.clone(),
                        scale: *scale,
                    });
                    self.state = GestureState::Idle;
                }
            }
            GestureState::Idle => {}
        }
        intents
    }

    fn on_moved(&mut self, event: PointerEvent, intents: &mut Vec<LayoutIntent>) {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Pressed { target, origin, started, mut selection_fired } => {
                let travel = Vec2::between(origin, event.position).length();
                if travel >= self.settings.drag_start_distance {
                    // canvas pans (no target) are not an intent source
                    if let Some(stream) = target {
                        intents.push(LayoutIntent::DragMove {
                            stream: stream.clone(),
                            translation: Vec2::between(origin, event.position),
                        });
                        self.state = GestureState::Dragging {
                            target: stream,
                            origin,
                            position: event.position,
                            last_seen: event.time,
                            prev_position: origin,
                            prev_time: started,
                        };
                    }
                } else {
                    if !selection_fired
                        && event.time.saturating_sub(started)
                            >= Duration::from_millis(self.settings.long_press_ms)
                        && let Some(stream) = target.clone()
                    {
                        selection_fired = true;
                        intents.push(LayoutIntent::EnterSelection { stream });
                    }
                    self.state = GestureState::Pressed {
                        target,
                        origin,
                        started,
                        selection_fired,
                    };
                }
            }
            GestureState::Dragging { target, origin, position, last_seen, .. } => {
                intents.push(LayoutIntent::DragMove {
                    stream: target.clone(),
                    translation: Vec2::between(origin, event.position),
                });
                self.state = GestureState::Dragging {
                    target,
                    origin,
                    position: event.position,
                    last_seen: event.time,
                    prev_position: position,
                    prev_time: last_seen,
                };
            }
            state => self.state = state,
        }
    }

    fn on_up(&mut self, event: PointerEvent, intents: &mut Vec<LayoutIntent>) {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Pressed { target, origin, started, selection_fired } => {
                if selection_fired {
                    return;
                }
                if Vec2::between(origin, event.position).length() > self.settings.tap_slop {
                    return;
                }
                match target {
                    Some(stream) => {
                        let window = Duration::from_millis(self.settings.double_tap_window_ms);
                        let is_double = self
                            .last_tap
                            .as_ref()
                            .is_some_and(|(last, at)| {
                                *last == stream && started.saturating_sub(*at) <= window
                            });
                        if is_double {
                            self.last_tap = None;
                            intents.push(LayoutIntent::ToggleFullscreen { stream });
                        } else {
                            self.last_tap = Some((stream.clone(), event.time));
                            intents.push(LayoutIntent::Focus { stream });
                        }
                    }
                    None => {
                        self.last_tap = None;
                        intents.push(LayoutIntent::ClearFocus);
                    }
                }
            }
            GestureState::Dragging {
                target,
                origin,
                position,
                last_seen,
                prev_position,
                prev_time,
            } => {
                if self.is_dismiss_flick(prev_position, position, prev_time, last_seen) {
                    debug!(stream = %target, "flick dismissed pane");
                    intents.push(LayoutIntent::DragCancelled { stream: target.clone() });
                    intents.push(LayoutIntent::Dismiss { stream: target });
                } else {
                    intents.push(LayoutIntent::DragEnd {
                        stream: target,
                        translation: Vec2::between(origin, position),
                    });
                }
            }
            state => self.state = state,
        }
    }

    /// A release counts as a dismiss when the final samples form a fast,
    /// predominantly vertical flick.
    fn is_dismiss_flick(
        &self,
        prev_position: Point,
        position: Point,
        prev_time: Duration,
        last_seen: Duration,
    ) -> bool {
        let dt = last_seen.saturating_sub(prev_time).as_secs_f64();
        if dt <= 0.0 {
            return false;
        }
        let dx = position.x - prev_position.x;
        let dy = position.y - prev_position.y;
        let vertical_speed = (dy / dt).abs();
        vertical_speed >= self.settings.dismiss_velocity && dy.abs() > dx.abs()
    }

    /// Commits whatever gesture is in flight. Used when a new touch
    /// arrives before the previous gesture terminated.
    fn finish_in_flight(&mut self) -> Vec<LayoutIntent> {
        let mut intents = Vec::new();
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Dragging { target, origin, position, .. } => {
                intents.push(LayoutIntent::DragEnd {
                    stream: target,
                    translation: Vec2::between(origin, position),
                });
            }
            GestureState::Pinching { target, scale, .. } => {
                intents.push(LayoutIntent::ResizeEnd { stream: target, scale });
            }
            GestureState::Idle | GestureState::Pressed { .. } => {}
        }
        intents
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    fn ms(millis: u64) -> Duration { Duration::from_millis(millis) }

    fn sid(s: &str) -> StreamId { StreamId::from(s) }

    fn translator() -> GestureTranslator { GestureTranslator::new(GestureSettings::default()) }

    fn down(target: Option<&str>, x: f64, y: f64, at: u64) -> PointerEvent {
        PointerEvent::new(
            PointerPhase::Down,
            Point::new(x, y),
            target.map(sid),
            ms(at),
        )
    }

    fn moved(x: f64, y: f64, at: u64) -> PointerEvent {
        PointerEvent::new(PointerPhase::Moved, Point::new(x, y), None, ms(at))
    }

    fn up(x: f64, y: f64, at: u64) -> PointerEvent {
        PointerEvent::new(PointerPhase::Up, Point::new(x, y), None, ms(at))
    }

    #[test]
    fn test_tap_on_slot_focuses() {
        let mut translator = translator();
        assert_eq!(translator.handle_pointer(down(Some("a"), 10.0, 10.0, 0)), vec![]);
        assert_eq!(
            translator.handle_pointer(up(12.0, 11.0, 80)),
            vec![LayoutIntent::Focus { stream: sid("a") }]
        );
    }

    #[test]
    fn test_tap_on_empty_canvas_clears_focus() {
        let mut translator = translator();
        translator.handle_pointer(down(None, 10.0, 10.0, 0));
        assert_eq!(
            translator.handle_pointer(up(10.0, 10.0, 50)),
            vec![LayoutIntent::ClearFocus]
        );
    }

    #[test]
    fn test_double_tap_toggles_fullscreen() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 10.0, 10.0, 0));
        translator.handle_pointer(up(10.0, 10.0, 50));
        translator.handle_pointer(down(Some("a"), 10.0, 10.0, 200));
        assert_eq!(
            translator.handle_pointer(up(10.0, 10.0, 250)),
            vec![LayoutIntent::ToggleFullscreen { stream: sid("a") }]
        );
    }

    #[test]
    fn test_slow_second_tap_focuses_again() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 10.0, 10.0, 0));
        translator.handle_pointer(up(10.0, 10.0, 50));
        translator.handle_pointer(down(Some("a"), 10.0, 10.0, 800));
        assert_eq!(
            translator.handle_pointer(up(10.0, 10.0, 850)),
            vec![LayoutIntent::Focus { stream: sid("a") }]
        );
    }

    #[test]
    fn test_drag_previews_then_commits_once() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 100.0, 100.0, 0));

        let intents = translator.handle_pointer(moved(120.0, 100.0, 30));
        assert_eq!(intents, vec![LayoutIntent::DragMove {
            stream: sid("a"),
            translation: Vec2::new(20.0, 0.0),
        }]);

        let intents = translator.handle_pointer(moved(150.0, 110.0, 60));
        assert_eq!(intents, vec![LayoutIntent::DragMove {
            stream: sid("a"),
            translation: Vec2::new(50.0, 10.0),
        }]);

        let intents = translator.handle_pointer(up(150.0, 110.0, 90));
        assert_eq!(intents, vec![LayoutIntent::DragEnd {
            stream: sid("a"),
            translation: Vec2::new(50.0, 10.0),
        }]);

        // the gesture is over; stray events emit nothing
        assert_eq!(translator.handle_pointer(up(150.0, 110.0, 100)), vec![]);
    }

    #[test]
    fn test_movement_below_threshold_stays_a_tap() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 100.0, 100.0, 0));
        translator.handle_pointer(moved(103.0, 102.0, 30));
        assert_eq!(
            translator.handle_pointer(up(103.0, 102.0, 60)),
            vec![LayoutIntent::Focus { stream: sid("a") }]
        );
    }

    #[test]
    fn test_cancelled_drag_discards_preview() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 100.0, 100.0, 0));
        translator.handle_pointer(moved(140.0, 100.0, 30));

        let intents = translator.handle_pointer(PointerEvent::new(
            PointerPhase::Cancelled,
            Point::new(140.0, 100.0),
            None,
            ms(40),
        ));
        assert_eq!(intents, vec![LayoutIntent::DragCancelled { stream: sid("a") }]);
        assert_eq!(translator.handle_pointer(up(140.0, 100.0, 50)), vec![]);
    }

    #[test]
    fn test_timeout_commits_drag_exactly_once() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 100.0, 100.0, 0));
        translator.handle_pointer(moved(160.0, 100.0, 30));

        assert_eq!(translator.poll_timeouts(ms(500)), vec![]);

        let intents = translator.poll_timeouts(ms(2_100));
        assert_eq!(intents, vec![LayoutIntent::DragEnd {
            stream: sid("a"),
            translation: Vec2::new(60.0, 0.0),
        }]);

        // the late Up for the dead gesture is ignored
        assert_eq!(translator.handle_pointer(up(160.0, 100.0, 2_200)), vec![]);
        assert_eq!(translator.poll_timeouts(ms(5_000)), vec![]);
    }

    #[test]
    fn test_new_touch_commits_lost_gesture() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 100.0, 100.0, 0));
        translator.handle_pointer(moved(160.0, 100.0, 30));

        let intents = translator.handle_pointer(down(Some("b"), 10.0, 10.0, 60));
        assert_eq!(intents, vec![LayoutIntent::DragEnd {
            stream: sid("a"),
            translation: Vec2::new(60.0, 0.0),
        }]);
    }

    #[test]
    fn test_pinch_scale_is_clamped() {
        let mut translator = translator();
        translator.handle_pinch(PinchEvent::new(PinchPhase::Began, 1.0, Some(sid("a")), ms(0)));

        let intents =
            translator.handle_pinch(PinchEvent::new(PinchPhase::Changed, 3.5, None, ms(30)));
        assert_eq!(intents, vec![LayoutIntent::Resize { stream: sid("a"), scale: 2.0 }]);

        let intents =
            translator.handle_pinch(PinchEvent::new(PinchPhase::Changed, 0.1, None, ms(60)));
        assert_eq!(intents, vec![LayoutIntent::Resize { stream: sid("a"), scale: 0.5 }]);

        let intents =
            translator.handle_pinch(PinchEvent::new(PinchPhase::Ended, 0.3, None, ms(90)));
        assert_eq!(intents, vec![LayoutIntent::ResizeEnd { stream: sid("a"), scale: 0.5 }]);
    }

    #[test]
    fn test_pinch_cancel_discards_preview() {
        let mut translator = translator();
        translator.handle_pinch(PinchEvent::new(PinchPhase::Began, 1.0, Some(sid("a")), ms(0)));
        translator.handle_pinch(PinchEvent::new(PinchPhase::Changed, 1.5, None, ms(30)));

        let intents =
            translator.handle_pinch(PinchEvent::new(PinchPhase::Cancelled, 1.5, None, ms(40)));
        assert_eq!(intents, vec![LayoutIntent::ResizeCancelled { stream: sid("a") }]);
    }

    #[test]
    fn test_long_press_enters_selection_mode() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 100.0, 100.0, 0));

        let intents = translator.poll_timeouts(ms(600));
        assert_eq!(intents, vec![LayoutIntent::EnterSelection { stream: sid("a") }]);

        // only once, and the release is not a tap
        assert_eq!(translator.poll_timeouts(ms(700)), vec![]);
        assert_eq!(translator.handle_pointer(up(100.0, 100.0, 800)), vec![]);
    }

    #[test]
    fn test_fast_vertical_flick_dismisses() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 100.0, 100.0, 0));
        translator.handle_pointer(moved(100.0, 160.0, 50));
        translator.handle_pointer(moved(100.0, 300.0, 100));

        let intents = translator.handle_pointer(up(100.0, 300.0, 110));
        assert_eq!(intents, vec![
            LayoutIntent::DragCancelled { stream: sid("a") },
            LayoutIntent::Dismiss { stream: sid("a") },
        ]);
    }

    #[test]
    fn test_slow_vertical_drag_commits_normally() {
        let mut translator = translator();
        translator.handle_pointer(down(Some("a"), 100.0, 100.0, 0));
        translator.handle_pointer(moved(100.0, 160.0, 500));
        translator.handle_pointer(moved(100.0, 200.0, 1_000));

        let intents = translator.handle_pointer(up(100.0, 200.0, 1_050));
        assert_eq!(intents, vec![LayoutIntent::DragEnd {
            stream: sid("a"),
            translation: Vec2::new(0.0, 100.0),
        }]);
    }
}
