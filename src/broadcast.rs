use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Serialize;
use tracing::{error, trace};

use crate::layout_engine::templates::TemplateId;
use crate::model::stream::StreamId;

/// Change notifications fanned out to render/UI subscribers after each
/// successful mutation. Payloads carry identifiers only; subscribers pull
/// frames from the current render snapshot.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum LayoutEvent {
    SlotAdded { stream: StreamId },
    SlotRemoved { stream: StreamId },
    TemplateChanged { template: TemplateId },
    FramesChanged,
    FocusChanged { stream: Option<StreamId> },
    AudioChanged { stream: Option<StreamId> },
    PipChanged,
}

impl LayoutEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutEvent::SlotAdded { .. } => "slot_added",
            LayoutEvent::SlotRemoved { .. } => "slot_removed",
            LayoutEvent::TemplateChanged { .. } => "template_changed",
            LayoutEvent::FramesChanged => "frames_changed",
            LayoutEvent::FocusChanged { .. } => "focus_changed",
            LayoutEvent::AudioChanged { .. } => "audio_changed",
            LayoutEvent::PipChanged => "pip_changed",
        }
    }
}

/// Fan-out of [`LayoutEvent`]s over unbounded channels. Disconnected
/// subscribers are pruned on the next publish.
#[derive(Default, Debug)]
pub struct Broadcaster {
    senders: Vec<Sender<LayoutEvent>>,
}

impl Broadcaster {
    pub fn new() -> Self { Self::default() }

    pub fn subscribe(&mut self) -> Receiver<LayoutEvent> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize { self.senders.len() }

    pub fn publish(&mut self, event: LayoutEvent) {
        if self.senders.is_empty() {
            return;
        }
        match serde_json::to_string(&event) {
            Ok(json) => trace!(event = %json, "publishing {}", event.name()),
            Err(e) => error!("failed to serialize layout event: {e}"),
        }
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
