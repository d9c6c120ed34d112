pub mod arrange;
pub mod engine;
pub mod pip;
pub mod slot;
pub mod snapshot;
pub mod templates;
pub(crate) mod utils;

pub use arrange::ArrangeStyle;
pub use engine::{LayoutEngine, LayoutError, PaneFrame, PaneLayer};
pub use pip::{PIP_Z_BASE, PipLayer};
pub use slot::{PipId, PipSlot, Slot};
pub use snapshot::LayoutSnapshot;
pub use templates::{Template, TemplateId, TemplateKind};
