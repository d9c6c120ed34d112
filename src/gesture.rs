pub mod events;
pub mod translator;

pub use events::{PinchEvent, PinchPhase, PointerEvent, PointerPhase};
pub use translator::{GestureTranslator, LayoutIntent};
