pub mod broadcast;
pub mod common;
pub mod gesture;
pub mod handle;
pub mod layout_engine;
pub mod model;
