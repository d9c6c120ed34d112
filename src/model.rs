pub mod geometry;
pub mod snapshot_cell;
pub mod stream;

pub use geometry::{Point, Rect, Size, Vec2};
pub use snapshot_cell::SnapshotCell;
pub use stream::StreamId;
