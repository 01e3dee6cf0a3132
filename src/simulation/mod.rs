pub mod field;
pub mod grid;
pub mod path;
pub mod ray;
pub mod sequencer;

pub use field::BubbleParameters;
pub use grid::SpatialGrid;
pub use path::BubblePath;
pub use ray::RayMode;
pub use sequencer::{suggested_y_range, Frame, FrameSequencer};
