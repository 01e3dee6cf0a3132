mod buffers;
mod context;
mod plot;

pub use context::{GpuContext, RenderError};
pub use plot::PlotRenderer;
