mod gif;
mod jsonl;
mod raster;

pub use gif::GifSink;
pub use jsonl::JsonlSink;

use crate::error::WarpError;

/// Failures while realizing frames into files
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Model(#[from] WarpError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame record serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sink already finished")]
    Finished,
}
