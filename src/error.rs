/// Errors raised by the field model and frame sequencer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WarpError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("frame index {index} out of range (frame count {count})")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("shape mismatch: grid has {expected} samples, field has {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

impl WarpError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        WarpError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type WarpResult<T> = Result<T, WarpError>;
