use thiserror::Error;

/// Caller contract violations. Environmental failures never surface here.
#[derive(Debug, Error, PartialEq)]
pub enum CaptionError {
    #[error("narration text is empty")]
    EmptyText,
    #[error("narration duration must be positive and finite, got {0}")]
    InvalidDuration(f64),
    #[error("invalid caption settings: {0}")]
    InvalidSettings(String),
}
