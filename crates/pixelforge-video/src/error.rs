use pixelforge_core::error::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("failed to read frame: {0}")]
    ReadFailed(String),

    #[error("failed to write frame: {0}")]
    WriteFailed(String),

    #[error("stream ended after {read} of {expected} frames")]
    Truncated { read: u64, expected: u64 },

    #[error("filter error: {0}")]
    Filter(#[from] CoreError),

    #[error("video processing failed after {frames_written} frame(s) written: {source}")]
    ProcessingFailed {
        frames_written: u64,
        #[source]
        source: Box<VideoError>,
    },

    #[error("processor halted by an earlier failure")]
    Halted,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VideoError {
    /// Frames written before a processing failure, if this is one.
    pub fn frames_written(&self) -> Option<u64> {
        match self {
            Self::ProcessingFailed { frames_written, .. } => Some(*frames_written),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VideoError>;
