use pixelforge_core::buffer::PixelBuffer;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Properties a decoder declares up front for its stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Declared number of frames. 0 means the length is unknown.
    pub frame_count: u64,
}

impl StreamInfo {
    pub fn duration_secs(&self) -> Option<f64> {
        (self.fps > 0.0 && self.frame_count > 0).then(|| self.frame_count as f64 / self.fps)
    }
}

/// A one-pass, forward-only supply of decoded frames.
///
/// Implemented by the decode layer; the processor never seeks.
pub trait FrameSource {
    fn stream_info(&self) -> StreamInfo;

    /// The next frame, `Ok(None)` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<PixelBuffer>>;
}

/// Adapts any iterator of frames into a [`FrameSource`].
pub struct IterSource<I> {
    info: StreamInfo,
    frames: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Result<PixelBuffer>>,
{
    pub fn new(info: StreamInfo, frames: I) -> Self {
        Self { info, frames }
    }
}

impl IterSource<std::vec::IntoIter<Result<PixelBuffer>>> {
    /// A source over already-decoded frames. The declared count is the
    /// number of frames given.
    pub fn from_frames(fps: f64, frames: Vec<PixelBuffer>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0));
        let info = StreamInfo {
            width,
            height,
            fps,
            frame_count: frames.len() as u64,
        };
        let frames: Vec<Result<PixelBuffer>> = frames.into_iter().map(Ok).collect();
        Self::new(info, frames.into_iter())
    }
}

impl<I> FrameSource for IterSource<I>
where
    I: Iterator<Item = Result<PixelBuffer>>,
{
    fn stream_info(&self) -> StreamInfo {
        self.info.clone()
    }

    fn read_frame(&mut self) -> Result<Option<PixelBuffer>> {
        self.frames.next().transpose()
    }
}
