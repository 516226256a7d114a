use pixelforge_core::buffer::PixelBuffer;
use pixelforge_core::config::EngineConfig;
use pixelforge_core::effects::{Filter, apply_optional};
use serde::{Deserialize, Serialize};

use crate::decoder::{FrameSource, StreamInfo};
use crate::encoder::FrameSink;
use crate::error::{Result, VideoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    Running,
    Completed,
    Failed,
}

impl DriverState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub frames_written: u64,
    /// Declared frame count, 0 when unknown.
    pub total_frames: u64,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub frames_written: u64,
    pub stream: StreamInfo,
    pub filter: Option<Filter>,
}

/// Applies one filter to every frame of a stream, strictly in order.
///
/// Each `step` reads, filters and writes at most one frame. The first read,
/// filter or write error is terminal: frames already written stay in the
/// sink, the sink is finished, and nothing further is read or written.
pub struct VideoProcessor<S, K> {
    source: S,
    sink: K,
    filter: Option<Filter>,
    config: EngineConfig,
    info: StreamInfo,
    state: DriverState,
    frames_written: u64,
    percent: u8,
}

impl<S: FrameSource, K: FrameSink> VideoProcessor<S, K> {
    pub fn new(source: S, sink: K, filter: Option<Filter>) -> Self {
        let info = source.stream_info();
        Self {
            source,
            sink,
            filter,
            config: EngineConfig::default(),
            info,
            state: DriverState::Running,
            frames_written: 0,
            percent: 0,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stream_info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn progress(&self) -> Progress {
        Progress {
            frames_written: self.frames_written,
            total_frames: self.info.frame_count,
            percent: self.percent,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Advance by one frame. Terminal states are returned unchanged.
    pub fn step(&mut self) -> Result<DriverState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let total = self.info.frame_count;
        if total > 0 && self.frames_written >= total {
            return self.complete();
        }

        let frame = match self.source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) if total > 0 && self.frames_written < total => {
                return Err(self.fail(VideoError::Truncated {
                    read: self.frames_written,
                    expected: total,
                }));
            }
            Ok(None) => return self.complete(),
            Err(e) => return Err(self.fail(e)),
        };

        let output = match self.transform(&frame) {
            Ok(output) => output,
            Err(e) => return Err(self.fail(e)),
        };
        if let Err(e) = self.sink.write_frame(&output) {
            return Err(self.fail(e));
        }

        self.frames_written += 1;
        tracing::debug!(frame = self.frames_written, total, "wrote frame");
        self.advance_percent();
        Ok(self.state)
    }

    /// Step until the stream completes or fails.
    pub fn run(&mut self) -> Result<ProcessingSummary> {
        if self.state == DriverState::Failed {
            return Err(VideoError::Halted);
        }
        tracing::info!(
            filter = self.filter.map(|f| f.name()).unwrap_or("none"),
            width = self.info.width,
            height = self.info.height,
            fps = self.info.fps,
            frames = self.info.frame_count,
            "processing video"
        );
        while self.step()? == DriverState::Running {}
        tracing::info!(frames = self.frames_written, "video processing complete");
        Ok(ProcessingSummary {
            frames_written: self.frames_written,
            stream: self.info.clone(),
            filter: self.filter,
        })
    }

    fn transform(&self, frame: &PixelBuffer) -> Result<PixelBuffer> {
        Ok(apply_optional(self.filter, frame, &self.config)?)
    }

    fn advance_percent(&mut self) {
        let total = self.info.frame_count;
        if total == 0 {
            return;
        }
        let step = total.div_ceil(100).max(1);
        if self.frames_written % step == 0 && self.percent < 100 {
            self.percent += 1;
            tracing::info!(percent = self.percent, "progress");
        }
    }

    fn complete(&mut self) -> Result<DriverState> {
        if let Err(e) = self.sink.finish() {
            self.state = DriverState::Failed;
            self.warn_failed(&e);
            return Err(self.wrap(e));
        }
        self.state = DriverState::Completed;
        self.percent = 100;
        Ok(self.state)
    }

    fn fail(&mut self, error: VideoError) -> VideoError {
        self.state = DriverState::Failed;
        self.warn_failed(&error);
        if let Err(finish_error) = self.sink.finish() {
            tracing::warn!(error = %finish_error, "failed to finish sink after error");
        }
        self.wrap(error)
    }

    fn warn_failed(&self, error: &VideoError) {
        tracing::warn!(
            frames_written = self.frames_written,
            error = %error,
            "video processing failed"
        );
    }

    fn wrap(&self, error: VideoError) -> VideoError {
        VideoError::ProcessingFailed {
            frames_written: self.frames_written,
            source: Box::new(error),
        }
    }
}
