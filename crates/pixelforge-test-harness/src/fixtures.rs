use pixelforge_core::buffer::PixelBuffer;
use pixelforge_video::decoder::{FrameSource, StreamInfo};
use pixelforge_video::encoder::FrameSink;
use pixelforge_video::error::{Result, VideoError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Route engine logs to the test output. Filtered by `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::Layer::default()
                .compact()
                .with_test_writer(),
        )
        .try_init();
}

/// A frame source that plays back a fixed list and can be told to fail.
pub struct ScriptedSource {
    info: StreamInfo,
    frames: Vec<PixelBuffer>,
    fail_at: Option<usize>,
    end_at: Option<usize>,
    reads: usize,
}

impl ScriptedSource {
    /// Declares exactly as many frames as given.
    pub fn new(frames: Vec<PixelBuffer>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0));
        Self {
            info: StreamInfo {
                width,
                height,
                fps: 30.0,
                frame_count: frames.len() as u64,
            },
            frames,
            fail_at: None,
            end_at: None,
            reads: 0,
        }
    }

    pub fn declared_frames(mut self, count: u64) -> Self {
        self.info.frame_count = count;
        self
    }

    /// The read of frame `index` (0-based) returns an error.
    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// The stream reports exhaustion at frame `index`, whatever was declared.
    pub fn end_at(mut self, index: usize) -> Self {
        self.end_at = Some(index);
        self
    }

    /// Number of `read_frame` calls made so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl FrameSource for ScriptedSource {
    fn stream_info(&self) -> StreamInfo {
        self.info.clone()
    }

    fn read_frame(&mut self) -> Result<Option<PixelBuffer>> {
        let index = self.reads;
        self.reads += 1;
        if self.fail_at == Some(index) {
            return Err(VideoError::ReadFailed(format!("scripted failure at frame {index}")));
        }
        if self.end_at.is_some_and(|end| index >= end) {
            return Ok(None);
        }
        Ok(self.frames.get(index).cloned())
    }
}

/// A sink that records what it was given and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<PixelBuffer>,
    pub write_attempts: usize,
    pub finish_calls: usize,
    fail_on_write: Option<usize>,
    fail_on_finish: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write number `index` (0-based) returns an error.
    pub fn fail_on_write(mut self, index: usize) -> Self {
        self.fail_on_write = Some(index);
        self
    }

    /// `finish` returns an error, after counting the call.
    pub fn fail_on_finish(mut self) -> Self {
        self.fail_on_finish = true;
        self
    }
}

impl FrameSink for RecordingSink {
    fn write_frame(&mut self, frame: &PixelBuffer) -> Result<()> {
        let index = self.write_attempts;
        self.write_attempts += 1;
        if self.fail_on_write == Some(index) {
            return Err(VideoError::WriteFailed(format!("scripted failure at write {index}")));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finish_calls += 1;
        if self.fail_on_finish {
            return Err(VideoError::WriteFailed("scripted failure on finish".into()));
        }
        Ok(())
    }
}
