use std::io::Write;

use pixelforge_core::buffer::PixelBuffer;

use crate::error::{Result, VideoError};

/// Consumer of processed frames, in order.
///
/// `finish` releases the output. Frames already written stay written even
/// when processing fails part-way.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &PixelBuffer) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

/// Collects frames in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<PixelBuffer>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[PixelBuffer] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<PixelBuffer> {
        self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &PixelBuffer) -> Result<()> {
        if self.finished {
            return Err(VideoError::WriteFailed("sink already finished".into()));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes the raw samples of each frame back to back, for piping into an
/// external encoder.
pub struct RawSink<W: Write> {
    writer: W,
    frames_written: u64,
    bytes_written: u64,
}

impl<W: Write> RawSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
            bytes_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for RawSink<W> {
    fn write_frame(&mut self, frame: &PixelBuffer) -> Result<()> {
        self.writer.write_all(&frame.data)?;
        self.frames_written += 1;
        self.bytes_written += frame.data.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelforge_core::buffer::RGB;

    #[test]
    fn test_memory_sink_collects_in_order() {
        let mut sink = MemorySink::new();
        for v in [1u8, 2, 3] {
            sink.write_frame(&PixelBuffer::filled(1, 1, RGB, v).unwrap())
                .unwrap();
        }
        sink.finish().unwrap();
        assert!(sink.is_finished());
        let values: Vec<u8> = sink.frames().iter().map(|f| f.data[0]).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_memory_sink_rejects_after_finish() {
        let mut sink = MemorySink::new();
        sink.finish().unwrap();
        let frame = PixelBuffer::filled(1, 1, RGB, 0).unwrap();
        assert!(matches!(
            sink.write_frame(&frame),
            Err(VideoError::WriteFailed(_))
        ));
    }

    #[test]
    fn test_raw_sink_writes_samples() {
        let mut sink = RawSink::new(Vec::new());
        sink.write_frame(&PixelBuffer::filled(2, 1, RGB, 7).unwrap())
            .unwrap();
        sink.write_frame(&PixelBuffer::filled(1, 1, RGB, 9).unwrap())
            .unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.frames_written(), 2);
        assert_eq!(sink.bytes_written(), 9);
        assert_eq!(sink.into_inner(), vec![7, 7, 7, 7, 7, 7, 9, 9, 9]);
    }
}
