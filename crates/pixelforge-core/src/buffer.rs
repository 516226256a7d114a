use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Samples per pixel for a grayscale buffer.
pub const GRAY: u8 = 1;
/// Samples per pixel for an RGB buffer.
pub const RGB: u8 = 3;

// =============================================================================
// PixelBuffer
// =============================================================================

/// An owned 8-bit image, row-major with interleaved samples.
///
/// Colour buffers are RGB-ordered. Every transform reads a buffer and returns
/// a new one; nothing in the engine mutates a buffer it was handed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// 1 (grayscale) or 3 (RGB).
    pub channels: u8,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap existing samples, checking the shape invariants.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        let buffer = Self {
            width,
            height,
            channels,
            data,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// A buffer with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self> {
        let len = expected_len(width, height, channels).ok_or(CoreError::UnsupportedBufferShape {
            width,
            height,
            channels,
            len: 0,
        })?;
        Self::new(width, height, channels, vec![value; len])
    }

    pub fn from_gray(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, GRAY, data)
    }

    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, RGB, data)
    }

    /// Check dimensions, channel count and sample count.
    pub fn validate(&self) -> Result<()> {
        let ok = self.width > 0
            && self.height > 0
            && matches!(self.channels, GRAY | RGB)
            && expected_len(self.width, self.height, self.channels) == Some(self.data.len());
        if ok {
            Ok(())
        } else {
            Err(CoreError::UnsupportedBufferShape {
                width: self.width,
                height: self.height,
                channels: self.channels,
                len: self.data.len(),
            })
        }
    }

    pub fn is_gray(&self) -> bool {
        self.channels == GRAY
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    /// Bytes in one row.
    pub fn row_len(&self) -> usize {
        self.width() * self.channels as usize
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Samples of the pixel at (x, y). Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let idx = (y as usize * self.width() + x as usize) * c;
        &self.data[idx..idx + c]
    }

    /// A buffer of the same dimensions with new samples. Used by transforms
    /// that change the channel count.
    pub(crate) fn with_data(&self, channels: u8, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), self.pixel_count() * channels as usize);
        Self {
            width: self.width,
            height: self.height,
            channels,
            data,
        }
    }

    /// True when `other` has the same width and height.
    pub fn same_dimensions(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }
}

fn expected_len(width: u32, height: u32, channels: u8) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        assert!(PixelBuffer::new(2, 2, RGB, vec![0; 12]).is_ok());
        assert!(matches!(
            PixelBuffer::new(2, 2, RGB, vec![0; 11]),
            Err(CoreError::UnsupportedBufferShape { len: 11, .. })
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(PixelBuffer::new(0, 4, GRAY, vec![]).is_err());
        assert!(PixelBuffer::new(4, 0, GRAY, vec![]).is_err());
    }

    #[test]
    fn test_unsupported_channel_count() {
        assert!(PixelBuffer::new(1, 1, 4, vec![0; 4]).is_err());
        assert!(PixelBuffer::new(1, 1, 2, vec![0; 2]).is_err());
    }

    #[test]
    fn test_validate_catches_tampered_fields() {
        let mut buffer = PixelBuffer::filled(3, 3, GRAY, 7).unwrap();
        buffer.data.pop();
        assert!(buffer.validate().is_err());
    }

    #[test]
    fn test_pixel_access() {
        let data: Vec<u8> = (0..12).collect();
        let buffer = PixelBuffer::from_rgb(2, 2, data).unwrap();
        assert_eq!(buffer.pixel(1, 0), &[3, 4, 5]);
        assert_eq!(buffer.pixel(0, 1), &[6, 7, 8]);
        assert_eq!(buffer.row_len(), 6);
        assert_eq!(buffer.pixel_count(), 4);
    }

    #[test]
    fn test_serde_roundtrip() {
        let buffer = PixelBuffer::filled(2, 3, RGB, 42).unwrap();
        let json = serde_json::to_string(&buffer).unwrap();
        let back: PixelBuffer = serde_json::from_str(&json).unwrap();
        assert_eq!(buffer, back);
    }
}
