use pixelforge_core::buffer::{GRAY, PixelBuffer, RGB};

/// What a [`PixelBufferBuilder`] paints into the buffer.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Solid(u8),
    /// Left-to-right ramp from 0 to 255.
    Gradient,
    /// Alternating `dark`/`light` squares of `cell` pixels.
    Checkerboard { cell: u32, dark: u8, light: u8 },
}

/// Builder for test buffers with sensible defaults: an 8x8 RGB buffer
/// filled with mid-gray.
pub struct PixelBufferBuilder {
    width: u32,
    height: u32,
    channels: u8,
    pattern: Pattern,
}

impl Default for PixelBufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelBufferBuilder {
    pub fn new() -> Self {
        Self {
            width: 8,
            height: 8,
            channels: RGB,
            pattern: Pattern::Solid(128),
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn gray(mut self) -> Self {
        self.channels = GRAY;
        self
    }

    pub fn rgb(mut self) -> Self {
        self.channels = RGB;
        self
    }

    pub fn solid(mut self, value: u8) -> Self {
        self.pattern = Pattern::Solid(value);
        self
    }

    pub fn gradient(mut self) -> Self {
        self.pattern = Pattern::Gradient;
        self
    }

    pub fn checkerboard(mut self, cell: u32, dark: u8, light: u8) -> Self {
        self.pattern = Pattern::Checkerboard {
            cell: cell.max(1),
            dark,
            light,
        };
        self
    }

    pub fn build(self) -> PixelBuffer {
        let channels = self.channels as usize;
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * channels);
        for y in 0..self.height {
            for x in 0..self.width {
                let value = match self.pattern {
                    Pattern::Solid(v) => v,
                    Pattern::Gradient if self.width > 1 => {
                        (x as u64 * 255 / (self.width as u64 - 1)) as u8
                    }
                    Pattern::Gradient => 0,
                    Pattern::Checkerboard { cell, dark, light } => {
                        if (x / cell + y / cell) % 2 == 0 {
                            dark
                        } else {
                            light
                        }
                    }
                };
                data.extend(std::iter::repeat_n(value, channels));
            }
        }
        PixelBuffer::new(self.width, self.height, self.channels, data)
            .expect("invalid dimensions in test builder")
    }
}

/// `count` frames of the same size whose solid value steps by `step`.
pub fn numbered_frames(count: usize, width: u32, height: u32, step: u8) -> Vec<PixelBuffer> {
    (0..count)
        .map(|i| {
            PixelBufferBuilder::new()
                .size(width, height)
                .solid((i as u8).wrapping_mul(step))
                .build()
        })
        .collect()
}
