use std::ops::RangeInclusive;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::config::SharpenConfig;
use crate::error::{CoreError, Result};
use crate::imgproc::{convolve3x3, saturate_u8};
use crate::smoothing::detail_enhance;

pub const BRIGHTNESS_RANGE: RangeInclusive<i32> = -255..=255;
pub const CONTRAST_RANGE: RangeInclusive<i32> = -127..=127;
pub const SHARPNESS_RANGE: RangeInclusive<i32> = 0..=100;

const UNSHARP_KERNEL: [[i32; 3]; 3] = [[-1, -1, -1], [-1, 9, -1], [-1, -1, -1]];

/// Brightness, contrast and sharpness settings. Zero means "leave alone".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Adjustments {
    pub brightness: i32,
    pub contrast: i32,
    pub sharpness: i32,
}

impl Adjustments {
    pub fn new(brightness: i32, contrast: i32, sharpness: i32) -> Result<Self> {
        let adjustments = Self {
            brightness,
            contrast,
            sharpness,
        };
        adjustments.validate()?;
        Ok(adjustments)
    }

    pub fn validate(&self) -> Result<()> {
        check_range("brightness", self.brightness, &BRIGHTNESS_RANGE)?;
        check_range("contrast", self.contrast, &CONTRAST_RANGE)?;
        check_range("sharpness", self.sharpness, &SHARPNESS_RANGE)
    }

    /// True when every stage would be skipped.
    pub fn is_identity(&self) -> bool {
        self.brightness == 0 && self.contrast == 0 && self.sharpness == 0
    }

    /// Gain and offset of the brightness stage.
    pub fn brightness_affine(&self) -> (f32, f32) {
        let (shadow, highlight) = if self.brightness > 0 {
            (self.brightness, 255)
        } else {
            (0, 255 + self.brightness)
        };
        ((highlight - shadow) as f32 / 255.0, shadow as f32)
    }

    /// Gain and offset of the contrast stage.
    pub fn contrast_affine(&self) -> (f32, f32) {
        let c = self.contrast as f32;
        let f = 131.0 * (c + 127.0) / (127.0 * (131.0 - c));
        (f, 127.0 * (1.0 - f))
    }
}

fn check_range(name: &'static str, value: i32, range: &RangeInclusive<i32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::ParameterOutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Apply brightness, then contrast, then sharpness. Each stage clamps to
/// [0, 255] before the next runs; stages with a zero parameter are skipped.
pub fn adjust(input: &PixelBuffer, adjustments: &Adjustments) -> Result<PixelBuffer> {
    adjust_with(input, adjustments, &SharpenConfig::default())
}

pub fn adjust_with(
    input: &PixelBuffer,
    adjustments: &Adjustments,
    config: &SharpenConfig,
) -> Result<PixelBuffer> {
    input.validate()?;
    adjustments.validate()?;
    config.validate()?;

    let mut buf = input.clone();
    if adjustments.brightness != 0 {
        let (alpha, gamma) = adjustments.brightness_affine();
        buf = affine(&buf, alpha, gamma);
    }
    if adjustments.contrast != 0 {
        let (alpha, gamma) = adjustments.contrast_affine();
        buf = affine(&buf, alpha, gamma);
    }
    if adjustments.sharpness != 0 {
        let sigma_r = adjustments.sharpness as f32 / 100.0;
        buf = detail_enhance(&buf, config.detail_sigma_s, sigma_r, config.detail_factor);
        buf = convolve3x3(&buf, &UNSHARP_KERNEL);
    }

    tracing::debug!(
        brightness = adjustments.brightness,
        contrast = adjustments.contrast,
        sharpness = adjustments.sharpness,
        width = buf.width,
        height = buf.height,
        "applied adjustments"
    );
    Ok(buf)
}

/// `alpha * sample + gamma` per sample, rounded and clamped.
fn affine(input: &PixelBuffer, alpha: f32, gamma: f32) -> PixelBuffer {
    let lut: Vec<u8> = (0..=255u8)
        .map(|v| saturate_u8(alpha * v as f32 + gamma))
        .collect();
    let data = input.data.par_iter().map(|&v| lut[v as usize]).collect();
    input.with_data(input.channels, data)
}
