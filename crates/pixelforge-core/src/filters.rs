//! Stylistic filters. Each takes a buffer and returns a new one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::{GRAY, PixelBuffer};
use crate::color::to_luma;
use crate::config::{CartoonConfig, EmbossConfig, NoiseConfig, SketchConfig};
use crate::error::{CoreError, Result};
use crate::imgproc::{
    adaptive_threshold_mean, canny, convolve3x3, gaussian_blur, invert_samples, mask_and,
    median_blur,
};
use crate::smoothing::edge_preserving_smooth;

// =============================================================================
// Invert
// =============================================================================

/// `255 - sample` on every channel. Applying it twice gives back the input.
pub fn invert(input: &PixelBuffer) -> Result<PixelBuffer> {
    input.validate()?;
    Ok(invert_samples(input))
}

// =============================================================================
// Noisy
// =============================================================================

/// Random luma noise using the thread-local generator.
pub fn noisy(input: &PixelBuffer, config: &NoiseConfig) -> Result<PixelBuffer> {
    noisy_with_rng(input, config, &mut rand::thread_rng())
}

/// Random luma noise drawn from `rng`.
///
/// Every pixel is perturbed with probability `config.probability`; a fair
/// coin picks the direction and the offset is uniform in `0..max_offset`.
/// Rows are processed in parallel, each from its own generator seeded by
/// `rng`, so a seeded `rng` gives a reproducible result.
pub fn noisy_with_rng<R: Rng>(
    input: &PixelBuffer,
    config: &NoiseConfig,
    rng: &mut R,
) -> Result<PixelBuffer> {
    input.validate()?;
    config.validate()?;
    let p = config.probability;
    let mut gray = to_luma(input);
    let w = gray.width();
    let seeds: Vec<u64> = (0..gray.height()).map(|_| rng.r#gen()).collect();
    let max_offset = config.max_offset as i16;

    gray.data
        .par_chunks_exact_mut(w)
        .zip(seeds.par_iter())
        .for_each(|(row, &seed)| {
            let mut row_rng = StdRng::seed_from_u64(seed);
            for v in row.iter_mut() {
                if !row_rng.gen_bool(p) {
                    continue;
                }
                let offset = row_rng.gen_range(0..max_offset);
                let shifted = if row_rng.gen_bool(0.5) {
                    *v as i16 + offset
                } else {
                    *v as i16 - offset
                };
                *v = shifted.clamp(0, 255) as u8;
            }
        });

    tracing::debug!(width = gray.width, height = gray.height, "applied noise");
    Ok(gray)
}

// =============================================================================
// Emboss
// =============================================================================

const EMBOSS_TOP_LEFT: [[i32; 3]; 3] = [[1, 1, 0], [1, 0, -1], [0, -1, -1]];
const EMBOSS_TOP_RIGHT: [[i32; 3]; 3] = [[0, 1, 1], [-1, 0, 1], [-1, -1, 0]];
const EMBOSS_BOTTOM_LEFT: [[i32; 3]; 3] = [[0, -1, -1], [1, 0, -1], [1, 1, 0]];
const EMBOSS_BOTTOM_RIGHT: [[i32; 3]; 3] = [[-1, -1, 0], [-1, 0, 1], [0, 1, 1]];

/// Four-direction relief on the luma channel.
///
/// Each directional response is saturated, lifted by the gray bias and
/// saturated again; the brightest of the four wins. Output is grayscale.
pub fn emboss(input: &PixelBuffer, config: &EmbossConfig) -> Result<PixelBuffer> {
    input.validate()?;
    let gray = to_luma(input);
    let responses = [
        EMBOSS_TOP_LEFT,
        EMBOSS_TOP_RIGHT,
        EMBOSS_BOTTOM_LEFT,
        EMBOSS_BOTTOM_RIGHT,
    ]
    .map(|kernel| convolve3x3(&gray, &kernel));

    let bias = config.bias;
    let data = (0..gray.data.len())
        .into_par_iter()
        .map(|i| {
            responses
                .iter()
                .map(|r| r.data[i].saturating_add(bias))
                .max()
                .unwrap_or(bias)
        })
        .collect();
    Ok(gray.with_data(GRAY, data))
}

// =============================================================================
// Cartoon
// =============================================================================

/// Edge style for [`cartoon`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartoonStyle {
    /// Bold outlines from a block-mean threshold of the denoised luma.
    Thick,
    /// Fine outlines from a gradient edge detector.
    Thin,
}

impl CartoonStyle {
    /// Parse `"thick"` or `"thin"`.
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "thick" => Ok(Self::Thick),
            "thin" => Ok(Self::Thin),
            other => Err(CoreError::UnknownCartoonStyle(other.to_string())),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Thick => "thick",
            Self::Thin => "thin",
        }
    }
}

/// Flat colour regions with dark outlines. Keeps the input channel count.
pub fn cartoon(
    input: &PixelBuffer,
    style: CartoonStyle,
    config: &CartoonConfig,
) -> Result<PixelBuffer> {
    input.validate()?;
    config.validate()?;
    let smoothed =
        edge_preserving_smooth(input, config.smoothing_sigma_s, config.smoothing_sigma_r);
    let mask = match style {
        CartoonStyle::Thin => {
            invert_samples(&canny(input, config.canny_low, config.canny_high))
        }
        CartoonStyle::Thick => {
            let denoised = median_blur(&to_luma(input), config.median_kernel);
            adaptive_threshold_mean(&denoised, config.threshold_block, config.threshold_offset)
        }
    };
    Ok(mask_and(&smoothed, &mask))
}

// =============================================================================
// Sketch
// =============================================================================

/// Pencil sketch: the luma is dodge-blended with a blurred copy of its
/// inverse. Output is grayscale.
pub fn sketch(input: &PixelBuffer, config: &SketchConfig) -> Result<PixelBuffer> {
    input.validate()?;
    config.validate()?;
    let gray = to_luma(input);
    let blurred = gaussian_blur(&invert_samples(&gray), config.blur_kernel);
    let data = gray
        .data
        .par_iter()
        .zip(blurred.data.par_iter())
        .map(|(&l, &b)| dodge(l, b))
        .collect();
    Ok(gray.with_data(GRAY, data))
}

#[inline]
fn dodge(base: u8, blend: u8) -> u8 {
    let num = base as u32 * 256;
    let den = 256 - blend as u32;
    ((num + den / 2) / den).min(255) as u8
}

// =============================================================================
// Reserved filters
// =============================================================================

pub fn surreal(input: &PixelBuffer) -> Result<PixelBuffer> {
    input.validate()?;
    Err(CoreError::NotImplemented("Surreal"))
}

pub fn deep_fried(input: &PixelBuffer) -> Result<PixelBuffer> {
    input.validate()?;
    Err(CoreError::NotImplemented("DeepFried"))
}
