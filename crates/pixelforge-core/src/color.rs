use rayon::prelude::*;

use crate::buffer::{GRAY, PixelBuffer};

// BT.601 luma weights in 14-bit fixed point.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Luma of one RGB pixel.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let sum = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
    ((sum + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Single-channel luma of a buffer. Grayscale input is returned as a copy.
pub fn to_luma(input: &PixelBuffer) -> PixelBuffer {
    if input.is_gray() {
        return input.clone();
    }
    let mut out = vec![0u8; input.pixel_count()];
    let w = input.width();
    out.par_chunks_exact_mut(w)
        .zip(input.data.par_chunks_exact(input.row_len()))
        .for_each(|(dst, src)| {
            for (d, px) in dst.iter_mut().zip(src.chunks_exact(3)) {
                *d = luma(px[0], px[1], px[2]);
            }
        });
    input.with_data(GRAY, out)
}

// =============================================================================
// CIE L*a*b* (D65), float samples in [0, 1]
// =============================================================================

const WHITE_X: f32 = 0.950456;
const WHITE_Z: f32 = 1.088754;
const LAB_EPSILON: f32 = 0.008856;
const LAB_KAPPA: f32 = 903.3;

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let t = f * f * f;
    if t > LAB_EPSILON {
        t
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

/// RGB in [0, 1] to L* in [0, 100] and a*, b*.
pub fn rgb_to_lab(rgb: [f32; 3]) -> [f32; 3] {
    let r = srgb_to_linear(rgb[0]);
    let g = srgb_to_linear(rgb[1]);
    let b = srgb_to_linear(rgb[2]);

    let x = (0.412453 * r + 0.357580 * g + 0.180423 * b) / WHITE_X;
    let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
    let z = (0.019334 * r + 0.119193 * g + 0.950227 * b) / WHITE_Z;

    let fy = lab_f(y);
    let l = if y > LAB_EPSILON {
        116.0 * fy - 16.0
    } else {
        LAB_KAPPA * y
    };
    [l, 500.0 * (lab_f(x) - fy), 200.0 * (fy - lab_f(z))]
}

/// Inverse of [`rgb_to_lab`], clamped to [0, 1].
pub fn lab_to_rgb(lab: [f32; 3]) -> [f32; 3] {
    let [l, a, b] = lab;
    let fy = (l + 16.0) / 116.0;
    let y = if l > LAB_KAPPA * LAB_EPSILON {
        fy * fy * fy
    } else {
        l / LAB_KAPPA
    };
    let x = lab_f_inv(fy + a / 500.0) * WHITE_X;
    let z = lab_f_inv(fy - b / 200.0) * WHITE_Z;

    let r = 3.240479 * x - 1.537150 * y - 0.498535 * z;
    let g = -0.969256 * x + 1.875991 * y + 0.041556 * z;
    let bl = 0.055648 * x - 0.204043 * y + 1.057311 * z;

    [r, g, bl].map(|c| linear_to_srgb(c.max(0.0)).clamp(0.0, 1.0))
}
