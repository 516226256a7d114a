//! Edge-preserving smoothing in the domain-transform family.
//!
//! Each row is mapped onto a 1D domain whose distances grow with the colour
//! difference between neighbours, so filtering in that domain stops at strong
//! edges. Three horizontal/vertical iterations are run with shrinking sigmas.

use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::{lab_to_rgb, rgb_to_lab};
use crate::imgproc::saturate_u8;

const ITERATIONS: usize = 3;

/// Float image with samples nominally in [0, 1].
#[derive(Debug, Clone)]
struct Planar {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<f32>,
}

impl Planar {
    fn from_buffer(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            channels: buffer.channels as usize,
            data: buffer.data.iter().map(|&v| v as f32 / 255.0).collect(),
        }
    }

    fn transpose(&self) -> Self {
        let (w, h, c) = (self.width, self.height, self.channels);
        let mut data = vec![0f32; self.data.len()];
        data.par_chunks_exact_mut(h * c)
            .enumerate()
            .for_each(|(x, dst)| {
                for y in 0..h {
                    let src = (y * w + x) * c;
                    dst[y * c..(y + 1) * c].copy_from_slice(&self.data[src..src + c]);
                }
            });
        Self {
            width: h,
            height: w,
            channels: c,
            data,
        }
    }

    /// Domain-transform step between each sample and its left neighbour:
    /// `1 + ratio * sum_c |I(x) - I(x-1)|`. The first entry of a row is 0.
    fn row_derivatives(&self, ratio: f32) -> Vec<f32> {
        let (w, c) = (self.width, self.channels);
        let mut out = vec![0f32; w * self.height];
        out.par_chunks_exact_mut(w)
            .zip(self.data.par_chunks_exact(w * c))
            .for_each(|(d, row)| {
                for x in 1..w {
                    let diff: f32 = (0..c)
                        .map(|ch| (row[x * c + ch] - row[(x - 1) * c + ch]).abs())
                        .sum();
                    d[x] = 1.0 + ratio * diff;
                }
            });
        out
    }
}

fn iteration_sigma(sigma_s: f32, i: usize) -> f32 {
    let n = ITERATIONS as i32;
    sigma_s * 3f32.sqrt() * 2f32.powi(n - i as i32 - 1) / (4f32.powi(n) - 1.0).sqrt()
}

/// Recursive (IIR) filtering along rows, one causal and one anti-causal pass.
fn recursive_rows(img: &mut Planar, deriv: &[f32], sigma_h: f32) {
    let a = (-(2f32.sqrt()) / sigma_h).exp();
    let (w, c) = (img.width, img.channels);
    img.data
        .par_chunks_exact_mut(w * c)
        .zip(deriv.par_chunks_exact(w))
        .for_each(|(row, d)| {
            let v: Vec<f32> = d.iter().map(|&dx| a.powf(dx)).collect();
            for x in 1..w {
                for ch in 0..c {
                    let prev = row[(x - 1) * c + ch];
                    let cur = row[x * c + ch];
                    row[x * c + ch] = cur + v[x] * (prev - cur);
                }
            }
            for x in (0..w.saturating_sub(1)).rev() {
                for ch in 0..c {
                    let next = row[(x + 1) * c + ch];
                    let cur = row[x * c + ch];
                    row[x * c + ch] = cur + v[x + 1] * (next - cur);
                }
            }
        });
}

/// Box filtering in the transformed domain (normalized convolution).
fn normalized_rows(img: &mut Planar, deriv: &[f32], sigma_h: f32) {
    let radius = 3f32.sqrt() * sigma_h;
    let (w, c) = (img.width, img.channels);
    img.data
        .par_chunks_exact_mut(w * c)
        .zip(deriv.par_chunks_exact(w))
        .for_each(|(row, d)| {
            let mut ct = Vec::with_capacity(w);
            let mut acc = 0f32;
            for &dx in d {
                acc += dx;
                ct.push(acc);
            }

            let mut prefix = vec![0f32; (w + 1) * c];
            for x in 0..w {
                for ch in 0..c {
                    prefix[(x + 1) * c + ch] = prefix[x * c + ch] + row[x * c + ch];
                }
            }

            let (mut lo, mut hi) = (0usize, 0usize);
            for x in 0..w {
                while ct[lo] < ct[x] - radius {
                    lo += 1;
                }
                if hi < x {
                    hi = x;
                }
                while hi + 1 < w && ct[hi + 1] <= ct[x] + radius {
                    hi += 1;
                }
                let count = (hi + 1 - lo) as f32;
                for ch in 0..c {
                    row[x * c + ch] = (prefix[(hi + 1) * c + ch] - prefix[lo * c + ch]) / count;
                }
            }
        });
}

fn domain_transform(
    img: Planar,
    sigma_s: f32,
    sigma_r: f32,
    pass: fn(&mut Planar, &[f32], f32),
) -> Planar {
    let ratio = sigma_s / sigma_r;
    let dh = img.row_derivatives(ratio);
    let dv = img.transpose().row_derivatives(ratio);

    let mut img = img;
    for i in 0..ITERATIONS {
        let sigma_h = iteration_sigma(sigma_s, i);
        pass(&mut img, &dh, sigma_h);
        let mut t = img.transpose();
        pass(&mut t, &dv, sigma_h);
        img = t.transpose();
    }
    img
}

/// Edge-preserving smoothing by normalized convolution in the transformed
/// domain. Keeps the channel count of the input.
pub fn edge_preserving_smooth(input: &PixelBuffer, sigma_s: f32, sigma_r: f32) -> PixelBuffer {
    let out = domain_transform(
        Planar::from_buffer(input),
        sigma_s,
        sigma_r,
        normalized_rows,
    );
    let data = out.data.par_iter().map(|&v| saturate_u8(v * 255.0)).collect();
    input.with_data(input.channels, data)
}

/// Amplify fine detail: the lightness channel is split into a recursively
/// smoothed base and a detail layer, and the detail is scaled by `factor`.
///
/// Colour buffers work on CIE L*; grayscale buffers on the samples directly.
pub fn detail_enhance(input: &PixelBuffer, sigma_s: f32, sigma_r: f32, factor: f32) -> PixelBuffer {
    let (w, h) = (input.width(), input.height());

    // Lightness plane plus the a*/b* pairs for colour input
    let (lightness, chroma): (Vec<f32>, Vec<[f32; 2]>) = if input.is_gray() {
        (
            input.data.iter().map(|&v| v as f32 / 255.0).collect(),
            Vec::new(),
        )
    } else {
        input
            .data
            .par_chunks_exact(3)
            .map(|px| {
                let [l, a, b] =
                    rgb_to_lab([px[0] as f32 / 255.0, px[1] as f32 / 255.0, px[2] as f32 / 255.0]);
                (l / 255.0, [a, b])
            })
            .unzip()
    };

    let plane = Planar {
        width: w,
        height: h,
        channels: 1,
        data: lightness.clone(),
    };
    let base = domain_transform(plane, sigma_s, sigma_r, recursive_rows);

    let enhanced: Vec<f32> = lightness
        .par_iter()
        .zip(base.data.par_iter())
        .map(|(&l, &b)| b + factor * (l - b))
        .collect();

    let data = if input.is_gray() {
        enhanced.par_iter().map(|&v| saturate_u8(v * 255.0)).collect()
    } else {
        enhanced
            .par_iter()
            .zip(chroma.par_iter())
            .flat_map_iter(|(&l, &[a, b])| {
                lab_to_rgb([l * 255.0, a, b]).map(|v| saturate_u8(v * 255.0))
            })
            .collect()
    };
    input.with_data(input.channels, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{GRAY, RGB};

    fn split_image() -> PixelBuffer {
        // Left half dark, right half bright, with mild texture
        let (w, h) = (16u32, 8u32);
        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let base: u8 = if x < w / 2 { 40 } else { 210 };
                let texture = ((x + y) % 2) as u8 * 10;
                data.extend_from_slice(&[base + texture; 3]);
            }
        }
        PixelBuffer::from_rgb(w, h, data).unwrap()
    }

    #[test]
    fn test_iteration_sigmas_shrink() {
        let s: Vec<f32> = (0..ITERATIONS).map(|i| iteration_sigma(64.0, i)).collect();
        assert!(s[0] > s[1] && s[1] > s[2]);
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        let img = Planar::from_buffer(&split_image());
        let back = img.transpose().transpose();
        assert_eq!(back.data, img.data);
        assert_eq!(img.transpose().width, img.height);
    }

    #[test]
    fn test_smooth_flat_field_unchanged() {
        let flat = PixelBuffer::filled(9, 7, RGB, 120).unwrap();
        assert_eq!(edge_preserving_smooth(&flat, 64.0, 0.25), flat);
    }

    #[test]
    fn test_smooth_keeps_strong_edge() {
        let out = edge_preserving_smooth(&split_image(), 64.0, 0.25);
        let left = out.pixel(2, 4)[0];
        let right = out.pixel(13, 4)[0];
        assert!(left < 90, "left side bled: {left}");
        assert!(right > 170, "right side bled: {right}");
    }

    #[test]
    fn test_detail_enhance_flat_gray_unchanged() {
        let flat = PixelBuffer::filled(6, 6, GRAY, 77).unwrap();
        assert_eq!(detail_enhance(&flat, 10.0, 0.5, 3.0), flat);
    }

    #[test]
    fn test_detail_enhance_preserves_shape() {
        let img = split_image();
        let out = detail_enhance(&img, 10.0, 0.5, 3.0);
        assert_eq!(out.channels, RGB);
        assert!(out.same_dimensions(&img));
    }
}
