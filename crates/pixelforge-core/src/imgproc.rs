//! Shared neighbourhood operations on 8-bit buffers.
//!
//! Convolutions are correlations (the kernel is not flipped) with
//! reflect-101 borders. Median and block-mean filters replicate the edge.

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::buffer::{GRAY, PixelBuffer};

/// Map an out-of-range index back into `0..n` by reflecting around the edge
/// samples without repeating them (`gfedcb|abcdefgh|gfedcba`).
#[inline]
pub(crate) fn reflect101(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

#[inline]
pub(crate) fn replicate(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}

#[inline]
pub(crate) fn saturate_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Correlate every channel with a 3x3 integer kernel, saturating to [0, 255].
pub fn convolve3x3(input: &PixelBuffer, kernel: &[[i32; 3]; 3]) -> PixelBuffer {
    let (w, h) = (input.width(), input.height());
    let c = input.channels as usize;
    let row_len = input.row_len();
    let mut out = vec![0u8; input.data.len()];

    out.par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, dst)| {
            for x in 0..w {
                for ch in 0..c {
                    let mut sum = 0i32;
                    for (ky, krow) in kernel.iter().enumerate() {
                        let sy = reflect101(y as isize + ky as isize - 1, h);
                        for (kx, &k) in krow.iter().enumerate() {
                            if k == 0 {
                                continue;
                            }
                            let sx = reflect101(x as isize + kx as isize - 1, w);
                            sum += k * input.data[(sy * w + sx) * c + ch] as i32;
                        }
                    }
                    dst[x * c + ch] = sum.clamp(0, 255) as u8;
                }
            }
        });

    input.with_data(input.channels, out)
}

// =============================================================================
// Gaussian blur
// =============================================================================

/// Sigma used when only a kernel size is given.
pub fn sigma_for_kernel(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1D Gaussian weights of length `ksize`.
pub fn gaussian_kernel_1d(ksize: usize, sigma: f32) -> Vec<f32> {
    let half = (ksize / 2) as f32;
    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let x = i as f32 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }
    kernel
}

/// Separable Gaussian blur with an odd square kernel.
pub fn gaussian_blur(input: &PixelBuffer, ksize: usize) -> PixelBuffer {
    let kernel = gaussian_kernel_1d(ksize, sigma_for_kernel(ksize));
    let half = (ksize / 2) as isize;
    let (w, h) = (input.width(), input.height());
    let c = input.channels as usize;
    let row_len = input.row_len();

    // Horizontal pass into floats
    let mut tmp = vec![0f32; input.data.len()];
    tmp.par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, dst)| {
            let src = &input.data[y * row_len..(y + 1) * row_len];
            for x in 0..w {
                for ch in 0..c {
                    let mut acc = 0.0;
                    for (k, &weight) in kernel.iter().enumerate() {
                        let sx = reflect101(x as isize + k as isize - half, w);
                        acc += weight * src[sx * c + ch] as f32;
                    }
                    dst[x * c + ch] = acc;
                }
            }
        });

    // Vertical pass back to u8
    let mut out = vec![0u8; input.data.len()];
    out.par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, dst)| {
            for (i, d) in dst.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, &weight) in kernel.iter().enumerate() {
                    let sy = reflect101(y as isize + k as isize - half, h);
                    acc += weight * tmp[sy * row_len + i];
                }
                *d = saturate_u8(acc);
            }
        });

    input.with_data(input.channels, out)
}

// =============================================================================
// Median and block mean (single channel)
// =============================================================================

/// Median filter over a `ksize` x `ksize` window on a grayscale buffer.
pub fn median_blur(input: &PixelBuffer, ksize: usize) -> PixelBuffer {
    debug_assert!(input.is_gray());
    let radius = (ksize / 2) as isize;
    let (w, h) = (input.width(), input.height());
    let mut out = vec![0u8; input.data.len()];

    out.par_chunks_exact_mut(w).enumerate().for_each(|(y, dst)| {
        let mut window = Vec::with_capacity(ksize * ksize);
        for (x, d) in dst.iter_mut().enumerate() {
            window.clear();
            for dy in -radius..=radius {
                let sy = replicate(y as isize + dy, h);
                for dx in -radius..=radius {
                    let sx = replicate(x as isize + dx, w);
                    window.push(input.data[sy * w + sx]);
                }
            }
            window.sort_unstable();
            *d = window[window.len() / 2];
        }
    });

    input.with_data(GRAY, out)
}

/// Binary threshold against the local block mean: 255 where
/// `sample > round(mean) - offset`, else 0.
pub fn adaptive_threshold_mean(input: &PixelBuffer, block: usize, offset: i32) -> PixelBuffer {
    debug_assert!(input.is_gray());
    let radius = (block / 2) as isize;
    let area = (block * block) as u32;
    let (w, h) = (input.width(), input.height());
    let mut out = vec![0u8; input.data.len()];

    out.par_chunks_exact_mut(w).enumerate().for_each(|(y, dst)| {
        for (x, d) in dst.iter_mut().enumerate() {
            let mut sum = 0u32;
            for dy in -radius..=radius {
                let sy = replicate(y as isize + dy, h);
                for dx in -radius..=radius {
                    let sx = replicate(x as isize + dx, w);
                    sum += input.data[sy * w + sx] as u32;
                }
            }
            let mean = ((sum + area / 2) / area) as i32;
            let sample = input.data[y * w + x] as i32;
            *d = if sample - mean > -offset { 255 } else { 0 };
        }
    });

    input.with_data(GRAY, out)
}

// =============================================================================
// Canny edges
// =============================================================================

const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

/// Canny edge map (0 or 255) of a grayscale or RGB buffer.
///
/// Gradients come from 3x3 Sobel operators with replicated borders. For
/// colour input the channel with the largest L1 magnitude wins per pixel.
pub fn canny(input: &PixelBuffer, low: f32, high: f32) -> PixelBuffer {
    let (w, h) = (input.width(), input.height());
    let c = input.channels as usize;

    let mut grad = vec![(0i32, 0i32, 0i32); w * h];
    grad.par_chunks_exact_mut(w).enumerate().for_each(|(y, row)| {
        let ym = replicate(y as isize - 1, h);
        let yp = replicate(y as isize + 1, h);
        for (x, g) in row.iter_mut().enumerate() {
            let xm = replicate(x as isize - 1, w);
            let xp = replicate(x as isize + 1, w);
            let at = |sy: usize, sx: usize, ch: usize| input.data[(sy * w + sx) * c + ch] as i32;
            let mut best = (0, 0, -1);
            for ch in 0..c {
                let dx = (at(ym, xp, ch) + 2 * at(y, xp, ch) + at(yp, xp, ch))
                    - (at(ym, xm, ch) + 2 * at(y, xm, ch) + at(yp, xm, ch));
                let dy = (at(yp, xm, ch) + 2 * at(yp, x, ch) + at(yp, xp, ch))
                    - (at(ym, xm, ch) + 2 * at(ym, x, ch) + at(ym, xp, ch));
                let mag = dx.abs() + dy.abs();
                if mag > best.2 {
                    best = (dx, dy, mag);
                }
            }
            *g = best;
        }
    });

    let mag_at = |y: isize, x: isize| -> f32 {
        if y < 0 || x < 0 || y >= h as isize || x >= w as isize {
            0.0
        } else {
            grad[y as usize * w + x as usize].2 as f32
        }
    };

    // Non-maximum suppression: 0 = not an edge, 1 = weak, 2 = strong
    let mut class = vec![0u8; w * h];
    class.par_chunks_exact_mut(w).enumerate().for_each(|(y, row)| {
        for (x, cls) in row.iter_mut().enumerate() {
            let (dx, dy, m) = grad[y * w + x];
            let m = m as f32;
            if m <= low {
                continue;
            }
            let (yi, xi) = (y as isize, x as isize);
            let ax = dx.abs() as f32;
            let ay = dy.abs() as f32;
            let is_max = if ay <= ax * TAN_22_5 {
                m > mag_at(yi, xi - 1) && m >= mag_at(yi, xi + 1)
            } else if ay > ax * TAN_67_5 {
                m > mag_at(yi - 1, xi) && m >= mag_at(yi + 1, xi)
            } else {
                let s = if (dx ^ dy) < 0 { -1 } else { 1 };
                m > mag_at(yi - 1, xi - s) && m > mag_at(yi + 1, xi + s)
            };
            if is_max {
                *cls = if m > high { 2 } else { 1 };
            }
        }
    });

    // Hysteresis: grow strong edges through 8-connected weak pixels
    let mut out = vec![0u8; w * h];
    let mut queue: VecDeque<usize> = class
        .iter()
        .enumerate()
        .filter(|&(_, &cls)| cls == 2)
        .map(|(i, _)| i)
        .collect();
    for &i in &queue {
        out[i] = 255;
    }
    while let Some(i) = queue.pop_front() {
        let (y, x) = ((i / w) as isize, (i % w) as isize);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (ny, nx) = (y + dy, x + dx);
                if ny < 0 || nx < 0 || ny >= h as isize || nx >= w as isize {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if class[j] != 0 && out[j] == 0 {
                    out[j] = 255;
                    queue.push_back(j);
                }
            }
        }
    }

    input.with_data(GRAY, out)
}

/// Keep samples of `image` where `mask` is non-zero, zero the rest.
pub fn mask_and(image: &PixelBuffer, mask: &PixelBuffer) -> PixelBuffer {
    debug_assert!(mask.is_gray() && image.same_dimensions(mask));
    let c = image.channels as usize;
    let mut out = image.data.clone();
    out.par_chunks_exact_mut(c)
        .zip(mask.data.par_iter())
        .for_each(|(px, &m)| {
            if m == 0 {
                px.fill(0);
            }
        });
    image.with_data(image.channels, out)
}

/// Per-sample inversion.
pub fn invert_samples(input: &PixelBuffer) -> PixelBuffer {
    let data = input.data.par_iter().map(|&v| 255 - v).collect();
    input.with_data(input.channels, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RGB;

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(3, 5), 3);
        assert_eq!(reflect101(-7, 3), 1);
        assert_eq!(reflect101(4, 1), 0);
    }

    #[test]
    fn test_sigma_for_kernel() {
        assert!((sigma_for_kernel(21) - 3.5).abs() < 1e-6);
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_gaussian_kernel_normalised() {
        let k = gaussian_kernel_1d(21, 3.5);
        assert_eq!(k.len(), 21);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(k[10] > k[9] && (k[9] - k[11]).abs() < 1e-7);
    }

    #[test]
    fn test_gaussian_blur_flat_field_unchanged() {
        let flat = PixelBuffer::filled(7, 5, GRAY, 90).unwrap();
        assert_eq!(gaussian_blur(&flat, 21), flat);
    }

    #[test]
    fn test_convolve3x3_identity() {
        let data: Vec<u8> = (0..27).map(|v| v * 9).collect();
        let buf = PixelBuffer::from_rgb(3, 3, data).unwrap();
        let identity = [[0, 0, 0], [0, 1, 0], [0, 0, 0]];
        assert_eq!(convolve3x3(&buf, &identity), buf);
    }

    #[test]
    fn test_median_removes_salt() {
        let mut data = vec![50u8; 25];
        data[12] = 255;
        let buf = PixelBuffer::from_gray(5, 5, data).unwrap();
        let out = median_blur(&buf, 5);
        assert!(out.data.iter().all(|&v| v == 50));
    }

    #[test]
    fn test_adaptive_threshold_flat_is_white() {
        let flat = PixelBuffer::filled(6, 6, GRAY, 100).unwrap();
        let out = adaptive_threshold_mean(&flat, 7, 7);
        assert!(out.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_adaptive_threshold_marks_dark_line() {
        let mut data = vec![200u8; 81];
        for y in 0..9 {
            data[y * 9 + 4] = 20;
        }
        let buf = PixelBuffer::from_gray(9, 9, data).unwrap();
        let out = adaptive_threshold_mean(&buf, 7, 7);
        for y in 0..9 {
            assert_eq!(out.data[y * 9 + 4], 0);
            assert_eq!(out.data[y * 9], 255);
        }
    }

    #[test]
    fn test_canny_flat_has_no_edges() {
        let flat = PixelBuffer::filled(8, 8, RGB, 77).unwrap();
        assert!(canny(&flat, 100.0, 200.0).data.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_canny_finds_step_edge() {
        let mut data = vec![0u8; 100];
        for y in 0..10 {
            for x in 5..10 {
                data[y * 10 + x] = 255;
            }
        }
        let buf = PixelBuffer::from_gray(10, 10, data).unwrap();
        let edges = canny(&buf, 100.0, 200.0);
        for y in 0..10 {
            let row = &edges.data[y * 10..(y + 1) * 10];
            assert_eq!(row.iter().filter(|&&v| v == 255).count(), 1, "row {y}: {row:?}");
            assert!(row[4] == 255 || row[5] == 255);
        }
    }

    #[test]
    fn test_mask_and() {
        let image = PixelBuffer::from_rgb(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mask = PixelBuffer::from_gray(2, 1, vec![0, 255]).unwrap();
        assert_eq!(mask_and(&image, &mask).data, vec![0, 0, 0, 4, 5, 6]);
    }
}
