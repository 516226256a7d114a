use pixelforge_core::buffer::PixelBuffer;

/// Assert that every sample lies within `[min, max]`.
pub fn assert_samples_in_range(buffer: &PixelBuffer, min: u8, max: u8) {
    if let Some((i, v)) = buffer
        .data
        .iter()
        .enumerate()
        .find(|&(_, &v)| v < min || v > max)
    {
        panic!("sample {i} = {v} outside [{min}, {max}]");
    }
}

/// Assert that every sample equals `expected`.
pub fn assert_uniform(buffer: &PixelBuffer, expected: u8) {
    if let Some((i, v)) = buffer
        .data
        .iter()
        .enumerate()
        .find(|&(_, &v)| v != expected)
    {
        panic!("sample {i} = {v}, expected uniform {expected}");
    }
}

/// Assert two buffers share width, height and channel count.
pub fn assert_same_shape(a: &PixelBuffer, b: &PixelBuffer) {
    assert_eq!(
        (a.width, a.height, a.channels),
        (b.width, b.height, b.channels),
        "buffer shapes differ"
    );
}

/// Assert that `actual` lies within `tolerance` of `expected`.
pub fn assert_fraction_approx(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "fraction {actual:.4} != expected {expected:.4} (tolerance {tolerance:.4})"
    );
}
