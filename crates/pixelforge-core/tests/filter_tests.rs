use pixelforge_core::buffer::{GRAY, PixelBuffer, RGB};
use pixelforge_core::config::{EngineConfig, NoiseConfig};
use pixelforge_core::effects::{Filter, apply_filter_by_name, apply_optional};
use pixelforge_core::error::CoreError;
use pixelforge_core::filters::{self, CartoonStyle};
use pixelforge_test_harness::assertions::{
    assert_fraction_approx, assert_same_shape, assert_samples_in_range, assert_uniform,
};
use pixelforge_test_harness::builders::PixelBufferBuilder;
use pixelforge_test_harness::fixtures::init_logging;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_invert_is_self_inverse() {
    init_logging();
    let inputs = [
        PixelBufferBuilder::new().size(17, 9).gradient().build(),
        PixelBufferBuilder::new().gray().checkerboard(3, 10, 240).build(),
        PixelBufferBuilder::new().size(1, 1).solid(0).build(),
    ];
    for input in inputs {
        let once = Filter::Invert.apply(&input).unwrap();
        assert_ne!(once, input);
        assert_eq!(Filter::Invert.apply(&once).unwrap(), input);
    }
}

#[test]
fn test_emboss_flat_field_is_bias() {
    init_logging();
    for value in [0u8, 77, 255] {
        let input = PixelBufferBuilder::new().size(12, 10).solid(value).build();
        let out = Filter::Emboss.apply(&input).unwrap();
        assert_eq!(out.channels, GRAY);
        assert_eq!((out.width, out.height), (12, 10));
        assert_uniform(&out, 128);
    }
}

#[test]
fn test_emboss_highlights_edges() {
    let input = PixelBufferBuilder::new()
        .size(16, 16)
        .checkerboard(4, 0, 255)
        .build();
    let out = Filter::Emboss.apply(&input).unwrap();
    assert!(out.data.iter().all(|&v| v >= 128));
    assert!(out.data.iter().any(|&v| v > 128));
}

#[test]
fn test_noisy_unchanged_fraction() {
    init_logging();
    let input = PixelBufferBuilder::new().size(200, 200).gray().solid(128).build();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let out = filters::noisy_with_rng(&input, &NoiseConfig::default(), &mut rng).unwrap();

    assert_eq!(out.channels, GRAY);
    assert_samples_in_range(&out, 128 - 63, 128 + 63);
    let unchanged = out.data.iter().filter(|&&v| v == 128).count();
    let fraction = unchanged as f64 / out.data.len() as f64;
    // untouched pixels plus perturbed ones drawing a zero offset
    assert_fraction_approx(fraction, 0.2 + 0.8 / 64.0, 0.04);
}

#[test]
fn test_noisy_clamps_at_extremes() {
    for value in [0u8, 255] {
        let input = PixelBufferBuilder::new().size(64, 64).gray().solid(value).build();
        let mut rng = StdRng::seed_from_u64(7);
        let out = filters::noisy_with_rng(&input, &NoiseConfig::default(), &mut rng).unwrap();
        if value == 0 {
            assert_samples_in_range(&out, 0, 63);
        } else {
            assert_samples_in_range(&out, 192, 255);
        }
    }
}

#[test]
fn test_noisy_is_reproducible_with_seed() {
    let input = PixelBufferBuilder::new().size(32, 32).gradient().build();
    let config = NoiseConfig::default();
    let a = filters::noisy_with_rng(&input, &config, &mut StdRng::seed_from_u64(3)).unwrap();
    let b = filters::noisy_with_rng(&input, &config, &mut StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_sketch_output_is_gray() {
    let white = PixelBufferBuilder::new().size(30, 30).solid(255).build();
    let out = Filter::Sketch.apply(&white).unwrap();
    assert_eq!(out.channels, GRAY);
    assert_uniform(&out, 255);

    let black = PixelBufferBuilder::new().size(30, 30).solid(0).build();
    assert_uniform(&Filter::Sketch.apply(&black).unwrap(), 0);
}

#[test]
fn test_cartoon_keeps_shape() {
    init_logging();
    let input = PixelBufferBuilder::new()
        .size(24, 18)
        .checkerboard(6, 20, 220)
        .build();
    for style in [CartoonStyle::Thick, CartoonStyle::Thin] {
        let out = Filter::Cartoon(style).apply(&input).unwrap();
        assert_same_shape(&out, &input);
    }
}

#[test]
fn test_cartoon_thin_blacks_out_edges() {
    let input = PixelBufferBuilder::new()
        .size(24, 24)
        .checkerboard(12, 0, 255)
        .build();
    let out = Filter::Cartoon(CartoonStyle::Thin).apply(&input).unwrap();
    assert!(out.data.iter().any(|&v| v == 0));
    assert!(out.data.iter().any(|&v| v > 200));
}

#[test]
fn test_cartoon_style_tokens() {
    assert_eq!(CartoonStyle::from_token("thick").unwrap(), CartoonStyle::Thick);
    assert!(matches!(
        CartoonStyle::from_token("medium"),
        Err(CoreError::UnknownCartoonStyle(_))
    ));
}

#[test]
fn test_malformed_buffer_rejected_by_every_filter() {
    let bad = PixelBuffer {
        width: 0,
        height: 4,
        channels: RGB,
        data: Vec::new(),
    };
    for filter in Filter::all() {
        assert!(
            matches!(
                filter.apply(&bad),
                Err(CoreError::UnsupportedBufferShape { .. })
            ),
            "{filter} accepted a zero-width buffer"
        );
    }
}

#[test]
fn test_dispatch_matches_direct_call() {
    let input = PixelBufferBuilder::new().size(10, 10).gradient().build();
    let config = EngineConfig::default();
    assert_eq!(
        apply_filter_by_name("Emboss", &input).unwrap(),
        filters::emboss(&input, &config.emboss).unwrap()
    );
    assert_eq!(
        apply_filter_by_name("Cartoon-Thick", &input).unwrap(),
        filters::cartoon(&input, CartoonStyle::Thick, &config.cartoon).unwrap()
    );
    assert!(matches!(
        apply_filter_by_name("cartoon-thick", &input),
        Err(CoreError::UnknownFilterName(_))
    ));
}

#[test]
fn test_reserved_filters_not_implemented() {
    let input = PixelBufferBuilder::new().build();
    for name in ["Surreal", "DeepFried"] {
        assert!(matches!(
            apply_filter_by_name(name, &input),
            Err(CoreError::NotImplemented(_))
        ));
    }
}

#[test]
fn test_invalid_config_is_an_error_not_a_panic() {
    let input = PixelBufferBuilder::new().size(10, 10).gradient().build();

    let mut config = EngineConfig::default();
    config.cartoon.threshold_block = 0;
    for filter in [
        Filter::Cartoon(CartoonStyle::Thick),
        Filter::Cartoon(CartoonStyle::Thin),
        Filter::Invert,
    ] {
        assert!(matches!(
            filter.apply_with(&input, &config),
            Err(CoreError::InvalidConfig(_))
        ));
    }
    assert!(matches!(
        filters::cartoon(&input, CartoonStyle::Thick, &config.cartoon),
        Err(CoreError::InvalidConfig(_))
    ));
    assert!(matches!(
        apply_optional(None, &input, &config),
        Err(CoreError::InvalidConfig(_))
    ));

    let mut config = EngineConfig::default();
    config.sketch.blur_kernel = 0;
    assert!(matches!(
        filters::sketch(&input, &config.sketch),
        Err(CoreError::InvalidConfig(_))
    ));
    assert!(matches!(
        Filter::Sketch.apply_with(&input, &config),
        Err(CoreError::InvalidConfig(_))
    ));

    let mut config = EngineConfig::default();
    config.cartoon.median_kernel = 4;
    assert!(matches!(
        Filter::Cartoon(CartoonStyle::Thick).apply_with(&input, &config),
        Err(CoreError::InvalidConfig(_))
    ));
}

#[test]
fn test_noise_config_checked_on_direct_call() {
    let input = PixelBufferBuilder::new().size(4, 4).gray().solid(100).build();
    let config = NoiseConfig {
        max_offset: 0,
        ..NoiseConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(
        filters::noisy_with_rng(&input, &config, &mut rng),
        Err(CoreError::InvalidConfig(_))
    ));
}
