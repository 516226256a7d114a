use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Tunable constants for every filter and adjustment.
///
/// The defaults reproduce the stock look of each filter. A host may load an
/// override from JSON; missing sections and fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub noise: NoiseConfig,
    pub emboss: EmbossConfig,
    pub cartoon: CartoonConfig,
    pub sketch: SketchConfig,
    pub sharpen: SharpenConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Chance that a pixel is perturbed at all.
    pub probability: f64,
    /// Offsets are drawn from `0..max_offset`.
    pub max_offset: u8,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            probability: 0.8,
            max_offset: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbossConfig {
    pub bias: u8,
}

impl Default for EmbossConfig {
    fn default() -> Self {
        Self { bias: 128 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartoonConfig {
    pub median_kernel: usize,
    pub canny_low: f32,
    pub canny_high: f32,
    pub threshold_block: usize,
    pub threshold_offset: i32,
    pub smoothing_sigma_s: f32,
    pub smoothing_sigma_r: f32,
}

impl Default for CartoonConfig {
    fn default() -> Self {
        Self {
            median_kernel: 5,
            canny_low: 100.0,
            canny_high: 200.0,
            threshold_block: 7,
            threshold_offset: 7,
            smoothing_sigma_s: 64.0,
            smoothing_sigma_r: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    pub blur_kernel: usize,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self { blur_kernel: 21 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpenConfig {
    pub detail_sigma_s: f32,
    pub detail_factor: f32,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        Self {
            detail_sigma_s: 10.0,
            detail_factor: 3.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON override.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.noise.validate()?;
        self.cartoon.validate()?;
        self.sketch.validate()?;
        self.sharpen.validate()
    }
}

fn odd_kernel(name: &str, k: usize) -> Result<()> {
    if k == 0 || k % 2 == 0 {
        Err(CoreError::InvalidConfig(format!(
            "{name} must be a positive odd size, got {k}"
        )))
    } else {
        Ok(())
    }
}

fn positive(name: &str, v: f32) -> Result<()> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "{name} must be positive, got {v}"
        )))
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(CoreError::InvalidConfig(format!(
                "noise.probability must be within [0, 1], got {}",
                self.probability
            )));
        }
        if self.max_offset == 0 {
            return Err(CoreError::InvalidConfig(
                "noise.max_offset must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl CartoonConfig {
    pub fn validate(&self) -> Result<()> {
        odd_kernel("cartoon.median_kernel", self.median_kernel)?;
        odd_kernel("cartoon.threshold_block", self.threshold_block)?;
        if self.threshold_block < 3 {
            return Err(CoreError::InvalidConfig(
                "cartoon.threshold_block must be at least 3".into(),
            ));
        }
        if !(self.canny_low >= 0.0 && self.canny_low <= self.canny_high) {
            return Err(CoreError::InvalidConfig(format!(
                "cartoon canny thresholds out of order: {} > {}",
                self.canny_low, self.canny_high
            )));
        }
        positive("cartoon.smoothing_sigma_s", self.smoothing_sigma_s)?;
        positive("cartoon.smoothing_sigma_r", self.smoothing_sigma_r)
    }
}

impl SketchConfig {
    pub fn validate(&self) -> Result<()> {
        odd_kernel("sketch.blur_kernel", self.blur_kernel)
    }
}

impl SharpenConfig {
    pub fn validate(&self) -> Result<()> {
        positive("sharpen.detail_sigma_s", self.detail_sigma_s)?;
        if !self.detail_factor.is_finite() {
            return Err(CoreError::InvalidConfig(
                "sharpen.detail_factor must be finite".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "noise": { "probability": 0.5 } }"#).unwrap();
        assert_eq!(config.noise.probability, 0.5);
        assert_eq!(config.noise.max_offset, 64);
        assert_eq!(config.cartoon, CartoonConfig::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = EngineConfig::default();
        config.sketch.blur_kernel = 15;
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_even_kernel_rejected() {
        let err = EngineConfig::from_json(r#"{ "sketch": { "blur_kernel": 20 } }"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let mut config = EngineConfig::default();
        config.noise.probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_canny_order_rejected() {
        let mut config = EngineConfig::default();
        config.cartoon.canny_low = 300.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(CoreError::Serialization(_))
        ));
    }
}
