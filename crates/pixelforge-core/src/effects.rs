use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::filters::{self, CartoonStyle};

/// The fixed set of stylistic filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filter {
    Emboss,
    Cartoon(CartoonStyle),
    Sketch,
    Invert,
    Noisy,
    /// Recognised but without a defined transform.
    Surreal,
    /// Recognised but without a defined transform.
    DeepFried,
}

impl Filter {
    /// Resolve one of the protocol names. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "Emboss" => Ok(Self::Emboss),
            "Cartoon-Thick" => Ok(Self::Cartoon(CartoonStyle::Thick)),
            "Cartoon-Thin" => Ok(Self::Cartoon(CartoonStyle::Thin)),
            "Sketch" => Ok(Self::Sketch),
            "Invert" => Ok(Self::Invert),
            "Noisy" => Ok(Self::Noisy),
            "Surreal" => Ok(Self::Surreal),
            "DeepFried" => Ok(Self::DeepFried),
            other => Err(CoreError::UnknownFilterName(other.to_string())),
        }
    }

    /// Protocol name of this filter.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Emboss => "Emboss",
            Self::Cartoon(CartoonStyle::Thick) => "Cartoon-Thick",
            Self::Cartoon(CartoonStyle::Thin) => "Cartoon-Thin",
            Self::Sketch => "Sketch",
            Self::Invert => "Invert",
            Self::Noisy => "Noisy",
            Self::Surreal => "Surreal",
            Self::DeepFried => "DeepFried",
        }
    }

    /// Every filter, in menu order.
    pub fn all() -> Vec<Filter> {
        vec![
            Self::Emboss,
            Self::Cartoon(CartoonStyle::Thick),
            Self::Cartoon(CartoonStyle::Thin),
            Self::Sketch,
            Self::Invert,
            Self::Noisy,
            Self::Surreal,
            Self::DeepFried,
        ]
    }

    pub fn is_implemented(&self) -> bool {
        !matches!(self, Self::Surreal | Self::DeepFried)
    }

    /// True for filters that may give different output for the same input.
    pub fn is_random(&self) -> bool {
        matches!(self, Self::Noisy | Self::Surreal)
    }

    /// Apply with the default configuration.
    pub fn apply(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        self.apply_with(input, &EngineConfig::default())
    }

    pub fn apply_with(&self, input: &PixelBuffer, config: &EngineConfig) -> Result<PixelBuffer> {
        tracing::debug!(
            filter = self.name(),
            width = input.width,
            height = input.height,
            channels = input.channels,
            "applying filter"
        );
        config.validate()?;
        match self {
            Self::Emboss => filters::emboss(input, &config.emboss),
            Self::Cartoon(style) => filters::cartoon(input, *style, &config.cartoon),
            Self::Sketch => filters::sketch(input, &config.sketch),
            Self::Invert => filters::invert(input),
            Self::Noisy => filters::noisy(input, &config.noise),
            Self::Surreal => filters::surreal(input),
            Self::DeepFried => filters::deep_fried(input),
        }
    }
}

impl FromStr for Filter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse `name` and apply the filter with the default configuration.
pub fn apply_filter_by_name(name: &str, input: &PixelBuffer) -> Result<PixelBuffer> {
    Filter::from_name(name)?.apply(input)
}

/// Apply `filter`, or return a copy of the input when no filter is selected.
pub fn apply_optional(
    filter: Option<Filter>,
    input: &PixelBuffer,
    config: &EngineConfig,
) -> Result<PixelBuffer> {
    match filter {
        Some(filter) => filter.apply_with(input, config),
        None => {
            input.validate()?;
            config.validate()?;
            Ok(input.clone())
        }
    }
}
