//! Image-style effects and their imgix translation.
//!
//! An image style is an ordered chain of abstract effects (resize, crop,
//! rotate, ...). imgix has no notion of a pipeline: every effect collapses
//! into flat query parameters. This module owns the closed set of effects
//! and the rules for which arguments each one accepts.
//!
//! | Effect | imgix parameters |
//! |---|---|
//! | `Resize` | `fit=scale`, `w`, `h` |
//! | `Scale` | `fit=clip` (upscale) or `fit=max`, `w?`, `h?` |
//! | `ScaleAndCrop` | `fit=crop` (upscale) or `fit=min`, `w?`, `h?`, `crop` |
//! | `Crop` | `rect=x,y,w,h` |
//! | `Rotate` | `rot`, `bg` |
//! | `Desaturate` | `sat=-100` |
//! | `Quality` | `q` |
//! | `Convert` | `fm` |
//! | `RawParameter` | any key |
//!
//! The module is split into:
//! - **Codec**: effect ⇄ parameter mapping ([`codec`])
//! - **Translate**: folding a whole chain into one mapping ([`translate`])
//! - **Dimensions**: output size of a chain for a given source size ([`dimensions`])
//! - **Color**: `bg` hex parsing and formatting ([`color`])

pub mod codec;
pub mod color;
pub mod dimensions;
pub mod translate;

pub use codec::{EFFECT_BASE_WEIGHT, WeightedEffect, effect_to_params, params_to_effects};
pub use color::Color;
pub use dimensions::transform_dimensions;
pub use translate::{TranslateError, translate, translate_weighted};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output formats imgix can convert to.
///
/// See <https://docs.imgix.com/apis/rendering/format/fm>.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "gif", "jp2", "jpg", "jpeg", "json", "jxr", "pjpg", "mp4", "png", "png8", "png32", "webm",
    "webp", "blurhash",
];

pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("invalid {argument} ('{value}') specified for the image '{effect}' operation")]
    InvalidArgument {
        effect: &'static str,
        argument: &'static str,
        value: String,
    },
    #[error(
        "at least one dimension ('width' or 'height') must be provided to the image '{effect}' operation"
    )]
    MissingDimension { effect: &'static str },
}

impl EffectError {
    fn invalid(effect: &'static str, argument: &'static str, value: impl ToString) -> Self {
        EffectError::InvalidArgument {
            effect,
            argument,
            value: value.to_string(),
        }
    }
}

/// One step of an image style.
///
/// Serialized with an `id` tag, e.g. `{"id": "scale", "width": 300}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "snake_case")]
pub enum Effect {
    /// Exact size, aspect ratio ignored.
    Resize { width: u32, height: u32 },
    /// Fit inside the box, keeping aspect ratio.
    Scale {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        upscale: bool,
    },
    /// Fill the box, then crop around `anchor` (e.g. `center-center`).
    ScaleAndCrop {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        anchor: Option<String>,
        #[serde(default)]
        upscale: bool,
    },
    /// Cut out a rectangle. Both dimensions must be known by translation time.
    Crop {
        x: i32,
        y: i32,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
    },
    /// Clockwise rotation; `background` is a hex colour.
    Rotate {
        degrees: i32,
        #[serde(default)]
        background: Option<String>,
    },
    Desaturate,
    /// Lossy output quality, 1–100.
    Quality { quality: u32 },
    /// Output format, one of [`SUPPORTED_EXTENSIONS`].
    Convert { extension: String },
    /// Passthrough for any imgix parameter.
    RawParameter { key: String, value: String },
}

impl Effect {
    /// Machine name used in serialized chains and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Resize { .. } => "resize",
            Effect::Scale { .. } => "scale",
            Effect::ScaleAndCrop { .. } => "scale_and_crop",
            Effect::Crop { .. } => "crop",
            Effect::Rotate { .. } => "rotate",
            Effect::Desaturate => "desaturate",
            Effect::Quality { .. } => "quality",
            Effect::Convert { .. } => "convert",
            Effect::RawParameter { .. } => "raw_parameter",
        }
    }

    /// Check arguments without producing anything.
    ///
    /// Invalid arguments are rejected, never clamped.
    pub fn validate(&self) -> Result<(), EffectError> {
        let effect = self.name();
        match self {
            Effect::Resize { width, height } => {
                positive(effect, "width", Some(*width))?;
                positive(effect, "height", Some(*height))?;
            }
            Effect::Scale { width, height, .. } | Effect::ScaleAndCrop { width, height, .. } => {
                if width.is_none() && height.is_none() {
                    return Err(EffectError::MissingDimension { effect });
                }
                if width.is_some() {
                    positive(effect, "width", *width)?;
                }
                if height.is_some() {
                    positive(effect, "height", *height)?;
                }
            }
            Effect::Crop { width, height, .. } => {
                if width.is_none() && height.is_none() {
                    return Err(EffectError::MissingDimension { effect });
                }
                positive(effect, "width", *width)?;
                positive(effect, "height", *height)?;
            }
            Effect::Rotate { background, .. } => {
                if let Some(bg) = background.as_deref().filter(|bg| !bg.is_empty()) {
                    if Color::parse_hex(bg).is_none() {
                        return Err(EffectError::invalid(effect, "background", bg));
                    }
                }
            }
            Effect::Desaturate => {}
            Effect::Quality { quality } => {
                if !(1..=100).contains(quality) {
                    return Err(EffectError::invalid(effect, "quality", quality));
                }
            }
            Effect::Convert { extension } => {
                if !is_supported_extension(extension) {
                    return Err(EffectError::invalid(effect, "extension", extension));
                }
            }
            Effect::RawParameter { key, .. } => {
                if key.trim().is_empty() {
                    return Err(EffectError::invalid(effect, "key", key));
                }
            }
        }
        Ok(())
    }
}

fn positive(
    effect: &'static str,
    argument: &'static str,
    value: Option<u32>,
) -> Result<(), EffectError> {
    match value {
        Some(v) if v > 0 => Ok(()),
        Some(v) => Err(EffectError::invalid(effect, argument, v)),
        None => Err(EffectError::invalid(effect, argument, "none")),
    }
}
