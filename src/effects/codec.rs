//! Effect ⇄ imgix parameter mapping.
//!
//! The forward direction ([`effect_to_params`]) is what an image style does at
//! render time. The reverse direction ([`params_to_effects`]) rebuilds an
//! effect chain from a flat mapping, e.g. when a preset string is turned into
//! an editable image style.
//!
//! Reverse mapping inspects key groups in a fixed priority order and consumes
//! the keys it matches, so nothing is interpreted twice:
//!
//! 1. `fm` → convert, when the format is supported
//! 2. `rect` → crop
//! 3. `sat=-100` → desaturate
//! 4. `q` → quality
//! 5. `fit=scale` → resize (`w`, `h`)
//! 6. `rot` → rotate (`bg`, the transparent-white default reads back as none)
//! 7. `fit=clip|max` → scale
//! 8. `fit=crop|min` → scale and crop (`crop`)
//! 9. leftovers → one raw parameter each, in key order

use super::{Color, Effect, EffectError, is_supported_extension};
use crate::params::{ParamValue, Parameters};
use serde::Serialize;

/// Weight given to the first effect of a rebuilt chain; each following
/// effect gets the next integer.
pub const EFFECT_BASE_WEIGHT: i32 = -10;

/// An effect with its position weight inside an image style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeightedEffect {
    pub weight: i32,
    #[serde(flatten)]
    pub effect: Effect,
}

/// Validate `effect` and produce the parameters it contributes.
pub fn effect_to_params(effect: &Effect) -> Result<Parameters, EffectError> {
    effect.validate()?;

    let mut params = Parameters::new();
    match effect {
        Effect::Resize { width, height } => {
            params.insert("fit", "scale");
            params.insert("w", *width);
            params.insert("h", *height);
        }
        Effect::Scale {
            width,
            height,
            upscale,
        } => {
            params.insert("fit", if *upscale { "clip" } else { "max" });
            insert_dimensions(&mut params, *width, *height);
        }
        Effect::ScaleAndCrop {
            width,
            height,
            anchor,
            upscale,
        } => {
            params.insert("fit", if *upscale { "crop" } else { "min" });
            insert_dimensions(&mut params, *width, *height);
            if let Some(anchor) = anchor.as_deref().filter(|a| !a.is_empty()) {
                params.insert("crop", anchor.replace('-', ","));
            }
        }
        Effect::Crop {
            x,
            y,
            width,
            height,
        } => {
            let (Some(width), Some(height)) = (width, height) else {
                return Err(EffectError::MissingDimension { effect: "crop" });
            };
            params.insert("rect", format!("{x},{y},{width},{height}"));
        }
        Effect::Rotate {
            degrees,
            background,
        } => {
            // `validate` has already checked a supplied colour; it goes out as written.
            let bg = match background.as_deref().filter(|bg| !bg.is_empty()) {
                Some(bg) => bg.to_string(),
                None => Color::transparent_white().to_imgix_hex(),
            };
            params.insert("rot", *degrees);
            params.insert("bg", bg);
        }
        Effect::Desaturate => params.insert("sat", -100),
        Effect::Quality { quality } => params.insert("q", *quality),
        Effect::Convert { extension } => params.insert("fm", extension.as_str()),
        Effect::RawParameter { key, value } => params.insert(key.as_str(), value.as_str()),
    }
    Ok(params)
}

fn insert_dimensions(params: &mut Parameters, width: Option<u32>, height: Option<u32>) {
    if let Some(w) = width {
        params.insert("w", w);
    }
    if let Some(h) = height {
        params.insert("h", h);
    }
}

/// Rebuild a weighted effect chain from a flat parameter mapping.
///
/// Every synthesized effect is validated, so the returned chain always
/// translates cleanly. Values that must be numeric but are not fail with
/// [`EffectError::InvalidArgument`].
pub fn params_to_effects(params: &Parameters) -> Result<Vec<WeightedEffect>, EffectError> {
    let mut rest = params.clone();
    let mut effects = Vec::new();

    // A format outside the supported list stays a raw parameter.
    let fm = rest.get("fm").map(ParamValue::to_string);
    if let Some(extension) = fm.filter(|fm| is_supported_extension(fm)) {
        rest.remove("fm");
        effects.push(Effect::Convert { extension });
    }

    if let Some(rect) = rest.remove("rect") {
        effects.push(parse_rect(&rect.to_string())?);
    }

    if rest.get("sat").and_then(ParamValue::as_int) == Some(-100) {
        rest.remove("sat");
        effects.push(Effect::Desaturate);
    }

    if let Some(q) = rest.remove("q") {
        effects.push(Effect::Quality {
            quality: number("quality", "quality", &q)?,
        });
    }

    if fit_is(&rest, &["scale"]) {
        rest.remove("fit");
        let width = take_dimension(&mut rest, "resize", "w", "width")?;
        let height = take_dimension(&mut rest, "resize", "h", "height")?;
        let (Some(width), Some(height)) = (width, height) else {
            return Err(EffectError::InvalidArgument {
                effect: "resize",
                argument: if width.is_none() { "width" } else { "height" },
                value: "none".to_string(),
            });
        };
        effects.push(Effect::Resize { width, height });
    }

    if let Some(rot) = rest.remove("rot") {
        effects.push(Effect::Rotate {
            degrees: number("rotate", "degrees", &rot)?,
            background: rest
                .remove("bg")
                .map(|bg| bg.to_string())
                .filter(|bg| *bg != Color::transparent_white().to_imgix_hex()),
        });
    }

    if fit_is(&rest, &["clip", "max"]) {
        let upscale = fit_is(&rest, &["clip"]);
        rest.remove("fit");
        effects.push(Effect::Scale {
            width: take_dimension(&mut rest, "scale", "w", "width")?,
            height: take_dimension(&mut rest, "scale", "h", "height")?,
            upscale,
        });
    }

    if fit_is(&rest, &["crop", "min"]) {
        let upscale = fit_is(&rest, &["crop"]);
        rest.remove("fit");
        effects.push(Effect::ScaleAndCrop {
            width: take_dimension(&mut rest, "scale_and_crop", "w", "width")?,
            height: take_dimension(&mut rest, "scale_and_crop", "h", "height")?,
            anchor: rest.remove("crop").map(|c| c.to_string().replace(',', "-")),
            upscale,
        });
    }

    for (key, value) in rest {
        effects.push(Effect::RawParameter {
            key,
            value: value.to_string(),
        });
    }

    effects
        .into_iter()
        .zip(EFFECT_BASE_WEIGHT..)
        .map(|(effect, weight)| -> Result<WeightedEffect, EffectError> {
            effect.validate()?;
            Ok(WeightedEffect { weight, effect })
        })
        .collect()
}

fn fit_is(params: &Parameters, modes: &[&str]) -> bool {
    matches!(params.get("fit"), Some(fit) if modes.contains(&fit.to_string().as_str()))
}

fn parse_rect(rect: &str) -> Result<Effect, EffectError> {
    let invalid = || EffectError::InvalidArgument {
        effect: "crop",
        argument: "rect",
        value: rect.to_string(),
    };

    let parts: Vec<&str> = rect.split(',').map(str::trim).collect();
    let [x, y, width, height] = parts.as_slice() else {
        return Err(invalid());
    };

    Ok(Effect::Crop {
        x: x.parse().map_err(|_| invalid())?,
        y: y.parse().map_err(|_| invalid())?,
        width: Some(width.parse().map_err(|_| invalid())?),
        height: Some(height.parse().map_err(|_| invalid())?),
    })
}

fn number<T: std::str::FromStr>(
    effect: &'static str,
    argument: &'static str,
    value: &ParamValue,
) -> Result<T, EffectError> {
    value
        .to_string()
        .trim()
        .parse()
        .map_err(|_| EffectError::InvalidArgument {
            effect,
            argument,
            value: value.to_string(),
        })
}

fn take_dimension(
    params: &mut Parameters,
    effect: &'static str,
    key: &str,
    argument: &'static str,
) -> Result<Option<u32>, EffectError> {
    params
        .remove(key)
        .map(|v| number(effect, argument, &v))
        .transpose()
}
