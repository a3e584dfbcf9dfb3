//! Output dimensions of an effect chain.
//!
//! Pure arithmetic: given the source size, work out the size imgix will
//! return so `width`/`height` attributes can be emitted without fetching the
//! derivative. Returns `None` once any effect makes the size unknowable.

use super::Effect;

/// Raw parameters that change geometry in ways this module does not model.
const GEOMETRY_KEYS: &[&str] = &[
    "w", "h", "fit", "rect", "rot", "crop", "ar", "dpr", "pad", "max-w", "max-h", "min-w", "min-h",
];

/// Apply every effect in order to `source` (width, height).
///
/// # Examples
/// ```
/// # use imgix_url::effects::{Effect, transform_dimensions};
/// let chain = [Effect::Scale { width: Some(400), height: None, upscale: false }];
/// assert_eq!(transform_dimensions(&chain, (1600, 1200)), Some((400, 300)));
/// ```
pub fn transform_dimensions(effects: &[Effect], source: (u32, u32)) -> Option<(u32, u32)> {
    effects
        .iter()
        .try_fold(source, |dims, effect| apply(effect, dims))
}

fn apply(effect: &Effect, dims: (u32, u32)) -> Option<(u32, u32)> {
    match effect {
        Effect::Resize { width, height } => Some((*width, *height)),
        Effect::Scale {
            width,
            height,
            upscale,
        } => scale_dimensions(dims, *width, *height, *upscale),
        Effect::ScaleAndCrop {
            width,
            height,
            upscale,
            ..
        } => match (width, height) {
            (Some(w), Some(h)) => Some((*w, *h)),
            _ => scale_dimensions(dims, *width, *height, *upscale),
        },
        Effect::Crop { width, height, .. } => Some(((*width)?, (*height)?)),
        Effect::Rotate { degrees, .. } => rotate_dimensions(dims, *degrees),
        Effect::Desaturate | Effect::Quality { .. } | Effect::Convert { .. } => Some(dims),
        Effect::RawParameter { key, .. } => {
            if GEOMETRY_KEYS.contains(&key.as_str()) {
                None
            } else {
                Some(dims)
            }
        }
    }
}

/// Fit `source` inside the requested box while preserving aspect ratio.
///
/// The constraining edge wins: with both dimensions given, whichever one
/// produces the smaller image is used. Without `upscale`, a result larger
/// than the source leaves the source size unchanged.
pub fn scale_dimensions(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
    upscale: bool,
) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return None;
    }
    let aspect = src_h as f64 / src_w as f64;

    let by_width = |w: u32| (w, (w as f64 * aspect).round() as u32);
    let by_height = |h: u32| ((h as f64 / aspect).round() as u32, h);

    let (w, h) = match (width, height) {
        (Some(w), None) => by_width(w),
        (None, Some(h)) => by_height(h),
        (Some(w), Some(h)) => {
            if aspect < h as f64 / w as f64 {
                by_width(w)
            } else {
                by_height(h)
            }
        }
        (None, None) => return Some(source),
    };

    if !upscale && (w > src_w || h > src_h) {
        return Some(source);
    }
    Some((w, h))
}

/// Right-angle rotations swap or keep the edges; other angles are unknown.
fn rotate_dimensions(dims: (u32, u32), degrees: i32) -> Option<(u32, u32)> {
    match degrees.rem_euclid(360) {
        0 | 180 => Some(dims),
        90 | 270 => Some((dims.1, dims.0)),
        _ => None,
    }
}
