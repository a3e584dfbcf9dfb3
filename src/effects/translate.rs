//! Folding an effect chain into one parameter mapping.
//!
//! Effects are applied in chain order and merged into a single mapping; a
//! later effect overwrites keys set by an earlier one. That is what lets a
//! trailing raw parameter override a computed value (`q=50` after a quality
//! effect). Any invalid effect rejects the whole chain.

use super::codec::{WeightedEffect, effect_to_params};
use super::{Effect, EffectError};
use crate::params::Parameters;
use thiserror::Error;

/// A chain was rejected because one of its effects failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("effect #{position} ('{effect}') rejected: {source}")]
pub struct TranslateError {
    /// Zero-based index into the chain.
    pub position: usize,
    pub effect: &'static str,
    #[source]
    pub source: EffectError,
}

/// Translate an ordered chain into imgix parameters.
pub fn translate(effects: &[Effect]) -> Result<Parameters, TranslateError> {
    let mut params = Parameters::new();
    for (position, effect) in effects.iter().enumerate() {
        let fragment = effect_to_params(effect).map_err(|source| TranslateError {
            position,
            effect: effect.name(),
            source,
        })?;
        params.merge(fragment);
    }
    Ok(params)
}

/// Translate a weighted chain, applying effects in ascending weight order.
///
/// Equal weights keep their original relative order.
pub fn translate_weighted(effects: &[WeightedEffect]) -> Result<Parameters, TranslateError> {
    let mut ordered: Vec<&WeightedEffect> = effects.iter().collect();
    ordered.sort_by_key(|w| w.weight);
    let chain: Vec<Effect> = ordered.into_iter().map(|w| w.effect.clone()).collect();
    translate(&chain)
}
