//! Named imgix parameter presets.
//!
//! A preset is a machine-name key plus a raw query string in imgix syntax
//! (`w=150&h=150&fit=crop`). Presets are written by an administrator and read
//! at request time; key rules are enforced when a preset is created or
//! updated, never when it is resolved.
//!
//! Query strings are taken verbatim. No percent-decoding is applied, so
//! whatever was entered is exactly what reaches imgix (after the URL
//! builder's own encoding).

use crate::params::Parameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const MAX_KEY_LEN: usize = 64;
pub const MAX_QUERY_LEN: usize = 255;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    #[error("preset '{0}' not found")]
    NotFound(String),
    #[error("preset '{0}' already exists")]
    DuplicateKey(String),
    #[error("invalid preset key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },
    #[error("preset stored under '{table}' declares key '{key}'")]
    KeyMismatch { table: String, key: String },
    #[error("query for preset '{key}' is longer than {MAX_QUERY_LEN} characters")]
    QueryTooLong { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    pub key: String,
    pub query: String,
}

impl Preset {
    pub fn new(key: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            query: query.into(),
        }
    }

    pub fn params(&self) -> Parameters {
        parse_query(&self.query)
    }
}

/// Parse `a=1&b=2` into parameters.
///
/// Each `&`-separated segment splits on its first `=`; the value keeps any
/// later `=` characters. Empty segments are skipped and a segment without
/// `=` becomes a key with an empty value.
pub fn parse_query(query: &str) -> Parameters {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (key, value),
            None => (segment, ""),
        })
        .collect()
}

/// Check the machine-name rule: `[a-z0-9_]+`, at most [`MAX_KEY_LEN`] chars.
pub fn validate_key(key: &str) -> Result<(), PresetError> {
    let invalid = |reason| PresetError::InvalidKey {
        key: key.to_string(),
        reason,
    };
    if key.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(invalid("longer than 64 characters"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(invalid("only lowercase letters, digits and underscores are allowed"));
    }
    Ok(())
}

fn validate_query(key: &str, query: &str) -> Result<(), PresetError> {
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(PresetError::QueryTooLong {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// All configured presets, keyed by preset key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetStore {
    presets: BTreeMap<String, Preset>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for the preset named `key`.
    pub fn resolve(&self, key: &str) -> Result<Parameters, PresetError> {
        self.get(key)
            .map(Preset::params)
            .ok_or_else(|| PresetError::NotFound(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Preset> {
        self.presets.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.presets.contains_key(key)
    }

    /// Preset keys in sorted order, for pickers and listings.
    pub fn keys(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn create(&mut self, preset: Preset) -> Result<(), PresetError> {
        validate_key(&preset.key)?;
        validate_query(&preset.key, &preset.query)?;
        if self.presets.contains_key(&preset.key) {
            return Err(PresetError::DuplicateKey(preset.key));
        }
        self.presets.insert(preset.key.clone(), preset);
        Ok(())
    }

    /// Replace the query of an existing preset.
    pub fn update(&mut self, key: &str, query: impl Into<String>) -> Result<(), PresetError> {
        let query = query.into();
        validate_query(key, &query)?;
        let preset = self
            .presets
            .get_mut(key)
            .ok_or_else(|| PresetError::NotFound(key.to_string()))?;
        preset.query = query;
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> Result<Preset, PresetError> {
        self.presets
            .remove(key)
            .ok_or_else(|| PresetError::NotFound(key.to_string()))
    }

    /// Check every stored preset against the key rules.
    ///
    /// Used after loading from configuration, where entries bypass
    /// [`create`](Self::create).
    pub fn validate(&self) -> Result<(), PresetError> {
        for (table, preset) in &self.presets {
            validate_key(table)?;
            if *table != preset.key {
                return Err(PresetError::KeyMismatch {
                    table: table.clone(),
                    key: preset.key.clone(),
                });
            }
            validate_query(&preset.key, &preset.query)?;
        }
        Ok(())
    }
}

impl FromIterator<Preset> for PresetStore {
    fn from_iter<I: IntoIterator<Item = Preset>>(iter: I) -> Self {
        Self {
            presets: iter
                .into_iter()
                .map(|preset| (preset.key.clone(), preset))
                .collect(),
        }
    }
}
