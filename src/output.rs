//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Parameters (`translate`)
//!
//! ```text
//! fit=max
//! sat=-100
//! w=800
//! ```
//!
//! ## Presets (`preset list`, `preset show`)
//!
//! ```text
//! 001 hero
//!     Query: w=1600&auto=format,compress
//! 002 thumb
//!     Query: w=150&h=150&fit=crop&crop=entropy
//! ```
//!
//! `preset show` adds the parsed parameters and the effect chain they
//! reverse into:
//!
//! ```text
//! thumb
//!     Query: w=150&h=150&fit=crop&crop=entropy
//!     Parameters:
//!         crop=entropy
//!         fit=crop
//!         h=150
//!         w=150
//!     Effects:
//!         -10 scale_and_crop
//! ```
//!
//! ## Check
//!
//! ```text
//! Source
//!     Domain: example.imgix.net
//!     Mapping: Amazon S3 (s3)
//!     Path prefix: (none)
//!     Scheme: https
//!     Signed: yes
//!     External CDN: (none)
//!     Extensions: png, gif, jpg, jpeg, svg, jfif
//! Presets: 2
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::config::Config;
use crate::effects::{WeightedEffect, params_to_effects};
use crate::params::Parameters;
use crate::presets::{Preset, PresetStore};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() {
        "(none)"
    } else {
        value
    }
}

// ============================================================================
// Parameters and effects
// ============================================================================

/// One `key=value` line per parameter, in key order.
pub fn format_params(params: &Parameters) -> Vec<String> {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect()
}

pub fn print_params(params: &Parameters) {
    for line in format_params(params) {
        println!("{}", line);
    }
}

/// One `weight name` line per effect.
pub fn format_effects(effects: &[WeightedEffect]) -> Vec<String> {
    effects
        .iter()
        .map(|w| format!("{} {}", w.weight, w.effect.name()))
        .collect()
}

// ============================================================================
// Presets
// ============================================================================

pub fn format_preset_list(presets: &PresetStore) -> Vec<String> {
    if presets.is_empty() {
        return vec!["No presets configured".to_string()];
    }
    let mut lines = Vec::new();
    for (i, preset) in presets.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), preset.key));
        lines.push(format!("{}Query: {}", indent(1), preset.query));
    }
    lines
}

pub fn print_preset_list(presets: &PresetStore) {
    for line in format_preset_list(presets) {
        println!("{}", line);
    }
}

/// Detailed view of one preset.
///
/// A query that does not reverse into effects (non-numeric `w`, say) shows
/// the reason instead of the effect list.
pub fn format_preset(preset: &Preset) -> Vec<String> {
    let params = preset.params();
    let mut lines = vec![
        preset.key.clone(),
        format!("{}Query: {}", indent(1), preset.query),
        format!("{}Parameters:", indent(1)),
    ];
    lines.extend(
        format_params(&params)
            .into_iter()
            .map(|line| format!("{}{}", indent(2), line)),
    );
    match params_to_effects(&params) {
        Ok(effects) => {
            lines.push(format!("{}Effects:", indent(1)));
            lines.extend(
                format_effects(&effects)
                    .into_iter()
                    .map(|line| format!("{}{}", indent(2), line)),
            );
        }
        Err(e) => lines.push(format!("{}Effects: {}", indent(1), e)),
    }
    lines
}

pub fn print_preset(preset: &Preset) {
    for line in format_preset(preset) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_summary(config: &Config) -> Vec<String> {
    let settings = &config.settings;
    let mut lines = vec!["Source".to_string()];
    if settings.source_domain.trim().is_empty() {
        lines.push(format!(
            "{}Domain: (none) - imgix URLs are disabled",
            indent(1)
        ));
    } else {
        lines.push(format!("{}Domain: {}", indent(1), settings.source_domain));
    }
    lines.push(format!(
        "{}Mapping: {} ({})",
        indent(1),
        settings.mapping_type.label(),
        settings.mapping_type
    ));
    lines.push(format!(
        "{}Path prefix: {}",
        indent(1),
        or_none(&settings.path_prefix)
    ));
    if settings.s3_has_prefix {
        lines.push(format!("{}S3 bucket kept in path (deprecated)", indent(1)));
    }
    lines.push(format!(
        "{}Scheme: {}",
        indent(1),
        if settings.https { "https" } else { "http" }
    ));
    lines.push(format!(
        "{}Signed: {}",
        indent(1),
        if settings.secure_url_token.trim().is_empty() {
            "no"
        } else {
            "yes"
        }
    ));
    lines.push(format!(
        "{}External CDN: {}",
        indent(1),
        or_none(&settings.external_cdn)
    ));
    lines.push(format!(
        "{}Extensions: {}",
        indent(1),
        config.files.extensions.join(", ")
    ));
    lines.push(format!("Presets: {}", config.presets.len()));
    lines
}

pub fn print_check_summary(config: &Config) {
    for line in format_check_summary(config) {
        println!("{}", line);
    }
}
