//! Configuration module.
//!
//! Handles loading, validating, layering and saving the imgix configuration.
//! A deployment has one base file plus any number of override files (per
//! environment, per host); each override only names the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [settings]
//! source_domain = ""            # e.g. "example.imgix.net"; empty disables imgix
//! mapping_type = "webfolder"    # webfolder | webproxy | s3 | gcs
//! path_prefix = ""              # stripped from file paths before mapping
//! s3_has_prefix = false         # deprecated; prefer path_prefix
//! https = true
//! secure_url_token = ""         # signing key; empty for unsigned URLs
//! external_cdn = ""             # host that replaces source_domain
//!
//! [files]
//! extensions = ["png", "gif", "jpg", "jpeg", "svg", "jfif"]
//!
//! [presets.thumb]
//! key = "thumb"
//! query = "w=150&h=150&fit=crop&crop=entropy"
//! ```
//!
//! ## Layering
//!
//! Files are merged table by table over the stock defaults, later files
//! winning. A `[presets.*]` entry in an override adds or replaces that one
//! preset; presets cannot be removed by an override.
//!
//! Unknown keys are rejected to catch typos early.

use crate::mapping::{MappingType, SourceMapping};
use crate::presets::{PresetError, PresetStore};
use crate::service::{DEFAULT_FILE_EXTENSIONS, ImgixUrlService};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),
}

/// Full configuration: the imgix source, file selection and presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The `[settings]` table deserializes straight into the source mapping.
    pub settings: SourceMapping,
    pub files: FileSettings,
    pub presets: PresetStore,
}

/// The `[files]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    /// File extensions handed to imgix. Others are left to local processing.
    pub extensions: Vec<String>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_FILE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Validate values that deserialization alone cannot check.
    ///
    /// An empty `source_domain` is valid: it means imgix is switched off.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for ext in &self.files.extensions {
            if ext.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "files.extensions must not contain empty entries".into(),
                ));
            }
            if *ext != ext.to_ascii_lowercase() || ext.starts_with('.') {
                return Err(ConfigError::Validation(format!(
                    "files.extensions entry '{ext}' must be lowercase without a leading dot"
                )));
            }
        }
        if self.settings.s3_has_prefix && self.settings.mapping_type != MappingType::S3 {
            tracing::warn!(
                mapping_type = %self.settings.mapping_type,
                "settings.s3_has_prefix only applies to the s3 mapping type"
            );
        }
        self.presets.validate()?;
        Ok(())
    }

    /// A URL service for these settings using the stock URL builder.
    pub fn service(&self) -> ImgixUrlService {
        ImgixUrlService::new(self.settings.clone())
            .file_extensions(self.files.extensions.iter().cloned())
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer every config file is merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load one config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays in order onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the base file and any override files on top of stock defaults.
///
/// A missing base file yields the defaults. A missing override file is an
/// error, since it was named explicitly.
pub fn load_config(base: &Path, overrides: &[impl AsRef<Path>]) -> Result<Config, ConfigError> {
    let mut layers = Vec::new();
    if let Some(value) = load_raw_config(base)? {
        layers.push(value);
    }
    for path in overrides {
        let path = path.as_ref();
        match load_raw_config(path)? {
            Some(value) => layers.push(value),
            None => {
                return Err(ConfigError::Validation(format!(
                    "override file not found: {}",
                    path.display()
                )));
            }
        }
    }
    resolve_config(stock_defaults_value()?, layers)
}

/// Rewrite the `presets` table of the file at `path`, keeping its other
/// tables as written. Creates the file if needed.
pub fn save_presets(path: &Path, presets: &PresetStore) -> Result<(), ConfigError> {
    let mut table = match load_raw_config(path)? {
        Some(toml::Value::Table(table)) => table,
        _ => toml::Table::new(),
    };
    table.insert("presets".to_string(), toml::Value::try_from(presets)?);
    fs::write(path, toml::to_string_pretty(&table)?)?;
    Ok(())
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgix-url configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Override files (--override) are merged on top of this file table by table.
# Each override only needs the keys it wants to change.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# imgix source
# ---------------------------------------------------------------------------
[settings]
# imgix source domain, e.g. "example.imgix.net".
# Leave empty to disable imgix: every URL lookup then returns nothing.
source_domain = ""

# How imgix reaches the original images:
#   webfolder - imgix fetches <base URL>/<path of the file>
#   webproxy  - imgix fetches the full public URL of the file
#   s3        - Amazon S3 bucket; the bucket segment is dropped from the path
#   gcs       - Google Cloud Storage bucket; same rule as s3
mapping_type = "webfolder"

# Leading path removed from file paths before they are sent to imgix.
# For s3/gcs, setting this keeps the first segment instead of dropping it.
path_prefix = ""

# Deprecated: the S3 source was set up with the bucket name as part of its
# path. Prefer path_prefix.
s3_has_prefix = false

# Build https:// URLs.
https = true

# Secure URL token of the source. Empty builds unsigned URLs.
secure_url_token = ""

# Host that replaces source_domain in every built URL, e.g. a CNAME.
external_cdn = ""

# ---------------------------------------------------------------------------
# Files
# ---------------------------------------------------------------------------
[files]
# File extensions served through imgix.
extensions = ["png", "gif", "jpg", "jpeg", "svg", "jfif"]

# ---------------------------------------------------------------------------
# Presets
# ---------------------------------------------------------------------------
# Named parameter sets in imgix query syntax. The table name and `key` must
# match and use only lowercase letters, digits and underscores.
#
# [presets.thumb]
# key = "thumb"
# query = "w=150&h=150&fit=crop&crop=entropy"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::Preset;
    use crate::service::PublicFile;
    use crate::test_helpers::sample_presets;
    use tempfile::TempDir;

    #[test]
    fn default_settings() {
        let config = Config::default();
        assert_eq!(config.settings.source_domain, "");
        assert_eq!(config.settings.mapping_type, MappingType::WebFolder);
        assert!(config.settings.https);
        assert_eq!(
            config.files.extensions,
            vec!["png", "gif", "jpg", "jpeg", "svg", "jfif"]
        );
        assert!(config.presets.is_empty());
    }

    #[test]
    fn parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
[settings]
source_domain = "example.imgix.net"
mapping_type = "s3"
"#,
        )
        .unwrap();
        assert_eq!(config.settings.source_domain, "example.imgix.net");
        assert_eq!(config.settings.mapping_type, MappingType::S3);
        // Defaults preserved
        assert!(config.settings.https);
        assert_eq!(config.files.extensions.len(), 6);
    }

    #[test]
    fn parse_presets() {
        let config: Config = toml::from_str(
            r#"
[presets.thumb]
key = "thumb"
query = "w=150&h=150&fit=crop&crop=entropy"
"#,
        )
        .unwrap();
        assert_eq!(config.presets.keys(), vec!["thumb"]);
        config.validate().unwrap();
    }

    #[test]
    fn settings_table_is_the_source_mapping() {
        let config: Config = toml::from_str(
            r#"
[settings]
source_domain = "a.imgix.net"
external_cdn = "cdn.example.com"
"#,
        )
        .unwrap();
        let mut expected = SourceMapping::new("a.imgix.net", MappingType::WebFolder);
        expected.external_cdn = "cdn.example.com".into();
        assert_eq!(config.settings, expected);
        assert_eq!(config.service().mapping(), &expected);
        assert_eq!(config.settings.secure_url_token(), None);
    }

    #[test]
    fn extensions_live_in_files_table() {
        let config: Config = toml::from_str("[files]\nextensions = [\"webp\"]\n").unwrap();
        assert_eq!(config.files.extensions, vec!["webp"]);
        assert_eq!(config.settings, SourceMapping::default());

        let misplaced: Result<Config, _> =
            toml::from_str("[settings]\nfile_extensions = [\"webp\"]\n");
        assert!(misplaced.unwrap_err().to_string().contains("unknown field"));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn empty_source_domain_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn uppercase_extension_rejected() {
        let mut config = Config::default();
        config.files.extensions = vec!["JPG".into()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("JPG")
        ));
    }

    #[test]
    fn empty_extension_rejected() {
        let mut config = Config::default();
        config.files.extensions = vec![String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn preset_key_mismatch_rejected() {
        let config: Config = toml::from_str(
            r#"
[presets.thumb]
key = "other"
query = "w=1"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Preset(PresetError::KeyMismatch { .. }))
        ));
    }

    #[test]
    fn invalid_preset_table_key_rejected() {
        let config: Config = toml::from_str(
            r#"
[presets.Thumb]
key = "Thumb"
query = "w=1"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Preset(PresetError::InvalidKey { .. }))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
[settings]
source_domian = "typo.imgix.net"
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<Config, _> = toml::from_str("[setings]\nhttps = false\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_mapping_type_rejected() {
        let result: Result<Config, _> = toml::from_str("[settings]\nmapping_type = \"ftp\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_preset_field_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
[presets.thumb]
key = "thumb"
query = "w=1"
weight = 3
"#,
        );
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[settings]
source_domain = "base.imgix.net"
https = true
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[settings]
https = false
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(
            merged["settings"]["source_domain"].as_str(),
            Some("base.imgix.net")
        );
        assert_eq!(merged["settings"]["https"].as_bool(), Some(false));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str(r#"exts = ["png", "jpg"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"exts = ["webp"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["exts"].as_array().map(Vec::len), Some(1));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let no_overrides: &[&Path] = &[];
        let config = load_config(&tmp.path().join("imgix.toml"), no_overrides).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_config_layers_overrides_in_order() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("imgix.toml");
        let staging = tmp.path().join("staging.toml");
        let local = tmp.path().join("local.toml");

        fs::write(
            &base,
            r#"
[settings]
source_domain = "prod.imgix.net"
mapping_type = "s3"
secure_url_token = "prod-token"

[presets.thumb]
key = "thumb"
query = "w=150"
"#,
        )
        .unwrap();
        fs::write(
            &staging,
            r#"
[settings]
source_domain = "staging.imgix.net"
external_cdn = "img.staging.example.com"

[presets.hero]
key = "hero"
query = "w=1600"
"#,
        )
        .unwrap();
        fs::write(&local, "[settings]\nhttps = false\n").unwrap();

        let config = load_config(&base, &[&staging, &local]).unwrap();
        assert_eq!(config.settings.source_domain, "staging.imgix.net");
        assert_eq!(config.settings.mapping_type, MappingType::S3);
        assert_eq!(config.settings.secure_url_token, "prod-token");
        assert_eq!(config.settings.external_cdn, "img.staging.example.com");
        assert!(!config.settings.https);
        assert_eq!(config.presets.keys(), vec!["hero", "thumb"]);
    }

    #[test]
    fn load_config_missing_override_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(
            &tmp.path().join("imgix.toml"),
            &[tmp.path().join("missing.toml")],
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("imgix.toml");
        fs::write(&base, "[settings\nbroken").unwrap();
        let no_overrides: &[&Path] = &[];
        assert!(matches!(
            load_config(&base, no_overrides),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_runs_validation() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("imgix.toml");
        fs::write(&base, "[files]\nextensions = [\"PNG\"]\n").unwrap();
        let no_overrides: &[&Path] = &[];
        assert!(matches!(
            load_config(&base, no_overrides),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Stock config and saving
    // =========================================================================

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: Config = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn stock_defaults_value_round_trips() {
        let config: Config = stock_defaults_value().unwrap().try_into().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_presets_keeps_settings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("imgix.toml");
        fs::write(
            &path,
            "[settings]\nsource_domain = \"example.imgix.net\"\n",
        )
        .unwrap();

        let mut presets = sample_presets();
        presets.create(Preset::new("card", "w=400&h=300&fit=crop")).unwrap();
        save_presets(&path, &presets).unwrap();

        let no_overrides: &[&Path] = &[];
        let config = load_config(&path, no_overrides).unwrap();
        assert_eq!(config.settings.source_domain, "example.imgix.net");
        assert_eq!(config.presets, presets);
    }

    #[test]
    fn save_presets_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("new.toml");
        save_presets(&path, &sample_presets()).unwrap();
        let written: Config = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.presets, sample_presets());
        assert_eq!(written.settings, SourceMapping::default());
        assert_eq!(written.files, FileSettings::default());
    }

    #[test]
    fn service_uses_configured_extensions() {
        let mut config = Config::default();
        config.settings.source_domain = "example.imgix.net".into();
        config.files.extensions = vec!["webp".into()];
        let service = config.service();
        let params = Default::default();

        let webp = PublicFile::new("public://a.webp", "https://www.example.com/a.webp");
        let jpg = PublicFile::new("public://a.jpg", "https://www.example.com/a.jpg");
        assert_eq!(
            service.build_url_for_file(&webp, &params).as_deref(),
            Some("https://example.imgix.net/a.webp")
        );
        assert_eq!(service.build_url_for_file(&jpg, &params), None);
    }
}
