//! Source mapping: which path imgix should fetch for a file.
//!
//! An imgix source is bound to one origin. How a file's public URL turns into
//! the path imgix requests depends on the kind of origin:
//!
//! | Type | Result for `https://cdn.example.com/bucket/a/b.jpg` |
//! |---|---|
//! | Web folder | `/bucket/a/b.jpg` (URL path only) |
//! | Web proxy | `https://cdn.example.com/bucket/a/b.jpg` (whole URL) |
//! | S3 / GCS | `a/b.jpg` (bucket segment dropped) |
//!
//! A configured `path_prefix` is stripped from the URL path first. For S3/GCS
//! the prefix replaces the bucket-dropping step; `s3_has_prefix` is the older
//! flag for the same situation and only applies to S3.
//!
//! Anything that cannot be mapped yields `None`, never an error.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// How imgix reaches the original images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    #[default]
    WebFolder,
    WebProxy,
    S3,
    Gcs,
}

impl MappingType {
    pub const ALL: [MappingType; 4] = [
        MappingType::WebFolder,
        MappingType::WebProxy,
        MappingType::S3,
        MappingType::Gcs,
    ];

    /// Configuration name (`webfolder`, `webproxy`, `s3`, `gcs`).
    pub fn as_str(self) -> &'static str {
        match self {
            MappingType::WebFolder => "webfolder",
            MappingType::WebProxy => "webproxy",
            MappingType::S3 => "s3",
            MappingType::Gcs => "gcs",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            MappingType::WebFolder => "Web Folder",
            MappingType::WebProxy => "Web Proxy",
            MappingType::S3 => "Amazon S3",
            MappingType::Gcs => "Google Cloud Storage",
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for one imgix source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceMapping {
    /// imgix source domain, e.g. `example.imgix.net`. Empty disables imgix.
    pub source_domain: String,
    pub mapping_type: MappingType,
    /// Leading path removed before the path is handed to imgix.
    pub path_prefix: String,
    /// Deprecated: the S3 bucket name is part of the imgix path, so keep it.
    pub s3_has_prefix: bool,
    pub https: bool,
    /// Signing key; empty produces unsigned URLs.
    pub secure_url_token: String,
    /// Host that replaces `source_domain` in built URLs.
    pub external_cdn: String,
}

impl Default for SourceMapping {
    fn default() -> Self {
        Self {
            source_domain: String::new(),
            mapping_type: MappingType::default(),
            path_prefix: String::new(),
            s3_has_prefix: false,
            https: true,
            secure_url_token: String::new(),
            external_cdn: String::new(),
        }
    }
}

impl SourceMapping {
    pub fn new(source_domain: impl Into<String>, mapping_type: MappingType) -> Self {
        Self {
            source_domain: source_domain.into(),
            mapping_type,
            ..Self::default()
        }
    }

    /// `false` when no source domain is set; no URL can be built.
    pub fn is_configured(&self) -> bool {
        !self.source_domain.trim().is_empty()
    }

    pub fn path_prefix(&self) -> Option<&str> {
        non_empty(&self.path_prefix)
    }

    pub fn secure_url_token(&self) -> Option<&str> {
        non_empty(&self.secure_url_token)
    }

    pub fn external_cdn(&self) -> Option<&str> {
        non_empty(&self.external_cdn)
    }

    /// Compute the path imgix should fetch for `public_url`.
    ///
    /// Returns `None` when imgix is not configured, the URL does not parse,
    /// or nothing is left of the path after mapping.
    pub fn resolve_path(&self, public_url: &str) -> Option<String> {
        if !self.is_configured() {
            return None;
        }

        let url = Url::parse(public_url.trim()).ok()?;
        let decoded = percent_decode_str(url.path()).decode_utf8_lossy();
        let stripped = match self.path_prefix() {
            Some(prefix) => strip_path_prefix(&decoded, prefix),
            None => decoded.to_string(),
        };

        let resolved = match self.mapping_type {
            MappingType::WebFolder => stripped,
            MappingType::WebProxy => public_url.trim().to_string(),
            MappingType::S3 | MappingType::Gcs => {
                let relative = stripped.strip_prefix('/').unwrap_or(&stripped);
                if self.keeps_bucket_segment() {
                    relative.to_string()
                } else {
                    relative
                        .split_once('/')
                        .map(|(_bucket, rest)| rest.to_string())
                        .unwrap_or_default()
                }
            }
        };

        if resolved.trim_matches('/').is_empty() {
            None
        } else {
            Some(resolved)
        }
    }

    /// Whether the first path segment is part of the imgix path rather than
    /// a bucket name to discard.
    fn keeps_bucket_segment(&self) -> bool {
        self.path_prefix().is_some() || (self.mapping_type == MappingType::S3 && self.s3_has_prefix)
    }

    /// Whether a file stored at `uri` can be served through this source.
    ///
    /// `uri` is the storage location (`public://…`, `s3://…`), not the public
    /// URL. Files this returns `false` for are handled by the local image
    /// pipeline instead.
    pub fn serves_uri(&self, uri: &str) -> bool {
        let Some((scheme, _)) = uri.split_once("://") else {
            return false;
        };
        if scheme.is_empty() {
            return false;
        }
        match self.mapping_type {
            MappingType::WebProxy => scheme != "private",
            MappingType::S3 => scheme == "s3",
            MappingType::Gcs => scheme == "gcs",
            MappingType::WebFolder => true,
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Remove `prefix` from the start of `path` on a segment boundary.
///
/// Slashes around the configured prefix are ignored, so `bucket`, `/bucket`
/// and `/bucket/` all strip `/bucket` from `/bucket/a.jpg` but not from
/// `/bucket2/a.jpg`. The remainder keeps its leading slash.
fn strip_path_prefix(path: &str, prefix: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return path.to_string();
    }
    let relative = path.strip_prefix('/').unwrap_or(path);
    match relative.strip_prefix(prefix) {
        Some("") => String::new(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(mapping_type: MappingType) -> SourceMapping {
        SourceMapping::new("example.imgix.net", mapping_type)
    }

    #[test]
    fn web_folder_returns_absolute_path() {
        let m = mapping(MappingType::WebFolder);
        assert_eq!(
            m.resolve_path("https://cdn.example.com/sites/default/files/img.jpg")
                .as_deref(),
            Some("/sites/default/files/img.jpg")
        );
    }

    #[test]
    fn web_folder_decodes_path() {
        let m = mapping(MappingType::WebFolder);
        assert_eq!(
            m.resolve_path("https://cdn.example.com/files/my%20photo.jpg")
                .as_deref(),
            Some("/files/my photo.jpg")
        );
    }

    #[test]
    fn web_folder_strips_prefix() {
        let mut m = mapping(MappingType::WebFolder);
        m.path_prefix = "/sites/default/files/".into();
        assert_eq!(
            m.resolve_path("https://cdn.example.com/sites/default/files/2024/img.jpg")
                .as_deref(),
            Some("/2024/img.jpg")
        );
    }

    #[test]
    fn prefix_only_matches_whole_segments() {
        let mut m = mapping(MappingType::WebFolder);
        m.path_prefix = "files".into();
        assert_eq!(
            m.resolve_path("https://cdn.example.com/files2/img.jpg")
                .as_deref(),
            Some("/files2/img.jpg")
        );
    }

    #[test]
    fn web_proxy_returns_full_url() {
        let m = mapping(MappingType::WebProxy);
        let url = "https://cdn.example.com/sites/default/files/img.jpg";
        assert_eq!(m.resolve_path(url).as_deref(), Some(url));
    }

    #[test]
    fn s3_drops_bucket() {
        let m = mapping(MappingType::S3);
        assert_eq!(
            m.resolve_path("https://cdn.example.com/mybucket/folder/img.jpg")
                .as_deref(),
            Some("folder/img.jpg")
        );
    }

    #[test]
    fn s3_has_prefix_keeps_bucket() {
        let mut m = mapping(MappingType::S3);
        m.s3_has_prefix = true;
        assert_eq!(
            m.resolve_path("https://cdn.example.com/mybucket/folder/img.jpg")
                .as_deref(),
            Some("mybucket/folder/img.jpg")
        );
    }

    #[test]
    fn gcs_ignores_s3_flag() {
        let mut m = mapping(MappingType::Gcs);
        m.s3_has_prefix = true;
        assert_eq!(
            m.resolve_path("https://storage.googleapis.com/bucket/a/b.png")
                .as_deref(),
            Some("a/b.png")
        );
    }

    #[test]
    fn gcs_with_path_prefix_strips_instead_of_dropping() {
        let mut m = mapping(MappingType::Gcs);
        m.path_prefix = "bucket/uploads".into();
        assert_eq!(
            m.resolve_path("https://storage.googleapis.com/bucket/uploads/a/b.png")
                .as_deref(),
            Some("a/b.png")
        );
    }

    #[test]
    fn bucket_only_path_is_unmappable() {
        let m = mapping(MappingType::S3);
        assert_eq!(m.resolve_path("https://cdn.example.com/mybucket"), None);
    }

    #[test]
    fn empty_source_domain_is_unmappable() {
        for mapping_type in MappingType::ALL {
            let m = SourceMapping::new("", mapping_type);
            assert_eq!(m.resolve_path("https://cdn.example.com/a/b.jpg"), None);
        }
    }

    #[test]
    fn malformed_url_is_unmappable() {
        let m = mapping(MappingType::WebFolder);
        assert_eq!(m.resolve_path("not a url"), None);
        assert_eq!(m.resolve_path("/relative/path.jpg"), None);
    }

    #[test]
    fn root_path_is_unmappable() {
        let m = mapping(MappingType::WebFolder);
        assert_eq!(m.resolve_path("https://cdn.example.com/"), None);
    }

    #[test]
    fn serves_uri_by_scheme() {
        assert!(!mapping(MappingType::WebFolder).serves_uri("no-scheme.jpg"));
        assert!(mapping(MappingType::WebFolder).serves_uri("public://a.jpg"));
        assert!(mapping(MappingType::WebProxy).serves_uri("public://a.jpg"));
        assert!(!mapping(MappingType::WebProxy).serves_uri("private://a.jpg"));
        assert!(mapping(MappingType::S3).serves_uri("s3://bucket/a.jpg"));
        assert!(!mapping(MappingType::S3).serves_uri("public://a.jpg"));
        assert!(mapping(MappingType::Gcs).serves_uri("gcs://bucket/a.jpg"));
        assert!(!mapping(MappingType::Gcs).serves_uri("s3://bucket/a.jpg"));
    }

    #[test]
    fn mapping_type_names_and_labels() {
        let names: Vec<&str> = MappingType::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(names, vec!["webfolder", "webproxy", "s3", "gcs"]);
        assert_eq!(MappingType::Gcs.label(), "Google Cloud Storage");
    }

    #[test]
    fn mapping_type_deserializes_lowercase() {
        let m: SourceMapping = toml::from_str(r#"mapping_type = "gcs""#).unwrap();
        assert_eq!(m.mapping_type, MappingType::Gcs);
        assert!(m.https);
    }
}
