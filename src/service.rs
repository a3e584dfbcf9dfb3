//! The URL-building façade.
//!
//! [`ImgixUrlService`] is what every caller talks to. It combines the source
//! mapping (which path imgix should fetch), the parameters (from a preset, a
//! raw query or an effect chain), the URL builder, and the optional CDN host
//! substitution.
//!
//! "No URL" is a normal outcome: an empty source domain or a file that cannot
//! be mapped returns `None` and callers render without imgix. Only an unknown
//! preset or an invalid effect chain is an error.

use crate::builder::{BuildOptions, ImgixUrlBuilder, UrlBuilder};
use crate::effects::{Effect, TranslateError, translate};
use crate::mapping::SourceMapping;
use crate::params::Parameters;
use crate::presets::{PresetError, PresetStore, parse_query};
use tracing::debug;

/// File types handed to imgix unless configured otherwise.
pub const DEFAULT_FILE_EXTENSIONS: &[&str] = &["png", "gif", "jpg", "jpeg", "svg", "jfif"];

/// A stored file as seen by the service.
pub trait FileSource {
    /// Storage location, e.g. `public://2024/photo.jpg` or `s3://bucket/a.png`.
    fn uri(&self) -> &str;

    /// Absolute public URL of the original file.
    fn public_url(&self) -> &str;

    /// Lowercase extension without the dot.
    fn extension(&self) -> String {
        extension_of(self.uri())
    }
}

/// A plain [`FileSource`] built from its two locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicFile {
    pub uri: String,
    pub public_url: String,
}

impl PublicFile {
    pub fn new(uri: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            public_url: public_url.into(),
        }
    }
}

impl FileSource for PublicFile {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn public_url(&self) -> &str {
        &self.public_url
    }
}

fn extension_of(location: &str) -> String {
    let name = location.rsplit('/').next().unwrap_or(location);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct ImgixUrlService<B = ImgixUrlBuilder> {
    mapping: SourceMapping,
    file_extensions: Vec<String>,
    builder: B,
}

impl ImgixUrlService<ImgixUrlBuilder> {
    pub fn new(mapping: SourceMapping) -> Self {
        Self::with_builder(mapping, ImgixUrlBuilder)
    }
}

impl<B: UrlBuilder> ImgixUrlService<B> {
    pub fn with_builder(mapping: SourceMapping, builder: B) -> Self {
        Self {
            mapping,
            file_extensions: DEFAULT_FILE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            builder,
        }
    }

    /// Restrict [`build_url_for_file`](Self::build_url_for_file) to these
    /// extensions.
    pub fn file_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn mapping(&self) -> &SourceMapping {
        &self.mapping
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Build the imgix URL for `file_url` with `params`.
    pub fn build_url(&self, file_url: &str, params: &Parameters) -> Option<String> {
        if !self.mapping.is_configured() {
            debug!(file_url, "no imgix source domain configured");
            return None;
        }
        let Some(path) = self.mapping.resolve_path(file_url) else {
            debug!(
                file_url,
                mapping_type = %self.mapping.mapping_type,
                "file URL cannot be mapped to an imgix path"
            );
            return None;
        };

        let domain = self.mapping.source_domain.trim();
        let options = BuildOptions {
            use_https: self.mapping.https,
            sign_key: self.mapping.secure_url_token().map(str::to_string),
        };
        let url = self.builder.build(domain, &path, params, &options);

        match self.mapping.external_cdn() {
            Some(cdn) => Some(url.replace(domain, cdn)),
            None => Some(url),
        }
    }

    /// Build with the parameters of the preset named `key`.
    pub fn build_url_for_preset(
        &self,
        presets: &PresetStore,
        file_url: &str,
        key: &str,
    ) -> Result<Option<String>, PresetError> {
        let params = presets.resolve(key)?;
        Ok(self.build_url(file_url, &params))
    }

    /// Build with a raw `a=1&b=2` query, parsed the same way as presets.
    pub fn build_url_for_query(&self, file_url: &str, query: &str) -> Option<String> {
        self.build_url(file_url, &parse_query(query))
    }

    /// Build with the parameters an image-style effect chain translates to.
    pub fn build_url_for_effects(
        &self,
        file_url: &str,
        effects: &[Effect],
    ) -> Result<Option<String>, TranslateError> {
        let params = translate(effects)?;
        Ok(self.build_url(file_url, &params))
    }

    /// Build for a stored file.
    ///
    /// Files with an extension outside the configured list, or stored
    /// somewhere this source cannot reach, get no URL.
    pub fn build_url_for_file(&self, file: &impl FileSource, params: &Parameters) -> Option<String> {
        let extension = file.extension();
        if !self.file_extensions.iter().any(|ext| *ext == extension) {
            debug!(uri = file.uri(), %extension, "extension not handled by imgix");
            return None;
        }
        if !self.mapping.serves_uri(file.uri()) {
            debug!(
                uri = file.uri(),
                mapping_type = %self.mapping.mapping_type,
                "storage location not served by this source"
            );
            return None;
        }
        self.build_url(file.public_url(), params)
    }
}
