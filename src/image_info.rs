//! Source-image metadata through imgix's JSON output format.
//!
//! Requesting any imgix URL with `fm=json` returns the original image's
//! metadata instead of pixels. The lookup goes through an injected
//! [`JsonClient`] so the crate itself never opens a socket. Failures are
//! logged and reported as `None`; there are no retries.

use crate::builder::UrlBuilder;
use crate::effects::{Effect, transform_dimensions};
use crate::params::Parameters;
use crate::service::ImgixUrlService;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Request(String),
    #[error("metadata response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fetches a URL and returns the response body.
pub trait JsonClient {
    fn get(&self, url: &str) -> Result<String, MetadataError>;
}

/// The subset of imgix's JSON metadata this crate uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(rename = "PixelWidth")]
    pub width: u32,
    #[serde(rename = "PixelHeight")]
    pub height: u32,
    #[serde(rename = "Content-Type", default)]
    pub content_type: Option<String>,
    #[serde(rename = "Content-Length", default, with = "lenient_length")]
    pub content_length: Option<u64>,
}

impl ImageInfo {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the derivative an effect chain produces from this image.
    pub fn derivative_dimensions(&self, effects: &[Effect]) -> Option<(u32, u32)> {
        transform_dimensions(effects, self.dimensions())
    }
}

/// imgix reports `Content-Length` as a string; accept either form.
mod lenient_length {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Length {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(n) => serializer.serialize_str(&n.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        let length = Option::<Length>::deserialize(deserializer)?;
        Ok(match length {
            Some(Length::Number(n)) => Some(n),
            Some(Length::Text(s)) => s.trim().parse().ok(),
            None => None,
        })
    }
}

/// The `fm=json` URL for a file, or `None` when no imgix URL can be built.
pub fn metadata_url<B: UrlBuilder>(service: &ImgixUrlService<B>, file_url: &str) -> Option<String> {
    service.build_url(file_url, &Parameters::new().with("fm", "json"))
}

/// Look up metadata for the original behind `file_url`.
pub fn fetch_image_info<B: UrlBuilder>(
    service: &ImgixUrlService<B>,
    client: &impl JsonClient,
    file_url: &str,
) -> Option<ImageInfo> {
    let url = metadata_url(service, file_url)?;
    match client.get(&url).and_then(|body| decode(&body)) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!(%url, error = %e, "imgix metadata lookup failed");
            None
        }
    }
}

fn decode(body: &str) -> Result<ImageInfo, MetadataError> {
    Ok(serde_json::from_str(body)?)
}
