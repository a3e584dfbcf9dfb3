//! Shared test utilities for the imgix-url test suite.
//!
//! Provides configuration fixtures and recording mocks for the two injected
//! collaborators (URL builder and JSON client).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let service = ImgixUrlService::with_builder(web_folder_mapping(), RecordingBuilder::default());
//! service.build_url("https://www.example.com/a.jpg", &Parameters::new());
//!
//! let calls = service.builder().calls();
//! assert_eq!(calls[0].path, "/a.jpg");
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::builder::{BuildOptions, UrlBuilder};
use crate::image_info::{JsonClient, MetadataError};
use crate::mapping::{MappingType, SourceMapping};
use crate::params::Parameters;
use crate::presets::{Preset, PresetStore};

// =========================================================================
// Fixtures
// =========================================================================

/// Web-folder source on `example.imgix.net`, HTTPS, unsigned.
pub fn web_folder_mapping() -> SourceMapping {
    SourceMapping::new("example.imgix.net", MappingType::WebFolder)
}

/// Two presets: `thumb` (square entropy crop) and `hero` (wide, auto format).
pub fn sample_presets() -> PresetStore {
    [
        Preset::new("thumb", "w=150&h=150&fit=crop&crop=entropy"),
        Preset::new("hero", "w=1600&auto=format,compress"),
    ]
    .into_iter()
    .collect()
}

// =========================================================================
// Recording URL builder
// =========================================================================

/// One call to [`RecordingBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuildCall {
    pub domain: String,
    pub path: String,
    pub params: Parameters,
    pub options: BuildOptions,
}

/// URL builder that records its inputs and returns `mock://{domain}{path}`.
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    calls: Mutex<Vec<BuildCall>>,
}

impl RecordingBuilder {
    pub fn calls(&self) -> Vec<BuildCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl UrlBuilder for RecordingBuilder {
    fn build(
        &self,
        domain: &str,
        path: &str,
        params: &Parameters,
        options: &BuildOptions,
    ) -> String {
        self.calls.lock().unwrap().push(BuildCall {
            domain: domain.to_string(),
            path: path.to_string(),
            params: params.clone(),
            options: options.clone(),
        });
        format!("mock://{domain}{path}")
    }
}

// =========================================================================
// Scripted JSON client
// =========================================================================

/// JSON client that replays canned responses in order and records every URL.
///
/// `Err(message)` entries become [`MetadataError::Request`]. Running out of
/// responses is also a request error.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl JsonClient for ScriptedClient {
    fn get(&self, url: &str) -> Result<String, MetadataError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(MetadataError::Request(message)),
            None => Err(MetadataError::Request("no scripted response".into())),
        }
    }
}
