//! # imgix-url
//!
//! Builds imgix CDN URLs for stored files. Given a file's public URL, a
//! source configuration and either a named preset or an image-style effect
//! chain, it produces the exact imgix request URL, deterministically and
//! without network access.
//!
//! # Data Flow
//!
//! ```text
//! effect chain ──translate──┐
//!                           ├──▶ Parameters ──┐
//! preset key ───resolve─────┘                 │
//!                                             ▼
//! file URL ──SourceMapping::resolve_path──▶ path ──UrlBuilder──▶ URL ──CDN swap──▶ result
//! ```
//!
//! Every stage is a pure function over immutable inputs, so a service can be
//! shared freely between threads.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`params`] | Flat imgix query-parameter mapping shared by every stage |
//! | [`effects`] | Image-style effects, validation, forward/reverse codec, chain translation, output dimensions |
//! | [`mapping`] | Source mapping types and file URL → imgix path resolution |
//! | [`presets`] | Named presets: query parsing, lookup, create/update/delete |
//! | [`builder`] | The URL builder seam and the stock imgix builder (encoding, signing) |
//! | [`service`] | [`ImgixUrlService`](service::ImgixUrlService), the façade callers use |
//! | [`image_info`] | Optional metadata lookup via `fm=json` through an injected client |
//! | [`config`] | Layered `imgix.toml` loading, validation and preset persistence |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## "No URL" Is Not An Error
//!
//! An empty source domain or a file URL that cannot be mapped yields `None`.
//! A site without imgix configured should render without imgix everywhere,
//! not fail. Only caller mistakes are errors: an unknown preset key
//! ([`presets::PresetError::NotFound`]) or an invalid effect
//! ([`effects::EffectError`]).
//!
//! ## A Closed Effect Set
//!
//! Effects are one enum and the codec is one `match` in each direction. The
//! forward and reverse mappings stay exhaustive and can be read side by side.
//!
//! ## Verbatim Presets
//!
//! Preset queries are split on `&` and the first `=` of each segment, nothing
//! more. Administrators write imgix syntax; the crate does not second-guess it.
//!
//! ## Blunt CDN Substitution
//!
//! `external_cdn` replaces every occurrence of the source domain in the built
//! URL, path included. Existing deployments rely on that exact behaviour.

pub mod builder;
pub mod config;
pub mod effects;
pub mod image_info;
pub mod mapping;
pub mod output;
pub mod params;
pub mod presets;
pub mod service;

pub use builder::{BuildOptions, ImgixUrlBuilder, UrlBuilder};
pub use effects::{Effect, params_to_effects, translate};
pub use mapping::{MappingType, SourceMapping};
pub use params::{ParamValue, Parameters};
pub use presets::{Preset, PresetError, PresetStore};
pub use service::{FileSource, ImgixUrlService, PublicFile};

#[cfg(test)]
pub(crate) mod test_helpers;
