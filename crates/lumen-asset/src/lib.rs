//! Lumen Asset - Environment package manifests
//!
//! This crate parses the declarative `config.json` shipped with every
//! environment package, answers `(type, encoding, format)` lookups, and
//! provides the fetch primitive used to pull manifests and payloads from
//! disk, memory, or HTTP.

mod fetch;
mod manifest;

pub use fetch::{join_url, AssetFetcher, FileFetcher, HttpFetcher, MemoryFetcher};
pub use manifest::{AssetManifest, LightDescriptor, TextureDescriptor, MANIFEST_FILE};
