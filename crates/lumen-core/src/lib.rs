//! Lumen Core - Foundational types for the Lumen IBL pipeline
//!
//! This crate provides the types that all other Lumen crates depend on:
//! - Error taxonomy (`AssetError`, `ProbeError`, `ConfigError`, `MaterialError`)
//! - `ContentHash` - SHA-256 based content hashing
//! - `Vec3`, `Color` - manifest-facing value types
//! - `Shared` - single-writer handles read by many materials

mod error;
mod hash;
mod shared;
mod types;

pub use error::{AssetError, ConfigError, LumenError, MaterialError, ProbeError, Result};
pub use hash::ContentHash;
pub use shared::Shared;
pub use types::{Color, Vec3};
