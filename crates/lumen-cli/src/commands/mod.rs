//! CLI command implementations

pub mod defines;
pub mod inspect;
pub mod lut;
pub mod probe;

use crate::config::LumenConfig;
use anyhow::Result;

/// Whether a package base must be fetched over HTTP
pub fn is_remote(base: &str) -> bool {
    base.starts_with("http://") || base.starts_with("https://")
}

/// Resolve the package argument, falling back to the configured default
pub fn package_base(config: &LumenConfig, package: Option<&str>) -> Result<String> {
    config.package_url(package).ok_or_else(|| {
        if config.packages.is_empty() {
            anyhow::anyhow!("No environment package given and no [environment] default configured")
        } else {
            anyhow::anyhow!(
                "No environment package given; configured packages: {}",
                config.packages.join(", ")
            )
        }
    })
}
