//! Error types for Lumen

use thiserror::Error;

/// Failures while fetching or parsing environment package assets
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Failed to fetch '{path}': {reason}")]
    FetchFailed { path: String, reason: String },

    #[error("Failed to decode image '{path}': {reason}")]
    InvalidImage { path: String, reason: String },
}

/// Failures while loading an environment probe
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("No texture matches type={kind} encoding={encoding} format={format}")]
    MissingAsset {
        kind: String,
        encoding: String,
        format: String,
    },

    #[error("Invalid texture dimensions: width {width} and limit size {limit_size} must be powers of two with limit <= width")]
    InvalidDimensions { width: u32, limit_size: u32 },

    #[error("Invalid texture payload '{path}': {reason}")]
    InvalidPayload { path: String, reason: String },

    #[error("An environment load is already in flight on this probe")]
    AlreadyLoading,

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Failures while validating shading configuration input
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid option for {family}: {value} is not one of {allowed:?}")]
    InvalidOption {
        family: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: f32,
        max: f32,
        value: f32,
    },

    #[error("Config parse error: {0}")]
    Parse(String),
}

/// Failures while binding a surface material
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("Unsupported material workflow: {0}")]
    UnsupportedWorkflow(String),
}

/// Umbrella error for callers that drive the whole pipeline
#[derive(Debug, Error)]
pub enum LumenError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Material(#[from] MaterialError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Lumen operations
pub type Result<T> = std::result::Result<T, LumenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_error_lifts_into_probe_error() {
        let err: ProbeError = AssetError::InvalidManifest("missing textures".to_string()).into();
        assert!(matches!(err, ProbeError::Asset(AssetError::InvalidManifest(_))));
        assert_eq!(err.to_string(), "Invalid manifest: missing textures");
    }

    #[test]
    fn test_invalid_option_message_lists_allowed_values() {
        let err = ConfigError::InvalidOption {
            family: "diffuse".to_string(),
            value: "Phong".to_string(),
            allowed: vec!["Lambert".to_string(), "Burley".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("Phong"));
        assert!(message.contains("Lambert"));
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: LumenError = ProbeError::AlreadyLoading.into();
        assert!(matches!(err, LumenError::Probe(ProbeError::AlreadyLoading)));
    }
}
