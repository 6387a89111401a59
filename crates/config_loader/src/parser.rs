//! Config parsing
//!
//! TOML is the primary format. JSON is accepted for generated configs.
//! Parse errors name the file they came from when there is one.

use std::path::Path;

use contracts::{BridgeConfig, ContractError};

type ParseFailure = (String, Box<dyn std::error::Error + Send + Sync>);

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// Parse `content` as `format`.
///
/// `origin` is the file the content was read from, if any.
pub fn parse(
    content: &str,
    format: ConfigFormat,
    origin: Option<&Path>,
) -> Result<BridgeConfig, ContractError> {
    let parsed: Result<BridgeConfig, ParseFailure> = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| (e.to_string(), e.into())),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| (e.to_string(), e.into())),
    };

    parsed.map_err(|(detail, source)| {
        let message = match origin {
            Some(path) => format!("{}: {} parse error: {detail}", path.display(), format.name()),
            None => format!("{} parse error: {detail}", format.name()),
        };
        ContractError::ConfigParse {
            message,
            source: Some(source),
        }
    })
}
