mod adapter;
mod raw;

use std::path::{Path, PathBuf};

pub use warden_types::ServiceConfig;

/// Config file names probed, in order, when none is given explicitly.
pub const DEFAULT_FILENAMES: [&str; 2] = ["warden.toml", ".warden.toml"];

/// Error type for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[cfg(feature = "toml")]
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error(s): {0}")]
    Validation(String),
}

/// Load a service configuration from a file path.
///
/// Relative paths inside the file resolve against the file's directory.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration file cannot be read or parsed.
pub fn load_from_path(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let base = std::path::absolute(path)?
        .parent()
        .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
    parse_auto(&text, path, &base)
}

/// Parse a service configuration, picking the format from the extension.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration string cannot be parsed.
pub fn parse_auto(text: &str, path: &Path, base: &Path) -> Result<ServiceConfig, ConfigError> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml")]
        "toml" => parse_toml(text, base),
        _ => Err(ConfigError::Validation("unknown config extension".into())),
    }
}

/// Parse a service configuration from a TOML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration string cannot be parsed.
#[cfg(feature = "toml")]
pub fn parse_toml(config: &str, base: &Path) -> Result<ServiceConfig, ConfigError> {
    let raw_file = toml::from_str::<raw::RawFile>(config)?;
    raw_file.to_config(base)
}

/// First of [`DEFAULT_FILENAMES`] that exists in `dir`.
#[must_use]
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}
