//! TOML configuration file loading
//!
//! Supports `~/.config/reolink/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct GatewayConfigFile {
    /// Camera address and login
    #[serde(default)]
    pub camera: CameraFileConfig,

    /// Poll timing
    #[serde(default)]
    pub polling: PollingFileConfig,

    /// Control surface
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Camera connection settings
#[derive(Debug, Default, Deserialize)]
pub struct CameraFileConfig {
    /// Hostname or IP, optionally with port
    pub host: Option<String>,

    /// "http" or "https"
    pub protocol: Option<String>,

    pub channel: Option<u8>,
    pub user: Option<String>,
    pub password: Option<String>,

    /// Validate the camera's TLS certificate
    pub ssl_validate: Option<bool>,

    /// Percent-encode the password in request URLs
    pub encode_password: Option<bool>,

    pub timeout_ms: Option<u64>,
}

/// Poll timing
#[derive(Debug, Default, Deserialize)]
pub struct PollingFileConfig {
    /// Seconds between poll cycles while connected
    pub interval_secs: Option<i64>,
}

/// Control surface configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,
    pub bind: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `GatewayConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> GatewayConfigFile {
    let Some(path) = config_file_path() else {
        return GatewayConfigFile::default();
    };

    if !path.exists() {
        return GatewayConfigFile::default();
    }

    match load_from_path(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            GatewayConfigFile::default()
        }
    }
}

/// Parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn load_from_path(path: &Path) -> Result<GatewayConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/reolink/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("reolink").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[camera]
host = "192.168.1.20"
user = "admin"
ssl_validate = true

[polling]
interval_secs = 30
"#
        )
        .unwrap();

        let config = load_from_path(file.path()).unwrap();
        assert_eq!(config.camera.host.as_deref(), Some("192.168.1.20"));
        assert_eq!(config.camera.ssl_validate, Some(true));
        assert_eq!(config.camera.password, None);
        assert_eq!(config.polling.interval_secs, Some(30));
        assert_eq!(config.server.port, None);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camera\nhost = ").unwrap();
        assert!(load_from_path(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("nope.toml")).is_err());
    }
}
