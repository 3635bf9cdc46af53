//! Configuration management for the Reolink gateway
//!
//! Sources are layered: environment variables override the TOML file,
//! which overrides built-in defaults.

pub mod file;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::device::{Credentials, DEFAULT_TIMEOUT, DeviceEndpoint, Protocol, TrustPolicy};
use crate::{Error, Result};

/// Default poll interval in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 10;

/// Default control surface port
pub const DEFAULT_API_PORT: u16 = 18790;

/// Gateway configuration
#[derive(Debug)]
pub struct Config {
    /// Camera to talk to
    pub endpoint: DeviceEndpoint,

    /// Seconds between poll cycles while connected; clamped by the scheduler
    pub poll_interval_secs: i64,

    /// Control surface configuration
    pub server: ServerConfig,
}

/// HTTP control surface configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_API_PORT,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if required camera settings are missing or invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if required camera settings are missing or invalid
    pub fn from_sources(
        fc: file::GatewayConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let camera = fc.camera;

        // Camera (env > toml), no defaults for address and login
        let host = env("REOLINK_HOST")
            .or(camera.host)
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| Error::Config("camera host is required (REOLINK_HOST)".to_string()))?;
        let user = env("REOLINK_USER")
            .or(camera.user)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("camera user is required (REOLINK_USER)".to_string()))?;
        let password = env("REOLINK_PASSWORD")
            .or(camera.password)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Error::Config("camera password is required (REOLINK_PASSWORD)".to_string())
            })?;

        let protocol = env("REOLINK_PROTOCOL")
            .or(camera.protocol)
            .map(|p| p.parse::<Protocol>())
            .transpose()?
            .unwrap_or_default();

        let channel = match env("REOLINK_CHANNEL") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid camera channel '{raw}'")))?,
            None => camera.channel.unwrap_or(0),
        };

        let ssl_validate = env("REOLINK_SSL_VALIDATE")
            .map(|v| parse_flag(&v))
            .or(camera.ssl_validate)
            .unwrap_or(false);
        let encode_password = env("REOLINK_ENCODE_PASSWORD")
            .map(|v| parse_flag(&v))
            .or(camera.encode_password)
            .unwrap_or(true);
        let timeout = env("REOLINK_TIMEOUT_MS")
            .and_then(|v| v.trim().parse().ok())
            .or(camera.timeout_ms)
            .map_or(DEFAULT_TIMEOUT, Duration::from_millis);

        let credentials = Credentials::new(user, password).with_encode_password(encode_password);
        let endpoint = DeviceEndpoint::new(protocol, host, channel, credentials)
            .with_trust(TrustPolicy::from_validate_flag(ssl_validate))
            .with_timeout(timeout);

        // Polling (env > toml > default); out-of-range values are clamped later
        let poll_interval_secs = env("REOLINK_POLL_INTERVAL")
            .and_then(|v| v.trim().parse().ok())
            .or(fc.polling.interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        // Control surface (env > toml > default)
        let defaults = ServerConfig::default();
        let server = ServerConfig {
            port: env("REOLINK_API_PORT")
                .and_then(|v| v.trim().parse().ok())
                .or(fc.server.port)
                .unwrap_or(defaults.port),
            bind: match env("REOLINK_API_BIND").or(fc.server.bind) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid bind address '{raw}'")))?,
                None => defaults.bind,
            },
        };

        Ok(Self {
            endpoint,
            poll_interval_secs,
            server,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::file::{CameraFileConfig, GatewayConfigFile, PollingFileConfig};
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal_env() -> impl Fn(&str) -> Option<String> {
        env_from(&[
            ("REOLINK_HOST", "192.168.1.20"),
            ("REOLINK_USER", "admin"),
            ("REOLINK_PASSWORD", "secret"),
        ])
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_sources(GatewayConfigFile::default(), minimal_env()).unwrap();
        assert_eq!(config.endpoint.protocol, Protocol::Https);
        assert_eq!(config.endpoint.channel, 0);
        assert!(config.endpoint.trust.accepts_invalid_certs());
        assert!(config.endpoint.credentials.encode_password);
        assert_eq!(config.endpoint.timeout, Duration::from_millis(4000));
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(
            config.server.socket_addr(),
            "127.0.0.1:18790".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn env_overrides_file() {
        let fc = GatewayConfigFile {
            camera: CameraFileConfig {
                host: Some("file-host".to_string()),
                user: Some("file-user".to_string()),
                password: Some("file-pass".to_string()),
                channel: Some(3),
                ..CameraFileConfig::default()
            },
            polling: PollingFileConfig {
                interval_secs: Some(60),
            },
            ..GatewayConfigFile::default()
        };
        let env = env_from(&[("REOLINK_HOST", "env-host"), ("REOLINK_POLL_INTERVAL", "5")]);

        let config = Config::from_sources(fc, env).unwrap();
        assert_eq!(config.endpoint.host, "env-host");
        assert_eq!(config.endpoint.credentials.user, "file-user");
        assert_eq!(config.endpoint.channel, 3);
        assert_eq!(config.poll_interval_secs, 5);
    }

    #[test]
    fn missing_host_is_rejected() {
        let env = env_from(&[("REOLINK_USER", "admin"), ("REOLINK_PASSWORD", "x")]);
        let err = Config::from_sources(GatewayConfigFile::default(), env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let env = env_from(&[("REOLINK_HOST", "cam")]);
        assert!(Config::from_sources(GatewayConfigFile::default(), env).is_err());
    }

    #[test]
    fn empty_password_is_rejected() {
        let env = env_from(&[
            ("REOLINK_HOST", "cam"),
            ("REOLINK_USER", "admin"),
            ("REOLINK_PASSWORD", ""),
        ]);
        let err = Config::from_sources(GatewayConfigFile::default(), env).unwrap_err();
        assert!(err.to_string().contains("password"), "{err}");

        let fc = GatewayConfigFile {
            camera: CameraFileConfig {
                host: Some("cam".to_string()),
                user: Some("admin".to_string()),
                password: Some(String::new()),
                ..CameraFileConfig::default()
            },
            ..GatewayConfigFile::default()
        };
        assert!(Config::from_sources(fc, env_from(&[])).is_err());
    }

    #[test]
    fn unsupported_protocol_is_rejected() {
        let env = env_from(&[
            ("REOLINK_HOST", "cam"),
            ("REOLINK_USER", "admin"),
            ("REOLINK_PASSWORD", "x"),
            ("REOLINK_PROTOCOL", "rtsp"),
        ]);
        assert!(Config::from_sources(GatewayConfigFile::default(), env).is_err());
    }

    #[test]
    fn out_of_range_interval_is_kept_for_clamping() {
        let env = env_from(&[
            ("REOLINK_HOST", "cam"),
            ("REOLINK_USER", "admin"),
            ("REOLINK_PASSWORD", "x"),
            ("REOLINK_POLL_INTERVAL", "-3"),
        ]);
        let config = Config::from_sources(GatewayConfigFile::default(), env).unwrap();
        assert_eq!(config.poll_interval_secs, -3);
    }

    #[test]
    fn flags_parse_from_env() {
        let env = env_from(&[
            ("REOLINK_HOST", "cam"),
            ("REOLINK_USER", "admin"),
            ("REOLINK_PASSWORD", "x"),
            ("REOLINK_SSL_VALIDATE", "true"),
            ("REOLINK_ENCODE_PASSWORD", "0"),
        ]);
        let config = Config::from_sources(GatewayConfigFile::default(), env).unwrap();
        assert!(!config.endpoint.trust.accepts_invalid_certs());
        assert!(!config.endpoint.credentials.encode_password);
    }
}
