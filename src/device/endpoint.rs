//! Camera endpoint description: address, channel, credentials and trust policy

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::{Error, Result};

/// Path of the camera's single CGI endpoint
pub const API_PATH: &str = "/api.cgi";

/// Request timeout used unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// URL scheme used to reach the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(Error::Config(format!(
                "unsupported protocol '{other}' (expected http or https)"
            ))),
        }
    }
}

/// TLS certificate policy for HTTPS connections
///
/// Camera firmware ships self-signed certificates, so the default accepts
/// any certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    #[default]
    AcceptInvalid,
    Validate,
}

impl TrustPolicy {
    #[must_use]
    pub const fn from_validate_flag(validate: bool) -> Self {
        if validate {
            Self::Validate
        } else {
            Self::AcceptInvalid
        }
    }

    #[must_use]
    pub const fn accepts_invalid_certs(self) -> bool {
        matches!(self, Self::AcceptInvalid)
    }
}

/// Camera login sent with every request
#[derive(Debug)]
pub struct Credentials {
    pub user: String,
    password: SecretString,
    /// Percent-encode the password in the query string.
    /// Some firmware revisions reject encoded passwords.
    pub encode_password: bool,
}

impl Credentials {
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: SecretString::from(password.into()),
            encode_password: true,
        }
    }

    #[must_use]
    pub const fn with_encode_password(mut self, encode: bool) -> Self {
        self.encode_password = encode;
        self
    }

    /// Password as it appears in the request query
    #[must_use]
    pub fn password_param(&self) -> String {
        let raw = self.password.expose_secret();
        if self.encode_password {
            urlencoding::encode(raw).into_owned()
        } else {
            raw.to_string()
        }
    }
}

/// Everything needed to address one camera channel
#[derive(Debug)]
pub struct DeviceEndpoint {
    pub protocol: Protocol,
    pub host: String,
    pub channel: u8,
    pub credentials: Credentials,
    pub trust: TrustPolicy,
    pub timeout: Duration,
}

impl DeviceEndpoint {
    #[must_use]
    pub fn new(
        protocol: Protocol,
        host: impl Into<String>,
        channel: u8,
        credentials: Credentials,
    ) -> Self {
        Self {
            protocol,
            host: host.into(),
            channel,
            credentials,
            trust: TrustPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_trust(mut self, trust: TrustPolicy) -> Self {
        self.trust = trust;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL (`scheme://host`) requests are resolved against
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the host does not form a valid URL
    pub fn base_url(&self) -> Result<Url> {
        let raw = format!("{}://{}", self.protocol, self.host.trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| Error::Config(format!("invalid camera address '{raw}': {e}")))
    }
}
