use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const PASSWORD_ENV: &str = "QGRID_DB_PASSWORD";
pub const KEYRING_SERVICE: &str = "qgrid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    Disabled,
    #[default]
    Prefer,
    Require,
    VerifyIdentity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordSource {
    #[default]
    EnvVar,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("unknown TLS mode `{0}` (expected disabled, prefer, require or verify-identity)")]
    UnknownTlsMode(String),
    #[error("unknown password source `{0}` (expected env or keyring)")]
    UnknownPasswordSource(String),
}

impl FromStr for TlsMode {
    type Err = ProfileError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "disabled" | "off" => Ok(Self::Disabled),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            "verify-identity" => Ok(Self::VerifyIdentity),
            _ => Err(ProfileError::UnknownTlsMode(raw.to_string())),
        }
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Prefer => "prefer",
            Self::Require => "require",
            Self::VerifyIdentity => "verify-identity",
        })
    }
}

impl FromStr for PasswordSource {
    type Err = ProfileError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "env" | "env-var" | "env_var" => Ok(Self::EnvVar),
            "keyring" => Ok(Self::Keyring),
            _ => Err(ProfileError::UnknownPasswordSource(raw.to_string())),
        }
    }
}

/// Connection details for one session. Built from command-line flags and
/// never written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: Option<String>,
    pub tls_mode: TlsMode,
    pub tls_ca_cert_path: Option<String>,
    pub password_source: PasswordSource,
}

impl ConnectionProfile {
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: 3306,
            user: user.into(),
            database: None,
            tls_mode: TlsMode::Prefer,
            tls_ca_cert_path: None,
            password_source: PasswordSource::EnvVar,
        }
    }

    /// `user@host:port/database`, used as the keyring account and in logs.
    #[must_use]
    pub fn display_target(&self) -> String {
        match &self.database {
            Some(database) => format!("{}@{}:{}/{database}", self.user, self.host, self.port),
            None => format!("{}@{}:{}", self.user, self.host, self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionProfile, PasswordSource, ProfileError, TlsMode};

    #[test]
    fn tls_modes_parse_case_insensitively() {
        assert_eq!("REQUIRE".parse::<TlsMode>(), Ok(TlsMode::Require));
        assert_eq!("verify_identity".parse::<TlsMode>(), Ok(TlsMode::VerifyIdentity));
        assert_eq!(
            "sometimes".parse::<TlsMode>(),
            Err(ProfileError::UnknownTlsMode("sometimes".to_string()))
        );
        assert_eq!(TlsMode::VerifyIdentity.to_string(), "verify-identity");
    }

    #[test]
    fn password_sources_parse() {
        assert_eq!("env".parse::<PasswordSource>(), Ok(PasswordSource::EnvVar));
        assert_eq!("Keyring".parse::<PasswordSource>(), Ok(PasswordSource::Keyring));
        assert!("vault".parse::<PasswordSource>().is_err());
    }

    #[test]
    fn display_target_includes_database_when_set() {
        let mut profile = ConnectionProfile::new("cli", "127.0.0.1", "root");
        assert_eq!(profile.display_target(), "root@127.0.0.1:3306");
        profile.database = Some("shop".to_string());
        assert_eq!(profile.display_target(), "root@127.0.0.1:3306/shop");
    }
}
