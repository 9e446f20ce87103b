use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use tracing::info;

use crate::error::{Error, Result};

pub const LEASES_ENV_VAR: &str = "DNSMASQ_LEASES";
pub const DEFAULT_LEASES_FILE: &str = "/var/lib/misc/dnsmasq.leases";
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// How many fields a lease line must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Exactly five fields.
    Strict,
    /// Four or five fields; a missing client ID is treated as unknown.
    #[default]
    Lenient,
}

impl ParseMode {
    pub fn accepts_field_count(self, count: usize) -> bool {
        match self {
            ParseMode::Strict => count == 5,
            ParseMode::Lenient => (4..=5).contains(&count),
        }
    }

    pub fn expected_fields(self) -> &'static str {
        match self {
            ParseMode::Strict => "5",
            ParseMode::Lenient => "4 or 5",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub leases_file: PathBuf,
    pub listen_address: SocketAddr,
    pub parse_mode: ParseMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            leases_file: PathBuf::from(DEFAULT_LEASES_FILE),
            listen_address: SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::UNSPECIFIED,
                DEFAULT_LISTEN_PORT,
            )),
            parse_mode: ParseMode::default(),
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration using `lookup` to read variables.
    ///
    /// An unset or empty `DNSMASQ_LEASES` falls back to the default path.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        match lookup(LEASES_ENV_VAR).filter(|value| !value.is_empty()) {
            Some(path) => {
                info!(
                    "Using lease file path from environment variable {}: {}",
                    LEASES_ENV_VAR, path
                );
                config.leases_file = PathBuf::from(path);
            }
            None => {
                info!(
                    "Environment variable {} not set, using default path: {}",
                    LEASES_ENV_VAR, DEFAULT_LEASES_FILE
                );
            }
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.leases_file.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "leases_file must not be empty".to_string(),
            ));
        }

        if self.leases_file.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "leases_file {} is a directory",
                self.leases_file.display()
            )));
        }

        Ok(())
    }
}
