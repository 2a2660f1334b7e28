use core::fmt::{Debug, Display};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "booking.toml";
pub const ENV_PREFIX: &str = "BOOKING_";

/// Minimum length of `cookie_secret`, the signing key is derived from it.
pub const MIN_COOKIE_SECRET_LEN: usize = 32;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Without a database url the bookings only live in memory.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default)]
    pub cookie_secret: Option<String>,
    /// How long the booking confirmation stays on screen.
    #[serde(default = "default_success_display_ms")]
    pub success_display_ms: u64,
    #[serde(default = "default_event_title")]
    pub event_title: String,
}

fn default_listen() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(0, 0, 0, 0), 3000))
}

fn default_admin_password() -> String {
    "0000".to_owned()
}

const fn default_success_display_ms() -> u64 {
    2500
}

fn default_event_title() -> String {
    "Product Demo Day".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            database_url: None,
            admin_password: default_admin_password(),
            cookie_secret: None,
            success_display_ms: default_success_display_ms(),
            event_title: default_event_title(),
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.admin_password.is_empty() {
            return Err(ConfigError::EmptyAdminPassword);
        }
        if let Some(secret) = &self.cookie_secret {
            if secret.len() < MIN_COOKIE_SECRET_LEN {
                return Err(ConfigError::CookieSecretTooShort(secret.len()));
            }
        }
        Ok(self)
    }
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
    #[error("admin_password must not be empty")]
    EmptyAdminPassword,
    #[error("cookie_secret must be at least {MIN_COOKIE_SECRET_LEN} bytes long but has {0}")]
    CookieSecretTooShort(usize),
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

pub fn get_config() -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    config.validate()
}
