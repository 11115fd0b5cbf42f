//! Server configuration.

use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

/// Environment variable overriding the bind address.
pub const HOST_VAR: &str = "DEBUG_BRIDGE_HOST";

/// Environment variable overriding the listen port.
pub const PORT_VAR: &str = "DEBUG_BRIDGE_PORT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
}

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

const fn default_port() -> u16 {
    8001
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source. Unparseable values fall back
    /// to the default with a warning.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: parse_or(&lookup, HOST_VAR, default_host()),
            port: parse_or(&lookup, PORT_VAR, default_port()),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        tracing::warn!("Ignoring {key}={raw:?} ({e}); using {default}");
        default
    })
}
