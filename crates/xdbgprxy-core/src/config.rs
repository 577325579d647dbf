//! Configuration resolution for `XdbgPrxy`.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Settings file (`--config path/to/settings.json`)
//! 3. Environment variables and CLI arguments (highest priority, both
//!    surfaced through [`ConfigOverrides`])
//!
//! The resolved [`ProxyConfig`] is built once at startup and passed by
//! reference; nothing in the relay reads global state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::Path;

use crate::error::{Error, Result};

/// Default host for both the IDE and the listener.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default Xdebug 3 client port.
pub const DEFAULT_PORT: u16 = 9003;

/// A TCP `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Whether dialing `self` could land on a listener bound at `listen`.
    ///
    /// Best effort without DNS: hosts match literally (ignoring case), or
    /// both are local: `localhost`, a loopback address or the wildcard
    /// address. A wildcard listener is
    /// also reachable through the machine's own LAN address, which is not
    /// detected here.
    pub fn may_reach(&self, listen: &Self) -> bool {
        if self.port != listen.port {
            return false;
        }
        if self.host.eq_ignore_ascii_case(&listen.host) {
            return true;
        }
        host_kind(&self.host) != HostKind::Other && host_kind(&listen.host) != HostKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostKind {
    Loopback,
    Wildcard,
    Other,
}

fn host_kind(host: &str) -> HostKind {
    if host.eq_ignore_ascii_case("localhost") {
        return HostKind::Loopback;
    }
    match host.trim_matches(['[', ']']).parse::<IpAddr>() {
        Ok(ip) if ip.is_loopback() => HostKind::Loopback,
        Ok(ip) if ip.is_unspecified() => HostKind::Wildcard,
        _ => HostKind::Other,
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Complete proxy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Where the IDE debugger is listening.
    pub ide: Endpoint,
    /// Where PHP connects to reach the proxy.
    pub listen: Endpoint,
    /// Print full PHP -> IDE payloads instead of byte counts.
    pub verbose: bool,
    /// Disable ANSI colors on the console.
    pub no_color: bool,
    /// Relay one connection at a time instead of spawning a task per pair.
    pub sequential: bool,
}

/// Highest-priority values, collected from environment variables and CLI
/// flags. `None`/`false` leaves the lower layer untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ide_host: Option<String>,
    pub ide_port: Option<u16>,
    pub listen_host: Option<String>,
    pub listen_port: Option<u16>,
    pub verbose: bool,
    pub no_color: bool,
    pub sequential: bool,
}

impl ProxyConfig {
    /// Check the configuration is usable before any socket is touched.
    pub fn validate(&self) -> Result<()> {
        if self.ide.host.trim().is_empty() {
            return Err(Error::Config("IDE host must not be empty".to_string()));
        }
        if self.listen.host.trim().is_empty() {
            return Err(Error::Config("Listen host must not be empty".to_string()));
        }
        if self.ide.may_reach(&self.listen) {
            return Err(Error::Config(format!(
                "Listen address {} is the same as the IDE address {}; \
                 change --listen-port or --ide-port so the proxy does not dial itself",
                self.listen, self.ide
            )));
        }
        Ok(())
    }
}

/// Resolve configuration from defaults, an optional settings file and
/// overrides, then validate the result.
pub fn resolve_config(settings: Option<&Path>, overrides: ConfigOverrides) -> Result<ProxyConfig> {
    let mut config = match settings {
        Some(path) => load_config_file(path)?,
        None => ProxyConfig::default(),
    };
    apply_overrides(&mut config, overrides);
    config.validate()?;
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<ProxyConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn apply_overrides(config: &mut ProxyConfig, overrides: ConfigOverrides) {
    if let Some(host) = overrides.ide_host {
        config.ide.host = host;
    }
    if let Some(port) = overrides.ide_port {
        config.ide.port = port;
    }
    if let Some(host) = overrides.listen_host {
        config.listen.host = host;
    }
    if let Some(port) = overrides.listen_port {
        config.listen.port = port;
    }
    config.verbose |= overrides.verbose;
    config.no_color |= overrides.no_color;
    config.sequential |= overrides.sequential;
}
