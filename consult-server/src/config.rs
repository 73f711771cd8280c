//! Server configuration, loaded from environment variables.

use consult_core::IceServerConfig;
use consult_core::utils::{DEFAULT_MAX_ROOM_MEMBERS, default_stun_urls};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP/WebSocket bind address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Hard cap on room membership (default: 2).
    pub max_room_members: usize,

    /// Tell the sender when a relayed signal reached nobody.
    pub report_delivery_failures: bool,

    /// STUN/TURN servers handed to every client in `welcome`.
    pub ice_servers: Vec<IceServerConfig>,
}

/// TURN credentials are redacted.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ice_urls: Vec<&String> = self.ice_servers.iter().flat_map(|s| &s.urls).collect();
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("max_room_members", &self.max_room_members)
            .field("report_delivery_failures", &self.report_delivery_failures)
            .field("ice_servers", &ice_urls)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            max_room_members: DEFAULT_MAX_ROOM_MEMBERS,
            report_delivery_failures: true,
            ice_servers: vec![IceServerConfig {
                urls: default_stun_urls(),
                username: None,
                credential: None,
            }],
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_address = vars
            .get("CONSULT_BIND_ADDRESS")
            .cloned()
            .unwrap_or(defaults.bind_address);

        let max_room_members = match vars.get("CONSULT_MAX_ROOM_MEMBERS") {
            Some(raw) => {
                let value: usize = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    name: "CONSULT_MAX_ROOM_MEMBERS",
                    reason: format!("'{raw}' is not a number"),
                })?;
                if value < 2 {
                    return Err(ConfigError::InvalidValue {
                        name: "CONSULT_MAX_ROOM_MEMBERS",
                        reason: "a call needs at least two members".to_string(),
                    });
                }
                value
            }
            None => defaults.max_room_members,
        };

        let report_delivery_failures = match vars.get("CONSULT_REPORT_DELIVERY_FAILURES") {
            Some(raw) => parse_bool(raw).ok_or_else(|| ConfigError::InvalidValue {
                name: "CONSULT_REPORT_DELIVERY_FAILURES",
                reason: format!("'{raw}' is not a boolean"),
            })?,
            None => defaults.report_delivery_failures,
        };

        let stun_urls = vars
            .get("CONSULT_STUN_URLS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(default_stun_urls);

        let mut ice_servers = Vec::new();
        if !stun_urls.is_empty() {
            ice_servers.push(IceServerConfig {
                urls: stun_urls,
                username: None,
                credential: None,
            });
        }
        if let Some(turn_url) = vars.get("TURN_URL") {
            ice_servers.push(IceServerConfig {
                urls: vec![turn_url.clone()],
                username: vars.get("TURN_USERNAME").cloned(),
                credential: vars.get("TURN_CREDENTIAL").cloned(),
            });
        }

        Ok(Self {
            bind_address,
            max_room_members,
            report_delivery_failures,
            ice_servers,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
