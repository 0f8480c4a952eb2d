//! Runtime settings for the server process

use crate::beacon::{BeaconConfig, DEFAULT_INTERVAL};
use crate::rankings::DEFAULT_CAPACITY;
use shared::{IpVersion, DEFAULT_PORT};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RANKINGS_PATH: &str = "blackjack_rankings.txt";
pub const DEFAULT_MAX_SESSIONS: usize = 10;

/// Behavior of a single player session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Ask again instead of accepting an empty name.
    pub reject_empty_names: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub version: IpVersion,
    /// Address the session listener binds to; the wildcard of `version` unless overridden.
    pub bind_addr: IpAddr,
    pub port: u16,
    pub rankings_path: PathBuf,
    pub max_sessions: usize,
    /// Capacity of the rankings table.
    pub max_players: usize,
    pub beacon_interval: Duration,
    /// Announce this address instead of resolving one from the interfaces.
    pub advertise: Option<IpAddr>,
    pub session: SessionConfig,
}

impl ServerConfig {
    pub fn for_version(version: IpVersion) -> Self {
        Self {
            version,
            bind_addr: version.unspecified(),
            port: DEFAULT_PORT,
            rankings_path: PathBuf::from(DEFAULT_RANKINGS_PATH),
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_players: DEFAULT_CAPACITY,
            beacon_interval: DEFAULT_INTERVAL,
            advertise: None,
            session: SessionConfig::default(),
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn beacon(&self) -> BeaconConfig {
        BeaconConfig {
            version: self.version,
            port: self.port,
            interval: self.beacon_interval,
            target: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::for_version(IpVersion::V4)
    }
}
