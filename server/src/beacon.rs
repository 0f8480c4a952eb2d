//! Periodic multicast announcement of the server's address
//!
//! Every tick the beacon re-resolves the local address and sends it to the
//! discovery group. A failed tick is logged and skipped; the loop itself
//! runs for as long as the process does.

use crate::resolver::{AddressResolver, ResolveError};
use log::{debug, info, warn};
use shared::discovery::{self, DiscoveryError};
use shared::{IpVersion, DEFAULT_PORT};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{interval, MissedTickBehavior};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum BeaconError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to send announcement: {0}")]
    Send(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct BeaconConfig {
    pub version: IpVersion,
    pub port: u16,
    pub interval: Duration,
    /// Overrides the multicast group as destination.
    pub target: Option<SocketAddr>,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            version: IpVersion::V4,
            port: DEFAULT_PORT,
            interval: DEFAULT_INTERVAL,
            target: None,
        }
    }
}

pub struct Beacon<R> {
    socket: UdpSocket,
    target: SocketAddr,
    version: IpVersion,
    interval: Duration,
    resolver: R,
}

impl<R: AddressResolver> Beacon<R> {
    /// Creates the sending socket. Failing here is a startup error.
    pub fn new(config: &BeaconConfig, resolver: R) -> Result<Self, DiscoveryError> {
        let socket = discovery::beacon_socket(config.version)?;
        let target = config
            .target
            .unwrap_or_else(|| discovery::group_addr(config.version, config.port));

        Ok(Self {
            socket,
            target,
            version: config.version,
            interval: config.interval,
            resolver,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Resolves the current address and sends it once.
    pub async fn announce_once(&self) -> Result<IpAddr, BeaconError> {
        let addr = self.resolver.resolve(self.version)?;
        let payload = discovery::encode_announcement(&addr);
        self.socket.send_to(&payload, self.target).await?;
        Ok(addr)
    }

    pub async fn run(self) {
        info!(
            "Announcing {} address to {} every {:?}",
            self.version, self.target, self.interval
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match self.announce_once().await {
                Ok(addr) => debug!("Announced {} to {}", addr, self.target),
                Err(e) => warn!("Beacon tick failed: {}", e),
            }
        }
    }
}
