//! Waiting for a server announcement

use crate::ClientError;
use log::{info, warn};
use shared::discovery::{self, DiscoveryError};
use shared::IpVersion;
use std::net::IpAddr;
use tokio::net::UdpSocket;

/// Joins the discovery group for `version` and returns the first announced
/// server address. The socket is dropped, leaving the group, on return.
pub async fn listen_for_server(version: IpVersion, port: u16) -> Result<IpAddr, ClientError> {
    let socket = discovery::listener_socket(version, port)?;
    info!(
        "Listening for {} announcements on {}",
        version,
        discovery::group_addr(version, port)
    );
    wait_for_announcement(&socket, version).await
}

/// Receives datagrams until one carries a usable address of `version`.
pub async fn wait_for_announcement(
    socket: &UdpSocket,
    version: IpVersion,
) -> Result<IpAddr, ClientError> {
    let mut buf = [0u8; 256];

    loop {
        let (len, from) = socket
            .recv_from(&mut buf)
            .await
            .map_err(DiscoveryError::Recv)?;

        match discovery::parse_announcement(&buf[..len], version) {
            Ok(addr) => {
                info!("Server at {} announced by {}", addr, from);
                return Ok(addr);
            }
            Err(e) => warn!("Ignoring announcement from {}: {}", from, e),
        }
    }
}
