//! Multicast discovery primitives shared by the beacon and the listener.
//!
//! The beacon sends the server's address as plain text (plus one trailing
//! NUL) to a fixed group per address family. Packets never leave the local
//! link: the IPv4 TTL and the IPv6 hop limit are both pinned to 1.

use crate::IpVersion;
use log::debug;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;
use tokio::net::UdpSocket;

pub const IPV4_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);
pub const IPV6_GROUP: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1);
pub const MULTICAST_HOPS: u32 = 1;
/// Longest textual address (`INET6_ADDRSTRLEN`).
pub const MAX_ANNOUNCEMENT_LEN: usize = 46;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to set up {version} discovery socket: {source}")]
    Socket {
        version: IpVersion,
        #[source]
        source: io::Error,
    },
    #[error("discovery receive failed: {0}")]
    Recv(#[source] io::Error),
    #[error("announcement is not valid UTF-8")]
    NotUtf8,
    #[error("announcement of {0} bytes is too long")]
    TooLong(usize),
    #[error("announcement {text:?} is not an {version} address")]
    BadAddress { text: String, version: IpVersion },
}

pub fn multicast_group(version: IpVersion) -> IpAddr {
    match version {
        IpVersion::V4 => IpAddr::V4(IPV4_GROUP),
        IpVersion::V6 => IpAddr::V6(IPV6_GROUP),
    }
}

pub fn group_addr(version: IpVersion, port: u16) -> SocketAddr {
    SocketAddr::new(multicast_group(version), port)
}

pub fn encode_announcement(addr: &IpAddr) -> Vec<u8> {
    let mut payload = addr.to_string().into_bytes();
    payload.push(0);
    payload
}

/// Parses a datagram payload into an address of the expected family.
/// Trailing NULs and surrounding whitespace are ignored.
pub fn parse_announcement(payload: &[u8], version: IpVersion) -> Result<IpAddr, DiscoveryError> {
    let end = payload
        .iter()
        .position(|b| *b == 0)
        .unwrap_or(payload.len());
    let text = std::str::from_utf8(&payload[..end])
        .map_err(|_| DiscoveryError::NotUtf8)?
        .trim();

    if text.len() > MAX_ANNOUNCEMENT_LEN {
        return Err(DiscoveryError::TooLong(text.len()));
    }

    match text.parse::<IpAddr>() {
        Ok(addr) if version.matches(&addr) => Ok(addr),
        _ => Err(DiscoveryError::BadAddress {
            text: text.to_string(),
            version,
        }),
    }
}

fn domain(version: IpVersion) -> Domain {
    match version {
        IpVersion::V4 => Domain::IPV4,
        IpVersion::V6 => Domain::IPV6,
    }
}

fn into_tokio(socket: Socket) -> io::Result<UdpSocket> {
    socket.set_nonblocking(true)?;
    let socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(socket)
}

/// Creates the sending socket for the beacon, bound to an ephemeral port
/// with TTL / hop limit 1.
pub fn beacon_socket(version: IpVersion) -> Result<UdpSocket, DiscoveryError> {
    let build = || -> io::Result<UdpSocket> {
        let socket = Socket::new(domain(version), Type::DGRAM, Some(Protocol::UDP))?;
        match version {
            IpVersion::V4 => socket.set_multicast_ttl_v4(MULTICAST_HOPS)?,
            IpVersion::V6 => {
                socket.set_only_v6(true)?;
                socket.set_multicast_hops_v6(MULTICAST_HOPS)?;
            }
        }
        let local = SocketAddr::new(version.unspecified(), 0);
        socket.bind(&SockAddr::from(local))?;
        into_tokio(socket)
    };

    build().map_err(|source| DiscoveryError::Socket { version, source })
}

/// Creates the receiving socket: bound to `port` on the unspecified address
/// with address reuse, and joined to the family's group.
pub fn listener_socket(version: IpVersion, port: u16) -> Result<UdpSocket, DiscoveryError> {
    let build = || -> io::Result<UdpSocket> {
        let socket = Socket::new(domain(version), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        if version == IpVersion::V6 {
            socket.set_only_v6(true)?;
        }

        let local = SocketAddr::new(version.unspecified(), port);
        socket.bind(&SockAddr::from(local))?;

        match version {
            IpVersion::V4 => socket.join_multicast_v4(&IPV4_GROUP, &Ipv4Addr::UNSPECIFIED)?,
            IpVersion::V6 => socket.join_multicast_v6(&IPV6_GROUP, 0)?,
        }
        debug!("Joined {} on port {}", multicast_group(version), port);

        into_tokio(socket)
    };

    build().map_err(|source| DiscoveryError::Socket { version, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_per_family() {
        assert_eq!(multicast_group(IpVersion::V4).to_string(), "239.255.255.250");
        assert_eq!(multicast_group(IpVersion::V6).to_string(), "ff02::1");
        assert_eq!(
            group_addr(IpVersion::V4, 12951).to_string(),
            "239.255.255.250:12951"
        );
    }

    #[test]
    fn test_announcement_is_text_with_trailing_nul() {
        let addr: IpAddr = "192.168.0.42".parse().unwrap();
        let payload = encode_announcement(&addr);
        assert_eq!(payload, b"192.168.0.42\0");
    }

    #[test]
    fn test_parse_v4_announcement() {
        let addr = parse_announcement(b"10.0.0.7\0", IpVersion::V4).unwrap();
        assert_eq!(addr, "10.0.0.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_parse_v6_announcement() {
        let addr = parse_announcement(b"fe80::1c2d:3eff:fe4f:5a6b", IpVersion::V6).unwrap();
        assert_eq!(addr, "fe80::1c2d:3eff:fe4f:5a6b".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_parse_ignores_garbage_after_nul() {
        let addr = parse_announcement(b"10.0.0.7\0\xff\xfe", IpVersion::V4).unwrap();
        assert_eq!(addr.to_string(), "10.0.0.7");
    }

    #[test]
    fn test_parse_rejects_wrong_family() {
        let result = parse_announcement(b"10.0.0.7", IpVersion::V6);
        assert!(matches!(result, Err(DiscoveryError::BadAddress { .. })));
    }

    #[test]
    fn test_parse_rejects_non_address() {
        let result = parse_announcement(b"hello", IpVersion::V4);
        assert!(matches!(result, Err(DiscoveryError::BadAddress { .. })));
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let result = parse_announcement(b"\xff\xfe", IpVersion::V4);
        assert!(matches!(result, Err(DiscoveryError::NotUtf8)));
    }

    #[test]
    fn test_parse_rejects_overlong_payload() {
        let payload = "1".repeat(MAX_ANNOUNCEMENT_LEN + 1);
        let result = parse_announcement(payload.as_bytes(), IpVersion::V4);
        assert!(matches!(result, Err(DiscoveryError::TooLong(_))));
    }

    #[tokio::test]
    async fn test_beacon_socket_is_link_local() {
        let socket = beacon_socket(IpVersion::V4).unwrap();
        assert_eq!(socket.multicast_ttl_v4().unwrap(), MULTICAST_HOPS);
    }
}
