//! Local address discovery for the beacon

use shared::IpVersion;
use std::io;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to enumerate network interfaces: {0}")]
    Interfaces(#[from] io::Error),
    #[error("no non-loopback {0} address found")]
    NoAddress(IpVersion),
}

/// Finds the address the server should advertise for a given family.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, version: IpVersion) -> Result<IpAddr, ResolveError>;
}

impl<R: AddressResolver + ?Sized> AddressResolver for Box<R> {
    fn resolve(&self, version: IpVersion) -> Result<IpAddr, ResolveError> {
        (**self).resolve(version)
    }
}

/// Asks the operating system for its interface addresses on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceResolver;

impl AddressResolver for InterfaceResolver {
    fn resolve(&self, version: IpVersion) -> Result<IpAddr, ResolveError> {
        let addrs: Vec<IpAddr> = if_addrs::get_if_addrs()?
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .map(|iface| iface.ip())
            .collect();

        pick_address(&addrs, version).ok_or(ResolveError::NoAddress(version))
    }
}

/// Always advertises the same address.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub IpAddr);

impl AddressResolver for FixedResolver {
    fn resolve(&self, version: IpVersion) -> Result<IpAddr, ResolveError> {
        if version.matches(&self.0) {
            Ok(self.0)
        } else {
            Err(ResolveError::NoAddress(version))
        }
    }
}

/// Picks the first usable address of `version`. Loopback addresses are
/// never chosen; for IPv6 a routable address wins over a link-local one,
/// since a link-local literal cannot be dialed without a scope id.
pub fn pick_address(addrs: &[IpAddr], version: IpVersion) -> Option<IpAddr> {
    let mut candidates = addrs
        .iter()
        .copied()
        .filter(|addr| version.matches(addr) && !addr.is_loopback() && !addr.is_unspecified());

    match version {
        IpVersion::V4 => candidates.next(),
        IpVersion::V6 => {
            let all: Vec<IpAddr> = candidates.collect();
            all.iter()
                .copied()
                .find(|addr| !is_link_local_v6(addr))
                .or_else(|| all.first().copied())
        }
    }
}

fn is_link_local_v6(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
        IpAddr::V4(_) => false,
    }
}
