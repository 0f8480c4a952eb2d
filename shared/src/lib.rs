use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub mod discovery;
pub mod prompts;
pub mod protocol;

pub use protocol::{
    read_frame, write_frame, ClientMessage, PromptKind, ProtocolError, ServerMessage,
};

/// Port shared by the session listener and the discovery beacon.
pub const DEFAULT_PORT: u16 = 12951;
pub const MAX_NAME_LEN: usize = 49;
pub const BLACKJACK: u32 = 21;
pub const DEALER_STANDS_AT: u32 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IpVersion {
    #[default]
    V4,
    V6,
}

impl IpVersion {
    /// Anything other than 6 selects IPv4.
    pub fn from_number(value: u8) -> Self {
        if value == 6 {
            IpVersion::V6
        } else {
            IpVersion::V4
        }
    }

    /// The family `addr` belongs to.
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    pub fn unspecified(self) -> IpAddr {
        match self {
            IpVersion::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpVersion::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }

    pub fn matches(self, addr: &IpAddr) -> bool {
        matches!(
            (self, addr),
            (IpVersion::V4, IpAddr::V4(_)) | (IpVersion::V6, IpAddr::V6(_))
        )
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// Result of a finished hand from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Draw => write!(f, "draw"),
            Outcome::Loss => write!(f, "loss"),
        }
    }
}

/// Normalizes a raw name reply: trims it, replaces inner whitespace with `_`
/// and truncates to [`MAX_NAME_LEN`] bytes on a char boundary.
pub fn normalize_player_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len().min(MAX_NAME_LEN));
    for ch in raw.trim().chars() {
        let ch = if ch.is_whitespace() { '_' } else { ch };
        if name.len() + ch.len_utf8() > MAX_NAME_LEN {
            break;
        }
        name.push(ch);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_version_from_number() {
        assert_eq!(IpVersion::from_number(4), IpVersion::V4);
        assert_eq!(IpVersion::from_number(6), IpVersion::V6);
        assert_eq!(IpVersion::from_number(0), IpVersion::V4);
        assert_eq!(IpVersion::from_number(7), IpVersion::V4);
    }

    #[test]
    fn test_ip_version_matches() {
        let v4: IpAddr = "192.168.1.10".parse().unwrap();
        let v6: IpAddr = "fe80::1".parse().unwrap();

        assert!(IpVersion::V4.matches(&v4));
        assert!(!IpVersion::V4.matches(&v6));
        assert!(IpVersion::V6.matches(&v6));
        assert!(!IpVersion::V6.matches(&v4));
        assert_eq!(IpVersion::of(&v4), IpVersion::V4);
        assert_eq!(IpVersion::of(&v6), IpVersion::V6);
    }

    #[test]
    fn test_unspecified_addresses() {
        assert_eq!(IpVersion::V4.unspecified().to_string(), "0.0.0.0");
        assert_eq!(IpVersion::V6.unspecified().to_string(), "::");
    }

    #[test]
    fn test_normalize_player_name_trims() {
        assert_eq!(normalize_player_name("  Alice \r\n"), "Alice");
    }

    #[test]
    fn test_normalize_player_name_replaces_inner_whitespace() {
        assert_eq!(normalize_player_name("Mary Ann"), "Mary_Ann");
    }

    #[test]
    fn test_normalize_player_name_keeps_empty() {
        assert_eq!(normalize_player_name("   "), "");
    }

    #[test]
    fn test_normalize_player_name_truncates_on_char_boundary() {
        let long = "a".repeat(60);
        assert_eq!(normalize_player_name(&long).len(), MAX_NAME_LEN);

        // 48 ASCII bytes followed by a two-byte char must not split it
        let tricky = format!("{}é", "b".repeat(48));
        let name = normalize_player_name(&tricky);
        assert_eq!(name.len(), 48);
        assert!(name.chars().all(|c| c == 'b'));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Win.to_string(), "win");
        assert_eq!(Outcome::Draw.to_string(), "draw");
        assert_eq!(Outcome::Loss.to_string(), "loss");
    }
}
