//! # Blackjack Client Library
//!
//! This library provides the player's side of the LAN Blackjack service: it
//! finds a server on the local network, connects to it and turns the
//! server's prompts into a console conversation.
//!
//! ## Architecture Overview
//!
//! The client is a thin terminal. All game rules live on the server; the
//! client only shows what it is told and answers the prompt it is asked.
//!
//! ### Server Discovery
//! Unless an address is given explicitly, the client joins the multicast
//! group of the chosen IP version and waits for the first valid
//! announcement. Malformed announcements are logged and skipped.
//!
//! ### Prompt Driven Input
//! Console input is only read while a prompt is outstanding. The prompt's
//! kind decides how a line is checked before it is sent: yes/no questions
//! are validated locally, everything else is forwarded as typed.
//!
//! ### Responsive Waiting
//! Network reads happen on their own task so waiting for the server, reading
//! the console and the idle timer can all be raced safely. When nothing
//! happens for a while the client says so and keeps waiting.
//!
//! ## Module Organization
//!
//! ### Discovery Module (`discovery`)
//! Multicast listener that yields the announced server address.
//!
//! ### Input Module (`input`)
//! Line-based console input, IP version choice and reply validation.
//!
//! ### Network Module (`network`)
//! TCP connection and the prompt/reply loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::discovery::listen_for_server;
//! use client::input::InputManager;
//! use client::network::{connect, Client};
//! use shared::{IpVersion, DEFAULT_PORT};
//! use std::net::SocketAddr;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ip = listen_for_server(IpVersion::V4, DEFAULT_PORT).await?;
//!     let stream = connect(SocketAddr::new(ip, DEFAULT_PORT)).await?;
//!
//!     let mut client = Client::new(
//!         InputManager::stdin(),
//!         std::io::stdout(),
//!         Duration::from_secs(30),
//!     );
//!     client.play(stream).await?;
//!
//!     Ok(())
//! }
//! ```

use shared::discovery::DiscoveryError;
use shared::{IpVersion, ProtocolError, DEFAULT_PORT};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

pub mod discovery;
pub mod input;
pub mod network;

/// How long the client waits quietly before reporting that nothing arrived.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("console i/o failed: {0}")]
    Console(#[source] io::Error),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Asked interactively when not set.
    pub version: Option<IpVersion>,
    /// Skips discovery when set.
    pub server: Option<IpAddr>,
    pub port: u16,
    pub idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: None,
            server: None,
            port: DEFAULT_PORT,
            idle_timeout: IDLE_TIMEOUT,
        }
    }
}
