//! # Blackjack Server Library
//!
//! This library provides the server side of the LAN Blackjack service. It
//! announces itself on the local network, accepts player connections and runs
//! an independent game session for each of them, keeping a shared table of
//! win/draw/loss counts on disk.
//!
//! ## Core Responsibilities
//!
//! ### Discovery
//! A beacon task periodically sends the server's own address to a well-known
//! multicast group so clients can find it without configuration. The address
//! is resolved again on every tick, which keeps announcements correct when
//! the host's interfaces change.
//!
//! ### Session Handling
//! Every accepted connection gets its own task running a small protocol
//! state machine:
//! - Name prompt and player identification
//! - Main menu with play, rankings and exit options
//! - One hand of Blackjack per play request
//! - Rankings listing read fresh from disk
//!
//! ### Persistent Rankings
//! Hand outcomes are written to a flat text file through a single store
//! object. Updates are serialized inside the process so concurrent sessions
//! never overwrite each other's results.
//!
//! ## Architecture Design
//!
//! ### Task-Per-Connection
//! The dispatcher never waits on a session. Sessions share no game state;
//! the only shared pieces are the ranking store and a small registry used
//! to enforce the concurrent session limit.
//!
//! ### TCP Framed Protocol
//! Sessions exchange length-prefixed bincode frames defined in the `shared`
//! crate. Each server prompt is tagged with the kind of answer it expects,
//! so clients never have to guess from the text.
//!
//! ### Deterministic Game Core
//! The hand state machine draws from a `Deck` trait. Production uses a
//! random deck; tests stack the cards to replay exact scenarios.
//!
//! ## Module Organization
//!
//! ### Beacon Module (`beacon`)
//! Periodic multicast announcement of the server address.
//!
//! ### Client Manager Module (`client_manager`)
//! Registry of open sessions and admission against the session limit.
//!
//! ### Config Module (`config`)
//! Server and session settings with their defaults.
//!
//! ### Game Module (`game`)
//! Decks and the single-hand state machine.
//!
//! ### Network Module (`network`)
//! TCP accept loop and dispatch of session tasks.
//!
//! ### Rankings Module (`rankings`)
//! Ranking file format, table rules and the lock-guarded store.
//!
//! ### Resolver Module (`resolver`)
//! Selection of the local address to advertise.
//!
//! ### Session Module (`session`)
//! The per-connection protocol state machine.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use server::rankings::RankingStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let store = Arc::new(RankingStore::new(
//!         config.rankings_path.clone(),
//!         config.max_players,
//!     ));
//!
//!     // Accepts players on 0.0.0.0:12951 until the process exits
//!     let server = Server::bind(&config, store).await?;
//!     server.run().await;
//!
//!     Ok(())
//! }
//! ```

pub mod beacon;
pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
pub mod rankings;
pub mod resolver;
pub mod session;
