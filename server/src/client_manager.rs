//! Bookkeeping for connected clients and the concurrent session limit
//!
//! This module tracks which connections currently own a session:
//! - Session admission against the configured capacity
//! - Player names once a session has learned them
//! - Release of the slot when the session ends, however it ends
//!
//! No game state lives here. Each session owns its hand exclusively; the
//! manager only knows who is connected so the dispatcher can refuse new
//! connections when the server is full.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connection that currently holds a session slot
#[derive(Debug)]
pub struct Client {
    /// Unique session identifier assigned by the server
    pub id: u32,
    /// Peer address of the TCP connection
    pub addr: SocketAddr,
    /// Set once the player has answered the name prompt
    pub player_name: Option<String>,
    /// When the connection was accepted
    pub connected_at: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            player_name: None,
            connected_at: Instant::now(),
        }
    }

    /// How long this session has been open
    pub fn session_age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Admits connections up to a fixed number of concurrent sessions
///
/// The dispatcher asks for a slot before spawning a session task and the
/// task hands the slot back when it finishes. Session IDs start at 1 and
/// are never reused within a server run.
pub struct ClientManager {
    /// Sessions in progress indexed by their ID
    clients: HashMap<u32, Client>,
    /// Next ID handed to an admitted connection
    next_client_id: u32,
    /// Maximum number of concurrent sessions
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to admit a new connection
    ///
    /// Returns Some(session_id) on success, None if every slot is taken.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.is_full() {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Session {} opened for {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Releases a session slot
    ///
    /// Returns true if the session was found and removed.
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Session {} closed ({} at {}) after {:?}",
                client.id,
                client.player_name.as_deref().unwrap_or("unnamed"),
                client.addr,
                client.session_age()
            );
            true
        } else {
            false
        }
    }

    /// Records the player name a session settled on
    pub fn set_player_name(&mut self, client_id: u32, name: &str) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.player_name = Some(name.to_string());
            true
        } else {
            false
        }
    }

    /// Names of players currently seated, in session order
    pub fn player_names(&self) -> Vec<String> {
        let mut named: Vec<&Client> = self
            .clients
            .values()
            .filter(|c| c.player_name.is_some())
            .collect();
        named.sort_by_key(|c| c.id);
        named
            .into_iter()
            .filter_map(|c| c.player_name.clone())
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
