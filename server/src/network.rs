//! Server network layer: TCP accept loop and per-connection task dispatch

use crate::client_manager::ClientManager;
use crate::config::{ServerConfig, SessionConfig};
use crate::game::{Deck, RandomDeck};
use crate::rankings::RankingStore;
use crate::session::SessionHandler;
use log::{debug, error, info, warn};
use shared::{prompts, write_frame, ServerMessage};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::RwLock;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Builds the deck each new session plays with
pub type DeckFactory = Arc<dyn Fn() -> Box<dyn Deck + Send> + Send + Sync>;

fn random_decks() -> DeckFactory {
    Arc::new(|| Box::new(RandomDeck::from_entropy()) as Box<dyn Deck + Send>)
}

/// Accepts connections and hands each one to its own session task
pub struct Server {
    listener: TcpListener,
    clients: Arc<RwLock<ClientManager>>,
    store: Arc<RankingStore>,
    session: SessionConfig,
    deck_factory: DeckFactory,
}

impl Server {
    pub async fn bind(config: &ServerConfig, store: Arc<RankingStore>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr()).await?;
        info!(
            "Server listening on {} ({}), up to {} sessions",
            listener.local_addr()?,
            config.version,
            config.max_sessions
        );

        Ok(Server {
            listener,
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_sessions))),
            store,
            session: config.session.clone(),
            deck_factory: random_decks(),
        })
    }

    /// Replaces the random deck, mainly so tests can stack the cards.
    pub fn with_deck_factory(mut self, deck_factory: DeckFactory) -> Self {
        self.deck_factory = deck_factory;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn clients(&self) -> Arc<RwLock<ClientManager>> {
        Arc::clone(&self.clients)
    }

    /// Accept loop. Only returns if the process is shutting down.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.dispatch(stream, addr).await,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    async fn dispatch(&self, stream: TcpStream, addr: SocketAddr) {
        let admitted = self.clients.write().await.add_client(addr);

        let Some(id) = admitted else {
            warn!("Rejecting {}: server full", addr);
            tokio::spawn(reject(stream, addr));
            return;
        };

        let guard = SessionGuard {
            id,
            clients: Arc::clone(&self.clients),
        };
        let handler = SessionHandler::new(
            stream,
            id,
            Arc::clone(&self.store),
            (self.deck_factory)(),
            self.session.clone(),
        )
        .with_registry(Arc::clone(&self.clients));

        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = handler.run().await {
                warn!("Session {} with {} ended with error: {}", id, addr, e);
            }
        });
    }
}

async fn reject(mut stream: TcpStream, addr: SocketAddr) {
    let goodbye = ServerMessage::Goodbye {
        text: prompts::server_full(),
    };
    if let Err(e) = write_frame(&mut stream, &goodbye).await {
        debug!("Could not tell {} the server is full: {}", addr, e);
    }
    let _ = stream.shutdown().await;
}

/// Gives the registry slot back when the session task ends, including
/// when it unwinds from a panic.
struct SessionGuard {
    id: u32,
    clients: Arc<RwLock<ClientManager>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = self.id;
        if let Ok(mut clients) = self.clients.try_write() {
            clients.remove_client(&id);
            return;
        }

        let clients = Arc::clone(&self.clients);
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                clients.write().await.remove_client(&id);
            });
        }
    }
}
