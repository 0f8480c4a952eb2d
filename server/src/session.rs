//! One player's conversation with the server
//!
//! A session walks through `AwaitingName → MenuLoop → {InHand,
//! ViewingRankings} → MenuLoop → Closed`. Every step is a strict
//! request/response exchange: the handler writes a prompt and reads exactly
//! one reply before doing anything else. Hands are played by
//! [`crate::game::Hand`]; outcomes go through the shared [`RankingStore`].
//!
//! The handler is generic over the byte stream so it can be driven by a TCP
//! connection in production and by an in-memory duplex pipe in tests.

use crate::client_manager::ClientManager;
use crate::config::SessionConfig;
use crate::game::{Deck, Hand, HandEvent};
use crate::rankings::RankingStore;
use log::{debug, error, info};
use shared::{
    normalize_player_name, prompts, read_frame, write_frame, ClientMessage, PromptKind,
    ProtocolError, ServerMessage,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("client disconnected")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingName,
    MenuLoop,
    InHand,
    ViewingRankings,
    Closed,
}

pub struct SessionHandler<S> {
    stream: S,
    id: u32,
    store: Arc<RankingStore>,
    deck: Box<dyn Deck + Send>,
    config: SessionConfig,
    clients: Option<Arc<RwLock<ClientManager>>>,
    player: String,
    state: SessionState,
}

impl<S> SessionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        id: u32,
        store: Arc<RankingStore>,
        deck: Box<dyn Deck + Send>,
        config: SessionConfig,
    ) -> Self {
        Self {
            stream,
            id,
            store,
            deck,
            config,
            clients: None,
            player: String::new(),
            state: SessionState::AwaitingName,
        }
    }

    /// Reports the player name to the registry once it is known.
    pub fn with_registry(mut self, clients: Arc<RwLock<ClientManager>>) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session to completion.
    ///
    /// The rankings file is flushed whatever way the session ends. A client
    /// that simply goes away is a normal end, not an error.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let result = self.drive().await;
        self.state = SessionState::Closed;

        if let Err(e) = self.store.flush().await {
            error!("Session {}: final rankings flush failed: {}", self.id, e);
        }
        let _ = self.stream.shutdown().await;

        match result {
            Err(SessionError::Disconnected) => {
                info!("Session {}: client disconnected", self.id);
                Ok(())
            }
            other => other,
        }
    }

    async fn drive(&mut self) -> Result<(), SessionError> {
        loop {
            self.state = match self.state {
                SessionState::AwaitingName => self.ask_name().await?,
                SessionState::MenuLoop => self.menu().await?,
                SessionState::InHand => {
                    self.play_hand().await?;
                    SessionState::MenuLoop
                }
                SessionState::ViewingRankings => {
                    self.show_rankings().await?;
                    SessionState::MenuLoop
                }
                SessionState::Closed => return Ok(()),
            };
        }
    }

    async fn ask_name(&mut self) -> Result<SessionState, SessionError> {
        let reply = self.ask(PromptKind::Name, prompts::name_prompt()).await?;
        let name = normalize_player_name(&reply);

        if name.is_empty() && self.config.reject_empty_names {
            return Ok(SessionState::AwaitingName);
        }

        info!("Session {}: player {:?} joined", self.id, name);
        if let Some(clients) = &self.clients {
            clients.write().await.set_player_name(self.id, &name);
        }
        self.player = name;
        Ok(SessionState::MenuLoop)
    }

    async fn menu(&mut self) -> Result<SessionState, SessionError> {
        let reply = self
            .ask(PromptKind::Menu, prompts::menu(&self.player))
            .await?;

        match reply.trim().chars().next() {
            Some('1') => Ok(SessionState::InHand),
            Some('2') => Ok(SessionState::ViewingRankings),
            Some('3') => {
                self.send(&ServerMessage::Goodbye {
                    text: prompts::farewell(&self.player),
                })
                .await?;
                Ok(SessionState::Closed)
            }
            _ => {
                self.info(prompts::invalid_option()).await?;
                Ok(SessionState::MenuLoop)
            }
        }
    }

    async fn play_hand(&mut self) -> Result<(), SessionError> {
        let (mut hand, events) = Hand::deal(&mut self.deck);
        self.send_events(&events).await?;

        while let Some((kind, text)) = hand.prompt() {
            let reply = self.ask(kind, text).await?;
            let events = hand.respond(&reply, &mut self.deck);
            self.send_events(&events).await?;
        }

        if let Some(outcome) = hand.outcome() {
            info!(
                "Session {}: {} finished a hand with a {} ({} vs dealer {})",
                self.id,
                self.player,
                outcome,
                hand.player_score(),
                hand.dealer_score()
            );
            if let Err(e) = self.store.record(&self.player, outcome).await {
                error!("Session {}: could not record {}: {}", self.id, outcome, e);
            }
        }
        Ok(())
    }

    async fn show_rankings(&mut self) -> Result<(), SessionError> {
        let table = self.store.snapshot().await;

        self.info(prompts::rankings_header()).await?;
        for record in table.records() {
            self.info(prompts::ranking_line(
                &record.name,
                record.wins,
                record.draws,
                record.losses,
            ))
            .await?;
        }
        Ok(())
    }

    async fn send_events(&mut self, events: &[HandEvent]) -> Result<(), SessionError> {
        for event in events {
            self.info(event.to_string()).await?;
        }
        Ok(())
    }

    async fn info(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(&ServerMessage::Info { text: text.into() }).await
    }

    /// Sends a prompt and waits for its single reply.
    async fn ask(
        &mut self,
        kind: PromptKind,
        text: impl Into<String>,
    ) -> Result<String, SessionError> {
        self.send(&ServerMessage::Prompt {
            kind,
            text: text.into(),
        })
        .await?;

        match read_frame::<_, ClientMessage>(&mut self.stream).await? {
            Some(ClientMessage::Reply { text }) => {
                debug!("Session {} <- {:?}", self.id, text);
                Ok(text)
            }
            None => Err(SessionError::Disconnected),
        }
    }

    async fn send(&mut self, message: &ServerMessage) -> Result<(), SessionError> {
        debug!("Session {} -> {:?}", self.id, message);
        write_frame(&mut self.stream, message).await?;
        Ok(())
    }
}
