use crate::input::{validate_reply, InputManager};
use crate::ClientError;
use log::{debug, info};
use shared::{read_frame, write_frame, ClientMessage, PromptKind, ProtocolError, ServerMessage};
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;

type Incoming = Result<ServerMessage, ProtocolError>;

pub async fn connect(addr: SocketAddr) -> Result<TcpStream, ClientError> {
    info!("Connecting to {}...", addr);
    TcpStream::connect(addr)
        .await
        .map_err(|source| ClientError::Connect { addr, source })
}

/// Console front end for one session
pub struct Client<R, O> {
    input: InputManager<R>,
    output: O,
    idle_timeout: Duration,
    /// The prompt waiting for an answer, if any
    pending: Option<(PromptKind, String)>,
}

impl<R, O> Client<R, O>
where
    R: AsyncBufRead + Unpin,
    O: Write,
{
    pub fn new(input: InputManager<R>, output: O, idle_timeout: Duration) -> Self {
        Self {
            input,
            output,
            idle_timeout,
            pending: None,
        }
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Runs the prompt/reply loop until the server says goodbye, the
    /// connection closes or the console input ends.
    pub async fn play<S>(&mut self, stream: S) -> Result<(), ClientError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let receiver = tokio::spawn(receive_messages(reader, tx));

        let result = loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(Ok(message)) => {
                        if let Err(e) = self.show(&message) {
                            break Err(e);
                        }
                        if matches!(message, ServerMessage::Goodbye { .. }) {
                            break Ok(());
                        }
                    }
                    Some(Err(e)) => break Err(e.into()),
                    None => {
                        break self.say("Server closed the connection");
                    }
                },
                line = self.input.next_line(), if self.pending.is_some() => match line {
                    Ok(Some(line)) => {
                        if let Err(e) = self.answer(&mut writer, &line).await {
                            break Err(e);
                        }
                    }
                    Ok(None) => {
                        info!("Console input closed, leaving the table");
                        break Ok(());
                    }
                    Err(e) => break Err(ClientError::Console(e)),
                },
                _ = sleep(self.idle_timeout) => {
                    if let Err(e) = self.say("Timeout, no data received") {
                        break Err(e);
                    }
                }
            }
        };

        receiver.abort();
        result
    }

    fn show(&mut self, message: &ServerMessage) -> Result<(), ClientError> {
        debug!("Received {:?}", message);
        match message {
            ServerMessage::Prompt { kind, text } => {
                self.pending = Some((*kind, text.clone()));
                write!(self.output, "{}", text).map_err(ClientError::Console)?;
                self.output.flush().map_err(ClientError::Console)
            }
            ServerMessage::Info { text } | ServerMessage::Goodbye { text } => self.say(text),
        }
    }

    async fn answer<W>(&mut self, writer: &mut W, line: &str) -> Result<(), ClientError>
    where
        W: AsyncWrite + Unpin,
    {
        let Some((kind, prompt)) = self.pending.clone() else {
            return Ok(());
        };

        match validate_reply(kind, line) {
            Ok(text) => {
                self.pending = None;
                write_frame(writer, &ClientMessage::Reply { text }).await?;
                Ok(())
            }
            Err(hint) => {
                self.say(hint)?;
                write!(self.output, "{}", prompt).map_err(ClientError::Console)?;
                self.output.flush().map_err(ClientError::Console)
            }
        }
    }

    fn say(&mut self, text: &str) -> Result<(), ClientError> {
        writeln!(self.output, "{}", text).map_err(ClientError::Console)
    }
}

/// Forwards decoded frames to the console loop until the stream ends.
async fn receive_messages<R>(mut reader: R, tx: mpsc::UnboundedSender<Incoming>)
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(message)) => {
                if tx.send(Ok(message)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}
