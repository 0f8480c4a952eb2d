//! Session wire protocol: tagged messages carried in length-prefixed bincode frames
//!
//! Every frame is a 4-byte big-endian payload length followed by the
//! bincode encoding of one message. The exchange is half-duplex: the server
//! sends a [`ServerMessage::Prompt`] and then waits for exactly one
//! [`ClientMessage::Reply`]. `Info` messages need no answer, and `Goodbye`
//! is the last frame the server writes before closing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload accepted in either direction.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// What kind of answer a prompt is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptKind {
    Name,
    Menu,
    DrawOrStand,
    AceValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    Prompt { kind: PromptKind, text: String },
    Info { text: String },
    Goodbye { text: String },
}

impl ServerMessage {
    pub fn text(&self) -> &str {
        match self {
            ServerMessage::Prompt { text, .. }
            | ServerMessage::Info { text }
            | ServerMessage::Goodbye { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    Reply { text: String },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    FrameTooLarge(usize),
}

/// Serializes `message` and writes it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = bincode::serialize(message)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }

    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame. Returns `Ok(None)` when the peer closed the stream
/// before a complete frame arrived.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    match reader.read_exact(&mut payload).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    Ok(Some(bincode::deserialize(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_prompt_crosses_the_stream() {
        let (mut server, mut client) = duplex(1024);

        let prompt = ServerMessage::Prompt {
            kind: PromptKind::DrawOrStand,
            text: "Your current score: 0. Draw a card? (yes/no): ".to_string(),
        };
        write_frame(&mut server, &prompt).await.unwrap();

        let received: ServerMessage = read_frame(&mut client).await.unwrap().unwrap();
        assert_eq!(received, prompt);
    }

    #[tokio::test]
    async fn test_frames_keep_their_boundaries() {
        let (mut client, mut server) = duplex(1024);

        for text in ["yes", "no", ""] {
            let reply = ClientMessage::Reply {
                text: text.to_string(),
            };
            write_frame(&mut client, &reply).await.unwrap();
        }

        for expected in ["yes", "no", ""] {
            let ClientMessage::Reply { text } = read_frame::<_, ClientMessage>(&mut server)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(text, expected);
        }
    }

    #[tokio::test]
    async fn test_closed_stream_reads_as_none() {
        let (client, mut server) = duplex(64);
        drop(client);

        let result: Option<ClientMessage> = read_frame(&mut server).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_truncated_frame_reads_as_none() {
        let (mut client, mut server) = duplex(64);
        client.write_u32(32).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        drop(client);

        let result: Option<ClientMessage> = read_frame(&mut server).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected() {
        let (mut client, mut server) = duplex(64);
        client.write_u32((MAX_FRAME_LEN + 1) as u32).await.unwrap();

        let result = read_frame::<_, ClientMessage>(&mut server).await;
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge(_))));
    }

    #[tokio::test]
    async fn test_frame_layout_on_the_wire() {
        let reply = ClientMessage::Reply {
            text: "11".to_string(),
        };
        let payload = bincode::serialize(&reply).unwrap();
        let header = (payload.len() as u32).to_be_bytes();

        let mut wire = tokio_test::io::Builder::new()
            .write(&header)
            .write(&payload)
            .build();
        write_frame(&mut wire, &reply).await.unwrap();
    }

    #[tokio::test]
    async fn test_frame_split_across_reads() {
        let info = ServerMessage::Info {
            text: "The dealer's face-up card is: 7".to_string(),
        };
        let payload = bincode::serialize(&info).unwrap();
        let mut frame = (payload.len() as u32).to_be_bytes().to_vec();
        frame.extend_from_slice(&payload);

        let mut wire = tokio_test::io::Builder::new()
            .read(&frame[..2])
            .read(&frame[2..9])
            .read(&frame[9..])
            .build();
        let received: ServerMessage = read_frame(&mut wire).await.unwrap().unwrap();
        assert_eq!(received, info);
    }

    #[test]
    fn test_message_text_accessor() {
        let info = ServerMessage::Info {
            text: "Current Rankings:".to_string(),
        };
        let goodbye = ServerMessage::Goodbye {
            text: "Goodbye, Alice!".to_string(),
        };
        assert_eq!(info.text(), "Current Rankings:");
        assert_eq!(goodbye.text(), "Goodbye, Alice!");
    }
}
