//! Console input for the client

use shared::{IpVersion, PromptKind};
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub const IP_VERSION_MENU: &str = "Choose IP version:\n1. IPv4\n2. IPv6\n> ";
pub const YES_NO_HINT: &str = "Invalid input. Please type 'yes' or 'no'.";

/// Anything but `2` picks IPv4.
pub fn parse_ip_choice(line: &str) -> IpVersion {
    match line.trim() {
        "2" => IpVersion::V6,
        _ => IpVersion::V4,
    }
}

/// Checks a typed line against the prompt it answers and returns the text
/// to send. Draw-or-stand answers must be exactly `yes` or `no`.
pub fn validate_reply(kind: PromptKind, line: &str) -> Result<String, &'static str> {
    match kind {
        PromptKind::DrawOrStand => match line.trim() {
            answer @ ("yes" | "no") => Ok(answer.to_string()),
            _ => Err(YES_NO_HINT),
        },
        PromptKind::Name | PromptKind::Menu | PromptKind::AceValue => Ok(line.to_string()),
    }
}

/// Reads the console one line at a time.
///
/// `next_line` is cancel safe, so it can sit in a `tokio::select!` next to
/// the network without losing typed input.
pub struct InputManager<R> {
    lines: Lines<R>,
}

impl InputManager<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> InputManager<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// `Ok(None)` once the input is closed.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }

    /// Shows the IP version menu and reads one choice. Closed input also
    /// falls back to IPv4.
    pub async fn choose_ip_version<W: Write>(&mut self, out: &mut W) -> io::Result<IpVersion> {
        write!(out, "{}", IP_VERSION_MENU)?;
        out.flush()?;

        let line = self.next_line().await?;
        Ok(line.map(|l| parse_ip_choice(&l)).unwrap_or_default())
    }
}
