//! Text frame codec for the session protocol.
//!
//! Frames are newline-delimited lines carrying an uppercase verb and
//! whitespace-separated fields: `ID 1`, `READY`, `UPDATE 87.50 350`,
//! `STATE 2 100.00 0`. One frame per line makes message boundaries explicit
//! over the stream transport; `encode` produces the line body without the
//! trailing newline and writers append it.

use std::str::FromStr;
use thiserror::Error;

/// Capacity rejection is the one frame without a verb; it is written
/// verbatim and the socket is closed right after.
pub const SERVER_FULL: &str = "Server full";

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// server -> client: participant identity, 1 or 2
    Id(u8),
    /// client -> server: ready for the start handshake
    Ready,
    /// server -> client: not enough (or not all ready) participants
    Waiting,
    /// server -> client: session is now playing
    Start,
    /// client -> server: sender's own authoritative state after a judged hit
    Update { health: f32, score: u32 },
    /// server -> client: one participant's state relayed to the other
    State { id: u8, health: f32, score: u32 },
    /// server -> client: slot table at capacity, connection will close
    ServerFull,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("empty frame")]
    Empty,
    #[error("unknown verb: {0}")]
    UnknownVerb(String),
    #[error("missing field in {0} frame")]
    MissingField(&'static str),
    #[error("invalid numeric field in {0} frame")]
    InvalidNumber(&'static str),
}

impl Message {
    pub fn encode(&self) -> String {
        match self {
            Message::Id(n) => format!("ID {}", n),
            Message::Ready => "READY".to_string(),
            Message::Waiting => "WAITING".to_string(),
            Message::Start => "START".to_string(),
            Message::Update { health, score } => format!("UPDATE {:.2} {}", health, score),
            Message::State { id, health, score } => {
                format!("STATE {} {:.2} {}", id, health, score)
            }
            Message::ServerFull => SERVER_FULL.to_string(),
        }
    }

    pub fn parse(line: &str) -> Result<Message, ParseError> {
        let line = line.trim();
        if line == SERVER_FULL {
            return Ok(Message::ServerFull);
        }

        let mut fields = line.split_whitespace();
        let verb = fields.next().ok_or(ParseError::Empty)?;

        match verb {
            "ID" => Ok(Message::Id(field(fields.next(), "ID")?)),
            "READY" => Ok(Message::Ready),
            "WAITING" => Ok(Message::Waiting),
            "START" => Ok(Message::Start),
            "UPDATE" => Ok(Message::Update {
                health: field(fields.next(), "UPDATE")?,
                score: field(fields.next(), "UPDATE")?,
            }),
            "STATE" => Ok(Message::State {
                id: field(fields.next(), "STATE")?,
                health: field(fields.next(), "STATE")?,
                score: field(fields.next(), "STATE")?,
            }),
            other => Err(ParseError::UnknownVerb(other.to_string())),
        }
    }
}

fn field<T: FromStr>(raw: Option<&str>, frame: &'static str) -> Result<T, ParseError> {
    raw.ok_or(ParseError::MissingField(frame))?
        .parse()
        .map_err(|_| ParseError::InvalidNumber(frame))
}
