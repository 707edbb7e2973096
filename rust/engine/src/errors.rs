use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a rejected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input such as an empty name
    Validation,
    /// Action not valid in the current phase or turn
    State,
    /// Host-only action attempted by someone else
    Authorization,
    /// Lobby or bot limits reached
    Capacity,
    /// Unknown target id
    NotFound,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Player name must not be empty")]
    EmptyName,
    #[error("Player name is longer than {max} characters")]
    NameTooLong { max: usize },
    #[error("Name `{0}` is already taken")]
    DuplicateName(String),
    #[error("Player id `{0}` is already seated")]
    DuplicateId(String),
    #[error("Game already started")]
    AlreadyStarted,
    #[error("No round in progress")]
    NotStarted,
    #[error("Round is not over yet")]
    RoundNotOver,
    #[error("It's not {actual}'s turn (expected {expected})")]
    NotPlayersTurn { expected: String, actual: String },
    #[error("At least {min} players are needed to start, found {actual}")]
    NotEnoughPlayers { min: usize, actual: usize },
    #[error("Lobby is full ({max} players)")]
    LobbyFull { max: usize },
    #[error("Bot limit reached ({max} bots)")]
    BotLimitReached { max: usize },
    #[error("Only the host can do that")]
    NotHost,
    #[error("Player `{0}` not found")]
    PlayerNotFound(String),
    #[error("Player `{0}` is not a bot")]
    NotABot(String),
    #[error("Bot `{0}` cannot be host")]
    BotCannotHost(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::EmptyName
            | GameError::NameTooLong { .. }
            | GameError::DuplicateName(_)
            | GameError::DuplicateId(_)
            | GameError::NotABot(_)
            | GameError::BotCannotHost(_) => ErrorKind::Validation,
            GameError::AlreadyStarted
            | GameError::NotStarted
            | GameError::RoundNotOver
            | GameError::NotPlayersTurn { .. }
            | GameError::NotEnoughPlayers { .. } => ErrorKind::State,
            GameError::NotHost => ErrorKind::Authorization,
            GameError::LobbyFull { .. } | GameError::BotLimitReached { .. } => {
                ErrorKind::Capacity
            }
            GameError::PlayerNotFound(_) => ErrorKind::NotFound,
        }
    }
}
