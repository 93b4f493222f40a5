use thiserror::Error;

/// Errors produced by the tic-tac-toe protocol and sender layers.
#[derive(Debug, Error)]
pub enum TttError {
    #[error("codec error: {0}")]
    Codec(String),

    #[error("invalid board layout: {0}")]
    InvalidLayout(String),

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("board layout not known yet")]
    BoardUnknown,

    #[error("no mark assigned: join a game first")]
    NotJoined,

    #[error("no session available")]
    NoSession,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("controller is no longer running")]
    ControllerClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for TttError {
    fn from(e: serde_json::Error) -> Self {
        TttError::Codec(e.to_string())
    }
}

pub type TttResult<T> = Result<T, TttError>;
