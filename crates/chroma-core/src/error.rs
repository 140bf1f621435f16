//! Error types for the simulation.

use crate::{EntityId, Position};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Position {pos} is outside the {width}x{height} grid")]
    OutOfBounds { pos: Position, width: i32, height: i32 },

    #[error("Not found: {0}")]
    NotFound(EntityId),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
