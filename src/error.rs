use thiserror::Error;

use crate::binder::BindError;
use crate::config::ConfigError;
use crate::parser::ParseError;

#[derive(Error, Debug)]
pub enum Error {
    // text could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    // identifiers, parameters or types did not bind
    #[error("Bind error: {0}")]
    Bind(#[from] BindError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("No filter expression is set")]
    NotConfigured,

    #[error("Unknown message type: {0}")]
    UnknownType(String),
}

pub type FilterResult<T> = Result<T, Error>;

impl Error {
    /// Byte offset in the filter text the error refers to, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Parse(e) => Some(e.position()),
            Error::Bind(e) => e.position(),
            _ => None,
        }
    }
}
