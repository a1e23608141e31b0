use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::frame::frame_error::ErrorBody;

/// A specialized `Result` type used throughout the protocol crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding, decoding, or otherwise handling a CQL frame.
///
/// This enum only covers the protocol layer: malformed frames, unsupported opcodes, and the
/// server's own `ERROR` body. Connection-, pool-, and routing-level errors are defined in the
/// driver crate's `error` module and wrap this type via `Error::from`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Server error: {0:?}")]
    Server(ErrorBody),
    #[error("Unable to convert frame into a result: {0}")]
    General(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("UTF8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("UTF8 error: {0}")]
    FromUtf8(#[from] FromUtf8Error),
    #[error("Unexpected frame body length, expected {expected}, got {actual}")]
    UnexpectedBodyLength { expected: usize, actual: usize },
    #[error("Protocol feature not supported at negotiated version: {0}")]
    UnsupportedAtVersion(&'static str),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::General(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::General(value.to_string())
    }
}
