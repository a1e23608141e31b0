//! Driver-level error taxonomy. Wraps `cassandra_protocol::Error` (server/codec errors) and adds
//! the connection- and request-lifecycle errors that only make sense once there's a socket.

use std::io;

use thiserror::Error;

pub use cassandra_protocol::frame::frame_error::ErrorBody;

#[derive(Debug, Error)]
pub enum Error {
    #[error("server error: {0:?}")]
    Server(ErrorBody),
    #[error("general error: {0}")]
    General(String),
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("could not connect to any contact point")]
    Connect,
    #[error("connection closed")]
    Close,
    #[error("socket error: {0}")]
    Socket(String),
    #[error("TLS handshake failed: {0}")]
    SslHandshake(String),
    #[error("TLS certificate verification failed: {0}")]
    SslVerify(String),
    #[error("operation timed out")]
    Timeout,
    #[error("unsupported protocol version")]
    InvalidProtocol,
    #[error("authentication failed")]
    Auth,
    #[error("keyspace error: {0}")]
    Keyspace(String),
    #[error("unexpected response opcode")]
    InvalidOpcode,
    #[error("invalid response: {0}")]
    Response(String),
    #[error("internal driver error: {0}")]
    Internal(String),
    #[error("request canceled")]
    Canceled,

    #[error("request timed out")]
    RequestTimedOut,
    #[error("no hosts available")]
    NoHostsAvailable,
    #[error("no available stream ids")]
    NoAvailableStreamIds,
    #[error("request queue is full")]
    RequestQueueFull,
    #[error("unknown execution profile")]
    ExecutionProfileInvalid,
    #[error("could not set keyspace: {0}")]
    UnableToSetKeyspace(String),
    #[error("server does not support any requested protocol version")]
    UnsupportedProtocol,

    #[error("invalid value type")]
    InvalidValueType,
    #[error("bad parameters: {0}")]
    BadParams(String),
    #[error("invalid certificate: {0}")]
    InvalidCert(String),
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("could not initialize driver: {0}")]
    UnableToInit(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<cassandra_protocol::Error> for Error {
    fn from(err: cassandra_protocol::Error) -> Self {
        match err {
            cassandra_protocol::Error::Server(body) => Error::Server(body),
            cassandra_protocol::Error::Io(err) => Error::Io(err),
            other => Error::General(other.to_string()),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::General(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::General(err.to_string())
    }
}

impl Error {
    /// Matches the server error code from `ERROR` frames, if this is one.
    pub fn error_code(&self) -> Option<i32> {
        match self {
            Error::Server(body) => Some(body.error_code),
            _ => None,
        }
    }

    pub fn error_message(&self) -> String {
        self.to_string()
    }
}
