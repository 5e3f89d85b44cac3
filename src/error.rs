use std::io;
use thiserror::Error;

/// type alias for all operations in this crate that could fail with a [`KvError`]
pub type Result<T> = std::result::Result<T, KvError>;

/// The Error variants used by the server, client and thread pool.
#[derive(Debug, Error)]
pub enum KvError {
    /// variant for errors caused by socket or thread IO
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// a command line argument or address could not be parsed
    #[error("parsing error: {0}")]
    Parsing(String),

    /// the server sent back something that is not one of the known responses
    #[error("unexpected response from server: {0:?}")]
    Protocol(String),

    /// a job was submitted to a pool that has no worker threads left
    #[error("the thread pool has no running workers")]
    PoolShutdown,

    /// a configuration value is out of its allowed range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// a key or value cannot be expressed in the text protocol
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
