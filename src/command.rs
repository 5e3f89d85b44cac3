use std::fmt;

use crate::engine::KvEngine;
use crate::{KvError, Result};

const GET: &str = "GET";
const SET: &str = "SET";
const DEL: &str = "DEL";

const VALUE_PREFIX: char = '$';
const NULL: &str = "NULL!\n";
const SUCCESS: &str = "SUCCESS!\n";
const UNRECOGNIZED: &str = "VERB COULD NOT BE PARSED!\n";

/// These are the request "commands" that can be made to a key/value store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// get a value from the store
    Get {
        /// the key to search for
        key: String,
    },
    /// set a key/value in the store
    Set {
        /// the key to set
        key: String,
        /// the value to set
        value: String,
    },
    /// remove a key/value from the store
    Del {
        /// the key to remove
        key: String,
    },
    /// the verb was unknown or its arguments were malformed
    Unrecognized,
}

impl Request {
    /// Parses a raw request line.
    ///
    /// One trailing `\n` and then one trailing `\r` are stripped. The verb is everything before
    /// the first space. For `GET` and `DEL` the key is the entire remainder. For `SET` the key
    /// ends at the next space and the value is everything after it, spaces included.
    ///
    /// A missing delimiter, an empty key or an unknown verb all give
    /// [`Request::Unrecognized`].
    pub fn parse(raw: &str) -> Request {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let (verb, rest) = match line.split_once(' ') {
            Some(split) => split,
            None => return Request::Unrecognized,
        };

        match verb {
            GET if !rest.is_empty() => Request::Get {
                key: rest.to_owned(),
            },
            DEL if !rest.is_empty() => Request::Del {
                key: rest.to_owned(),
            },
            SET => match rest.split_once(' ') {
                Some((key, value)) if !key.is_empty() => Request::Set {
                    key: key.to_owned(),
                    value: value.to_owned(),
                },
                _ => Request::Unrecognized,
            },
            _ => Request::Unrecognized,
        }
    }

    /// Parses a request straight from the bytes read off a connection.
    /// Bytes that are not valid UTF-8 are never a valid request.
    pub fn from_bytes(buf: &[u8]) -> Request {
        match std::str::from_utf8(buf) {
            Ok(raw) => Request::parse(raw),
            Err(_) => Request::Unrecognized,
        }
    }

    /// Runs this request against `engine` and returns the response to send back.
    /// An [`Request::Unrecognized`] request never touches the engine.
    pub fn execute<E: KvEngine>(self, engine: &E) -> Response {
        match self {
            Request::Get { key } => match engine.get(&key) {
                Some(value) => Response::Value(value),
                None => Response::Null,
            },
            Request::Set { key, value } => {
                engine.set(key, value);
                Response::Success
            }
            Request::Del { key } => {
                if engine.remove(&key) {
                    Response::Success
                } else {
                    Response::Null
                }
            }
            Request::Unrecognized => Response::Unrecognized,
        }
    }
}

/// The response types that can be returned for any request.
///
/// The `Display` implementation writes the exact wire encoding, trailing newline included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// a GET found its key; encoded as `$<value>\n`
    Value(String),
    /// a GET or DEL did not find its key; encoded as `NULL!\n`
    Null,
    /// a SET, or a DEL that removed its key; encoded as `SUCCESS!\n`
    Success,
    /// the request could not be parsed; encoded as `VERB COULD NOT BE PARSED!\n`
    Unrecognized,
}

impl Response {
    /// Decodes a raw response as received by a client.
    ///
    /// # Errors
    /// returns [`KvError::Protocol`] if `raw` is not one of the known encodings
    pub fn parse(raw: &str) -> Result<Response> {
        match raw {
            NULL => Ok(Response::Null),
            SUCCESS => Ok(Response::Success),
            UNRECOGNIZED => Ok(Response::Unrecognized),
            _ => raw
                .strip_prefix(VALUE_PREFIX)
                .and_then(|rest| rest.strip_suffix('\n'))
                .map(|value| Response::Value(value.to_owned()))
                .ok_or_else(|| KvError::Protocol(raw.to_owned())),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Value(value) => writeln!(f, "{}{}", VALUE_PREFIX, value),
            Response::Null => f.write_str(NULL),
            Response::Success => f.write_str(SUCCESS),
            Response::Unrecognized => f.write_str(UNRECOGNIZED),
        }
    }
}
