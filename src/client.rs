use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::command::Response;
use crate::{KvError, Result};

const LINE_BREAKS: &[char] = &['\n', '\r'];

/// `KvClient` contains the functionality for communication with a [`KvServer`].
///
/// The server answers exactly one request per connection, so every call opens a fresh
/// connection to the address given to [`KvClient::new`].
///
/// [`KvServer`]: ./struct.KvServer.html
#[derive(Debug, Clone)]
pub struct KvClient {
    addr: SocketAddr,
}

impl KvClient {
    /// creates a client for the server at the given `addr`. No connection is made yet.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| KvError::Parsing("address resolved to nothing".to_owned()))?;
        Ok(KvClient { addr })
    }

    /// Sends one raw request line and returns the raw response.
    ///
    /// A `\n` is appended to `line` if it does not already end with one. The response is
    /// everything the server writes before it closes the connection.
    pub fn send(&self, line: &str) -> Result<String> {
        let mut req = line.to_owned();
        if !req.ends_with('\n') {
            req.push('\n');
        }
        // the server does a single read, so the request goes out in a single write
        let mut tcp = TcpStream::connect(self.addr)?;
        tcp.write_all(req.as_bytes())?;
        tcp.flush()?;
        tcp.shutdown(Shutdown::Write)?;

        let mut resp = String::new();
        tcp.read_to_string(&mut resp)?;
        debug!("Response from {}: {:?}", self.addr, resp);
        Ok(resp)
    }

    /// gets the value of the specified `key` from the server
    /// ## Returns
    /// `Ok<Some<String>>` if the value was found for the key.
    /// `Ok<None>` if there is no value associated with the key
    /// `Err<KvError::InvalidArgument>` if `key` is empty or contains whitespace delimiters
    /// `Err<KvError::Protocol>` if the server did not answer with a value or `NULL!`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        match self.request(&format!("GET {}", key))? {
            Response::Value(value) => Ok(Some(value)),
            Response::Null => Ok(None),
            other => Err(unexpected(other)),
        }
    }

    /// sends a set key/value request to the server
    /// # Errors
    /// `Err<KvError::InvalidArgument>` if `key` is empty or contains a space or line break,
    /// or if `value` contains a line break
    /// `Err<KvError::Protocol>` if the server did not answer with `SUCCESS!`
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        if value.contains(LINE_BREAKS) {
            return Err(KvError::InvalidArgument(format!(
                "value {:?} contains a line break",
                value
            )));
        }
        match self.request(&format!("SET {} {}", key, value))? {
            Response::Success => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// removes a key and its associated value from the store
    /// # Returns
    /// `Ok<true>` if the key was removed, `Ok<false>` if it was not present
    /// # Errors
    /// `Err<KvError::InvalidArgument>` if `key` is empty or contains whitespace delimiters
    pub fn remove(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        match self.request(&format!("DEL {}", key))? {
            Response::Success => Ok(true),
            Response::Null => Ok(false),
            other => Err(unexpected(other)),
        }
    }

    fn request(&self, line: &str) -> Result<Response> {
        Response::parse(&self.send(line)?)
    }
}

// The server ends a SET key at the first space and a request at the first line break, so a key
// holding either would be read back as a different request.
fn check_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(' ') || key.contains(LINE_BREAKS) {
        return Err(KvError::InvalidArgument(format!(
            "key {:?} must be non-empty and contain no spaces or line breaks",
            key
        )));
    }
    Ok(())
}

fn unexpected(resp: Response) -> KvError {
    KvError::Protocol(resp.to_string())
}
