use std::io::{self, ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::command::Request;
use crate::thread_pool::ThreadPool;
use crate::{KvEngine, KvError, Result};

/// The most bytes read from a connection for its single request.
pub const REQUEST_BUFFER_SIZE: usize = 1024;

const LISTEN_BACKLOG: i32 = 1024;

/// A TCP socket server implementation over a key value storage engine.
///
/// Every accepted connection is handed to a [`ThreadPool`] as one job. The job reads one
/// request, runs it against the engine, writes one response and closes the connection.
///
/// # Example
/// Bind a server to an ephemeral port on localhost with 4 worker threads, then stop it from
/// another thread
/// ```rust,no_run
/// use mini_kv::{KvServer, KvStore, SharedQueueThreadPool, ThreadPool};
/// # fn main() -> mini_kv::Result<()> {
/// let pool = SharedQueueThreadPool::new(4)?;
/// let server = KvServer::new(KvStore::new(), pool).bind("127.0.0.1:0")?;
/// let handle = server.shutdown_handle();
/// std::thread::spawn(move || handle.shutdown());
/// server.run()?;
/// # Ok(())
/// # }
/// ```
pub struct KvServer<E: KvEngine, P: ThreadPool> {
    /// the kv engine to use
    engine: E,
    /// a pool of threads that will perform work using a handle to the engine
    pool: P,
    /// how long a connection may sit silent before it is dropped; `None` waits forever
    read_timeout: Option<Duration>,
}

impl<E: KvEngine, P: ThreadPool> KvServer<E, P> {
    /// Create a new `KvServer` using the given [`KvEngine`] and [`ThreadPool`] implementation.
    pub fn new(engine: E, pool: P) -> Self {
        KvServer {
            engine,
            pool,
            read_timeout: None,
        }
    }

    /// Drops connections that send nothing for `timeout`, instead of letting them hold a
    /// worker thread indefinitely.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Binds the listening socket, with address and port reuse enabled.
    ///
    /// # Errors
    /// returns [`KvError`] if `addr` does not resolve or the socket could not be bound
    pub fn bind<A: ToSocketAddrs>(self, addr: A) -> Result<BoundServer<E, P>> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| KvError::Parsing("address resolved to nothing".to_owned()))?;
        let listener = create_listener(addr)?;
        let local_addr = listener.local_addr()?;
        info!("listening on {}", local_addr);

        Ok(BoundServer {
            server: self,
            listener,
            local_addr,
            running: Arc::new(AtomicBool::new(true)),
        })
    }
}

/// A [`KvServer`] whose socket is bound and listening, but not yet accepting.
pub struct BoundServer<E: KvEngine, P: ThreadPool> {
    server: KvServer<E, P>,
    listener: TcpListener,
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
}

impl<E: KvEngine, P: ThreadPool> BoundServer<E, P> {
    /// the address the server is actually listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a handle that can stop [`run`](BoundServer::run) from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: Arc::clone(&self.running),
            wake_addr: wake_addr(self.local_addr),
        }
    }

    /// Accepts connections until shut down.
    /// Each connection that comes in gets serviced by a thread from the ThreadPool.
    /// Every accepted connection is queued, including one accepted after the shutdown flag
    /// was cleared.
    ///
    /// Once the accept loop ends the listening socket is closed and the pool is shut down,
    /// which runs every connection job still queued before this returns.
    pub fn run(self) -> Result<()> {
        let BoundServer {
            server,
            listener,
            local_addr,
            running,
        } = self;
        let KvServer {
            engine,
            pool,
            read_timeout,
        } = server;

        while running.load(Ordering::SeqCst) {
            match listener.accept() {
                // after a shutdown this is usually the wake-up connection, which sends nothing
                // and is closed by `serve` like any other silent client
                Ok((stream, peer_addr)) => {
                    let engine = engine.clone();
                    let submitted = pool.spawn(move || {
                        if let Err(e) = serve(&engine, stream, read_timeout) {
                            error!("Error on serving client {}: {}", peer_addr, e);
                        }
                    });
                    if let Err(e) = submitted {
                        error!("could not queue connection from {}: {}", peer_addr, e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    info!("accept interrupted, stopping");
                    break;
                }
                Err(e) => error!("Connection failed: {}", e),
            }
        }

        drop(listener);
        info!("stopped listening on {}, draining queued connections", local_addr);
        pool.shutdown();
        Ok(())
    }
}

/// Stops a running [`BoundServer`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Tells the accept loop to stop, then wakes it with a throwaway connection so it notices
    /// without waiting for the next client.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("shutdown requested");
            if let Err(e) = TcpStream::connect(self.wake_addr) {
                warn!("could not wake the accept loop: {}", e);
            }
        }
    }
}

/// Handles one connection and reports how long it took, whichever way it ended.
fn serve<E: KvEngine>(engine: &E, tcp: TcpStream, read_timeout: Option<Duration>) -> Result<()> {
    let start = Instant::now();
    let result = handle_request(engine, tcp, read_timeout);
    debug!(
        latency_us = start.elapsed().as_micros() as u64,
        ok = result.is_ok(),
        "connection closed"
    );
    result
}

/// Reads one request from the given `tcp` stream and answers it.
/// This function will: parse the request, execute it against the engine, write the
/// [`Response`](crate::Response) and then close the stream by dropping it.
///
/// A connection that closes before sending anything gets no response.
fn handle_request<E: KvEngine>(
    engine: &E,
    mut tcp: TcpStream,
    read_timeout: Option<Duration>,
) -> Result<()> {
    let peer_addr = tcp.peer_addr()?;
    tcp.set_read_timeout(read_timeout)?;

    let mut buf = [0u8; REQUEST_BUFFER_SIZE];
    let len = tcp.read(&mut buf)?;
    if len == 0 {
        debug!("{} closed the connection without a request", peer_addr);
        return Ok(());
    }

    let req = Request::from_bytes(&buf[..len]);
    debug!("Receive request from {}: {:?}", peer_addr, req);

    let resp = req.execute(engine);
    tcp.write_all(resp.to_string().as_bytes())?;
    tcp.flush()?;
    debug!("Response sent to {}: {:?}", peer_addr, resp);
    Ok(())
}

/// Create a TCP listener with SO_REUSEADDR, and SO_REUSEPORT where supported.
fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}

/// The address a local client should connect to in order to reach a listener bound to
/// `local`. Unspecified addresses are swapped for loopback.
fn wake_addr(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}
