//! this binary starts the kv server
//! to see the list of options, type: `kv-server --help`
//!
//! `kv-server [PORT] [--host IP] [--threads N] [--read-timeout SECONDS] [--log-level LEVEL]`
//!
//! The server runs until it receives SIGINT or SIGTERM, then stops accepting connections,
//! finishes the ones already accepted, prints "Server Shutdown." and exits with status 0.
//! A second SIGINT or SIGTERM while those connections drain exits at once with status 1.
//! Any failure to start (bad arguments, bind or listen errors) exits with status 1.

use std::net::{IpAddr, SocketAddr};
use std::process::exit;
use std::str::FromStr;
use std::time::Duration;

use clap::{crate_version, App, Arg};
use mini_kv::thread_pool::default_threads;
use mini_kv::{KvError, KvServer, KvStore, Result, SharedQueueThreadPool, ThreadPool};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_PORT: &str = "4000";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_LOG_LEVEL: &str = "info";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    threads: u32,
    read_timeout: Option<Duration>,
    log_level: Level,
}

impl Opt {
    /// validates the raw command line values
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`KvError::Parsing`] if one of the parameters is invalid
    ///
    fn build(
        host: &str,
        port: &str,
        threads: Option<&str>,
        read_timeout: Option<&str>,
        log_level: &str,
    ) -> Result<Opt> {
        let ip: IpAddr = host
            .parse()
            .map_err(|_| KvError::Parsing(format!("could not parse {} into an IP address", host)))?;
        let port: u16 = port
            .parse()
            .map_err(|_| KvError::Parsing(format!("could not parse {} into a port number", port)))?;
        let threads = match threads {
            Some(threads) => threads.parse().map_err(|_| {
                KvError::Parsing(format!("could not parse {} into a thread count", threads))
            })?,
            None => default_threads(),
        };
        let read_timeout = read_timeout
            .map(|secs| {
                secs.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    KvError::Parsing(format!("could not parse {} into a number of seconds", secs))
                })
            })
            .transpose()?;
        let log_level = Level::from_str(log_level)
            .map_err(|_| KvError::Parsing(format!("unknown log level {}", log_level)))?;

        Ok(Opt {
            addr: SocketAddr::new(ip, port),
            threads,
            read_timeout,
            log_level,
        })
    }
}

fn main() {
    // parse command line args
    let matches = App::new("kv-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("a minimal multi-threaded key-value server")
        .arg(Arg::with_name("PORT")
            .help("the TCP port to listen on, 0 picks a free port")
            .index(1)
            .default_value(DEFAULT_PORT))
        .arg(Arg::with_name("host")
            .long("host")
            .value_name("IP_ADDR")
            .help("sets the IP address that the server listens on")
            .default_value(DEFAULT_HOST))
        .arg(Arg::with_name("threads")
            .long("threads")
            .short("t")
            .value_name("N")
            .help("number of worker threads, defaults to the number of CPUs"))
        .arg(Arg::with_name("read-timeout")
            .long("read-timeout")
            .value_name("SECONDS")
            .help("drop connections that send nothing for this long"))
        .arg(Arg::with_name("log-level")
            .long("log-level")
            .value_name("LEVEL")
            .help("one of trace, debug, info, warn, error")
            .default_value(DEFAULT_LOG_LEVEL))
        .get_matches();

    // validate command line options, store them in Opt
    let opt = match Opt::build(
        matches.value_of("host").unwrap_or(DEFAULT_HOST),
        matches.value_of("PORT").unwrap_or(DEFAULT_PORT),
        matches.value_of("threads"),
        matches.value_of("read-timeout"),
        matches.value_of("log-level").unwrap_or(DEFAULT_LOG_LEVEL),
    ) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // set up a tracing subscriber to log to STDERR
    subscriber_config(opt.log_level);

    // start the server
    if let Err(e) = run(opt) {
        eprintln!("Fatal Error: {}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("kv-server {}", env!("CARGO_PKG_VERSION"));
    info!("Worker threads: {}", opt.threads);

    // registered before the listener exists so an early Ctrl-C is not lost
    let signals = signals::register()?;

    let pool = SharedQueueThreadPool::new(opt.threads)?;
    let mut server = KvServer::new(KvStore::new(), pool);
    if let Some(timeout) = opt.read_timeout {
        server = server.with_read_timeout(timeout);
    }
    let server = server.bind(opt.addr)?;
    println!("Listening on Port:{}", server.local_addr().port());

    signals.forward_to(server.shutdown_handle())?;
    server.run()?;

    println!("\nServer Shutdown.");
    Ok(())
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config(level: Level) {
    let subscriber = FmtSubscriber::builder()
        // all spans/events at `level` or more severe will be written
        .with_max_level(level)
        // log to stderr instead of stdout, stdout is kept for the startup and shutdown notices
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}

/// SIGINT and SIGTERM are picked up by a dedicated thread. The first one stops the server
/// through its [`ShutdownHandle`]; any later one exits the process without waiting for the
/// remaining connections.
#[cfg(unix)]
mod signals {
    use std::process::exit;
    use std::thread;

    use mini_kv::{Result, ShutdownHandle};
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use tracing::{info, warn};

    pub struct ShutdownSignals(Signals);

    pub fn register() -> Result<ShutdownSignals> {
        Ok(ShutdownSignals(Signals::new([SIGINT, SIGTERM])?))
    }

    impl ShutdownSignals {
        pub fn forward_to(self, handle: ShutdownHandle) -> Result<()> {
            let mut signals = self.0;
            thread::Builder::new()
                .name("kv-signals".to_owned())
                .spawn(move || {
                    let mut received = signals.forever();
                    if let Some(sig) = received.next() {
                        info!("received signal {}, draining connections", sig);
                        handle.shutdown();
                    }
                    if let Some(sig) = received.next() {
                        warn!("received signal {} while draining, exiting now", sig);
                        exit(1);
                    }
                })?;
            Ok(())
        }
    }
}

#[cfg(not(unix))]
mod signals {
    use mini_kv::{Result, ShutdownHandle};

    pub struct ShutdownSignals;

    pub fn register() -> Result<ShutdownSignals> {
        Ok(ShutdownSignals)
    }

    impl ShutdownSignals {
        pub fn forward_to(self, _handle: ShutdownHandle) -> Result<()> {
            Ok(())
        }
    }
}
