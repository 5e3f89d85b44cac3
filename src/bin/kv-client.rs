//! The kv-client executable sends one request to a kv-server and prints the raw response:
//!
//! `kv-client [--addr IP-PORT] <VERB> [ARGS]...`
//!
//!     VERB and ARGS are joined with single spaces and sent as one line, e.g.
//!     `kv-client SET Hello World!` sends "SET Hello World!\n".
//!     --addr accepts an IP address, either v4 or v6, and a port number, with the format IP:PORT.
//!     If --addr is not specified then connect on 127.0.0.1:4000.
//!     Prints the response exactly as received and exits 0, even for NULL! or an unparsed verb.
//!     Prints an error and returns a non-zero exit code if IP-PORT does not parse as an address
//!     or the server cannot be reached.
//!
//! `kv-client -V`
//!
//!     Print the version.

use std::io::{self, Write};
use std::net::SocketAddr;

use clap::{crate_version, App, AppSettings, Arg, ArgMatches};
use mini_kv::{KvClient, KvError, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:4000";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    /// the server's ip:port
    addr: SocketAddr,
    /// the request line, without its trailing newline
    line: String,
}

impl Opt {
    /// validates the `addr` parameter is a valid IP address and PORT
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`KvError::Parsing`] if one of the parameters is invalid
    ///
    fn build(addr: &str, words: Vec<&str>) -> Result<Opt> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| KvError::Parsing(format!("could not parse {} into an IP address and port", &addr)))?;

        Ok(Opt {
            addr,
            line: words.join(" "),
        })
    }
}

fn main() -> Result<()> {
    // configure a subscriber that will log messages to STDERR
    subscriber_config();

    let matches = App::new("kv-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("sends one command to a kv-server")
        .setting(AppSettings::TrailingVarArg)
        .arg(Arg::with_name("addr")
            .long("addr")
            .value_name("IP_ADDR:PORT")
            .help("sets the IP_ADDR:PORT of the server to connect to")
            .default_value(DEFAULT_ADDRESS))
        .arg(Arg::with_name("COMMAND")
            .help("the verb (GET, SET or DEL) followed by its arguments")
            .required(true)
            .multiple(true)
            .allow_hyphen_values(true)
            .index(1))
        .get_matches();

    let opt = parse_options(&matches)?;
    run(opt)
}

/// sends the request line to the server and prints the response as-is
fn run(opt: Opt) -> Result<()> {
    let client = KvClient::new(opt.addr)?;
    let resp = client.send(&opt.line)?;
    let mut stdout = io::stdout();
    stdout.write_all(resp.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// parses the matches from the command line into an [`Opt`] struct
fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let addr = matches.value_of("addr").unwrap_or(DEFAULT_ADDRESS);
    let words = matches
        .values_of("COMMAND")
        .map(|values| values.collect())
        .unwrap_or_default();
    Opt::build(addr, words)
}

/// configures a tracing subscriber that will log warnings and errors to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        // log to stderr, stdout only carries the server's response
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}
