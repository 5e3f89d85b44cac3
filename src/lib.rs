#![deny(missing_docs)]
//! A minimal, multithreaded, in-memory key-value store that maps [`String`] keys to
//! [`String`] values and serves them over TCP.
//!
//! This crate provides the [`KvStore`] itself, a fixed size [`ThreadPool`], the [`KvServer`]
//! that ties them together, and a [`KvClient`]. The `kv-server` and `kv-client` executables
//! are thin wrappers around these types.
//!
//! ## Supported Operations
//! The store supports three operations (a.k.a "verbs"):
//!
//! - `GET` a value associated with a key from the store
//! - `SET` a key/value pair in the store
//! - `DEL` a key/value pair from the store
//!
//! See the [`KvEngine`] trait and the [`Request`] and [`Response`] types for more information
//! on the structure of these operations.
//!
//! ## KvStore
//! [`KvStore`] is the implementor of the [`KvEngine`] trait. It keeps every entry in a single
//! `HashMap` behind a single mutex, so every GET, SET and DEL appears to happen at one instant
//! relative to all the others. Nothing is persisted; entries live until they are deleted or
//! the process exits.
//!
//! ## Thread Pool
//! [`SharedQueueThreadPool`] starts a fixed number of worker threads that all receive jobs
//! from one unbounded queue. The server submits one job per accepted connection, so a burst
//! of connections never runs more than `threads` handlers at once.
//!
//! ## Protocol
//! One connection carries exactly one request and one response, both newline terminated
//! ASCII text:
//!
//! | request             | response                      |
//! |---------------------|-------------------------------|
//! | `GET key` (hit)     | `$value\n`                    |
//! | `GET key` (miss)    | `NULL!\n`                     |
//! | `SET key value`     | `SUCCESS!\n`                  |
//! | `DEL key` (hit)     | `SUCCESS!\n`                  |
//! | `DEL key` (miss)    | `NULL!\n`                     |
//! | anything else       | `VERB COULD NOT BE PARSED!\n` |
//!
//! The key of a `SET` is the first token after the verb, the value is everything after it and
//! may contain spaces.
//!
//! [`String`]: https://doc.rust-lang.org/std/string/struct.String.html

pub use client::KvClient;
pub use command::{Request, Response};
pub use engine::{KvEngine, KvStore};
pub use error::{KvError, Result};
pub use server::{BoundServer, KvServer, ShutdownHandle};
pub use thread_pool::{SharedQueueThreadPool, ThreadPool};

mod client;
mod command;
mod engine;
mod error;
mod server;
pub mod thread_pool;
