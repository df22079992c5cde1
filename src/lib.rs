//! A process-local unique ID generator inspired by [Twitter's Snowflake].
//!
//! IDs are positive 64-bit integers made of a millisecond timestamp relative to
//! a configurable epoch, a worker id and a per-millisecond sequence. IDs sort by
//! creation time, and IDs from generators with distinct worker ids never collide.
//!
//! ## Quickstart
//!
//! Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! snowflake_id = "0.1"
//! ```
//!
//! Use the library like this:
//!
//! ```
//! use snowflake_id::Snowflake;
//!
//! let sf = Snowflake::builder().worker_id(7).finalize().unwrap();
//! let next_id = sf.next_id().unwrap();
//! assert_eq!(sf.decompose(next_id).worker_id, 7);
//! ```
//!
//! `Snowflake::new()` reads the worker id from the `WORKER_ID` environment
//! variable and fails if it is missing. See [`WorkerIdResolver`] for the other
//! strategies.
//!
//! ## Concurrent use
//!
//! Snowflake is thread safe. `clone` it before moving to another thread:
//! ```
//! use snowflake_id::Snowflake;
//! use std::thread;
//!
//! let sf = Snowflake::builder().worker_id(1).finalize().unwrap();
//!
//! let mut children = Vec::new();
//! for _ in 0..10 {
//!     let thread_sf = sf.clone();
//!     children.push(thread::spawn(move || {
//!         println!("{}", thread_sf.next_id().unwrap());
//!     }));
//! }
//!
//! for child in children {
//!     child.join().unwrap();
//! }
//! ```
//!
//! [Twitter's Snowflake]: https://blog.twitter.com/2010/announcing-snowflake

mod builder;
mod clock;
mod error;
mod layout;
mod snowflake;
mod worker;

pub use crate::snowflake::*;
pub use builder::*;
pub use clock::*;
pub use error::*;
pub use layout::*;
pub use worker::*;
