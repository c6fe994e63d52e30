//! rawntp: a one-shot NTP client that builds its own packets
//!
//! The request's IPv4 and UDP headers are laid out and checksummed by hand
//! and sent through a raw socket. The reply is received on an ordinary UDP
//! socket bound to the request's source port, and its transmit timestamp is
//! decoded into calendar time.
pub mod core;

pub mod client;
pub mod network;
pub mod protocol;
pub mod time;

// Re-export commonly used items
pub use crate::client::{Client, Response};
pub use crate::core::{Config, Error, Result};
pub use crate::time::TimeFormat;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
